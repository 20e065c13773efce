use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

/// Process-unique identifier of a list entry. Generated on append, never reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub Uuid);

impl EntryId {
    pub fn new() -> Self {
        EntryId(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A list entry with its id attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    pub id: EntryId,
    #[serde(flatten)]
    pub data: T,
}

// ────────────────────────────────────────────────────────────────────────────
// Closed enumerations
// ────────────────────────────────────────────────────────────────────────────

/// Declares a closed string enumeration with its display labels.
/// `FromStr` accepts the label case-insensitively and rejects everything else.
macro_rules! labelled_enum {
    ($name:ident, $field:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| ModelError::InvalidVariant {
                        field: $field,
                        value: s.to_string(),
                    })
            }
        }
    };
}

labelled_enum!(EducationType, "education_type", {
    Tenth => "10th",
    Twelfth => "12th",
    Diploma => "Diploma",
    Bachelors => "Bachelor's",
    Masters => "Master's",
    Phd => "PhD",
    Other => "Other",
});

labelled_enum!(ScoreType, "score_type", {
    Percentage => "Percentage",
    Cgpa => "CGPA",
    Gpa => "GPA",
});

labelled_enum!(SkillLevel, "skill_level", {
    Beginner => "Beginner",
    Intermediate => "Intermediate",
    Advanced => "Advanced",
    Expert => "Expert",
});

labelled_enum!(LanguageProficiency, "language_proficiency", {
    Beginner => "Beginner",
    Intermediate => "Intermediate",
    Advanced => "Advanced",
    Fluent => "Fluent",
    Native => "Native",
});

labelled_enum!(TemplateKind, "template", {
    Creative => "creative",
    Classic => "classic",
});

impl SkillLevel {
    /// Star rating out of five shown next to the skill.
    pub fn stars(&self) -> u8 {
        match self {
            SkillLevel::Beginner => 2,
            SkillLevel::Intermediate => 3,
            SkillLevel::Advanced => 4,
            SkillLevel::Expert => 5,
        }
    }
}

impl LanguageProficiency {
    /// Fill fraction of the proficiency bar.
    pub fn bar_fraction(&self) -> f32 {
        match self {
            LanguageProficiency::Beginner => 0.40,
            LanguageProficiency::Intermediate => 0.65,
            LanguageProficiency::Advanced => 0.75,
            LanguageProficiency::Fluent => 0.85,
            LanguageProficiency::Native => 1.0,
        }
    }
}

impl Default for TemplateKind {
    fn default() -> Self {
        TemplateKind::Creative
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub title: String,
    /// Image ref: a `data:` URL or a key into the renderer's asset cache.
    pub photo: Option<String>,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub linkedin: String,
    pub github: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub education_type: EducationType,
    pub degree: String,
    pub institution: String,
    #[serde(default)]
    pub board_university: String,
    pub year: String,
    pub score_type: ScoreType,
    pub score: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub company: String,
    pub position: String,
    #[serde(default = "default_location")]
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub skills: Vec<String>,
}

fn default_location() -> String {
    "Remote".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    pub level: SkillLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub name: String,
    pub proficiency: LanguageProficiency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationEntry {
    pub name: String,
    pub issuer: String,
    pub date: String,
}

/// Read-only view of the whole document model, consumed by the layout renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeSnapshot {
    pub personal_info: PersonalInfo,
    pub education: Vec<Entry<EducationEntry>>,
    pub experience: Vec<Entry<ExperienceEntry>>,
    pub skills: Vec<Entry<SkillEntry>>,
    pub projects: Vec<Entry<ProjectEntry>>,
    pub languages: Vec<Entry<LanguageEntry>>,
    pub certifications: Vec<Entry<CertificationEntry>>,
    pub selected_template: TemplateKind,
}
