// Document model: the resume records and the session store that owns them.

pub mod resume;
pub mod store;

pub use resume::{
    CertificationEntry, EducationEntry, EducationType, Entry, EntryId, ExperienceEntry,
    LanguageEntry, LanguageProficiency, PersonalInfo, ProjectEntry, ResumeSnapshot, ScoreType,
    SkillEntry, SkillLevel, TemplateKind,
};
pub use store::{ResumeStore, Section, StoreEvent, SubscriptionId};
