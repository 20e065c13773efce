//! In-memory resume store: the document model for one editing session.
//!
//! The store is passed explicitly to whoever reads or writes it; there is no
//! process-wide instance. Mutation is limited to whole-record replace
//! (personal info, a single education entry) and append / remove-by-id on the
//! lists. Each successful mutation emits exactly one `StoreEvent` to every
//! registered listener.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ModelError;
use crate::models::resume::{
    CertificationEntry, EducationEntry, Entry, EntryId, ExperienceEntry, LanguageEntry,
    PersonalInfo, ProjectEntry, ResumeSnapshot, SkillEntry, TemplateKind,
};

/// Which list a `StoreEvent` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Education,
    Experience,
    Skills,
    Projects,
    Languages,
    Certifications,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    PersonalInfoReplaced,
    EntryAdded { section: Section, id: EntryId },
    EntryReplaced { section: Section, id: EntryId },
    EntryRemoved { section: Section, id: EntryId },
    TemplateChanged(TemplateKind),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Default)]
pub struct ResumeStore {
    data: ResumeSnapshot,
    /// Every id ever handed out, including removed ones.
    issued: HashSet<EntryId>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for ResumeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeStore")
            .field("data", &self.data)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ResumeStore {
    /// Creates an empty store (session start).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a previously serialized snapshot. Ids in the
    /// snapshot are kept and reserved.
    pub fn from_snapshot(snapshot: ResumeSnapshot) -> Self {
        let mut store = Self::new();
        store.issued.extend(snapshot.education.iter().map(|e| e.id));
        store.issued.extend(snapshot.experience.iter().map(|e| e.id));
        store.issued.extend(snapshot.skills.iter().map(|e| e.id));
        store.issued.extend(snapshot.projects.iter().map(|e| e.id));
        store.issued.extend(snapshot.languages.iter().map(|e| e.id));
        store.issued.extend(snapshot.certifications.iter().map(|e| e.id));
        store.data = snapshot;
        store
    }

    pub fn snapshot(&self) -> ResumeSnapshot {
        self.data.clone()
    }

    pub fn personal_info(&self) -> &PersonalInfo {
        &self.data.personal_info
    }

    pub fn education(&self) -> &[Entry<EducationEntry>] {
        &self.data.education
    }

    pub fn experience(&self) -> &[Entry<ExperienceEntry>] {
        &self.data.experience
    }

    pub fn skills(&self) -> &[Entry<SkillEntry>] {
        &self.data.skills
    }

    pub fn projects(&self) -> &[Entry<ProjectEntry>] {
        &self.data.projects
    }

    pub fn languages(&self) -> &[Entry<LanguageEntry>] {
        &self.data.languages
    }

    pub fn certifications(&self) -> &[Entry<CertificationEntry>] {
        &self.data.certifications
    }

    pub fn selected_template(&self) -> TemplateKind {
        self.data.selected_template
    }

    // ── observers ────────────────────────────────────────────────────────────

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn emit(&self, event: StoreEvent) {
        debug!(?event, "store mutated");
        for (_, listener) in &self.listeners {
            listener(&event);
        }
    }

    fn issue_id(&mut self) -> EntryId {
        loop {
            let id = EntryId::new();
            if self.issued.insert(id) {
                return id;
            }
        }
    }

    // ── mutations ────────────────────────────────────────────────────────────

    /// Replaces the personal info record wholesale.
    pub fn set_personal_info(&mut self, info: PersonalInfo) {
        self.data.personal_info = info;
        self.emit(StoreEvent::PersonalInfoReplaced);
    }

    pub fn add_education(&mut self, entry: EducationEntry) -> Result<EntryId, ModelError> {
        require("institution", &entry.institution)?;
        let id = self.issue_id();
        self.data.education.push(Entry { id, data: entry });
        self.emit(StoreEvent::EntryAdded {
            section: Section::Education,
            id,
        });
        Ok(id)
    }

    /// Replaces an existing education entry, keeping its id and position.
    pub fn replace_education(
        &mut self,
        id: EntryId,
        entry: EducationEntry,
    ) -> Result<(), ModelError> {
        require("institution", &entry.institution)?;
        let slot = self
            .data
            .education
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ModelError::EntryNotFound(id.to_string()))?;
        slot.data = entry;
        self.emit(StoreEvent::EntryReplaced {
            section: Section::Education,
            id,
        });
        Ok(())
    }

    pub fn remove_education(&mut self, id: EntryId) -> bool {
        let removed = remove_by_id(&mut self.data.education, id);
        self.emit_removed(removed, Section::Education, id)
    }

    pub fn add_experience(&mut self, entry: ExperienceEntry) -> Result<EntryId, ModelError> {
        require("company", &entry.company)?;
        let id = self.issue_id();
        self.data.experience.push(Entry { id, data: entry });
        self.emit(StoreEvent::EntryAdded {
            section: Section::Experience,
            id,
        });
        Ok(id)
    }

    pub fn remove_experience(&mut self, id: EntryId) -> bool {
        let removed = remove_by_id(&mut self.data.experience, id);
        self.emit_removed(removed, Section::Experience, id)
    }

    pub fn add_skill(&mut self, entry: SkillEntry) -> Result<EntryId, ModelError> {
        require("name", &entry.name)?;
        let id = self.issue_id();
        self.data.skills.push(Entry { id, data: entry });
        self.emit(StoreEvent::EntryAdded {
            section: Section::Skills,
            id,
        });
        Ok(id)
    }

    pub fn remove_skill(&mut self, id: EntryId) -> bool {
        let removed = remove_by_id(&mut self.data.skills, id);
        self.emit_removed(removed, Section::Skills, id)
    }

    pub fn add_project(&mut self, entry: ProjectEntry) -> Result<EntryId, ModelError> {
        require("name", &entry.name)?;
        let id = self.issue_id();
        self.data.projects.push(Entry { id, data: entry });
        self.emit(StoreEvent::EntryAdded {
            section: Section::Projects,
            id,
        });
        Ok(id)
    }

    pub fn remove_project(&mut self, id: EntryId) -> bool {
        let removed = remove_by_id(&mut self.data.projects, id);
        self.emit_removed(removed, Section::Projects, id)
    }

    pub fn add_language(&mut self, entry: LanguageEntry) -> Result<EntryId, ModelError> {
        require("name", &entry.name)?;
        let id = self.issue_id();
        self.data.languages.push(Entry { id, data: entry });
        self.emit(StoreEvent::EntryAdded {
            section: Section::Languages,
            id,
        });
        Ok(id)
    }

    pub fn remove_language(&mut self, id: EntryId) -> bool {
        let removed = remove_by_id(&mut self.data.languages, id);
        self.emit_removed(removed, Section::Languages, id)
    }

    pub fn add_certification(&mut self, entry: CertificationEntry) -> Result<EntryId, ModelError> {
        require("name", &entry.name)?;
        let id = self.issue_id();
        self.data.certifications.push(Entry { id, data: entry });
        self.emit(StoreEvent::EntryAdded {
            section: Section::Certifications,
            id,
        });
        Ok(id)
    }

    pub fn remove_certification(&mut self, id: EntryId) -> bool {
        let removed = remove_by_id(&mut self.data.certifications, id);
        self.emit_removed(removed, Section::Certifications, id)
    }

    pub fn set_template(&mut self, template: TemplateKind) {
        self.data.selected_template = template;
        self.emit(StoreEvent::TemplateChanged(template));
    }

    /// Drops all content. Issued ids stay reserved.
    pub fn reset(&mut self) {
        self.data = ResumeSnapshot::default();
        self.emit(StoreEvent::Reset);
    }

    fn emit_removed(&self, removed: bool, section: Section, id: EntryId) -> bool {
        if removed {
            self.emit(StoreEvent::EntryRemoved { section, id });
        }
        removed
    }
}

fn remove_by_id<T>(list: &mut Vec<Entry<T>>, id: EntryId) -> bool {
    match list.iter().position(|e| e.id == id) {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        Err(ModelError::MissingField(field))
    } else {
        Ok(())
    }
}
