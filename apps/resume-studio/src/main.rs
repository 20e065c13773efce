use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_studio::config::Config;
use resume_studio::export::DownloadDir;
use resume_studio::layout::AssetCache;
use resume_studio::models::{
    CertificationEntry, EducationEntry, EducationType, ExperienceEntry, LanguageEntry,
    LanguageProficiency, PersonalInfo, ProjectEntry, ResumeSnapshot, ResumeStore, ScoreType,
    SkillEntry, SkillLevel,
};
use resume_studio::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Studio v{}", env!("CARGO_PKG_VERSION"));

    let store = match &config.input {
        Some(path) => load_store(path).await?,
        None => {
            info!("RESUME_INPUT not set, exporting the built-in sample");
            sample_store()?
        }
    };

    let downloads = Arc::new(DownloadDir::new(&config.download_dir));
    let target = downloads.path_for(&resume_studio::export::output_filename(&config.filename));
    let state = AppState::new(config.clone(), store, AssetCache::new(), downloads);

    if !state.export(&config.filename).await {
        anyhow::bail!("export failed; see the log above for the cause");
    }
    info!(path = %target.display(), "Resume exported");

    Ok(())
}

async fn load_store(path: &Path) -> Result<ResumeStore> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read resume input '{}'", path.display()))?;
    let snapshot: ResumeSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a valid resume document", path.display()))?;
    info!(path = %path.display(), "Loaded resume input");
    Ok(ResumeStore::from_snapshot(snapshot))
}

fn sample_store() -> Result<ResumeStore> {
    let mut store = ResumeStore::new();
    store.set_personal_info(PersonalInfo {
        full_name: "Jane Doe".to_string(),
        title: "Backend Engineer".to_string(),
        photo: None,
        email: "jane@example.com".to_string(),
        phone: "+1 555 0100".to_string(),
        address: "Springfield".to_string(),
        linkedin: "linkedin.com/in/janedoe".to_string(),
        github: "github.com/janedoe".to_string(),
        summary: "Engineer focused on reliable services and the tooling around them.".to_string(),
    });
    store.add_experience(ExperienceEntry {
        company: "Acme Corp".to_string(),
        position: "Senior Engineer".to_string(),
        location: "Remote".to_string(),
        start_date: "2021".to_string(),
        end_date: String::new(),
        description: "Owns the document export service and its rendering pipeline.".to_string(),
        is_current: true,
        skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
    })?;
    store.add_education(EducationEntry {
        education_type: EducationType::Bachelors,
        degree: "B.Sc. Computer Science".to_string(),
        institution: "State University".to_string(),
        board_university: String::new(),
        year: "2018".to_string(),
        score_type: ScoreType::Cgpa,
        score: "8.9".to_string(),
        location: "Springfield".to_string(),
        description: String::new(),
    })?;
    store.add_skill(SkillEntry {
        name: "Rust".to_string(),
        level: SkillLevel::Expert,
    })?;
    store.add_skill(SkillEntry {
        name: "Distributed systems".to_string(),
        level: SkillLevel::Advanced,
    })?;
    store.add_project(ProjectEntry {
        name: "pdfkit-lite".to_string(),
        description: "Small PDF assembly library.".to_string(),
        link: Some("github.com/janedoe/pdfkit-lite".to_string()),
    })?;
    store.add_language(LanguageEntry {
        name: "English".to_string(),
        proficiency: LanguageProficiency::Native,
    })?;
    store.add_certification(CertificationEntry {
        name: "Cloud Practitioner".to_string(),
        issuer: "Example Institute".to_string(),
        date: "2022".to_string(),
    })?;
    Ok(store)
}
