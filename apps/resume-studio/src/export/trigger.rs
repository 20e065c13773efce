//! Export trigger: runs capture → assembly → delivery as one serialized unit.
//!
//! Only one run may be in flight per trigger. A second call made while a run
//! is active fails fast with `ExportInFlight` instead of queueing, the same way
//! a disabled download button would behave.
//!
//! # spawn_blocking pattern
//! Rasterizing and JPEG-encoding are CPU-bound and can take seconds at high
//! scale. Both run inside one `spawn_blocking` closure that owns clones of the
//! shared document handle and the options. The document lock is only ever
//! taken inside that closure, never on an async worker. Delivery is async and
//! runs after.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tracing::{error, info};

use crate::dom::Document;
use crate::errors::ExportError;
use crate::export::assembly::{assemble, AssemblyOptions};
use crate::export::capture::{capture, CaptureOptions};
use crate::export::delivery::{DeliveryEvent, Downloader};
use crate::export::filename::{output_filename, sanitize_filename};

/// Host document shared between the preview renderer and the export pipeline.
pub type SharedDocument = Arc<Mutex<Document>>;

#[derive(Debug, Clone, Default)]
pub struct ExportSettings {
    pub capture: CaptureOptions,
    pub assembly: AssemblyOptions,
}

/// Clears the in-flight flag when the run ends, however it ends.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct ExportTrigger {
    document: SharedDocument,
    downloader: Arc<dyn Downloader>,
    settings: ExportSettings,
    in_flight: Arc<AtomicBool>,
}

impl ExportTrigger {
    pub fn new(document: SharedDocument, downloader: Arc<dyn Downloader>, settings: ExportSettings) -> Self {
        ExportTrigger {
            document,
            downloader,
            settings,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a run holds the trigger; hosts use it to disable the control.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs the full pipeline and returns the delivered event.
    ///
    /// Nothing is delivered unless every stage succeeded, so a failed run never
    /// leaves a partial file behind.
    pub async fn try_export(&self, element_id: &str, filename: &str) -> Result<DeliveryEvent, ExportError> {
        self.try_export_with(element_id, filename, |_| Ok(())).await
    }

    /// Like `try_export`, but runs `prepare` on the locked document right
    /// before capture. The in-flight flag is taken first, so a rejected call
    /// never touches the document.
    pub async fn try_export_with<F>(
        &self,
        element_id: &str,
        filename: &str,
        prepare: F,
    ) -> Result<DeliveryEvent, ExportError>
    where
        F: FnOnce(&mut Document) -> Result<(), ExportError> + Send + 'static,
    {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(ExportError::ExportInFlight)?;

        let title = sanitize_filename(filename);
        let filename = output_filename(filename);
        let document = Arc::clone(&self.document);
        let element_id = element_id.to_string();
        let capture_options = self.settings.capture.clone();
        let assembly_options = AssemblyOptions {
            title,
            ..self.settings.assembly.clone()
        };

        let pdf = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ExportError> {
            let bitmap = {
                let mut doc = document
                    .lock()
                    .map_err(|_| ExportError::Internal(anyhow::anyhow!("host document lock poisoned")))?;
                prepare(&mut *doc)?;
                capture(&mut doc, &element_id, &capture_options)?
            };
            assemble(&bitmap, &assembly_options)?.to_bytes()
        })
        .await
        .map_err(|e| ExportError::Internal(anyhow::anyhow!("spawn_blocking failed in export: {e}")))??;

        let event = DeliveryEvent {
            filename,
            bytes: Bytes::from(pdf),
        };
        self.downloader.deliver(&event).await?;
        Ok(event)
    }

    /// Boolean surface for UI callers. Failures are logged with their code.
    pub async fn export(&self, element_id: &str, filename: &str) -> bool {
        self.export_with(element_id, filename, |_| Ok(())).await
    }

    /// Boolean surface over `try_export_with`.
    pub async fn export_with<F>(&self, element_id: &str, filename: &str, prepare: F) -> bool
    where
        F: FnOnce(&mut Document) -> Result<(), ExportError> + Send + 'static,
    {
        match self.try_export_with(element_id, filename, prepare).await {
            Ok(event) => {
                info!(filename = %event.filename, bytes = event.len(), "export succeeded");
                true
            }
            Err(e) => {
                error!(code = e.code(), element_id, error = %e, "export failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use tokio::sync::Notify;

    use crate::dom::{Content, Element, ImageContent, Origin, Rect, Size};
    use crate::export::delivery::MemoryDownloads;
    use crate::layout::{render_resume, AssetCache, TEMPLATE_ELEMENT_ID};
    use crate::models::{
        EducationEntry, EducationType, ExperienceEntry, PersonalInfo, ResumeStore, ScoreType,
    };

    fn make_settings() -> ExportSettings {
        ExportSettings {
            capture: CaptureOptions::default().with_scale(1.0),
            assembly: AssemblyOptions {
                jpeg_quality: 80,
                ..AssemblyOptions::default()
            },
        }
    }

    fn make_store() -> ResumeStore {
        let mut store = ResumeStore::new();
        store.set_personal_info(PersonalInfo {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            ..PersonalInfo::default()
        });
        store
            .add_education(EducationEntry {
                education_type: EducationType::Bachelors,
                degree: "B.Sc. Physics".to_string(),
                institution: "State University".to_string(),
                board_university: String::new(),
                year: "2019".to_string(),
                score_type: ScoreType::Cgpa,
                score: "8.7".to_string(),
                location: "Springfield".to_string(),
                description: String::new(),
            })
            .unwrap();
        store
            .add_experience(ExperienceEntry {
                company: "Acme".to_string(),
                position: "Engineer".to_string(),
                location: "Remote".to_string(),
                start_date: "2020".to_string(),
                end_date: String::new(),
                description: "Built things.".to_string(),
                is_current: true,
                skills: vec!["Rust".to_string()],
            })
            .unwrap();
        store
    }

    fn make_document(store: &ResumeStore) -> SharedDocument {
        let mut doc = Document::new(Size::new(1280.0, 800.0));
        render_resume(&mut doc, &store.snapshot(), &AssetCache::new());
        Arc::new(Mutex::new(doc))
    }

    #[tokio::test]
    async fn test_end_to_end_jane_doe() {
        let document = make_document(&make_store());
        let downloads = Arc::new(MemoryDownloads::new());
        let trigger = ExportTrigger::new(Arc::clone(&document), downloads.clone(), make_settings());

        let event = trigger
            .try_export(TEMPLATE_ELEMENT_ID, "Jane Doe Resume!")
            .await
            .unwrap();
        assert_eq!(event.filename, "Jane_Doe_Resume_.pdf");
        assert!(!event.is_empty());
        assert!(event.bytes.starts_with(b"%PDF-"));

        let delivered = downloads.events();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0], event);

        let doc = lopdf::Document::load_mem(&event.bytes).unwrap();
        assert!(!doc.get_pages().is_empty());

        assert_eq!(document.lock().unwrap().body_child_count(), 1);
        assert!(!trigger.is_in_flight());
    }

    #[tokio::test]
    async fn test_missing_target_reports_false_and_delivers_nothing() {
        let document = make_document(&make_store());
        let downloads = Arc::new(MemoryDownloads::new());
        let trigger = ExportTrigger::new(Arc::clone(&document), downloads.clone(), make_settings());
        let mutations = document.lock().unwrap().mutation_count();

        assert!(!trigger.export("missing", "cv").await);
        assert!(downloads.events().is_empty());
        assert_eq!(document.lock().unwrap().mutation_count(), mutations);
        assert!(!trigger.is_in_flight());

        // The trigger is usable again after a failure.
        assert!(trigger.export(TEMPLATE_ELEMENT_ID, "cv").await);
        assert_eq!(downloads.events()[0].filename, "cv.pdf");
    }

    #[tokio::test]
    async fn test_tainted_capture_fails_without_partial_output() {
        let mut doc = Document::new(Size::new(800.0, 600.0));
        let root = doc.create_element(
            Element::new("div", Rect::new(0.0, 0.0, 100.0, 100.0)).with_id("page"),
        );
        let photo = doc.create_element(Element::new("img", Rect::new(10.0, 10.0, 20.0, 20.0)).with_content(
            Content::Image(ImageContent {
                src: "https://cdn.example.com/me.png".to_string(),
                origin: Origin::CrossOrigin,
                pixels: Arc::new(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]))),
            }),
        ));
        doc.append_child(root, photo);
        doc.append_to_body(root);
        let document = Arc::new(Mutex::new(doc));

        let mut settings = make_settings();
        settings.capture.use_cors = false;
        settings.capture.allow_taint = true;
        let downloads = Arc::new(MemoryDownloads::new());
        let trigger = ExportTrigger::new(Arc::clone(&document), downloads.clone(), settings);

        let err = trigger.try_export("page", "cv").await.unwrap_err();
        assert!(matches!(err, ExportError::TaintedCanvas));
        assert!(downloads.events().is_empty());
        assert_eq!(document.lock().unwrap().body_child_count(), 1);
    }

    #[tokio::test]
    async fn test_prepare_runs_before_capture_and_its_error_aborts() {
        let document = make_document(&make_store());
        let downloads = Arc::new(MemoryDownloads::new());
        let trigger = ExportTrigger::new(Arc::clone(&document), downloads.clone(), make_settings());

        let err = trigger
            .try_export_with(TEMPLATE_ELEMENT_ID, "cv", |_| {
                Err(ExportError::Internal(anyhow::anyhow!("render failed")))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Internal(_)));
        assert!(downloads.events().is_empty());
        assert!(!trigger.is_in_flight());

        // A prepare step that removes the target surfaces as a missing target.
        let err = trigger
            .try_export_with(TEMPLATE_ELEMENT_ID, "cv", |doc| {
                if let Some(root) = doc.get_element_by_id(TEMPLATE_ELEMENT_ID) {
                    doc.remove_subtree(root);
                }
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::CaptureTargetMissing(_)));
        assert!(downloads.events().is_empty());
    }

    #[tokio::test]
    async fn test_pdf_title_is_sanitized_name_without_extension() {
        let document = make_document(&make_store());
        let downloads = Arc::new(MemoryDownloads::new());
        let trigger = ExportTrigger::new(document, downloads, make_settings());

        let event = trigger.try_export(TEMPLATE_ELEMENT_ID, "Jane Doe").await.unwrap();
        let doc = lopdf::Document::load_mem(&event.bytes).unwrap();
        let info = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let title = doc
            .get_object(info)
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Title")
            .unwrap()
            .as_str()
            .unwrap()
            .to_vec();
        assert_eq!(title, b"Jane_Doe".to_vec());
    }

    /// Holds delivery open until released so a second run can observe the flag.
    struct GatedDownloads {
        entered: Notify,
        release: Notify,
        inner: MemoryDownloads,
    }

    #[async_trait]
    impl Downloader for GatedDownloads {
        async fn deliver(&self, event: &DeliveryEvent) -> Result<(), ExportError> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.deliver(event).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_export_rejected_while_in_flight() {
        let document = make_document(&make_store());
        let gate = Arc::new(GatedDownloads {
            entered: Notify::new(),
            release: Notify::new(),
            inner: MemoryDownloads::new(),
        });
        let trigger = ExportTrigger::new(document, gate.clone(), make_settings());

        let first = {
            let trigger = trigger.clone();
            tokio::spawn(async move { trigger.try_export(TEMPLATE_ELEMENT_ID, "first").await })
        };
        gate.entered.notified().await;
        assert!(trigger.is_in_flight());

        let err = trigger.try_export(TEMPLATE_ELEMENT_ID, "second").await.unwrap_err();
        assert!(matches!(err, ExportError::ExportInFlight));

        gate.release.notify_one();
        let event = first.await.unwrap().unwrap();
        assert_eq!(event.filename, "first.pdf");
        assert_eq!(gate.inner.events().len(), 1);
        assert!(!trigger.is_in_flight());
    }
}
