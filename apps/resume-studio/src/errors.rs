use thiserror::Error;

/// Export pipeline error type.
/// Every variant is caught at the export trigger boundary and turned into a
/// boolean failure signal plus a logged diagnostic.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Capture target not found: {0}")]
    CaptureTargetMissing(String),

    #[error("Capture produced an empty bitmap ({width}x{height})")]
    EmptyCapture { width: u32, height: u32 },

    #[error("Capture would be {width}x{height} pixels, over the bitmap limit")]
    CaptureTooLarge { width: u32, height: u32 },

    #[error(
        "Content is {content_height_mm:.1}mm tall but a page only holds {printable_height_mm:.1}mm"
    )]
    AssemblyOverflow {
        content_height_mm: f32,
        printable_height_mm: f32,
    },

    #[error("Bitmap is tainted by cross-origin content and cannot be encoded")]
    TaintedCanvas,

    #[error("An export is already in flight")]
    ExportInFlight,

    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Delivery error: {0}")]
    Delivery(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ExportError {
    /// Short machine-readable code, used in log fields.
    pub fn code(&self) -> &'static str {
        match self {
            ExportError::CaptureTargetMissing(_) => "CAPTURE_TARGET_MISSING",
            ExportError::EmptyCapture { .. } => "EMPTY_CAPTURE",
            ExportError::CaptureTooLarge { .. } => "CAPTURE_TOO_LARGE",
            ExportError::AssemblyOverflow { .. } => "ASSEMBLY_OVERFLOW",
            ExportError::TaintedCanvas => "TAINTED_CANVAS",
            ExportError::ExportInFlight => "EXPORT_IN_FLIGHT",
            ExportError::Encode(_) => "ENCODE_ERROR",
            ExportError::Pdf(_) => "PDF_ERROR",
            ExportError::Delivery(_) => "DELIVERY_ERROR",
            ExportError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Document model error type, raised at the mutation boundary.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Invalid value '{value}' for {field}")]
    InvalidVariant { field: &'static str, value: String },

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
