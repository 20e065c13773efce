// Export pipeline: capture the rendered template, paginate it into a PDF, deliver it.

pub mod assembly;
pub mod capture;
pub mod delivery;
pub mod filename;
pub mod pagination;
pub mod raster;
pub mod trigger;

pub use assembly::{assemble, AssembledDocument, AssemblyOptions};
pub use capture::{capture, CaptureOptions, OffscreenClone};
pub use delivery::{DeliveryEvent, DownloadDir, Downloader, MemoryDownloads};
pub use filename::{output_filename, sanitize_filename};
pub use pagination::{plan_pages, PagePlan, PageSlice, PaginationMode};
pub use raster::{rasterize, Bitmap, RasterOptions};
pub use trigger::{ExportSettings, ExportTrigger, SharedDocument};
