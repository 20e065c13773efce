// Layout renderer: turns the document model into a laid-out visual tree.
// Text is wrapped with static font metrics; page geometry is shared with export.

pub mod font_metrics;
pub mod page;
pub mod template;

pub use font_metrics::{get_metrics, FontFamily, FontMetricTable};
pub use page::{default_page_config, PageConfig};
pub use template::{render_resume, AssetCache, TEMPLATE_ELEMENT_ID};
