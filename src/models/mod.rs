mod analysis;
mod category;
mod content;
mod page;

pub use analysis::{PageAnalysis, ProcessStatus};
pub use category::Category;
pub use content::Content;
pub use page::{ExtractedPage, PageMetadata};
