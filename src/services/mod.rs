mod page_fetcher;
mod processor;

pub use page_fetcher::PageFetcher;
pub use processor::ContentProcessor;
