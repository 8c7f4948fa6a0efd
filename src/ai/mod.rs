mod categorizer;
mod client;
mod refiner;

pub use categorizer::Categorizer;
pub use client::OllamaClient;
pub use refiner::KnowledgeRefiner;
