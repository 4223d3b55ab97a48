mod client;
mod models;

pub use client::AiEnrichmentClient;
pub use models::Enrichment;
