pub mod ingestion_loop;
pub mod source_attribution_cache;

pub use ingestion_loop::run_ingestion_loop;
pub use source_attribution_cache::SourceAttributionCache;
