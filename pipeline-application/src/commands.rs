pub mod ingest_commands;
pub mod transform_commands;
