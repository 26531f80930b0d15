pub mod ops_handlers;

pub use ops_handlers::*;
