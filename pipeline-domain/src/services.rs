pub mod flattener;

pub use flattener::*;
