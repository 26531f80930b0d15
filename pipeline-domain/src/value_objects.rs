// Domain value objects
pub mod coordinates;
pub mod identifiers;

pub use coordinates::*;
pub use identifiers::*;
