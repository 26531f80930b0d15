// Domain entities
pub mod event;
pub mod geo;
pub mod message;
pub mod model;
pub mod processed;

pub use event::*;
pub use geo::*;
pub use message::*;
pub use model::*;
pub use processed::*;
