// Repository and Service Port Traits (Interfaces)
// Define what the domain needs from infrastructure

pub mod feed;
pub mod repositories;
pub mod services;

pub use feed::*;
pub use repositories::*;
pub use services::*;
