// Repository and source port traits
// What the engine needs from persistence and from the live API client

pub mod repositories;
pub mod services;

pub use repositories::*;
pub use services::*;
