//! HTTP request handlers, one module per resource.

pub mod accounts;
pub mod events;
pub mod health;
pub mod listings;
pub mod orders;

pub use health::health_check;
