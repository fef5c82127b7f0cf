pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

// Re-export models and services for the appointment cell
pub use models::*;
pub use services::*;

// The pure scheduling core
pub use services::availability::{derive_slots, validate, weekday_index};
