// libs/consultation-cell/src/lib.rs
//! # Consultation Cell
//!
//! Glue between the consultation room and the booking ledger. The room
//! itself lives elsewhere; this cell only reacts to its events:
//!
//! ```text
//! room joined  -> BookingLedger::join          (Scheduled -> InProgress)
//! room left    -> report, no mutation
//! doctor done  -> BookingLedger::complete_with_prescription
//! ```
//!
//! ## API Endpoints
//!
//! - `POST /consultations/{id}/join` - Enter the room, returns the room token
//! - `POST /consultations/{id}/leave` - Leave the room
//! - `PUT /consultations/{id}/complete` - Record the prescription and close

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{LeaveReport, SessionView};
pub use router::consultation_routes;
pub use services::ConsultationSessionService;
