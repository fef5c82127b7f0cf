// libs/consultation-cell/src/services/mod.rs
pub mod session;

pub use session::ConsultationSessionService;
