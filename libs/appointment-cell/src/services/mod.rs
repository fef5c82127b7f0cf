pub mod booking;
pub mod conflict;
pub mod directory;
pub mod lifecycle;
pub mod payment;
pub mod slots;
pub mod store;
pub mod supabase_store;

pub use booking::BookingLedger;
pub use conflict::{intervals_overlap, ConflictDetectionService};
pub use directory::{InMemoryProfileDirectory, ProfileDirectory, SupabaseProfileDirectory};
pub use lifecycle::AppointmentLifecycleService;
pub use payment::{
    GatewayOrder, LocalOrderGateway, OrderRequest, PaymentGateway, PaymentGatewayError, PaymentService,
    PaymentVerifier, RazorpayGateway,
};
pub use slots::SlotQueryService;
pub use store::{AppointmentStore, InMemoryAppointmentStore, StoreError};
pub use supabase_store::SupabaseAppointmentStore;
