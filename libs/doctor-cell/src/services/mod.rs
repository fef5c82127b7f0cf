pub mod availability;
pub mod supabase_store;
pub mod template_store;

pub use availability::AvailabilityService;
pub use supabase_store::SupabaseTemplateStore;
pub use template_store::{InMemoryTemplateStore, TemplateStore, TemplateStoreError};
