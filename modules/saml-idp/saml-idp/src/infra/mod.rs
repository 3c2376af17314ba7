//! Infrastructure adapters.

pub mod capability_registry;
pub mod session_store;

pub use capability_registry::StaticCapabilityRegistry;
pub use session_store::InMemorySessionStore;
