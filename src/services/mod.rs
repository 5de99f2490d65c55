//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services use infrastructure adapters to perform I/O operations.

pub mod registry_service;
pub mod registry_store;
pub mod release_sync;
pub mod replicator;

// Re-export commonly used types
pub use registry_service::{DeleteOutcome, RegistryManager};
pub use registry_store::RegistryStore;
pub use release_sync::ReleaseSynchronizer;
pub use replicator::Replicator;
