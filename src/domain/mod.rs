//! Domain layer - pure business logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod registry;
pub mod release;
pub mod secret;

// Re-export commonly used types
pub use registry::{Domains, Registry};
pub use release::{ReleaseValues, Removal};
