//! Self-populating caches.

mod instance;

pub use instance::*;
