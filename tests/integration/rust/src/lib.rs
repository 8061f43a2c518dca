//! Integration test suite for the object model
//!
//! This crate provides integration tests that verify shapes, stores,
//! descriptors and inline caches work together across component boundaries.

/// Re-export components for test convenience
pub mod components {
    pub use core_types;
    pub use inline_cache;
    pub use object_model;
}

/// Routes `tracing` output through the test harness. Safe to call from
/// every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}
