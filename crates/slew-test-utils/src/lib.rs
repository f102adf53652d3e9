//! Shared test fixtures and utilities for Slew crates.
//!
//! Provides reusable helpers for building Bevy test apps and spawning
//! body/joint/segment rigs in known configurations.

pub mod app;
pub mod spawn;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use app::{full_test_app, minimal_test_app};
pub use spawn::{attach_child, spawn_body, spawn_body_at, spawn_hinge_rig, HingeRig};
