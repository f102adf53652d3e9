//! Bevy test app builders with various plugin combinations.

use bevy::prelude::*;

/// Create a minimal test app with only the core plugin.
///
/// Provides `SlewSet` system ordering, `MotionConfig`, and `SimTime`, but
/// no actuator systems.
pub fn minimal_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(slew_core::SlewCorePlugin);
    app.finish();
    app.cleanup();
    app
}

/// Create a full-stack test app with the core and actuator plugins.
///
/// One `app.update()` is one control tick at `MotionConfig::control_dt`.
pub fn full_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(slew_core::SlewCorePlugin);
    app.add_plugins(slew_actuator::SlewActuatorPlugin);
    app.finish();
    app.cleanup();
    app
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
