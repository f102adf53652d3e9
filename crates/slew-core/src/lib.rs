//! Configuration, simulation clock, errors, and system-set ordering for the
//! Slew joint actuation stack.
//!
//! Add [`SlewCorePlugin`] before any other Slew plugin: it inserts
//! [`MotionConfig`](config::MotionConfig) and [`SimTime`](time::SimTime) and
//! establishes the [`SlewSet`] ordering the actuation systems rely on.

pub mod config;
pub mod error;
pub mod time;

use bevy::prelude::*;

pub use config::MotionConfig;
pub use error::{ConfigError, SetupError, SlewError};
pub use time::SimTime;

// ---------------------------------------------------------------------------
// SlewSet
// ---------------------------------------------------------------------------

/// System-set ordering for one control tick.
///
/// `Drive` advances motion profiles and writes segment targets; `Commit`
/// is where host systems observe finished rotations and freshly baked
/// persisted poses.  `Drive` always runs before `Commit` within a tick.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlewSet {
    /// Advance actuators, write constraint targets, consume resources.
    Drive,
    /// React to completed rotations and staticized poses.
    Commit,
}

// ---------------------------------------------------------------------------
// SlewCorePlugin
// ---------------------------------------------------------------------------

/// Core plugin: resources plus system-set ordering.
pub struct SlewCorePlugin;

impl Plugin for SlewCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MotionConfig>()
            .init_resource::<SimTime>()
            .configure_sets(Update, (SlewSet::Drive, SlewSet::Commit).chain())
            .add_systems(Update, advance_sim_clock.in_set(SlewSet::Drive));
    }
}

/// Advances the integer-nanosecond clock by one control tick.
fn advance_sim_clock(config: Res<MotionConfig>, mut time: ResMut<SimTime>) {
    time.tick(config.control_dt);
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::config::MotionConfig;
    pub use crate::error::{ConfigError, SetupError, SlewError};
    pub use crate::time::SimTime;
    pub use crate::{SlewCorePlugin, SlewSet};
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_inserts_core_resources() {
        let mut app = App::new();
        app.add_plugins(SlewCorePlugin);
        app.finish();
        app.cleanup();

        assert!(app.world().get_resource::<MotionConfig>().is_some());
        assert!(app.world().get_resource::<SimTime>().is_some());
    }

    #[test]
    fn clock_advances_once_per_update() {
        let mut app = App::new();
        app.add_plugins(SlewCorePlugin);
        app.finish();
        app.cleanup();

        app.update();
        app.update();
        app.update();

        let time = app.world().resource::<SimTime>();
        assert_eq!(time.ticks(), 3);
        assert!((time.as_secs() - 0.06).abs() < 1e-9);
    }

    #[test]
    fn clock_respects_configured_dt() {
        let mut app = App::new();
        app.add_plugins(SlewCorePlugin);
        app.insert_resource(MotionConfig {
            control_dt: 0.1,
            ..Default::default()
        });
        app.finish();
        app.cleanup();

        app.update();
        let time = app.world().resource::<SimTime>();
        assert!((time.as_secs() - 0.1).abs() < 1e-9);
    }
}
