//! ECS joint actuation: rig components, the per-joint rotation registry,
//! freeze/thaw, and the control-tick system.
//!
//! Add [`SlewActuatorPlugin`] after
//! [`SlewCorePlugin`](slew_core::SlewCorePlugin), spawn body/joint/segment
//! entities, then request rotations through
//! [`enqueue_rotation`](registry::enqueue_rotation):
//!
//! ```
//! use bevy::prelude::*;
//! use nalgebra::Vector3;
//! use slew_actuator::prelude::*;
//! use slew_core::prelude::*;
//!
//! let mut app = App::new();
//! app.add_plugins(SlewCorePlugin);
//! app.add_plugins(SlewActuatorPlugin);
//! app.finish();
//! app.cleanup();
//!
//! let world = app.world_mut();
//! let host = world.spawn(BodyFrame::identity()).id();
//! let target = world.spawn(BodyFrame::identity()).id();
//! let segment = world
//!     .spawn(JointSegment::new(Vector3::x(), Vector3::y(), Vector3::zeros()))
//!     .id();
//! let joint = world
//!     .spawn(RigJoint { host, target, segments: vec![segment], hierarchical: false })
//!     .id();
//!
//! assert!(enqueue_rotation(world, joint, None, 90.0, 10.0, 0.0));
//! app.update(); // one control tick
//! ```

pub mod actuator;
pub mod components;
pub mod freeze;
pub mod registry;
pub mod release;
pub mod systems;

/// Re-export the pure motion crate for downstream convenience.
pub use slew_motion_core;

use bevy::prelude::*;
use slew_core::SlewSet;

// ---------------------------------------------------------------------------
// SlewActuatorPlugin
// ---------------------------------------------------------------------------

/// Plugin running the control tick in [`SlewSet::Drive`].
///
/// Requires [`SlewCorePlugin`](slew_core::SlewCorePlugin) to be added first
/// (it provides [`MotionConfig`](slew_core::MotionConfig) and the system-set
/// ordering).
pub struct SlewActuatorPlugin;

impl Plugin for SlewActuatorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<registry::ActuatorRegistry>()
            .init_resource::<release::ConflictReleasers>()
            .add_systems(Update, systems::actuator_tick.in_set(SlewSet::Drive));
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::SlewActuatorPlugin;
    pub use crate::actuator::JointActuator;
    pub use crate::components::{
        BodyChildren, BodyFrame, BodyParent, JointSegment, MotionMode, PersistedPose,
        ResourcePool, RigJoint, SpeedControl,
    };
    pub use crate::freeze::{FrozenRotation, freeze_rotation, thaw_rotation};
    pub use crate::registry::{ActuatorRegistry, enqueue_rotation};
    pub use crate::release::{ConflictReleaser, ConflictReleasers};
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
