//! The control tick.
//!
//! One exclusive system advances every registered actuator exactly once per
//! tick with [`MotionConfig::control_dt`], then drops finished actuators.
//! Actuators of distinct joints are independent; iteration order between
//! them carries no guarantee.

use bevy::log::warn;
use bevy::prelude::*;
use slew_core::MotionConfig;

use crate::components::RigJoint;
use crate::registry::ActuatorRegistry;

/// Advance all live actuators by one control tick.
///
/// Runs in [`SlewSet::Drive`](slew_core::SlewSet::Drive).  Actuators whose
/// joint entity despawned since the last tick are dropped without a stop
/// hook, since there is nothing left to staticize against; the host should
/// have frozen or aborted them first.
#[allow(clippy::cast_possible_truncation)] // f64 → f32 control_dt
pub fn actuator_tick(world: &mut World) {
    world.resource_scope(|world, mut registry: Mut<ActuatorRegistry>| {
        let dt = world.resource::<MotionConfig>().control_dt as f32;

        registry.retain(|joint, _| {
            let alive = world.get::<RigJoint>(joint).is_some();
            if !alive {
                warn!("dropping actuator for despawned joint {joint:?}");
            }
            alive
        });

        for (_, actuator) in registry.iter_mut() {
            actuator.advance(world, dt);
        }
        registry.sweep_finished();
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BodyFrame, JointSegment};
    use crate::registry::enqueue_rotation;
    use nalgebra::Vector3;

    fn ticked_world() -> World {
        let mut world = World::new();
        world.init_resource::<ActuatorRegistry>();
        world.insert_resource(MotionConfig::default());
        world
    }

    fn spawn_rig(world: &mut World) -> Entity {
        let host = world.spawn(BodyFrame::identity()).id();
        let target = world.spawn(BodyFrame::identity()).id();
        let segment = world
            .spawn(JointSegment::new(Vector3::x(), Vector3::y(), Vector3::zeros()))
            .id();
        world
            .spawn(RigJoint {
                host,
                target,
                segments: vec![segment],
                hierarchical: false,
            })
            .id()
    }

    #[test]
    fn tick_advances_profile() {
        let mut world = ticked_world();
        let joint = spawn_rig(&mut world);
        assert!(enqueue_rotation(&mut world, joint, None, 90.0, 10.0, 0.0));

        actuator_tick(&mut world);

        let registry = world.resource::<ActuatorRegistry>();
        let actuator = registry.get(joint).unwrap();
        assert!(actuator.profile.elapsed > 0.0);
        assert!(actuator.profile.vel > 0.0);
    }

    #[test]
    fn finished_actuators_are_swept() {
        let mut world = ticked_world();
        let joint = spawn_rig(&mut world);
        // A tiny rotation finishes in a handful of ticks.
        assert!(enqueue_rotation(&mut world, joint, None, 0.01, 10.0, 0.0));

        for _ in 0..200 {
            actuator_tick(&mut world);
        }
        assert!(world.resource::<ActuatorRegistry>().is_empty());
    }

    #[test]
    fn despawned_joint_actuator_is_dropped() {
        let mut world = ticked_world();
        let joint = spawn_rig(&mut world);
        assert!(enqueue_rotation(&mut world, joint, None, 90.0, 10.0, 0.0));

        world.despawn(joint);
        actuator_tick(&mut world);
        assert!(world.resource::<ActuatorRegistry>().is_empty());
    }

    #[test]
    fn independent_joints_tick_independently() {
        let mut world = ticked_world();
        let a = spawn_rig(&mut world);
        let b = spawn_rig(&mut world);
        assert!(enqueue_rotation(&mut world, a, None, 90.0, 10.0, 0.0));
        assert!(enqueue_rotation(&mut world, b, None, -90.0, 20.0, 0.0));

        for _ in 0..10 {
            actuator_tick(&mut world);
        }
        let registry = world.resource::<ActuatorRegistry>();
        assert!(registry.get(a).unwrap().profile.pos > 0.0);
        assert!(registry.get(b).unwrap().profile.pos < 0.0);
    }
}
