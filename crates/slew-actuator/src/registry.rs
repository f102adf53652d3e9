//! Per-joint actuator registry.
//!
//! At most one actuator may drive a joint at a time.  The registry is the
//! single writer-lookup keyed by joint entity: new rotation requests merge
//! into a running actuator instead of spawning a second one.

use std::collections::HashMap;

use bevy::log::debug;
use bevy::prelude::*;
use nalgebra::UnitVector3;
use slew_core::error::SetupError;
use slew_core::MotionConfig;

use crate::actuator::{inverse_transform_point, transform_point, JointActuator};
use crate::components::{BodyFrame, JointSegment, RigJoint};

/// Squared-norm floor below which segment axes cannot span a basis.
const DEGENERATE_EPS: f32 = 1e-6;

// ---------------------------------------------------------------------------
// ActuatorRegistry
// ---------------------------------------------------------------------------

/// Joint entity → live actuator.  Explicit insert/remove, no ambient state.
#[derive(Resource, Debug, Default)]
pub struct ActuatorRegistry {
    actuators: HashMap<Entity, JointActuator>,
}

impl ActuatorRegistry {
    /// Actuator currently driving `joint`, if any.
    #[must_use]
    pub fn get(&self, joint: Entity) -> Option<&JointActuator> {
        self.actuators.get(&joint)
    }

    /// Mutable access to the actuator driving `joint`.
    pub fn get_mut(&mut self, joint: Entity) -> Option<&mut JointActuator> {
        self.actuators.get_mut(&joint)
    }

    /// Whether `joint` has a live actuator.
    #[must_use]
    pub fn contains(&self, joint: Entity) -> bool {
        self.actuators.contains_key(&joint)
    }

    /// Install an actuator for its joint, replacing any previous one.
    pub fn insert(&mut self, actuator: JointActuator) {
        self.actuators.insert(actuator.rig.joint, actuator);
    }

    /// Remove and return the actuator for `joint`.
    pub fn remove(&mut self, joint: Entity) -> Option<JointActuator> {
        self.actuators.remove(&joint)
    }

    /// Number of live actuators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actuators.len()
    }

    /// Whether no actuators are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actuators.is_empty()
    }

    /// Iterate actuators mutably, in no particular order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut JointActuator)> {
        self.actuators.iter_mut().map(|(&joint, act)| (joint, act))
    }

    /// Drop every finished actuator (its stop hook has already run).
    pub fn sweep_finished(&mut self) {
        self.actuators.retain(|_, actuator| !actuator.is_finished());
    }

    /// Drop actuators whose predicate fails, without running stop hooks.
    /// Used defensively when a joint despawns mid-flight.
    pub fn retain(&mut self, mut keep: impl FnMut(Entity, &JointActuator) -> bool) {
        self.actuators.retain(|&joint, actuator| keep(joint, actuator));
    }
}

// ---------------------------------------------------------------------------
// enqueue_rotation
// ---------------------------------------------------------------------------

/// Request a relative rotation of `joint` by `angle` degrees at up to
/// `speed` degrees/second, starting from `start_speed`.
///
/// Merges into the joint's running actuator when one exists (targets
/// accumulate; an unowned actuator adopts `controller`), otherwise creates
/// one.  Returns `false` without side effects when the joint fails the
/// sanity check; the refusal reason is logged at debug level.
pub fn enqueue_rotation(
    world: &mut World,
    joint: Entity,
    controller: Option<Entity>,
    angle: f32,
    speed: f32,
    start_speed: f32,
) -> bool {
    let speed = if speed > 0.0 {
        speed
    } else {
        world.resource::<MotionConfig>().default_speed
    };

    let mut accepted = false;
    world.resource_scope(|world, mut registry: Mut<ActuatorRegistry>| {
        if let Some(actuator) = registry.get_mut(joint) {
            if !actuator.is_finished() {
                actuator.profile.tgt += angle;
                if actuator.rig.controller.is_none() {
                    actuator.rig.controller = controller;
                }
                accepted = true;
                return;
            }
            // Finished but not yet swept: fall through and replace it.
        }

        match rotation_geometry(world, joint) {
            Ok((body, axis, pivot)) => {
                let resource_rate = world.resource::<MotionConfig>().resource_rate;
                registry.insert(JointActuator::new(
                    joint,
                    body,
                    axis,
                    pivot,
                    controller,
                    resource_rate,
                    angle,
                    speed,
                    start_speed,
                ));
                accepted = true;
            }
            Err(reason) => {
                debug!("rotation request for {joint:?} refused: {reason}");
            }
        }
    });
    accepted
}

/// Sanity-check `joint` and derive the driving body plus the rotation axis
/// and pivot node in that body's local space, from the first segment's
/// hinge geometry.
fn rotation_geometry(
    world: &World,
    joint: Entity,
) -> Result<(Entity, UnitVector3<f32>, nalgebra::Vector3<f32>), SetupError> {
    let rig = world.get::<RigJoint>(joint).ok_or(SetupError::JointMissing)?;
    let host_iso = world
        .get::<BodyFrame>(rig.host)
        .ok_or(SetupError::HostBodyMissing)?
        .0;
    let body_iso = world
        .get::<BodyFrame>(rig.target)
        .ok_or(SetupError::TargetBodyMissing)?
        .0;
    if rig.segments.is_empty() {
        return Err(SetupError::NoSegments);
    }

    let mut hinge = None;
    for (idx, &segment) in rig.segments.iter().enumerate() {
        let seg = world
            .get::<JointSegment>(segment)
            .ok_or(SetupError::SegmentMissing(idx))?;
        if seg.axis.norm_squared() < DEGENERATE_EPS
            || seg.axis.cross(&seg.secondary_axis).norm_squared() < DEGENERATE_EPS
        {
            return Err(SetupError::DegenerateSegmentAxes(idx));
        }
        if hinge.is_none() {
            hinge = Some((seg.axis, seg.anchor));
        }
    }
    let Some((axis_local, anchor_local)) = hinge else {
        return Err(SetupError::NoSegments);
    };

    // Host-local hinge → world → driving-body-local.
    let world_axis = host_iso.rotation * axis_local;
    let world_node = transform_point(&host_iso, &anchor_local);
    let axis = UnitVector3::new_normalize(body_iso.rotation.inverse() * world_axis);
    let pivot = inverse_transform_point(&body_iso, &world_node);

    Ok((rig.target, axis, pivot))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
