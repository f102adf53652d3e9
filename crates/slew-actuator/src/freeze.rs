//! Freeze/thaw: suspending an in-flight rotation across a structural
//! interruption.
//!
//! When a joint must be torn down while its actuator is mid-motion, the
//! remainder of the rotation is captured as a [`FrozenRotation`] on the
//! controller entity and the actuator is aborted; its stop hook still
//! staticizes, so the joint ends at a well-defined, saved pose.  Once the
//! joint is rebuilt, thawing resubmits the pending remainder.

use bevy::log::debug;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::registry::{enqueue_rotation, ActuatorRegistry};

// ---------------------------------------------------------------------------
// FrozenRotation
// ---------------------------------------------------------------------------

/// A saved, not-yet-applied remainder of a rotation.
///
/// Owned by the controller, not the actuator; the host's persistence layer
/// saves and restores it verbatim across a suspend/resume boundary.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrozenRotation {
    /// Remaining angle (degrees).
    pub angle: f32,
    /// Speed limit the rotation ran at (degrees/second).
    pub speed: f32,
    /// Velocity to resume with (degrees/second); zero for a cold restart.
    pub start_speed: f32,
}

impl FrozenRotation {
    /// Whether there is anything left to apply.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.angle != 0.0
    }

    /// Fold another interrupted remainder into this record.  Angles
    /// accumulate; speed and start speed take the latest values.
    pub fn accumulate(&mut self, angle: f32, speed: f32, start_speed: f32) {
        self.angle += angle;
        self.speed = speed;
        self.start_speed = start_speed;
    }
}

// ---------------------------------------------------------------------------
// freeze / thaw
// ---------------------------------------------------------------------------

/// Suspend the rotation `controller` owns on `joint`.
///
/// The remaining angle, the speed limit, and (with `keep_speed`) the
/// current velocity are folded into the controller's [`FrozenRotation`];
/// the actuator is aborted (staticizing on the way out) and removed from
/// the registry.  Returns `false` when `joint` has no actuator owned by
/// `controller`.
pub fn freeze_rotation(
    world: &mut World,
    joint: Entity,
    controller: Entity,
    keep_speed: bool,
) -> bool {
    let mut frozen = None;
    world.resource_scope(|world, mut registry: Mut<ActuatorRegistry>| {
        let Some(mut actuator) = registry.remove(joint) else {
            return;
        };
        if actuator.rig.controller != Some(controller) {
            registry.insert(actuator);
            return;
        }
        let profile = &actuator.profile;
        let remainder = (
            profile.tgt - profile.pos,
            profile.maxvel,
            if keep_speed { profile.vel } else { 0.0 },
        );
        actuator.abort(world);
        frozen = Some(remainder);
    });

    let Some((angle, speed, start_speed)) = frozen else {
        return false;
    };
    debug!("froze rotation on {joint:?}: {angle}° at {speed}°/s");
    if let Some(mut record) = world.get_mut::<FrozenRotation>(controller) {
        record.accumulate(angle, speed, start_speed);
    } else if let Ok(mut entity) = world.get_entity_mut(controller) {
        entity.insert(FrozenRotation {
            angle,
            speed,
            start_speed,
        });
    }
    true
}

/// Resubmit `controller`'s pending rotation against the rebuilt `joint`.
///
/// Clears the record once [`enqueue_rotation`] accepts it.  Returns `true`
/// only when a pending rotation was accepted.
pub fn thaw_rotation(world: &mut World, joint: Entity, controller: Entity) -> bool {
    let Some(&record) = world.get::<FrozenRotation>(controller) else {
        return false;
    };
    if !record.is_pending() {
        return false;
    }
    if !enqueue_rotation(
        world,
        joint,
        Some(controller),
        record.angle,
        record.speed,
        record.start_speed,
    ) {
        return false;
    }
    if let Some(mut record) = world.get_mut::<FrozenRotation>(controller) {
        *record = FrozenRotation::default();
    }
    debug!("thawed rotation onto {joint:?}");
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
