//! Entity spawn helpers for tests.

use bevy::prelude::*;
use nalgebra::{Isometry3, Vector3};
use slew_actuator::components::{
    BodyChildren, BodyFrame, BodyParent, JointSegment, PersistedPose, RigJoint, assert_acyclic,
};

/// Spawn a rig body at the world origin with identity persisted pose.
pub fn spawn_body(world: &mut World) -> Entity {
    spawn_body_at(world, Isometry3::identity())
}

/// Spawn a rig body with the given live world pose.  The persisted pose
/// mirrors it, as for a freshly loaded assembly.
pub fn spawn_body_at(world: &mut World, iso: Isometry3<f32>) -> Entity {
    world
        .spawn((
            BodyFrame(iso),
            PersistedPose {
                rotation: iso.rotation,
                position: iso.translation.vector,
            },
            BodyParent(None),
            BodyChildren::default(),
        ))
        .id()
}

/// Link `child` under `parent` in the body tree, asserting acyclicity.
pub fn attach_child(world: &mut World, parent: Entity, child: Entity) {
    if let Some(mut p) = world.get_mut::<BodyParent>(child) {
        p.0 = Some(parent);
    }
    if let Some(mut children) = world.get_mut::<BodyChildren>(parent) {
        children.0.push(child);
    }
    assert_acyclic(world, child);
}

/// A spawned single-segment hinge rig.
pub struct HingeRig {
    /// Body the joint is mounted on (assembly root).
    pub host: Entity,
    /// Driven body (child of `host` in the tree).
    pub target: Entity,
    /// The joint entity (registry key).
    pub joint: Entity,
    /// The joint's single segment.
    pub segment: Entity,
}

/// Spawn a canonical hinge: host at the origin, target one unit up, one
/// segment with its hinge along host X through the midpoint between them.
///
/// The joint is hierarchical (the target's parent link), so finished
/// rotations bake into persisted poses.
pub fn spawn_hinge_rig(world: &mut World) -> HingeRig {
    let host = spawn_body(world);
    let target = spawn_body_at(world, Isometry3::translation(0.0, 1.0, 0.0));
    attach_child(world, host, target);

    let segment = world
        .spawn(JointSegment::new(
            Vector3::x(),
            Vector3::y(),
            Vector3::new(0.0, 0.5, 0.0),
        ))
        .id();
    let joint = world
        .spawn(RigJoint {
            host,
            target,
            segments: vec![segment],
            hierarchical: true,
        })
        .id();

    HingeRig {
        host,
        target,
        joint,
        segment,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
