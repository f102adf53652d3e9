//! ECS components for the joint rig.
//!
//! Bodies carry a live world pose ([`BodyFrame`]), a save-stable pose
//! ([`PersistedPose`]), tree links ([`BodyParent`], [`BodyChildren`]) and
//! optionally a [`ResourcePool`].  A [`RigJoint`] connects a host and a
//! target body through ordered [`JointSegment`] entities.  These are the
//! collaborator surfaces the actuator drives; the host application owns
//! their lifecycle.

use bevy::prelude::*;
use nalgebra::{Isometry3, UnitQuaternion, Vector3};

// ---------------------------------------------------------------------------
// BodyFrame
// ---------------------------------------------------------------------------

/// Live world pose of a rig body, written by the host's physics
/// integration and read here when capturing rotation geometry.
#[derive(Component, Debug, Clone)]
pub struct BodyFrame(pub Isometry3<f32>);

impl BodyFrame {
    /// Identity pose at the world origin.
    #[must_use]
    pub fn identity() -> Self {
        Self(Isometry3::identity())
    }
}

// ---------------------------------------------------------------------------
// PersistedPose
// ---------------------------------------------------------------------------

/// Save-stable pose in the assembly root's frame, independent of the live
/// simulated pose.  Completed rotations are baked in here so they survive
/// teardown and rebuild of the live constraint.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct PersistedPose {
    /// Orientation in the root's frame.
    pub rotation: UnitQuaternion<f32>,
    /// Position in the root's frame.
    pub position: Vector3<f32>,
}

impl Default for PersistedPose {
    fn default() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            position: Vector3::zeros(),
        }
    }
}

// ---------------------------------------------------------------------------
// Body tree
// ---------------------------------------------------------------------------

/// Parent link in the body tree.  `None` marks the assembly root.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct BodyParent(pub Option<Entity>);

/// Ordered children in the body tree.
///
/// The tree is acyclic by construction; [`assert_acyclic`] checks the
/// invariant at attach time so traversals can assume it.
#[derive(Component, Debug, Clone, Default)]
pub struct BodyChildren(pub Vec<Entity>);

/// Panics if walking `BodyParent` links upward from `body` revisits `body`.
///
/// Call after rewiring the tree, not during traversal.
pub fn assert_acyclic(world: &World, body: Entity) {
    let mut current = body;
    let mut hops = 0_usize;
    while let Some(&BodyParent(Some(parent))) = world.get::<BodyParent>(current) {
        assert!(parent != body, "body tree cycle through {body:?}");
        hops += 1;
        assert!(hops < 10_000, "body tree too deep, suspected cycle");
        current = parent;
    }
}

// ---------------------------------------------------------------------------
// ResourcePool
// ---------------------------------------------------------------------------

/// Per-body consumable pool.  Rotation drains it proportionally to elapsed
/// time; an empty pool brakes the actuator rather than aborting it.
#[derive(Component, Debug, Clone)]
pub struct ResourcePool {
    stored: f32,
}

impl ResourcePool {
    /// Pool holding `stored` units.
    #[must_use]
    pub const fn new(stored: f32) -> Self {
        Self { stored }
    }

    /// Units currently stored.
    #[must_use]
    pub const fn stored(&self) -> f32 {
        self.stored
    }

    /// Withdraw up to `amount` units; returns what was actually granted.
    pub fn request(&mut self, amount: f32) -> f32 {
        let granted = amount.clamp(0.0, self.stored);
        self.stored -= granted;
        granted
    }
}

// ---------------------------------------------------------------------------
// RigJoint
// ---------------------------------------------------------------------------

/// Logical joint between a host and a target body, composed of one or more
/// ordered constraint segments.
///
/// Identity is the joint entity itself, never the body pair: an auxiliary
/// non-hierarchical joint may coexist with a hierarchical one between the
/// same two bodies.  The actuator always drives the target body (the
/// subtree side of the link).
#[derive(Component, Debug, Clone)]
pub struct RigJoint {
    /// Body the joint is mounted on.
    pub host: Entity,
    /// Body the joint drives.
    pub target: Entity,
    /// Ordered constraint segments making up the joint.
    pub segments: Vec<Entity>,
    /// Whether this joint is the target body's actual hierarchical parent
    /// link.  Only then does a finished rotation bake into persisted poses.
    pub hierarchical: bool,
}

// ---------------------------------------------------------------------------
// JointSegment
// ---------------------------------------------------------------------------

/// Free/locked drive mode for one constraint axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionMode {
    /// Axis held by the constraint solver.
    #[default]
    Locked,
    /// Axis free to follow the commanded target.
    Free,
}

/// The atomic constrained pair within a joint.
///
/// Axes and anchor are expressed in the host body's local space; the
/// commanded targets live in the constraint's native space (the basis the
/// segment's [`SegmentFrame`](slew_motion_core::frame::SegmentFrame)
/// derives from `axis` and `secondary_axis`).
#[derive(Component, Debug, Clone)]
pub struct JointSegment {
    /// Primary axis (the hinge), host-local.
    pub axis: Vector3<f32>,
    /// Secondary axis completing the basis, host-local.
    pub secondary_axis: Vector3<f32>,
    /// Anchor point, host-local.
    pub anchor: Vector3<f32>,
    /// Commanded target rotation, constraint-native.
    pub target_rotation: UnitQuaternion<f32>,
    /// Commanded target position, constraint-native.
    pub target_position: Vector3<f32>,
    /// Drive mode for linear X/Y/Z then angular X/Y/Z.
    pub motion_modes: [MotionMode; 6],
}

impl JointSegment {
    /// Segment with the given geometry, identity targets, all axes locked.
    #[must_use]
    pub fn new(axis: Vector3<f32>, secondary_axis: Vector3<f32>, anchor: Vector3<f32>) -> Self {
        Self {
            axis,
            secondary_axis,
            anchor,
            target_rotation: UnitQuaternion::identity(),
            target_position: Vector3::zeros(),
            motion_modes: [MotionMode::Locked; 6],
        }
    }

    /// Release all six axes so the solver follows the commanded targets.
    pub fn free_all(&mut self) {
        self.motion_modes = [MotionMode::Free; 6];
    }

    /// Whether every axis is free.
    #[must_use]
    pub fn is_fully_free(&self) -> bool {
        self.motion_modes.iter().all(|m| *m == MotionMode::Free)
    }
}

// ---------------------------------------------------------------------------
// SpeedControl
// ---------------------------------------------------------------------------

/// Live speed request from the controller that owns a rotation.
///
/// Sampled every tick by the actuator; changing `requested` adjusts the
/// profile's speed limit mid-flight without restarting it.
#[derive(Component, Debug, Clone, Copy)]
pub struct SpeedControl {
    /// Requested speed limit (degrees/second).
    pub requested: f32,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn components_are_send_sync() {
        assert_send_sync::<BodyFrame>();
        assert_send_sync::<PersistedPose>();
        assert_send_sync::<BodyParent>();
        assert_send_sync::<BodyChildren>();
        assert_send_sync::<ResourcePool>();
        assert_send_sync::<RigJoint>();
        assert_send_sync::<JointSegment>();
        assert_send_sync::<SpeedControl>();
    }

    #[test]
    fn persisted_pose_default_is_identity() {
        let pose = PersistedPose::default();
        assert!(pose.rotation.angle().abs() < f32::EPSILON);
        assert!(pose.position.norm() < f32::EPSILON);
    }

    #[test]
    fn resource_pool_grants_up_to_stored() {
        let mut pool = ResourcePool::new(1.0);
        assert!((pool.request(0.4) - 0.4).abs() < f32::EPSILON);
        assert!((pool.request(0.9) - 0.6).abs() < f32::EPSILON);
        assert!(pool.request(0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn resource_pool_rejects_negative_requests() {
        let mut pool = ResourcePool::new(1.0);
        assert!(pool.request(-5.0).abs() < f32::EPSILON);
        assert!((pool.stored() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn segment_starts_locked_and_frees_all() {
        let mut seg = JointSegment::new(Vector3::x(), Vector3::y(), Vector3::zeros());
        assert!(!seg.is_fully_free());
        seg.free_all();
        assert!(seg.is_fully_free());
    }

    #[test]
    fn acyclic_assertion_accepts_chain() {
        let mut world = World::new();
        let root = world.spawn(BodyParent(None)).id();
        let mid = world.spawn(BodyParent(Some(root))).id();
        let leaf = world.spawn(BodyParent(Some(mid))).id();
        assert_acyclic(&world, leaf);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn acyclic_assertion_rejects_cycle() {
        let mut world = World::new();
        let a = world.spawn(BodyParent(None)).id();
        let b = world.spawn(BodyParent(Some(a))).id();
        world.entity_mut(a).insert(BodyParent(Some(b)));
        assert_acyclic(&world, a);
    }
}
