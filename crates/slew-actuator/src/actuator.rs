//! The per-joint actuator.
//!
//! A [`JointActuator`] composes a [`MotionProfile`] with the world-facing
//! rig state: one [`SegmentFrame`] per constraint segment plus the rotation
//! axis and pivot node captured in the driving body's local space.  The
//! profile supplies the angle; the rig turns it into segment targets every
//! tick and, when motion stops, staticizes the result into the segments'
//! baselines and the bodies' persisted poses.

use bevy::log::warn;
use bevy::prelude::*;
use nalgebra::{Isometry3, Point3, UnitQuaternion, UnitVector3, Vector3};
use slew_motion_core::frame::SegmentFrame;
use slew_motion_core::profile::{MotionHooks, MotionProfile};

use crate::components::{
    BodyChildren, BodyFrame, JointSegment, PersistedPose, ResourcePool, RigJoint, SpeedControl,
};
use crate::release::ConflictReleasers;

// ---------------------------------------------------------------------------
// Isometry helpers
// ---------------------------------------------------------------------------

/// Transform a position stored as a `Vector3` (isometry point transform,
/// not the rotation-only `Vector3` operator).
pub(crate) fn transform_point(iso: &Isometry3<f32>, p: &Vector3<f32>) -> Vector3<f32> {
    iso.transform_point(&Point3::from(*p)).coords
}

/// Inverse of [`transform_point`].
pub(crate) fn inverse_transform_point(iso: &Isometry3<f32>, p: &Vector3<f32>) -> Vector3<f32> {
    iso.inverse_transform_point(&Point3::from(*p)).coords
}

// ---------------------------------------------------------------------------
// SegmentDrive
// ---------------------------------------------------------------------------

/// One driven constraint segment with its frame adapter and the rotation
/// geometry captured at start: axis/pivot in segment-local space and in the
/// opposing body's frame (for the anchor correction at staticize).
#[derive(Debug, Clone)]
struct SegmentDrive {
    entity: Entity,
    frame: SegmentFrame,
    local_axis: UnitVector3<f32>,
    local_node: Vector3<f32>,
    connected_axis: UnitVector3<f32>,
    connected_node: Vector3<f32>,
}

// ---------------------------------------------------------------------------
// ActuatorRig
// ---------------------------------------------------------------------------

/// World-facing half of a joint actuator.
#[derive(Debug, Clone)]
pub struct ActuatorRig {
    /// Joint this actuator drives (registry key).
    pub joint: Entity,
    /// Driving body: the joint's target, the subtree side of the link.
    pub body: Entity,
    /// Rotation axis, driving-body-local.
    pub axis: UnitVector3<f32>,
    /// Pivot node the rotation passes through, driving-body-local.
    pub pivot: Vector3<f32>,
    /// Controller owning live speed changes, if any.
    pub controller: Option<Entity>,
    /// Resource units consumed per second of active rotation (0 = none).
    pub resource_rate: f32,
    zero: f32,
    last_pos: f32,
    dynamic_delta: f32,
    segments: Vec<SegmentDrive>,
}

impl ActuatorRig {
    /// Start hook: release conflicting links, free the segments, and
    /// capture per-segment rotation geometry.
    fn start(&mut self, world: &mut World, profile: &MotionProfile) {
        if world.contains_resource::<ConflictReleasers>() {
            world.resource_scope(|world, releasers: Mut<ConflictReleasers>| {
                releasers.release_all(world, self.body);
            });
        }

        let Some(joint) = world.get::<RigJoint>(self.joint).cloned() else {
            warn!("actuator started on missing joint {:?}", self.joint);
            return;
        };
        let Some(&BodyFrame(body_iso)) = world.get::<BodyFrame>(self.body) else {
            warn!("driving body {:?} has no frame", self.body);
            return;
        };
        let connected = if self.body == joint.host {
            joint.target
        } else {
            joint.host
        };
        let Some(&BodyFrame(host_iso)) = world.get::<BodyFrame>(joint.host) else {
            return;
        };
        let Some(&BodyFrame(connected_iso)) = world.get::<BodyFrame>(connected) else {
            return;
        };

        // Driving axis and pivot in world space, then re-expressed in the
        // segment-local (host) space and the opposing body's frame.
        let world_axis = body_iso.rotation * self.axis.into_inner();
        let world_node = transform_point(&body_iso, &self.pivot);
        let local_axis = UnitVector3::new_normalize(host_iso.rotation.inverse() * world_axis);
        let local_node = inverse_transform_point(&host_iso, &world_node);
        let connected_axis =
            UnitVector3::new_normalize(connected_iso.rotation.inverse() * world_axis);
        let connected_node = inverse_transform_point(&connected_iso, &world_node);

        self.segments.clear();
        for (idx, &segment) in joint.segments.iter().enumerate() {
            let Some(mut seg) = world.get_mut::<JointSegment>(segment) else {
                warn!("joint {:?} segment {idx} despawned before start", self.joint);
                continue;
            };
            seg.free_all();
            let (axis, secondary, anchor) = (seg.axis, seg.secondary_axis, seg.anchor);
            let (rot, pos) = (seg.target_rotation, seg.target_position);

            let Some(frame) = SegmentFrame::try_new(&axis, &secondary, anchor, rot, pos) else {
                warn!("joint {:?} segment {idx} has degenerate axes", self.joint);
                continue;
            };
            self.segments.push(SegmentDrive {
                entity: segment,
                frame,
                local_axis,
                local_node,
                connected_axis,
                connected_node,
            });
        }

        self.zero = profile.pos;
        self.last_pos = profile.pos;
    }

    /// Step hook: re-apply the profile angle to every segment, sample the
    /// controller's live speed, and draw resources.
    fn step(&mut self, world: &mut World, profile: &mut MotionProfile, dt: f32) {
        let angle = profile.pos - self.zero;
        for drive in &self.segments {
            let (rot, pos) = drive
                .frame
                .rotation_target(angle, &drive.local_axis, &drive.local_node);
            if let Some(mut seg) = world.get_mut::<JointSegment>(drive.entity) {
                seg.target_rotation = rot;
                seg.target_position = pos;
            }
        }

        if let Some(controller) = self.controller {
            if let Some(&SpeedControl { requested }) = world.get::<SpeedControl>(controller) {
                if requested > 0.0 && (requested - profile.maxvel).abs() > f32::EPSILON {
                    profile.maxvel = requested;
                }
            }
        }

        if dt > 0.0 {
            self.dynamic_delta = profile.pos - self.last_pos;
            self.last_pos = profile.pos;

            if self.resource_rate > 0.0 {
                if let Some(mut pool) = world.get_mut::<ResourcePool>(self.body) {
                    let granted = pool.request(self.resource_rate * dt);
                    if granted <= 0.0 {
                        profile.brake();
                    }
                }
            }
        }
    }

    /// Stop hook: settle, staticize every segment, and bake the rotation
    /// into persisted poses when the joint is the hierarchical parent link.
    fn stop(&mut self, world: &mut World, profile: &mut MotionProfile) {
        self.step(world, profile, 0.0);

        let angle = profile.pos - self.zero;
        for drive in &mut self.segments {
            let Some(seg) = world.get::<JointSegment>(drive.entity) else {
                continue;
            };
            // The solver has converged the drive onto its commanded target
            // by now, so the target pose is the applied pose.
            let applied_rotation = seg.target_rotation;
            let applied_position = seg.target_position;
            let (axis, secondary, anchor) = (seg.axis, seg.secondary_axis, seg.anchor);

            // Anchor correction: re-express the applied position in the
            // opposing body's frame by unwinding the commanded angle about
            // the recorded connected-body pivot.
            let unspin =
                UnitQuaternion::from_axis_angle(&drive.connected_axis, (-angle).to_radians());
            let corrected =
                unspin * (applied_position - drive.connected_node) + drive.connected_node;

            if let Some(mut seg) = world.get_mut::<JointSegment>(drive.entity) {
                seg.target_position = corrected;
            }
            if !drive
                .frame
                .rebaseline(applied_rotation, corrected, &axis, &secondary, anchor)
            {
                warn!(
                    "joint {:?} segment axes degenerate at staticize; baseline kept",
                    self.joint
                );
            }
        }

        self.bake_persisted(world, angle);
    }

    /// Rewrite the persisted pose of the driving body and every descendant
    /// by the completed rotation, expressed in the tree root's frame.
    fn bake_persisted(&self, world: &mut World, angle: f32) {
        let Some(joint) = world.get::<RigJoint>(self.joint) else {
            return;
        };
        if !joint.hierarchical || joint.target != self.body {
            return;
        }
        let Some(pose) = world.get::<PersistedPose>(self.body) else {
            return;
        };
        let axis_root = UnitVector3::new_normalize(pose.rotation * self.axis.into_inner());
        let node_root = pose.rotation * self.pivot + pose.position;
        let spin = UnitQuaternion::from_axis_angle(&axis_root, angle.to_radians());

        let mut stack = vec![self.body];
        while let Some(body) = stack.pop() {
            if let Some(mut pose) = world.get_mut::<PersistedPose>(body) {
                pose.rotation = spin * pose.rotation;
                pose.position = spin * (pose.position - node_root) + node_root;
            }
            if let Some(children) = world.get::<BodyChildren>(body) {
                stack.extend(children.0.iter().copied());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// WorldHooks
// ---------------------------------------------------------------------------

/// Adapter handing the rig its world access from inside profile callbacks.
struct WorldHooks<'a> {
    world: &'a mut World,
    rig: &'a mut ActuatorRig,
}

impl MotionHooks for WorldHooks<'_> {
    fn on_start(&mut self, profile: &mut MotionProfile) {
        self.rig.start(self.world, profile);
    }

    fn on_step(&mut self, profile: &mut MotionProfile, dt: f32) {
        self.rig.step(self.world, profile, dt);
    }

    fn on_stop(&mut self, profile: &mut MotionProfile) {
        self.rig.stop(self.world, profile);
    }
}

// ---------------------------------------------------------------------------
// JointActuator
// ---------------------------------------------------------------------------

/// A motion profile bound to one joint's rig.
///
/// Held by the [`ActuatorRegistry`](crate::registry::ActuatorRegistry) and
/// advanced exactly once per control tick.
#[derive(Debug, Clone)]
pub struct JointActuator {
    /// The trapezoidal profile supplying the angle.
    pub profile: MotionProfile,
    /// The world-facing rig applying it.
    pub rig: ActuatorRig,
}

impl JointActuator {
    /// Build an actuator for `joint` rotating `body` by `angle` degrees
    /// about `axis` through `pivot` (both body-local) at up to `speed`
    /// degrees/second, starting at `start_speed`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        joint: Entity,
        body: Entity,
        axis: UnitVector3<f32>,
        pivot: Vector3<f32>,
        controller: Option<Entity>,
        resource_rate: f32,
        angle: f32,
        speed: f32,
        start_speed: f32,
    ) -> Self {
        Self {
            profile: MotionProfile::new(0.0, angle, speed).with_start_speed(start_speed),
            rig: ActuatorRig {
                joint,
                body,
                axis,
                pivot,
                controller,
                resource_rate,
                zero: 0.0,
                last_pos: 0.0,
                dynamic_delta: 0.0,
                segments: Vec::new(),
            },
        }
    }

    /// Advance the actuator by one control tick.
    pub fn advance(&mut self, world: &mut World, dt: f32) {
        let Self { profile, rig } = self;
        let mut hooks = WorldHooks { world, rig };
        profile.advance(dt, &mut hooks);
    }

    /// Abort: finish now, still running the stop hook (staticize/bake).
    pub fn abort(&mut self, world: &mut World) {
        let Self { profile, rig } = self;
        let mut hooks = WorldHooks { world, rig };
        profile.abort(&mut hooks);
    }

    /// Whether the profile has finished (naturally or via abort).
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.profile.is_finished()
    }

    /// Angle rotated since the segment baselines' zero reference (degrees).
    #[must_use]
    pub fn rotation_angle(&self) -> f32 {
        self.profile.pos - self.rig.zero
    }

    /// Angle accumulated during the most recent tick (degrees).
    #[must_use]
    pub const fn dynamic_delta_angle(&self) -> f32 {
        self.rig.dynamic_delta
    }

    /// Signed shortest delta from the current angle to the nearest multiple
    /// of `step` degrees.  Zero for a non-positive step.
    #[must_use]
    pub fn angle_to_snap(&self, step: f32) -> f32 {
        if step <= 0.0 {
            return 0.0;
        }
        (self.profile.pos / step).round() * step - self.profile.pos
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_actuator(angle: f32) -> JointActuator {
        JointActuator::new(
            Entity::PLACEHOLDER,
            Entity::PLACEHOLDER,
            UnitVector3::new_normalize(Vector3::x()),
            Vector3::zeros(),
            None,
            0.0,
            angle,
            10.0,
            0.0,
        )
    }

    #[test]
    fn new_actuator_targets_requested_angle() {
        let actuator = bare_actuator(90.0);
        assert!((actuator.profile.tgt - 90.0).abs() < f32::EPSILON);
        assert!(actuator.profile.vel.abs() < f32::EPSILON);
        assert!(!actuator.is_finished());
    }

    #[test]
    fn angle_to_snap_finds_nearest_multiple() {
        let mut actuator = bare_actuator(90.0);
        actuator.profile.pos = 47.0;
        assert!((actuator.angle_to_snap(45.0) - (-2.0)).abs() < 1e-5);
        actuator.profile.pos = 40.0;
        assert!((actuator.angle_to_snap(45.0) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn angle_to_snap_rejects_non_positive_step() {
        let mut actuator = bare_actuator(90.0);
        actuator.profile.pos = 13.0;
        assert!(actuator.angle_to_snap(0.0).abs() < f32::EPSILON);
        assert!(actuator.angle_to_snap(-10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rotation_angle_tracks_profile_position() {
        let mut actuator = bare_actuator(90.0);
        actuator.profile.pos = 33.0;
        assert!((actuator.rotation_angle() - 33.0).abs() < f32::EPSILON);
    }

    #[test]
    fn transform_point_round_trip() {
        let iso = Isometry3::new(
            Vector3::new(1.0, -2.0, 3.0),
            Vector3::new(0.4, 0.0, 1.2),
        );
        let p = Vector3::new(5.0, 6.0, -7.0);
        let back = inverse_transform_point(&iso, &transform_point(&iso, &p));
        assert!((back - p).norm() < 1e-4);
    }
}
