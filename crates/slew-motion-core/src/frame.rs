//! Per-segment coordinate-frame adapter.
//!
//! A constraint segment exposes its anchor and axes in its own local space,
//! but its rotation/position targets live in the constraint's native frame.
//! [`SegmentFrame`] owns the change of basis between the two, plus a captured
//! baseline target pose that represents "zero" for the segment, so rotation
//! commands compose against a stable reference.

use nalgebra::{Matrix3, Rotation3, UnitQuaternion, UnitVector3, Vector3};

/// Squared-norm floor below which an axis pair cannot span a basis.
const DEGENERATE_EPS: f32 = 1e-6;

// ---------------------------------------------------------------------------
// SegmentFrame
// ---------------------------------------------------------------------------

/// Coordinate transform between a segment's local space and its constraint's
/// native space, with a captured baseline target pose.
///
/// `local_to_joint` and `joint_to_local` are exact inverses by construction.
/// Rebuilding the frame (see [`rebaseline`](Self::rebaseline)) recomputes
/// both from the segment's current axes and re-captures the baseline.
#[derive(Debug, Clone)]
pub struct SegmentFrame {
    local_to_joint: UnitQuaternion<f32>,
    joint_to_local: UnitQuaternion<f32>,
    anchor: Vector3<f32>,
    base_rotation: UnitQuaternion<f32>,
    base_position: Vector3<f32>,
}

impl SegmentFrame {
    /// Build a frame from a segment's axes, anchor, and current targets.
    ///
    /// The basis is orthonormalized Gram-Schmidt style: right along `axis`,
    /// forward along `axis × secondary`, up completing the right-handed
    /// triad.  Returns `None` when `axis` and `secondary` are parallel or
    /// near zero, since such a segment cannot define a rotation plane.
    #[must_use]
    pub fn try_new(
        axis: &Vector3<f32>,
        secondary: &Vector3<f32>,
        anchor: Vector3<f32>,
        target_rotation: UnitQuaternion<f32>,
        target_position: Vector3<f32>,
    ) -> Option<Self> {
        if axis.norm_squared() < DEGENERATE_EPS {
            return None;
        }
        let right = axis.normalize();
        let forward = right.cross(secondary);
        if forward.norm_squared() < DEGENERATE_EPS {
            return None;
        }
        let forward = forward.normalize();
        let up = forward.cross(&right).normalize();

        // Columns (right, up, forward) map native X/Y/Z onto the segment's
        // local axes; the triad is right-handed, so this is a pure rotation.
        let basis = Matrix3::from_columns(&[right, up, forward]);
        let joint_to_local =
            UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis));
        let local_to_joint = joint_to_local.inverse();

        Some(Self {
            local_to_joint,
            joint_to_local,
            anchor,
            base_rotation: target_rotation,
            base_position: target_position,
        })
    }

    /// Baseline target rotation captured at setup.
    #[must_use]
    pub const fn base_rotation(&self) -> UnitQuaternion<f32> {
        self.base_rotation
    }

    /// Baseline target position captured at setup.
    #[must_use]
    pub const fn base_position(&self) -> Vector3<f32> {
        self.base_position
    }

    // -- Direction / point / rotation mappings --

    /// Rotate a direction vector from segment-local into native space.
    #[must_use]
    pub fn local_to_joint_dir(&self, v: &Vector3<f32>) -> Vector3<f32> {
        self.local_to_joint * v
    }

    /// Rotate a direction vector from native into segment-local space.
    #[must_use]
    pub fn joint_to_local_dir(&self, v: &Vector3<f32>) -> Vector3<f32> {
        self.joint_to_local * v
    }

    /// Map a point from segment-local into native space.  Points are
    /// anchor-relative: the anchor is subtracted before the rotation.
    #[must_use]
    pub fn local_to_joint_point(&self, p: &Vector3<f32>) -> Vector3<f32> {
        self.local_to_joint * (p - self.anchor)
    }

    /// Map a point from native into segment-local space, re-adding the
    /// anchor.
    #[must_use]
    pub fn joint_to_local_point(&self, p: &Vector3<f32>) -> Vector3<f32> {
        self.joint_to_local * p + self.anchor
    }

    /// Conjugate a rotation from segment-local into native space.
    #[must_use]
    pub fn local_to_joint_rot(&self, r: &UnitQuaternion<f32>) -> UnitQuaternion<f32> {
        self.local_to_joint * r * self.joint_to_local
    }

    /// Conjugate a rotation from native into segment-local space.
    #[must_use]
    pub fn joint_to_local_rot(&self, r: &UnitQuaternion<f32>) -> UnitQuaternion<f32> {
        self.joint_to_local * r * self.local_to_joint
    }

    // -- Target computation --

    /// Segment target position placing the assembly at `local_pos` relative
    /// to the baseline.  Pure translation, used by welding bake-in only.
    #[must_use]
    pub fn position_target(&self, local_pos: &Vector3<f32>) -> Vector3<f32> {
        self.base_position + self.local_to_joint_dir(local_pos)
    }

    /// Segment targets rotating the assembly by `angle_deg` about
    /// `local_axis` through `local_node`, both in segment-local space.
    ///
    /// Returns `(target_rotation, target_position)`.  The position term
    /// orbits the baseline position around the pivot so the segment's
    /// internal anchor stays consistent while the assembly turns.
    #[must_use]
    pub fn rotation_target(
        &self,
        angle_deg: f32,
        local_axis: &UnitVector3<f32>,
        local_node: &Vector3<f32>,
    ) -> (UnitQuaternion<f32>, Vector3<f32>) {
        let spin = UnitQuaternion::from_axis_angle(local_axis, angle_deg.to_radians());
        let jr = self.local_to_joint_rot(&spin);
        let jn = self.local_to_joint_point(local_node);

        let rotation = self.base_rotation * jr;
        let position = jr * (self.base_position - jn) + jn;
        (rotation, position)
    }

    /// Re-baseline onto the segment's now-applied pose (staticize).
    ///
    /// The applied rotation/position become the new zero and the basis is
    /// recomputed from the segment's current axes; subsequent commands
    /// compose against the fresh reference.  The segment's externally
    /// observable pose is unchanged, and the call is idempotent while no
    /// rotation command intervenes.
    ///
    /// Returns `false` (leaving the frame untouched) if the axes have gone
    /// degenerate.
    pub fn rebaseline(
        &mut self,
        applied_rotation: UnitQuaternion<f32>,
        applied_position: Vector3<f32>,
        axis: &Vector3<f32>,
        secondary: &Vector3<f32>,
        anchor: Vector3<f32>,
    ) -> bool {
        match Self::try_new(axis, secondary, anchor, applied_rotation, applied_position) {
            Some(fresh) => {
                *self = fresh;
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
