//! End-to-end rotation scenarios through the full app loop.

use approx::assert_relative_eq;
use bevy::prelude::*;
use nalgebra::{UnitQuaternion, UnitVector3, Vector3};
use slew_actuator::prelude::*;
use slew_core::prelude::*;
use slew_motion_core::profile::CONTINUOUS;
use slew_test_utils::{full_test_app, spawn_hinge_rig};

/// Run control ticks until the registry is empty or `max` ticks elapse.
/// Returns the number of ticks run.
fn run_until_settled(app: &mut App, max: u32) -> u32 {
    for tick in 0..max {
        if app.world().resource::<ActuatorRegistry>().is_empty() {
            return tick;
        }
        app.update();
    }
    max
}

fn x_axis() -> UnitVector3<f32> {
    UnitVector3::new_normalize(Vector3::x())
}

// ---------------------------------------------------------------------------
// The canonical 90° scenario
// ---------------------------------------------------------------------------

#[test]
fn ninety_degrees_at_ten_deg_per_sec() {
    let mut app = full_test_app();
    let rig = spawn_hinge_rig(app.world_mut());

    assert!(enqueue_rotation(app.world_mut(), rig.joint, None, 90.0, 10.0, 0.0));
    let ticks = run_until_settled(&mut app, 2_000);

    // Trapezoid at 10°/s with a 2 s ramp covers 90° in roughly
    // 90/10 + ramp deficit ≈ 11 s of 20 ms ticks.
    assert!(app.world().resource::<ActuatorRegistry>().is_empty());
    assert!(ticks > 450, "finished suspiciously fast: {ticks} ticks");
    assert!(ticks < 700, "took too long: {ticks} ticks");

    // The segment's applied rotation is the full 90° about the hinge.
    let seg = app.world().get::<JointSegment>(rig.segment).unwrap();
    let expected = UnitQuaternion::from_axis_angle(&x_axis(), 90.0_f32.to_radians());
    assert_relative_eq!(seg.target_rotation.angle_to(&expected), 0.0, epsilon = 1e-3);
    assert!(seg.is_fully_free());
}

#[test]
fn finished_rotation_bakes_into_persisted_pose() {
    let mut app = full_test_app();
    let rig = spawn_hinge_rig(app.world_mut());

    assert!(enqueue_rotation(app.world_mut(), rig.joint, None, 90.0, 10.0, 0.0));
    run_until_settled(&mut app, 2_000);

    // Hinge along X through (0, 0.5, 0): the target body persisted at
    // (0, 1, 0) orbits to (0, 0.5, 0.5) and picks up the 90° rotation.
    let pose = app.world().get::<PersistedPose>(rig.target).unwrap();
    let expected_rot = UnitQuaternion::from_axis_angle(&x_axis(), 90.0_f32.to_radians());
    assert_relative_eq!(pose.rotation.angle_to(&expected_rot), 0.0, epsilon = 1e-3);
    assert_relative_eq!(pose.position, Vector3::new(0.0, 0.5, 0.5), epsilon = 1e-3);

    // The host sits above the driven subtree: untouched.
    let host_pose = app.world().get::<PersistedPose>(rig.host).unwrap();
    assert_relative_eq!(host_pose.rotation.angle(), 0.0, epsilon = 1e-6);
    assert_relative_eq!(host_pose.position, Vector3::zeros(), epsilon = 1e-6);
}

#[test]
fn non_hierarchical_joint_skips_pose_bake() {
    let mut app = full_test_app();
    let rig = spawn_hinge_rig(app.world_mut());
    app.world_mut()
        .get_mut::<RigJoint>(rig.joint)
        .unwrap()
        .hierarchical = false;

    assert!(enqueue_rotation(app.world_mut(), rig.joint, None, 90.0, 10.0, 0.0));
    run_until_settled(&mut app, 2_000);

    let pose = app.world().get::<PersistedPose>(rig.target).unwrap();
    assert_relative_eq!(pose.rotation.angle(), 0.0, epsilon = 1e-6);
    assert_relative_eq!(pose.position, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
}

#[test]
fn bake_propagates_to_descendants() {
    let mut app = full_test_app();
    let rig = spawn_hinge_rig(app.world_mut());
    let grandchild =
        slew_test_utils::spawn_body_at(app.world_mut(), nalgebra::Isometry3::translation(0.0, 2.0, 0.0));
    slew_test_utils::attach_child(app.world_mut(), rig.target, grandchild);

    assert!(enqueue_rotation(app.world_mut(), rig.joint, None, 90.0, 10.0, 0.0));
    run_until_settled(&mut app, 2_000);

    // The grandchild at (0, 2, 0) orbits the same hinge point (0, 0.5, 0):
    // radius 1.5 along Y swings onto Z.
    let pose = app.world().get::<PersistedPose>(grandchild).unwrap();
    assert_relative_eq!(pose.position, Vector3::new(0.0, 0.5, 1.5), epsilon = 1e-3);
}

// ---------------------------------------------------------------------------
// Merging requests
// ---------------------------------------------------------------------------

#[test]
fn double_enqueue_keeps_one_actuator_with_summed_target() {
    let mut app = full_test_app();
    let rig = spawn_hinge_rig(app.world_mut());

    assert!(enqueue_rotation(app.world_mut(), rig.joint, None, 90.0, 10.0, 0.0));
    for _ in 0..50 {
        app.update();
    }
    assert!(enqueue_rotation(app.world_mut(), rig.joint, None, 30.0, 10.0, 0.0));

    {
        let registry = app.world().resource::<ActuatorRegistry>();
        assert_eq!(registry.len(), 1);
        let actuator = registry.get(rig.joint).unwrap();
        assert!((actuator.profile.tgt - 120.0).abs() < 1e-4);
    }

    run_until_settled(&mut app, 2_000);
    let seg = app.world().get::<JointSegment>(rig.segment).unwrap();
    let expected = UnitQuaternion::from_axis_angle(&x_axis(), 120.0_f32.to_radians());
    assert_relative_eq!(seg.target_rotation.angle_to(&expected), 0.0, epsilon = 1e-3);
}

#[test]
fn dynamic_delta_tracks_per_tick_angle() {
    let mut app = full_test_app();
    let rig = spawn_hinge_rig(app.world_mut());

    assert!(enqueue_rotation(app.world_mut(), rig.joint, None, 90.0, 10.0, 0.0));
    for _ in 0..300 {
        app.update(); // deep into the cruise phase
    }

    let registry = app.world().resource::<ActuatorRegistry>();
    let actuator = registry.get(rig.joint).unwrap();
    // Cruising at 10°/s with dt = 0.02 s: 0.2° per tick.
    assert!((actuator.dynamic_delta_angle() - 0.2).abs() < 1e-3);
    assert!(actuator.rotation_angle() > 0.0);
}

// ---------------------------------------------------------------------------
// Live speed control
// ---------------------------------------------------------------------------

#[test]
fn controller_speed_change_applies_mid_flight() {
    let mut app = full_test_app();
    let rig = spawn_hinge_rig(app.world_mut());
    let controller = app.world_mut().spawn(SpeedControl { requested: 10.0 }).id();

    assert!(enqueue_rotation(
        app.world_mut(),
        rig.joint,
        Some(controller),
        360.0,
        10.0,
        0.0
    ));
    for _ in 0..50 {
        app.update();
    }
    app.world_mut()
        .get_mut::<SpeedControl>(controller)
        .unwrap()
        .requested = 30.0;
    app.update();

    let registry = app.world().resource::<ActuatorRegistry>();
    let actuator = registry.get(rig.joint).unwrap();
    assert!((actuator.profile.maxvel - 30.0).abs() < 1e-4);
}

// ---------------------------------------------------------------------------
// Resource exhaustion
// ---------------------------------------------------------------------------

#[test]
fn empty_resource_pool_brakes_gracefully() {
    let mut app = full_test_app();
    app.insert_resource(MotionConfig {
        resource_rate: 1.0,
        ..Default::default()
    });
    let rig = spawn_hinge_rig(app.world_mut());
    // Two seconds of juice: runs dry right as the ramp tops out.
    app.world_mut()
        .entity_mut(rig.target)
        .insert(ResourcePool::new(2.0));

    assert!(enqueue_rotation(app.world_mut(), rig.joint, None, 90.0, 10.0, 0.0));
    run_until_settled(&mut app, 2_000);

    // Stopped early, at a well-defined angle short of the request.
    assert!(app.world().resource::<ActuatorRegistry>().is_empty());
    let seg = app.world().get::<JointSegment>(rig.segment).unwrap();
    let angle = seg.target_rotation.angle().to_degrees();
    assert!(angle > 1.0, "barely moved: {angle}°");
    assert!(angle < 45.0, "brake came too late: {angle}°");

    let pool = app.world().get::<ResourcePool>(rig.target).unwrap();
    assert!(pool.stored() < 1e-3);
}

// ---------------------------------------------------------------------------
// Continuous rotation
// ---------------------------------------------------------------------------

#[test]
fn continuous_rotation_runs_until_frozen() {
    let mut app = full_test_app();
    let rig = spawn_hinge_rig(app.world_mut());
    let controller = app.world_mut().spawn_empty().id();

    assert!(enqueue_rotation(
        app.world_mut(),
        rig.joint,
        Some(controller),
        2.0 * CONTINUOUS,
        60.0,
        0.0
    ));
    for _ in 0..2_000 {
        app.update();
    }
    assert!(!app.world().resource::<ActuatorRegistry>().is_empty());

    assert!(freeze_rotation(app.world_mut(), rig.joint, controller, false));
    assert!(app.world().resource::<ActuatorRegistry>().is_empty());

    // The pending remainder is the (bounded) distance to the sentinel.
    let record = app.world().get::<FrozenRotation>(controller).unwrap();
    assert!(record.is_pending());
    assert!((record.speed - 60.0).abs() < 1e-4);
}

// ---------------------------------------------------------------------------
// Freeze / thaw
// ---------------------------------------------------------------------------

#[test]
fn freeze_requires_owning_controller() {
    let mut app = full_test_app();
    let rig = spawn_hinge_rig(app.world_mut());
    let owner = app.world_mut().spawn_empty().id();
    let stranger = app.world_mut().spawn_empty().id();

    assert!(enqueue_rotation(
        app.world_mut(),
        rig.joint,
        Some(owner),
        90.0,
        10.0,
        0.0
    ));
    app.update();

    assert!(!freeze_rotation(app.world_mut(), rig.joint, stranger, false));
    assert!(!app.world().resource::<ActuatorRegistry>().is_empty());
}

#[test]
fn freeze_then_thaw_matches_uninterrupted_run() {
    // Interrupted rig.
    let mut app_a = full_test_app();
    let rig_a = spawn_hinge_rig(app_a.world_mut());
    let controller = app_a.world_mut().spawn_empty().id();

    assert!(enqueue_rotation(
        app_a.world_mut(),
        rig_a.joint,
        Some(controller),
        90.0,
        10.0,
        0.0
    ));
    for _ in 0..200 {
        app_a.update(); // ~4 s: mid-cruise
    }
    assert!(freeze_rotation(app_a.world_mut(), rig_a.joint, controller, true));
    let record = *app_a.world().get::<FrozenRotation>(controller).unwrap();
    assert!(record.is_pending());
    assert!(record.start_speed > 0.0); // keep_speed carried the velocity

    assert!(thaw_rotation(app_a.world_mut(), rig_a.joint, controller));
    assert!(!app_a.world().get::<FrozenRotation>(controller).unwrap().is_pending());
    run_until_settled(&mut app_a, 2_000);

    // Uninterrupted reference rig.
    let mut app_b = full_test_app();
    let rig_b = spawn_hinge_rig(app_b.world_mut());
    assert!(enqueue_rotation(app_b.world_mut(), rig_b.joint, None, 90.0, 10.0, 0.0));
    run_until_settled(&mut app_b, 2_000);

    let pose_a = app_a.world().get::<PersistedPose>(rig_a.target).unwrap().clone();
    let pose_b = app_b.world().get::<PersistedPose>(rig_b.target).unwrap().clone();
    assert_relative_eq!(pose_a.rotation.angle_to(&pose_b.rotation), 0.0, epsilon = 1e-2);
    assert_relative_eq!(pose_a.position, pose_b.position, epsilon = 1e-2);
}

#[test]
fn thaw_without_pending_rotation_is_refused() {
    let mut app = full_test_app();
    let rig = spawn_hinge_rig(app.world_mut());
    let controller = app.world_mut().spawn_empty().id();

    assert!(!thaw_rotation(app.world_mut(), rig.joint, controller));
    assert!(app.world().resource::<ActuatorRegistry>().is_empty());
}

// ---------------------------------------------------------------------------
// Conflict releasers
// ---------------------------------------------------------------------------

#[derive(Resource, Default)]
struct Released(Vec<Entity>);

struct RecordingReleaser;

impl ConflictReleaser for RecordingReleaser {
    fn release(&self, world: &mut World, body: Entity) {
        world.resource_mut::<Released>().0.push(body);
    }

    fn name(&self) -> &str {
        "RecordingReleaser"
    }
}

#[test]
fn conflict_releasers_fire_once_at_start() {
    let mut app = full_test_app();
    app.init_resource::<Released>();
    app.world_mut()
        .resource_mut::<ConflictReleasers>()
        .register(Box::new(RecordingReleaser));
    let rig = spawn_hinge_rig(app.world_mut());

    assert!(enqueue_rotation(app.world_mut(), rig.joint, None, 45.0, 10.0, 0.0));
    assert!(app.world().resource::<Released>().0.is_empty()); // not yet started

    app.update();
    app.update();
    app.update();

    // Fired exactly once, for the driving (target) body.
    assert_eq!(app.world().resource::<Released>().0, vec![rig.target]);
}

// ---------------------------------------------------------------------------
// Staticize contract
// ---------------------------------------------------------------------------

#[test]
fn staticize_leaves_segment_rotation_at_applied_value() {
    let mut app = full_test_app();
    let rig = spawn_hinge_rig(app.world_mut());

    assert!(enqueue_rotation(app.world_mut(), rig.joint, None, 30.0, 10.0, 0.0));
    run_until_settled(&mut app, 2_000);
    let after_first = app
        .world()
        .get::<JointSegment>(rig.segment)
        .unwrap()
        .target_rotation;

    // A second rotation composes on top of the staticized baseline.
    assert!(enqueue_rotation(app.world_mut(), rig.joint, None, 30.0, 10.0, 0.0));
    run_until_settled(&mut app, 2_000);
    let after_second = app
        .world()
        .get::<JointSegment>(rig.segment)
        .unwrap()
        .target_rotation;

    let expected_first = UnitQuaternion::from_axis_angle(&x_axis(), 30.0_f32.to_radians());
    let expected_second = UnitQuaternion::from_axis_angle(&x_axis(), 60.0_f32.to_radians());
    assert_relative_eq!(after_first.angle_to(&expected_first), 0.0, epsilon = 1e-3);
    assert_relative_eq!(after_second.angle_to(&expected_second), 0.0, epsilon = 1e-3);
}
