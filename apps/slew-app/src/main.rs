//! Slew joint actuation CLI.
//!
//! Provides two modes of operation:
//! - `spin`: Drive a scripted hinge rotation headless and print the profile
//!   trace and the baked pose
//! - `info`: Print workspace crate versions and configuration

use bevy::prelude::*;
use clap::{Parser, Subcommand};
use nalgebra::{Isometry3, Vector3};

use slew_actuator::prelude::*;
use slew_core::prelude::*;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Slew rotary joint actuation.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a hinge through a rotation and print the result.
    Spin {
        /// Relative angle to rotate (degrees).
        #[arg(short, long, default_value_t = 90.0)]
        angle: f32,

        /// Speed limit (degrees/second).
        #[arg(short, long, default_value_t = 10.0)]
        speed: f32,

        /// Control timestep (seconds).
        #[arg(short, long, default_value_t = 0.02)]
        dt: f64,

        /// Print the profile state every N ticks (0 = only the summary).
        #[arg(short, long, default_value_t = 50)]
        trace_every: u32,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

/// Spawn a canonical hinge: host at the origin, target one unit up, hinge
/// along host X through the midpoint between them.
fn spawn_demo_rig(world: &mut World) -> (Entity, Entity) {
    let host = world
        .spawn((
            BodyFrame::identity(),
            PersistedPose::default(),
            BodyParent(None),
            BodyChildren::default(),
        ))
        .id();
    let target_iso = Isometry3::translation(0.0, 1.0, 0.0);
    let target = world
        .spawn((
            BodyFrame(target_iso),
            PersistedPose {
                rotation: target_iso.rotation,
                position: target_iso.translation.vector,
            },
            BodyParent(Some(host)),
            BodyChildren::default(),
        ))
        .id();
    if let Some(mut children) = world.get_mut::<BodyChildren>(host) {
        children.0.push(target);
    }

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

    (joint, target)
}

fn run_spin(angle: f32, speed: f32, dt: f64, trace_every: u32) {
    let mut app = App::new();
    app.add_plugins(SlewCorePlugin);
    app.add_plugins(SlewActuatorPlugin);
    app.insert_resource(MotionConfig {
        control_dt: dt,
        ..Default::default()
    });
    app.finish();
    app.cleanup();

    let (joint, target) = spawn_demo_rig(app.world_mut());

    if !enqueue_rotation(app.world_mut(), joint, None, angle, speed, 0.0) {
        eprintln!("rotation request refused");
        std::process::exit(1);
    }
    println!("spinning {angle}° at up to {speed}°/s, dt = {dt}s");

    let mut ticks: u32 = 0;
    while !app.world().resource::<ActuatorRegistry>().is_empty() {
        app.update();
        ticks += 1;

        if trace_every > 0 && ticks % trace_every == 0 {
            if let Some(actuator) = app.world().resource::<ActuatorRegistry>().get(joint) {
                let p = &actuator.profile;
                println!(
                    "  t={:7.2}s  pos={:8.3}°  vel={:7.3}°/s{}",
                    p.elapsed,
                    p.pos,
                    p.vel,
                    if p.is_braking() { "  (braking)" } else { "" }
                );
            }
        }

        if ticks > 10_000_000 {
            eprintln!("rotation did not settle; aborting");
            break;
        }
    }

    let time = app.world().resource::<SimTime>();
    println!("settled after {ticks} ticks ({time})");

    if let Some(pose) = app.world().get::<PersistedPose>(target) {
        let (roll, pitch, yaw) = pose.rotation.euler_angles();
        println!(
            "baked pose: position ({:.3}, {:.3}, {:.3}), rotation rpy ({:.1}°, {:.1}°, {:.1}°)",
            pose.position.x,
            pose.position.y,
            pose.position.z,
            roll.to_degrees(),
            pitch.to_degrees(),
            yaw.to_degrees()
        );
    }
}

fn run_info() {
    println!("slew v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  slew-core         {}", env!("CARGO_PKG_VERSION"));
    println!("  slew-motion-core  {}", env!("CARGO_PKG_VERSION"));
    println!("  slew-actuator     {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("defaults:");
    let config = MotionConfig::default();
    println!("  control_dt     {} s ({} Hz)", config.control_dt, config.control_hz());
    println!("  default_speed  {}°/s", config.default_speed);
    println!("  resource_rate  {}/s", config.resource_rate);
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Spin {
            angle,
            speed,
            dt,
            trace_every,
        }) => run_spin(angle, speed, dt, trace_every),
        Some(Commands::Info) => run_info(),
        None => run_spin(90.0, 10.0, 0.02, 50),
    }
}
