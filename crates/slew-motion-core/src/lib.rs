//! Framework-agnostic motion profiles and constraint-frame math for rotary
//! joint actuation.
//!
//! Pure Rust library with no game engine dependencies.  Provides the
//! acceleration-limited trapezoidal velocity profile that drives a joint
//! toward a target angle, and the per-segment coordinate-frame adapter that
//! maps between a body's local space and a constraint's native space.
//!
//! # Drive Pipeline
//!
//! ```text
//! Target angle → Motion Profile → Frame Adapter → Segment rotation/position targets
//!                (trapezoid)      (basis change)
//! ```
//!
//! # Quick Start
//!
//! ```
//! use slew_motion_core::prelude::*;
//!
//! let mut profile = MotionProfile::new(0.0, 90.0, 10.0);
//! let mut hooks = NoHooks;
//!
//! let dt = 0.02;
//! while !profile.is_finished() {
//!     profile.advance(dt, &mut hooks);
//! }
//! assert_eq!(profile.pos, 90.0);
//! ```

pub mod frame;
pub mod profile;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::frame::SegmentFrame;
    pub use crate::profile::{ACCEL_TIME, CONTINUOUS, MotionHooks, MotionProfile, NoHooks, STOP_MARGIN};
}
