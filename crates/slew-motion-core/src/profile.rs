//! Acceleration-limited trapezoidal velocity profile.
//!
//! [`MotionProfile`] integrates an angle toward a target under a symmetric
//! acceleration limit: ramp up, cruise at `maxvel`, then brake so the angle
//! lands on the target exactly.  Targets beyond the continuous sentinel run
//! forever until [`brake`](MotionProfile::brake) or
//! [`abort`](MotionProfile::abort).
//!
//! The profile knows nothing about geometry.  Side effects happen through
//! [`MotionHooks`]: `on_start` fires once when motion begins, `on_step` after
//! every integration step, `on_stop` exactly once when the profile finishes.

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Time (s) to ramp from rest to `maxvel`.  Determines the derived
/// acceleration limit.
pub const ACCEL_TIME: f32 = 2.0;

/// Safety factor applied to the braking-distance lookahead and to the
/// finish-detection velocity window.
pub const STOP_MARGIN: f32 = 1.5;

/// Sentinel target (degrees) for unbounded rotation.  Any requested target
/// with magnitude above `CONTINUOUS / 2` is clamped to `±CONTINUOUS` and the
/// profile never finishes on its own.
pub const CONTINUOUS: f32 = 999_999.0;

/// Angle magnitude (degrees) above which [`MotionProfile::clamp_angle`]
/// rewinds `pos` and `tgt` by whole turns.
const CLAMP_THRESHOLD: f32 = 3600.0;

// ---------------------------------------------------------------------------
// MotionHooks
// ---------------------------------------------------------------------------

/// Extension point for profile side effects.
///
/// Implementors receive the profile itself, so `on_step` may adjust `maxvel`
/// mid-flight or call [`MotionProfile::brake`] without restarting the run.
pub trait MotionHooks {
    /// Fired once, on the first `advance` call.
    fn on_start(&mut self, profile: &mut MotionProfile);

    /// Fired after every integration step with the step's `dt` (seconds).
    ///
    /// Also fired with `dt = 0` by drivers that need a final settling pass.
    fn on_step(&mut self, profile: &mut MotionProfile, dt: f32);

    /// Fired exactly once when the profile finishes or is aborted.
    fn on_stop(&mut self, profile: &mut MotionProfile);
}

/// Hook implementation with no side effects, for bare profile runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl MotionHooks for NoHooks {
    fn on_start(&mut self, _profile: &mut MotionProfile) {}
    fn on_step(&mut self, _profile: &mut MotionProfile, _dt: f32) {}
    fn on_stop(&mut self, _profile: &mut MotionProfile) {}
}

// ---------------------------------------------------------------------------
// MotionProfile
// ---------------------------------------------------------------------------

/// Trapezoidal velocity-profile state machine.
///
/// Angles in degrees, speeds in degrees/second.  Drive it with one
/// [`advance`](Self::advance) call per fixed simulation tick.
///
/// Invariants after any tick: `|vel| <= maxvel`; `finished` is monotonic;
/// `on_stop` fires at most once per instance.
#[derive(Debug, Clone)]
pub struct MotionProfile {
    /// Current angle (degrees).
    pub pos: f32,
    /// Current angular velocity (degrees/second).
    pub vel: f32,
    /// Target angle (degrees).  Relative requests accumulate here.
    pub tgt: f32,
    /// Speed limit (degrees/second).  May be adjusted mid-flight.
    pub maxvel: f32,
    /// Total simulated time this profile has been advanced (seconds).
    pub elapsed: f32,
    started: bool,
    finished: bool,
    braking: bool,
}

impl MotionProfile {
    /// Create a profile at `pos` heading for `tgt`, starting from rest.
    #[must_use]
    pub const fn new(pos: f32, tgt: f32, maxvel: f32) -> Self {
        Self {
            pos,
            vel: 0.0,
            tgt,
            maxvel,
            elapsed: 0.0,
            started: false,
            finished: false,
            braking: false,
        }
    }

    /// Builder: start with a nonzero initial velocity (degrees/second).
    ///
    /// Used when resuming a previously frozen rotation without a visible
    /// speed discontinuity.
    #[must_use]
    pub const fn with_start_speed(mut self, vel: f32) -> Self {
        self.vel = vel;
        self
    }

    /// Whether `on_start` has fired.
    #[must_use]
    pub const fn has_started(&self) -> bool {
        self.started
    }

    /// Whether the profile has reached its target or been aborted.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether [`brake`](Self::brake) converted this run into a stop.
    #[must_use]
    pub const fn is_braking(&self) -> bool {
        self.braking
    }

    /// Whether the current target requests unbounded rotation.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.tgt.abs() > CONTINUOUS / 2.0
    }

    /// Acceleration limit (degrees/second²) derived from `maxvel`.
    ///
    /// Clamped to `[1, 180]` so degenerate speed limits still converge.
    #[must_use]
    pub fn max_accel(&self) -> f32 {
        (self.maxvel.abs() / ACCEL_TIME).clamp(1.0, 180.0)
    }

    /// Signed distance (degrees) needed to stop from the current velocity.
    ///
    /// `dt > 0` adds a `2·STOP_MARGIN·dt` lookahead so the deceleration
    /// decision lands a tick early rather than a tick late.
    #[must_use]
    pub fn braking_space(&self, dt: f32) -> f32 {
        let speed = self.vel.abs();
        speed / 2.0 * (speed / self.max_accel() + 2.0 * STOP_MARGIN * dt) * sign(self.vel)
    }

    /// Advance the profile by one tick of `dt` seconds.
    ///
    /// No-op once finished.  Fires `on_start` on the first call, `on_step`
    /// every call, and `on_stop` when the target is reached.
    pub fn advance<H: MotionHooks>(&mut self, dt: f32, hooks: &mut H) {
        if self.finished {
            return;
        }

        // Clamp runaway targets onto the sentinel before any distance math.
        if self.is_continuous() {
            self.tgt = CONTINUOUS * sign(self.tgt);
        }

        let maxacc = self.max_accel();
        let delta = self.tgt - self.pos;
        let going_right_way = self.vel == 0.0 || sign(delta) == sign(self.vel);

        let speed_limit = self.maxvel.abs();
        if going_right_way
            && self.vel.abs() <= speed_limit
            && delta.abs() > self.braking_space(dt).abs()
        {
            self.vel += dt * sign(delta) * maxacc;
            self.vel = self.vel.clamp(-speed_limit, speed_limit);
        } else {
            self.vel -= dt * sign(self.vel) * maxacc;
        }

        if !self.started {
            self.started = true;
            hooks.on_start(self);
        }

        self.pos += dt * self.vel;
        self.elapsed += dt;
        hooks.on_step(self, dt);

        if !self.finished
            && self.vel.abs() < STOP_MARGIN * dt * maxacc
            && (self.tgt - self.pos).abs() < dt * dt * maxacc
        {
            self.pos = self.tgt;
            self.finished = true;
            hooks.on_stop(self);
        }

        if self.pos.abs() > CLAMP_THRESHOLD {
            self.clamp_angle();
        }
    }

    /// Force the profile to finish now.  Fires `on_stop` unconditionally;
    /// calling twice for the same external trigger is the caller's bug.
    pub fn abort<H: MotionHooks>(&mut self, hooks: &mut H) {
        self.finished = true;
        hooks.on_stop(self);
    }

    /// Convert the run into a graceful stop: retarget to the point where the
    /// current velocity decays to zero.  `vel` is continuous across the call.
    pub fn brake(&mut self) {
        self.tgt = self.pos + self.braking_space(0.0);
        self.braking = true;
    }

    /// Rewind `pos` and `tgt` by the nearest whole number of turns when the
    /// angle has grown past [`CLAMP_THRESHOLD`].  Net angle is unchanged
    /// modulo 360; keeps long continuous runs numerically bounded.
    pub fn clamp_angle(&mut self) {
        if self.pos.abs() > CLAMP_THRESHOLD {
            let turns = (self.pos / 360.0).round() * 360.0;
            self.pos -= turns;
            self.tgt -= turns;
        }
    }
}

/// Sign with a genuine zero branch: `f32::signum` maps `0.0` to `1.0`,
/// which would read a stationary profile as "moving".
fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
