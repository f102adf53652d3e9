use thiserror::Error;

/// Top-level error type for slew-core.
#[derive(Debug, Error)]
pub enum SlewError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid control_dt: {0} (must be > 0)")]
    InvalidControlDt(f64),

    #[error("Invalid default_speed: {0} (must be > 0)")]
    InvalidDefaultSpeed(f32),

    #[error("Invalid resource_rate: {0} (must be >= 0)")]
    InvalidResourceRate(f32),
}

/// Rotation-request refusal reasons.
///
/// Raised while sanity-checking a joint before an actuator is created.  None
/// of these are fatal: the request is refused and nothing starts moving.
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("Joint entity is missing or despawned")]
    JointMissing,

    #[error("Joint host body is missing its rig frame")]
    HostBodyMissing,

    #[error("Joint target body is missing its rig frame")]
    TargetBodyMissing,

    #[error("Joint has no constraint segments")]
    NoSegments,

    #[error("Segment {0} is missing or despawned")]
    SegmentMissing(usize),

    #[error("Segment {0} has degenerate axes (no rotation plane)")]
    DegenerateSegmentAxes(usize),

    #[error("Driving body is not connected by this joint")]
    BodyNotInJoint,
}
