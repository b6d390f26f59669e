//! Error types for the particle field
//!
//! Construction and configuration fail fast; nothing inside a frame returns
//! an error to the host.

use thiserror::Error;

/// Errors raised while building or configuring a field
#[derive(Error, Debug)]
pub enum FieldError {
    /// The drawing surface or GPU context could not be obtained
    #[error("drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// The configuration failed validation
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The configuration could not be deserialized
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The frame scheduler refused to schedule a callback
    #[error("frame scheduling failed: {0}")]
    Schedule(String),
}

/// A single configuration field that is out of range
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("particle_count must be at least 1")]
    NoParticles,

    #[error("{field} must be finite and positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} range is inverted: {min} > {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field} must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("easing must lie in (0, 1], got {0}")]
    Easing(f32),

    #[error("camera_fov must lie in (0, 180) degrees, got {0}")]
    FieldOfView(f32),

    #[error("palette must contain at least one color")]
    EmptyPalette,

    #[error("{field} must not exceed 1, got {value}")]
    AboveOne { field: &'static str, value: f32 },

    #[error("the webgpu backend needs max_connections to size its line buffer")]
    Uncapped,

    #[error("config must be an object, got {0}")]
    NotAnObject(&'static str),
}

/// Result type for field construction
pub type FieldResult<T> = Result<T, FieldError>;
