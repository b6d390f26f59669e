//! Construction-time configuration
//!
//! Every field is optional in serialized form. Missing fields are filled from
//! the preset of the selected backend, so `{"backend": "webgpu"}` yields the
//! full WebGPU preset rather than canvas numbers on a GPU backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, FieldResult};

/// Rendering backend, chosen once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Immediate-mode 2D canvas; particles live in logical pixels
    #[default]
    Canvas,
    /// GPU point/line pipeline; particles live in a 3D scene volume
    WebGpu,
}

/// Particle field configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub backend: Backend,
    /// Number of particles, fixed for the lifetime of the field
    pub particle_count: usize,
    /// Edge length of the spawn cube (volume mode only)
    pub spread: f32,
    /// Width of the symmetric velocity range, per axis, per frame
    pub drift_speed: f32,
    /// Amplitude of the periodic phase term added to drift
    pub wobble: f32,
    pub size_range: [f32; 2],
    pub opacity_range: [f32; 2],
    /// Per-particle multiplier on the repulsion offset
    pub density_range: [f32; 2],
    pub palette: Vec<[u8; 3]>,
    /// Pointer interaction toggle
    pub interactive: bool,
    pub repulsion_radius: f32,
    pub repulsion_strength: f32,
    /// Exponent of the `(R - d) / R` falloff
    pub falloff_exponent: f32,
    /// Fraction of the remaining distance to target closed per frame
    pub easing: f32,
    pub connection_distance: f32,
    /// Hard cap on edges per frame; `None` means unbounded
    pub max_connections: Option<usize>,
    pub link_color: [u8; 3],
    /// Stroke alpha of a zero-length link
    pub link_alpha: f32,
    pub link_width: f32,
    pub camera_distance: f32,
    /// Vertical field of view in degrees
    pub camera_fov: f32,
    /// Scene units per unit of particle size (volume mode only)
    pub point_scale: f32,
    /// CSS class applied to the mounted canvas
    pub class_name: String,
    /// Optional RNG seed; hosts supply entropy otherwise
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self::canvas()
    }
}

impl FieldConfig {
    /// Canvas 2D preset: 100 warm-grey motes in logical pixel space
    pub fn canvas() -> Self {
        Self {
            backend: Backend::Canvas,
            particle_count: 100,
            spread: 10.0,
            drift_speed: 0.5,
            wobble: 0.0,
            size_range: [0.5, 2.5],
            opacity_range: [0.2, 0.7],
            density_range: [1.0, 31.0],
            palette: vec![[212, 197, 185]],
            interactive: true,
            repulsion_radius: 150.0,
            repulsion_strength: 1.0,
            falloff_exponent: 2.0,
            easing: 0.05,
            connection_distance: 150.0,
            max_connections: None,
            link_color: [139, 90, 60],
            link_alpha: 0.1,
            link_width: 0.5,
            camera_distance: 12.0,
            camera_fov: 60.0,
            point_scale: 0.03,
            class_name: "particle-canvas".to_string(),
            seed: None,
        }
    }

    /// WebGPU preset: 200 points in a 10-unit cube, viewed from 12 units
    pub fn webgpu() -> Self {
        Self {
            backend: Backend::WebGpu,
            particle_count: 200,
            spread: 10.0,
            drift_speed: 0.004,
            wobble: 0.002,
            size_range: [1.0, 3.0],
            opacity_range: [0.4, 0.9],
            density_range: [0.5, 1.5],
            palette: vec![[212, 197, 185], [139, 90, 60], [236, 226, 214]],
            repulsion_radius: 2.0,
            connection_distance: 1.5,
            max_connections: Some(2048),
            link_alpha: 0.25,
            ..Self::canvas()
        }
    }

    /// Preset for a backend
    pub fn preset(backend: Backend) -> Self {
        match backend {
            Backend::Canvas => Self::canvas(),
            Backend::WebGpu => Self::webgpu(),
        }
    }

    /// Whether particles live in the 3D scene volume rather than the canvas plane
    pub fn is_volume(&self) -> bool {
        self.backend == Backend::WebGpu
    }

    /// Build from a JSON-like value, layering it over the backend preset
    pub fn from_value(value: Value) -> FieldResult<Self> {
        let value = match value {
            Value::Null => Value::Object(Default::default()),
            Value::Object(_) => value,
            other => return Err(ConfigError::NotAnObject(kind(&other)).into()),
        };

        let backend = match value.get("backend") {
            Some(b) => serde_json::from_value(b.clone())?,
            None => Backend::default(),
        };

        let mut merged = serde_json::to_value(Self::preset(backend))?;
        if let (Value::Object(base), Value::Object(overrides)) = (&mut merged, value) {
            base.extend(overrides);
        }

        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> FieldResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Check every field is within range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::NoParticles);
        }
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        if !(self.easing > 0.0 && self.easing <= 1.0) {
            return Err(ConfigError::Easing(self.easing));
        }

        for (field, value) in [
            ("spread", self.spread),
            ("repulsion_radius", self.repulsion_radius),
            ("falloff_exponent", self.falloff_exponent),
            ("connection_distance", self.connection_distance),
            ("link_width", self.link_width),
            ("camera_distance", self.camera_distance),
            ("camera_fov", self.camera_fov),
            ("point_scale", self.point_scale),
        ] {
            require_positive(field, value)?;
        }

        for (field, value) in [
            ("drift_speed", self.drift_speed),
            ("wobble", self.wobble),
            ("repulsion_strength", self.repulsion_strength),
            ("link_alpha", self.link_alpha),
        ] {
            require_non_negative(field, value)?;
        }

        for (field, [min, max]) in [
            ("size_range", self.size_range),
            ("opacity_range", self.opacity_range),
            ("density_range", self.density_range),
        ] {
            require_non_negative(field, min)?;
            if min > max || !max.is_finite() {
                return Err(ConfigError::InvertedRange { field, min, max });
            }
        }

        if self.camera_fov >= 180.0 {
            return Err(ConfigError::FieldOfView(self.camera_fov));
        }

        for (field, value) in [
            ("opacity_range", self.opacity_range[1]),
            ("link_alpha", self.link_alpha),
        ] {
            if value > 1.0 {
                return Err(ConfigError::AboveOne { field, value });
            }
        }

        if self.backend == Backend::WebGpu && self.max_connections.is_none() {
            return Err(ConfigError::Uncapped);
        }

        Ok(())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    #[test]
    fn presets_validate() {
        assert!(FieldConfig::canvas().validate().is_ok());
        assert!(FieldConfig::webgpu().validate().is_ok());
    }

    #[test]
    fn empty_json_yields_canvas_preset() {
        let config = FieldConfig::from_json("{}").unwrap();
        assert_eq!(config, FieldConfig::canvas());
    }

    #[test]
    fn backend_alone_selects_its_preset() {
        let config = FieldConfig::from_json(r#"{"backend": "webgpu"}"#).unwrap();
        assert_eq!(config, FieldConfig::webgpu());
        assert!(config.is_volume());
    }

    #[test]
    fn overrides_layer_over_preset() {
        let config =
            FieldConfig::from_json(r#"{"particle_count": 42, "interactive": false}"#).unwrap();
        assert_eq!(config.particle_count, 42);
        assert!(!config.interactive);
        assert_eq!(config.connection_distance, 150.0);
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        let err = FieldConfig::from_json(r#"{"backend": "svg"}"#).unwrap_err();
        assert!(matches!(err, FieldError::Parse(_)));
    }

    #[test]
    fn invalid_override_is_rejected() {
        let err = FieldConfig::from_json(r#"{"easing": 0}"#).unwrap_err();
        assert!(matches!(err, FieldError::Config(ConfigError::Easing(_))));
    }

    #[test]
    fn zero_particles_rejected() {
        let config = FieldConfig {
            particle_count: 0,
            ..FieldConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoParticles));
    }

    #[test]
    fn inverted_range_rejected() {
        let config = FieldConfig {
            size_range: [3.0, 1.0],
            ..FieldConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange {
                field: "size_range",
                ..
            })
        ));
    }

    #[test]
    fn negative_strength_rejected() {
        let config = FieldConfig {
            repulsion_strength: -1.0,
            ..FieldConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "repulsion_strength",
                ..
            })
        ));
    }

    #[test]
    fn empty_palette_rejected() {
        let config = FieldConfig {
            palette: vec![],
            ..FieldConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyPalette));
    }

    #[test]
    fn webgpu_requires_an_edge_cap() {
        let err = FieldConfig::from_json(r#"{"backend": "webgpu", "max_connections": null}"#)
            .unwrap_err();
        assert!(matches!(err, FieldError::Config(ConfigError::Uncapped)));

        let config = FieldConfig::from_json(r#"{"max_connections": null}"#).unwrap();
        assert_eq!(config.max_connections, None);
    }

    #[test]
    fn non_object_config_rejected() {
        for json in ["[1, 2]", "42", r#""canvas""#, "true"] {
            let err = FieldConfig::from_json(json).unwrap_err();
            assert!(
                matches!(err, FieldError::Config(ConfigError::NotAnObject(_))),
                "{json} gave {err}"
            );
        }
        assert_eq!(FieldConfig::from_json("null").unwrap(), FieldConfig::canvas());
    }

    #[test]
    fn alphas_above_one_rejected() {
        let config = FieldConfig {
            opacity_range: [0.5, 1.5],
            ..FieldConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::AboveOne {
                field: "opacity_range",
                value: 1.5
            })
        );

        let err = FieldConfig::from_json(r#"{"link_alpha": 2}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: link_alpha must not exceed 1, got 2"
        );
    }

    #[test]
    fn canvas_preset_serializes() {
        let json = serde_json::to_string_pretty(&FieldConfig::canvas()).unwrap();
        insta::assert_snapshot!(json, @r###"
        {
          "backend": "canvas",
          "particle_count": 100,
          "spread": 10.0,
          "drift_speed": 0.5,
          "wobble": 0.0,
          "size_range": [
            0.5,
            2.5
          ],
          "opacity_range": [
            0.2,
            0.7
          ],
          "density_range": [
            1.0,
            31.0
          ],
          "palette": [
            [
              212,
              197,
              185
            ]
          ],
          "interactive": true,
          "repulsion_radius": 150.0,
          "repulsion_strength": 1.0,
          "falloff_exponent": 2.0,
          "easing": 0.05,
          "connection_distance": 150.0,
          "max_connections": null,
          "link_color": [
            139,
            90,
            60
          ],
          "link_alpha": 0.1,
          "link_width": 0.5,
          "camera_distance": 12.0,
          "camera_fov": 60.0,
          "point_scale": 0.03,
          "class_name": "particle-canvas",
          "seed": null
        }
        "###);
    }
}
