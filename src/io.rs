//! Config file reading and writing
//!
//! Files are picked apart by extension: `.json` through `serde_json`,
//! `.yaml`/`.yml` through `serde_yaml`. Both decode into a JSON value first so
//! a partial file layers over the preset of its backend.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use driftfield::{Backend, FieldConfig, FieldError};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while loading or writing config files
#[derive(Error, Debug)]
pub enum IoError {
    /// The file extension is not a known config format
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file extension could not be determined
    #[error("could not determine file format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON or YAML
    #[error("parse error: {0}")]
    Parse(String),

    /// The config decoded but does not describe a valid field
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Result type for config I/O
pub type IoResult<T> = Result<T, IoError>;

/// Serialized config formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Format for a file extension, case-insensitive
    pub fn from_extension(ext: &str) -> IoResult<Self> {
        ext.parse()
    }

    pub fn from_path(path: &Path) -> IoResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| IoError::UnknownExtension(path.display().to_string()))?;
        Self::from_extension(ext)
    }
}

impl FromStr for ConfigFormat {
    type Err = IoError;

    fn from_str(s: &str) -> IoResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(IoError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Yaml => f.write_str("yaml"),
        }
    }
}

/// Decode config text in `format`, layering it over its backend preset
pub fn parse_config(text: &str, format: ConfigFormat) -> IoResult<FieldConfig> {
    let value: Value = match format {
        ConfigFormat::Json => serde_json::from_str(text).map_err(|e| IoError::Parse(e.to_string()))?,
        ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| IoError::Parse(e.to_string()))?,
    };
    // An empty YAML document decodes to null, which selects the preset
    Ok(FieldConfig::from_value(value)?)
}

/// Load and validate a config file
pub fn load_config(path: &Path) -> IoResult<FieldConfig> {
    let format = ConfigFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;
    let config = parse_config(&text, format)?;
    tracing::debug!(path = %path.display(), %format, backend = ?config.backend, "loaded config");
    Ok(config)
}

/// Load `path` if given, else the preset for `backend`
pub fn load_or_preset(path: Option<&Path>, backend: Backend) -> IoResult<FieldConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(FieldConfig::preset(backend)),
    }
}

/// Serialize a config in `format`
pub fn write_config(config: &FieldConfig, format: ConfigFormat) -> IoResult<String> {
    match format {
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).map_err(|e| IoError::Parse(e.to_string()))
        }
        ConfigFormat::Yaml => serde_yaml::to_string(config).map_err(|e| IoError::Parse(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("json").unwrap(), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_extension("YML").unwrap(), ConfigFormat::Yaml);
        assert!(matches!(
            ConfigFormat::from_extension("toml"),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn path_without_extension_is_rejected() {
        assert!(matches!(
            ConfigFormat::from_path(Path::new("config")),
            Err(IoError::UnknownExtension(_))
        ));
    }

    #[test]
    fn yaml_layers_over_backend_preset() {
        let config = parse_config("backend: webgpu\nparticle_count: 64\n", ConfigFormat::Yaml).unwrap();
        assert_eq!(config.backend, Backend::WebGpu);
        assert_eq!(config.particle_count, 64);
        assert_eq!(config.max_connections, FieldConfig::webgpu().max_connections);
    }

    #[test]
    fn empty_yaml_is_the_canvas_preset() {
        assert_eq!(parse_config("", ConfigFormat::Yaml).unwrap(), FieldConfig::canvas());
    }

    #[test]
    fn invalid_values_surface_as_field_errors() {
        let err = parse_config(r#"{"particle_count": 0}"#, ConfigFormat::Json).unwrap_err();
        assert!(matches!(err, IoError::Field(FieldError::Config(_))));
        assert!(err.to_string().contains("particle_count"));
    }

    #[test]
    fn yaml_list_is_not_a_config() {
        let err = parse_config("- 1\n- 2\n", ConfigFormat::Yaml).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: config must be an object, got an array"
        );
    }

    #[test]
    fn load_config_reads_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("field.json");
        fs::write(&path, r#"{"connection_distance": 90}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.connection_distance, 90.0);
        assert_eq!(config.particle_count, 100);
    }

    #[test]
    fn written_yaml_reads_back() {
        let yaml = write_config(&FieldConfig::webgpu(), ConfigFormat::Yaml).unwrap();
        assert_eq!(parse_config(&yaml, ConfigFormat::Yaml).unwrap(), FieldConfig::webgpu());
    }
}
