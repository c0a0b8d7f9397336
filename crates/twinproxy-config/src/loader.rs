//! Configuration file loading and error types.

use std::fs;
use std::path::Path;

use crate::Config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config format: {0:?}")]
    UnsupportedFormat(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Config file syntax, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    /// JSON, with `//` and `/* */` comments allowed.
    Json,
    Yaml,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" | "jsonc" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            _ => Err(ConfigError::UnsupportedFormat(ext)),
        }
    }

    fn parse(self, data: &str) -> Result<Config, ConfigError> {
        let config = match self {
            Self::Json => {
                let stripped = json_comments::StripComments::new(data.as_bytes());
                serde_json::from_reader(stripped)?
            }
            Self::Yaml => serde_yaml::from_str(data)?,
            Self::Toml => toml::from_str(data)?,
        };
        Ok(config)
    }
}

/// Load a configuration file, choosing the format by extension.
///
/// The format is checked before the file is read, so an unknown extension
/// fails even for a missing file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let data = fs::read_to_string(path)?;
    format.parse(&data)
}
