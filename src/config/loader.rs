use crate::config::schema::{PatchSetConfig, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The patch set file could not be read at all.
    #[error("cannot read patch set file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not the TOML shape the schema expects.
    #[error("malformed patch set TOML in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml_edit::de::Error,
    },

    /// The TOML parsed but the definitions are unusable.
    #[error("patch set {origin} failed validation: {source}")]
    Invalid {
        origin: String,
        #[source]
        source: ValidationError,
    },
}

/// Parse and validate a patch set definition from a TOML string.
pub fn load_from_str(input: &str) -> Result<PatchSetConfig, ConfigError> {
    parse(input, "inline definition")
}

/// Read, parse, and validate a patch set definition file. Errors name the
/// file so a run over a directory of patch sets points at the bad one.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatchSetConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, &path.display().to_string())
}

fn parse(input: &str, origin: &str) -> Result<PatchSetConfig, ConfigError> {
    let config: PatchSetConfig =
        toml_edit::de::from_str(input).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;

    config.validate().map_err(|source| ConfigError::Invalid {
        origin: origin.to_string(),
        source,
    })?;

    Ok(config)
}
