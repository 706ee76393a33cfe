//! Transfer engine configuration.
//!
//! Every field has a default, so an empty document is a valid configuration.
//!
//! ```toml
//! supported_schema_version = "1.0"
//! exported_by = "gateway-admin"
//! source_identity = "gateway-eu-1"
//! rename_suffix_start = 2
//! unmentioned_selection_types = "allow"
//!
//! [kdf]
//! memory_cost_kib = 19456
//! time_cost = 2
//! parallelism = 1
//! ```

use crate::transfer::{
    domain::{SchemaVersion, UnmentionedTypePolicy},
    secrets::KdfParams,
};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// Path relative to the configuration directory.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The document is not valid TOML for this configuration.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configured rename suffix start is below 2.
    #[error("rename_suffix_start must be at least 2, got {0}")]
    InvalidRenameSuffix(u32),
}

/// Settings shared by export and import runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Newest payload schema version accepted on import.
    #[serde(default)]
    pub supported_schema_version: SchemaVersion,

    /// Principal recorded as `exported_by` when the caller names none.
    #[serde(default = "default_exported_by")]
    pub exported_by: String,

    /// Identity of this gateway, written into exports.
    #[serde(default = "default_source_identity")]
    pub source_identity: String,

    /// First numeric suffix tried by the `rename` strategy.
    #[serde(default = "default_rename_suffix_start")]
    pub rename_suffix_start: u32,

    /// How a selective import treats entity types it does not mention.
    #[serde(default)]
    pub unmentioned_selection_types: UnmentionedTypePolicy,

    /// Argon2id parameters for deriving keys from rekey secrets.
    #[serde(default)]
    pub kdf: KdfParams,
}

fn default_exported_by() -> String {
    "gateway-admin".to_owned()
}

fn default_source_identity() -> String {
    "gateway".to_owned()
}

const fn default_rename_suffix_start() -> u32 {
    2
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            supported_schema_version: SchemaVersion::default(),
            exported_by: default_exported_by(),
            source_identity: default_source_identity(),
            rename_suffix_start: default_rename_suffix_start(),
            unmentioned_selection_types: UnmentionedTypePolicy::default(),
            kdf: KdfParams::default(),
        }
    }
}

impl TransferConfig {
    /// Parses configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents and
    /// [`ConfigError::InvalidRenameSuffix`] for a suffix start below 2.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// as for [`Self::from_toml_str`].
    pub fn load(dir: &Dir, path: &Utf8Path) -> Result<Self, ConfigError> {
        let document = dir.read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&document)
    }

    const fn validate(&self) -> Result<(), ConfigError> {
        if self.rename_suffix_start < 2 {
            return Err(ConfigError::InvalidRenameSuffix(self.rename_suffix_start));
        }
        Ok(())
    }
}
