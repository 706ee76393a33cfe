//! File persistence for export payloads.
//!
//! Each file holds one complete JSON document. Paths are resolved relative to
//! a capability-scoped directory and never escape it.

use crate::transfer::domain::ExportPayload;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::Clock;
use std::io::ErrorKind;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors returned by [`PayloadFileStore`].
#[derive(Debug, Error)]
pub enum PayloadFileError {
    /// The payload file does not exist.
    #[error("payload file not found: {0}")]
    NotFound(Utf8PathBuf),
    /// Reading or writing the file failed.
    #[error("payload file I/O failed for {path}: {source}")]
    Io {
        /// Path relative to the store directory.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The payload could not be rendered as JSON.
    #[error("failed to serialise payload: {0}")]
    Serialize(#[source] serde_json::Error),
    /// The file does not hold a valid payload document.
    #[error("invalid payload document {path}: {source}")]
    Parse {
        /// Path relative to the store directory.
        path: Utf8PathBuf,
        /// JSON decoding failure.
        source: serde_json::Error,
    },
}

/// Reads and writes payload documents inside one directory.
pub struct PayloadFileStore<K: Clock> {
    dir: Dir,
    clock: Arc<K>,
}

impl<K: Clock> PayloadFileStore<K> {
    /// Creates a store over an already opened directory.
    #[must_use]
    pub const fn new(dir: Dir, clock: Arc<K>) -> Self {
        Self { dir, clock }
    }

    /// Opens a store over a directory path using ambient authority.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadFileError::Io`] when the directory cannot be opened.
    pub fn open_ambient(path: &Utf8Path, clock: Arc<K>) -> Result<Self, PayloadFileError> {
        let dir = Dir::open_ambient_dir(path, ambient_authority()).map_err(|source| {
            PayloadFileError::Io {
                path: path.to_owned(),
                source,
            }
        })?;
        Ok(Self::new(dir, clock))
    }

    /// Returns the timestamped file name used when no path is given.
    #[must_use]
    pub fn default_file_name(&self) -> Utf8PathBuf {
        let stamp = self.clock.utc().format("%Y%m%d-%H%M%S");
        Utf8PathBuf::from(format!("gateway-export-{stamp}.json"))
    }

    /// Writes a payload as pretty-printed JSON, creating parent directories.
    ///
    /// Returns the path written, relative to the store directory.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadFileError::Serialize`] or [`PayloadFileError::Io`].
    pub fn write(
        &self,
        path: Option<&Utf8Path>,
        payload: &ExportPayload,
    ) -> Result<Utf8PathBuf, PayloadFileError> {
        let target = path.map_or_else(|| self.default_file_name(), Utf8Path::to_owned);
        let document =
            serde_json::to_string_pretty(payload).map_err(PayloadFileError::Serialize)?;

        if let Some(parent) = target.parent().filter(|parent| !parent.as_str().is_empty()) {
            self.dir
                .create_dir_all(parent)
                .map_err(|source| PayloadFileError::Io {
                    path: parent.to_owned(),
                    source,
                })?;
        }
        self.dir
            .write(&target, document)
            .map_err(|source| PayloadFileError::Io {
                path: target.clone(),
                source,
            })?;

        info!(path = %target, total = payload.total(), "payload written");
        Ok(target)
    }

    /// Reads and parses a payload document.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadFileError::NotFound`] for a missing file,
    /// [`PayloadFileError::Io`] for other read failures and
    /// [`PayloadFileError::Parse`] for invalid documents.
    pub fn read(&self, path: &Utf8Path) -> Result<ExportPayload, PayloadFileError> {
        let document = self.dir.read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                PayloadFileError::NotFound(path.to_owned())
            } else {
                PayloadFileError::Io {
                    path: path.to_owned(),
                    source,
                }
            }
        })?;
        serde_json::from_str(&document).map_err(|source| PayloadFileError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}
