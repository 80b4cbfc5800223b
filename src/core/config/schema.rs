//! core::config::schema
//!
//! Configuration schema types.
//!
//! The global file and the repository file share one schema. A repository
//! file overrides the global file key by key.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., window sizes must be positive, `backend` must
//! name a supported system).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::backend::{valid_backend_names, VcsKind};

/// Contents of one configuration file.
///
/// # Example
///
/// ```toml
/// window_size = 20
/// fetch_concurrency = 8
/// backend = "svn"
///
/// [svn]
/// binary = "/usr/local/bin/svn"
/// username = "alice"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Revisions listed per collection cycle
    pub window_size: Option<usize>,

    /// Maximum diff fetches in flight during one cycle
    pub fetch_concurrency: Option<usize>,

    /// Backend override ("git" or "svn")
    pub backend: Option<String>,

    /// Subversion client settings
    pub svn: Option<SvnConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == Some(0) {
            return Err(ConfigError::InvalidValue(
                "window_size must be at least 1".to_string(),
            ));
        }

        if self.fetch_concurrency == Some(0) {
            return Err(ConfigError::InvalidValue(
                "fetch_concurrency must be at least 1".to_string(),
            ));
        }

        if let Some(backend) = &self.backend {
            if backend.parse::<VcsKind>().is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid backend '{}', must be one of: {}",
                    backend,
                    valid_backend_names().join(", ")
                )));
            }
        }

        if let Some(svn) = &self.svn {
            svn.validate()?;
        }

        Ok(())
    }
}

/// Subversion client settings.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SvnConfig {
    /// Path or name of the `svn` executable
    pub binary: Option<String>,

    /// Username passed with every command
    pub username: Option<String>,

    /// Password passed with every command
    pub password: Option<String>,
}

impl std::fmt::Debug for SvnConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvnConfig")
            .field("binary", &self.binary)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SvnConfig {
    /// Validate the svn settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(binary) = &self.binary {
            if binary.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "svn.binary cannot be empty".to_string(),
                ));
            }
        }
        if let Some(username) = &self.username {
            if username.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "svn.username cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
