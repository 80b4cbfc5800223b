//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! rangelog has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Working-copy-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$RANGELOG_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/rangelog/config.toml`
//! 3. `~/.rangelog/config.toml`
//!
//! # Repo Config Location
//!
//! `.rangelog.toml` at the working-copy root.
//!
//! # Example
//!
//! ```no_run
//! use rangelog::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/checkout"))).unwrap();
//! for warning in &result.warnings {
//!     eprintln!("warning: {}", warning.message);
//! }
//! println!("Window: {}", result.config.window_size());
//! ```

pub mod schema;

pub use schema::{FileConfig, SvnConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::backend::svn::SvnSettings;
use crate::backend::VcsKind;

/// Revisions per collection cycle when nothing is configured.
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// File name of the repository config, at the working-copy root.
pub const REPO_CONFIG_FILE: &str = ".rangelog.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence automatically: repo config overrides global
/// config, which overrides defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: FileConfig,
    /// Repository configuration (if a repo file exists)
    pub repo: Option<FileConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `repo_root` is provided, also loads `<repo_root>/.rangelog.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(repo_root: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_from(Self::find_global(), repo_root)
    }

    /// Load from an explicit global file (if any) and repo root.
    fn load_from(
        global_file: Option<PathBuf>,
        repo_root: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let global = match &global_file {
            Some(path) => Self::read_config(path)?,
            None => FileConfig::default(),
        };

        let (repo, repo_path) = match repo_root {
            Some(root) => {
                let path = Self::repo_config_path(root);
                if path.exists() {
                    let config = Self::read_config(&path)?;
                    if config.svn.as_ref().is_some_and(|s| s.password.is_some()) {
                        warnings.push(ConfigWarning {
                            message: "svn password stored in plaintext inside the working copy; \
                                      prefer the global config file"
                                .to_string(),
                            path: path.clone(),
                        });
                    }
                    (Some(config), Some(path))
                } else {
                    (None, None)
                }
            }
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        tracing::debug!(
            global = ?global_file,
            repo = ?repo_path,
            "configuration loaded"
        );

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path: global_file,
                repo_path,
            },
            warnings,
        })
    }

    /// Locate the global config file in standard locations.
    fn find_global() -> Option<PathBuf> {
        // 1. Check $RANGELOG_CONFIG
        if let Ok(path) = std::env::var("RANGELOG_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/rangelog/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("rangelog/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.rangelog/config.toml
        let path = dirs::home_dir()?.join(".rangelog/config.toml");
        path.exists().then_some(path)
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Path of the repository config for a working-copy root.
    pub fn repo_config_path(repo_root: &Path) -> PathBuf {
        repo_root.join(REPO_CONFIG_FILE)
    }

    /// Pick a value from the repo config, falling back to the global config.
    fn layered<T>(&self, pick: impl Fn(&FileConfig) -> Option<T>) -> Option<T> {
        self.repo
            .as_ref()
            .and_then(&pick)
            .or_else(|| pick(&self.global))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Revisions per collection cycle.
    ///
    /// Defaults to 20 if not configured.
    pub fn window_size(&self) -> usize {
        self.layered(|c| c.window_size).unwrap_or(DEFAULT_WINDOW_SIZE)
    }

    /// Maximum concurrent diff fetches.
    ///
    /// Returns `None` if not configured; the tracker then uses the window size.
    pub fn fetch_concurrency(&self) -> Option<usize> {
        self.layered(|c| c.fetch_concurrency)
    }

    /// Backend override.
    ///
    /// Returns `None` if not configured, meaning detect from the working copy.
    pub fn backend(&self) -> Option<VcsKind> {
        self.layered(|c| c.backend.as_deref().and_then(|b| b.parse().ok()))
    }

    /// Subversion client settings, merged field by field.
    pub fn svn(&self) -> SvnSettings {
        let defaults = SvnSettings::default();
        SvnSettings {
            binary: self
                .layered(|c| c.svn.as_ref().and_then(|s| s.binary.clone()))
                .unwrap_or(defaults.binary),
            username: self.layered(|c| c.svn.as_ref().and_then(|s| s.username.clone())),
            password: self.layered(|c| c.svn.as_ref().and_then(|s| s.password.clone())),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}
