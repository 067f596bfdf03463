//! User preferences captured at the start of a run and remembered between runs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Invalid migration kind '{0}' (expected java or python)")]
    InvalidMigrationKind(String),

    #[error("Invalid release channel '{0}' (expected stable or rc)")]
    InvalidReleaseChannel(String),

    #[error("Could not determine the home directory")]
    NoHomeDirectory,

    #[error("Preference file error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationKind {
    #[default]
    Java,
    Python,
}

impl fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationKind::Java => f.write_str("java"),
            MigrationKind::Python => f.write_str("python"),
        }
    }
}

impl FromStr for MigrationKind {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "java" => Ok(MigrationKind::Java),
            "python" => Ok(MigrationKind::Python),
            other => Err(PreferenceError::InvalidMigrationKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReleaseChannel {
    #[default]
    #[serde(rename = "stable")]
    Stable,
    #[serde(rename = "rc", alias = "release_candidate")]
    ReleaseCandidate,
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseChannel::Stable => f.write_str("stable"),
            ReleaseChannel::ReleaseCandidate => f.write_str("rc"),
        }
    }
}

impl FromStr for ReleaseChannel {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stable" => Ok(ReleaseChannel::Stable),
            "rc" | "release_candidate" | "release-candidate" => Ok(ReleaseChannel::ReleaseCandidate),
            other => Err(PreferenceError::InvalidReleaseChannel(other.to_string())),
        }
    }
}

/// Immutable for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub project_path: PathBuf,
    pub migration_kind: MigrationKind,
    pub release_channel: ReleaseChannel,
}

impl Preferences {
    pub fn new(
        project_path: impl Into<PathBuf>,
        migration_kind: MigrationKind,
        release_channel: ReleaseChannel,
    ) -> Self {
        Self {
            project_path: project_path.into(),
            migration_kind,
            release_channel,
        }
    }
}

/// JSON file holding the last used preferences
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.migrant/preferences.json`
    pub fn default_path() -> Result<PathBuf, PreferenceError> {
        dirs::home_dir()
            .map(|home| home.join(".migrant").join("preferences.json"))
            .ok_or(PreferenceError::NoHomeDirectory)
    }

    pub fn open_default() -> Result<Self, PreferenceError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved preferences, if any. An unreadable or malformed file is
    /// reported and treated as absent.
    pub fn load(&self) -> Option<Preferences> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(target: "preferences", path = %self.path.display(), "No saved preferences");
                return None;
            }
            Err(e) => {
                warn!(target: "preferences", path = %self.path.display(), error = %e, "Failed to read preferences");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(prefs) => Some(prefs),
            Err(e) => {
                warn!(target: "preferences", path = %self.path.display(), error = %e, "Ignoring malformed preferences");
                None
            }
        }
    }

    pub fn save(&self, preferences: &Preferences) -> Result<(), PreferenceError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| PreferenceError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(preferences)?;
        std::fs::write(&self.path, json).map_err(|source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!(target: "preferences", path = %self.path.display(), "Saved preferences");
        Ok(())
    }

    /// Remove the saved file; clearing an absent file is not an error
    pub fn clear(&self) -> Result<(), PreferenceError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PreferenceError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
