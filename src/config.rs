// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Two kinds of configuration live here. [`RunConfig`] is the configuration
//! of a single invocation: seeded from command-line values, grown by each
//! selected operation's preparation step, read by every action, and thrown
//! away when the process exits. [`Settings`] is the small persisted
//! configuration file that tells woodev which remote to clone, which branch
//! to offer by default, and where local sites live. File I/O for settings is
//! limited to [`Settings::load`]; serialization goes through
//! [`FromStr`]/[`Display`] to keep the round-trip honest.

use crate::path::{home_dir, NoWayHome};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Configuration accumulated for a single run.
///
/// The only shared mutable state in the program. Every field is optional; an
/// operation that needs a value its preparation never produced fails with an
/// explicit error instead of guessing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Branch to clone or work against.
    pub branch: Option<String>,

    /// Directory name derived from the branch for a fresh checkout.
    pub directory: Option<String>,

    /// Absolute path to the checkout being operated on.
    pub clone_path: Option<PathBuf>,

    /// Name of the local site to link, mount, or provision.
    pub site: Option<String>,

    /// Test filter for rerunning failing tests.
    pub target: Option<String>,
}

impl RunConfig {
    /// Fold a partial configuration on top of this one.
    ///
    /// Fields set in the patch win; unset fields keep their current value.
    pub fn merge(self, patch: RunConfig) -> RunConfig {
        RunConfig {
            branch: patch.branch.or(self.branch),
            directory: patch.directory.or(self.directory),
            clone_path: patch.clone_path.or(self.clone_path),
            site: patch.site.or(self.site),
            target: patch.target.or(self.target),
        }
    }
}

/// Persisted settings layout.
///
/// Read from `$XDG_CONFIG_HOME/woodev/config.toml` when present. Every field
/// has a usable default, so running without a settings file is the normal
/// case rather than an error.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Remote to clone new checkouts from.
    pub remote_url: String,

    /// Branch offered as the default answer to the branch prompt.
    pub default_branch: String,

    /// Directory holding local sites. Shell expansion applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sites_dir: Option<PathBuf>,
}

impl Settings {
    /// Read settings from target path.
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if an existing file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if settings parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            source,
            path: path.to_path_buf(),
        })?;

        data.parse()
    }

    /// Absolute path to the directory holding local sites.
    ///
    /// Falls back to `~/Local Sites` when the settings file does not pin one.
    ///
    /// # Errors
    ///
    /// - Return [`NoWayHome`] if home directory path cannot be determined.
    pub fn sites_dir(&self) -> Result<PathBuf, NoWayHome> {
        match &self.sites_dir {
            Some(path) => Ok(path.clone()),
            None => Ok(home_dir()?.join("Local Sites")),
        }
    }

    /// Root directory of target local site.
    ///
    /// # Errors
    ///
    /// - Return [`NoWayHome`] if home directory path cannot be determined.
    pub fn site_dir(&self, site: &str) -> Result<PathBuf, NoWayHome> {
        Ok(self.sites_dir()?.join(site))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote_url: "git@github.com:woocommerce/woocommerce.git".into(),
            default_branch: "trunk".into(),
            sites_dir: None,
        }
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: Settings = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on the sites directory field.
        if let Some(sites_dir) = &settings.sites_dir {
            settings.sites_dir = Some(PathBuf::from(
                shellexpand::full(sites_dir.to_string_lossy().as_ref())
                    .map_err(ConfigError::ShellExpansion)?
                    .into_owned(),
            ));
        }

        Ok(settings)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Settings file cannot be read from.
    #[error("failed to read settings at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
