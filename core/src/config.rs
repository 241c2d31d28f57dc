// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use crate::Error;

/// The name of the calsearch application.
pub const APP_NAME: &str = "calsearch";

/// Configuration for the calsearch core.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite file holding the search index.
    pub index_path: Option<PathBuf>,

    /// Number of events written per transaction while indexing.
    pub batch_size: usize,

    /// Number of parsed events buffered between the parser and the indexer.
    pub channel_capacity: usize,

    /// Number of hits shown when a search does not ask for a limit.
    pub default_limit: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_path: None,
            batch_size: 100,
            channel_capacity: 256,
            default_limit: 10,
        }
    }
}

impl Config {
    /// Normalize the configuration.
    pub fn normalize(&mut self) -> Result<(), Error> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be greater than 0".into()));
        }
        if self.channel_capacity == 0 {
            return Err(Error::Config(
                "channel_capacity must be greater than 0".into(),
            ));
        }
        if self.default_limit <= 0 {
            return Err(Error::Config(
                "default_limit must be greater than 0".into(),
            ));
        }

        self.index_path = match &self.index_path {
            Some(a) => Some(expand_path(a)?),
            None => Some(get_state_dir()?.join(APP_NAME).join("index.db")),
        };
        Ok(())
    }
}

/// Handle tilde (~) and environment variables in the path
fn expand_path(path: &Path) -> Result<PathBuf, Error> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let path = path
        .to_str()
        .ok_or_else(|| Error::Config(format!("invalid path: {}", path.display())))?;

    // Handle tilde and home directory
    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    // Handle state directories
    let state_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_STATE_HOME/", "${XDG_STATE_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in state_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_state_dir()?.join(stripped));
        }
    }

    Ok(path.into())
}

fn get_home_dir() -> Result<PathBuf, Error> {
    dirs::home_dir().ok_or_else(|| Error::Config("user-specific home directory not found".into()))
}

fn get_state_dir() -> Result<PathBuf, Error> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(windows)]
    let state_dir = dirs::data_local_dir();
    state_dir.ok_or_else(|| Error::Config("user-specific state directory not found".into()))
}
