// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::PathBuf;

/// Errors produced by the calsearch core.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The event source could not be opened.
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        /// Path of the event source
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Reading from the event source failed midway.
    #[error("failed to read event source: {0}")]
    Read(#[source] io::Error),

    /// The parser task stopped without finishing the source.
    #[error("event parser stopped unexpectedly: {0}")]
    Producer(String),

    /// SQLite error raised by the search index.
    #[error("search index error: {0}")]
    Database(#[from] sqlx::Error),

    /// The index schema could not be created or upgraded.
    #[error("failed to run index migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The query cannot be executed against the index.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}
