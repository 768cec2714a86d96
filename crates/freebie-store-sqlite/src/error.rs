//! Error type for `freebie-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("could not create store directory {path}: {source}")]
  CreateDir {
    path:   std::path::PathBuf,
    source: std::io::Error,
  },

  #[error("unsupported schema version {found} (expected at most {supported})")]
  SchemaVersion { found: i64, supported: i64 },

  #[error("corrupt row: {0}")]
  CorruptRow(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
