//! Error types for `freebie-core`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("unknown platform: {0:?}")]
  UnknownPlatform(String),

  #[error("unknown giveaway type: {0:?}")]
  UnknownItemType(String),

  #[error("unknown sort order: {0:?}")]
  UnknownSort(String),

  #[error("giveaway id must not be empty")]
  EmptyItemId,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
