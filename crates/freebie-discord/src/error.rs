//! Error type for `freebie-discord`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Build(#[source] reqwest::Error),

  #[error("discord token is empty")]
  MissingToken,

  #[error("discord rejected the bot token ({0})")]
  Unauthorized(StatusCode),

  #[error("{what} failed: {source}")]
  Request {
    what:   &'static str,
    #[source]
    source: reqwest::Error,
  },

  #[error("{what} → {status}: {body}")]
  Status {
    what:   &'static str,
    status: StatusCode,
    body:   String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
