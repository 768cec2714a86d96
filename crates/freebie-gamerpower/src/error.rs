//! Error type for `freebie-gamerpower`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Build(#[source] reqwest::Error),

  #[error("GET {path} failed: {source}")]
  Request {
    path:   &'static str,
    #[source]
    source: reqwest::Error,
  },

  #[error("GET {path} → {status}")]
  Status {
    path:   &'static str,
    status: StatusCode,
  },

  #[error("unexpected response from {path}: {message}")]
  Decode {
    path:    &'static str,
    message: String,
  },
}

impl Error {
  /// Whether the request never produced an HTTP response (DNS, connect,
  /// timeout).
  pub fn is_transport(&self) -> bool { matches!(self, Error::Request { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
