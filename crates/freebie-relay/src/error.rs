//! Error types for `freebie-relay`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("could not load configuration: {0}")]
  Load(#[from] config::ConfigError),

  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("ledger error: {0}")]
  Ledger(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn ledger<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Ledger(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of a bounded call to a collaborator.
#[derive(Debug, Error)]
pub enum CallError<E> {
  #[error(transparent)]
  Failed(E),

  #[error("timed out after {0:?}")]
  TimedOut(Duration),
}

/// Await `fut`, giving up after `limit`.
pub(crate) async fn bounded<F, T, E>(limit: Duration, fut: F) -> Result<T, CallError<E>>
where
  F: std::future::Future<Output = Result<T, E>>,
{
  match tokio::time::timeout(limit, fut).await {
    Ok(result) => result.map_err(CallError::Failed),
    Err(_) => Err(CallError::TimedOut(limit)),
  }
}
