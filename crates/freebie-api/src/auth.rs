//! HTTP Basic-auth extractor and standalone verifier.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::{AppState, error::ApiError};

/// Credentials accepted as valid for this relay instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Zero-size marker: present in the handler means the request was authenticated.
pub struct Authenticated;

/// Decoded `Authorization: Basic` credentials.
struct Credentials {
  username: String,
  password: String,
}

fn basic_credentials(headers: &HeaderMap) -> Option<Credentials> {
  let encoded = headers
    .get(axum::http::header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Basic ")?;

  let decoded = B64.decode(encoded.trim()).ok()?;
  let creds   = String::from_utf8(decoded).ok()?;

  // Passwords may contain ':'; usernames may not.
  let (username, password) = creds.split_once(':')?;
  Some(Credentials { username: username.to_owned(), password: password.to_owned() })
}

/// Verify credentials directly from headers.
///
/// The argon2 check runs for every request that carries credentials, so an
/// unknown username costs the same as a wrong password.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), ApiError> {
  let creds = basic_credentials(headers).ok_or(ApiError::Unauthorized)?;

  let password_ok = PasswordHash::new(&config.password_hash).is_ok_and(|hash| {
    Argon2::default()
      .verify_password(creds.password.as_bytes(), &hash)
      .is_ok()
  });
  let username_ok = creds.username == config.username;

  if password_ok && username_ok {
    Ok(())
  } else {
    tracing::debug!(username = %creds.username, "rejected API credentials");
    Err(ApiError::Unauthorized)
  }
}

impl<L, S> FromRequestParts<AppState<L, S>> for Authenticated
where
  L: Send + Sync,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<L, S>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth)?;
    Ok(Authenticated)
  }
}
