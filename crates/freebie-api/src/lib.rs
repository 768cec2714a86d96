//! JSON REST API for the freebie relay.
//!
//! Exposes an axum [`Router`] backed by any [`Ledger`] and [`ListingSource`]:
//! destination configuration, ledger diagnostics and read-only giveaway
//! lookups. Every route except `/health` requires HTTP Basic auth.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = freebie_api::api_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod destinations;
pub mod error;
pub mod giveaways;
pub mod status;

use std::sync::Arc;

use axum::{Router, routing::get};
use freebie_core::{ledger::Ledger, source::ListingSource};
use tower_http::trace::TraceLayer;

pub use auth::AuthConfig;
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<L, S> {
  pub ledger: Arc<L>,
  pub source: Arc<S>,
  pub auth:   Arc<AuthConfig>,
}

// Manual impl: `#[derive(Clone)]` would demand `L: Clone, S: Clone`.
impl<L, S> Clone for AppState<L, S> {
  fn clone(&self) -> Self {
    Self {
      ledger: Arc::clone(&self.ledger),
      source: Arc::clone(&self.source),
      auth:   Arc::clone(&self.auth),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
pub fn api_router<L, S>(state: AppState<L, S>) -> Router<()>
where
  L: Ledger + 'static,
  S: ListingSource + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Destinations
    .route("/destinations", get(destinations::list::<L, S>))
    .route(
      "/destinations/{id}",
      get(destinations::get_one::<L, S>)
        .put(destinations::upsert::<L, S>)
        .delete(destinations::remove::<L, S>),
    )
    // Diagnostics
    .route("/status", get(status::handler::<L, S>))
    // Giveaways
    .route("/giveaways", get(giveaways::list::<L, S>))
    .route("/giveaways/{id}", get(giveaways::get_one::<L, S>))
    .route("/worth", get(giveaways::worth::<L, S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health() -> &'static str { "ok" }
