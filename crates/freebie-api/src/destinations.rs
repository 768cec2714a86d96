//! Handlers for `/destinations` endpoints: the configuration commands.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/destinations` | |
//! | `PUT`    | `/destinations/:id` | Body: `{"channel_id": 123}`; creates or reconfigures |
//! | `GET`    | `/destinations/:id` | 404 if no channel is configured |
//! | `DELETE` | `/destinations/:id` | Drops the destination and its delivery history |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use freebie_core::{
  destination::{Destination, DestinationId},
  ledger::Ledger,
};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /destinations`
pub async fn list<L, S>(
  _auth: Authenticated,
  State(state): State<AppState<L, S>>,
) -> Result<Json<Vec<Destination>>, ApiError>
where
  L: Ledger,
  S: Send + Sync,
{
  let mut destinations = state.ledger.list_destinations().await.map_err(ApiError::store)?;
  destinations.sort_by_key(|d| d.destination_id);
  Ok(Json(destinations))
}

#[derive(Debug, Deserialize)]
pub struct UpsertBody {
  pub channel_id: i64,
}

/// `PUT /destinations/:id`
pub async fn upsert<L, S>(
  _auth: Authenticated,
  State(state): State<AppState<L, S>>,
  Path(id): Path<i64>,
  Json(body): Json<UpsertBody>,
) -> Result<Json<Destination>, ApiError>
where
  L: Ledger,
  S: Send + Sync,
{
  let destination = Destination::new(id, body.channel_id);
  state
    .ledger
    .upsert_destination(destination)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(destination = id, channel = body.channel_id, "destination configured");
  Ok(Json(destination))
}

/// `GET /destinations/:id`
pub async fn get_one<L, S>(
  _auth: Authenticated,
  State(state): State<AppState<L, S>>,
  Path(id): Path<i64>,
) -> Result<Json<Destination>, ApiError>
where
  L: Ledger,
  S: Send + Sync,
{
  let destination_id = DestinationId(id);
  let channel_id = state
    .ledger
    .destination_channel(destination_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no channel configured for destination {id}")))?;

  Ok(Json(Destination { destination_id, channel_id }))
}

/// `DELETE /destinations/:id`
pub async fn remove<L, S>(
  _auth: Authenticated,
  State(state): State<AppState<L, S>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  L: Ledger,
  S: Send + Sync,
{
  let removed = state
    .ledger
    .remove_destination(DestinationId(id))
    .await
    .map_err(ApiError::store)?;

  if !removed {
    return Err(ApiError::NotFound(format!("destination {id} not found")));
  }
  tracing::info!(destination = id, "destination removed");
  Ok(StatusCode::NO_CONTENT)
}
