//! Handler for `GET /status`: ledger diagnostics.

use axum::{
  Json,
  extract::{Query, State},
};
use freebie_core::{
  destination::{ChannelId, DestinationId},
  ledger::{LAST_CHECK_KEY, LAST_RECONCILED_KEY, Ledger},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::Authenticated, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct StatusParams {
  /// Also report the channel configured for this destination.
  pub destination_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReport {
  pub destinations:     u64,
  pub delivery_records: u64,
  pub last_check:       Option<String>,
  pub last_reconciled:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub channel_id:       Option<ChannelId>,
}

/// `GET /status[?destination_id=<id>]`
pub async fn handler<L, S>(
  _auth: Authenticated,
  State(state): State<AppState<L, S>>,
  Query(params): Query<StatusParams>,
) -> Result<Json<StatusReport>, ApiError>
where
  L: Ledger,
  S: Send + Sync,
{
  let ledger = &state.ledger;
  let counts = ledger.counts().await.map_err(ApiError::store)?;
  let last_check = ledger.get_state(LAST_CHECK_KEY, None).await.map_err(ApiError::store)?;
  let last_reconciled = ledger
    .get_state(LAST_RECONCILED_KEY, None)
    .await
    .map_err(ApiError::store)?;

  let channel_id = match params.destination_id {
    Some(id) => ledger
      .destination_channel(DestinationId(id))
      .await
      .map_err(ApiError::store)?,
    None => None,
  };

  Ok(Json(StatusReport {
    destinations: counts.destinations,
    delivery_records: counts.delivery_records,
    last_check,
    last_reconciled,
    channel_id,
  }))
}
