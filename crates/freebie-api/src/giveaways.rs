//! Handlers for the giveaway lookup commands.
//!
//! These read straight from the listing source; nothing here touches the
//! ledger. Source failures become a 502 with a fixed message.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use freebie_core::{
  filter::{ItemType, ListingFilter, Platform},
  item::{Item, ItemId, Summary},
  source::{ListingSource, Lookup},
};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Comma-separated platform slugs, e.g. `steam,gog`.
  pub platform: Option<String>,
  /// Comma-separated type slugs, e.g. `game,loot`.
  #[serde(rename = "type")]
  pub kind:     Option<String>,
  /// `date`, `value` or `popularity`.
  pub sort:     Option<String>,
}

/// `GET /giveaways[?platform=..][&type=..][&sort=..]`
pub async fn list<L, S>(
  _auth: Authenticated,
  State(state): State<AppState<L, S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Item>>, ApiError>
where
  L: Send + Sync,
  S: ListingSource,
{
  let filter = ListingFilter::parse(
    params.platform.as_deref(),
    params.kind.as_deref(),
    params.sort.as_deref(),
  )
  .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let items = state.source.list(&filter).await.map_err(ApiError::source)?;
  Ok(Json(items))
}

/// `GET /giveaways/:id`
pub async fn get_one<L, S>(
  _auth: Authenticated,
  State(state): State<AppState<L, S>>,
  Path(raw): Path<String>,
) -> Result<Json<Item>, ApiError>
where
  L: Send + Sync,
  S: ListingSource,
{
  let not_found = || ApiError::NotFound(format!("No giveaway found for id {raw}"));
  let id: ItemId = raw.parse().map_err(|_| not_found())?;

  match state.source.fetch_one(&id).await.map_err(ApiError::source)? {
    Lookup::Found(item) => Ok(Json(item)),
    Lookup::NotFound => Err(not_found()),
  }
}

#[derive(Debug, Deserialize, Default)]
pub struct WorthParams {
  pub platform: Option<String>,
  #[serde(rename = "type")]
  pub kind:     Option<String>,
}

/// `GET /worth[?platform=..][&type=..]`
pub async fn worth<L, S>(
  _auth: Authenticated,
  State(state): State<AppState<L, S>>,
  Query(params): Query<WorthParams>,
) -> Result<Json<Summary>, ApiError>
where
  L: Send + Sync,
  S: ListingSource,
{
  let bad = |e: freebie_core::Error| ApiError::BadRequest(e.to_string());
  let platform = params
    .platform
    .as_deref()
    .map(str::parse::<Platform>)
    .transpose()
    .map_err(bad)?;
  let kind = params
    .kind
    .as_deref()
    .map(str::parse::<ItemType>)
    .transpose()
    .map_err(bad)?;

  match state.source.summary(platform, kind).await.map_err(ApiError::source)? {
    Lookup::Found(summary) => Ok(Json(summary)),
    Lookup::NotFound => Err(ApiError::NotFound("no worth estimate available".to_owned())),
  }
}
