//! The `Ledger` trait: durable bookkeeping of destinations and deliveries.
//!
//! The trait is implemented by storage backends (e.g. `freebie-store-sqlite`).
//! The poll engine and the HTTP API depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use serde::Serialize;

use crate::{
  destination::{ChannelId, Destination, DestinationId},
  item::ItemId,
};

/// Process-state key holding the RFC 3339 time of the last successful fetch.
pub const LAST_CHECK_KEY: &str = "last_check_timestamp";

/// Process-state key holding the RFC 3339 time of startup reconciliation.
pub const LAST_RECONCILED_KEY: &str = "last_reconciled_at";

/// Row counts, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerCounts {
  pub destinations:     u64,
  pub delivery_records: u64,
}

/// Abstraction over a notification ledger backend.
///
/// A delivery record `(destination, item)` exists at most once. Inserting it
/// again is a no-op, never an error. Records are only removed by
/// [`Ledger::prune_delivered`] or by removing their destination.
///
/// Mutations must be serialised by the backend. Storage failures are returned
/// to the caller, never swallowed.
pub trait Ledger: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Destinations ──────────────────────────────────────────────────────

  /// Create or reconfigure a destination. Overwrites the channel if the
  /// destination already exists.
  fn upsert_destination(
    &self,
    destination: Destination,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The channel configured for a destination, if any.
  fn destination_channel(
    &self,
    id: DestinationId,
  ) -> impl Future<Output = Result<Option<ChannelId>, Self::Error>> + Send + '_;

  /// All configured destinations, in no particular order.
  fn list_destinations(
    &self,
  ) -> impl Future<Output = Result<Vec<Destination>, Self::Error>> + Send + '_;

  /// Delete a destination and, by cascade, its delivery records.
  /// Returns `false` if it did not exist.
  fn remove_destination(
    &self,
    id: DestinationId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Delivery records ──────────────────────────────────────────────────

  fn already_delivered<'a>(
    &'a self,
    id: DestinationId,
    item: &'a ItemId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert-if-absent.
  fn mark_delivered<'a>(
    &'a self,
    id: DestinationId,
    item: &'a ItemId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete every record of `id` whose item is not in `keep`. Returns the
  /// number of records deleted. An empty `keep` clears the destination's
  /// history.
  fn prune_delivered<'a>(
    &'a self,
    id: DestinationId,
    keep: &'a [ItemId],
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Whether the destination has any delivery record at all.
  fn has_deliveries(
    &self,
    id: DestinationId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Process state ─────────────────────────────────────────────────────

  fn set_state<'a>(
    &'a self,
    key: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// The stored value for `key`, or `default` if none is stored.
  fn get_state<'a>(
    &'a self,
    key: &'a str,
    default: Option<String>,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  fn counts(&self) -> impl Future<Output = Result<LedgerCounts, Self::Error>> + Send + '_;
}
