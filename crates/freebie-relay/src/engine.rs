//! The poll-and-notify engine and startup reconciliation.
//!
//! One [`Engine`] value owns the whole lifecycle state; the scheduler task
//! owns the engine. Per-destination failures are isolated and reported in a
//! [`DestinationReport`]; only ledger failures outside a destination's scope
//! surface as `Err`.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use freebie_core::{
  delivery::{DeliveryTarget, Resolution},
  destination::{Destination, DestinationId},
  filter::{ListingFilter, SortBy},
  item::{Item, ItemId},
  ledger::{LAST_CHECK_KEY, LAST_RECONCILED_KEY, Ledger},
  source::ListingSource,
};

use crate::{
  Error, Result,
  error::{CallError, bounded},
};

// ─── Settings & state ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EngineSettings {
  /// How many of the newest listing ids survive a prune.
  pub retention_window: usize,
  /// Listing query used by every cycle. The engine always sorts it by
  /// date: the newest item and the retention window both depend on it.
  pub filter:           ListingFilter,
  pub fetch_timeout:    Duration,
  /// Bound on each channel resolution and each send.
  pub delivery_timeout: Duration,
}

impl Default for EngineSettings {
  fn default() -> Self {
    Self {
      retention_window: 200,
      filter:           ListingFilter::newest_first(),
      fetch_timeout:    Duration::from_secs(15),
      delivery_timeout: Duration::from_secs(15),
    }
  }
}

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
  /// Reconciliation has not completed yet.
  NotStarted,
  /// Reconciliation ran; the next cycle is suppressed.
  Reconciled,
  /// Regular polling.
  Polling,
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
  /// First cycle after reconciliation: bookkeeping only.
  Suppressed,
  FetchFailed,
  EmptyListing,
  NoDestinations,
  Completed(Vec<DestinationReport>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileReport {
  AlreadyReconciled,
  NoDestinations,
  /// The engine stays [`EngineState::NotStarted`].
  FetchFailed,
  EmptyListing,
  Completed(Vec<DestinationReport>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationReport {
  pub destination: DestinationId,
  pub outcome:     DestinationOutcome,
  /// Ids marked delivered without sending (reconciliation of a destination
  /// with no history).
  pub seeded:      usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationOutcome {
  /// Nothing new for this destination.
  UpToDate,
  /// Every new item was sent and recorded.
  Delivered { sent: usize },
  /// The channel is gone or cannot carry messages; nothing was sent.
  Unreachable { pending: usize },
  /// A send failed; the remaining items wait for the next cycle.
  Interrupted { sent: usize, pending: usize },
  /// A ledger call failed part-way.
  StorageFailed,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct Engine<L, S, T> {
  ledger:   Arc<L>,
  source:   Arc<S>,
  target:   Arc<T>,
  settings: EngineSettings,
  state:    EngineState,
}

impl<L, S, T> Engine<L, S, T>
where
  L: Ledger,
  S: ListingSource,
  T: DeliveryTarget,
{
  pub fn new(
    ledger: Arc<L>,
    source: Arc<S>,
    target: Arc<T>,
    mut settings: EngineSettings,
  ) -> Self {
    if settings.filter.sort != Some(SortBy::Date) {
      tracing::warn!(sort = ?settings.filter.sort, "poll filter must be newest first; overriding");
      settings.filter.sort = Some(SortBy::Date);
    }
    Self { ledger, source, target, settings, state: EngineState::NotStarted }
  }

  pub fn state(&self) -> EngineState { self.state }

  /// One scheduler tick: reconcile if that has not happened yet, otherwise
  /// run a cycle.
  pub async fn tick(&mut self) -> Result<()> {
    if self.state == EngineState::NotStarted {
      self.reconcile().await?;
    } else {
      self.run_cycle().await?;
    }
    Ok(())
  }

  // ── Cycle ─────────────────────────────────────────────────────────────────

  /// Fetch, diff against the ledger, prune, deliver.
  pub async fn run_cycle(&mut self) -> Result<CycleReport> {
    if self.state == EngineState::Reconciled {
      self.stamp(LAST_CHECK_KEY).await?;
      self.state = EngineState::Polling;
      tracing::info!("first cycle after reconciliation; nothing delivered");
      return Ok(CycleReport::Suppressed);
    }
    self.state = EngineState::Polling;

    let Some(items) = self.fetch().await else {
      return Ok(CycleReport::FetchFailed);
    };
    self.stamp(LAST_CHECK_KEY).await?;

    if items.is_empty() {
      tracing::debug!("listing is empty");
      return Ok(CycleReport::EmptyListing);
    }

    let destinations = self.ledger.list_destinations().await.map_err(Error::ledger)?;
    if destinations.is_empty() {
      tracing::debug!("no destinations configured");
      return Ok(CycleReport::NoDestinations);
    }

    let window = self.window(&items);
    let mut reports = Vec::with_capacity(destinations.len());

    for destination in &destinations {
      let outcome = self
        .poll_destination(destination, &items, &window)
        .await
        .unwrap_or_else(|e| {
          tracing::error!(
            destination = %destination.destination_id,
            error = %e,
            "ledger failure; skipping destination this cycle"
          );
          DestinationOutcome::StorageFailed
        });
      reports.push(DestinationReport {
        destination: destination.destination_id,
        outcome,
        seeded: 0,
      });
    }

    let sent: usize = reports.iter().map(|r| sent_count(r.outcome)).sum();
    tracing::info!(items = items.len(), destinations = reports.len(), sent, "cycle complete");
    Ok(CycleReport::Completed(reports))
  }

  async fn poll_destination(
    &self,
    destination: &Destination,
    items: &[Item],
    window: &[ItemId],
  ) -> Result<DestinationOutcome, L::Error> {
    let id = destination.destination_id;

    let mut new_items = Vec::new();
    for item in items {
      if !self.ledger.already_delivered(id, &item.id).await? {
        new_items.push(item);
      }
    }
    if new_items.is_empty() {
      return Ok(DestinationOutcome::UpToDate);
    }

    self.ledger.prune_delivered(id, window).await?;

    let pending = new_items.len();
    let handle = match self.resolve(destination).await {
      Ok(Some(handle)) => handle,
      Ok(None) => return Ok(DestinationOutcome::Unreachable { pending }),
      Err(e) => {
        tracing::warn!(destination = %id, error = %e, "could not resolve channel");
        return Ok(DestinationOutcome::Interrupted { sent: 0, pending });
      }
    };

    let mut sent = 0;
    for item in new_items {
      if let Err(e) = bounded(self.settings.delivery_timeout, self.target.send(&handle, item)).await
      {
        tracing::warn!(
          destination = %id,
          item = %item.id,
          error = %e,
          "delivery failed; stopping this destination until next cycle"
        );
        return Ok(DestinationOutcome::Interrupted { sent, pending: pending - sent });
      }
      self.ledger.mark_delivered(id, &item.id).await?;
      sent += 1;
    }

    tracing::debug!(destination = %id, sent, "destination up to date");
    Ok(DestinationOutcome::Delivered { sent })
  }

  // ── Reconciliation ────────────────────────────────────────────────────────

  /// Startup routine: send each destination only the newest item, without
  /// replaying the backlog, and suppress the next cycle.
  pub async fn reconcile(&mut self) -> Result<ReconcileReport> {
    if self.state != EngineState::NotStarted {
      return Ok(ReconcileReport::AlreadyReconciled);
    }

    let destinations = self.ledger.list_destinations().await.map_err(Error::ledger)?;
    if destinations.is_empty() {
      self.finish_reconcile().await?;
      return Ok(ReconcileReport::NoDestinations);
    }

    let Some(items) = self.fetch().await else {
      tracing::warn!("reconciliation postponed to the next tick");
      return Ok(ReconcileReport::FetchFailed);
    };

    let Some(newest) = items.first() else {
      self.finish_reconcile().await?;
      return Ok(ReconcileReport::EmptyListing);
    };

    let window = self.window(&items);
    let mut reports = Vec::with_capacity(destinations.len());

    for destination in &destinations {
      let mut seeded = 0;
      let outcome = self
        .reconcile_destination(destination, newest, &window, &mut seeded)
        .await
        .unwrap_or_else(|e| {
          tracing::error!(
            destination = %destination.destination_id,
            error = %e,
            "ledger failure during reconciliation"
          );
          DestinationOutcome::StorageFailed
        });
      reports.push(DestinationReport {
        destination: destination.destination_id,
        outcome,
        seeded,
      });
    }

    self.finish_reconcile().await?;
    tracing::info!(destinations = reports.len(), newest = %newest.id, "reconciliation complete");
    Ok(ReconcileReport::Completed(reports))
  }

  async fn reconcile_destination(
    &self,
    destination: &Destination,
    newest: &Item,
    window: &[ItemId],
    seeded: &mut usize,
  ) -> Result<DestinationOutcome, L::Error> {
    let id = destination.destination_id;

    if self.ledger.has_deliveries(id).await? {
      if self.ledger.already_delivered(id, &newest.id).await? {
        return Ok(DestinationOutcome::UpToDate);
      }
    } else {
      // Fresh destination: everything but the newest item counts as seen.
      for item_id in window.iter().filter(|i| **i != newest.id) {
        self.ledger.mark_delivered(id, item_id).await?;
        *seeded += 1;
      }
    }

    let handle = match self.resolve(destination).await {
      Ok(Some(handle)) => handle,
      Ok(None) => return Ok(DestinationOutcome::Unreachable { pending: 1 }),
      Err(e) => {
        tracing::warn!(destination = %id, error = %e, "could not resolve channel");
        return Ok(DestinationOutcome::Interrupted { sent: 0, pending: 1 });
      }
    };

    match bounded(self.settings.delivery_timeout, self.target.send(&handle, newest)).await {
      Ok(ack) => {
        self.ledger.mark_delivered(id, &newest.id).await?;
        tracing::debug!(destination = %id, message = %ack.message_ref, "sent newest giveaway");
        Ok(DestinationOutcome::Delivered { sent: 1 })
      }
      Err(e) => {
        tracing::warn!(destination = %id, item = %newest.id, error = %e, "delivery failed");
        Ok(DestinationOutcome::Interrupted { sent: 0, pending: 1 })
      }
    }
  }

  async fn finish_reconcile(&mut self) -> Result<()> {
    self.stamp(LAST_RECONCILED_KEY).await?;
    self.state = EngineState::Reconciled;
    Ok(())
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  async fn fetch(&self) -> Option<Vec<Item>> {
    match bounded(self.settings.fetch_timeout, self.source.list(&self.settings.filter)).await {
      Ok(items) => {
        tracing::debug!(count = items.len(), "fetched listing");
        Some(items)
      }
      Err(e) => {
        tracing::warn!(error = %e, "could not fetch giveaways; retrying next tick");
        None
      }
    }
  }

  /// `Ok(None)` when the channel is gone or cannot carry messages.
  async fn resolve(
    &self,
    destination: &Destination,
  ) -> Result<Option<T::Handle>, CallError<T::Error>> {
    let resolution = bounded(
      self.settings.delivery_timeout,
      self.target.resolve(destination.channel_id),
    )
    .await?;

    match resolution {
      Resolution::Sendable(handle) => Ok(Some(handle)),
      Resolution::NotFound => {
        tracing::warn!(
          destination = %destination.destination_id,
          channel = %destination.channel_id,
          "configured channel not found; skipping"
        );
        Ok(None)
      }
      Resolution::Unsendable => {
        tracing::warn!(
          destination = %destination.destination_id,
          channel = %destination.channel_id,
          "configured channel cannot receive notifications; skipping"
        );
        Ok(None)
      }
    }
  }

  fn window(&self, items: &[Item]) -> Vec<ItemId> {
    items
      .iter()
      .take(self.settings.retention_window)
      .map(|i| i.id.clone())
      .collect()
  }

  async fn stamp(&self, key: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    self.ledger.set_state(key, &now).await.map_err(Error::ledger)
  }
}

fn sent_count(outcome: DestinationOutcome) -> usize {
  match outcome {
    DestinationOutcome::Delivered { sent } | DestinationOutcome::Interrupted { sent, .. } => sent,
    _ => 0,
  }
}
