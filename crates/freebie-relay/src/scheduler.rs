//! Fixed-period driver for the [`Engine`].

use std::time::Duration;

use freebie_core::{delivery::DeliveryTarget, ledger::Ledger, source::ListingSource};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::engine::Engine;

/// Tick every `period` until `cancel` fires.
///
/// The first tick lands one `period` after the call. A cycle that outlasts
/// the period causes missed ticks to be skipped, never run back to back.
/// Cancellation is observed between cycles.
pub async fn run<L, S, T>(mut engine: Engine<L, S, T>, period: Duration, cancel: CancellationToken)
where
  L: Ledger,
  S: ListingSource,
  T: DeliveryTarget,
{
  let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

  tracing::info!(period_secs = period.as_secs(), "scheduler started");
  loop {
    tokio::select! {
      _ = ticker.tick() => {
        if let Err(e) = engine.tick().await {
          tracing::error!(error = %e, "poll cycle failed");
        }
      }
      _ = cancel.cancelled() => {
        tracing::info!("scheduler shutting down");
        break;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  };

  use freebie_core::{
    delivery::{DeliveryAck, Resolution},
    destination::ChannelId,
    filter::{ItemType, ListingFilter, Platform},
    item::{Item, ItemId, Summary},
    source::Lookup,
  };
  use freebie_store_sqlite::SqliteLedger;

  use super::*;
  use crate::engine::EngineSettings;

  #[derive(Debug, thiserror::Error)]
  #[error("unused")]
  struct Never;

  #[derive(Default)]
  struct CountingSource {
    calls: AtomicUsize,
  }

  impl ListingSource for CountingSource {
    type Error = Never;

    async fn list(&self, _filter: &ListingFilter) -> Result<Vec<Item>, Never> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(Vec::new())
    }

    async fn fetch_one(&self, _id: &ItemId) -> Result<Lookup<Item>, Never> { Ok(Lookup::NotFound) }

    async fn summary(
      &self,
      _platform: Option<Platform>,
      _kind: Option<ItemType>,
    ) -> Result<Lookup<Summary>, Never> {
      Ok(Lookup::NotFound)
    }
  }

  struct NullTarget;

  impl DeliveryTarget for NullTarget {
    type Handle = ChannelId;
    type Error = Never;

    async fn resolve(&self, channel: ChannelId) -> Result<Resolution<ChannelId>, Never> {
      Ok(Resolution::Sendable(channel))
    }

    async fn send(&self, _handle: &ChannelId, item: &Item) -> Result<DeliveryAck, Never> {
      Ok(DeliveryAck { message_ref: item.id.to_string() })
    }
  }

  #[tokio::test]
  async fn ticks_until_cancelled() {
    let ledger = Arc::new(SqliteLedger::open_in_memory().await.unwrap());
    let source = Arc::new(CountingSource::default());
    let mut engine =
      Engine::new(ledger, source.clone(), Arc::new(NullTarget), EngineSettings::default());
    engine.reconcile().await.unwrap();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(engine, Duration::from_millis(20), cancel.clone()));

    tokio::time::sleep(Duration::from_millis(150)).await;
    cancel.cancel();
    task.await.unwrap();

    // The first tick is the suppressed cycle, which does not fetch.
    assert!(source.calls.load(Ordering::SeqCst) >= 2);
  }

  #[tokio::test]
  async fn stops_promptly_when_cancelled_before_first_tick() {
    let ledger = Arc::new(SqliteLedger::open_in_memory().await.unwrap());
    let source = Arc::new(CountingSource::default());
    let engine =
      Engine::new(ledger, source.clone(), Arc::new(NullTarget), EngineSettings::default());

    let cancel = CancellationToken::new();
    cancel.cancel();
    run(engine, Duration::from_secs(3600), cancel).await;

    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
  }
}
