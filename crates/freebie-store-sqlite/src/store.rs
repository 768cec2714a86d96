//! [`SqliteLedger`]: the SQLite implementation of [`Ledger`].

use std::{collections::HashSet, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use freebie_core::{
  destination::{ChannelId, Destination, DestinationId},
  item::ItemId,
  ledger::{Ledger, LedgerCounts},
};

use crate::{
  schema::{SCHEMA, SCHEMA_VERSION},
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A notification ledger backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted, and every
/// clone talks to the same database thread.
#[derive(Clone)]
pub struct SqliteLedger {
  conn: tokio_rusqlite::Connection,
}

impl SqliteLedger {
  /// Open (or create) a ledger at `path` and run schema initialisation.
  /// Missing parent directories are created.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|source| Error::CreateDir { path: parent.to_path_buf(), source })?;
    }

    let conn = tokio_rusqlite::Connection::open(path).await?;
    let ledger = Self { conn };
    ledger.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened ledger");
    Ok(ledger)
  }

  /// Open an in-memory ledger: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let ledger = Self { conn };
    ledger.init_schema().await?;
    Ok(ledger)
  }

  async fn init_schema(&self) -> Result<()> {
    let found: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?))
      .await?;

    if found > SCHEMA_VERSION {
      return Err(Error::SchemaVersion { found, supported: SCHEMA_VERSION });
    }

    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Ledger impl ─────────────────────────────────────────────────────────────

impl Ledger for SqliteLedger {
  type Error = Error;

  // ── Destinations ──────────────────────────────────────────────────────────

  async fn upsert_destination(&self, destination: Destination) -> Result<()> {
    let Destination { destination_id, channel_id } = destination;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO destinations (destination_id, channel_id) VALUES (?1, ?2)
           ON CONFLICT(destination_id) DO UPDATE SET channel_id = excluded.channel_id",
          rusqlite::params![destination_id.0, channel_id.0],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn destination_channel(&self, id: DestinationId) -> Result<Option<ChannelId>> {
    let channel: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT channel_id FROM destinations WHERE destination_id = ?1",
            rusqlite::params![id.0],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    Ok(channel.map(ChannelId))
  }

  async fn list_destinations(&self) -> Result<Vec<Destination>> {
    let rows: Vec<(i64, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT destination_id, channel_id FROM destinations")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows.into_iter().map(|(d, c)| Destination::new(d, c)).collect())
  }

  async fn remove_destination(&self, id: DestinationId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM destinations WHERE destination_id = ?1",
          rusqlite::params![id.0],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  // ── Delivery records ──────────────────────────────────────────────────────

  async fn already_delivered(&self, id: DestinationId, item: &ItemId) -> Result<bool> {
    let item_str = item.as_str().to_owned();

    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM delivery_records WHERE destination_id = ?1 AND item_id = ?2",
            rusqlite::params![id.0, item_str],
            |_| Ok(()),
          )
          .optional()?)
      })
      .await?;

    Ok(found.is_some())
  }

  async fn mark_delivered(&self, id: DestinationId, item: &ItemId) -> Result<()> {
    let item_str = item.as_str().to_owned();
    let at_str   = Utc::now().to_rfc3339();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO delivery_records (destination_id, item_id, delivered_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id.0, item_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn prune_delivered(&self, id: DestinationId, keep: &[ItemId]) -> Result<u64> {
    let keep: HashSet<String> = keep.iter().map(|i| i.as_str().to_owned()).collect();

    // Diff in Rust rather than with `NOT IN (?, ?, ...)` so the keep window
    // is not bounded by SQLite's host-parameter limit.
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let stale: Vec<String> = {
          let mut stmt =
            tx.prepare("SELECT item_id FROM delivery_records WHERE destination_id = ?1")?;
          stmt
            .query_map(rusqlite::params![id.0], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .filter(|item| !keep.contains(item))
            .collect()
        };

        let mut deleted = 0_u64;
        {
          let mut stmt = tx.prepare(
            "DELETE FROM delivery_records WHERE destination_id = ?1 AND item_id = ?2",
          )?;
          for item in &stale {
            deleted += stmt.execute(rusqlite::params![id.0, item])? as u64;
          }
        }

        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    if deleted > 0 {
      tracing::debug!(destination = %id, deleted, "pruned delivery records");
    }
    Ok(deleted)
  }

  async fn has_deliveries(&self, id: DestinationId) -> Result<bool> {
    let exists: bool = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS(SELECT 1 FROM delivery_records WHERE destination_id = ?1)",
          rusqlite::params![id.0],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(exists)
  }

  // ── Process state ─────────────────────────────────────────────────────────

  async fn set_state(&self, key: &str, value: &str) -> Result<()> {
    let key   = key.to_owned();
    let value = value.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO process_state (key, value) VALUES (?1, ?2)
           ON CONFLICT(key) DO UPDATE SET value = excluded.value",
          rusqlite::params![key, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_state(&self, key: &str, default: Option<String>) -> Result<Option<String>> {
    let key = key.to_owned();

    let value: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT value FROM process_state WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    Ok(value.or(default))
  }

  async fn counts(&self) -> Result<LedgerCounts> {
    let (destinations, delivery_records): (i64, i64) = self
      .conn
      .call(|conn| {
        let destinations =
          conn.query_row("SELECT COUNT(*) FROM destinations", [], |row| row.get(0))?;
        let delivery_records =
          conn.query_row("SELECT COUNT(*) FROM delivery_records", [], |row| row.get(0))?;
        Ok((destinations, delivery_records))
      })
      .await?;

    let to_u64 = |n: i64| {
      u64::try_from(n).map_err(|_| Error::CorruptRow(format!("negative count {n}")))
    };

    Ok(LedgerCounts {
      destinations:     to_u64(destinations)?,
      delivery_records: to_u64(delivery_records)?,
    })
  }
}
