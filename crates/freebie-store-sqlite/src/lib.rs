//! SQLite backend for the freebie notification ledger.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. That thread is also the single writer:
//! every statement is funnelled through it in submission order.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteLedger;
