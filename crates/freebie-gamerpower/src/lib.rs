//! GamerPower listing source.
//!
//! [`GamerPowerClient`] implements [`freebie_core::source::ListingSource`] over
//! the public GamerPower JSON API. Response shapes are normalised in [`wire`]
//! so nothing above this crate ever sees the upstream field names.

mod client;
pub mod error;
pub mod wire;

pub use client::{GamerPowerClient, SourceConfig};
pub use error::{Error, Result};
