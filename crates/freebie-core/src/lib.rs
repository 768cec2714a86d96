//! Core types and trait definitions for the freebie giveaway relay.
//!
//! This crate has no HTTP or database dependencies.
//! The ledger backend, the listing source and the delivery target all live in
//! their own crates and meet here through the [`ledger::Ledger`],
//! [`source::ListingSource`] and [`delivery::DeliveryTarget`] traits.

pub mod delivery;
pub mod destination;
pub mod error;
pub mod filter;
pub mod item;
pub mod ledger;
pub mod source;

pub use error::{Error, Result};
