//! Discord delivery target.
//!
//! Talks to the Discord REST API directly with a bot token: no gateway
//! connection is needed to post messages. [`DiscordTarget`] implements
//! [`freebie_core::delivery::DeliveryTarget`].

pub mod error;
mod message;
mod target;

pub use error::{Error, Result};
pub use target::{BotUser, ChannelHandle, DiscordConfig, DiscordTarget};
