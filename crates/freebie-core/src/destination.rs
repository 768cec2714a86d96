//! Destinations: configured delivery targets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a destination (a Discord guild in practice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(pub i64);

/// Opaque identifier of the channel a destination posts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub i64);

impl fmt::Display for DestinationId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl fmt::Display for ChannelId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// One configured destination. There is at most one per `destination_id`;
/// reconfiguring replaces the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
  pub destination_id: DestinationId,
  pub channel_id:     ChannelId,
}

impl Destination {
  pub fn new(destination_id: i64, channel_id: i64) -> Self {
    Self {
      destination_id: DestinationId(destination_id),
      channel_id:     ChannelId(channel_id),
    }
  }
}
