//! The `DeliveryTarget` trait: where notifications go.
//!
//! Rendering is the target's business: the engine hands over an [`Item`] and
//! only cares whether the send succeeded.

use std::future::Future;

use serde::Serialize;

use crate::{destination::ChannelId, item::Item};

/// What a configured channel turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<H> {
  /// The channel exists and accepts messages.
  Sendable(H),
  /// The channel no longer exists (or was never visible to us).
  NotFound,
  /// The channel exists but cannot carry notifications (voice, category,
  /// missing permissions).
  Unsendable,
}

/// Proof that a message was accepted by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryAck {
  pub message_ref: String,
}

pub trait DeliveryTarget: Send + Sync {
  /// A resolved, sendable channel.
  type Handle: Send + Sync;
  type Error: std::error::Error + Send + Sync + 'static;

  fn resolve(
    &self,
    channel: ChannelId,
  ) -> impl Future<Output = Result<Resolution<Self::Handle>, Self::Error>> + Send + '_;

  /// Render `item` and post it to `handle`.
  fn send<'a>(
    &'a self,
    handle: &'a Self::Handle,
    item: &'a Item,
  ) -> impl Future<Output = Result<DeliveryAck, Self::Error>> + Send + 'a;
}
