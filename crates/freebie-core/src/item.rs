//! Giveaway items as seen by the relay.
//!
//! Items are sourced fresh on every poll. The relay never stores them; only
//! the [`ItemId`] survives a cycle, as the key of a delivery record.

use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Identifier of a giveaway. The upstream API uses integers, but the relay
/// treats ids as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
  pub fn new(id: impl Into<String>) -> crate::Result<Self> {
    let id = id.into();
    let trimmed = id.trim();
    if trimmed.is_empty() {
      return Err(Error::EmptyItemId);
    }
    if trimmed.len() == id.len() {
      Ok(Self(id))
    } else {
      Ok(Self(trimmed.to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<u64> for ItemId {
  fn from(id: u64) -> Self { Self(id.to_string()) }
}

impl FromStr for ItemId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Self::new(s) }
}

impl fmt::Display for ItemId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// One listing entry, normalised at the source boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
  pub id:           ItemId,
  pub title:        String,
  /// Free-form value string as published, e.g. `"$19.99"` or `"N/A"`.
  pub worth:        String,
  pub description:  String,
  pub instructions: String,
  pub claim_url:    String,
  pub image_url:    String,
  /// Comma-separated platform names as published.
  pub platforms:    String,
  /// `Game`, `DLC`, `Early Access`, ...
  #[serde(rename = "type")]
  pub kind:         String,
  pub published_at: Option<NaiveDateTime>,
  pub ends_at:      Option<NaiveDateTime>,
  pub users:        Option<u64>,
  pub status:       Option<String>,
}

impl Item {
  /// A bare item with only an id and a title; the remaining fields are empty.
  pub fn stub(id: ItemId, title: impl Into<String>) -> Self {
    Self {
      id,
      title: title.into(),
      worth: String::new(),
      description: String::new(),
      instructions: String::new(),
      claim_url: String::new(),
      image_url: String::new(),
      platforms: String::new(),
      kind: String::new(),
      published_at: None,
      ends_at: None,
      users: None,
      status: None,
    }
  }
}

/// Aggregate figures over the live giveaways matching a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
  pub total:          u64,
  /// Estimated combined value in USD, as published.
  pub worth_estimate: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn item_id_trims_whitespace() {
    let id: ItemId = " 1234 ".parse().unwrap();
    assert_eq!(id.as_str(), "1234");
  }

  #[test]
  fn item_id_rejects_blank() {
    assert_eq!(ItemId::new("   "), Err(Error::EmptyItemId));
  }

  #[test]
  fn item_id_from_integer_matches_string_form() {
    assert_eq!(ItemId::from(42), "42".parse().unwrap());
  }

  #[test]
  fn item_serialises_kind_as_type() {
    let mut item = Item::stub(ItemId::from(7), "Free Thing");
    item.kind = "Game".into();
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["type"], "Game");
    assert_eq!(json["id"], "7");
  }
}
