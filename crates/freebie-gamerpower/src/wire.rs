//! Raw GamerPower response shapes and their normalisation into core types.
//!
//! The API is loose about types (ids and counts arrive as numbers or strings,
//! absent dates are `"N/A"`) and about names (the summary endpoint has used
//! both `active_giveaways_number`/`worth_estimation_usd` and `total`/`worth`).
//! All of that is absorbed here.

use chrono::NaiveDateTime;
use freebie_core::item::{Item, ItemId, Summary};
use serde::Deserialize;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── Scalars ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
  Int(u64),
  Float(f64),
  Text(String),
}

impl NumberOrText {
  fn into_text(self) -> String {
    match self {
      NumberOrText::Int(n) => n.to_string(),
      NumberOrText::Float(f) => f.to_string(),
      NumberOrText::Text(s) => s,
    }
  }

  fn as_count(&self) -> Option<u64> {
    match self {
      NumberOrText::Int(n) => Some(*n),
      NumberOrText::Float(f) if *f >= 0.0 => Some(*f as u64),
      NumberOrText::Float(_) => None,
      NumberOrText::Text(s) => s.trim().parse().ok(),
    }
  }
}

/// Parse an upstream timestamp; `"N/A"`, blanks and garbage become `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
  NaiveDateTime::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

// ─── Giveaway ────────────────────────────────────────────────────────────────

/// One element of `/giveaways`, `/filter`, or the body of `/giveaway`.
#[derive(Debug, Deserialize)]
pub struct RawGiveaway {
  id:                Option<NumberOrText>,
  title:             Option<String>,
  worth:             Option<String>,
  description:       Option<String>,
  instructions:      Option<String>,
  open_giveaway_url: Option<String>,
  open_giveaway:     Option<String>,
  gamerpower_url:    Option<String>,
  image:             Option<String>,
  thumbnail:         Option<String>,
  platforms:         Option<String>,
  #[serde(rename = "type")]
  kind:              Option<String>,
  published_date:    Option<String>,
  end_date:          Option<String>,
  users:             Option<NumberOrText>,
  status:            Option<String>,
}

impl RawGiveaway {
  /// Normalise into an [`Item`]. Returns `None` when the entry has no usable
  /// id, since such an entry can never be deduplicated.
  pub fn into_item(self) -> Option<Item> {
    let id = ItemId::new(self.id?.into_text()).ok()?;

    let first_non_empty = |candidates: [Option<String>; 3]| {
      candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default()
    };

    Some(Item {
      id,
      title:        self.title.unwrap_or_default(),
      worth:        self.worth.unwrap_or_default(),
      description:  self.description.unwrap_or_default(),
      instructions: self.instructions.unwrap_or_default(),
      claim_url:    first_non_empty([
        self.open_giveaway_url,
        self.open_giveaway,
        self.gamerpower_url,
      ]),
      image_url:    first_non_empty([self.image, self.thumbnail, None]),
      platforms:    self.platforms.unwrap_or_default(),
      kind:         self.kind.unwrap_or_default(),
      published_at: self.published_date.as_deref().and_then(parse_date),
      ends_at:      self.end_date.as_deref().and_then(parse_date),
      users:        self.users.as_ref().and_then(NumberOrText::as_count),
      status:       self.status,
    })
  }
}

/// Normalise a single JSON value into an item, if it is one.
pub fn item_from_value(value: serde_json::Value) -> Option<Item> {
  if !value.is_object() {
    return None;
  }
  serde_json::from_value::<RawGiveaway>(value)
    .ok()
    .and_then(RawGiveaway::into_item)
}

/// Normalise a listing body.
///
/// The listing endpoints answer with an array of giveaways, or with a status
/// object (`{"status": 0, "status_message": ...}`) when nothing matches.
/// Entries that cannot be normalised are dropped.
pub fn listing_from_value(value: serde_json::Value) -> Result<Vec<Item>, String> {
  match value {
    serde_json::Value::Array(entries) => {
      let total = entries.len();
      let items: Vec<Item> = entries.into_iter().filter_map(item_from_value).collect();
      if items.len() < total {
        tracing::warn!(dropped = total - items.len(), "dropped malformed listing entries");
      }
      Ok(items)
    }
    serde_json::Value::Object(_) => Ok(Vec::new()),
    other => Err(format!("expected an array, got {other}")),
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawSummary {
  #[serde(alias = "total")]
  active_giveaways_number: Option<NumberOrText>,
  #[serde(alias = "worth")]
  worth_estimation_usd:    Option<NumberOrText>,
}

/// Normalise a `/worth` body. Returns `None` when it carries no total.
pub fn summary_from_value(value: serde_json::Value) -> Option<Summary> {
  let raw: RawSummary = serde_json::from_value(value).ok()?;
  let total = raw.active_giveaways_number.as_ref().and_then(NumberOrText::as_count)?;
  Some(Summary {
    total,
    worth_estimate: raw
      .worth_estimation_usd
      .map(NumberOrText::into_text)
      .unwrap_or_else(|| "0".to_owned()),
  })
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn sample() -> serde_json::Value {
    json!({
      "id": 2934,
      "title": "Dungeon Crawler (Steam) Giveaway",
      "worth": "$14.99",
      "thumbnail": "https://www.gamerpower.com/offers/1/thumb.jpg",
      "image": "https://www.gamerpower.com/offers/1b/img.jpg",
      "description": "Grab it for free.",
      "instructions": "1. Click the button.",
      "open_giveaway_url": "https://www.gamerpower.com/open/dungeon",
      "published_date": "2026-03-04 10:20:30",
      "type": "Game",
      "platforms": "PC, Steam",
      "end_date": "N/A",
      "users": 1530,
      "status": "Active",
      "gamerpower_url": "https://www.gamerpower.com/dungeon",
      "open_giveaway": "https://www.gamerpower.com/open/dungeon-alt"
    })
  }

  #[test]
  fn normalises_full_entry() {
    let item = item_from_value(sample()).unwrap();
    assert_eq!(item.id, ItemId::from(2934));
    assert_eq!(item.kind, "Game");
    assert_eq!(item.claim_url, "https://www.gamerpower.com/open/dungeon");
    assert_eq!(item.image_url, "https://www.gamerpower.com/offers/1b/img.jpg");
    assert_eq!(item.users, Some(1530));
    assert_eq!(item.published_at, parse_date("2026-03-04 10:20:30"));
    assert!(item.published_at.is_some());
    assert_eq!(item.ends_at, None);
  }

  #[test]
  fn accepts_string_ids_and_falls_back_on_urls() {
    let item = item_from_value(json!({
      "id": "77",
      "title": "Loot",
      "open_giveaway_url": "",
      "gamerpower_url": "https://www.gamerpower.com/loot",
      "thumbnail": "https://www.gamerpower.com/thumb.jpg",
      "users": "12"
    }))
    .unwrap();
    assert_eq!(item.id.as_str(), "77");
    assert_eq!(item.claim_url, "https://www.gamerpower.com/loot");
    assert_eq!(item.image_url, "https://www.gamerpower.com/thumb.jpg");
    assert_eq!(item.users, Some(12));
  }

  #[test]
  fn entries_without_id_are_rejected() {
    assert!(item_from_value(json!({"title": "no id"})).is_none());
    assert!(item_from_value(json!({"id": "  ", "title": "blank id"})).is_none());
    assert!(item_from_value(json!([1, 2])).is_none());
  }

  #[test]
  fn status_object_means_empty_listing() {
    let body = json!({"status": 0, "status_message": "No active giveaways available at the moment"});
    assert_eq!(listing_from_value(body).unwrap(), Vec::new());
  }

  #[test]
  fn listing_drops_malformed_entries() {
    let body = json!([sample(), {"title": "broken"}, "junk"]);
    let items = listing_from_value(body).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, ItemId::from(2934));
  }

  #[test]
  fn listing_rejects_scalars() {
    assert!(listing_from_value(json!("nope")).is_err());
  }

  #[test]
  fn summary_accepts_both_key_styles() {
    let modern = summary_from_value(json!({
      "active_giveaways_number": 97,
      "worth_estimation_usd": "612.41"
    }))
    .unwrap();
    let legacy = summary_from_value(json!({"total": "97", "worth": 612.41})).unwrap();

    assert_eq!(modern, Summary { total: 97, worth_estimate: "612.41".into() });
    assert_eq!(legacy, modern);
  }

  #[test]
  fn summary_without_total_is_none() {
    assert!(summary_from_value(json!({"status": 0})).is_none());
  }
}
