//! The fixed message payload posted for a giveaway.

use chrono::NaiveDateTime;
use freebie_core::item::Item;
use serde_json::{Value, json};

const BLURPLE: u32 = 0x5865F2;
const DESCRIPTION_LIMIT: usize = 1000;
const INSTRUCTIONS_LIMIT: usize = 512;

fn truncate(s: &str, max_chars: usize) -> &str {
  match s.char_indices().nth(max_chars) {
    Some((idx, _)) => &s[..idx],
    None => s,
  }
}

fn or_default<'a>(s: &'a str, fallback: &'a str) -> &'a str {
  if s.trim().is_empty() { fallback } else { s }
}

/// Discord relative timestamp markup, e.g. `<t:1767225600:R>`.
fn relative_time(at: Option<NaiveDateTime>) -> String {
  match at {
    Some(at) => format!("<t:{}:R>", at.and_utc().timestamp()),
    None => "Unknown".to_owned(),
  }
}

/// Link target for the claim button. GamerPower landing pages are rewritten
/// to their `/open/` redirect so the button goes straight to the offer.
fn claim_link(url: &str) -> String {
  const SITE: &str = "https://www.gamerpower.com/";
  match url.strip_prefix(SITE) {
    Some(rest) if !rest.starts_with("open/") => format!("{SITE}open/{rest}"),
    _ => url.to_owned(),
  }
}

/// Build the `POST /channels/{id}/messages` body for `item`.
pub fn giveaway_message(item: &Item) -> Value {
  let mut embed = json!({
    "title": truncate(&item.title, 256),
    "description": truncate(&item.description, DESCRIPTION_LIMIT),
    "color": BLURPLE,
    "fields": [
      { "name": "Platforms", "value": or_default(&item.platforms, "Unknown"), "inline": true },
      { "name": "Type",      "value": or_default(&item.kind, "?"),            "inline": true },
      { "name": "Worth",     "value": or_default(&item.worth, "N/A"),         "inline": true },
      { "name": "Ends In",   "value": relative_time(item.ends_at),            "inline": true },
      { "name": "Started",   "value": relative_time(item.published_at),       "inline": true },
      {
        "name": "How To Claim",
        "value": or_default(truncate(&item.instructions, INSTRUCTIONS_LIMIT), "See Link"),
        "inline": false
      }
    ],
    "footer": { "text": format!("ID: {}", item.id) }
  });

  if !item.claim_url.is_empty() {
    embed["url"] = json!(item.claim_url);
  }
  if !item.image_url.is_empty() {
    embed["image"] = json!({ "url": item.image_url });
  }

  let mut message = json!({ "embeds": [embed] });
  if !item.claim_url.is_empty() {
    message["components"] = json!([{
      "type": 1,
      "components": [{
        "type": 2,
        "style": 5,
        "label": "Claim Giveaway",
        "url": claim_link(&item.claim_url)
      }]
    }]);
  }
  message
}
