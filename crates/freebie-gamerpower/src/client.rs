//! Async HTTP client for the GamerPower JSON API.

use std::time::Duration;

use freebie_core::{
  filter::{ItemType, ListingFilter, Platform},
  item::{Item, ItemId, Summary},
  source::{ListingSource, Lookup},
};
use reqwest::{Client, StatusCode};

use crate::{Error, Result, wire};

/// Connection settings for the GamerPower API.
#[derive(Debug, Clone)]
pub struct SourceConfig {
  pub base_url: String,
  /// Upper bound on any single request, connect included.
  pub timeout:  Duration,
}

impl Default for SourceConfig {
  fn default() -> Self {
    Self {
      base_url: "https://www.gamerpower.com/api".to_owned(),
      timeout:  Duration::from_secs(15),
    }
  }
}

/// Async HTTP client for the GamerPower listing API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct GamerPowerClient {
  client: Client,
  config: SourceConfig,
}

impl GamerPowerClient {
  pub fn new(config: SourceConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .user_agent(concat!("freebie/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(Error::Build)?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// `GET <path>?<query>`; `Ok(None)` on 404.
  async fn get_json(
    &self,
    path: &'static str,
    query: &[(&str, String)],
  ) -> Result<Option<serde_json::Value>> {
    let resp = self
      .client
      .get(self.url(path))
      .query(query)
      .send()
      .await
      .map_err(|source| Error::Request { path, source })?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !status.is_success() {
      return Err(Error::Status { path, status });
    }

    resp
      .json()
      .await
      .map(Some)
      .map_err(|e| Error::Decode { path, message: e.to_string() })
  }
}

fn join_slugs<T: Copy>(values: &[T], slug: fn(T) -> &'static str) -> Option<String> {
  if values.is_empty() {
    return None;
  }
  Some(values.iter().map(|v| slug(*v)).collect::<Vec<_>>().join("."))
}

// ─── ListingSource impl ──────────────────────────────────────────────────────

impl ListingSource for GamerPowerClient {
  type Error = Error;

  /// `GET /giveaways[?platform=..][&type=..][&sort-by=..]`, or
  /// `GET /filter?platform=a.b&type=c.d` when several platforms or types are
  /// requested. The filter endpoint has no sort parameter.
  async fn list(&self, filter: &ListingFilter) -> Result<Vec<Item>> {
    let mut query: Vec<(&str, String)> = Vec::new();

    let path = if filter.is_compound() {
      if let Some(p) = join_slugs(&filter.platforms, Platform::as_str) {
        query.push(("platform", p));
      }
      if let Some(t) = join_slugs(&filter.types, ItemType::as_str) {
        query.push(("type", t));
      }
      if filter.sort.is_some() {
        tracing::debug!("sort order ignored for multi-value filter");
      }
      "/filter"
    } else {
      if let Some(p) = filter.platforms.first() {
        query.push(("platform", p.as_str().to_owned()));
      }
      if let Some(t) = filter.types.first() {
        query.push(("type", t.as_str().to_owned()));
      }
      if let Some(s) = filter.sort {
        query.push(("sort-by", s.as_str().to_owned()));
      }
      "/giveaways"
    };

    // A 404 here means "no giveaways match", not a broken endpoint.
    let Some(body) = self.get_json(path, &query).await? else {
      return Ok(Vec::new());
    };

    let items = wire::listing_from_value(body)
      .map_err(|message| Error::Decode { path, message })?;
    tracing::debug!(path, count = items.len(), "fetched giveaways");
    Ok(items)
  }

  /// `GET /giveaway?id=<id>`
  async fn fetch_one(&self, id: &ItemId) -> Result<Lookup<Item>> {
    let body = self
      .get_json("/giveaway", &[("id", id.as_str().to_owned())])
      .await?;

    Ok(match body.and_then(wire::item_from_value) {
      Some(item) => Lookup::Found(item),
      None => Lookup::NotFound,
    })
  }

  /// `GET /worth[?platform=..][&type=..]`
  async fn summary(
    &self,
    platform: Option<Platform>,
    kind: Option<ItemType>,
  ) -> Result<Lookup<Summary>> {
    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(p) = platform {
      query.push(("platform", p.as_str().to_owned()));
    }
    if let Some(t) = kind {
      query.push(("type", t.as_str().to_owned()));
    }

    let body = self.get_json("/worth", &query).await?;

    Ok(match body.and_then(wire::summary_from_value) {
      Some(summary) => Lookup::Found(summary),
      None => Lookup::NotFound,
    })
  }
}

#[cfg(test)]
mod tests {
  use freebie_core::filter::SortBy;
  use serde_json::json;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param, query_param_is_missing},
  };

  use super::*;

  fn test_client(uri: &str) -> GamerPowerClient {
    GamerPowerClient::new(SourceConfig {
      base_url: uri.to_owned(),
      timeout:  Duration::from_secs(5),
    })
    .unwrap()
  }

  fn giveaway(id: u64) -> serde_json::Value {
    json!({
      "id": id,
      "title": format!("Giveaway {id}"),
      "worth": "N/A",
      "open_giveaway_url": format!("https://www.gamerpower.com/open/{id}"),
      "type": "Game",
      "platforms": "PC",
      "published_date": "2026-01-01 00:00:00",
      "end_date": "N/A"
    })
  }

  #[tokio::test]
  async fn list_newest_first_preserves_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/giveaways"))
      .and(query_param("sort-by", "date"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!([giveaway(9), giveaway(7), giveaway(5)])),
      )
      .expect(1)
      .mount(&server)
      .await;

    let items = test_client(&server.uri())
      .list(&ListingFilter::newest_first())
      .await
      .unwrap();

    let ids: Vec<_> = items.iter().map(|i| i.id.as_str().to_owned()).collect();
    assert_eq!(ids, ["9", "7", "5"]);
  }

  #[tokio::test]
  async fn list_single_filters_use_giveaways_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/giveaways"))
      .and(query_param("platform", "steam"))
      .and(query_param("type", "loot"))
      .and(query_param_is_missing("sort-by"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([giveaway(1)])))
      .expect(1)
      .mount(&server)
      .await;

    let filter = ListingFilter {
      platforms: vec![Platform::Steam],
      types:     vec![ItemType::Loot],
      sort:      None,
    };
    let items = test_client(&server.uri()).list(&filter).await.unwrap();
    assert_eq!(items.len(), 1);
  }

  #[tokio::test]
  async fn list_compound_filters_use_filter_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/filter"))
      .and(query_param("platform", "steam.gog"))
      .and(query_param("type", "game"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([giveaway(3)])))
      .expect(1)
      .mount(&server)
      .await;

    let filter = ListingFilter {
      platforms: vec![Platform::Steam, Platform::Gog],
      types:     vec![ItemType::Game],
      sort:      Some(SortBy::Value),
    };
    let items = test_client(&server.uri()).list(&filter).await.unwrap();
    assert_eq!(items[0].id, ItemId::from(3));
  }

  #[tokio::test]
  async fn list_status_object_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/giveaways"))
      .respond_with(
        ResponseTemplate::new(201)
          .set_body_json(json!({"status": 0, "status_message": "No active giveaways"})),
      )
      .mount(&server)
      .await;

    let items = test_client(&server.uri())
      .list(&ListingFilter::default())
      .await
      .unwrap();
    assert!(items.is_empty());
  }

  #[tokio::test]
  async fn list_server_error_bubbles_up() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/giveaways"))
      .respond_with(ResponseTemplate::new(503))
      .mount(&server)
      .await;

    let err = test_client(&server.uri())
      .list(&ListingFilter::default())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE));
    assert!(!err.is_transport());
  }

  #[tokio::test]
  async fn list_unreachable_host_is_transport_error() {
    // Nothing listens on the discard port.
    let err = test_client("http://127.0.0.1:9")
      .list(&ListingFilter::default())
      .await
      .unwrap_err();
    assert!(err.is_transport());
  }

  #[tokio::test]
  async fn fetch_one_found_and_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/giveaway"))
      .and(query_param("id", "42"))
      .respond_with(ResponseTemplate::new(200).set_body_json(giveaway(42)))
      .mount(&server)
      .await;

    Mock::given(method("GET"))
      .and(path("/giveaway"))
      .and(query_param("id", "43"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;

    Mock::given(method("GET"))
      .and(path("/giveaway"))
      .and(query_param("id", "44"))
      .respond_with(
        ResponseTemplate::new(201)
          .set_body_json(json!({"status": 0, "status_message": "Giveaway not found"})),
      )
      .mount(&server)
      .await;

    let client = test_client(&server.uri());

    let found = client.fetch_one(&ItemId::from(42)).await.unwrap();
    assert!(matches!(found, Lookup::Found(ref item) if item.title == "Giveaway 42"));

    assert_eq!(client.fetch_one(&ItemId::from(43)).await.unwrap(), Lookup::NotFound);
    assert_eq!(client.fetch_one(&ItemId::from(44)).await.unwrap(), Lookup::NotFound);
  }

  #[tokio::test]
  async fn summary_passes_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/worth"))
      .and(query_param("platform", "epic-games-store"))
      .and(query_param("type", "game"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "active_giveaways_number": 4,
        "worth_estimation_usd": "59.96"
      })))
      .mount(&server)
      .await;

    let summary = test_client(&server.uri())
      .summary(Some(Platform::EpicGamesStore), Some(ItemType::Game))
      .await
      .unwrap();

    assert_eq!(
      summary,
      Lookup::Found(Summary { total: 4, worth_estimate: "59.96".into() })
    );
  }
}
