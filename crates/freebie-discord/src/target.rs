//! [`DiscordTarget`]: posts giveaway notifications through the Discord REST API.

use std::time::Duration;

use freebie_core::{
  delivery::{DeliveryAck, DeliveryTarget, Resolution},
  destination::ChannelId,
  item::Item,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::{Error, Result, message::giveaway_message};

/// Channel types that accept regular messages: guild text, announcement,
/// and the three thread kinds.
const SENDABLE_CHANNEL_TYPES: &[u8] = &[0, 5, 10, 11, 12];

/// Connection settings for the Discord REST API.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
  /// e.g. `https://discord.com/api/v10`
  pub api_base: String,
  pub token:    String,
  pub timeout:  Duration,
}

/// A channel that [`DiscordTarget::resolve`] found to be sendable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
  pub channel_id: ChannelId,
}

/// The account the bot token belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
  pub id:       String,
  pub username: String,
}

#[derive(Deserialize)]
struct ChannelInfo {
  #[serde(rename = "type")]
  kind: u8,
}

#[derive(Deserialize)]
struct CreatedMessage {
  id: String,
}

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct DiscordTarget {
  client: Client,
  config: DiscordConfig,
}

impl DiscordTarget {
  pub fn new(config: DiscordConfig) -> Result<Self> {
    if config.token.trim().is_empty() {
      return Err(Error::MissingToken);
    }
    let client = Client::builder()
      .timeout(config.timeout)
      .user_agent(concat!("DiscordBot (freebie, ", env!("CARGO_PKG_VERSION"), ")"))
      .build()
      .map_err(Error::Build)?;
    Ok(Self { client, config })
  }

  /// Build a target and wait until Discord accepts its token.
  pub async fn connect(config: DiscordConfig) -> Result<Self> {
    let target = Self::new(config)?;
    let me = target.ready().await?;
    tracing::info!(bot_id = %me.id, bot = %me.username, "discord target ready");
    Ok(target)
  }

  /// `GET /users/@me`: verifies the token.
  pub async fn ready(&self) -> Result<BotUser> {
    let what = "GET /users/@me";
    let resp = self.execute(what, self.client.get(self.url("/users/@me"))).await?;

    match resp.status() {
      s if s.is_success() => {
        resp.json().await.map_err(|source| Error::Request { what, source })
      }
      s @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => Err(Error::Unauthorized(s)),
      _ => Err(status_error(what, resp).await),
    }
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
  }

  async fn execute(&self, what: &'static str, req: RequestBuilder) -> Result<Response> {
    req
      .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.config.token))
      .send()
      .await
      .map_err(|source| Error::Request { what, source })
  }
}

async fn status_error(what: &'static str, resp: Response) -> Error {
  let status = resp.status();
  let mut body = resp.text().await.unwrap_or_default();
  body.truncate(body.char_indices().nth(200).map_or(body.len(), |(i, _)| i));
  Error::Status { what, status, body }
}

// ─── DeliveryTarget impl ─────────────────────────────────────────────────────

impl DeliveryTarget for DiscordTarget {
  type Handle = ChannelHandle;
  type Error = Error;

  /// `GET /channels/{id}`
  async fn resolve(&self, channel: ChannelId) -> Result<Resolution<ChannelHandle>> {
    let what = "GET /channels/{id}";
    let resp = self
      .execute(what, self.client.get(self.url(&format!("/channels/{channel}"))))
      .await?;

    match resp.status() {
      StatusCode::NOT_FOUND => return Ok(Resolution::NotFound),
      StatusCode::FORBIDDEN => return Ok(Resolution::Unsendable),
      s if !s.is_success() => return Err(status_error(what, resp).await),
      _ => {}
    }

    let info: ChannelInfo = resp
      .json()
      .await
      .map_err(|source| Error::Request { what, source })?;

    if SENDABLE_CHANNEL_TYPES.contains(&info.kind) {
      Ok(Resolution::Sendable(ChannelHandle { channel_id: channel }))
    } else {
      tracing::debug!(%channel, kind = info.kind, "channel cannot carry messages");
      Ok(Resolution::Unsendable)
    }
  }

  /// `POST /channels/{id}/messages`
  async fn send(&self, handle: &ChannelHandle, item: &Item) -> Result<DeliveryAck> {
    let what = "POST /channels/{id}/messages";
    let body = giveaway_message(item);
    let resp = self
      .execute(
        what,
        self
          .client
          .post(self.url(&format!("/channels/{}/messages", handle.channel_id)))
          .json(&body),
      )
      .await?;

    if !resp.status().is_success() {
      return Err(status_error(what, resp).await);
    }

    let created: CreatedMessage = resp
      .json()
      .await
      .map_err(|source| Error::Request { what, source })?;
    Ok(DeliveryAck { message_ref: created.id })
  }
}

#[cfg(test)]
mod tests {
  use freebie_core::item::ItemId;
  use serde_json::json;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
  };

  use super::*;

  fn config(uri: &str) -> DiscordConfig {
    DiscordConfig {
      api_base: uri.to_owned(),
      token:    "test-token".to_owned(),
      timeout:  Duration::from_secs(5),
    }
  }

  async fn mount_channel(server: &MockServer, id: &str, status: u16, kind: u8) {
    Mock::given(method("GET"))
      .and(path(format!("/channels/{id}")))
      .respond_with(ResponseTemplate::new(status).set_body_json(json!({"id": id, "type": kind})))
      .mount(server)
      .await;
  }

  #[test]
  fn empty_token_is_rejected() {
    let mut cfg = config("http://localhost");
    cfg.token = "  ".into();
    assert!(matches!(DiscordTarget::new(cfg), Err(Error::MissingToken)));
  }

  #[tokio::test]
  async fn connect_verifies_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/users/@me"))
      .and(header("authorization", "Bot test-token"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1", "username": "freebie"})))
      .expect(1)
      .mount(&server)
      .await;

    assert!(DiscordTarget::connect(config(&server.uri())).await.is_ok());
  }

  #[tokio::test]
  async fn connect_with_bad_token_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/users/@me"))
      .respond_with(ResponseTemplate::new(401))
      .mount(&server)
      .await;

    let err = DiscordTarget::connect(config(&server.uri())).await.err().unwrap();
    assert!(matches!(err, Error::Unauthorized(StatusCode::UNAUTHORIZED)));
  }

  #[tokio::test]
  async fn resolve_classifies_channels() {
    let server = MockServer::start().await;
    mount_channel(&server, "10", 200, 0).await;
    mount_channel(&server, "11", 200, 11).await;
    mount_channel(&server, "12", 200, 2).await;
    mount_channel(&server, "13", 404, 0).await;
    mount_channel(&server, "14", 403, 0).await;

    let target = DiscordTarget::new(config(&server.uri())).unwrap();

    assert_eq!(
      target.resolve(ChannelId(10)).await.unwrap(),
      Resolution::Sendable(ChannelHandle { channel_id: ChannelId(10) })
    );
    assert!(matches!(target.resolve(ChannelId(11)).await.unwrap(), Resolution::Sendable(_)));
    assert_eq!(target.resolve(ChannelId(12)).await.unwrap(), Resolution::Unsendable);
    assert_eq!(target.resolve(ChannelId(13)).await.unwrap(), Resolution::NotFound);
    assert_eq!(target.resolve(ChannelId(14)).await.unwrap(), Resolution::Unsendable);
  }

  #[tokio::test]
  async fn resolve_server_error_is_an_error() {
    let server = MockServer::start().await;
    mount_channel(&server, "10", 500, 0).await;

    let target = DiscordTarget::new(config(&server.uri())).unwrap();
    let err = target.resolve(ChannelId(10)).await.unwrap_err();
    assert!(matches!(err, Error::Status { status: StatusCode::INTERNAL_SERVER_ERROR, .. }));
  }

  #[tokio::test]
  async fn send_posts_embed_and_returns_message_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/channels/10/messages"))
      .and(header("authorization", "Bot test-token"))
      .and(body_partial_json(json!({"embeds": [{"title": "Free Game", "footer": {"text": "ID: 5"}}]})))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "555"})))
      .expect(1)
      .mount(&server)
      .await;

    let target = DiscordTarget::new(config(&server.uri())).unwrap();
    let handle = ChannelHandle { channel_id: ChannelId(10) };
    let ack = target
      .send(&handle, &Item::stub(ItemId::from(5), "Free Game"))
      .await
      .unwrap();

    assert_eq!(ack.message_ref, "555");
  }

  #[tokio::test]
  async fn send_rejection_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/channels/10/messages"))
      .respond_with(ResponseTemplate::new(403).set_body_string("Missing Permissions"))
      .mount(&server)
      .await;

    let target = DiscordTarget::new(config(&server.uri())).unwrap();
    let handle = ChannelHandle { channel_id: ChannelId(10) };
    let err = target
      .send(&handle, &Item::stub(ItemId::from(5), "x"))
      .await
      .unwrap_err();

    assert!(
      matches!(err, Error::Status { status: StatusCode::FORBIDDEN, ref body, .. } if body == "Missing Permissions")
    );
  }
}
