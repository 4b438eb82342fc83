//! Slack adapter

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::application::errors::BotError;
use crate::domain::entities::{BotIdentity, ChannelInfo, Event};
use crate::domain::traits::MessagingService;

/// Slack Web API base URL
const API_BASE: &str = "https://slack.com/api";

/// Wait used when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Minimum gap between channel rediscoveries while nothing is watched
const REDISCOVERY_INTERVAL: Duration = Duration::from_secs(60);

/// Error codes after which the token cannot be used any more
const AUTH_ERRORS: &[&str] = &[
    "not_authed",
    "invalid_auth",
    "account_inactive",
    "token_revoked",
    "token_expired",
];

#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    user_id: String,
    user: String,
}

#[derive(Debug, Deserialize)]
struct ConversationsListResponse {
    #[serde(default)]
    channels: Vec<ChannelInfo>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    as_user: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachments: Option<&'a serde_json::Value>,
}

/// Slack bot adapter polling the Web API.
///
/// Every member channel found by `list_channels` gets a timestamp cursor;
/// `read_events` fetches history newer than each cursor. Cursors survive
/// reconnects, and an empty cursor map triggers channel rediscovery.
pub struct SlackAdapter {
    token: String,
    api_base: String,
    client: Client,
    bot_id: Option<String>,
    cursors: Mutex<HashMap<String, String>>,
    last_discovery: Mutex<Option<Instant>>,
}

impl SlackAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: API_BASE.to_string(),
            client: Client::new(),
            bot_id: None,
            cursors: Mutex::new(HashMap::new()),
            last_discovery: Mutex::new(None),
        }
    }

    /// Point at a different API host (tests, proxies)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a fixed bot user id instead of the one `auth.test` reports
    pub fn with_bot_id(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_id = Some(bot_id.into());
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, request: RequestBuilder) -> Result<T, BotError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok());
        check_status(method, response.status(), retry_after)?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        check_ok(method, body)
    }

    fn cursors(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.cursors.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether an empty cursor map should trigger another `conversations.list`
    fn rediscovery_due(&self) -> bool {
        let mut last = self.last_discovery.lock().unwrap_or_else(|e| e.into_inner());
        match *last {
            Some(at) if at.elapsed() < REDISCOVERY_INTERVAL => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }

    /// Watch the member channels, keeping cursors of channels already watched
    /// and dropping channels the bot has left
    fn watch(&self, channels: &[ChannelInfo], since: &str) -> usize {
        let members: HashSet<&str> = channels
            .iter()
            .filter(|c| c.is_member)
            .map(|c| c.id.as_str())
            .collect();

        let mut cursors = self.cursors();
        cursors.retain(|id, _| members.contains(id.as_str()));
        for id in members {
            cursors.entry(id.to_string()).or_insert_with(|| since.to_string());
        }
        cursors.len()
    }
}

/// Map the HTTP status of a Web API call.
///
/// 429 is a rate limit the caller waits out; other failures mean the API
/// refused the call. Neither says the connection is gone.
fn check_status(method: &str, status: StatusCode, retry_after: Option<&str>) -> Result<(), BotError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let wait = retry_after
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RETRY_AFTER);
        return Err(BotError::RateLimited(wait));
    }
    if !status.is_success() {
        return Err(BotError::Api(format!("{} returned HTTP {}", method, status)));
    }
    Ok(())
}

/// Unwrap Slack's `{ "ok": bool, "error": ... }` envelope
fn check_ok<T: DeserializeOwned>(method: &str, body: serde_json::Value) -> Result<T, BotError> {
    if !body.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
        let code = body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown_error");
        return Err(api_error(method, code));
    }
    serde_json::from_value(body).map_err(|e| BotError::Parse(format!("{}: {}", method, e)))
}

fn api_error(method: &str, code: &str) -> BotError {
    if AUTH_ERRORS.contains(&code) {
        BotError::Auth(format!("{} failed: {}", method, code))
    } else if code == "ratelimited" {
        BotError::RateLimited(DEFAULT_RETRY_AFTER)
    } else {
        BotError::Api(format!("{} failed: {}", method, code))
    }
}

/// Current time as a Slack timestamp
fn now_ts() -> String {
    let now = chrono::Utc::now();
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}

/// Orderable form of a Slack timestamp (`seconds.micros`)
fn ts_key(ts: &str) -> (u64, u64) {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, "0"));
    (secs.parse().unwrap_or(0), frac.parse().unwrap_or(0))
}

/// Turn a `conversations.history` page (newest first) into chronological
/// events, returning the newest timestamp seen.
fn events_from_history(channel: &str, messages: Vec<serde_json::Value>) -> (Vec<Event>, Option<String>) {
    let mut newest: Option<String> = None;
    let mut events = Vec::with_capacity(messages.len());

    for raw in messages.into_iter().rev() {
        let mut event: Event = match serde_json::from_value(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(channel, "Skipping malformed message: {}", e);
                continue;
            }
        };
        event.channel.get_or_insert_with(|| channel.to_string());

        if let Some(ts) = event.extra.get("ts").and_then(|v| v.as_str()) {
            if newest.as_deref().map_or(true, |n| ts_key(ts) > ts_key(n)) {
                newest = Some(ts.to_string());
            }
        }
        events.push(event);
    }

    (events, newest)
}

#[async_trait]
impl MessagingService for SlackAdapter {
    async fn connect(&self) -> Result<BotIdentity, BotError> {
        let request = self.client.post(self.api_url("auth.test"));
        let auth: AuthTestResponse = self.call("auth.test", request).await?;

        Ok(BotIdentity {
            id: self.bot_id.clone().unwrap_or(auth.user_id),
            name: auth.user,
        })
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, BotError> {
        let mut channels = Vec::new();
        let mut cursor = String::new();

        loop {
            let request = {
                let mut query = vec![
                    ("types", "public_channel,private_channel"),
                    ("exclude_archived", "true"),
                    ("limit", "200"),
                ];
                if !cursor.is_empty() {
                    query.push(("cursor", cursor.as_str()));
                }
                self.client.get(self.api_url("conversations.list")).query(&query)
            };
            let page: ConversationsListResponse = self.call("conversations.list", request).await?;

            channels.extend(page.channels);
            cursor = page
                .response_metadata
                .map(|m| m.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                break;
            }
        }

        let watched = self.watch(&channels, &now_ts());
        tracing::debug!("Polling {} member channels", watched);

        Ok(channels)
    }

    async fn read_events(&self) -> Result<Vec<Event>, BotError> {
        let idle = self.cursors().is_empty();
        if idle && self.rediscovery_due() {
            tracing::info!("No channels watched, refreshing channel list");
            self.list_channels().await?;
        }

        let watched: Vec<(String, String)> = self
            .cursors()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut events = Vec::new();
        for (channel, oldest) in watched {
            let request = self.client.get(self.api_url("conversations.history")).query(&[
                ("channel", channel.as_str()),
                ("oldest", oldest.as_str()),
                ("inclusive", "false"),
                ("limit", "100"),
            ]);

            let page: HistoryResponse = match self.call("conversations.history", request).await {
                Ok(page) => page,
                Err(e) if e.is_disconnect() => return Err(e),
                Err(e @ BotError::RateLimited(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(channel = %channel, "Unable to read history: {}", e);
                    continue;
                }
            };

            let (batch, newest) = events_from_history(&channel, page.messages);
            if let Some(newest) = newest {
                self.cursors().insert(channel, newest);
            }
            events.extend(batch);
        }

        Ok(events)
    }

    async fn send_message(
        &self,
        channel: &str,
        text: &str,
        attachments: Option<&serde_json::Value>,
    ) -> Result<(), BotError> {
        let body = PostMessageRequest {
            channel,
            text,
            as_user: true,
            attachments,
        };
        let request = self.client.post(self.api_url("chat.postMessage")).json(&body);
        let _: serde_json::Value = self.call("chat.postMessage", request).await?;
        Ok(())
    }

    fn platform(&self) -> &str {
        "slack"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ts_ordering() {
        assert!(ts_key("1700000000.000200") > ts_key("1700000000.000100"));
        assert!(ts_key("1700000001.000000") > ts_key("1700000000.999999"));
        assert_eq!(ts_key("garbage"), (0, 0));
    }

    #[test]
    fn test_history_is_returned_oldest_first() {
        let messages = vec![
            json!({ "type": "message", "user": "U2", "text": "second", "ts": "1700000000.000200" }),
            json!({ "type": "message", "user": "U1", "text": "first", "ts": "1700000000.000100" }),
        ];
        let (events, newest) = events_from_history("C1", messages);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].text.as_deref(), Some("first"));
        assert_eq!(events[1].channel.as_deref(), Some("C1"));
        assert_eq!(newest.as_deref(), Some("1700000000.000200"));
    }

    #[test]
    fn test_check_ok_maps_auth_errors_to_disconnect() {
        let err = check_ok::<serde_json::Value>("auth.test", json!({ "ok": false, "error": "invalid_auth" }))
            .unwrap_err();
        assert!(err.is_disconnect());

        let err = check_ok::<serde_json::Value>("chat.postMessage", json!({ "ok": false, "error": "channel_not_found" }))
            .unwrap_err();
        assert!(!err.is_disconnect());
    }

    #[test]
    fn test_check_ok_decodes_payload() {
        let auth: AuthTestResponse =
            check_ok("auth.test", json!({ "ok": true, "user_id": "UBOT", "user": "doddle" })).unwrap();
        assert_eq!(auth.user_id, "UBOT");
    }

    #[test]
    fn test_check_status() {
        assert!(check_status("conversations.history", StatusCode::OK, None).is_ok());

        let err = check_status("conversations.history", StatusCode::TOO_MANY_REQUESTS, Some("12"))
            .unwrap_err();
        assert!(matches!(err, BotError::RateLimited(wait) if wait == Duration::from_secs(12)));
        assert!(!err.is_disconnect());

        let err = check_status("conversations.history", StatusCode::TOO_MANY_REQUESTS, Some("soon"))
            .unwrap_err();
        assert!(matches!(err, BotError::RateLimited(wait) if wait == DEFAULT_RETRY_AFTER));

        let err = check_status("chat.postMessage", StatusCode::BAD_GATEWAY, None).unwrap_err();
        assert!(matches!(err, BotError::Api(_)));
        assert!(!err.is_disconnect());
    }

    #[test]
    fn test_ratelimited_body_is_not_a_disconnect() {
        let err = check_ok::<serde_json::Value>("conversations.list", json!({ "ok": false, "error": "ratelimited" }))
            .unwrap_err();
        assert!(matches!(err, BotError::RateLimited(_)));
    }

    #[test]
    fn test_watch_keeps_cursors_and_drops_left_channels() {
        let adapter = SlackAdapter::new("xoxb-test");
        let mut left = ChannelInfo::new("C3", "random");
        left.is_member = false;

        adapter.watch(&[ChannelInfo::new("C1", "general"), ChannelInfo::new("C2", "ops")], "100.000000");
        adapter.cursors().insert("C1".to_string(), "150.000000".to_string());

        let watched = adapter.watch(&[ChannelInfo::new("C1", "general"), left], "200.000000");
        assert_eq!(watched, 1);
        assert_eq!(adapter.cursors().get("C1").map(String::as_str), Some("150.000000"));
        assert!(!adapter.cursors().contains_key("C2"));
    }

    #[tokio::test]
    async fn test_read_without_watched_channels_rediscovers() {
        let adapter = SlackAdapter::new("xoxb-test").with_api_base("http://127.0.0.1:9");

        // Nothing watched: the adapter goes back to conversations.list, which
        // cannot be reached here.
        let err = adapter.read_events().await.unwrap_err();
        assert!(err.is_disconnect());

        // A second empty read within the rediscovery interval does not retry.
        assert!(adapter.read_events().await.unwrap().is_empty());
    }

    #[test]
    fn test_post_message_body() {
        let attachments = json!([{ "text": "details" }]);
        let body = PostMessageRequest {
            channel: "C1",
            text: "hi",
            as_user: true,
            attachments: Some(&attachments),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["channel"], "C1");
        assert_eq!(value["attachments"][0]["text"], "details");
    }
}
