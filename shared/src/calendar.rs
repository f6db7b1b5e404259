//! Google Calendar client and event helpers.
//!
//! Events are passed through as raw JSON resources so that whatever the
//! calendar returns reaches the caller unchanged; only the fields the
//! assistant cares about (`summary`, `eventType`, `colorId`, times) are read.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::{CalendarConfig, CredentialSource};
use crate::secrets;
use crate::window::{TimeWindow, DEFAULT_WINDOW_DAYS};
use crate::{Error, Result};

/// Upper bound on events returned by a single listing.
pub const MAX_RESULTS: u32 = 50;

/// Summary phrase that triggers automatic categorization.
pub const ANNUAL_LEAVE_PHRASE: &str = "annual leave";
/// Calendar color applied to annual leave ("Basil" green).
pub const ANNUAL_LEAVE_COLOR_ID: &str = "10";

/// Refresh this long before the provider's stated expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Google "authorized user" credential document.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Last access token written alongside the refresh token
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
}

impl AuthorizedUser {
    fn cached_token(&self) -> Option<AccessToken> {
        let value = self.token.clone()?;
        let expires_at = DateTime::parse_from_rfc3339(self.expiry.as_deref()?)
            .ok()?
            .with_timezone(&Utc);
        Some(AccessToken { value, expires_at })
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Supplies bearer tokens for calendar calls, refreshing on expiry.
pub struct TokenSource {
    credentials: Option<AuthorizedUser>,
    token_url: String,
    cached: RwLock<Option<AccessToken>>,
}

impl TokenSource {
    /// Refresh-capable source backed by an authorized-user credential.
    pub fn refreshing(credentials: AuthorizedUser, token_url: impl Into<String>) -> Self {
        let cached = credentials.cached_token();
        Self {
            credentials: Some(credentials),
            token_url: token_url.into(),
            cached: RwLock::new(cached),
        }
    }

    /// A pre-issued access token that is never refreshed.
    pub fn fixed(access_token: impl Into<String>) -> Self {
        Self {
            credentials: None,
            token_url: String::new(),
            cached: RwLock::new(Some(AccessToken {
                value: access_token.into(),
                expires_at: DateTime::<Utc>::MAX_UTC,
            })),
        }
    }

    /// Current access token, refreshing it first if it is about to expire.
    pub async fn access_token(&self, http_client: &reqwest::Client) -> Result<String> {
        let now = Utc::now();
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
                return Ok(token.value.clone());
            }
        }

        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| Error::Auth("Access token expired and no refresh token is available".to_string()))?;

        let mut cached = self.cached.write().await;
        // Another invocation may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let token = self.refresh(http_client, credentials).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn refresh(&self, http_client: &reqwest::Client, credentials: &AuthorizedUser) -> Result<AccessToken> {
        let params = [
            ("refresh_token", credentials.refresh_token.as_str()),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = http_client.post(&self.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!("Token refresh failed: {}", error_text)));
        }

        let refreshed: RefreshResponse = response.json().await?;
        let lifetime = refreshed.expires_in.unwrap_or(3600);
        info!("Refreshed calendar access token, valid for {}s", lifetime);

        Ok(AccessToken {
            value: refreshed.access_token,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        })
    }
}

/// Load the authorized-user credential named by the configuration.
pub async fn load_credentials(source: &CredentialSource) -> Result<AuthorizedUser> {
    match source {
        CredentialSource::Secret(arn) => {
            let client = secrets::client_from_env().await;
            secrets::get_json_secret(&client, arn).await
        }
        CredentialSource::File(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", path, e)))?;
            serde_json::from_str(&raw)
                .map_err(|e| Error::Config(format!("Invalid credentials in {}: {}", path, e)))
        }
    }
}

/// Client for one calendar.
pub struct CalendarClient {
    http_client: reqwest::Client,
    tokens: TokenSource,
    api_base_url: String,
    calendar_id: String,
}

impl CalendarClient {
    pub fn new(
        http_client: reqwest::Client,
        tokens: TokenSource,
        api_base_url: impl Into<String>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            tokens,
            api_base_url: api_base_url.into(),
            calendar_id: calendar_id.into(),
        }
    }

    /// Build a client from configuration, loading credentials once.
    pub async fn from_config(http_client: reqwest::Client, config: &CalendarConfig) -> Result<Self> {
        let credentials = load_credentials(&config.credentials).await?;
        let tokens = TokenSource::refreshing(credentials, config.token_url.clone());
        Ok(Self::new(
            http_client,
            tokens,
            config.api_base_url.clone(),
            config.calendar_id.clone(),
        ))
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base_url.trim_end_matches('/'),
            urlencoding::encode(&self.calendar_id)
        )
    }

    /// List single (expanded) events in the window, ordered by start time,
    /// without birthday entries.
    pub async fn list_events(&self, window: &TimeWindow) -> Result<Vec<Value>> {
        let access_token = self.tokens.access_token(&self.http_client).await?;
        let url = format!(
            "{}?timeMin={}&timeMax={}&maxResults={}&singleEvents=true&orderBy=startTime",
            self.events_url(),
            urlencoding::encode(&window.time_min()),
            urlencoding::encode(&window.time_max()),
            MAX_RESULTS
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("Calendar API error: {}", error_text)));
        }

        let listing: EventList = response.json().await?;
        let events = without_birthdays(listing.items);
        info!("Listed {} calendar events", events.len());
        Ok(events)
    }

    /// First upcoming event (next 30 days) whose summary contains `term`.
    pub async fn find_event(&self, term: &str, now: DateTime<Utc>) -> Result<Option<Value>> {
        let window = TimeWindow::upcoming(now, DEFAULT_WINDOW_DAYS);
        let events = self.list_events(&window).await?;
        Ok(events.into_iter().find(|event| summary_contains(event, term)))
    }

    /// Insert an event, applying the annual-leave color rule first.
    pub async fn insert_event(&self, mut event: Map<String, Value>) -> Result<Value> {
        if apply_annual_leave_color(&mut event) {
            info!("Categorized annual leave event");
        }

        let access_token = self.tokens.access_token(&self.http_client).await?;
        let response = self
            .http_client
            .post(self.events_url())
            .bearer_auth(&access_token)
            .json(&event)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Calendar insert rejected with {}", status);
            return Err(Error::Upstream(format!("Calendar API error: {}", error_text)));
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<Value>,
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Drop events of type `birthday`.
pub fn without_birthdays(events: Vec<Value>) -> Vec<Value> {
    events
        .into_iter()
        .filter(|event| str_field(event, "eventType") != Some("birthday"))
        .collect()
}

/// Case-insensitive substring match on the event summary.
pub fn summary_contains(event: &Value, term: &str) -> bool {
    str_field(event, "summary")
        .map(|summary| summary.to_lowercase().contains(&term.to_lowercase()))
        .unwrap_or(false)
}

/// Tag annual leave with the green color unless a color is already set.
///
/// Returns whether the event was changed.
pub fn apply_annual_leave_color(event: &mut Map<String, Value>) -> bool {
    let is_leave = event
        .get("summary")
        .and_then(Value::as_str)
        .map(|summary| summary.to_lowercase().contains(ANNUAL_LEAVE_PHRASE))
        .unwrap_or(false);

    if is_leave && !event.contains_key("colorId") {
        event.insert(
            "colorId".to_string(),
            Value::String(ANNUAL_LEAVE_COLOR_ID.to_string()),
        );
        return true;
    }
    false
}

/// Human-readable event summary; `details` adds location, agenda and guests.
pub fn format_event_summary(event: &Value, details: bool) -> String {
    let summary = str_field(event, "summary").unwrap_or("No title");
    let start = event
        .get("start")
        .and_then(|s| str_field(s, "dateTime"))
        .unwrap_or("No start time");
    let end = event
        .get("end")
        .and_then(|e| str_field(e, "dateTime"))
        .unwrap_or("No end time");

    let basic = format!("📅 Event: **{}**\n🕙 From: {}\n🕚 To: {}", summary, start, end);
    if !details {
        return basic;
    }

    let location = str_field(event, "location").unwrap_or("No location provided");
    let description = str_field(event, "description").unwrap_or("No agenda or notes.");
    let guests: Vec<&str> = event
        .get("attendees")
        .and_then(Value::as_array)
        .map(|attendees| attendees.iter().filter_map(|a| str_field(a, "email")).collect())
        .unwrap_or_default();

    let guests_section = if guests.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = guests.iter().map(|g| format!("• {}", g)).collect();
        format!("\n👥 Guests:\n{}", lines.join("\n"))
    };

    format!(
        "{}\n📍 Location: {}\n📝 Agenda:\n{}{}",
        basic, location, description, guests_section
    )
}
