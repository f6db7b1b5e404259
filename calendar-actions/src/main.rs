//! Calendar Lambda - Direct-invoke calendar actions for the assistant.
//!
//! Event shape: `{"action": "get" | "add" | "find", "month"?, "event"?, "term"?}`.
//! - `get` lists events for a month (or the next 30 days)
//! - `add` inserts an event, auto-coloring annual leave
//! - `find` returns the first upcoming event whose summary matches `term`

use chrono::{DateTime, Utc};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::{Map, Value};
use shared::{
    format_event_summary, ApiGatewayResponse, CalendarClient, CalendarConfig, CalendarRequest, FoundEvent,
    TimeWindow,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn text(status: u16, message: &str) -> ApiGatewayResponse {
    ApiGatewayResponse::new(status, message, "text/plain")
}

/// Turn an action error into a response; validation problems are shown to
/// the caller, everything else is logged and hidden.
fn failure(e: shared::Error) -> ApiGatewayResponse {
    match e {
        shared::Error::Validation(message) => {
            warn!("Rejected calendar request: {}", message);
            text(400, &message)
        }
        other => {
            error!("Calendar action failed: {}", other);
            text(500, "Server error")
        }
    }
}

async fn get_events(client: &CalendarClient, month: Option<&str>, now: DateTime<Utc>) -> shared::Result<ApiGatewayResponse> {
    let window = TimeWindow::resolve(month, now)?;
    info!("Listing events {} .. {}", window.time_min(), window.time_max());

    let events = client.list_events(&window).await?;
    ApiGatewayResponse::pretty_json(200, &events)
}

async fn add_event(client: &CalendarClient, event: Option<Map<String, Value>>) -> shared::Result<ApiGatewayResponse> {
    let event = match event {
        Some(event) if !event.is_empty() => event,
        _ => return Ok(text(400, "Missing event payload")),
    };

    let created = client.insert_event(event).await?;
    ApiGatewayResponse::pretty_json(200, &created)
}

async fn find_event(client: &CalendarClient, term: Option<&str>, now: DateTime<Utc>) -> shared::Result<ApiGatewayResponse> {
    let term = match term.filter(|t| !t.is_empty()) {
        Some(term) => term,
        None => return Ok(text(400, "Missing search term")),
    };

    match client.find_event(term, now).await? {
        Some(event) => {
            let formatted = format_event_summary(&event, true);
            ApiGatewayResponse::pretty_json(200, &FoundEvent { raw: event, formatted })
        }
        None => Ok(text(404, "No matching event")),
    }
}

async fn dispatch(client: &CalendarClient, request: CalendarRequest, now: DateTime<Utc>) -> ApiGatewayResponse {
    let action = request.action.as_deref().unwrap_or("");
    info!("Calendar action: {}", action);

    let result = match action {
        "get" => get_events(client, request.month.as_deref(), now).await,
        "add" => add_event(client, request.event).await,
        "find" => find_event(client, request.term.as_deref(), now).await,
        _ => Ok(text(400, "Invalid action")),
    };

    result.unwrap_or_else(failure)
}

async fn handler(client: Arc<CalendarClient>, event: LambdaEvent<Value>) -> Result<ApiGatewayResponse, Error> {
    let (payload, _context) = event.into_parts();

    let request: CalendarRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(e) => {
            warn!("Unreadable calendar event: {}", e);
            return Ok(text(400, "Invalid request"));
        }
    };

    Ok(dispatch(&client, request, Utc::now()).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = CalendarConfig::from_env()?;
    let client = CalendarClient::from_config(reqwest::Client::new(), &config)
        .await
        .map_err(|e| {
            error!("Failed to load calendar credentials: {}", e);
            e
        })?;
    let client = Arc::new(client);

    run(service_fn(move |event| {
        let client = Arc::clone(&client);
        async move { handler(client, event).await }
    }))
    .await
}
