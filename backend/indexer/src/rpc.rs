//! Soroban RPC client: polls `getEvents` and decodes Linguo events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.
//!
//! ## Formats
//!
//! Events are requested with `xdrFormat: "json"`. Nodes that ignore the flag
//! return base64 XDR topics instead; the leading symbol and the numeric ID
//! are decoded from those directly.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, LinguoEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// ScVal discriminants used in event topics.
const SCV_U64: u32 = 5;
const SCV_BYTES: u32 = 13;
const SCV_SYMBOL: u32 = 15;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawEvent {
    /// Topic list, base64 XDR or a JSON rendering per entry
    #[serde(default)]
    pub topic: Vec<String>,
    #[serde(rename = "topicJson", default)]
    pub topic_json: Option<Vec<Value>>,
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "valueJson", default)]
    pub value_json: Option<Value>,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive).
/// * `cursor`: optional opaque pagination cursor from a previous response.
/// * `limit`: maximum number of events to return.
///
/// Returns `(events, next_cursor, latest_ledger)`.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<(Vec<RawEvent>, Option<String>, Option<u64>)> {
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let params = build_params(contract_id, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        match response {
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                continue;
            }
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    warn!("Rate-limited by RPC (will retry in {backoff}s)");
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                let body: RpcResponse = resp.json().await?;

                if let Some(err) = body.error {
                    // Invalid request / unknown method will never succeed on retry.
                    if err.code == -32600 || err.code == -32601 {
                        return Err(IndexerError::EventParse(format!(
                            "RPC hard error {}: {}",
                            err.code, err.message
                        )));
                    }
                    warn!(
                        "RPC soft error (will retry in {backoff}s): {} {}",
                        err.code, err.message
                    );
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                let result = body.result.ok_or_else(|| {
                    IndexerError::EventParse("Empty result from getEvents".to_string())
                })?;

                debug!(
                    "Fetched {} events (latest_ledger={:?})",
                    result.events.len(),
                    result.latest_ledger
                );

                return Ok((result.events, result.cursor, result.latest_ledger));
            }
        }
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        },
        "xdrFormat": "json"
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`LinguoEvent`] structs.
///
/// Events from failed contract calls are dropped.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<LinguoEvent> {
    raw.iter()
        .enumerate()
        .filter(|(_, e)| e.in_successful_contract_call != Some(false))
        .filter_map(|(position, e)| decode_single(e, contract_id, position))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str, position: usize) -> Option<LinguoEvent> {
    let topics = topic_strings(raw);
    let kind = EventKind::from_topic(topics.first()?);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let data = raw
        .value_json
        .as_ref()
        .map(scval_to_plain)
        .unwrap_or_else(|| scval_to_plain(&raw.value));

    let second_topic = topics.get(1).cloned();
    let (task_id, dispute_id) = if kind.keyed_by_dispute() {
        (extract_field(&data, &["task_id"]), second_topic)
    } else {
        (second_topic, None)
    };

    let (actor, amount) = decode_data(&data, &kind);

    Some(LinguoEvent {
        event_type: kind.as_str().to_string(),
        task_id,
        dispute_id,
        actor,
        amount,
        payload: data.to_string(),
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
        event_index: raw
            .id
            .as_deref()
            .and_then(event_index_from_id)
            .unwrap_or(position as i64),
    })
}

/// Render every topic as a plain string, whatever shape the node sent.
fn topic_strings(raw: &RawEvent) -> Vec<String> {
    match &raw.topic_json {
        Some(topics) => topics.iter().map(|t| plain_string(&scval_to_plain(t))).collect(),
        None => raw.topic.iter().map(|t| decode_topic(t)).collect(),
    }
}

/// Pick the actor and amount out of the decoded event data.
fn decode_data(value: &Value, kind: &EventKind) -> (Option<String>, Option<String>) {
    match kind {
        EventKind::TaskCreated => (
            extract_field(value, &["requester"]),
            extract_field(value, &["max_price"]),
        ),
        EventKind::TaskAssigned => (
            extract_field(value, &["translator"]),
            extract_field(value, &["price"]),
        ),
        EventKind::TranslationSubmitted => (extract_field(value, &["translator"]), None),
        EventKind::TranslationChallenged => (extract_field(value, &["challenger"]), None),
        EventKind::EvidenceSubmitted => (extract_field(value, &["party"]), None),
        EventKind::AppealContribution => (
            extract_field(value, &["contributor"]),
            extract_field(value, &["amount"]),
        ),
        EventKind::FeesWithdrawn => (
            extract_field(value, &["beneficiary"]),
            extract_field(value, &["amount"]),
        ),
        EventKind::GovernorChanged => (extract_field(value, &["governor"]), None),
        EventKind::MetaEvidence
        | EventKind::DisputeCreated
        | EventKind::AppealFeePaid
        | EventKind::RulingRecorded
        | EventKind::TaskResolved
        | EventKind::ParamsChanged
        | EventKind::TaskUpdated
        | EventKind::Unknown => (None, None),
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(v) = value.get(key) {
            let s = match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            };
            if s.is_some() {
                return s;
            }
        }
    }
    None
}

fn plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten the tagged JSON form of an `ScVal` (`{"symbol":"created"}`,
/// `{"map":[{"key":…,"val":…}]}`, …) into plain JSON. Integers become
/// decimal strings so 128-bit amounts survive.
fn scval_to_plain(value: &Value) -> Value {
    let Value::Object(obj) = value else {
        return value.clone();
    };
    if obj.len() != 1 {
        return value.clone();
    }
    let Some((tag, inner)) = obj.iter().next() else {
        return value.clone();
    };

    match tag.as_str() {
        "map" => {
            let mut out = Map::new();
            for entry in inner.as_array().into_iter().flatten() {
                let (Some(key), Some(val)) = (entry.get("key"), entry.get("val")) else {
                    continue;
                };
                out.insert(plain_string(&scval_to_plain(key)), scval_to_plain(val));
            }
            Value::Object(out)
        }
        "vec" => match inner {
            Value::Array(items) => Value::Array(items.iter().map(scval_to_plain).collect()),
            _ => Value::Null,
        },
        "symbol" | "string" | "address" | "bytes" => match inner {
            Value::String(s) => Value::String(s.clone()),
            other => other.clone(),
        },
        "u32" | "i32" | "u64" | "i64" | "u128" | "i128" | "timepoint" | "duration" => {
            integer_string(inner).map(Value::String).unwrap_or(Value::Null)
        }
        "bool" => inner.clone(),
        "void" => Value::Null,
        _ => value.clone(),
    }
}

/// Integers arrive as JSON numbers, decimal strings or `{"hi":…,"lo":…}` parts.
fn integer_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Object(parts) => {
            let hi = parts.get("hi")?.as_i64()?;
            let lo = parts.get("lo")?.as_u64()?;
            Some(((i128::from(hi) << 64) | i128::from(lo)).to_string())
        }
        _ => None,
    }
}

/// Decode one topic entry sent as a string.
///
/// Accepts `{"type":"symbol","value":"created"}`-style JSON, base64 XDR for
/// symbols, `u64`s and bytes, and otherwise falls back to the raw string.
fn decode_topic(raw: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(inner) = v.get("value") {
            return plain_string(inner);
        }
    }
    if let Ok(bytes) = STANDARD.decode(raw) {
        if let Some(decoded) = decode_xdr_topic(&bytes) {
            return decoded;
        }
    }
    raw.to_string()
}

fn decode_xdr_topic(bytes: &[u8]) -> Option<String> {
    let discriminant = u32::from_be_bytes(bytes.get(0..4)?.try_into().ok()?);
    let body = &bytes[4..];
    match discriminant {
        SCV_SYMBOL => {
            let len = u32::from_be_bytes(body.get(0..4)?.try_into().ok()?) as usize;
            let symbol = body.get(4..4 + len)?;
            std::str::from_utf8(symbol).ok().map(String::from)
        }
        SCV_U64 => {
            let n = u64::from_be_bytes(body.get(0..8)?.try_into().ok()?);
            Some(n.to_string())
        }
        SCV_BYTES => {
            let len = u32::from_be_bytes(body.get(0..4)?.try_into().ok()?) as usize;
            body.get(4..4 + len).map(hex::encode)
        }
        _ => None,
    }
}

/// Event IDs look like `0000004294971392-0000000001`; the suffix is the
/// event's position inside its operation.
fn event_index_from_id(id: &str) -> Option<i64> {
    id.rsplit_once('-')?.1.parse().ok()
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    use chrono::DateTime;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
