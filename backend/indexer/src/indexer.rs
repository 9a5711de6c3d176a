//! Long-running background task that polls the Soroban RPC, stores decoded
//! Linguo events and keeps the newest published value of every task.
//!
//! The contract stores tasks by hash only, so the `task_upd` stream is the
//! sole source of the task values clients must hand back. Each poll folds the
//! batch's `task_upd` events into one snapshot per task before writing them.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::db;
use crate::events::{EventKind, LinguoEvent, TaskSnapshot};
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Position in the contract's event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cursor {
    ledger: u32,
    /// RPC pagination token; when set, `ledger` is ignored by the node.
    page: Option<String>,
}

impl Cursor {
    async fn load(pool: &SqlitePool, start_ledger: u32) -> Self {
        let ledger = match db::get_last_ledger(pool).await {
            Ok(last) if last > 0 => last as u32,
            Ok(_) => start_ledger,
            Err(e) => {
                warn!("Cursor unreadable, starting from ledger {start_ledger}: {e}");
                start_ledger
            }
        };
        let page = db::get_cursor_string(pool).await.unwrap_or(None);
        Self { ledger, page }
    }
}

/// What one poll changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollSummary {
    pub stored: usize,
    pub tasks_updated: usize,
    pub disputes_opened: usize,
    pub tasks_resolved: usize,
}

/// Run the indexer loop until `shutdown` is cancelled.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!("Indexer starting for contract {}", state.config.contract_id);

    let mut cursor = Cursor::load(&state.pool, state.config.start_ledger).await;
    info!("Resuming from ledger {}", cursor.ledger);

    loop {
        let poll = poll_once(&state.pool, &state.client, &state.config, &cursor);

        tokio::select! {
            _ = shutdown.cancelled() => break,
            result = poll => match result {
                Ok((next, summary)) => {
                    if summary != PollSummary::default() {
                        info!(
                            stored = summary.stored,
                            tasks_updated = summary.tasks_updated,
                            disputes_opened = summary.disputes_opened,
                            tasks_resolved = summary.tasks_resolved,
                            "Indexed Linguo events"
                        );
                    }
                    cursor = next;
                }
                Err(e) => {
                    error!("Indexer poll error: {e}");
                }
            },
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }

    info!("Indexer stopped at ledger {}", cursor.ledger);
}

/// Perform a single poll iteration and return the cursor to resume from.
async fn poll_once(
    pool: &SqlitePool,
    client: &Client,
    config: &Config,
    cursor: &Cursor,
) -> crate::errors::Result<(Cursor, PollSummary)> {
    let (raw_events, next_page, latest_ledger) = rpc::fetch_events(
        client,
        &config.rpc_url,
        &config.contract_id,
        cursor.ledger,
        cursor.page.as_deref(),
        config.events_per_page,
    )
    .await?;

    let mut summary = PollSummary::default();
    if !raw_events.is_empty() {
        let decoded = rpc::decode_events(&raw_events, &config.contract_id);
        summary.stored = db::insert_events(pool, &decoded).await?;

        let snapshots = latest_snapshots(&decoded);
        for snapshot in &snapshots {
            debug!(task_id = %snapshot.task_id, status = %snapshot.status, "Task updated");
        }
        db::upsert_task_states(pool, &snapshots).await?;

        summary.tasks_updated = snapshots.len();
        summary.tasks_resolved = snapshots.iter().filter(|s| s.status == "Resolved").count();
        summary.disputes_opened = decoded
            .iter()
            .filter(|e| e.event_type == EventKind::DisputeCreated.as_str())
            .count();
    }

    let ledger = latest_ledger
        .map(|l| (l as u32).max(cursor.ledger))
        .unwrap_or(cursor.ledger);
    db::save_cursor(pool, ledger as i64, next_page.as_deref()).await?;

    Ok((
        Cursor {
            ledger,
            page: next_page,
        },
        summary,
    ))
}

/// Newest `task_upd` value of every task in `events`, ordered by task ID.
pub fn latest_snapshots(events: &[LinguoEvent]) -> Vec<TaskSnapshot> {
    let mut latest: BTreeMap<String, TaskSnapshot> = BTreeMap::new();
    for event in events {
        if event.event_type != EventKind::TaskUpdated.as_str() {
            continue;
        }
        let Some(task_id) = &event.task_id else {
            continue;
        };
        if let Some(current) = latest.get(task_id) {
            if (current.ledger, current.event_index) > (event.ledger, event.event_index) {
                continue;
            }
        }
        latest.insert(
            task_id.clone(),
            TaskSnapshot {
                task_id: task_id.clone(),
                status: task_status(&event.payload).unwrap_or_else(|| "Unknown".to_string()),
                payload: event.payload.clone(),
                ledger: event.ledger,
                event_index: event.event_index,
            },
        );
    }
    latest.into_values().collect()
}

/// Status tag of a published task. Unit enum variants arrive as `["Tag"]`.
pub fn task_status(payload: &str) -> Option<String> {
    let value: Value = serde_json::from_str(payload).ok()?;
    match value.get("status")? {
        Value::String(tag) => Some(tag.clone()),
        Value::Array(parts) => parts.first()?.as_str().map(str::to_string),
        _ => None,
    }
}
