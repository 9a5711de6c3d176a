//! Database layer: migrations, queries, and cursor management.

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

use crate::errors::{IndexerError, Result};
use crate::events::{EventRecord, LinguoEvent, TaskSnapshot};

const EVENT_COLUMNS: &str = "id, event_type, task_id, dispute_id, actor, amount, payload, \
     ledger, timestamp, contract_id, tx_hash, event_index, created_at";

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    // Create the file on first start.
    let url = if url.contains('?') || url.contains(":memory:") {
        url
    } else {
        format!("{url}?mode=rwc")
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// Read the last-seen ledger from the cursor row.
/// Returns `0` when no cursor has been persisted yet.
pub async fn get_last_ledger(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_ledger FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Persist the last-seen ledger (and optionally a pagination cursor string).
pub async fn save_cursor(
    pool: &SqlitePool,
    last_ledger: i64,
    last_cursor: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(last_ledger)
        .bind(last_cursor)
        .execute(pool)
        .await?;
    Ok(())
}

/// Read back the raw cursor string (used to resume pagination mid-ledger).
pub async fn get_cursor_string(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(v,)| v))
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist a batch of decoded events in one transaction. Re-polled events
/// hit the `(ledger, tx_hash, event_type, task_id, event_index)` unique key
/// and are skipped.
pub async fn insert_events(pool: &SqlitePool, events: &[LinguoEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;
    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_type, task_id, dispute_id, actor, amount, payload,
                 ledger, timestamp, contract_id, tx_hash, event_index)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&ev.event_type)
        .bind(&ev.task_id)
        .bind(&ev.dispute_id)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(&ev.payload)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .bind(ev.event_index)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        count += rows_affected as usize;
    }
    tx.commit().await?;
    Ok(count)
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

/// Fetch all events for a given task, in chain order.
pub async fn get_events_for_task(pool: &SqlitePool, task_id: &str) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE task_id = ?1 \
         ORDER BY ledger ASC, event_index ASC, id ASC"
    ))
    .bind(task_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch all events, optionally restricted to one event type.
pub async fn get_all_events(
    pool: &SqlitePool,
    event_type: Option<&str>,
) -> Result<Vec<EventRecord>> {
    let rows = match event_type {
        Some(kind) => {
            sqlx::query_as::<_, EventRecord>(&format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE event_type = ?1 \
                 ORDER BY ledger ASC, event_index ASC, id ASC"
            ))
            .bind(kind)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, EventRecord>(&format!(
                "SELECT {EVENT_COLUMNS} FROM events \
                 ORDER BY ledger ASC, event_index ASC, id ASC"
            ))
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

// ─────────────────────────────────────────────────────────
// Task snapshots
// ─────────────────────────────────────────────────────────

/// Store `snapshots`, keeping whichever value of a task is newest in chain
/// order. Returns the number of rows written.
pub async fn upsert_task_states(pool: &SqlitePool, snapshots: &[TaskSnapshot]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;
    for snapshot in snapshots {
        let rows_affected = sqlx::query(
            r#"
            INSERT INTO task_states (task_id, status, payload, ledger, event_index)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (task_id) DO UPDATE SET
                status      = excluded.status,
                payload     = excluded.payload,
                ledger      = excluded.ledger,
                event_index = excluded.event_index,
                updated_at  = strftime('%s', 'now')
            WHERE excluded.ledger > task_states.ledger
               OR (excluded.ledger = task_states.ledger
                   AND excluded.event_index >= task_states.event_index)
            "#,
        )
        .bind(&snapshot.task_id)
        .bind(&snapshot.status)
        .bind(&snapshot.payload)
        .bind(snapshot.ledger)
        .bind(snapshot.event_index)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        count += rows_affected as usize;
    }
    tx.commit().await?;
    Ok(count)
}

/// Latest published value of a task, as JSON.
pub async fn get_task_state(pool: &SqlitePool, task_id: &str) -> Result<String> {
    let row: Option<(String,)> = sqlx::query_as("SELECT payload FROM task_states WHERE task_id = ?1")
        .bind(task_id)
        .fetch_optional(pool)
        .await?;
    row.map(|(payload,)| payload)
        .ok_or_else(|| IndexerError::TaskNotFound(task_id.to_string()))
}

/// Every indexed task, optionally restricted to one status, by task ID.
pub async fn get_task_states(pool: &SqlitePool, status: Option<&str>) -> Result<Vec<TaskSnapshot>> {
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, TaskSnapshot>(
                "SELECT task_id, status, payload, ledger, event_index FROM task_states \
                 WHERE status = ?1 ORDER BY CAST(task_id AS INTEGER) ASC",
            )
            .bind(status)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, TaskSnapshot>(
                "SELECT task_id, status, payload, ledger, event_index FROM task_states \
                 ORDER BY CAST(task_id AS INTEGER) ASC",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}
