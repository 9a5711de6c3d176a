//! Canonical event types emitted by the Linguo escrow contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/linguo/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the Linguo contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new task was created (`created` topic).
    TaskCreated,
    /// Meta-evidence attached to a new task (`meta_evid` topic).
    MetaEvidence,
    /// A translator took the task (`assigned` topic).
    TaskAssigned,
    /// The translation was delivered (`submitted` topic).
    TranslationSubmitted,
    /// The translation was challenged (`challenge` topic).
    TranslationChallenged,
    /// A dispute was opened at the arbitrator (`dispute` topic).
    DisputeCreated,
    /// Evidence for a dispute (`evidence` topic).
    EvidenceSubmitted,
    /// Someone contributed to an appeal fee (`contrib` topic).
    AppealContribution,
    /// One side's appeal fee is fully paid (`fee_paid` topic).
    AppealFeePaid,
    /// The arbitrator's final ruling was recorded (`ruling` topic).
    RulingRecorded,
    /// The task reached its terminal state (`resolved` topic).
    TaskResolved,
    /// Full task state after a transition (`task_upd` topic).
    TaskUpdated,
    /// Appeal rewards were paid out (`withdrawn` topic).
    FeesWithdrawn,
    /// Governance moved to a new address (`gov_set` topic).
    GovernorChanged,
    /// Review timeout or multipliers changed (`params` topic).
    ParamsChanged,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::TaskCreated,
            "meta_evid" => Self::MetaEvidence,
            "assigned" => Self::TaskAssigned,
            "submitted" => Self::TranslationSubmitted,
            "challenge" => Self::TranslationChallenged,
            "dispute" => Self::DisputeCreated,
            "evidence" => Self::EvidenceSubmitted,
            "contrib" => Self::AppealContribution,
            "fee_paid" => Self::AppealFeePaid,
            "ruling" => Self::RulingRecorded,
            "resolved" => Self::TaskResolved,
            "task_upd" => Self::TaskUpdated,
            "withdrawn" => Self::FeesWithdrawn,
            "gov_set" => Self::GovernorChanged,
            "params" => Self::ParamsChanged,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::MetaEvidence => "meta_evidence",
            Self::TaskAssigned => "task_assigned",
            Self::TranslationSubmitted => "translation_submitted",
            Self::TranslationChallenged => "translation_challenged",
            Self::DisputeCreated => "dispute_created",
            Self::EvidenceSubmitted => "evidence_submitted",
            Self::AppealContribution => "appeal_contribution",
            Self::AppealFeePaid => "appeal_fee_paid",
            Self::RulingRecorded => "ruling_recorded",
            Self::TaskResolved => "task_resolved",
            Self::TaskUpdated => "task_updated",
            Self::FeesWithdrawn => "fees_withdrawn",
            Self::GovernorChanged => "governor_changed",
            Self::ParamsChanged => "params_changed",
            Self::Unknown => "unknown",
        }
    }

    /// Kinds whose second topic is the arbitrator's dispute ID rather than a task ID.
    pub fn keyed_by_dispute(&self) -> bool {
        matches!(self, Self::DisputeCreated | Self::RulingRecorded)
    }
}

/// A fully decoded Linguo event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinguoEvent {
    pub event_type: String,
    pub task_id: Option<String>,
    pub dispute_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    /// Event data as plain JSON.
    pub payload: String,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    /// Position of the event within its transaction.
    pub event_index: i64,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub task_id: Option<String>,
    pub dispute_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub payload: String,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub event_index: i64,
    pub created_at: i64,
}

/// Newest published value of one task, taken from its latest `task_upd` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskSnapshot {
    pub task_id: String,
    /// Status tag of the task, e.g. `InDispute`.
    pub status: String,
    /// The full task as plain JSON.
    pub payload: String,
    pub ledger: i64,
    pub event_index: i64,
}
