//! # Types
//!
//! Shared data structures used across all modules of the Linguo escrow.
//!
//! ## Design decisions
//!
//! ### Hash-stored tasks
//!
//! A [`Task`] is never written to the ledger. Only `sha256(xdr(task))` is kept
//! (see [`crate::storage`]) and every caller hands the full value back in. The
//! contract re-hashes the supplied value and rejects it on mismatch, so the
//! caller can never substitute a forged task.
//!
//! ### Status as a Finite-State Machine
//!
//! [`TaskStatus`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! Created ──► Assigned ──► AwaitingReview ──► InDispute ──► Resolved
//!    │            │               │                            ▲
//!    └────────────┴───────────────┴────────────────────────────┘
//! ```
//!
//! `Created`/`Assigned` resolve by reimbursement once the deadline lapses,
//! `AwaitingReview` resolves by acceptance once the review window lapses.
//!
//! ### Parties
//!
//! Party cardinality is fixed. Per-side bookkeeping ([`Round`],
//! [`Contribution`]) uses one field per side, selected through [`Party`],
//! rather than an open-ended map.

use soroban_sdk::{contracttype, Address, Bytes};

/// Basis-point denominator shared by every stake multiplier.
pub const MULTIPLIER_DIVISOR: i128 = 10_000;

/// Sentinel returned for deposits that can no longer be paid.
pub const NOT_PAYABLE_VALUE: i128 = i128::MAX;

/// Number of ruling options offered to the arbitrator (excluding "refuse").
pub const RULING_OPTIONS: u32 = 2;

/// Lifecycle status of a task.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TaskStatus {
    /// Waiting for a translator; price is still moving.
    Created,
    /// Translator staked a deposit; price is locked.
    Assigned,
    /// Translation submitted; review window is open.
    AwaitingReview,
    /// Translation challenged; dispute open at the arbitrator.
    InDispute,
    /// Terminal. All task-level funds were released.
    Resolved,
}

/// A side of the dispute. The numeric values are the arbitrator's choices.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Party {
    None = 0,
    Translator = 1,
    Challenger = 2,
}

/// Outcome of a dispute. Wire-compatible with [`Party`].
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Ruling {
    RefusedToRule = 0,
    FavorTranslator = 1,
    FavorChallenger = 2,
}

impl Ruling {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Ruling::RefusedToRule),
            1 => Some(Ruling::FavorTranslator),
            2 => Some(Ruling::FavorChallenger),
            _ => None,
        }
    }

    /// The party this ruling favours, `Party::None` for a refusal.
    pub fn winner(self) -> Party {
        match self {
            Ruling::RefusedToRule => Party::None,
            Ruling::FavorTranslator => Party::Translator,
            Ruling::FavorChallenger => Party::Challenger,
        }
    }
}

/// Ruling slot of a task or dispute. `Pending` until the arbitrator rules.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FinalRuling {
    Pending,
    Ruled(Ruling),
}

impl FinalRuling {
    pub fn ruling(self) -> Option<Ruling> {
        match self {
            FinalRuling::Pending => None,
            FinalRuling::Ruled(ruling) => Some(ruling),
        }
    }

    pub fn is_pending(self) -> bool {
        self == FinalRuling::Pending
    }
}

/// Closed tag set attached to `resolved` events.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolutionReason {
    RequesterReimbursed,
    TranslationAccepted,
    DisputeSettled,
}

/// Full task record. Only its hash lives on the ledger.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Task {
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Ledger timestamp by which the translation must be submitted.
    pub submission_deadline: u64,
    /// Creation time while `Created`, then the time of the latest transition.
    pub last_interaction: u64,
    /// Price offered at creation time.
    pub min_price: i128,
    /// Price offered at the deadline; escrowed in full by the requester.
    pub max_price: i128,
    pub requester: Address,
    /// Token the price is denominated and escrowed in.
    pub token: Address,
    pub translator: Option<Address>,
    pub challenger: Option<Address>,
    /// `max_price` until assignment, then the locked price.
    pub requester_deposit: i128,
    /// Translator deposit plus challenger deposit net of the arbitration cost.
    pub sum_deposit: i128,
    pub dispute_id: Option<u64>,
    /// Final ruling, set when a dispute is settled.
    pub ruling: FinalRuling,
}

/// Appeal-funding state of one dispute round.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Round {
    pub translator_paid: i128,
    pub challenger_paid: i128,
    pub translator_funded: bool,
    pub challenger_funded: bool,
    /// Contributions collected this round, net of the appeal cost once escalated.
    pub fee_rewards: i128,
}

impl Round {
    pub fn paid(&self, side: Party) -> i128 {
        match side {
            Party::Translator => self.translator_paid,
            Party::Challenger => self.challenger_paid,
            Party::None => 0,
        }
    }

    pub fn has_paid(&self, side: Party) -> bool {
        match side {
            Party::Translator => self.translator_funded,
            Party::Challenger => self.challenger_funded,
            Party::None => false,
        }
    }

    pub fn add_paid(&mut self, side: Party, amount: i128) {
        match side {
            Party::Translator => self.translator_paid += amount,
            Party::Challenger => self.challenger_paid += amount,
            Party::None => {}
        }
    }

    pub fn mark_funded(&mut self, side: Party) {
        match side {
            Party::Translator => self.translator_funded = true,
            Party::Challenger => self.challenger_funded = true,
            Party::None => {}
        }
    }

    /// Both sides funded, i.e. the round escalated into an appeal.
    pub fn is_fully_funded(&self) -> bool {
        self.translator_funded && self.challenger_funded
    }
}

/// One contributor's payments toward each side in a single round.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Contribution {
    pub translator: i128,
    pub challenger: i128,
}

impl Contribution {
    pub fn get(&self, side: Party) -> i128 {
        match side {
            Party::Translator => self.translator,
            Party::Challenger => self.challenger,
            Party::None => 0,
        }
    }

    pub fn add(&mut self, side: Party, amount: i128) {
        match side {
            Party::Translator => self.translator += amount,
            Party::Challenger => self.challenger += amount,
            Party::None => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.translator == 0 && self.challenger == 0
    }
}

/// Maps an arbitrator dispute back to its task.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskDispute {
    pub task_id: u64,
    /// Ruling after the funded-default override.
    pub ruling: FinalRuling,
}

/// Stake multipliers in basis points of [`MULTIPLIER_DIVISOR`].
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakeMultipliers {
    /// Share of the price a translator stakes on assignment.
    pub translation: u32,
    /// Share of the price a challenger stakes on challenge.
    pub challenge: u32,
    /// Appeal stake for both sides when the arbitrator refused to rule.
    pub shared: u32,
    /// Appeal stake for the side currently favoured by the ruling.
    pub winner: u32,
    /// Appeal stake for the side currently disfavoured by the ruling.
    pub loser: u32,
}

/// Contract-wide configuration, written by `init` and the governor.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub governor: Address,
    pub arbitrator: Address,
    /// Settlement token for deposits, appeal fees and arbitration costs.
    pub token: Address,
    /// Quotes task-token prices in the settlement token. Without one, tasks
    /// must be priced in the settlement token itself.
    pub price_oracle: Option<Address>,
    pub arbitrator_extra_data: Bytes,
    /// Seconds the requester has to challenge a submitted translation.
    pub review_timeout: u64,
    pub multipliers: StakeMultipliers,
}
