//! # Events
//!
//! Every state change publishes exactly one primary event. Topics are
//! `(symbol, id)` where `id` is the task ID, or the arbitrator's dispute ID
//! for `dispute` and `ruling`. Mutations of a task additionally publish
//! `task_upd` with the full new [`Task`] so off-chain clients can rebuild the
//! value whose hash the contract stores.

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

use crate::types::{Config, Party, ResolutionReason, Ruling, Task};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskCreated {
    pub task_id: u64,
    pub requester: Address,
    pub token: Address,
    pub deadline: u64,
    pub min_price: i128,
    pub max_price: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MetaEvidence {
    pub task_id: u64,
    pub evidence: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskAssigned {
    pub task_id: u64,
    pub translator: Address,
    pub price: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TranslationSubmitted {
    pub task_id: u64,
    pub translator: Address,
    pub translated_text: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TranslationChallenged {
    pub task_id: u64,
    pub challenger: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DisputeCreated {
    pub dispute_id: u64,
    pub task_id: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EvidenceSubmitted {
    pub task_id: u64,
    pub party: Address,
    pub evidence: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppealContribution {
    pub task_id: u64,
    pub round: u32,
    pub side: Party,
    pub contributor: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppealFeePaid {
    pub task_id: u64,
    pub round: u32,
    pub side: Party,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RulingRecorded {
    pub dispute_id: u64,
    pub task_id: u64,
    pub ruling: Ruling,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskResolved {
    pub task_id: u64,
    pub reason: ResolutionReason,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeesWithdrawn {
    pub task_id: u64,
    pub beneficiary: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GovernorChanged {
    pub previous: Address,
    pub governor: Address,
}

pub fn emit_task_created(env: &Env, task_id: u64, task: &Task) {
    let payload = TaskCreated {
        task_id,
        requester: task.requester.clone(),
        token: task.token.clone(),
        deadline: task.submission_deadline,
        min_price: task.min_price,
        max_price: task.max_price,
    };
    env.events()
        .publish((symbol_short!("created"), task_id), payload);
}

pub fn emit_meta_evidence(env: &Env, task_id: u64, evidence: String) {
    let payload = MetaEvidence { task_id, evidence };
    env.events()
        .publish((symbol_short!("meta_evid"), task_id), payload);
}

pub fn emit_task_assigned(env: &Env, task_id: u64, translator: Address, price: i128) {
    let payload = TaskAssigned {
        task_id,
        translator,
        price,
    };
    env.events()
        .publish((symbol_short!("assigned"), task_id), payload);
}

pub fn emit_translation_submitted(
    env: &Env,
    task_id: u64,
    translator: Address,
    translated_text: String,
) {
    let payload = TranslationSubmitted {
        task_id,
        translator,
        translated_text,
    };
    env.events()
        .publish((symbol_short!("submitted"), task_id), payload);
}

pub fn emit_translation_challenged(env: &Env, task_id: u64, challenger: Address) {
    let payload = TranslationChallenged {
        task_id,
        challenger,
    };
    env.events()
        .publish((symbol_short!("challenge"), task_id), payload);
}

pub fn emit_dispute_created(env: &Env, dispute_id: u64, task_id: u64) {
    let payload = DisputeCreated {
        dispute_id,
        task_id,
    };
    env.events()
        .publish((symbol_short!("dispute"), dispute_id), payload);
}

/// Empty evidence is not published.
pub fn emit_evidence(env: &Env, task_id: u64, party: Address, evidence: String) {
    if evidence.is_empty() {
        return;
    }
    let payload = EvidenceSubmitted {
        task_id,
        party,
        evidence,
    };
    env.events()
        .publish((symbol_short!("evidence"), task_id), payload);
}

pub fn emit_appeal_contribution(
    env: &Env,
    task_id: u64,
    round: u32,
    side: Party,
    contributor: Address,
    amount: i128,
) {
    let payload = AppealContribution {
        task_id,
        round,
        side,
        contributor,
        amount,
    };
    env.events()
        .publish((symbol_short!("contrib"), task_id), payload);
}

pub fn emit_appeal_fee_paid(env: &Env, task_id: u64, round: u32, side: Party) {
    let payload = AppealFeePaid {
        task_id,
        round,
        side,
    };
    env.events()
        .publish((symbol_short!("fee_paid"), task_id), payload);
}

pub fn emit_ruling(env: &Env, dispute_id: u64, task_id: u64, ruling: Ruling) {
    let payload = RulingRecorded {
        dispute_id,
        task_id,
        ruling,
    };
    env.events()
        .publish((symbol_short!("ruling"), dispute_id), payload);
}

pub fn emit_task_resolved(env: &Env, task_id: u64, reason: ResolutionReason) {
    let payload = TaskResolved { task_id, reason };
    env.events()
        .publish((symbol_short!("resolved"), task_id), payload);
}

pub fn emit_task_updated(env: &Env, task_id: u64, task: &Task) {
    env.events()
        .publish((symbol_short!("task_upd"), task_id), task.clone());
}

pub fn emit_fees_withdrawn(env: &Env, task_id: u64, beneficiary: Address, amount: i128) {
    let payload = FeesWithdrawn {
        task_id,
        beneficiary,
        amount,
    };
    env.events()
        .publish((symbol_short!("withdrawn"), task_id), payload);
}

pub fn emit_governor_changed(env: &Env, previous: Address, governor: Address) {
    let payload = GovernorChanged { previous, governor };
    env.events().publish((symbol_short!("gov_set"),), payload);
}

pub fn emit_params_changed(env: &Env, config: &Config) {
    env.events()
        .publish((symbol_short!("params"),), config.clone());
}
