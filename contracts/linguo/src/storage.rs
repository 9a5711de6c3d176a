//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by Linguo:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key         | Type     | Description                           |
//! |-------------|----------|---------------------------------------|
//! | `Config`    | `Config` | Governor, arbitrator, token, params   |
//! | `TaskCount` | `u64`    | Auto-increment task ID counter        |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                          | Type           | Description                           |
//! |------------------------------|----------------|---------------------------------------|
//! | `TaskHash(id)`               | `BytesN<32>`   | `sha256(xdr(Task))` of the live task  |
//! | `RoundCount(id)`             | `u32`          | Number of dispute rounds of a task    |
//! | `Round(id, n)`               | `Round`        | Appeal funding of round `n`           |
//! | `Contrib(id, n, addr)`       | `Contribution` | One contributor's payments in round n |
//! | `Dispute(dispute_id)`        | `TaskDispute`  | Arbitrator dispute → task mapping     |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! ## Why store only a hash?
//!
//! A full `Task` is ~300 bytes of XDR and changes on every transition. The
//! 32-byte digest is all the contract needs to authenticate a caller-supplied
//! task, so the large record never pays ledger rent.

use soroban_sdk::{contracttype, xdr::ToXdr, Address, BytesN, Env};

use crate::types::{Config, Contribution, Round, Task, TaskDispute};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

/// All contract storage keys.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Contract configuration (Instance).
    Config,
    /// Global auto-increment counter for task IDs (Instance).
    TaskCount,
    /// Digest of the current task state (Persistent).
    TaskHash(u64),
    /// Number of rounds of a task's dispute (Persistent).
    RoundCount(u64),
    /// Appeal funding of `(task_id, round)` (Persistent).
    Round(u64, u32),
    /// Contributions of `(task_id, round, contributor)` (Persistent).
    Contrib(u64, u32, Address),
    /// Arbitrator dispute ID → task (Persistent).
    Dispute(u64),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn save_config(env: &Env, config: &Config) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn load_config(env: &Env) -> Result<Config, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

/// Atomically reads, increments, and stores the task counter.
/// Returns the ID to use for the *current* task (pre-increment value).
pub fn get_and_increment_task_id(env: &Env) -> u64 {
    bump_instance(env);
    let current = task_count(env);
    env.storage()
        .instance()
        .set(&DataKey::TaskCount, &(current + 1));
    current
}

pub fn task_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::TaskCount)
        .unwrap_or(0)
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Canonical digest of a task: SHA-256 over its XDR encoding.
pub fn hash_task(env: &Env, task: &Task) -> BytesN<32> {
    env.crypto().sha256(&task.clone().to_xdr(env)).to_bytes()
}

pub fn load_task_hash(env: &Env, task_id: u64) -> Result<BytesN<32>, Error> {
    let key = DataKey::TaskHash(task_id);
    let hash: BytesN<32> = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::TaskNotFound)?;
    bump_persistent(env, &key);
    Ok(hash)
}

/// Store the digest of `task` as the current state of `task_id`.
pub fn save_task(env: &Env, task_id: u64, task: &Task) {
    let key = DataKey::TaskHash(task_id);
    env.storage().persistent().set(&key, &hash_task(env, task));
    bump_persistent(env, &key);
}

/// Authenticate a caller-supplied task against the stored digest.
pub fn verify_task(env: &Env, task_id: u64, task: &Task) -> Result<(), Error> {
    if load_task_hash(env, task_id)? != hash_task(env, task) {
        return Err(Error::TaskHashMismatch);
    }
    Ok(())
}

pub fn round_count(env: &Env, task_id: u64) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::RoundCount(task_id))
        .unwrap_or(0)
}

pub fn load_round(env: &Env, task_id: u64, round: u32) -> Result<Round, Error> {
    let key = DataKey::Round(task_id, round);
    let stored: Round = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::RoundNotFound)?;
    bump_persistent(env, &key);
    Ok(stored)
}

pub fn save_round(env: &Env, task_id: u64, round: u32, value: &Round) {
    let key = DataKey::Round(task_id, round);
    env.storage().persistent().set(&key, value);
    bump_persistent(env, &key);
}

/// Append an empty round and return its index.
pub fn push_round(env: &Env, task_id: u64) -> u32 {
    let index = round_count(env, task_id);
    save_round(env, task_id, index, &Round::default());
    let count_key = DataKey::RoundCount(task_id);
    env.storage().persistent().set(&count_key, &(index + 1));
    bump_persistent(env, &count_key);
    index
}

/// Index and value of the round currently accepting appeal funds.
pub fn load_last_round(env: &Env, task_id: u64) -> Result<(u32, Round), Error> {
    let count = round_count(env, task_id);
    if count == 0 {
        return Err(Error::RoundNotFound);
    }
    let index = count - 1;
    Ok((index, load_round(env, task_id, index)?))
}

pub fn load_contribution(env: &Env, task_id: u64, round: u32, contributor: &Address) -> Contribution {
    let key = DataKey::Contrib(task_id, round, contributor.clone());
    env.storage().persistent().get(&key).unwrap_or_default()
}

/// Persist a contribution record; empty records are removed from the ledger.
pub fn save_contribution(
    env: &Env,
    task_id: u64,
    round: u32,
    contributor: &Address,
    value: &Contribution,
) {
    let key = DataKey::Contrib(task_id, round, contributor.clone());
    if value.is_empty() {
        env.storage().persistent().remove(&key);
        return;
    }
    env.storage().persistent().set(&key, value);
    bump_persistent(env, &key);
}

pub fn load_dispute(env: &Env, dispute_id: u64) -> Result<TaskDispute, Error> {
    let key = DataKey::Dispute(dispute_id);
    let dispute: TaskDispute = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::DisputeNotFound)?;
    bump_persistent(env, &key);
    Ok(dispute)
}

pub fn save_dispute(env: &Env, dispute_id: u64, dispute: &TaskDispute) {
    let key = DataKey::Dispute(dispute_id);
    env.storage().persistent().set(&key, dispute);
    bump_persistent(env, &key);
}
