//! # Payouts
//!
//! Routing of task-level funds when a task resolves, and of appeal rewards
//! once a dispute is over.
//!
//! Task-level funds are the requester's escrow (`requester_deposit`, held in
//! the task token) and the contested pool (`sum_deposit`, held in the
//! settlement token). Resolution zeroes both on the task before any token
//! leaves the contract.
//!
//! | Outcome            | Requester           | Translator           | Challenger              |
//! |--------------------|---------------------|----------------------|-------------------------|
//! | Reimbursed         | escrow + pool       | -                    | -                       |
//! | Accepted           | -                   | escrow + pool        | -                       |
//! | FavorTranslator    | -                   | escrow + pool        | -                       |
//! | FavorChallenger    | escrow              | -                    | pool                    |
//! | RefusedToRule      | escrow              | pool / 2             | pool - pool / 2         |

use soroban_sdk::{token, Address, Env};

use crate::events;
use crate::pricing::mul_div;
use crate::storage;
use crate::types::{Config, Contribution, FinalRuling, Party, Round, Ruling, Task, TaskStatus};
use crate::Error;

/// Amounts owed to each task party.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Payouts {
    pub requester: i128,
    pub translator: i128,
    pub challenger: i128,
}

impl Payouts {
    #[cfg(test)]
    pub fn total(&self) -> i128 {
        self.requester + self.translator + self.challenger
    }
}

/// Task-level payouts, split by the token they are paid in.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Settlement {
    /// Requester escrow, in the task token.
    pub escrow: Payouts,
    /// Deposit pool, in the settlement token.
    pub pool: Payouts,
}

impl Settlement {
    #[cfg(test)]
    pub fn total(&self) -> i128 {
        self.escrow.total() + self.pool.total()
    }
}

/// Everything goes back to the requester.
pub fn reimbursement(task: &Task) -> Settlement {
    Settlement {
        escrow: Payouts {
            requester: task.requester_deposit,
            ..Payouts::default()
        },
        pool: Payouts {
            requester: task.sum_deposit,
            ..Payouts::default()
        },
    }
}

/// Everything goes to the translator.
pub fn acceptance(task: &Task) -> Settlement {
    Settlement {
        escrow: Payouts {
            translator: task.requester_deposit,
            ..Payouts::default()
        },
        pool: Payouts {
            translator: task.sum_deposit,
            ..Payouts::default()
        },
    }
}

pub fn dispute_settlement(task: &Task, ruling: Ruling) -> Settlement {
    match ruling {
        Ruling::FavorTranslator => acceptance(task),
        Ruling::FavorChallenger => Settlement {
            escrow: Payouts {
                requester: task.requester_deposit,
                ..Payouts::default()
            },
            pool: Payouts {
                challenger: task.sum_deposit,
                ..Payouts::default()
            },
        },
        Ruling::RefusedToRule => {
            let half = task.sum_deposit / 2;
            Settlement {
                escrow: Payouts {
                    requester: task.requester_deposit,
                    ..Payouts::default()
                },
                pool: Payouts {
                    translator: half,
                    challenger: task.sum_deposit - half,
                    ..Payouts::default()
                },
            }
        }
    }
}

/// Mark `task` resolved and drop its deposits. Call before [`transfer_payouts`].
pub fn close(task: &mut Task, now: u64, ruling: FinalRuling) {
    task.status = TaskStatus::Resolved;
    task.last_interaction = now;
    task.requester_deposit = 0;
    task.sum_deposit = 0;
    task.ruling = ruling;
}

/// Send each party its share. `task` must still carry the party addresses.
pub fn transfer_settlement(env: &Env, config: &Config, task: &Task, settlement: &Settlement) {
    transfer_payouts(env, &task.token, task, &settlement.escrow);
    transfer_payouts(env, &config.token, task, &settlement.pool);
}

fn transfer_payouts(env: &Env, token: &Address, task: &Task, payouts: &Payouts) {
    send(env, token, &task.requester, payouts.requester);
    if let Some(translator) = &task.translator {
        send(env, token, translator, payouts.translator);
    }
    if let Some(challenger) = &task.challenger {
        send(env, token, challenger, payouts.challenger);
    }
}

pub fn send(env: &Env, token: &Address, to: &Address, amount: i128) {
    if amount > 0 {
        token::Client::new(env, token).transfer(&env.current_contract_address(), to, &amount);
    }
}

/// What `contribution` is owed from `round` under the final `ruling`.
///
/// A round that did not escalate returns contributions as-is. Otherwise the
/// round's reward pool is split among the winning side's contributors, or
/// among everyone when the arbitrator refused to rule.
pub fn withdrawable(round: &Round, contribution: &Contribution, ruling: Ruling) -> Result<i128, Error> {
    if !round.is_fully_funded() {
        return contribution
            .translator
            .checked_add(contribution.challenger)
            .ok_or(Error::ArithmeticOverflow);
    }

    match ruling.winner() {
        Party::None => {
            let total_paid = round.translator_paid + round.challenger_paid;
            let mut share = 0;
            for side in [Party::Translator, Party::Challenger] {
                if round.paid(side) > 0 {
                    share += mul_div(contribution.get(side), round.fee_rewards, total_paid)?;
                }
            }
            Ok(share)
        }
        winner => {
            if round.paid(winner) == 0 {
                return Ok(0);
            }
            mul_div(contribution.get(winner), round.fee_rewards, round.paid(winner))
        }
    }
}

fn resolved_ruling(task: &Task) -> Result<Ruling, Error> {
    if task.status != TaskStatus::Resolved {
        return Err(Error::TaskNotResolved);
    }
    task.ruling.ruling().ok_or(Error::NoRuling)
}

/// Amount `beneficiary` could withdraw from one round right now.
pub fn round_withdrawable(
    env: &Env,
    task_id: u64,
    task: &Task,
    beneficiary: &Address,
    round: u32,
) -> Result<i128, Error> {
    let stored = storage::load_round(env, task_id, round)?;
    if task.status != TaskStatus::Resolved {
        return Ok(0);
    }
    let ruling = task.ruling.ruling().ok_or(Error::NoRuling)?;
    let contribution = storage::load_contribution(env, task_id, round, beneficiary);
    withdrawable(&stored, &contribution, ruling)
}

/// Sum of [`round_withdrawable`] over every round of the task.
pub fn total_withdrawable(
    env: &Env,
    task_id: u64,
    task: &Task,
    beneficiary: &Address,
) -> Result<i128, Error> {
    let mut total: i128 = 0;
    for round in 0..storage::round_count(env, task_id) {
        let amount = round_withdrawable(env, task_id, task, beneficiary, round)?;
        total = total.checked_add(amount).ok_or(Error::ArithmeticOverflow)?;
    }
    Ok(total)
}

/// Zero `beneficiary`'s contributions in `round` and return what they were worth.
fn take_round(
    env: &Env,
    task_id: u64,
    beneficiary: &Address,
    round: u32,
    ruling: Ruling,
) -> Result<i128, Error> {
    let stored = storage::load_round(env, task_id, round)?;
    let contribution = storage::load_contribution(env, task_id, round, beneficiary);
    if contribution.is_empty() {
        return Ok(0);
    }
    let amount = withdrawable(&stored, &contribution, ruling)?;
    storage::save_contribution(env, task_id, round, beneficiary, &Contribution::default());
    Ok(amount)
}

/// Pay `beneficiary` its rewards for `round`. A second call pays nothing.
pub fn withdraw(
    env: &Env,
    config: &Config,
    task_id: u64,
    task: &Task,
    beneficiary: &Address,
    round: u32,
) -> Result<i128, Error> {
    let ruling = resolved_ruling(task)?;
    let amount = take_round(env, task_id, beneficiary, round, ruling)?;
    finish_withdrawal(env, config, task_id, beneficiary, amount);
    Ok(amount)
}

/// Withdraw over the inclusive range `[start, end]`, `end` clamped to the
/// last round. One transfer covers the whole range.
pub fn batch_withdraw(
    env: &Env,
    config: &Config,
    task_id: u64,
    task: &Task,
    beneficiary: &Address,
    start: u32,
    end: u32,
) -> Result<i128, Error> {
    let ruling = resolved_ruling(task)?;
    let count = storage::round_count(env, task_id);
    if count == 0 || start >= count || start > end {
        return Ok(0);
    }
    let last = end.min(count - 1);

    let mut total: i128 = 0;
    for round in start..=last {
        let amount = take_round(env, task_id, beneficiary, round, ruling)?;
        total = total.checked_add(amount).ok_or(Error::ArithmeticOverflow)?;
    }
    finish_withdrawal(env, config, task_id, beneficiary, total);
    Ok(total)
}

fn finish_withdrawal(env: &Env, config: &Config, task_id: u64, beneficiary: &Address, amount: i128) {
    if amount > 0 {
        send(env, &config.token, beneficiary, amount);
        events::emit_fees_withdrawn(env, task_id, beneficiary.clone(), amount);
    }
}
