//! # Appeal funding ledger
//!
//! Crowdfunding of appeal fees, round by round. Each round tracks what each
//! side has collected, whether the side reached its required fee, and the
//! reward pool later split among contributors of the winning side.
//!
//! Funding windows:
//!
//! ```text
//!  start                  mid                    end
//!    |------ loser -------|                       |
//!    |------------------- winner -----------------|
//! ```
//!
//! When both sides are funded the dispute is appealed and a fresh round is
//! appended. A side that funds alone wins by default; see [`final_ruling`].

use soroban_sdk::{Address, Env};

use crate::arbitrator::ArbitrationBridge;
use crate::events;
use crate::pricing::apply_multiplier;
use crate::storage;
use crate::types::{Config, Party, Round, Ruling};
use crate::Error;

/// Appeal fee `side` owes this round, given the ruling currently standing.
///
/// Fails with `LoserFundingClosed` when `side` is the current loser and the
/// first half of the window is over.
pub fn required_fee(
    config: &Config,
    current: Ruling,
    side: Party,
    appeal_cost: i128,
    window: (u64, u64),
    now: u64,
) -> Result<i128, Error> {
    let (start, end) = window;
    let multiplier = if current == Ruling::RefusedToRule {
        config.multipliers.shared
    } else if current.winner() == side {
        config.multipliers.winner
    } else {
        if now - start >= (end - start) / 2 {
            return Err(Error::LoserFundingClosed);
        }
        config.multipliers.loser
    };
    apply_multiplier(appeal_cost, appeal_cost, multiplier)
}

/// Add up to `amount` from `contributor` toward `side`'s fee in the latest
/// round of `task_id`'s dispute.
///
/// Storage is fully updated before any token moves. The capped amount is
/// pulled from the contributor; if that completes both sides the appeal fee
/// is forwarded to the arbitrator and a new round is opened. Returns the
/// amount taken.
pub fn contribute(
    env: &Env,
    config: &Config,
    task_id: u64,
    dispute_id: u64,
    side: Party,
    contributor: &Address,
    amount: i128,
) -> Result<i128, Error> {
    if side == Party::None {
        return Err(Error::InvalidParty);
    }
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }

    let dispute = storage::load_dispute(env, dispute_id)?;
    if !dispute.ruling.is_pending() {
        return Err(Error::AppealPeriodClosed);
    }

    let bridge = ArbitrationBridge::new(env, config);
    let now = env.ledger().timestamp();
    let window = bridge.appeal_period(dispute_id)?;
    if now < window.0 || now >= window.1 {
        return Err(Error::AppealPeriodClosed);
    }

    let (round_index, mut round) = storage::load_last_round(env, task_id)?;
    if round.has_paid(side) {
        return Err(Error::AppealAlreadyFunded);
    }

    let current = bridge.current_ruling(dispute_id)?;
    let appeal_cost = bridge.appeal_cost(dispute_id);
    let total_cost = required_fee(config, current, side, appeal_cost, window, now)?;

    let accepted = accepted_amount(amount, total_cost, round.paid(side));

    let mut contribution = storage::load_contribution(env, task_id, round_index, contributor);
    contribution.add(side, accepted);
    round.add_paid(side, accepted);
    round.fee_rewards += accepted;

    let side_funded = round.paid(side) >= total_cost;
    if side_funded {
        round.mark_funded(side);
    }
    let appealed = round.is_fully_funded();
    if appealed {
        round.fee_rewards -= appeal_cost;
    }

    storage::save_contribution(env, task_id, round_index, contributor, &contribution);
    storage::save_round(env, task_id, round_index, &round);
    if appealed {
        storage::push_round(env, task_id);
    }

    if accepted > 0 {
        soroban_sdk::token::Client::new(env, &config.token).transfer(
            contributor,
            &env.current_contract_address(),
            &accepted,
        );
        events::emit_appeal_contribution(env, task_id, round_index, side, contributor.clone(), accepted);
    }
    if side_funded {
        events::emit_appeal_fee_paid(env, task_id, round_index, side);
    }
    if appealed {
        bridge.request_appeal(dispute_id, appeal_cost);
    }

    Ok(accepted)
}

/// Part of `amount` still needed to reach `total_cost` after `paid`.
///
/// The arbitrator may lower its fee mid-round, leaving a side that already
/// paid more than the new requirement; nothing is taken from it then.
pub fn accepted_amount(amount: i128, total_cost: i128, paid: i128) -> i128 {
    amount.min((total_cost - paid).max(0))
}

/// Ruling to record once the arbitrator's final decision arrives.
///
/// If exactly one side funded the latest round, that side wins regardless of
/// the arbitrator's ruling. Both sides can never be funded in the latest
/// round because that would have triggered an appeal.
pub fn final_ruling(last_round: Option<&Round>, arbitrator_ruling: Ruling) -> Ruling {
    match last_round {
        Some(round) if round.has_paid(Party::Translator) => Ruling::FavorTranslator,
        Some(round) if round.has_paid(Party::Challenger) => Ruling::FavorChallenger,
        _ => arbitrator_ruling,
    }
}
