//! # Linguo Escrow Contract
//!
//! Escrow for translation tasks with optimistic review and third-party
//! arbitration. A requester escrows the maximum price, translators compete on
//! a price that rises linearly until the submission deadline, and any
//! submitted translation can be challenged during a review window. Challenges
//! become disputes at an external arbitrator whose rulings can be appealed
//! with crowdfunded fees.
//!
//! | Phase        | Entry Point(s)                                                     |
//! |--------------|--------------------------------------------------------------------|
//! | Bootstrap    | [`LinguoEscrow::init`]                                             |
//! | Governance   | `change_governor`, `change_review_timeout`, `change_multipliers`, `change_price_oracle` |
//! | Task         | `create_task`, `assign_task`, `submit_translation`                 |
//! | Resolution   | `reimburse_requester`, `accept_translation`, `execute_ruling`      |
//! | Dispute      | `challenge_translation`, `submit_evidence`, `fund_appeal`, `rule`  |
//! | Rewards      | `withdraw_fees_and_rewards`, `batch_round_withdraw`                |
//! | Queries      | `get_task_price`, `get_task_price_in_settlement`, `get_*_deposit`, `task_hash`… |
//!
//! ## Architecture
//!
//! Storage access is delegated to [`storage`], price math to [`pricing`], the
//! external authority to [`arbitrator`], task-token quotes to [`oracle`],
//! appeal crowdfunding to [`appeal`] and fund routing to [`payout`]. This file holds the entry points: guards,
//! state transitions and event emission.
//!
//! Tasks are stored by hash only. Every task-level call takes the task ID and
//! the full [`Task`] last published in a `task_upd` event, and returns the
//! updated value.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Bytes, BytesN, Env, String};

mod appeal;
pub mod arbitrator;
pub mod events;
pub mod oracle;
mod payout;
mod pricing;
mod storage;
mod types;

#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_token;
#[cfg(test)]
mod test_withdraw;

use arbitrator::ArbitrationBridge;
use oracle::PriceConverter;
pub use types::{
    Config, Contribution, FinalRuling, Party, ResolutionReason, Round, Ruling, StakeMultipliers,
    Task, TaskDispute, TaskStatus, MULTIPLIER_DIVISOR, NOT_PAYABLE_VALUE,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized   = 1,
    NotInitialized       = 2,
    TaskNotFound         = 3,
    InvalidStatus        = 4,
    DisputeNotFound      = 5,
    RoundNotFound        = 6,
    RulingAlreadyRecorded = 7,
    NoRuling             = 8,
    TaskNotResolved      = 9,
    DeadlineInPast       = 10,
    DeadlinePassed       = 11,
    DeadlineNotPassed    = 12,
    ReviewPeriodActive   = 13,
    ReviewPeriodPassed   = 14,
    NotAppealable        = 15,
    AppealPeriodClosed   = 16,
    LoserFundingClosed   = 17,
    NotTranslator        = 18,
    NotGovernor          = 19,
    DepositTooLow        = 20,
    InvalidAmount        = 21,
    InvalidParty         = 22,
    AppealAlreadyFunded  = 23,
    InvalidRuling        = 24,
    ArithmeticOverflow   = 25,
    TaskHashMismatch     = 26,
    InvalidPriceRange    = 27,
    PriceUnavailable     = 28,
}

#[contract]
pub struct LinguoEscrow;

/// Store the new task digest and publish the full value.
fn commit(env: &Env, task_id: u64, task: &Task) {
    storage::save_task(env, task_id, task);
    events::emit_task_updated(env, task_id, task);
}

fn pull(env: &Env, token: &Address, from: &Address, amount: i128) {
    if amount > 0 {
        soroban_sdk::token::Client::new(env, token).transfer(
            from,
            &env.current_contract_address(),
            &amount,
        );
    }
}

fn require_governor(config: &Config, caller: &Address) -> Result<(), Error> {
    caller.require_auth();
    if *caller != config.governor {
        return Err(Error::NotGovernor);
    }
    Ok(())
}

#[contractimpl]
impl LinguoEscrow {
    // ─────────────────────────────────────────────────────────
    // Initialisation & governance
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract. Must be called exactly once after deployment.
    ///
    /// `arbitrator` and `arbitrator_extra_data` are fixed for the lifetime of
    /// the contract; open disputes depend on them. `token` settles deposits
    /// and fees; `price_oracle` is only needed for tasks priced in other
    /// tokens.
    pub fn init(
        env: Env,
        governor: Address,
        arbitrator: Address,
        token: Address,
        price_oracle: Option<Address>,
        arbitrator_extra_data: Bytes,
        review_timeout: u64,
        multipliers: StakeMultipliers,
    ) -> Result<(), Error> {
        governor.require_auth();
        if storage::has_config(&env) {
            return Err(Error::AlreadyInitialized);
        }
        let config = Config {
            governor,
            arbitrator,
            token,
            price_oracle,
            arbitrator_extra_data,
            review_timeout,
            multipliers,
        };
        storage::save_config(&env, &config);
        Ok(())
    }

    /// Hand governance to `new_governor`.
    pub fn change_governor(env: Env, governor: Address, new_governor: Address) -> Result<(), Error> {
        let mut config = storage::load_config(&env)?;
        require_governor(&config, &governor)?;
        config.governor = new_governor.clone();
        storage::save_config(&env, &config);
        events::emit_governor_changed(&env, governor, new_governor);
        Ok(())
    }

    /// Change the review window. Applies to tasks entering review afterwards
    /// as well as to tasks already in review.
    pub fn change_review_timeout(env: Env, governor: Address, review_timeout: u64) -> Result<(), Error> {
        let mut config = storage::load_config(&env)?;
        require_governor(&config, &governor)?;
        config.review_timeout = review_timeout;
        storage::save_config(&env, &config);
        events::emit_params_changed(&env, &config);
        Ok(())
    }

    pub fn change_multipliers(
        env: Env,
        governor: Address,
        multipliers: StakeMultipliers,
    ) -> Result<(), Error> {
        let mut config = storage::load_config(&env)?;
        require_governor(&config, &governor)?;
        config.multipliers = multipliers;
        storage::save_config(&env, &config);
        events::emit_params_changed(&env, &config);
        Ok(())
    }

    /// Replace the price source. Tasks priced in a foreign token cannot be
    /// assigned or challenged while no oracle is set.
    pub fn change_price_oracle(
        env: Env,
        governor: Address,
        price_oracle: Option<Address>,
    ) -> Result<(), Error> {
        let mut config = storage::load_config(&env)?;
        require_governor(&config, &governor)?;
        config.price_oracle = price_oracle;
        storage::save_config(&env, &config);
        events::emit_params_changed(&env, &config);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Task lifecycle
    // ─────────────────────────────────────────────────────────

    /// Create a task, escrowing `max_price` of `token` from `requester`.
    ///
    /// The listed price starts at `min_price` now and reaches `max_price` at
    /// `deadline`. Returns the new task ID; the full task is published in the
    /// `task_upd` event.
    pub fn create_task(
        env: Env,
        requester: Address,
        deadline: u64,
        token: Address,
        min_price: i128,
        max_price: i128,
        meta_evidence: String,
    ) -> Result<u64, Error> {
        requester.require_auth();
        let config = storage::load_config(&env)?;

        if min_price < 0 {
            return Err(Error::InvalidAmount);
        }
        if max_price < min_price {
            return Err(Error::InvalidPriceRange);
        }
        let now = env.ledger().timestamp();
        if deadline <= now {
            return Err(Error::DeadlineInPast);
        }
        if !PriceConverter::new(&env, &config).supports(&token) {
            return Err(Error::PriceUnavailable);
        }

        let task_id = storage::get_and_increment_task_id(&env);
        let task = Task {
            status: TaskStatus::Created,
            submission_deadline: deadline,
            last_interaction: now,
            min_price,
            max_price,
            requester: requester.clone(),
            token,
            translator: None,
            challenger: None,
            requester_deposit: max_price,
            sum_deposit: 0,
            dispute_id: None,
            ruling: FinalRuling::Pending,
        };
        storage::save_task(&env, task_id, &task);

        pull(&env, &task.token, &requester, max_price);

        events::emit_task_created(&env, task_id, &task);
        events::emit_meta_evidence(&env, task_id, meta_evidence);
        events::emit_task_updated(&env, task_id, &task);
        Ok(task_id)
    }

    /// Take the task at the current price.
    ///
    /// `max_deposit` is the most the translator is willing to stake; only the
    /// current required deposit is pulled. The difference between the
    /// escrowed maximum and the locked price goes back to the requester.
    pub fn assign_task(
        env: Env,
        task_id: u64,
        task: Task,
        translator: Address,
        max_deposit: i128,
    ) -> Result<Task, Error> {
        let mut task = task;
        translator.require_auth();
        let config = storage::load_config(&env)?;
        storage::verify_task(&env, task_id, &task)?;

        if task.status != TaskStatus::Created {
            return Err(Error::InvalidStatus);
        }
        let now = env.ledger().timestamp();
        if now >= task.submission_deadline {
            return Err(Error::DeadlinePassed);
        }

        let price = pricing::current_price(&task, now)?;
        let arbitration_cost = ArbitrationBridge::new(&env, &config).dispute_cost();
        let converter = PriceConverter::new(&env, &config);
        let deposit = pricing::translator_deposit(
            &task,
            now,
            arbitration_cost,
            config.multipliers.translation,
            |price| converter.to_settlement(&task.token, price),
        )?;
        if max_deposit < deposit {
            return Err(Error::DepositTooLow);
        }

        let refund = task.requester_deposit - price;
        task.requester_deposit = price;
        task.sum_deposit = deposit;
        task.translator = Some(translator.clone());
        task.status = TaskStatus::Assigned;
        task.last_interaction = now;
        commit(&env, task_id, &task);

        pull(&env, &config.token, &translator, deposit);
        payout::send(&env, &task.token, &task.requester, refund);

        events::emit_task_assigned(&env, task_id, translator, price);
        Ok(task)
    }

    /// Deliver the translation. Opens the review window.
    pub fn submit_translation(
        env: Env,
        task_id: u64,
        task: Task,
        translator: Address,
        translated_text: String,
    ) -> Result<Task, Error> {
        let mut task = task;
        translator.require_auth();
        storage::verify_task(&env, task_id, &task)?;

        if task.status != TaskStatus::Assigned {
            return Err(Error::InvalidStatus);
        }
        if task.translator.as_ref() != Some(&translator) {
            return Err(Error::NotTranslator);
        }
        let now = env.ledger().timestamp();
        if now >= task.submission_deadline {
            return Err(Error::DeadlinePassed);
        }

        task.status = TaskStatus::AwaitingReview;
        task.last_interaction = now;
        commit(&env, task_id, &task);

        events::emit_translation_submitted(&env, task_id, translator, translated_text);
        Ok(task)
    }

    /// Return escrow and any forfeited translator deposit to the requester
    /// once the submission deadline lapsed without a translation.
    pub fn reimburse_requester(env: Env, task_id: u64, task: Task) -> Result<Task, Error> {
        let mut task = task;
        let config = storage::load_config(&env)?;
        storage::verify_task(&env, task_id, &task)?;

        if !matches!(task.status, TaskStatus::Created | TaskStatus::Assigned) {
            return Err(Error::InvalidStatus);
        }
        let now = env.ledger().timestamp();
        if now < task.submission_deadline {
            return Err(Error::DeadlineNotPassed);
        }

        let settlement = payout::reimbursement(&task);
        payout::close(&mut task, now, FinalRuling::Pending);
        commit(&env, task_id, &task);

        payout::transfer_settlement(&env, &config, &task, &settlement);
        events::emit_task_resolved(&env, task_id, ResolutionReason::RequesterReimbursed);
        Ok(task)
    }

    /// Pay the translator once the review window lapsed without a challenge.
    pub fn accept_translation(env: Env, task_id: u64, task: Task) -> Result<Task, Error> {
        let mut task = task;
        let config = storage::load_config(&env)?;
        storage::verify_task(&env, task_id, &task)?;

        if task.status != TaskStatus::AwaitingReview {
            return Err(Error::InvalidStatus);
        }
        let now = env.ledger().timestamp();
        if now < task.last_interaction.saturating_add(config.review_timeout) {
            return Err(Error::ReviewPeriodActive);
        }

        let settlement = payout::acceptance(&task);
        payout::close(&mut task, now, FinalRuling::Pending);
        commit(&env, task_id, &task);

        payout::transfer_settlement(&env, &config, &task, &settlement);
        events::emit_task_resolved(&env, task_id, ResolutionReason::TranslationAccepted);
        Ok(task)
    }

    // ─────────────────────────────────────────────────────────
    // Disputes
    // ─────────────────────────────────────────────────────────

    /// Challenge a submitted translation and open a dispute.
    ///
    /// The challenger stakes the arbitration cost plus a share of the locked
    /// price; the arbitration cost is forwarded to the arbitrator at once.
    pub fn challenge_translation(
        env: Env,
        task_id: u64,
        task: Task,
        challenger: Address,
        max_deposit: i128,
        evidence: String,
    ) -> Result<Task, Error> {
        let mut task = task;
        challenger.require_auth();
        let config = storage::load_config(&env)?;
        storage::verify_task(&env, task_id, &task)?;

        if task.status != TaskStatus::AwaitingReview {
            return Err(Error::InvalidStatus);
        }
        let now = env.ledger().timestamp();
        if now >= task.last_interaction.saturating_add(config.review_timeout) {
            return Err(Error::ReviewPeriodPassed);
        }

        let bridge = ArbitrationBridge::new(&env, &config);
        let arbitration_cost = bridge.dispute_cost();
        let converter = PriceConverter::new(&env, &config);
        let deposit = pricing::challenger_deposit(
            &task,
            now,
            config.review_timeout,
            arbitration_cost,
            config.multipliers.challenge,
            |price| converter.to_settlement(&task.token, price),
        )?;
        if max_deposit < deposit {
            return Err(Error::DepositTooLow);
        }

        pull(&env, &config.token, &challenger, deposit);
        // The host rejects re-entry, so the dispute ID can be written after the call.
        let dispute_id = bridge.create_dispute(arbitration_cost);

        task.challenger = Some(challenger.clone());
        task.sum_deposit = task
            .sum_deposit
            .checked_add(deposit - arbitration_cost)
            .ok_or(Error::ArithmeticOverflow)?;
        task.status = TaskStatus::InDispute;
        task.dispute_id = Some(dispute_id);
        task.last_interaction = now;

        storage::save_dispute(
            &env,
            dispute_id,
            &TaskDispute {
                task_id,
                ruling: FinalRuling::Pending,
            },
        );
        storage::push_round(&env, task_id);
        commit(&env, task_id, &task);

        events::emit_translation_challenged(&env, task_id, challenger.clone());
        events::emit_dispute_created(&env, dispute_id, task_id);
        events::emit_evidence(&env, task_id, challenger, evidence);
        Ok(task)
    }

    /// Attach evidence to the open dispute of a task.
    pub fn submit_evidence(
        env: Env,
        task_id: u64,
        task: Task,
        party: Address,
        evidence: String,
    ) -> Result<(), Error> {
        party.require_auth();
        storage::verify_task(&env, task_id, &task)?;
        if task.status != TaskStatus::InDispute {
            return Err(Error::InvalidStatus);
        }
        events::emit_evidence(&env, task_id, party, evidence);
        Ok(())
    }

    /// Contribute up to `amount` toward `side`'s appeal fee in the current
    /// round. Returns the amount actually taken.
    pub fn fund_appeal(
        env: Env,
        task_id: u64,
        task: Task,
        side: Party,
        contributor: Address,
        amount: i128,
    ) -> Result<i128, Error> {
        contributor.require_auth();
        let config = storage::load_config(&env)?;
        storage::verify_task(&env, task_id, &task)?;

        if task.status != TaskStatus::InDispute {
            return Err(Error::InvalidStatus);
        }
        let dispute_id = task.dispute_id.ok_or(Error::DisputeNotFound)?;

        appeal::contribute(&env, &config, task_id, dispute_id, side, &contributor, amount)
    }

    /// Final-ruling callback. Only the configured arbitrator may call it.
    ///
    /// A side that alone funded the latest appeal round wins regardless of
    /// `ruling`. The task itself is settled by [`LinguoEscrow::execute_ruling`].
    pub fn rule(env: Env, dispute_id: u64, ruling: u32) -> Result<(), Error> {
        let config = storage::load_config(&env)?;
        config.arbitrator.require_auth();

        let ruling = Ruling::from_u32(ruling).ok_or(Error::InvalidRuling)?;
        let mut dispute = storage::load_dispute(&env, dispute_id)?;
        if !dispute.ruling.is_pending() {
            return Err(Error::RulingAlreadyRecorded);
        }

        let last_round = storage::load_last_round(&env, dispute.task_id)
            .ok()
            .map(|(_, round)| round);
        let ruling = appeal::final_ruling(last_round.as_ref(), ruling);

        dispute.ruling = FinalRuling::Ruled(ruling);
        storage::save_dispute(&env, dispute_id, &dispute);

        events::emit_ruling(&env, dispute_id, dispute.task_id, ruling);
        Ok(())
    }

    /// Settle a disputed task according to its recorded ruling.
    pub fn execute_ruling(env: Env, task_id: u64, task: Task) -> Result<Task, Error> {
        let mut task = task;
        let config = storage::load_config(&env)?;
        storage::verify_task(&env, task_id, &task)?;

        if task.status != TaskStatus::InDispute {
            return Err(Error::InvalidStatus);
        }
        let dispute_id = task.dispute_id.ok_or(Error::DisputeNotFound)?;
        let dispute = storage::load_dispute(&env, dispute_id)?;
        let ruling = dispute.ruling.ruling().ok_or(Error::NoRuling)?;

        let settlement = payout::dispute_settlement(&task, ruling);
        payout::close(&mut task, env.ledger().timestamp(), dispute.ruling);
        commit(&env, task_id, &task);

        payout::transfer_settlement(&env, &config, &task, &settlement);
        events::emit_task_resolved(&env, task_id, ResolutionReason::DisputeSettled);
        Ok(task)
    }

    // ─────────────────────────────────────────────────────────
    // Appeal rewards
    // ─────────────────────────────────────────────────────────

    /// Pay `beneficiary` its reimbursement or reward for one round.
    /// Anyone may call; funds always go to `beneficiary`.
    pub fn withdraw_fees_and_rewards(
        env: Env,
        beneficiary: Address,
        task_id: u64,
        task: Task,
        round: u32,
    ) -> Result<i128, Error> {
        let config = storage::load_config(&env)?;
        storage::verify_task(&env, task_id, &task)?;
        payout::withdraw(&env, &config, task_id, &task, &beneficiary, round)
    }

    /// Withdraw over the inclusive round range `[start_round, end_round]`.
    pub fn batch_round_withdraw(
        env: Env,
        beneficiary: Address,
        task_id: u64,
        task: Task,
        start_round: u32,
        end_round: u32,
    ) -> Result<i128, Error> {
        let config = storage::load_config(&env)?;
        storage::verify_task(&env, task_id, &task)?;
        payout::batch_withdraw(
            &env,
            &config,
            task_id,
            &task,
            &beneficiary,
            start_round,
            end_round,
        )
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_task_price(env: Env, task_id: u64, task: Task) -> Result<i128, Error> {
        storage::verify_task(&env, task_id, &task)?;
        pricing::current_price(&task, env.ledger().timestamp())
    }

    /// Current price converted into the settlement token.
    pub fn get_task_price_in_settlement(env: Env, task_id: u64, task: Task) -> Result<i128, Error> {
        let config = storage::load_config(&env)?;
        storage::verify_task(&env, task_id, &task)?;
        let price = pricing::current_price(&task, env.ledger().timestamp())?;
        PriceConverter::new(&env, &config).to_settlement(&task.token, price)
    }

    /// Deposit required to assign the task now, [`NOT_PAYABLE_VALUE`] if it
    /// can no longer be assigned.
    pub fn get_translator_deposit(env: Env, task_id: u64, task: Task) -> Result<i128, Error> {
        let config = storage::load_config(&env)?;
        storage::verify_task(&env, task_id, &task)?;
        let arbitration_cost = ArbitrationBridge::new(&env, &config).dispute_cost();
        let converter = PriceConverter::new(&env, &config);
        pricing::translator_deposit(
            &task,
            env.ledger().timestamp(),
            arbitration_cost,
            config.multipliers.translation,
            |price| converter.to_settlement(&task.token, price),
        )
    }

    /// Deposit required to challenge now, [`NOT_PAYABLE_VALUE`] outside the
    /// review window.
    pub fn get_challenger_deposit(env: Env, task_id: u64, task: Task) -> Result<i128, Error> {
        let config = storage::load_config(&env)?;
        storage::verify_task(&env, task_id, &task)?;
        let arbitration_cost = ArbitrationBridge::new(&env, &config).dispute_cost();
        let converter = PriceConverter::new(&env, &config);
        pricing::challenger_deposit(
            &task,
            env.ledger().timestamp(),
            config.review_timeout,
            arbitration_cost,
            config.multipliers.challenge,
            |price| converter.to_settlement(&task.token, price),
        )
    }

    /// Amount `beneficiary` can withdraw from `round`; 0 until the task resolves.
    pub fn get_withdrawable_amount(
        env: Env,
        task_id: u64,
        task: Task,
        beneficiary: Address,
        round: u32,
    ) -> Result<i128, Error> {
        storage::verify_task(&env, task_id, &task)?;
        payout::round_withdrawable(&env, task_id, &task, &beneficiary, round)
    }

    /// Amount `beneficiary` can withdraw over all rounds.
    pub fn amount_withdrawable(
        env: Env,
        task_id: u64,
        task: Task,
        beneficiary: Address,
    ) -> Result<i128, Error> {
        storage::verify_task(&env, task_id, &task)?;
        payout::total_withdrawable(&env, task_id, &task, &beneficiary)
    }

    pub fn get_round_info(env: Env, task_id: u64, round: u32) -> Result<Round, Error> {
        storage::load_round(&env, task_id, round)
    }

    pub fn get_number_of_rounds(env: Env, task_id: u64) -> u32 {
        storage::round_count(&env, task_id)
    }

    pub fn get_contribution(env: Env, task_id: u64, round: u32, contributor: Address) -> Contribution {
        storage::load_contribution(&env, task_id, round, &contributor)
    }

    pub fn get_task_dispute(env: Env, dispute_id: u64) -> Result<TaskDispute, Error> {
        storage::load_dispute(&env, dispute_id)
    }

    /// Stored digest of a task.
    pub fn task_hash(env: Env, task_id: u64) -> Result<BytesN<32>, Error> {
        storage::load_task_hash(&env, task_id)
    }

    /// Digest the contract would store for `task`.
    pub fn hash_task_state(env: Env, task: Task) -> BytesN<32> {
        storage::hash_task(&env, &task)
    }

    pub fn task_count(env: Env) -> u64 {
        storage::task_count(&env)
    }

    pub fn get_config(env: Env) -> Result<Config, Error> {
        storage::load_config(&env)
    }
}
