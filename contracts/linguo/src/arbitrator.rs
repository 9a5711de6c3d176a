//! # Arbitration bridge
//!
//! The arbitration authority is an external contract that only knows about
//! disputes. [`Arbitrator`] is the capability interface Linguo depends on; the
//! helpers below pay the authority in the settlement token and translate its
//! answers into Linguo types.
//!
//! Soroban calls carry no value, so every fee is pushed to the arbitrator with
//! a token transfer immediately before the call that consumes it.

use soroban_sdk::{contractclient, token, Address, Bytes, Env};

use crate::types::{Config, Ruling, RULING_OPTIONS};
use crate::Error;

/// Interface an arbitration authority must expose.
#[allow(dead_code)]
#[contractclient(name = "ArbitratorClient")]
pub trait Arbitrator {
    /// Cost of opening a dispute.
    fn arbitration_cost(env: Env, extra_data: Bytes) -> i128;

    /// Open a dispute for `arbitrable`. The fee must already be transferred.
    fn create_dispute(env: Env, arbitrable: Address, choices: u32, extra_data: Bytes) -> u64;

    /// Cost of appealing the current ruling of `dispute_id`.
    fn appeal_cost(env: Env, dispute_id: u64, extra_data: Bytes) -> i128;

    /// Escalate `dispute_id`. The fee must already be transferred.
    fn appeal(env: Env, dispute_id: u64, extra_data: Bytes);

    /// `(start, end)` of the current appeal window, `(0, 0)` when not appealable.
    fn appeal_period(env: Env, dispute_id: u64) -> (u64, u64);

    /// Ruling currently standing for `dispute_id`.
    fn current_ruling(env: Env, dispute_id: u64) -> u32;
}

/// Adapter around the configured arbitrator.
pub struct ArbitrationBridge<'a> {
    env: &'a Env,
    config: &'a Config,
    client: ArbitratorClient<'a>,
}

impl<'a> ArbitrationBridge<'a> {
    pub fn new(env: &'a Env, config: &'a Config) -> Self {
        Self {
            env,
            config,
            client: ArbitratorClient::new(env, &config.arbitrator),
        }
    }

    pub fn dispute_cost(&self) -> i128 {
        self.client.arbitration_cost(&self.config.arbitrator_extra_data)
    }

    /// Pay `cost` and open a dispute. Returns the arbitrator's dispute ID.
    pub fn create_dispute(&self, cost: i128) -> u64 {
        self.pay(cost);
        self.client.create_dispute(
            &self.env.current_contract_address(),
            &RULING_OPTIONS,
            &self.config.arbitrator_extra_data,
        )
    }

    pub fn appeal_cost(&self, dispute_id: u64) -> i128 {
        self.client
            .appeal_cost(&dispute_id, &self.config.arbitrator_extra_data)
    }

    /// Pay `cost` and escalate the dispute.
    pub fn request_appeal(&self, dispute_id: u64, cost: i128) {
        self.pay(cost);
        self.client
            .appeal(&dispute_id, &self.config.arbitrator_extra_data);
    }

    /// Open appeal window. Fails with `NotAppealable` when there is none.
    pub fn appeal_period(&self, dispute_id: u64) -> Result<(u64, u64), Error> {
        let (start, end) = self.client.appeal_period(&dispute_id);
        if end <= start {
            return Err(Error::NotAppealable);
        }
        Ok((start, end))
    }

    pub fn current_ruling(&self, dispute_id: u64) -> Result<Ruling, Error> {
        Ruling::from_u32(self.client.current_ruling(&dispute_id)).ok_or(Error::InvalidRuling)
    }

    fn pay(&self, amount: i128) {
        if amount > 0 {
            token::Client::new(self.env, &self.config.token).transfer(
                &self.env.current_contract_address(),
                &self.config.arbitrator,
                &amount,
            );
        }
    }
}
