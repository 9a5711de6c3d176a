//! # Price conversion
//!
//! Tasks may be priced in any token. Deposits, appeal fees and arbitration
//! costs are always paid in the settlement token, so a translator's stake on
//! a task priced elsewhere is computed from the price converted through the
//! configured [`PriceOracle`].
//!
//! A task priced in the settlement token never touches the oracle.

use soroban_sdk::{contractclient, Address, Env};

use crate::types::Config;
use crate::Error;

/// Interface a price source must expose.
#[allow(dead_code)]
#[contractclient(name = "PriceOracleClient")]
pub trait PriceOracle {
    /// Value of `amount` units of `base` expressed in units of `quote`.
    fn quote(env: Env, base: Address, quote: Address, amount: i128) -> i128;
}

/// Converts task-token amounts into the settlement token.
pub struct PriceConverter<'a> {
    env: &'a Env,
    config: &'a Config,
}

impl<'a> PriceConverter<'a> {
    pub fn new(env: &'a Env, config: &'a Config) -> Self {
        Self { env, config }
    }

    /// Whether tasks priced in `token` can have their deposits computed.
    pub fn supports(&self, token: &Address) -> bool {
        *token == self.config.token || self.config.price_oracle.is_some()
    }

    /// `amount` of `token` in settlement-token units.
    pub fn to_settlement(&self, token: &Address, amount: i128) -> Result<i128, Error> {
        if amount == 0 || *token == self.config.token {
            return Ok(amount);
        }
        let oracle = self
            .config
            .price_oracle
            .as_ref()
            .ok_or(Error::PriceUnavailable)?;
        let value = PriceOracleClient::new(self.env, oracle).quote(token, &self.config.token, &amount);
        if value < 0 {
            return Err(Error::PriceUnavailable);
        }
        Ok(value)
    }
}
