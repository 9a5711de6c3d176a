//! # Pricing
//!
//! Time-dependent task price and the deposits derived from it. Everything
//! here is a pure function of the task, the configured multipliers, the
//! arbitration cost and the ledger clock.
//!
//! ```text
//! price(now) = min + (max - min) * (now - created) / (deadline - created)
//! ```
//!
//! The multiplication happens before the division so the only rounding is a
//! single floor at the end.
//!
//! Prices are in the task's own token while deposits are in the settlement
//! token; the deposit functions take the conversion as a closure so they stay
//! independent of where quotes come from.

use crate::types::{Task, TaskStatus, MULTIPLIER_DIVISOR, NOT_PAYABLE_VALUE};
use crate::Error;

/// `a * b / c`, failing instead of wrapping.
pub fn mul_div(a: i128, b: i128, c: i128) -> Result<i128, Error> {
    a.checked_mul(b)
        .and_then(|product| product.checked_div(c))
        .ok_or(Error::ArithmeticOverflow)
}

/// `base + base * multiplier / MULTIPLIER_DIVISOR`.
pub fn apply_multiplier(base: i128, amount: i128, multiplier: u32) -> Result<i128, Error> {
    let stake = mul_div(amount, i128::from(multiplier), MULTIPLIER_DIVISOR)?;
    base.checked_add(stake).ok_or(Error::ArithmeticOverflow)
}

/// Current price of a task. Zero once the task left `Created` or the
/// submission deadline has been reached.
pub fn current_price(task: &Task, now: u64) -> Result<i128, Error> {
    if task.status != TaskStatus::Created || now >= task.submission_deadline {
        return Ok(0);
    }

    let elapsed = now.saturating_sub(task.last_interaction);
    let window = task.submission_deadline - task.last_interaction;
    let spread = task
        .max_price
        .checked_sub(task.min_price)
        .ok_or(Error::ArithmeticOverflow)?;

    let increment = mul_div(spread, i128::from(elapsed), i128::from(window))?;
    task.min_price
        .checked_add(increment)
        .ok_or(Error::ArithmeticOverflow)
}

/// Deposit a translator must stake to take the task right now.
///
/// `to_settlement` converts the task-token price into the settlement token.
pub fn translator_deposit<F>(
    task: &Task,
    now: u64,
    arbitration_cost: i128,
    translation_multiplier: u32,
    to_settlement: F,
) -> Result<i128, Error>
where
    F: FnOnce(i128) -> Result<i128, Error>,
{
    if task.status != TaskStatus::Created || now >= task.submission_deadline {
        return Ok(NOT_PAYABLE_VALUE);
    }
    let price = to_settlement(current_price(task, now)?)?;
    apply_multiplier(arbitration_cost, price, translation_multiplier)
}

/// Deposit a challenger must stake. Based on the price locked at assignment.
pub fn challenger_deposit<F>(
    task: &Task,
    now: u64,
    review_timeout: u64,
    arbitration_cost: i128,
    challenge_multiplier: u32,
    to_settlement: F,
) -> Result<i128, Error>
where
    F: FnOnce(i128) -> Result<i128, Error>,
{
    if task.status != TaskStatus::AwaitingReview
        || now >= task.last_interaction.saturating_add(review_timeout)
    {
        return Ok(NOT_PAYABLE_VALUE);
    }
    let price = to_settlement(task.requester_deposit)?;
    apply_multiplier(arbitration_cost, price, challenge_multiplier)
}
