extern crate std;

use soroban_sdk::{testutils::Address as _, token, Address, String};

use crate::mock_oracle::{MockOracle, MockOracleClient, RATE_SCALE};
use crate::test::{
    Setup, ARBITRATION_FEE, MAX_PRICE, MIN_PRICE, PRICE, REVIEW_TIMEOUT, STARTING_BALANCE,
    SUBMISSION_WINDOW, UNIT,
};
use crate::{Error, FinalRuling, Ruling, TaskStatus, NOT_PAYABLE_VALUE};

// One task token is worth two settlement tokens.
const RATE: i128 = 2 * RATE_SCALE;
const SETTLED_PRICE: i128 = 2 * PRICE;
const TRANSLATOR_DEPOSIT: i128 = ARBITRATION_FEE + SETTLED_PRICE / 10;
const CHALLENGER_DEPOSIT: i128 = ARBITRATION_FEE + SETTLED_PRICE / 5;

fn with_oracle(s: &Setup) -> MockOracleClient<'static> {
    let oracle_id = s.env.register(MockOracle, ());
    let oracle = MockOracleClient::new(&s.env, &oracle_id);
    oracle.set_rate(&RATE);
    s.client.change_price_oracle(&s.governor, &Some(oracle_id));
    oracle
}

/// A second token, held by the requester only.
fn task_token(s: &Setup) -> token::Client<'static> {
    let admin = Address::generate(&s.env);
    let token_id = s.env.register_stellar_asset_contract_v2(admin).address();
    token::StellarAssetClient::new(&s.env, &token_id).mint(&s.requester, &STARTING_BALANCE);
    token::Client::new(&s.env, &token_id)
}

fn setup() -> (Setup, token::Client<'static>) {
    let s = Setup::new();
    with_oracle(&s);
    let token = task_token(&s);
    (s, token)
}

#[test]
fn test_task_escrows_price_in_its_token() {
    let (s, task_token) = setup();
    let (task_id, task) = s.create_task_in(&task_token.address);

    assert_eq!(task.token, task_token.address);
    assert_eq!(task_token.balance(&s.requester), STARTING_BALANCE - MAX_PRICE);
    assert_eq!(task_token.balance(&s.client.address), MAX_PRICE);
    assert_eq!(s.balance(&s.requester), STARTING_BALANCE);

    s.set_time(task.last_interaction + SUBMISSION_WINDOW / 2);
    assert_eq!(s.client.get_task_price(&task_id, &task), PRICE);
    assert_eq!(s.client.get_task_price_in_settlement(&task_id, &task), SETTLED_PRICE);
    assert_eq!(s.client.get_translator_deposit(&task_id, &task), TRANSLATOR_DEPOSIT);
}

#[test]
fn test_converted_price_is_zero_once_assigned() {
    let (s, task_token) = setup();
    let (task_id, task) = s.create_task_in(&task_token.address);
    let task = s.assign(task_id, &task);

    assert_eq!(s.client.get_task_price_in_settlement(&task_id, &task), 0);
    assert_eq!(s.client.get_translator_deposit(&task_id, &task), NOT_PAYABLE_VALUE);
}

#[test]
fn test_deposit_follows_oracle_rate() {
    let s = Setup::new();
    let oracle = with_oracle(&s);
    let task_token = task_token(&s);
    let (task_id, task) = s.create_task_in(&task_token.address);
    s.set_time(task.last_interaction + SUBMISSION_WINDOW / 2);

    oracle.set_rate(&(RATE_SCALE / 2));
    assert_eq!(
        s.client.get_translator_deposit(&task_id, &task),
        ARBITRATION_FEE + PRICE / 2 / 10
    );
}

#[test]
fn test_assignment_stakes_settlement_and_refunds_task_token() {
    let (s, task_token) = setup();
    let (task_id, task) = s.create_task_in(&task_token.address);
    let task = s.assign(task_id, &task);

    assert_eq!(task.status, TaskStatus::Assigned);
    assert_eq!(task.requester_deposit, PRICE);
    assert_eq!(task.sum_deposit, TRANSLATOR_DEPOSIT);
    assert_eq!(task_token.balance(&s.requester), STARTING_BALANCE - PRICE);
    assert_eq!(s.balance(&s.translator), STARTING_BALANCE - TRANSLATOR_DEPOSIT);
    assert_eq!(task_token.balance(&s.client.address), PRICE);
    assert_eq!(s.balance(&s.client.address), TRANSLATOR_DEPOSIT);
}

#[test]
fn test_challenge_stakes_converted_price() {
    let (s, task_token) = setup();
    let (task_id, task) = s.create_task_in(&task_token.address);
    let task = s.assign(task_id, &task);
    let task = s.submit(task_id, &task);

    assert_eq!(s.client.get_challenger_deposit(&task_id, &task), CHALLENGER_DEPOSIT);
    let task = s.challenge(task_id, &task);
    assert_eq!(task.sum_deposit, TRANSLATOR_DEPOSIT + CHALLENGER_DEPOSIT - ARBITRATION_FEE);
    assert_eq!(s.balance(&s.challenger), STARTING_BALANCE - CHALLENGER_DEPOSIT);
}

#[test]
fn test_reimbursement_returns_escrow_and_forfeited_deposit() {
    let (s, task_token) = setup();
    let (task_id, task) = s.create_task_in(&task_token.address);
    let task = s.assign(task_id, &task);

    s.set_time(task.submission_deadline);
    let task = s.client.reimburse_requester(&task_id, &task);

    assert_eq!(task.status, TaskStatus::Resolved);
    assert_eq!(task_token.balance(&s.requester), STARTING_BALANCE);
    assert_eq!(s.balance(&s.requester), STARTING_BALANCE + TRANSLATOR_DEPOSIT);
    assert_eq!(s.balance(&s.translator), STARTING_BALANCE - TRANSLATOR_DEPOSIT);
    assert_eq!(task_token.balance(&s.client.address), 0);
    assert_eq!(s.balance(&s.client.address), 0);
}

#[test]
fn test_acceptance_pays_price_in_task_token() {
    let (s, task_token) = setup();
    let (task_id, task) = s.create_task_in(&task_token.address);
    let task = s.assign(task_id, &task);
    let task = s.submit(task_id, &task);

    s.set_time(task.last_interaction + REVIEW_TIMEOUT);
    s.client.accept_translation(&task_id, &task);

    assert_eq!(task_token.balance(&s.translator), PRICE);
    assert_eq!(s.balance(&s.translator), STARTING_BALANCE);
    assert_eq!(task_token.balance(&s.requester), STARTING_BALANCE - PRICE);
    assert_eq!(task_token.balance(&s.client.address), 0);
    assert_eq!(s.balance(&s.client.address), 0);
}

#[test]
fn test_ruling_for_translator_pays_both_tokens() {
    let (s, task_token) = setup();
    let (task_id, task) = s.create_task_in(&task_token.address);
    let task = s.assign(task_id, &task);
    let task = s.submit(task_id, &task);
    let task = s.challenge(task_id, &task);
    let task = s.resolve(task_id, &task, Ruling::FavorTranslator);

    assert_eq!(task.ruling, FinalRuling::Ruled(Ruling::FavorTranslator));
    assert_eq!(task_token.balance(&s.translator), PRICE);
    assert_eq!(
        s.balance(&s.translator),
        STARTING_BALANCE + CHALLENGER_DEPOSIT - ARBITRATION_FEE
    );
    assert_eq!(s.balance(&s.challenger), STARTING_BALANCE - CHALLENGER_DEPOSIT);
    assert_eq!(task_token.balance(&s.client.address), 0);
    assert_eq!(s.balance(&s.client.address), 0);
}

#[test]
fn test_ruling_for_challenger_returns_task_tokens() {
    let (s, task_token) = setup();
    let (task_id, task) = s.create_task_in(&task_token.address);
    let task = s.assign(task_id, &task);
    let task = s.submit(task_id, &task);
    let task = s.challenge(task_id, &task);
    s.resolve(task_id, &task, Ruling::FavorChallenger);

    assert_eq!(task_token.balance(&s.requester), STARTING_BALANCE);
    assert_eq!(task_token.balance(&s.challenger), 0);
    assert_eq!(
        s.balance(&s.challenger),
        STARTING_BALANCE + TRANSLATOR_DEPOSIT - ARBITRATION_FEE
    );
    assert_eq!(s.balance(&s.translator), STARTING_BALANCE - TRANSLATOR_DEPOSIT);
    assert_eq!(task_token.balance(&s.client.address), 0);
    assert_eq!(s.balance(&s.client.address), 0);
}

#[test]
fn test_refusal_returns_task_tokens_and_splits_pool() {
    let (s, task_token) = setup();
    let (task_id, task) = s.create_task_in(&task_token.address);
    let task = s.assign(task_id, &task);
    let task = s.submit(task_id, &task);
    let task = s.challenge(task_id, &task);
    let pool = task.sum_deposit;
    s.resolve(task_id, &task, Ruling::RefusedToRule);

    assert_eq!(task_token.balance(&s.requester), STARTING_BALANCE);
    assert_eq!(
        s.balance(&s.translator),
        STARTING_BALANCE - TRANSLATOR_DEPOSIT + pool / 2
    );
    assert_eq!(
        s.balance(&s.challenger),
        STARTING_BALANCE - CHALLENGER_DEPOSIT + pool - pool / 2
    );
    assert_eq!(s.balance(&s.client.address), 0);
}

#[test]
fn test_foreign_token_requires_oracle() {
    let s = Setup::new();
    let task_token = task_token(&s);
    let deadline = s.now() + SUBMISSION_WINDOW;

    let result = s.client.try_create_task(
        &s.requester,
        &deadline,
        &task_token.address,
        &MIN_PRICE,
        &MAX_PRICE,
        &String::from_str(&s.env, ""),
    );
    assert_eq!(result, Err(Ok(Error::PriceUnavailable)));
    assert_eq!(s.client.task_count(), 0);
    assert_eq!(task_token.balance(&s.requester), STARTING_BALANCE);
}

#[test]
fn test_removed_oracle_blocks_assignment() {
    let (s, task_token) = setup();
    let (task_id, task) = s.create_task_in(&task_token.address);
    s.client.change_price_oracle(&s.governor, &None);
    s.set_time(task.last_interaction + SUBMISSION_WINDOW / 2);

    assert_eq!(
        s.client.try_get_translator_deposit(&task_id, &task),
        Err(Ok(Error::PriceUnavailable))
    );
    assert_eq!(
        s.client
            .try_assign_task(&task_id, &task, &s.translator, &(10 * UNIT)),
        Err(Ok(Error::PriceUnavailable))
    );

    // Past the deadline the escrow still comes back without a quote.
    s.set_time(task.submission_deadline);
    s.client.reimburse_requester(&task_id, &task);
    assert_eq!(task_token.balance(&s.requester), STARTING_BALANCE);
}

#[test]
fn test_only_governor_sets_oracle() {
    let s = Setup::new();
    let stranger = Address::generate(&s.env);

    assert_eq!(
        s.client.try_change_price_oracle(&stranger, &None),
        Err(Ok(Error::NotGovernor))
    );
    assert_eq!(s.client.get_config().price_oracle, None);
}
