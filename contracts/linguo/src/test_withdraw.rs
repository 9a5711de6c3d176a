extern crate std;

use soroban_sdk::Address;

use crate::test::{Setup, ARBITRATION_FEE, STARTING_BALANCE, UNIT};
use crate::{Error, FinalRuling, Party, Ruling, Task};

const WINNER_FEE: i128 = ARBITRATION_FEE + ARBITRATION_FEE * 3 / 10;
const LOSER_FEE: i128 = ARBITRATION_FEE + ARBITRATION_FEE * 7 / 10;
const SHARED_FEE: i128 = ARBITRATION_FEE + ARBITRATION_FEE / 2;

fn fund(s: &Setup, task_id: u64, task: &Task, side: Party, who: &Address, amount: i128) -> i128 {
    s.client.fund_appeal(&task_id, task, &side, who, &amount)
}

/// Final ruling with an unfunded last round, then settlement.
fn finish(s: &Setup, task_id: u64, task: &Task, ruling: Ruling) -> Task {
    let dispute_id = task.dispute_id.unwrap();
    s.give_ruling(dispute_id, ruling);
    s.finalize_ruling(dispute_id);
    s.client.execute_ruling(&task_id, task)
}

#[test]
fn test_withdraw_requires_resolution() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    let backer = s.user();

    let result = s
        .client
        .try_withdraw_fees_and_rewards(&backer, &task_id, &task, &0);
    assert_eq!(result, Err(Ok(Error::TaskNotResolved)));
    assert_eq!(
        s.client.get_withdrawable_amount(&task_id, &task, &backer, &0),
        0
    );
}

#[test]
fn test_withdraw_unknown_round_fails() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    let task = finish(&s, task_id, &task, Ruling::FavorTranslator);
    let backer = s.user();

    let result = s
        .client
        .try_withdraw_fees_and_rewards(&backer, &task_id, &task, &5);
    assert_eq!(result, Err(Ok(Error::RoundNotFound)));
}

#[test]
fn test_refusal_splits_rewards_evenly() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    let dispute_id = task.dispute_id.unwrap();
    let translator_backer = s.user();
    let challenger_backer = s.user();

    s.give_ruling(dispute_id, Ruling::RefusedToRule);
    fund(&s, task_id, &task, Party::Translator, &translator_backer, SHARED_FEE);
    fund(&s, task_id, &task, Party::Challenger, &challenger_backer, SHARED_FEE);

    let task = finish(&s, task_id, &task, Ruling::RefusedToRule);

    // Each side recovers half of what was paid beyond the appeal cost.
    let half = (2 * SHARED_FEE - ARBITRATION_FEE) / 2;
    for backer in [&translator_backer, &challenger_backer] {
        assert_eq!(
            s.client.get_withdrawable_amount(&task_id, &task, backer, &0),
            half
        );
        let paid = s
            .client
            .withdraw_fees_and_rewards(backer, &task_id, &task, &0);
        assert_eq!(paid, half);
        assert_eq!(s.balance(backer), STARTING_BALANCE - SHARED_FEE + half);
    }
}

#[test]
fn test_winners_share_rewards_pro_rata() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    let dispute_id = task.dispute_id.unwrap();
    let first = s.user();
    let second = s.user();
    let loser_backer = s.user();

    s.give_ruling(dispute_id, Ruling::FavorTranslator);
    fund(&s, task_id, &task, Party::Translator, &first, WINNER_FEE / 2);
    fund(&s, task_id, &task, Party::Translator, &second, WINNER_FEE);
    fund(&s, task_id, &task, Party::Challenger, &loser_backer, LOSER_FEE);

    let task = finish(&s, task_id, &task, Ruling::FavorTranslator);

    let rewards = WINNER_FEE + LOSER_FEE - ARBITRATION_FEE;
    let first_share = (WINNER_FEE / 2) * rewards / WINNER_FEE;
    let second_share = (WINNER_FEE - WINNER_FEE / 2) * rewards / WINNER_FEE;

    assert_eq!(
        s.client.withdraw_fees_and_rewards(&first, &task_id, &task, &0),
        first_share
    );
    assert_eq!(
        s.client.withdraw_fees_and_rewards(&second, &task_id, &task, &0),
        second_share
    );
    assert_eq!(
        s.client
            .withdraw_fees_and_rewards(&loser_backer, &task_id, &task, &0),
        0
    );
    assert_eq!(s.balance(&loser_backer), STARTING_BALANCE - LOSER_FEE);
}

#[test]
fn test_withdraw_is_idempotent() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    let dispute_id = task.dispute_id.unwrap();
    let backer = s.user();
    let other = s.user();

    s.give_ruling(dispute_id, Ruling::FavorChallenger);
    fund(&s, task_id, &task, Party::Challenger, &backer, WINNER_FEE);
    fund(&s, task_id, &task, Party::Translator, &other, LOSER_FEE);
    let task = finish(&s, task_id, &task, Ruling::FavorChallenger);

    let first = s
        .client
        .withdraw_fees_and_rewards(&backer, &task_id, &task, &0);
    let balance = s.balance(&backer);
    let second = s
        .client
        .withdraw_fees_and_rewards(&backer, &task_id, &task, &0);

    assert!(first > 0);
    assert_eq!(second, 0);
    assert_eq!(s.balance(&backer), balance);
    assert_eq!(s.client.amount_withdrawable(&task_id, &task, &backer), 0);
}

#[test]
fn test_unfunded_round_is_reimbursed() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    let dispute_id = task.dispute_id.unwrap();
    let backer = s.user();

    s.give_ruling(dispute_id, Ruling::FavorTranslator);
    fund(&s, task_id, &task, Party::Challenger, &backer, UNIT / 2);
    s.finalize_ruling(dispute_id);
    let task = s.client.execute_ruling(&task_id, &task);

    // A partial contribution does not override the ruling.
    assert_eq!(task.ruling, FinalRuling::Ruled(Ruling::FavorTranslator));
    assert_eq!(
        s.client
            .withdraw_fees_and_rewards(&backer, &task_id, &task, &0),
        UNIT / 2
    );
    assert_eq!(s.balance(&backer), STARTING_BALANCE);
}

#[test]
fn test_batch_withdraw_matches_per_round_amounts() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    let dispute_id = task.dispute_id.unwrap();
    let backer = s.user();
    let opponent = s.user();

    // Two fully funded rounds.
    for _ in 0..2 {
        s.give_ruling(dispute_id, Ruling::FavorTranslator);
        fund(&s, task_id, &task, Party::Translator, &backer, WINNER_FEE);
        fund(&s, task_id, &task, Party::Challenger, &opponent, LOSER_FEE);
    }
    // A partially funded last round.
    s.give_ruling(dispute_id, Ruling::FavorTranslator);
    fund(&s, task_id, &task, Party::Translator, &backer, UNIT / 2);
    s.finalize_ruling(dispute_id);
    let task = s.client.execute_ruling(&task_id, &task);

    assert_eq!(s.client.get_number_of_rounds(&task_id), 3);

    let per_round: i128 = (0..3)
        .map(|round| {
            s.client
                .get_withdrawable_amount(&task_id, &task, &backer, &round)
        })
        .sum();
    assert_eq!(per_round, 2 * (WINNER_FEE + LOSER_FEE - ARBITRATION_FEE) + UNIT / 2);
    assert_eq!(s.client.amount_withdrawable(&task_id, &task, &backer), per_round);

    let before = s.balance(&backer);
    let paid = s
        .client
        .batch_round_withdraw(&backer, &task_id, &task, &0, &10);

    assert_eq!(paid, per_round);
    assert_eq!(s.balance(&backer) - before, per_round);
    assert_eq!(s.client.amount_withdrawable(&task_id, &task, &backer), 0);
    assert_eq!(
        s.client
            .batch_round_withdraw(&opponent, &task_id, &task, &0, &10),
        0
    );
}

#[test]
fn test_batch_withdraw_respects_range() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    let dispute_id = task.dispute_id.unwrap();
    let backer = s.user();
    let opponent = s.user();

    s.give_ruling(dispute_id, Ruling::FavorTranslator);
    fund(&s, task_id, &task, Party::Translator, &backer, WINNER_FEE);
    fund(&s, task_id, &task, Party::Challenger, &opponent, LOSER_FEE);
    s.give_ruling(dispute_id, Ruling::FavorTranslator);
    fund(&s, task_id, &task, Party::Translator, &backer, UNIT);
    s.finalize_ruling(dispute_id);
    let task = s.client.execute_ruling(&task_id, &task);

    assert_eq!(
        s.client.batch_round_withdraw(&backer, &task_id, &task, &1, &0),
        0
    );
    assert_eq!(
        s.client.batch_round_withdraw(&backer, &task_id, &task, &1, &1),
        UNIT
    );
    assert_eq!(
        s.client.batch_round_withdraw(&backer, &task_id, &task, &0, &0),
        WINNER_FEE + LOSER_FEE - ARBITRATION_FEE
    );
}
