extern crate std;

use soroban_sdk::{
    symbol_short, testutils::Events, vec, Address, Env, IntoVal, String, Symbol, TryFromVal,
    TryIntoVal, Val, Vec,
};

use crate::events::{
    AppealContribution, AppealFeePaid, DisputeCreated, EvidenceSubmitted, FeesWithdrawn,
    MetaEvidence, RulingRecorded, TaskAssigned, TaskCreated, TaskResolved, TranslationChallenged,
    TranslationSubmitted,
};
use crate::test::{Setup, ARBITRATION_FEE, MAX_PRICE, MIN_PRICE, PRICE, UNIT};
use crate::{Party, ResolutionReason, Ruling, Task};

/// Events published by `contract` under `topic`.
fn events_named(env: &Env, contract: &Address, topic: Symbol) -> std::vec::Vec<(Vec<Val>, Val)> {
    env.events()
        .all()
        .iter()
        .filter(|(address, topics, _)| {
            address == contract
                && topics
                    .get(0)
                    .and_then(|first| Symbol::try_from_val(env, &first).ok())
                    == Some(topic.clone())
        })
        .map(|(_, topics, data)| (topics, data))
        .collect()
}

fn last_event(env: &Env, contract: &Address, topic: Symbol) -> (Vec<Val>, Val) {
    events_named(env, contract, topic)
        .pop()
        .expect("No events found")
}

#[test]
fn test_task_created_events() {
    let s = Setup::new();
    let deadline = s.now() + 3_600;
    let task_id = s.client.create_task(
        &s.requester,
        &deadline,
        &s.token.address,
        &MIN_PRICE,
        &MAX_PRICE,
        &String::from_str(&s.env, "ipfs://meta-evidence"),
    );

    let (topics, data) = last_event(&s.env, &s.client.address, symbol_short!("created"));
    let expected_topics = vec![
        &s.env,
        symbol_short!("created").into_val(&s.env),
        task_id.into_val(&s.env),
    ];
    assert_eq!(topics, expected_topics);

    let event_data: TaskCreated = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        TaskCreated {
            task_id,
            requester: s.requester.clone(),
            token: s.token.address.clone(),
            deadline,
            min_price: MIN_PRICE,
            max_price: MAX_PRICE,
        }
    );

    let (_, data) = last_event(&s.env, &s.client.address, symbol_short!("meta_evid"));
    let meta: MetaEvidence = data.try_into_val(&s.env).unwrap();
    assert_eq!(meta.evidence, String::from_str(&s.env, "ipfs://meta-evidence"));

    let (_, data) = last_event(&s.env, &s.client.address, symbol_short!("task_upd"));
    let published: Task = data.try_into_val(&s.env).unwrap();
    assert_eq!(published.requester_deposit, MAX_PRICE);
    assert_eq!(s.client.hash_task_state(&published), s.client.task_hash(&task_id));
}

#[test]
fn test_task_assigned_event() {
    let s = Setup::new();
    let (task_id, task) = s.create_task();
    let task = s.assign(task_id, &task);

    let (topics, data) = last_event(&s.env, &s.client.address, symbol_short!("assigned"));
    assert_eq!(
        topics,
        vec![
            &s.env,
            symbol_short!("assigned").into_val(&s.env),
            task_id.into_val(&s.env),
        ]
    );
    let event_data: TaskAssigned = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        TaskAssigned {
            task_id,
            translator: s.translator.clone(),
            price: PRICE,
        }
    );

    // The published task is the value the caller must hand back next.
    let (_, data) = last_event(&s.env, &s.client.address, symbol_short!("task_upd"));
    let published: Task = data.try_into_val(&s.env).unwrap();
    assert_eq!(published, task);
}

#[test]
fn test_translation_submitted_event() {
    let s = Setup::new();
    let (task_id, _) = s.reviewed_task();

    let (_, data) = last_event(&s.env, &s.client.address, symbol_short!("submitted"));
    let event_data: TranslationSubmitted = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        TranslationSubmitted {
            task_id,
            translator: s.translator.clone(),
            translated_text: String::from_str(&s.env, "ipfs://translation"),
        }
    );
}

#[test]
fn test_challenge_events() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    let dispute_id = task.dispute_id.unwrap();

    let (_, data) = last_event(&s.env, &s.client.address, symbol_short!("challenge"));
    let challenged: TranslationChallenged = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        challenged,
        TranslationChallenged {
            task_id,
            challenger: s.challenger.clone(),
        }
    );

    let (topics, data) = last_event(&s.env, &s.client.address, symbol_short!("dispute"));
    assert_eq!(
        topics,
        vec![
            &s.env,
            symbol_short!("dispute").into_val(&s.env),
            dispute_id.into_val(&s.env),
        ]
    );
    let created: DisputeCreated = data.try_into_val(&s.env).unwrap();
    assert_eq!(created, DisputeCreated { dispute_id, task_id });

    let (_, data) = last_event(&s.env, &s.client.address, symbol_short!("evidence"));
    let evidence: EvidenceSubmitted = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        evidence,
        EvidenceSubmitted {
            task_id,
            party: s.challenger.clone(),
            evidence: String::from_str(&s.env, "ipfs://challenge"),
        }
    );
}

#[test]
fn test_challenge_without_evidence_publishes_none() {
    let s = Setup::new();
    let (task_id, task) = s.reviewed_task();

    s.client.challenge_translation(
        &task_id,
        &task,
        &s.challenger,
        &(10 * MAX_PRICE),
        &String::from_str(&s.env, ""),
    );

    assert!(events_named(&s.env, &s.client.address, symbol_short!("evidence")).is_empty());
    assert_eq!(
        events_named(&s.env, &s.client.address, symbol_short!("challenge")).len(),
        1
    );
}

#[test]
fn test_appeal_funding_events() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    s.give_ruling(task.dispute_id.unwrap(), Ruling::FavorTranslator);
    let backer = s.user();

    s.client
        .fund_appeal(&task_id, &task, &Party::Translator, &backer, &(10 * UNIT));

    let winner_fee = ARBITRATION_FEE + ARBITRATION_FEE * 3 / 10;
    let (_, data) = last_event(&s.env, &s.client.address, symbol_short!("contrib"));
    let contribution: AppealContribution = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        contribution,
        AppealContribution {
            task_id,
            round: 0,
            side: Party::Translator,
            contributor: backer.clone(),
            amount: winner_fee,
        }
    );

    let (_, data) = last_event(&s.env, &s.client.address, symbol_short!("fee_paid"));
    let paid: AppealFeePaid = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        paid,
        AppealFeePaid {
            task_id,
            round: 0,
            side: Party::Translator,
        }
    );
}

#[test]
fn test_partial_funding_has_no_fee_paid_event() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    s.give_ruling(task.dispute_id.unwrap(), Ruling::FavorTranslator);
    let backer = s.user();

    s.client
        .fund_appeal(&task_id, &task, &Party::Translator, &backer, &1);

    assert_eq!(
        events_named(&s.env, &s.client.address, symbol_short!("contrib")).len(),
        1
    );
    assert!(events_named(&s.env, &s.client.address, symbol_short!("fee_paid")).is_empty());
}

#[test]
fn test_ruling_event() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    let dispute_id = task.dispute_id.unwrap();
    s.give_ruling(dispute_id, Ruling::FavorChallenger);
    s.finalize_ruling(dispute_id);

    let (topics, data) = last_event(&s.env, &s.client.address, symbol_short!("ruling"));
    assert_eq!(
        topics,
        vec![
            &s.env,
            symbol_short!("ruling").into_val(&s.env),
            dispute_id.into_val(&s.env),
        ]
    );
    let recorded: RulingRecorded = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        recorded,
        RulingRecorded {
            dispute_id,
            task_id,
            ruling: Ruling::FavorChallenger,
        }
    );
}

#[test]
fn test_resolution_reasons() {
    let s = Setup::new();

    let (task_id, task) = s.create_task();
    s.set_time(task.submission_deadline);
    s.client.reimburse_requester(&task_id, &task);
    let (_, data) = last_event(&s.env, &s.client.address, symbol_short!("resolved"));
    let resolved: TaskResolved = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        resolved,
        TaskResolved {
            task_id,
            reason: ResolutionReason::RequesterReimbursed,
        }
    );

    let (task_id, task) = s.reviewed_task();
    s.set_time(task.last_interaction + s.client.get_config().review_timeout);
    s.client.accept_translation(&task_id, &task);
    let (_, data) = last_event(&s.env, &s.client.address, symbol_short!("resolved"));
    let resolved: TaskResolved = data.try_into_val(&s.env).unwrap();
    assert_eq!(resolved.reason, ResolutionReason::TranslationAccepted);

    let (task_id, task) = s.disputed_task();
    s.resolve(task_id, &task, Ruling::FavorTranslator);
    let (_, data) = last_event(&s.env, &s.client.address, symbol_short!("resolved"));
    let resolved: TaskResolved = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        resolved,
        TaskResolved {
            task_id,
            reason: ResolutionReason::DisputeSettled,
        }
    );
}

#[test]
fn test_fees_withdrawn_event() {
    let s = Setup::new();
    let (task_id, task) = s.disputed_task();
    let dispute_id = task.dispute_id.unwrap();
    s.give_ruling(dispute_id, Ruling::FavorTranslator);
    let backer = s.user();
    s.client
        .fund_appeal(&task_id, &task, &Party::Challenger, &backer, &UNIT);
    s.finalize_ruling(dispute_id);
    let task = s.client.execute_ruling(&task_id, &task);

    s.client
        .withdraw_fees_and_rewards(&backer, &task_id, &task, &0);

    let (_, data) = last_event(&s.env, &s.client.address, symbol_short!("withdrawn"));
    let withdrawn: FeesWithdrawn = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        withdrawn,
        FeesWithdrawn {
            task_id,
            beneficiary: backer,
            amount: UNIT,
        }
    );
}
