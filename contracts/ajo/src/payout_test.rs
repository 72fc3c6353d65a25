use soroban_sdk::{testutils::Address as _, Address};

use crate::events::{TOPIC_GROUP_COMPLETED, TOPIC_PAYOUT_RECEIVED};
use crate::storage;
use crate::test::{
    count_events, count_transactions, create_active_group, create_filled_group, pay, pay_cycle,
    pay_deposits, params, setup_env, START,
};
use crate::types::*;
use crate::ContractError;

// ─── Payout amounts ─────────────────────────────────────────────────

#[test]
fn test_full_cycle_pays_position_one() {
    let ctx = setup_env();
    let (group_id, members) = create_active_group(&ctx, 5);

    pay_cycle(&ctx, group_id, &members, 1);

    // The final payment settled the cycle.
    assert_eq!(count_events(&ctx.env, TOPIC_PAYOUT_RECEIVED), 1);

    let payout = ctx.client.get_payout(&group_id, &1);
    assert_eq!(payout.recipient, members.get(0).unwrap());
    assert_eq!(payout.gross, 50_000);
    assert_eq!(payout.service_fee, 5_000);
    assert_eq!(payout.amount, 45_000);
    assert_eq!(payout.status, PayoutStatus::Completed);

    let transaction = ctx.client.get_transaction(&payout.transaction_id).unwrap();
    assert_eq!(transaction.kind, TransactionKind::PayoutDisbursement);
    assert_eq!(transaction.amount, 45_000);

    let group = ctx.client.get_group(&group_id);
    assert_eq!(group.current_cycle, 2);
    assert_eq!(ctx.client.get_cycle_contributions(&group_id, &2).len(), 5);
    assert!(ctx.client.get_member(&group_id, &members.get(0).unwrap()).received_payout);
}

#[test]
fn test_payout_fee_matches_ledger_rows() {
    let ctx = setup_env();
    let mut group_params = params(&ctx.env, 3, 0);
    group_params.contribution_amount = 3_333;
    group_params.service_fee_bps = Some(1_250);
    let (group_id, members) = create_filled_group(&ctx, group_params);

    pay_cycle(&ctx, group_id, &members, 1);

    // Each row rounds 416.625 up to 417; the payout keeps exactly those fees.
    let mut row_fees = 0i128;
    for contribution in ctx.client.get_cycle_contributions(&group_id, &1).iter() {
        assert_eq!(contribution.service_fee, 417);
        row_fees += contribution.service_fee;
    }

    let payout = ctx.client.get_payout(&group_id, &1);
    assert_eq!(payout.gross, 9_999);
    assert_eq!(payout.service_fee, row_fees);
    assert_eq!(payout.service_fee, 1_251);
    assert_eq!(payout.amount, 8_748);
    assert_eq!(payout.service_fee + payout.amount, payout.gross);
}

#[test]
fn test_waived_contribution_counts_toward_pool() {
    let ctx = setup_env();
    let (group_id, members) = create_active_group(&ctx, 3);
    let organizer = members.get(0).unwrap();

    pay(&ctx, group_id, &members.get(0).unwrap(), 1);
    pay(&ctx, group_id, &members.get(1).unwrap(), 1);

    let waived = ctx
        .client
        .get_member_contribution(&group_id, &1, &members.get(2).unwrap());
    let record = ctx.client.waive_contribution(&organizer, &waived.id);
    assert_eq!(record.status, ContributionStatus::Waived);

    let payout = ctx.client.get_payout(&group_id, &1);
    assert_eq!(payout.gross, 30_000);
    assert_eq!(payout.amount, 27_000);

    assert_eq!(
        ctx.client.try_waive_contribution(&organizer, &waived.id),
        Err(Ok(ContractError::ContributionNotOpen))
    );
}

#[test]
fn test_preview_payout() {
    let ctx = setup_env();
    let (group_id, members) = create_active_group(&ctx, 3);

    pay(&ctx, group_id, &members.get(0).unwrap(), 1);
    pay(&ctx, group_id, &members.get(1).unwrap(), 1);

    let preview = ctx.client.preview_payout(&group_id, &1);
    assert_eq!(preview.gross, 20_000);
    assert_eq!(preview.service_fee, 2_000);
    assert_eq!(preview.amount, 18_000);
    assert_eq!(preview.recipient, Some(members.get(0).unwrap()));

    // Previewing writes nothing.
    assert_eq!(
        ctx.client.try_get_payout(&group_id, &1),
        Err(Ok(ContractError::PayoutNotFound))
    );
}

// ─── Exactly-once ───────────────────────────────────────────────────

#[test]
fn test_incomplete_cycle_cannot_pay_out() {
    let ctx = setup_env();
    let (group_id, members) = create_active_group(&ctx, 3);

    pay(&ctx, group_id, &members.get(0).unwrap(), 1);

    assert!(!ctx.client.is_cycle_complete(&group_id, &1));
    assert_eq!(
        ctx.client.try_process_cycle_payout(&group_id, &1),
        Err(Ok(ContractError::CycleNotComplete))
    );
    assert_eq!(ctx.client.get_group(&group_id).current_cycle, 1);
}

#[test]
fn test_second_payout_for_cycle_is_noop() {
    let ctx = setup_env();
    let (group_id, members) = create_active_group(&ctx, 3);

    pay_cycle(&ctx, group_id, &members, 1);
    assert!(ctx.client.is_cycle_complete(&group_id, &1));

    assert_eq!(ctx.client.process_cycle_payout(&group_id, &1), None);
    assert_eq!(count_events(&ctx.env, TOPIC_PAYOUT_RECEIVED), 0);

    assert_eq!(
        count_transactions(&ctx, group_id, TransactionKind::PayoutDisbursement),
        1
    );
    assert_eq!(ctx.client.get_group(&group_id).current_cycle, 2);
}

#[test]
fn test_next_recipient_before_activation() {
    let ctx = setup_env();
    let organizer = Address::generate(&ctx.env);
    let group_id = ctx.client.create_group(&organizer, &params(&ctx.env, 3, 0));

    assert_eq!(ctx.client.next_recipient(&group_id), None);
}

#[test]
fn test_full_rotation_pays_every_member_once() {
    let ctx = setup_env();
    let (group_id, members) = create_active_group(&ctx, 3);

    for cycle in 1..=3u32 {
        assert_eq!(
            ctx.client.next_recipient(&group_id),
            Some(members.get(cycle - 1).unwrap())
        );
        pay_cycle(&ctx, group_id, &members, cycle);

        let payout = ctx.client.get_payout(&group_id, &cycle);
        assert_eq!(payout.recipient, members.get(cycle - 1).unwrap());
        assert_eq!(payout.amount, 27_000);
    }

    assert_eq!(count_events(&ctx.env, TOPIC_GROUP_COMPLETED), 1);

    let group = ctx.client.get_group(&group_id);
    assert_eq!(group.status, GroupStatus::Completed);
    assert_eq!(group.current_cycle, 3);
    for member in ctx.client.get_members(&group_id).iter() {
        assert!(member.received_payout);
    }
    assert_eq!(ctx.client.get_cycle_contributions(&group_id, &4).len(), 0);
    assert_eq!(
        count_transactions(&ctx, group_id, TransactionKind::PayoutDisbursement),
        3
    );
}

#[test]
fn test_next_cycle_keeps_calendar() {
    let ctx = setup_env();
    let (group_id, members) = create_active_group(&ctx, 2);
    let week = Frequency::Weekly.seconds();

    pay_cycle(&ctx, group_id, &members, 1);

    let group = ctx.client.get_group(&group_id);
    assert_eq!(group.cycle_started_at, START + week);
    let next = ctx
        .client
        .get_member_contribution(&group_id, &2, &members.get(0).unwrap());
    assert_eq!(next.due_date, START + 2 * week);
}

// ─── Removal ────────────────────────────────────────────────────────

#[test]
fn test_removed_member_leaves_rotation() {
    let ctx = setup_env();
    let (group_id, members) = create_filled_group(&ctx, params(&ctx.env, 3, 1_000));
    pay_deposits(&ctx, group_id, &members);
    assert_eq!(ctx.client.get_group(&group_id).status, GroupStatus::Active);

    let organizer = members.get(0).unwrap();
    let leaver = members.get(1).unwrap();
    let last = members.get(2).unwrap();
    ctx.client.remove_member(&organizer, &group_id, &leaver);

    pay(&ctx, group_id, &organizer, 1);
    pay(&ctx, group_id, &last, 1);

    let first = ctx.client.get_payout(&group_id, &1);
    assert_eq!(first.recipient, organizer);
    assert_eq!(first.gross, 20_000);

    // Only the remaining members owe cycle 2, and the rotation skips position 2.
    assert_eq!(ctx.client.get_cycle_contributions(&group_id, &2).len(), 2);
    assert_eq!(ctx.client.next_recipient(&group_id), Some(last.clone()));

    pay(&ctx, group_id, &organizer, 2);
    pay(&ctx, group_id, &last, 2);

    assert_eq!(ctx.client.get_payout(&group_id, &2).recipient, last);
    assert_eq!(ctx.client.get_group(&group_id).status, GroupStatus::Completed);
}

#[test]
fn test_removal_after_everyone_left_was_paid_completes_group() {
    let ctx = setup_env();
    let (group_id, members) = create_filled_group(&ctx, params(&ctx.env, 3, 1_000));
    pay_deposits(&ctx, group_id, &members);
    let organizer = members.get(0).unwrap();

    pay_cycle(&ctx, group_id, &members, 1);
    pay_cycle(&ctx, group_id, &members, 2);

    // Positions 1 and 2 are paid; position 3 is removed with cycle 3 fully paid
    // by the others, so there is nobody left to pay.
    pay(&ctx, group_id, &members.get(0).unwrap(), 3);
    pay(&ctx, group_id, &members.get(1).unwrap(), 3);
    ctx.client
        .remove_member(&organizer, &group_id, &members.get(2).unwrap());

    assert_eq!(ctx.client.get_group(&group_id).status, GroupStatus::Completed);
    assert_eq!(
        ctx.client.try_get_payout(&group_id, &3),
        Err(Ok(ContractError::PayoutNotFound))
    );
}

// ─── Integrity ──────────────────────────────────────────────────────

#[test]
fn test_duplicate_rotation_position_aborts_payout() {
    let ctx = setup_env();
    let (group_id, members) = create_active_group(&ctx, 3);
    let clashing = members.get(1).unwrap();

    ctx.env.as_contract(&ctx.contract_id, || {
        let mut member = storage::get_member(&ctx.env, group_id, &clashing).unwrap();
        member.position = 1;
        storage::set_member(&ctx.env, &member);
    });

    assert_eq!(
        ctx.client.try_next_recipient(&group_id),
        Err(Ok(ContractError::DuplicateRotationPosition))
    );

    pay(&ctx, group_id, &members.get(0).unwrap(), 1);
    pay(&ctx, group_id, &members.get(1).unwrap(), 1);

    // The completing payment fails as a whole, so its contribution stays open.
    let last = members.get(2).unwrap();
    let contribution = ctx.client.get_member_contribution(&group_id, &1, &last);
    let event = crate::test::contribution_event(
        &ctx,
        group_id,
        &last,
        contribution.id,
        contribution.amount_due,
        "clash",
    );
    assert_eq!(
        ctx.client.try_confirm_payment(&ctx.gateway, &event),
        Err(Ok(ContractError::DuplicateRotationPosition))
    );
    assert_eq!(
        ctx.client.get_contribution(&contribution.id).status,
        ContributionStatus::Pending
    );
    assert_eq!(
        ctx.client.try_get_payout(&group_id, &1),
        Err(Ok(ContractError::PayoutNotFound))
    );
}
