use soroban_sdk::{testutils::Address as _, Address, Env};

use crate::events::TOPIC_PENALTY_APPLIED;
use crate::test::{
    advance_time, count_events, count_transactions, create_active_group, create_filled_group,
    pay, pay_deposits, params, reference, setup_env, TestContext, START,
};
use crate::types::*;
use crate::ContractError;

const WEEK: u64 = 7 * DAY_SECONDS;

fn penalty_event(
    ctx: &TestContext,
    group_id: u64,
    member: &Address,
    penalty_id: u64,
    amount: i128,
    tag: &str,
) -> PaymentEvent {
    PaymentEvent {
        reference: reference(&ctx.env, tag),
        amount,
        status: PaymentStatus::Success,
        metadata: PaymentMetadata {
            group_id,
            member: member.clone(),
            contribution_id: None,
            penalty_id: Some(penalty_id),
            kind: PaymentKind::Penalty,
        },
    }
}

fn now(env: &Env) -> u64 {
    use soroban_sdk::testutils::Ledger as _;
    env.ledger().timestamp()
}

/// A weekly group where everyone but the last member has paid cycle 1.
fn group_with_one_late_member(ctx: &TestContext) -> (u64, Address) {
    let (group_id, members) = create_active_group(ctx, 3);
    pay(ctx, group_id, &members.get(0).unwrap(), 1);
    pay(ctx, group_id, &members.get(1).unwrap(), 1);
    (group_id, members.get(2).unwrap())
}

// ─── Assessment ─────────────────────────────────────────────────────

#[test]
fn test_late_contribution_is_charged_once() {
    let ctx = setup_env();
    let (group_id, late) = group_with_one_late_member(&ctx);

    // Three days past the weekly due date, one past the grace period.
    advance_time(&ctx, WEEK + 3 * DAY_SECONDS);
    let applied = ctx.client.assess_overdue(&ctx.scheduler, &now(&ctx.env));
    assert_eq!(applied, 1);
    assert_eq!(count_events(&ctx.env, TOPIC_PENALTY_APPLIED), 1);

    let contribution = ctx.client.get_member_contribution(&group_id, &1, &late);
    assert_eq!(contribution.status, ContributionStatus::Overdue);

    let penalties = ctx.client.get_member_penalties(&group_id, &late);
    assert_eq!(penalties.len(), 1);
    let penalty = penalties.get(0).unwrap();
    assert_eq!(penalty.kind, PenaltyKind::LatePayment);
    assert_eq!(penalty.amount, 500);
    assert_eq!(penalty.status, PenaltyStatus::Unpaid);
    assert_eq!(penalty.contribution_id, Some(contribution.id));

    // Re-running the assessment changes nothing.
    assert_eq!(ctx.client.assess_overdue(&ctx.scheduler, &now(&ctx.env)), 0);
    assert_eq!(ctx.client.get_member_penalties(&group_id, &late).len(), 1);
    assert_eq!(
        count_transactions(&ctx, group_id, TransactionKind::PenaltyCharge),
        1
    );
}

#[test]
fn test_paying_overdue_contribution_keeps_penalty() {
    let ctx = setup_env();
    let (group_id, late) = group_with_one_late_member(&ctx);

    advance_time(&ctx, WEEK + 3 * DAY_SECONDS);
    ctx.client.assess_overdue(&ctx.scheduler, &now(&ctx.env));

    assert!(pay(&ctx, group_id, &late, 1));

    let contribution = ctx.client.get_member_contribution(&group_id, &1, &late);
    assert_eq!(contribution.status, ContributionStatus::Paid);

    let penalties = ctx.client.get_member_penalties(&group_id, &late);
    assert_eq!(penalties.len(), 1);
    assert_eq!(penalties.get(0).unwrap().status, PenaltyStatus::Unpaid);

    // The late payment still completed the cycle.
    assert_eq!(ctx.client.get_payout(&group_id, &1).gross, 30_000);
}

#[test]
fn test_no_penalty_within_grace_period() {
    let ctx = setup_env();
    let (group_id, late) = group_with_one_late_member(&ctx);

    // Exactly at the end of the grace period is still on time.
    advance_time(&ctx, WEEK + 2 * DAY_SECONDS);
    assert_eq!(ctx.client.assess_overdue(&ctx.scheduler, &now(&ctx.env)), 0);

    let contribution = ctx.client.get_member_contribution(&group_id, &1, &late);
    assert_eq!(contribution.status, ContributionStatus::Pending);
    assert_eq!(ctx.client.get_member_penalties(&group_id, &late).len(), 0);
}

#[test]
fn test_missed_payment_escalates() {
    let ctx = setup_env();
    let (group_id, late) = group_with_one_late_member(&ctx);

    advance_time(&ctx, WEEK + 3 * DAY_SECONDS);
    assert_eq!(ctx.client.assess_overdue(&ctx.scheduler, &now(&ctx.env)), 1);

    // A full cycle after the grace period ran out.
    advance_time(&ctx, WEEK);
    assert_eq!(ctx.client.assess_overdue(&ctx.scheduler, &now(&ctx.env)), 1);
    assert_eq!(ctx.client.assess_overdue(&ctx.scheduler, &now(&ctx.env)), 0);

    let penalties = ctx.client.get_member_penalties(&group_id, &late);
    assert_eq!(penalties.len(), 2);
    assert_eq!(penalties.get(0).unwrap().kind, PenaltyKind::LatePayment);
    assert_eq!(penalties.get(1).unwrap().kind, PenaltyKind::MissedPayment);
}

#[test]
fn test_group_overrides_penalty_terms() {
    let ctx = setup_env();
    let mut group_params = params(&ctx.env, 2, 0);
    group_params.penalty_bps = Some(1_000);
    group_params.grace_period = Some(DAY_SECONDS);
    let (group_id, members) = create_filled_group(&ctx, group_params);
    let late = members.get(1).unwrap();
    pay(&ctx, group_id, &members.get(0).unwrap(), 1);

    advance_time(&ctx, WEEK + DAY_SECONDS + 1);
    assert_eq!(ctx.client.assess_overdue(&ctx.admin, &now(&ctx.env)), 1);

    let penalty = ctx.client.get_member_penalties(&group_id, &late).get(0).unwrap();
    assert_eq!(penalty.amount, 1_000);
}

#[test]
fn test_assess_rejects_future_timestamp() {
    let ctx = setup_env();
    group_with_one_late_member(&ctx);

    assert_eq!(
        ctx.client.try_assess_overdue(&ctx.scheduler, &(START + 1)),
        Err(Ok(ContractError::InvalidTimestamp))
    );
}

#[test]
fn test_assess_requires_scheduler_or_admin() {
    let ctx = setup_env();
    group_with_one_late_member(&ctx);

    let stranger = Address::generate(&ctx.env);
    assert_eq!(
        ctx.client.try_assess_overdue(&stranger, &START),
        Err(Ok(ContractError::Unauthorized))
    );
}

// ─── Waiving & settling ─────────────────────────────────────────────

#[test]
fn test_waive_penalty_only_when_unpaid() {
    let ctx = setup_env();
    let (group_id, late) = group_with_one_late_member(&ctx);
    advance_time(&ctx, WEEK + 3 * DAY_SECONDS);
    ctx.client.assess_overdue(&ctx.scheduler, &now(&ctx.env));

    let penalty = ctx.client.get_member_penalties(&group_id, &late).get(0).unwrap();
    let organizer = ctx.client.get_group(&group_id).admin;

    let stranger = Address::generate(&ctx.env);
    assert_eq!(
        ctx.client.try_waive_penalty(&stranger, &penalty.id),
        Err(Ok(ContractError::Unauthorized))
    );

    let waived = ctx.client.waive_penalty(&organizer, &penalty.id);
    assert_eq!(waived.status, PenaltyStatus::Waived);
    assert_eq!(
        ctx.client.try_waive_penalty(&organizer, &penalty.id),
        Err(Ok(ContractError::PenaltyNotUnpaid))
    );
}

#[test]
fn test_penalty_paid_through_gateway() {
    let ctx = setup_env();
    let (group_id, late) = group_with_one_late_member(&ctx);
    advance_time(&ctx, WEEK + 3 * DAY_SECONDS);
    ctx.client.assess_overdue(&ctx.scheduler, &now(&ctx.env));

    let penalty = ctx.client.get_member_penalties(&group_id, &late).get(0).unwrap();

    let short = penalty_event(&ctx, group_id, &late, penalty.id, 499, "pen-short");
    assert_eq!(
        ctx.client.try_confirm_payment(&ctx.gateway, &short),
        Err(Ok(ContractError::InvalidAmount))
    );

    let someone_else = Address::generate(&ctx.env);
    let wrong = penalty_event(&ctx, group_id, &someone_else, penalty.id, 500, "pen-wrong");
    assert_eq!(
        ctx.client.try_confirm_payment(&ctx.gateway, &wrong),
        Err(Ok(ContractError::NotMember))
    );

    let event = penalty_event(&ctx, group_id, &late, penalty.id, 500, "pen-1");
    assert!(ctx.client.confirm_payment(&ctx.gateway, &event));
    assert!(!ctx.client.confirm_payment(&ctx.gateway, &event));

    assert_eq!(ctx.client.get_penalty(&penalty.id).status, PenaltyStatus::Paid);
    assert_eq!(
        count_transactions(&ctx, group_id, TransactionKind::PenaltyPayment),
        1
    );

    let organizer = ctx.client.get_group(&group_id).admin;
    assert_eq!(
        ctx.client.try_waive_penalty(&organizer, &penalty.id),
        Err(Ok(ContractError::PenaltyNotUnpaid))
    );
}

// ─── Early exit ─────────────────────────────────────────────────────

#[test]
fn test_removed_member_forfeits_deposit() {
    let ctx = setup_env();
    let (group_id, members) = create_filled_group(&ctx, params(&ctx.env, 3, 1_000));
    pay_deposits(&ctx, group_id, &members);

    let organizer = members.get(0).unwrap();
    let leaver = members.get(1).unwrap();
    pay(&ctx, group_id, &organizer, 1);

    ctx.client.remove_member(&organizer, &group_id, &leaver);
    assert_eq!(count_events(&ctx.env, TOPIC_PENALTY_APPLIED), 1);
    assert_eq!(
        ctx.client.get_member(&group_id, &leaver).status,
        MemberStatus::Removed
    );

    let penalties = ctx.client.get_member_penalties(&group_id, &leaver);
    assert_eq!(penalties.len(), 1);
    let penalty = penalties.get(0).unwrap();
    assert_eq!(penalty.kind, PenaltyKind::EarlyExit);
    assert_eq!(penalty.amount, 1_000);
    assert_eq!(penalty.contribution_id, None);

    assert_eq!(
        ctx.client.try_remove_member(&organizer, &group_id, &leaver),
        Err(Ok(ContractError::NotMember))
    );

    // Removed members are no longer assessed; only the last member is late.
    advance_time(&ctx, WEEK + 3 * DAY_SECONDS);
    assert_eq!(ctx.client.assess_overdue(&ctx.scheduler, &now(&ctx.env)), 1);
    assert_eq!(ctx.client.get_member_penalties(&group_id, &leaver).len(), 1);
}

#[test]
fn test_remove_member_requires_running_group() {
    let ctx = setup_env();
    let (group_id, members) = create_filled_group(&ctx, params(&ctx.env, 3, 1_000));

    assert_eq!(
        ctx.client
            .try_remove_member(&members.get(0).unwrap(), &group_id, &members.get(1).unwrap()),
        Err(Ok(ContractError::GroupNotActive))
    );
}
