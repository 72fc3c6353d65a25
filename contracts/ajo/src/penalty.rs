use soroban_sdk::{log, symbol_short, Address, Env, String, Vec};

use crate::contribution;
use crate::errors::ContractError;
use crate::events;
use crate::fees;
use crate::storage;
use crate::types::{
    Contribution, ContributionStatus, DataKey, GroupStatus, MemberStatus, Penalty, PenaltyKind,
    PenaltyStatus, SavingsGroup, TransactionKind,
};

/// Assesses every open active group as of `as_of`. Returns the number of
/// penalties applied.
pub fn assess_overdue(env: &Env, as_of: u64) -> Result<u32, ContractError> {
    if as_of > env.ledger().timestamp() {
        return Err(ContractError::InvalidTimestamp);
    }

    let mut applied = 0u32;
    for group_id in storage::get_open_groups(env).iter() {
        let group = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;
        applied += assess_group(env, &group, as_of)?;
    }
    Ok(applied)
}

/// Marks current-cycle contributions overdue once their grace period has
/// passed and charges a late-payment penalty. Contributions still unpaid a
/// full cycle after that are charged a missed-payment penalty.
///
/// Each (contribution, kind) pair is charged at most once, so repeated
/// assessment is harmless.
pub fn assess_group(env: &Env, group: &SavingsGroup, as_of: u64) -> Result<u32, ContractError> {
    if group.status != GroupStatus::Active {
        return Ok(0);
    }

    let mut applied = 0u32;
    for id in storage::get_cycle_contribution_ids(env, group.id, group.current_cycle).iter() {
        let mut contribution =
            storage::get_contribution(env, id).ok_or(ContractError::ContributionNotFound)?;

        let member = storage::get_member(env, group.id, &contribution.member)
            .ok_or(ContractError::MemberNotFound)?;
        if member.status != MemberStatus::Active {
            continue;
        }

        let late_after = contribution.due_date + group.grace_period;
        match contribution.status {
            ContributionStatus::Pending if late_after < as_of => {
                contribution.status = ContributionStatus::Overdue;
                storage::set_contribution(env, &contribution);
                if charge_contribution(env, group, &contribution, PenaltyKind::LatePayment)
                    .is_some()
                {
                    applied += 1;
                }
            }
            ContributionStatus::Overdue => {}
            _ => continue,
        }

        if late_after + group.frequency.seconds() < as_of
            && charge_contribution(env, group, &contribution, PenaltyKind::MissedPayment).is_some()
        {
            applied += 1;
        }
    }

    Ok(applied)
}

fn charge_contribution(
    env: &Env,
    group: &SavingsGroup,
    contribution: &Contribution,
    kind: PenaltyKind,
) -> Option<Penalty> {
    if storage::has_penalty_guard(env, contribution.id, kind) {
        return None;
    }

    let amount = fees::bps_of(contribution.amount_due, group.penalty_bps);
    if amount == 0 {
        return None;
    }

    let penalty = charge(
        env,
        group.id,
        &contribution.member,
        Some(contribution.id),
        kind,
        amount,
    );
    storage::set_penalty_guard(env, contribution.id, kind, penalty.id);
    Some(penalty)
}

/// Forfeits the security deposit of a member removed from a running group.
pub fn charge_early_exit(env: &Env, group: &SavingsGroup, member: &Address) -> Option<Penalty> {
    if storage::has_exit_penalty(env, group.id, member) {
        return None;
    }

    let amount = fees::bps_of(group.contribution_amount, group.security_deposit_bps);
    if amount == 0 {
        return None;
    }

    let penalty = charge(env, group.id, member, None, PenaltyKind::EarlyExit, amount);
    storage::set_exit_penalty(env, group.id, member, penalty.id);
    Some(penalty)
}

fn charge(
    env: &Env,
    group_id: u64,
    member: &Address,
    contribution_id: Option<u64>,
    kind: PenaltyKind,
    amount: i128,
) -> Penalty {
    let penalty = Penalty {
        id: storage::next_id(env, DataKey::PenaltyCounter),
        group_id,
        member: member.clone(),
        contribution_id,
        kind,
        amount,
        status: PenaltyStatus::Unpaid,
        created_at: env.ledger().timestamp(),
    };
    storage::set_penalty(env, &penalty);
    storage::add_member_penalty(env, group_id, member, penalty.id);

    contribution::record_transaction(
        env,
        group_id,
        member,
        TransactionKind::PenaltyCharge,
        amount,
        None,
    );
    events::emit_penalty_applied(env, group_id, member, amount);

    penalty
}

/// Waives an unpaid penalty. Paid or already waived penalties are final.
pub fn waive_penalty(env: &Env, penalty_id: u64) -> Result<Penalty, ContractError> {
    let mut penalty = storage::get_penalty(env, penalty_id).ok_or(ContractError::PenaltyNotFound)?;

    if penalty.status != PenaltyStatus::Unpaid {
        return Err(ContractError::PenaltyNotUnpaid);
    }

    penalty.status = PenaltyStatus::Waived;
    storage::set_penalty(env, &penalty);

    env.events().publish(
        (symbol_short!("pen_waive"), penalty.group_id),
        (penalty.id, penalty.member.clone()),
    );

    Ok(penalty)
}

/// Settles an unpaid penalty from a confirmed gateway payment.
pub fn settle_penalty(
    env: &Env,
    penalty_id: u64,
    member: &Address,
    amount: i128,
    reference: &String,
) -> Result<bool, ContractError> {
    let mut penalty = storage::get_penalty(env, penalty_id).ok_or(ContractError::PenaltyNotFound)?;

    if penalty.member != *member {
        return Err(ContractError::NotMember);
    }
    if penalty.status != PenaltyStatus::Unpaid {
        log!(
            env,
            "penalty already closed, payment ignored: penalty_id={}",
            penalty_id
        );
        return Ok(false);
    }
    if amount < penalty.amount {
        return Err(ContractError::InvalidAmount);
    }

    let transaction = contribution::record_transaction(
        env,
        penalty.group_id,
        member,
        TransactionKind::PenaltyPayment,
        penalty.amount,
        Some(reference.clone()),
    );
    storage::consume_reference(env, reference, transaction.id);

    penalty.status = PenaltyStatus::Paid;
    storage::set_penalty(env, &penalty);
    Ok(true)
}

pub fn get_penalty(env: &Env, penalty_id: u64) -> Result<Penalty, ContractError> {
    storage::get_penalty(env, penalty_id).ok_or(ContractError::PenaltyNotFound)
}

pub fn get_member_penalties(env: &Env, group_id: u64, member: &Address) -> Vec<Penalty> {
    let mut penalties = Vec::new(env);
    for id in storage::get_member_penalties(env, group_id, member).iter() {
        if let Some(penalty) = storage::get_penalty(env, id) {
            penalties.push_back(penalty);
        }
    }
    penalties
}
