use soroban_sdk::{log, Address, Env, String, Vec};

use crate::errors::ContractError;
use crate::events;
use crate::fees;
use crate::storage;
use crate::types::{
    Contribution, ContributionStatus, DataKey, GroupStatus, MemberStatus, SavingsGroup,
    Transaction, TransactionKind, DAY_SECONDS,
};

/// Creates one pending contribution per active member for `cycle`, which
/// must be the group's current cycle.
///
/// Re-running for a cycle that already has rows creates nothing and returns 0.
pub fn create_cycle_contributions(
    env: &Env,
    group: &SavingsGroup,
    cycle: u32,
) -> Result<u32, ContractError> {
    if group.status.is_terminal() {
        return Err(ContractError::GroupClosed);
    }
    if group.status != GroupStatus::Active {
        return Err(ContractError::GroupNotActive);
    }
    // Later cycles open only when the lifecycle advances past a stored payout.
    if cycle != group.current_cycle {
        return Err(ContractError::InvalidCycle);
    }

    if !storage::get_cycle_contribution_ids(env, group.id, cycle).is_empty() {
        log!(
            env,
            "ledger cycle already populated: group_id={}, cycle={}",
            group.id,
            cycle
        );
        return Ok(0);
    }

    let due_date = group.cycle_started_at + group.frequency.seconds();
    let service_fee = fees::bps_of(group.contribution_amount, group.service_fee_bps);

    let mut created = 0u32;
    for address in storage::get_roster(env, group.id).iter() {
        let member =
            storage::get_member(env, group.id, &address).ok_or(ContractError::MemberNotFound)?;
        if member.status != MemberStatus::Active {
            continue;
        }

        let contribution = Contribution {
            id: storage::next_id(env, DataKey::ContributionCounter),
            group_id: group.id,
            member: address.clone(),
            cycle,
            amount_due: group.contribution_amount,
            service_fee,
            status: ContributionStatus::Pending,
            due_date,
            paid_at: None,
            reference: None,
            reminded: false,
        };
        storage::insert_contribution(env, &contribution);
        events::emit_contribution_due(env, group.id, &address, contribution.amount_due);
        created += 1;
    }

    Ok(created)
}

/// Marks a pending or overdue contribution as paid.
///
/// Returns `Ok(false)` without touching state when the contribution does not
/// exist, is already settled, or the reference was consumed before. Gateways
/// deliver at least once, so these are expected rather than errors.
pub fn record_payment(
    env: &Env,
    contribution_id: u64,
    reference: &String,
) -> Result<bool, ContractError> {
    let Some(mut contribution) = storage::get_contribution(env, contribution_id) else {
        log!(
            env,
            "ledger payment for unknown contribution ignored: contribution_id={}",
            contribution_id
        );
        return Ok(false);
    };

    if storage::is_reference_consumed(env, reference) {
        log!(
            env,
            "ledger duplicate payment reference ignored: contribution_id={}",
            contribution_id
        );
        return Ok(false);
    }

    if contribution.status.is_settled() {
        log!(
            env,
            "ledger contribution already settled: contribution_id={}",
            contribution_id
        );
        return Ok(false);
    }

    let group = storage::get_group(env, contribution.group_id)
        .ok_or(ContractError::GroupNotFound)?;
    if group.status.is_terminal() {
        return Err(ContractError::GroupClosed);
    }

    let transaction = record_transaction(
        env,
        group.id,
        &contribution.member,
        TransactionKind::ContributionPayment,
        contribution.amount_due,
        Some(reference.clone()),
    );
    storage::consume_reference(env, reference, transaction.id);

    // An overdue contribution keeps its penalties once paid.
    contribution.status = ContributionStatus::Paid;
    contribution.paid_at = Some(env.ledger().timestamp());
    contribution.reference = Some(reference.clone());
    storage::set_contribution(env, &contribution);

    events::emit_contribution_paid(
        env,
        group.id,
        &contribution.member,
        contribution.amount_due,
    );

    Ok(true)
}

/// True iff every active member's contribution for `cycle` is paid or waived.
pub fn is_cycle_complete(
    env: &Env,
    group: &SavingsGroup,
    cycle: u32,
) -> Result<bool, ContractError> {
    if storage::get_cycle_contribution_ids(env, group.id, cycle).is_empty() {
        return Ok(false);
    }

    for address in storage::get_roster(env, group.id).iter() {
        let member =
            storage::get_member(env, group.id, &address).ok_or(ContractError::MemberNotFound)?;
        if member.status != MemberStatus::Active {
            continue;
        }

        let Some(id) = storage::get_cycle_contribution_id(env, group.id, cycle, &address) else {
            return Ok(false);
        };
        let contribution =
            storage::get_contribution(env, id).ok_or(ContractError::ContributionNotFound)?;
        if !contribution.status.is_settled() {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Sums the paid and waived contributions of a cycle into
/// `(gross, service_fee)`. The fee is the sum of the rows' own fee portions.
pub fn collected_amount(
    env: &Env,
    group_id: u64,
    cycle: u32,
) -> Result<(i128, i128), ContractError> {
    let mut gross = 0i128;
    let mut service_fee = 0i128;
    for contribution in get_cycle_contributions(env, group_id, cycle)?.iter() {
        if contribution.status.is_settled() {
            gross += contribution.amount_due;
            service_fee += contribution.service_fee;
        }
    }
    Ok((gross, service_fee))
}

/// Moves a pending or overdue contribution to waived.
pub fn waive(env: &Env, contribution_id: u64) -> Result<Contribution, ContractError> {
    let mut contribution = storage::get_contribution(env, contribution_id)
        .ok_or(ContractError::ContributionNotFound)?;

    match contribution.status {
        ContributionStatus::Pending | ContributionStatus::Overdue => {}
        _ => return Err(ContractError::ContributionNotOpen),
    }

    contribution.status = ContributionStatus::Waived;
    storage::set_contribution(env, &contribution);
    Ok(contribution)
}

/// Re-announces pending contributions of the current cycle that fall due
/// within the next day. Each row is reminded at most once.
pub fn send_due_reminders(env: &Env, group: &SavingsGroup, now: u64) -> Result<u32, ContractError> {
    let mut sent = 0u32;
    for id in storage::get_cycle_contribution_ids(env, group.id, group.current_cycle).iter() {
        let mut contribution =
            storage::get_contribution(env, id).ok_or(ContractError::ContributionNotFound)?;
        if contribution.status != ContributionStatus::Pending || contribution.reminded {
            continue;
        }
        if contribution.due_date > now + DAY_SECONDS {
            continue;
        }

        contribution.reminded = true;
        storage::set_contribution(env, &contribution);
        events::emit_contribution_due(
            env,
            group.id,
            &contribution.member,
            contribution.amount_due,
        );
        sent += 1;
    }
    Ok(sent)
}

pub fn get_contribution(env: &Env, contribution_id: u64) -> Result<Contribution, ContractError> {
    storage::get_contribution(env, contribution_id).ok_or(ContractError::ContributionNotFound)
}

pub fn get_member_contribution(
    env: &Env,
    group_id: u64,
    cycle: u32,
    member: &Address,
) -> Result<Contribution, ContractError> {
    let id = storage::get_cycle_contribution_id(env, group_id, cycle, member)
        .ok_or(ContractError::ContributionNotFound)?;
    get_contribution(env, id)
}

pub fn get_cycle_contributions(
    env: &Env,
    group_id: u64,
    cycle: u32,
) -> Result<Vec<Contribution>, ContractError> {
    let mut contributions = Vec::new(env);
    for id in storage::get_cycle_contribution_ids(env, group_id, cycle).iter() {
        contributions.push_back(get_contribution(env, id)?);
    }
    Ok(contributions)
}

/// Appends an immutable audit record and returns it.
pub fn record_transaction(
    env: &Env,
    group_id: u64,
    member: &Address,
    kind: TransactionKind,
    amount: i128,
    reference: Option<String>,
) -> Transaction {
    let transaction = Transaction {
        id: storage::next_id(env, DataKey::TransactionCounter),
        group_id,
        member: member.clone(),
        kind,
        amount,
        reference,
        created_at: env.ledger().timestamp(),
    };
    storage::append_transaction(env, &transaction);
    transaction
}
