use soroban_sdk::{log, symbol_short, Address, Env, String, Vec};

use crate::contribution;
use crate::errors::ContractError;
use crate::events;
use crate::fees::{self, BPS_DENOMINATOR, MAX_BPS};
use crate::payout;
use crate::rotation;
use crate::storage;
use crate::types::{
    DataKey, GroupParams, GroupStatus, Member, MemberStatus, SavingsGroup, TransactionKind,
};

/// What a lifecycle check did to one group.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CheckOutcome {
    pub activated: bool,
    pub payout_issued: bool,
    pub completed: bool,
}

pub fn create_group(env: &Env, admin: Address, params: GroupParams) -> Result<u64, ContractError> {
    admin.require_auth();

    let config = storage::get_config(env)?;

    if params.contribution_amount <= 0 {
        return Err(ContractError::InvalidAmount);
    }
    if params.max_members < 2 {
        return Err(ContractError::InsufficientMembers);
    }
    // A full pool at the highest rate must stay representable.
    let pool_fits = params
        .contribution_amount
        .checked_mul(params.max_members as i128)
        .and_then(|pool| pool.checked_mul(BPS_DENOMINATOR))
        .is_some();
    if !pool_fits {
        return Err(ContractError::InvalidAmount);
    }

    let service_fee_bps = params
        .service_fee_bps
        .unwrap_or(config.default_service_fee_bps);
    let penalty_bps = params.penalty_bps.unwrap_or(config.default_penalty_bps);
    if params.security_deposit_bps > MAX_BPS || service_fee_bps > MAX_BPS || penalty_bps > MAX_BPS
    {
        return Err(ContractError::InvalidConfig);
    }

    let group_id = storage::next_id(env, DataKey::GroupCounter);
    let now = env.ledger().timestamp();

    let group = SavingsGroup {
        id: group_id,
        name: params.name,
        admin: admin.clone(),
        contribution_amount: params.contribution_amount,
        frequency: params.frequency,
        max_members: params.max_members,
        member_count: 0,
        security_deposit_bps: params.security_deposit_bps,
        service_fee_bps,
        penalty_bps,
        grace_period: params.grace_period.unwrap_or(config.default_grace_period),
        current_cycle: 0,
        cycle_started_at: 0,
        status: GroupStatus::Forming,
        created_at: now,
        started_at: None,
    };

    // The creator takes the first rotation position.
    let group = add_member(env, group, &admin);
    storage::set_group(env, &group);
    storage::add_open_group(env, group_id);

    env.events()
        .publish((symbol_short!("grp_creat"),), group_id);

    Ok(group_id)
}

pub fn join_group(env: &Env, member: Address, group_id: u64) -> Result<(), ContractError> {
    member.require_auth();

    let group = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;

    if group.status != GroupStatus::Forming {
        return Err(ContractError::GroupNotForming);
    }

    if group.member_count >= group.max_members {
        return Err(ContractError::GroupFull);
    }

    if storage::get_member(env, group_id, &member).is_some() {
        return Err(ContractError::AlreadyMember);
    }

    let group = add_member(env, group, &member);
    storage::set_group(env, &group);

    env.events()
        .publish((symbol_short!("grp_join"),), (group_id, member));

    try_activate(env, group_id)?;

    Ok(())
}

/// Registers `address` at the next rotation position and returns the updated group.
fn add_member(env: &Env, mut group: SavingsGroup, address: &Address) -> SavingsGroup {
    group.member_count += 1;

    let record = Member {
        id: storage::next_id(env, DataKey::MemberCounter),
        group_id: group.id,
        address: address.clone(),
        position: group.member_count,
        deposit_paid: deposit_amount(&group) == 0,
        status: MemberStatus::Active,
        received_payout: false,
        joined_at: env.ledger().timestamp(),
    };
    storage::set_member(env, &record);

    let mut roster = storage::get_roster(env, group.id);
    roster.push_back(address.clone());
    storage::set_roster(env, group.id, &roster);
    storage::add_member_group(env, address, group.id);

    group
}

pub fn leave_group(env: &Env, member: Address, group_id: u64) -> Result<(), ContractError> {
    member.require_auth();

    let mut group = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;

    if group.status != GroupStatus::Forming {
        return Err(ContractError::GroupNotForming);
    }

    // Admin cannot leave their own group
    if member == group.admin {
        return Err(ContractError::Unauthorized);
    }

    let leaving = storage::get_member(env, group_id, &member).ok_or(ContractError::NotMember)?;
    if leaving.deposit_paid && deposit_amount(&group) > 0 {
        log!(
            env,
            "member left with deposit on record, refund is external: group_id={}",
            group_id
        );
    }

    // Positions stay contiguous while the group is still forming.
    let mut roster = Vec::new(env);
    for address in storage::get_roster(env, group_id).iter() {
        if address == member {
            continue;
        }
        let mut record =
            storage::get_member(env, group_id, &address).ok_or(ContractError::MemberNotFound)?;
        if record.position > leaving.position {
            record.position -= 1;
            storage::set_member(env, &record);
        }
        roster.push_back(address);
    }

    storage::set_roster(env, group_id, &roster);
    storage::remove_member(env, group_id, &member);
    storage::remove_member_group(env, &member, group_id);

    group.member_count -= 1;
    storage::set_group(env, &group);

    env.events()
        .publish((symbol_short!("grp_leav"),), (group_id, member));

    Ok(())
}

/// Security deposit owed by each member, in minor units.
pub fn deposit_amount(group: &SavingsGroup) -> i128 {
    fees::bps_of(group.contribution_amount, group.security_deposit_bps)
}

/// Records a confirmed security-deposit payment, then checks activation.
pub fn record_deposit(
    env: &Env,
    group_id: u64,
    member: &Address,
    amount: i128,
    reference: &String,
) -> Result<bool, ContractError> {
    let group = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;
    let mut record = storage::get_member(env, group_id, member).ok_or(ContractError::NotMember)?;

    if record.deposit_paid {
        log!(
            env,
            "deposit already recorded: group_id={}, member={}",
            group_id,
            member.clone()
        );
        return Ok(false);
    }
    if group.status != GroupStatus::Forming {
        return Err(ContractError::GroupNotForming);
    }

    let due = deposit_amount(&group);
    if amount < due {
        return Err(ContractError::InvalidAmount);
    }

    let transaction = contribution::record_transaction(
        env,
        group_id,
        member,
        TransactionKind::DepositPayment,
        due,
        Some(reference.clone()),
    );
    storage::consume_reference(env, reference, transaction.id);

    record.deposit_paid = true;
    storage::set_member(env, &record);

    try_activate(env, group_id)?;

    Ok(true)
}

/// Moves a forming group to active once it is full and every member has
/// paid the deposit, then opens cycle 1.
pub fn try_activate(env: &Env, group_id: u64) -> Result<bool, ContractError> {
    let mut group = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;

    if group.status != GroupStatus::Forming || group.member_count < group.max_members {
        return Ok(false);
    }

    for address in storage::get_roster(env, group_id).iter() {
        let member =
            storage::get_member(env, group_id, &address).ok_or(ContractError::MemberNotFound)?;
        if !member.deposit_paid {
            return Ok(false);
        }
    }

    let now = env.ledger().timestamp();
    group.status = GroupStatus::Active;
    group.current_cycle = 1;
    group.started_at = Some(now);
    group.cycle_started_at = now;
    storage::set_group(env, &group);

    contribution::create_cycle_contributions(env, &group, 1)?;
    events::emit_group_activated(env, group_id, group.contribution_amount);

    Ok(true)
}

/// Pays out the current cycle if it is complete, then advances the group.
pub fn settle_cycle(env: &Env, group_id: u64) -> Result<CheckOutcome, ContractError> {
    let group = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;
    let mut outcome = CheckOutcome::default();

    if group.status != GroupStatus::Active {
        return Ok(outcome);
    }

    let cycle = group.current_cycle;
    if !storage::has_payout(env, group_id, cycle) {
        if !contribution::is_cycle_complete(env, &group, cycle)? {
            return Ok(outcome);
        }
        if payout::process_cycle_payout(env, group_id, cycle)?.is_none() {
            // Everyone left in the rotation was paid before a removal emptied it.
            if rotation::is_round_complete(env, &group)? {
                log!(
                    env,
                    "rotation exhausted before payout, completing: group_id={}, cycle={}",
                    group_id,
                    cycle
                );
                complete_group(env, group);
                outcome.completed = true;
            }
            return Ok(outcome);
        }
        outcome.payout_issued = true;
    }

    outcome.completed = advance_cycle(env, group_id)?;
    Ok(outcome)
}

/// Closes the current cycle after its payout is stored. Either completes the
/// group or opens the next cycle's contributions. Returns true on completion.
pub fn advance_cycle(env: &Env, group_id: u64) -> Result<bool, ContractError> {
    let mut group = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;

    if group.status != GroupStatus::Active {
        return Err(ContractError::GroupNotActive);
    }
    if !storage::has_payout(env, group_id, group.current_cycle) {
        return Err(ContractError::CycleNotComplete);
    }

    if rotation::is_round_complete(env, &group)? {
        complete_group(env, group);
        return Ok(true);
    }

    // Cycles keep their calendar unless the group has fallen behind it.
    let now = env.ledger().timestamp();
    let scheduled = group.cycle_started_at + group.frequency.seconds();
    group.current_cycle += 1;
    group.cycle_started_at = if scheduled > now { scheduled } else { now };
    storage::set_group(env, &group);

    contribution::create_cycle_contributions(env, &group, group.current_cycle)?;

    Ok(false)
}

fn complete_group(env: &Env, mut group: SavingsGroup) {
    group.status = GroupStatus::Completed;
    storage::set_group(env, &group);
    storage::remove_open_group(env, group.id);
    events::emit_group_completed(env, group.id);
}

/// Runs whichever lifecycle transition the group is ready for.
pub fn check_group(env: &Env, group_id: u64) -> Result<CheckOutcome, ContractError> {
    let group = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;

    match group.status {
        GroupStatus::Forming => Ok(CheckOutcome {
            activated: try_activate(env, group_id)?,
            ..CheckOutcome::default()
        }),
        GroupStatus::Active => settle_cycle(env, group_id),
        _ => Ok(CheckOutcome::default()),
    }
}

pub fn get_group(env: &Env, group_id: u64) -> Result<SavingsGroup, ContractError> {
    storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)
}

pub fn get_member(env: &Env, group_id: u64, member: &Address) -> Result<Member, ContractError> {
    storage::get_member(env, group_id, member).ok_or(ContractError::MemberNotFound)
}

/// Members in rotation-position order.
pub fn get_members(env: &Env, group_id: u64) -> Result<Vec<Member>, ContractError> {
    let mut members = Vec::new(env);
    for address in storage::get_roster(env, group_id).iter() {
        members.push_back(get_member(env, group_id, &address)?);
    }
    Ok(members)
}

pub fn get_member_groups(env: &Env, member: Address) -> Vec<u64> {
    storage::get_member_groups(env, &member)
}
