use soroban_sdk::{symbol_short, Address, Env};

use crate::contribution;
use crate::errors::ContractError;
use crate::group;
use crate::penalty;
use crate::storage;
use crate::types::{Contribution, GroupStatus, MemberStatus, Penalty, SavingsGroup};

/// Loads the group and checks `admin` is its admin or the protocol admin.
fn authorized_group(
    env: &Env,
    admin: &Address,
    group_id: u64,
) -> Result<SavingsGroup, ContractError> {
    admin.require_auth();

    let group = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;

    if *admin != group.admin && *admin != storage::get_admin(env)? {
        return Err(ContractError::Unauthorized);
    }

    Ok(group)
}

pub fn pause_group(env: &Env, admin: Address, group_id: u64) -> Result<(), ContractError> {
    let mut group = authorized_group(env, &admin, group_id)?;

    if group.status.is_terminal() {
        return Err(ContractError::GroupClosed);
    }
    if group.status != GroupStatus::Active {
        return Err(ContractError::GroupNotActive);
    }

    group.status = GroupStatus::Paused;
    storage::set_group(env, &group);

    env.events()
        .publish((symbol_short!("grp_paus"),), group_id);

    Ok(())
}

pub fn resume_group(env: &Env, admin: Address, group_id: u64) -> Result<(), ContractError> {
    let mut group = authorized_group(env, &admin, group_id)?;

    if group.status != GroupStatus::Paused {
        return Err(ContractError::GroupNotActive);
    }

    group.status = GroupStatus::Active;
    storage::set_group(env, &group);

    env.events()
        .publish((symbol_short!("grp_resm"),), group_id);

    // Contributions may have completed the cycle while paused.
    group::settle_cycle(env, group_id)?;

    Ok(())
}

/// Cancels a group that has not completed. Cancelled groups are terminal.
pub fn cancel_group(env: &Env, admin: Address, group_id: u64) -> Result<(), ContractError> {
    let mut group = authorized_group(env, &admin, group_id)?;

    if group.status.is_terminal() {
        return Err(ContractError::GroupClosed);
    }

    group.status = GroupStatus::Cancelled;
    storage::set_group(env, &group);
    storage::remove_open_group(env, group_id);

    env.events()
        .publish((symbol_short!("grp_cncl"),), group_id);

    Ok(())
}

/// Removes a member from a running group. The member keeps their rotation
/// position (positions are never reused), drops out of collection and
/// rotation, and forfeits the security deposit as an early-exit penalty.
pub fn remove_member(
    env: &Env,
    admin: Address,
    group_id: u64,
    member: Address,
) -> Result<(), ContractError> {
    let group = authorized_group(env, &admin, group_id)?;

    if group.status.is_terminal() {
        return Err(ContractError::GroupClosed);
    }
    if group.status == GroupStatus::Forming {
        return Err(ContractError::GroupNotActive);
    }

    let mut record = storage::get_member(env, group_id, &member).ok_or(ContractError::NotMember)?;
    if record.status == MemberStatus::Removed {
        return Err(ContractError::NotMember);
    }

    record.status = MemberStatus::Removed;
    storage::set_member(env, &record);

    penalty::charge_early_exit(env, &group, &member);

    env.events()
        .publish((symbol_short!("mbr_rmvd"),), (group_id, member));

    // The removed member may have been the last one holding the cycle open.
    group::settle_cycle(env, group_id)?;

    Ok(())
}

pub fn waive_contribution(
    env: &Env,
    admin: Address,
    contribution_id: u64,
) -> Result<Contribution, ContractError> {
    let record = contribution::get_contribution(env, contribution_id)?;
    let group = authorized_group(env, &admin, record.group_id)?;

    if group.status.is_terminal() {
        return Err(ContractError::GroupClosed);
    }

    let waived = contribution::waive(env, contribution_id)?;
    group::settle_cycle(env, group.id)?;

    Ok(waived)
}

pub fn waive_penalty(env: &Env, admin: Address, penalty_id: u64) -> Result<Penalty, ContractError> {
    let record = penalty::get_penalty(env, penalty_id)?;
    authorized_group(env, &admin, record.group_id)?;

    penalty::waive_penalty(env, penalty_id)
}

pub fn set_group_admin(
    env: &Env,
    current_admin: Address,
    group_id: u64,
    new_admin: Address,
) -> Result<(), ContractError> {
    current_admin.require_auth();

    let mut group = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;

    if current_admin != group.admin {
        return Err(ContractError::Unauthorized);
    }

    group.admin = new_admin.clone();
    storage::set_group(env, &group);

    env.events()
        .publish((symbol_short!("adm_chng"),), (group_id, new_admin));

    Ok(())
}
