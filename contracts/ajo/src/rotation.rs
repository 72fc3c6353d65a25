use soroban_sdk::{log, Env, Map};

use crate::errors::ContractError;
use crate::storage;
use crate::types::{Member, MemberStatus, SavingsGroup};

/// Returns the active member with the lowest rotation position who has paid
/// the security deposit and has not been paid this round.
///
/// `None` is a normal outcome: the group was never activated, or everyone
/// eligible has already been paid. It simply blocks the payout.
///
/// Two active members sharing a position means corrupted state. That is
/// reported as an error before anything is written, never resolved silently.
pub fn next_recipient(env: &Env, group: &SavingsGroup) -> Result<Option<Member>, ContractError> {
    if group.started_at.is_none() {
        return Ok(None);
    }

    let mut positions: Map<u32, u64> = Map::new(env);
    let mut best: Option<Member> = None;

    for address in storage::get_roster(env, group.id).iter() {
        let member =
            storage::get_member(env, group.id, &address).ok_or(ContractError::MemberNotFound)?;
        if member.status != MemberStatus::Active {
            continue;
        }

        if let Some(holder) = positions.get(member.position) {
            log!(
                env,
                "rotation position held twice: group_id={}, position={}, member_ids={}/{}",
                group.id,
                member.position,
                holder,
                member.id
            );
            return Err(ContractError::DuplicateRotationPosition);
        }
        positions.set(member.position, member.id);

        if !member.deposit_paid || member.received_payout {
            continue;
        }

        best = match best {
            Some(current) if current.position < member.position => Some(current),
            _ => Some(member),
        };
    }

    Ok(best)
}

/// True once every active member has received a payout this round.
pub fn is_round_complete(env: &Env, group: &SavingsGroup) -> Result<bool, ContractError> {
    let mut any_active = false;
    for address in storage::get_roster(env, group.id).iter() {
        let member =
            storage::get_member(env, group.id, &address).ok_or(ContractError::MemberNotFound)?;
        if member.status != MemberStatus::Active {
            continue;
        }
        any_active = true;
        if !member.received_payout {
            return Ok(false);
        }
    }
    Ok(any_active)
}
