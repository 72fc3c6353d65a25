use soroban_sdk::{log, Env};

use crate::contribution;
use crate::errors::ContractError;
use crate::events;
use crate::rotation;
use crate::storage;
use crate::types::{GroupStatus, Payout, PayoutPreview, PayoutStatus, TransactionKind};

/// Pays out a completed cycle to the next recipient in rotation.
///
/// Returns `Ok(None)` when the cycle already has a payout or no member is
/// eligible. A second caller racing the first therefore does nothing. The
/// stored `(group, cycle)` payout is the uniqueness guard.
///
/// This does not advance the cycle; the lifecycle manager does that once the
/// payout is stored.
pub fn process_cycle_payout(
    env: &Env,
    group_id: u64,
    cycle: u32,
) -> Result<Option<Payout>, ContractError> {
    let group = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;

    if group.status.is_terminal() {
        return Err(ContractError::GroupClosed);
    }
    if group.status != GroupStatus::Active {
        return Err(ContractError::GroupNotActive);
    }

    if storage::has_payout(env, group_id, cycle) {
        log!(
            env,
            "payout already issued: group_id={}, cycle={}",
            group_id,
            cycle
        );
        return Ok(None);
    }

    if !contribution::is_cycle_complete(env, &group, cycle)? {
        return Err(ContractError::CycleNotComplete);
    }

    let Some(mut recipient) = rotation::next_recipient(env, &group)? else {
        log!(
            env,
            "payout blocked, no eligible recipient: group_id={}, cycle={}",
            group_id,
            cycle
        );
        return Ok(None);
    };

    let (gross, service_fee) = contribution::collected_amount(env, group_id, cycle)?;
    let amount = gross - service_fee;

    let transaction = contribution::record_transaction(
        env,
        group_id,
        &recipient.address,
        TransactionKind::PayoutDisbursement,
        amount,
        None,
    );

    let payout = Payout {
        group_id,
        cycle,
        recipient: recipient.address.clone(),
        gross,
        service_fee,
        amount,
        status: PayoutStatus::Completed,
        paid_at: env.ledger().timestamp(),
        transaction_id: transaction.id,
    };
    storage::set_payout(env, &payout);

    recipient.received_payout = true;
    storage::set_member(env, &recipient);

    events::emit_payout_received(env, group_id, &payout.recipient, amount);

    Ok(Some(payout))
}

/// Computes what a payout for `cycle` would be right now, without writing.
pub fn preview_payout(env: &Env, group_id: u64, cycle: u32) -> Result<PayoutPreview, ContractError> {
    let group = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;

    let (gross, service_fee) = contribution::collected_amount(env, group_id, cycle)?;
    let amount = gross - service_fee;
    let recipient = rotation::next_recipient(env, &group)?.map(|member| member.address);

    Ok(PayoutPreview {
        gross,
        service_fee,
        amount,
        recipient,
    })
}

pub fn get_payout(env: &Env, group_id: u64, cycle: u32) -> Result<Payout, ContractError> {
    storage::get_payout(env, group_id, cycle).ok_or(ContractError::PayoutNotFound)
}
