use soroban_sdk::{log, Address, Env};

use crate::contribution;
use crate::errors::ContractError;
use crate::group;
use crate::penalty;
use crate::storage;
use crate::types::{GroupStatus, PaymentEvent, PaymentKind, PaymentStatus};

/// Applies a payment confirmation from the gateway.
///
/// The gateway's signature (`require_auth`) is the authenticity check; any
/// other caller is rejected. Returns `Ok(false)` for failed payments and for
/// deliveries that were already applied.
pub fn confirm_payment(
    env: &Env,
    gateway: Address,
    event: PaymentEvent,
) -> Result<bool, ContractError> {
    gateway.require_auth();

    let config = storage::get_config(env)?;
    if gateway != config.gateway {
        log!(env, "payment rejected, unverified gateway: {}", gateway);
        return Err(ContractError::UnverifiedPayment);
    }

    if event.reference.len() == 0 {
        return Err(ContractError::MissingReference);
    }

    let metadata = event.metadata;
    if event.status == PaymentStatus::Failed {
        log!(
            env,
            "payment failed at gateway, nothing recorded: group_id={}",
            metadata.group_id
        );
        return Ok(false);
    }

    if event.amount <= 0 {
        return Err(ContractError::InvalidAmount);
    }

    if storage::is_reference_consumed(env, &event.reference) {
        log!(
            env,
            "payment reference already applied: group_id={}",
            metadata.group_id
        );
        return Ok(false);
    }

    let target = storage::get_group(env, metadata.group_id).ok_or(ContractError::GroupNotFound)?;

    match metadata.kind {
        PaymentKind::Contribution => {
            let contribution_id = metadata
                .contribution_id
                .ok_or(ContractError::ContributionNotFound)?;

            let Some(record) = storage::get_contribution(env, contribution_id) else {
                log!(
                    env,
                    "payment for unknown contribution ignored: contribution_id={}",
                    contribution_id
                );
                return Ok(false);
            };
            if record.group_id != target.id || record.member != metadata.member {
                return Err(ContractError::ContributionMismatch);
            }
            if record.status.is_settled() {
                log!(
                    env,
                    "contribution already settled: contribution_id={}",
                    contribution_id
                );
                return Ok(false);
            }
            if event.amount < record.amount_due {
                return Err(ContractError::InvalidAmount);
            }

            let recorded = contribution::record_payment(env, contribution_id, &event.reference)?;

            // The payment that completes a cycle also settles it.
            if recorded && target.status == GroupStatus::Active {
                group::settle_cycle(env, target.id)?;
            }
            Ok(recorded)
        }
        PaymentKind::Deposit => group::record_deposit(
            env,
            target.id,
            &metadata.member,
            event.amount,
            &event.reference,
        ),
        PaymentKind::Penalty => {
            let penalty_id = metadata.penalty_id.ok_or(ContractError::PenaltyNotFound)?;
            penalty::settle_penalty(
                env,
                penalty_id,
                &metadata.member,
                event.amount,
                &event.reference,
            )
        }
    }
}
