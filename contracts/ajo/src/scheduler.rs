//! Time-based sweep over open groups.
//!
//! An off-chain cron invokes [`run`] with the configured scheduler identity.
//! Each tick visits at most `sweep_batch_size` groups, resuming from a stored
//! cursor, so a large deployment is covered over several ticks instead of one
//! unbounded invocation. A group whose check fails is logged and skipped;
//! the rest of the sweep carries on.

use soroban_sdk::{log, Address, Env};

use crate::contribution;
use crate::errors::ContractError;
use crate::group;
use crate::penalty;
use crate::storage;
use crate::types::{GroupStatus, SchedulerTask, SweepSummary};

pub fn run(env: &Env, caller: Address, task: SchedulerTask) -> Result<SweepSummary, ContractError> {
    caller.require_auth();

    let config = storage::get_config(env)?;
    if caller != config.scheduler {
        return Err(ContractError::Unauthorized);
    }

    let mut summary = SweepSummary::default();
    let open = storage::get_open_groups(env);
    let total = open.len();
    if total == 0 {
        return Ok(summary);
    }

    let now = env.ledger().timestamp();
    let batch = config.sweep_batch_size.min(total);
    let cursor = storage::get_sweep_cursor(env) % total;

    for offset in 0..batch {
        let Some(group_id) = open.get((cursor + offset) % total) else {
            continue;
        };

        match sweep_group(env, group_id, task, now, &mut summary) {
            Ok(()) => summary.groups_processed += 1,
            Err(err) => {
                log!(
                    env,
                    "scheduler skipping group: group_id={}, error={}",
                    group_id,
                    err as u32
                );
                summary.groups_skipped += 1;
            }
        }
    }

    storage::set_sweep_cursor(env, (cursor + batch) % total);

    Ok(summary)
}

fn sweep_group(
    env: &Env,
    group_id: u64,
    task: SchedulerTask,
    now: u64,
    summary: &mut SweepSummary,
) -> Result<(), ContractError> {
    let target = storage::get_group(env, group_id).ok_or(ContractError::GroupNotFound)?;

    if task == SchedulerTask::Daily && target.status == GroupStatus::Active {
        contribution::send_due_reminders(env, &target, now)?;
        summary.penalties_applied += penalty::assess_group(env, &target, now)?;
    }

    let outcome = group::check_group(env, group_id)?;
    if outcome.activated {
        summary.groups_activated += 1;
    }
    if outcome.payout_issued {
        summary.payouts_issued += 1;
    }
    if outcome.completed {
        summary.groups_completed += 1;
    }

    Ok(())
}
