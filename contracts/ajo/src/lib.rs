#![no_std]

use soroban_sdk::{contract, contractimpl, Address, Env, Vec};

mod admin;
mod config;
mod contribution;
mod errors;
mod events;
mod fees;
mod group;
mod payment;
mod payout;
mod penalty;
mod rotation;
mod scheduler;
mod storage;
mod types;

pub use errors::ContractError;
pub use events::{Notification, NotificationKind};
pub use types::*;

#[contract]
pub struct AjoContract;

#[contractimpl]
impl AjoContract {
    /// Initialize the protocol with a global admin, the payment gateway whose
    /// confirmations are trusted, and the scheduler identity.
    pub fn __constructor(env: Env, admin: Address, gateway: Address, scheduler: Address) {
        if storage::has_admin(&env) {
            panic!("already initialized");
        }
        storage::set_admin(&env, &admin);
        storage::set_config(&env, &config::default_config(gateway, scheduler));
    }

    // ─── Configuration ──────────────────────────────────────────────

    /// Replace the protocol configuration. Protocol admin only.
    pub fn set_config(env: Env, admin: Address, config: ProtocolConfig) -> Result<(), ContractError> {
        config::set_config(&env, admin, config)
    }

    pub fn get_config(env: Env) -> Result<ProtocolConfig, ContractError> {
        config::get_config(&env)
    }

    // ─── Group Lifecycle ────────────────────────────────────────────

    /// Create a new savings group. The caller becomes the group admin and
    /// takes rotation position 1.
    pub fn create_group(env: Env, admin: Address, params: GroupParams) -> Result<u64, ContractError> {
        group::create_group(&env, admin, params)
    }

    /// Join a group that is still forming. The group activates as soon as it
    /// is full and every deposit is in.
    pub fn join_group(env: Env, member: Address, group_id: u64) -> Result<(), ContractError> {
        group::join_group(&env, member, group_id)
    }

    /// Leave a group (only allowed while group is still forming).
    pub fn leave_group(env: Env, member: Address, group_id: u64) -> Result<(), ContractError> {
        group::leave_group(&env, member, group_id)
    }

    /// Activate a forming group if it is ready. Anyone can call this.
    pub fn activate_group(env: Env, group_id: u64) -> Result<bool, ContractError> {
        group::try_activate(&env, group_id)
    }

    pub fn get_group(env: Env, group_id: u64) -> Result<SavingsGroup, ContractError> {
        group::get_group(&env, group_id)
    }

    pub fn get_member(env: Env, group_id: u64, member: Address) -> Result<Member, ContractError> {
        group::get_member(&env, group_id, &member)
    }

    /// Members of a group in rotation order.
    pub fn get_members(env: Env, group_id: u64) -> Result<Vec<Member>, ContractError> {
        group::get_members(&env, group_id)
    }

    /// Get all group IDs a member belongs to.
    pub fn get_member_groups(env: Env, member: Address) -> Vec<u64> {
        group::get_member_groups(&env, member)
    }

    pub fn get_deposit_amount(env: Env, group_id: u64) -> Result<i128, ContractError> {
        Ok(group::deposit_amount(&group::get_group(&env, group_id)?))
    }

    // ─── Contributions ──────────────────────────────────────────────

    /// Re-populate the current cycle's contributions. Idempotent; returns how
    /// many were created. Any other cycle is rejected.
    pub fn create_cycle_contributions(
        env: Env,
        group_id: u64,
        cycle: u32,
    ) -> Result<u32, ContractError> {
        let target = group::get_group(&env, group_id)?;
        contribution::create_cycle_contributions(&env, &target, cycle)
    }

    pub fn is_cycle_complete(env: Env, group_id: u64, cycle: u32) -> Result<bool, ContractError> {
        let target = group::get_group(&env, group_id)?;
        contribution::is_cycle_complete(&env, &target, cycle)
    }

    pub fn get_contribution(env: Env, contribution_id: u64) -> Result<Contribution, ContractError> {
        contribution::get_contribution(&env, contribution_id)
    }

    pub fn get_member_contribution(
        env: Env,
        group_id: u64,
        cycle: u32,
        member: Address,
    ) -> Result<Contribution, ContractError> {
        contribution::get_member_contribution(&env, group_id, cycle, &member)
    }

    pub fn get_cycle_contributions(
        env: Env,
        group_id: u64,
        cycle: u32,
    ) -> Result<Vec<Contribution>, ContractError> {
        contribution::get_cycle_contributions(&env, group_id, cycle)
    }

    // ─── Payments ───────────────────────────────────────────────────

    /// Apply a payment confirmation signed by the registered gateway.
    /// Duplicate deliveries are acknowledged without effect.
    pub fn confirm_payment(
        env: Env,
        gateway: Address,
        event: PaymentEvent,
    ) -> Result<bool, ContractError> {
        payment::confirm_payment(&env, gateway, event)
    }

    // ─── Rotation & Payouts ─────────────────────────────────────────

    /// The member who would receive the next payout, if anyone is eligible.
    pub fn next_recipient(env: Env, group_id: u64) -> Result<Option<Address>, ContractError> {
        let target = group::get_group(&env, group_id)?;
        Ok(rotation::next_recipient(&env, &target)?.map(|member| member.address))
    }

    /// Pay out a completed cycle and advance the group. Anyone can call this;
    /// a cycle that was already paid out is left alone.
    pub fn process_cycle_payout(
        env: Env,
        group_id: u64,
        cycle: u32,
    ) -> Result<Option<Payout>, ContractError> {
        let issued = payout::process_cycle_payout(&env, group_id, cycle)?;
        if issued.is_some() {
            group::advance_cycle(&env, group_id)?;
        }
        Ok(issued)
    }

    pub fn preview_payout(
        env: Env,
        group_id: u64,
        cycle: u32,
    ) -> Result<PayoutPreview, ContractError> {
        payout::preview_payout(&env, group_id, cycle)
    }

    pub fn get_payout(env: Env, group_id: u64, cycle: u32) -> Result<Payout, ContractError> {
        payout::get_payout(&env, group_id, cycle)
    }

    // ─── Penalties ──────────────────────────────────────────────────

    /// Mark overdue contributions and charge penalties as of `as_of`.
    /// Scheduler or protocol admin only.
    pub fn assess_overdue(env: Env, caller: Address, as_of: u64) -> Result<u32, ContractError> {
        caller.require_auth();
        let settings = config::get_config(&env)?;
        if caller != settings.scheduler && caller != storage::get_admin(&env)? {
            return Err(ContractError::Unauthorized);
        }
        penalty::assess_overdue(&env, as_of)
    }

    pub fn get_penalty(env: Env, penalty_id: u64) -> Result<Penalty, ContractError> {
        penalty::get_penalty(&env, penalty_id)
    }

    pub fn get_member_penalties(env: Env, group_id: u64, member: Address) -> Vec<Penalty> {
        penalty::get_member_penalties(&env, group_id, &member)
    }

    // ─── Audit Trail ────────────────────────────────────────────────

    pub fn get_transaction(env: Env, transaction_id: u64) -> Option<Transaction> {
        storage::get_transaction(&env, transaction_id)
    }

    pub fn get_group_transactions(env: Env, group_id: u64) -> Vec<Transaction> {
        let mut transactions = Vec::new(&env);
        for id in storage::get_group_transactions(&env, group_id).iter() {
            if let Some(transaction) = storage::get_transaction(&env, id) {
                transactions.push_back(transaction);
            }
        }
        transactions
    }

    // ─── Scheduler ──────────────────────────────────────────────────

    /// Run one scheduler tick over the open groups.
    pub fn run_scheduler(
        env: Env,
        caller: Address,
        task: SchedulerTask,
    ) -> Result<SweepSummary, ContractError> {
        scheduler::run(&env, caller, task)
    }

    // ─── Admin / Governance ─────────────────────────────────────────

    /// Pause an active group.
    pub fn pause_group(env: Env, admin: Address, group_id: u64) -> Result<(), ContractError> {
        admin::pause_group(&env, admin, group_id)
    }

    /// Resume a paused group.
    pub fn resume_group(env: Env, admin: Address, group_id: u64) -> Result<(), ContractError> {
        admin::resume_group(&env, admin, group_id)
    }

    /// Cancel a group before completion.
    pub fn cancel_group(env: Env, admin: Address, group_id: u64) -> Result<(), ContractError> {
        admin::cancel_group(&env, admin, group_id)
    }

    /// Remove a member from a running group, forfeiting their deposit.
    pub fn remove_member(
        env: Env,
        admin: Address,
        group_id: u64,
        member: Address,
    ) -> Result<(), ContractError> {
        admin::remove_member(&env, admin, group_id, member)
    }

    pub fn waive_contribution(
        env: Env,
        admin: Address,
        contribution_id: u64,
    ) -> Result<Contribution, ContractError> {
        admin::waive_contribution(&env, admin, contribution_id)
    }

    pub fn waive_penalty(env: Env, admin: Address, penalty_id: u64) -> Result<Penalty, ContractError> {
        admin::waive_penalty(&env, admin, penalty_id)
    }

    /// Transfer group admin role.
    pub fn set_group_admin(
        env: Env,
        current_admin: Address,
        group_id: u64,
        new_admin: Address,
    ) -> Result<(), ContractError> {
        admin::set_group_admin(&env, current_admin, group_id, new_admin)
    }
}

#[cfg(test)]
mod payout_test;
#[cfg(test)]
mod penalty_test;
