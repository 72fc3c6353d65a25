use soroban_sdk::{Address, Env, String, Vec};

use crate::errors::ContractError;
use crate::types::{
    Contribution, DataKey, Member, Payout, Penalty, PenaltyKind, ProtocolConfig, SavingsGroup,
    Transaction,
};

const INSTANCE_TTL_THRESHOLD: u32 = 100;
const INSTANCE_TTL_EXTEND: u32 = 500;
const PERSISTENT_TTL_THRESHOLD: u32 = 100;
const PERSISTENT_TTL_EXTEND: u32 = 1000;

// --- Admin & Config ---

pub fn get_admin(env: &Env) -> Result<Address, ContractError> {
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(ContractError::NotInitialized)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    extend_instance_ttl(env);
}

pub fn has_admin(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn get_config(env: &Env) -> Result<ProtocolConfig, ContractError> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(ContractError::NotInitialized)
}

pub fn set_config(env: &Env, config: &ProtocolConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    extend_instance_ttl(env);
}

// --- Counters ---

/// Allocates the next id from a monotonic instance counter. Ids start at 1.
pub fn next_id(env: &Env, counter: DataKey) -> u64 {
    let next = env.storage().instance().get::<_, u64>(&counter).unwrap_or(0) + 1;
    env.storage().instance().set(&counter, &next);
    extend_instance_ttl(env);
    next
}

pub fn get_sweep_cursor(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::SweepCursor)
        .unwrap_or(0)
}

pub fn set_sweep_cursor(env: &Env, cursor: u32) {
    env.storage().instance().set(&DataKey::SweepCursor, &cursor);
    extend_instance_ttl(env);
}

// --- Group ---

pub fn get_group(env: &Env, group_id: u64) -> Option<SavingsGroup> {
    let key = DataKey::Group(group_id);
    let result = env.storage().persistent().get(&key);
    if result.is_some() {
        extend_persistent_ttl(env, &key);
    }
    result
}

pub fn set_group(env: &Env, group: &SavingsGroup) {
    let key = DataKey::Group(group.id);
    env.storage().persistent().set(&key, group);
    extend_persistent_ttl(env, &key);
}

// --- Open Groups (forming, active or paused) ---

pub fn get_open_groups(env: &Env) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::OpenGroups)
        .unwrap_or(Vec::new(env))
}

pub fn add_open_group(env: &Env, group_id: u64) {
    let key = DataKey::OpenGroups;
    let mut groups = get_open_groups(env);
    groups.push_back(group_id);
    env.storage().persistent().set(&key, &groups);
    extend_persistent_ttl(env, &key);
}

pub fn remove_open_group(env: &Env, group_id: u64) {
    let key = DataKey::OpenGroups;
    let groups = get_open_groups(env);
    let mut remaining = Vec::new(env);
    for g in groups.iter() {
        if g != group_id {
            remaining.push_back(g);
        }
    }
    env.storage().persistent().set(&key, &remaining);
    extend_persistent_ttl(env, &key);
}

// --- Members ---

pub fn get_member(env: &Env, group_id: u64, address: &Address) -> Option<Member> {
    let key = DataKey::Member(group_id, address.clone());
    let result = env.storage().persistent().get(&key);
    if result.is_some() {
        extend_persistent_ttl(env, &key);
    }
    result
}

pub fn set_member(env: &Env, member: &Member) {
    let key = DataKey::Member(member.group_id, member.address.clone());
    env.storage().persistent().set(&key, member);
    extend_persistent_ttl(env, &key);
}

pub fn remove_member(env: &Env, group_id: u64, address: &Address) {
    env.storage()
        .persistent()
        .remove(&DataKey::Member(group_id, address.clone()));
}

/// Member addresses in rotation-position order.
pub fn get_roster(env: &Env, group_id: u64) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::Roster(group_id))
        .unwrap_or(Vec::new(env))
}

pub fn set_roster(env: &Env, group_id: u64, roster: &Vec<Address>) {
    let key = DataKey::Roster(group_id);
    env.storage().persistent().set(&key, roster);
    extend_persistent_ttl(env, &key);
}

// --- Member Groups ---

pub fn get_member_groups(env: &Env, member: &Address) -> Vec<u64> {
    let key = DataKey::MemberGroups(member.clone());
    env.storage()
        .persistent()
        .get(&key)
        .unwrap_or(Vec::new(env))
}

pub fn add_member_group(env: &Env, member: &Address, group_id: u64) {
    let key = DataKey::MemberGroups(member.clone());
    let mut groups = get_member_groups(env, member);
    groups.push_back(group_id);
    env.storage().persistent().set(&key, &groups);
    extend_persistent_ttl(env, &key);
}

pub fn remove_member_group(env: &Env, member: &Address, group_id: u64) {
    let key = DataKey::MemberGroups(member.clone());
    let groups = get_member_groups(env, member);
    let mut new_groups = Vec::new(env);
    for g in groups.iter() {
        if g != group_id {
            new_groups.push_back(g);
        }
    }
    env.storage().persistent().set(&key, &new_groups);
    extend_persistent_ttl(env, &key);
}

// --- Contributions ---

pub fn get_contribution(env: &Env, contribution_id: u64) -> Option<Contribution> {
    let key = DataKey::Contribution(contribution_id);
    let result = env.storage().persistent().get(&key);
    if result.is_some() {
        extend_persistent_ttl(env, &key);
    }
    result
}

pub fn set_contribution(env: &Env, contribution: &Contribution) {
    let key = DataKey::Contribution(contribution.id);
    env.storage().persistent().set(&key, contribution);
    extend_persistent_ttl(env, &key);
}

pub fn get_cycle_contribution_id(
    env: &Env,
    group_id: u64,
    cycle: u32,
    member: &Address,
) -> Option<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::CycleContribution(group_id, cycle, member.clone()))
}

pub fn get_cycle_contribution_ids(env: &Env, group_id: u64, cycle: u32) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::CycleContributions(group_id, cycle))
        .unwrap_or(Vec::new(env))
}

/// Stores a new contribution and indexes it by (group, cycle, member).
pub fn insert_contribution(env: &Env, contribution: &Contribution) {
    set_contribution(env, contribution);

    let unique = DataKey::CycleContribution(
        contribution.group_id,
        contribution.cycle,
        contribution.member.clone(),
    );
    env.storage().persistent().set(&unique, &contribution.id);
    extend_persistent_ttl(env, &unique);

    let list_key = DataKey::CycleContributions(contribution.group_id, contribution.cycle);
    let mut ids = get_cycle_contribution_ids(env, contribution.group_id, contribution.cycle);
    ids.push_back(contribution.id);
    env.storage().persistent().set(&list_key, &ids);
    extend_persistent_ttl(env, &list_key);
}

// --- Payouts ---

pub fn get_payout(env: &Env, group_id: u64, cycle: u32) -> Option<Payout> {
    env.storage()
        .persistent()
        .get(&DataKey::Payout(group_id, cycle))
}

pub fn has_payout(env: &Env, group_id: u64, cycle: u32) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Payout(group_id, cycle))
}

pub fn set_payout(env: &Env, payout: &Payout) {
    let key = DataKey::Payout(payout.group_id, payout.cycle);
    env.storage().persistent().set(&key, payout);
    extend_persistent_ttl(env, &key);
}

// --- Penalties ---

pub fn get_penalty(env: &Env, penalty_id: u64) -> Option<Penalty> {
    env.storage()
        .persistent()
        .get(&DataKey::Penalty(penalty_id))
}

pub fn set_penalty(env: &Env, penalty: &Penalty) {
    let key = DataKey::Penalty(penalty.id);
    env.storage().persistent().set(&key, penalty);
    extend_persistent_ttl(env, &key);
}

pub fn has_penalty_guard(env: &Env, contribution_id: u64, kind: PenaltyKind) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::PenaltyGuard(contribution_id, kind))
}

pub fn set_penalty_guard(env: &Env, contribution_id: u64, kind: PenaltyKind, penalty_id: u64) {
    let key = DataKey::PenaltyGuard(contribution_id, kind);
    env.storage().persistent().set(&key, &penalty_id);
    extend_persistent_ttl(env, &key);
}

pub fn has_exit_penalty(env: &Env, group_id: u64, member: &Address) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::ExitPenalty(group_id, member.clone()))
}

pub fn set_exit_penalty(env: &Env, group_id: u64, member: &Address, penalty_id: u64) {
    let key = DataKey::ExitPenalty(group_id, member.clone());
    env.storage().persistent().set(&key, &penalty_id);
    extend_persistent_ttl(env, &key);
}

pub fn get_member_penalties(env: &Env, group_id: u64, member: &Address) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::MemberPenalties(group_id, member.clone()))
        .unwrap_or(Vec::new(env))
}

pub fn add_member_penalty(env: &Env, group_id: u64, member: &Address, penalty_id: u64) {
    let key = DataKey::MemberPenalties(group_id, member.clone());
    let mut ids = get_member_penalties(env, group_id, member);
    ids.push_back(penalty_id);
    env.storage().persistent().set(&key, &ids);
    extend_persistent_ttl(env, &key);
}

// --- Transactions (append-only) ---

pub fn get_transaction(env: &Env, transaction_id: u64) -> Option<Transaction> {
    env.storage()
        .persistent()
        .get(&DataKey::Transaction(transaction_id))
}

pub fn get_group_transactions(env: &Env, group_id: u64) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::GroupTransactions(group_id))
        .unwrap_or(Vec::new(env))
}

/// The only write path for transactions; records are never updated.
pub fn append_transaction(env: &Env, transaction: &Transaction) {
    let key = DataKey::Transaction(transaction.id);
    env.storage().persistent().set(&key, transaction);
    extend_persistent_ttl(env, &key);

    let list_key = DataKey::GroupTransactions(transaction.group_id);
    let mut ids = get_group_transactions(env, transaction.group_id);
    ids.push_back(transaction.id);
    env.storage().persistent().set(&list_key, &ids);
    extend_persistent_ttl(env, &list_key);
}

// --- Payment References ---

pub fn is_reference_consumed(env: &Env, reference: &String) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::PaymentRef(reference.clone()))
}

pub fn consume_reference(env: &Env, reference: &String, transaction_id: u64) {
    let key = DataKey::PaymentRef(reference.clone());
    env.storage().persistent().set(&key, &transaction_id);
    extend_persistent_ttl(env, &key);
}

// --- TTL Management ---

fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

fn extend_persistent_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}
