//! # Notification Events
//!
//! Every significant state transition publishes one event. Off-chain
//! notifiers subscribe to these topics and deliver email/SMS/push messages;
//! the engine never talks to a notifier directly.
//!
//! | Topic       | Kind               | Member | Amount               |
//! |-------------|--------------------|--------|----------------------|
//! | `ctb_due`   | ContributionDue    | yes    | amount due           |
//! | `ctb_paid`  | ContributionPaid   | yes    | amount paid          |
//! | `pen_apply` | PenaltyApplied     | yes    | penalty amount       |
//! | `payout`    | PayoutReceived     | yes    | net payout           |
//! | `grp_actv`  | GroupActivated     | no     | contribution amount  |
//! | `grp_comp`  | GroupCompleted     | no     | 0                    |
//!
//! Topics are `(symbol, group_id)` so indexers can filter by group.

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

pub const TOPIC_CONTRIBUTION_DUE: Symbol = symbol_short!("ctb_due");
pub const TOPIC_CONTRIBUTION_PAID: Symbol = symbol_short!("ctb_paid");
pub const TOPIC_PENALTY_APPLIED: Symbol = symbol_short!("pen_apply");
pub const TOPIC_PAYOUT_RECEIVED: Symbol = symbol_short!("payout");
pub const TOPIC_GROUP_ACTIVATED: Symbol = symbol_short!("grp_actv");
pub const TOPIC_GROUP_COMPLETED: Symbol = symbol_short!("grp_comp");

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NotificationKind {
    ContributionDue,
    ContributionPaid,
    PenaltyApplied,
    PayoutReceived,
    GroupActivated,
    GroupCompleted,
}

impl NotificationKind {
    pub fn topic(&self) -> Symbol {
        match self {
            NotificationKind::ContributionDue => TOPIC_CONTRIBUTION_DUE,
            NotificationKind::ContributionPaid => TOPIC_CONTRIBUTION_PAID,
            NotificationKind::PenaltyApplied => TOPIC_PENALTY_APPLIED,
            NotificationKind::PayoutReceived => TOPIC_PAYOUT_RECEIVED,
            NotificationKind::GroupActivated => TOPIC_GROUP_ACTIVATED,
            NotificationKind::GroupCompleted => TOPIC_GROUP_COMPLETED,
        }
    }
}

/// Payload carried by every notification event.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub group_id: u64,
    pub member: Option<Address>,
    pub amount: i128,
}

fn notify(env: &Env, kind: NotificationKind, group_id: u64, member: Option<Address>, amount: i128) {
    let payload = Notification {
        kind,
        group_id,
        member,
        amount,
    };
    env.events().publish((kind.topic(), group_id), payload);
}

pub fn emit_contribution_due(env: &Env, group_id: u64, member: &Address, amount: i128) {
    notify(
        env,
        NotificationKind::ContributionDue,
        group_id,
        Some(member.clone()),
        amount,
    );
}

pub fn emit_contribution_paid(env: &Env, group_id: u64, member: &Address, amount: i128) {
    notify(
        env,
        NotificationKind::ContributionPaid,
        group_id,
        Some(member.clone()),
        amount,
    );
}

pub fn emit_penalty_applied(env: &Env, group_id: u64, member: &Address, amount: i128) {
    notify(
        env,
        NotificationKind::PenaltyApplied,
        group_id,
        Some(member.clone()),
        amount,
    );
}

pub fn emit_payout_received(env: &Env, group_id: u64, recipient: &Address, amount: i128) {
    notify(
        env,
        NotificationKind::PayoutReceived,
        group_id,
        Some(recipient.clone()),
        amount,
    );
}

pub fn emit_group_activated(env: &Env, group_id: u64, contribution_amount: i128) {
    notify(
        env,
        NotificationKind::GroupActivated,
        group_id,
        None,
        contribution_amount,
    );
}

pub fn emit_group_completed(env: &Env, group_id: u64) {
    notify(env, NotificationKind::GroupCompleted, group_id, None, 0);
}
