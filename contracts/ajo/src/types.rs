use soroban_sdk::{contracttype, Address, String};

/// Status of a savings group throughout its lifecycle.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GroupStatus {
    Forming,   // Accepting members and deposits
    Active,    // Cycles in progress
    Paused,    // Admin has paused the group
    Completed, // Every member has been paid once
    Cancelled, // Closed by the admin before completion
}

impl GroupStatus {
    /// Completed and cancelled groups never accept new contributions or payouts.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GroupStatus::Completed | GroupStatus::Cancelled)
    }
}

/// How often a group collects contributions.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

pub const DAY_SECONDS: u64 = 86_400;

impl Frequency {
    /// Length of one cycle in ledger seconds. Months are fixed at 30 days.
    pub fn seconds(&self) -> u64 {
        match self {
            Frequency::Daily => DAY_SECONDS,
            Frequency::Weekly => 7 * DAY_SECONDS,
            Frequency::Monthly => 30 * DAY_SECONDS,
        }
    }
}

/// Core savings group configuration and state.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct SavingsGroup {
    pub id: u64,
    pub name: String,
    pub admin: Address,
    pub contribution_amount: i128,
    pub frequency: Frequency,
    pub max_members: u32,
    pub member_count: u32,
    pub security_deposit_bps: u32,
    pub service_fee_bps: u32,
    pub penalty_bps: u32,
    pub grace_period: u64,
    pub current_cycle: u32,
    pub cycle_started_at: u64,
    pub status: GroupStatus,
    pub created_at: u64,
    pub started_at: Option<u64>,
}

/// Parameters supplied when a group is created. Unset overrides fall back to
/// the protocol defaults.
#[contracttype]
#[derive(Clone, Debug)]
pub struct GroupParams {
    pub name: String,
    pub contribution_amount: i128,
    pub frequency: Frequency,
    pub max_members: u32,
    pub security_deposit_bps: u32,
    pub service_fee_bps: Option<u32>,
    pub penalty_bps: Option<u32>,
    pub grace_period: Option<u64>,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemberStatus {
    Active,
    Removed,
}

/// Membership record of one address in one group.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub id: u64,
    pub group_id: u64,
    pub address: Address,
    pub position: u32,
    pub deposit_paid: bool,
    pub status: MemberStatus,
    pub received_payout: bool,
    pub joined_at: u64,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContributionStatus {
    Pending,
    Paid,
    Overdue,
    Waived,
}

impl ContributionStatus {
    /// Paid and waived contributions both count toward cycle completion.
    pub fn is_settled(&self) -> bool {
        matches!(self, ContributionStatus::Paid | ContributionStatus::Waived)
    }
}

/// One member's obligation for one cycle.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct Contribution {
    pub id: u64,
    pub group_id: u64,
    pub member: Address,
    pub cycle: u32,
    pub amount_due: i128,
    pub service_fee: i128,
    pub status: ContributionStatus,
    pub due_date: u64,
    pub paid_at: Option<u64>,
    pub reference: Option<String>,
    pub reminded: bool,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Disbursement of one cycle's pooled contributions.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct Payout {
    pub group_id: u64,
    pub cycle: u32,
    pub recipient: Address,
    pub gross: i128,
    pub service_fee: i128,
    pub amount: i128,
    pub status: PayoutStatus,
    pub paid_at: u64,
    pub transaction_id: u64,
}

/// Split of a cycle's pool, computed without writing anything.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct PayoutPreview {
    pub gross: i128,
    pub service_fee: i128,
    pub amount: i128,
    pub recipient: Option<Address>,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PenaltyKind {
    LatePayment,
    MissedPayment,
    EarlyExit,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PenaltyStatus {
    Unpaid,
    Paid,
    Waived,
}

#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct Penalty {
    pub id: u64,
    pub group_id: u64,
    pub member: Address,
    pub contribution_id: Option<u64>,
    pub kind: PenaltyKind,
    pub amount: i128,
    pub status: PenaltyStatus,
    pub created_at: u64,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransactionKind {
    ContributionPayment,
    DepositPayment,
    PayoutDisbursement,
    PenaltyCharge,
    PenaltyPayment,
}

/// Immutable financial audit record.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id: u64,
    pub group_id: u64,
    pub member: Address,
    pub kind: TransactionKind,
    pub amount: i128,
    pub reference: Option<String>,
    pub created_at: u64,
}

// --- External interfaces ---

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PaymentStatus {
    Success,
    Failed,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PaymentKind {
    Contribution,
    Deposit,
    Penalty,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PaymentMetadata {
    pub group_id: u64,
    pub member: Address,
    pub contribution_id: Option<u64>,
    pub penalty_id: Option<u64>,
    pub kind: PaymentKind,
}

/// Payment confirmation delivered by the payment gateway.
#[contracttype]
#[derive(Clone, Debug)]
pub struct PaymentEvent {
    pub reference: String,
    pub amount: i128,
    pub status: PaymentStatus,
    pub metadata: PaymentMetadata,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchedulerTask {
    Daily,
    Hourly,
}

#[contracttype]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepSummary {
    pub groups_processed: u32,
    pub groups_skipped: u32,
    pub penalties_applied: u32,
    pub payouts_issued: u32,
    pub groups_activated: u32,
    pub groups_completed: u32,
}

/// Protocol-wide settings injected at construction.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct ProtocolConfig {
    pub gateway: Address,
    pub scheduler: Address,
    pub default_service_fee_bps: u32,
    pub default_penalty_bps: u32,
    pub default_grace_period: u64,
    pub sweep_batch_size: u32,
}

/// Storage keys for all contract data.
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Config,
    GroupCounter,
    MemberCounter,
    ContributionCounter,
    PenaltyCounter,
    TransactionCounter,
    SweepCursor,
    OpenGroups,
    Group(u64),
    Member(u64, Address),
    Roster(u64),
    MemberGroups(Address),
    Contribution(u64),
    CycleContribution(u64, u32, Address),
    CycleContributions(u64, u32),
    Payout(u64, u32),
    Penalty(u64),
    PenaltyGuard(u64, PenaltyKind),
    ExitPenalty(u64, Address),
    MemberPenalties(u64, Address),
    Transaction(u64),
    GroupTransactions(u64),
    PaymentRef(String),
}
