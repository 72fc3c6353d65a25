use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    GroupNotFound = 4,
    GroupFull = 5,
    AlreadyMember = 6,
    NotMember = 7,
    GroupNotActive = 8,
    InvalidAmount = 9,
    InvalidConfig = 10,
    GroupNotForming = 11,
    InsufficientMembers = 12,
    GroupClosed = 13,
    MemberNotFound = 14,
    ContributionNotFound = 15,
    ContributionMismatch = 16,
    ContributionNotOpen = 17,
    PenaltyNotFound = 18,
    PenaltyNotUnpaid = 19,
    InvalidTimestamp = 20,
    MissingReference = 21,
    UnverifiedPayment = 22,
    PayoutNotFound = 23,
    InvalidCycle = 24,

    // Integrity violations: these indicate corrupted state, not a race.
    DuplicateRotationPosition = 30,
    CycleNotComplete = 31,
}
