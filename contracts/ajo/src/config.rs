//! Protocol configuration.
//!
//! Everything the engine would otherwise hard-code (fee and penalty rates,
//! the grace period, the scheduler batch size) lives in [`ProtocolConfig`],
//! stored once in instance storage and handed to the components that need
//! it. Groups copy the defaults at creation unless they override them.

use soroban_sdk::{symbol_short, Address, Env};

use crate::errors::ContractError;
use crate::fees::MAX_BPS;
use crate::storage;
use crate::types::{ProtocolConfig, DAY_SECONDS};

/// 10 % of every cycle's pool.
pub const DEFAULT_SERVICE_FEE_BPS: u32 = 1_000;
/// 5 % of the contribution amount per late payment.
pub const DEFAULT_PENALTY_BPS: u32 = 500;
pub const DEFAULT_GRACE_PERIOD: u64 = 2 * DAY_SECONDS;
pub const DEFAULT_SWEEP_BATCH_SIZE: u32 = 25;

pub fn default_config(gateway: Address, scheduler: Address) -> ProtocolConfig {
    ProtocolConfig {
        gateway,
        scheduler,
        default_service_fee_bps: DEFAULT_SERVICE_FEE_BPS,
        default_penalty_bps: DEFAULT_PENALTY_BPS,
        default_grace_period: DEFAULT_GRACE_PERIOD,
        sweep_batch_size: DEFAULT_SWEEP_BATCH_SIZE,
    }
}

pub fn validate(config: &ProtocolConfig) -> Result<(), ContractError> {
    if config.default_service_fee_bps > MAX_BPS || config.default_penalty_bps > MAX_BPS {
        return Err(ContractError::InvalidConfig);
    }
    if config.sweep_batch_size == 0 {
        return Err(ContractError::InvalidConfig);
    }
    Ok(())
}

/// Replaces the protocol configuration. Protocol admin only.
pub fn set_config(env: &Env, admin: Address, config: ProtocolConfig) -> Result<(), ContractError> {
    admin.require_auth();

    if admin != storage::get_admin(env)? {
        return Err(ContractError::Unauthorized);
    }
    validate(&config)?;

    storage::set_config(env, &config);

    env.events().publish((symbol_short!("cfg_set"),), admin);

    Ok(())
}

pub fn get_config(env: &Env) -> Result<ProtocolConfig, ContractError> {
    storage::get_config(env)
}
