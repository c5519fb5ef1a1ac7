//! # Block Economics
//!
//! Gas and reward for an accepted event.
//!
//! - `gas_used = base_gas + ceil(work_score * gas_per_work_unit)`
//! - `gas_price = base_gas_price * (2 - (1 + x) * e^(-x))`, `x = work_score / work_scale`
//! - `reward = base_reward * DAMPING_FACTOR`
//!
//! The price curve is the step response of a critically damped system: it
//! starts at `base_gas_price`, rises monotonically and approaches twice the
//! base without exceeding it. The reward does not depend on work at all, so inflated scores
//! buy a higher gas price and nothing else.

use super::block::ConsensusConfig;

/// √2⁄2. Also the gossip equilibrium constant.
pub const DAMPING_FACTOR: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Calculated figures for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockEconomics {
    pub gas_used: u64,
    pub gas_price: f64,
    pub reward: f64,
}

pub fn gas_used(config: &ConsensusConfig, work_score: f64) -> u64 {
    // `as` saturates for huge or non-finite values.
    let extra = (work_score.max(0.0) * config.gas_per_work_unit).ceil() as u64;
    config.base_gas.saturating_add(extra)
}

pub fn gas_price(config: &ConsensusConfig, work_score: f64) -> f64 {
    let x = if config.work_scale > 0.0 {
        work_score.max(0.0) / config.work_scale
    } else {
        0.0
    };
    config.base_gas_price * (2.0 - (1.0 + x) * (-x).exp())
}

pub fn reward(config: &ConsensusConfig) -> f64 {
    config.base_reward * DAMPING_FACTOR
}

pub fn calculate(config: &ConsensusConfig, work_score: f64) -> BlockEconomics {
    BlockEconomics {
        gas_used: gas_used(config, work_score),
        gas_price: gas_price(config, work_score),
        reward: reward(config),
    }
}
