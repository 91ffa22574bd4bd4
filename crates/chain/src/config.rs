//! Simulation run parameters.

use powchain_consensus::{PowConfig, MAX_MINING_THREADS};
use powchain_core::HEX_LEN;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in a simulation configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be positive")]
    NotPositive(&'static str),

    #[error("difficulty {difficulty} exceeds digest length {max}")]
    DifficultyTooHigh { difficulty: usize, max: usize },

    #[error("mining_threads {threads} exceeds {max}")]
    TooManyThreads { threads: usize, max: usize },

    #[error("min_balance {min} exceeds max_balance {max}")]
    BalanceRange { min: u64, max: u64 },

    #[error("user_count * max_balance overflows u64")]
    SupplyOverflow,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of generated accounts.
    pub user_count: usize,
    /// Number of generated transactions.
    pub transaction_count: usize,
    /// Transactions per block.
    pub block_size: usize,
    /// Leading zero hex characters required of each block hash.
    pub difficulty: usize,
    /// Stop after this many blocks (`None` = until the pool is empty).
    pub max_blocks: Option<u64>,
    /// Largest nonce tried before giving up on a block.
    pub max_nonce: u64,
    /// Threads used for the nonce search.
    pub mining_threads: usize,
    /// Seed for account/transaction generation and batch sampling.
    pub seed: Option<u64>,
    /// Smallest generated starting balance.
    pub min_balance: u64,
    /// Largest generated starting balance.
    pub max_balance: u64,
    /// Largest generated transfer amount.
    pub max_amount: u64,
    /// Let a round take fewer than `block_size` transactions when the pool
    /// runs short. Off by default: a short pool is a `PoolUnderflow`.
    pub allow_partial_batch: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            user_count: 100,
            transaction_count: 1000,
            block_size: 2,
            difficulty: 1,
            max_blocks: None,
            max_nonce: 10_000_000,
            mining_threads: 1,
            seed: None,
            min_balance: 100,
            max_balance: 1_000_000,
            max_amount: 1000,
            allow_partial_batch: false,
        }
    }
}

impl SimulationConfig {
    /// Check every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("user_count", self.user_count as u64),
            ("transaction_count", self.transaction_count as u64),
            ("block_size", self.block_size as u64),
            ("mining_threads", self.mining_threads as u64),
            ("max_amount", self.max_amount),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::NotPositive(*name));
        }

        if self.difficulty > HEX_LEN {
            return Err(ConfigError::DifficultyTooHigh {
                difficulty: self.difficulty,
                max: HEX_LEN,
            });
        }

        if self.mining_threads > MAX_MINING_THREADS {
            return Err(ConfigError::TooManyThreads {
                threads: self.mining_threads,
                max: MAX_MINING_THREADS,
            });
        }

        if self.min_balance > self.max_balance {
            return Err(ConfigError::BalanceRange {
                min: self.min_balance,
                max: self.max_balance,
            });
        }

        (self.user_count as u64)
            .checked_mul(self.max_balance)
            .ok_or(ConfigError::SupplyOverflow)?;

        Ok(())
    }

    /// Proof-of-work settings for the miner.
    pub fn pow(&self) -> PowConfig {
        PowConfig::new(self.difficulty, self.max_nonce).with_threads(self.mining_threads)
    }
}
