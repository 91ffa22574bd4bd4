//! Proof of Work (PoW) consensus implementation.
//!
//! A block is accepted once the hex rendering of its digest starts with
//! `difficulty` zero characters. Mining scans nonces upward from 0 and keeps
//! the first one that qualifies, so a given block and difficulty always mine
//! to the same nonce no matter how many threads search.

use powchain_core::{Block, Hash, HEX_LEN};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during consensus operations.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("no nonce in 0..={max_nonce} meets difficulty {difficulty}")]
    MiningExhausted { difficulty: usize, max_nonce: u64 },

    #[error("difficulty {difficulty} exceeds digest length {max}")]
    DifficultyTooHigh { difficulty: usize, max: usize },

    #[error("mining needs at least one thread")]
    NoThreads,

    #[error("{threads} mining threads requested, at most {max} allowed")]
    TooManyThreads { threads: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Upper bound on configured mining threads.
pub const MAX_MINING_THREADS: usize = 1024;

/// Check whether a digest satisfies `difficulty`.
///
/// True iff the first `difficulty` hex characters are all `'0'`; the
/// remaining characters are irrelevant. Difficulty 0 is always met.
pub fn meets_difficulty(hash: &Hash, difficulty: usize) -> bool {
    hash.leading_zero_nibbles() >= difficulty
}

/// Proof of Work configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowConfig {
    /// Required number of leading zero hex characters.
    pub difficulty: usize,
    /// Largest nonce the miner will try (inclusive).
    pub max_nonce: u64,
    /// Worker threads for the nonce search (1 = sequential).
    pub threads: usize,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            difficulty: 1,
            max_nonce: 10_000_000,
            threads: 1,
        }
    }
}

impl PowConfig {
    /// Create a single-threaded configuration.
    pub fn new(difficulty: usize, max_nonce: u64) -> Self {
        Self {
            difficulty,
            max_nonce,
            threads: 1,
        }
    }

    /// Use `threads` workers for the nonce search.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.difficulty > HEX_LEN {
            return Err(ConsensusError::DifficultyTooHigh {
                difficulty: self.difficulty,
                max: HEX_LEN,
            });
        }
        if self.threads == 0 {
            return Err(ConsensusError::NoThreads);
        }
        if self.threads > MAX_MINING_THREADS {
            return Err(ConsensusError::TooManyThreads {
                threads: self.threads,
                max: MAX_MINING_THREADS,
            });
        }
        Ok(())
    }
}

/// Searches block nonces for a digest that meets the configured difficulty.
#[derive(Debug, Clone)]
pub struct Miner {
    config: PowConfig,
}

impl Miner {
    /// Create a new miner, validating the configuration.
    pub fn new(config: PowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &PowConfig {
        &self.config
    }

    /// Get the difficulty this miner targets.
    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    /// Mine `block` in place.
    ///
    /// On success the block carries the smallest qualifying nonce and its
    /// matching hash, and that nonce is returned. On failure the block is
    /// left untouched.
    pub fn mine(&self, block: &mut Block) -> Result<u64> {
        let nonce = self.find_nonce(block)?;
        block.set_nonce(nonce);
        debug!(
            nonce,
            hash = %block.hash(),
            difficulty = self.config.difficulty,
            "block mined"
        );
        Ok(nonce)
    }

    /// Find the smallest qualifying nonce for `block` without modifying it.
    pub fn find_nonce(&self, block: &Block) -> Result<u64> {
        let found = if self.config.threads <= 1 {
            self.search_sequential(block)
        } else {
            self.search_parallel(block)
        };

        found.ok_or_else(|| {
            warn!(
                difficulty = self.config.difficulty,
                max_nonce = self.config.max_nonce,
                "nonce search exhausted"
            );
            ConsensusError::MiningExhausted {
                difficulty: self.config.difficulty,
                max_nonce: self.config.max_nonce,
            }
        })
    }

    fn search_sequential(&self, block: &Block) -> Option<u64> {
        let difficulty = self.config.difficulty;
        (0..=self.config.max_nonce)
            .find(|&nonce| meets_difficulty(&block.hash_with_nonce(nonce), difficulty))
    }

    /// Worker threads actually spawned: the configured count, capped by
    /// the available parallelism.
    pub fn worker_count(&self) -> usize {
        let cores = thread::available_parallelism().map_or(1, |n| n.get());
        self.config.threads.clamp(1, cores)
    }

    /// Strided search: worker `w` of `n` tries `w, w + n, w + 2n, ...`.
    ///
    /// Workers publish hits into a shared minimum. A worker stops once its
    /// next candidate is above the published minimum, so every nonce below
    /// the final answer has been tried by someone.
    fn search_parallel(&self, block: &Block) -> Option<u64> {
        const NONE_FOUND: u64 = u64::MAX;

        let difficulty = self.config.difficulty;
        let max_nonce = self.config.max_nonce;
        let workers = self.worker_count() as u64;
        let best = AtomicU64::new(NONE_FOUND);

        thread::scope(|scope| {
            for worker in 0..workers {
                let best = &best;
                scope.spawn(move || {
                    let mut nonce = worker;
                    while nonce <= max_nonce && nonce < best.load(Ordering::Acquire) {
                        if meets_difficulty(&block.hash_with_nonce(nonce), difficulty) {
                            best.fetch_min(nonce, Ordering::AcqRel);
                            return;
                        }
                        nonce = match nonce.checked_add(workers) {
                            Some(next) => next,
                            None => return,
                        };
                    }
                });
            }
        });

        let found = best.into_inner();
        if found != NONE_FOUND {
            return Some(found);
        }

        // u64::MAX doubles as the "not found" marker, so workers never try it.
        (max_nonce == u64::MAX && meets_difficulty(&block.hash_with_nonce(u64::MAX), difficulty))
            .then_some(u64::MAX)
    }
}
