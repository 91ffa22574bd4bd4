//! Proof of Work consensus for powchain.
//!
//! This crate provides:
//! - The leading-zero difficulty predicate
//! - A bounded nonce search, sequential or split across threads
//! - Transaction validation (positive amount, consistent id)
//! - Block validation (linkage, proof of work, structure, duplicates)
//!
//! # Example
//!
//! ```rust
//! use powchain_consensus::{BlockValidator, Miner, PowConfig};
//! use powchain_core::{Block, Hash};
//!
//! let miner = Miner::new(PowConfig::new(1, 1_000_000)).unwrap();
//!
//! let mut block = Block::new(Hash::ZERO, vec![]);
//! miner.mine(&mut block).unwrap();
//!
//! BlockValidator::validate_pow(&block, 1).unwrap();
//! ```

pub mod pow;
pub mod validator;

// Re-export commonly used types
pub use pow::{meets_difficulty, ConsensusError, Miner, PowConfig, MAX_MINING_THREADS};
pub use validator::{BlockValidator, TransactionValidator, ValidationError};
