//! Transaction and block validation rules.
//!
//! These checks are pure: they look at a block (and the facts about the
//! chain passed in) and never mutate anything, so callers can validate
//! first and commit afterwards.

use crate::pow::meets_difficulty;
use powchain_core::{Block, Hash, Transaction};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("transaction amount is zero")]
    ZeroAmount,

    #[error("transaction id does not match its contents: {0:?}")]
    TransactionIdMismatch(Hash),

    #[error("block prev_hash mismatch (expected {expected}, got {got})")]
    InvalidLinkage { expected: Hash, got: Hash },

    #[error("block hash {hash} does not meet difficulty {difficulty}")]
    DifficultyNotMet { hash: Hash, difficulty: usize },

    #[error("block hash does not match its header")]
    InvalidHash,

    #[error("block merkle root verification failed")]
    InvalidMerkleRoot,

    #[error("duplicate transaction: {0:?}")]
    DuplicateTransaction(Hash),

    #[error("genesis block must have no transactions and a zero prev_hash")]
    InvalidGenesis,
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Transaction validator.
pub struct TransactionValidator;

impl TransactionValidator {
    /// Basic transaction validation (positive amount, consistent id).
    pub fn validate_transaction(tx: &Transaction) -> Result<()> {
        if tx.amount == 0 {
            return Err(ValidationError::ZeroAmount);
        }

        if !tx.verify_id() {
            return Err(ValidationError::TransactionIdMismatch(tx.id));
        }

        Ok(())
    }
}

/// Block validator.
pub struct BlockValidator;

impl BlockValidator {
    /// Validate block structure: cached hash, merkle root and unique ids.
    pub fn validate_block_structure(block: &Block) -> Result<()> {
        if !block.verify_hash() {
            return Err(ValidationError::InvalidHash);
        }

        if !block.verify_merkle_root() {
            return Err(ValidationError::InvalidMerkleRoot);
        }

        let mut seen = HashSet::new();
        for tx in block.transactions() {
            if !seen.insert(tx.id) {
                return Err(ValidationError::DuplicateTransaction(tx.id));
            }
        }

        Ok(())
    }

    /// Validate the shape of a genesis block.
    pub fn validate_genesis(block: &Block) -> Result<()> {
        if !block.is_genesis() {
            return Err(ValidationError::InvalidGenesis);
        }
        Self::validate_block_structure(block)
    }

    /// Validate the block links to the current tip.
    pub fn validate_block_extends_parent(block: &Block, parent_hash: Hash) -> Result<()> {
        if block.prev_hash() != parent_hash {
            return Err(ValidationError::InvalidLinkage {
                expected: parent_hash,
                got: block.prev_hash(),
            });
        }

        Ok(())
    }

    /// Re-verify the proof of work. This never searches for a nonce.
    pub fn validate_pow(block: &Block, difficulty: usize) -> Result<()> {
        if !meets_difficulty(&block.hash(), difficulty) {
            return Err(ValidationError::DifficultyNotMet {
                hash: block.hash(),
                difficulty,
            });
        }

        Ok(())
    }

    /// Reject transactions the chain has already included.
    pub fn validate_not_included(block: &Block, included: &HashSet<Hash>) -> Result<()> {
        match block.transactions().iter().find(|tx| included.contains(&tx.id)) {
            Some(tx) => Err(ValidationError::DuplicateTransaction(tx.id)),
            None => Ok(()),
        }
    }

    /// Full validation for appending `block` on top of `parent_hash`.
    pub fn validate_full(
        block: &Block,
        parent_hash: Hash,
        difficulty: usize,
        included: &HashSet<Hash>,
    ) -> Result<()> {
        Self::validate_block_extends_parent(block, parent_hash)?;
        Self::validate_pow(block, difficulty)?;
        Self::validate_block_structure(block)?;
        Self::validate_not_included(block, included)?;
        Ok(())
    }
}
