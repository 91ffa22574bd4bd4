//! The authoritative in-memory chain.
//!
//! The chain is never empty: it starts at a genesis block and only grows
//! through [`Blockchain::append`], which validates before it commits.

use crate::report::{BlockReport, BlockSelector};
use powchain_consensus::{meets_difficulty, BlockValidator, ConsensusError, ValidationError};
use powchain_core::{Block, Hash, HEX_LEN};
use std::collections::HashSet;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("block index {index} out of range (chain length {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Main chain struct: an ordered, validated sequence of blocks.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// Blocks, genesis first.
    blocks: Vec<Block>,
    /// Ids of every transaction included so far.
    included: HashSet<Hash>,
    /// Difficulty every appended block must meet.
    difficulty: usize,
}

impl Blockchain {
    /// Create a chain holding a fresh genesis block.
    pub fn new(difficulty: usize) -> Result<Self> {
        Self::with_genesis(Block::genesis(), difficulty)
    }

    /// Create a chain from a caller-supplied genesis block.
    ///
    /// The genesis block must have no transactions and the zero previous
    /// hash. It is not required to meet the difficulty.
    pub fn with_genesis(genesis: Block, difficulty: usize) -> Result<Self> {
        if difficulty > HEX_LEN {
            return Err(ConsensusError::DifficultyTooHigh {
                difficulty,
                max: HEX_LEN,
            }
            .into());
        }
        BlockValidator::validate_genesis(&genesis)?;

        Ok(Self {
            blocks: vec![genesis],
            included: HashSet::new(),
            difficulty,
        })
    }

    /// Get the active difficulty.
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Number of blocks, genesis included. Always at least 1.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: the chain holds at least the genesis block.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Current height (genesis is height 0).
    pub fn height(&self) -> u64 {
        (self.blocks.len() - 1) as u64
    }

    /// Get the genesis block.
    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    /// Get the latest block.
    pub fn tip(&self) -> &Block {
        self.blocks.last().unwrap_or(&self.blocks[0])
    }

    /// Get a block by index.
    pub fn get(&self, index: usize) -> Result<&Block> {
        self.blocks
            .get(index)
            .ok_or(BlockchainError::IndexOutOfRange {
                index,
                len: self.blocks.len(),
            })
    }

    /// Iterate over all blocks, genesis first.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Check whether a transaction has been included in an appended block.
    pub fn contains_transaction(&self, tx_id: &Hash) -> bool {
        self.included.contains(tx_id)
    }

    /// Validate and append a mined block.
    ///
    /// The block must link to the current tip and its hash must already
    /// meet the difficulty; nothing is mined here. On error the chain is
    /// unchanged.
    pub fn append(&mut self, block: Block) -> Result<&Block> {
        BlockValidator::validate_full(&block, self.tip().hash(), self.difficulty, &self.included)?;

        self.included
            .extend(block.transactions().iter().map(|tx| tx.id));

        info!(
            height = self.blocks.len(),
            hash = %block.hash(),
            nonce = block.nonce(),
            txs = block.tx_count(),
            "block appended"
        );
        self.blocks.push(block);

        Ok(self.tip())
    }

    /// Re-check linkage and difficulty over the whole chain.
    pub fn verify(&self) -> Result<()> {
        for pair in self.blocks.windows(2) {
            let (parent, block) = (&pair[0], &pair[1]);
            BlockValidator::validate_block_extends_parent(block, parent.hash())?;
            BlockValidator::validate_pow(block, self.difficulty)?;
            BlockValidator::validate_block_structure(block)?;
        }
        Ok(())
    }

    /// Describe a block. An out-of-range index is an error, never the tip.
    pub fn describe_block(&self, selector: BlockSelector) -> Result<BlockReport> {
        let index = match selector {
            BlockSelector::Latest => self.blocks.len() - 1,
            BlockSelector::Index(index) => index,
        };
        Ok(BlockReport::new(index, self.get(index)?))
    }

    /// Get blockchain statistics.
    pub fn stats(&self) -> BlockchainStats {
        let tip = self.tip();
        BlockchainStats {
            height: self.height(),
            latest_block_hash: tip.hash(),
            latest_timestamp: tip.timestamp(),
            total_transactions: self.included.len(),
            difficulty: self.difficulty,
            tip_meets_difficulty: tip.is_genesis() || meets_difficulty(&tip.hash(), self.difficulty),
        }
    }
}

/// Blockchain statistics.
#[derive(Debug, Clone)]
pub struct BlockchainStats {
    /// Current chain height.
    pub height: u64,
    /// Hash of the latest block.
    pub latest_block_hash: Hash,
    /// Timestamp of the latest block.
    pub latest_timestamp: u64,
    /// Transactions included across all blocks.
    pub total_transactions: usize,
    /// Active difficulty.
    pub difficulty: usize,
    /// Whether the tip satisfies the active difficulty (genesis always does).
    pub tip_meets_difficulty: bool,
}
