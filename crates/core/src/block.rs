//! Block and block header structures.

use crate::hash::{hash, Hash};
use crate::merkle::merkle_root;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// The header of a block. The block digest is the hash of this header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Hash of the previous block (`Hash::ZERO` for genesis).
    pub prev_hash: Hash,
    /// Merkle root of the transaction ids, in block order.
    pub merkle_root: Hash,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// Proof-of-work nonce.
    pub nonce: u64,
}

impl BlockHeader {
    /// Calculate the hash of this block header.
    pub fn hash(&self) -> Hash {
        let encoded = bincode::serialize(self).expect("serialization should not fail");
        hash(&encoded)
    }

    /// Get the current Unix timestamp in milliseconds.
    pub fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_millis() as u64
    }
}

/// A block: an ordered transaction list, its header and the cached digest.
///
/// The fields are private so the cached hash can never disagree with the
/// contents. The nonce is the only mutable part, via [`Block::set_nonce`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    header: BlockHeader,
    transactions: Vec<Transaction>,
    hash: Hash,
}

impl Block {
    /// Create a new block stamped with the current time and nonce 0.
    pub fn new(prev_hash: Hash, transactions: Vec<Transaction>) -> Self {
        Self::with_timestamp(prev_hash, transactions, BlockHeader::current_timestamp())
    }

    /// Create a new block with an explicit timestamp and nonce 0.
    pub fn with_timestamp(prev_hash: Hash, transactions: Vec<Transaction>, timestamp: u64) -> Self {
        let header = BlockHeader {
            prev_hash,
            merkle_root: Self::compute_merkle_root(&transactions),
            timestamp,
            nonce: 0,
        };

        Self {
            hash: header.hash(),
            header,
            transactions,
        }
    }

    /// Create the genesis block.
    pub fn genesis() -> Self {
        Self::new(Hash::ZERO, Vec::new())
    }

    fn compute_merkle_root(transactions: &[Transaction]) -> Hash {
        let ids: Vec<Hash> = transactions.iter().map(|tx| tx.id).collect();
        merkle_root(&ids)
    }

    /// Get the cached block hash.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Get the block header.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// Get the transactions in settlement order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Get the hash of the previous block.
    pub fn prev_hash(&self) -> Hash {
        self.header.prev_hash
    }

    /// Get the block timestamp (Unix milliseconds).
    pub fn timestamp(&self) -> u64 {
        self.header.timestamp
    }

    /// Get the current nonce.
    pub fn nonce(&self) -> u64 {
        self.header.nonce
    }

    /// Get the merkle root of the transaction ids.
    pub fn merkle_root(&self) -> Hash {
        self.header.merkle_root
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.header.prev_hash == Hash::ZERO && self.transactions.is_empty()
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Hash this block would have with `nonce`, without changing it.
    pub fn hash_with_nonce(&self, nonce: u64) -> Hash {
        BlockHeader {
            nonce,
            ..self.header
        }
        .hash()
    }

    /// Set the nonce and recompute the cached hash.
    pub fn set_nonce(&mut self, nonce: u64) {
        self.header.nonce = nonce;
        self.recompute_hash();
    }

    /// Recompute the cached hash from the header.
    pub fn recompute_hash(&mut self) -> Hash {
        self.hash = self.header.hash();
        self.hash
    }

    /// Verify the cached hash matches the header.
    pub fn verify_hash(&self) -> bool {
        self.hash == self.header.hash()
    }

    /// Verify the merkle root matches the transactions.
    pub fn verify_merkle_root(&self) -> bool {
        Self::compute_merkle_root(&self.transactions) == self.header.merkle_root
    }

    /// Sum of all transferred amounts, saturating.
    pub fn total_amount(&self) -> u64 {
        self.transactions
            .iter()
            .fold(0u64, |acc, tx| acc.saturating_add(tx.amount))
    }
}
