//! Transaction mempool for pending transactions.
//!
//! The mempool holds transactions not yet included in any appended block.
//! Selection samples without removing; removal happens by id once a block
//! carrying the transactions has been appended.

use powchain_consensus::{TransactionValidator, ValidationError};
use powchain_core::{Hash, Transaction};
use rand::Rng;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during mempool operations.
#[derive(Debug, Error)]
pub enum MempoolError {
    #[error("transaction already in mempool: {0:?}")]
    DuplicateTransaction(Hash),

    #[error("mempool is full (capacity: {0})")]
    MempoolFull(usize),

    #[error("batch of {requested} requested but only {available} pending")]
    PoolUnderflow { requested: usize, available: usize },

    #[error("invalid transaction: {0}")]
    Invalid(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, MempoolError>;

/// Configuration for the mempool.
#[derive(Debug, Clone)]
pub struct MempoolConfig {
    /// Maximum number of transactions in the mempool.
    pub max_transactions: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_transactions: 1_000_000,
        }
    }
}

/// Transaction mempool.
pub struct Mempool {
    /// Configuration.
    config: MempoolConfig,
    /// Transactions indexed by id.
    transactions: HashMap<Hash, Transaction>,
    /// Ids in arrival order. Sampling indexes into this, so a seeded rng
    /// always picks the same batch.
    order: Vec<Hash>,
}

impl Mempool {
    /// Create a new mempool with default configuration.
    pub fn new() -> Self {
        Self::with_config(MempoolConfig::default())
    }

    /// Create a new mempool with the given configuration.
    pub fn with_config(config: MempoolConfig) -> Self {
        Self {
            config,
            transactions: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Get the number of transactions in the mempool.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check if the mempool is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Check if a transaction is in the mempool.
    pub fn contains(&self, tx_id: &Hash) -> bool {
        self.transactions.contains_key(tx_id)
    }

    /// Get a transaction from the mempool.
    pub fn get(&self, tx_id: &Hash) -> Option<&Transaction> {
        self.transactions.get(tx_id)
    }

    /// Add a transaction to the mempool.
    pub fn add(&mut self, tx: Transaction) -> Result<()> {
        TransactionValidator::validate_transaction(&tx)?;

        if self.contains(&tx.id) {
            return Err(MempoolError::DuplicateTransaction(tx.id));
        }

        if self.transactions.len() >= self.config.max_transactions {
            return Err(MempoolError::MempoolFull(self.config.max_transactions));
        }

        self.order.push(tx.id);
        self.transactions.insert(tx.id, tx);

        Ok(())
    }

    /// Sample `size` distinct pending transactions.
    ///
    /// Nothing is removed. The batch is a random sample, not a prefix, and
    /// its order is the sampling order. Asking for more than is pending is
    /// an error; no partial batch is returned.
    pub fn select_batch<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> Result<Vec<Transaction>> {
        if size > self.order.len() {
            return Err(MempoolError::PoolUnderflow {
                requested: size,
                available: self.order.len(),
            });
        }

        Ok(rand::seq::index::sample(rng, self.order.len(), size)
            .into_iter()
            .map(|i| self.transactions[&self.order[i]].clone())
            .collect())
    }

    /// Remove transactions by id. Unknown ids are ignored.
    ///
    /// Returns the number of transactions actually removed.
    pub fn discard<'a>(&mut self, tx_ids: impl IntoIterator<Item = &'a Hash>) -> usize {
        let before = self.transactions.len();
        for id in tx_ids {
            self.transactions.remove(id);
        }
        let removed = before - self.transactions.len();
        if removed > 0 {
            self.order.retain(|id| self.transactions.contains_key(id));
        }
        removed
    }

    /// Get mempool statistics.
    pub fn stats(&self) -> MempoolStats {
        MempoolStats {
            total_transactions: self.len(),
            total_amount: self
                .transactions
                .values()
                .fold(0u64, |acc, tx| acc.saturating_add(tx.amount)),
            capacity: self.config.max_transactions,
        }
    }
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}

/// Mempool statistics.
#[derive(Debug, Clone)]
pub struct MempoolStats {
    /// Total number of transactions.
    pub total_transactions: usize,
    /// Sum of pending amounts (saturating).
    pub total_amount: u64,
    /// Mempool capacity.
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::hash;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn tx(amount: u64) -> Transaction {
        Transaction::transfer(hash(b"alice"), hash(b"bob"), amount)
    }

    fn filled(n: u64) -> Mempool {
        let mut mempool = Mempool::new();
        for amount in 1..=n {
            mempool.add(tx(amount)).unwrap();
        }
        mempool
    }

    #[test]
    fn test_mempool_add_and_get() {
        let mut mempool = Mempool::new();
        let tx = tx(1000);

        assert!(mempool.add(tx.clone()).is_ok());
        assert_eq!(mempool.len(), 1);
        assert!(mempool.contains(&tx.id));
        assert_eq!(mempool.get(&tx.id).unwrap(), &tx);
    }

    #[test]
    fn test_mempool_duplicate_rejected() {
        let mut mempool = Mempool::new();

        assert!(mempool.add(tx(1000)).is_ok());
        assert!(matches!(
            mempool.add(tx(1000)),
            Err(MempoolError::DuplicateTransaction(_))
        ));
    }

    #[test]
    fn test_mempool_zero_amount_rejected() {
        let mut mempool = Mempool::new();
        assert!(matches!(
            mempool.add(tx(0)),
            Err(MempoolError::Invalid(ValidationError::ZeroAmount))
        ));
        assert!(mempool.is_empty());
    }

    #[test]
    fn test_select_batch_is_distinct_and_non_destructive() {
        let mempool = filled(20);
        let mut rng = StdRng::seed_from_u64(7);

        let batch = mempool.select_batch(8, &mut rng).unwrap();

        assert_eq!(batch.len(), 8);
        let ids: HashSet<_> = batch.iter().map(|tx| tx.id).collect();
        assert_eq!(ids.len(), 8);
        assert!(ids.iter().all(|id| mempool.contains(id)));
        assert_eq!(mempool.len(), 20);
    }

    #[test]
    fn test_select_batch_reproducible_with_seed() {
        let mempool = filled(50);

        let a = mempool
            .select_batch(10, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let b = mempool
            .select_batch(10, &mut StdRng::seed_from_u64(42))
            .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_select_whole_pool() {
        let mempool = filled(5);
        let batch = mempool
            .select_batch(5, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(batch.len(), 5);
    }

    #[test]
    fn test_pool_underflow() {
        let mempool = filled(1);
        let err = mempool
            .select_batch(2, &mut StdRng::seed_from_u64(1))
            .unwrap_err();

        assert!(matches!(
            err,
            MempoolError::PoolUnderflow {
                requested: 2,
                available: 1
            }
        ));
    }

    #[test]
    fn test_discard_by_id() {
        let mut mempool = filled(10);
        let batch = mempool
            .select_batch(4, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let ids: Vec<Hash> = batch.iter().map(|tx| tx.id).collect();

        assert_eq!(mempool.discard(&ids), 4);
        assert_eq!(mempool.len(), 6);
        assert!(ids.iter().all(|id| !mempool.contains(id)));

        // Second discard is a no-op.
        assert_eq!(mempool.discard(&ids), 0);
        assert_eq!(mempool.len(), 6);

        // Discarded transactions can no longer be selected.
        let rest = mempool
            .select_batch(6, &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert!(rest.iter().all(|tx| !ids.contains(&tx.id)));
    }

    #[test]
    fn test_mempool_capacity_limit() {
        let config = MempoolConfig {
            max_transactions: 2,
        };
        let mut mempool = Mempool::with_config(config);

        assert!(mempool.add(tx(1)).is_ok());
        assert!(mempool.add(tx(2)).is_ok());
        assert!(matches!(mempool.add(tx(3)), Err(MempoolError::MempoolFull(2))));
    }

    #[test]
    fn test_mempool_stats() {
        let mut mempool = filled(4);

        let stats = mempool.stats();
        assert_eq!(stats.total_transactions, 4);
        assert_eq!(stats.total_amount, 10);
        assert_eq!(stats.capacity, MempoolConfig::default().max_transactions);

        mempool.discard(&[tx(4).id]);
        assert_eq!(mempool.stats().total_amount, 6);
    }
}
