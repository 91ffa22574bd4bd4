//! Balance ledger and transaction settlement.
//!
//! Settlement is sequential: each transaction sees the balances left by the
//! ones before it in the same batch, and a failed transfer simply records a
//! failed outcome. There is no batch-level rollback.

use powchain_core::{Account, Hash, Transaction};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("account not found: {0:?}")]
    AccountNotFound(Hash),

    #[error("duplicate account identity: {0:?}")]
    DuplicateAccount(Hash),

    #[error("total supply overflows u64")]
    SupplyOverflow,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Outcome of settling one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Amount moved from sender to recipient.
    Success,
    /// Sender could not cover the amount; nothing changed.
    InsufficientFunds { required: u64, available: u64 },
    /// Stored id does not match the transaction contents; nothing changed.
    InvalidId,
}

impl Outcome {
    /// Whether the transfer was applied.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Result of settling a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    /// Transaction id.
    pub tx_id: Hash,
    /// What happened.
    pub outcome: Outcome,
}

/// Mapping from account identity to account, fixed at construction.
#[derive(Debug, Clone)]
pub struct Ledger {
    accounts: HashMap<Hash, Account>,
    /// Identities in construction order, for stable iteration.
    order: Vec<Hash>,
    total_supply: u64,
}

impl Ledger {
    /// Create a ledger over a fixed account set.
    ///
    /// The total supply must fit in a `u64`; since settlement conserves the
    /// total, no credit can overflow afterwards.
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Result<Self> {
        let mut map = HashMap::new();
        let mut order = Vec::new();
        let mut total_supply: u64 = 0;

        for account in accounts {
            total_supply = total_supply
                .checked_add(account.balance)
                .ok_or(LedgerError::SupplyOverflow)?;
            let id = account.id;
            if map.insert(id, account).is_some() {
                return Err(LedgerError::DuplicateAccount(id));
            }
            order.push(id);
        }

        Ok(Self {
            accounts: map,
            order,
            total_supply,
        })
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Check if the ledger has no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Get an account by identity.
    pub fn account(&self, id: &Hash) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// Get an account balance.
    pub fn balance(&self, id: &Hash) -> Option<u64> {
        self.accounts.get(id).map(|account| account.balance)
    }

    /// Iterate over accounts in construction order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.order.iter().filter_map(|id| self.accounts.get(id))
    }

    /// Sum of all balances. Constant for the ledger's lifetime.
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Settle transactions in list order.
    ///
    /// Every sender and recipient must exist; this is checked for the whole
    /// batch before any balance moves, so `AccountNotFound` leaves the
    /// ledger untouched.
    pub fn settle(&mut self, transactions: &[Transaction]) -> Result<Vec<Receipt>> {
        for tx in transactions {
            for id in [&tx.sender, &tx.recipient] {
                if !self.accounts.contains_key(id) {
                    return Err(LedgerError::AccountNotFound(*id));
                }
            }
        }

        Ok(transactions
            .iter()
            .map(|tx| Receipt {
                tx_id: tx.id,
                outcome: self.settle_one(tx),
            })
            .collect())
    }

    fn settle_one(&mut self, tx: &Transaction) -> Outcome {
        if !tx.verify_id() {
            debug!(tx = %tx.id, "settlement failed: invalid id");
            return Outcome::InvalidId;
        }

        let sender = &self.accounts[&tx.sender];
        if !sender.has_balance(tx.amount) {
            let available = sender.balance;
            debug!(
                tx = %tx.id,
                required = tx.amount,
                available,
                "settlement failed: insufficient funds"
            );
            return Outcome::InsufficientFunds {
                required: tx.amount,
                available,
            };
        }

        if let Some(sender) = self.accounts.get_mut(&tx.sender) {
            let debited = sender.debit(tx.amount);
            debug_assert!(debited, "balance checked above");
        }
        if let Some(recipient) = self.accounts.get_mut(&tx.recipient) {
            // Balances sum to total_supply, which fits in u64.
            let credited = recipient.credit(tx.amount);
            debug_assert!(credited, "credit overflowed total supply");
        }

        debug!(tx = %tx.id, amount = tx.amount, "settled");
        Outcome::Success
    }
}
