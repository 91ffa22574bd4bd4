//! Account state representation.

use crate::hash::{hash, Hash};
use serde::{Deserialize, Serialize};

/// A named account holding a balance in the native unit.
///
/// The identity is the digest of the name, so two accounts with the same
/// name always share an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Human-readable name the identity is derived from.
    pub name: String,
    /// Identity (`hash(name)`).
    pub id: Hash,
    /// Account balance.
    pub balance: u64,
}

impl Account {
    /// Create a new account with the given name and starting balance.
    pub fn new(name: impl Into<String>, balance: u64) -> Self {
        let name = name.into();
        let id = Self::identity_of(&name);
        Self { name, id, balance }
    }

    /// Derive the identity for a name.
    pub fn identity_of(name: &str) -> Hash {
        hash(name.as_bytes())
    }

    /// Add balance to the account.
    ///
    /// Returns false (and leaves the balance unchanged) on overflow.
    pub fn credit(&mut self, amount: u64) -> bool {
        match self.balance.checked_add(amount) {
            Some(balance) => {
                self.balance = balance;
                true
            }
            None => false,
        }
    }

    /// Subtract balance from the account.
    /// Returns true if successful, false if insufficient balance.
    pub fn debit(&mut self, amount: u64) -> bool {
        if self.balance >= amount {
            self.balance -= amount;
            true
        } else {
            false
        }
    }

    /// Check if the account has sufficient balance.
    pub fn has_balance(&self, amount: u64) -> bool {
        self.balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account() {
        let account = Account::new("User_0", 1000);
        assert_eq!(account.name, "User_0");
        assert_eq!(account.balance, 1000);
        assert_eq!(account.id, hash(b"User_0"));
    }

    #[test]
    fn test_identity_deterministic() {
        let a = Account::new("alice", 1);
        let b = Account::new("alice", 999);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, Account::new("bob", 1).id);
    }

    #[test]
    fn test_credit_and_debit() {
        let mut account = Account::new("alice", 100);

        assert!(account.credit(50));
        assert_eq!(account.balance, 150);

        assert!(account.debit(100));
        assert_eq!(account.balance, 50);

        assert!(!account.debit(100)); // Insufficient balance
        assert_eq!(account.balance, 50); // Balance unchanged
    }

    #[test]
    fn test_credit_overflow_rejected() {
        let mut account = Account::new("alice", u64::MAX);
        assert!(!account.credit(1));
        assert_eq!(account.balance, u64::MAX);
    }

    #[test]
    fn test_has_balance() {
        let account = Account::new("alice", 100);
        assert!(account.has_balance(50));
        assert!(account.has_balance(100));
        assert!(!account.has_balance(101));
    }

    #[test]
    fn test_account_json() {
        let account = Account::new("alice", 42);
        let json = serde_json::to_string(&account).unwrap();
        let back: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(account, back);
    }
}
