//! Value transfer transactions.

use crate::hash::{hash_concat, Hash};
use serde::{Deserialize, Serialize};

/// A transfer of `amount` from `sender` to `recipient`.
///
/// The id is a pure function of the `(sender, recipient, amount)` triple, so
/// two transfers with the same triple are indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id.
    pub id: Hash,
    /// Sender's identity.
    pub sender: Hash,
    /// Recipient's identity.
    pub recipient: Hash,
    /// Value to transfer.
    pub amount: u64,
}

impl Transaction {
    /// Create a value transfer transaction.
    pub fn transfer(sender: Hash, recipient: Hash, amount: u64) -> Self {
        Self {
            id: Self::compute_id(&sender, &recipient, amount),
            sender,
            recipient,
            amount,
        }
    }

    /// Compute the id for a transfer triple.
    ///
    /// The preimage is `hex(sender) || hex(recipient) || decimal(amount)`.
    pub fn compute_id(sender: &Hash, recipient: &Hash, amount: u64) -> Hash {
        hash_concat(&[
            sender.to_hex().as_bytes(),
            recipient.to_hex().as_bytes(),
            amount.to_string().as_bytes(),
        ])
    }

    /// Check the stored id against the transaction's fields.
    pub fn verify_id(&self) -> bool {
        self.id == Self::compute_id(&self.sender, &self.recipient, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash;

    #[test]
    fn test_transfer_transaction() {
        let from = hash(b"alice");
        let to = hash(b"bob");
        let tx = Transaction::transfer(from, to, 1000);

        assert_eq!(tx.sender, from);
        assert_eq!(tx.recipient, to);
        assert_eq!(tx.amount, 1000);
        assert!(tx.verify_id());
    }

    #[test]
    fn test_id_deterministic() {
        let from = hash(b"alice");
        let to = hash(b"bob");

        let tx1 = Transaction::transfer(from, to, 30);
        let tx2 = Transaction::transfer(from, to, 30);
        let tx3 = Transaction::transfer(from, to, 31);
        let tx4 = Transaction::transfer(to, from, 30);

        assert_eq!(tx1.id, tx2.id);
        assert_ne!(tx1.id, tx3.id);
        assert_ne!(tx1.id, tx4.id);
    }

    #[test]
    fn test_id_preimage() {
        let from = hash(b"alice");
        let to = hash(b"bob");
        let tx = Transaction::transfer(from, to, 7);

        let preimage = format!("{}{}{}", from.to_hex(), to.to_hex(), 7);
        assert_eq!(tx.id, hash(preimage.as_bytes()));
    }

    #[test]
    fn test_tampered_amount_fails_verification() {
        let mut tx = Transaction::transfer(hash(b"alice"), hash(b"bob"), 10);
        tx.amount = 10_000;
        assert!(!tx.verify_id());
    }
}
