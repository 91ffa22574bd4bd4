//! Read-only block reports.

use powchain_core::{Block, Hash};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which block to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSelector {
    /// Block at a chain index (0 is genesis).
    Index(usize),
    /// The current tip.
    Latest,
}

/// Error returned when a selector string is neither `latest` nor an index.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid block selector {0:?} (expected \"latest\" or a block index)")]
pub struct ParseSelectorError(pub String);

impl FromStr for BlockSelector {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("latest") {
            return Ok(BlockSelector::Latest);
        }
        trimmed
            .parse::<usize>()
            .map(BlockSelector::Index)
            .map_err(|_| ParseSelectorError(s.to_string()))
    }
}

impl fmt::Display for BlockSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockSelector::Index(index) => write!(f, "{index}"),
            BlockSelector::Latest => f.write_str("latest"),
        }
    }
}

/// One transaction line of a block report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionReport {
    pub id: String,
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

/// Structured description of a block. Digests are rendered as hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockReport {
    pub index: usize,
    pub hash: String,
    pub prev_hash: String,
    pub merkle_root: String,
    /// Unix milliseconds.
    pub timestamp: u64,
    pub nonce: u64,
    /// Sum of transfer amounts, settled or not.
    pub total_amount: u64,
    pub transactions: Vec<TransactionReport>,
}

impl BlockReport {
    /// Build the report for `block` sitting at `index`.
    pub fn new(index: usize, block: &Block) -> Self {
        let hex = |h: Hash| h.to_hex();
        Self {
            index,
            hash: hex(block.hash()),
            prev_hash: hex(block.prev_hash()),
            merkle_root: hex(block.merkle_root()),
            timestamp: block.timestamp(),
            nonce: block.nonce(),
            total_amount: block.total_amount(),
            transactions: block
                .transactions()
                .iter()
                .map(|tx| TransactionReport {
                    id: hex(tx.id),
                    sender: hex(tx.sender),
                    recipient: hex(tx.recipient),
                    amount: tx.amount,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::{hash, Transaction};

    #[test]
    fn test_parse_selector() {
        assert_eq!("latest".parse::<BlockSelector>(), Ok(BlockSelector::Latest));
        assert_eq!(" LATEST ".parse::<BlockSelector>(), Ok(BlockSelector::Latest));
        assert_eq!("0".parse::<BlockSelector>(), Ok(BlockSelector::Index(0)));
        assert_eq!("12".parse::<BlockSelector>(), Ok(BlockSelector::Index(12)));
    }

    #[test]
    fn test_parse_selector_rejects_garbage() {
        assert_eq!(
            "tip".parse::<BlockSelector>(),
            Err(ParseSelectorError("tip".to_string()))
        );
        assert!("-1".parse::<BlockSelector>().is_err());
        assert!("".parse::<BlockSelector>().is_err());
    }

    #[test]
    fn test_selector_display() {
        assert_eq!(BlockSelector::Latest.to_string(), "latest");
        assert_eq!(BlockSelector::Index(3).to_string(), "3");
    }

    #[test]
    fn test_report_fields() {
        let tx = Transaction::transfer(hash(b"alice"), hash(b"bob"), 30);
        let block = Block::with_timestamp(hash(b"parent"), vec![tx.clone()], 99);

        let report = BlockReport::new(4, &block);

        assert_eq!(report.index, 4);
        assert_eq!(report.hash, block.hash().to_hex());
        assert_eq!(report.prev_hash, hash(b"parent").to_hex());
        assert_eq!(report.timestamp, 99);
        assert_eq!(report.nonce, 0);
        assert_eq!(report.total_amount, 30);
        assert_eq!(report.transactions.len(), 1);
        assert_eq!(report.transactions[0].id, tx.id.to_hex());
        assert_eq!(report.transactions[0].amount, 30);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let block = Block::with_timestamp(Hash::ZERO, vec![], 1);
        let json = serde_json::to_value(BlockReport::new(0, &block)).unwrap();

        assert_eq!(json["index"], 0);
        assert_eq!(json["prev_hash"], Hash::ZERO.to_hex());
        assert_eq!(json["total_amount"], 0);
        assert!(json["transactions"].as_array().unwrap().is_empty());
    }
}
