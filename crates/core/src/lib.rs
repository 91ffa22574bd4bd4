//! Core hash-chain primitives for powchain.
//!
//! This crate provides the fundamental types used throughout the chain:
//! - Blake3 digests and hex rendering
//! - Accounts (identity derived from a name)
//! - Transfer transactions
//! - Blocks and block headers
//! - Merkle roots over transaction ids

pub mod account;
pub mod block;
pub mod hash;
pub mod merkle;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use account::Account;
pub use block::{Block, BlockHeader};
pub use hash::{hash, hash_concat, Hash, H256, HEX_LEN};
pub use merkle::merkle_root;
pub use transaction::Transaction;
