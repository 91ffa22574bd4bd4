//! Blockchain orchestration for powchain.
//!
//! This crate brings together all components to run a proof-of-work chain:
//! - **Ledger**: Account balances and sequential settlement
//! - **Mempool**: Transaction pool with seeded batch sampling
//! - **Blockchain**: Validated, append-only chain of mined blocks
//! - **Simulation**: Round-by-round controller driving all of the above
//!
//! # Example
//!
//! ```rust
//! use powchain_chain::{Ledger, Mempool, Simulation, SimulationConfig};
//! use powchain_core::{Account, Transaction};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let alice = Account::new("alice", 100);
//! let bob = Account::new("bob", 0);
//!
//! let mut mempool = Mempool::new();
//! mempool.add(Transaction::transfer(alice.id, bob.id, 30)).unwrap();
//! let ledger = Ledger::new(vec![alice.clone(), bob.clone()]).unwrap();
//!
//! let config = SimulationConfig {
//!     block_size: 1,
//!     difficulty: 0,
//!     ..Default::default()
//! };
//! let mut sim = Simulation::new(config, ledger, mempool, StdRng::seed_from_u64(0)).unwrap();
//! sim.run().unwrap();
//!
//! assert_eq!(sim.blockchain().len(), 2);
//! assert_eq!(sim.ledger().balance(&bob.id), Some(30));
//! ```

pub mod blockchain;
pub mod config;
pub mod generator;
pub mod ledger;
pub mod mempool;
pub mod report;
pub mod simulation;

// Re-export commonly used types
pub use blockchain::{Blockchain, BlockchainError, BlockchainStats};
pub use config::{ConfigError, SimulationConfig};
pub use generator::{generate_accounts, generate_transactions};
pub use ledger::{Ledger, LedgerError, Outcome, Receipt};
pub use mempool::{Mempool, MempoolConfig, MempoolError, MempoolStats};
pub use report::{BlockReport, BlockSelector, ParseSelectorError, TransactionReport};
pub use simulation::{
    RoundReport, Simulation, SimulationError, SimulationState, SimulationSummary,
};
