//! Simulation controller.
//!
//! Each round runs pool -> block -> ledger -> miner -> chain in strict
//! sequence: sample a batch, build a block on the current tip, settle its
//! transactions, mine it, append it, then drop the batch from the pool.
//! The run ends when the pool is empty or the block cap is reached,
//! whichever comes first.

use crate::blockchain::{Blockchain, BlockchainError};
use crate::config::{ConfigError, SimulationConfig};
use crate::generator::{generate_accounts, generate_transactions};
use crate::ledger::{Ledger, LedgerError, Receipt};
use crate::mempool::{Mempool, MempoolConfig, MempoolError};
use powchain_consensus::{ConsensusError, Miner};
use powchain_core::{Block, Hash};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can end a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("mempool error: {0}")]
    Mempool(#[from] MempoolError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("blockchain error: {0}")]
    Blockchain(#[from] BlockchainError),
}

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Running,
    Done,
}

/// What happened in one round.
#[derive(Debug, Clone)]
pub struct RoundReport {
    /// Chain index of the appended block.
    pub index: usize,
    /// Hash of the appended block.
    pub hash: Hash,
    /// Nonce found by the miner.
    pub nonce: u64,
    /// Settlement receipts, in block order.
    pub receipts: Vec<Receipt>,
}

impl RoundReport {
    /// Number of transfers applied.
    pub fn succeeded(&self) -> usize {
        self.receipts.iter().filter(|r| r.outcome.is_success()).count()
    }

    /// Number of transfers that failed settlement.
    pub fn failed(&self) -> usize {
        self.receipts.len() - self.succeeded()
    }
}

/// Totals for a finished (or aborted) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSummary {
    /// Blocks appended after genesis.
    pub blocks_mined: u64,
    /// Transfers applied.
    pub succeeded: usize,
    /// Transfers that failed settlement but were still consumed.
    pub failed: usize,
    /// Transactions still in the pool.
    pub pending: usize,
    /// Generated transactions dropped because their id was already pending.
    pub duplicates_skipped: usize,
    /// Sum of all balances.
    pub total_supply: u64,
}

/// Drives rounds over one chain, ledger and pool.
pub struct Simulation<R: Rng = StdRng> {
    config: SimulationConfig,
    blockchain: Blockchain,
    ledger: Ledger,
    mempool: Mempool,
    miner: Miner,
    rng: R,
    state: SimulationState,
    blocks_mined: u64,
    succeeded: usize,
    failed: usize,
    duplicates_skipped: usize,
}

impl Simulation<StdRng> {
    /// Generate accounts and transactions from `config`.
    ///
    /// Uses `config.seed` when set, otherwise OS entropy.
    pub fn from_config(config: SimulationConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::generate(config, rng)
    }
}

impl<R: Rng> Simulation<R> {
    /// Generate accounts and transactions with an injected rng, then build
    /// the simulation. The same rng later drives batch sampling.
    pub fn generate(config: SimulationConfig, mut rng: R) -> Result<Self> {
        config.validate()?;

        let accounts = generate_accounts(
            config.user_count,
            config.min_balance,
            config.max_balance,
            &mut rng,
        );
        let transactions =
            generate_transactions(config.transaction_count, &accounts, config.max_amount, &mut rng);

        let ledger = Ledger::new(accounts)?;
        let mut mempool = Mempool::with_config(MempoolConfig {
            max_transactions: config
                .transaction_count
                .max(MempoolConfig::default().max_transactions),
        });

        let mut duplicates_skipped = 0;
        for tx in transactions {
            match mempool.add(tx) {
                Ok(()) => {}
                Err(MempoolError::DuplicateTransaction(id)) => {
                    warn!(tx = %id, "skipping duplicate generated transaction");
                    duplicates_skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut simulation = Self::new(config, ledger, mempool, rng)?;
        simulation.duplicates_skipped = duplicates_skipped;
        Ok(simulation)
    }

    /// Build a simulation over an existing ledger and pool.
    ///
    /// The ledger carries the account set from the start; there is no
    /// separate setup step.
    pub fn new(config: SimulationConfig, ledger: Ledger, mempool: Mempool, rng: R) -> Result<Self> {
        config.validate()?;
        let miner = Miner::new(config.pow())?;
        let blockchain = Blockchain::new(config.difficulty)?;

        info!(
            accounts = ledger.len(),
            pending = mempool.len(),
            difficulty = config.difficulty,
            block_size = config.block_size,
            "simulation ready"
        );

        Ok(Self {
            config,
            blockchain,
            ledger,
            mempool,
            miner,
            rng,
            state: SimulationState::Running,
            blocks_mined: 0,
            succeeded: 0,
            failed: 0,
            duplicates_skipped: 0,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Get the chain.
    pub fn blockchain(&self) -> &Blockchain {
        &self.blockchain
    }

    /// Get the ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Get the transaction pool.
    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    /// Get the controller state.
    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Blocks appended so far.
    pub fn blocks_mined(&self) -> u64 {
        self.blocks_mined
    }

    fn block_cap_reached(&self) -> bool {
        self.config
            .max_blocks
            .is_some_and(|max| self.blocks_mined >= max)
    }

    /// Run one round.
    ///
    /// Returns `None` once the run is Done. Any error also moves the run to
    /// Done; chain, ledger and pool stay queryable.
    pub fn step(&mut self) -> Result<Option<RoundReport>> {
        if self.state == SimulationState::Done {
            return Ok(None);
        }

        if self.mempool.is_empty() || self.block_cap_reached() {
            self.state = SimulationState::Done;
            info!(blocks = self.blocks_mined, "simulation done");
            return Ok(None);
        }

        match self.round() {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                warn!(error = %e, "simulation aborted");
                self.state = SimulationState::Done;
                Err(e)
            }
        }
    }

    fn round(&mut self) -> Result<RoundReport> {
        let size = if self.config.allow_partial_batch {
            self.config.block_size.min(self.mempool.len())
        } else {
            self.config.block_size
        };

        let batch = self.mempool.select_batch(size, &mut self.rng)?;
        let mut block = Block::new(self.blockchain.tip().hash(), batch);

        // Settlement happens once, before mining, whatever mining does next.
        let receipts = self.ledger.settle(block.transactions())?;

        let nonce = self.miner.mine(&mut block)?;
        let hash = block.hash();
        let ids: Vec<Hash> = block.transactions().iter().map(|tx| tx.id).collect();

        self.blockchain.append(block)?;
        self.mempool.discard(&ids);

        let report = RoundReport {
            index: self.blockchain.len() - 1,
            hash,
            nonce,
            receipts,
        };
        self.blocks_mined += 1;
        self.succeeded += report.succeeded();
        self.failed += report.failed();

        info!(
            block = report.index,
            nonce,
            succeeded = report.succeeded(),
            failed = report.failed(),
            pending = self.mempool.len(),
            "round complete"
        );

        Ok(report)
    }

    /// Run rounds until Done.
    pub fn run(&mut self) -> Result<SimulationSummary> {
        while self.step()?.is_some() {}
        Ok(self.summary())
    }

    /// Totals so far.
    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            blocks_mined: self.blocks_mined,
            succeeded: self.succeeded,
            failed: self.failed,
            pending: self.mempool.len(),
            duplicates_skipped: self.duplicates_skipped,
            total_supply: self.ledger.total_supply(),
        }
    }
}
