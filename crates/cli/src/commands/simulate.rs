//! Run a simulation and report the resulting chain.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use powchain_chain::{
    BlockReport, BlockSelector, Outcome, RoundReport, Simulation, SimulationConfig,
    SimulationSummary,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct SimulateArgs {
    /// JSON config written by `powchain init`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of generated accounts
    #[arg(long)]
    users: Option<usize>,

    /// Number of generated transactions
    #[arg(long)]
    transactions: Option<usize>,

    /// Transactions per block
    #[arg(long)]
    block_size: Option<usize>,

    /// Required leading zero hex characters
    #[arg(short, long)]
    difficulty: Option<usize>,

    /// Stop after this many blocks
    #[arg(long)]
    max_blocks: Option<u64>,

    /// Largest nonce tried per block
    #[arg(long)]
    max_nonce: Option<u64>,

    /// Mining threads
    #[arg(short, long)]
    threads: Option<usize>,

    /// Fixed seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Mine a short block when fewer than block-size transactions remain
    #[arg(long)]
    partial: bool,

    /// Block to describe after the run: "latest" or an index
    #[arg(short, long, default_value = "latest")]
    block: BlockSelector,

    /// Print the block description as JSON
    #[arg(long)]
    json: bool,

    /// Only print the summary and block description
    #[arg(short, long)]
    quiet: bool,
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let config = resolve_config(&args)?;

    if !args.json {
        println!("{}", "Running simulation...".bold().cyan());
        println!(
            "  Users: {}  Transactions: {}  Block size: {}  Difficulty: {}",
            config.user_count.to_string().bright_cyan(),
            config.transaction_count.to_string().bright_cyan(),
            config.block_size.to_string().bright_cyan(),
            config.difficulty.to_string().bright_cyan()
        );
        println!();
    }

    let mut sim = Simulation::from_config(config).context("Failed to set up simulation")?;
    let names: HashMap<String, String> = sim
        .ledger()
        .accounts()
        .map(|a| (a.id.to_hex(), a.name.clone()))
        .collect();

    // Rounds are printed as they complete; an abort still leaves the chain
    // in place for the report below.
    let mut aborted = None;
    loop {
        match sim.step() {
            Ok(Some(round)) => {
                if !args.quiet && !args.json {
                    print_round(&round);
                }
            }
            Ok(None) => break,
            Err(e) => {
                aborted = Some(e);
                break;
            }
        }
    }

    let summary = sim.summary();
    let report = sim
        .blockchain()
        .describe_block(args.block)
        .with_context(|| format!("Cannot describe block {}", args.block))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&summary, sim.blockchain().len());
        print_block(&report, &names);
    }

    match aborted {
        Some(e) => Err(e).context("Simulation aborted"),
        None => Ok(()),
    }
}

/// Load the config file (or defaults) and apply command-line overrides.
fn resolve_config(args: &SimulateArgs) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };

    if let Some(users) = args.users {
        config.user_count = users;
    }
    if let Some(transactions) = args.transactions {
        config.transaction_count = transactions;
    }
    if let Some(block_size) = args.block_size {
        config.block_size = block_size;
    }
    if let Some(difficulty) = args.difficulty {
        config.difficulty = difficulty;
    }
    if args.max_blocks.is_some() {
        config.max_blocks = args.max_blocks;
    }
    if let Some(max_nonce) = args.max_nonce {
        config.max_nonce = max_nonce;
    }
    if let Some(threads) = args.threads {
        config.mining_threads = threads;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.partial {
        config.allow_partial_batch = true;
    }

    config.validate().context("Invalid simulation config")?;
    Ok(config)
}

fn load_config(path: &Path) -> Result<SimulationConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}. Did you run 'powchain init'?", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid config file: {:?}", path))
}

fn print_round(round: &RoundReport) {
    let failed = round.failed();
    let failed_text = format!("{} failed", failed);
    println!(
        "  {} {} {} {}",
        format!("#{}", round.index).bright_black(),
        round.hash.to_hex()[..16].bright_yellow(),
        format!("nonce {}", round.nonce).bright_black(),
        format!(
            "({} ok, {})",
            round.succeeded(),
            if failed > 0 {
                failed_text.red().to_string()
            } else {
                failed_text
            }
        )
        .bright_black()
    );

    for receipt in &round.receipts {
        if let Some(reason) = failure_reason(&receipt.outcome) {
            println!(
                "      {} {}",
                receipt.tx_id.to_hex()[..16].bright_black(),
                reason.red()
            );
        }
    }
}

fn print_summary(summary: &SimulationSummary, chain_len: usize) {
    println!();
    println!("{}", "Summary:".bold().cyan());
    println!();
    println!(
        "  Blocks mined:    {}",
        summary.blocks_mined.to_string().bright_cyan()
    );
    println!("  Chain length:    {}", chain_len.to_string().bright_cyan());
    println!(
        "  Settled:         {} ok, {} failed",
        summary.succeeded.to_string().green(),
        summary.failed.to_string().red()
    );
    println!(
        "  Pending:         {}",
        summary.pending.to_string().bright_black()
    );
    if summary.duplicates_skipped > 0 {
        println!(
            "  Duplicates:      {}",
            summary.duplicates_skipped.to_string().yellow()
        );
    }
    println!(
        "  Total supply:    {}",
        summary.total_supply.to_string().bright_cyan()
    );
}

fn print_block(report: &BlockReport, names: &HashMap<String, String>) {
    let name = |id: &String| names.get(id).cloned().unwrap_or_else(|| id[..16].to_string());

    println!();
    println!("{}", "Block Information:".bold().cyan());
    println!();
    println!("  Index:        {}", report.index.to_string().bright_cyan());
    println!("  Hash:         {}", report.hash.bright_yellow());
    println!("  Parent Hash:  {}", report.prev_hash.bright_black());
    println!("  Merkle Root:  {}", report.merkle_root.bright_black());
    println!(
        "  Timestamp:    {}",
        format_timestamp(report.timestamp).bright_black()
    );
    println!("  Nonce:        {}", report.nonce.to_string().bright_cyan());
    println!(
        "  Total amount: {}",
        report.total_amount.to_string().bright_cyan()
    );
    println!(
        "  Transactions: {}",
        report.transactions.len().to_string().bright_cyan()
    );
    println!();

    if !report.transactions.is_empty() {
        println!("{}", "Transactions:".bold());
        println!();
        for (i, tx) in report.transactions.iter().enumerate() {
            println!(
                "  {} {} {} -> {} : {}",
                format!("{}.", i + 1).bright_black(),
                tx.id[..16].bright_yellow(),
                name(&tx.sender),
                name(&tx.recipient),
                tx.amount.to_string().bright_cyan()
            );
        }
        println!();
    }
}

/// Render unix milliseconds as UTC, falling back to the raw number.
fn format_timestamp(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Why a receipt failed, or `None` if it succeeded.
fn failure_reason(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Success => None,
        Outcome::InsufficientFunds {
            required,
            available,
        } => Some(format!(
            "insufficient funds (required {}, available {})",
            required, available
        )),
        Outcome::InvalidId => Some("invalid id".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init::write_config;
    use clap::Parser;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: SimulateArgs,
    }

    fn parse(argv: &[&str]) -> SimulateArgs {
        let mut full = vec!["powchain"];
        full.extend_from_slice(argv);
        TestCli::parse_from(full).args
    }

    #[test]
    fn test_defaults_without_config() {
        let args = parse(&[]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert!(!config.allow_partial_batch);
        assert_eq!(args.block, BlockSelector::Latest);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let base = SimulationConfig {
            user_count: 9,
            difficulty: 2,
            seed: Some(1),
            ..Default::default()
        };
        let path = write_config(dir.path(), &base, false).unwrap();

        let args = parse(&[
            "--config",
            path.to_str().unwrap(),
            "--difficulty",
            "0",
            "--max-blocks",
            "3",
            "--partial",
        ]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.user_count, 9);
        assert_eq!(config.seed, Some(1));
        assert_eq!(config.difficulty, 0);
        assert_eq!(config.max_blocks, Some(3));
        assert!(config.allow_partial_batch);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = parse(&["--block-size", "0"]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_excessive_threads_rejected() {
        let args = parse(&["--threads", "1000000"]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        let args = parse(&["--config", missing.to_str().unwrap()]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_block_selector_flag() {
        assert_eq!(parse(&["--block", "2"]).block, BlockSelector::Index(2));
        assert_eq!(parse(&["-b", "LATEST"]).block, BlockSelector::Latest);
        assert!(TestCli::try_parse_from(["powchain", "--block", "tip"]).is_err());
    }

    #[test]
    fn test_full_run_small() {
        let args = parse(&[
            "--users", "4", "--transactions", "10", "--block-size", "3", "--difficulty", "1",
            "--seed", "8", "--partial", "--quiet",
        ]);
        assert!(run(args).is_ok());
    }

    #[test]
    fn test_out_of_range_block_is_error() {
        let args = parse(&[
            "--users", "2", "--transactions", "2", "--difficulty", "0", "--seed", "1",
            "--block", "99", "--quiet",
        ]);
        assert!(run(args).is_err());
    }

    #[test]
    fn test_failure_reason() {
        assert_eq!(failure_reason(&Outcome::Success), None);
        assert_eq!(
            failure_reason(&Outcome::InsufficientFunds {
                required: 5,
                available: 2
            })
            .as_deref(),
            Some("insufficient funds (required 5, available 2)")
        );
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00.000 UTC");
        assert_eq!(format_timestamp(1_500), "1970-01-01 00:00:01.500 UTC");
    }
}
