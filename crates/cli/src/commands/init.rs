//! Write a default simulation config.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use powchain_chain::SimulationConfig;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Args)]
pub struct InitArgs {
    /// Directory to write config.json into
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Required leading zero hex characters
    #[arg(long, default_value = "1")]
    difficulty: usize,

    /// Fixed seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Overwrite an existing config
    #[arg(short, long)]
    force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    println!("{}", "Initializing powchain...".bold().cyan());
    println!();

    let config = SimulationConfig {
        difficulty: args.difficulty,
        seed: args.seed,
        ..Default::default()
    };
    let path = write_config(&args.data_dir, &config, args.force)?;

    println!(
        "{}  Saved config to: {}",
        "✓".green().bold(),
        path.display().to_string().bright_black()
    );
    println!("    Users:        {}", config.user_count.to_string().bright_cyan());
    println!(
        "    Transactions: {}",
        config.transaction_count.to_string().bright_cyan()
    );
    println!("    Block size:   {}", config.block_size.to_string().bright_cyan());
    println!("    Difficulty:   {}", config.difficulty.to_string().bright_cyan());

    println!();
    println!("Next steps:");
    println!(
        "  • Edit {} to tune the run",
        path.display().to_string().bright_cyan()
    );
    println!(
        "  • Use {} to mine the chain",
        format!("powchain simulate --config {}", path.display()).bright_cyan()
    );

    Ok(())
}

/// Validate `config` and write it as pretty JSON under `data_dir`.
pub fn write_config(data_dir: &Path, config: &SimulationConfig, force: bool) -> Result<PathBuf> {
    config.validate().context("Invalid simulation config")?;

    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    let path = data_dir.join(CONFIG_FILE);
    if path.exists() && !force {
        bail!(
            "Config already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    fs::write(&path, serde_json::to_string_pretty(config)?)
        .with_context(|| format!("Failed to write config: {:?}", path))?;

    Ok(path)
}
