//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod init;
mod simulate;

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default simulation config
    Init(init::InitArgs),
    /// Run a simulation and report the resulting chain
    Simulate(simulate::SimulateArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::run(args),
        Commands::Simulate(args) => simulate::run(args),
    }
}
