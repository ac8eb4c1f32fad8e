// SPDX-License-Identifier: Apache-2.0
//! Developer CLI for the lattice KMC engine.
//!
//! `run` drives a [`kmc_core::LatticeModel`] to completion from a TOML
//! config and reports the final state; `inspect` loads the same config,
//! builds the model, and prints a summary of its process/rate tables
//! without running any steps.

#![deny(rust_2018_idioms)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]
#![allow(clippy::print_stdout, clippy::print_stderr, clippy::multiple_crate_versions)]

mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use config::RunConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Driver and inspector for the lattice KMC engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a simulation from a TOML config until it reaches `steps` or an absorbing state.
    Run {
        /// Path to the run's TOML config.
        config: PathBuf,
        /// Overrides the config's `steps` value.
        #[arg(long)]
        steps: Option<u64>,
        /// Emits one line per step to stderr via `RUST_LOG=kmc_cli=trace`-style tracing.
        #[arg(long)]
        verbose: bool,
    },
    /// Load a TOML config, build the model, and print its process/rate table without stepping.
    Inspect {
        /// Path to the run's TOML config.
        config: PathBuf,
        /// Emits the same summary as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run { config, steps, verbose } => run(&config, steps, verbose),
        Command::Inspect { config, json } => inspect(&config, json),
    }
}

fn run(config_path: &std::path::Path, steps_override: Option<u64>, verbose: bool) -> Result<()> {
    let run_config = RunConfig::load(config_path)?;
    let steps = steps_override.unwrap_or(run_config.steps);
    let mut model = config::build_model(&run_config)?;

    let mut executed = 0u64;
    for _ in 0..steps {
        match model.single_step()? {
            Some(outcome) => {
                executed += 1;
                if verbose {
                    println!("step {executed}: process {} at site {} (dt={:.6})", outcome.process_id, outcome.site, outcome.dt);
                }
            }
            None => {
                println!("absorbing state reached after {executed} steps");
                break;
            }
        }
    }

    println!("ran {executed} step(s), simulated time = {:.6}", model.time());
    if let Some(msd) = model.msd() {
        for bin in 0..msd.n_bins() {
            let (rho, _std, error) = msd.block_averaged_msd(bin);
            println!(
                "msd bin {bin}: mean=({:.6},{:.6},{:.6}) error=({:.6},{:.6},{:.6}) samples={}",
                rho[0],
                rho[1],
                rho[2],
                error[0],
                error[1],
                error[2],
                msd.sample_count(bin)
            );
        }
    }
    Ok(())
}

fn inspect(config_path: &std::path::Path, json: bool) -> Result<()> {
    let run_config = RunConfig::load(config_path)?;
    let model = config::build_model(&run_config)?;

    if json {
        let report = InspectReport::from_model(&model);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["process", "sites", "total rate"]);
    for process in model.interactions().processes() {
        table.add_row(vec![process.id().to_string(), process.sites().len().to_string(), format!("{:.6}", process.total_rate())]);
    }
    println!("{table}");
    println!("sites: {}, types: {}", model.configuration().n_sites(), model.configuration().n_types());
    println!("total rate: {:.6}", model.interactions().total_rate());
    Ok(())
}

#[derive(Debug, serde::Serialize)]
struct InspectReport {
    n_sites: usize,
    n_types: usize,
    total_rate: f64,
    processes: Vec<ProcessSummary>,
}

#[derive(Debug, serde::Serialize)]
struct ProcessSummary {
    id: usize,
    registered_sites: usize,
    total_rate: f64,
}

impl InspectReport {
    fn from_model(model: &kmc_core::LatticeModel) -> Self {
        Self {
            n_sites: model.configuration().n_sites(),
            n_types: model.configuration().n_types(),
            total_rate: model.interactions().total_rate(),
            processes: model
                .interactions()
                .processes()
                .iter()
                .map(|p| ProcessSummary { id: p.id(), registered_sites: p.sites().len(), total_rate: p.total_rate() })
                .collect(),
        }
    }
}
