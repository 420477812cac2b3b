// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! omcd: the per-worker bridge daemon.
//!
//! One process per worker. Exit code 0 means a clean, acked shutdown;
//! exit code 1 means the configuration gate rejected the start.

mod config;
mod env;
mod logging;

use clap::Parser;
use omc_core::SystemClock;
use omc_engine::Bridge;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "omcd", version, about = "Worker bridge daemon for the omc fabric")]
struct Args {
    /// Worker configuration document (JSON)
    #[arg(long)]
    config: PathBuf,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("failed to start async runtime: {0}")]
    Runtime(std::io::Error),

    #[error(transparent)]
    Bridge(#[from] omc_engine::BridgeError),
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("omcd: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), StartupError> {
    let state_root = env::state_dir()?;
    let config = config::load(&args.config, &state_root)?;
    let _log_guard = logging::init(&state_root, &config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;
    runtime.block_on(async move {
        let mut bridge = Bridge::new(config, state_root, SystemClock)?;
        bridge.run().await
    })?;
    Ok(())
}
