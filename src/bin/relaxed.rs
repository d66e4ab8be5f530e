//! Main entry point for the relaxed application.

use anyhow::Context;
use clap::Parser;
use relaxed::cli::Args;
use std::env;

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));

    let args = Args::parse();
    let rootpath = env::current_dir().context("Failed to get current directory")?;

    let exit_code = relaxed::run(args, rootpath)?;
    std::process::exit(exit_code);
}
