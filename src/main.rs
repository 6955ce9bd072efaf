// CLI binary entry point for soundtag

mod cli;

use anyhow::Context;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let config = cli::Config::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .format_timestamp(None)
        .init();

    cli::run(&config).context("soundtag failed")
}
