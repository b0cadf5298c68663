use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{narrow, poke, scan};

#[derive(Parser)]
#[command(name = "memsift")]
#[command(about = "Memory search for emulator debugging", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Search mapped dump files for a typed value
    Scan(scan::ScanArgs),
    /// Narrow a candidate set across successive dumps of one region
    Narrow(narrow::NarrowArgs),
    /// Write a value into a dump file at an address
    Poke(poke::PokeArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("memsift_cli=info".parse()?)
                .add_directive("memsift_core=info".parse()?),
        )
        .init();

    match Args::parse().command {
        Command::Scan(args) => scan::run(args),
        Command::Narrow(args) => narrow::run(args),
        Command::Poke(args) => poke::run(args),
    }
}
