//! Storage proof verification CLI
//!
//! Fetch and verify a live proof:
//! ```shell
//! RUST_LOG=info cargo run --release -- fetch --holder 0x... --contract 0x...
//! ```
//! or verify a saved `eth_getProof` answer:
//! ```shell
//! cargo run --release -- file proof.json --format json
//! ```

use std::path::PathBuf;

use alloy::providers::ProviderBuilder;
use clap::{Parser, Subcommand};
use mpt_script::config::{SlotArgs, SourceArgs};
use mpt_script::output::{render, Format};
use mpt_script::{ledger, logging};
use tracing::info;

/// The arguments for the command.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a storage proof over JSON-RPC and verify it.
    Fetch {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        slot: SlotArgs,
    },
    /// Verify a saved `eth_getProof` answer.
    File { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let args = Args::parse();

    let response = match args.command {
        Command::Fetch { source, slot } => {
            let provider = ProviderBuilder::new().on_http(source.rpc_url);
            let block = ledger::resolve_block(&provider, source.block).await?;
            let key = slot.resolve()?;
            info!(contract = %source.contract, slot = %key, block, "fetching storage proof");
            ledger::fetch_storage_proof(&provider, source.contract, &[key], block).await?
        }
        Command::File { path } => ledger::read_storage_proof(&path)?,
    };

    let results = response.verify();
    println!("{}", render(&results, args.format)?);

    if !results.iter().all(|r| r.verified) {
        std::process::exit(1);
    }
    Ok(())
}
