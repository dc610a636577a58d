//! Find where a token keeps its balances.
//!
//! Probes mapping slot indices `0..SCAN_SLOTS` for a holder, verifies every proof against
//! the contract's storage root, and prints the indices that hold a non-zero balance.
//!
//! ```shell
//! RUST_LOG=info cargo run --bin scan -- --contract 0x... --holder 0x...
//! ```

use alloy::primitives::{Address, B256, U256};
use alloy::providers::ProviderBuilder;
use anyhow::Context;
use clap::Parser;
use mpt_lib::{decode_storage_value, mapping_slot_key, Proven};
use mpt_script::config::SourceArgs;
use mpt_script::{ledger, logging};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    source: SourceArgs,

    #[arg(long, env = "HOLDER_ADDRESS")]
    holder: Address,

    /// Number of slot indices to probe, starting at 0.
    #[arg(long, env = "SCAN_SLOTS", default_value_t = 20)]
    slots: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let args = Args::parse();
    let provider = ProviderBuilder::new().on_http(args.source.rpc_url);
    let block = ledger::resolve_block(&provider, args.source.block).await?;

    let keys: Vec<B256> = (0..args.slots)
        .map(|index| B256::from(mapping_slot_key(&args.holder.0 .0, index)))
        .collect();
    info!(holder = %args.holder, block, slots = args.slots, "scanning mapping slots");

    let response =
        ledger::fetch_storage_proof(&provider, args.source.contract, &keys, block).await?;

    let mut found = 0;
    for (index, result) in response.verify().iter().enumerate() {
        match result.outcome {
            Some(Proven::Included) => {
                let value = decode_storage_value(&result.value)?;
                let balance = U256::try_from_be_slice(&value)
                    .with_context(|| format!("slot {index} holds more than 32 bytes"))?;
                println!("position is {index}: balance {balance}");
                found += 1;
            }
            Some(Proven::Absent(_)) => {}
            None => warn!(
                index,
                reason = result.reason.as_deref().unwrap_or_default(),
                "proof rejected"
            ),
        }
    }

    if found == 0 {
        println!("no verified balance in slots 0..{}", args.slots);
    }
    Ok(())
}
