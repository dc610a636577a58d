//! Storage watcher
//!
//! Follows the source chain and, for every new block, fetches the storage proof of one
//! slot and verifies it against that block's storage root.
//!
//! Usage:
//! RUST_LOG=info cargo run --bin watch

use std::time::Duration;

use alloy::primitives::B256;
use alloy::providers::{Provider, ProviderBuilder};
use clap::Parser;
use mpt_lib::{decode_storage_value, Proven};
use mpt_script::config::{SlotArgs, SourceArgs};
use mpt_script::{ledger, logging};
use tokio::time::sleep;
use tracing::{error, info, warn};

const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    slot: SlotArgs,

    /// Seconds between polls of the latest block.
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 12)]
    poll_interval: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let args = Args::parse();
    let key = args.slot.resolve()?;
    let contract = args.source.contract;
    info!(%contract, slot = %key, "starting watcher");

    let provider = ProviderBuilder::new().on_http(args.source.rpc_url);
    let interval = Duration::from_secs(args.poll_interval);
    let mut last_seen = None;

    loop {
        let latest = match provider.get_block_number().await {
            Ok(n) => n,
            Err(e) => {
                warn!("failed to get block number: {e}, retrying");
                sleep(RETRY_DELAY).await;
                continue;
            }
        };

        if last_seen == Some(latest) {
            sleep(interval).await;
            continue;
        }

        let response = match ledger::fetch_storage_proof(&provider, contract, &[key], latest).await {
            Ok(response) => response,
            Err(e) => {
                warn!("{e:#}, retrying");
                sleep(RETRY_DELAY).await;
                continue;
            }
        };
        last_seen = Some(latest);

        for result in response.verify() {
            report(latest, key, &result);
        }

        sleep(interval).await;
    }
}

fn report(block: u64, slot: B256, result: &mpt_lib::MPTVerificationResult) {
    match result.outcome {
        Some(Proven::Included) => match decode_storage_value(&result.value) {
            Ok(value) => info!(block, %slot, value = %hex::encode(value), "verified"),
            Err(e) => error!(block, %slot, "verified leaf holds a bad value: {e}"),
        },
        Some(Proven::Absent(dead_end)) => info!(block, %slot, ?dead_end, "verified empty"),
        None => error!(
            block,
            %slot,
            reason = result.reason.as_deref().unwrap_or_default(),
            "proof rejected"
        ),
    }
}
