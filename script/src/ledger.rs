//! Storage proofs from a JSON-RPC node.
//!
//! `eth_getProof` answers are converted into the library's [`StorageProofResponse`] so the
//! same verification runs on live answers and on saved files.

use alloy::primitives::{Address, B256};
use alloy::providers::Provider;
use alloy::rpc::types::{BlockId, BlockNumberOrTag};
use alloy::transports::Transport;
use anyhow::{ensure, Context};
use mpt_lib::{StorageProofEntry, StorageProofResponse};
use std::path::Path;
use tracing::debug;

/// Block to prove against: the configured one, or the node's latest.
pub async fn resolve_block<P, T>(provider: &P, block: Option<u64>) -> anyhow::Result<u64>
where
    P: Provider<T>,
    T: Transport + Clone,
{
    match block {
        Some(number) => Ok(number),
        None => provider
            .get_block_number()
            .await
            .context("failed to get block number"),
    }
}

/// Fetch the storage proofs of `slots` in `contract` at `block`.
pub async fn fetch_storage_proof<P, T>(
    provider: &P,
    contract: Address,
    slots: &[B256],
    block: u64,
) -> anyhow::Result<StorageProofResponse>
where
    P: Provider<T>,
    T: Transport + Clone,
{
    let response = provider
        .get_proof(contract, slots.to_vec())
        .block_id(BlockId::Number(BlockNumberOrTag::Number(block)))
        .await
        .with_context(|| format!("eth_getProof for {contract} at block {block}"))?;

    ensure!(
        response.storage_proof.len() == slots.len(),
        "asked for {} slots, node returned {} proofs",
        slots.len(),
        response.storage_proof.len()
    );
    debug!(block, storage_hash = %response.storage_hash, "fetched storage proof");

    let storage_proof = response
        .storage_proof
        .iter()
        .zip(slots)
        .map(|(entry, slot)| StorageProofEntry {
            key: slot.0,
            value: entry.value.to_be_bytes::<32>().to_vec(),
            proof: entry.proof.iter().map(|node| node.to_vec()).collect(),
        })
        .collect();

    Ok(StorageProofResponse {
        storage_hash: response.storage_hash.0,
        storage_proof,
    })
}

/// Read a saved `eth_getProof` result (the JSON object under `result`, or the bare object).
pub fn read_storage_proof(path: &Path) -> anyhow::Result<StorageProofResponse> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_storage_proof(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn parse_storage_proof(raw: &str) -> anyhow::Result<StorageProofResponse> {
    let mut json: serde_json::Value = serde_json::from_str(raw)?;
    if let Some(result) = json.get_mut("result") {
        json = result.take();
    }
    Ok(serde_json::from_value(json)?)
}
