//! Contract storage on top of the proof verifier.
//!
//! Storage tries are keyed by `keccak256(slot)` and every leaf holds the RLP encoding of
//! the slot value with leading zero bytes stripped. A zero slot is not stored at all, so
//! it is proven with an exclusion proof.

use tracing::{debug, info};

use crate::error::VerifyError;
use crate::mpt::{check_inclusion, DeadEnd, Proven};
use crate::rlp_encoding::{decode_bytes, encode_bytes, keccak256};
use crate::types::{MPTProofInput, MPTVerificationResult, StorageProofEntry, StorageProofResponse, H256};

/// Storage slot of `mapping(address => _)` entry `holder` when the mapping is declared
/// at slot index `slot`: `keccak256(leftPad32(holder) ++ leftPad32(slot))`.
pub fn mapping_slot_key(holder: &[u8; 20], slot: u64) -> H256 {
    let mut preimage = [0u8; 64];
    preimage[12..32].copy_from_slice(holder);
    preimage[56..64].copy_from_slice(&slot.to_be_bytes());
    keccak256(&preimage)
}

/// Leaf payload for a big-endian slot value; empty when the value is zero.
pub fn encode_storage_value(value: &[u8]) -> Vec<u8> {
    let first = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    match &value[first..] {
        [] => Vec::new(),
        trimmed => encode_bytes(trimmed),
    }
}

/// Big-endian slot value from a leaf payload; empty payload means zero.
pub fn decode_storage_value(payload: &[u8]) -> Result<Vec<u8>, VerifyError> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    let value = decode_bytes(payload)?;
    if value.first() == Some(&0) {
        return Err(VerifyError::malformed("storage value with leading zero"));
    }
    Ok(value.to_vec())
}

/// Root of a trie without nodes, `keccak256(rlp(""))`.
pub fn empty_trie_root() -> H256 {
    keccak256(&[0x80])
}

impl MPTProofInput {
    /// Like [`check_inclusion`], except that an empty proof of an empty value under the
    /// empty-trie root is absence: nodes return exactly that for accounts without storage.
    pub fn check(&self) -> Result<Proven, VerifyError> {
        if self.proof.is_empty() && self.value.is_empty() && self.root == empty_trie_root() {
            return Ok(Proven::Absent(DeadEnd::EmptyTrie));
        }
        check_inclusion(&self.root, &self.key, &self.proof, &self.value)
    }

    pub fn verify(&self) -> MPTVerificationResult {
        let outcome = self.check();
        MPTVerificationResult {
            verified: outcome.is_ok(),
            outcome: outcome.as_ref().ok().copied(),
            reason: outcome.err().map(|err| err.to_string()),
            root: self.root,
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }
}

impl StorageProofEntry {
    /// Proof input for this slot under the account's `storage_hash`.
    pub fn to_input(&self, storage_hash: H256) -> MPTProofInput {
        MPTProofInput {
            root: storage_hash,
            key: self.key.to_vec(),
            value: encode_storage_value(&self.value),
            proof: self.proof.clone(),
        }
    }
}

impl StorageProofResponse {
    /// Verify every slot against `storage_hash`; one result per entry, in order.
    pub fn verify(&self) -> Vec<MPTVerificationResult> {
        self.storage_proof
            .iter()
            .map(|entry| {
                let result = entry.to_input(self.storage_hash).verify();
                match &result.reason {
                    None => info!(slot = %hex::encode(entry.key), "storage proof verified"),
                    Some(reason) => debug!(slot = %hex::encode(entry.key), %reason, "storage proof rejected"),
                }
                result
            })
            .collect()
    }

    /// Whether every slot verifies. Checks without logging; callers that already hold
    /// the results of [`Self::verify`] should fold over those instead.
    pub fn all_verified(&self) -> bool {
        self.storage_proof
            .iter()
            .all(|entry| entry.to_input(self.storage_hash).check().is_ok())
    }
}
