use serde::{Deserialize, Serialize};

use crate::mpt::Proven;

/// 32-byte hash type
pub type H256 = [u8; 32];

/// Input for MPT proof verification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MPTProofInput {
    #[serde(with = "hex_h256")]
    pub root: H256,
    /// Unhashed key; the trie path is its keccak256.
    #[serde(with = "hex_bytes")]
    pub key: Vec<u8>,
    /// Claimed leaf payload, empty to claim absence.
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
    /// RLP-encoded nodes, root first.
    #[serde(with = "hex_list")]
    pub proof: Vec<Vec<u8>>,
}

/// Storage section of an `eth_getProof` response.
///
/// `storage_hash` is trusted by the caller, everything under `storage_proof` is not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProofResponse {
    #[serde(with = "hex_h256")]
    pub storage_hash: H256,
    pub storage_proof: Vec<StorageProofEntry>,
}

/// One slot of an `eth_getProof` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProofEntry {
    /// Storage slot, left padded to 32 bytes.
    #[serde(with = "hex_slot")]
    pub key: H256,
    /// Slot value as a big-endian quantity.
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
    #[serde(with = "hex_list")]
    pub proof: Vec<Vec<u8>>,
}

/// Output from MPT proof verification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MPTVerificationResult {
    pub verified: bool,
    /// Set when verified.
    pub outcome: Option<Proven>,
    /// Failure reason when not verified.
    pub reason: Option<String>,
    #[serde(with = "hex_h256")]
    pub root: H256,
    #[serde(with = "hex_bytes")]
    pub key: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

/// Parse a `0x`-prefixed hex string; odd-length quantities such as `0x5` are accepted.
pub fn parse_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}"))
    } else {
        hex::decode(digits)
    }
}

/// Parse a hex string into a left-padded 32-byte word.
pub fn parse_h256(s: &str) -> Result<H256, hex::FromHexError> {
    let bytes = parse_hex(s)?;
    if bytes.len() > 32 {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::to_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        super::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

mod hex_list {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&super::to_hex(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(d)?
            .iter()
            .map(|s| super::parse_hex(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

mod hex_h256 {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::H256;

    pub fn serialize<S: Serializer>(word: &H256, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::to_hex(word))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<H256, D::Error> {
        let s = String::deserialize(d)?;
        let bytes = super::parse_hex(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|b: Vec<u8>| serde::de::Error::invalid_length(b.len(), &"32 bytes"))
    }
}

/// Like `hex_h256` but tolerates short quantities (`0x1`), as nodes return slot keys.
mod hex_slot {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::H256;

    pub fn serialize<S: Serializer>(word: &H256, s: S) -> Result<S::Ok, S::Error> {
        super::hex_h256::serialize(word, s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<H256, D::Error> {
        let s = String::deserialize(d)?;
        super::parse_h256(&s).map_err(serde::de::Error::custom)
    }
}
