use rlp::Rlp;
use sha3::{Digest, Keccak256};

use crate::error::VerifyError;
use crate::types::H256;

/// Compute Keccak256 hash
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode a byte string using RLP
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    rlp::encode(&data.to_vec()).to_vec()
}

/// Decode a single RLP-encoded byte string, rejecting lists and trailing bytes
pub fn decode_bytes(data: &[u8]) -> Result<&[u8], VerifyError> {
    let item = Rlp::new(data);
    ensure_exact(&item, data.len())?;
    Ok(item.data()?)
}

/// Fails unless the item's header and payload cover exactly `len` bytes
pub(crate) fn ensure_exact(item: &Rlp<'_>, len: usize) -> Result<(), VerifyError> {
    let total = item.payload_info()?.total();
    if total != len {
        return Err(VerifyError::malformed(format!(
            "rlp item spans {total} bytes of {len}"
        )));
    }
    Ok(())
}
