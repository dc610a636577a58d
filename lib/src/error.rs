use rlp::DecoderError;
use thiserror::Error;

/// Reasons a proof fails to verify.
///
/// Every variant is a verdict on untrusted input, never a program fault. None of them
/// is worth retrying: the same root and proof always produce the same result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Node is not a 2- or 17-item RLP list, or one of its items has the wrong shape.
    #[error("malformed trie node: {0}")]
    MalformedNode(String),

    /// Hex-prefix tag (high nibble of the encoded path) outside `0..=3`.
    #[error("invalid hex-prefix tag {0:#x}")]
    InvalidHexPrefixTag(u8),

    /// The node at `index` is not the one its parent (or the trusted root) commits to.
    #[error("node at proof index {index} does not match its parent reference")]
    HashMismatch { index: usize },

    /// The walk needed a node at `index` but the proof ended.
    #[error("proof truncated: no node at index {index}")]
    ProofTruncated { index: usize },

    /// The key path leaves the proven part of the trie while a value was claimed.
    #[error("key path diverges from the trie at nibble {depth}")]
    KeyPathDivergence { depth: usize },

    /// A terminal was reached for the key but it stores a different value.
    #[error("stored value {found} does not match claimed value {claimed}")]
    ValueMismatch { claimed: String, found: String },

    /// The walk terminated but the proof carries more nodes.
    #[error("{count} unused node(s) after the terminal node")]
    UnusedProofNodes { count: usize },
}

impl VerifyError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedNode(reason.into())
    }

    pub(crate) fn value_mismatch(claimed: &[u8], found: &[u8]) -> Self {
        Self::ValueMismatch {
            claimed: format!("0x{}", hex::encode(claimed)),
            found: format!("0x{}", hex::encode(found)),
        }
    }
}

impl From<DecoderError> for VerifyError {
    fn from(err: DecoderError) -> Self {
        Self::MalformedNode(format!("rlp: {err:?}"))
    }
}
