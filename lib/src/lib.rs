use alloy_sol_types::{sol, SolType};

pub mod error;
pub mod types;
pub mod rlp_encoding;
pub mod path;
pub mod node;
pub mod mpt;
pub mod storage;

pub use error::*;
pub use types::*;
pub use rlp_encoding::*;
pub use path::*;
pub use node::*;
pub use mpt::*;
pub use storage::*;

sol! {
    /// A verification verdict encoded for Solidity consumers.
    struct VerificationOutput {
        bool verified;
        bytes32 root;
        bytes32 key;
        bytes value;
    }
}

impl MPTVerificationResult {
    /// ABI encoding of the verdict. `key` is the trie path, `keccak256` of the raw key.
    pub fn abi_encode(&self) -> Vec<u8> {
        VerificationOutput::abi_encode(&VerificationOutput {
            verified: self.verified,
            root: self.root.into(),
            key: keccak256(&self.key).into(),
            value: self.value.clone().into(),
        })
    }
}
