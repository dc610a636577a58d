use alloy::primitives::{Address, B256};
use anyhow::bail;
use clap::Args;
use mpt_lib::mapping_slot_key;
use url::Url;

/// Where proofs come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// JSON-RPC endpoint of the source chain.
    #[arg(long, env = "SOURCE_RPC_URL")]
    pub rpc_url: Url,

    /// Contract whose storage is proven.
    #[arg(long, env = "TARGET_CONTRACT")]
    pub contract: Address,

    /// Block to prove against; latest when omitted.
    #[arg(long, env = "BLOCK_NUMBER")]
    pub block: Option<u64>,
}

/// Which storage slot is proven.
#[derive(Args, Debug, Clone)]
pub struct SlotArgs {
    /// Holder whose entry in a `mapping(address => uint256)` is proven.
    #[arg(long, env = "HOLDER_ADDRESS", required_unless_present = "slot_key")]
    pub holder: Option<Address>,

    /// Declaration index of the mapping in the contract's storage layout.
    #[arg(long, env = "MAPPING_SLOT", default_value_t = 1)]
    pub mapping_slot: u64,

    /// Raw storage slot, used instead of a holder.
    #[arg(long, env = "TARGET_SLOT", conflicts_with = "holder")]
    pub slot_key: Option<B256>,
}

impl SlotArgs {
    pub fn resolve(&self) -> anyhow::Result<B256> {
        match (self.slot_key, self.holder) {
            (Some(slot), _) => Ok(slot),
            (None, Some(holder)) => {
                Ok(B256::from(mapping_slot_key(&holder.0 .0, self.mapping_slot)))
            }
            (None, None) => bail!("either a holder address or a raw storage slot is required"),
        }
    }
}
