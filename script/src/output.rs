use clap::ValueEnum;
use mpt_lib::{decode_storage_value, MPTVerificationResult, Proven};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One line per slot.
    #[default]
    Text,
    /// The verification results as a JSON array.
    Json,
    /// One ABI-encoded `VerificationOutput` per slot, hex.
    Abi,
}

pub fn render(results: &[MPTVerificationResult], format: Format) -> anyhow::Result<String> {
    let rendered = match format {
        Format::Text => results.iter().map(text_line).collect::<Vec<_>>().join("\n"),
        Format::Json => serde_json::to_string_pretty(results)?,
        Format::Abi => results
            .iter()
            .map(|result| format!("0x{}", hex::encode(result.abi_encode())))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    Ok(rendered)
}

fn text_line(result: &MPTVerificationResult) -> String {
    let slot = hex::encode(&result.key);
    match (&result.outcome, &result.reason) {
        (Some(Proven::Included), _) => {
            let value = decode_storage_value(&result.value)
                .map(|v| format!("0x{}", hex::encode(v)))
                .unwrap_or_else(|_| format!("rlp 0x{}", hex::encode(&result.value)));
            format!("slot 0x{slot}: verified, value {value}")
        }
        (Some(Proven::Absent(dead_end)), _) => {
            format!("slot 0x{slot}: verified empty ({dead_end:?})")
        }
        (None, reason) => format!(
            "slot 0x{slot}: REJECTED: {}",
            reason.as_deref().unwrap_or("unknown")
        ),
    }
}
