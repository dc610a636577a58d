use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

/// Trie path: one 4-bit value per element, two per key byte, high nibble first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NibblePath(Vec<u8>);

impl NibblePath {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(to_nibbles(bytes))
    }

    /// Build a path from values that are already nibbles. Values above `0xf` are masked.
    pub fn from_nibbles(nibbles: &[u8]) -> Self {
        Self(nibbles.iter().map(|n| n & 0x0f).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    /// Nibbles from `index` to the end; empty when `index` is past the end.
    pub fn rest(&self, index: usize) -> &[u8] {
        self.0.get(index..).unwrap_or(&[])
    }

    /// Whether `segment` occurs in the path starting at `index`.
    pub fn matches_at(&self, index: usize, segment: &[u8]) -> bool {
        self.rest(index).starts_with(segment)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

/// Whether an encoded path belongs to an extension or a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathKind {
    Extension,
    Leaf,
}

/// Hex-prefix header carried in the first byte of an encoded path.
///
/// Tag values 0..=3 in the high nibble; odd variants keep the first path nibble in the
/// low nibble.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HexPrefix {
    ExtensionEven,
    ExtensionOdd { leading: u8 },
    LeafEven,
    LeafOdd { leading: u8 },
}

impl HexPrefix {
    pub fn from_first_byte(first: u8) -> Result<Self, VerifyError> {
        let low = first & 0x0f;
        match first >> 4 {
            0 => Ok(Self::ExtensionEven),
            1 => Ok(Self::ExtensionOdd { leading: low }),
            2 => Ok(Self::LeafEven),
            3 => Ok(Self::LeafOdd { leading: low }),
            tag => Err(VerifyError::InvalidHexPrefixTag(tag)),
        }
    }

    pub fn to_first_byte(self) -> u8 {
        match self {
            Self::ExtensionEven => 0x00,
            Self::ExtensionOdd { leading } => 0x10 | (leading & 0x0f),
            Self::LeafEven => 0x20,
            Self::LeafOdd { leading } => 0x30 | (leading & 0x0f),
        }
    }

    pub fn new(kind: PathKind, leading: Option<u8>) -> Self {
        match (kind, leading) {
            (PathKind::Extension, None) => Self::ExtensionEven,
            (PathKind::Extension, Some(leading)) => Self::ExtensionOdd { leading },
            (PathKind::Leaf, None) => Self::LeafEven,
            (PathKind::Leaf, Some(leading)) => Self::LeafOdd { leading },
        }
    }

    pub fn kind(self) -> PathKind {
        match self {
            Self::ExtensionEven | Self::ExtensionOdd { .. } => PathKind::Extension,
            Self::LeafEven | Self::LeafOdd { .. } => PathKind::Leaf,
        }
    }

    pub fn is_odd(self) -> bool {
        self.leading_nibble().is_some()
    }

    pub fn leading_nibble(self) -> Option<u8> {
        match self {
            Self::ExtensionOdd { leading } | Self::LeafOdd { leading } => Some(leading),
            Self::ExtensionEven | Self::LeafEven => None,
        }
    }
}

/// Encode path with compact encoding
/// First nibble contains: odd_flag (bit 0) and leaf_flag (bit 1)
pub fn encode_path(nibbles: &[u8], is_leaf: bool) -> Vec<u8> {
    let kind = if is_leaf { PathKind::Leaf } else { PathKind::Extension };
    let (leading, rest) = match nibbles.len() % 2 {
        1 => (Some(nibbles[0]), &nibbles[1..]),
        _ => (None, nibbles),
    };

    let mut encoded = Vec::with_capacity(1 + rest.len() / 2);
    encoded.push(HexPrefix::new(kind, leading).to_first_byte());
    encoded.extend(from_nibbles(rest));
    encoded
}

/// Decode compact-encoded path
/// Returns the header and the nibbles it carries
pub fn decode_path(encoded: &[u8]) -> Result<(HexPrefix, Vec<u8>), VerifyError> {
    let (&first, tail) = encoded
        .split_first()
        .ok_or_else(|| VerifyError::malformed("empty encoded path"))?;

    let prefix = HexPrefix::from_first_byte(first)?;
    if !prefix.is_odd() && first & 0x0f != 0 {
        return Err(VerifyError::malformed(format!(
            "non-zero padding in even hex-prefix byte {first:#04x}"
        )));
    }

    let mut nibbles = Vec::with_capacity(1 + tail.len() * 2);
    nibbles.extend(prefix.leading_nibble());
    nibbles.extend(to_nibbles(tail));
    Ok((prefix, nibbles))
}

/// Convert bytes to nibbles (hex digits)
pub fn to_nibbles(data: &[u8]) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(data.len() * 2);
    for &byte in data {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }
    nibbles
}

/// Convert nibbles back to bytes; an odd trailing nibble is padded with zero
pub fn from_nibbles(nibbles: &[u8]) -> Vec<u8> {
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | (pair.get(1).copied().unwrap_or(0) & 0x0f))
        .collect()
}
