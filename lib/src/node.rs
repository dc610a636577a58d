//! Classification of raw proof nodes.
//!
//! A node is decoded once into [`Node`] and the walker dispatches on the variant. Shapes
//! that are neither a branch, an extension nor a leaf come back as
//! [`VerifyError::MalformedNode`].

use rlp::Rlp;

use crate::error::VerifyError;
use crate::path::{decode_path, PathKind};
use crate::rlp_encoding::{ensure_exact, keccak256};
use crate::types::H256;

/// Items in a branch node: 16 children followed by the value slot.
pub const BRANCH_ITEMS: usize = 17;

/// Items in an extension or leaf node.
pub const SHORT_ITEMS: usize = 2;

/// Encoded nodes shorter than this are embedded in their parent instead of hashed.
pub const INLINE_LIMIT: usize = 32;

/// How a parent refers to a child node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildRef<'a> {
    Empty,
    Hash(H256),
    /// Raw RLP of a node small enough to be embedded in the parent.
    Inline(&'a [u8]),
}

impl<'a> ChildRef<'a> {
    /// Reference a parent would hold for `raw`.
    pub fn to_node(raw: &'a [u8]) -> Self {
        if raw.len() < INLINE_LIMIT {
            ChildRef::Inline(raw)
        } else {
            ChildRef::Hash(keccak256(raw))
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ChildRef::Empty)
    }

    fn decode(item: Rlp<'a>) -> Result<Self, VerifyError> {
        if item.is_list() {
            let raw = item.as_raw();
            if raw.len() >= INLINE_LIMIT {
                return Err(VerifyError::malformed(format!(
                    "embedded child of {} bytes must be referenced by hash",
                    raw.len()
                )));
            }
            return Ok(ChildRef::Inline(raw));
        }

        let data = item.data()?;
        match data.len() {
            0 => Ok(ChildRef::Empty),
            32 => {
                let mut hash = [0u8; 32];
                hash.copy_from_slice(data);
                Ok(ChildRef::Hash(hash))
            }
            n => Err(VerifyError::malformed(format!(
                "child reference of {n} bytes"
            ))),
        }
    }
}

/// Decoded trie node borrowing from the raw proof bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node<'a> {
    Branch {
        children: [ChildRef<'a>; 16],
        value: &'a [u8],
    },
    Extension {
        shared: Vec<u8>,
        child: ChildRef<'a>,
    },
    Leaf {
        key_end: Vec<u8>,
        value: &'a [u8],
    },
}

impl<'a> Node<'a> {
    /// Decode and classify one RLP-encoded node.
    pub fn classify(raw: &'a [u8]) -> Result<Self, VerifyError> {
        let rlp = Rlp::new(raw);
        if !rlp.is_list() {
            return Err(VerifyError::malformed("node is not an rlp list"));
        }
        ensure_exact(&rlp, raw.len())?;

        match rlp.item_count()? {
            BRANCH_ITEMS => Self::branch(&rlp),
            SHORT_ITEMS => Self::short(&rlp),
            n => Err(VerifyError::malformed(format!("node has {n} items"))),
        }
    }

    fn branch(rlp: &Rlp<'a>) -> Result<Self, VerifyError> {
        let mut children = [ChildRef::Empty; 16];
        for (i, child) in children.iter_mut().enumerate() {
            *child = ChildRef::decode(rlp.at(i)?)?;
        }
        let value = rlp.at(16)?.data()?;
        Ok(Node::Branch { children, value })
    }

    fn short(rlp: &Rlp<'a>) -> Result<Self, VerifyError> {
        let (prefix, nibbles) = decode_path(rlp.at(0)?.data()?)?;
        let second = rlp.at(1)?;

        match prefix.kind() {
            PathKind::Leaf => Ok(Node::Leaf {
                key_end: nibbles,
                value: second.data()?,
            }),
            PathKind::Extension => {
                if nibbles.is_empty() {
                    return Err(VerifyError::malformed("extension with empty shared path"));
                }
                let child = ChildRef::decode(second)?;
                if child.is_empty() {
                    return Err(VerifyError::malformed("extension without child"));
                }
                Ok(Node::Extension {
                    shared: nibbles,
                    child,
                })
            }
        }
    }
}
