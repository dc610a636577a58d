use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::VerifyError;
use crate::node::{ChildRef, Node, INLINE_LIMIT};
use crate::path::NibblePath;
use crate::rlp_encoding::keccak256;
use crate::types::H256;

/// Where an exclusion proof ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeadEnd {
    /// The branch has no child for the next nibble at `depth`.
    EmptyBranchSlot { depth: usize },
    /// The key ends at a node whose value is empty.
    EmptyValue { depth: usize },
    /// The extension at `depth` leads somewhere else.
    ExtensionDivergence { depth: usize },
    /// The leaf at `depth` holds a different key.
    LeafDivergence { depth: usize },
    /// The trie has no nodes at all; its root is `keccak256(rlp(""))`.
    EmptyTrie,
}

/// What a successful verification established.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Proven {
    /// The key maps to the claimed non-empty value.
    Included,
    /// The key maps to nothing; only returned when the claim was the empty value.
    Absent(DeadEnd),
}

/// Cursor of a walk. Each step produces a fresh state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerificationState<'a> {
    /// What the parent committed to; the trusted root for the first step.
    pub expected: ChildRef<'a>,
    /// Nibbles of the path consumed so far.
    pub key_index: usize,
    /// Next proof element to read.
    pub proof_index: usize,
}

impl<'a> VerificationState<'a> {
    pub fn root(root: H256) -> Self {
        Self {
            expected: ChildRef::Hash(root),
            key_index: 0,
            proof_index: 0,
        }
    }

    fn descend(self, child: ChildRef<'a>, consumed: usize, proof_index: usize) -> Self {
        Self {
            expected: child,
            key_index: self.key_index + consumed,
            proof_index,
        }
    }
}

/// Walks a nibble path through an untrusted proof, checking every link.
///
/// The walk is a loop over [`VerificationState`]: each iteration either consumes a proof
/// node or enters a strictly smaller embedded node, so it always terminates.
pub struct TrieWalker<'a> {
    root: H256,
    path: &'a NibblePath,
    proof: &'a [Vec<u8>],
}

impl<'a> TrieWalker<'a> {
    pub fn new(root: H256, path: &'a NibblePath, proof: &'a [Vec<u8>]) -> Self {
        Self { root, path, proof }
    }

    pub fn verify(&self, expected_value: &[u8]) -> Result<Proven, VerifyError> {
        self.verify_from(VerificationState::root(self.root), expected_value)
    }

    /// Continue a walk from an arbitrary state.
    pub fn verify_from(
        &self,
        mut state: VerificationState<'a>,
        expected_value: &[u8],
    ) -> Result<Proven, VerifyError> {
        loop {
            if state.key_index > self.path.len() {
                return Err(VerifyError::malformed(format!(
                    "key index {} past path of {} nibbles",
                    state.key_index,
                    self.path.len()
                )));
            }

            let (raw, next_proof_index) = self.fetch(&state)?;
            let depth = state.key_index;
            trace!(proof_index = state.proof_index, depth, len = raw.len(), "walking node");

            let node = Node::classify(raw).inspect_err(|err| {
                debug!(proof_index = state.proof_index, %err, "rejected proof node");
            })?;

            let (child, consumed) = match node {
                Node::Branch { children, value } => {
                    let Some(nibble) = self.path.get(depth) else {
                        return self.terminal(value, expected_value, depth, next_proof_index);
                    };
                    match children[nibble as usize] {
                        ChildRef::Empty => {
                            return self.dead_end(
                                DeadEnd::EmptyBranchSlot { depth },
                                expected_value,
                                next_proof_index,
                            )
                        }
                        child => (child, 1),
                    }
                }
                Node::Extension { shared, child } => {
                    if !self.path.matches_at(depth, &shared) {
                        return self.dead_end(
                            DeadEnd::ExtensionDivergence { depth },
                            expected_value,
                            next_proof_index,
                        );
                    }
                    (child, shared.len())
                }
                Node::Leaf { key_end, value } => {
                    if key_end != self.path.rest(depth) {
                        return self.dead_end(
                            DeadEnd::LeafDivergence { depth },
                            expected_value,
                            next_proof_index,
                        );
                    }
                    return self.terminal(
                        value,
                        expected_value,
                        self.path.len(),
                        next_proof_index,
                    );
                }
            };

            state = state.descend(child, consumed, next_proof_index);
        }
    }

    /// Resolve the node `state` points at and check it against the parent's reference.
    /// Returns the raw node and the proof index after it.
    fn fetch(&self, state: &VerificationState<'a>) -> Result<(&'a [u8], usize), VerifyError> {
        let index = state.proof_index;
        let next = self.proof.get(index).map(Vec::as_slice);

        match state.expected {
            ChildRef::Hash(expected) => {
                let raw = next.ok_or(VerifyError::ProofTruncated { index })?;
                // The root is always referenced by hash; below it short nodes are embedded.
                let linked = (index == 0 || raw.len() >= INLINE_LIMIT) && keccak256(raw) == expected;
                if !linked {
                    debug!(proof_index = index, "hash link broken");
                    return Err(VerifyError::HashMismatch { index });
                }
                Ok((raw, index + 1))
            }
            ChildRef::Inline(embedded) => match next {
                Some(raw) if raw == embedded => Ok((raw, index + 1)),
                Some(_) => {
                    debug!(proof_index = index, "embedded node differs from proof node");
                    Err(VerifyError::HashMismatch { index })
                }
                // Embedded nodes are authenticated by their parent and usually omitted.
                None => Ok((embedded, index)),
            },
            ChildRef::Empty => Err(VerifyError::malformed("walk reached an empty reference")),
        }
    }

    fn terminal(
        &self,
        stored: &[u8],
        expected_value: &[u8],
        depth: usize,
        next_proof_index: usize,
    ) -> Result<Proven, VerifyError> {
        if stored != expected_value {
            debug!(depth, "stored value differs from claim");
            return Err(VerifyError::value_mismatch(expected_value, stored));
        }
        self.ensure_consumed(next_proof_index)?;

        if stored.is_empty() {
            Ok(Proven::Absent(DeadEnd::EmptyValue { depth }))
        } else {
            Ok(Proven::Included)
        }
    }

    fn dead_end(
        &self,
        dead_end: DeadEnd,
        expected_value: &[u8],
        next_proof_index: usize,
    ) -> Result<Proven, VerifyError> {
        if !expected_value.is_empty() {
            let depth = dead_end.depth();
            debug!(depth, ?dead_end, "key leaves the proven trie");
            return Err(VerifyError::KeyPathDivergence { depth });
        }
        self.ensure_consumed(next_proof_index)?;
        Ok(Proven::Absent(dead_end))
    }

    fn ensure_consumed(&self, next_proof_index: usize) -> Result<(), VerifyError> {
        match self.proof.len().saturating_sub(next_proof_index) {
            0 => Ok(()),
            count => Err(VerifyError::UnusedProofNodes { count }),
        }
    }
}

impl DeadEnd {
    pub fn depth(&self) -> usize {
        match *self {
            DeadEnd::EmptyBranchSlot { depth }
            | DeadEnd::EmptyValue { depth }
            | DeadEnd::ExtensionDivergence { depth }
            | DeadEnd::LeafDivergence { depth } => depth,
            DeadEnd::EmptyTrie => 0,
        }
    }
}

/// Verify a Merkle Patricia Trie proof and report why it fails.
///
/// # Arguments
/// * `root` - The trusted root hash of the trie
/// * `key` - The unhashed key; the trie path is `keccak256(key)`
/// * `proof` - RLP-encoded nodes from the root towards the key
/// * `claimed_value` - The leaf payload, or empty to claim the key is absent
pub fn check_inclusion(
    root: &H256,
    key: &[u8],
    proof: &[Vec<u8>],
    claimed_value: &[u8],
) -> Result<Proven, VerifyError> {
    let path = NibblePath::from_bytes(&keccak256(key));
    TrieWalker::new(*root, &path, proof).verify(claimed_value)
}

/// Boolean form of [`check_inclusion`].
pub fn verify_inclusion(
    root: &H256,
    key: &[u8],
    proof: &[Vec<u8>],
    claimed_value: &[u8],
) -> bool {
    check_inclusion(root, key, proof, claimed_value).is_ok()
}

/// Verify a proof against a path that is already hashed (or not hashed at all).
pub fn verify_proof(
    root: &H256,
    path: &[u8],
    expected_value: &[u8],
    proof: &[Vec<u8>],
) -> bool {
    let path = NibblePath::from_bytes(path);
    TrieWalker::new(*root, &path, proof)
        .verify(expected_value)
        .is_ok()
}
