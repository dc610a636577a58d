//! In-memory reference trie that produces honest proofs for the integration tests.
//!
//! Nodes follow the Ethereum encoding: children shorter than 32 bytes are embedded in
//! their parent and omitted from proofs, everything else is referenced by keccak256.

#![allow(dead_code)]

use std::collections::BTreeMap;

use mpt_lib::{encode_path, keccak256, to_nibbles, H256, INLINE_LIMIT};
use rlp::RlpStream;

#[derive(Clone, Debug)]
enum TrieNode {
    Leaf(Vec<u8>, Vec<u8>),                            // (path, value)
    Extension(Vec<u8>, Box<TrieNode>),                 // (path, child)
    Branch(Box<[Option<TrieNode>; 16]>, Option<Vec<u8>>), // (children, value)
}

/// Trie over nibble paths, rebuilt from its entries on every change.
#[derive(Default)]
pub struct ReferenceTrie {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    root: Option<TrieNode>,
}

impl ReferenceTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under the nibbles of `key` as given (no hashing).
    pub fn insert(&mut self, key: &[u8], value: &[u8]) {
        self.insert_nibbles(to_nibbles(key), value);
    }

    /// Insert the way a storage trie does: path `keccak256(key)`.
    pub fn insert_hashed(&mut self, key: &[u8], value: &[u8]) {
        self.insert(&keccak256(key), value);
    }

    pub fn insert_nibbles(&mut self, path: Vec<u8>, value: &[u8]) {
        self.entries.insert(path, value.to_vec());
        let entries: Vec<_> = self.entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice())).collect();
        self.root = build(&entries);
    }

    pub fn root(&self) -> H256 {
        match &self.root {
            Some(node) => keccak256(&encode(node)),
            // keccak256(rlp(""))
            None => keccak256(&[0x80]),
        }
    }

    pub fn prove(&self, key: &[u8]) -> Vec<Vec<u8>> {
        self.prove_nibbles(&to_nibbles(key))
    }

    pub fn prove_hashed(&self, key: &[u8]) -> Vec<Vec<u8>> {
        self.prove(&keccak256(key))
    }

    /// Nodes on the path to `path`, root first, stopping at the first embedded node or
    /// where the path leaves the trie.
    pub fn prove_nibbles(&self, path: &[u8]) -> Vec<Vec<u8>> {
        let Some(mut node) = self.root.as_ref() else {
            return Vec::new();
        };
        let mut proof = vec![encode(node)];
        let mut rest = path;

        loop {
            let next = match node {
                TrieNode::Leaf(..) => break,
                TrieNode::Extension(shared, child) => {
                    if !rest.starts_with(shared) {
                        break;
                    }
                    rest = &rest[shared.len()..];
                    &**child
                }
                TrieNode::Branch(children, _) => match rest.split_first() {
                    Some((nibble, tail)) => match &children[*nibble as usize] {
                        Some(child) => {
                            rest = tail;
                            child
                        }
                        None => break,
                    },
                    None => break,
                },
            };

            let encoded = encode(next);
            if encoded.len() < INLINE_LIMIT {
                break;
            }
            proof.push(encoded);
            node = next;
        }

        proof
    }
}

fn build(entries: &[(&[u8], &[u8])]) -> Option<TrieNode> {
    match entries {
        [] => None,
        [(path, value)] => Some(TrieNode::Leaf(path.to_vec(), value.to_vec())),
        _ => {
            let common = common_prefix_len(entries);
            if common > 0 {
                let stripped: Vec<_> = entries.iter().map(|(k, v)| (&k[common..], *v)).collect();
                let child = build_branch(&stripped);
                return Some(TrieNode::Extension(entries[0].0[..common].to_vec(), Box::new(child)));
            }
            Some(build_branch(entries))
        }
    }
}

fn build_branch(entries: &[(&[u8], &[u8])]) -> TrieNode {
    let mut children: [Option<TrieNode>; 16] = Default::default();
    let mut value = None;

    for nibble in 0..16u8 {
        let group: Vec<_> = entries
            .iter()
            .filter(|(k, _)| k.first() == Some(&nibble))
            .map(|(k, v)| (&k[1..], *v))
            .collect();
        children[nibble as usize] = build(&group);
    }
    if let Some((_, v)) = entries.iter().find(|(k, _)| k.is_empty()) {
        value = Some(v.to_vec());
    }

    TrieNode::Branch(Box::new(children), value)
}

/// Helper function to find common prefix length
fn common_prefix_len(entries: &[(&[u8], &[u8])]) -> usize {
    let first = entries[0].0;
    entries[1..].iter().fold(first.len(), |len, (k, _)| {
        first[..len].iter().zip(k.iter()).take_while(|(x, y)| x == y).count()
    })
}

fn encode(node: &TrieNode) -> Vec<u8> {
    let mut s;
    match node {
        TrieNode::Leaf(path, value) => {
            s = RlpStream::new_list(2);
            s.append(&encode_path(path, true));
            s.append(value);
        }
        TrieNode::Extension(path, child) => {
            s = RlpStream::new_list(2);
            s.append(&encode_path(path, false));
            append_child(&mut s, child);
        }
        TrieNode::Branch(children, value) => {
            s = RlpStream::new_list(17);
            for child in children.iter() {
                match child {
                    Some(child) => append_child(&mut s, child),
                    None => {
                        s.append_empty_data();
                    }
                }
            }
            match value {
                Some(v) => {
                    s.append(v);
                }
                None => {
                    s.append_empty_data();
                }
            }
        }
    }
    s.out().to_vec()
}

fn append_child(s: &mut RlpStream, child: &TrieNode) {
    let encoded = encode(child);
    if encoded.len() < INLINE_LIMIT {
        s.append_raw(&encoded, 1);
    } else {
        s.append(&keccak256(&encoded).to_vec());
    }
}
