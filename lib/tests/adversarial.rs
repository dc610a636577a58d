mod common;

use std::collections::BTreeMap;

use common::ReferenceTrie;
use mpt_lib::{
    check_inclusion, decode_path, encode_path, keccak256, to_nibbles, HexPrefix, Node,
    NibblePath, Proven, TrieWalker, VerifyError,
};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

proptest! {
    #[test]
    fn classify_never_panics(raw in vec(any::<u8>(), 0..200)) {
        let _ = Node::classify(&raw);
    }

    #[test]
    fn random_proofs_never_verify(
        root in any::<[u8; 32]>(),
        key in vec(any::<u8>(), 0..40),
        proof in vec(vec(any::<u8>(), 0..120), 0..6),
        value in vec(any::<u8>(), 1..8),
    ) {
        prop_assert!(check_inclusion(&root, &key, &proof, &value).is_err());
    }

    #[test]
    fn self_rooted_garbage_is_handled(
        raw in vec(any::<u8>(), 1..200),
        path in vec(0u8..16, 0..70),
        value in vec(any::<u8>(), 0..8),
    ) {
        // the root link holds, so everything after it is classification and walking
        let root = keccak256(&raw);
        let path = NibblePath::from_nibbles(&path);
        let proof = vec![raw];
        let _ = TrieWalker::new(root, &path, &proof).verify(&value);
    }

    #[test]
    fn nibbles_double_length(bytes in vec(any::<u8>(), 0..64)) {
        let nibbles = to_nibbles(&bytes);
        prop_assert_eq!(nibbles.len(), 2 * bytes.len());
        prop_assert!(nibbles.iter().all(|n| *n < 16));
    }

    #[test]
    fn hex_prefix_round_trips(nibbles in vec(0u8..16, 0..65), is_leaf in any::<bool>()) {
        let encoded = encode_path(&nibbles, is_leaf);
        let (prefix, decoded) = decode_path(&encoded).unwrap();
        prop_assert_eq!(&decoded, &nibbles);
        prop_assert_eq!(prefix.to_first_byte(), encoded[0]);
        prop_assert_eq!(HexPrefix::from_first_byte(encoded[0]).unwrap(), prefix);
    }

    #[test]
    fn honest_proofs_verify(
        entries in btree_map(any::<[u8; 32]>(), vec(1u8..=255, 1..40), 1..40),
        absent in any::<[u8; 32]>(),
    ) {
        let mut trie = ReferenceTrie::new();
        for (key, value) in &entries {
            trie.insert_hashed(key, value);
        }
        let root = trie.root();

        for (key, value) in &entries {
            let proof = trie.prove_hashed(key);
            prop_assert_eq!(check_inclusion(&root, key, &proof, value), Ok(Proven::Included));
        }

        if !entries.contains_key(&absent) {
            let proof = trie.prove_hashed(&absent);
            let outcome = check_inclusion(&root, &absent, &proof, b"");
            prop_assert!(matches!(outcome, Ok(Proven::Absent(_))));
            prop_assert!(check_inclusion(&root, &absent, &proof, &[1]).is_err());
        }
    }

    #[test]
    fn truncated_or_extended_proofs_fail(
        entries in btree_map(any::<[u8; 32]>(), vec(any::<u8>(), 1..40), 2..20),
    ) {
        let mut trie = ReferenceTrie::new();
        for (key, value) in &entries {
            trie.insert_hashed(key, value);
        }
        let root = trie.root();
        let (key, value) = entries.iter().next().unwrap();
        let proof = trie.prove_hashed(key);

        let mut extended = proof.clone();
        extended.push(proof[0].clone());
        prop_assert!(check_inclusion(&root, key, &extended, value).is_err());

        if proof.len() > 1 {
            let truncated = &proof[..proof.len() - 1];
            prop_assert!(matches!(
                check_inclusion(&root, key, truncated, value),
                Err(VerifyError::ProofTruncated { .. })
            ), "expected ProofTruncated for truncated proof");
        }
    }
}

#[test]
fn empty_trie_root_is_not_a_node() {
    let trie = ReferenceTrie::new();
    let root = trie.root();
    assert_eq!(trie.prove(b"anything"), Vec::<Vec<u8>>::new());
    assert_eq!(
        check_inclusion(&root, b"anything", &[], b""),
        Err(VerifyError::ProofTruncated { index: 0 })
    );
    // rlp("") hashes to the root but is not a list
    assert!(matches!(
        check_inclusion(&root, b"anything", &[vec![0x80]], b""),
        Err(VerifyError::MalformedNode(_))
    ));
}

#[test]
fn deep_proof_verifies() {
    // one branch per nibble of a 64-byte key, each with a hashed sibling leaf
    let mut entries = BTreeMap::new();
    let key = [0x5au8; 64];
    let nibbles = to_nibbles(&key);
    for depth in 0..nibbles.len() {
        let mut sibling = nibbles[..depth].to_vec();
        sibling.push((nibbles[depth] + 1) % 16);
        entries.insert(sibling, vec![0xab; 40]);
    }
    entries.insert(nibbles.clone(), vec![0xcd; 40]);

    let mut trie = ReferenceTrie::new();
    for (path, value) in &entries {
        trie.insert_nibbles(path.clone(), value);
    }
    let proof = trie.prove_nibbles(&nibbles);
    assert_eq!(proof.len(), nibbles.len() + 1);

    let path = NibblePath::from_nibbles(&nibbles);
    let walker = TrieWalker::new(trie.root(), &path, &proof);
    assert_eq!(walker.verify(&[0xcd; 40]), Ok(Proven::Included));
}
