use beam_viterbi::{NodeId, WordHistoryTree};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn insert_seq(tree: &mut WordHistoryTree, words: &[u32]) -> NodeId {
    words.iter().fold(tree.root(), |node, &w| tree.extend(node, w))
}

proptest! {
    #[test]
    fn size_equals_distinct_prefixes(
        seqs in prop::collection::vec(prop::collection::vec(0u32..4, 0..6), 0..20)
    ) {
        let mut tree = WordHistoryTree::new();
        let mut prefixes: HashSet<Vec<u32>> = HashSet::new();
        for seq in &seqs {
            insert_seq(&mut tree, seq);
            for k in 1..=seq.len() {
                prefixes.insert(seq[..k].to_vec());
            }
        }
        prop_assert_eq!(tree.len(), prefixes.len() + 1);
    }

    #[test]
    fn equal_sequences_share_a_node(
        seqs in prop::collection::vec(prop::collection::vec(0u32..3, 0..5), 1..16)
    ) {
        let mut tree = WordHistoryTree::new();
        let mut seen: HashMap<Vec<u32>, NodeId> = HashMap::new();
        for seq in &seqs {
            let node = insert_seq(&mut tree, seq);
            if let Some(&prev) = seen.get(seq) {
                prop_assert_eq!(prev, node);
            }
            seen.insert(seq.clone(), node);
            prop_assert_eq!(tree.words(node), seq.clone());
        }
        // distinct sequences map to distinct nodes
        let nodes: HashSet<NodeId> = seen.values().copied().collect();
        prop_assert_eq!(nodes.len(), seen.len());
    }
}

#[test]
fn ids_survive_growth() {
    let mut tree = WordHistoryTree::new();
    let early = insert_seq(&mut tree, &[1, 2, 3]);
    for w in 0..10_000u32 {
        tree.extend(early, w);
    }
    assert_eq!(tree.words(early), vec![1, 2, 3]);
    assert_eq!(tree.len(), 4 + 10_000);
}
