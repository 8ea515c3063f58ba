//! Word-history tree for token passing.
//!
//! Each node stands for the word sequence spelled by the path from the root
//! to it. Nodes are `(parent, word)` pairs deduplicated through a hash map, so
//! two hypotheses that emitted the same words share one node no matter how
//! many frames or states they went through. Cells in the chart carry only a
//! [`NodeId`]; the words are recovered once, at backtrace time.

use crate::utils::WordId;
use std::collections::HashMap;

/// Index of a node in a [`WordHistoryTree`].
pub type NodeId = u32;

const NO_PARENT: NodeId = NodeId::MAX;
const NO_WORD: WordId = WordId::MAX;

/// Append-only trie over word sequences.
#[derive(Clone, Debug)]
pub struct WordHistoryTree {
    /// nodes[i] = (parent, last word); nodes[0] is the root
    nodes: Vec<(NodeId, WordId)>,
    index: HashMap<(NodeId, WordId), NodeId>,
}

impl Default for WordHistoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl WordHistoryTree {
    /// Tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![(NO_PARENT, NO_WORD)],
            index: HashMap::new(),
        }
    }

    /// The empty history.
    #[inline]
    pub fn root(&self) -> NodeId {
        0
    }

    /// Number of nodes, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; the root is never removed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node reached by appending `word` to the history `parent`, created on
    /// first use. Previously returned ids stay valid.
    ///
    /// # Panics
    /// Panics if `parent` is not a node of this tree.
    pub fn extend(&mut self, parent: NodeId, word: WordId) -> NodeId {
        assert!(
            (parent as usize) < self.nodes.len(),
            "history node {parent} does not exist"
        );
        let next = self.nodes.len() as NodeId;
        let id = *self.index.entry((parent, word)).or_insert(next);
        if id == next {
            self.nodes.push((parent, word));
        }
        id
    }

    /// Parent of a non-root node.
    ///
    /// # Panics
    /// Panics on the root.
    #[inline]
    pub fn parent_of(&self, node: NodeId) -> NodeId {
        assert_ne!(node, self.root(), "root has no parent");
        self.nodes[node as usize].0
    }

    /// Word labelling the edge from `node`'s parent to `node`.
    ///
    /// # Panics
    /// Panics on the root.
    #[inline]
    pub fn word_of(&self, node: NodeId) -> WordId {
        assert_ne!(node, self.root(), "root has no word");
        self.nodes[node as usize].1
    }

    /// Words from the root down to `node`, in order.
    pub fn words(&self, node: NodeId) -> Vec<WordId> {
        let mut out = Vec::new();
        let mut cur = node;
        while cur != self.root() {
            out.push(self.word_of(cur));
            cur = self.parent_of(cur);
        }
        out.reverse();
        out
    }

    /// Drop every node except the root, keeping allocations.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_root_only() {
        let tree = WordHistoryTree::new();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), 0);
        assert!(tree.words(tree.root()).is_empty());
    }

    #[test]
    fn extend_is_canonical() {
        let mut tree = WordHistoryTree::new();
        let a = tree.extend(tree.root(), 5);
        let b = tree.extend(tree.root(), 5);
        assert_eq!(a, b);
        let c = tree.extend(a, 7);
        let d = tree.extend(b, 7);
        assert_eq!(c, d);
        assert_eq!(tree.len(), 3);
        // same word under a different parent is a different history
        let e = tree.extend(tree.root(), 7);
        assert_ne!(e, c);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn accessors_and_words() {
        let mut tree = WordHistoryTree::new();
        let n1 = tree.extend(tree.root(), 3);
        let n2 = tree.extend(n1, 1);
        let n3 = tree.extend(n2, 3);
        assert_eq!(tree.parent_of(n3), n2);
        assert_eq!(tree.word_of(n3), 3);
        assert_eq!(tree.parent_of(n1), tree.root());
        assert_eq!(tree.words(n3), vec![3, 1, 3]);
    }

    #[test]
    fn clear_resets_to_root() {
        let mut tree = WordHistoryTree::new();
        let n = tree.extend(tree.root(), 9);
        tree.extend(n, 2);
        tree.clear();
        assert_eq!(tree.len(), 1);
        // ids are handed out again from 1
        assert_eq!(tree.extend(tree.root(), 4), 1);
    }

    #[test]
    #[should_panic(expected = "root has no parent")]
    fn parent_of_root_panics() {
        let tree = WordHistoryTree::new();
        let _ = tree.parent_of(tree.root());
    }

    #[test]
    #[should_panic(expected = "root has no word")]
    fn word_of_root_panics() {
        let tree = WordHistoryTree::new();
        let _ = tree.word_of(0);
    }
}
