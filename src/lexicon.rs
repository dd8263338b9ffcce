//! The lexicon automaton.
//!
//! A [`Lexicon`] is a rooted acyclic automaton over machine letters with
//! "gaddag"-style reversible arcs: for a word `w` and every split point
//! `i`, the automaton contains the path `rev(w[..i]) SEP w[i..]`, plus the
//! full reversal `rev(w)`. This lets the generator extend leftward from
//! any anchor and switch direction on the separator arc.
//!
//! Nodes are stored as a flat vector; each node keeps the index of its
//! first child and a bitmap of child labels, so arc lookup is a popcount.
//! The search engine never mutates the automaton.

use crate::error::Error;
use crate::tiles::MachineLetter;
use crate::tileset::TileSet;
use std::collections::BTreeMap;
use std::fmt;

/// Label of the direction-switch arc.
pub const SEPARATION_MACHINE_LETTER: MachineLetter = 0;

#[derive(Debug, Clone, Copy)]
struct Node {
    first_child: u32,
    child_labels: u64,
}

#[derive(Default)]
struct TrieNode {
    children: BTreeMap<MachineLetter, TrieNode>,
    terminal: bool,
}

impl TrieNode {
    fn insert(&mut self, seq: &[MachineLetter]) {
        let mut node = self;
        for &ml in seq {
            node = node.children.entry(ml).or_default();
        }
        node.terminal = true;
    }
}

/// A gaddag automaton built over a word list.
#[derive(Debug, Clone)]
pub struct Lexicon {
    nodes: Vec<Node>,
    terminal: Vec<bool>,
    word_count: usize,
    name: String,
}

impl fmt::Display for Lexicon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "<Lexicon '{}': {} words, {} nodes>",
            self.name,
            self.word_count,
            self.nodes.len()
        )
    }
}

impl Lexicon {
    /// Build a lexicon from a list of words.
    /// ## Errors
    /// If a word can not be encoded with the given tile set.
    pub fn from_words(words: &[&str], tileset: &TileSet) -> Result<Lexicon, Error> {
        let mut root = TrieNode::default();
        let mut word_count = 0;
        for &word in words {
            let mls = tileset.encode(word)?;
            word_count += 1;
            // Full reversal, then every proper split.
            let mut rev: Vec<MachineLetter> = mls.iter().rev().cloned().collect();
            root.insert(&rev);
            for i in 1..mls.len() {
                rev.clear();
                rev.extend(mls[..i].iter().rev());
                rev.push(SEPARATION_MACHINE_LETTER);
                rev.extend_from_slice(&mls[i..]);
                root.insert(&rev);
            }
        }
        Ok(Lexicon::freeze(root, word_count, String::new()))
    }

    pub fn with_name(mut self, name: &str) -> Lexicon {
        self.name = String::from(name);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flatten the builder trie into the node vector, breadth first, so
    /// each node's children occupy contiguous indices.
    fn freeze(root: TrieNode, word_count: usize, name: String) -> Lexicon {
        let mut nodes = Vec::new();
        let mut terminal = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(&root);
        // First pass assigns BFS indices implicitly by insertion order.
        let mut flat: Vec<&TrieNode> = Vec::new();
        while let Some(node) = queue.pop_front() {
            flat.push(node);
            for child in node.children.values() {
                queue.push_back(child);
            }
        }
        // Second pass lays out child pointers.
        let mut next_child = 1u32;
        for node in &flat {
            let mut child_labels = 0u64;
            for &label in node.children.keys() {
                child_labels |= 1u64 << label;
            }
            nodes.push(Node {
                first_child: next_child,
                child_labels,
            });
            terminal.push(node.terminal);
            next_child += node.children.len() as u32;
        }
        Lexicon {
            nodes,
            terminal,
            word_count,
            name,
        }
    }

    /// The root node index.
    pub fn root(&self) -> usize {
        0
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Follow the arc labeled `label` out of `node`. Returns the target
    /// node and whether the arc completes a word.
    pub fn arc(&self, node: usize, label: MachineLetter) -> Option<(usize, bool)> {
        let n = &self.nodes[node];
        let bit = 1u64 << label;
        if n.child_labels & bit == 0 {
            return None;
        }
        let rank = (n.child_labels & (bit - 1)).count_ones();
        let target = n.first_child as usize + rank as usize;
        Some((target, self.terminal[target]))
    }

    /// True if the arc labeled `label` out of `node` completes a word.
    pub fn accepts(&self, node: usize, label: MachineLetter) -> bool {
        matches!(self.arc(node, label), Some((_, true)))
    }

    /// Iterate over `(label, target, accepts, is_end_of_arcs)` for every
    /// arc out of `node`.
    pub fn arcs_of(&self, node: usize) -> impl Iterator<Item = (MachineLetter, usize, bool, bool)> + '_ {
        let n = self.nodes[node];
        let count = n.child_labels.count_ones() as usize;
        let mut labels = n.child_labels;
        (0..count).map(move |i| {
            let label = labels.trailing_zeros() as MachineLetter;
            labels &= labels - 1;
            let target = n.first_child as usize + i;
            (label, target, self.terminal[target], i + 1 == count)
        })
    }

    /// Follow the separator arc out of `node`, if present.
    pub fn separator_arc(&self, node: usize) -> Option<usize> {
        self.arc(node, SEPARATION_MACHINE_LETTER).map(|(t, _)| t)
    }

    /// Test a spelled-out word against the automaton.
    pub fn accepts_word(&self, word: &[MachineLetter]) -> bool {
        match word.len() {
            0 => false,
            1 => self.accepts(self.root(), word[0]),
            _ => {
                // Path for split point 1: first letter, separator, rest.
                let mut node = match self.arc(self.root(), word[0]) {
                    Some((n, _)) => n,
                    None => return false,
                };
                node = match self.separator_arc(node) {
                    Some(n) => n,
                    None => return false,
                };
                for (i, &ml) in word[1..].iter().enumerate() {
                    match self.arc(node, ml) {
                        Some((n, accepts)) => {
                            if i + 2 == word.len() {
                                return accepts;
                            }
                            node = n;
                        }
                        None => return false,
                    }
                }
                unreachable!("loop returns on the last letter");
            }
        }
    }

    /// True if any accepted word uses exactly the letters in `counts`
    /// (index per machine letter). Used for anagram variants.
    pub fn accepts_anagram(&self, counts: &mut [u8], remaining: usize) -> bool {
        self.anagram_from(self.root(), counts, remaining)
    }

    fn anagram_from(&self, node: usize, counts: &mut [u8], remaining: usize) -> bool {
        for (label, target, accepts, _) in self.arcs_of(node) {
            if label == SEPARATION_MACHINE_LETTER {
                continue;
            }
            let slot = label as usize;
            if slot >= counts.len() || counts[slot] == 0 {
                continue;
            }
            if remaining == 1 {
                if accepts {
                    return true;
                }
                continue;
            }
            counts[slot] -= 1;
            let found = self.anagram_from(target, counts, remaining - 1);
            counts[slot] += 1;
            if found {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tileset::{Language, TileSet};
    use anyhow::Result;

    fn lexicon(words: &[&str]) -> Lexicon {
        Lexicon::from_words(words, &TileSet::new(Language::EN)).unwrap()
    }

    #[test]
    fn test_accepts_word() -> Result<()> {
        let lex = lexicon(&["CAT", "CATS", "DOG"]);
        let ts = TileSet::new(Language::EN);
        for word in &["CAT", "CATS", "DOG"] {
            assert!(lex.accepts_word(&ts.encode(word)?), "{}", word);
        }
        for word in &["CA", "ATS", "DOGS", "TAC"] {
            assert!(!lex.accepts_word(&ts.encode(word)?), "{}", word);
        }
        Ok(())
    }

    #[test]
    fn test_gaddag_paths() -> Result<()> {
        // For CAT the path A SEP T from the C-split must exist.
        let lex = lexicon(&["CAT"]);
        let ts = TileSet::new(Language::EN);
        let c = ts.encode("C")?[0];
        let a = ts.encode("A")?[0];
        let t = ts.encode("T")?[0];
        // rev("CA") = A, C then SEP then T.
        let (n, _) = lex.arc(lex.root(), a).unwrap();
        let (n, _) = lex.arc(n, c).unwrap();
        let n = lex.separator_arc(n).unwrap();
        assert!(lex.accepts(n, t));
        // Full reversal: T, A, C accepts at the end.
        let (n, _) = lex.arc(lex.root(), t).unwrap();
        let (n, _) = lex.arc(n, a).unwrap();
        assert!(lex.accepts(n, c));
        Ok(())
    }

    #[test]
    fn test_arcs_of() -> Result<()> {
        let lex = lexicon(&["AB", "AD"]);
        let ts = TileSet::new(Language::EN);
        let a = ts.encode("A")?[0];
        let (n, _) = lex.arc(lex.root(), a).unwrap();
        let arcs: Vec<_> = lex.arcs_of(n).collect();
        // separator plus B and D reversal arcs
        assert!(arcs.iter().any(|&(l, _, _, _)| l == SEPARATION_MACHINE_LETTER));
        let last = arcs.last().unwrap();
        assert!(last.3);
        assert_eq!(arcs.iter().filter(|a| a.3).count(), 1);
        Ok(())
    }

    #[test]
    fn test_accepts_anagram() -> Result<()> {
        let lex = lexicon(&["CAT"]);
        let ts = TileSet::new(Language::EN);
        let mut counts = vec![0u8; ts.size() + 1];
        for &ml in &ts.encode("TCA")? {
            counts[ml as usize] += 1;
        }
        assert!(lex.accepts_anagram(&mut counts, 3));
        let mut other = vec![0u8; ts.size() + 1];
        for &ml in &ts.encode("TCC")? {
            other[ml as usize] += 1;
        }
        assert!(!lex.accepts_anagram(&mut other, 3));
        Ok(())
    }
}
