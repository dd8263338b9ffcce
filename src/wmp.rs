//! The word map artifact.
//!
//! Maps a multiset of letters to every accepted word spelled with
//! exactly those letters. The word-map generator uses it to enumerate
//! plays by subrack lookup instead of walking the automaton.

use crate::bit_rack::BitRack;
use crate::error::Error;
use crate::tiles::MachineLetter;
use crate::tileset::TileSet;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct WordMap {
    words: HashMap<BitRack, Vec<Vec<MachineLetter>>>,
    max_word_length: usize,
}

impl WordMap {
    /// Build a word map from a word list.
    /// ## Errors
    /// If a word can not be encoded.
    pub fn from_words(words: &[&str], tileset: &TileSet) -> Result<WordMap, Error> {
        let mut map: HashMap<BitRack, Vec<Vec<MachineLetter>>> = HashMap::new();
        let mut max_word_length = 0;
        for &word in words {
            let mls = tileset.encode(word)?;
            max_word_length = max_word_length.max(mls.len());
            map.entry(BitRack::from_letters(&mls))
                .or_default()
                .push(mls);
        }
        Ok(WordMap {
            words: map,
            max_word_length,
        })
    }

    /// True if some accepted word uses exactly the letters in `key`.
    /// `length` must equal the key's cardinality; it exists so callers
    /// can pre-filter by word length.
    pub fn has_word(&self, key: &BitRack, length: usize) -> bool {
        debug_assert_eq!(key.total() as usize, length);
        self.words.contains_key(key)
    }

    /// Every anagram of `key` that is an accepted word.
    pub fn words_of(&self, key: &BitRack) -> &[Vec<MachineLetter>] {
        self.words.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn max_word_length(&self) -> usize {
        self.max_word_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tileset::Language;
    use anyhow::Result;

    #[test]
    fn test_anagram_grouping() -> Result<()> {
        let ts = TileSet::new(Language::EN);
        let wmp = WordMap::from_words(&["CAT", "ACT", "DOG", "TACO"], &ts)?;
        let key = BitRack::from_letters(&ts.encode("ACT")?);
        assert!(wmp.has_word(&key, 3));
        assert_eq!(wmp.words_of(&key).len(), 2);
        let taco = BitRack::from_letters(&ts.encode("OCAT")?);
        assert_eq!(wmp.words_of(&taco).len(), 1);
        let none = BitRack::from_letters(&ts.encode("QQ")?);
        assert!(!wmp.has_word(&none, 2));
        assert_eq!(wmp.max_word_length(), 4);
        Ok(())
    }
}
