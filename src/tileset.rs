//! Letter distributions.
//!
//! A [`TileSet`] is the read-only letter-distribution artifact: how many
//! of each tile exist, what each scores, which are vowels, and how tiles
//! are displayed. The engine never mutates it.

use crate::equity::Equity;
use crate::error::Error;
use crate::tiles::{
    get_is_blanked, get_unblanked, MachineLetter, BLANK_MACHINE_LETTER, MAX_ALPHABET_SIZE,
};

/// Supported tile distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// English, standard 100-tile distribution
    EN,
}

/// (label, count, score, is_vowel) per letter, blank excluded.
type TileData = &'static [(&'static str, u8, i32, bool)];

const EN_TILES: TileData = &[
    ("A", 9, 1, true),
    ("B", 2, 3, false),
    ("C", 2, 3, false),
    ("D", 4, 2, false),
    ("E", 12, 1, true),
    ("F", 2, 4, false),
    ("G", 3, 2, false),
    ("H", 2, 4, false),
    ("I", 9, 1, true),
    ("J", 1, 8, false),
    ("K", 1, 5, false),
    ("L", 4, 1, false),
    ("M", 2, 3, false),
    ("N", 6, 1, false),
    ("O", 8, 1, true),
    ("P", 2, 3, false),
    ("Q", 1, 10, false),
    ("R", 6, 1, false),
    ("S", 4, 1, false),
    ("T", 6, 1, false),
    ("U", 4, 1, true),
    ("V", 2, 4, false),
    ("W", 2, 4, false),
    ("X", 1, 8, false),
    ("Y", 2, 4, false),
    ("Z", 1, 10, false),
];

const EN_BLANK_COUNT: u8 = 2;

/// The tile distribution for a language: letter labels, counts, scores
/// and vowel flags. Letter 0 is the blank.
#[derive(Debug, Clone)]
pub struct TileSet {
    language: Language,
    labels: Vec<String>,
    counts: Vec<u8>,
    scores: Vec<Equity>,
    vowels: Vec<bool>,
    total_tiles: u32,
}

impl Default for TileSet {
    fn default() -> Self {
        TileSet::new(Language::EN)
    }
}

impl TileSet {
    pub fn new(language: Language) -> TileSet {
        let data = match language {
            Language::EN => EN_TILES,
        };
        let blank_count = match language {
            Language::EN => EN_BLANK_COUNT,
        };
        assert!(data.len() <= MAX_ALPHABET_SIZE);
        let mut labels = vec![String::from("?")];
        let mut counts = vec![blank_count];
        let mut scores = vec![Equity::ZERO];
        let mut vowels = vec![false];
        for &(label, count, score, is_vowel) in data {
            labels.push(String::from(label));
            counts.push(count);
            scores.push(Equity::from_int(score));
            vowels.push(is_vowel);
        }
        let total_tiles = counts.iter().map(|&c| u32::from(c)).sum();
        TileSet {
            language,
            labels,
            counts,
            scores,
            vowels,
            total_tiles,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Number of letters in the alphabet, blank excluded.
    pub fn size(&self) -> usize {
        self.labels.len() - 1
    }

    /// Number of copies of `ml` in a full bag.
    pub fn count(&self, ml: MachineLetter) -> u8 {
        self.counts[ml as usize]
    }

    /// Score of `ml`. Blanks and blank-designated letters score zero.
    pub fn score(&self, ml: MachineLetter) -> Equity {
        if get_is_blanked(ml) || ml == BLANK_MACHINE_LETTER {
            Equity::ZERO
        } else {
            self.scores[ml as usize]
        }
    }

    pub fn is_vowel(&self, ml: MachineLetter) -> bool {
        self.vowels[get_unblanked(ml) as usize]
    }

    /// Total number of tiles in a full bag.
    pub fn total_tiles(&self) -> u32 {
        self.total_tiles
    }

    /// Scores of every tile in a full bag, descending. Used by shadow
    /// and endgame heuristics.
    pub fn scores_descending(&self) -> Vec<Equity> {
        let mut scores = Vec::with_capacity(self.total_tiles as usize);
        for ml in 0..self.labels.len() {
            for _ in 0..self.counts[ml] {
                scores.push(self.scores[ml]);
            }
        }
        scores.sort_unstable_by(|a, b| b.cmp(a));
        scores
    }

    /// Display label for a tile. Blank-designated letters display in
    /// lowercase.
    pub fn label(&self, ml: MachineLetter) -> String {
        if get_is_blanked(ml) {
            self.labels[get_unblanked(ml) as usize].to_lowercase()
        } else {
            self.labels[ml as usize].clone()
        }
    }

    /// Encode one display token to a machine letter. Uppercase tokens are
    /// natural tiles, lowercase tokens are designated blanks, `?` is the
    /// undesignated blank.
    pub fn encode_token(&self, token: &str) -> Result<MachineLetter, Error> {
        if token == "?" {
            return Ok(BLANK_MACHINE_LETTER);
        }
        let upper = token.to_uppercase();
        for (i, label) in self.labels.iter().enumerate().skip(1) {
            if *label == upper {
                let ml = i as MachineLetter;
                return Ok(if token == upper {
                    ml
                } else {
                    crate::tiles::get_blanked(ml)
                });
            }
        }
        Err(Error::EncodeInvalidToken(String::from(token)))
    }

    /// Encode a string of single-character tokens.
    pub fn encode(&self, s: &str) -> Result<Vec<MachineLetter>, Error> {
        s.chars()
            .map(|c| self.encode_token(&c.to_string()))
            .collect()
    }

    /// Decode machine letters to a display string.
    pub fn decode(&self, mls: &[MachineLetter]) -> String {
        mls.iter().map(|&ml| self.label(ml)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_en_distribution() {
        let ts = TileSet::new(Language::EN);
        assert_eq!(ts.size(), 26);
        assert_eq!(ts.total_tiles(), 100);
        // A
        assert_eq!(ts.count(1), 9);
        assert_eq!(ts.score(1), Equity::from_int(1));
        assert!(ts.is_vowel(1));
        // Z
        assert_eq!(ts.count(26), 1);
        assert_eq!(ts.score(26), Equity::from_int(10));
        assert!(!ts.is_vowel(26));
        // blank
        assert_eq!(ts.count(0), 2);
        assert_eq!(ts.score(0), Equity::ZERO);
    }

    #[test]
    fn test_encode_decode() -> Result<()> {
        let ts = TileSet::new(Language::EN);
        let mls = ts.encode("QuIZ")?;
        assert_eq!(ts.decode(&mls), "QuIZ");
        assert!(crate::tiles::get_is_blanked(mls[1]));
        assert_eq!(ts.score(mls[1]), Equity::ZERO);
        assert!(ts.encode("Q3").is_err());
        Ok(())
    }

    #[test]
    fn test_scores_descending() {
        let ts = TileSet::new(Language::EN);
        let scores = ts.scores_descending();
        assert_eq!(scores.len(), 100);
        assert_eq!(scores[0], Equity::from_int(10));
        assert_eq!(scores[99], Equity::ZERO);
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }
}
