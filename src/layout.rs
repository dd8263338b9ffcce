//! Board layouts.
//!
//! A [`BoardLayout`] is the read-only layout artifact: one byte per
//! square packing the word multiplier in the high nibble and the letter
//! multiplier in the low nibble, with a reserved value for bricked
//! squares, plus the start coordinates.

use crate::error::Error;
use std::fmt;

/// Raw value of a bricked square.
pub const BRICK_VALUE: u8 = 0xFF;

const NO_BONUS: u8 = 0x11;

const BONUS_CHARS: &[(char, u8)] = &[
    (' ', 0x11),
    ('\'', 0x12),
    ('-', 0x21),
    ('"', 0x13),
    ('=', 0x31),
    ('^', 0x14),
    ('~', 0x41),
    ('#', BRICK_VALUE),
];

fn bonus_from_char(c: char) -> Option<u8> {
    BONUS_CHARS.iter().find(|&&(ch, _)| ch == c).map(|&(_, v)| v)
}

fn bonus_to_char(raw: u8) -> char {
    BONUS_CHARS
        .iter()
        .find(|&&(_, v)| v == raw)
        .map(|&(c, _)| c)
        .unwrap_or('?')
}

#[inline]
pub fn bonus_word_multiplier(raw: u8) -> u8 {
    debug_assert!(raw != BRICK_VALUE);
    raw >> 4
}

#[inline]
pub fn bonus_letter_multiplier(raw: u8) -> u8 {
    debug_assert!(raw != BRICK_VALUE);
    raw & 0x0F
}

/// The bonus squares, bricks and start square of a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLayout {
    name: String,
    dim: usize,
    squares: Vec<u8>,
    start: (usize, usize),
}

impl Default for BoardLayout {
    fn default() -> Self {
        BoardLayout::standard15()
    }
}

impl fmt::Display for BoardLayout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_strings().join("\n"))
    }
}

impl BoardLayout {
    /// Parse a layout from one string per row. Recognized characters:
    /// space (no bonus), `'` (2L), `-` (2W), `"` (3L), `=` (3W),
    /// `^` (4L), `~` (4W), `#` (brick).
    /// ## Errors
    /// If the rows are not square or contain an unknown character.
    pub fn from_strings<S: AsRef<str>>(
        name: &str,
        rows: &[S],
        start: (usize, usize),
    ) -> Result<BoardLayout, Error> {
        let dim = rows.len();
        let mut squares = Vec::with_capacity(dim * dim);
        for row in rows {
            let chars: Vec<char> = row.as_ref().chars().collect();
            if chars.len() != dim {
                return Err(Error::InvalidRowLength(chars.len(), dim));
            }
            for c in chars {
                squares.push(
                    bonus_from_char(c).ok_or_else(|| Error::LayoutParseError(c.to_string()))?,
                );
            }
        }
        Ok(BoardLayout {
            name: String::from(name),
            dim,
            squares,
            start,
        })
    }

    /// Expand a quarter board by mirroring it horizontally and
    /// vertically.
    fn expand_quarter(name: &str, quarter: &[&str]) -> BoardLayout {
        let q = quarter.len();
        let dim = 2 * q - 1;
        let mut squares = vec![NO_BONUS; dim * dim];
        for (i, row) in quarter.iter().enumerate() {
            for (j, c) in row.chars().enumerate() {
                let val = bonus_from_char(c).unwrap();
                squares[i * dim + j] = val;
                squares[(dim - i - 1) * dim + j] = val;
                squares[i * dim + (dim - j - 1)] = val;
                squares[(dim - i - 1) * dim + (dim - j - 1)] = val;
            }
        }
        BoardLayout {
            name: String::from(name),
            dim,
            squares,
            start: (q - 1, q - 1),
        }
    }

    /// The standard 15×15 layout.
    pub fn standard15() -> BoardLayout {
        BoardLayout::expand_quarter(
            "standard15",
            &[
                "=  '   =",
                " -   \"  ",
                "  -   ' ",
                "'  -   '",
                "    -   ",
                " \"   \"  ",
                "  '   ' ",
                "=  '   -",
            ],
        )
    }

    /// A 15×15 layout with no bonus squares. Useful for isolating
    /// placement heuristics in tests.
    pub fn plain15() -> BoardLayout {
        BoardLayout::expand_quarter(
            "plain15",
            &[
                "        ",
                "        ",
                "        ",
                "        ",
                "        ",
                "        ",
                "        ",
                "        ",
            ],
        )
    }

    /// The 21×21 "super" layout with quadruple bonuses in the outer ring.
    pub fn super21() -> BoardLayout {
        BoardLayout::expand_quarter(
            "super21",
            &[
                "~  '   =   ",
                " ^   \"   ' ",
                "  -   '    ",
                "'  =   '  -",
                "    -   \"  ",
                " \"   -   ' ",
                "  '   -    ",
                "=  '   -   ",
                "    \"   -  ",
                " '   '   - ",
                "   -       ",
            ],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn start(&self) -> (usize, usize) {
        self.start
    }

    /// Raw packed bonus byte at a square.
    pub fn bonus_at(&self, row: usize, col: usize) -> u8 {
        self.squares[row * self.dim + col]
    }

    pub fn is_brick(&self, row: usize, col: usize) -> bool {
        self.bonus_at(row, col) == BRICK_VALUE
    }

    pub fn to_strings(&self) -> Vec<String> {
        (0..self.dim)
            .map(|row| {
                (0..self.dim)
                    .map(|col| bonus_to_char(self.bonus_at(row, col)))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_standard15() {
        let layout = BoardLayout::standard15();
        assert_eq!(layout.dim(), 15);
        assert_eq!(layout.start(), (7, 7));
        // corners are triple word
        for &(r, c) in &[(0, 0), (0, 14), (14, 0), (14, 14), (0, 7), (7, 0)] {
            assert_eq!(bonus_word_multiplier(layout.bonus_at(r, c)), 3);
        }
        // center is double word
        assert_eq!(bonus_word_multiplier(layout.bonus_at(7, 7)), 2);
        // double letters beside the start row
        assert_eq!(bonus_letter_multiplier(layout.bonus_at(7, 3)), 2);
        assert_eq!(bonus_letter_multiplier(layout.bonus_at(6, 6)), 2);
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let layout = BoardLayout::standard15();
        let strings = layout.to_strings();
        let parsed = BoardLayout::from_strings("standard15", &strings, (7, 7))?;
        assert_eq!(parsed, layout);
        Ok(())
    }

    #[test]
    fn test_super21() {
        let layout = BoardLayout::super21();
        assert_eq!(layout.dim(), 21);
        assert_eq!(layout.start(), (10, 10));
        assert_eq!(bonus_word_multiplier(layout.bonus_at(0, 0)), 4);
    }

    #[test]
    fn test_bricks() -> Result<()> {
        let rows = ["#  ", "   ", "  #"];
        let layout = BoardLayout::from_strings("bricked3", &rows, (1, 1))?;
        assert!(layout.is_brick(0, 0));
        assert!(layout.is_brick(2, 2));
        assert!(!layout.is_brick(1, 1));
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        assert!(BoardLayout::from_strings("bad", &["x"], (0, 0)).is_err());
        assert!(BoardLayout::from_strings("bad", &["  ", " "], (0, 0)).is_err());
    }
}
