//! The word-map generation path.
//!
//! Instead of walking the automaton, enumerate subracks of the rack,
//! union each with the playthrough multiset of an extent, and look the
//! combined multiset up in the word map. Every anagram that fits the
//! extent's through tiles, cross sets and extension sets is recorded.
//! Anchors are processed per extent, stratified by playthrough blocks
//! and tiles to play.

use super::Gen;
use crate::bit_rack::BitRack;
use crate::moves::MoveList;
use crate::tiles::{
    get_blanked, get_is_blanked, get_unblanked, MachineLetter, BLANK_MACHINE_LETTER,
    MAX_ALPHABET_SIZE, PLAYED_THROUGH_MARKER,
};

impl<'a> Gen<'a> {
    /// Generate every placement at the current anchor by word-map
    /// lookup.
    pub(crate) fn wordmap_gen_anchor(&mut self, move_list: &mut MoveList) {
        let max_word_length = match self.word_map {
            Some(wmp) => wmp.max_word_length(),
            None => return,
        };
        let mut extents = self.extents_for_anchor(self.anchor_pos, self.last_anchor_col);
        // Stratified processing order: playthrough blocks, then tiles
        // to play, then position.
        extents.sort_by_key(|e| {
            (
                e.playthrough_blocks,
                e.empty_positions.len(),
                e.left,
                e.right,
            )
        });
        for extent in extents {
            if extent.right - extent.left + 1 > max_word_length {
                continue;
            }
            let mut chosen: Vec<MachineLetter> = Vec::with_capacity(extent.empty_positions.len());
            self.choose_subrack(
                move_list,
                extent.left,
                extent.right,
                extent.playthrough,
                extent.empty_positions.len(),
                BLANK_MACHINE_LETTER,
                &mut chosen,
            );
        }
    }

    /// Pick `remaining` more tiles from the rack, blank included, then
    /// try the chosen multiset against the word map.
    #[allow(clippy::too_many_arguments)]
    fn choose_subrack(
        &mut self,
        move_list: &mut MoveList,
        left: usize,
        right: usize,
        playthrough: BitRack,
        remaining: usize,
        letter: MachineLetter,
        chosen: &mut Vec<MachineLetter>,
    ) {
        if remaining == 0 {
            self.expand_blanks(move_list, left, right, playthrough, chosen);
            return;
        }
        if letter as usize > self.board.dist_size() {
            return;
        }
        let available = usize::from(self.rack.count(letter));
        self.choose_subrack(
            move_list,
            left,
            right,
            playthrough,
            remaining,
            letter + 1,
            chosen,
        );
        let mut pushed = 0;
        for take in 1..=available.min(remaining) {
            chosen.push(letter);
            pushed += 1;
            self.choose_subrack(
                move_list,
                left,
                right,
                playthrough,
                remaining - take,
                letter + 1,
                chosen,
            );
        }
        for _ in 0..pushed {
            chosen.pop();
        }
    }

    /// Designate every blank in the chosen multiset, nondecreasing so
    /// each designation multiset is tried once.
    fn expand_blanks(
        &mut self,
        move_list: &mut MoveList,
        left: usize,
        right: usize,
        playthrough: BitRack,
        chosen: &[MachineLetter],
    ) {
        let blanks = chosen
            .iter()
            .filter(|&&ml| ml == BLANK_MACHINE_LETTER)
            .count();
        let naturals: Vec<MachineLetter> = chosen
            .iter()
            .cloned()
            .filter(|&ml| ml != BLANK_MACHINE_LETTER)
            .collect();
        let mut designated: Vec<MachineLetter> = Vec::with_capacity(blanks);
        self.expand_blanks_recurse(
            move_list,
            left,
            right,
            playthrough,
            &naturals,
            blanks,
            1,
            &mut designated,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_blanks_recurse(
        &mut self,
        move_list: &mut MoveList,
        left: usize,
        right: usize,
        playthrough: BitRack,
        naturals: &[MachineLetter],
        blanks_remaining: usize,
        from_letter: MachineLetter,
        designated: &mut Vec<MachineLetter>,
    ) {
        if blanks_remaining == 0 {
            self.try_key(move_list, left, right, playthrough, naturals, designated);
            return;
        }
        for letter in from_letter..=self.board.dist_size() as MachineLetter {
            designated.push(letter);
            self.expand_blanks_recurse(
                move_list,
                left,
                right,
                playthrough,
                naturals,
                blanks_remaining - 1,
                letter,
                designated,
            );
            designated.pop();
        }
    }

    /// Look the combined multiset up and lay out every word that fits.
    fn try_key(
        &mut self,
        move_list: &mut MoveList,
        left: usize,
        right: usize,
        playthrough: BitRack,
        naturals: &[MachineLetter],
        designated: &[MachineLetter],
    ) {
        let mut key = playthrough;
        for &ml in naturals.iter().chain(designated.iter()) {
            key.add_letter(ml);
        }
        let word_map = self.word_map.expect("word map path requires a word map");
        let words: Vec<Vec<MachineLetter>> = word_map.words_of(&key).to_vec();
        for word in words {
            self.lay_word(move_list, left, right, &word, naturals, designated);
        }
    }

    /// Fit a specific spelling into the extent, then enumerate every
    /// natural/blank assignment of the placed letters.
    fn lay_word(
        &mut self,
        move_list: &mut MoveList,
        left: usize,
        right: usize,
        word: &[MachineLetter],
        naturals: &[MachineLetter],
        designated: &[MachineLetter],
    ) {
        debug_assert_eq!(word.len(), right - left + 1);
        let mut empty_positions_by_letter: Vec<(MachineLetter, Vec<usize>)> = Vec::new();
        for (offset, &letter) in word.iter().enumerate() {
            let pos = left + offset;
            let (row, col) = self.coords(pos);
            let square = *self.board.square(row, col, self.dir, self.cross_index);
            if !square.is_empty() {
                if get_unblanked(square.letter) != letter {
                    return;
                }
                continue;
            }
            if square.cross_set & (1u64 << letter) == 0 {
                return;
            }
            match empty_positions_by_letter
                .iter_mut()
                .find(|(l, _)| *l == letter)
            {
                Some((_, positions)) => positions.push(pos),
                None => empty_positions_by_letter.push((letter, vec![pos])),
            }
        }
        if !self.verify_extension_sets(left, right, word) {
            return;
        }
        let mut natural_counts: [u8; MAX_ALPHABET_SIZE] = [0; MAX_ALPHABET_SIZE];
        for &ml in naturals {
            natural_counts[ml as usize] += 1;
        }
        let mut blank_counts: [u8; MAX_ALPHABET_SIZE] = [0; MAX_ALPHABET_SIZE];
        for &ml in designated {
            blank_counts[ml as usize] += 1;
        }
        // Word minus playthrough must equal naturals plus designations.
        for (letter, positions) in &empty_positions_by_letter {
            let slot = *letter as usize;
            if usize::from(natural_counts[slot]) + usize::from(blank_counts[slot])
                != positions.len()
            {
                return;
            }
        }
        // Mark through squares once; assignments rewrite the empties.
        for pos in left..=right {
            let (row, col) = self.coords(pos);
            if !self.board.is_empty(row, col) {
                self.strip[pos] = PLAYED_THROUGH_MARKER;
            }
        }
        self.assign_letters(
            move_list,
            left,
            right,
            &empty_positions_by_letter,
            &natural_counts,
            0,
        );
    }

    /// At an all-playthrough boundary the placed letter must agree with
    /// the cached extension set.
    fn verify_extension_sets(&self, left: usize, right: usize, word: &[MachineLetter]) -> bool {
        let occupied = |pos: usize| {
            let (row, col) = self.coords(pos);
            !self.board.is_empty(row, col)
        };
        // Single empty square on the right edge of one through block.
        if right > left && (left..right).all(occupied) && !occupied(right) {
            let (row, col) = self.coords(right);
            let set = self
                .board
                .right_extension_set(row, col, self.dir, self.cross_index);
            if set & (1u64 << word[right - left]) == 0 {
                return false;
            }
        }
        // Single empty square on the left edge of one through block.
        if right > left && (left + 1..=right).all(occupied) && !occupied(left) {
            let (row, col) = self.coords(left);
            let set = self
                .board
                .left_extension_set(row, col, self.dir, self.cross_index);
            if set & (1u64 << word[0]) == 0 {
                return false;
            }
        }
        true
    }

    /// For each letter, choose which of its squares take the natural
    /// tile and which take a designated blank; record every assignment.
    fn assign_letters(
        &mut self,
        move_list: &mut MoveList,
        left: usize,
        right: usize,
        by_letter: &[(MachineLetter, Vec<usize>)],
        natural_counts: &[u8; MAX_ALPHABET_SIZE],
        letter_index: usize,
    ) {
        if letter_index == by_letter.len() {
            self.record_assignment(move_list, left, right, by_letter);
            return;
        }
        let (letter, positions) = {
            let (l, p) = &by_letter[letter_index];
            (*l, p.clone())
        };
        let naturals = usize::from(natural_counts[letter as usize]);
        let m = positions.len();
        for mask in 0u32..(1u32 << m) {
            if mask.count_ones() as usize != naturals {
                continue;
            }
            for (i, &pos) in positions.iter().enumerate() {
                self.strip[pos] = if mask & (1 << i) != 0 {
                    letter
                } else {
                    get_blanked(letter)
                };
            }
            self.assign_letters(
                move_list,
                left,
                right,
                by_letter,
                natural_counts,
                letter_index + 1,
            );
        }
    }

    /// Take the assigned tiles off the rack, record through the shared
    /// policy filter, and restore.
    fn record_assignment(
        &mut self,
        move_list: &mut MoveList,
        left: usize,
        right: usize,
        by_letter: &[(MachineLetter, Vec<usize>)],
    ) {
        let mut taken: Vec<MachineLetter> = Vec::new();
        for (_, positions) in by_letter {
            for &pos in positions {
                let tile = self.strip[pos];
                taken.push(if get_is_blanked(tile) {
                    BLANK_MACHINE_LETTER
                } else {
                    tile
                });
            }
        }
        for &ml in &taken {
            self.rack.take_letter(ml);
            self.leave_map.take_letter(ml, self.rack.count(ml));
            self.tiles_played += 1;
        }
        self.record_play(left, right, move_list);
        for &ml in taken.iter().rev() {
            self.leave_map.add_letter(ml, self.rack.count(ml));
            self.rack.add_letter(ml);
            self.tiles_played -= 1;
        }
    }
}
