//! Move validation.
//!
//! Parses a human-entered move in positional notation, checks it
//! against the board, rack and lexicon, and produces a canonical
//! [`Move`] with its score, formed words and leave equity.
//!
//! Formats: `<coord>.<tiles>[.<rack>[.<challenge_points>.<turn_loss>]]`
//! for placements (`8D.QUIRKED`, `A1.OXYPHENBU$AZONE` with `$` standing
//! for a tile already on the board), `ex.<tiles|count>[.<rack>]` for
//! exchanges, `pass[.<rack>]` for passes. Lists are comma-separated.
//! Coordinates put the row first for horizontal moves and the column
//! letter first for vertical ones.

use crate::board::{BOARD_HORIZONTAL_DIRECTION, BOARD_VERTICAL_DIRECTION};
use crate::equity::Equity;
use crate::error::Error;
use crate::game::{Game, Variant};
use crate::moves::{Move, MoveKind, TileStrip};
use crate::movegen::Gen;
use crate::rack::{Rack, RACK_SIZE};
use crate::tiles::{get_unblanked, MachineLetter, PLAYED_THROUGH_MARKER};

/// One word formed by a placement and whether the lexicon accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormedWord {
    pub word: String,
    pub valid: bool,
}

/// The outcome of validating one move.
#[derive(Debug, Clone)]
pub struct ValidatedMove {
    pub mv: Move,
    /// Rack declared in the move text, if any.
    pub rack: Option<Rack>,
    pub leave_value: Equity,
    pub words: Vec<FormedWord>,
    pub challenge_points: i32,
    pub challenge_turn_loss: bool,
    /// Number of exchanged tiles for an unknown exchange.
    pub unknown_exchange: Option<usize>,
}

/// Validate a comma-separated list of moves.
pub fn validate_moves(
    game: &Game,
    player_index: usize,
    text: &str,
    allow_phonies: bool,
    allow_unknown_exchanges: bool,
) -> Result<Vec<ValidatedMove>, Error> {
    text.split(',')
        .map(|move_text| {
            validate_move(
                game,
                player_index,
                move_text.trim(),
                allow_phonies,
                allow_unknown_exchanges,
            )
        })
        .collect()
}

pub fn validate_move(
    game: &Game,
    player_index: usize,
    text: &str,
    allow_phonies: bool,
    allow_unknown_exchanges: bool,
) -> Result<ValidatedMove, Error> {
    if player_index > 1 {
        return Err(Error::InvalidPlayerIndex(player_index));
    }
    if text.is_empty() {
        return Err(Error::EmptyMove);
    }
    let fields: Vec<&str> = text.split('.').collect();
    match fields[0] {
        "pass" => validate_pass(game, player_index, text, &fields),
        "ex" => validate_exchange(game, player_index, text, &fields, allow_unknown_exchanges),
        _ => validate_placement(game, player_index, text, &fields, allow_phonies),
    }
}

fn parse_declared_rack(game: &Game, player_index: usize, field: &str) -> Result<Rack, Error> {
    let tileset = game.tileset();
    let rack = Rack::from_letters(tileset.size(), &tileset.encode(field)?);
    // The declared rack must be drawable from the unseen pool: the bag
    // plus whatever the player already holds.
    let mut pool = game.player(player_index).rack.clone();
    for ml in 0..=tileset.size() as MachineLetter {
        for _ in 0..game.bag().count_of(ml) {
            pool.add_letter(ml);
        }
    }
    if !pool.contains(&rack) {
        return Err(Error::RackNotInBag);
    }
    Ok(rack)
}

fn validate_pass(
    game: &Game,
    player_index: usize,
    text: &str,
    fields: &[&str],
) -> Result<ValidatedMove, Error> {
    if fields.len() > 2 {
        return Err(Error::ExcessFields(String::from(text)));
    }
    let rack = if fields.len() == 2 {
        Some(parse_declared_rack(game, player_index, fields[1])?)
    } else {
        None
    };
    Ok(ValidatedMove {
        mv: Move::pass(),
        rack,
        leave_value: Equity::ZERO,
        words: Vec::new(),
        challenge_points: 0,
        challenge_turn_loss: false,
        unknown_exchange: None,
    })
}

fn validate_exchange(
    game: &Game,
    player_index: usize,
    text: &str,
    fields: &[&str],
    allow_unknown_exchanges: bool,
) -> Result<ValidatedMove, Error> {
    if fields.len() < 2 {
        return Err(Error::MissingFields(String::from(text)));
    }
    if fields.len() > 3 {
        return Err(Error::ExcessFields(String::from(text)));
    }
    if game.bag().count() < RACK_SIZE {
        return Err(Error::ExchangeInsufficientTiles(RACK_SIZE));
    }
    let rack = if fields.len() == 3 {
        Some(parse_declared_rack(game, player_index, fields[2])?)
    } else {
        None
    };
    if fields[1].chars().all(|c| c.is_ascii_digit()) {
        let count: usize = fields[1]
            .parse()
            .map_err(|_| Error::MalformedInteger(String::from(fields[1])))?;
        if !allow_unknown_exchanges {
            return Err(Error::UnknownExchangeNotAllowed);
        }
        if count == 0 || count > RACK_SIZE {
            return Err(Error::MalformedInteger(String::from(fields[1])));
        }
        let mv = Move {
            kind: MoveKind::Exchange,
            tiles_played: count as u8,
            ..Move::default()
        };
        return Ok(ValidatedMove {
            mv,
            rack,
            leave_value: Equity::ZERO,
            words: Vec::new(),
            challenge_points: 0,
            challenge_turn_loss: false,
            unknown_exchange: Some(count),
        });
    }
    let tileset = game.tileset();
    let tiles = tileset.encode(fields[1])?;
    let exchanged = Rack::from_letters(tileset.size(), &tiles);
    let held = rack
        .clone()
        .unwrap_or_else(|| game.player(player_index).rack.clone());
    if held.total() > 0 && !held.contains(&exchanged) {
        return Err(Error::TilesNotInRack);
    }
    let mut strip = TileStrip::new();
    for &ml in &tiles {
        strip.push(ml);
    }
    let leave_value = match &rack {
        Some(declared) => {
            let mut leave = declared.clone();
            leave.subtract(&exchanged);
            game.player(player_index).leaves.value_of_rack(&leave)
        }
        None => Equity::ZERO,
    };
    let mv = Move {
        kind: MoveKind::Exchange,
        tiles_played: tiles.len() as u8,
        tiles: strip,
        ..Move::default()
    };
    Ok(ValidatedMove {
        mv,
        rack,
        leave_value,
        words: Vec::new(),
        challenge_points: 0,
        challenge_turn_loss: false,
        unknown_exchange: None,
    })
}

/// Parse `8D` (horizontal) or `D8` (vertical) into (row, col, dir).
fn parse_coordinates(game: &Game, coord: &str) -> Result<(usize, usize, usize), Error> {
    let dim = game.board().dim();
    let bad = || Error::MalformedCoordinates(String::from(coord));
    let chars: Vec<char> = coord.chars().collect();
    if chars.is_empty() {
        return Err(bad());
    }
    let (dir, row_text, col_char) = if chars[0].is_ascii_digit() {
        let split = chars.iter().position(|c| c.is_ascii_alphabetic()).ok_or_else(bad)?;
        if split + 1 != chars.len() {
            return Err(bad());
        }
        (
            BOARD_HORIZONTAL_DIRECTION,
            chars[..split].iter().collect::<String>(),
            chars[split],
        )
    } else if chars[0].is_ascii_alphabetic() {
        if chars.len() < 2 || !chars[1..].iter().all(|c| c.is_ascii_digit()) {
            return Err(bad());
        }
        (
            BOARD_VERTICAL_DIRECTION,
            chars[1..].iter().collect::<String>(),
            chars[0],
        )
    } else {
        return Err(bad());
    };
    let row: usize = row_text
        .parse()
        .map_err(|_| Error::MalformedInteger(row_text.clone()))?;
    if row == 0 || row > dim {
        return Err(bad());
    }
    let col = (col_char.to_ascii_uppercase() as u8 - b'A') as usize;
    if col >= dim {
        return Err(bad());
    }
    Ok((row - 1, col, dir))
}

fn validate_placement(
    game: &Game,
    player_index: usize,
    text: &str,
    fields: &[&str],
    allow_phonies: bool,
) -> Result<ValidatedMove, Error> {
    if fields.len() < 2 {
        return Err(Error::MissingFields(String::from(text)));
    }
    if fields.len() > 5 || fields.len() == 4 {
        return Err(Error::ExcessFields(String::from(text)));
    }
    let (start_row, start_col, dir) = parse_coordinates(game, fields[0])?;
    let rack = if fields.len() >= 3 {
        Some(parse_declared_rack(game, player_index, fields[2])?)
    } else {
        None
    };
    let (challenge_points, challenge_turn_loss) = if fields.len() == 5 {
        let points: i32 = fields[3]
            .parse()
            .map_err(|_| Error::MalformedInteger(String::from(fields[3])))?;
        let loss: i32 = fields[4]
            .parse()
            .map_err(|_| Error::MalformedInteger(String::from(fields[4])))?;
        (points, loss != 0)
    } else {
        (0, false)
    };

    let board = game.board();
    let tileset = game.tileset();
    let dim = board.dim();
    let step = |row: usize, col: usize, by: usize| -> (usize, usize) {
        if dir == BOARD_HORIZONTAL_DIRECTION {
            (row, col + by)
        } else {
            (row + by, col)
        }
    };

    // Resolve the tiles field against the board.
    let mut strip: Vec<MachineLetter> = Vec::new();
    let mut tiles_played = 0u8;
    let mut index = 0usize;
    for c in fields[1].chars() {
        let (row, col) = step(start_row, start_col, index);
        if row >= dim || col >= dim {
            return Err(Error::TilesOutOfBounds {
                row: row as i32,
                col: col as i32,
            });
        }
        if c == '$' {
            if board.is_empty(row, col) {
                return Err(Error::BoardPositionMismatch { row, col });
            }
            strip.push(PLAYED_THROUGH_MARKER);
        } else {
            let ml = tileset.encode_token(&c.to_string())?;
            if board.is_brick(row, col) {
                return Err(Error::PlacementOverBrick { row, col });
            }
            if !board.is_empty(row, col) {
                // Spelled-through letters must match the board.
                if get_unblanked(board.letter_at(row, col)) != get_unblanked(ml) {
                    return Err(Error::BoardPositionMismatch { row, col });
                }
                strip.push(PLAYED_THROUGH_MARKER);
            } else {
                strip.push(ml);
                tiles_played += 1;
            }
        }
        index += 1;
    }
    if tiles_played == 0 {
        return Err(Error::DisconnectedPlacement);
    }

    // Swallow flanking runs so the strip spans the whole main word.
    let (mut row0, mut col0) = (start_row, start_col);
    loop {
        let (prev_row, prev_col) = if dir == BOARD_HORIZONTAL_DIRECTION {
            if col0 == 0 {
                break;
            }
            (row0, col0 - 1)
        } else {
            if row0 == 0 {
                break;
            }
            (row0 - 1, col0)
        };
        if board.is_empty_or_bricked(prev_row, prev_col) {
            break;
        }
        strip.insert(0, PLAYED_THROUGH_MARKER);
        row0 = prev_row;
        col0 = prev_col;
    }
    loop {
        let (next_row, next_col) = step(row0, col0, strip.len());
        if next_row >= dim || next_col >= dim || board.is_empty_or_bricked(next_row, next_col) {
            break;
        }
        strip.push(PLAYED_THROUGH_MARKER);
    }

    // Tiles must come from the rack.
    let held = rack
        .clone()
        .unwrap_or_else(|| game.player(player_index).rack.clone());
    if held.total() > 0 {
        let mut needed = Rack::new(tileset.size());
        for &ml in strip.iter().filter(|&&ml| ml != PLAYED_THROUGH_MARKER) {
            if crate::tiles::get_is_blanked(ml) {
                needed.add_letter(crate::tiles::BLANK_MACHINE_LETTER);
            } else {
                needed.add_letter(ml);
            }
        }
        if !held.contains(&needed) {
            return Err(Error::TilesNotInRack);
        }
    }

    // Connectivity: cover the start square on an empty board, or touch
    // an existing tile.
    let covers_start = (0..strip.len()).any(|i| step(row0, col0, i) == board.start());
    let touches = strip.iter().enumerate().any(|(i, _)| {
        let (row, col) = step(row0, col0, i);
        if !board.is_empty(row, col) {
            return true;
        }
        let (r, c) = (row as i32, col as i32);
        [(0i32, -1i32), (0, 1), (-1, 0), (1, 0)]
            .iter()
            .any(|&(dr, dc)| {
                board.is_in_bounds(r + dr, c + dc)
                    && !board.is_empty((r + dr) as usize, (c + dc) as usize)
            })
    });
    if !(touches || (board.tiles_played() == 0 && covers_start)) {
        return Err(Error::DisconnectedPlacement);
    }

    // Score with the same routine the generator uses.
    let lane = if dir == BOARD_HORIZONTAL_DIRECTION {
        row0
    } else {
        col0
    };
    let leftstrip = if dir == BOARD_HORIZONTAL_DIRECTION {
        col0
    } else {
        row0
    };
    let cross_index = game.cross_index(player_index);
    let score = Gen::score_strip(
        board,
        tileset,
        &strip,
        dir,
        cross_index,
        lane,
        leftstrip,
        usize::from(tiles_played),
        game.bingo_bonus(),
    );

    // Collect the formed words and judge them.
    let lexicon = game.player(player_index).lexicon;
    let judge = |letters: &[MachineLetter]| -> bool {
        match game.variant() {
            Variant::Classic => lexicon.accepts_word(letters),
            Variant::WordSmog => {
                let mut counts = vec![0u8; tileset.size() + 1];
                for &ml in letters {
                    counts[ml as usize] += 1;
                }
                lexicon.accepts_anagram(&mut counts, letters.len())
            }
        }
    };
    let mut words = Vec::new();
    if strip.len() > 1 {
        let mut main_word = Vec::with_capacity(strip.len());
        for (i, &tile) in strip.iter().enumerate() {
            let (row, col) = step(row0, col0, i);
            let letter = if tile == PLAYED_THROUGH_MARKER {
                board.letter_at(row, col)
            } else {
                tile
            };
            main_word.push(get_unblanked(letter));
        }
        words.push(FormedWord {
            valid: judge(&main_word),
            word: tileset.decode(&main_word),
        });
    }
    for (i, &tile) in strip.iter().enumerate() {
        if tile == PLAYED_THROUGH_MARKER {
            continue;
        }
        let (row, col) = step(row0, col0, i);
        let cross = collect_cross_word(game, row, col, dir, get_unblanked(tile));
        if let Some(cross_word) = cross {
            words.push(FormedWord {
                valid: judge(&cross_word),
                word: tileset.decode(&cross_word),
            });
        }
    }
    if !allow_phonies {
        if let Some(phony) = words.iter().find(|w| !w.valid) {
            return Err(Error::PhonyWordFormed(phony.word.clone()));
        }
    }

    let leave_value = match &rack {
        Some(declared) => {
            let mut leave = declared.clone();
            let mut played = Rack::new(tileset.size());
            for &ml in strip.iter().filter(|&&ml| ml != PLAYED_THROUGH_MARKER) {
                if crate::tiles::get_is_blanked(ml) {
                    played.add_letter(crate::tiles::BLANK_MACHINE_LETTER);
                } else {
                    played.add_letter(ml);
                }
            }
            if leave.contains(&played) {
                leave.subtract(&played);
                game.player(player_index).leaves.value_of_rack(&leave)
            } else {
                Equity::ZERO
            }
        }
        None => Equity::ZERO,
    };

    let mut tile_strip = TileStrip::new();
    for &ml in &strip {
        tile_strip.push(ml);
    }
    let mv = Move {
        kind: MoveKind::Place,
        row: row0 as u8,
        col: col0 as u8,
        dir: dir as u8,
        tiles: tile_strip,
        tiles_played,
        score,
        equity: score + leave_value,
    };
    Ok(ValidatedMove {
        mv,
        rack,
        leave_value,
        words,
        challenge_points,
        challenge_turn_loss,
        unknown_exchange: None,
    })
}

/// The perpendicular word through a newly placed tile, or `None` when
/// the tile has no perpendicular neighbors.
fn collect_cross_word(
    game: &Game,
    row: usize,
    col: usize,
    dir: usize,
    letter: MachineLetter,
) -> Option<Vec<MachineLetter>> {
    let board = game.board();
    let (dr, dc) = if dir == BOARD_HORIZONTAL_DIRECTION {
        (1i32, 0i32)
    } else {
        (0, 1)
    };
    let mut word = Vec::new();
    let (mut r, mut c) = (row as i32 - dr, col as i32 - dc);
    while board.is_in_bounds(r, c) && !board.is_empty_or_bricked(r as usize, c as usize) {
        r -= dr;
        c -= dc;
    }
    r += dr;
    c += dc;
    while board.is_in_bounds(r, c) {
        if (r, c) == (row as i32, col as i32) {
            word.push(letter);
        } else if board.is_empty_or_bricked(r as usize, c as usize) {
            break;
        } else {
            word.push(get_unblanked(board.letter_at(r as usize, c as usize)));
        }
        r += dr;
        c += dc;
    }
    if word.len() > 1 {
        Some(word)
    } else {
        None
    }
}
