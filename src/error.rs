use thiserror::Error;

#[derive(Error, Debug)]
/// Errors that can be returned
pub enum Error {
    /// Error when encoding a word or rack to machine letters
    #[error("Encoder: invalid token '{0}'")]
    EncodeInvalidToken(String),
    #[error("Invalid machine letter {0}")]
    InvalidMachineLetter(u8),

    /// Error parsing board rows from strings
    #[error("Invalid number of rows {0} (expect {1})")]
    InvalidRowCount(usize, usize),
    #[error("Invalid row length {0} (expect {1})")]
    InvalidRowLength(usize, usize),

    /// Error parsing a bonus square in a layout
    #[error("Invalid layout square: \"{0}\"")]
    LayoutParseError(String),

    /// Move text parsing
    #[error("Empty move")]
    EmptyMove,
    #[error("Move \"{0}\" is missing fields")]
    MissingFields(String),
    #[error("Move \"{0}\" has excess fields")]
    ExcessFields(String),
    #[error("Malformed integer \"{0}\"")]
    MalformedInteger(String),
    #[error("Invalid coordinates \"{0}\"")]
    MalformedCoordinates(String),
    #[error("Unknown exchanges are not allowed")]
    UnknownExchangeNotAllowed,

    /// Semantic validation
    #[error("Rack is not in the bag")]
    RackNotInBag,
    #[error("Tiles played are not in the rack")]
    TilesNotInRack,
    #[error("Tiles played out of bounds at row {row}, col {col}")]
    TilesOutOfBounds { row: i32, col: i32 },
    #[error("Tile played over a bricked square at row {row}, col {col}")]
    PlacementOverBrick { row: usize, col: usize },
    #[error("Playthrough marker does not match board at row {row}, col {col}")]
    BoardPositionMismatch { row: usize, col: usize },
    #[error("Placement is not connected to an anchor")]
    DisconnectedPlacement,
    #[error("Exchange with fewer than {0} tiles in the bag")]
    ExchangeInsufficientTiles(usize),
    #[error("Phony word formed: \"{0}\"")]
    PhonyWordFormed(String),

    /// Configuration
    #[error("Invalid player index {0}")]
    InvalidPlayerIndex(usize),
    #[error("Invalid simulation parameter: {0}")]
    InvalidSimParameter(String),

    /// State
    #[error("The bag must be empty to solve an endgame")]
    BagNotEmpty,
    #[error("Not enough candidate moves to simulate")]
    NoCandidateMoves,
}
