use thiserror::Error;

/// Failure kinds for `parse_fen`. One stable, enumerated reason code per
/// way a FEN string can be malformed, so callers can match on the kind of
/// failure instead of parsing an error message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("FEN must have exactly six space-separated fields, found {found}")]
    FieldCount { found: usize },
    #[error("invalid piece placement field: {0:?}")]
    BadPlacement(String),
    #[error("side to move must be `w` or `b`, found {0:?}")]
    BadSide(String),
    #[error("castling field must match `K?Q?k?q?` or `-`, found {0:?}")]
    BadCastling(String),
    #[error("en passant field must be `-` or a square on rank 3 or 6, found {0:?}")]
    BadEp(String),
    #[error("en passant square {square} is inconsistent with side to move {side_to_move}")]
    IllegalEp { square: String, side_to_move: String },
    #[error("halfmove/fullmove counters must be non-negative integers, found {0:?}")]
    BadCounter(String),
    #[error("position has {count} kings for {color}, expected exactly one")]
    TooManyKings { color: String, count: u32 },
}

/// Failure kinds for `from_san`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanError {
    #[error("{text:?} does not match any legal move")]
    Unknown { text: String },
    #[error("{text:?} matches more than one legal move")]
    Ambiguous { text: String },
}

/// Failure kinds surfaced while parsing PGN text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PgnError {
    #[error("unterminated tag pair: {0:?}")]
    MalformedHeader(String),
    #[error("comment starting at byte {offset} has no matching `}}`")]
    UnterminatedComment { offset: usize },
    #[error("SAN {text:?} is not a legal move in the position before it")]
    IllegalMove { text: String },
}
