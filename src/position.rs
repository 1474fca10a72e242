use crate::board::Board;
use crate::castling::CastlingRights;
use crate::color::Color;
use crate::piece::{Piece, ALL_PIECES};
use crate::square::Square;
use crate::zobrist;

/// The immutable game-state aggregate: board, side to move, castling
/// rights, en passant target, half-move clock, full-move number. Every
/// field is `Copy`, so `#[derive(PartialEq, Eq)]` gives structural equality
/// over all six fields for free — there is no seventh field (a cached hash,
/// a king-square cache) riding along that equality would need to
/// special-case.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    board: Board,
    side_to_move: Color,
    castling: CastlingRights,
    ep_target: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Position {
    pub fn new(
        board: Board,
        side_to_move: Color,
        castling: CastlingRights,
        ep_target: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Self {
        Position {
            board,
            side_to_move,
            castling,
            ep_target,
            halfmove_clock,
            fullmove_number,
        }
    }

    pub fn starting_position() -> Self {
        crate::fen::parse_fen(crate::fen::STARTING_POSITION_FEN)
            .expect("starting position FEN is well-formed")
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn ep_target(&self) -> Option<Square> {
        self.ep_target
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.board.king_square(color)
    }

    /// The fields that must match for two positions to count as the same
    /// occurrence under threefold repetition: board, side to move, castling
    /// rights, and en passant square — explicitly *not* the clocks. Used as
    /// the hash-map key for repetition counting.
    pub fn repetition_key(&self) -> (Board, Color, CastlingRights, Option<Square>) {
        (self.board, self.side_to_move, self.castling, self.ep_target)
    }

    /// Incremental-hash-free Zobrist hash, recomputed from the four
    /// repetition-relevant fields. See `zobrist` module docs for why this
    /// is computed on demand rather than cached on the struct.
    pub fn zobrist_hash(&self) -> u64 {
        let mut hash = 0u64;
        for square in crate::square::ORDERED {
            if let Some((piece, color)) = self.board.get(square) {
                hash ^= zobrist::piece_key(piece, color, square);
            }
        }
        if let Some(square) = self.ep_target {
            hash ^= zobrist::en_passant_key(square);
        }
        hash ^= zobrist::castling_key(self.castling);
        hash ^= zobrist::side_to_move_key(self.side_to_move);
        hash
    }

    /// Exactly one king per color is a standing invariant; checked eagerly
    /// so FEN parsing can reject malformed positions with a precise error
    /// instead of letting a two-king board silently propagate.
    pub(crate) fn king_counts(&self) -> (u32, u32) {
        let white = self.board.pieces(Color::White).locate(Piece::King).popcount();
        let black = self.board.pieces(Color::Black).locate(Piece::King).popcount();
        (white, black)
    }

    pub(crate) fn with_fields(
        self,
        board: Board,
        side_to_move: Color,
        castling: CastlingRights,
        ep_target: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Self {
        Position::new(board, side_to_move, castling, ep_target, halfmove_clock, fullmove_number)
    }

    /// Total material still on the board, used by `insufficient_material`.
    pub(crate) fn piece_counts(&self, color: Color) -> [u32; 6] {
        let mut counts = [0u32; 6];
        for piece in ALL_PIECES {
            counts[piece.index()] = self.board.pieces(color).locate(piece).popcount();
        }
        counts
    }
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Position({})", crate::fen::to_fen(self))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", crate::fen::to_fen(self))
    }
}
