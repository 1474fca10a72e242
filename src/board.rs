use crate::bitboard::Bitboard;
use crate::color::Color;
use crate::piece::Piece;
use crate::piece_set::PieceSet;
use crate::square::Square;

/// A total function from the 64 squares to `Piece | empty`. Holds only
/// piece placement — side to move, castling rights, en passant target, and
/// the clocks live one level up in `Position`, which keeps this type usable
/// anywhere "just the pieces" is the right granularity (perft leaf diffing,
/// display, piece counting) without dragging the rest of the game state
/// along.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board {
    white: PieceSet,
    black: PieceSet,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pieces(&self, color: Color) -> &PieceSet {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn occupied(&self) -> Bitboard {
        self.white.occupied() | self.black.occupied()
    }

    pub fn is_occupied(&self, square: Square) -> bool {
        self.white.is_occupied(square) || self.black.is_occupied(square)
    }

    pub fn get(&self, square: Square) -> Option<(Piece, Color)> {
        if let Some(piece) = self.white.get(square) {
            return Some((piece, Color::White));
        }
        self.black.get(square).map(|piece| (piece, Color::Black))
    }

    /// Places a piece, panicking if the square is already occupied — a
    /// precondition violation, never a legal-looking input.
    #[must_use]
    pub fn with_piece_placed(mut self, square: Square, piece: Piece, color: Color) -> Self {
        assert!(
            !self.is_occupied(square),
            "square {square} is already occupied"
        );
        match color {
            Color::White => self.white = self.white.with_piece_placed(square, piece),
            Color::Black => self.black = self.black.with_piece_placed(square, piece),
        }
        self
    }

    #[must_use]
    pub fn with_piece_removed(mut self, square: Square) -> (Self, Option<(Piece, Color)>) {
        let (white, white_removed) = self.white.with_piece_removed(square);
        self.white = white;
        if let Some(piece) = white_removed {
            return (self, Some((piece, Color::White)));
        }
        let (black, black_removed) = self.black.with_piece_removed(square);
        self.black = black;
        (self, black_removed.map(|piece| (piece, Color::Black)))
    }

    /// Moves whatever is on `from` to `to`, clearing `from`. Returns the
    /// piece that previously occupied `to`, if any (a capture).
    #[must_use]
    pub fn with_move(self, from: Square, to: Square) -> (Self, Option<(Piece, Color)>) {
        let (board, moved) = self.with_piece_removed(from);
        let (piece, color) =
            moved.unwrap_or_else(|| panic!("move from empty square {from}"));
        let (board, captured) = board.with_piece_removed(to);
        (board.with_piece_placed(to, piece, color), captured)
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color).locate(Piece::King).lsb()
    }
}
