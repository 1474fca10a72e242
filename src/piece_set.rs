use crate::bitboard::{Bitboard, EMPTY};
use crate::piece::{Piece, ALL_PIECES};
use crate::square::Square;

/// All pieces of one color, one bitboard per piece kind plus a cached union.
/// Every position is an immutable value, so "mutation" here means "clone
/// with one bitboard toggled," which stays cheap since the whole struct is
/// `Copy`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PieceSet {
    bitboards: [Bitboard; 6],
    occupied: Bitboard,
}

impl PieceSet {
    pub fn new() -> Self {
        PieceSet {
            bitboards: [EMPTY; 6],
            occupied: EMPTY,
        }
    }

    pub fn locate(&self, piece: Piece) -> Bitboard {
        self.bitboards[piece.index()]
    }

    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    pub fn is_occupied(&self, square: Square) -> bool {
        self.occupied.contains(square)
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        ALL_PIECES
            .iter()
            .find(|&&piece| self.bitboards[piece.index()].contains(square))
            .copied()
    }

    #[must_use]
    pub fn with_piece_placed(mut self, square: Square, piece: Piece) -> Self {
        self.bitboards[piece.index()].set(square);
        self.occupied.set(square);
        self
    }

    /// Removes whatever piece sits on `square`, if any, returning the new
    /// set and the piece that was there.
    #[must_use]
    pub fn with_piece_removed(mut self, square: Square) -> (Self, Option<Piece>) {
        let removed = self.get(square);
        if let Some(piece) = removed {
            self.bitboards[piece.index()].clear(square);
            self.occupied.clear(square);
        }
        (self, removed)
    }
}
