use crate::color::Color;
use crate::piece::Piece;
use crate::square::Square;
use std::fmt;

/// The handful of move "shapes" that change how `apply` updates board state
/// beyond "move a piece from here to there." These partition into mutually
/// exclusive cases in practice — a double pawn push is never a castle; en
/// passant is always exactly one capture — so `SpecialMove` is an enum
/// rather than a set of independent flags that could admit combinations
/// that can never legally occur. Capture and promotion are tracked
/// separately since either can combine with any of these (a promotion can
/// be a capture; a double pawn push cannot).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecialMove {
    None,
    DoublePawnPush,
    EnPassant,
    CastleShort,
    CastleLong,
}

/// A single ply: origin, destination, the piece making the move, what (if
/// anything) it captures, what it promotes to, and which special rule, if
/// any, governs its application. One flat struct rather than a tagged union
/// of per-shape types, since every consumer (SAN encoding, `apply`, perft)
/// wants the same handful of fields regardless of move shape.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub color: Color,
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
    pub special: SpecialMove,
}

impl Move {
    pub fn quiet(from: Square, to: Square, piece: Piece, color: Color) -> Self {
        Move {
            from,
            to,
            piece,
            color,
            captured: None,
            promotion: None,
            special: SpecialMove::None,
        }
    }

    #[must_use]
    pub fn with_capture(mut self, captured: Piece) -> Self {
        self.captured = Some(captured);
        self
    }

    #[must_use]
    pub fn with_promotion(mut self, promotion: Piece) -> Self {
        self.promotion = Some(promotion);
        self
    }

    #[must_use]
    pub fn with_special(mut self, special: SpecialMove) -> Self {
        self.special = special;
        self
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    pub fn is_castle(&self) -> bool {
        matches!(self.special, SpecialMove::CastleShort | SpecialMove::CastleLong)
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "={}", promotion.san_letter())?;
        }
        Ok(())
    }
}
