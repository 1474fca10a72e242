use crate::color::Color;
use std::fmt;

pub const WHITE_KINGSIDE: u8 = 0b0001;
pub const WHITE_QUEENSIDE: u8 = 0b0010;
pub const BLACK_KINGSIDE: u8 = 0b0100;
pub const BLACK_QUEENSIDE: u8 = 0b1000;
pub const ALL_CASTLE_RIGHTS: u8 = WHITE_KINGSIDE | WHITE_QUEENSIDE | BLACK_KINGSIDE | BLACK_QUEENSIDE;
pub const NO_CASTLE_RIGHTS: u8 = 0;

/// Castling rights for both sides, packed as a 4-bit mask rather than four
/// separate booleans or a struct per color. Rights only ever get cleared —
/// there is no operation that sets a bit back on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const fn none() -> Self {
        CastlingRights(NO_CASTLE_RIGHTS)
    }

    pub const fn all() -> Self {
        CastlingRights(ALL_CASTLE_RIGHTS)
    }

    pub const fn from_bits(bits: u8) -> Self {
        CastlingRights(bits & ALL_CASTLE_RIGHTS)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn kingside(self, color: Color) -> bool {
        let bit = match color {
            Color::White => WHITE_KINGSIDE,
            Color::Black => BLACK_KINGSIDE,
        };
        self.0 & bit != 0
    }

    pub fn queenside(self, color: Color) -> bool {
        let bit = match color {
            Color::White => WHITE_QUEENSIDE,
            Color::Black => BLACK_QUEENSIDE,
        };
        self.0 & bit != 0
    }

    #[must_use]
    pub fn clear(self, bits: u8) -> Self {
        CastlingRights(self.0 & !bits)
    }

    #[must_use]
    pub fn clear_color(self, color: Color) -> Self {
        let both = match color {
            Color::White => WHITE_KINGSIDE | WHITE_QUEENSIDE,
            Color::Black => BLACK_KINGSIDE | BLACK_QUEENSIDE,
        };
        self.clear(both)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Kingside/queenside bits that belong to a rook's home-corner square,
    /// used both to drop rights when a rook leaves home and when an
    /// opponent's rook is captured there.
    pub fn bit_for_rook_square(square: crate::square::Square) -> Option<u8> {
        use crate::square;
        match square {
            s if s == square::A1 => Some(WHITE_QUEENSIDE),
            s if s == square::H1 => Some(WHITE_KINGSIDE),
            s if s == square::A8 => Some(BLACK_QUEENSIDE),
            s if s == square::H8 => Some(BLACK_KINGSIDE),
            _ => None,
        }
    }

    pub fn bit_for_king(color: Color) -> u8 {
        match color {
            Color::White => WHITE_KINGSIDE | WHITE_QUEENSIDE,
            Color::Black => BLACK_KINGSIDE | BLACK_QUEENSIDE,
        }
    }

    /// Canonical FEN ordering: `K`, `Q`, `k`, `q`.
    pub fn to_fen(self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        let mut out = String::with_capacity(4);
        if self.0 & WHITE_KINGSIDE != 0 {
            out.push('K');
        }
        if self.0 & WHITE_QUEENSIDE != 0 {
            out.push('Q');
        }
        if self.0 & BLACK_KINGSIDE != 0 {
            out.push('k');
        }
        if self.0 & BLACK_QUEENSIDE != 0 {
            out.push('q');
        }
        out
    }
}

impl fmt::Debug for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastlingRights({})", self.to_fen())
    }
}
