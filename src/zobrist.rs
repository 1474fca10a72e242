//! Zobrist hashing for repetition-table keys: one key per piece/color/square,
//! one per en passant file, one per castling-rights byte, and one for side
//! to move, XORed together into a running hash. The tables are filled in
//! lazily on first use by a splitmix64 stream seeded with a fixed constant,
//! rather than generated by a build script, so there is no codegen step and
//! no risk of the binary and the generator drifting apart. See DESIGN.md.

use crate::castling::CastlingRights;
use crate::color::Color;
use crate::piece::{Piece, ALL_PIECES};
use crate::square::Square;
use std::sync::OnceLock;

struct ZobristTables {
    pieces: [[[u64; 2]; 64]; 6],
    en_passant_file: [u64; 8],
    castling_rights: [u64; 16],
    side_to_move: u64,
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn tables() -> &'static ZobristTables {
    static TABLES: OnceLock<ZobristTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut state = 0x5DEE_CE10_4A5B_77F1u64;
        let mut pieces = [[[0u64; 2]; 64]; 6];
        for piece in ALL_PIECES {
            for square_index in 0..64 {
                for color_index in 0..2 {
                    pieces[piece.index()][square_index][color_index] = splitmix64(&mut state);
                }
            }
        }
        let mut en_passant_file = [0u64; 8];
        for key in &mut en_passant_file {
            *key = splitmix64(&mut state);
        }
        let mut castling_rights = [0u64; 16];
        for key in &mut castling_rights {
            *key = splitmix64(&mut state);
        }
        ZobristTables {
            pieces,
            en_passant_file,
            castling_rights,
            side_to_move: splitmix64(&mut state),
        }
    })
}

pub fn piece_key(piece: Piece, color: Color, square: Square) -> u64 {
    tables().pieces[piece.index()][square.index() as usize][color.index()]
}

pub fn en_passant_key(square: Square) -> u64 {
    tables().en_passant_file[square.file() as usize]
}

pub fn castling_key(rights: CastlingRights) -> u64 {
    tables().castling_rights[rights.bits() as usize]
}

pub fn side_to_move_key(color: Color) -> u64 {
    match color {
        Color::White => 0,
        Color::Black => tables().side_to_move,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square;

    #[test]
    fn keys_are_deterministic_and_distinct() {
        let a = piece_key(Piece::Knight, Color::White, square::B1);
        let b = piece_key(Piece::Knight, Color::White, square::B1);
        let c = piece_key(Piece::Knight, Color::White, square::G1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn side_to_move_white_is_identity() {
        assert_eq!(side_to_move_key(Color::White), 0);
        assert_ne!(side_to_move_key(Color::Black), 0);
    }
}
