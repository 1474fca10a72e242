//! Precomputed attack tables and the attack oracle.
//!
//! Piece-target bitboards for knights/kings/pawns are built with
//! shift-and-mask arithmetic; sliding pieces use a ray table plus
//! nearest-blocker search. Every table is computed once into an
//! `OnceLock`-guarded array on first use rather than rebuilt per call or
//! threaded through as an argument — any internal caching here is
//! initialize-once and lock-free, so concurrent readers never race on
//! first-touch initialization.

use crate::bitboard::{Bitboard, A_FILE, B_FILE, EMPTY, G_FILE, H_FILE};
use crate::board::Board;
use crate::color::Color;
use crate::piece::Piece;
use crate::square::{Square, ORDERED};
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

pub const ROOK_DIRS: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
];

pub const BISHOP_DIRS: [Direction; 4] = [
    Direction::NorthEast,
    Direction::NorthWest,
    Direction::SouthEast,
    Direction::SouthWest,
];

impl Direction {
    fn step(self, square: Square) -> Option<Square> {
        match self {
            Direction::North => square.offset(0, 1),
            Direction::South => square.offset(0, -1),
            Direction::East => square.offset(1, 0),
            Direction::West => square.offset(-1, 0),
            Direction::NorthEast => square.offset(1, 1),
            Direction::NorthWest => square.offset(-1, 1),
            Direction::SouthEast => square.offset(1, -1),
            Direction::SouthWest => square.offset(-1, -1),
        }
    }

    /// Whether the nearest blocker along this ray is the lowest-index bit
    /// (true for the directions that increase the square index) or the
    /// highest-index bit (false otherwise).
    fn nearest_blocker_is_lsb(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::East | Direction::NorthEast | Direction::NorthWest
        )
    }
}

fn ray_table() -> &'static [[Bitboard; 64]; 8] {
    static TABLE: OnceLock<[[Bitboard; 64]; 8]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let dirs = [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
            Direction::NorthEast,
            Direction::NorthWest,
            Direction::SouthEast,
            Direction::SouthWest,
        ];
        let mut table = [[EMPTY; 64]; 8];
        for (dir_index, &dir) in dirs.iter().enumerate() {
            for square in ORDERED {
                let mut ray = EMPTY;
                let mut current = square;
                while let Some(next) = dir.step(current) {
                    ray.set(next);
                    current = next;
                }
                table[dir_index][square.index() as usize] = ray;
            }
        }
        table
    })
}

fn ray(square: Square, dir: Direction) -> Bitboard {
    let dir_index = match dir {
        Direction::North => 0,
        Direction::South => 1,
        Direction::East => 2,
        Direction::West => 3,
        Direction::NorthEast => 4,
        Direction::NorthWest => 5,
        Direction::SouthEast => 6,
        Direction::SouthWest => 7,
    };
    ray_table()[dir_index][square.index() as usize]
}

fn knight_attack_table() -> &'static [Bitboard; 64] {
    static TABLE: OnceLock<[Bitboard; 64]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [EMPTY; 64];
        for square in ORDERED {
            // nne = north-north-east, nee = north-east-east, etc. Shifting
            // a single-bit `Bitboard` past bit 63 in either direction just
            // yields 0 (plain `u64` shl/shr), so no overflow guard is
            // needed beyond the usual file masks that stop wraparound.
            let knight = Bitboard::from_square(square);
            let mut targets = EMPTY;
            targets |= (knight << 17) & !A_FILE;
            targets |= (knight << 10) & !A_FILE & !B_FILE;
            targets |= (knight >> 6) & !A_FILE & !B_FILE;
            targets |= (knight >> 15) & !A_FILE;
            targets |= (knight << 15) & !H_FILE;
            targets |= (knight << 6) & !G_FILE & !H_FILE;
            targets |= (knight >> 10) & !G_FILE & !H_FILE;
            targets |= (knight >> 17) & !H_FILE;
            table[square.index() as usize] = targets;
        }
        table
    })
}

fn king_attack_table() -> &'static [Bitboard; 64] {
    static TABLE: OnceLock<[Bitboard; 64]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [EMPTY; 64];
        for square in ORDERED {
            let mut targets = EMPTY;
            for file_delta in -1i8..=1 {
                for rank_delta in -1i8..=1 {
                    if file_delta == 0 && rank_delta == 0 {
                        continue;
                    }
                    if let Some(target) = square.offset(file_delta, rank_delta) {
                        targets.set(target);
                    }
                }
            }
            table[square.index() as usize] = targets;
        }
        table
    })
}

fn pawn_attack_table() -> &'static [[Bitboard; 64]; 2] {
    static TABLE: OnceLock<[[Bitboard; 64]; 2]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [[EMPTY; 64]; 2];
        for square in ORDERED {
            for (color_index, rank_delta) in [(0usize, 1i8), (1usize, -1i8)] {
                let mut targets = EMPTY;
                if let Some(target) = square.offset(-1, rank_delta) {
                    targets.set(target);
                }
                if let Some(target) = square.offset(1, rank_delta) {
                    targets.set(target);
                }
                table[color_index][square.index() as usize] = targets;
            }
        }
        table
    })
}

pub fn knight_attacks(square: Square) -> Bitboard {
    knight_attack_table()[square.index() as usize]
}

pub fn king_attacks(square: Square) -> Bitboard {
    king_attack_table()[square.index() as usize]
}

/// Squares a pawn of `color` standing on `square` attacks diagonally.
pub fn pawn_attacks(color: Color, square: Square) -> Bitboard {
    pawn_attack_table()[color.index()][square.index() as usize]
}

/// Sliding attacks from `square` along `dirs`, stopping at (and including)
/// the first occupied square in each direction — a full ray clipped at the
/// nearest blocker.
pub fn sliding_attacks(square: Square, dirs: &[Direction], occupied: Bitboard) -> Bitboard {
    let mut attacks = EMPTY;
    for &dir in dirs {
        let full_ray = ray(square, dir);
        let blockers = full_ray & occupied;
        if blockers.is_empty() {
            attacks |= full_ray;
            continue;
        }
        let nearest = if dir.nearest_blocker_is_lsb() {
            blockers.lsb().unwrap()
        } else {
            highest_square(blockers)
        };
        let beyond = ray(nearest, dir);
        attacks |= full_ray ^ beyond;
    }
    attacks
}

fn highest_square(board: Bitboard) -> Square {
    Square::new(63 - board.0.leading_zeros() as u8)
}

/// Is `target` attacked by any piece of `attacker_color` on `board`?
/// Uses the "super-piece" technique: ask what a piece of each kind
/// standing on `target` could see, then check whether an attacker of
/// that kind actually sits there. Equivalent to scanning every attacker's
/// own moves and checking whether any lands on `target`, but avoids
/// visiting empty squares.
pub fn is_attacked(board: &Board, attacker_color: Color, target: Square) -> bool {
    let attackers = board.pieces(attacker_color);

    if !(knight_attacks(target) & attackers.locate(Piece::Knight)).is_empty() {
        return true;
    }
    if !(king_attacks(target) & attackers.locate(Piece::King)).is_empty() {
        return true;
    }
    let pawn_source_squares = pawn_attacks(attacker_color.opposite(), target);
    if !(pawn_source_squares & attackers.locate(Piece::Pawn)).is_empty() {
        return true;
    }

    let occupied = board.occupied();
    let rook_like = attackers.locate(Piece::Rook) | attackers.locate(Piece::Queen);
    if !(sliding_attacks(target, &ROOK_DIRS, occupied) & rook_like).is_empty() {
        return true;
    }
    let bishop_like = attackers.locate(Piece::Bishop) | attackers.locate(Piece::Queen);
    if !(sliding_attacks(target, &BISHOP_DIRS, occupied) & bishop_like).is_empty() {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::square;

    #[test]
    fn knight_attacks_from_corner() {
        let targets = knight_attacks(square::A1);
        assert_eq!(targets, Bitboard::from_square(square::B3) | Bitboard::from_square(square::C2));
    }

    #[test]
    fn king_attacks_from_corner() {
        let targets = king_attacks(square::A1);
        assert_eq!(targets.popcount(), 3);
        assert!(targets.contains(square::A2));
        assert!(targets.contains(square::B1));
        assert!(targets.contains(square::B2));
    }

    #[test]
    fn pawn_attacks_are_color_sensitive() {
        let white = pawn_attacks(Color::White, square::E4);
        assert!(white.contains(square::D5) && white.contains(square::F5));
        let black = pawn_attacks(Color::Black, square::E4);
        assert!(black.contains(square::D3) && black.contains(square::F3));
    }

    #[test]
    fn sliding_attacks_stop_at_blocker() {
        let occupied = Bitboard::from_square(square::E5);
        let attacks = sliding_attacks(square::E1, &ROOK_DIRS, occupied);
        assert!(attacks.contains(square::E4));
        assert!(attacks.contains(square::E5));
        assert!(!attacks.contains(square::E6));
    }
}
