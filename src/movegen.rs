//! Pseudo-legal move generation, the legality filter, and move application.
//! `apply` folds a pseudo-legal move over an immutable `Position` and
//! produces a new one rather than mutating in place, so there is no undo
//! stack: the only way back to an earlier position is to have kept it.

use crate::attacks::{self, BISHOP_DIRS, ROOK_DIRS};
use crate::bitboard::{Bitboard, RANK_1, RANK_2, RANK_7, RANK_8};
use crate::board::Board;
use crate::castling;
use crate::chess_move::{Move, SpecialMove};
use crate::color::Color;
use crate::piece::{Piece, PROMOTION_PIECES};
use crate::position::Position;
use crate::square::Square;
use smallvec::{smallvec, SmallVec};

pub type MoveList = SmallVec<[Move; 64]>;

/// Is `target` attacked by any `attacker_color` piece in `position`?
/// Exposed directly, alongside `in_check`, since legality filtering below
/// needs the more general per-square query.
pub fn is_attacked(position: &Position, attacker_color: Color, target: Square) -> bool {
    attacks::is_attacked(position.board(), attacker_color, target)
}

pub fn in_check(position: &Position) -> bool {
    let color = position.side_to_move();
    match position.king_square(color) {
        Some(king_square) => is_attacked(position, color.opposite(), king_square),
        None => false,
    }
}

/// All pseudo-legal moves for the side to move, or just those originating
/// from `from` when given — a single-square mode used by SAN disambiguation
/// and by callers that want "moves for the piece on this square."
pub fn pseudo_moves(position: &Position, from: Option<Square>) -> MoveList {
    let color = position.side_to_move();
    let board = position.board();
    let mut moves = MoveList::new();

    let origins: SmallVec<[Square; 16]> = match from {
        Some(square) => smallvec![square],
        None => board.pieces(color).occupied().squares().collect(),
    };

    for origin in origins {
        let Some((piece, piece_color)) = board.get(origin) else {
            continue;
        };
        if piece_color != color {
            continue;
        }
        match piece {
            Piece::Pawn => generate_pawn_moves(position, origin, color, &mut moves),
            Piece::Knight => generate_leaper_moves(board, origin, piece, color, attacks::knight_attacks(origin), &mut moves),
            Piece::King => generate_leaper_moves(board, origin, piece, color, attacks::king_attacks(origin), &mut moves),
            Piece::Bishop => generate_slider_moves(board, origin, piece, color, &BISHOP_DIRS, &mut moves),
            Piece::Rook => generate_slider_moves(board, origin, piece, color, &ROOK_DIRS, &mut moves),
            Piece::Queen => {
                generate_slider_moves(board, origin, piece, color, &ROOK_DIRS, &mut moves);
                generate_slider_moves(board, origin, piece, color, &BISHOP_DIRS, &mut moves);
            }
        }
    }

    if from.is_none() || from.and_then(|sq| board.get(sq)).map(|(p, _)| p) == Some(Piece::King) {
        generate_castles(position, color, &mut moves);
    }

    moves
}

fn generate_leaper_moves(
    board: &Board,
    origin: Square,
    piece: Piece,
    color: Color,
    targets: Bitboard,
    moves: &mut MoveList,
) {
    let own_occupied = board.pieces(color).occupied();
    for target in (targets & !own_occupied).squares() {
        let mut mv = Move::quiet(origin, target, piece, color);
        if let Some((captured, _)) = board.get(target) {
            mv = mv.with_capture(captured);
        }
        moves.push(mv);
    }
}

fn generate_slider_moves(
    board: &Board,
    origin: Square,
    piece: Piece,
    color: Color,
    dirs: &[attacks::Direction],
    moves: &mut MoveList,
) {
    let own_occupied = board.pieces(color).occupied();
    let targets = attacks::sliding_attacks(origin, dirs, board.occupied()) & !own_occupied;
    for target in targets.squares() {
        let mut mv = Move::quiet(origin, target, piece, color);
        if let Some((captured, _)) = board.get(target) {
            mv = mv.with_capture(captured);
        }
        moves.push(mv);
    }
}

fn promotion_rank(color: Color) -> Bitboard {
    match color {
        Color::White => RANK_8,
        Color::Black => RANK_1,
    }
}

fn generate_pawn_moves(position: &Position, origin: Square, color: Color, moves: &mut MoveList) {
    let board = position.board();
    let occupied = board.occupied();
    let start_rank = match color {
        Color::White => RANK_2,
        Color::Black => RANK_7,
    };
    let forward: i8 = match color {
        Color::White => 1,
        Color::Black => -1,
    };

    let push_square = |sq: Square, steps: i8| sq.offset(0, steps * forward);

    if let Some(one_step) = push_square(origin, 1) {
        if !occupied.contains(one_step) {
            push_pawn_move(origin, one_step, color, SpecialMove::None, moves);

            if Bitboard::from_square(origin) & start_rank != crate::bitboard::EMPTY {
                if let Some(two_step) = push_square(origin, 2) {
                    if !occupied.contains(two_step) {
                        push_pawn_move(origin, two_step, color, SpecialMove::DoublePawnPush, moves);
                    }
                }
            }
        }
    }

    for target in attacks::pawn_attacks(color, origin).squares() {
        match board.get(target) {
            Some((captured, piece_color)) if piece_color != color => {
                push_pawn_capture(origin, target, color, captured, moves);
            }
            None if Some(target) == position.ep_target() => {
                push_en_passant(origin, target, color, moves);
            }
            _ => {}
        }
    }
}

fn push_pawn_move(origin: Square, target: Square, color: Color, special: SpecialMove, moves: &mut MoveList) {
    if Bitboard::from_square(target) & promotion_rank(color) != crate::bitboard::EMPTY {
        for promotion in PROMOTION_PIECES {
            moves.push(
                Move::quiet(origin, target, Piece::Pawn, color)
                    .with_promotion(promotion)
                    .with_special(special),
            );
        }
    } else {
        moves.push(Move::quiet(origin, target, Piece::Pawn, color).with_special(special));
    }
}

fn push_pawn_capture(origin: Square, target: Square, color: Color, captured: Piece, moves: &mut MoveList) {
    if Bitboard::from_square(target) & promotion_rank(color) != crate::bitboard::EMPTY {
        for promotion in PROMOTION_PIECES {
            moves.push(
                Move::quiet(origin, target, Piece::Pawn, color)
                    .with_capture(captured)
                    .with_promotion(promotion),
            );
        }
    } else {
        moves.push(Move::quiet(origin, target, Piece::Pawn, color).with_capture(captured));
    }
}

fn push_en_passant(origin: Square, target: Square, color: Color, moves: &mut MoveList) {
    moves.push(
        Move::quiet(origin, target, Piece::Pawn, color)
            .with_capture(Piece::Pawn)
            .with_special(SpecialMove::EnPassant),
    );
}

fn generate_castles(position: &Position, color: Color, moves: &mut MoveList) {
    let board = position.board();
    let rights = position.castling();
    let (king_home, kingside_path, kingside_king_to, queenside_path, queenside_king_to, queenside_rook_clear) =
        match color {
            Color::White => (
                crate::square::E1,
                [crate::square::F1, crate::square::G1],
                crate::square::G1,
                [crate::square::D1, crate::square::C1],
                crate::square::C1,
                crate::square::B1,
            ),
            Color::Black => (
                crate::square::E8,
                [crate::square::F8, crate::square::G8],
                crate::square::G8,
                [crate::square::D8, crate::square::C8],
                crate::square::C8,
                crate::square::B8,
            ),
        };

    if board.get(king_home) != Some((Piece::King, color)) {
        return;
    }
    if is_attacked(position, color.opposite(), king_home) {
        return; // a king in check cannot castle out of it
    }

    if rights.kingside(color)
        && kingside_path.iter().all(|&sq| !board.is_occupied(sq))
        && kingside_path
            .iter()
            .all(|&sq| !is_attacked(position, color.opposite(), sq))
    {
        moves.push(
            Move::quiet(king_home, kingside_king_to, Piece::King, color)
                .with_special(SpecialMove::CastleShort),
        );
    }

    if rights.queenside(color)
        && queenside_path.iter().all(|&sq| !board.is_occupied(sq))
        && !board.is_occupied(queenside_rook_clear)
        && queenside_path
            .iter()
            .all(|&sq| !is_attacked(position, color.opposite(), sq))
    {
        moves.push(
            Move::quiet(king_home, queenside_king_to, Piece::King, color)
                .with_special(SpecialMove::CastleLong),
        );
    }
}

/// Pseudo-legal moves filtered to those that do not leave the mover's own
/// king in check.
pub fn legal_moves(position: &Position, from: Option<Square>) -> MoveList {
    let color = position.side_to_move();
    pseudo_moves(position, from)
        .into_iter()
        .filter(|mv| {
            let next = apply(position, mv);
            !is_attacked(&next, color.opposite(), next.king_square(color).unwrap_or(mv.to))
        })
        .collect()
}

pub fn in_checkmate(position: &Position) -> bool {
    in_check(position) && legal_moves(position, None).is_empty()
}

pub fn in_stalemate(position: &Position) -> bool {
    !in_check(position) && legal_moves(position, None).is_empty()
}

/// Neither side has enough material to deliver checkmate by any sequence
/// of legal moves: king vs king, king+minor vs king, or king+bishop vs
/// king+bishop with same-colored bishops. Any pawn, rook, or queen on the
/// board — or two minors on one side beyond a single knight/bishop — rules
/// this out.
pub fn insufficient_material(position: &Position) -> bool {
    let white = minor_profile(position, Color::White);
    let black = minor_profile(position, Color::Black);
    match (white, black) {
        (Some(MinorProfile::None), Some(MinorProfile::None)) => true,
        (Some(MinorProfile::None), Some(MinorProfile::OneKnight))
        | (Some(MinorProfile::OneKnight), Some(MinorProfile::None)) => true,
        (Some(MinorProfile::None), Some(MinorProfile::Bishops(_)))
        | (Some(MinorProfile::Bishops(_)), Some(MinorProfile::None)) => true,
        (Some(MinorProfile::Bishops(a)), Some(MinorProfile::Bishops(b))) => a == b,
        _ => false,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum MinorProfile {
    None,
    OneKnight,
    /// `true` if all of this side's remaining bishops sit on light squares.
    Bishops(bool),
}

fn minor_profile(position: &Position, color: Color) -> Option<MinorProfile> {
    let counts = position.piece_counts(color);
    if counts[Piece::Pawn.index()] > 0
        || counts[Piece::Rook.index()] > 0
        || counts[Piece::Queen.index()] > 0
    {
        return None;
    }
    let knights = counts[Piece::Knight.index()];
    let bishops = counts[Piece::Bishop.index()];
    match (knights, bishops) {
        (0, 0) => Some(MinorProfile::None),
        (1, 0) => Some(MinorProfile::OneKnight),
        (0, _) => {
            let bishop_squares = position.board().pieces(color).locate(Piece::Bishop);
            let all_light = bishop_squares
                .squares()
                .all(|sq| is_light_square(sq));
            let all_dark = bishop_squares.squares().all(|sq| !is_light_square(sq));
            if all_light || all_dark {
                Some(MinorProfile::Bishops(all_light))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn is_light_square(square: Square) -> bool {
    (square.file() + square.rank()) % 2 == 1
}

/// Applies a pseudo-legal move, producing a new position. The caller must
/// pass a move previously produced by `pseudo_moves`/`legal_moves` for this
/// exact position — passing an arbitrary move is a precondition violation:
/// this function may panic on an invariant violation (e.g. moving from an
/// empty square) but must never corrupt state silently.
pub fn apply(position: &Position, mv: &Move) -> Position {
    let color = mv.color;
    let mut board = *position.board();
    let mut castling = position.castling();
    let mut ep_target = None;

    match mv.special {
        SpecialMove::CastleShort | SpecialMove::CastleLong => {
            let (rook_from, rook_to) = castle_rook_squares(color, mv.special);
            let (b, _) = board.with_move(mv.from, mv.to);
            board = b;
            let (b, _) = board.with_move(rook_from, rook_to);
            board = b;
            castling = castling.clear_color(color);
        }
        SpecialMove::EnPassant => {
            let captured_square = mv
                .to
                .offset(0, match color {
                    Color::White => -1,
                    Color::Black => 1,
                })
                .expect("en passant capture square is always on-board");
            let (b, _) = board.with_piece_removed(captured_square);
            board = b;
            let (b, _) = board.with_move(mv.from, mv.to);
            board = b;
        }
        SpecialMove::DoublePawnPush => {
            let (b, _) = board.with_move(mv.from, mv.to);
            board = b;
            ep_target = mv.from.offset(0, match color {
                Color::White => 1,
                Color::Black => -1,
            });
        }
        SpecialMove::None => {
            let (b, captured) = board.with_move(mv.from, mv.to);
            board = b;
            // King moves clear their own rights first, then a rook leaving
            // home clears its side, then a captured rook sitting on its
            // home corner clears the opponent's side — each step sees the
            // rights the previous step produced.
            if mv.piece == Piece::King {
                let before = castling;
                castling = castling.clear(castling::CastlingRights::bit_for_king(color));
                if castling != before {
                    log::trace!("{color} king move at {} clears castling rights", mv.from);
                }
            } else if mv.piece == Piece::Rook {
                if let Some(bit) = castling::CastlingRights::bit_for_rook_square(mv.from) {
                    let before = castling;
                    castling = castling.clear(bit);
                    if castling != before {
                        log::trace!("rook leaving {} clears a castling right", mv.from);
                    }
                }
            }
            if let Some((captured_piece, _captured_color)) = captured {
                if captured_piece == Piece::Rook {
                    if let Some(bit) = castling::CastlingRights::bit_for_rook_square(mv.to) {
                        let before = castling;
                        castling = castling.clear(bit);
                        if castling != before {
                            log::trace!("capturing the rook on {} clears a castling right", mv.to);
                        }
                    }
                }
            }
        }
    }

    if let Some(promotion) = mv.promotion {
        let (b, _) = board.with_piece_removed(mv.to);
        board = b.with_piece_placed(mv.to, promotion, color);
    }

    let halfmove_clock = if mv.is_capture() || mv.piece == Piece::Pawn {
        0
    } else {
        position.halfmove_clock() + 1
    };

    let fullmove_number = if color == Color::Black {
        position.fullmove_number() + 1
    } else {
        position.fullmove_number()
    };

    position.with_fields(
        board,
        color.opposite(),
        castling,
        ep_target,
        halfmove_clock,
        fullmove_number,
    )
}

fn castle_rook_squares(color: Color, special: SpecialMove) -> (Square, Square) {
    use crate::square::*;
    match (color, special) {
        (Color::White, SpecialMove::CastleShort) => (H1, F1),
        (Color::White, SpecialMove::CastleLong) => (A1, D1),
        (Color::Black, SpecialMove::CastleShort) => (H8, F8),
        (Color::Black, SpecialMove::CastleLong) => (A8, D8),
        _ => unreachable!("castle_rook_squares called with a non-castle special move"),
    }
}

/// Leaf-node counter for a fixed depth: recursively applies every legal
/// move and sums the leaf counts below it. The standard correctness oracle
/// for a move generator, since a wrong count at some depth pinpoints
/// exactly where generation or application diverges from the known-correct
/// values for a given position.
pub fn perft(position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(position, None);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .iter()
        .map(|mv| perft(&apply(position, mv), depth - 1))
        .sum()
}

/// Per-root-move leaf counts, the standard way to localize a move generator
/// bug by depth-1 disagreement against a trusted oracle.
pub fn perft_divide(position: &Position, depth: u32) -> Vec<(Move, u64)> {
    legal_moves(position, None)
        .into_iter()
        .map(|mv| {
            let count = if depth == 0 { 1 } else { perft(&apply(position, &mv), depth - 1) };
            (mv, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;

    #[test]
    fn starting_position_has_twenty_legal_moves() {
        let position = Position::starting_position();
        assert_eq!(legal_moves(&position, None).len(), 20);
    }

    #[test]
    fn after_e4_black_has_twenty_legal_moves() {
        let position =
            parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_eq!(legal_moves(&position, None).len(), 20);
    }

    #[test]
    fn detects_checkmate() {
        let position = parse_fen("8/5r2/4K1q1/4p3/3k4/8/8/8 w - - 0 7").unwrap();
        assert!(in_checkmate(&position));
    }

    #[test]
    fn detects_stalemate() {
        let position = parse_fen("4k3/4P3/4K3/8/8/8/8/8 b - - 0 78").unwrap();
        assert!(in_stalemate(&position));
    }

    #[test]
    fn detects_insufficient_material_king_and_knight_vs_king() {
        let position = parse_fen("k7/8/n7/8/8/8/8/7K b - - 0 1").unwrap();
        assert!(insufficient_material(&position));
    }

    #[test]
    fn material_is_sufficient_with_a_lone_pawn() {
        let position = parse_fen("k7/8/8/8/8/8/4P3/7K w - - 0 1").unwrap();
        assert!(!insufficient_material(&position));
    }

    #[test]
    fn capturing_a_rook_on_its_home_square_clears_that_sides_rights() {
        // The cleared right must persist in the resulting position — a
        // captured-rook branch that computes new rights and then discards
        // the result instead of threading it through is a classic bug here.
        let position = parse_fen("4k2r/8/8/8/8/8/8/Q3K2R w Kk - 0 1").unwrap();
        let capture = Move::quiet(crate::square::A1, crate::square::H8, Piece::Queen, Color::White)
            .with_capture(Piece::Rook);
        let next = apply(&position, &capture);
        assert!(!next.castling().kingside(Color::Black));
        assert!(next.castling().kingside(Color::White));
    }

    #[test]
    fn perft_matches_known_values_from_the_starting_position() {
        let position = Position::starting_position();
        assert_eq!(perft(&position, 1), 20);
        assert_eq!(perft(&position, 2), 400);
        assert_eq!(perft(&position, 3), 8902);
        assert_eq!(perft(&position, 4), 197281);
    }
}
