//! FEN parsing and serialization: a single `regex` capturing all six fields
//! at once, then per-field validation. Every rejection returns one of the
//! enumerated `FenError` reason codes rather than panicking, since malformed
//! FEN is expected, recoverable input, not a programming error.

use crate::board::Board;
use crate::castling::CastlingRights;
use crate::color::Color;
use crate::error::FenError;
use crate::piece::Piece;
use crate::position::Position;
use crate::square::Square;
use regex::Regex;
use std::sync::OnceLock;

pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn fen_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^
            (?P<placement>[pnbrqkPNBRQK1-8/]+)
            \x20
            (?P<side>b|w)
            \x20
            (?P<castling>[KQkq]{1,4}|-)
            \x20
            (?P<ep>[a-h][1-8]|-)
            \x20
            (?P<halfmove>\S+)
            \x20
            (?P<fullmove>\S+)
            $
            ",
        )
        .expect("fen_regex is a fixed valid pattern")
    })
}

pub fn parse_fen(fen: &str) -> Result<Position, FenError> {
    let field_count = fen.split(' ').filter(|s| !s.is_empty()).count();
    if field_count != 6 {
        return Err(FenError::FieldCount { found: field_count });
    }

    let caps = fen_regex()
        .captures(fen)
        .ok_or_else(|| FenError::BadPlacement(fen.to_string()))?;

    let board = parse_placement(&caps["placement"])?;

    let side_to_move = match &caps["side"] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(FenError::BadSide(other.to_string())),
    };

    let castling = parse_castling(&caps["castling"])?;

    let ep_target = parse_ep(&caps["ep"], side_to_move)?;

    let halfmove_clock = parse_counter(&caps["halfmove"], true)
        .ok_or_else(|| FenError::BadCounter(caps["halfmove"].to_string()))?;
    let fullmove_number = parse_counter(&caps["fullmove"], false)
        .ok_or_else(|| FenError::BadCounter(caps["fullmove"].to_string()))?;

    let position = Position::new(
        board,
        side_to_move,
        castling,
        ep_target,
        halfmove_clock,
        fullmove_number,
    );

    let (white_kings, black_kings) = position.king_counts();
    if white_kings != 1 {
        return Err(FenError::TooManyKings {
            color: "white".to_string(),
            count: white_kings,
        });
    }
    if black_kings != 1 {
        return Err(FenError::TooManyKings {
            color: "black".to_string(),
            count: black_kings,
        });
    }

    Ok(position)
}

fn parse_placement(placement: &str) -> Result<Board, FenError> {
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != 8 {
        return Err(FenError::BadPlacement(placement.to_string()));
    }

    let mut board = Board::new();

    for (row_index, row) in rows.iter().enumerate() {
        let rank = 7 - row_index as u8;
        let mut file = 0u8;
        let mut prev_was_digit = false;

        for c in row.chars() {
            if let Some(digit) = c.to_digit(10) {
                if prev_was_digit {
                    return Err(FenError::BadPlacement(placement.to_string()));
                }
                prev_was_digit = true;
                file += digit as u8;
            } else {
                prev_was_digit = false;
                let (piece, color) = Piece::from_fen_char(c)
                    .ok_or_else(|| FenError::BadPlacement(placement.to_string()))?;
                if file >= 8 {
                    return Err(FenError::BadPlacement(placement.to_string()));
                }
                let square = Square::from_file_rank(file, rank);
                board = board.with_piece_placed(square, piece, color);
                file += 1;
            }
        }

        if file != 8 {
            return Err(FenError::BadPlacement(placement.to_string()));
        }
    }

    Ok(board)
}

fn parse_castling(raw: &str) -> Result<CastlingRights, FenError> {
    if raw == "-" {
        return Ok(CastlingRights::none());
    }
    // The regex already constrains this to letters from `KQkq`. Input order
    // is not normalized on the way in — any subset in any order is
    // accepted — since canonical ordering (`K`, `Q`, `k`, `q`) is only
    // enforced on the way out, in `CastlingRights::to_fen`.
    let mut bits = 0u8;
    for c in raw.chars() {
        bits |= match c {
            'K' => crate::castling::WHITE_KINGSIDE,
            'Q' => crate::castling::WHITE_QUEENSIDE,
            'k' => crate::castling::BLACK_KINGSIDE,
            'q' => crate::castling::BLACK_QUEENSIDE,
            _ => return Err(FenError::BadCastling(raw.to_string())),
        };
    }
    Ok(CastlingRights::from_bits(bits))
}

fn parse_ep(raw: &str, side_to_move: Color) -> Result<Option<Square>, FenError> {
    if raw == "-" {
        return Ok(None);
    }
    let square = Square::from_algebraic(raw).ok_or_else(|| FenError::BadEp(raw.to_string()))?;
    let expected_rank = match side_to_move {
        // White to move means black just pushed a pawn to rank 4, leaving
        // the EP target behind it on rank 3 (0-indexed rank 2).
        Color::White => 2,
        Color::Black => 5,
    };
    if square.rank() != expected_rank {
        return Err(FenError::IllegalEp {
            square: raw.to_string(),
            side_to_move: side_to_move.to_string(),
        });
    }
    Ok(Some(square))
}

fn parse_counter(raw: &str, allow_zero: bool) -> Option<u32> {
    if raw.is_empty() || (raw.len() > 1 && raw.starts_with('0')) {
        return None;
    }
    let value: u32 = raw.parse().ok()?;
    if !allow_zero && value == 0 {
        return None;
    }
    Some(value)
}

pub fn to_fen(position: &Position) -> String {
    let mut ranks = Vec::with_capacity(8);
    for rank in (0..8).rev() {
        let mut row = String::new();
        let mut empty_run = 0u8;
        for file in 0..8 {
            let square = Square::from_file_rank(file, rank);
            match position.board().get(square) {
                Some((piece, color)) => {
                    if empty_run > 0 {
                        row.push_str(&empty_run.to_string());
                        empty_run = 0;
                    }
                    row.push(piece.to_fen_char(color));
                }
                None => empty_run += 1,
            }
        }
        if empty_run > 0 {
            row.push_str(&empty_run.to_string());
        }
        ranks.push(row);
    }

    let side = match position.side_to_move() {
        Color::White => "w",
        Color::Black => "b",
    };

    let ep = match position.ep_target() {
        Some(square) => square.to_algebraic(),
        None => "-".to_string(),
    };

    format!(
        "{} {} {} {} {} {}",
        ranks.join("/"),
        side,
        position.castling().to_fen(),
        ep,
        position.halfmove_clock(),
        position.fullmove_number(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_starting_position() {
        let position = parse_fen(STARTING_POSITION_FEN).unwrap();
        assert_eq!(position.side_to_move(), Color::White);
        assert_eq!(position.castling(), CastlingRights::all());
        assert_eq!(position.ep_target(), None);
        assert_eq!(position.halfmove_clock(), 0);
        assert_eq!(position.fullmove_number(), 1);
    }

    #[test]
    fn round_trips_starting_position() {
        let position = parse_fen(STARTING_POSITION_FEN).unwrap();
        assert_eq!(to_fen(&position), STARTING_POSITION_FEN);
    }

    #[test]
    fn round_trips_midgame_fen() {
        let fen = "r1bqkbnr/1ppp1ppp/p1n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 4";
        let position = parse_fen(fen).unwrap();
        assert_eq!(to_fen(&position), fen);
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"),
            Err(FenError::FieldCount { found: 4 })
        );
    }

    #[test]
    fn rejects_consecutive_digits() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/44/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert!(matches!(parse_fen(fen), Err(FenError::BadPlacement(_))));
    }

    #[test]
    fn rejects_row_sum_mismatch() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/7/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert!(matches!(parse_fen(fen), Err(FenError::BadPlacement(_))));
    }

    #[test]
    fn rejects_ep_rank_inconsistent_with_side_to_move() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e3 0 1";
        assert!(matches!(parse_fen(fen), Err(FenError::IllegalEp { .. })));
    }

    #[test]
    fn rejects_two_kings() {
        let fen = "rnbqkbnr/ppppkppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert!(matches!(
            parse_fen(fen),
            Err(FenError::TooManyKings { .. })
        ));
    }

    #[test]
    fn rejects_leading_zero_counters() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 00 1";
        assert!(matches!(parse_fen(fen), Err(FenError::BadCounter(_))));
    }
}
