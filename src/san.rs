//! Standard Algebraic Notation: encoding a `Move` against the position it
//! is played in, and decoding text back into one of that position's legal
//! moves.

use crate::chess_move::{Move, SpecialMove};
use crate::error::SanError;
use crate::movegen;
use crate::piece::Piece;
use crate::position::Position;
use crate::square::Square;
use regex::Regex;
use std::sync::OnceLock;

/// Strict encoding: disambiguation is computed against the position's other
/// *legal* moves of the same piece kind to the same square.
pub fn to_san(position: &Position, mv: &Move) -> String {
    encode(position, mv, false)
}

/// Encoding whose disambiguation is computed against *pseudo-legal* movers
/// instead of legal ones, matching engines that over-disambiguate a pinned
/// piece (e.g. writing `Nge7` when `Ne7` would already be unambiguous
/// because the other knight cannot legally move there).
pub fn to_san_sloppy(position: &Position, mv: &Move) -> String {
    encode(position, mv, true)
}

fn encode(position: &Position, mv: &Move, sloppy: bool) -> String {
    let mut out = String::new();

    if mv.is_castle() {
        out.push_str(match mv.special {
            SpecialMove::CastleShort => "O-O",
            SpecialMove::CastleLong => "O-O-O",
            _ => unreachable!(),
        });
        append_suffix(position, mv, &mut out);
        return out;
    }

    if mv.piece != Piece::Pawn {
        out.push(mv.piece.san_letter());
        let rivals = same_kind_rivals(position, mv, sloppy);
        append_disambiguation(&mut out, mv.from, &rivals);
    }

    if mv.piece == Piece::Pawn && mv.is_capture() {
        out.push(mv.from.file_char());
    }
    if mv.is_capture() {
        out.push('x');
    }
    out.push_str(&mv.to.to_algebraic());
    if let Some(promotion) = mv.promotion {
        out.push('=');
        out.push(promotion.san_letter());
    }
    append_suffix(position, mv, &mut out);
    out
}

fn same_kind_rivals(position: &Position, mv: &Move, sloppy: bool) -> Vec<Square> {
    let candidates = if sloppy {
        movegen::pseudo_moves(position, None)
    } else {
        movegen::legal_moves(position, None)
    };
    candidates
        .iter()
        .filter(|other| other.piece == mv.piece && other.to == mv.to && other.from != mv.from)
        .map(|other| other.from)
        .collect()
}

/// File first, then rank, then the full square — the tie-break order a
/// mover's origin square is spelled out in, only as far as is needed to
/// make it unique among `rivals`.
fn append_disambiguation(out: &mut String, from: Square, rivals: &[Square]) {
    if rivals.is_empty() {
        return;
    }
    if rivals.iter().all(|&sq| sq.file() != from.file()) {
        out.push(from.file_char());
    } else if rivals.iter().all(|&sq| sq.rank() != from.rank()) {
        out.push(from.rank_char());
    } else {
        out.push_str(&from.to_algebraic());
    }
}

fn append_suffix(position: &Position, mv: &Move, out: &mut String) {
    let next = movegen::apply(position, mv);
    if movegen::in_checkmate(&next) {
        out.push('#');
    } else if movegen::in_check(&next) {
        out.push('+');
    }
}

fn long_algebraic_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^([pnbrqk])?([a-h][1-8])[x-]?([a-h][1-8])([qrbn])?$")
            .expect("long_algebraic_regex is a fixed valid pattern")
    })
}

/// Removes the trailing annotation glyph (if any) and every `=` character,
/// so `"e8=Q+"`, `"e8=Q"`, and an engine's `"e8Q+"` all canonicalize to the
/// same comparison key.
fn canonicalize(text: &str) -> String {
    let mut cleaned = text.trim().to_string();
    for suffix in ["!!", "??", "!?", "?!", "+", "#", "!", "?"] {
        if let Some(stripped) = cleaned.strip_suffix(suffix) {
            cleaned = stripped.to_string();
            break;
        }
    }
    cleaned.retain(|c| c != '=');
    cleaned
}

/// Decodes `text` into one of `position`'s legal moves. With `sloppy` set,
/// falls back to sloppy-disambiguated SAN and a permissive long-algebraic
/// pattern when strict matching finds nothing.
pub fn from_san(position: &Position, text: &str, sloppy: bool) -> Result<Move, SanError> {
    let cleaned = canonicalize(text);
    let legal = movegen::legal_moves(position, None);

    if cleaned == "O-O" || cleaned == "O-O-O" {
        let wanted = if cleaned == "O-O" {
            SpecialMove::CastleShort
        } else {
            SpecialMove::CastleLong
        };
        return legal
            .iter()
            .find(|mv| mv.special == wanted)
            .copied()
            .ok_or_else(|| SanError::Unknown { text: text.to_string() });
    }

    let strict_matches: Vec<Move> = legal
        .iter()
        .filter(|mv| canonicalize(&to_san(position, mv)) == cleaned)
        .copied()
        .collect();

    match strict_matches.len() {
        1 => return Ok(strict_matches[0]),
        n if n > 1 => {
            log::debug!("{text:?} matches more than one legal move in this position");
            return Err(SanError::Ambiguous { text: text.to_string() });
        }
        _ => {}
    }

    if !sloppy {
        return Err(SanError::Unknown { text: text.to_string() });
    }

    let mut candidates: Vec<Move> = legal
        .iter()
        .filter(|mv| canonicalize(&to_san_sloppy(position, mv)) == cleaned)
        .copied()
        .collect();

    if candidates.is_empty() {
        if let Some(caps) = long_algebraic_regex().captures(&cleaned) {
            let piece = caps.get(1).and_then(|m| m.as_str().chars().next()).map(|c| {
                let upper = c.to_ascii_uppercase();
                if upper == 'P' {
                    Piece::Pawn
                } else {
                    Piece::from_san_letter(upper).expect("regex group only matches piece letters")
                }
            });
            let from = Square::from_algebraic(&caps[2]);
            let to = Square::from_algebraic(&caps[3]);
            let promotion = caps
                .get(4)
                .and_then(|m| m.as_str().chars().next())
                .and_then(|c| Piece::from_san_letter(c.to_ascii_uppercase()));

            if let (Some(from), Some(to)) = (from, to) {
                candidates = legal
                    .iter()
                    .filter(|mv| {
                        mv.from == from
                            && mv.to == to
                            && piece.map_or(true, |p| p == mv.piece)
                            && promotion.map_or(mv.promotion.is_none(), |p| mv.promotion == Some(p))
                    })
                    .copied()
                    .collect();
            }
        }
    }

    candidates.dedup();
    match candidates.len() {
        1 => Ok(candidates[0]),
        0 => {
            log::debug!("{text:?} matches no legal move in this position");
            Err(SanError::Unknown { text: text.to_string() })
        }
        _ => {
            log::debug!("{text:?} matches more than one legal move in this position");
            Err(SanError::Ambiguous { text: text.to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;
    use crate::square;

    #[test]
    fn encodes_simple_knight_move() {
        let position = Position::starting_position();
        let mv = Move::quiet(square::G1, square::F3, Piece::Knight, crate::color::Color::White);
        assert_eq!(to_san(&position, &mv), "Nf3");
    }

    #[test]
    fn encodes_pawn_capture_with_file_prefix() {
        let position = parse_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2").unwrap();
        let mv = Move::quiet(square::E4, square::D5, Piece::Pawn, crate::color::Color::White)
            .with_capture(Piece::Pawn);
        assert_eq!(to_san(&position, &mv), "exd5");
    }

    #[test]
    fn disambiguates_by_file_when_rooks_share_a_rank() {
        let position = parse_fen("4k3/8/8/8/8/8/4K3/R6R w - - 0 1").unwrap();
        let mv = Move::quiet(square::A1, square::D1, Piece::Rook, crate::color::Color::White);
        assert_eq!(to_san(&position, &mv), "Rad1");
    }

    #[test]
    fn round_trips_through_from_san() {
        let position = Position::starting_position();
        for mv in movegen::legal_moves(&position, None) {
            let san = to_san(&position, &mv);
            assert_eq!(from_san(&position, &san, false), Ok(mv));
        }
    }

    #[test]
    fn decodes_castling() {
        let position = parse_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let mv = from_san(&position, "O-O", false).unwrap();
        assert_eq!(mv.special, SpecialMove::CastleShort);
    }

    #[test]
    fn rejects_unknown_san() {
        let position = Position::starting_position();
        assert_eq!(
            from_san(&position, "Qh5", false),
            Err(SanError::Unknown { text: "Qh5".to_string() })
        );
    }

    #[test]
    fn sloppy_mode_resolves_an_over_disambiguated_knight_move() {
        let position =
            parse_fen("r1bqkbnr/ppp2ppp/2n5/1B1pP3/4P3/8/PPPP2PP/RNBQK1NR b KQkq - 2 4").unwrap();
        assert_eq!(
            from_san(&position, "Nge7", false),
            Err(SanError::Unknown { text: "Nge7".to_string() })
        );
        let mv = from_san(&position, "Nge7", true).unwrap();
        assert_eq!((mv.from, mv.to), (square::G8, square::E7));
    }

    #[test]
    fn sloppy_mode_accepts_long_algebraic() {
        let position = Position::starting_position();
        let mv = from_san(&position, "e2e4", true).unwrap();
        assert_eq!((mv.from, mv.to), (square::E2, square::E4));
    }
}
