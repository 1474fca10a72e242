//! A pure, deterministic chess rules core: board representation, legal move
//! generation, move application, terminal-condition detection, and the FEN,
//! SAN, and PGN text formats. No search, no evaluation, no I/O beyond string
//! parsing/formatting — every public function is a total or `Result`-typed
//! function of its arguments.

pub mod attacks;
pub mod bitboard;
pub mod board;
pub mod castling;
pub mod chess_move;
pub mod color;
pub mod error;
pub mod fen;
pub mod movegen;
pub mod outcome;
pub mod pgn;
pub mod piece;
pub mod piece_set;
pub mod position;
pub mod san;
pub mod square;
pub mod zobrist;

pub use bitboard::Bitboard;
pub use board::Board;
pub use castling::CastlingRights;
pub use chess_move::{Move, SpecialMove};
pub use color::Color;
pub use error::{FenError, PgnError, SanError};
pub use outcome::{outcome, GameOutcome};
pub use piece::Piece;
pub use position::Position;
pub use square::Square;

pub use fen::{parse_fen, to_fen, STARTING_POSITION_FEN};
pub use movegen::{
    apply, in_check, in_checkmate, in_stalemate, insufficient_material, legal_moves, perft,
    perft_divide, pseudo_moves, MoveList,
};
pub use pgn::{
    parse_pgn, replay_mainline, write_pgn, Comment, EvalAnnotation, Line, MoveNode, PgnGame,
    ReplayPolicy, WriteOptions,
};
pub use san::{from_san, to_san, to_san_sloppy};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plays_out_scholars_mate_through_the_public_api() {
        let mut position = Position::starting_position();
        let mut history = vec![position];
        for text in ["e4", "e5", "Qh5", "Nc6", "Bc4", "Nf6", "Qxf7#"] {
            let mv = from_san(&position, text, false).expect("move should be legal");
            position = apply(&position, &mv);
            history.push(position);
        }
        assert_eq!(outcome(&position, &history), GameOutcome::Checkmate(Color::White));
    }

    #[test]
    fn applies_an_opening_sequence_and_serializes_the_resulting_fen() {
        let mut position = Position::starting_position();
        for text in ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"] {
            let mv = from_san(&position, text, false).unwrap();
            position = apply(&position, &mv);
        }
        assert_eq!(
            to_fen(&position),
            "r1bqkbnr/1ppp1ppp/p1n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 4"
        );
    }

    #[test]
    fn detects_threefold_repetition_from_a_knight_shuffle() {
        let mut position = Position::starting_position();
        let mut history = vec![position];
        for text in ["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8"] {
            let mv = from_san(&position, text, false).unwrap();
            position = apply(&position, &mv);
            history.push(position);
        }
        assert_eq!(outcome(&position, &history), GameOutcome::ThreefoldRepetition);
    }

    #[test]
    fn fen_and_pgn_round_trip_independently() {
        let position = parse_fen("r1bqkbnr/1ppp1ppp/p1n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 4").unwrap();
        assert_eq!(to_fen(&position), "r1bqkbnr/1ppp1ppp/p1n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 4");

        let text = "[Event \"Casual\"]\n\n1. e4 e5 2. Nf3 *\n";
        let games = parse_pgn(text).unwrap();
        assert_eq!(games[0].mainline.len(), 3);
    }
}
