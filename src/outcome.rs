//! Terminal-condition aggregation: composes the individual predicates
//! (`in_checkmate`, `in_stalemate`, `insufficient_material`) with the
//! 50-move clock and repetition counting into a single result, since most
//! callers want "is this game over, and why" rather than five separate
//! calls.

use crate::movegen;
use crate::position::Position;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    Ongoing,
    Checkmate(crate::color::Color),
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

/// `history` is every position reached so far in the game, oldest first,
/// including `position` itself — used to count repetitions of the current
/// position's repetition key.
pub fn outcome(position: &Position, history: &[Position]) -> GameOutcome {
    if movegen::in_checkmate(position) {
        return GameOutcome::Checkmate(position.side_to_move().opposite());
    }
    if movegen::in_stalemate(position) {
        return GameOutcome::Stalemate;
    }
    if movegen::insufficient_material(position) {
        return GameOutcome::InsufficientMaterial;
    }
    if position.halfmove_clock() >= 100 {
        return GameOutcome::FiftyMoveRule;
    }
    let repetitions = repetition_count(position, history);
    if repetitions >= 3 {
        log::debug!("position repeated {repetitions} times, declaring threefold repetition");
        return GameOutcome::ThreefoldRepetition;
    }
    GameOutcome::Ongoing
}

fn repetition_count(position: &Position, history: &[Position]) -> u32 {
    let key = position.repetition_key();
    let mut counts: HashMap<_, u32> = HashMap::new();
    for past in history {
        *counts.entry(past.repetition_key()).or_insert(0) += 1;
    }
    counts.get(&key).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::fen::parse_fen;

    #[test]
    fn reports_checkmate_with_the_winning_color() {
        let position = parse_fen("8/5r2/4K1q1/4p3/3k4/8/8/8 w - - 0 7").unwrap();
        assert_eq!(outcome(&position, &[position]), GameOutcome::Checkmate(Color::Black));
    }

    #[test]
    fn reports_stalemate() {
        let position = parse_fen("4k3/4P3/4K3/8/8/8/8/8 b - - 0 78").unwrap();
        assert_eq!(outcome(&position, &[position]), GameOutcome::Stalemate);
    }

    #[test]
    fn reports_fifty_move_rule() {
        let position = parse_fen("7k/8/8/8/8/8/7K/8 w - - 100 60").unwrap();
        assert_eq!(outcome(&position, &[position]), GameOutcome::FiftyMoveRule);
    }

    #[test]
    fn reports_threefold_repetition() {
        let position = Position::starting_position();
        let history = vec![position, position, position];
        assert_eq!(outcome(&position, &history), GameOutcome::ThreefoldRepetition);
    }

    #[test]
    fn twice_seen_is_still_ongoing() {
        let position = Position::starting_position();
        let history = vec![position, position];
        assert_eq!(outcome(&position, &history), GameOutcome::Ongoing);
    }
}
