//! PGN reading and writing: tag pairs, movetext with recursive annotation
//! variations (RAV), comments, NAGs, and the `%clk`/`%emt`/`%eval`/`%csl`/
//! `%cal` structured comment annotations.
//!
//! The reader is a hand-written state machine over the input text (states
//! `bom`, `pre`, `headers`, `moves`, `comment`, matching the shape of the
//! format itself) that leans on `regex` only for the fixed-shape tokens
//! inside each state — header lines, move/NAG/result tokens, comment
//! annotations — the same division of labor the FEN parser uses for its
//! fixed-shape fields.
//!
//! Parsing never validates a SAN token against a running position; moves
//! are stored verbatim. Callers that need legality checking replay the
//! tree through `san::from_san`.

use crate::chess_move::Move;
use crate::error::PgnError;
use crate::position::Position;
use crate::{movegen, san};
use regex::Regex;
use std::sync::OnceLock;

pub const SEVEN_TAG_ROSTER: [&str; 7] = ["Event", "Site", "Date", "Round", "White", "Black", "Result"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comment {
    pub clock: Option<String>,
    pub elapsed: Option<String>,
    pub eval: Option<EvalAnnotation>,
    pub colored_squares: Vec<String>,
    pub colored_arrows: Vec<String>,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalAnnotation {
    Pawns { centipawns: i32, depth: Option<u32> },
    Mate { moves: i32, depth: Option<u32> },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveNode {
    pub san: String,
    pub nags: Vec<u32>,
    pub pre_comments: Vec<Comment>,
    pub post_comments: Vec<Comment>,
    /// Alternatives to this move, each a full continuation line branching
    /// from the position before this move was played.
    pub variations: Vec<Line>,
}

pub type Line = Vec<MoveNode>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PgnGame {
    pub headers: Vec<(String, String)>,
    pub mainline: Line,
}

impl PgnGame {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The position play starts from: the `FEN` header when `SetUp` is
    /// `"1"`, otherwise the standard starting position.
    pub fn starting_position(&self) -> Result<Position, PgnError> {
        if self.header("SetUp") == Some("1") {
            if let Some(fen) = self.header("FEN") {
                return crate::fen::parse_fen(fen)
                    .map_err(|_| PgnError::IllegalMove { text: fen.to_string() });
            }
        }
        Ok(Position::starting_position())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayPolicy {
    /// Fail the whole replay on the first SAN that isn't legal in its
    /// running position.
    RejectWholeGame,
    /// Return the plies successfully resolved before the first illegal SAN.
    StopAtFirstIllegal,
}

/// Resolves the mainline's verbatim SAN tokens against a running position,
/// turning a syntax tree into the `(position-before, move)` pairs a caller
/// actually wants to drive a board with. Variations are not replayed, since
/// the mainline is the game that was actually played.
pub fn replay_mainline(game: &PgnGame, policy: ReplayPolicy) -> Result<Vec<(Position, Move)>, PgnError> {
    let mut position = game.starting_position()?;
    let mut plies = Vec::with_capacity(game.mainline.len());

    for node in &game.mainline {
        match san::from_san(&position, &node.san, true) {
            Ok(mv) => {
                plies.push((position, mv));
                position = movegen::apply(&position, &mv);
            }
            Err(_) => {
                log::debug!("illegal SAN {:?} in PGN movetext, stopping replay", node.san);
                return match policy {
                    ReplayPolicy::StopAtFirstIllegal => Ok(plies),
                    ReplayPolicy::RejectWholeGame => Err(PgnError::IllegalMove { text: node.san.clone() }),
                };
            }
        }
    }

    Ok(plies)
}

fn comment_annotation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            \[%clk\s+(?P<clk>\d+:\d{2}:\d{2}(?:\.\d+)?)\]
          | \[%emt\s+(?P<emt>\d+:\d{2}:\d{2}(?:\.\d+)?)\]
          | \[%eval\s+\#(?P<mate>-?\d+)(?:,(?P<matedepth>\d+))?\]
          | \[%eval\s+(?P<pawns>[+-]?\d+(?:\.\d+)?)(?:,(?P<pawnsdepth>\d+))?\]
          | \[%csl\s+(?P<csl>[^\]]*)\]
          | \[%cal\s+(?P<cal>[^\]]*)\]
            ",
        )
        .expect("comment_annotation_regex is a fixed valid pattern")
    })
}

fn parse_comment(raw: &str) -> Comment {
    let mut comment = Comment::default();
    let mut residual = raw.to_string();

    for caps in comment_annotation_regex().captures_iter(raw) {
        if let Some(m) = caps.name("clk") {
            comment.clock = Some(m.as_str().to_string());
        } else if let Some(m) = caps.name("emt") {
            comment.elapsed = Some(m.as_str().to_string());
        } else if let Some(m) = caps.name("mate") {
            let moves: i32 = m.as_str().parse().unwrap_or(0);
            let depth = caps.name("matedepth").and_then(|d| d.as_str().parse().ok());
            comment.eval = Some(EvalAnnotation::Mate { moves, depth });
        } else if let Some(m) = caps.name("pawns") {
            let pawns: f64 = m.as_str().parse().unwrap_or(0.0);
            let depth = caps.name("pawnsdepth").and_then(|d| d.as_str().parse().ok());
            comment.eval = Some(EvalAnnotation::Pawns {
                centipawns: (pawns * 100.0).round() as i32,
                depth,
            });
        } else if let Some(m) = caps.name("csl") {
            comment.colored_squares.extend(m.as_str().split(',').map(|s| s.trim().to_string()));
        } else if let Some(m) = caps.name("cal") {
            comment.colored_arrows.extend(m.as_str().split(',').map(|s| s.trim().to_string()));
        }
    }

    residual = comment_annotation_regex().replace_all(&residual, "").trim().to_string();
    comment.text = residual;
    comment
}

fn header_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\[(?P<tag>\w+)\s+"(?P<value>(?:[^"\\]|\\.)*)"\]\s*$"#)
            .expect("header_line_regex is a fixed valid pattern")
    })
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn movetext_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^\s*
            (?:
                (?P<comment_open>\{)
              | (?P<paren_open>\()
              | (?P<paren_close>\))
              | (?P<nag>\$\d+)
              | (?P<result>1-0|0-1|1/2-1/2|\*)
              | (?P<movenum>\d+\.(?:\.\.)?)
              | (?P<null>--|Z0|0000|@@@@)
              | (?P<san>O-O-O|O-O|[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBNqrbn])?|[a-h][1-8][a-h][1-8](?:=[QRBNqrbn])?)
              | (?P<suffix>!!|\?\?|!\?|\?!|[!?+\#])
            )
            ",
        )
        .expect("movetext_token_regex is a fixed valid pattern")
    })
}

struct Builder {
    stack: Vec<Line>,
    owners: Vec<(usize, usize)>,
    pending_pre_comments: Vec<Comment>,
}

impl Builder {
    fn new() -> Self {
        Builder {
            stack: vec![Vec::new()],
            owners: Vec::new(),
            pending_pre_comments: Vec::new(),
        }
    }

    fn push_move(&mut self, san: String) {
        let node = MoveNode {
            san,
            nags: Vec::new(),
            pre_comments: std::mem::take(&mut self.pending_pre_comments),
            post_comments: Vec::new(),
            variations: Vec::new(),
        };
        self.stack.last_mut().expect("stack is never empty").push(node);
    }

    fn attach_nag(&mut self, nag: u32) {
        if let Some(node) = self.stack.last_mut().and_then(|line| line.last_mut()) {
            node.nags.push(nag);
        }
    }

    fn attach_comment(&mut self, comment: Comment) {
        match self.stack.last_mut().and_then(|line| line.last_mut()) {
            Some(node) => node.post_comments.push(comment),
            None => self.pending_pre_comments.push(comment),
        }
    }

    fn open_variation(&mut self) {
        let owner_frame = self.stack.len() - 1;
        let owner_move = self.stack[owner_frame].len().saturating_sub(1);
        self.owners.push((owner_frame, owner_move));
        self.stack.push(Vec::new());
    }

    fn close_variation(&mut self) {
        if self.stack.len() <= 1 {
            return; // unmatched `)`, tolerated rather than rejected
        }
        let completed = self.stack.pop().expect("checked len > 1");
        if let Some((owner_frame, owner_move)) = self.owners.pop() {
            if let Some(node) = self.stack[owner_frame].get_mut(owner_move) {
                node.variations.push(completed);
            }
        }
    }

    fn finish(mut self) -> Line {
        while self.stack.len() > 1 {
            self.close_variation();
        }
        self.stack.pop().unwrap_or_default()
    }
}

/// Parses zero or more games out of `text`. A malformed header aborts the
/// whole document (stable field position); a malformed comment aborts the
/// game it occurs in.
pub fn parse_pgn(text: &str) -> Result<Vec<PgnGame>, PgnError> {
    let mut games = Vec::new();
    let mut rest = text.strip_prefix('\u{feff}').unwrap_or(text);

    loop {
        rest = skip_pre_lines(rest);
        if rest.trim().is_empty() {
            break;
        }

        let (headers, after_headers) = parse_headers(rest)?;
        let (mainline, after_moves) = parse_movetext(after_headers)?;
        games.push(PgnGame { headers, mainline });
        rest = after_moves;
    }

    Ok(games)
}

fn skip_pre_lines(text: &str) -> &str {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            offset += line.len();
        } else {
            break;
        }
    }
    &text[offset..]
}

fn parse_headers(text: &str) -> Result<(Vec<(String, String)>, &str), PgnError> {
    let mut headers = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            offset += line.len();
            break;
        }
        if trimmed.starts_with(';') {
            offset += line.len();
            continue;
        }
        if !trimmed.starts_with('[') {
            return Err(PgnError::MalformedHeader(trimmed.to_string()));
        }
        let caps = header_line_regex()
            .captures(trimmed)
            .ok_or_else(|| PgnError::MalformedHeader(trimmed.to_string()))?;
        headers.push((caps["tag"].to_string(), unescape(&caps["value"])));
        offset += line.len();
    }

    Ok((headers, &text[offset..]))
}

fn parse_movetext(text: &str) -> Result<(Line, &str), PgnError> {
    let mut builder = Builder::new();
    let mut rest = text;

    loop {
        let trimmed = rest.trim_start();
        let consumed = rest.len() - trimmed.len();
        rest = trimmed;
        if rest.is_empty() {
            break;
        }

        if let Some(stripped) = rest.strip_prefix('{') {
            let end = stripped
                .find('}')
                .ok_or_else(|| PgnError::UnterminatedComment { offset: text.len() - rest.len() + consumed })?;
            builder.attach_comment(parse_comment(&stripped[..end]));
            rest = &stripped[end + 1..];
            continue;
        }
        if let Some(stripped) = rest.strip_prefix(';') {
            let end = stripped.find('\n').unwrap_or(stripped.len());
            rest = &stripped[end..];
            continue;
        }

        let caps = match movetext_token_regex().captures(rest) {
            Some(caps) => caps,
            None => break, // unrecognized text ends the movetext region
        };
        let whole = caps.get(0).unwrap();
        if caps.name("paren_open").is_some() {
            builder.open_variation();
        } else if caps.name("paren_close").is_some() {
            builder.close_variation();
        } else if let Some(m) = caps.name("nag") {
            if let Ok(n) = m.as_str()[1..].parse() {
                builder.attach_nag(n);
            }
        } else if caps.name("result").is_some() {
            rest = &rest[whole.end()..];
            return Ok((builder.finish(), rest));
        } else if caps.name("movenum").is_some() {
            // purely textual; regenerated on write
        } else if let Some(m) = caps.name("null") {
            builder.push_move(m.as_str().to_string());
        } else if let Some(m) = caps.name("san") {
            builder.push_move(m.as_str().to_string());
        } else if caps.name("suffix").is_some() {
            if let Some(node) = builder.stack.last_mut().and_then(|line| line.last_mut()) {
                node.san.push_str(&rest[caps.name("suffix").unwrap().start()..whole.end()]);
            }
        }
        rest = &rest[whole.end()..];
    }

    Ok((builder.finish(), rest))
}

#[derive(Clone, Copy)]
pub struct WriteOptions {
    pub max_width: Option<usize>,
    pub newline: &'static str,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions { max_width: None, newline: "\n" }
    }
}

/// Serializes a game back to PGN text: the header block, a blank line, then
/// movetext with move numbers, NAGs, comments, and nested variations.
pub fn write_pgn(game: &PgnGame, options: &WriteOptions) -> String {
    let mut out = String::new();
    for tag in SEVEN_TAG_ROSTER {
        let value = game.header(tag).map(str::to_string).unwrap_or_else(|| default_header_value(tag));
        out.push_str(&format!("[{} \"{}\"]{}", tag, escape(&value), options.newline));
    }
    for (tag, value) in &game.headers {
        if SEVEN_TAG_ROSTER.contains(&tag.as_str()) {
            continue;
        }
        out.push_str(&format!("[{} \"{}\"]{}", tag, escape(value), options.newline));
    }
    out.push_str(options.newline);

    let mut atoms = Vec::new();
    emit_line(&game.mainline, 1, true, &mut atoms);
    let result = game.header("Result").unwrap_or("*");
    atoms.push(result.to_string());

    out.push_str(&wrap_atoms(&atoms, options.max_width, options.newline));
    out.push_str(options.newline);
    out
}

fn default_header_value(tag: &str) -> String {
    match tag {
        "Date" => "????.??.??".to_string(),
        "Result" => "*".to_string(),
        _ => "?".to_string(),
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Walks a line depth-first, pushing one atom per token (move number, SAN
/// with NAGs appended, each comment, each variation's atoms in nested
/// parens) so the line-wrapper downstream never has to split one.
fn emit_line(line: &[MoveNode], mut move_number: u32, mut white_to_move: bool, atoms: &mut Vec<String>) {
    let mut needs_number = true;
    for node in line {
        if needs_number || !node.pre_comments.is_empty() {
            atoms.push(move_number_token(move_number, white_to_move));
            needs_number = false;
        }
        for comment in &node.pre_comments {
            atoms.push(format!("{{{}}}", render_comment(comment)));
        }
        let mut san = node.san.clone();
        for nag in &node.nags {
            san.push_str(&format!(" ${}", nag));
        }
        atoms.push(san);
        for comment in &node.post_comments {
            atoms.push(format!("{{{}}}", render_comment(comment)));
        }
        for variation in &node.variations {
            atoms.push("(".to_string());
            emit_line(variation, move_number, white_to_move, atoms);
            atoms.push(")".to_string());
        }
        if !node.variations.is_empty() || !node.post_comments.is_empty() {
            needs_number = true;
        }
        if white_to_move {
            white_to_move = false;
        } else {
            white_to_move = true;
            move_number += 1;
        }
    }
}

fn move_number_token(move_number: u32, white_to_move: bool) -> String {
    if white_to_move {
        format!("{}.", move_number)
    } else {
        format!("{}...", move_number)
    }
}

fn render_comment(comment: &Comment) -> String {
    let mut parts = Vec::new();
    if let Some(clk) = &comment.clock {
        parts.push(format!("[%clk {}]", clk));
    }
    if let Some(emt) = &comment.elapsed {
        parts.push(format!("[%emt {}]", emt));
    }
    match &comment.eval {
        Some(EvalAnnotation::Pawns { centipawns, depth }) => {
            let pawns = *centipawns as f64 / 100.0;
            match depth {
                Some(d) => parts.push(format!("[%eval {:.2},{}]", pawns, d)),
                None => parts.push(format!("[%eval {:.2}]", pawns)),
            }
        }
        Some(EvalAnnotation::Mate { moves, depth }) => match depth {
            Some(d) => parts.push(format!("[%eval #{},{}]", moves, d)),
            None => parts.push(format!("[%eval #{}]", moves)),
        },
        None => {}
    }
    if !comment.colored_squares.is_empty() {
        parts.push(format!("[%csl {}]", comment.colored_squares.join(",")));
    }
    if !comment.colored_arrows.is_empty() {
        parts.push(format!("[%cal {}]", comment.colored_arrows.join(",")));
    }
    if !comment.text.is_empty() {
        parts.push(comment.text.clone());
    }
    parts.join(" ")
}

fn wrap_atoms(atoms: &[String], max_width: Option<usize>, newline: &str) -> String {
    let Some(width) = max_width else {
        return atoms.join(" ");
    };
    let mut out = String::new();
    let mut line_len = 0;
    for (i, atom) in atoms.iter().enumerate() {
        let sep_len = if i == 0 { 0 } else { 1 };
        if line_len + sep_len + atom.len() > width && line_len > 0 {
            out.push_str(newline);
            line_len = 0;
        } else if i != 0 {
            out.push(' ');
            line_len += 1;
        }
        out.push_str(atom);
        line_len += atom.len();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers_and_mainline() {
        let text = "[Event \"Test\"]\n[White \"A\"]\n[Black \"B\"]\n\n1. e4 e5 2. Nf3 *\n";
        let games = parse_pgn(text).unwrap();
        assert_eq!(games.len(), 1);
        let game = &games[0];
        assert_eq!(game.header("Event"), Some("Test"));
        assert_eq!(game.mainline.len(), 3);
        assert_eq!(game.mainline[0].san, "e4");
        assert_eq!(game.mainline[2].san, "Nf3");
    }

    #[test]
    fn parses_a_variation_as_a_sibling_of_the_move_it_replaces() {
        let text = "[Event \"Test\"]\n\n1. e4 e5 (1... c5 2. Nf3) 2. Nf3 *\n";
        let games = parse_pgn(text).unwrap();
        let mainline = &games[0].mainline;
        assert_eq!(mainline[1].san, "e5");
        assert_eq!(mainline[1].variations.len(), 1);
        assert_eq!(mainline[1].variations[0][0].san, "c5");
    }

    #[test]
    fn extracts_clock_annotation_from_a_comment() {
        let text = "[Event \"Test\"]\n\n1. e4 {[%clk 0:05:00]} e5 *\n";
        let games = parse_pgn(text).unwrap();
        let comment = &games[0].mainline[0].post_comments[0];
        assert_eq!(comment.clock.as_deref(), Some("0:05:00"));
    }

    #[test]
    fn rejects_unterminated_comment() {
        let text = "[Event \"Test\"]\n\n1. e4 {no closing brace\n";
        assert!(matches!(parse_pgn(text), Err(PgnError::UnterminatedComment { .. })));
    }

    #[test]
    fn writes_headers_and_movetext() {
        let game = PgnGame {
            headers: vec![("White".to_string(), "Alice".to_string())],
            mainline: vec![
                MoveNode { san: "e4".to_string(), ..Default::default() },
                MoveNode { san: "e5".to_string(), ..Default::default() },
            ],
        };
        let text = write_pgn(&game, &WriteOptions::default());
        assert!(text.contains("[White \"Alice\"]"));
        assert!(text.contains("[Result \"*\"]"));
        assert!(text.contains("1. e4 e5 *"));
    }

    #[test]
    fn replays_mainline_into_position_move_pairs() {
        let games = parse_pgn("[Event \"Test\"]\n\n1. e4 e5 2. Nf3 *\n").unwrap();
        let plies = replay_mainline(&games[0], ReplayPolicy::RejectWholeGame).unwrap();
        assert_eq!(plies.len(), 3);
        assert_eq!(plies[0].0, Position::starting_position());
        assert_eq!(plies[1].0, movegen::apply(&plies[0].0, &plies[0].1));
    }

    #[test]
    fn replay_honors_setup_fen_header() {
        let games = parse_pgn(
            "[Event \"Test\"]\n[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1\"]\n\n1. O-O *\n",
        )
        .unwrap();
        let plies = replay_mainline(&games[0], ReplayPolicy::RejectWholeGame).unwrap();
        assert_eq!(plies.len(), 1);
        assert_eq!(plies[0].1.special, crate::chess_move::SpecialMove::CastleShort);
    }

    #[test]
    fn rejects_whole_game_on_illegal_san_by_default() {
        let games = parse_pgn("[Event \"Test\"]\n\n1. e4 e4 *\n").unwrap();
        assert!(matches!(
            replay_mainline(&games[0], ReplayPolicy::RejectWholeGame),
            Err(PgnError::IllegalMove { .. })
        ));
    }

    #[test]
    fn stops_at_first_illegal_san_when_asked() {
        let games = parse_pgn("[Event \"Test\"]\n\n1. e4 e4 *\n").unwrap();
        let plies = replay_mainline(&games[0], ReplayPolicy::StopAtFirstIllegal).unwrap();
        assert_eq!(plies.len(), 1);
    }

    #[test]
    fn round_trips_simple_movetext() {
        let text = "[Event \"?\"]\n[Site \"?\"]\n[Date \"????.??.??\"]\n[Round \"?\"]\n[White \"?\"]\n[Black \"?\"]\n[Result \"*\"]\n\n1. e4 e5 2. Nf3 Nc6 *\n";
        let games = parse_pgn(text).unwrap();
        let rewritten = write_pgn(&games[0], &WriteOptions::default());
        let reparsed = parse_pgn(&rewritten).unwrap();
        assert_eq!(reparsed[0].mainline.len(), games[0].mainline.len());
        for (a, b) in reparsed[0].mainline.iter().zip(games[0].mainline.iter()) {
            assert_eq!(a.san, b.san);
        }
    }
}
