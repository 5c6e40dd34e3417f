use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::{
    board::Board,
    chess::{BoardLocation, Castling, LocationError, Move, MoveKind, PieceError, PieceType, Team},
    rules::{
        is_checkmate, is_king_in_check, is_legal, king_home, legal_moves_from, pseudo_legal_moves, GenerationOptions,
    },
};

/// Represents errors that can occur when parsing a move in coordinate notation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    /// Error when the source square in the notation is invalid.
    #[error("Invalid from square: {0}")]
    InvalidFromSquare(LocationError),

    /// Error when the destination square in the notation is invalid.
    #[error("Invalid to square: {0}")]
    InvalidToSquare(LocationError),

    /// Error when the promotion piece in the notation is invalid.
    #[error("Invalid promotion piece: {0}")]
    InvalidPromotion(PieceError),

    /// Error when the overall notation format is incorrect.
    #[error("Invalid notation: {0}")]
    InvalidNotation(String),

    /// Error when there is no piece of the moving team on the source square.
    #[error("There is no piece to move on {0}")]
    NoPieceAtFromSquare(BoardLocation),

    /// Error when the move is well formed but not legal in the position.
    #[error("Illegal move: {0}")]
    IllegalMove(String),
}

// Piece letter, optional source file and rank, capture marker, destination, promotion, en passant
// marker and check or mate markers.
static SAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<piece>[NBRQK])?(?P<from_file>[a-h])?(?P<from_rank>[1-8])?(?P<capture>x)?(?P<to>[a-h][1-8])",
        r"(?:=?(?P<promotion>[NBRQnbrq]))?(?P<en_passant>\s*e\.p\.?)?[+#]*$",
    ))
    .expect("The SAN regex should be valid")
});

//======================================================================================================================
// Move to text
//======================================================================================================================

// The prefix telling apart `mv` from the moves of the other pieces of the same type and team that
// could legally land on the same square. Pinned pieces never force a prefix.
fn disambiguation(board: &mut Board, mv: &Move) -> String {
    let piece = mv.piece();
    let from = mv.from();

    let position: &Board = board;
    let rivals: Vec<Move> = position
        .pieces()
        .filter(|(location, other)| *location != from && *other == piece)
        .flat_map(|(location, other)| {
            pseudo_legal_moves(position, location, other, GenerationOptions::INCLUDE_FRIENDLY)
        })
        .filter(|rival| rival.to() == mv.to())
        .collect();
    let rivals: Vec<BoardLocation> =
        rivals.into_iter().filter(|rival| is_legal(board, rival)).map(|rival| rival.from()).collect();

    if rivals.is_empty() {
        String::new()
    } else if !rivals.iter().any(|rival| rival.is_on_same_file_as(from)) {
        from.file_char().to_string()
    } else if !rivals.iter().any(|rival| rival.is_on_same_rank_as(from)) {
        from.rank_char().to_string()
    } else {
        from.to_string()
    }
}

// "#" when the move mates, "+" when it checks.
fn check_suffix(board: &mut Board, mv: &Move) -> &'static str {
    let enemy = mv.piece().team.opposite();

    board.make_move(mv);
    let suffix = if is_checkmate(enemy, board) {
        "#"
    } else if is_king_in_check(enemy, board) {
        "+"
    } else {
        ""
    };
    board.undo_move();

    suffix
}

/// Returns the algebraic notation of a move.
///
/// The move must not have been played yet: the notation depends on the position it is played
/// from. The board is modified temporarily to find out whether the move checks or mates.
///
/// # Parameters
/// * `board` - The position before the move
/// * `mv` - The move to describe
///
/// # Returns
/// The notation of the move, e.g. "e4", "exd5", "bxc6 e.p.", "a8=Q", "Nbd7", "R1e2", "Qh4#", "O-O".
pub fn get_parsed_move(board: &mut Board, mv: &Move) -> String {
    let mut notation = match (mv.kind(), mv.piece().piece_type) {
        (MoveKind::Castling(castling), _) => castling.notation().to_string(),
        (kind, PieceType::Pawn) => {
            let mut notation = match mv.is_capture() {
                true => format!("{}x{}", mv.from().file_char(), mv.to()),
                false => mv.to().to_string(),
            };
            match kind {
                MoveKind::EnPassant => notation.push_str(" e.p."),
                MoveKind::Promotion(piece_type) => {
                    notation.push('=');
                    notation.push(char::from(piece_type));
                }
                _ => {}
            }
            notation
        }
        (_, piece_type) => {
            let capture = if mv.is_capture() { "x" } else { "" };
            format!("{}{}{}{}", char::from(piece_type), disambiguation(board, mv), capture, mv.to())
        }
    };

    notation.push_str(check_suffix(board, mv));
    notation
}

//======================================================================================================================
// Text to move
//======================================================================================================================

fn castling_from_notation(board: &mut Board, team: Team, castling: Castling) -> Option<Move> {
    legal_moves_from(board, king_home(team)).into_iter().find(|mv| mv.kind() == MoveKind::Castling(castling))
}

fn file_of(c: char) -> i8 {
    c as i8 - 'a' as i8
}

fn rank_of(c: char) -> i8 {
    c as i8 - '1' as i8
}

fn matches_source(from: BoardLocation, from_file: Option<i8>, from_rank: Option<i8>) -> bool {
    from_file.map_or(true, |x| from.x == x) && from_rank.map_or(true, |y| from.y == y)
}

/// Finds the legal move of `team` described by an algebraic notation.
///
/// Castling is accepted as "O-O" and "O-O-O" as well as with zeros. Check and mate markers are
/// ignored. A promotion without a piece letter promotes to a queen. For piece moves, the source
/// file or rank given before the destination selects among several candidates; without it the
/// first candidate found wins. For pawn moves, the sources one and two squares behind the
/// destination are probed for pushes and the two diagonal sources for captures.
///
/// # Parameters
/// * `board` - The position; it is only modified temporarily
/// * `team` - The team to move
/// * `text` - The notation, e.g. "Nf3", "exd6 e.p.", "e8=N", "R1a3+"
///
/// # Returns
/// * `Some(Move)` - The move described by the notation
/// * `None` - If the text is malformed or no legal move matches it
pub fn get_move_from_parsed_move(board: &mut Board, team: Team, text: &str) -> Option<Move> {
    let text = text.trim();
    match text.trim_end_matches(['+', '#']) {
        "O-O" | "0-0" => return castling_from_notation(board, team, Castling::Kingside),
        "O-O-O" | "0-0-0" => return castling_from_notation(board, team, Castling::Queenside),
        _ => {}
    }

    let captures = SAN_REGEX.captures(text)?;
    let to = BoardLocation::try_from(captures.name("to")?.as_str()).ok()?;
    let first_char = |name: &str| captures.name(name).and_then(|m| m.as_str().chars().next());
    let from_file = first_char("from_file").map(file_of);
    let from_rank = first_char("from_rank").map(rank_of);

    match first_char("piece") {
        Some(letter) => {
            let piece_type = PieceType::try_from(letter).ok()?;
            let sources: Vec<BoardLocation> = board
                .locations_of(team)
                .into_iter()
                .filter(|from| matches_source(*from, from_file, from_rank))
                .filter(|from| board.get_piece(*from).is_some_and(|piece| piece.piece_type == piece_type))
                .collect();
            sources.into_iter().flat_map(|from| legal_moves_from(board, from)).find(|mv| mv.to() == to)
        }
        None => {
            let promotion = match first_char("promotion") {
                Some(letter) => Some(PieceType::try_from(letter).ok()?),
                None => None,
            };
            let en_passant = captures.name("en_passant").is_some();
            let capture = captures.name("capture").is_some() || from_file.is_some_and(|x| x != to.x);

            pawn_move_from_notation(board, team, to, from_file, from_rank, capture, en_passant)
                .map(|mv| match (mv.kind(), promotion) {
                    (MoveKind::Promotion(_), Some(piece_type)) => mv.with_promotion(piece_type),
                    _ => mv,
                })
        }
    }
}

fn pawn_move_from_notation(
    board: &mut Board,
    team: Team,
    to: BoardLocation,
    from_file: Option<i8>,
    from_rank: Option<i8>,
    capture: bool,
    en_passant: bool,
) -> Option<Move> {
    let backwards = -team.pawn_direction();
    let sources = match capture {
        true => vec![to.transpose(-1, backwards), to.transpose(1, backwards)],
        false => vec![to.transpose(0, backwards), to.transpose(0, 2 * backwards)],
    };

    let sources: Vec<BoardLocation> = sources
        .into_iter()
        .filter(|from| matches_source(*from, from_file, from_rank))
        .filter(|from| {
            board.get_piece(*from).is_some_and(|piece| piece.team == team && piece.piece_type == PieceType::Pawn)
        })
        .collect();
    let candidates: Vec<Move> = sources
        .into_iter()
        .flat_map(|from| legal_moves_from(board, from))
        .filter(|mv| mv.to() == to && mv.is_capture() == capture)
        .collect();

    match en_passant {
        true => candidates.iter().find(|mv| mv.kind() == MoveKind::EnPassant).or(candidates.first()).copied(),
        false => candidates.first().copied(),
    }
}

/// Parses a move in coordinate notation (e.g. "e2e4", "e7e8q") and returns the legal move it
/// describes.
///
/// # Errors
/// * `InvalidNotation` - If the text does not have four or five characters
/// * `InvalidFromSquare` / `InvalidToSquare` - If a square is not valid
/// * `InvalidPromotion` - If the promotion letter is not a piece
/// * `NoPieceAtFromSquare` - If no piece of `team` stands on the source square
/// * `IllegalMove` - If the piece cannot legally go to the destination
pub fn parse_coordinate_notation(board: &mut Board, team: Team, notation: &str) -> Result<Move, NotationError> {
    if !notation.is_ascii() || !(4..=5).contains(&notation.len()) {
        return Err(NotationError::InvalidNotation(notation.to_string()));
    }

    let from = BoardLocation::try_from(&notation[0..2]).map_err(NotationError::InvalidFromSquare)?;
    let to = BoardLocation::try_from(&notation[2..4]).map_err(NotationError::InvalidToSquare)?;
    let promotion = match notation[4..].chars().next() {
        Some(c) => Some(PieceType::try_from(c).map_err(NotationError::InvalidPromotion)?),
        None => None,
    };

    if !board.get_piece(from).is_some_and(|piece| piece.team == team) {
        return Err(NotationError::NoPieceAtFromSquare(from));
    }

    let mv = legal_moves_from(board, from)
        .into_iter()
        .find(|mv| mv.to() == to)
        .ok_or_else(|| NotationError::IllegalMove(notation.to_string()))?;

    match (mv.kind(), promotion) {
        (MoveKind::Promotion(_), Some(piece_type)) => Ok(mv.with_promotion(piece_type)),
        (_, Some(_)) => Err(NotationError::IllegalMove(notation.to_string())),
        _ => Ok(mv),
    }
}
