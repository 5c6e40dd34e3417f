use log::debug;
use thiserror::Error;

use crate::{
    board::Board,
    chess::{BoardLocation, Castling, Piece, PieceType, Team},
    rules::{castling_rights, king_home, rook_home, CastlingRights},
};

/// The FEN string of the initial position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Error type for parsing a FEN (Forsyth-Edwards Notation) string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("The FEN string has no piece placement field")]
    MissingField,
    #[error("Invalid piece symbol '{0}'")]
    InvalidPieceSymbol(char),
    #[error("Invalid piece placement \"{0}\"")]
    InvalidPiecePlacement(String),
    #[error("Invalid active color \"{0}\"")]
    InvalidActiveColor(String),
    #[error("Invalid castling availability \"{0}\"")]
    InvalidCastlingAvailability(String),
    #[error("Invalid en passant square \"{0}\"")]
    InvalidEnPassantSquare(String),
    #[error("Invalid halfmove clock")]
    InvalidHalfmoveClock,
    #[error("Invalid fullmove number")]
    InvalidFullmoveNumber,
}

/// The content of a FEN string, before it is turned into a [`Board`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenPosition {
    /// The content of the 64 slots, indexed by `rank * 8 + file`. The `has_moved` flags are
    /// already seeded from the castling availability.
    pub pieces: [Option<Piece>; 64],
    pub turn: Team,
    pub castling: CastlingRights,
    /// The square passed over by the pawn that just advanced two squares.
    pub en_passant: Option<BoardLocation>,
}

//======================================================================================================================
// FEN reading
//======================================================================================================================

fn read_piece_placement(piece_placement: &str) -> Result<[Option<Piece>; 64], FenError> {
    let invalid = || FenError::InvalidPiecePlacement(piece_placement.to_string());

    let ranks: Vec<&str> = piece_placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(invalid());
    }

    let mut pieces = [None; 64];
    for (rank_number, rank) in ranks.into_iter().enumerate() {
        let y = 7 - rank_number as i8;
        let mut x = 0i8;
        for c in rank.chars() {
            if let Some(run) = c.to_digit(10) {
                if !(1..=8).contains(&run) || x + run as i8 > 8 {
                    return Err(invalid());
                }
                x += run as i8;
                continue;
            }

            let piece = Piece::try_from(c).map_err(|_| FenError::InvalidPieceSymbol(c))?;
            let index = BoardLocation::new(x, y).index().ok_or_else(invalid)?;
            pieces[index] = Some(piece);
            x += 1;
        }

        if x != 8 {
            return Err(invalid());
        }
    }

    Ok(pieces)
}

fn read_active_color(active_color: &str) -> Result<Team, FenError> {
    match active_color {
        "w" => Ok(Team::White),
        "b" => Ok(Team::Black),
        _ => Err(FenError::InvalidActiveColor(active_color.to_string())),
    }
}

// The square must be the one passed over by a pawn of the team that just moved.
fn read_en_passant_square(en_passant_square: &str, turn: Team) -> Result<Option<BoardLocation>, FenError> {
    if en_passant_square == "-" {
        return Ok(None);
    }

    let invalid = || FenError::InvalidEnPassantSquare(en_passant_square.to_string());
    let square = BoardLocation::try_from(en_passant_square).map_err(|_| invalid())?;
    let mover = turn.opposite();
    if square.y != mover.pawn_home_rank() + mover.pawn_direction() {
        return Err(invalid());
    }
    Ok(Some(square))
}

// A king or rook keeps its castling ability only when it stands on its home square and a matching
// right is listed. Pawns standing off their home rank have necessarily moved.
fn seed_has_moved(pieces: &mut [Option<Piece>; 64], castling: CastlingRights) {
    for (index, slot) in pieces.iter_mut().enumerate() {
        let Some(piece) = slot else {
            continue;
        };
        let location = BoardLocation::from_index(index);
        let team = piece.team;

        piece.has_moved = match piece.piece_type {
            PieceType::Pawn => location.y != team.pawn_home_rank(),
            PieceType::King => {
                location != king_home(team)
                    || !castling.intersects(
                        CastlingRights::new(team, Castling::Kingside) | CastlingRights::new(team, Castling::Queenside),
                    )
            }
            PieceType::Rook => ![Castling::Kingside, Castling::Queenside]
                .into_iter()
                .any(|side| location == rook_home(team, side) && castling.contains(CastlingRights::new(team, side))),
            _ => false,
        };
    }
}

/// Reads a FEN string.
///
/// Only the piece placement is mandatory: a missing active color means White to move, and missing
/// castling or en passant fields mean none. The halfmove clock and fullmove number are validated
/// when present but otherwise ignored.
///
/// # Parameters
/// * `fen` - A string containing the FEN representation of a chess position.
///
/// # Returns
/// * `Ok(FenPosition)` - The parsed position
/// * `Err(FenError)` - The first problem found in the string
pub fn generate_position_from_fen(fen: &str) -> Result<FenPosition, FenError> {
    let mut fields = fen.split_whitespace();

    let mut pieces = read_piece_placement(fields.next().ok_or(FenError::MissingField)?)?;
    let turn = fields.next().map_or(Ok(Team::White), read_active_color)?;
    let castling = match fields.next() {
        Some(field) => CastlingRights::from_fen_field(field)
            .ok_or_else(|| FenError::InvalidCastlingAvailability(field.to_string()))?,
        None => CastlingRights::empty(),
    };
    let en_passant = fields.next().map_or(Ok(None), |field| read_en_passant_square(field, turn))?;

    if let Some(halfmove_clock) = fields.next() {
        halfmove_clock.parse::<u16>().map_err(|_| FenError::InvalidHalfmoveClock)?;
    }
    if let Some(fullmove_number) = fields.next() {
        fullmove_number.parse::<u16>().map_err(|_| FenError::InvalidFullmoveNumber)?;
    }

    seed_has_moved(&mut pieces, castling);

    Ok(FenPosition { pieces, turn, castling, en_passant })
}

/// Builds a board from a FEN string and returns it along with the team to move.
///
/// The pawn standing behind the en passant square is stamped as having double-stepped on the
/// current ply, so that it can be captured on the next move.
pub fn board_from_fen(fen: &str) -> Result<(Board, Team), FenError> {
    let position = generate_position_from_fen(fen)?;
    let mut board = Board::from_pieces(position.pieces);

    if let Some(square) = position.en_passant {
        let team = position.turn.opposite();
        let pawn_location = square.transpose(0, team.pawn_direction());
        match board.get_piece(pawn_location) {
            Some(pawn) if pawn.team == team && pawn.piece_type == PieceType::Pawn => {
                board.stamp_double_step(pawn_location)
            }
            _ => return Err(FenError::InvalidEnPassantSquare(square.to_string())),
        }
    }

    debug!("Loaded \"{}\" with {} to move", fen, position.turn);
    Ok((board, position.turn))
}

//======================================================================================================================
// FEN writing
//======================================================================================================================

fn write_piece_placement(board: &Board) -> String {
    let mut placement = String::with_capacity(71);
    for y in (0..8).rev() {
        let mut empty = 0;
        for x in 0..8 {
            match board.get_piece(BoardLocation::new(x, y)) {
                Some(piece) => {
                    if empty > 0 {
                        placement.push_str(&empty.to_string());
                        empty = 0;
                    }
                    placement.push(piece.symbol());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            placement.push_str(&empty.to_string());
        }
        if y > 0 {
            placement.push('/');
        }
    }
    placement
}

/// Writes the FEN string of a position.
///
/// The castling field is derived from the board and the en passant field from the pawn that
/// advanced two squares on the last ply. The halfmove clock and fullmove number are not tracked
/// and are always written as `0 1`.
pub fn generate_fen_from_position(board: &Board, turn: Team) -> String {
    let active_color = match turn {
        Team::White => 'w',
        Team::Black => 'b',
    };
    let en_passant = board.en_passant_target().map_or_else(|| "-".to_string(), |square| square.to_string());

    format!("{} {} {} {} 0 1", write_piece_placement(board), active_color, castling_rights(board), en_passant)
}
