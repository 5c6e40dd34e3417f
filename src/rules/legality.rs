use log::trace;

use crate::{
    board::Board,
    chess::{BoardLocation, Move, Piece, Team},
};

use super::{
    attacks::is_king_in_check,
    generation::{pseudo_legal_moves, GenerationOptions},
};

/// Returns true if playing `mv` does not leave the mover's king in check.
///
/// The move is applied on the board and taken back before returning.
pub fn is_legal(board: &mut Board, mv: &Move) -> bool {
    board.make_move(mv);
    let legal = !is_king_in_check(mv.piece().team, board);
    board.undo_move();

    if !legal {
        trace!("Rejecting {} which leaves the {} king in check", mv, mv.piece().team);
    }
    legal
}

/// Returns the moves of `piece` standing on `from`.
///
/// # Parameters
/// * `board` - The position; it is only modified temporarily when `check_for_checks` is set
/// * `from` - The location of the piece
/// * `piece` - The piece standing on `from`
/// * `check_for_checks` - Remove the moves leaving the king of the piece in check
/// * `check_castling` - Include castling moves for kings
pub fn moves_for_piece(
    board: &mut Board,
    from: BoardLocation,
    piece: Piece,
    check_for_checks: bool,
    check_castling: bool,
) -> Vec<Move> {
    let options = if check_castling { GenerationOptions::CASTLING } else { GenerationOptions::empty() };
    let mut moves = pseudo_legal_moves(board, from, piece, options);
    if check_for_checks {
        moves.retain(|mv| is_legal(board, mv));
    }
    moves
}

/// Returns the destinations available to `piece` standing on `location`.
pub fn get_valid_moves(
    location: BoardLocation,
    piece: Piece,
    board: &mut Board,
    check_for_checks: bool,
    check_castling: bool,
) -> Vec<BoardLocation> {
    moves_for_piece(board, location, piece, check_for_checks, check_castling).iter().map(Move::to).collect()
}

/// Returns the legal moves of the piece standing on `from`, or nothing if the square is empty.
pub fn legal_moves_from(board: &mut Board, from: BoardLocation) -> Vec<Move> {
    match board.get_piece(from) {
        Some(piece) => moves_for_piece(board, from, piece, true, true),
        None => Vec::new(),
    }
}

/// Returns the legal moves of every piece of `team`, scanning the board from a1 to h8.
///
/// Pawn moves reaching the last rank appear once, as a promotion to a queen.
pub fn all_legal_moves(board: &mut Board, team: Team) -> Vec<Move> {
    board.locations_of(team).into_iter().flat_map(|from| legal_moves_from(board, from)).collect()
}

/// Returns true if `team` has at least one legal move.
pub fn has_legal_move(board: &mut Board, team: Team) -> bool {
    for from in board.locations_of(team) {
        let Some(piece) = board.get_piece(from) else {
            continue;
        };
        for mv in pseudo_legal_moves(board, from, piece, GenerationOptions::CASTLING) {
            if is_legal(board, &mv) {
                return true;
            }
        }
    }
    false
}

/// Returns true if `team` is in check and has no legal move.
pub fn is_checkmate(team: Team, board: &mut Board) -> bool {
    is_king_in_check(team, board) && !has_legal_move(board, team)
}

/// Returns true if `team` is not in check but has no legal move.
pub fn is_stalemate(team: Team, board: &mut Board) -> bool {
    !is_king_in_check(team, board) && !has_legal_move(board, team)
}
