use crate::{
    board::Board,
    chess::{BoardLocation, MoveKind, Piece, PieceType, Team},
};

use super::generation::{for_each_pseudo_legal_move, GenerationOptions};

/// Returns true if a piece of the team opposing `friendly_team` attacks `square`.
///
/// For every piece type, the moves of an imaginary friendly piece of that type standing on
/// `square` are generated. The square is attacked when one of those moves lands on an enemy piece
/// of the same type: a knight on `square` reaching an enemy knight means that knight reaches
/// `square` as well, and the same holds for every other piece type, pawns included since their
/// captures are mirrored by team. En passant captures are ignored since they do not land on the
/// captured pawn.
///
/// # Parameters
/// * `square` - The square to examine, which may be empty
/// * `friendly_team` - The team defending the square
/// * `board` - The position
pub fn is_square_attacked_by_enemy(square: BoardLocation, friendly_team: Team, board: &Board) -> bool {
    PieceType::ALL_PIECE_TYPES.into_iter().any(|piece_type| {
        let mut attacked = false;
        let probe = Piece::new(friendly_team, piece_type);
        for_each_pseudo_legal_move(board, square, probe, GenerationOptions::empty(), &mut |mv| {
            attacked |= mv.kind() != MoveKind::EnPassant
                && mv.captured().is_some_and(|captured| captured.piece_type == piece_type);
        });
        attacked
    })
}

/// Returns true if the king of `team` is attacked. A team without a king is never in check.
pub fn is_king_in_check(team: Team, board: &Board) -> bool {
    board.king_location(team).is_some_and(|king| is_square_attacked_by_enemy(king, team, board))
}
