use std::fmt::Display;

use bitflags::bitflags;

use crate::{
    board::Board,
    chess::{BoardLocation, Castling, Move, Piece, PieceType, Team},
};

use super::attacks::is_square_attacked_by_enemy;

bitflags! {
    /// The castling rights of both teams, as listed in the third field of a FEN string.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CastlingRights: u8 {
        const WHITE_KINGSIDE = 0b0001;
        const WHITE_QUEENSIDE = 0b0010;
        const BLACK_KINGSIDE = 0b0100;
        const BLACK_QUEENSIDE = 0b1000;
    }
}

impl CastlingRights {
    /// Returns the right of `team` to castle towards `castling`.
    pub fn new(team: Team, castling: Castling) -> Self {
        match (team, castling) {
            (Team::White, Castling::Kingside) => CastlingRights::WHITE_KINGSIDE,
            (Team::White, Castling::Queenside) => CastlingRights::WHITE_QUEENSIDE,
            (Team::Black, Castling::Kingside) => CastlingRights::BLACK_KINGSIDE,
            (Team::Black, Castling::Queenside) => CastlingRights::BLACK_QUEENSIDE,
        }
    }

    /// Reads the castling field of a FEN string ("KQkq" subset or "-").
    pub fn from_fen_field(field: &str) -> Option<Self> {
        if field == "-" {
            return Some(CastlingRights::empty());
        }

        let mut rights = CastlingRights::empty();
        for c in field.chars() {
            rights |= match c {
                'K' => CastlingRights::WHITE_KINGSIDE,
                'Q' => CastlingRights::WHITE_QUEENSIDE,
                'k' => CastlingRights::BLACK_KINGSIDE,
                'q' => CastlingRights::BLACK_QUEENSIDE,
                _ => return None,
            };
        }
        (!rights.is_empty()).then_some(rights)
    }
}

impl Display for CastlingRights {
    /// Formats the rights as in a FEN string, "-" when no castling is possible.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }

        for (right, c) in [
            (CastlingRights::WHITE_KINGSIDE, 'K'),
            (CastlingRights::WHITE_QUEENSIDE, 'Q'),
            (CastlingRights::BLACK_KINGSIDE, 'k'),
            (CastlingRights::BLACK_QUEENSIDE, 'q'),
        ] {
            if self.contains(right) {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

/// Returns the location of the king of `team` before castling.
pub fn king_home(team: Team) -> BoardLocation {
    BoardLocation::new(4, team.back_rank())
}

/// Returns the location of the rook taking part in the castling of `team` towards `castling`.
pub fn rook_home(team: Team, castling: Castling) -> BoardLocation {
    BoardLocation::new(castling.rook_file(), team.back_rank())
}

// The king and the rook are still on their home squares and have never moved.
fn has_castling_pieces(board: &Board, team: Team, castling: Castling) -> bool {
    let unmoved = |location: BoardLocation, piece_type: PieceType| {
        board
            .get_piece(location)
            .is_some_and(|piece| piece.team == team && piece.piece_type == piece_type && !piece.has_moved)
    };

    unmoved(king_home(team), PieceType::King) && unmoved(rook_home(team, castling), PieceType::Rook)
}

/// Derives the castling rights of both teams from the board.
///
/// A right is listed when the king and the matching rook have never left their home squares. The
/// rights do not depend on whether castling is possible right now.
pub fn castling_rights(board: &Board) -> CastlingRights {
    let mut rights = CastlingRights::empty();
    for team in Team::ALL_TEAMS {
        for castling in [Castling::Kingside, Castling::Queenside] {
            if has_castling_pieces(board, team, castling) {
                rights |= CastlingRights::new(team, castling);
            }
        }
    }
    rights
}

/// Returns the castling move of `king` towards `castling`, if it can be played.
///
/// The king and rook must never have moved, the squares between them must be empty, and the king
/// may not stand on, cross or land on an attacked square.
pub(crate) fn castling_move(board: &Board, from: BoardLocation, king: Piece, castling: Castling) -> Option<Move> {
    let team = king.team;
    if from != king_home(team) || !has_castling_pieces(board, team, castling) {
        return None;
    }

    let rook_file = castling.rook_file();
    let (low, high) = if rook_file < from.x { (rook_file + 1, from.x) } else { (from.x + 1, rook_file) };
    if (low..high).any(|x| board.get_piece(BoardLocation::new(x, from.y)).is_some()) {
        return None;
    }

    let crossed = from.transpose(castling.direction(), 0);
    let destination = from.transpose(2 * castling.direction(), 0);
    if [from, crossed, destination].into_iter().any(|square| is_square_attacked_by_enemy(square, team, board)) {
        return None;
    }

    Some(Move::new_castling(from, destination, king, castling))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rights(fen: &str) -> CastlingRights {
        let (board, _) = Board::from_fen(fen).unwrap();
        castling_rights(&board)
    }

    fn castling(fen: &str, from: BoardLocation, castling: Castling) -> Option<Move> {
        let (board, _) = Board::from_fen(fen).unwrap();
        let king = board.get_piece(from).unwrap();
        castling_move(&board, from, king, castling)
    }

    #[test]
    fn test_rights_display() {
        assert_eq!(format!("{}", CastlingRights::all()), "KQkq");
        assert_eq!(format!("{}", CastlingRights::empty()), "-");
        assert_eq!(format!("{}", CastlingRights::WHITE_QUEENSIDE | CastlingRights::BLACK_KINGSIDE), "Qk");
    }

    #[test]
    fn test_rights_from_fen_field() {
        assert_eq!(CastlingRights::from_fen_field("KQkq"), Some(CastlingRights::all()));
        assert_eq!(CastlingRights::from_fen_field("-"), Some(CastlingRights::empty()));
        assert_eq!(
            CastlingRights::from_fen_field("kQ"),
            Some(CastlingRights::WHITE_QUEENSIDE | CastlingRights::BLACK_KINGSIDE)
        );
        assert_eq!(CastlingRights::from_fen_field("KX"), None);
        assert_eq!(CastlingRights::from_fen_field(""), None);
    }

    #[test]
    fn test_rights_are_derived_from_the_board() {
        assert_eq!(rights("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1"), CastlingRights::all());
        assert_eq!(
            rights("r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1"),
            CastlingRights::WHITE_KINGSIDE | CastlingRights::BLACK_QUEENSIDE
        );
        assert_eq!(rights("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1"), CastlingRights::empty());
        assert_eq!(
            rights("r3k3/8/8/8/8/8/8/4K2R w KQkq - 0 1"),
            CastlingRights::WHITE_KINGSIDE | CastlingRights::BLACK_QUEENSIDE
        );
    }

    #[test]
    fn test_rights_are_lost_when_the_king_moves() {
        let (mut board, _) = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        board.move_piece(BoardLocation::E1, BoardLocation::E2);
        board.move_piece(BoardLocation::H8, BoardLocation::H7);
        board.move_piece(BoardLocation::E2, BoardLocation::E1);
        assert_eq!(castling_rights(&board), CastlingRights::BLACK_QUEENSIDE);

        board.undo_move();
        board.undo_move();
        board.undo_move();
        assert_eq!(castling_rights(&board), CastlingRights::all());
    }

    #[test]
    fn test_castling_needs_empty_squares() {
        let fen = "r3k2r/8/8/8/8/8/8/RN2K1NR w KQkq - 0 1";
        assert!(castling(fen, BoardLocation::E1, Castling::Kingside).is_none());
        assert!(castling(fen, BoardLocation::E1, Castling::Queenside).is_none());

        // Only the squares between the king and the rook matter; b1 is crossed by the rook only.
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let mv = castling(fen, BoardLocation::E1, Castling::Queenside).unwrap();
        assert_eq!(mv.to(), BoardLocation::C1);
    }

    #[test]
    fn test_castling_out_of_through_or_into_check() {
        // In check
        assert!(castling("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1", BoardLocation::E1, Castling::Kingside).is_none());
        // Crossing an attacked square
        assert!(castling("4k3/8/8/8/8/8/5r2/R3K2R w KQ - 0 1", BoardLocation::E1, Castling::Kingside).is_none());
        // Landing on an attacked square
        assert!(castling("4k3/8/8/8/8/8/6r1/R3K2R w KQ - 0 1", BoardLocation::E1, Castling::Kingside).is_none());
        assert!(castling("4k3/8/8/8/8/8/6r1/R3K2R w KQ - 0 1", BoardLocation::E1, Castling::Queenside).is_some());
        // An attacked b1 does not prevent queenside castling
        assert!(castling("4k3/8/8/8/8/8/1r6/R3K2R w KQ - 0 1", BoardLocation::E1, Castling::Queenside).is_some());
    }
}
