use log::debug;

use crate::{
    chess::{BoardLocation, Castling, Move, MoveKind, Piece, PieceType, Team},
    fen::{self, FenError},
};

//======================================================================================================================
// Ledger implementation
//======================================================================================================================

/// One entry of the move ledger.
///
/// A record holds everything needed to put the board back the way it was before the move: the
/// moved piece as it was (flags included), the captured piece and where it stood, the rook
/// displaced by castling and the king locations.
#[derive(Debug, Clone, Copy)]
pub struct MoveRecord {
    pub from: BoardLocation,
    pub to: BoardLocation,
    pub moved: Piece,
    pub captured: Option<(BoardLocation, Piece)>,
    pub rook: Option<(BoardLocation, BoardLocation, Piece)>,
    pub kind: MoveKind,
    /// Set when a pawn reached its last rank and no promotion piece has been chosen yet.
    pub promotion_pending: bool,
    white_king: Option<BoardLocation>,
    black_king: Option<BoardLocation>,
}

impl MoveRecord {
    /// Rebuilds the move this record was created from.
    pub fn to_move(&self) -> Move {
        let captured = self.captured.map(|(_, piece)| piece);
        match (self.kind, captured) {
            (MoveKind::Castling(castling), _) => Move::new_castling(self.from, self.to, self.moved, castling),
            (MoveKind::EnPassant, Some(pawn)) => Move::new_en_passant(self.from, self.to, self.moved, pawn),
            (MoveKind::Promotion(piece_type), captured) => {
                Move::new_promotion(self.from, self.to, self.moved, captured, piece_type)
            }
            (_, Some(piece)) => Move::new_capture(self.from, self.to, self.moved, piece),
            (_, None) => Move::new(self.from, self.to, self.moved),
        }
    }
}

//======================================================================================================================
// Board implementation
//======================================================================================================================

/// The mutable chess position.
///
/// The board is a flat array of 64 optional pieces indexed by `rank * 8 + file`, with the king
/// locations cached per team. Every applied move is pushed on a ledger so that it can be undone
/// exactly; the length of the ledger gives the ply used to date pawn double steps.
///
/// The board performs no legality checking. Callers validate moves against the list produced by
/// the rules before applying them.
#[derive(Debug, Clone)]
pub struct Board {
    squares: [Option<Piece>; 64],
    white_king: Option<BoardLocation>,
    black_king: Option<BoardLocation>,
    ledger: Vec<MoveRecord>,
    ply: u32,
}

impl Default for Board {
    fn default() -> Self {
        Self { squares: [None; 64], white_king: None, black_king: None, ledger: Vec::new(), ply: 0 }
    }
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a board holding the given pieces.
    ///
    /// # Parameters
    /// * `pieces` - The content of the 64 slots, indexed by `rank * 8 + file`
    pub fn from_pieces(pieces: [Option<Piece>; 64]) -> Self {
        let mut board = Board::new();
        for (index, piece) in pieces.into_iter().enumerate() {
            if let Some(piece) = piece {
                board.put_piece(BoardLocation::from_index(index), piece);
            }
        }
        board
    }

    /// Creates a board from a FEN string and returns it along with the team to move.
    pub fn from_fen(fen: &str) -> Result<(Self, Team), FenError> {
        fen::board_from_fen(fen)
    }

    /// Replaces the whole state of the board with the position described by `fen`.
    ///
    /// # Returns
    /// * `Ok(team)` - The team to move in the new position
    /// * `Err(FenError)` - If the FEN string is invalid, in which case the board is left untouched
    pub fn reset_board_position(&mut self, fen: &str) -> Result<Team, FenError> {
        let (board, turn) = fen::board_from_fen(fen)?;
        *self = board;
        Ok(turn)
    }

    /// Returns the piece standing on `location`. Locations off the board hold nothing.
    pub fn get_piece(&self, location: BoardLocation) -> Option<Piece> {
        location.index().and_then(|index| self.squares[index])
    }

    /// Places a piece on the board, replacing whatever stood there. Placing a king moves the king
    /// cache of its team to `location`.
    pub fn put_piece(&mut self, location: BoardLocation, piece: Piece) {
        let Some(index) = location.index() else {
            return;
        };

        if let Some(previous) = self.squares[index] {
            self.forget_king(location, previous);
        }
        self.squares[index] = Some(piece);
        if piece.piece_type == PieceType::King {
            match piece.team {
                Team::White => self.white_king = Some(location),
                Team::Black => self.black_king = Some(location),
            }
        }
    }

    /// Removes and returns the piece standing on `location`.
    pub fn remove_piece(&mut self, location: BoardLocation) -> Option<Piece> {
        let index = location.index()?;
        let piece = self.squares[index].take()?;
        self.forget_king(location, piece);
        Some(piece)
    }

    fn forget_king(&mut self, location: BoardLocation, piece: Piece) {
        if piece.piece_type != PieceType::King {
            return;
        }

        let cache = match piece.team {
            Team::White => &mut self.white_king,
            Team::Black => &mut self.black_king,
        };
        if *cache == Some(location) {
            *cache = None;
        }
    }

    /// Returns the cached location of the king of `team`.
    pub fn king_location(&self, team: Team) -> Option<BoardLocation> {
        match team {
            Team::White => self.white_king,
            Team::Black => self.black_king,
        }
    }

    /// Returns every occupied location along with its piece, from a1 to h8.
    pub fn pieces(&self) -> impl Iterator<Item = (BoardLocation, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|piece| (BoardLocation::from_index(index), piece)))
    }

    /// Returns every location occupied by a piece of `team`.
    pub fn locations_of(&self, team: Team) -> Vec<BoardLocation> {
        self.pieces().filter(|(_, piece)| piece.team == team).map(|(location, _)| location).collect()
    }

    /// Returns the number of plies applied since the position was set up.
    pub fn ply(&self) -> u32 {
        self.ply
    }

    /// Returns the most recent applied move.
    pub fn last_move(&self) -> Option<Move> {
        self.ledger.last().map(MoveRecord::to_move)
    }

    /// Returns the square of a pawn waiting for its promotion piece, if any.
    pub fn pending_promotion(&self) -> Option<BoardLocation> {
        self.ledger.last().filter(|record| record.promotion_pending).map(|record| record.to)
    }

    /// Returns true if the piece is a pawn that advanced two squares on the ply just played.
    pub fn is_en_passant_target(&self, piece: Piece) -> bool {
        piece.piece_type == PieceType::Pawn && piece.double_step_ply.is_some_and(|ply| ply == self.ply)
    }

    /// Returns the square passed over by the pawn that advanced two squares on the ply just played.
    pub fn en_passant_target(&self) -> Option<BoardLocation> {
        self.pieces()
            .find(|(_, piece)| self.is_en_passant_target(*piece))
            .map(|(location, piece)| location.transpose(0, -piece.team.pawn_direction()))
    }

    /// Marks the pawn on `location` as having advanced two squares on the current ply.
    pub(crate) fn stamp_double_step(&mut self, location: BoardLocation) {
        let ply = self.ply;
        if let Some(Some(pawn)) = location.index().map(|index| self.squares[index].as_mut()) {
            pawn.double_step_ply = Some(ply);
        }
    }

    /// Moves the piece on `from` to `to` and pushes the move on the ledger.
    ///
    /// Besides the slot transfer, this handles the side effects of the special moves:
    /// * a king moving two files takes the matching rook along (castling)
    /// * a pawn advancing two ranks is stamped with the new ply
    /// * a pawn moving diagonally to an empty square removes the enemy pawn beside it, if that pawn
    ///   advanced two squares on the previous ply (en passant)
    /// * a pawn reaching its last rank is flagged as waiting for a promotion piece
    ///
    /// Nothing happens when `from` is empty.
    pub fn move_piece(&mut self, from: BoardLocation, to: BoardLocation) {
        let Some(piece) = self.get_piece(from) else {
            debug!("Ignoring a move from the empty square {}", from);
            return;
        };

        let mut record = MoveRecord {
            from,
            to,
            moved: piece,
            captured: self.get_piece(to).map(|captured| (to, captured)),
            rook: None,
            kind: MoveKind::Normal,
            promotion_pending: false,
            white_king: self.white_king,
            black_king: self.black_king,
        };

        match piece.piece_type {
            PieceType::Pawn if record.captured.is_none() && from.x != to.x => {
                let beside = BoardLocation::new(to.x, from.y);
                if let Some(victim) = self.get_piece(beside) {
                    if victim.team != piece.team && self.is_en_passant_target(victim) {
                        self.remove_piece(beside);
                        record.captured = Some((beside, victim));
                        record.kind = MoveKind::EnPassant;
                    }
                }
            }
            PieceType::King if (to.x - from.x).abs() == 2 => {
                let castling = if to.x > from.x { Castling::Kingside } else { Castling::Queenside };
                let rook_from = BoardLocation::new(castling.rook_file(), from.y);
                let rook_to = from.transpose(castling.direction(), 0);
                if let Some(rook) = self.remove_piece(rook_from) {
                    self.put_piece(rook_to, Piece { has_moved: true, ..rook });
                    record.rook = Some((rook_from, rook_to, rook));
                }
                record.kind = MoveKind::Castling(castling);
            }
            _ => {}
        }

        self.ply += 1;

        let mut moved = Piece { has_moved: true, ..piece };
        if piece.piece_type == PieceType::Pawn {
            if (to.y - from.y).abs() == 2 {
                moved.double_step_ply = Some(self.ply);
            }
            record.promotion_pending = to.y == piece.team.promotion_rank();
        }

        self.remove_piece(from);
        self.put_piece(to, moved);
        self.ledger.push(record);
    }

    /// Applies a move, including the promotion piece it carries.
    pub fn make_move(&mut self, mv: &Move) {
        self.move_piece(mv.from(), mv.to());
        if let Some(piece_type) = mv.promotion() {
            self.promote_pawn(piece_type);
        }
    }

    /// Replaces the pawn waiting for its promotion with a piece of `piece_type`.
    ///
    /// # Returns
    /// * `true` if a pending promotion was resolved
    /// * `false` if the last move did not leave a pawn waiting for promotion
    pub fn promote_pawn(&mut self, piece_type: PieceType) -> bool {
        let Some(record) = self.ledger.last_mut().filter(|record| record.promotion_pending) else {
            return false;
        };

        record.promotion_pending = false;
        record.kind = MoveKind::Promotion(piece_type);
        let location = record.to;
        let team = record.moved.team;
        self.put_piece(location, Piece { has_moved: true, ..Piece::new(team, piece_type) });
        true
    }

    /// Reverts the most recent move on the ledger.
    ///
    /// # Returns
    /// * `Some(record)` - The ledger entry that was undone
    /// * `None` - If there was nothing to undo, in which case the board is unchanged
    pub fn undo_move(&mut self) -> Option<MoveRecord> {
        let record = self.ledger.pop()?;

        self.squares[slot(record.to)] = None;
        if let Some((rook_from, rook_to, rook)) = record.rook {
            self.squares[slot(rook_to)] = None;
            self.squares[slot(rook_from)] = Some(rook);
        }
        if let Some((location, captured)) = record.captured {
            self.squares[slot(location)] = Some(captured);
        }
        self.squares[slot(record.from)] = Some(record.moved);

        self.white_king = record.white_king;
        self.black_king = record.black_king;
        self.ply -= 1;

        Some(record)
    }

    /// Returns a compact string representation of the board.
    ///
    /// ```text
    /// 8  r n b q k b n r
    /// 7  p p p p p p p p
    /// 6  . . . . . . . .
    /// 5  . . . . . . . .
    /// 4  . . . . . . . .
    /// 3  . . . . . . . .
    /// 2  P P P P P P P P
    /// 1  R N B Q K B N R
    ///    a b c d e f g h
    /// ```
    pub fn to_compact_string(&self) -> String {
        let mut board = String::with_capacity(171);
        for y in (0..8).rev() {
            board.push_str(&format!("{}  ", y + 1));
            for x in 0..8 {
                match self.get_piece(BoardLocation::new(x, y)) {
                    Some(piece) => board.push(piece.symbol()),
                    None => board.push('.'),
                }
                board.push(if x == 7 { '\n' } else { ' ' });
            }
        }
        board.push_str("   a b c d e f g h");

        board
    }
}

// Ledger entries only ever hold locations that were on the board.
fn slot(location: BoardLocation) -> usize {
    (location.y as usize) * 8 + location.x as usize
}
