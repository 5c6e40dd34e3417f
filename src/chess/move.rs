use std::fmt::Display;

use super::{BoardLocation, Piece, PieceType};

// Both sides a king can castle towards.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Castling {
    Kingside,
    Queenside,
}

impl Castling {
    /// Returns the file of the rook taking part in the castling.
    pub fn rook_file(&self) -> i8 {
        match self {
            Castling::Kingside => 7,
            Castling::Queenside => 0,
        }
    }

    /// Returns the file increment of the king while castling.
    pub fn direction(&self) -> i8 {
        match self {
            Castling::Kingside => 1,
            Castling::Queenside => -1,
        }
    }

    /// Returns the castling notation ("O-O" or "O-O-O").
    pub fn notation(&self) -> &'static str {
        match self {
            Castling::Kingside => "O-O",
            Castling::Queenside => "O-O-O",
        }
    }
}

// The special-move families a move can belong to. A capture is recorded separately, so a
// promotion can also be a capture.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum MoveKind {
    Normal,
    Castling(Castling),
    EnPassant,
    Promotion(PieceType),
}

// A single ply: the piece that moves, where it goes and what it takes.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Move {
    from: BoardLocation,
    to: BoardLocation,
    piece: Piece,
    captured: Option<Piece>,
    kind: MoveKind,
}

impl Move {
    /// Creates a move that is neither a capture nor a special move.
    pub fn new(from: BoardLocation, to: BoardLocation, piece: Piece) -> Self {
        Self { from, to, piece, captured: None, kind: MoveKind::Normal }
    }

    /// Creates a move capturing `captured` on the destination square.
    pub fn new_capture(from: BoardLocation, to: BoardLocation, piece: Piece, captured: Piece) -> Self {
        Self { from, to, piece, captured: Some(captured), kind: MoveKind::Normal }
    }

    /// Creates a pawn move reaching the last rank, with an optional capture.
    pub fn new_promotion(
        from: BoardLocation,
        to: BoardLocation,
        piece: Piece,
        captured: Option<Piece>,
        promotion: PieceType,
    ) -> Self {
        Self { from, to, piece, captured, kind: MoveKind::Promotion(promotion) }
    }

    /// Creates an en passant capture. `captured` is the pawn taken beside the origin square.
    pub fn new_en_passant(from: BoardLocation, to: BoardLocation, piece: Piece, captured: Piece) -> Self {
        Self { from, to, piece, captured: Some(captured), kind: MoveKind::EnPassant }
    }

    /// Creates a castling move, described by the king's displacement.
    pub fn new_castling(from: BoardLocation, to: BoardLocation, piece: Piece, castling: Castling) -> Self {
        Self { from, to, piece, captured: None, kind: MoveKind::Castling(castling) }
    }

    pub fn from(&self) -> BoardLocation {
        self.from
    }

    pub fn to(&self) -> BoardLocation {
        self.to
    }

    pub fn piece(&self) -> Piece {
        self.piece
    }

    pub fn captured(&self) -> Option<Piece> {
        self.captured
    }

    pub fn kind(&self) -> MoveKind {
        self.kind
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Returns the piece type chosen for a promotion.
    pub fn promotion(&self) -> Option<PieceType> {
        match self.kind {
            MoveKind::Promotion(piece_type) => Some(piece_type),
            _ => None,
        }
    }

    /// Returns a copy of this promotion move promoting to `piece_type` instead.
    pub fn with_promotion(&self, piece_type: PieceType) -> Self {
        debug_assert!(self.promotion().is_some());
        Self { kind: MoveKind::Promotion(piece_type), ..*self }
    }

    /// Returns the move in coordinate notation (e.g. "e2e4" or "a7a8q").
    pub fn to_coordinate_string(&self) -> String {
        match self.promotion() {
            Some(piece_type) => {
                format!("{}{}{}", self.from, self.to, char::from(piece_type).to_ascii_lowercase())
            }
            None => format!("{}{}", self.from, self.to),
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_coordinate_string())
    }
}
