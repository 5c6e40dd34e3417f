mod location;
mod r#move;
mod piece;

pub use location::{BoardLocation, LocationError};
pub use piece::{Piece, PieceError, PieceType, Team};
pub use r#move::{Castling, Move, MoveKind};
