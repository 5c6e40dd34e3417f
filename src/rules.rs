//! Move generation and the rules of the game.
//!
//! Generation works in two steps: [`pseudo_legal_moves`] lists what a piece can do following its
//! movement pattern, and the legality filter removes the moves leaving the mover's king attacked.

mod attacks;
mod castling;
mod generation;
mod legality;

pub use attacks::{is_king_in_check, is_square_attacked_by_enemy};
pub use castling::{castling_rights, king_home, rook_home, CastlingRights};
pub use generation::{pseudo_legal_moves, GenerationOptions};
pub use legality::{
    all_legal_moves, get_valid_moves, has_legal_move, is_checkmate, is_legal, is_stalemate, legal_moves_from,
    moves_for_piece,
};
