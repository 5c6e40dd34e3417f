use bitflags::bitflags;

use crate::{
    board::Board,
    chess::{BoardLocation, Castling, Move, Piece, PieceType},
};

use super::castling::castling_move;

bitflags! {
    /// Options of the pseudo-legal move generator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GenerationOptions: u8 {
        /// Also produce moves landing on friendly pieces, as if they could be captured.
        const INCLUDE_FRIENDLY = 0b01;
        /// Produce castling moves for kings.
        const CASTLING = 0b10;
    }
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
const KING_OFFSETS: [(i8, i8); 8] = [(0, 1), (1, 1), (1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (-1, 1)];
const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// Calls `add_move` for every pseudo-legal move of `piece` standing on `from`.
///
/// `piece` does not have to be on `from`: the attack detection places imaginary pieces on the
/// square it examines. The generated moves are not checked for leaving the king in check.
pub(crate) fn for_each_pseudo_legal_move(
    board: &Board,
    from: BoardLocation,
    piece: Piece,
    options: GenerationOptions,
    add_move: &mut dyn FnMut(Move),
) {
    match piece.piece_type {
        PieceType::Pawn => generate_pawn_moves(board, from, piece, options, add_move),
        PieceType::Knight => generate_step_moves(board, from, piece, &KNIGHT_OFFSETS, options, add_move),
        PieceType::Bishop => generate_slider_moves(board, from, piece, &BISHOP_DIRECTIONS, options, add_move),
        PieceType::Rook => generate_slider_moves(board, from, piece, &ROOK_DIRECTIONS, options, add_move),
        PieceType::Queen => {
            generate_slider_moves(board, from, piece, &ROOK_DIRECTIONS, options, add_move);
            generate_slider_moves(board, from, piece, &BISHOP_DIRECTIONS, options, add_move);
        }
        PieceType::King => {
            generate_step_moves(board, from, piece, &KING_OFFSETS, options, add_move);
            if options.contains(GenerationOptions::CASTLING) {
                for castling in [Castling::Kingside, Castling::Queenside] {
                    if let Some(mv) = castling_move(board, from, piece, castling) {
                        add_move(mv);
                    }
                }
            }
        }
    }
}

/// Returns every pseudo-legal move of `piece` standing on `from`.
pub fn pseudo_legal_moves(board: &Board, from: BoardLocation, piece: Piece, options: GenerationOptions) -> Vec<Move> {
    let mut moves = Vec::new();
    for_each_pseudo_legal_move(board, from, piece, options, &mut |mv| moves.push(mv));
    moves
}

// Adds the move to `to` unless it is off the board or blocked by a friend. Returns true when `to`
// is empty so that sliders can keep going.
fn try_add_move(
    board: &Board,
    from: BoardLocation,
    to: BoardLocation,
    piece: Piece,
    options: GenerationOptions,
    add_move: &mut dyn FnMut(Move),
) -> bool {
    if !to.is_in_bounds() {
        return false;
    }

    match board.get_piece(to) {
        None => {
            add_move(Move::new(from, to, piece));
            true
        }
        Some(other) if other.team != piece.team => {
            add_move(Move::new_capture(from, to, piece, other));
            false
        }
        Some(other) => {
            if options.contains(GenerationOptions::INCLUDE_FRIENDLY) {
                add_move(Move::new_capture(from, to, piece, other));
            }
            false
        }
    }
}

fn generate_slider_moves(
    board: &Board,
    from: BoardLocation,
    piece: Piece,
    directions: &[(i8, i8)],
    options: GenerationOptions,
    add_move: &mut dyn FnMut(Move),
) {
    for &(dx, dy) in directions {
        let mut to = from.transpose(dx, dy);
        while try_add_move(board, from, to, piece, options, add_move) {
            to = to.transpose(dx, dy);
        }
    }
}

fn generate_step_moves(
    board: &Board,
    from: BoardLocation,
    piece: Piece,
    offsets: &[(i8, i8)],
    options: GenerationOptions,
    add_move: &mut dyn FnMut(Move),
) {
    for &(dx, dy) in offsets {
        try_add_move(board, from, from.transpose(dx, dy), piece, options, add_move);
    }
}

fn generate_pawn_moves(
    board: &Board,
    from: BoardLocation,
    pawn: Piece,
    options: GenerationOptions,
    add_move: &mut dyn FnMut(Move),
) {
    let team = pawn.team;
    let direction = team.pawn_direction();

    // Moves landing on the last rank are flagged as promotions to a queen; callers expand them.
    let pawn_move = |to: BoardLocation, captured: Option<Piece>| {
        if to.y == team.promotion_rank() {
            Move::new_promotion(from, to, pawn, captured, PieceType::Queen)
        } else {
            match captured {
                Some(captured) => Move::new_capture(from, to, pawn, captured),
                None => Move::new(from, to, pawn),
            }
        }
    };

    let one_step = from.transpose(0, direction);
    if one_step.is_in_bounds() && board.get_piece(one_step).is_none() {
        add_move(pawn_move(one_step, None));

        let two_steps = one_step.transpose(0, direction);
        if from.y == team.pawn_home_rank() && board.get_piece(two_steps).is_none() {
            add_move(pawn_move(two_steps, None));
        }
    }

    for dx in [-1, 1] {
        let to = from.transpose(dx, direction);
        if !to.is_in_bounds() {
            continue;
        }

        match board.get_piece(to) {
            Some(other) if other.team != team => add_move(pawn_move(to, Some(other))),
            Some(other) if options.contains(GenerationOptions::INCLUDE_FRIENDLY) => {
                add_move(pawn_move(to, Some(other)))
            }
            Some(_) => {}
            None if from.y == team.en_passant_rank() => {
                let beside = from.transpose(dx, 0);
                if let Some(victim) = board.get_piece(beside) {
                    if victim.team != team && board.is_en_passant_target(victim) {
                        add_move(Move::new_en_passant(from, to, pawn, victim));
                    }
                }
            }
            None => {}
        }
    }
}
