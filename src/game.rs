use std::fmt::Display;

use log::{debug, info};
use thiserror::Error;

use crate::{
    bitboard::PieceBitboards,
    board::Board,
    chess::{BoardLocation, Move, MoveKind, PieceType, Team},
    fen::{generate_fen_from_position, FenError, STARTING_FEN},
    notation::{get_move_from_parsed_move, get_parsed_move, parse_coordinate_notation, NotationError},
    perft::play_moves,
    rules::{all_legal_moves, is_checkmate, is_stalemate},
};

/// Errors returned by the [`GameState`] operations. None of them modifies the game.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("The game is over: {0}")]
    GameOver(GameOutcome),

    #[error("A promotion piece must be chosen for the pawn on {0}")]
    PromotionPending(BoardLocation),

    #[error("Illegal move from {from} to {to}")]
    IllegalMove { from: BoardLocation, to: BoardLocation },

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Invalid move: {0}")]
    InvalidCoordinates(#[from] NotationError),

    #[error("There is no move to undo")]
    NothingToUndo,

    #[error("There is no pawn waiting for a promotion")]
    NoPendingPromotion,

    #[error("{0} is not a piece a pawn can promote to")]
    InvalidPromotion(PieceType),

    #[error(transparent)]
    InvalidFen(#[from] FenError),
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Checkmate { winner: Team },
    Stalemate,
}

impl Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOutcome::Checkmate { winner } => write!(f, "checkmate, {} wins", winner),
            GameOutcome::Stalemate => write!(f, "stalemate"),
        }
    }
}

/// A move played in the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mv: Move,
    /// The algebraic notation of the move, computed before it was played.
    pub san: String,
    /// The position after the move.
    pub fen: String,
}

/// A game in progress: the board, whose turn it is, and everything derived from them.
///
/// Every move goes through the list of legal moves before reaching the board. After each change,
/// the legal moves, the outcome and the controlled squares are recomputed.
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    turn: Team,
    pending_promotion: Option<Move>,
    outcome: Option<GameOutcome>,
    history: Vec<HistoryEntry>,
    legal_moves: Vec<Move>,
    bitboards: PieceBitboards,
}

impl GameState {
    /// Creates a game from the initial position.
    pub fn new() -> Self {
        let (board, turn) = Self::starting_board();
        Self::from_board(board, turn)
    }

    fn starting_board() -> (Board, Team) {
        Board::from_fen(STARTING_FEN)
            .expect("This can not fail because the STARTING_FEN is always parsed successfully.")
    }

    /// Creates a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let (board, turn) = Board::from_fen(fen)?;
        Ok(Self::from_board(board, turn))
    }

    fn from_board(board: Board, turn: Team) -> Self {
        let bitboards = PieceBitboards::new(&board);
        let mut game = Self {
            board,
            turn,
            pending_promotion: None,
            outcome: None,
            history: Vec::new(),
            legal_moves: Vec::new(),
            bitboards,
        };
        game.update();
        game
    }

    /// Replaces the game with the position described by `fen`. On error the game is unchanged.
    pub fn reset(&mut self, fen: &str) -> Result<(), GameError> {
        *self = Self::from_fen(fen)?;
        info!("New game from \"{}\"", fen);
        Ok(())
    }

    fn update(&mut self) {
        self.legal_moves = all_legal_moves(&mut self.board, self.turn);
        self.outcome = if is_checkmate(self.turn, &mut self.board) {
            Some(GameOutcome::Checkmate { winner: self.turn.opposite() })
        } else if is_stalemate(self.turn, &mut self.board) {
            Some(GameOutcome::Stalemate)
        } else {
            None
        };
        self.bitboards.refresh(&self.board);

        if let Some(outcome) = self.outcome {
            info!("Game over: {}", outcome);
        }
    }

    fn check_can_move(&self) -> Result<(), GameError> {
        if let Some(outcome) = self.outcome {
            return Err(GameError::GameOver(outcome));
        }
        if let Some(pending) = self.pending_promotion {
            return Err(GameError::PromotionPending(pending.to()));
        }
        Ok(())
    }

    fn apply(&mut self, mv: Move) {
        let san = get_parsed_move(&mut self.board, &mv);
        self.board.make_move(&mv);
        self.turn = self.turn.opposite();
        let fen = generate_fen_from_position(&self.board, self.turn);

        debug!("{} played {} ({})", self.turn.opposite(), san, mv);
        self.history.push(HistoryEntry { mv, san, fen });
        self.update();
    }

    /// Moves the piece on `from` to `to`, the way a player drags a piece.
    ///
    /// When a pawn reaches its last rank, it is moved but the turn does not pass: the game waits
    /// for [`GameState::promote_pawn`] and rejects any other move until then.
    pub fn play(&mut self, from: BoardLocation, to: BoardLocation) -> Result<(), GameError> {
        self.check_can_move()?;

        let mv = self
            .legal_moves
            .iter()
            .find(|mv| mv.from() == from && mv.to() == to)
            .copied()
            .ok_or(GameError::IllegalMove { from, to })?;

        if let MoveKind::Promotion(_) = mv.kind() {
            self.board.move_piece(from, to);
            self.pending_promotion = Some(mv);
            debug!("Waiting for the promotion piece of the pawn on {}", to);
            return Ok(());
        }

        self.apply(mv);
        Ok(())
    }

    /// Plays a move, including the promotion piece it carries.
    pub fn play_move(&mut self, mv: &Move) -> Result<(), GameError> {
        self.check_can_move()?;

        let legal = self.legal_moves.iter().any(|legal| match (legal.kind(), mv.kind()) {
            (MoveKind::Promotion(_), MoveKind::Promotion(piece_type)) => {
                PieceType::PROMOTION_TYPES.contains(&piece_type) && legal.with_promotion(piece_type) == *mv
            }
            _ => legal == mv,
        });
        if !legal {
            return Err(GameError::IllegalMove { from: mv.from(), to: mv.to() });
        }

        self.apply(*mv);
        Ok(())
    }

    /// Plays a move given in algebraic notation.
    pub fn play_san(&mut self, text: &str) -> Result<(), GameError> {
        self.check_can_move()?;

        let mv = get_move_from_parsed_move(&mut self.board, self.turn, text)
            .ok_or_else(|| GameError::InvalidMove(text.to_string()))?;
        self.play_move(&mv)
    }

    /// Plays a move given in coordinate notation ("e2e4", "a7a8n").
    pub fn play_coordinates(&mut self, text: &str) -> Result<(), GameError> {
        self.check_can_move()?;

        let mv = parse_coordinate_notation(&mut self.board, self.turn, text)?;
        self.play_move(&mv)
    }

    /// Chooses the piece for the pawn waiting for its promotion.
    pub fn promote_pawn(&mut self, piece_type: PieceType) -> Result<(), GameError> {
        let pending = self.pending_promotion.ok_or(GameError::NoPendingPromotion)?;
        if !PieceType::PROMOTION_TYPES.contains(&piece_type) {
            return Err(GameError::InvalidPromotion(piece_type));
        }

        self.pending_promotion = None;
        self.board.undo_move();
        self.play_move(&pending.with_promotion(piece_type))
    }

    /// Takes back the last move. A pawn waiting for its promotion piece goes back first.
    pub fn undo(&mut self) -> Result<(), GameError> {
        if self.pending_promotion.take().is_some() {
            self.board.undo_move();
            return Ok(());
        }

        let entry = self.history.pop().ok_or(GameError::NothingToUndo)?;
        self.board.undo_move();
        self.turn = self.turn.opposite();

        debug!("Took back {}", entry.san);
        self.update();
        Ok(())
    }

    /// Returns the FEN string of the current position.
    pub fn to_fen(&self) -> String {
        generate_fen_from_position(&self.board, self.turn)
    }

    /// Counts the leaf nodes of the move tree of depth `depth` below the current position.
    pub fn perft(&mut self, depth: u16) -> u64 {
        play_moves(&mut self.board, depth, self.turn, false)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Team {
        self.turn
    }

    pub fn legal_moves(&self) -> &[Move] {
        &self.legal_moves
    }

    /// Returns the legal moves of the piece on `from`.
    pub fn legal_moves_from(&self, from: BoardLocation) -> impl Iterator<Item = &Move> + '_ {
        self.legal_moves.iter().filter(move |mv| mv.from() == from)
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Returns the square of the pawn waiting for its promotion piece.
    pub fn pending_promotion(&self) -> Option<BoardLocation> {
        self.pending_promotion.map(|mv| mv.to())
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn bitboards(&self) -> &PieceBitboards {
        &self.bitboards
    }

    /// Returns the algebraic notation of every legal move, in the order of [`GameState::legal_moves`].
    pub fn legal_moves_san(&mut self) -> Vec<String> {
        let moves = self.legal_moves.clone();
        moves.iter().map(|mv| get_parsed_move(&mut self.board, mv)).collect()
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game() {
        let game = GameState::new();
        assert_eq!(game.turn(), Team::White);
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.outcome(), None);
        assert_eq!(game.to_fen(), STARTING_FEN);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_play_and_undo() {
        let mut game = GameState::new();
        game.play(BoardLocation::E2, BoardLocation::E4).unwrap();
        game.play_san("e5").unwrap();
        game.play_san("Nf3").unwrap();

        assert_eq!(game.turn(), Team::Black);
        let sans: Vec<&str> = game.history().iter().map(|entry| entry.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3"]);
        assert_eq!(game.history()[0].fen, "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");

        game.undo().unwrap();
        game.undo().unwrap();
        game.undo().unwrap();
        assert_eq!(game.to_fen(), STARTING_FEN);
        assert_eq!(game.undo(), Err(GameError::NothingToUndo));
    }

    #[test]
    fn test_illegal_moves_are_rejected() {
        let mut game = GameState::new();
        assert_eq!(
            game.play(BoardLocation::E2, BoardLocation::E5),
            Err(GameError::IllegalMove { from: BoardLocation::E2, to: BoardLocation::E5 })
        );
        assert_eq!(game.play_san("Ke2"), Err(GameError::InvalidMove("Ke2".to_string())));
        assert_eq!(game.play_san("garbage"), Err(GameError::InvalidMove("garbage".to_string())));
        assert!(matches!(game.play_coordinates("e2e5"), Err(GameError::InvalidCoordinates(_))));
        assert_eq!(game.to_fen(), STARTING_FEN);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_checkmate_ends_the_game() {
        let mut game = GameState::new();
        for san in ["f3", "e5", "g4"] {
            game.play_san(san).unwrap();
        }
        game.play_san("Qh4").unwrap();

        assert_eq!(game.outcome(), Some(GameOutcome::Checkmate { winner: Team::Black }));
        assert_eq!(game.history().last().map(|entry| entry.san.as_str()), Some("Qh4#"));
        assert!(game.legal_moves().is_empty());
        assert!(matches!(game.play_san("e4"), Err(GameError::GameOver(_))));

        game.undo().unwrap();
        assert_eq!(game.outcome(), None);
    }

    #[test]
    fn test_stalemate_ends_the_game() {
        let mut game = GameState::from_fen("7k/8/6K1/8/8/8/8/5Q2 w - - 0 1").unwrap();
        game.play_san("Qf7").unwrap();
        assert_eq!(game.outcome(), Some(GameOutcome::Stalemate));
    }

    #[test]
    fn test_pending_promotion() {
        let mut game = GameState::from_fen("1r5k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        game.play(BoardLocation::A7, BoardLocation::A8).unwrap();

        assert_eq!(game.pending_promotion(), Some(BoardLocation::A8));
        assert_eq!(game.play_san("Kh7"), Err(GameError::PromotionPending(BoardLocation::A8)));
        assert_eq!(game.promote_pawn(PieceType::King), Err(GameError::InvalidPromotion(PieceType::King)));

        game.promote_pawn(PieceType::Knight).unwrap();
        assert_eq!(game.pending_promotion(), None);
        assert_eq!(game.turn(), Team::Black);
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.history()[0].san, "a8=N");
        assert_eq!(game.to_fen(), "Nr5k/8/8/8/8/8/8/K7 b - - 0 1");
        assert_eq!(game.promote_pawn(PieceType::Queen), Err(GameError::NoPendingPromotion));
    }

    #[test]
    fn test_undo_cancels_a_pending_promotion() {
        let fen = "1r5k/P7/8/8/8/8/8/K7 w - - 0 1";
        let mut game = GameState::from_fen(fen).unwrap();
        game.play(BoardLocation::A7, BoardLocation::B8).unwrap();
        assert_eq!(game.board().get_piece(BoardLocation::B8).map(|piece| piece.piece_type), Some(PieceType::Pawn));

        game.undo().unwrap();
        assert_eq!(game.pending_promotion(), None);
        assert_eq!(game.to_fen(), fen);
        game.play_san("a8=Q").unwrap();
        assert_eq!(game.turn(), Team::Black);
    }

    #[test]
    fn test_promotion_in_notation() {
        let mut game = GameState::from_fen("1r5k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        game.play_san("axb8=R+").unwrap();
        assert_eq!(game.pending_promotion(), None);
        assert_eq!(game.history()[0].san, "axb8=R+");
        assert_eq!(game.to_fen(), "1R5k/8/8/8/8/8/8/K7 b - - 0 1");
    }

    #[test]
    fn test_reset_and_perft() {
        let mut game = GameState::new();
        game.play_san("e4").unwrap();
        assert!(game.reset("not a fen").is_err());
        assert_eq!(game.history().len(), 1);

        game.reset("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        assert_eq!(game.perft(1), 26);
        assert_eq!(game.legal_moves_san().iter().filter(|san| san.starts_with("O-O")).count(), 2);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_controlled_squares_follow_the_game() {
        let mut game = GameState::new();
        assert!(!game.bitboards().is_controlled_by(BoardLocation::A6, Team::White));
        game.play_san("e4").unwrap();
        assert!(game.bitboards().is_controlled_by(BoardLocation::A6, Team::White));
    }
}
