use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
    thread,
    time::Instant,
};

use log::{info, trace};
use thiserror::Error;

use crate::{
    board::Board,
    chess::{Move, MoveKind, PieceType, Team},
    fen::FenError,
    rules::legal_moves_from,
};

/// Represents errors that can occur during perft (performance test) operations.
#[derive(Error, Debug)]
pub enum PerftError {
    #[error("Invalid FEN ({0}): {1}")]
    InvalidFen(String, FenError),

    #[error("A perft worker thread panicked")]
    WorkerPanicked,
}

/// Node counts per root move, keyed by the coordinate notation of the move ("e2e4", "a7a8q").
/// The map keeps the moves in alphabetical order.
pub type Divide = BTreeMap<String, u64>;

//======================================================================================================================
// Move enumeration
//======================================================================================================================

/// Returns every legal move of `team`.
///
/// A pawn move reaching the last rank is listed four times, once per promotion piece (bishop,
/// knight, rook, queen). The moves of one piece never contain duplicates.
///
/// # Parameters
/// * `board` - The position; it is only modified temporarily
/// * `team` - The team to move
pub fn get_all_valid_moves(board: &mut Board, team: Team) -> Vec<Move> {
    let mut moves = Vec::new();
    for from in board.locations_of(team) {
        let first = moves.len();
        for mv in legal_moves_from(board, from) {
            let variants = match mv.kind() {
                MoveKind::Promotion(_) => {
                    PieceType::PROMOTION_TYPES.map(|piece_type| mv.with_promotion(piece_type)).to_vec()
                }
                _ => vec![mv],
            };
            for variant in variants {
                if !moves[first..].contains(&variant) {
                    moves.push(variant);
                }
            }
        }
    }
    moves
}

/// Counts the leaf nodes of the move tree of depth `depth` below the position.
///
/// # Parameters
/// * `board` - The position; it is restored before returning
/// * `depth` - The depth of the tree. Depth 0 counts the position itself.
/// * `team` - The team to move
/// * `log` - Print the node count below each root move, in alphabetical order of the moves
///
/// # Returns
/// The number of leaf nodes
pub fn play_moves(board: &mut Board, depth: u16, team: Team, log: bool) -> u64 {
    if depth == 0 {
        return 1;
    }

    if log {
        let divide = divide(board, depth, team);
        for (mv, nodes) in &divide {
            println!("{}\t{}", mv, nodes);
        }
        return divide.values().sum();
    }

    let moves = get_all_valid_moves(board, team);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves.iter() {
        board.make_move(mv);
        nodes += play_moves(board, depth - 1, team.opposite(), false);
        board.undo_move();
    }
    nodes
}

/// Returns the number of leaf nodes below each root move.
pub fn divide(board: &mut Board, depth: u16, team: Team) -> Divide {
    let mut divide = Divide::new();
    if depth == 0 {
        return divide;
    }

    for mv in get_all_valid_moves(board, team) {
        board.make_move(&mv);
        let nodes = play_moves(board, depth - 1, team.opposite(), false);
        board.undo_move();

        trace!("{}\t{}", mv, nodes);
        divide.insert(mv.to_coordinate_string(), nodes);
    }
    divide
}

//======================================================================================================================
// Parallel perft
//======================================================================================================================

/// Represents the possible states of a root move in the parallel perft.
///
/// # Variants
/// * `New` - The move has not been claimed by any thread
/// * `Exclusive` - A thread is counting the nodes below the move
/// * `Done { nodes }` - The nodes below the move have been counted
#[derive(Debug)]
enum PerftNodeStatus {
    New,
    Exclusive,
    Done { nodes: u64 },
}

/// A root move shared between the perft worker threads.
#[derive(Debug, Clone)]
struct PerftNode {
    status: Arc<RwLock<PerftNodeStatus>>,
}

impl PerftNode {
    fn new() -> Self {
        Self { status: Arc::new(RwLock::new(PerftNodeStatus::New)) }
    }

    /// Claims the node for the calling thread.
    ///
    /// # Returns
    /// * `true` if the node was new and now belongs to the caller
    /// * `false` if another thread claimed it first
    fn make_exclusive(&self) -> bool {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);

        if let PerftNodeStatus::New = *status {
            *status = PerftNodeStatus::Exclusive;
            true
        } else {
            false
        }
    }

    /// Stores the node count of an exclusive node.
    fn make_done(&self, nodes: u64) {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(matches!(*status, PerftNodeStatus::Exclusive));
        *status = PerftNodeStatus::Done { nodes };
    }

    /// Returns the node count, or `None` if the node has not been counted yet.
    fn get_nodes(&self) -> Option<u64> {
        let status = self.status.read().unwrap_or_else(PoisonError::into_inner);

        if let PerftNodeStatus::Done { nodes } = &*status {
            Some(*nodes)
        } else {
            None
        }
    }
}

/// Same as [`divide`], with the root moves spread over `threads_count` worker threads.
///
/// Every worker owns a clone of the board and repeatedly claims the next root move nobody works
/// on, until all of them are counted.
pub fn parallel_divide(board: &Board, depth: u16, team: Team, threads_count: u32) -> Result<Divide, PerftError> {
    if depth == 0 {
        return Ok(Divide::new());
    }

    let mut root_board = board.clone();
    let work: Arc<Vec<(Move, PerftNode)>> = Arc::new(
        get_all_valid_moves(&mut root_board, team).into_iter().map(|mv| (mv, PerftNode::new())).collect(),
    );

    // Spawning threads
    let mut threads = Vec::with_capacity(threads_count as usize);
    for _ in 0..threads_count.max(1) {
        let thread_work = Arc::clone(&work);
        let mut thread_board = board.clone();
        let handle = thread::spawn(move || {
            for (mv, node) in thread_work.iter() {
                if node.make_exclusive() {
                    thread_board.make_move(mv);
                    let nodes = play_moves(&mut thread_board, depth - 1, team.opposite(), false);
                    thread_board.undo_move();
                    node.make_done(nodes);
                }
            }
        });
        threads.push(handle);
    }

    // Joins threads
    for handle in threads {
        handle.join().map_err(|_| PerftError::WorkerPanicked)?;
    }

    let mut divide = Divide::new();
    for (mv, node) in work.iter() {
        let nodes = node.get_nodes().ok_or(PerftError::WorkerPanicked)?;
        trace!("{}\t{}", mv, nodes);
        divide.insert(mv.to_coordinate_string(), nodes);
    }
    Ok(divide)
}

//======================================================================================================================
// Entry points
//======================================================================================================================

/// Counts the leaf nodes of the move tree of depth `depth` below the position described by `fen`,
/// without printing anything.
pub fn count_nodes(fen: &str, depth: u16) -> Result<u64, PerftError> {
    let (mut board, team) = Board::from_fen(fen).map_err(|e| PerftError::InvalidFen(fen.to_string(), e))?;
    Ok(play_moves(&mut board, depth, team, false))
}

/// Execute a perft (performance test) on a given chess position for a specified depth.
///
/// The function prints the position, the node count below each root move when `show_divide` is
/// set, then the total node count, the execution time and the nodes processed per second.
///
/// # Parameters
/// * `fen` - A FEN string representation of the chess position to analyze
/// * `depth` - The depth of the move tree to traverse
/// * `threads` - Number of threads to use. A single thread runs everything on the calling thread.
/// * `show_divide` - Print the node count below each root move
///
/// # Returns
/// * `Ok(nodes)` - The number of leaf nodes
/// * `Err(PerftError)` - If the FEN string is invalid or a worker thread failed
///
/// # Note
/// Shallow trees are always counted on the calling thread since spawning the workers would cost
/// more than it saves.
pub fn perft(fen: &str, depth: u16, threads: u32, show_divide: bool) -> Result<u64, PerftError> {
    const MIN_PARALLEL_DEPTH: u16 = 4;

    let (mut board, team) = Board::from_fen(fen).map_err(|e| PerftError::InvalidFen(fen.to_string(), e))?;

    println!("Perft ({}) for position:\n\n{}\n", depth, board.to_compact_string());

    let start = Instant::now();
    let divide = if threads > 1 && depth >= MIN_PARALLEL_DEPTH {
        parallel_divide(&board, depth, team, threads)?
    } else {
        divide(&mut board, depth, team)
    };
    let nodes = if depth == 0 { 1 } else { divide.values().sum() };
    let duration = start.elapsed();

    if show_divide {
        for (mv, nodes) in &divide {
            println!("{}\t{}", mv, nodes);
        }
    }

    println!("\nNodes: {}", nodes);
    println!("Time: {:.3}", duration.as_secs_f64());
    println!("Nodes per second: {:.0}", nodes as f64 / duration.as_secs_f64());

    info!("perft({}) = {} in {:.3}s on {} thread(s)", depth, nodes, duration.as_secs_f64(), threads.max(1));
    Ok(nodes)
}
