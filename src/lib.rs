//! A chess rules engine: board state, legal move generation, check and mate detection, FEN and
//! algebraic notation, and perft.

pub mod bitboard;
pub mod board;
pub mod chess;
pub mod config;
pub mod fen;
pub mod game;
pub mod notation;
pub mod perft;
pub mod rules;
