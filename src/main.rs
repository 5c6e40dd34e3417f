use std::io::Write;

use clap::Parser;
use log::info;
use rookery::{
    config::{self, ConfigError},
    fen::STARTING_FEN,
    game::{GameError, GameState},
    perft::{perft, PerftError},
    rules::is_king_in_check,
};
use thiserror::Error;

#[derive(Error, Debug)]
enum RookeryError {
    #[error("Error during the perft command: {0}")]
    PerftError(#[from] PerftError),

    #[error("{0}")]
    GameError(#[from] GameError),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

mod arguments {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};

    use super::STARTING_FEN;

    /// A chess rules engine
    #[derive(Parser)]
    #[command(name = "rookery", version, about = "A chess rules engine: legal moves, notation and perft")]
    pub struct RookeryArgs {
        /// Path of a TOML configuration file
        #[arg(short, long, global = true)]
        pub config: Option<PathBuf>,

        /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
        #[arg(short, long, global = true)]
        pub log_level: Option<String>,

        #[command(subcommand)]
        pub command: Commands,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Commands {
        /// Calculate the perft of a position
        Perft {
            /// The depth to calculate the perft
            #[arg(short, long)]
            depth: Option<u16>,

            /// FEN string representing the position to calculate the perft
            #[arg(short, long, default_value = STARTING_FEN)]
            fen: String,

            /// The number of threads to use for the perft calculation
            #[arg(short, long)]
            threads: Option<u32>,

            /// Print the node count below each root move
            #[arg(long)]
            divide: bool,
        },

        /// Show a position with its legal moves
        Show {
            /// FEN string representing the position to show
            #[arg(short, long, default_value = STARTING_FEN)]
            fen: String,

            /// Also show the squares controlled by each team
            #[arg(long)]
            controlled: bool,
        },

        /// Play moves from a position and print the resulting game
        Play {
            /// FEN string representing the starting position
            #[arg(short, long, default_value = STARTING_FEN)]
            fen: String,

            /// Moves in algebraic ("Nf3", "O-O") or coordinate ("g1f3") notation
            moves: Vec<String>,
        },
    }
}

fn initialize_logger(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level))
        .format(|buf, record| writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args()))
        .write_style(env_logger::WriteStyle::Never)
        .target(env_logger::Target::Stderr)
        .init();
}

fn print_status(game: &GameState) {
    match (game.outcome(), game.pending_promotion()) {
        (Some(outcome), _) => println!("Status: {}", outcome),
        (None, Some(square)) => println!("Status: waiting for the promotion of the pawn on {}", square),
        (None, None) if is_king_in_check(game.turn(), game.board()) => println!("Status: {} is in check", game.turn()),
        (None, None) => println!("Status: {} to move", game.turn()),
    }
}

fn show(fen: &str, controlled: bool) -> Result<(), RookeryError> {
    let mut game = GameState::from_fen(fen)?;

    println!("{}\n", game.board().to_compact_string());
    println!("FEN: {}", game.to_fen());
    println!("Legal moves ({}): {}", game.legal_moves().len(), game.legal_moves_san().join(" "));
    print_status(&game);

    if controlled {
        for team in rookery::chess::Team::ALL_TEAMS {
            let controlled = game.bitboards().controlled_squares(team);
            let squares: Vec<String> = controlled.into_iter().map(|square| square.to_string()).collect();
            println!("\nSquares controlled by {} ({}): {}", team, controlled.popcnt(), squares.join(" "));
            println!("{}", controlled);
        }
    }
    Ok(())
}

fn play(fen: &str, moves: &[String]) -> Result<(), RookeryError> {
    let mut game = GameState::from_fen(fen)?;

    for text in moves {
        game.play_san(text).or_else(|error| game.play_coordinates(text).map_err(|_| error))?;
    }

    for (ply, entry) in game.history().iter().enumerate() {
        println!("{:>3}. {:<10} {}", ply + 1, entry.san, entry.fen);
    }
    println!("\n{}\n", game.board().to_compact_string());
    println!("FEN: {}", game.to_fen());
    print_status(&game);
    Ok(())
}

fn run() -> Result<(), RookeryError> {
    // Parse command line arguments
    let args = arguments::RookeryArgs::parse();

    // Initialize the configuration and the logger
    let config = config::initialize(args.config)?;
    initialize_logger(args.log_level.as_deref().unwrap_or(&config.log_level));
    info!("Configuration: {:?}", config);

    // Run the command
    match args.command {
        arguments::Commands::Perft { depth, fen, threads, divide } => {
            perft(&fen, depth.unwrap_or(config.perft_depth), threads.unwrap_or(config.perft_threads), divide)?;
        }
        arguments::Commands::Show { fen, controlled } => show(&fen, controlled)?,
        arguments::Commands::Play { fen, moves } => play(&fen, &moves)?,
    }

    Ok(())
}

/// Main entry point for the rookery command line.
fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
