use colored::*;
use rookery::{
    board::Board,
    chess::Team,
    fen::{generate_fen_from_position, FenError},
    notation::{get_move_from_parsed_move, get_parsed_move},
    perft::{divide, get_all_valid_moves, play_moves},
};
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::PathBuf, time::Instant};
use thiserror::Error;

const EXIT_FAILURE: i32 = 1;

//======================================================================================================================
// Error handling
//======================================================================================================================

/// Errors that are related to the test harness.
#[derive(Error, Debug)]
enum TestHarnessError {
    #[error("The current directory cannot be read")]
    CurrentDirNotFound,

    #[error("Resource path not found: {0:?}")]
    ResourcePathNotFound(PathBuf),

    #[error("Cannot read the test data file ({0:?})")]
    CannotReadTestDataFile(PathBuf),

    #[error("Cannot parse the test data file: {0}")]
    CannotParseTestDataFile(#[from] serde_json::Error),

    #[error("{0} test(s) failed")]
    TestsFailed(usize),
}

/// Errors used when tests fail.
#[derive(Error, Debug)]
enum TestFailureError {
    #[error("Unable to parse the fen string \"{fen}\": {error}")]
    UnableToParseFen { fen: String, error: FenError },

    #[error("Unexpected node count at depth {depth}\n\nExpected: {expected}\n\nActual: {actual}")]
    UnexpectedNodeCount { depth: u16, expected: u64, actual: u64 },

    #[error("The divide at depth {depth} adds up to {actual} instead of {expected}")]
    UnexpectedDivideTotal { depth: u16, expected: u64, actual: u64 },

    #[error("Unexpected FEN after reading and writing the position\n\nExpected: {expected}\n\nActual: {actual}")]
    UnexpectedFen { expected: String, actual: String },

    #[error("The position changed after the perft\n\nOriginal:\n{original}\n\nActual:\n{actual}")]
    PositionChanged { original: String, actual: String },

    #[error("The notation \"{notation}\" of {mv} is parsed back as {actual:?}")]
    NotationMismatch { mv: String, notation: String, actual: Option<String> },
}

/// Global errors for this module.
#[derive(Error, Debug)]
enum PerftTestError {
    #[error("Test harness error: {}", .0)]
    TestHarnessError(#[from] TestHarnessError),

    #[error("---- {} ----\n{}", .test_name, .test_failure_error)]
    TestFailed { test_name: String, test_failure_error: TestFailureError },
}

//======================================================================================================================
// Test data structures
//======================================================================================================================

/// A perft test case: the expected node counts from depth 1 onwards.
#[derive(Debug, Deserialize)]
struct Test {
    fen: String,
    description: String,
    perft: Vec<u64>,
}

impl Test {
    fn failure(&self, test_failure_error: TestFailureError) -> PerftTestError {
        PerftTestError::TestFailed { test_name: self.description.clone(), test_failure_error }
    }

    fn load(&self) -> Result<(Board, Team), PerftTestError> {
        Board::from_fen(&self.fen)
            .map_err(|error| self.failure(TestFailureError::UnableToParseFen { fen: self.fen.clone(), error }))
    }
}

/// Read the tests data from the file.
fn read_tests_data() -> Result<Vec<Test>, PerftTestError> {
    let tests_file_path = get_resource_path("assets/tests/perft_tests.json")?;
    let file = File::open(&tests_file_path).map_err(|_| TestHarnessError::CannotReadTestDataFile(tests_file_path))?;
    let reader = BufReader::new(file);
    let tests: Vec<Test> = serde_json::from_reader(reader).map_err(TestHarnessError::CannotParseTestDataFile)?;
    Ok(tests)
}

//======================================================================================================================
// Test harness
//======================================================================================================================

// Only the first four fields are kept: the move counters are always written as "0 1".
fn fen_without_counters(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

fn test_fen_round_trip(test: &Test) -> Result<(), PerftTestError> {
    let (board, team) = test.load()?;
    let expected = fen_without_counters(&test.fen);
    let actual = fen_without_counters(&generate_fen_from_position(&board, team));

    if expected != actual {
        return Err(test.failure(TestFailureError::UnexpectedFen { expected, actual }));
    }
    Ok(())
}

fn test_node_counts(test: &Test) -> Result<(), PerftTestError> {
    let (mut board, team) = test.load()?;
    let original = board.to_compact_string();

    for (index, expected) in test.perft.iter().copied().enumerate() {
        let depth = index as u16 + 1;
        let actual = play_moves(&mut board, depth, team, false);
        if expected != actual {
            return Err(test.failure(TestFailureError::UnexpectedNodeCount { depth, expected, actual }));
        }
    }

    let actual = board.to_compact_string();
    if original != actual {
        return Err(test.failure(TestFailureError::PositionChanged { original, actual }));
    }
    Ok(())
}

fn test_divide(test: &Test) -> Result<(), PerftTestError> {
    let (mut board, team) = test.load()?;
    let depth = test.perft.len().min(2) as u16;
    let expected = test.perft[depth as usize - 1];
    let actual = divide(&mut board, depth, team).values().sum();

    if expected != actual {
        return Err(test.failure(TestFailureError::UnexpectedDivideTotal { depth, expected, actual }));
    }
    Ok(())
}

fn test_notation(test: &Test) -> Result<(), PerftTestError> {
    let (mut board, team) = test.load()?;

    for mv in get_all_valid_moves(&mut board, team) {
        let notation = get_parsed_move(&mut board, &mv);
        let actual = get_move_from_parsed_move(&mut board, team, &notation);
        if actual != Some(mv) {
            return Err(test.failure(TestFailureError::NotationMismatch {
                mv: mv.to_string(),
                notation,
                actual: actual.map(|mv| mv.to_string()),
            }));
        }
    }
    Ok(())
}

/// Run a single test case.
fn run_test(test: Test) -> Result<(), PerftTestError> {
    test_fen_round_trip(&test)?;
    test_node_counts(&test)?;
    test_divide(&test)?;
    test_notation(&test)?;
    Ok(())
}

/// Run all the tests.
fn run_tests() -> Result<(), PerftTestError> {
    let tests = read_tests_data()?;

    println!("\nrunning {} tests", tests.len());

    let start = Instant::now();
    let mut passed = 0;
    let mut failed = 0;
    let mut failures: Vec<PerftTestError> = Vec::new();
    for test in tests {
        print!("test {} ...", test.description);
        let result_string = match run_test(test) {
            Ok(_) => {
                passed += 1;
                "ok".green()
            }

            Err(error) => {
                failed += 1;
                failures.push(error);
                "FAILED".red()
            }
        };
        println!(" {}", result_string);
    }
    let seconds = start.elapsed().as_secs_f32();

    for failure in failures {
        println!("\n{}", failure)
    }

    println!(
        "\ntest result: {}. {} passed; {} failed; finished in {:.2}s\n",
        if failed == 0 { "ok".green() } else { "FAILED".red() },
        passed,
        failed,
        seconds
    );

    if failed > 0 {
        return Err(TestHarnessError::TestsFailed(failed).into());
    }
    Ok(())
}

//======================================================================================================================
// Main function and helpers
//======================================================================================================================

/// Get the path to a resource file.
fn get_resource_path(relative_path: &str) -> Result<PathBuf, TestHarnessError> {
    let mut path = std::env::current_dir().map_err(|_| TestHarnessError::CurrentDirNotFound)?;
    path.push(relative_path);

    if !path.exists() {
        return Err(TestHarnessError::ResourcePathNotFound(path));
    }

    Ok(path)
}

/// The main function for the test harness. It will run the tests and exit with an error status if any of them fails.
fn main() {
    if let Err(error) = run_tests() {
        eprintln!("{}", error);
        std::process::exit(EXIT_FAILURE)
    }
}
