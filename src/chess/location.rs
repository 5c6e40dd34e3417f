use std::fmt::Display;

use thiserror::Error;

/// Represents an error that occurs when reading a location from algebraic notation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Invalid square notation: {0}")]
    InvalidNotation(String),
}

/// Represents a location on the 8x8 grid.
///
/// `x` is the file (0 = a, 7 = h) and `y` is the rank (0 = White's back rank). A location can be
/// moved off the board with `transpose`; it is up to the caller to check `is_in_bounds` before
/// using it to address the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoardLocation {
    pub x: i8,
    pub y: i8,
}

#[rustfmt::skip]
impl BoardLocation {
    // Constants for all squares on the board
    pub const A1: BoardLocation = BoardLocation::new(0, 0);
    pub const B1: BoardLocation = BoardLocation::new(1, 0);
    pub const C1: BoardLocation = BoardLocation::new(2, 0);
    pub const D1: BoardLocation = BoardLocation::new(3, 0);
    pub const E1: BoardLocation = BoardLocation::new(4, 0);
    pub const F1: BoardLocation = BoardLocation::new(5, 0);
    pub const G1: BoardLocation = BoardLocation::new(6, 0);
    pub const H1: BoardLocation = BoardLocation::new(7, 0);
    pub const A2: BoardLocation = BoardLocation::new(0, 1);
    pub const B2: BoardLocation = BoardLocation::new(1, 1);
    pub const C2: BoardLocation = BoardLocation::new(2, 1);
    pub const D2: BoardLocation = BoardLocation::new(3, 1);
    pub const E2: BoardLocation = BoardLocation::new(4, 1);
    pub const F2: BoardLocation = BoardLocation::new(5, 1);
    pub const G2: BoardLocation = BoardLocation::new(6, 1);
    pub const H2: BoardLocation = BoardLocation::new(7, 1);
    pub const A3: BoardLocation = BoardLocation::new(0, 2);
    pub const B3: BoardLocation = BoardLocation::new(1, 2);
    pub const C3: BoardLocation = BoardLocation::new(2, 2);
    pub const D3: BoardLocation = BoardLocation::new(3, 2);
    pub const E3: BoardLocation = BoardLocation::new(4, 2);
    pub const F3: BoardLocation = BoardLocation::new(5, 2);
    pub const G3: BoardLocation = BoardLocation::new(6, 2);
    pub const H3: BoardLocation = BoardLocation::new(7, 2);
    pub const A4: BoardLocation = BoardLocation::new(0, 3);
    pub const B4: BoardLocation = BoardLocation::new(1, 3);
    pub const C4: BoardLocation = BoardLocation::new(2, 3);
    pub const D4: BoardLocation = BoardLocation::new(3, 3);
    pub const E4: BoardLocation = BoardLocation::new(4, 3);
    pub const F4: BoardLocation = BoardLocation::new(5, 3);
    pub const G4: BoardLocation = BoardLocation::new(6, 3);
    pub const H4: BoardLocation = BoardLocation::new(7, 3);
    pub const A5: BoardLocation = BoardLocation::new(0, 4);
    pub const B5: BoardLocation = BoardLocation::new(1, 4);
    pub const C5: BoardLocation = BoardLocation::new(2, 4);
    pub const D5: BoardLocation = BoardLocation::new(3, 4);
    pub const E5: BoardLocation = BoardLocation::new(4, 4);
    pub const F5: BoardLocation = BoardLocation::new(5, 4);
    pub const G5: BoardLocation = BoardLocation::new(6, 4);
    pub const H5: BoardLocation = BoardLocation::new(7, 4);
    pub const A6: BoardLocation = BoardLocation::new(0, 5);
    pub const B6: BoardLocation = BoardLocation::new(1, 5);
    pub const C6: BoardLocation = BoardLocation::new(2, 5);
    pub const D6: BoardLocation = BoardLocation::new(3, 5);
    pub const E6: BoardLocation = BoardLocation::new(4, 5);
    pub const F6: BoardLocation = BoardLocation::new(5, 5);
    pub const G6: BoardLocation = BoardLocation::new(6, 5);
    pub const H6: BoardLocation = BoardLocation::new(7, 5);
    pub const A7: BoardLocation = BoardLocation::new(0, 6);
    pub const B7: BoardLocation = BoardLocation::new(1, 6);
    pub const C7: BoardLocation = BoardLocation::new(2, 6);
    pub const D7: BoardLocation = BoardLocation::new(3, 6);
    pub const E7: BoardLocation = BoardLocation::new(4, 6);
    pub const F7: BoardLocation = BoardLocation::new(5, 6);
    pub const G7: BoardLocation = BoardLocation::new(6, 6);
    pub const H7: BoardLocation = BoardLocation::new(7, 6);
    pub const A8: BoardLocation = BoardLocation::new(0, 7);
    pub const B8: BoardLocation = BoardLocation::new(1, 7);
    pub const C8: BoardLocation = BoardLocation::new(2, 7);
    pub const D8: BoardLocation = BoardLocation::new(3, 7);
    pub const E8: BoardLocation = BoardLocation::new(4, 7);
    pub const F8: BoardLocation = BoardLocation::new(5, 7);
    pub const G8: BoardLocation = BoardLocation::new(6, 7);
    pub const H8: BoardLocation = BoardLocation::new(7, 7);
}

impl BoardLocation {
    /// Creates a new location from a file and a rank index.
    pub const fn new(x: i8, y: i8) -> BoardLocation {
        BoardLocation { x, y }
    }

    /// Creates the location stored at `index` in a 64-slot array.
    pub fn from_index(index: usize) -> BoardLocation {
        debug_assert!(index < 64);
        BoardLocation::new((index % 8) as i8, (index / 8) as i8)
    }

    /// Returns a new location shifted by `dx` files and `dy` ranks. The result may be off the board.
    pub fn transpose(&self, dx: i8, dy: i8) -> BoardLocation {
        BoardLocation::new(self.x + dx, self.y + dy)
    }

    /// Returns true if the location is on the board.
    pub fn is_in_bounds(&self) -> bool {
        (0..8).contains(&self.x) && (0..8).contains(&self.y)
    }

    /// Returns the slot index (`y * 8 + x`) of the location, or `None` if it is off the board.
    pub fn index(&self) -> Option<usize> {
        self.is_in_bounds().then(|| (self.y as usize) * 8 + self.x as usize)
    }

    /// Returns the file letter of the location ('a' to 'h').
    pub fn file_char(&self) -> char {
        (b'a' + self.x as u8) as char
    }

    /// Returns the rank digit of the location ('1' to '8').
    pub fn rank_char(&self) -> char {
        (b'1' + self.y as u8) as char
    }

    pub fn is_on_same_file_as(&self, other: BoardLocation) -> bool {
        self.x == other.x
    }

    pub fn is_on_same_rank_as(&self, other: BoardLocation) -> bool {
        self.y == other.y
    }
}

impl Display for BoardLocation {
    /// Formats the location in algebraic notation (e.g. "e4").
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_in_bounds() {
            write!(f, "{}{}", self.file_char(), self.rank_char())
        } else {
            write!(f, "({}, {})", self.x, self.y)
        }
    }
}

impl TryFrom<&str> for BoardLocation {
    type Error = LocationError;

    /// Reads a location from algebraic notation (e.g. "e4").
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut chars = value.chars();

        match (chars.next(), chars.next(), chars.next()) {
            (Some(file @ 'a'..='h'), Some(rank @ '1'..='8'), None) => {
                Ok(BoardLocation::new(file as i8 - 'a' as i8, rank as i8 - '1' as i8))
            }
            _ => Err(LocationError::InvalidNotation(value.to_string())),
        }
    }
}
