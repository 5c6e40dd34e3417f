use std::fmt::Display;
use std::hash::{Hash, Hasher};

use thiserror::Error;

/// Represents the team (side) a piece belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Team {
    White,
    Black,
}

impl Team {
    /// Represents both teams.
    pub const ALL_TEAMS: [Team; 2] = [Team::White, Team::Black];

    /// Returns the opposite team.
    pub fn opposite(&self) -> Team {
        match self {
            Team::White => Team::Black,
            Team::Black => Team::White,
        }
    }

    /// Returns the rank index on which the team's king and rooks start.
    pub fn back_rank(&self) -> i8 {
        match self {
            Team::White => 0,
            Team::Black => 7,
        }
    }

    /// Returns the rank increment of a pawn of this team moving forward.
    pub fn pawn_direction(&self) -> i8 {
        match self {
            Team::White => 1,
            Team::Black => -1,
        }
    }

    /// Returns the rank index from which the team's pawns may advance two squares.
    pub fn pawn_home_rank(&self) -> i8 {
        match self {
            Team::White => 1,
            Team::Black => 6,
        }
    }

    /// Returns the rank index on which the team's pawns promote.
    pub fn promotion_rank(&self) -> i8 {
        match self {
            Team::White => 7,
            Team::Black => 0,
        }
    }

    /// Returns the rank index on which the team's pawns can capture en passant.
    pub fn en_passant_rank(&self) -> i8 {
        match self {
            Team::White => 4,
            Team::Black => 3,
        }
    }
}

impl Display for Team {
    /// Formats the team as a string.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::White => write!(f, "White"),
            Team::Black => write!(f, "Black"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// Represents all piece types.
    pub const ALL_PIECE_TYPES: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Represents the piece types a pawn can promote to, in the order they are generated.
    pub const PROMOTION_TYPES: [PieceType; 4] =
        [PieceType::Bishop, PieceType::Knight, PieceType::Rook, PieceType::Queen];

    /// Returns the position of the piece type in `ALL_PIECE_TYPES`.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Represents an error that occurs when converting a character to a piece.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PieceError {
    #[error("Invalid piece character: '{0}'")]
    InvalidCharacter(char),
}

impl From<PieceType> for char {
    fn from(piece_type: PieceType) -> Self {
        match piece_type {
            PieceType::Pawn => 'P',
            PieceType::Knight => 'N',
            PieceType::Bishop => 'B',
            PieceType::Rook => 'R',
            PieceType::Queen => 'Q',
            PieceType::King => 'K',
        }
    }
}

impl TryFrom<char> for PieceType {
    type Error = PieceError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase() {
            'p' => Ok(PieceType::Pawn),
            'n' => Ok(PieceType::Knight),
            'b' => Ok(PieceType::Bishop),
            'r' => Ok(PieceType::Rook),
            'q' => Ok(PieceType::Queen),
            'k' => Ok(PieceType::King),
            _ => Err(PieceError::InvalidCharacter(value)),
        }
    }
}

impl Display for PieceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "Pawn"),
            PieceType::Knight => write!(f, "Knight"),
            PieceType::Bishop => write!(f, "Bishop"),
            PieceType::Rook => write!(f, "Rook"),
            PieceType::Queen => write!(f, "Queen"),
            PieceType::King => write!(f, "King"),
        }
    }
}

/// Represents a chess piece standing on the board.
///
/// A piece has no identity of its own: it is addressed by the slot it occupies, and moving it
/// transfers the whole value to another slot. Besides its team and type, a piece carries the
/// move-history flags the rules need for castling and en passant.
///
/// Two pieces are equal when their team and type are equal; the history flags are ignored.
#[derive(Copy, Clone, Debug)]
pub struct Piece {
    pub team: Team,
    pub piece_type: PieceType,
    /// Set once the piece has left its starting square.
    pub has_moved: bool,
    /// The board ply at which this pawn advanced two squares, if it ever did.
    pub double_step_ply: Option<u32>,
}

impl Piece {
    /// Creates a new piece that has never moved.
    pub const fn new(team: Team, piece_type: PieceType) -> Self {
        Piece { team, piece_type, has_moved: false, double_step_ply: None }
    }

    /// Returns the FEN symbol of the piece: uppercase for White, lowercase for Black.
    pub fn symbol(&self) -> char {
        let c = char::from(self.piece_type);
        match self.team {
            Team::White => c,
            Team::Black => c.to_ascii_lowercase(),
        }
    }

    /// Returns the position of the piece in a 12-entry table, white pieces first.
    pub fn index(&self) -> usize {
        match self.team {
            Team::White => self.piece_type.index(),
            Team::Black => self.piece_type.index() + 6,
        }
    }
}

impl PartialEq for Piece {
    fn eq(&self, other: &Self) -> bool {
        self.team == other.team && self.piece_type == other.piece_type
    }
}

impl Eq for Piece {}

impl Hash for Piece {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.team.hash(state);
        self.piece_type.hash(state);
    }
}

impl TryFrom<char> for Piece {
    type Error = PieceError;

    /// Converts a FEN symbol to a piece.
    fn try_from(value: char) -> Result<Self, Self::Error> {
        let team = match value.is_ascii_uppercase() {
            true => Team::White,
            false => Team::Black,
        };
        let piece_type = PieceType::try_from(value)?;
        Ok(Piece::new(team, piece_type))
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.team, self.piece_type)
    }
}
