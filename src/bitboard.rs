use std::fmt::Display;

use once_cell::sync::Lazy;

use crate::{
    board::Board,
    chess::{BoardLocation, Piece, PieceType, Team},
    rules::{pseudo_legal_moves, GenerationOptions},
};

/// A bitboard is a 64-bit integer that represents a set of squares. Bit `y * 8 + x` stands for
/// the square `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bitboard(u64);

impl Bitboard {
    /// Represents an empty bitboard.
    pub const EMPTY: Bitboard = Bitboard(0);

    /// Returns whether the square is in the set. Squares off the board never are.
    pub fn get(self, location: BoardLocation) -> bool {
        location.index().is_some_and(|index| self.0 & (1u64 << index) != 0)
    }

    /// Adds the square to the set. Squares off the board are ignored.
    pub fn set(&mut self, location: BoardLocation) {
        if let Some(index) = location.index() {
            self.0 |= 1u64 << index;
        }
    }

    /// Returns the number of squares in the set.
    pub fn popcnt(self) -> u32 {
        self.0.count_ones()
    }
}

impl From<BoardLocation> for Bitboard {
    fn from(location: BoardLocation) -> Self {
        let mut bitboard = Bitboard::EMPTY;
        bitboard.set(location);
        bitboard
    }
}

impl std::ops::BitOr for Bitboard {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl IntoIterator for Bitboard {
    type Item = BoardLocation;
    type IntoIter = BitboardIterator;

    fn into_iter(self) -> Self::IntoIter {
        BitboardIterator(self.0)
    }
}

/// An iterator over the squares of a bitboard, from a1 to h8.
pub struct BitboardIterator(u64);

impl Iterator for BitboardIterator {
    type Item = BoardLocation;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            return None;
        }

        let location = BoardLocation::from_index(self.0.trailing_zeros() as usize);
        self.0 &= self.0 - 1;
        Some(location)
    }
}

impl Display for Bitboard {
    /// Draws the set as a grid, rank 8 on top, with `1` for the squares in the set.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in (0..8).rev() {
            write!(f, "{}  ", y + 1)?;
            for x in 0..8 {
                let c = if self.get(BoardLocation::new(x, y)) { '1' } else { '.' };
                write!(f, "{}{}", c, if x == 7 { '\n' } else { ' ' })?;
            }
        }
        write!(f, "   a b c d e f g h")
    }
}

// The two diagonal squares in front of a pawn, per team and square.
static PAWN_ATTACKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    for team in Team::ALL_TEAMS {
        for (index, attacks) in table[team as usize].iter_mut().enumerate() {
            let from = BoardLocation::from_index(index);
            for dx in [-1, 1] {
                attacks.set(from.transpose(dx, team.pawn_direction()));
            }
        }
    }
    table
});

/// The squares controlled by each kind of piece on a board.
///
/// A square is controlled by a piece when that piece could capture an enemy standing there. Squares
/// holding friendly pieces are included, so a defended piece shows as controlled. The cache is not
/// kept up to date by the board: callers call [`PieceBitboards::refresh`] after every move.
#[derive(Debug, Clone, Default)]
pub struct PieceBitboards {
    controlled: [Bitboard; 12],
}

impl PieceBitboards {
    /// Creates the cache for the given board.
    pub fn new(board: &Board) -> Self {
        let mut bitboards = PieceBitboards::default();
        bitboards.refresh(board);
        bitboards
    }

    /// Recomputes every bitboard from the board.
    pub fn refresh(&mut self, board: &Board) {
        self.controlled = [Bitboard::EMPTY; 12];
        for (from, piece) in board.pieces() {
            let controlled = match piece.piece_type {
                PieceType::Pawn => PAWN_ATTACKS[piece.team as usize][from.index().unwrap_or_default()],
                _ => pseudo_legal_moves(board, from, piece, GenerationOptions::INCLUDE_FRIENDLY)
                    .into_iter()
                    .fold(Bitboard::EMPTY, |bitboard, mv| bitboard | Bitboard::from(mv.to())),
            };
            self.controlled[piece.index()] |= controlled;
        }
    }

    /// Returns the squares controlled by the pieces of the given team and type.
    pub fn controlled_by(&self, piece: Piece) -> Bitboard {
        self.controlled[piece.index()]
    }

    /// Returns the squares controlled by any piece of `team`.
    pub fn controlled_squares(&self, team: Team) -> Bitboard {
        PieceType::ALL_PIECE_TYPES
            .into_iter()
            .fold(Bitboard::EMPTY, |bitboard, piece_type| bitboard | self.controlled_by(Piece::new(team, piece_type)))
    }

    /// Returns whether `team` controls the square.
    pub fn is_controlled_by(&self, location: BoardLocation, team: Team) -> bool {
        self.controlled_squares(team).get(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod bitboard_tests {
        use super::*;

        #[test]
        fn test_bitboard_from_location() {
            assert_eq!(Bitboard::from(BoardLocation::A1), Bitboard(1));
            assert_eq!(Bitboard::from(BoardLocation::H8), Bitboard(1 << 63));
            assert_eq!(Bitboard::from(BoardLocation::new(8, 0)), Bitboard::EMPTY);
        }

        #[test]
        fn test_bitboard_get_and_set() {
            let mut bitboard = Bitboard::EMPTY;
            bitboard.set(BoardLocation::E4);
            bitboard.set(BoardLocation::new(-1, 3));

            assert!(bitboard.get(BoardLocation::E4));
            assert!(!bitboard.get(BoardLocation::D4));
            assert!(!bitboard.get(BoardLocation::new(-1, 3)));
            assert_eq!(bitboard.popcnt(), 1);
        }

        #[test]
        fn test_bitboard_operators() {
            let a = Bitboard::from(BoardLocation::A1) | Bitboard::from(BoardLocation::B2);
            let b = Bitboard::from(BoardLocation::B2) | Bitboard::from(BoardLocation::C3);

            let mut c = a;
            c |= b;

            assert_eq!(a | b, c);
            assert_eq!(c.popcnt(), 3);
            assert!(c.get(BoardLocation::C3));
        }

        #[test]
        fn test_bitboard_iterator() {
            let bitboard = Bitboard::from(BoardLocation::H8) | Bitboard::from(BoardLocation::C2);
            let locations: Vec<BoardLocation> = bitboard.into_iter().collect();
            assert_eq!(locations, vec![BoardLocation::C2, BoardLocation::H8]);
        }

        #[test]
        fn test_bitboard_display() {
            let expected = "8  . . . . . . . 1\n\
                            7  . . . . . . . .\n\
                            6  . . . . . . . .\n\
                            5  . . . . . . . .\n\
                            4  . . . . . . . .\n\
                            3  . . . . . . . .\n\
                            2  . . . . . . . .\n\
                            1  1 . . . . . . .\n   \
                            a b c d e f g h";
            let bitboard = Bitboard::from(BoardLocation::A1) | Bitboard::from(BoardLocation::H8);
            assert_eq!(bitboard.to_string(), expected);
        }
    }

    mod piece_bitboards_tests {
        use super::*;
        use crate::rules::is_square_attacked_by_enemy;

        #[test]
        fn test_starting_position() {
            let (board, _) = Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
            let bitboards = PieceBitboards::new(&board);

            let knights = bitboards.controlled_by(Piece::new(Team::White, PieceType::Knight));
            let expected = [
                BoardLocation::A3,
                BoardLocation::C3,
                BoardLocation::D2,
                BoardLocation::E2,
                BoardLocation::F3,
                BoardLocation::H3,
            ];
            assert_eq!(knights.popcnt(), 6);
            assert!(expected.into_iter().all(|location| knights.get(location)));

            // Every square of rank 3 is covered by a white pawn.
            let pawns = bitboards.controlled_by(Piece::new(Team::White, PieceType::Pawn));
            assert_eq!(pawns.popcnt(), 8);
            assert!(bitboards.is_controlled_by(BoardLocation::E3, Team::White));
            assert!(!bitboards.is_controlled_by(BoardLocation::E4, Team::White));
            assert!(bitboards.is_controlled_by(BoardLocation::E6, Team::Black));
        }

        #[test]
        fn test_controlled_squares_match_attacks() {
            let fens = [
                "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
                "3r1rk1/4qpp1/4p2p/p7/PpBnn1b1/1P3N2/5PPP/R1NQR1K1 w - - 0 21",
            ];

            for fen in fens {
                let (board, _) = Board::from_fen(fen).unwrap();
                let bitboards = PieceBitboards::new(&board);
                for team in Team::ALL_TEAMS {
                    for index in 0..64 {
                        let square = BoardLocation::from_index(index);
                        assert_eq!(
                            bitboards.is_controlled_by(square, team),
                            is_square_attacked_by_enemy(square, team.opposite(), &board),
                            "{} controlled by {} in {}",
                            square,
                            team,
                            fen
                        );
                    }
                }
            }
        }

        #[test]
        fn test_refresh_follows_the_board() {
            let (mut board, _) = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
            let mut bitboards = PieceBitboards::new(&board);
            assert!(bitboards.is_controlled_by(BoardLocation::A8, Team::White));

            board.move_piece(BoardLocation::A1, BoardLocation::B1);
            assert!(bitboards.is_controlled_by(BoardLocation::A8, Team::White));

            bitboards.refresh(&board);
            assert!(!bitboards.is_controlled_by(BoardLocation::A8, Team::White));
            assert!(bitboards.is_controlled_by(BoardLocation::B8, Team::White));
        }
    }
}
