// Copyright 2026 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use super::square::Direction;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PlayerId(u8);

impl PlayerId {
    #[inline]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }
    #[inline]
    pub const fn to_index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PlayerId> for usize {
    fn from(value: PlayerId) -> Self {
        value.to_index()
    }
}

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
    Archbishop,
    Chancellor,
    Heir,
}
use Piece::{Archbishop, Bishop, Chancellor, Heir, King, Knight, Pawn, Queen, Rook};

impl Piece {
    pub const COUNT: usize = 9;

    pub const fn from_index(index: usize) -> Self {
        debug_assert!(index < Self::COUNT);
        const PIECE_MAP: [Piece; Piece::COUNT] = [
            Pawn, Knight, Bishop, Rook, Queen, King, Archbishop, Chancellor, Heir,
        ];
        PIECE_MAP[index]
    }

    pub const fn to_index(&self) -> usize {
        *self as usize
    }

    /// Kings and heirs: pieces whose safety decides check.
    pub fn is_royal(&self) -> bool {
        matches!(*self, King | Heir)
    }

    /// Sliding pieces, whose reach depends on squares far away from them.
    pub fn is_long_range(&self) -> bool {
        matches!(*self, Queen | Rook | Bishop | Archbishop | Chancellor)
    }

    pub fn is_pawn(&self) -> bool {
        matches!(*self, Pawn)
    }

    pub const fn letter(&self) -> char {
        match *self {
            Pawn => 'P',
            Knight => 'N',
            Bishop => 'B',
            Rook => 'R',
            Queen => 'Q',
            King => 'K',
            Archbishop => 'A',
            Chancellor => 'C',
            Heir => 'H',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        let c = c.to_ascii_uppercase();
        Piece::iter().find(|piece| piece.letter() == c)
    }
}

/// A piece of a specific player, as stored on the board.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Material {
    owner: PlayerId,
    piece: Piece,
    facing: Direction,
    unmoved: bool,
}

impl Material {
    #[inline]
    pub const fn new(owner: PlayerId, piece: Piece) -> Self {
        Self {
            owner,
            piece,
            facing: Direction::Up,
            unmoved: true,
        }
    }

    #[inline]
    pub const fn pawn(owner: PlayerId, facing: Direction) -> Self {
        Self {
            owner,
            piece: Pawn,
            facing,
            unmoved: true,
        }
    }

    #[inline]
    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    #[inline]
    pub fn piece(&self) -> Piece {
        self.piece
    }

    /// Direction a pawn advances in. Meaningless for other pieces.
    #[inline]
    pub fn facing(&self) -> Direction {
        self.facing
    }

    #[inline]
    pub fn is_unmoved(&self) -> bool {
        self.unmoved
    }

    #[inline]
    pub fn set_piece(&mut self, piece: Piece) {
        self.piece = piece
    }

    #[inline]
    pub fn set_unmoved(&mut self, unmoved: bool) {
        self.unmoved = unmoved
    }

    #[inline]
    pub fn moved(mut self) -> Self {
        self.unmoved = false;
        self
    }
}

/// Contents of one board cell.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    /// Impassable: nothing moves onto or through it.
    Blocked,
    Occupied(Material),
}

impl Cell {
    #[inline]
    pub fn material(&self) -> Option<Material> {
        match *self {
            Cell::Occupied(material) => Some(material),
            _ => None,
        }
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(*self, Cell::Empty)
    }
    #[inline]
    pub fn is_blocked(&self) -> bool {
        matches!(*self, Cell::Blocked)
    }
    #[inline]
    pub fn is_occupied(&self) -> bool {
        matches!(*self, Cell::Occupied(_))
    }
    #[inline]
    pub fn owner(&self) -> Option<PlayerId> {
        self.material().map(|material| material.owner())
    }
    #[inline]
    pub fn piece(&self) -> Option<Piece> {
        self.material().map(|material| material.piece())
    }
    #[inline]
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner() == Some(player)
    }
}

impl From<Material> for Cell {
    fn from(value: Material) -> Self {
        Cell::Occupied(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_letters_round_trip() {
        for piece in Piece::iter() {
            assert_eq!(Piece::from_letter(piece.letter()), Some(piece));
        }
        assert_eq!(Piece::from_letter('x'), None);
    }
    #[test]
    fn test_piece_index_round_trip() {
        for piece in Piece::iter() {
            assert_eq!(Piece::from_index(piece.to_index()), piece);
        }
    }
    #[test]
    fn test_long_range_pieces() {
        let long: Vec<Piece> = Piece::iter().filter(|p| p.is_long_range()).collect();
        assert_eq!(long, vec![Bishop, Rook, Queen, Archbishop, Chancellor]);
    }
    #[test]
    fn test_royal_pieces() {
        assert!(King.is_royal());
        assert!(Heir.is_royal());
        assert!(!Queen.is_royal());
    }
    #[test]
    fn test_moved_clears_flag() {
        let material = Material::new(PlayerId::new(1), Rook);
        assert!(material.is_unmoved());
        assert!(!material.moved().is_unmoved());
    }
    #[test]
    fn test_cell_accessors() {
        let owner = PlayerId::new(2);
        let cell: Cell = Material::pawn(owner, Direction::Down).into();
        assert!(cell.is_occupied());
        assert!(cell.is_owned_by(owner));
        assert_eq!(cell.piece(), Some(Pawn));
        assert!(Cell::Blocked.owner().is_none());
        assert!(Cell::default().is_empty());
    }
}
