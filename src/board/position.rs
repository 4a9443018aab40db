// Copyright 2023 Tobin Edwards
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
use std::ops::Index;

use super::material::{Cell, Material, PlayerId};
use super::square::{Dimensions, Square};

/// The grid of cells. Rows are stored top to bottom, cells left to right.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    dims: Dimensions,
    cells: Vec<Cell>,
}

impl Board {
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            cells: vec![Cell::Empty; dims.area()],
        }
    }

    pub fn from_cells(dims: Dimensions, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), dims.area());
        Self { dims, cells }
    }

    #[inline]
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.dims.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.dims.height()
    }

    #[inline]
    pub fn contains(&self, square: Square) -> bool {
        self.dims.contains(square)
    }

    /// Bounds-checked lookup; `None` means there is no such square.
    #[inline]
    pub fn get(&self, square: Square) -> Option<&Cell> {
        let index = self.dims.to_index(square)?;
        self.cells.get(index)
    }

    #[inline]
    pub fn material(&self, square: Square) -> Option<Material> {
        self.get(square).and_then(Cell::material)
    }

    #[inline]
    pub fn is_vacant(&self, square: Square) -> bool {
        matches!(self.get(square), Some(Cell::Empty))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Replaces the contents of `square`, returning what was there.
    pub(crate) fn replace(&mut self, square: Square, cell: Cell) -> Cell {
        let index = self
            .dims
            .to_index(square)
            .unwrap_or_else(|| panic!("Board::replace: {} is off the board", square));
        std::mem::replace(&mut self.cells[index], cell)
    }

    /// Every occupied square together with its material.
    pub fn occupied(&self) -> impl Iterator<Item = (Square, Material)> + '_ {
        self.cells.iter().enumerate().filter_map(|(index, cell)| {
            cell.material()
                .map(|material| (self.dims.from_index(index), material))
        })
    }

    pub fn pieces_of(&self, player: PlayerId) -> impl Iterator<Item = (Square, Material)> + '_ {
        self.occupied()
            .filter(move |(_, material)| material.owner() == player)
    }

    /// Squares holding a king or heir of `player`, in board order.
    pub fn royal_squares(&self, player: PlayerId) -> Vec<Square> {
        self.pieces_of(player)
            .filter(|(_, material)| material.piece().is_royal())
            .map(|(square, _)| square)
            .collect()
    }

    /// True when every square strictly between `from` and `to` is empty.
    /// Squares that are not on a common line are never clear.
    pub fn is_path_clear(&self, from: Square, to: Square) -> bool {
        match between(from, to) {
            Some(squares) => squares.into_iter().all(|square| self.is_vacant(square)),
            None => false,
        }
    }
}

impl Index<Square> for Board {
    type Output = Cell;

    /// # Panics
    ///
    /// Panics if `square` is off the board. Use `get` for a checked lookup.
    fn index(&self, square: Square) -> &Self::Output {
        self.get(square)
            .unwrap_or_else(|| panic!("Board::index: {} is off the board", square))
    }
}

/// Squares strictly between `start` and `end` if they share a rank, file
/// or diagonal. Returns `None` otherwise.
pub fn between(start: Square, end: Square) -> Option<Vec<Square>> {
    let offset = end - start;
    let step = offset.to_unit()?;
    let mut squares = Vec::with_capacity(offset.steps() as usize);
    let mut next = start + step;
    while next != end {
        squares.push(next);
        next = next + step;
    }
    Some(squares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::material::Piece;

    fn sq(x: i32, y: i32) -> Square {
        Square::new(x, y)
    }

    #[test]
    fn test_between_along_rank() {
        let squares = between(sq(0, 5), sq(4, 5)).unwrap();
        assert_eq!(squares, vec![sq(1, 5), sq(2, 5), sq(3, 5)]);
    }
    #[test]
    fn test_between_diagonal() {
        let squares = between(sq(0, 7), sq(3, 4)).unwrap();
        assert_eq!(squares, vec![sq(1, 6), sq(2, 5)]);
    }
    #[test]
    fn test_between_adjacent_is_empty() {
        assert_eq!(between(sq(6, 4), sq(5, 3)), Some(vec![]));
    }
    #[test]
    fn test_between_off_line() {
        assert_eq!(between(sq(0, 7), sq(7, 3)), None);
        assert_eq!(between(sq(2, 2), sq(2, 2)), None);
    }
    #[test]
    fn test_get_out_of_bounds() {
        let board = Board::new(Dimensions::new(3, 2));
        assert!(board.get(sq(2, 1)).is_some());
        assert!(board.get(sq(3, 0)).is_none());
        assert!(board.get(sq(0, -1)).is_none());
    }
    #[test]
    fn test_replace_and_royal_squares() {
        let mut board = Board::new(Dimensions::new(4, 4));
        let owner = PlayerId::new(0);
        let prior = board.replace(sq(1, 1), Material::new(owner, Piece::King).into());
        assert_eq!(prior, Cell::Empty);
        board.replace(sq(3, 3), Material::new(owner, Piece::Heir).into());
        board.replace(sq(2, 2), Material::new(owner, Piece::Queen).into());
        assert_eq!(board.royal_squares(owner), vec![sq(1, 1), sq(3, 3)]);
        assert!(board.royal_squares(PlayerId::new(1)).is_empty());
    }
    #[test]
    fn test_path_clear() {
        let mut board = Board::new(Dimensions::new(8, 8));
        assert!(board.is_path_clear(sq(0, 0), sq(7, 0)));
        board.replace(sq(3, 0), Cell::Blocked);
        assert!(!board.is_path_clear(sq(0, 0), sq(7, 0)));
        assert!(board.is_path_clear(sq(0, 0), sq(3, 0)));
        assert!(!board.is_path_clear(sq(0, 0), sq(1, 2)));
    }
}
