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
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use strum_macros::EnumIter;

/// A coordinate on a board of arbitrary size. Column `x` grows to the
/// right and row `y` grows downward, so `(0, 0)` is the top-left cell of
/// the textual layout. A square may lie outside any particular board;
/// `Dimensions::contains` decides.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square {
    x: i32,
    y: i32,
}

impl Square {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
    #[inline]
    pub const fn x(&self) -> i32 {
        self.x
    }
    #[inline]
    pub const fn y(&self) -> i32 {
        self.y
    }
    /// Number of king steps between two squares.
    #[inline]
    pub fn distance(&self, other: Square) -> i32 {
        let offset = other - *self;
        offset.x.abs().max(offset.y.abs())
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

impl Offset {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Reduces an orthogonal or diagonal offset to a single step.
    pub fn to_unit(self) -> Option<Self> {
        let (x, y) = match (self.x, self.y) {
            (0, 0) => return None,
            (x, y) if x == 0 || y == 0 || x.abs() == y.abs() => (x.signum(), y.signum()),
            _ => return None,
        };
        Some(Self { x, y })
    }

    /// Length of an orthogonal or diagonal offset in steps.
    pub fn steps(self) -> i32 {
        self.x.abs().max(self.y.abs())
    }

    pub fn is_orthogonal(self) -> bool {
        (self.x == 0) != (self.y == 0)
    }

    pub fn is_diagonal(self) -> bool {
        self.x != 0 && self.x.abs() == self.y.abs()
    }
}

impl Neg for Offset {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<i32> for Offset {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Add for Offset {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Add<Offset> for Square {
    type Output = Square;
    fn add(self, rhs: Offset) -> Self::Output {
        Square::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Add<&Offset> for Square {
    type Output = Square;
    fn add(self, rhs: &Offset) -> Self::Output {
        Square::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Square {
    type Output = Offset;
    fn sub(self, rhs: Self) -> Self::Output {
        Offset::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Direction {
    UpLeft,
    Up,
    UpRight,
    Left,
    Right,
    DownLeft,
    Down,
    DownRight,
}

use Direction::{Down, DownLeft, DownRight, Left, Right, Up, UpLeft, UpRight};

impl Direction {
    #[inline]
    pub fn is_horizontal(&self) -> bool {
        matches!(*self, Up | Left | Right | Down)
    }
    #[inline]
    pub fn is_diagonal(&self) -> bool {
        matches!(*self, UpLeft | UpRight | DownLeft | DownRight)
    }
    pub fn horizontals() -> impl Iterator<Item = Self> {
        [Up, Left, Right, Down].into_iter()
    }
    pub fn diagonals() -> impl Iterator<Item = Self> {
        [UpLeft, UpRight, DownLeft, DownRight].into_iter()
    }
    pub fn from_offset(offset: Offset) -> Option<Self> {
        let unit = offset.to_unit()?;
        if unit != offset {
            return None;
        }
        Some(match (unit.x, unit.y) {
            (-1, -1) => UpLeft,
            (0, -1) => Up,
            (1, -1) => UpRight,
            (-1, 0) => Left,
            (1, 0) => Right,
            (-1, 1) => DownLeft,
            (0, 1) => Down,
            _ => DownRight,
        })
    }
}

impl From<Direction> for Offset {
    fn from(value: Direction) -> Self {
        match value {
            UpLeft => Self::new(-1, -1),
            Up => Self::new(0, -1),
            UpRight => Self::new(1, -1),
            Left => Self::new(-1, 0),
            Right => Self::new(1, 0),
            DownLeft => Self::new(-1, 1),
            Down => Self::new(0, 1),
            DownRight => Self::new(1, 1),
        }
    }
}

impl Add<Direction> for Square {
    type Output = Square;
    fn add(self, rhs: Direction) -> Self::Output {
        let offset: Offset = rhs.into();
        self + offset
    }
}

/// Width and height of a board, and the row-major mapping between
/// squares and cell indices.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    width: usize,
    height: usize,
}

impl Dimensions {
    #[inline]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }
    #[inline]
    pub const fn height(&self) -> usize {
        self.height
    }
    #[inline]
    pub const fn area(&self) -> usize {
        self.width * self.height
    }
    #[inline]
    pub fn contains(&self, square: Square) -> bool {
        square.x >= 0
            && square.y >= 0
            && (square.x as usize) < self.width
            && (square.y as usize) < self.height
    }
    #[inline]
    pub fn to_index(&self, square: Square) -> Option<usize> {
        if !self.contains(square) {
            return None;
        }
        Some(square.y as usize * self.width + square.x as usize)
    }
    #[inline]
    pub fn from_index(&self, index: usize) -> Square {
        debug_assert!(index < self.area());
        Square::new((index % self.width) as i32, (index / self.width) as i32)
    }
    pub fn squares(&self) -> impl Iterator<Item = Square> + '_ {
        (0..self.area()).map(|index| self.from_index(index))
    }

    /// Maps a square into the frame of a player seated at `rotation`
    /// quarter turns. Only used for display.
    pub fn rotate(&self, rotation: u8, square: Square) -> Square {
        let rotation = rotation % 4;
        let odd = rotation % 2 == 1;
        let (mut x, mut y) = if odd {
            (square.y, square.x)
        } else {
            (square.x, square.y)
        };
        if rotation == 1 || rotation == 2 {
            let extent = if odd { self.width } else { self.height };
            y = extent as i32 - 1 - y;
        }
        if rotation > 1 {
            let extent = if odd { self.height } else { self.width };
            x = extent as i32 - 1 - x;
        }
        Square::new(x, y)
    }

    /// The dimensions as seen by a player seated at `rotation`.
    pub fn rotated(&self, rotation: u8) -> Self {
        if rotation % 2 == 1 {
            Self::new(self.height, self.width)
        } else {
            *self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_index_round_trip() {
        let dims = Dimensions::new(5, 3);
        for index in 0..dims.area() {
            let square = dims.from_index(index);
            assert_eq!(dims.to_index(square), Some(index));
        }
    }
    #[test]
    fn test_out_of_bounds() {
        let dims = Dimensions::new(8, 8);
        assert_eq!(dims.to_index(Square::new(-1, 0)), None);
        assert_eq!(dims.to_index(Square::new(0, 8)), None);
        assert_eq!(dims.to_index(Square::new(8, 0)), None);
        assert_eq!(dims.to_index(Square::new(7, 7)), Some(63));
    }
    #[test]
    fn test_rotation_identity() {
        let dims = Dimensions::new(6, 4);
        let square = Square::new(2, 1);
        assert_eq!(dims.rotate(0, square), square);
    }
    #[test]
    fn test_rotation_half_turn() {
        let dims = Dimensions::new(6, 4);
        assert_eq!(dims.rotate(2, Square::new(0, 0)), Square::new(5, 3));
        assert_eq!(dims.rotate(2, Square::new(5, 3)), Square::new(0, 0));
    }
    #[test]
    fn test_rotation_stays_on_rotated_board() {
        let dims = Dimensions::new(6, 4);
        for rotation in 0..4 {
            let rotated = dims.rotated(rotation);
            for square in dims.squares() {
                assert!(rotated.contains(dims.rotate(rotation, square)));
            }
        }
    }
    #[test]
    fn test_unit_offsets() {
        assert_eq!(Offset::new(0, 5).to_unit(), Some(Offset::new(0, 1)));
        assert_eq!(Offset::new(-3, 3).to_unit(), Some(Offset::new(-1, 1)));
        assert_eq!(Offset::new(1, 2).to_unit(), None);
        assert_eq!(Offset::new(0, 0).to_unit(), None);
    }
    #[test]
    fn test_direction_offsets_round_trip() {
        for dir in Direction::iter() {
            assert_eq!(Direction::from_offset(dir.into()), Some(dir));
        }
        assert_eq!(Direction::from_offset(Offset::new(2, 0)), None);
    }
}
