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
use thiserror::Error;

use super::moves::Move;
use super::play::Game;
use super::square::{Dimensions, Square};

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotationError {
    #[error("`{0}` is not a square on this board")]
    BadSquare(String),
    #[error("`{0}` is not a move in coordinate notation")]
    BadMove(String),
}

const FILES: &str = "abcdefghijklmnopqrstuvwxyz";

/// Names a square as a file letter and a rank number. Ranks count up
/// from the bottom row of the layout. Boards wider than 26 columns have
/// no name for the extra files.
pub fn square_name(dims: Dimensions, square: Square) -> Option<String> {
    if !dims.contains(square) {
        return None;
    }
    let file = FILES.chars().nth(square.x() as usize)?;
    let rank = dims.height() as i32 - square.y();
    Some(format!("{}{}", file, rank))
}

/// Reads a square such as `e4`.
pub fn parse_square(dims: Dimensions, text: &str) -> Result<Square, NotationError> {
    let bad = || NotationError::BadSquare(text.to_string());
    let mut chars = text.chars();
    let file = chars.next().ok_or_else(bad)?;
    let x = FILES.find(file.to_ascii_lowercase()).ok_or_else(bad)?;
    let rank: i32 = chars.as_str().parse().map_err(|_| bad())?;
    let square = Square::new(x as i32, dims.height() as i32 - rank);
    if dims.contains(square) {
        Ok(square)
    } else {
        Err(bad())
    }
}

/// Splits `e2e4` (or `e2-e4`) into its two squares. Neither the turn nor
/// legality is checked; a castle is written as the king's source and
/// landing squares and is resolved when the move is validated.
pub fn parse_move(dims: Dimensions, text: &str) -> Result<Move, NotationError> {
    let trimmed = text.trim();
    let bad = || NotationError::BadMove(text.to_string());
    let split = trimmed
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_ascii_alphabetic())
        .map(|(index, _)| index)
        .ok_or_else(bad)?;
    let from = trimmed[..split].trim_end_matches('-');
    let to = &trimmed[split..];
    Ok(Move::new(parse_square(dims, from)?, parse_square(dims, to)?))
}

pub fn move_name(dims: Dimensions, mv: Move) -> Option<String> {
    Some(format!(
        "{}{}",
        square_name(dims, mv.from)?,
        square_name(dims, mv.to)?
    ))
}

impl Game {
    pub fn parse_move(&self, text: &str) -> Result<Move, NotationError> {
        parse_move(self.dims(), text)
    }
    pub fn square_name(&self, square: Square) -> Option<String> {
        square_name(self.dims(), square)
    }
}
