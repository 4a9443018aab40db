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

//! Board for chess variants with any number of players
//!
//! A _game_ holds a rectangular board of any size, the players seated
//! around it and the order in which they move. The following features
//! are supported:
//!
//! [x] Boards of any width and height, with impassable cells
//! [x] Any number of players, each with a display rotation
//! [x] Alliances (allies never attack or capture each other)
//! [x] Archbishop, chancellor and heir in addition to the standard pieces
//! [x] Pawns facing any of the eight directions
//! [x] Castling with configurable partner pieces
//! [x] Automatic promotion at the edge a pawn faces
//! [x] Elimination rules (no check, last player able to move wins)
//! [x] Take backs that skip over engine moves
//! [x] Review prior positions
//! [ ] En passant
//! [ ] Repetition and fifty-move draws
//!
//! Some of the key abstractions include:
//!
//! * A `Square` is an `(x, y)` coordinate with `y` growing downward, so
//!   `(0, 0)` is the top-left cell of a layout. `Dimensions` decides
//!   which squares exist and maps them to cell indices.
//!
//! * `Material` is a piece owned by a player, together with the
//!   direction a pawn faces and whether the piece has moved. A `Cell`
//!   is empty, blocked or holds material.
//!
//! * Every `Piece` is a union of primitive move generators (slides,
//!   leaps, the pawn rule and castling) looked up in a static table.
//!   Check is defined in terms of the same generators: a player is in
//!   check when every one of its kings is attacked.
//!
//! * `Game::apply` plays a move speculatively and returns a guard that
//!   reverts it when dropped. Every change goes through an undo log, so
//!   nested variations unwind in order and the board is never copied.
//!
//! * `Game::apply_move` is the only way to commit a move. It validates
//!   turn, ownership and legality, records the move, updates check and
//!   mate for every player and passes the turn on, skipping players who
//!   are mated.
//!
//! * `ReviewState` rebuilds every position of a game from its history
//!   so a host can step backward and forward through it.
//!

mod castling;
mod layout;
mod material;
mod moves;
mod notation;
mod play;
mod player;
mod position;
mod review;
mod square;
mod undo;

pub use castling::*;
pub use layout::*;
pub use material::*;
pub use moves::*;
pub use notation::*;
pub use play::*;
pub use player::*;
pub use position::*;
pub use review::*;
pub use square::*;
pub use undo::{Applied, UndoMark};

pub trait Turn {
    fn turn(&self) -> PlayerId;
}
