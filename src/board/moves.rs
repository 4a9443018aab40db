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

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::material::{Cell, Material, Piece, PlayerId};
use super::play::Game;
use super::square::{Direction, Offset, Square};

use Piece::*;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveError {
    #[error("Not a legal move")]
    InvalidMove,
    #[error("Not this player's turn")]
    WrongTurn,
    #[error("Piece belongs to another player")]
    WrongOwner,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    /// Square of the castle partner when the move is a castle.
    pub castle: Option<Square>,
}

impl Move {
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            castle: None,
        }
    }
    pub const fn castle(from: Square, to: Square, partner: Square) -> Self {
        Self {
            from,
            to,
            castle: Some(partner),
        }
    }
    #[inline]
    pub fn is_castle(&self) -> bool {
        self.castle.is_some()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.castle {
            Some(partner) => write!(f, "{}-{} (castle with {})", self.from, self.to, partner),
            None => write!(f, "{}-{}", self.from, self.to),
        }
    }
}

/// A primitive way of moving. Each piece type is the union of one or
/// more generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    /// Repeats each step until the first occupied cell.
    Slide(&'static [Offset]),
    /// Jumps straight to each offset.
    Leap(&'static [Offset]),
    /// Advances along the pawn's facing, captures to either side of it.
    Pawn,
    /// Swaps places with an unmoved partner on the same rank or file.
    Castle,
}

pub(crate) const ORTHOGONALS: [Offset; 4] = [
    Offset::new(0, -1),
    Offset::new(-1, 0),
    Offset::new(1, 0),
    Offset::new(0, 1),
];

pub(crate) const DIAGONALS: [Offset; 4] = [
    Offset::new(-1, -1),
    Offset::new(1, -1),
    Offset::new(-1, 1),
    Offset::new(1, 1),
];

const ALL_LINES: [Offset; 8] = [
    Offset::new(0, -1),
    Offset::new(-1, 0),
    Offset::new(1, 0),
    Offset::new(0, 1),
    Offset::new(-1, -1),
    Offset::new(1, -1),
    Offset::new(-1, 1),
    Offset::new(1, 1),
];

const KNIGHT_JUMPS: [Offset; 8] = [
    Offset::new(-2, -1),
    Offset::new(-2, 1),
    Offset::new(2, -1),
    Offset::new(2, 1),
    Offset::new(-1, -2),
    Offset::new(-1, 2),
    Offset::new(1, -2),
    Offset::new(1, 2),
];

static CAPABILITIES: Lazy<[Vec<Generator>; Piece::COUNT]> = Lazy::new(|| {
    std::array::from_fn(|index| match Piece::from_index(index) {
        Pawn => vec![Generator::Pawn],
        Knight => vec![Generator::Leap(&KNIGHT_JUMPS)],
        Bishop => vec![Generator::Slide(&DIAGONALS)],
        Rook => vec![Generator::Slide(&ORTHOGONALS)],
        Queen => vec![Generator::Slide(&ALL_LINES)],
        King | Heir => vec![Generator::Leap(&ALL_LINES), Generator::Castle],
        Archbishop => vec![
            Generator::Slide(&DIAGONALS),
            Generator::Leap(&KNIGHT_JUMPS),
        ],
        Chancellor => vec![
            Generator::Slide(&ORTHOGONALS),
            Generator::Leap(&KNIGHT_JUMPS),
        ],
    })
});

#[inline]
pub fn capabilities(piece: Piece) -> &'static [Generator] {
    &CAPABILITIES[piece.to_index()]
}

/// The two squares a pawn captures on, relative to the pawn. An
/// orthogonal pawn takes on the diagonals ahead of it; a diagonal pawn
/// takes on the two orthogonal components of its facing.
pub fn pawn_captures(facing: Direction) -> [Offset; 2] {
    let ahead: Offset = facing.into();
    if facing.is_horizontal() {
        let side = Offset::new(ahead.y.abs(), ahead.x.abs());
        [ahead + side, ahead + -side]
    } else {
        [Offset::new(ahead.x, 0), Offset::new(0, ahead.y)]
    }
}

/// True when `offset` lands on one of the rays in `rays`, at any range.
#[inline]
pub(crate) fn on_ray(rays: &[Offset], offset: Offset) -> bool {
    offset.to_unit().map_or(false, |unit| rays.contains(&unit))
}

impl Game {
    /// Destinations reachable by geometry alone: cells that are on the
    /// board, not blocked and not held by an ally. Does not consider
    /// whether the move exposes the mover's kings.
    pub fn pseudo_moves(&self, from: Square) -> Vec<Move> {
        let mut result = Vec::new();
        let Some(material) = self.board().material(from) else {
            return result;
        };
        for generator in capabilities(material.piece()) {
            match *generator {
                Generator::Slide(rays) => self.slide_moves(from, material, rays, &mut result),
                Generator::Leap(offsets) => self.leap_moves(from, material, offsets, &mut result),
                Generator::Pawn => self.pawn_moves(from, material, &mut result),
                Generator::Castle => self.castle_moves(from, material, &mut result),
            }
        }
        result
    }

    /// Pseudo moves that do not leave the mover in check.
    pub fn legal_moves(&mut self, from: Square) -> Vec<Move> {
        let Some(owner) = self.board().material(from).map(|m| m.owner()) else {
            return Vec::new();
        };
        let mut moves = self.pseudo_moves(from);
        if !self.rules().elimination {
            moves.retain(|mv| !self.exposes(owner, *mv));
        }
        moves
    }

    /// Every legal move of every piece `player` owns.
    pub fn all_legal_moves(&mut self, player: PlayerId) -> Vec<Move> {
        let squares: Vec<Square> = self.board().pieces_of(player).map(|(sq, _)| sq).collect();
        squares
            .into_iter()
            .flat_map(|square| self.legal_moves(square))
            .collect()
    }

    pub fn has_legal_move(&mut self, player: PlayerId) -> bool {
        let squares: Vec<Square> = self.board().pieces_of(player).map(|(sq, _)| sq).collect();
        for square in squares {
            let moves = self.pseudo_moves(square);
            if moves.iter().any(|mv| !self.exposes(player, *mv)) {
                return true;
            }
        }
        false
    }

    /// Speculatively plays `mv` and reports whether `player` is then in
    /// check. The game is restored before returning.
    pub fn exposes(&mut self, player: PlayerId, mv: Move) -> bool {
        if self.rules().elimination {
            return false;
        }
        self.apply(mv).player_check(player)
    }

    /// A player is in check when it has at least one king and every one
    /// of its kings is attacked by a non-allied piece. Under elimination
    /// rules nobody is ever in check.
    pub fn player_check(&self, player: PlayerId) -> bool {
        if self.rules().elimination {
            return false;
        }
        let kings = self.player(player).kings();
        !kings.is_empty() && kings.iter().all(|king| self.is_attacked(*king, player))
    }

    /// True when some piece not allied with `defender` could move onto
    /// `target`.
    pub fn is_attacked(&self, target: Square, defender: PlayerId) -> bool {
        self.board()
            .occupied()
            .filter(|(_, material)| !self.is_ally(defender, material.owner()))
            .any(|(from, material)| self.attacks(from, material, target))
    }

    /// Geometric test: could `material` standing on `from` capture on
    /// `target`? Ignores what stands on `target`.
    pub fn attacks(&self, from: Square, material: Material, target: Square) -> bool {
        if from == target || !self.board().contains(target) {
            return false;
        }
        let offset = target - from;
        capabilities(material.piece())
            .iter()
            .any(|generator| match *generator {
                Generator::Slide(rays) => {
                    on_ray(rays, offset) && self.board().is_path_clear(from, target)
                }
                Generator::Leap(offsets) => offsets.contains(&offset),
                Generator::Pawn => pawn_captures(material.facing()).contains(&offset),
                Generator::Castle => false,
            })
    }

    /// Whether a piece of `mover` may end its move on `cell`.
    #[inline]
    fn is_target(&self, mover: PlayerId, cell: &Cell) -> bool {
        match cell {
            Cell::Empty => true,
            Cell::Blocked => false,
            Cell::Occupied(material) => !self.is_ally(mover, material.owner()),
        }
    }

    fn slide_moves(&self, from: Square, material: Material, rays: &[Offset], out: &mut Vec<Move>) {
        for ray in rays {
            let mut to = from + ray;
            while let Some(cell) = self.board().get(to) {
                if self.is_target(material.owner(), cell) {
                    out.push(Move::new(from, to));
                }
                if !cell.is_empty() {
                    break;
                }
                to = to + ray;
            }
        }
    }

    fn leap_moves(&self, from: Square, material: Material, offsets: &[Offset], out: &mut Vec<Move>) {
        for offset in offsets {
            let to = from + offset;
            if let Some(cell) = self.board().get(to) {
                if self.is_target(material.owner(), cell) {
                    out.push(Move::new(from, to));
                }
            }
        }
    }

    fn pawn_moves(&self, from: Square, material: Material, out: &mut Vec<Move>) {
        let ahead: Offset = material.facing().into();
        let one = from + ahead;
        if self.board().is_vacant(one) {
            out.push(Move::new(from, one));
            let two = one + ahead;
            if material.is_unmoved() && self.board().is_vacant(two) {
                out.push(Move::new(from, two));
            }
        }
        for offset in pawn_captures(material.facing()) {
            let to = from + offset;
            if let Some(Cell::Occupied(target)) = self.board().get(to) {
                if !self.is_ally(material.owner(), target.owner()) {
                    out.push(Move::new(from, to));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::play::Validation;

    fn sq(x: i32, y: i32) -> Square {
        Square::new(x, y)
    }

    fn destinations(moves: &[Move]) -> Vec<Square> {
        let mut result: Vec<Square> = moves.iter().map(|mv| mv.to).collect();
        result.sort();
        result
    }

    #[test]
    fn test_standard_opening_move_count() {
        let mut game = Game::standard();
        assert_eq!(game.all_legal_moves(PlayerId::new(0)).len(), 20);
        assert_eq!(game.all_legal_moves(PlayerId::new(1)).len(), 20);
    }
    #[test]
    fn test_pawn_single_and_double_advance() {
        let mut game = Game::standard();
        let moves = game.legal_moves(sq(4, 6));
        assert_eq!(destinations(&moves), vec![sq(4, 4), sq(4, 5)]);
    }
    #[test]
    fn test_moved_pawn_single_advance_only() {
        let layout = "0 White\n2 Black\n\n1K\n.\n0p↑\n0K\n";
        let mut game: Game = layout.parse().unwrap();
        let moves = game.legal_moves(sq(0, 2));
        assert_eq!(destinations(&moves), vec![sq(0, 1)]);
    }
    #[test]
    fn test_pawn_captures_only_enemies() {
        let layout = "0 White\n2 Black\n\n1K . . .\n1N . 0N .\n. 0P↑ . .\n0K . . .\n";
        let mut game: Game = layout.parse().unwrap();
        let moves = game.legal_moves(sq(1, 2));
        assert_eq!(destinations(&moves), vec![sq(0, 1), sq(1, 0), sq(1, 1)]);
    }
    #[test]
    fn test_sideways_pawn_captures() {
        assert_eq!(
            pawn_captures(Direction::Right),
            [Offset::new(1, 1), Offset::new(1, -1)]
        );
        assert_eq!(
            pawn_captures(Direction::UpRight),
            [Offset::new(1, 0), Offset::new(0, -1)]
        );
    }
    #[test]
    fn test_blocked_cell_stops_slides() {
        let layout = "0 White\n2 Black\n\n1K . . . .\n. . . . .\n0R . # . .\n0K . . . .\n";
        let mut game: Game = layout.parse().unwrap();
        let moves = game.legal_moves(sq(0, 2));
        assert_eq!(destinations(&moves), vec![sq(0, 0), sq(0, 1), sq(1, 2)]);
    }
    #[test]
    fn test_archbishop_is_bishop_and_knight() {
        let layout = "0 White\n2 Black\n\n. . . . .\n. . . . .\n. . 0A . .\n. . . . .\n0K . . . 1K\n";
        let mut game: Game = layout.parse().unwrap();
        let moves = game.legal_moves(sq(2, 2));
        // seven diagonal squares, all eight knight squares
        assert_eq!(moves.len(), 15);
        assert!(destinations(&moves).contains(&sq(4, 3)));
        assert!(!destinations(&moves).contains(&sq(2, 3)));
    }
    #[test]
    fn test_chancellor_is_rook_and_knight() {
        let layout = "0 White\n2 Black\n\n. . . . .\n. . . . .\n. . 0C . .\n. . . . .\n0K . . . 1K\n";
        let mut game: Game = layout.parse().unwrap();
        let moves = game.legal_moves(sq(2, 2));
        assert!(destinations(&moves).contains(&sq(2, 4)));
        assert!(destinations(&moves).contains(&sq(3, 4)));
        assert!(!destinations(&moves).contains(&sq(3, 3)));
    }
    #[test]
    fn test_king_cannot_step_into_check() {
        let layout = "0 White\n2 Black\n\n. 1R . .\n. . . .\n. . . .\n0K . . .\n";
        let mut game: Game = layout.parse().unwrap();
        let moves = game.legal_moves(sq(0, 3));
        assert_eq!(destinations(&moves), vec![sq(0, 2)]);
    }
    #[test]
    fn test_pinned_piece_cannot_leave_line() {
        let layout = "0 White\n2 Black\n\n1R . 1K\n. . .\n0B . .\n. . .\n0K . .\n";
        let mut game: Game = layout.parse().unwrap();
        assert!(game.legal_moves(sq(0, 2)).is_empty());
    }
    #[test]
    fn test_player_check() {
        let quiet = "0 White\n2 Black\n\n. 1K . .\n. . . .\n. . . .\n. . . .\n. 0K . .\n";
        let game: Game = quiet.parse().unwrap();
        assert!(!game.player_check(PlayerId::new(0)));
        let checked = "0 White\n2 Black\n\n. 1K . .\n. . . .\n. . . .\n. . . .\n1R 0K . .\n";
        let game: Game = checked.parse().unwrap();
        assert!(game.player_check(PlayerId::new(0)));
        assert!(!game.player_check(PlayerId::new(1)));
    }
    #[test]
    fn test_heir_keeps_player_out_of_check() {
        let layout = "0 White\n2 Black\n\n. 1K . .\n. . . .\n. . . 0H\n. . . .\n1R 0K . .\n";
        let game: Game = layout.parse().unwrap();
        assert!(game.is_attacked(sq(1, 4), PlayerId::new(0)));
        assert!(!game.player_check(PlayerId::new(0)));
    }
    #[test]
    fn test_player_without_kings_is_never_in_check() {
        let layout = "0 White\n2 Black\n\n1K .\n. .\n0Q 1R\n";
        let game: Game = layout.parse().unwrap();
        assert!(game.player(PlayerId::new(0)).kings().is_empty());
        assert!(!game.player_check(PlayerId::new(0)));
    }
    #[test]
    fn test_allies_do_not_attack_each_other() {
        let layout = "0 North\n0 South\nalliance North South\n\n1R 0K . .\n";
        let game: Game = layout.parse().unwrap();
        assert!(!game.player_check(PlayerId::new(0)));
        assert!(game.is_ally(PlayerId::new(0), PlayerId::new(1)));
        assert!(game.is_ally(PlayerId::new(1), PlayerId::new(0)));
    }
    #[test]
    fn test_allies_cannot_capture_each_other() {
        let layout = "0 North\n0 South\nalliance North South\n\n1R 0K .\n. . .\n";
        let mut game: Game = layout.parse().unwrap();
        let moves = game.legal_moves(sq(0, 0));
        assert_eq!(destinations(&moves), vec![sq(0, 1)]);
    }
    #[test]
    fn test_elimination_ignores_check() {
        let layout = "0 White\n2 Black\nrule elimination\n\n. 1K . .\n. . . .\n. . . .\n. . . .\n1R 0K . .\n";
        let mut game: Game = layout.parse().unwrap();
        assert!(!game.player_check(PlayerId::new(0)));
        let moves = game.legal_moves(sq(1, 4));
        assert!(destinations(&moves).contains(&sq(1, 3)));
        assert!(destinations(&moves).contains(&sq(0, 3)));
    }
    #[test]
    fn test_attacks_ignores_target_owner() {
        let game = Game::standard();
        let knight = game.board().material(sq(1, 7)).unwrap();
        assert!(game.attacks(sq(1, 7), knight, sq(3, 6)));
        assert!(game.attacks(sq(1, 7), knight, sq(2, 5)));
        assert!(!game.attacks(sq(1, 7), knight, sq(1, 5)));
    }
    #[test]
    fn test_legal_moves_never_expose_king() {
        let mut game = Game::standard();
        for text in ["e2e4", "f7f6", "d1h5"] {
            let mv = game.parse_move(text).unwrap();
            let player = game.current();
            game.apply_move(mv, Validation::STRICT, player).unwrap();
        }
        let player = game.current();
        assert!(game.player_check(player));
        let moves = game.all_legal_moves(player);
        assert!(!moves.is_empty());
        for mv in moves {
            let applied = game.apply(mv);
            assert!(!applied.player_check(player), "{} exposes the king", mv);
        }
    }
}
