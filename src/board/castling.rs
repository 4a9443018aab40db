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

use super::material::{Cell, Material};
use super::moves::{Move, ORTHOGONALS};
use super::play::Game;
use super::position::between;
use super::square::Square;

/// Where the king and its partner end up after castling.
///
/// The king travels half the distance to its partner, rounded up, but
/// never onto the partner itself. The partner lands on the square the
/// king passed over last.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CastleLanding {
    pub king_to: Square,
    pub partner_to: Square,
}

impl CastleLanding {
    pub fn new(king: Square, partner: Square) -> Option<Self> {
        let offset = partner - king;
        if !offset.is_orthogonal() {
            return None;
        }
        let distance = offset.steps();
        if distance <= 1 {
            return None;
        }
        let step = offset.to_unit()?;
        let travel = ((distance + 1) / 2).min(distance - 1);
        let king_to = king + step * travel;
        Some(Self {
            king_to,
            partner_to: king_to + -step,
        })
    }
}

/// Squares that must be empty for a castle between `king` and `partner`.
pub fn blocking_lane(king: Square, partner: Square) -> Vec<Square> {
    between(king, partner).unwrap_or_default()
}

impl Game {
    /// Castle moves for a royal piece on `from`. Requires an unmoved king
    /// that is not under attack and an unmoved castleable partner of the
    /// same owner at the end of a clear rank or file. Squares the king
    /// crosses are not checked for attacks.
    pub(crate) fn castle_moves(&self, from: Square, king: Material, out: &mut Vec<Move>) {
        if !king.is_unmoved() || !king.piece().is_royal() {
            return;
        }
        if !self.rules().elimination && self.is_attacked(from, king.owner()) {
            return;
        }
        for ray in &ORTHOGONALS {
            let mut partner = from + ray;
            while let Some(Cell::Empty) = self.board().get(partner) {
                partner = partner + ray;
            }
            let Some(Cell::Occupied(material)) = self.board().get(partner) else {
                continue;
            };
            if !self.is_castle_partner(king, *material) {
                continue;
            }
            if let Some(landing) = CastleLanding::new(from, partner) {
                out.push(Move::castle(from, landing.king_to, partner));
            }
        }
    }

    fn is_castle_partner(&self, king: Material, partner: Material) -> bool {
        partner.owner() == king.owner()
            && partner.is_unmoved()
            && self.rules().castleable.contains(&partner.piece())
    }
}
