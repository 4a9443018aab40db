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

use crate::board::Piece;

use Piece::*;

/// Value of a position in which a player can no longer move. Larger than
/// any material swing.
pub const MATE_VALUE: f32 = 1.0e6;

/// Base material weight, in pawns.
pub const fn piece_weight(piece: Piece) -> f32 {
    match piece {
        Pawn => 1.0,
        Knight => 3.0,
        Bishop => 4.0,
        Rook => 6.0,
        Archbishop => 7.0,
        Chancellor => 9.0,
        Queen => 10.0,
        King | Heir => 2.0,
    }
}

/// Material weight plus a mobility bonus of up to two pawns, scaled by
/// how many of the board's cells the piece can currently reach.
pub fn piece_value(piece: Piece, mobility: usize, area: usize) -> f32 {
    piece_weight(piece) + 2.0 * mobility as f32 / area.max(1) as f32
}

/// Value to a player who has no legal move: losing if it is in check (or
/// cannot avoid elimination), winning if it is stalemated.
pub fn stuck_value(checked: bool) -> f32 {
    if checked {
        -MATE_VALUE
    } else {
        MATE_VALUE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_order_pieces() {
        assert!(piece_weight(Queen) > piece_weight(Chancellor));
        assert!(piece_weight(Chancellor) > piece_weight(Archbishop));
        assert!(piece_weight(Rook) > piece_weight(Bishop));
        assert!(piece_weight(Bishop) > piece_weight(Knight));
        assert_eq!(piece_weight(King), piece_weight(Heir));
    }
    #[test]
    fn test_mobility_bonus() {
        assert_eq!(piece_value(Rook, 0, 64), 6.0);
        assert_eq!(piece_value(Rook, 32, 64), 7.0);
        assert_eq!(piece_value(Knight, 64, 64), 5.0);
    }
    #[test]
    fn test_stuck_values() {
        assert_eq!(stuck_value(true), -MATE_VALUE);
        assert_eq!(stuck_value(false), MATE_VALUE);
    }
}
