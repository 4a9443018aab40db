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

use crate::board::{
    capabilities, on_ray, pawn_captures, CastleLanding, Game, Generator, Material, Move, Offset,
    Square,
};

/// Restore point returned by `MoveCache::invalidate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMark(usize);

/// Pseudo-legal moves per square, filled on demand.
///
/// Entries are dropped when a move may have changed them and logged so
/// that `restore` puts back exactly what was there before. Entries filled
/// inside a variation are logged as well, which keeps the cache identical
/// across an invalidate/restore pair.
#[derive(Debug, Clone, Default)]
pub struct MoveCache {
    entries: Vec<Option<Vec<Move>>>,
    log: Vec<(usize, Option<Vec<Move>>)>,
    depth: usize,
}

impl MoveCache {
    pub fn new(area: usize) -> Self {
        Self {
            entries: vec![None; area],
            log: Vec::new(),
            depth: 0,
        }
    }

    pub fn reset(&mut self, area: usize) {
        self.entries.clear();
        self.entries.resize(area, None);
        self.log.clear();
        self.depth = 0;
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn entries(&self) -> &[Option<Vec<Move>>] {
        &self.entries
    }

    /// Pseudo-legal moves of whatever stands on `square`.
    pub fn moves(&mut self, game: &Game, square: Square) -> &[Move] {
        let Some(index) = game.dims().to_index(square) else {
            return &[];
        };
        if index >= self.entries.len() {
            self.reset(game.dims().area());
        }
        let entry = &mut self.entries[index];
        if entry.is_none() && self.depth > 0 {
            self.log.push((index, None));
        }
        entry.get_or_insert_with(|| game.pseudo_moves(square))
    }

    /// Drops every entry that `mv`, already applied to `game`, may have
    /// changed: the squares it touched, every royal piece (castling
    /// depends on check), and every piece whose geometry reaches one of
    /// the touched squares, ignoring blockers.
    pub fn invalidate(&mut self, game: &Game, mv: &Move) -> CacheMark {
        let mark = CacheMark(self.log.len());
        self.depth += 1;
        let touched = touched_squares(mv);
        let dims = game.dims();
        for index in 0..self.entries.len().min(dims.area()) {
            if self.entries[index].is_none() {
                continue;
            }
            let square = dims.from_index(index);
            let stale = touched.contains(&square)
                || game.board().material(square).map_or(false, |material| {
                    material.piece().is_royal() || reaches_any(square, material, &touched)
                });
            if stale {
                let prior = self.entries[index].take();
                self.log.push((index, prior));
            }
        }
        mark
    }

    /// Undoes everything since `mark`, most recent first.
    pub fn restore(&mut self, mark: CacheMark) {
        while self.log.len() > mark.0 {
            if let Some((index, prior)) = self.log.pop() {
                self.entries[index] = prior;
            }
        }
        self.depth = self.depth.saturating_sub(1);
    }
}

fn touched_squares(mv: &Move) -> Vec<Square> {
    let mut touched = vec![mv.from, mv.to];
    if let Some(partner) = mv.castle {
        touched.push(partner);
        if let Some(landing) = CastleLanding::new(mv.from, partner) {
            touched.push(landing.partner_to);
        }
    }
    touched
}

/// Could `material` on `from` ever move to, or be blocked at, any of
/// `targets` on an empty board?
fn reaches_any(from: Square, material: Material, targets: &[Square]) -> bool {
    targets.iter().any(|target| {
        let offset = *target - from;
        capabilities(material.piece()).iter().any(|generator| match *generator {
            Generator::Slide(rays) => on_ray(rays, offset),
            Generator::Leap(offsets) => offsets.contains(&offset),
            Generator::Pawn => pawn_reaches(material, offset),
            Generator::Castle => offset.is_orthogonal(),
        })
    })
}

fn pawn_reaches(material: Material, offset: Offset) -> bool {
    let ahead: Offset = material.facing().into();
    offset == ahead || offset == ahead * 2 || pawn_captures(material.facing()).contains(&offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Validation;

    fn sq(x: i32, y: i32) -> Square {
        Square::new(x, y)
    }

    fn fill(cache: &mut MoveCache, game: &Game) {
        for square in game.dims().squares() {
            cache.moves(game, square);
        }
    }

    /// Every cached entry must match a fresh generation on the current
    /// board.
    fn assert_consistent(cache: &MoveCache, game: &Game) {
        for (index, entry) in cache.entries().iter().enumerate() {
            if let Some(moves) = entry {
                let square = game.dims().from_index(index);
                assert_eq!(moves, &game.pseudo_moves(square), "stale entry at {}", square);
            }
        }
    }

    #[test]
    fn test_moves_match_generator() {
        let game = Game::standard();
        let mut cache = MoveCache::new(game.dims().area());
        let moves = cache.moves(&game, sq(6, 7)).to_vec();
        assert_eq!(moves, game.pseudo_moves(sq(6, 7)));
        assert!(cache.moves(&game, sq(4, 4)).is_empty());
        assert!(cache.moves(&game, sq(-1, 4)).is_empty());
    }
    #[test]
    fn test_invalidate_after_apply_keeps_cache_correct() {
        let mut game = Game::standard();
        let mut cache = MoveCache::new(game.dims().area());
        let script = ["e2e4", "d7d5", "e4d5", "d8d5", "b1c3", "d5e5", "f1e2", "c8g4"];
        for text in script {
            let mv = game.parse_move(text).unwrap();
            let player = game.current();
            fill(&mut cache, &game);
            let mv = game.validate_move(mv, player).unwrap();
            {
                let applied = game.apply(mv);
                let mark = cache.invalidate(&applied, &mv);
                assert_consistent(&cache, &applied);
                fill(&mut cache, &applied);
                assert_consistent(&cache, &applied);
                cache.restore(mark);
            }
            assert_consistent(&cache, &game);
            game.apply_move(mv, Validation::TRUSTED, player).unwrap();
            cache.reset(game.dims().area());
        }
    }
    #[test]
    fn test_restore_is_bit_identical() {
        let mut game = Game::standard();
        let mut cache = MoveCache::new(game.dims().area());
        cache.moves(&game, sq(4, 6));
        cache.moves(&game, sq(3, 7));
        cache.moves(&game, sq(1, 0));
        let before = cache.entries().to_vec();
        let first = Move::new(sq(4, 6), sq(4, 4));
        {
            let mut applied = game.apply(first);
            let outer = cache.invalidate(&applied, &first);
            fill(&mut cache, &applied);
            let second = Move::new(sq(3, 1), sq(3, 3));
            {
                let applied = applied.apply(second);
                let inner = cache.invalidate(&applied, &second);
                fill(&mut cache, &applied);
                assert_consistent(&cache, &applied);
                cache.restore(inner);
            }
            assert_consistent(&cache, &applied);
            cache.restore(outer);
        }
        assert_eq!(cache.entries(), &before[..]);
        assert_eq!(cache.depth(), 0);
    }
    #[test]
    fn test_castle_invalidates_partner() {
        let layout = "0 White\n2 Black\n\n. . . . 1K . . .\n. . . . . . . .\n0R . . . 0K . . 0R\n";
        let mut game: Game = layout.parse().unwrap();
        let mut cache = MoveCache::new(game.dims().area());
        fill(&mut cache, &game);
        let castle = Move::castle(sq(4, 2), sq(6, 2), sq(7, 2));
        let applied = game.apply(castle);
        cache.invalidate(&applied, &castle);
        assert_consistent(&cache, &applied);
        assert!(cache.entries()[applied.dims().to_index(sq(7, 2)).unwrap()].is_none());
        assert!(cache.entries()[applied.dims().to_index(sq(5, 2)).unwrap()].is_none());
    }
}
