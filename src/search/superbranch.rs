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

use rand::Rng;

use crate::board::{Move, PlayerId};

/// One ply of a line: the move, who made it and the material it swung,
/// signed to the searching side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch {
    pub mv: Move,
    pub player: PlayerId,
    pub gain: f32,
}

/// A line of play from the root that the search keeps deepening.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Superbranch {
    pub value: f32,
    pub branches: Vec<Branch>,
    /// The line ends in mate or stalemate and cannot be extended.
    pub terminal: bool,
}

impl Superbranch {
    pub fn new(value: f32, branches: Vec<Branch>, terminal: bool) -> Self {
        Self {
            value,
            branches,
            terminal,
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.branches.len()
    }

    pub fn first_move(&self) -> Option<Move> {
        self.branches.first().map(|branch| branch.mv)
    }

    pub fn moves(&self) -> Vec<Move> {
        self.branches.iter().map(|branch| branch.mv).collect()
    }

    /// Material swung along the whole line.
    pub fn gain(&self) -> f32 {
        self.branches.iter().map(|branch| branch.gain).sum()
    }

    /// Still worth another ply of search.
    pub fn is_active(&self, ceiling: usize) -> bool {
        !self.terminal && self.depth() < ceiling
    }

    /// Value discounted for every ply this line is shallower than
    /// `deepest`, so that lines of unequal depth compare fairly.
    pub fn score(&self, deepest: usize, discount: f32) -> f32 {
        let missing = deepest.saturating_sub(self.depth());
        self.value * discount.powi(missing as i32)
    }
}

/// The best few root lines seen so far.
#[derive(Debug, Clone, Default)]
pub struct Pool {
    lines: Vec<Superbranch>,
    capacity: usize,
    /// Lines offered so far whose value equals `floor`, kept or not.
    seen_at_floor: u32,
    floor: Option<f32>,
}

impl Pool {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
            seen_at_floor: 0,
            floor: None,
        }
    }

    pub fn clear(&mut self, capacity: usize) {
        self.lines.clear();
        self.capacity = capacity.max(1);
        self.seen_at_floor = 0;
        self.floor = None;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[Superbranch] {
        &self.lines
    }

    pub(crate) fn lines_mut(&mut self) -> &mut [Superbranch] {
        &mut self.lines
    }

    /// Adds `line` if the pool has room or `line` beats its weakest
    /// members, one of which is then evicted. Lines equal to the weakest
    /// are sampled so that every line offered at that value is equally
    /// likely to be kept. Returns whether `line` was kept.
    pub fn offer<R: Rng>(&mut self, line: Superbranch, rng: &mut R) -> bool {
        if self.lines.len() < self.capacity {
            self.lines.push(line);
            return true;
        }
        let Some(floor) = self.lines.iter().map(|kept| kept.value).min_by(f32::total_cmp) else {
            return false;
        };
        let tied: Vec<usize> = (0..self.lines.len())
            .filter(|&index| self.lines[index].value == floor)
            .collect();
        if self.floor != Some(floor) {
            self.floor = Some(floor);
            self.seen_at_floor = tied.len() as u32;
        }
        let replace = if line.value > floor {
            true
        } else if line.value == floor {
            self.seen_at_floor += 1;
            rng.gen_range(0..self.seen_at_floor) < tied.len() as u32
        } else {
            false
        };
        if replace {
            let slot = tied[rng.gen_range(0..tied.len())];
            self.lines[slot] = line;
        }
        replace
    }

    /// The line with the best discounted score. Equal scores are broken
    /// uniformly at random.
    pub fn best<R: Rng>(&self, discount: f32, rng: &mut R) -> Option<&Superbranch> {
        let deepest = self.lines.iter().map(Superbranch::depth).max()?;
        let mut best: Option<(&Superbranch, f32)> = None;
        let mut ties = 0u32;
        for line in &self.lines {
            let score = line.score(deepest, discount);
            match best {
                Some((_, top)) if score < top => {}
                Some((_, top)) if score == top => {
                    ties += 1;
                    if rng.gen_range(0..=ties) == 0 {
                        best = Some((line, score));
                    }
                }
                _ => {
                    ties = 0;
                    best = Some((line, score));
                }
            }
        }
        best.map(|(line, _)| line)
    }
}
