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

/// Tuning knobs for the search. Depths count plies, where a ply is one
/// move by one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Full-width depth of the first pass.
    pub depth: usize,
    /// Captures-only plies searched past the full-width horizon.
    pub exchange_depth: usize,
    /// Best lines kept and deepened after the first pass.
    pub pool_size: usize,
    /// Weight of a line's earlier value against a deeper rescore, and
    /// the per-ply discount applied when lines of different depth are
    /// compared.
    pub discount: f32,
    /// Material deficit, in pawns, past which a line is only followed
    /// through captures.
    pub loss_threshold: f32,
    /// Number of pseudo-legal moves on the board that the base depth is
    /// tuned for. Quieter positions are searched deeper.
    pub expected_moves: f32,
    pub min_depth: usize,
    pub max_depth: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            exchange_depth: 4,
            pool_size: 4,
            discount: 0.9,
            loss_threshold: 6.0,
            expected_moves: 60.0,
            min_depth: 2,
            max_depth: 5,
        }
    }
}

impl SearchConfig {
    /// Deepest a line may grow for a board with `observed` pseudo-legal
    /// moves: the base depth plus one ply for every halving of the move
    /// count below `expected_moves`, clamped to the configured bounds.
    pub fn depth_ceiling(&self, observed: usize) -> usize {
        let ratio = self.expected_moves / observed.max(1) as f32;
        let extra = ratio.log2().floor() as i64;
        let ceiling = (self.depth as i64 + extra).max(self.min_depth as i64);
        ceiling.min(self.max_depth.max(self.min_depth) as i64).max(1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_ceiling_scales_with_mobility() {
        let config = SearchConfig::default();
        assert_eq!(config.depth_ceiling(60), 2);
        assert_eq!(config.depth_ceiling(40), 2);
        assert_eq!(config.depth_ceiling(15), 4);
        assert_eq!(config.depth_ceiling(1), 5);
        assert_eq!(config.depth_ceiling(0), 5);
        assert_eq!(config.depth_ceiling(500), 2);
    }
    #[test]
    fn test_depth_ceiling_with_inverted_bounds() {
        let config = SearchConfig {
            min_depth: 3,
            max_depth: 1,
            ..SearchConfig::default()
        };
        assert_eq!(config.depth_ceiling(60), 3);
    }
}
