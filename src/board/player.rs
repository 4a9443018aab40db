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
use std::collections::BTreeSet;

use super::material::PlayerId;
use super::square::Square;

/// One seat at the table. Kings are tracked by position, so the list
/// stays valid across moves and reverts as long as `Game` keeps it in
/// sync with the board.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Player {
    name: String,
    rotation: u8,
    check: bool,
    mate: bool,
    engine: bool,
    kings: Vec<Square>,
    allies: BTreeSet<PlayerId>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, rotation: u8) -> Self {
        Self {
            name: name.into(),
            rotation: rotation % 4,
            check: false,
            mate: false,
            engine: false,
            kings: Vec::new(),
            allies: BTreeSet::from([id]),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Quarter turns applied when this player's view is drawn.
    #[inline]
    pub fn rotation(&self) -> u8 {
        self.rotation
    }
    #[inline]
    pub fn is_check(&self) -> bool {
        self.check
    }
    #[inline]
    pub fn is_mate(&self) -> bool {
        self.mate
    }
    #[inline]
    pub fn is_engine(&self) -> bool {
        self.engine
    }
    #[inline]
    pub fn kings(&self) -> &[Square] {
        &self.kings
    }
    #[inline]
    pub fn allies(&self) -> &BTreeSet<PlayerId> {
        &self.allies
    }
    #[inline]
    pub fn is_ally(&self, other: PlayerId) -> bool {
        self.allies.contains(&other)
    }

    pub fn set_engine(&mut self, engine: bool) {
        self.engine = engine;
    }

    pub(crate) fn set_check(&mut self, check: bool) {
        self.check = check;
    }
    pub(crate) fn set_mate(&mut self, mate: bool) {
        self.mate = mate;
    }
    pub(crate) fn kings_mut(&mut self) -> &mut Vec<Square> {
        &mut self.kings
    }
    pub(crate) fn add_ally(&mut self, other: PlayerId) {
        self.allies.insert(other);
    }
}
