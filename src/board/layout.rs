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

//! Plain-text board descriptions.
//!
//! A layout starts with header lines, one per player or setting, and
//! ends with a grid after the first blank line:
//!
//! ```text
//! 0 White
//! 2 Black
//! engine Black
//! rule castle R
//!
//! 1K . . .
//! . 1P↓ # .
//! . . 0P↑ .
//! 0R . . 0K
//! ```
//!
//! A player line is `<rotation> <name>`, in turn order. Other header lines
//! are `alliance <name> <name>`, `engine <name>...` and `rule ...` where
//! the rule is one of `auto-promote`, `no-auto-promote`, `elimination`,
//! `promote <letter>` or `castle <letters>`.
//!
//! Grid cells are separated by whitespace: `.` is empty, `#` is blocked,
//! anything else is an owner index followed by a piece letter. Upper case
//! marks a piece that has not moved yet. Pawns also carry the direction
//! they face as an arrow.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

use super::material::{Cell, Material, Piece, PlayerId};
use super::play::{Game, Rules};
use super::player::Player;
use super::position::Board;
use super::square::{Dimensions, Direction, Square};

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutError {
    #[error("No players declared")]
    NoPlayers,
    #[error("Too many players ({0})")]
    TooManyPlayers(usize),
    #[error("Line {0}: expected `<rotation> <name>`")]
    BadPlayer(usize),
    #[error("Line {line}: unknown player `{name}`")]
    UnknownPlayer { line: usize, name: String },
    #[error("Line {line}: cannot read rule `{text}`")]
    BadRule { line: usize, text: String },
    #[error("Layout has no board rows")]
    MissingGrid,
    #[error("Line {line}: cannot read cell `{text}`")]
    BadCell { line: usize, text: String },
    #[error("Line {line}: expected {expected} cells, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Piece at {square} belongs to unknown player {owner}")]
    UnknownOwner { owner: usize, square: Square },
}

use LayoutError::*;

/// The usual 8x8 starting position. White sits at the bottom and moves
/// first; Black's view is turned half way round.
pub const STANDARD: &str = "\
0 White
2 Black

1R 1N 1B 1Q 1K 1B 1N 1R
1P↓ 1P↓ 1P↓ 1P↓ 1P↓ 1P↓ 1P↓ 1P↓
. . . . . . . .
. . . . . . . .
. . . . . . . .
. . . . . . . .
0P↑ 0P↑ 0P↑ 0P↑ 0P↑ 0P↑ 0P↑ 0P↑
0R 0N 0B 0Q 0K 0B 0N 0R
";

const ARROWS: [(char, Direction); 8] = [
    ('↑', Direction::Up),
    ('↓', Direction::Down),
    ('←', Direction::Left),
    ('→', Direction::Right),
    ('↖', Direction::UpLeft),
    ('↗', Direction::UpRight),
    ('↙', Direction::DownLeft),
    ('↘', Direction::DownRight),
];

fn arrow_direction(c: char) -> Option<Direction> {
    let c = match c {
        '^' => '↑',
        'v' => '↓',
        '<' => '←',
        '>' => '→',
        c => c,
    };
    ARROWS
        .iter()
        .find(|(arrow, _)| *arrow == c)
        .map(|(_, direction)| *direction)
}

fn direction_arrow(direction: Direction) -> char {
    ARROWS
        .iter()
        .find(|(_, d)| *d == direction)
        .map_or('↑', |(arrow, _)| *arrow)
}

/// Reads one grid cell.
pub fn parse_cell(token: &str) -> Option<Cell> {
    match token {
        "." => return Some(Cell::Empty),
        "#" => return Some(Cell::Blocked),
        _ => (),
    }
    let digits = token.chars().take_while(char::is_ascii_digit).count();
    let owner: u8 = token[..digits].parse().ok()?;
    let mut rest = token[digits..].chars();
    let letter = rest.next()?;
    let piece = Piece::from_letter(letter)?;
    let facing = match rest.next() {
        Some(c) => Some(arrow_direction(c)?),
        None => None,
    };
    if rest.next().is_some() {
        return None;
    }
    let owner = PlayerId::new(owner);
    let mut material = match (piece.is_pawn(), facing) {
        (true, Some(facing)) => Material::pawn(owner, facing),
        (false, None) => Material::new(owner, piece),
        _ => return None,
    };
    material.set_unmoved(letter.is_ascii_uppercase());
    Some(material.into())
}

/// Writes one grid cell in the form `parse_cell` reads.
pub fn cell_token(cell: &Cell) -> String {
    match cell {
        Cell::Empty => ".".to_string(),
        Cell::Blocked => "#".to_string(),
        Cell::Occupied(material) => {
            let letter = material.piece().letter();
            let letter = if material.is_unmoved() {
                letter
            } else {
                letter.to_ascii_lowercase()
            };
            let mut token = format!("{}{}", material.owner(), letter);
            if material.piece().is_pawn() {
                token.push(direction_arrow(material.facing()));
            }
            token
        }
    }
}

/// Header state collected before the grid. Names are resolved once every
/// player line has been read, so declarations may come in any order.
#[derive(Default)]
struct Header {
    players: Vec<(u8, String)>,
    alliances: Vec<(usize, String, String)>,
    engines: Vec<(usize, String)>,
    rules: Rules,
}

impl Header {
    fn read_line(&mut self, line: usize, text: &str) -> Result<()> {
        let mut tokens = text.split_whitespace();
        let Some(first) = tokens.next() else {
            return Ok(());
        };
        match first {
            "alliance" => match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(a), Some(b), None) => {
                    self.alliances.push((line, a.to_string(), b.to_string()));
                }
                _ => return Err(BadPlayer(line).into()),
            },
            "engine" => {
                for name in tokens {
                    self.engines.push((line, name.to_string()));
                }
            }
            "rule" => self.read_rule(line, text, tokens)?,
            rotation => {
                let rotation: u8 = rotation.parse().map_err(|_| BadPlayer(line))?;
                let (Some(name), None) = (tokens.next(), tokens.next()) else {
                    return Err(BadPlayer(line).into());
                };
                self.players.push((rotation, name.to_string()));
            }
        }
        Ok(())
    }

    fn read_rule<'a>(
        &mut self,
        line: usize,
        text: &str,
        mut tokens: impl Iterator<Item = &'a str>,
    ) -> Result<()> {
        let bad_rule = || BadRule {
            line,
            text: text.to_string(),
        };
        match (tokens.next(), tokens.next()) {
            (Some("auto-promote"), None) => self.rules.auto_promote = true,
            (Some("no-auto-promote"), None) => self.rules.auto_promote = false,
            (Some("elimination"), None) => self.rules.elimination = true,
            (Some("promote"), Some(letter)) => {
                let mut chars = letter.chars();
                let piece = chars
                    .next()
                    .and_then(Piece::from_letter)
                    .filter(|_| chars.next().is_none())
                    .ok_or_else(bad_rule)?;
                self.rules.promote_to = piece;
            }
            (Some("castle"), Some(letters)) => {
                let pieces = letters
                    .chars()
                    .map(Piece::from_letter)
                    .collect::<Option<BTreeSet<_>>>()
                    .ok_or_else(bad_rule)?;
                self.rules.castleable = pieces;
            }
            _ => return Err(bad_rule().into()),
        }
        if tokens.next().is_some() {
            return Err(bad_rule().into());
        }
        Ok(())
    }

    fn resolve(&self, line: usize, name: &str) -> Result<PlayerId> {
        self.players
            .iter()
            .position(|(_, player)| player == name)
            .map(|index| PlayerId::new(index as u8))
            .ok_or_else(|| {
                UnknownPlayer {
                    line,
                    name: name.to_string(),
                }
                .into()
            })
    }

    fn into_players(self) -> Result<(Vec<Player>, Rules)> {
        if self.players.len() > usize::from(u8::MAX) {
            return Err(TooManyPlayers(self.players.len()).into());
        }
        let mut players: Vec<Player> = self
            .players
            .iter()
            .enumerate()
            .map(|(index, (rotation, name))| {
                Player::new(PlayerId::new(index as u8), name.clone(), *rotation)
            })
            .collect();
        for (line, a, b) in &self.alliances {
            let a = self.resolve(*line, a)?;
            let b = self.resolve(*line, b)?;
            players[a.to_index()].add_ally(b);
            players[b.to_index()].add_ally(a);
        }
        for (line, name) in &self.engines {
            let id = self.resolve(*line, name)?;
            players[id.to_index()].set_engine(true);
        }
        Ok((players, self.rules))
    }
}

/// Builds a game from a layout. Line numbers in errors are 1-based.
///
/// # Errors
///
/// Returns a `LayoutError` if any header line or cell cannot be read,
/// if rows differ in length, or if a piece belongs to an undeclared
/// player.
pub fn parse_layout(text: &str) -> Result<Game> {
    let mut lines = text.lines().enumerate().map(|(index, line)| (index + 1, line));
    let mut header = Header::default();
    for (line, content) in lines.by_ref() {
        let content = content.trim();
        if content.is_empty() {
            break;
        }
        header.read_line(line, content)?;
    }

    let mut cells = Vec::new();
    let mut width = None;
    let mut height = 0;
    for (line, content) in lines {
        let row = content
            .split_whitespace()
            .map(|token| {
                parse_cell(token).ok_or_else(|| BadCell {
                    line,
                    text: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if row.is_empty() {
            continue;
        }
        match width {
            None => width = Some(row.len()),
            Some(expected) if expected != row.len() => {
                return Err(RaggedRow {
                    line,
                    expected,
                    found: row.len(),
                }
                .into())
            }
            Some(_) => (),
        }
        cells.extend(row);
        height += 1;
    }
    let Some(width) = width else {
        return Err(MissingGrid.into());
    };

    let (players, rules) = header.into_players()?;
    let board = Board::from_cells(Dimensions::new(width, height), cells);
    Game::new(board, players, rules)
}

/// Writes the current position of `game` as a layout that `parse_layout`
/// reads back into the same board, seats and rules.
pub fn render_layout(game: &Game) -> String {
    let mut lines: Vec<String> = Vec::new();
    for player in game.players() {
        lines.push(format!("{} {}", player.rotation(), player.name()));
    }
    for a in game.player_ids() {
        for b in game.player_ids().filter(|b| *b > a) {
            if game.is_ally(a, b) {
                lines.push(format!(
                    "alliance {} {}",
                    game.player(a).name(),
                    game.player(b).name()
                ));
            }
        }
    }
    for player in game.players().iter().filter(|player| player.is_engine()) {
        lines.push(format!("engine {}", player.name()));
    }
    let rules = game.rules();
    let defaults = Rules::default();
    if rules.auto_promote != defaults.auto_promote {
        lines.push("rule no-auto-promote".to_string());
    }
    if rules.promote_to != defaults.promote_to {
        lines.push(format!("rule promote {}", rules.promote_to.letter()));
    }
    if rules.elimination {
        lines.push("rule elimination".to_string());
    }
    if rules.castleable != defaults.castleable {
        let letters: String = rules.castleable.iter().map(Piece::letter).collect();
        lines.push(format!("rule castle {}", letters));
    }
    lines.push(String::new());
    let board = game.board();
    for row in board.cells().chunks(board.width().max(1)) {
        let tokens: Vec<String> = row.iter().map(cell_token).collect();
        lines.push(tokens.join(" "));
    }
    lines.push(String::new());
    lines.join("\n")
}

impl FromStr for Game {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        parse_layout(s)
    }
}

impl Game {
    /// Standard chess for two players.
    pub fn standard() -> Self {
        parse_layout(STANDARD).expect("Game::standard - layout is well formed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_error(text: &str) -> LayoutError {
        parse_layout(text)
            .unwrap_err()
            .downcast::<LayoutError>()
            .unwrap()
    }

    #[test]
    fn test_standard_layout() {
        let game = Game::standard();
        assert_eq!(game.dims(), Dimensions::new(8, 8));
        assert_eq!(game.players().len(), 2);
        assert_eq!(game.player(PlayerId::new(1)).rotation(), 2);
        assert_eq!(game.player(PlayerId::new(0)).kings(), &[Square::new(4, 7)]);
        assert_eq!(game.player(PlayerId::new(1)).kings(), &[Square::new(4, 0)]);
        let pawn = game.board().material(Square::new(0, 1)).unwrap();
        assert_eq!(pawn.facing(), Direction::Down);
        assert!(pawn.is_unmoved());
    }
    #[test]
    fn test_parse_cells() {
        assert_eq!(parse_cell("."), Some(Cell::Empty));
        assert_eq!(parse_cell("#"), Some(Cell::Blocked));
        let rook = parse_cell("12r").and_then(|cell| cell.material()).unwrap();
        assert_eq!(rook.owner(), PlayerId::new(12));
        assert_eq!(rook.piece(), Piece::Rook);
        assert!(!rook.is_unmoved());
        let pawn = parse_cell("3P↘").and_then(|cell| cell.material()).unwrap();
        assert_eq!(pawn.facing(), Direction::DownRight);
        let pawn = parse_cell("0P<").and_then(|cell| cell.material()).unwrap();
        assert_eq!(pawn.facing(), Direction::Left);
    }
    #[test]
    fn test_reject_bad_cells() {
        for token in ["0P", "0K↑", "K", "0X", "0Qx", "x0Q"] {
            assert_eq!(parse_cell(token), None, "{}", token);
        }
    }
    #[test]
    fn test_header_rules_and_seats() {
        let text = "\
1 North
3 South
engine South
alliance North South
rule elimination
rule promote C
rule castle RN

0K 1K
";
        let game = parse_layout(text).unwrap();
        let north = PlayerId::new(0);
        let south = PlayerId::new(1);
        assert!(game.is_ally(north, south));
        assert!(game.player(south).is_engine());
        assert!(!game.player(north).is_engine());
        assert!(game.rules().elimination);
        assert_eq!(game.rules().promote_to, Piece::Chancellor);
        assert_eq!(
            game.rules().castleable,
            BTreeSet::from([Piece::Rook, Piece::Knight])
        );
    }
    #[test]
    fn test_layout_errors() {
        assert_eq!(
            layout_error("0 White\nalliance White Red\n\n0K\n"),
            UnknownPlayer {
                line: 2,
                name: "Red".to_string()
            }
        );
        assert_eq!(layout_error("0 White\n\n"), MissingGrid);
        assert_eq!(layout_error("White\n\n0K\n"), BadPlayer(1));
        assert_eq!(layout_error("0 White\n2 Black Knight\n\n0K\n"), BadPlayer(2));
        assert_eq!(layout_error("0\n\n0K\n"), BadPlayer(1));
        assert_eq!(
            layout_error("0 White\nrule gravity\n\n0K\n"),
            BadRule {
                line: 2,
                text: "rule gravity".to_string()
            }
        );
        assert_eq!(
            layout_error("0 White\n\n0K .\n.\n"),
            RaggedRow {
                line: 4,
                expected: 2,
                found: 1
            }
        );
        assert_eq!(
            layout_error("0 White\n\n0K 0Z\n"),
            BadCell {
                line: 3,
                text: "0Z".to_string()
            }
        );
        assert_eq!(
            layout_error("0 White\n\n0K 1K\n"),
            UnknownOwner {
                owner: 1,
                square: Square::new(1, 0)
            }
        );
        assert_eq!(layout_error("\n0K\n"), NoPlayers);
    }
    #[test]
    fn test_render_round_trip() {
        let text = "\
0 North
1 East
2 South
alliance North South
engine East
rule castle RC

0K . # 1p→
. 2P↑ . .
";
        let game = parse_layout(text).unwrap();
        let rendered = render_layout(&game);
        assert_eq!(rendered, text);
        let again = parse_layout(&rendered).unwrap();
        assert_eq!(again.board(), game.board());
        assert_eq!(again.players(), game.players());
        assert_eq!(again.rules(), game.rules());
    }
    #[test]
    fn test_render_standard() {
        assert_eq!(render_layout(&Game::standard()), STANDARD);
    }
}
