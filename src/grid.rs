// Crossfill – A crossword autofill engine
// Copyright (C) 2024  Neil Roberts
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::fmt;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use rustc_hash::FxHashMap;
use super::word_index::WILDCARD;

/// Words up to this length keep their cells inline.
pub const MAX_WORD_LENGTH: usize = 21;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Cell {
    Block,
    #[serde(rename_all = "camelCase")]
    Content {
        #[serde(default)]
        value: String,
        across_word: u32,
        down_word: u32,
    },
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    EmptyGrid,
    InvalidValue { cell: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::EmptyGrid => write!(f, "empty grid"),
            Error::InvalidValue { cell } => {
                write!(f, "cell {} doesn’t contain a single letter", cell)
            },
        }
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    pub fn other(self) -> Direction {
        match self {
            Direction::Across => Direction::Down,
            Direction::Down => Direction::Across,
        }
    }
}

/// Where a cell sits inside one of its words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub word: usize,
    pub position: usize,
}

#[derive(Debug, Clone)]
pub struct GridWord {
    pub id: u32,
    pub direction: Direction,
    pub cells: SmallVec<[usize; MAX_WORD_LENGTH]>,
}

impl GridWord {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Single-cell words aren’t real entries.
    pub fn is_checked(&self) -> bool {
        self.cells.len() > 1
    }
}

/// The words of a grid and the links between crossing cells. Across
/// words come first in grid order, followed by the down words.
#[derive(Debug, Clone)]
pub struct Topology {
    cells: Vec<Cell>,
    words: Vec<GridWord>,
    placements: Vec<Option<[Placement; 2]>>,
    initial: Vec<Option<char>>,
}

fn parse_value(value: &str, cell: usize) -> Result<Option<char>, Error> {
    let value = value.trim();
    let mut chars = value.chars();

    let Some(ch) = chars.next()
    else {
        return Ok(None);
    };

    if chars.next().is_some() || ch == WILDCARD {
        return Err(Error::InvalidValue { cell });
    }

    let mut upper = ch.to_uppercase();

    match (upper.next(), upper.next()) {
        (Some(ch), None) => Ok(Some(ch)),
        _ => Err(Error::InvalidValue { cell }),
    }
}

fn group_words(
    words: &mut Vec<GridWord>,
    ids: &mut FxHashMap<u32, usize>,
    direction: Direction,
    id: u32,
    cell: usize,
) -> Placement {
    let word = *ids.entry(id).or_insert_with(|| {
        words.push(GridWord {
            id,
            direction,
            cells: SmallVec::new(),
        });
        words.len() - 1
    });

    let cells = &mut words[word].cells;
    cells.push(cell);

    Placement { word, position: cells.len() - 1 }
}

impl Topology {
    pub fn from_cells(cells: &[Cell]) -> Result<Topology, Error> {
        let mut across = Vec::new();
        let mut across_ids = FxHashMap::default();
        let mut down = Vec::new();
        let mut down_ids = FxHashMap::default();
        let mut placements = Vec::with_capacity(cells.len());
        let mut initial = Vec::with_capacity(cells.len());

        for (index, cell) in cells.iter().enumerate() {
            match cell {
                Cell::Block => {
                    placements.push(None);
                    initial.push(None);
                },
                Cell::Content { value, across_word, down_word } => {
                    initial.push(parse_value(value, index)?);

                    let a = group_words(
                        &mut across,
                        &mut across_ids,
                        Direction::Across,
                        *across_word,
                        index,
                    );
                    let d = group_words(
                        &mut down,
                        &mut down_ids,
                        Direction::Down,
                        *down_word,
                        index,
                    );

                    placements.push(Some([a, d]));
                },
            }
        }

        let offset = across.len();

        for placement in placements.iter_mut().flatten() {
            placement[1].word += offset;
        }

        let mut words = across;
        words.extend(down);

        Ok(Topology {
            cells: cells.to_vec(),
            words,
            placements,
            initial,
        })
    }

    pub fn words(&self) -> &[GridWord] {
        &self.words
    }

    pub fn word(&self, word: usize) -> &GridWord {
        &self.words[word]
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn initial_values(&self) -> &[Option<char>] {
        &self.initial
    }

    pub fn placement(&self, cell: usize, direction: Direction) -> Option<Placement> {
        self.placements[cell].map(|p| match direction {
            Direction::Across => p[0],
            Direction::Down => p[1],
        })
    }

    /// The word crossing `word` at the given position.
    pub fn crossing(&self, word: usize, position: usize) -> Option<Placement> {
        let word = &self.words[word];

        self.placement(word.cells[position], word.direction.other())
    }

    pub fn pattern(&self, word: usize, values: &[Option<char>]) -> String {
        self.words[word].cells.iter()
            .map(|&cell| values[cell].unwrap_or(WILDCARD))
            .collect()
    }

    /// Copies the input cells with the values replaced.
    pub fn project(&self, values: &[Option<char>]) -> Vec<Cell> {
        self.cells.iter()
            .zip(values.iter())
            .map(|(cell, &new_value)| match cell {
                Cell::Block => Cell::Block,
                &Cell::Content { across_word, down_word, .. } => Cell::Content {
                    value: new_value.map(String::from).unwrap_or_default(),
                    across_word,
                    down_word,
                },
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Cell>,
}

/// Parses a grid drawn as text. `#` is a block, `.`, `*` or a space is
/// an empty cell and anything else is a letter. Short lines are padded
/// with blocks.
pub fn parse_template(s: &str) -> Result<Template, Error> {
    let mut rows = s.lines()
        .map(|line| line.trim_end().chars().collect::<Vec<char>>())
        .collect::<Vec<_>>();

    while rows.last().is_some_and(|row| row.is_empty()) {
        rows.pop();
    }

    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);

    if width < 1 {
        return Err(Error::EmptyGrid);
    }

    let height = rows.len();

    let is_block = |x: usize, y: usize| -> bool {
        rows[y].get(x).map(|&ch| ch == '#').unwrap_or(true)
    };

    let mut across_ids = vec![0u32; width * height];
    let mut down_ids = vec![0u32; width * height];
    let mut next_across = 0;
    let mut next_down = 0;

    for y in 0..height {
        for x in 0..width {
            if is_block(x, y) {
                continue;
            }

            let pos = y * width + x;

            across_ids[pos] = if x > 0 && !is_block(x - 1, y) {
                across_ids[pos - 1]
            } else {
                next_across += 1;
                next_across - 1
            };

            down_ids[pos] = if y > 0 && !is_block(x, y - 1) {
                down_ids[pos - width]
            } else {
                next_down += 1;
                next_down - 1
            };
        }
    }

    let mut cells = Vec::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            if is_block(x, y) {
                cells.push(Cell::Block);
                continue;
            }

            let value = match rows[y][x] {
                '.' | ' ' | WILDCARD => String::new(),
                ch => ch.to_string(),
            };

            cells.push(Cell::Content {
                value,
                across_word: across_ids[y * width + x],
                down_word: down_ids[y * width + x],
            });
        }
    }

    Ok(Template { width, height, cells })
}

pub fn render(cells: &[Cell], width: usize) -> String {
    let mut result = String::new();

    for (index, cell) in cells.iter().enumerate() {
        if index > 0 && index % width.max(1) == 0 {
            result.push('\n');
        }

        match cell {
            Cell::Block => result.push('#'),
            Cell::Content { value, .. } => {
                if value.is_empty() {
                    result.push('.');
                } else {
                    result.push_str(value);
                }
            },
        }
    }

    result
}

#[cfg(test)]
mod test {
    use super::*;

    fn content(value: &str, across_word: u32, down_word: u32) -> Cell {
        Cell::Content { value: value.to_string(), across_word, down_word }
    }

    #[test]
    fn blank_lines() {
        assert_eq!(parse_template("\n\n").unwrap_err(), Error::EmptyGrid);
        assert_eq!(
            parse_template(" \t\n   \n").unwrap_err().to_string(),
            "empty grid",
        );

        // A blank row between two rows becomes a row of blocks
        let template = parse_template("ab\n  \ncd\n").unwrap();
        assert_eq!(template.height, 3);
        assert_eq!(&render(&template.cells, template.width), "ab\n##\ncd");

        // Leading spaces are empty cells
        let template = parse_template(" a\n").unwrap();
        assert_eq!(&render(&template.cells, template.width), ".a");
    }

    #[test]
    fn template_ids() {
        let template = parse_template(
            "C..\n\
             .#.\n\
             ..."
        ).unwrap();

        assert_eq!(template.width, 3);
        assert_eq!(template.height, 3);
        assert_eq!(template.cells[0], content("C", 0, 0));
        assert_eq!(template.cells[2], content("", 0, 2));
        assert_eq!(template.cells[3], content("", 1, 0));
        assert_eq!(template.cells[4], Cell::Block);
        assert_eq!(template.cells[5], content("", 2, 2));
        // Below the block starts a new down word
        assert_eq!(template.cells[7], content("", 3, 3));
        assert_eq!(template.cells[8], content("", 3, 2));
    }

    #[test]
    fn short_lines() {
        let template = parse_template("ab\nc\n\n\n").unwrap();

        assert_eq!(template.width, 2);
        assert_eq!(template.height, 2);
        assert_eq!(template.cells[3], Cell::Block);
        assert_eq!(&render(&template.cells, template.width), "ab\nc#");
    }

    #[test]
    fn topology() {
        let template = parse_template("C..\n...\n#..").unwrap();
        let topology = Topology::from_cells(&template.cells).unwrap();

        let words = topology.words();
        assert_eq!(words.len(), 6);
        assert!(words[..3].iter().all(|w| w.direction == Direction::Across));
        assert!(words[3..].iter().all(|w| w.direction == Direction::Down));
        assert_eq!(&words[0].cells[..], &[0, 1, 2]);
        assert_eq!(&words[2].cells[..], &[7, 8]);
        assert_eq!(&words[3].cells[..], &[0, 3]);
        assert!(!words[2].is_empty());

        // Middle of the first across word crosses the second down word
        assert_eq!(
            topology.crossing(0, 1),
            Some(Placement { word: 4, position: 0 }),
        );
        assert_eq!(
            topology.crossing(4, 2),
            Some(Placement { word: 2, position: 0 }),
        );
        assert_eq!(
            topology.placement(4, Direction::Down),
            Some(Placement { word: 4, position: 1 }),
        );
        assert_eq!(topology.placement(6, Direction::Across), None);

        assert_eq!(&topology.pattern(0, topology.initial_values()), "C**");
        assert_eq!(&topology.pattern(3, topology.initial_values()), "C*");
    }

    #[test]
    fn project() {
        let cells = vec![content("a", 0, 0), content("", 0, 1), Cell::Block];
        let topology = Topology::from_cells(&cells).unwrap();

        assert_eq!(topology.initial_values(), &[Some('A'), None, None]);
        assert!(!topology.word(1).is_checked());

        let projected = topology.project(&[Some('A'), Some('T'), None]);
        assert_eq!(
            &projected,
            &[content("A", 0, 0), content("T", 0, 1), Cell::Block],
        );
    }

    #[test]
    fn invalid_values() {
        for value in ["AB", "*", "ß"] {
            let cells = vec![Cell::Block, content(value, 0, 0)];

            assert_eq!(
                Topology::from_cells(&cells).unwrap_err(),
                Error::InvalidValue { cell: 1 },
            );
        }
    }

    #[test]
    fn json() {
        let cells = serde_json::from_str::<Vec<Cell>>(
            r#"[
                {"type": "content", "value": "Q", "acrossWord": 1, "downWord": 2},
                {"type": "content", "acrossWord": 1, "downWord": 3},
                {"type": "block"}
            ]"#
        ).unwrap();

        assert_eq!(
            &cells,
            &[content("Q", 1, 2), content("", 1, 3), Cell::Block],
        );

        assert_eq!(
            &serde_json::to_string(&cells[0]).unwrap(),
            r#"{"type":"content","value":"Q","acrossWord":1,"downWord":2}"#,
        );
    }
}
