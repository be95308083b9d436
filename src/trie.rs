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

use super::word_index::{
    self, FixedLengthIndex, IndexError, PatternShape, WILDCARD,
};
use rustc_hash::FxHashSet;

#[derive(Default, Debug)]
struct Node {
    // Sorted by letter
    children: Vec<(char, u32)>,
}

#[derive(Debug)]
pub struct TrieIndex {
    cardinality: usize,
    nodes: Vec<Node>,
    pending: Vec<String>,
    words: Vec<String>,
    present: FxHashSet<String>,
}

impl TrieIndex {
    pub fn new(cardinality: usize) -> TrieIndex {
        TrieIndex {
            cardinality,
            nodes: vec![Node::default()],
            pending: Vec::new(),
            words: Vec::new(),
            present: FxHashSet::default(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.present.contains(word)
    }

    fn child(&self, node: u32, letter: char) -> Option<u32> {
        let children = &self.nodes[node as usize].children;

        children.binary_search_by_key(&letter, |&(ch, _)| ch)
            .ok()
            .map(|pos| children[pos].1)
    }

    fn insert(&mut self, word: &str) {
        let mut node = 0;

        for letter in word.chars() {
            let children = &self.nodes[node as usize].children;

            node = match children.binary_search_by_key(&letter, |&(ch, _)| ch) {
                Ok(pos) => children[pos].1,
                Err(pos) => {
                    let next = self.nodes.len() as u32;
                    self.nodes.push(Node::default());
                    self.nodes[node as usize].children.insert(pos, (letter, next));
                    next
                },
            };
        }
    }
}

impl FixedLengthIndex for TrieIndex {
    fn cardinality(&self) -> usize {
        self.cardinality
    }

    fn add_word(&mut self, word: &str) -> Result<(), IndexError> {
        word_index::check_length(word, self.cardinality)?;

        self.pending.push(word.to_string());

        Ok(())
    }

    fn commit(&mut self) {
        for word in std::mem::take(&mut self.pending) {
            if self.present.contains(&word) {
                continue;
            }

            self.insert(&word);
            self.present.insert(word.clone());
            self.words.push(word);
        }
    }

    fn match_words(&self, pattern: &str) -> Vec<String> {
        match word_index::pattern_shape(pattern, self.cardinality) {
            PatternShape::WrongLength => return Vec::new(),
            PatternShape::AllWildcards => return self.words.clone(),
            PatternShape::Constrained => (),
        }

        // Breadth-first, one level of the tree per letter of the pattern
        let mut frontier = vec![(0u32, String::with_capacity(pattern.len()))];

        for letter in pattern.chars() {
            let mut next = Vec::with_capacity(frontier.len());

            for (node, prefix) in frontier.into_iter() {
                if letter == WILDCARD {
                    for &(ch, child) in self.nodes[node as usize].children.iter() {
                        let mut word = prefix.clone();
                        word.push(ch);
                        next.push((child, word));
                    }
                } else if let Some(child) = self.child(node, letter) {
                    let mut word = prefix;
                    word.push(letter);
                    next.push((child, word));
                }
            }

            if next.is_empty() {
                return Vec::new();
            }

            frontier = next;
        }

        frontier.into_iter().map(|(_, word)| word).collect()
    }

    fn test_pattern(&self, pattern: &str) -> bool {
        match word_index::pattern_shape(pattern, self.cardinality) {
            PatternShape::WrongLength => return false,
            PatternShape::AllWildcards => return !self.words.is_empty(),
            PatternShape::Constrained => (),
        }

        let letters = pattern.chars().collect::<Vec<char>>();
        let mut stack = vec![(0u32, 0usize)];

        while let Some((node, depth)) = stack.pop() {
            let Some(&letter) = letters.get(depth)
            else {
                return true;
            };

            if letter == WILDCARD {
                stack.extend(
                    self.nodes[node as usize].children.iter()
                        .map(|&(_, child)| (child, depth + 1))
                );
            } else if let Some(child) = self.child(node, letter) {
                stack.push((child, depth + 1));
            }
        }

        false
    }

    fn words(&self) -> &[String] {
        &self.words
    }
}
