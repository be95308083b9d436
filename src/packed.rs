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

use super::dawg::{self, Dawg, DecodeError};
use super::word_index::{
    self, FixedLengthIndex, IndexError, PatternShape, WILDCARD,
};

/// A read-only index backed by a decoded word graph.
#[derive(Debug)]
pub struct PackedIndex {
    dawg: Dawg,
    words: Vec<String>,
}

impl PackedIndex {
    pub fn new(cardinality: usize, payload: &str) -> Result<PackedIndex, DecodeError> {
        Ok(PackedIndex::from_dawg(Dawg::decode_base64(cardinality, payload)?))
    }

    pub fn from_dawg(dawg: Dawg) -> PackedIndex {
        let words = dawg.words();

        PackedIndex { dawg, words }
    }

    pub fn dawg(&self) -> &Dawg {
        &self.dawg
    }
}

impl FixedLengthIndex for PackedIndex {
    fn cardinality(&self) -> usize {
        self.dawg.cardinality()
    }

    fn add_word(&mut self, _word: &str) -> Result<(), IndexError> {
        Err(IndexError::ReadOnly)
    }

    fn match_words(&self, pattern: &str) -> Vec<String> {
        match word_index::pattern_shape(pattern, self.cardinality()) {
            PatternShape::WrongLength => return Vec::new(),
            PatternShape::AllWildcards => return self.words.clone(),
            PatternShape::Constrained => (),
        }

        let mut frontier = vec![(dawg::ROOT, String::with_capacity(pattern.len()))];

        for letter in pattern.chars() {
            let mut next = Vec::with_capacity(frontier.len());

            for (node, prefix) in frontier.into_iter() {
                if letter == WILDCARD {
                    for &(ch, child) in self.dawg.edges(node) {
                        let mut word = prefix.clone();
                        word.push(ch);
                        next.push((child, word));
                    }
                } else if let Some(child) = self.dawg.step(node, letter) {
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

        frontier.into_iter()
            .filter(|&(node, _)| self.dawg.is_terminal(node))
            .map(|(_, word)| word)
            .collect()
    }

    fn test_pattern(&self, pattern: &str) -> bool {
        match word_index::pattern_shape(pattern, self.cardinality()) {
            PatternShape::WrongLength => return false,
            PatternShape::AllWildcards => return !self.words.is_empty(),
            PatternShape::Constrained => (),
        }

        let letters = pattern.chars().collect::<Vec<char>>();
        let mut stack = vec![(dawg::ROOT, 0usize)];

        while let Some((node, depth)) = stack.pop() {
            let Some(&letter) = letters.get(depth)
            else {
                if self.dawg.is_terminal(node) {
                    return true;
                }
                continue;
            };

            if letter == WILDCARD {
                stack.extend(
                    self.dawg.edges(node).iter()
                        .map(|&(_, child)| (child, depth + 1))
                );
            } else if let Some(child) = self.dawg.step(node, letter) {
                stack.push((child, depth + 1));
            }
        }

        false
    }

    fn words(&self) -> &[String] {
        &self.words
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::super::dawg::DawgBuilder;

    fn make_index(words: &[&str]) -> PackedIndex {
        let mut builder = DawgBuilder::new(3);

        for &word in words {
            builder.add_word(word).unwrap();
        }

        PackedIndex::new(3, &builder.build().encode_base64()).unwrap()
    }

    #[test]
    fn wildcard_middle() {
        let index = make_index(&["CAT", "BAT", "DOG"]);

        let mut words = index.match_words("*A*");
        words.sort_unstable();
        assert_eq!(&words, &["BAT", "CAT"]);

        assert!(index.test_pattern("D*G"));
        assert!(!index.test_pattern("D*T"));
        assert!(!index.test_pattern("**"));
    }

    #[test]
    fn words_precomputed() {
        let index = make_index(&["DOG", "CAT", "BAT"]);

        assert_eq!(index.words(), &["BAT", "CAT", "DOG"]);
        assert_eq!(&index.match_words("***"), &["BAT", "CAT", "DOG"]);
        assert_eq!(index.dawg().node_count(), 6);
    }

    #[test]
    fn malformed_payload() {
        assert_eq!(
            PackedIndex::new(3, "AgJBAQE=").unwrap_err(),
            DecodeError::DepthMismatch,
        );
        assert!(PackedIndex::new(3, "").is_err());
    }
}
