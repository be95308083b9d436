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
use super::trie::TrieIndex;
use super::packed::PackedIndex;

/// Matches any single letter in a pattern.
pub const WILDCARD: char = '*';

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum IndexError {
    LengthMismatch { expected: usize, actual: usize },
    ReadOnly,
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IndexError::LengthMismatch { expected, actual } => write!(
                f,
                "word has length {} but the index holds words of length {}",
                actual,
                expected,
            ),
            IndexError::ReadOnly => write!(f, "packed indexes are read-only"),
        }
    }
}

impl std::error::Error for IndexError {}

/// An index over words that all have the same number of letters.
///
/// Patterns passed to `match_words` and `test_pattern` use
/// [`WILDCARD`] for positions that can hold any letter. A pattern
/// whose length differs from the cardinality never matches anything.
pub trait FixedLengthIndex {
    fn cardinality(&self) -> usize;

    fn add_word(&mut self, word: &str) -> Result<(), IndexError>;

    /// Makes any words added since the last commit searchable.
    fn commit(&mut self) {
    }

    fn match_words(&self, pattern: &str) -> Vec<String>;

    fn test_pattern(&self, pattern: &str) -> bool;

    /// Every searchable word in the index.
    fn words(&self) -> &[String];
}

pub enum WordIndex {
    Trie(TrieIndex),
    Packed(PackedIndex),
}

impl WordIndex {
    pub fn len(&self) -> usize {
        self.words().len()
    }

    pub fn is_empty(&self) -> bool {
        self.words().is_empty()
    }
}

impl FixedLengthIndex for WordIndex {
    fn cardinality(&self) -> usize {
        match self {
            WordIndex::Trie(index) => index.cardinality(),
            WordIndex::Packed(index) => index.cardinality(),
        }
    }

    fn add_word(&mut self, word: &str) -> Result<(), IndexError> {
        match self {
            WordIndex::Trie(index) => index.add_word(word),
            WordIndex::Packed(index) => index.add_word(word),
        }
    }

    fn commit(&mut self) {
        match self {
            WordIndex::Trie(index) => index.commit(),
            WordIndex::Packed(index) => index.commit(),
        }
    }

    fn match_words(&self, pattern: &str) -> Vec<String> {
        match self {
            WordIndex::Trie(index) => index.match_words(pattern),
            WordIndex::Packed(index) => index.match_words(pattern),
        }
    }

    fn test_pattern(&self, pattern: &str) -> bool {
        match self {
            WordIndex::Trie(index) => index.test_pattern(pattern),
            WordIndex::Packed(index) => index.test_pattern(pattern),
        }
    }

    fn words(&self) -> &[String] {
        match self {
            WordIndex::Trie(index) => index.words(),
            WordIndex::Packed(index) => index.words(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PatternShape {
    WrongLength,
    AllWildcards,
    Constrained,
}

pub fn pattern_shape(pattern: &str, cardinality: usize) -> PatternShape {
    let mut length = 0;
    let mut all_wildcards = true;

    for ch in pattern.chars() {
        length += 1;

        if ch != WILDCARD {
            all_wildcards = false;
        }
    }

    if length != cardinality {
        PatternShape::WrongLength
    } else if all_wildcards {
        PatternShape::AllWildcards
    } else {
        PatternShape::Constrained
    }
}

pub fn check_length(word: &str, cardinality: usize) -> Result<(), IndexError> {
    let actual = word.chars().count();

    if actual == cardinality {
        Ok(())
    } else {
        Err(IndexError::LengthMismatch { expected: cardinality, actual })
    }
}

pub fn all_wildcards(length: usize) -> String {
    std::iter::repeat(WILDCARD).take(length).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use super::super::dawg::DawgBuilder;
    use std::collections::HashSet;

    fn build_both(words: &[&str]) -> (WordIndex, WordIndex) {
        let cardinality = words[0].chars().count();

        let mut trie = TrieIndex::new(cardinality);
        let mut builder = DawgBuilder::new(cardinality);

        for &word in words {
            trie.add_word(word).unwrap();
            builder.add_word(word).unwrap();
        }

        trie.commit();

        let payload = builder.build().encode_base64();
        let packed = PackedIndex::new(cardinality, &payload).unwrap();

        (WordIndex::Trie(trie), WordIndex::Packed(packed))
    }

    fn sorted(mut words: Vec<String>) -> Vec<String> {
        words.sort_unstable();
        words
    }

    #[test]
    fn shape() {
        assert_eq!(pattern_shape("***", 3), PatternShape::AllWildcards);
        assert_eq!(pattern_shape("*A*", 3), PatternShape::Constrained);
        assert_eq!(pattern_shape("**", 3), PatternShape::WrongLength);
        assert_eq!(pattern_shape("ÉTÉ", 3), PatternShape::Constrained);
        assert_eq!(pattern_shape("", 0), PatternShape::AllWildcards);
    }

    #[test]
    fn length_error_message() {
        assert_eq!(
            &check_length("CATS", 3).unwrap_err().to_string(),
            "word has length 4 but the index holds words of length 3",
        );
        assert!(check_length("CAT", 3).is_ok());
    }

    #[test]
    fn both_variants_agree() {
        let words = [
            "CAT", "BAT", "DOG", "CAR", "COT", "ÉTÉ", "ART", "ARC", "BOG",
        ];
        let (trie, packed) = build_both(&words);

        for pattern in [
            "***", "*A*", "C**", "**T", "A*C", "ZZZ", "É**", "*O*", "**",
            "****", "B*G",
        ] {
            assert_eq!(
                sorted(trie.match_words(pattern)),
                sorted(packed.match_words(pattern)),
                "{}",
                pattern,
            );
            assert_eq!(
                trie.test_pattern(pattern),
                packed.test_pattern(pattern),
                "{}",
                pattern,
            );
        }

        let all = trie.match_words(&all_wildcards(3))
            .into_iter()
            .collect::<HashSet<_>>();
        assert_eq!(all.len(), words.len());
        assert!(words.iter().all(|w| all.contains(*w)));
        assert_eq!(trie.len(), packed.len());
    }

    #[test]
    fn packed_is_read_only() {
        let (mut trie, mut packed) = build_both(&["CAT"]);

        assert!(trie.add_word("DOG").is_ok());
        assert_eq!(packed.add_word("DOG").unwrap_err(), IndexError::ReadOnly);
        assert_eq!(packed.cardinality(), 3);
    }
}
