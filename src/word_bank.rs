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

use std::collections::BTreeMap;
use std::sync::Arc;
use super::cache::{self, ResultCache};
use super::dawg::DecodeError;
use super::packed::PackedIndex;
use super::trie::TrieIndex;
use super::word_index::{FixedLengthIndex, IndexError, WordIndex};

/// Word banks keyed by list name.
pub type WordBanks = BTreeMap<String, WordBank>;

/// A family of fixed-length indexes, one per word length.
pub struct WordBank {
    indexes: BTreeMap<usize, WordIndex>,
    cache: ResultCache,
}

impl WordBank {
    pub fn new() -> WordBank {
        WordBank::with_cache_capacity(cache::DEFAULT_CAPACITY)
    }

    pub fn with_cache_capacity(capacity: usize) -> WordBank {
        WordBank {
            indexes: BTreeMap::new(),
            cache: ResultCache::new(capacity),
        }
    }

    /// Builds a bank from precompiled word graphs. Every index is
    /// decoded up front.
    pub fn from_packed<I, S>(payloads: I) -> Result<WordBank, DecodeError>
        where I: IntoIterator<Item = (usize, S)>,
              S: AsRef<str>
    {
        let mut bank = WordBank::new();

        for (length, payload) in payloads {
            let index = PackedIndex::new(length, payload.as_ref())?;
            bank.indexes.insert(length, WordIndex::Packed(index));
        }

        Ok(bank)
    }

    pub fn from_words<I, S>(words: I) -> Result<WordBank, IndexError>
        where I: IntoIterator<Item = S>,
              S: AsRef<str>
    {
        let mut bank = WordBank::new();
        bank.extend(words)?;
        Ok(bank)
    }

    fn add_unsearchable(&mut self, word: &str) -> Result<usize, IndexError> {
        let length = word.chars().count();

        self.indexes.entry(length)
            .or_insert_with(|| WordIndex::Trie(TrieIndex::new(length)))
            .add_word(word)?;

        Ok(length)
    }

    fn commit_lengths(&mut self, lengths: &[usize]) {
        for length in lengths.iter() {
            if let Some(index) = self.indexes.get_mut(length) {
                index.commit();
            }
        }

        if !lengths.is_empty() {
            log::debug!("dropping cached results for lengths {:?}", lengths);

            self.cache.remove_where(|key| {
                lengths.contains(&key.chars().count())
            });
        }
    }

    pub fn insert(&mut self, word: &str) -> Result<(), IndexError> {
        let length = self.add_unsearchable(word)?;
        self.commit_lengths(&[length]);
        Ok(())
    }

    /// Adds several words, committing each affected index once.
    pub fn extend<I, S>(&mut self, words: I) -> Result<(), IndexError>
        where I: IntoIterator<Item = S>,
              S: AsRef<str>
    {
        let mut lengths = Vec::new();
        let mut result = Ok(());

        for word in words {
            match self.add_unsearchable(word.as_ref()) {
                Ok(length) => {
                    if !lengths.contains(&length) {
                        lengths.push(length);
                    }
                },
                Err(e) => {
                    result = Err(e);
                    break;
                },
            }
        }

        // Commit even on failure so that no index is left with a
        // half-filled buffer
        self.commit_lengths(&lengths);

        result
    }

    pub fn search(&mut self, token: &str) -> Arc<[String]> {
        if let Some(results) = self.cache.get(token) {
            return results;
        }

        let length = token.chars().count();

        let results: Arc<[String]> = match self.indexes.get(&length) {
            Some(index) => index.match_words(token).into(),
            None => Arc::from(Vec::new()),
        };

        self.cache.insert(token, Arc::clone(&results));

        results
    }

    /// Checks whether any word matches the query without touching the
    /// cache.
    pub fn test_sync(&self, query: &str) -> bool {
        self.indexes.get(&query.chars().count())
            .is_some_and(|index| index.test_pattern(query))
    }

    pub fn reset_cache(&mut self) {
        log::debug!("resetting word bank cache");
        self.cache.clear();
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.indexes.keys().copied()
    }

    pub fn index(&self, length: usize) -> Option<&WordIndex> {
        self.indexes.get(&length)
    }

    pub fn word_count(&self, length: usize) -> usize {
        self.indexes.get(&length).map(|index| index.len()).unwrap_or(0)
    }
}

impl Default for WordBank {
    fn default() -> WordBank {
        WordBank::new()
    }
}
