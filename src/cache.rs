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
use rustc_hash::FxHashMap;

pub const DEFAULT_CAPACITY: usize = 1024;

struct Entry {
    results: Arc<[String]>,
    tick: u64,
}

/// Least-recently-used cache of query results keyed by the exact
/// pattern.
pub struct ResultCache {
    capacity: usize,
    entries: FxHashMap<String, Entry>,
    // Tick of last use → key
    recency: BTreeMap<u64, String>,
    tick: u64,
    hits: u64,
    misses: u64,
}

impl ResultCache {
    pub fn new(capacity: usize) -> ResultCache {
        ResultCache {
            capacity,
            entries: FxHashMap::default(),
            recency: BTreeMap::new(),
            tick: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    pub fn get(&mut self, key: &str) -> Option<Arc<[String]>> {
        let tick = self.next_tick();

        let Some(entry) = self.entries.get_mut(key)
        else {
            self.misses += 1;
            return None;
        };

        self.hits += 1;

        let key = self.recency.remove(&entry.tick)
            .unwrap_or_else(|| key.to_string());
        entry.tick = tick;
        self.recency.insert(tick, key);

        Some(Arc::clone(&entry.results))
    }

    pub fn insert(&mut self, key: &str, results: Arc<[String]>) {
        if self.capacity == 0 {
            return;
        }

        let tick = self.next_tick();

        if let Some(entry) = self.entries.get_mut(key) {
            self.recency.remove(&entry.tick);
            entry.tick = tick;
            entry.results = results;
            self.recency.insert(tick, key.to_string());
            return;
        }

        while self.entries.len() >= self.capacity {
            let Some((_, oldest)) = self.recency.pop_first()
            else {
                break;
            };

            self.entries.remove(&oldest);
        }

        self.entries.insert(key.to_string(), Entry { results, tick });
        self.recency.insert(tick, key.to_string());
    }

    pub fn remove_where<F>(&mut self, mut predicate: F)
        where F: FnMut(&str) -> bool
    {
        let recency = &mut self.recency;

        self.entries.retain(|key, entry| {
            if predicate(key.as_str()) {
                recency.remove(&entry.tick);
                false
            } else {
                true
            }
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }
}

impl Default for ResultCache {
    fn default() -> ResultCache {
        ResultCache::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn results(words: &[&str]) -> Arc<[String]> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn hit_and_miss() {
        let mut cache = ResultCache::new(4);

        assert!(cache.get("C**").is_none());
        cache.insert("C**", results(&["CAT", "CAR"]));
        assert_eq!(&*cache.get("C**").unwrap(), &["CAT", "CAR"]);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = ResultCache::new(2);

        cache.insert("A**", results(&["ART"]));
        cache.insert("B**", results(&["BAT"]));
        // Touch A so that B becomes the oldest
        assert!(cache.get("A**").is_some());
        cache.insert("C**", results(&["CAT"]));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("B**").is_none());
        assert!(cache.get("A**").is_some());
        assert!(cache.get("C**").is_some());
    }

    #[test]
    fn refresh_on_identical_insert() {
        let mut cache = ResultCache::new(2);

        cache.insert("A**", results(&["ART"]));
        cache.insert("B**", results(&["BAT"]));
        cache.insert("A**", results(&["ARC"]));
        cache.insert("C**", results(&["CAT"]));

        assert_eq!(cache.len(), 2);
        assert_eq!(&*cache.get("A**").unwrap(), &["ARC"]);
        assert!(cache.get("B**").is_none());
    }

    #[test]
    fn zero_capacity() {
        let mut cache = ResultCache::new(0);

        cache.insert("A**", results(&["ART"]));
        assert!(cache.is_empty());
        assert!(cache.get("A**").is_none());
    }

    #[test]
    fn remove_and_clear() {
        let mut cache = ResultCache::new(8);

        cache.insert("A**", results(&["ART"]));
        cache.insert("B***", results(&["BATS"]));
        cache.remove_where(|key| key.chars().count() == 3);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("B***").is_some());

        cache.clear();
        assert!(cache.is_empty());

        // The recency list must have been cleared too
        cache.insert("C**", results(&["CAT"]));
        cache.insert("D**", results(&["DOG"]));
        assert_eq!(cache.len(), 2);
    }
}
