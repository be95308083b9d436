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

//! Backtracking fill search.
//!
//! Across words are visited first in grid order. For every candidate
//! the crossing word at each changed cell must still match something
//! in one of the word banks. A candidate that fails at a crossing
//! removes every other candidate with the same letter at that
//! position. When a word runs out of candidates the most recently
//! committed word is undone and both are queued again.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use instant::Instant;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashSet;
use serde::Serialize;
use smallvec::SmallVec;
use super::grid::{self, Cell, Direction, Topology, MAX_WORD_LENGTH};
use super::word_bank::WordBanks;
use super::word_index::WILDCARD;

pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillError {
    Unsolvable,
    Canceled,
    Grid(grid::Error),
}

impl fmt::Display for FillError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FillError::Unsolvable => write!(f, "no fill exists for this grid"),
            FillError::Canceled => write!(f, "fill canceled"),
            FillError::Grid(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for FillError {}

impl From<grid::Error> for FillError {
    fn from(e: grid::Error) -> FillError {
        FillError::Grid(e)
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Seed for the candidate shuffle. Without one the order is
    /// different on every run.
    pub seed: Option<u64>,
    pub progress_interval: Duration,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            seed: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Seconds since the solver was created
    pub elapsed_time: f64,
    /// Patterns tested per second
    pub rate: f64,
    pub n: u64,
    pub backtracks: u64,
    pub pruned: u64,
    pub visits: u64,
    pub total_words: usize,
    pub left_to_solve: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Solved,
}

pub trait Interrupt {
    fn is_interrupted(&mut self) -> bool;
}

impl<F> Interrupt for F
    where F: FnMut() -> bool
{
    fn is_interrupted(&mut self) -> bool {
        self()
    }
}

/// A shareable flag that asks a running fill to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Interrupt for CancelToken {
    fn is_interrupted(&mut self) -> bool {
        self.is_canceled()
    }
}

struct UndoEntry {
    word: usize,
    previous: SmallVec<[(usize, Option<char>); MAX_WORD_LENGTH]>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    n: u64,
    backtracks: u64,
    pruned: u64,
    visits: u64,
}

pub struct Solver {
    topology: Topology,
    banks: WordBanks,
    options: Options,
    values: Vec<Option<char>>,
    queue: VecDeque<usize>,
    candidates: Vec<Option<Vec<String>>>,
    undo: Vec<UndoEntry>,
    rng: SmallRng,
    counters: Counters,
    total_words: usize,
    start: Instant,
    last_progress: Instant,
}

fn initial_queue(topology: &Topology) -> VecDeque<usize> {
    topology.words().iter()
        .enumerate()
        .filter(|(_, word)| word.is_checked())
        .filter(|(_, word)| match word.direction {
            Direction::Across => true,
            // Down words are only searched directly when one of their
            // cells isn’t covered by a checked across word
            Direction::Down => word.cells.iter().any(|&cell| {
                topology.placement(cell, Direction::Across)
                    .is_some_and(|p| !topology.word(p.word).is_checked())
            }),
        })
        .map(|(index, _)| index)
        .collect()
}

impl Solver {
    pub fn new(topology: Topology, banks: WordBanks, options: Options) -> Solver {
        let queue = initial_queue(&topology);
        let rng = match options.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let now = Instant::now();

        log::info!(
            "starting fill of {} words ({} cells)",
            queue.len(),
            topology.cell_count(),
        );

        Solver {
            values: topology.initial_values().to_vec(),
            candidates: vec![None; topology.words().len()],
            total_words: queue.len(),
            topology,
            banks,
            options,
            queue,
            undo: Vec::new(),
            rng,
            counters: Counters::default(),
            start: now,
            last_progress: now,
        }
    }

    pub fn from_cells(
        cells: &[Cell],
        banks: WordBanks,
        options: Options,
    ) -> Result<Solver, FillError> {
        let topology = Topology::from_cells(cells)?;
        Ok(Solver::new(topology, banks, options))
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn values(&self) -> &[Option<char>] {
        &self.values
    }

    pub fn banks(&self) -> &WordBanks {
        &self.banks
    }

    pub fn into_banks(self) -> WordBanks {
        self.banks
    }

    pub fn is_solved(&self) -> bool {
        self.queue.is_empty()
    }

    /// The filled grid, once the search has finished.
    pub fn solution(&self) -> Option<Vec<Cell>> {
        self.is_solved().then(|| self.topology.project(&self.values))
    }

    pub fn progress(&self) -> Progress {
        let elapsed_time = self.start.elapsed().as_secs_f64();

        Progress {
            elapsed_time,
            rate: if elapsed_time > 0.0 {
                self.counters.n as f64 / elapsed_time
            } else {
                0.0
            },
            n: self.counters.n,
            backtracks: self.counters.backtracks,
            pruned: self.counters.pruned,
            visits: self.counters.visits,
            total_words: self.total_words,
            left_to_solve: self.queue.len(),
        }
    }

    fn maybe_report<P>(&mut self, on_progress: &mut P)
        where P: FnMut(&Progress)
    {
        if self.last_progress.elapsed() >= self.options.progress_interval {
            self.last_progress = Instant::now();
            on_progress(&self.progress());
        }
    }

    fn load_candidates(&mut self, word: usize) -> Vec<String> {
        let pattern = self.topology.pattern(word, &self.values);
        let mut candidates = Vec::new();

        if self.banks.len() == 1 {
            for bank in self.banks.values_mut() {
                candidates.extend(bank.search(&pattern).iter().cloned());
            }
        } else {
            let mut seen = FxHashSet::default();

            for bank in self.banks.values_mut() {
                for candidate in bank.search(&pattern).iter() {
                    if seen.insert(candidate.clone()) {
                        candidates.push(candidate.clone());
                    }
                }
            }
        }

        candidates.shuffle(&mut self.rng);

        candidates
    }

    /// Returns the position and letter of the first crossing that
    /// can’t be completed with this candidate.
    fn check(&mut self, word: usize, candidate: &str) -> Option<(usize, char)> {
        let topology = &self.topology;
        let cells = &topology.word(word).cells;
        let mut pattern = String::new();

        for (position, (&cell, letter)) in cells.iter()
            .zip(candidate.chars())
            .enumerate()
        {
            if self.values[cell].is_some() {
                continue;
            }

            let Some(crossing) = topology.crossing(word, position)
            else {
                continue;
            };

            let crossing_word = topology.word(crossing.word);

            if !crossing_word.is_checked() {
                continue;
            }

            pattern.clear();
            pattern.extend(crossing_word.cells.iter().enumerate().map(|(i, &c)| {
                if i == crossing.position {
                    letter
                } else {
                    self.values[c].unwrap_or(WILDCARD)
                }
            }));

            self.counters.n += 1;

            if !self.banks.values().any(|bank| bank.test_sync(&pattern)) {
                return Some((position, letter));
            }
        }

        None
    }

    fn prune(&mut self, word: usize, position: usize, letter: char) {
        let Some(candidates) = self.candidates[word].as_mut()
        else {
            return;
        };

        let before = candidates.len();

        candidates.retain(|candidate| candidate.chars().nth(position) != Some(letter));

        self.counters.pruned += (before - candidates.len()) as u64;
    }

    fn commit(&mut self, word: usize, candidate: &str) {
        let cells = &self.topology.word(word).cells;
        let mut previous = SmallVec::new();

        for (&cell, letter) in cells.iter().zip(candidate.chars()) {
            previous.push((cell, self.values[cell]));
            self.values[cell] = Some(letter);
        }

        self.undo.push(UndoEntry { word, previous });
    }

    fn backtrack(&mut self, word: usize) -> Result<(), FillError> {
        self.candidates[word] = None;

        let Some(entry) = self.undo.pop()
        else {
            return Err(FillError::Unsolvable);
        };

        for &(cell, value) in entry.previous.iter() {
            self.values[cell] = value;
        }

        self.counters.backtracks += 1;

        log::debug!(
            "backtracking from word {} to word {}",
            word,
            entry.word,
        );

        self.queue.push_front(word);
        self.queue.push_front(entry.word);

        Ok(())
    }

    /// Visits the next word in the queue, either committing one of its
    /// candidates or backtracking.
    pub fn step<I, P>(
        &mut self,
        interrupt: &mut I,
        on_progress: &mut P,
    ) -> Result<Status, FillError>
        where I: Interrupt + ?Sized,
              P: FnMut(&Progress)
    {
        let Some(word) = self.queue.pop_front()
        else {
            return Ok(Status::Solved);
        };

        self.counters.visits += 1;

        if self.candidates[word].is_none() {
            let candidates = self.load_candidates(word);
            self.candidates[word] = Some(candidates);
        }

        loop {
            if interrupt.is_interrupted() {
                self.queue.push_front(word);
                return Err(FillError::Canceled);
            }

            let Some(candidate) = self.candidates[word].as_mut()
                .and_then(Vec::pop)
            else {
                break;
            };

            match self.check(word, &candidate) {
                None => {
                    self.commit(word, &candidate);
                    self.maybe_report(on_progress);

                    return Ok(if self.queue.is_empty() {
                        Status::Solved
                    } else {
                        Status::Running
                    });
                },
                Some((position, letter)) => {
                    self.prune(word, position, letter);
                    self.maybe_report(on_progress);
                },
            }
        }

        self.backtrack(word)?;
        self.maybe_report(on_progress);

        Ok(Status::Running)
    }

    pub fn run<I, P>(
        &mut self,
        interrupt: &mut I,
        mut on_progress: P,
    ) -> Result<Vec<Cell>, FillError>
        where I: Interrupt + ?Sized,
              P: FnMut(&Progress)
    {
        while self.step(interrupt, &mut on_progress)? == Status::Running {}

        let progress = self.progress();

        log::info!(
            "fill found after {} visits, {} backtracks and {} tests in {:.3}s",
            progress.visits,
            progress.backtracks,
            progress.n,
            progress.elapsed_time,
        );

        Ok(self.topology.project(&self.values))
    }
}

/// Fills a grid in one go.
pub fn fill<I>(
    cells: &[Cell],
    banks: WordBanks,
    options: Options,
    interrupt: &mut I,
) -> Result<Vec<Cell>, FillError>
    where I: Interrupt + ?Sized
{
    Solver::from_cells(cells, banks, options)?.run(interrupt, |_| ())
}
