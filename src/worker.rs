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

//! Runs fills on a background thread. The thread owns the word banks
//! and talks to its owner only through the request and response
//! channels. Requests are polled from inside the solver’s candidate
//! loop so an abort or a new solve takes effect straight away.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use super::grid::{Cell, Topology};
use super::solver::{FillError, Options, Progress, Solver};
use super::word_bank::WordBanks;

#[derive(Debug)]
pub enum Request {
    Solve {
        cells: Vec<Cell>,
        options: Options,
    },
    Abort,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Progress(Progress),
    Solution(Vec<Cell>),
    Error(FillError),
}

pub struct Worker {
    requests: Sender<Request>,
    responses: Receiver<Response>,
    handle: JoinHandle<WordBanks>,
}

fn solve_one(
    banks: &mut WordBanks,
    cells: &[Cell],
    options: Options,
    requests: &Receiver<Request>,
    responses: &Sender<Response>,
    pending: &mut Option<Request>,
) -> Result<Vec<Cell>, FillError> {
    let topology = Topology::from_cells(cells)?;
    let mut solver = Solver::new(topology, std::mem::take(banks), options);

    let mut interrupt = || match requests.try_recv() {
        Ok(Request::Abort) => true,
        Ok(request @ Request::Solve { .. }) => {
            log::debug!("new fill request supersedes the running one");
            *pending = Some(request);
            true
        },
        Err(TryRecvError::Empty) => false,
        Err(TryRecvError::Disconnected) => true,
    };

    let result = solver.run(&mut interrupt, |progress| {
        let _ = responses.send(Response::Progress(progress.clone()));
    });

    *banks = solver.into_banks();

    result
}

fn worker_loop(
    mut banks: WordBanks,
    requests: Receiver<Request>,
    responses: Sender<Response>,
) -> WordBanks {
    let mut pending = None;

    loop {
        let request = match pending.take() {
            Some(request) => request,
            None => match requests.recv() {
                Ok(request) => request,
                Err(_) => break,
            },
        };

        let Request::Solve { cells, options } = request
        else {
            continue;
        };

        let response = match solve_one(
            &mut banks,
            &cells,
            options,
            &requests,
            &responses,
            &mut pending,
        ) {
            Ok(cells) => Response::Solution(cells),
            Err(e) => {
                log::info!("fill failed: {}", e);
                Response::Error(e)
            },
        };

        if responses.send(response).is_err() {
            break;
        }
    }

    banks
}

impl Worker {
    pub fn spawn(banks: WordBanks) -> Worker {
        let (requests, request_rx) = mpsc::channel();
        let (response_tx, responses) = mpsc::channel();

        let handle = thread::spawn(move || {
            worker_loop(banks, request_rx, response_tx)
        });

        Worker { requests, responses, handle }
    }

    pub fn solve(&self, cells: Vec<Cell>, options: Options) {
        let _ = self.requests.send(Request::Solve { cells, options });
    }

    pub fn abort(&self) {
        let _ = self.requests.send(Request::Abort);
    }

    pub fn responses(&self) -> &Receiver<Response> {
        &self.responses
    }

    /// Blocks until the current fill finishes, passing on any progress
    /// reports.
    pub fn wait<P>(&self, mut on_progress: P) -> Result<Vec<Cell>, FillError>
        where P: FnMut(&Progress)
    {
        loop {
            match self.responses.recv() {
                Ok(Response::Progress(progress)) => on_progress(&progress),
                Ok(Response::Solution(cells)) => break Ok(cells),
                Ok(Response::Error(e)) => break Err(e),
                Err(_) => break Err(FillError::Canceled),
            }
        }
    }

    /// Stops the thread and hands back the word banks.
    pub fn shutdown(self) -> Option<WordBanks> {
        let Worker { requests, responses, handle } = self;

        drop(requests);
        drop(responses);

        handle.join().ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::super::grid::{self, parse_template, render};
    use super::super::word_bank::WordBank;
    use rand::{Rng, SeedableRng};
    use rand::rngs::SmallRng;

    fn banks() -> WordBanks {
        let mut banks = WordBanks::new();
        banks.insert(
            "default".to_string(),
            WordBank::from_words(["CAT", "ARE", "TEN"]).unwrap(),
        );
        banks
    }

    fn options() -> Options {
        Options { seed: Some(7), ..Options::default() }
    }

    #[test]
    fn solve() {
        let worker = Worker::spawn(banks());
        let template = parse_template("...\n...\n...").unwrap();

        // An abort with nothing running is ignored
        worker.abort();
        worker.solve(template.cells.clone(), options());

        let cells = worker.wait(|_| ()).unwrap();
        assert_eq!(&render(&cells, 3), "CAT\nARE\nTEN");

        // The banks survive for the next request
        worker.solve(template.cells, options());
        assert!(worker.wait(|_| ()).is_ok());

        let banks = worker.shutdown().unwrap();
        assert!(banks["default"].test_sync("C*T"));
    }

    #[test]
    fn errors() {
        let worker = Worker::spawn(banks());

        worker.solve(
            vec![Cell::Content {
                value: "XY".to_string(),
                across_word: 0,
                down_word: 0,
            }],
            options(),
        );
        assert_eq!(
            worker.wait(|_| ()).unwrap_err(),
            FillError::Grid(grid::Error::InvalidValue { cell: 0 }),
        );

        let template = parse_template("....").unwrap();
        worker.solve(template.cells, options());
        assert_eq!(worker.wait(|_| ()).unwrap_err(), FillError::Unsolvable);

        assert_eq!(worker.shutdown().unwrap().len(), 1);
    }

    // Random six-letter words almost never make a full 6×6 grid so the
    // fill keeps backtracking for a long time
    fn slow_banks() -> WordBanks {
        let mut rng = SmallRng::seed_from_u64(1);
        let words = (0..3000).map(|_| {
            (0..6).map(|_| rng.gen_range(b'A'..=b'Z') as char).collect::<String>()
        });

        let mut banks = banks();
        banks.insert(
            "random".to_string(),
            WordBank::from_words(words).unwrap(),
        );
        banks
    }

    fn slow_grid() -> Vec<Cell> {
        parse_template(&["......"; 6].join("\n")).unwrap().cells
    }

    #[test]
    fn abort_running_fill() {
        let worker = Worker::spawn(slow_banks());

        worker.solve(slow_grid(), options());
        worker.abort();

        assert_eq!(worker.wait(|_| ()).unwrap_err(), FillError::Canceled);

        // The worker is still usable afterwards
        let template = parse_template("...\n...\n...").unwrap();
        worker.solve(template.cells, options());
        let cells = worker.wait(|_| ()).unwrap();
        assert_eq!(&render(&cells, 3), "CAT\nARE\nTEN");

        assert_eq!(worker.shutdown().unwrap().len(), 2);
    }

    #[test]
    fn new_fill_supersedes_running_one() {
        let worker = Worker::spawn(slow_banks());
        let template = parse_template("...\n...\n...").unwrap();

        worker.solve(slow_grid(), options());
        worker.solve(template.cells, options());

        let results = worker.responses().iter()
            .filter(|response| !matches!(response, Response::Progress(_)))
            .take(2)
            .collect::<Vec<Response>>();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], Response::Error(FillError::Canceled));

        let Response::Solution(cells) = &results[1]
        else {
            unreachable!("expected a solution, got {:?}", results[1]);
        };

        assert_eq!(&render(cells, 3), "CAT\nARE\nTEN");

        assert!(worker.shutdown().is_some());
    }
}
