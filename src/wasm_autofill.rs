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

//! Browser bindings. The page drives the search in small batches of
//! steps with `run` so that it never blocks for long, and can cancel
//! between batches.

use wasm_bindgen::prelude::*;
use super::grid::{Cell, Topology};
use super::logging;
use super::solver::{CancelToken, FillError, Options, Progress, Solver, Status};
use super::word_bank::{WordBank, WordBanks};

fn fill_error_value(e: FillError) -> JsValue {
    match e {
        FillError::Unsolvable => JsValue::from_str("unsolvable"),
        FillError::Canceled => JsValue::from_str("canceled"),
        FillError::Grid(e) => JsValue::from_str(&e.to_string()),
    }
}

#[wasm_bindgen]
pub struct Autofill {
    // Held here while no fill is running
    banks: WordBanks,
    solver: Option<Solver>,
    token: CancelToken,
}

impl Autofill {
    fn finish(&mut self) {
        if let Some(solver) = self.solver.take() {
            self.banks = solver.into_banks();
        }
    }

    fn bank(&mut self, list: &str) -> &mut WordBank {
        self.finish();
        self.banks.entry(list.to_string()).or_default()
    }
}

#[wasm_bindgen]
impl Autofill {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Autofill {
        logging::init_logger(false);

        Autofill {
            banks: WordBanks::new(),
            solver: None,
            token: CancelToken::new(),
        }
    }

    /// Adds an array of words to the named list.
    #[wasm_bindgen(js_name = addWords)]
    pub fn add_words(&mut self, list: &str, words: js_sys::Array) -> Result<(), JsValue> {
        let words = words.iter()
            .filter_map(|word| word.as_string())
            .collect::<Vec<String>>();

        self.bank(list).extend(words)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Replaces the named list with precompiled word graphs given as an
    /// object mapping each length to its payload.
    #[wasm_bindgen(js_name = addPackedList)]
    pub fn add_packed_list(
        &mut self,
        list: &str,
        payloads: js_sys::Object,
    ) -> Result<(), JsValue> {
        let mut entries = Vec::new();

        for entry in js_sys::Object::entries(&payloads).iter() {
            let entry = js_sys::Array::from(&entry);

            let Some(length) = entry.get(0).as_string()
                .and_then(|key| key.parse::<usize>().ok())
            else {
                return Err(JsValue::from_str("invalid word length"));
            };

            let Some(payload) = entry.get(1).as_string()
            else {
                return Err(JsValue::from_str("invalid payload"));
            };

            entries.push((length, payload));
        }

        let bank = WordBank::from_packed(entries)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        self.finish();
        self.banks.insert(list.to_string(), bank);

        Ok(())
    }

    /// Starts a new fill of the grid given as a JSON array of cells,
    /// abandoning any fill already in progress.
    pub fn start(&mut self, cells: &str, seed: Option<u32>) -> Result<(), JsValue> {
        self.finish();

        let cells = serde_json::from_str::<Vec<Cell>>(cells)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let options = Options {
            seed: seed.map(u64::from),
            ..Options::default()
        };

        let topology = Topology::from_cells(&cells)
            .map_err(|e| fill_error_value(e.into()))?;

        self.token = CancelToken::new();
        self.solver = Some(Solver::new(
            topology,
            std::mem::take(&mut self.banks),
            options,
        ));

        Ok(())
    }

    /// Runs at most `budget` search steps. Returns the filled cells as
    /// JSON once the fill is complete, or `undefined` if there is more
    /// to do.
    pub fn run(
        &mut self,
        budget: u32,
        on_progress: &js_sys::Function,
    ) -> Result<Option<String>, JsValue> {
        let Some(solver) = self.solver.as_mut()
        else {
            return Err(JsValue::from_str("no fill in progress"));
        };

        let mut report = |progress: &Progress| {
            if let Ok(json) = serde_json::to_string(progress) {
                let _ = on_progress.call1(&JsValue::NULL, &JsValue::from_str(&json));
            }
        };

        for _ in 0..budget {
            match solver.step(&mut self.token, &mut report) {
                Ok(Status::Running) => (),
                Ok(Status::Solved) => {
                    let result = solver.solution()
                        .map(|cells| serde_json::to_string(&cells))
                        .transpose()
                        .map_err(|e| JsValue::from_str(&e.to_string()));
                    self.finish();
                    return result;
                },
                Err(e) => {
                    self.finish();
                    return Err(fill_error_value(e));
                },
            }
        }

        Ok(None)
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[wasm_bindgen(js_name = resetCache)]
    pub fn reset_cache(&mut self) {
        self.finish();

        for bank in self.banks.values_mut() {
            bank.reset_cache();
        }
    }
}

impl Default for Autofill {
    fn default() -> Autofill {
        Autofill::new()
    }
}
