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

use std::fs;
use std::path::{Path, PathBuf};
use crossfill::assets::{self, AssetLoader, ListConfig};
use crossfill::grid::{self, Cell};
use crossfill::solver::{self, CancelToken, FillError, Options};
use crossfill::word_bank::{WordBank, WordBanks};
use crossfill::word_index::{FixedLengthIndex, WordIndex};
use crossfill::trie::TrieIndex;
use crossfill::worker::Worker;

const WORDS: &str = "\
cat
are
ten
dog
car
a
";

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "crossfill-test-{}-{}",
        std::process::id(),
        name,
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn write_list(name: &str) -> PathBuf {
    let dir = temp_dir(name);
    let words = assets::ingest(WORDS.as_bytes(), &ListConfig::default()).unwrap();

    assets::write_assets(&words, &dir, "basic").unwrap();

    dir
}

fn packed_banks(dir: &Path) -> WordBanks {
    let loader = AssetLoader::open(assets::manifest_path(dir, "basic")).unwrap();

    let mut banks = WordBanks::new();
    banks.insert(loader.id().to_string(), loader.load_bank().unwrap());
    banks
}

#[test]
fn packed_list_through_worker() {
    let dir = write_list("worker");
    let template = grid::parse_template("...\n...\n...").unwrap();
    let worker = Worker::spawn(packed_banks(&dir));

    worker.solve(
        template.cells,
        Options { seed: Some(42), ..Options::default() },
    );

    let cells = worker.wait(|_| ()).unwrap();
    assert_eq!(&grid::render(&cells, 3), "CAT\nARE\nTEN");

    let banks = worker.shutdown().unwrap();
    assert!(banks["basic"].test_sync("D*G"));
    // Single letters are dropped when the list is built
    assert!(banks["basic"].index(1).is_none());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn never_fills_with_dog() {
    let dir = write_list("dog");

    for seed in 0..8 {
        let template = grid::parse_template("C..\n.##\n.##").unwrap();

        let cells = solver::fill(
            &template.cells,
            packed_banks(&dir),
            Options { seed: Some(seed), ..Options::default() },
            &mut || false,
        ).unwrap();

        let rendered = grid::render(&cells, 3);

        assert!(rendered.starts_with("CAT") || rendered.starts_with("CAR"));
        assert!(!rendered.contains("DOG"));
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn json_cells_round_trip() {
    let cells = serde_json::from_str::<Vec<Cell>>(
        r#"[
            {"type": "content", "value": "C", "acrossWord": 0, "downWord": 0},
            {"type": "content", "value": "", "acrossWord": 0, "downWord": 1},
            {"type": "content", "value": "", "acrossWord": 0, "downWord": 2},
            {"type": "block"}
        ]"#
    ).unwrap();

    let mut banks = WordBanks::new();
    banks.insert(
        "custom".to_string(),
        WordBank::from_words(["COT"]).unwrap(),
    );

    let filled = solver::fill(&cells, banks, Options::default(), &mut || false)
        .unwrap();

    assert_eq!(
        serde_json::to_value(&filled).unwrap(),
        serde_json::json!([
            {"type": "content", "value": "C", "acrossWord": 0, "downWord": 0},
            {"type": "content", "value": "O", "acrossWord": 0, "downWord": 1},
            {"type": "content", "value": "T", "acrossWord": 0, "downWord": 2},
            {"type": "block"}
        ]),
    );
}

#[test]
fn distinguishable_failures() {
    let template = grid::parse_template(".....").unwrap();
    let mut banks = WordBanks::new();
    banks.insert("short".to_string(), WordBank::from_words(["CAT"]).unwrap());

    assert_eq!(
        solver::fill(&template.cells, banks, Options::default(), &mut || false)
            .unwrap_err(),
        FillError::Unsolvable,
    );

    let token = CancelToken::new();
    token.cancel();

    let template = grid::parse_template("...").unwrap();
    let mut banks = WordBanks::new();
    banks.insert("short".to_string(), WordBank::from_words(["CAT"]).unwrap());

    assert_eq!(
        solver::fill(&template.cells, banks, Options::default(), &mut token.clone())
            .unwrap_err(),
        FillError::Canceled,
    );
}

#[test]
fn wildcard_middle_letter() {
    let mut index = WordIndex::Trie(TrieIndex::new(3));

    for word in ["CAT", "BAT", "DOG"] {
        index.add_word(word).unwrap();
    }
    index.commit();

    let mut words = index.match_words("*A*");
    words.sort_unstable();

    assert_eq!(&words, &["BAT", "CAT"]);
}
