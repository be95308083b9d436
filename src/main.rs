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

use std::{fs, process::ExitCode, path::{Path, PathBuf}};
use clap::Parser;
use crossfill::assets::{self, AssetLoader, ListConfig};
use crossfill::grid;
use crossfill::logging;
use crossfill::solver::Options;
use crossfill::word_bank::{WordBank, WordBanks};
use crossfill::worker::Worker;

#[derive(Parser)]
#[command(name = "autofill")]
struct Cli {
    /// Grid drawn with `#` for blocks and `.` for empty cells. Read
    /// from stdin if not given.
    #[arg(value_name = "FILE")]
    template: Option<PathBuf>,
    /// Plain word list with one entry per line
    #[arg(short, long, value_name = "FILE")]
    words: Vec<PathBuf>,
    /// Manifest of a precompiled word list
    #[arg(short, long, value_name = "FILE")]
    manifest: Vec<PathBuf>,
    #[arg(short, long)]
    seed: Option<u64>,
    /// Print the filled cells as JSON
    #[arg(short, long)]
    json: bool,
    #[arg(short, long)]
    verbose: bool,
}

fn list_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn load_banks(cli: &Cli) -> Result<WordBanks, String> {
    let mut banks = WordBanks::new();

    for path in cli.words.iter() {
        let words = assets::read_word_list(path, &ListConfig::default())
            .map_err(|e| e.to_string())?;

        let bank = WordBank::from_words(words.into_values().flatten())
            .map_err(|e| format!("{}: {}", path.display(), e))?;

        banks.insert(list_name(path), bank);
    }

    for path in cli.manifest.iter() {
        let loader = AssetLoader::open(path).map_err(|e| e.to_string())?;
        let bank = loader.load_bank().map_err(|e| e.to_string())?;

        banks.insert(loader.id().to_string(), bank);
    }

    Ok(banks)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init_logger(cli.verbose);

    if cli.words.is_empty() && cli.manifest.is_empty() {
        eprintln!("at least one word list is needed (--words or --manifest)");
        return ExitCode::FAILURE;
    }

    let (source, template) = match &cli.template {
        Some(path) => (
            path.to_string_lossy().into_owned(),
            fs::read_to_string(path),
        ),
        None => (
            "stdin".to_string(),
            std::io::read_to_string(std::io::stdin()),
        ),
    };

    let template = match template {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}: {}", source, e);
            return ExitCode::FAILURE;
        },
    };

    let template = match grid::parse_template(&template) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}: {}", source, e);
            return ExitCode::FAILURE;
        },
    };

    let banks = match load_banks(&cli) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        },
    };

    let worker = Worker::spawn(banks);

    worker.solve(
        template.cells,
        Options { seed: cli.seed, ..Options::default() },
    );

    let result = worker.wait(|progress| {
        log::info!(
            "{:.1}s: {} left of {}, {} tests, {} backtracks, {} pruned",
            progress.elapsed_time,
            progress.left_to_solve,
            progress.total_words,
            progress.n,
            progress.backtracks,
            progress.pruned,
        );
    });

    worker.shutdown();

    let cells = match result {
        Ok(cells) => cells,
        Err(e) => {
            eprintln!("{}: {}", source, e);
            return ExitCode::FAILURE;
        },
    };

    if cli.json {
        match serde_json::to_string_pretty(&cells) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            },
        }
    } else {
        println!("{}", grid::render(&cells, template.width));
    }

    ExitCode::SUCCESS
}
