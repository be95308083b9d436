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

use std::process::ExitCode;
use std::path::PathBuf;
use clap::Parser;
use crossfill::assets::{self, AssetError, ListConfig};
use crossfill::logging;

#[derive(Parser)]
#[command(name = "build-dawg")]
struct Cli {
    /// Word list with one entry per line
    #[arg(value_name = "FILE")]
    input: PathBuf,
    #[arg(value_name = "DIR")]
    output_dir: PathBuf,
    /// Name of the list, used for the manifest and asset file names
    base_name: String,
    /// Splits each line into columns
    #[arg(short, long)]
    delimiter: Option<char>,
    /// Column containing the word, counting from zero
    #[arg(short, long)]
    column: Option<usize>,
    #[arg(long, value_name = "LENGTH")]
    min_length: Option<usize>,
    #[arg(long, value_name = "LENGTH")]
    max_length: Option<usize>,
    /// JSON file with settings for each list name
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

fn list_config(cli: &Cli) -> Result<ListConfig, AssetError> {
    let mut config = match &cli.config {
        Some(path) => {
            assets::read_configs(path)?
                .remove(&cli.base_name)
                .unwrap_or_default()
        },
        None => ListConfig::default(),
    };

    if cli.delimiter.is_some() {
        config.delimiter = cli.delimiter;
    }
    if let Some(column) = cli.column {
        config.column = column;
    }
    if let Some(min_length) = cli.min_length {
        config.min_length = min_length;
    }
    if cli.max_length.is_some() {
        config.max_length = cli.max_length;
    }

    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init_logger(cli.verbose);

    let config = match list_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        },
    };

    let words = match assets::read_word_list(&cli.input, &config) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        },
    };

    if words.is_empty() {
        eprintln!("{}: no usable words", cli.input.display());
        return ExitCode::FAILURE;
    }

    match assets::write_assets(&words, &cli.output_dir, &cli.base_name) {
        Ok(manifest) => {
            log::info!(
                "wrote {} assets to {}",
                manifest.assets.len(),
                assets::manifest_path(&cli.output_dir, &cli.base_name).display(),
            );
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_override_config() {
        let path = std::env::temp_dir().join(format!(
            "crossfill-build-dawg-{}.json",
            std::process::id(),
        ));
        std::fs::write(
            &path,
            r#"{"scored": {"delimiter": ";", "column": 1, "minLength": 3}}"#,
        ).unwrap();

        let cli = Cli::parse_from([
            "build-dawg",
            "words.txt",
            "out",
            "scored",
            "--config",
            path.to_str().unwrap(),
            "--max-length",
            "15",
            "--column",
            "2",
        ]);

        assert_eq!(
            list_config(&cli).unwrap(),
            ListConfig {
                delimiter: Some(';'),
                column: 2,
                min_length: 3,
                max_length: Some(15),
            },
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["build-dawg", "words.txt", "out", "core"]);

        assert_eq!(list_config(&cli).unwrap(), ListConfig::default());
        assert!(Cli::try_parse_from(["build-dawg", "words.txt"]).is_err());
    }
}
