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

//! Word list ingestion and the precompiled asset files.
//!
//! A list called `base` is stored as one `<base>-<length>-<hash>.dawg`
//! file per word length, holding the base64 word graph, plus a
//! `<base>.manifest.json` file mapping each length to its file name.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::{self, File};
use std::hash::Hasher;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use super::dawg::{DawgBuilder, DecodeError};
use super::word_bank::WordBank;
use super::word_index::IndexError;

/// Words grouped by length, sorted and without duplicates.
pub type WordsByLength = BTreeMap<usize, BTreeSet<String>>;

#[derive(Debug)]
pub enum AssetError {
    Io { path: PathBuf, error: io::Error },
    Json { path: PathBuf, error: serde_json::Error },
    Decode { path: PathBuf, error: DecodeError },
    Index(IndexError),
    MissingAsset { length: usize },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssetError::Io { path, error } => {
                write!(f, "{}: {}", path.display(), error)
            },
            AssetError::Json { path, error } => {
                write!(f, "{}: {}", path.display(), error)
            },
            AssetError::Decode { path, error } => {
                write!(f, "{}: {}", path.display(), error)
            },
            AssetError::Index(e) => write!(f, "{}", e),
            AssetError::MissingAsset { length } => {
                write!(f, "no asset for words of length {}", length)
            },
        }
    }
}

impl std::error::Error for AssetError {}

impl From<IndexError> for AssetError {
    fn from(e: IndexError) -> AssetError {
        AssetError::Index(e)
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> AssetError + '_ {
    move |error| AssetError::Io { path: path.to_owned(), error }
}

/// How to pull words out of a list file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListConfig {
    /// Splits each line into columns
    pub delimiter: Option<char>,
    pub column: usize,
    pub min_length: usize,
    pub max_length: Option<usize>,
}

impl Default for ListConfig {
    fn default() -> ListConfig {
        ListConfig {
            delimiter: None,
            column: 0,
            min_length: 2,
            max_length: None,
        }
    }
}

/// Per-list settings read from a config file, keyed by list name.
pub type ListConfigs = BTreeMap<String, ListConfig>;

pub fn read_configs(path: &Path) -> Result<ListConfigs, AssetError> {
    let file = File::open(path).map_err(io_error(path))?;

    serde_json::from_reader(BufReader::new(file))
        .map_err(|error| AssetError::Json { path: path.to_owned(), error })
}

/// Uppercases an entry and drops anything that isn’t a letter.
pub fn normalize_word(entry: &str) -> Option<String> {
    let word = entry.chars()
        .filter(|ch| ch.is_alphabetic())
        .flat_map(char::to_uppercase)
        .collect::<String>();

    (!word.is_empty()).then_some(word)
}

pub fn ingest<R>(reader: R, config: &ListConfig) -> io::Result<WordsByLength>
    where R: BufRead
{
    let mut words = WordsByLength::new();

    for line in reader.lines() {
        let line = line?;

        let field = match config.delimiter {
            Some(delimiter) => line.split(delimiter).nth(config.column),
            None => Some(line.as_str()),
        };

        let Some(word) = field.and_then(normalize_word)
        else {
            continue;
        };

        let length = word.chars().count();

        if length < config.min_length ||
            config.max_length.is_some_and(|max| length > max)
        {
            continue;
        }

        words.entry(length).or_default().insert(word);
    }

    Ok(words)
}

pub fn read_word_list(path: &Path, config: &ListConfig) -> Result<WordsByLength, AssetError> {
    let file = File::open(path).map_err(io_error(path))?;

    ingest(BufReader::new(file), config).map_err(io_error(path))
}

pub fn content_hash(payload: &str) -> String {
    let mut hasher = FxHasher::default();
    hasher.write(payload.as_bytes());
    format!("{:016x}", hasher.finish())
}

pub fn asset_file_name(base_name: &str, length: usize, payload: &str) -> String {
    format!("{}-{}-{}.dawg", base_name, length, content_hash(payload))
}

pub fn manifest_path(output_dir: &Path, base_name: &str) -> PathBuf {
    output_dir.join(format!("{}.manifest.json", base_name))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub id: String,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
    pub assets: BTreeMap<usize, String>,
}

/// Encodes one word graph per length into `output_dir` and writes the
/// manifest alongside.
pub fn write_assets(
    words: &WordsByLength,
    output_dir: &Path,
    base_name: &str,
) -> Result<Manifest, AssetError> {
    fs::create_dir_all(output_dir).map_err(io_error(output_dir))?;

    let mut assets = BTreeMap::new();

    for (&length, words) in words.iter() {
        let mut builder = DawgBuilder::new(length);

        for word in words.iter() {
            builder.add_word(word)?;
        }

        let payload = builder.build().encode_base64();
        let file_name = asset_file_name(base_name, length, &payload);
        let path = output_dir.join(&file_name);

        fs::write(&path, &payload).map_err(io_error(&path))?;

        log::info!(
            "wrote {} words of length {} to {}",
            words.len(),
            length,
            path.display(),
        );

        assets.insert(length, file_name);
    }

    let manifest = Manifest {
        id: base_name.to_string(),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
        assets,
    };

    let path = manifest_path(output_dir, base_name);

    let json = serde_json::to_string_pretty(&manifest)
        .map_err(|error| AssetError::Json { path: path.clone(), error })?;

    fs::write(&path, json).map_err(io_error(&path))?;

    Ok(manifest)
}

/// Reads a list’s assets back through its manifest.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    path: PathBuf,
    dir: PathBuf,
    manifest: Manifest,
}

impl AssetLoader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<AssetLoader, AssetError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(io_error(path))?;

        let manifest = serde_json::from_str::<Manifest>(&json)
            .map_err(|error| AssetError::Json { path: path.to_owned(), error })?;

        let dir = path.parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(AssetLoader { path: path.to_owned(), dir, manifest })
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn asset_path(&self, length: usize) -> Result<PathBuf, AssetError> {
        self.manifest.assets.get(&length)
            .map(|file_name| self.dir.join(file_name))
            .ok_or(AssetError::MissingAsset { length })
    }

    pub fn load_length(&self, length: usize) -> Result<String, AssetError> {
        let path = self.asset_path(length)?;
        let payload = fs::read_to_string(&path).map_err(io_error(&path))?;

        Ok(payload.trim_end().to_string())
    }

    /// Every payload in the manifest keyed by word length.
    pub fn load(&self) -> Result<BTreeMap<usize, String>, AssetError> {
        self.manifest.assets.keys()
            .map(|&length| Ok((length, self.load_length(length)?)))
            .collect()
    }

    pub fn load_bank(&self) -> Result<WordBank, AssetError> {
        let bank = WordBank::from_packed(self.load()?)
            .map_err(|error| AssetError::Decode { path: self.path.clone(), error })?;

        log::info!(
            "loaded word list “{}” with lengths {:?}",
            self.id(),
            bank.lengths().collect::<Vec<_>>(),
        );

        Ok(bank)
    }
}
