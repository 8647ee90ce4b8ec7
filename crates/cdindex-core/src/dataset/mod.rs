//! Artist influence dataset: id extraction, category reverse index and edge
//! derivation.
//!
//! # Format
//!
//! A JSON object keyed by artist id. Each record may carry:
//!
//! ```json
//! {
//!   "mn0000000001": {
//!     "influencer": ["<a href=\"/artist/x-mn0000000002\">X</a>"],
//!     "genres": { "ma0000002613": "Jazz" },
//!     "styles": { "ma0000011903": "Bebop" },
//!     "decades": ["1940s", "1950s"]
//!   }
//! }
//! ```
//!
//! Missing fields default to empty. Only the first genre, style and decade
//! of an artist are indexed. Key order of the file is preserved and drives
//! edge order. Gzip-compressed files (`.gz` or gzip magic bytes) are
//! decompressed transparently.
//!
//! # Id Extraction
//!
//! Influencer entries are free text. The referenced id is the 12-byte token
//! starting at the *last* occurrence of the `mn` marker.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::ErrorCode;
use crate::graph::edgelist::Edge;

/// Marker that prefixes every artist id.
pub const ID_MARKER: &str = "mn";

/// Byte length of an artist id, marker included.
pub const ID_LEN: usize = 12;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading an artist dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse artist dataset {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DatasetError {
    /// Stable error code for this failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Read { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                ErrorCode::InputNotFound
            }
            Self::Read { .. } => ErrorCode::InputUnreadable,
            Self::Parse { .. } => ErrorCode::DatasetParseError,
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One artist entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArtistRecord {
    #[serde(default)]
    pub influencer: Vec<String>,
    /// Genre id → name, in file order.
    #[serde(default)]
    pub genres: Map<String, Value>,
    /// Style id → name, in file order.
    #[serde(default)]
    pub styles: Map<String, Value>,
    #[serde(default)]
    pub decades: Vec<Value>,
}

impl ArtistRecord {
    /// Name of the first listed genre.
    #[must_use]
    pub fn primary_genre(&self) -> Option<String> {
        self.genres.values().next().map(label)
    }

    /// Name of the first listed style.
    #[must_use]
    pub fn primary_style(&self) -> Option<String> {
        self.styles.values().next().map(label)
    }

    /// First listed decade.
    #[must_use]
    pub fn primary_decade(&self) -> Option<String> {
        self.decades.first().map(label)
    }

    /// Distinct influencer ids in first-seen order; unparseable entries are
    /// dropped.
    #[must_use]
    pub fn influencer_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.influencer
            .iter()
            .filter_map(|text| extract_id(text))
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Artist records keyed by artist id, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtistDataset {
    artists: Vec<(String, ArtistRecord)>,
}

impl<'de> Deserialize<'de> for ArtistDataset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Goes through serde_json's order-preserving map so file order survives.
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let artists = map
            .into_iter()
            .map(|(id, value)| {
                ArtistRecord::deserialize(value)
                    .map(|record| (id, record))
                    .map_err(D::Error::custom)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { artists })
    }
}

impl ArtistDataset {
    /// Parse a dataset from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] on malformed input.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load a dataset from `path`, plain or gzip-compressed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Read`] if the file cannot be read and
    /// [`DatasetError::Parse`] if it does not decompress or parse.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let bytes = fs::read(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let compressed = bytes.starts_with(&GZIP_MAGIC)
            || path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
        let parsed: Result<Self, serde_json::Error> = if compressed {
            serde_json::from_reader(GzDecoder::new(bytes.as_slice()))
        } else {
            serde_json::from_slice(&bytes)
        };

        let dataset = parsed.map_err(|source| DatasetError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(artists = dataset.len(), compressed, "loaded artist dataset");
        Ok(dataset)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.artists.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    /// Iterate `(artist id, record)` pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArtistRecord)> {
        self.artists.iter().map(|(id, record)| (id.as_str(), record))
    }

    /// Look up one artist.
    #[must_use]
    pub fn get(&self, artist: &str) -> Option<&ArtistRecord> {
        self.iter().find(|(id, _)| *id == artist).map(|(_, record)| record)
    }
}

// ---------------------------------------------------------------------------
// Id extraction
// ---------------------------------------------------------------------------

/// Extract the artist id referenced by a free-text influencer entry.
///
/// Returns the [`ID_LEN`]-byte token starting at the last [`ID_MARKER`], or
/// `None` if there is no marker or fewer than [`ID_LEN`] bytes follow it.
#[must_use]
pub fn extract_id(text: &str) -> Option<&str> {
    let start = text.rfind(ID_MARKER)?;
    text.get(start..start + ID_LEN)
}

// ---------------------------------------------------------------------------
// Reverse index
// ---------------------------------------------------------------------------

/// Artist ids grouped by primary decade, genre and style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseIndex {
    pub decades: BTreeMap<String, BTreeSet<String>>,
    pub genres: BTreeMap<String, BTreeSet<String>>,
    pub styles: BTreeMap<String, BTreeSet<String>>,
}

/// Which category of the reverse index to select from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Decade,
    Genre,
    Style,
}

impl ReverseIndex {
    /// Artists filed under `name` in `category` (empty if none).
    #[must_use]
    pub fn members(&self, category: Category, name: &str) -> HashSet<&str> {
        let table = match category {
            Category::Decade => &self.decades,
            Category::Genre => &self.genres,
            Category::Style => &self.styles,
        };
        table
            .get(name)
            .map(|ids| ids.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Group every artist under its first genre, style and decade.
#[must_use]
pub fn build_reverse_index(dataset: &ArtistDataset) -> ReverseIndex {
    let mut index = ReverseIndex::default();
    for (artist, record) in dataset.iter() {
        if let Some(genre) = record.primary_genre() {
            index.genres.entry(genre).or_default().insert(artist.to_string());
        }
        if let Some(style) = record.primary_style() {
            index.styles.entry(style).or_default().insert(artist.to_string());
        }
        if let Some(decade) = record.primary_decade() {
            index.decades.entry(decade).or_default().insert(artist.to_string());
        }
    }
    index
}

// ---------------------------------------------------------------------------
// Edge derivation
// ---------------------------------------------------------------------------

/// Derive `artist → influencer` edges.
///
/// Only artists in `subset` (all artists when `None`) contribute edges,
/// visited in dataset order. With `restrictive`, influencers outside the
/// subset are dropped as well; without a subset that means influencers that
/// are not artists of the dataset.
#[must_use]
#[instrument(skip(dataset, subset), fields(artists = dataset.len()))]
pub fn influence_edges(
    dataset: &ArtistDataset,
    subset: Option<&HashSet<&str>>,
    restrictive: bool,
) -> Vec<Edge> {
    let dataset_ids: Option<HashSet<&str>> =
        (restrictive && subset.is_none()).then(|| dataset.iter().map(|(id, _)| id).collect());
    let considered = subset.or(dataset_ids.as_ref());
    let in_subset = |artist: &str| considered.is_none_or(|s| s.contains(artist));

    let mut edges = Vec::new();
    for (artist, record) in dataset.iter().filter(|&(artist, _)| in_subset(artist)) {
        for influencer in record.influencer_ids() {
            if restrictive && !in_subset(influencer) {
                continue;
            }
            edges.push((artist.to_string(), influencer.to_string()));
        }
    }
    debug!(edges = edges.len(), "derived influence edges");
    edges
}

fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
