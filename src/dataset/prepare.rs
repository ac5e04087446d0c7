use std::ops::Range;

use csv::ReaderBuilder;
use serde::Serialize;

use super::decode::{NameFix, apply_fixes};
use super::DataError;
use crate::model::{AudioFeature, Key, Mode, Platform, Track};

/// Number of tracks kept after ranking.
pub const WORKING_SET_SIZE: usize = 100;

/// Cell spellings treated as missing, in addition to blank cells.
const NA_VALUES: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>",
    "#N/A", "#N/A N/A", "#NA", "1.#IND", "1.#QNAN", "-1.#IND", "-1.#QNAN",
];

/// The dataset as read from CSV, before any cleanup. Cells are kept as text.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse CSV text with a header row. Ragged rows are accepted here;
    /// short rows end up with missing cells and are dropped by [`prepare`].
    pub fn from_csv(text: &str) -> Result<Self, DataError> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(Self { headers, rows })
    }
}

/// What happened to the raw rows on the way to the working set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrepareStats {
    pub raw_rows: usize,
    pub dropped_missing: usize,
    pub dropped_malformed_streams: usize,
    pub valid_rows: usize,
}

/// The top tracks by streams, in ranking order. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingSet {
    tracks: Vec<Track>,
    stats: PrepareStats,
}

impl WorkingSet {
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn stats(&self) -> &PrepareStats {
        &self.stats
    }

    /// Tracks whose 0-based rank position falls in `range`, clipped to the set.
    pub fn slice(&self, range: Range<usize>) -> &[Track] {
        let end = range.end.min(self.tracks.len());
        let start = range.start.min(end);
        &self.tracks[start..end]
    }
}

/// Column positions for every field the working set needs.
struct Columns {
    name: usize,
    artists: usize,
    streams: usize,
    playlists: [usize; 3],
    features: [usize; 6],
    key: usize,
    mode: usize,
}

impl Columns {
    fn resolve(headers: &[String]) -> Result<Self, DataError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DataError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            name: find("track_name")?,
            artists: find("artist(s)_name")?,
            streams: find("streams")?,
            playlists: [
                find(Platform::Spotify.column())?,
                find(Platform::Apple.column())?,
                find(Platform::Deezer.column())?,
            ],
            features: [
                find(AudioFeature::Danceability.column())?,
                find(AudioFeature::Valence.column())?,
                find(AudioFeature::Energy.column())?,
                find(AudioFeature::Acousticness.column())?,
                find(AudioFeature::Liveness.column())?,
                find(AudioFeature::Speechiness.column())?,
            ],
            key: find("key")?,
            mode: find("mode")?,
        })
    }
}

/// Turn the raw table into the working set.
///
/// 1. drop rows with any missing cell (every column counts, not only the ones used)
/// 2. keep rows whose `streams` text is all ASCII digits, as an integer
/// 3. strip thousands separators from the Deezer playlist count
/// 4. stable sort by streams, descending
/// 5. keep the first [`WORKING_SET_SIZE`] rows
///
/// Any other unparseable value fails the whole preparation.
pub fn prepare(raw: &RawTable, fixes: &[NameFix]) -> Result<WorkingSet, DataError> {
    let cols = Columns::resolve(&raw.headers)?;
    let width = raw.headers.len();

    let mut stats = PrepareStats {
        raw_rows: raw.rows.len(),
        ..Default::default()
    };
    let mut tracks = Vec::new();

    for (i, row) in raw.rows.iter().enumerate() {
        // Header is line 1.
        let line = i + 2;

        if row.len() < width || row.iter().take(width).any(|c| is_missing(c)) {
            stats.dropped_missing += 1;
            continue;
        }

        let Some(streams) = parse_streams(&row[cols.streams]) else {
            log::debug!("line {line}: dropping row with streams {:?}", row[cols.streams]);
            stats.dropped_malformed_streams += 1;
            continue;
        };

        let count = |column: &str, text: &str| parse_count(text, line, column);
        let feature = |f: AudioFeature, idx: usize| parse_feature(&row[idx], line, f.column());

        let deezer = row[cols.playlists[2]].replace(',', "");

        tracks.push(Track {
            rank: 0,
            name: apply_fixes(&row[cols.name], fixes),
            artists: apply_fixes(&row[cols.artists], fixes),
            streams,
            spotify_playlists: count(Platform::Spotify.column(), &row[cols.playlists[0]])?,
            apple_playlists: count(Platform::Apple.column(), &row[cols.playlists[1]])?,
            deezer_playlists: count(Platform::Deezer.column(), &deezer)?,
            danceability: feature(AudioFeature::Danceability, cols.features[0])?,
            valence: feature(AudioFeature::Valence, cols.features[1])?,
            energy: feature(AudioFeature::Energy, cols.features[2])?,
            acousticness: feature(AudioFeature::Acousticness, cols.features[3])?,
            liveness: feature(AudioFeature::Liveness, cols.features[4])?,
            speechiness: feature(AudioFeature::Speechiness, cols.features[5])?,
            key: row[cols.key]
                .parse::<Key>()
                .map_err(|_| invalid(line, "key", &row[cols.key]))?,
            mode: row[cols.mode]
                .parse::<Mode>()
                .map_err(|_| invalid(line, "mode", &row[cols.mode]))?,
        });
    }

    stats.valid_rows = tracks.len();

    // Vec::sort_by is stable: equal stream counts keep input order.
    tracks.sort_by(|a, b| b.streams.cmp(&a.streams));
    tracks.truncate(WORKING_SET_SIZE);
    for (i, t) in tracks.iter_mut().enumerate() {
        t.rank = i + 1;
    }

    log::info!(
        "Prepared {} tracks from {} rows ({} with missing values, {} with malformed streams)",
        tracks.len(),
        stats.raw_rows,
        stats.dropped_missing,
        stats.dropped_malformed_streams
    );

    Ok(WorkingSet { tracks, stats })
}

fn is_missing(cell: &str) -> bool {
    let c = cell.trim();
    c.is_empty() || NA_VALUES.contains(&c)
}

/// Streams must be purely digits; separators, signs and decimals are rejected.
fn parse_streams(text: &str) -> Option<u64> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Non-negative integer count. Integral floats (`"12.0"`) are accepted.
fn parse_count(text: &str, line: usize, column: &str) -> Result<u64, DataError> {
    let t = text.trim();
    if let Ok(n) = t.parse::<u64>() {
        return Ok(n);
    }
    match t.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => Ok(v as u64),
        _ => Err(invalid(line, column, text)),
    }
}

fn parse_feature(text: &str, line: usize, column: &str) -> Result<f64, DataError> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(invalid(line, column, text)),
    }
}

fn invalid(line: usize, column: &str, value: &str) -> DataError {
    DataError::InvalidValue {
        line,
        column: column.to_string(),
        value: value.to_string(),
    }
}
