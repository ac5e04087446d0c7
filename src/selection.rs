//! Shared selection state for the linked charts.
//!
//! A dashboard session owns exactly one [`SelectionState`]; every chart
//! builder borrows the same instance, so a toggle or drag made through one
//! chart shows up in all of them on the next recomposition.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use serde::Serialize;
use thiserror::Error;

use crate::model::{AudioFeature, Field, Track};

/// Upper bound of the rank range selector.
pub const SLICE_LIMIT: usize = 100;

#[derive(Error, Debug, PartialEq)]
pub enum SelectionError {
    #[error(
        "invalid axis {0:?}: expected one of danceability_%, valence_%, energy_%, acousticness_%, liveness_%, speechiness_%"
    )]
    InvalidAxis(String),
    #[error("invalid rank range {start}..{end}: need 0 <= start <= end <= 100")]
    InvalidSlice { start: usize, end: usize },
    #[error("invalid brush field {0:?}")]
    InvalidField(String),
    #[error("invalid brush interval for {field}: [{min}, {max}]")]
    InvalidInterval { field: String, min: f64, max: f64 },
}

/// Validate a scatter axis choice. Only the six audio features are allowed.
pub fn parse_axis(name: &str) -> Result<AudioFeature, SelectionError> {
    AudioFeature::from_column(name).ok_or_else(|| SelectionError::InvalidAxis(name.to_string()))
}

/// Contiguous rank range `[start, end)` of the working set on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slice {
    start: usize,
    end: usize,
}

impl Slice {
    pub fn new(start: usize, end: usize) -> Result<Self, SelectionError> {
        if start > end || end > SLICE_LIMIT {
            return Err(SelectionError::InvalidSlice { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Width of the requested range, independent of how many rows exist.
    pub fn span(&self) -> usize {
        self.end - self.start
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl Default for Slice {
    fn default() -> Self {
        Self { start: 0, end: 25 }
    }
}

/// Track names currently marked active. Empty means nothing is highlighted
/// and every row renders in the active style.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HighlightSet(BTreeSet<String>);

impl HighlightSet {
    /// Add the name if absent, remove it if present. Returns whether the
    /// name is highlighted afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.0.remove(name) {
            false
        } else {
            self.0.insert(name.to_string());
            true
        }
    }

    /// Add the name; a no-op when already highlighted.
    pub fn insert(&mut self, name: &str) {
        self.0.insert(name.to_string());
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    /// Matches on name only, so every row sharing the name is active.
    pub fn is_active(&self, track: &Track) -> bool {
        self.is_empty() || self.contains(&track.name)
    }
}

/// Closed numeric interval, `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    min: f64,
    max: f64,
}

impl Interval {
    /// Build from two drag endpoints in either order. Non-finite bounds are rejected.
    pub fn new(a: f64, b: f64) -> Option<Self> {
        if !a.is_finite() || !b.is_finite() {
            return None;
        }
        Some(Self { min: a.min(b), max: a.max(b) })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }
}

/// Interval filter over numeric fields, AND-combined. Inactive when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RangeBrush(BTreeMap<Field, Interval>);

impl RangeBrush {
    pub fn set(&mut self, field: Field, interval: Interval) {
        self.0.insert(field, interval);
    }

    pub fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }

    /// Parse and set an interval from request/CLI text.
    pub fn set_parsed(&mut self, field: &str, a: f64, b: f64) -> Result<(), SelectionError> {
        let f: Field = field
            .parse()
            .map_err(|_| SelectionError::InvalidField(field.to_string()))?;
        let interval = Interval::new(a, b).ok_or_else(|| SelectionError::InvalidInterval {
            field: field.to_string(),
            min: a,
            max: b,
        })?;
        self.set(f, interval);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_active(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn interval(&self, field: Field) -> Option<Interval> {
        self.0.get(&field).copied()
    }

    pub fn intervals(&self) -> impl Iterator<Item = (Field, Interval)> + '_ {
        self.0.iter().map(|(f, i)| (*f, *i))
    }

    pub fn admits(&self, track: &Track) -> bool {
        self.0.iter().all(|(f, i)| i.contains(track.value(*f)))
    }
}

/// How a row is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Active,
    Dimmed,
}

/// The two predicates every chart honors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionState {
    pub highlight: HighlightSet,
    pub brush: RangeBrush,
}

impl SelectionState {
    pub fn style(&self, track: &Track) -> Style {
        if self.highlight.is_active(track) {
            Style::Active
        } else {
            Style::Dimmed
        }
    }

    /// Rows that pass the brush. Row-level charts draw all of these.
    pub fn brushed<'a>(&self, tracks: &'a [Track]) -> Vec<&'a Track> {
        tracks.iter().filter(|t| self.brush.admits(t)).collect()
    }

    /// Rows that pass the brush and are active. Aggregate charts count these.
    pub fn counted<'a>(&self, tracks: &'a [Track]) -> Vec<&'a Track> {
        tracks
            .iter()
            .filter(|t| self.brush.admits(t) && self.highlight.is_active(t))
            .collect()
    }
}
