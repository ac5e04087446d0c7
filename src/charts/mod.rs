//! Declarative chart descriptions for the dashboard.
//!
//! Each builder is a pure function of the displayed slice, the view
//! parameters and the shared [`SelectionState`]. Nothing here draws; the
//! output serializes to JSON for whatever renderer binds the gestures.

pub mod key_mode;
pub mod metrics;
pub mod mode_pie;
pub mod platform;
pub mod ranking;
pub mod scatter;

use serde::{Deserialize, Serialize};

use crate::dataset::WorkingSet;
use crate::model::{AudioFeature, Field, Track, column_title};
use crate::selection::{Interval, SelectionError, SelectionState, Slice, Style, parse_axis};

pub const PAGE_TITLE: &str = "Spotify Song Analysis Overview";

/// Colors used by the charts. Any CSS color name or hex string.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Palette {
    pub active: String,
    pub dimmed: String,
    pub spotify: String,
    pub apple: String,
    pub deezer: String,
    pub major: String,
    pub minor: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            active: "darkgreen".into(),
            dimmed: "lightgray".into(),
            spotify: "darkgreen".into(),
            apple: "crimson".into(),
            deezer: "MediumOrchid".into(),
            major: "darkgreen".into(),
            minor: "dimgray".into(),
        }
    }
}

impl Palette {
    pub fn for_style(&self, style: Style) -> &str {
        match style {
            Style::Active => &self.active,
            Style::Dimmed => &self.dimmed,
        }
    }
}

/// Rank range and scatter axes chosen through the page controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct View {
    pub slice: Slice,
    pub x: AudioFeature,
    pub y: AudioFeature,
}

impl View {
    /// Validate raw control values. Charts assume a validated view.
    pub fn parse(start: usize, end: usize, x: &str, y: &str) -> Result<Self, SelectionError> {
        Ok(Self {
            slice: Slice::new(start, end)?,
            x: parse_axis(x)?,
            y: parse_axis(y)?,
        })
    }
}

impl Default for View {
    fn default() -> Self {
        Self {
            slice: Slice::default(),
            x: AudioFeature::Energy,
            y: AudioFeature::Danceability,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    Ranking,
    Scatter,
    Metrics,
    Platform,
    KeyMode,
    ModePie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    Quantitative,
    Nominal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub field: String,
    pub kind: AxisKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Descending when true.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub descending: bool,
}

impl Axis {
    pub fn quantitative(field: &str, title: Option<String>) -> Self {
        Self {
            field: field.to_string(),
            kind: AxisKind::Quantitative,
            title,
            domain: None,
            format: None,
            descending: false,
        }
    }

    pub fn nominal(field: &str, title: Option<String>) -> Self {
        Self {
            kind: AxisKind::Nominal,
            ..Self::quantitative(field, title)
        }
    }
}

/// What a gesture on the chart does to the shared selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    /// Clicking a mark toggles its track name in the highlight set.
    ToggleHighlight,
    /// Dragging sets brush intervals on the two plotted fields.
    Brush {
        x: Field,
        y: Field,
        x_interval: Option<Interval>,
        y_interval: Option<Interval>,
    },
}

/// Title/value pairs shown on hover.
pub type Tooltip = Vec<(String, String)>;

/// The physical row a mark was drawn from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowRef {
    pub rank: usize,
    pub track: String,
    pub artists: String,
}

impl RowRef {
    pub fn of(t: &Track) -> Self {
        Self {
            rank: t.rank,
            track: t.name.clone(),
            artists: t.artists.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mark", content = "data", rename_all = "snake_case")]
pub enum Marks {
    Bar(Vec<ranking::Bar>),
    Point(Vec<scatter::Point>),
    Strip(Vec<metrics::MetricPoint>),
    StackedBar(Vec<platform::StackedBar>),
    Diverging(key_mode::KeyModePanels),
    Arc(Vec<mode_pie::ArcSlice>),
}

impl Marks {
    /// Rows drawn by a row-level chart. Aggregates return an empty list.
    pub fn rows(&self) -> Vec<(&RowRef, Style)> {
        match self {
            Self::Bar(v) => v.iter().map(|m| (&m.row, m.style)).collect(),
            Self::Point(v) => v.iter().map(|m| (&m.row, m.style)).collect(),
            Self::Strip(v) => v.iter().map(|m| (&m.row, m.style)).collect(),
            Self::StackedBar(v) => v.iter().map(|m| (&m.row, m.style)).collect(),
            Self::Diverging(_) | Self::Arc(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub id: ChartId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction: Option<Interaction>,
    #[serde(flatten)]
    pub marks: Marks,
}

/// Everything the page needs for one render cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: &'static str,
    pub generated: String,
    pub view: View,
    pub selection: SelectionState,
    /// Rows in the slice before brushing.
    pub slice_rows: usize,
    pub charts: Vec<Chart>,
    /// Chart ids, row by row.
    pub grid: Vec<Vec<ChartId>>,
}

impl Dashboard {
    pub fn chart(&self, id: ChartId) -> Option<&Chart> {
        self.charts.iter().find(|c| c.id == id)
    }
}

/// Recompute all six charts from scratch.
pub fn compose(ws: &WorkingSet, view: &View, sel: &SelectionState, palette: &Palette) -> Dashboard {
    let rows = ws.slice(view.slice.range());
    log::debug!(
        "Composing dashboard: ranks {}..{} ({} rows), {} highlighted, brush {}",
        view.slice.start(),
        view.slice.end(),
        rows.len(),
        sel.highlight.names().count(),
        if sel.brush.is_active() { "on" } else { "off" }
    );

    let charts = vec![
        ranking::build(rows, view, sel, palette),
        platform::build(rows, sel, palette),
        key_mode::build(rows, view, sel, palette),
        mode_pie::build(rows, sel, palette),
        scatter::build(rows, view, sel, palette),
        metrics::build(rows, sel, palette),
    ];

    Dashboard {
        title: PAGE_TITLE,
        generated: chrono::Local::now().to_rfc3339(),
        view: *view,
        selection: sel.clone(),
        slice_rows: rows.len(),
        charts,
        grid: vec![
            vec![ChartId::Ranking, ChartId::Platform],
            vec![ChartId::KeyMode, ChartId::ModePie],
            vec![ChartId::Scatter, ChartId::Metrics],
        ],
    }
}

/// Tooltip lines shared by every row-level chart.
pub(crate) fn base_tooltip(t: &Track) -> Tooltip {
    vec![
        (column_title("track_name"), t.name.clone()),
        (column_title("artist(s)_name"), t.artists.clone()),
    ]
}

pub(crate) fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dataset::{RawTable, prepare};
    use crate::dataset::prepare::tests::synthetic_csv;

    pub(crate) fn working_set(n: usize) -> WorkingSet {
        prepare(&RawTable::from_csv(&synthetic_csv(n)).unwrap(), &[]).unwrap()
    }

    fn all_rows(d: &Dashboard) -> Vec<(ChartId, usize, String, Style)> {
        d.charts
            .iter()
            .flat_map(|c| {
                c.marks
                    .rows()
                    .into_iter()
                    .map(move |(r, s)| (c.id, r.rank, r.track.clone(), s))
            })
            .collect()
    }

    #[test]
    fn test_compose_has_six_charts_in_grid() {
        let ws = working_set(100);
        let d = compose(&ws, &View::default(), &SelectionState::default(), &Palette::default());
        assert_eq!(d.charts.len(), 6);
        let in_grid: usize = d.grid.iter().map(|r| r.len()).sum();
        assert_eq!(in_grid, 6);
        for row in &d.grid {
            for id in row {
                assert!(d.chart(*id).is_some());
            }
        }
        assert_eq!(d.slice_rows, 25);
    }

    #[test]
    fn test_default_selection_everything_active() {
        let ws = working_set(100);
        let d = compose(&ws, &View::default(), &SelectionState::default(), &Palette::default());
        let rows = all_rows(&d);
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|(_, _, _, s)| *s == Style::Active));
    }

    #[test]
    fn test_highlight_applies_to_every_row_chart() {
        let ws = working_set(100);
        let mut sel = SelectionState::default();
        let target = ws.tracks()[3].name.clone();
        sel.highlight.toggle(&target);

        let d = compose(&ws, &View::default(), &sel, &Palette::default());
        for (id, _, name, style) in all_rows(&d) {
            let expect = if name == target { Style::Active } else { Style::Dimmed };
            assert_eq!(style, expect, "chart {id:?} row {name}");
        }

        // Every row-level chart shows the highlighted track as active.
        for id in [ChartId::Ranking, ChartId::Scatter, ChartId::Metrics, ChartId::Platform] {
            let c = d.chart(id).unwrap();
            assert!(c.marks.rows().iter().any(|(r, s)| r.track == target && *s == Style::Active));
        }
    }

    #[test]
    fn test_toggle_twice_restores_default_dashboard() {
        let ws = working_set(100);
        let view = View::default();
        let palette = Palette::default();
        let before = compose(&ws, &view, &SelectionState::default(), &palette);

        let mut sel = SelectionState::default();
        let name = ws.tracks()[0].name.clone();
        sel.highlight.toggle(&name);
        sel.highlight.toggle(&name);
        assert_eq!(sel, SelectionState::default());

        let after = compose(&ws, &view, &sel, &palette);
        assert_eq!(before.charts, after.charts);
    }

    #[test]
    fn test_brush_applies_to_every_chart() {
        let ws = working_set(100);
        let mut sel = SelectionState::default();
        sel.brush.set_parsed("energy_%", 20.0, 60.0).unwrap();

        let view = View::default();
        let d = compose(&ws, &view, &sel, &Palette::default());
        let by_rank = |rank: usize| &ws.tracks()[rank - 1];

        let rows = all_rows(&d);
        assert!(!rows.is_empty());
        for (id, rank, _, _) in &rows {
            let e = by_rank(*rank).energy;
            assert!((20.0..=60.0).contains(&e), "chart {id:?} rank {rank} energy {e}");
        }

        // Aggregates count exactly the brushed rows.
        let expected = sel.brushed(ws.slice(view.slice.range())).len();
        let Marks::Arc(slices) = &d.chart(ChartId::ModePie).unwrap().marks else {
            panic!("pie chart should use arc marks");
        };
        assert_eq!(slices.iter().map(|s| s.count).sum::<usize>(), expected);

        // Clearing restores the full slice.
        sel.brush.clear();
        let d = compose(&ws, &view, &sel, &Palette::default());
        let Marks::Bar(bars) = &d.chart(ChartId::Ranking).unwrap().marks else {
            panic!("ranking chart should use bar marks");
        };
        assert_eq!(bars.len(), 25);
    }

    #[test]
    fn test_dashboard_serializes() {
        let ws = working_set(40);
        let mut sel = SelectionState::default();
        sel.highlight.toggle("Song 1");
        sel.brush.set_parsed("streams", 0.0, 5000.0).unwrap();
        let d = compose(&ws, &View::default(), &sel, &Palette::default());
        let json = serde_json::to_value(&d).unwrap();

        assert_eq!(json["title"], PAGE_TITLE);
        assert_eq!(json["view"]["x"], "energy_%");
        assert_eq!(json["selection"]["highlight"][0], "Song 1");
        assert_eq!(json["selection"]["brush"]["streams"]["max"], 5000.0);
        assert_eq!(json["charts"][0]["id"], "ranking");
        assert_eq!(json["charts"][0]["mark"], "bar");
        assert_eq!(json["charts"][0]["interaction"]["type"], "toggle_highlight");
    }

    #[test]
    fn test_view_parse() {
        let v = View::parse(10, 40, "valence_%", "liveness_%").unwrap();
        assert_eq!(v.slice.span(), 30);
        assert_eq!(v.x, AudioFeature::Valence);
        assert_eq!(v.y, AudioFeature::Liveness);

        assert!(View::parse(40, 10, "valence_%", "liveness_%").is_err());
        assert!(View::parse(0, 25, "streams", "liveness_%").is_err());
        assert!(View::parse(0, 25, "valence_%", "key").is_err());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(60.0), "60");
        assert_eq!(format_value(12.5), "12.50");
    }
}
