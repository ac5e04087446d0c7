use serde::Serialize;

use super::{Axis, Chart, ChartId, Marks, Palette, RowRef, Tooltip, base_tooltip, format_value};
use crate::model::{AudioFeature, Track, column_title};
use crate::selection::{SelectionState, Style};

/// One (metric, value) pair of one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    #[serde(flatten)]
    pub row: RowRef,
    pub metric: AudioFeature,
    pub value: f64,
    pub style: Style,
    pub color: String,
    pub tooltip: Tooltip,
}

/// Dot strip of all six audio features: every track is unpivoted into
/// six points, one per metric row.
pub fn build(rows: &[Track], sel: &SelectionState, palette: &Palette) -> Chart {
    let brushed = sel.brushed(rows);
    let mut points = Vec::with_capacity(brushed.len() * AudioFeature::ALL.len());

    for t in brushed {
        let style = sel.style(t);
        for metric in AudioFeature::ALL {
            let value = t.feature(metric);
            let mut tooltip = base_tooltip(t);
            tooltip.push((column_title("Metric"), format_value(value)));
            tooltip.push((column_title("streams"), t.streams.to_string()));
            points.push(MetricPoint {
                row: RowRef::of(t),
                metric,
                value,
                style,
                color: palette.for_style(style).to_string(),
                tooltip,
            });
        }
    }

    Chart {
        id: ChartId::Metrics,
        title: None,
        width: 500,
        height: 250,
        x: Some(Axis::quantitative("Value", Some("Value".into()))),
        y: Some(Axis::nominal("Metric", None)),
        interaction: None,
        marks: Marks::Strip(points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::tests::working_set;

    #[test]
    fn test_six_points_per_track() {
        let ws = working_set(12);
        let chart = build(ws.tracks(), &SelectionState::default(), &Palette::default());
        let Marks::Strip(points) = &chart.marks else { panic!("expected strip") };
        assert_eq!(points.len(), 12 * 6);

        let first = &ws.tracks()[0];
        let mine: Vec<_> = points.iter().filter(|p| p.row.rank == first.rank).collect();
        assert_eq!(mine.len(), 6);
        for p in mine {
            assert_eq!(p.value, first.feature(p.metric));
        }
    }

    #[test]
    fn test_dimmed_rows_keep_all_metrics() {
        let ws = working_set(5);
        let mut sel = SelectionState::default();
        sel.highlight.toggle(&ws.tracks()[2].name);
        let chart = build(ws.tracks(), &sel, &Palette::default());
        let Marks::Strip(points) = &chart.marks else { panic!("expected strip") };
        assert_eq!(points.iter().filter(|p| p.style == Style::Active).count(), 6);
        assert_eq!(points.iter().filter(|p| p.style == Style::Dimmed).count(), 24);
    }
}
