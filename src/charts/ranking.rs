use serde::Serialize;

use super::{Axis, Chart, ChartId, Interaction, Marks, Palette, RowRef, Tooltip, View, base_tooltip};
use crate::model::{Track, column_title};
use crate::selection::{SelectionState, Style};

/// One bar per track, length = streams.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    #[serde(flatten)]
    pub row: RowRef,
    pub streams: u64,
    pub style: Style,
    pub color: String,
    pub tooltip: Tooltip,
}

/// Streaming ranking of the slice, most streamed first.
pub fn build(rows: &[Track], view: &View, sel: &SelectionState, palette: &Palette) -> Chart {
    let mut brushed = sel.brushed(rows);
    // Slices come in ranking order already; keep ties in rank order regardless.
    brushed.sort_by(|a, b| b.streams.cmp(&a.streams).then(a.rank.cmp(&b.rank)));

    let bars = brushed
        .into_iter()
        .map(|t| {
            let style = sel.style(t);
            let mut tooltip = base_tooltip(t);
            tooltip.push((column_title("streams"), t.streams.to_string()));
            tooltip.push((column_title("in_spotify_playlists"), t.spotify_playlists.to_string()));
            Bar {
                row: RowRef::of(t),
                streams: t.streams,
                style,
                color: palette.for_style(style).to_string(),
                tooltip,
            }
        })
        .collect();

    let mut y = Axis::nominal("track_name", None);
    y.descending = true;

    Chart {
        id: ChartId::Ranking,
        title: Some(format!("Top {} Songs Streaming Ranking", view.slice.end())),
        width: 500,
        height: 500,
        x: Some(Axis::quantitative("streams", None)),
        y: Some(y),
        interaction: Some(Interaction::ToggleHighlight),
        marks: Marks::Bar(bars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::tests::working_set;
    use crate::selection::Slice;

    fn bars(chart: &Chart) -> &[Bar] {
        match &chart.marks {
            Marks::Bar(b) => b,
            other => panic!("unexpected marks {other:?}"),
        }
    }

    #[test]
    fn test_slice_0_25_gives_25_ranked_bars() {
        let ws = working_set(100);
        let view = View::default();
        let chart = build(ws.slice(view.slice.range()), &view, &SelectionState::default(), &Palette::default());
        let bars = bars(&chart);

        assert_eq!(bars.len(), 25);
        assert!(bars.windows(2).all(|w| w[0].streams >= w[1].streams));
        let ranks: Vec<_> = bars.iter().map(|b| b.row.rank).collect();
        assert_eq!(ranks, (1..=25).collect::<Vec<_>>());
        assert_eq!(chart.title.as_deref(), Some("Top 25 Songs Streaming Ranking"));
    }

    #[test]
    fn test_offset_slice() {
        let ws = working_set(100);
        let view = View { slice: Slice::new(10, 40).unwrap(), ..View::default() };
        let chart = build(ws.slice(view.slice.range()), &view, &SelectionState::default(), &Palette::default());
        let bars = bars(&chart);
        assert_eq!(bars.len(), 30);
        assert_eq!(bars[0].row.rank, 11);
        assert_eq!(chart.title.as_deref(), Some("Top 40 Songs Streaming Ranking"));
    }

    #[test]
    fn test_highlight_colors() {
        let ws = working_set(30);
        let view = View::default();
        let mut sel = SelectionState::default();
        sel.highlight.toggle(&ws.tracks()[0].name);
        let chart = build(ws.slice(view.slice.range()), &view, &sel, &Palette::default());
        let bars = bars(&chart);
        assert_eq!(bars[0].color, "darkgreen");
        assert!(bars[1..].iter().all(|b| b.color == "lightgray" && b.style == Style::Dimmed));
    }

    #[test]
    fn test_tooltip_titles() {
        let ws = working_set(5);
        let view = View::default();
        let chart = build(ws.tracks(), &view, &SelectionState::default(), &Palette::default());
        let titles: Vec<_> = bars(&chart)[0].tooltip.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(titles, vec!["Track Name", "Artist(s) Name", "Streams", "In Spotify Playlists"]);
    }
}
