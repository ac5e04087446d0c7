use serde::Serialize;

use super::{Axis, Chart, ChartId, Interaction, Marks, Palette, RowRef, Tooltip, base_tooltip};
use crate::model::{Platform, Track, column_title};
use crate::selection::{SelectionState, Style};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub platform: Platform,
    pub count: u64,
    /// Fraction of the bar, 0.0..=1.0.
    pub share: f64,
    pub color: String,
}

/// One normalized bar per track, split by playlist counts per platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedBar {
    #[serde(flatten)]
    pub row: RowRef,
    pub total: u64,
    pub segments: Vec<Segment>,
    pub style: Style,
    pub tooltip: Tooltip,
}

impl Palette {
    fn for_platform(&self, platform: Platform) -> &str {
        match platform {
            Platform::Spotify => &self.spotify,
            Platform::Apple => &self.apple,
            Platform::Deezer => &self.deezer,
        }
    }
}

pub fn build(rows: &[Track], sel: &SelectionState, palette: &Palette) -> Chart {
    let mut brushed = sel.brushed(rows);
    brushed.sort_by(|a, b| b.streams.cmp(&a.streams).then(a.rank.cmp(&b.rank)));

    let bars = brushed
        .into_iter()
        .map(|t| {
            let style = sel.style(t);
            let total: u64 = Platform::ALL.iter().map(|p| t.playlists(*p)).sum();
            let segments = Platform::ALL
                .into_iter()
                .map(|p| {
                    let count = t.playlists(p);
                    let share = if total > 0 { count as f64 / total as f64 } else { 0.0 };
                    let color = match style {
                        Style::Active => palette.for_platform(p),
                        Style::Dimmed => palette.dimmed.as_str(),
                    };
                    Segment { platform: p, count, share, color: color.to_string() }
                })
                .collect();

            let mut tooltip = base_tooltip(t);
            for p in Platform::ALL {
                tooltip.push((column_title(p.column()), t.playlists(p).to_string()));
            }

            StackedBar {
                row: RowRef::of(t),
                total,
                segments,
                style,
                tooltip,
            }
        })
        .collect();

    let mut x = Axis::quantitative("sum(Value)", None);
    x.domain = Some([0.0, 1.0]);
    x.format = Some("%".into());
    let mut y = Axis::nominal("track_name", Some("Track Names".into()));
    y.descending = true;

    Chart {
        id: ChartId::Platform,
        title: Some("Importance of platforms for songs".into()),
        width: 500,
        height: 500,
        x: Some(x),
        y: Some(y),
        interaction: Some(Interaction::ToggleHighlight),
        marks: Marks::StackedBar(bars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::tests::track;

    fn stacked(chart: &Chart) -> &[StackedBar] {
        match &chart.marks {
            Marks::StackedBar(b) => b,
            other => panic!("unexpected marks {other:?}"),
        }
    }

    #[test]
    fn test_shares_sum_to_one() {
        let mut t = track(1, "Flowers", 100, 50.0);
        t.spotify_playlists = 600;
        t.apple_playlists = 300;
        t.deezer_playlists = 100;
        let chart = build(&[t], &SelectionState::default(), &Palette::default());
        let bar = &stacked(&chart)[0];

        assert_eq!(bar.total, 1000);
        let shares: Vec<_> = bar.segments.iter().map(|s| s.share).collect();
        assert_eq!(shares, vec![0.6, 0.3, 0.1]);
        let colors: Vec<_> = bar.segments.iter().map(|s| s.color.as_str()).collect();
        assert_eq!(colors, vec!["darkgreen", "crimson", "MediumOrchid"]);
    }

    #[test]
    fn test_zero_playlists_zero_shares() {
        let mut t = track(1, "Nowhere", 100, 50.0);
        t.spotify_playlists = 0;
        t.apple_playlists = 0;
        t.deezer_playlists = 0;
        let chart = build(&[t], &SelectionState::default(), &Palette::default());
        assert!(stacked(&chart)[0].segments.iter().all(|s| s.share == 0.0));
    }

    #[test]
    fn test_dimmed_segments_are_gray() {
        let tracks = vec![track(1, "A", 30, 50.0), track(2, "B", 20, 50.0)];
        let mut sel = SelectionState::default();
        sel.highlight.toggle("A");
        let chart = build(&tracks, &sel, &Palette::default());
        let bars = stacked(&chart);
        assert_eq!(bars[0].style, Style::Active);
        assert!(bars[1].segments.iter().all(|s| s.color == "lightgray"));
    }
}
