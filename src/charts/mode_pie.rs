use serde::Serialize;

use super::{Chart, ChartId, Marks, Palette, Tooltip};
use crate::model::{Mode, Track, column_title};
use crate::selection::SelectionState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArcSlice {
    pub mode: Mode,
    pub count: usize,
    /// Share of the pie, 0.0 when nothing is counted.
    pub fraction: f64,
    pub color: String,
    pub tooltip: Tooltip,
}

/// Major vs. Minor among the brushed, active rows. Both modes are always
/// present so the legend stays stable.
pub fn build(rows: &[Track], sel: &SelectionState, palette: &Palette) -> Chart {
    let counted = sel.counted(rows);
    let total = counted.len();

    let slices = [Mode::Major, Mode::Minor]
        .into_iter()
        .map(|mode| {
            let count = counted.iter().filter(|t| t.mode == mode).count();
            let fraction = if total > 0 { count as f64 / total as f64 } else { 0.0 };
            let color = match mode {
                Mode::Major => palette.major.clone(),
                Mode::Minor => palette.minor.clone(),
            };
            ArcSlice {
                mode,
                count,
                fraction,
                color,
                tooltip: vec![
                    (column_title("mode"), mode.label().to_string()),
                    ("Count of Mode".into(), count.to_string()),
                ],
            }
        })
        .collect();

    Chart {
        id: ChartId::ModePie,
        title: Some("Mode Distribution".into()),
        width: 400,
        height: 400,
        x: None,
        y: None,
        interaction: None,
        marks: Marks::Arc(slices),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::tests::track;

    fn arcs(chart: &Chart) -> &[ArcSlice] {
        match &chart.marks {
            Marks::Arc(a) => a,
            other => panic!("unexpected marks {other:?}"),
        }
    }

    #[test]
    fn test_fractions() {
        // helper: odd ranks Major, even ranks Minor
        let tracks: Vec<_> = (1..=4).map(|r| track(r, &format!("T{r}"), 100 - r as u64, 50.0)).collect();
        let chart = build(&tracks, &SelectionState::default(), &Palette::default());
        let a = arcs(&chart);
        assert_eq!(a[0].mode, Mode::Major);
        assert_eq!((a[0].count, a[1].count), (2, 2));
        assert_eq!((a[0].fraction, a[1].fraction), (0.5, 0.5));
        assert_eq!(a[1].color, "dimgray");
    }

    #[test]
    fn test_highlight_and_brush_restrict() {
        let tracks: Vec<_> = (1..=4).map(|r| track(r, &format!("T{r}"), 100 - r as u64, r as f64 * 10.0)).collect();
        let mut sel = SelectionState::default();
        sel.highlight.toggle("T1");
        sel.highlight.toggle("T2");
        sel.highlight.toggle("T3");
        sel.brush.set_parsed("energy_%", 15.0, 100.0).unwrap();

        let chart = build(&tracks, &sel, &Palette::default());
        let a = arcs(&chart);
        // T2 (Minor) and T3 (Major) survive
        assert_eq!((a[0].count, a[1].count), (1, 1));
    }

    #[test]
    fn test_nothing_counted() {
        let chart = build(&[], &SelectionState::default(), &Palette::default());
        assert!(arcs(&chart).iter().all(|a| a.count == 0 && a.fraction == 0.0));
    }
}
