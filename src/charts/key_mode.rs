use std::collections::BTreeMap;

use serde::Serialize;

use super::{Axis, Chart, ChartId, Marks, Palette, View};
use crate::model::{Key, Mode, Track};
use crate::selection::SelectionState;

/// Track counts for one key, split by mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyCount {
    pub key: Key,
    pub minor: usize,
    pub major: usize,
}

/// Two mirrored bar panels (Minor left, Major right) around a key label column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyModePanels {
    pub minor_title: String,
    pub major_title: String,
    pub panel_width: u32,
    pub label_width: u32,
    /// Shared count axis of both panels: `[0, span / 6]`.
    pub domain: [f64; 2],
    pub minor_color: String,
    pub major_color: String,
    pub rows: Vec<KeyCount>,
}

/// Count the brushed, active rows per key and mode.
///
/// The count axis is sized from the requested rank span, not from the
/// counts, so bar lengths compare across slice sizes. Only keys that occur
/// get a row; rows follow chromatic order.
pub fn build(rows: &[Track], view: &View, sel: &SelectionState, palette: &Palette) -> Chart {
    let mut counts: BTreeMap<Key, (usize, usize)> = BTreeMap::new();
    for t in sel.counted(rows) {
        let entry = counts.entry(t.key).or_default();
        match t.mode {
            Mode::Minor => entry.0 += 1,
            Mode::Major => entry.1 += 1,
        }
    }

    let max_dim = view.slice.span() as f64 / 6.0;
    let panels = KeyModePanels {
        minor_title: Mode::Minor.label().into(),
        major_title: Mode::Major.label().into(),
        panel_width: 300,
        label_width: 40,
        domain: [0.0, max_dim],
        minor_color: palette.minor.clone(),
        major_color: palette.major.clone(),
        rows: counts
            .into_iter()
            .map(|(key, (minor, major))| KeyCount { key, minor, major })
            .collect(),
    };

    let mut x = Axis::quantitative("count(key)", Some("Nb of songs".into()));
    x.domain = Some(panels.domain);

    Chart {
        id: ChartId::KeyMode,
        title: None,
        width: 300 * 2 + 40,
        height: 300,
        x: Some(x),
        y: Some(Axis::nominal("key", None)),
        interaction: None,
        marks: Marks::Diverging(panels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::tests::working_set;
    use crate::selection::Slice;
    use crate::selection::tests::track;

    fn panels(chart: &Chart) -> &KeyModePanels {
        match &chart.marks {
            Marks::Diverging(p) => p,
            other => panic!("unexpected marks {other:?}"),
        }
    }

    #[test]
    fn test_domain_scales_with_slice() {
        let ws = working_set(100);
        let view = View::default();
        let chart = build(ws.slice(view.slice.range()), &view, &SelectionState::default(), &Palette::default());
        let d = panels(&chart).domain;
        assert_eq!(d[0], 0.0);
        assert!((d[1] - 25.0 / 6.0).abs() < 1e-9);
        assert!((d[1] - 4.17).abs() < 0.01);

        let view = View { slice: Slice::new(0, 60).unwrap(), ..View::default() };
        let chart = build(ws.slice(view.slice.range()), &view, &SelectionState::default(), &Palette::default());
        assert!((panels(&chart).domain[1] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_counts_split_by_mode() {
        let mut tracks = vec![
            track(1, "A", 50, 50.0),
            track(2, "B", 40, 50.0),
            track(3, "C", 30, 50.0),
            track(4, "D", 20, 50.0),
        ];
        tracks[3].key = Key::A;
        // ranks 1,3 Major; 2,4 Minor (see helper)
        let chart = build(&tracks, &View::default(), &SelectionState::default(), &Palette::default());
        let rows = &panels(&chart).rows;
        assert_eq!(
            rows,
            &vec![
                KeyCount { key: Key::CSharp, minor: 1, major: 2 },
                KeyCount { key: Key::A, minor: 1, major: 0 },
            ]
        );
    }

    #[test]
    fn test_highlight_restricts_counts() {
        let tracks = vec![track(1, "A", 50, 50.0), track(2, "B", 40, 50.0)];
        let mut sel = SelectionState::default();
        sel.highlight.toggle("B");
        let chart = build(&tracks, &View::default(), &sel, &Palette::default());
        assert_eq!(
            panels(&chart).rows,
            vec![KeyCount { key: Key::CSharp, minor: 1, major: 0 }]
        );
    }

    #[test]
    fn test_empty_slice() {
        let view = View { slice: Slice::new(0, 0).unwrap(), ..View::default() };
        let chart = build(&[], &view, &SelectionState::default(), &Palette::default());
        assert!(panels(&chart).rows.is_empty());
        assert_eq!(panels(&chart).domain, [0.0, 0.0]);
    }
}
