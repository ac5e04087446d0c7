use serde::Serialize;

use super::{Axis, Chart, ChartId, Interaction, Marks, Palette, RowRef, Tooltip, View, base_tooltip, format_value};
use crate::model::{Field, Track, column_title};
use crate::selection::{SelectionState, Style};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    #[serde(flatten)]
    pub row: RowRef,
    pub x: f64,
    pub y: f64,
    pub style: Style,
    pub color: String,
    pub tooltip: Tooltip,
}

/// Two chosen audio features against each other. Hosts the range brush.
pub fn build(rows: &[Track], view: &View, sel: &SelectionState, palette: &Palette) -> Chart {
    let x_field = Field::Feature(view.x);
    let y_field = Field::Feature(view.y);

    let points = sel
        .brushed(rows)
        .into_iter()
        .map(|t| {
            let style = sel.style(t);
            let (x, y) = (t.feature(view.x), t.feature(view.y));
            let mut tooltip = base_tooltip(t);
            tooltip.push((x_field.title(), format_value(x)));
            tooltip.push((y_field.title(), format_value(y)));
            tooltip.push((column_title("streams"), t.streams.to_string()));
            Point {
                row: RowRef::of(t),
                x,
                y,
                style,
                color: palette.for_style(style).to_string(),
                tooltip,
            }
        })
        .collect();

    Chart {
        id: ChartId::Scatter,
        title: Some("Song Analysis".into()),
        width: 500,
        height: 500,
        x: Some(Axis::quantitative(view.x.column(), Some(x_field.title()))),
        y: Some(Axis::quantitative(view.y.column(), Some(y_field.title()))),
        interaction: Some(Interaction::Brush {
            x: x_field,
            y: y_field,
            x_interval: sel.brush.interval(x_field),
            y_interval: sel.brush.interval(y_field),
        }),
        marks: Marks::Point(points),
    }
}
