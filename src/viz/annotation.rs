//! Tooltip placement, pointer geometry and content descriptors.

use super::types::{Placement, PlacementX, PlacementY};
use super::util::format_number;
use crate::models::Observation;
use serde::Serialize;

/// Anchors left of this fraction of the plot width get a tooltip on their right.
pub const LEFT_EDGE_FRACTION: f64 = 0.2;
/// Anchors right of this fraction of the plot width get a tooltip on their left.
pub const RIGHT_EDGE_FRACTION: f64 = 0.8;
/// Size of the pointer triangle in px.
pub const TRIANGLE_SIZE: f64 = 8.0;
/// How far the box reaches past the anchor on the pointer side for left/right tops and bottoms.
pub const CORNER_INSET: f64 = 16.0;

/// Horizontal placement from the anchor's position within the plot.
pub fn placement_x(anchor_x: f64, chart_width: f64) -> PlacementX {
    if !(chart_width > 0.0) || !anchor_x.is_finite() {
        return PlacementX::Center;
    }
    if anchor_x < chart_width * LEFT_EDGE_FRACTION {
        PlacementX::Right
    } else if anchor_x > chart_width * RIGHT_EDGE_FRACTION {
        PlacementX::Left
    } else {
        PlacementX::Center
    }
}

pub fn placement(anchor_x: f64, chart_width: f64, y: PlacementY) -> Placement {
    Placement::new(placement_x(anchor_x, chart_width), y)
}

/// Where a tooltip box sits relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipGeometry {
    /// Box translation as a fraction of its own `(width, height)`.
    pub translate: (f64, f64),
    /// Additional pixel offset of the box.
    pub offset: (f64, f64),
    /// Pointer triangle vertices relative to the anchor; the first vertex is the tip.
    pub triangle: [(f64, f64); 3],
}

impl TooltipGeometry {
    /// Top-left corner of a `(width, height)` box anchored at `anchor`.
    pub fn box_origin(&self, anchor: (f64, f64), size: (f64, f64)) -> (f64, f64) {
        (
            anchor.0 + self.translate.0 * size.0 + self.offset.0,
            anchor.1 + self.translate.1 * size.1 + self.offset.1,
        )
    }
}

const T: f64 = TRIANGLE_SIZE;

const ABOVE: [(f64, f64); 3] = [(0.0, 0.0), (-T, -T), (T, -T)];
const BELOW: [(f64, f64); 3] = [(0.0, 0.0), (T, T), (-T, T)];

/// Box and pointer geometry for a placement. Total: `center × middle` (which would cover
/// the anchor) uses the `center × top` geometry.
pub fn tooltip_geometry(p: Placement) -> TooltipGeometry {
    use PlacementX::*;
    use PlacementY::*;
    match (p.x, p.y) {
        (Left, Top) => TooltipGeometry {
            translate: (-1.0, -1.0),
            offset: (CORNER_INSET, -T),
            triangle: ABOVE,
        },
        (Center, Top) => TooltipGeometry {
            translate: (-0.5, -1.0),
            offset: (0.0, -T),
            triangle: ABOVE,
        },
        (Right, Top) => TooltipGeometry {
            translate: (0.0, -1.0),
            offset: (-CORNER_INSET, -T),
            triangle: ABOVE,
        },
        (Left, Middle) => TooltipGeometry {
            translate: (-1.0, -0.5),
            offset: (-T, 0.0),
            triangle: [(0.0, 0.0), (-T, T), (-T, -T)],
        },
        (Right, Middle) => TooltipGeometry {
            translate: (0.0, -0.5),
            offset: (T, 0.0),
            triangle: [(0.0, 0.0), (T, -T), (T, T)],
        },
        (Left, Bottom) => TooltipGeometry {
            translate: (-1.0, 0.0),
            offset: (CORNER_INSET, T),
            triangle: BELOW,
        },
        (Center, Bottom) => TooltipGeometry {
            translate: (-0.5, 0.0),
            offset: (0.0, T),
            triangle: BELOW,
        },
        (Right, Bottom) => TooltipGeometry {
            translate: (0.0, 0.0),
            offset: (-CORNER_INSET, T),
            triangle: BELOW,
        },
        _ => tooltip_geometry(Placement::new(Center, Top)),
    }
}

/// One labeled value in a tooltip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipValue {
    pub label: String,
    pub value: Option<f64>,
    /// Locale formatted value with unit, `–` when undefined.
    pub formatted: String,
    pub color: String,
}

impl TooltipValue {
    pub fn new(
        label: impl Into<String>,
        value: Option<f64>,
        color: impl Into<String>,
        format: &ValueFormat,
    ) -> Self {
        Self {
            label: label.into(),
            value,
            formatted: format.apply(value),
            color: color.into(),
        }
    }
}

/// How tooltip values are printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFormat {
    pub decimals: usize,
    pub unit: Option<String>,
    pub locale: String,
}

impl Default for ValueFormat {
    fn default() -> Self {
        Self {
            decimals: 2,
            unit: None,
            locale: "de".into(),
        }
    }
}

impl ValueFormat {
    pub fn apply(&self, value: Option<f64>) -> String {
        let n = format_number(value.unwrap_or(f64::NAN), self.decimals, &self.locale);
        match (&self.unit, value) {
            (Some(u), Some(_)) => format!("{n} {u}"),
            _ => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "values", rename_all = "lowercase")]
pub enum TooltipContent {
    Single(TooltipValue),
    /// Sorted by value, highest first.
    Multiple(Vec<TooltipValue>),
}

impl TooltipContent {
    /// Multiple-values content, sorted descending. Undefined values go last.
    pub fn multiple(mut values: Vec<TooltipValue>) -> Self {
        values.sort_by(|a, b| match (a.value, b.value) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        TooltipContent::Multiple(values)
    }

    pub fn values(&self) -> &[TooltipValue] {
        match self {
            TooltipContent::Single(v) => std::slice::from_ref(v),
            TooltipContent::Multiple(vs) => vs,
        }
    }
}

/// Everything an overlay needs to draw one tooltip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipDescriptor {
    /// Anchor in plot coordinates.
    pub x_anchor: f64,
    pub y_anchor: f64,
    pub placement: Placement,
    pub geometry: TooltipGeometry,
    /// Formatted x value (year, category) shown as the tooltip title.
    pub x_value: String,
    pub content: TooltipContent,
    pub datum: Observation,
}

impl TooltipDescriptor {
    pub fn new(
        anchor: (f64, f64),
        chart_width: f64,
        y: PlacementY,
        x_value: impl Into<String>,
        content: TooltipContent,
        datum: Observation,
    ) -> Self {
        let placement = placement(anchor.0, chart_width, y);
        Self {
            x_anchor: anchor.0,
            y_anchor: anchor.1,
            placement,
            geometry: tooltip_geometry(placement),
            x_value: x_value.into(),
            content,
            datum,
        }
    }
}

/// Mean of the finite anchors; multi-value tooltips sit at the average series height.
pub fn mean_anchor(ys: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = ys
        .into_iter()
        .filter(|y| y.is_finite())
        .fold((0.0, 0usize), |(s, n), y| (s + y, n + 1));
    (n > 0).then(|| sum / n as f64)
}
