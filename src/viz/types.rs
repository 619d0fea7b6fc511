//! Public types and constants for the charting engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chart families supported by [`render_chart`](super::render_chart).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    /// Multi-series line chart over time (default).
    Line,
    /// Stacked area chart over time.
    Area,
    /// Dot plot: one row per category, one dot per observation.
    Scatter,
    /// Horizontal grouped bars with collapsed/expanded roll-ups.
    GroupedBars,
    /// Horizontal stacked bars of components per category.
    StackedBars,
    /// Value distribution with annotations and a median line.
    Histogram,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChartKind::Line => "line",
            ChartKind::Area => "area",
            ChartKind::Scatter => "scatter",
            ChartKind::GroupedBars => "grouped-bars",
            ChartKind::StackedBars => "stacked-bars",
            ChartKind::Histogram => "histogram",
        };
        f.write_str(s)
    }
}

/// Bar roll-up mode for buckets with more than one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollupMode {
    /// One aggregate bar per bucket, annotated with the member count.
    #[default]
    Collapsed,
    /// One summary bar followed by one bar per member.
    Expanded,
}

/// What the members of an aggregate bucket are; picks the noun in generated labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[default]
    Municipalities,
    Operators,
}

impl EntityKind {
    /// Label id used for the plural noun; resolved through the label catalog.
    pub fn plural_label_id(self) -> &'static str {
        match self {
            EntityKind::Municipalities => "municipalities",
            EntityKind::Operators => "operators",
        }
    }
}

/// Horizontal tooltip placement relative to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementX {
    Left,
    Center,
    Right,
}

/// Vertical tooltip placement relative to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementY {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub x: PlacementX,
    pub y: PlacementY,
}

impl Placement {
    pub const ALL_X: [PlacementX; 3] = [PlacementX::Left, PlacementX::Center, PlacementX::Right];
    pub const ALL_Y: [PlacementY; 3] = [PlacementY::Top, PlacementY::Middle, PlacementY::Bottom];

    pub fn new(x: PlacementX, y: PlacementY) -> Self {
        Self { x, y }
    }
}

/// Whether a tooltip shows one value or all values at the hovered x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipMode {
    #[default]
    Single,
    Multiple,
}

/// Band ordering for categorical axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Default aspect ratio (height / width) for the plotting area.
pub const DEFAULT_ASPECT_RATIO: f64 = 0.4;
