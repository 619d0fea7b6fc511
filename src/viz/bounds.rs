//! Chart layout: margins and plotting-area size from the observed container width.
//!
//! Invariants: `chart_width = width - margins.left - margins.right`, clamped at 0, and
//! every dimension is finite and non-negative, including before the container has been
//! measured (width 0).

use super::text::{FontOptions, widest_label_px};
use serde::Serialize;

/// Space between the widest category label and the plot.
pub const CATEGORY_LABEL_OFFSET_PX: u32 = 20;
/// Left margin for charts whose vertical axis is purely numeric.
pub const NUMERIC_LEFT_MARGIN_PX: u32 = 50;
pub const DEFAULT_TOP_MARGIN_PX: u32 = 10;
pub const DEFAULT_RIGHT_MARGIN_PX: u32 = 40;
pub const DEFAULT_BOTTOM_MARGIN_PX: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Margins {
    pub fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Defaults for a chart with a numeric vertical axis.
    pub fn numeric() -> Self {
        Self::new(
            DEFAULT_TOP_MARGIN_PX,
            DEFAULT_RIGHT_MARGIN_PX,
            DEFAULT_BOTTOM_MARGIN_PX,
            NUMERIC_LEFT_MARGIN_PX,
        )
    }

    /// Defaults for a chart with category labels on the vertical axis.
    pub fn categorical<'a>(labels: impl IntoIterator<Item = &'a str>, font: FontOptions) -> Self {
        Self {
            left: categorical_left_margin(labels, font),
            ..Self::numeric()
        }
    }

    pub fn with_top(mut self, top: u32) -> Self {
        self.top = top;
        self
    }

    pub fn horizontal(&self) -> u32 {
        self.left.saturating_add(self.right)
    }

    pub fn vertical(&self) -> u32 {
        self.top.saturating_add(self.bottom)
    }
}

/// Left margin that fits the widest category label (long operator names are never clipped).
pub fn categorical_left_margin<'a>(
    labels: impl IntoIterator<Item = &'a str>,
    font: FontOptions,
) -> u32 {
    widest_label_px(labels, font).saturating_add(CATEGORY_LABEL_OFFSET_PX)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    pub chart_width: f64,
    pub chart_height: f64,
    pub aspect_ratio: f64,
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Bounds for `container_width` with `chart_height = chart_width * aspect_ratio`.
pub fn compute_bounds(container_width: f64, aspect_ratio: f64, margins: Margins) -> Bounds {
    let width = sanitize(container_width);
    let ratio = sanitize(aspect_ratio);
    let chart_width = (width - margins.horizontal() as f64).max(0.0);
    let chart_height = chart_width * ratio;
    let bounds = Bounds {
        width,
        height: chart_height + margins.vertical() as f64,
        margins,
        chart_width,
        chart_height,
        aspect_ratio: ratio,
    };
    log::debug!("bounds: {bounds:?}");
    bounds
}

/// Bounds whose plot height is driven by the number of bands instead of the aspect ratio.
pub fn compute_band_bounds(
    container_width: f64,
    band_count: usize,
    band_height: f64,
    margins: Margins,
) -> Bounds {
    let width = sanitize(container_width);
    let chart_width = (width - margins.horizontal() as f64).max(0.0);
    let chart_height = band_count as f64 * sanitize(band_height);
    Bounds {
        width,
        height: chart_height + margins.vertical() as f64,
        margins,
        chart_width,
        chart_height,
        aspect_ratio: if chart_width > 0.0 {
            chart_height / chart_width
        } else {
            0.0
        },
    }
}

impl Bounds {
    /// Pixel x of the plot's left edge in container coordinates.
    pub fn plot_left(&self) -> f64 {
        self.margins.left as f64
    }

    pub fn plot_top(&self) -> f64 {
        self.margins.top as f64
    }

    /// Translate a container-relative point into plot-relative coordinates.
    pub fn to_plot(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.plot_left(), y - self.plot_top())
    }
}
