//! Axis construction: tick counts from available space, whole-number axis domains,
//! and the headroom tick that keeps marks off the plot's far edge.

use super::scales::{LinearScale, ticks, tick_step};
use super::text::{FontOptions, estimate_text_width};
use super::util::format_number;
use serde::Serialize;

/// Horizontal space kept free between two tick labels.
pub const TICK_LABEL_GAP_PX: f64 = 20.0;

/// Which dimension an axis spans; each has its own tick-count clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    /// Vertical value axis (line/area/histogram counts).
    Height,
    /// Horizontal value axis (currency values of bars, dots, histograms).
    Width,
}

impl AxisKind {
    /// Inclusive `(min, max)` tick counts.
    pub fn tick_bounds(self) -> (usize, usize) {
        match self {
            AxisKind::Height => (2, 4),
            AxisKind::Width => (2, 10),
        }
    }
}

/// How many ticks fit into `available_px` when each needs `label_px`, clamped per axis kind.
pub fn tick_count(available_px: f64, label_px: f64, kind: AxisKind) -> usize {
    let (lo, hi) = kind.tick_bounds();
    if !(available_px > 0.0) || !(label_px > 0.0) {
        return lo;
    }
    ((available_px / label_px).floor() as usize).clamp(lo, hi)
}

/// Tick count for a horizontal value axis, sized for the widest expected label.
pub fn width_tick_count(
    chart_width: f64,
    max_value: f64,
    decimals: usize,
    locale: &str,
    font: FontOptions,
) -> usize {
    let sample = format_number(max_value, decimals, locale);
    let label_px = estimate_text_width(&sample, font) as f64 + TICK_LABEL_GAP_PX;
    tick_count(chart_width, label_px, AxisKind::Width)
}

/// Tick count for a vertical axis: one label line plus generous spacing per tick.
pub fn height_tick_count(chart_height: f64, font: FontOptions) -> usize {
    tick_count(chart_height, font.size_px as f64 * 4.0, AxisKind::Height)
}

/// Domain for an axis scale: extent (degenerate extents widened by one unit each way),
/// niced, then floored/ceiled to whole numbers so tick labels are never fractional.
pub fn axis_domain(extent: (f64, f64), count: usize) -> [f64; 2] {
    let (mut lo, mut hi) = extent;
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 1.0;
        hi += 1.0;
    }
    let niced = LinearScale::new([lo, hi], [0.0, 1.0]).nice(count);
    [niced.domain[0].floor(), niced.domain[1].ceil()]
}

/// Ticks for `domain`, plus one extra tick past the end when the round-numbered set stops
/// short of the domain maximum. The extra tick sits one tick gap (distance between the last
/// two ticks) past the last tick. Returns the ticks and the domain stretched to the top tick.
pub fn ticks_with_headroom(domain: [f64; 2], count: usize) -> (Vec<f64>, [f64; 2]) {
    let [d0, d1] = domain;
    let mut values = ticks(d0, d1, count);
    if values.is_empty() {
        return (values, domain);
    }
    let fallback_gap = tick_step(d0, d1, count).abs();
    // Bounded: each pass adds one gap and the gap is at least the tick step.
    for _ in 0..4 {
        let n = values.len();
        let last = values[n - 1];
        if last >= d1 {
            break;
        }
        let gap = if n >= 2 {
            values[n - 1] - values[n - 2]
        } else {
            fallback_gap
        };
        if !(gap > 0.0) {
            break;
        }
        values.push(last + gap);
    }
    let top = values.last().copied().unwrap_or(d1).max(d1);
    (values, [d0, top])
}

/// A value axis ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericAxis {
    pub kind: AxisKind,
    pub scale: LinearScale,
    pub ticks: Vec<f64>,
}

impl NumericAxis {
    /// Build an axis over `extent` mapped onto `range` with roughly `count` ticks.
    pub fn new(kind: AxisKind, extent: (f64, f64), range: [f64; 2], count: usize) -> Self {
        let domain = axis_domain(extent, count);
        let (ticks, domain) = ticks_with_headroom(domain, count);
        log::debug!("{kind:?} axis: domain {domain:?}, ticks {ticks:?}");
        Self {
            kind,
            scale: LinearScale::new(domain, range),
            ticks,
        }
    }

    pub fn max_tick(&self) -> Option<f64> {
        self.ticks.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_counts_are_clamped() {
        assert_eq!(tick_count(1000.0, 50.0, AxisKind::Height), 4);
        assert_eq!(tick_count(1000.0, 50.0, AxisKind::Width), 10);
        assert_eq!(tick_count(60.0, 50.0, AxisKind::Width), 2);
        assert_eq!(tick_count(0.0, 50.0, AxisKind::Width), 2);
        assert_eq!(tick_count(300.0, 50.0, AxisKind::Width), 6);
    }

    #[test]
    fn axis_domain_is_whole_numbered() {
        let d = axis_domain((0.13, 0.87), 5);
        assert_eq!(d, [0.0, 1.0]);
        let d = axis_domain((12.3, 27.9), 4);
        assert_eq!(d[0].fract(), 0.0);
        assert_eq!(d[1].fract(), 0.0);
        assert!(d[0] <= 12.3 && d[1] >= 27.9);
    }

    #[test]
    fn headroom_tick_is_appended() {
        // ticks(0, 11, 2) -> [0, 5, 10]; 10 < 11 so 15 is added.
        let (t, d) = ticks_with_headroom([0.0, 11.0], 2);
        assert_eq!(t, vec![0.0, 5.0, 10.0, 15.0]);
        assert_eq!(d, [0.0, 15.0]);
    }

    #[test]
    fn no_headroom_when_ticks_reach_max() {
        let (t, d) = ticks_with_headroom([0.0, 10.0], 5);
        assert_eq!(t.last(), Some(&10.0));
        assert_eq!(d, [0.0, 10.0]);
    }

    #[test]
    fn degenerate_extent_is_widened() {
        let axis = NumericAxis::new(AxisKind::Height, (5.0, 5.0), [100.0, 0.0], 4);
        assert!(axis.scale.domain[0] < 5.0);
        assert!(axis.max_tick().unwrap() >= 5.0);
    }
}
