//! Scales and domain builders.
//!
//! - [`LinearScale`]: continuous numeric → pixel, with d3-compatible `nice` and `ticks`
//! - [`TimeScale`]: calendar dates → pixel, never niced
//! - [`BandScale`]: categories → pixel bands with inner/outer padding
//! - [`OrdinalScale`]: categories → colors
//! - [`ThresholdScale`]: numeric value → color bucket
//!
//! Domain builders skip rows whose channel is missing or non-finite, so partially
//! populated data never poisons a domain with `NaN`.

use super::accessors::Accessor;
use super::util::FALLBACK_COLOR;
use crate::fields::ColorMapping;
use crate::models::Observation;
use crate::viz::types::SortOrder;
use ahash::{AHashMap, AHashSet};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Domain value used for the single row of a condensed (mobile) dot plot.
pub const PLACEHOLDER_BAND: &str = "placeholder";

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = 1.4142135623730951; // sqrt(2)

/// `(i1, i2, inc)` such that ticks are `i * inc` (or `i / -inc` when `inc < 0`) for `i in i1..=i2`.
fn tick_spec(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };
    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let inv = 10f64.powf(-power) / factor;
        i1 = (start * inv).round();
        i2 = (stop * inv).round();
        if i1 / inv < start {
            i1 += 1.0;
        }
        if i2 / inv > stop {
            i2 -= 1.0;
        }
        inc = -inv;
    } else {
        inc = 10f64.powf(power) * factor;
        i1 = (start / inc).round();
        i2 = (stop / inc).round();
        if i1 * inc < start {
            i1 += 1.0;
        }
        if i2 * inc > stop {
            i2 -= 1.0;
        }
    }
    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

/// Signed tick increment; negative values encode `1 / |inc|` steps (exact decimal ticks).
pub fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    tick_spec(start, stop, count as f64).2
}

/// Human-friendly tick step (always positive) for the interval.
pub fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let (lo, hi) = if stop < start { (stop, start) } else { (start, stop) };
    let inc = tick_increment(lo, hi, count);
    let step = if inc < 0.0 { -1.0 / inc } else { inc };
    if stop < start { -step } else { step }
}

/// Roughly `count` round-numbered values covering `[start, stop]`.
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };
    let (i1, i2, inc) = tick_spec(lo, hi, count as f64);
    if i1.is_nan() || i2.is_nan() || i2 < i1 {
        return Vec::new();
    }
    let n = (i2 - i1 + 1.0) as usize;
    let mut out: Vec<f64> = (0..n)
        .map(|i| {
            let k = i1 + i as f64;
            if inc < 0.0 { k / -inc } else { k * inc }
        })
        .collect();
    if reverse {
        out.reverse();
    }
    out
}

/// Continuous numeric scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: [f64; 2],
    pub range: [f64; 2],
}

impl Default for LinearScale {
    fn default() -> Self {
        Self {
            domain: [0.0, 1.0],
            range: [0.0, 1.0],
        }
    }
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn scale(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        if (d1 - d0).abs() < f64::EPSILON {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        if (r1 - r0).abs() < f64::EPSILON {
            return (d0 + d1) / 2.0;
        }
        d0 + (px - r0) / (r1 - r0) * (d1 - d0)
    }

    /// Extend the domain to round values, repeating until the step stabilizes.
    pub fn nice(mut self, count: usize) -> Self {
        let [mut start, mut stop] = self.domain;
        if !(start.is_finite() && stop.is_finite()) || start == stop || count == 0 {
            return self;
        }
        let reverse = stop < start;
        if reverse {
            std::mem::swap(&mut start, &mut stop);
        }
        let mut prestep = f64::NAN;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count);
            if step == prestep {
                break;
            } else if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else if step < 0.0 {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            } else {
                break;
            }
            prestep = step;
        }
        self.domain = if reverse { [stop, start] } else { [start, stop] };
        self
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain[0], self.domain[1], count)
    }
}

/// Calendar scale. The domain is a plain extent; no rounding is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeScale {
    pub domain: [NaiveDate; 2],
    pub range: [f64; 2],
}

fn day_number(d: NaiveDate) -> f64 {
    d.num_days_from_ce() as f64
}

impl TimeScale {
    pub fn new(domain: [NaiveDate; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    fn linear(&self) -> LinearScale {
        LinearScale::new(
            [day_number(self.domain[0]), day_number(self.domain[1])],
            self.range,
        )
    }

    pub fn scale(&self, date: NaiveDate) -> f64 {
        self.linear().scale(day_number(date))
    }

    /// Date at a pixel offset, rounded to the nearest day.
    pub fn invert(&self, px: f64) -> NaiveDate {
        let days = self.linear().invert(px).round();
        NaiveDate::from_num_days_from_ce_opt(days as i32).unwrap_or(self.domain[0])
    }

    /// January 1st of round-numbered years within the domain, at most ~`count` of them.
    pub fn year_ticks(&self, count: usize) -> Vec<NaiveDate> {
        let y0 = self.domain[0].year();
        let y1 = self.domain[1].year();
        let (lo, hi) = if y1 < y0 { (y1, y0) } else { (y0, y1) };
        let step = tick_step(lo as f64, hi as f64, count.max(1)).abs().max(1.0).round() as i32;
        let first = ((lo as f64) / step as f64).ceil() as i32 * step;
        (0..)
            .map(|i| first + i * step)
            .take_while(|y| *y <= hi)
            .filter_map(|y| NaiveDate::from_ymd_opt(y, 1, 1))
            .filter(|d| *d >= self.domain[0].min(self.domain[1]))
            .collect()
    }
}

/// Categorical positional scale (d3 `scaleBand` semantics, alignment 0.5, no rounding).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandScale {
    pub domain: Vec<String>,
    pub range: [f64; 2],
    pub padding_inner: f64,
    pub padding_outer: f64,
    #[serde(skip)]
    index: AHashMap<String, usize>,
}

impl BandScale {
    pub fn new(domain: Vec<String>, range: [f64; 2]) -> Self {
        let index = domain
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        Self {
            domain,
            range,
            padding_inner: 0.0,
            padding_outer: 0.0,
            index,
        }
    }

    pub fn padding(mut self, inner: f64, outer: f64) -> Self {
        self.padding_inner = inner.clamp(0.0, 1.0);
        self.padding_outer = outer.max(0.0);
        self
    }

    fn layout(&self) -> (f64, f64) {
        let n = self.domain.len() as f64;
        let [r0, r1] = self.range;
        let (lo, hi) = if r1 < r0 { (r1, r0) } else { (r0, r1) };
        let step = (hi - lo) / (n - self.padding_inner + self.padding_outer * 2.0).max(1.0);
        let start = lo + (hi - lo - step * (n - self.padding_inner)) * 0.5;
        (start, step)
    }

    pub fn step(&self) -> f64 {
        self.layout().1
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding_inner)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Start offset of the band for `key`; `None` for keys outside the domain.
    pub fn scale(&self, key: &str) -> Option<f64> {
        let i = self.index_of(key)?;
        let (start, step) = self.layout();
        let n = self.domain.len();
        // Reversed ranges lay bands out from the far end.
        let i = if self.range[1] < self.range[0] { n - 1 - i } else { i };
        Some(start + step * i as f64)
    }

    /// Middle of the band for `key`.
    pub fn center(&self, key: &str) -> Option<f64> {
        self.scale(key).map(|s| s + self.bandwidth() / 2.0)
    }

    /// Category whose step slot contains the pixel offset.
    pub fn invert(&self, px: f64) -> Option<&str> {
        if self.domain.is_empty() {
            return None;
        }
        let (start, step) = self.layout();
        if step <= 0.0 {
            return None;
        }
        let pad = step * self.padding_inner / 2.0;
        let slot = ((px - start + pad) / step).floor();
        if slot < 0.0 || slot >= self.domain.len() as f64 {
            return None;
        }
        let mut i = slot as usize;
        if self.range[1] < self.range[0] {
            i = self.domain.len() - 1 - i;
        }
        self.domain.get(i).map(String::as_str)
    }
}

/// Categorical color scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrdinalScale {
    pub domain: Vec<String>,
    pub range: Vec<String>,
    #[serde(skip)]
    index: AHashMap<String, usize>,
}

impl OrdinalScale {
    pub fn new(domain: Vec<String>, range: Vec<String>) -> Self {
        let index = domain
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        Self {
            domain,
            range,
            index,
        }
    }

    /// Color for `key`; palettes shorter than the domain repeat, unknown keys get
    /// [`FALLBACK_COLOR`].
    pub fn color(&self, key: &str) -> &str {
        match (self.index.get(key), self.range.len()) {
            (Some(i), n) if n > 0 => &self.range[i % n],
            _ => FALLBACK_COLOR,
        }
    }
}

/// Maps numeric values to colors by thresholds: `range[i]` covers
/// `[thresholds[i-1], thresholds[i])`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdScale {
    pub thresholds: Vec<f64>,
    pub range: Vec<String>,
}

/// Relative offsets from the median at which the color changes.
pub const MEDIAN_THRESHOLD_OFFSETS: [f64; 4] = [0.85, 0.95, 1.05, 1.15];

impl ThresholdScale {
    pub fn new(thresholds: Vec<f64>, range: Vec<String>) -> Self {
        Self { thresholds, range }
    }

    /// Five buckets around a median: well below, below, around, above, well above.
    pub fn around_median(median: f64, palette: &[String]) -> Self {
        let thresholds = MEDIAN_THRESHOLD_OFFSETS.iter().map(|f| median * f).collect();
        Self::new(thresholds, palette.to_vec())
    }

    pub fn color(&self, value: f64) -> &str {
        if !value.is_finite() {
            return FALLBACK_COLOR;
        }
        let i = self.thresholds.partition_point(|t| *t <= value);
        self.range.get(i).map(String::as_str).unwrap_or(FALLBACK_COLOR)
    }
}

/// `[min, max]` of a numeric channel, `None` when no row has a finite value.
pub fn numeric_extent(data: &[Observation], acc: &Accessor) -> Option<(f64, f64)> {
    numeric_extent_with(data, acc, None)
}

/// Like [`numeric_extent`], with a reference value (e.g. a peer-group median) folded in
/// so a marker drawn at it is never clipped.
pub fn numeric_extent_with(
    data: &[Observation],
    acc: &Accessor,
    reference: Option<f64>,
) -> Option<(f64, f64)> {
    extent(data.iter().filter_map(|o| acc.number(o)).chain(reference))
}

/// `[min, max]` of finite values.
pub fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

pub fn time_extent(data: &[Observation], acc: &Accessor) -> Option<(NaiveDate, NaiveDate)> {
    data.iter()
        .filter_map(|o| acc.date(o))
        .fold(None, |acc, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
}

/// Distinct values of a channel in first-seen order.
pub fn unique_values(data: &[Observation], acc: &Accessor) -> Vec<String> {
    let mut seen = AHashSet::new();
    let mut out = Vec::new();
    for o in data {
        if let Some(k) = acc.text(o) {
            if seen.insert(k.clone().into_owned()) {
                out.push(k.into_owned());
            }
        }
    }
    out
}

/// Band domain in first-seen order (not sorted).
pub fn band_domain(data: &[Observation], acc: &Accessor) -> Vec<String> {
    unique_values(data, acc)
}

/// Band domain ordered by the first value seen for each band; ties keep first-seen order.
pub fn sorted_band_domain(
    data: &[Observation],
    band: &Accessor,
    value: &Accessor,
    order: SortOrder,
) -> Vec<String> {
    let mut first_value: AHashMap<String, f64> = AHashMap::new();
    for o in data {
        if let (Some(k), Some(v)) = (band.text(o), value.number(o)) {
            first_value.entry(k.into_owned()).or_insert(v);
        }
    }
    let mut keys = unique_values(data, band);
    keys.sort_by(|a, b| {
        let va = first_value.get(a).copied().unwrap_or(f64::NEG_INFINITY);
        let vb = first_value.get(b).copied().unwrap_or(f64::NEG_INFINITY);
        match order {
            SortOrder::Asc => va.total_cmp(&vb),
            SortOrder::Desc => vb.total_cmp(&va),
        }
    });
    keys
}

/// The single-row domain used when every point collapses into one band.
pub fn placeholder_band_domain() -> Vec<String> {
    vec![PLACEHOLDER_BAND.to_string()]
}

/// Color scale from an explicit mapping (keys → domain, colors → range) or, when the
/// mapping is empty, from the distinct channel values and a palette.
pub fn color_scale(
    data: &[Observation],
    acc: &Accessor,
    mapping: &[ColorMapping],
    palette: &[String],
) -> OrdinalScale {
    if !mapping.is_empty() {
        let (domain, range) = mapping
            .iter()
            .map(|m| (m.value.clone(), m.color.trim().to_string()))
            .unzip();
        return OrdinalScale::new(domain, range);
    }
    OrdinalScale::new(unique_values(data, acc), palette.to_vec())
}
