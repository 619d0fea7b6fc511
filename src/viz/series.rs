//! Series reshaping for time-based charts, plus the generic long-format pivot.
//!
//! All functions take the caller's rows by shared reference and return new rows;
//! sorting always happens on a copy.

use super::accessors::Accessors;
use super::grouping::group_by;
use crate::error::FieldsError;
use crate::models::{Observation, Scalar};
use ahash::AHashMap;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePoint {
    pub x: NaiveDate,
    /// `None` is a gap: renderers must not draw a segment through it.
    pub y: Option<f64>,
    /// Inserted by gap filling rather than read from the input.
    pub synthetic: bool,
    pub observation: Observation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub key: String,
    pub points: Vec<LinePoint>,
}

impl LineSeries {
    /// Runs of consecutive defined points; each run is drawn as one polyline.
    pub fn defined_runs(&self) -> Vec<Vec<(NaiveDate, f64)>> {
        let mut runs = Vec::new();
        let mut cur = Vec::new();
        for p in &self.points {
            match p.y {
                Some(y) => cur.push((p.x, y)),
                None => {
                    if !cur.is_empty() {
                        runs.push(std::mem::take(&mut cur));
                    }
                }
            }
        }
        if !cur.is_empty() {
            runs.push(cur);
        }
        runs
    }
}

/// Copy of `data` sorted by the x channel (as a date) ascending; rows without a
/// parseable x keep their relative order at the end.
pub fn sort_by_x(data: &[Observation], acc: &Accessors) -> Vec<Observation> {
    let mut rows = data.to_vec();
    rows.sort_by_key(|o| match acc.x.date(o) {
        Some(d) => (0, Some(d)),
        None => (1, None),
    });
    rows
}

/// Group rows by segment and give every segment exactly one point per distinct x
/// value in the whole dataset.
///
/// Missing combinations become synthetic points with an undefined y. They copy every
/// other field (labels, ids) from the segment's first real row, so tooltips and legends
/// still resolve a display name.
pub fn gap_filled_series(data: &[Observation], acc: &Accessors) -> Vec<LineSeries> {
    let sorted = sort_by_x(data, acc);

    // Distinct x values with the first raw cell seen for each, used when synthesizing.
    let mut xs: BTreeMap<NaiveDate, Scalar> = BTreeMap::new();
    let mut dated: Vec<(NaiveDate, &Observation)> = Vec::with_capacity(sorted.len());
    for o in &sorted {
        match acc.x.date(o) {
            Some(d) => {
                if let Some(raw) = acc.x.scalar(o) {
                    xs.entry(d).or_insert_with(|| raw.into_owned());
                }
                dated.push((d, o));
            }
            None => log::warn!("dropping row without a usable x value: {o:?}"),
        }
    }

    let x_field = acc.x.field_name();
    let y_field = acc.y.field_name();

    group_by(&dated, |(_, o)| acc.segment.key(o))
        .into_iter()
        .map(|(key, rows)| {
            let mut by_x: AHashMap<NaiveDate, &Observation> = AHashMap::with_capacity(rows.len());
            for (d, o) in &rows {
                if by_x.contains_key(d) {
                    log::warn!("segment `{key}` has more than one row at {d}; keeping the first");
                    continue;
                }
                by_x.insert(*d, *o);
            }
            let template = rows.first().map(|(_, o)| *o);

            let points = xs
                .iter()
                .filter_map(|(d, raw)| match by_x.get(d) {
                    Some(o) => Some(LinePoint {
                        x: *d,
                        y: acc.y.number(o),
                        synthetic: false,
                        observation: (*o).clone(),
                    }),
                    None => {
                        let mut obs = template?.clone();
                        if let Some(f) = x_field {
                            obs.insert(f, raw.clone());
                        }
                        if let Some(f) = y_field {
                            obs.remove(f);
                        }
                        Some(LinePoint {
                            x: *d,
                            y: None,
                            synthetic: true,
                            observation: obs,
                        })
                    }
                })
                .collect();
            LineSeries { key, points }
        })
        .collect()
}

/// Gap-filled rows, flattened segment by segment in ascending x order.
pub fn fill_gaps(data: &[Observation], acc: &Accessors) -> Vec<Observation> {
    gap_filled_series(data, acc)
        .into_iter()
        .flat_map(|s| s.points.into_iter().map(|p| p.observation))
        .collect()
}

/// One stacked-area layer: `(x, lower, upper)` per x value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaLayer {
    pub key: String,
    pub points: Vec<(NaiveDate, f64, f64)>,
}

/// Stack gap-filled series on top of each other; undefined values count as zero and
/// negative values are clamped to zero.
pub fn stack_areas(series: &[LineSeries]) -> Vec<AreaLayer> {
    let mut cumulative: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    series
        .iter()
        .map(|s| {
            let points = s
                .points
                .iter()
                .map(|p| {
                    let base = cumulative.entry(p.x).or_insert(0.0);
                    let lower = *base;
                    *base += p.y.unwrap_or(0.0).max(0.0);
                    (p.x, lower, *base)
                })
                .collect();
            AreaLayer {
                key: s.key.clone(),
                points,
            }
        })
        .collect()
}

/// Reshape wide rows into long format: each row becomes one row per listed column that
/// the row has, carrying every other field plus `{name_field: column, value_field: cell}`.
pub fn pivot_longer(
    data: &[Observation],
    columns: &[String],
    name_field: &str,
    value_field: &str,
) -> Result<Vec<Observation>, FieldsError> {
    if columns.is_empty() {
        return Err(FieldsError::EmptyPivot);
    }
    let mut out = Vec::with_capacity(data.len() * columns.len());
    for row in data {
        let mut base = row.clone();
        for c in columns {
            base.remove(c);
        }
        for c in columns {
            if let Some(v) = row.get(c) {
                out.push(
                    base.clone()
                        .with(name_field, c.as_str())
                        .with(value_field, v.clone()),
                );
            }
        }
    }
    Ok(out)
}

/// Inverse of [`pivot_longer`]: collect long rows sharing `id_field` back into one wide row.
pub fn pivot_wider(
    data: &[Observation],
    id_field: &str,
    name_field: &str,
    value_field: &str,
) -> Vec<Observation> {
    group_by(data, |o| o.text(id_field).map(|c| c.into_owned()).unwrap_or_default())
        .into_iter()
        .map(|(_, rows)| {
            let mut wide = rows[0].clone();
            wide.remove(name_field);
            wide.remove(value_field);
            for r in rows {
                if let (Some(name), Some(value)) = (r.text(name_field), r.get(value_field)) {
                    wide.insert(name.into_owned(), value.clone());
                }
            }
            wide
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{AxisField, FieldMapping, SegmentField};

    fn accessors() -> Accessors {
        Accessors::resolve(&FieldMapping {
            x: Some(AxisField {
                field: "year".into(),
                axis_label: None,
                sort_order: None,
            }),
            y: Some(AxisField {
                field: "value".into(),
                axis_label: None,
                sort_order: None,
            }),
            segment: Some(SegmentField {
                field: "op".into(),
                palette: None,
                color_mapping: vec![],
                sort_order: None,
            }),
            ..Default::default()
        })
    }

    #[test]
    fn defined_runs_split_on_gaps() {
        let data = vec![
            Observation::new().with("year", 2019).with("value", 1.0).with("op", "A"),
            Observation::new().with("year", 2021).with("value", 3.0).with("op", "A"),
            Observation::new().with("year", 2020).with("value", 5.0).with("op", "B"),
        ];
        let series = gap_filled_series(&data, &accessors());
        let a = &series[0];
        assert_eq!(a.points.len(), 3);
        assert_eq!(a.defined_runs().len(), 2);
    }

    #[test]
    fn input_is_not_reordered() {
        let data = vec![
            Observation::new().with("year", 2021).with("value", 3.0).with("op", "A"),
            Observation::new().with("year", 2019).with("value", 1.0).with("op", "A"),
        ];
        let before = data.clone();
        let _ = fill_gaps(&data, &accessors());
        assert_eq!(data, before);
    }

    #[test]
    fn areas_stack_cumulatively() {
        let data = vec![
            Observation::new().with("year", 2020).with("value", 2.0).with("op", "A"),
            Observation::new().with("year", 2020).with("value", 3.0).with("op", "B"),
            Observation::new().with("year", 2021).with("value", 1.0).with("op", "B"),
        ];
        let layers = stack_areas(&gap_filled_series(&data, &accessors()));
        let b = &layers[1];
        assert_eq!(b.points[0].1, 2.0);
        assert_eq!(b.points[0].2, 5.0);
        // A has no 2021 value: it contributes zero.
        assert_eq!(b.points[1].1, 0.0);
        assert_eq!(b.points[1].2, 1.0);
    }
}
