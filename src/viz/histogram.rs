//! Histogram binning and annotation markers.
//!
//! Annotations call out selected rows on the value axis. Rows of the same entity that
//! share a value collapse into one marker with a count, and marker labels are stacked
//! into rows so no two labels overlap horizontally.

use super::accessors::Accessors;
use super::grouping::GroupTree;
use super::scales::{LinearScale, ticks};
use super::text::{FontOptions, estimate_text_width};
use super::types::EntityKind;
use super::util::LabelCatalog;
use crate::models::Observation;
use serde::Serialize;

/// Horizontal space required between two labels on the same row.
pub const LABEL_GAP_PX: f64 = 8.0;

/// One histogram bin covering `[x0, x1)`; the last bin also includes `x1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub x0: f64,
    pub x1: f64,
    pub rows: Vec<Observation>,
}

impl Bin {
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn contains(&self, value: f64, last: bool) -> bool {
        value >= self.x0 && (value < self.x1 || (last && value <= self.x1))
    }
}

/// Sturges' rule: `ceil(log2(n)) + 1` bins, at least one.
pub fn sturges_bin_count(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (n as f64).log2().ceil() as usize + 1
}

/// Bin rows by the value channel. Thresholds are round numbers over the niced extent.
pub fn bin_values(data: &[Observation], acc: &Accessors) -> Vec<Bin> {
    let values: Vec<(f64, &Observation)> = data
        .iter()
        .filter_map(|o| acc.x.number(o).map(|v| (v, o)))
        .collect();
    let Some((lo, hi)) = super::scales::extent(values.iter().map(|(v, _)| *v)) else {
        return Vec::new();
    };

    let count = sturges_bin_count(values.len());
    let mut edges = if hi > lo {
        let [d0, d1] = LinearScale::new([lo, hi], [0.0, 1.0]).nice(count).domain;
        ticks(d0, d1, count)
    } else {
        vec![lo, lo + 1.0]
    };
    if edges.len() < 2 {
        edges = vec![lo, hi.max(lo + 1.0)];
    }

    let mut bins: Vec<Bin> = edges
        .windows(2)
        .map(|w| Bin {
            x0: w[0],
            x1: w[1],
            rows: Vec::new(),
        })
        .collect();
    let last = bins.len() - 1;
    for (v, o) in values {
        let i = bins
            .partition_point(|b| b.x1 <= v)
            .min(last);
        bins[i].rows.push(o.clone());
    }
    log::debug!("{} bins over [{lo}, {hi}]", bins.len());
    bins
}

/// Largest bin count; the y domain of a histogram is `[0, max]`.
pub fn max_bin_count(bins: &[Bin]) -> usize {
    bins.iter().map(Bin::count).max().unwrap_or(0)
}

/// One annotation marker, possibly standing for several rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationGroup {
    pub entity: String,
    pub value: f64,
    pub count: usize,
    pub label: String,
    pub rows: Vec<Observation>,
}

/// Group annotated rows by `(entity, value)`.
///
/// A row is annotated when its `annotation` field value is listed in `selected`, or when it is
/// the highlighted entity. Single rows are labeled by their label channel; groups by
/// `"{entity}, {count} {noun}"`.
pub fn group_annotations(
    data: &[Observation],
    acc: &Accessors,
    annotation_field: Option<&str>,
    selected: &[String],
    entity_kind: EntityKind,
    labels: &LabelCatalog,
) -> Vec<AnnotationGroup> {
    let candidates: Vec<&Observation> = data
        .iter()
        .filter(|o| {
            let picked = annotation_field
                .and_then(|f| o.text(f))
                .is_some_and(|v| selected.iter().any(|s| s.as_str() == v.as_ref()));
            picked || acc.is_highlighted(o)
        })
        .collect();

    let entity = |o: &&Observation| Some(acc.entity.key(o));
    let value = |o: &&Observation| acc.x.number(o).map(|_| acc.x.key(o));
    let keys: [&dyn Fn(&&Observation) -> Option<String>; 2] = [&entity, &value];
    let tree = GroupTree::build(&candidates, &keys);

    let noun = labels.get(entity_kind.plural_label_id());
    tree.leaves()
        .into_iter()
        .filter_map(|leaf| {
            let node = tree.node(leaf);
            let rows: Vec<Observation> = node.rows.iter().map(|&i| candidates[i].clone()).collect();
            let first = rows.first()?;
            let value = acc.x.number(first)?;
            let entity = tree.path(leaf).first()?.to_string();
            let label = if rows.len() == 1 {
                labels.get(&acc.label.key(first)).into_owned()
            } else {
                format!("{}, {} {noun}", labels.get(&entity), rows.len())
            };
            Some(AnnotationGroup {
                entity,
                value,
                count: rows.len(),
                label,
                rows,
            })
        })
        .collect()
}

/// A positioned annotation label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationLabel {
    pub text: String,
    /// Marker position on the value axis.
    pub anchor_x: f64,
    /// Left edge of the label box.
    pub x: f64,
    pub width: f64,
    /// Zero-based label row; row 0 is closest to the plot.
    pub row: usize,
    pub value: f64,
    pub count: usize,
}

/// Lay labels out left to right in rows, placing each in the first row where it fits.
pub fn layout_annotation_labels(
    groups: &[AnnotationGroup],
    scale: &LinearScale,
    chart_width: f64,
    font: FontOptions,
) -> Vec<AnnotationLabel> {
    let mut order: Vec<&AnnotationGroup> = groups.iter().collect();
    order.sort_by(|a, b| a.value.total_cmp(&b.value));

    let mut row_ends: Vec<f64> = Vec::new();
    order
        .into_iter()
        .map(|g| {
            let anchor_x = scale.scale(g.value);
            let width = estimate_text_width(&g.label, font) as f64;
            let x = anchor_x.min(chart_width - width).max(0.0);
            let row = match row_ends.iter().position(|end| x >= end + LABEL_GAP_PX) {
                Some(r) => r,
                None => {
                    row_ends.push(f64::NEG_INFINITY);
                    row_ends.len() - 1
                }
            };
            row_ends[row] = x + width;
            AnnotationLabel {
                text: g.label.clone(),
                anchor_x,
                x,
                width,
                row,
                value: g.value,
                count: g.count,
            }
        })
        .collect()
}

/// Number of label rows a layout uses.
pub fn label_rows(labels: &[AnnotationLabel]) -> usize {
    labels.iter().map(|l| l.row + 1).max().unwrap_or(0)
}
