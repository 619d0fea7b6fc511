//! Bar roll-ups for grouped bars and the diverging stack for stacked bars.
//!
//! Grouped bars bucket rows by `(period, entity, value)`: segment supplies the period,
//! the category axis (y) the entity and the value axis (x) the value. A bucket holding a
//! single row passes through untouched in both roll-up modes; larger buckets get a
//! generated aggregate label.

use super::accessors::Accessors;
use super::grouping::GroupTree;
use super::types::{EntityKind, RollupMode};
use super::util::LabelCatalog;
use crate::models::Observation;
use ahash::AHashMap;
use serde::Serialize;

/// Field added to a summary row's observation, holding the bucket's member count.
pub const MEMBER_COUNT_FIELD: &str = "memberCount";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarRowKind {
    /// A bucket with exactly one row, shown as-is.
    Single,
    /// Aggregate bar standing for every member of a bucket.
    Summary,
    /// One member of an expanded bucket.
    Member,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarRow {
    pub kind: BarRowKind,
    /// Unique key of the row on the category axis.
    pub band: String,
    pub label: String,
    pub period: String,
    pub entity: String,
    pub value: f64,
    /// Members behind this bar (1 for single and member rows).
    pub count: usize,
    /// Source row; for summaries, the bucket's first member tagged with
    /// [`MEMBER_COUNT_FIELD`] so it never equals a member row.
    pub observation: Observation,
}

/// Roll up grouped-bar rows. Rows without a numeric value are left out.
///
/// Output follows first-seen order of periods, then entities within a period, then values.
pub fn rollup_bars(
    data: &[Observation],
    acc: &Accessors,
    mode: RollupMode,
    entity_kind: EntityKind,
    labels: &LabelCatalog,
) -> Vec<BarRow> {
    let period = |o: &Observation| Some(acc.segment.key(o));
    let entity = |o: &Observation| Some(acc.y.key(o));
    let value = |o: &Observation| acc.x.number(o).map(|_| acc.x.key(o));
    let keys: [&dyn Fn(&Observation) -> Option<String>; 3] = [&period, &entity, &value];
    let tree = GroupTree::build(data, &keys);

    let noun = labels.get(entity_kind.plural_label_id());
    let mut rows = Vec::new();
    for leaf in tree.leaves() {
        let node = tree.node(leaf);
        let path = tree.path(leaf);
        let (Some(first), [p, e, v]) = (node.rows.first(), path.as_slice()) else {
            continue;
        };
        let first = &data[*first];
        let Some(number) = acc.x.number(first) else {
            continue;
        };
        let band = format!("{p} / {e} / {v}");

        if node.rows.len() == 1 {
            rows.push(BarRow {
                kind: BarRowKind::Single,
                band,
                label: labels.get(e).into_owned(),
                period: p.to_string(),
                entity: e.to_string(),
                value: number,
                count: 1,
                observation: first.clone(),
            });
            continue;
        }

        let count = node.rows.len();
        rows.push(BarRow {
            kind: BarRowKind::Summary,
            band: band.clone(),
            label: format!("{p}, {}, {count} {noun}", labels.get(e)),
            period: p.to_string(),
            entity: e.to_string(),
            value: number,
            count,
            observation: first.clone().with(MEMBER_COUNT_FIELD, count),
        });
        if mode == RollupMode::Expanded {
            for &i in &node.rows {
                let obs = &data[i];
                let member = acc.label.key(obs);
                rows.push(BarRow {
                    kind: BarRowKind::Member,
                    band: format!("{band} / {member} / {i}"),
                    label: labels.get(&member).into_owned(),
                    period: p.to_string(),
                    entity: e.to_string(),
                    value: number,
                    count: 1,
                    observation: obs.clone(),
                });
            }
        }
    }
    log::debug!("rolled {} rows into {} bars ({mode:?})", data.len(), rows.len());
    rows
}

/// One piece of a stacked bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackSegment {
    pub segment: String,
    pub value: f64,
    pub start: f64,
    pub end: f64,
    pub observation: Observation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedBar {
    pub category: String,
    pub segments: Vec<StackSegment>,
    pub positive_total: f64,
    pub negative_total: f64,
}

impl StackedBar {
    pub fn total(&self) -> f64 {
        self.positive_total + self.negative_total
    }
}

/// Diverging stack: per category, positive values stack away from zero to the right and
/// negative ones to the left, each in `segment_order`. Segments missing from
/// `segment_order` follow in first-seen order. Duplicate `(category, segment)` rows are summed.
pub fn stack_diverging(
    data: &[Observation],
    acc: &Accessors,
    categories: &[String],
    segment_order: &[String],
) -> Vec<StackedBar> {
    let category = |o: &Observation| Some(acc.y.key(o));
    let segment = |o: &Observation| Some(acc.segment.key(o));
    let keys: [&dyn Fn(&Observation) -> Option<String>; 2] = [&category, &segment];
    let tree = GroupTree::build(data, &keys);

    let rank: AHashMap<&str, usize> = segment_order
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();

    let by_category: AHashMap<&str, usize> = tree
        .children(GroupTree::ROOT)
        .map(|(i, n)| (n.key.as_str(), i))
        .collect();

    categories
        .iter()
        .filter_map(|cat| {
            let node = *by_category.get(cat.as_str())?;
            let mut parts: Vec<(usize, &str, f64, &Observation)> = tree
                .children(node)
                .enumerate()
                .filter_map(|(seen, (_, seg))| {
                    let value: f64 = seg.rows.iter().filter_map(|&i| acc.x.number(&data[i])).sum();
                    let first = &data[*seg.rows.first()?];
                    let order = rank.get(seg.key.as_str()).copied().unwrap_or(segment_order.len() + seen);
                    Some((order, seg.key.as_str(), value, first))
                })
                .collect();
            parts.sort_by_key(|p| p.0);

            let (mut pos, mut neg) = (0.0, 0.0);
            let segments = parts
                .into_iter()
                .map(|(_, seg, value, obs)| {
                    let (start, end) = if value >= 0.0 {
                        let s = pos;
                        pos += value;
                        (s, pos)
                    } else {
                        let s = neg;
                        neg += value;
                        (s, neg)
                    };
                    StackSegment {
                        segment: seg.to_string(),
                        value,
                        start,
                        end,
                        observation: obs.clone(),
                    }
                })
                .collect();
            Some(StackedBar {
                category: cat.clone(),
                segments,
                positive_total: pos,
                negative_total: neg,
            })
        })
        .collect()
}

/// `[min, max]` covering every stack and zero.
pub fn stack_extent(bars: &[StackedBar]) -> (f64, f64) {
    bars.iter().fold((0.0, 0.0), |(lo, hi), b| {
        (f64::min(lo, b.negative_total), f64::max(hi, b.positive_total))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{AxisField, FieldMapping, LabelField, SegmentField};

    fn accessors() -> Accessors {
        let axis = |f: &str| {
            Some(AxisField {
                field: f.into(),
                axis_label: None,
                sort_order: None,
            })
        };
        Accessors::resolve(&FieldMapping {
            x: axis("value"),
            y: axis("operator"),
            segment: Some(SegmentField {
                field: "period".into(),
                palette: None,
                color_mapping: vec![],
                sort_order: None,
            }),
            label: Some(LabelField {
                field: "municipality".into(),
            }),
            ..Default::default()
        })
    }

    fn row(period: i32, op: &str, muni: &str, value: f64) -> Observation {
        Observation::new()
            .with("period", period)
            .with("operator", op)
            .with("municipality", muni)
            .with("value", value)
    }

    #[test]
    fn buckets_with_many_members_are_summarized() {
        let data = vec![
            row(2024, "EWZ", "Zürich", 20.5),
            row(2024, "EWZ", "Oberengstringen", 20.5),
            row(2024, "BKW", "Bern", 23.0),
        ];
        let labels = LabelCatalog::new().with("municipalities", "Gemeinden");
        let collapsed = rollup_bars(
            &data,
            &accessors(),
            RollupMode::Collapsed,
            EntityKind::Municipalities,
            &labels,
        );
        assert_eq!(collapsed.len(), 2);
        assert_eq!(collapsed[0].kind, BarRowKind::Summary);
        assert_eq!(collapsed[0].label, "2024, EWZ, 2 Gemeinden");
        assert_eq!(collapsed[1].kind, BarRowKind::Single);

        let expanded = rollup_bars(
            &data,
            &accessors(),
            RollupMode::Expanded,
            EntityKind::Municipalities,
            &labels,
        );
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[1].kind, BarRowKind::Member);
        assert_eq!(expanded[1].label, "Zürich");
        assert_eq!(expanded[3], collapsed[1]);
    }

    #[test]
    fn diverging_stack_splits_signs() {
        let acc = Accessors::resolve(&FieldMapping {
            x: Some(AxisField {
                field: "value".into(),
                axis_label: None,
                sort_order: None,
            }),
            y: Some(AxisField {
                field: "operator".into(),
                axis_label: None,
                sort_order: None,
            }),
            segment: Some(SegmentField {
                field: "component".into(),
                palette: None,
                color_mapping: vec![],
                sort_order: None,
            }),
            ..Default::default()
        });
        let data = vec![
            Observation::new().with("operator", "EWZ").with("component", "energy").with("value", 10.0),
            Observation::new().with("operator", "EWZ").with("component", "rebate").with("value", -2.0),
            Observation::new().with("operator", "EWZ").with("component", "grid").with("value", 8.0),
        ];
        let order = vec!["grid".to_string(), "energy".to_string(), "rebate".to_string()];
        let bars = stack_diverging(&data, &acc, &["EWZ".to_string()], &order);
        let b = &bars[0];
        assert_eq!(b.segments[0].segment, "grid");
        assert_eq!((b.segments[1].start, b.segments[1].end), (8.0, 18.0));
        assert_eq!((b.segments[2].start, b.segments[2].end), (0.0, -2.0));
        assert_eq!(b.total(), 16.0);
        assert_eq!(stack_extent(&bars), (-2.0, 18.0));
    }
}
