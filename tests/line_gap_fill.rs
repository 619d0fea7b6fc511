use std::collections::BTreeSet;
use tariff_charts::fields::FieldMapping;
use tariff_charts::models::Observation;
use tariff_charts::viz::accessors::Accessors;
use tariff_charts::viz::series::{fill_gaps, gap_filled_series, stack_areas};

fn fields() -> FieldMapping {
    serde_json::from_str(
        r#"{"x": {"field": "year"}, "y": {"field": "value"}, "segment": {"field": "op"}}"#,
    )
    .unwrap()
}

fn obs(year: i32, value: f64, op: &str) -> Observation {
    Observation::new()
        .with("year", year)
        .with("value", value)
        .with("op", op)
        .with("name", format!("Operator {op}"))
}

fn sample() -> Vec<Observation> {
    vec![obs(2020, 10.0, "A"), obs(2021, 12.0, "A"), obs(2020, 8.0, "B")]
}

#[test]
fn missing_year_becomes_a_gap_point() {
    let data = sample();
    let acc = Accessors::resolve(&fields());
    let series = gap_filled_series(&data, &acc);
    assert_eq!(series.len(), 2);

    let a = &series[0];
    assert_eq!(a.key, "A");
    assert_eq!(a.points.len(), 2);
    assert!(a.points.iter().all(|p| !p.synthetic));
    assert_eq!(
        a.points.iter().map(|p| p.y).collect::<Vec<_>>(),
        vec![Some(10.0), Some(12.0)]
    );

    let b = &series[1];
    assert_eq!(b.key, "B");
    assert_eq!(b.points.len(), 2);
    let gap = &b.points[1];
    assert!(gap.synthetic);
    assert_eq!(gap.y, None);
    assert_eq!(gap.observation.number("year"), Some(2021.0));
    assert_eq!(gap.observation.number("value"), None);
    // Identifying fields come from the segment's first real row.
    assert_eq!(gap.observation.text("name").as_deref(), Some("Operator B"));
    assert_eq!(b.defined_runs().len(), 1);
}

#[test]
fn gap_filling_twice_adds_nothing() {
    let data = sample();
    let acc = Accessors::resolve(&fields());
    let once = fill_gaps(&data, &acc);
    let twice = fill_gaps(&once, &acc);
    assert_eq!(once.len(), 4);
    assert_eq!(twice.len(), once.len());

    let years = |rows: &[Observation]| -> BTreeSet<i64> {
        rows.iter()
            .filter_map(|o| o.number("year"))
            .map(|y| y as i64)
            .collect()
    };
    assert_eq!(years(&once), years(&twice));
}

#[test]
fn input_rows_are_left_untouched() {
    let data = vec![obs(2021, 12.0, "A"), obs(2020, 10.0, "A")];
    let before = data.clone();
    let acc = Accessors::resolve(&fields());
    let series = gap_filled_series(&data, &acc);
    assert_eq!(data, before);
    assert!(series[0].points[0].x < series[0].points[1].x);
}

#[test]
fn stacked_layers_treat_gaps_as_zero() {
    let acc = Accessors::resolve(&fields());
    let series = gap_filled_series(&sample(), &acc);
    let layers = stack_areas(&series);
    assert_eq!(layers.len(), 2);
    let (_, lo, hi) = layers[1].points[0];
    assert_eq!((lo, hi), (10.0, 18.0));
    let (_, lo, hi) = layers[1].points[1];
    assert_eq!((lo, hi), (12.0, 12.0));
}
