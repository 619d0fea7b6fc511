use tariff_charts::fields::ColorMapping;
use tariff_charts::models::Observation;
use tariff_charts::viz::accessors::Accessor;
use tariff_charts::viz::axis::{AxisKind, NumericAxis, tick_count};
use tariff_charts::viz::bounds::{Margins, compute_bounds};
use tariff_charts::viz::scales::{BandScale, band_domain, color_scale, numeric_extent_with};
use tariff_charts::viz::util::FALLBACK_COLOR;

fn rows(values: &[(&str, f64)]) -> Vec<Observation> {
    values
        .iter()
        .map(|(op, v)| Observation::new().with("op", *op).with("value", *v))
        .collect()
}

#[test]
fn reference_value_is_folded_into_the_domain() {
    let data = rows(&[("A", 12.5), ("B", 17.0), ("C", 21.25)]);
    let acc = Accessor::field("value");
    assert_eq!(numeric_extent_with(&data, &acc, None), Some((12.5, 21.25)));
    assert_eq!(numeric_extent_with(&data, &acc, Some(9.0)), Some((9.0, 21.25)));
    assert_eq!(numeric_extent_with(&data, &acc, Some(30.0)), Some((12.5, 30.0)));
}

#[test]
fn top_tick_is_never_below_the_data() {
    for (lo, hi) in [(0.3, 97.2), (12.5, 21.25), (0.0, 1.0), (-4.0, 3.3), (5.0, 5.0)] {
        for kind in [AxisKind::Height, AxisKind::Width] {
            let axis = NumericAxis::new(kind, (lo, hi), [0.0, 400.0], 4);
            let top = axis.max_tick().unwrap();
            assert!(top >= hi, "{kind:?} ticks {:?} below {hi}", axis.ticks);
            assert!(axis.scale.domain[0] <= lo);
            assert!(axis.scale.domain[1] >= hi);
            assert_eq!(axis.scale.domain[0], axis.scale.domain[0].floor());
            assert_eq!(axis.scale.domain[1], axis.scale.domain[1].ceil());
        }
    }
}

#[test]
fn tick_counts_stay_within_axis_clamps() {
    assert_eq!(tick_count(10_000.0, 40.0, AxisKind::Height), 4);
    assert_eq!(tick_count(10_000.0, 40.0, AxisKind::Width), 10);
    assert_eq!(tick_count(10.0, 40.0, AxisKind::Height), 2);
    assert_eq!(tick_count(0.0, 40.0, AxisKind::Width), 2);
}

#[test]
fn bands_keep_first_seen_order() {
    let data = rows(&[("Zürich", 1.0), ("Bern", 2.0), ("Zürich", 3.0), ("Aarau", 4.0)]);
    let domain = band_domain(&data, &Accessor::field("op"));
    assert_eq!(domain, vec!["Zürich", "Bern", "Aarau"]);

    let band = BandScale::new(domain, [0.0, 300.0]);
    assert_eq!(band.bandwidth(), 100.0);
    assert_eq!(band.center("Bern"), Some(150.0));
    assert_eq!(band.invert(250.0), Some("Aarau"));
    assert_eq!(band.center("Basel"), None);
}

#[test]
fn explicit_color_mapping_defines_the_domain() {
    let data = rows(&[("A", 1.0), ("B", 2.0)]);
    let mapping = vec![
        ColorMapping {
            value: "B".into(),
            color: "#ff0000".into(),
        },
        ColorMapping {
            value: "A".into(),
            color: "#00ff00".into(),
        },
    ];
    let scale = color_scale(&data, &Accessor::field("op"), &mapping, &[]);
    assert_eq!(scale.domain, vec!["B", "A"]);
    assert_eq!(scale.color("A"), "#00ff00");
    assert_eq!(scale.color("C"), FALLBACK_COLOR);
}

#[test]
fn bounds_follow_width_and_aspect_ratio() {
    let bounds = compute_bounds(800.0, 0.2, Margins::new(10, 40, 50, 100));
    assert_eq!(bounds.chart_width, 660.0);
    assert!((bounds.chart_height - 132.0).abs() < 1e-9);
    assert!((bounds.height - 192.0).abs() < 1e-9);
}

#[test]
fn unmeasured_container_gives_an_empty_but_valid_layout() {
    let bounds = compute_bounds(0.0, 0.4, Margins::numeric());
    assert_eq!(bounds.chart_width, 0.0);
    assert_eq!(bounds.chart_height, 0.0);
    assert!(bounds.height.is_finite());

    let narrow = compute_bounds(30.0, 0.4, Margins::new(10, 40, 50, 100));
    assert_eq!(narrow.chart_width, 0.0);
}
