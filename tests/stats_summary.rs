use tariff_charts::models::Observation;
use tariff_charts::stats::{grouped_summary, median};
use tariff_charts::viz::accessors::Accessor;

fn obs(op: &str, year: i32, v: Option<f64>) -> Observation {
    let o = Observation::new().with("operator", op).with("year", year);
    match v {
        Some(v) => o.with("total", v),
        None => o,
    }
}

#[test]
fn grouped_stats_handle_missing_and_median_even_odd() {
    // AAA: [1, 2, 3, 4] -> median (2 + 3) / 2 = 2.5
    // BBB: [10, -, 30] -> one missing, median 20
    let rows = vec![
        obs("AAA", 2018, Some(1.0)),
        obs("AAA", 2019, Some(2.0)),
        obs("AAA", 2020, Some(3.0)),
        obs("AAA", 2021, Some(4.0)),
        obs("BBB", 2018, Some(10.0)),
        obs("BBB", 2019, None),
        obs("BBB", 2020, Some(30.0)),
    ];
    let got = grouped_summary(&rows, &Accessor::field("operator"), &Accessor::field("total"));
    assert_eq!(got.len(), 2);

    let a = &got[0];
    assert_eq!(a.key, "AAA");
    assert_eq!(a.count, 4);
    assert_eq!(a.missing, 0);
    assert_eq!(a.min, Some(1.0));
    assert_eq!(a.max, Some(4.0));
    assert!((a.mean.unwrap() - 2.5).abs() < 1e-9);
    assert!((a.median.unwrap() - 2.5).abs() < 1e-9);

    let b = &got[1];
    assert_eq!(b.key, "BBB");
    assert_eq!(b.count, 2);
    assert_eq!(b.missing, 1);
    assert_eq!(b.median, Some(20.0));
}

#[test]
fn all_missing_group_has_no_statistics() {
    let rows = vec![obs("CCC", 2020, None)];
    let got = grouped_summary(&rows, &Accessor::field("operator"), &Accessor::field("total"));
    assert_eq!(got[0].count, 0);
    assert_eq!(got[0].missing, 1);
    assert_eq!(got[0].mean, None);
    assert_eq!(got[0].median, None);
    assert_eq!(median([f64::NAN]), None);
}
