use tariff_charts::fields::{Channel, FieldMapping};
use tariff_charts::viz::annotation::TooltipContent;
use tariff_charts::viz::util::LabelCatalog;
use tariff_charts::viz::{PlacementY, RollupMode, Series};
use tariff_charts::{
    ChartContext, ChartKind, ChartOptions, FieldsError, MousePosition, Observation, render_chart,
};

const ALL_KINDS: [ChartKind; 6] = [
    ChartKind::Line,
    ChartKind::Area,
    ChartKind::Scatter,
    ChartKind::GroupedBars,
    ChartKind::StackedBars,
    ChartKind::Histogram,
];

fn fields(json: &str) -> FieldMapping {
    serde_json::from_str(json).unwrap()
}

fn line_fields() -> FieldMapping {
    fields(r#"{"x": {"field": "year"}, "y": {"field": "value"}, "segment": {"field": "op"}}"#)
}

fn line_data() -> Vec<Observation> {
    [(2020, 10.0, "A"), (2021, 12.0, "A"), (2020, 8.0, "B")]
        .into_iter()
        .map(|(year, value, op)| {
            Observation::new()
                .with("year", year)
                .with("value", value)
                .with("op", op)
        })
        .collect()
}

fn options() -> ChartOptions {
    ChartOptions::new(800.0, 0.4)
}

#[test]
fn empty_data_renders_an_empty_state() {
    let all = fields(
        r#"{"x": {"field": "value"}, "y": {"field": "operator"}, "segment": {"field": "component"}}"#,
    );
    for kind in ALL_KINDS {
        let state = render_chart(&[], &all, kind, &options(), &ChartContext::default()).unwrap();
        assert!(state.is_empty(), "{kind} should be empty");
        assert!(state.bounds.chart_width.is_finite());
        assert!(state.bounds.chart_height.is_finite());
        assert!(state.hover(MousePosition::new(100.0, 50.0)).is_none());
    }
}

#[test]
fn unmeasured_width_still_renders() {
    let state = render_chart(
        &line_data(),
        &line_fields(),
        ChartKind::Line,
        &ChartOptions::new(0.0, 0.4),
        &ChartContext::default(),
    )
    .unwrap();
    assert_eq!(state.bounds.chart_width, 0.0);
    assert_eq!(state.bounds.chart_height, 0.0);
}

#[test]
fn line_tooltip_lists_every_series_highest_first() {
    let state = render_chart(
        &line_data(),
        &line_fields(),
        ChartKind::Line,
        &options(),
        &ChartContext::default(),
    )
    .unwrap();
    let Series::Lines { series } = &state.series else {
        panic!("expected lines");
    };
    assert_eq!(series.len(), 2);

    let info = state.annotation_info(&line_data()[2]).unwrap();
    assert_eq!(info.x_value, "2020");
    let TooltipContent::Multiple(values) = &info.content else {
        panic!("line charts default to multiple values");
    };
    let pairs: Vec<(&str, Option<f64>)> =
        values.iter().map(|v| (v.label.as_str(), v.value)).collect();
    assert_eq!(pairs, vec![("A", Some(10.0)), ("B", Some(8.0))]);
    assert!(info.y_anchor <= state.bounds.chart_height);

    // Far right of the plot: 2021, where only A has a value.
    let m = state.bounds.margins;
    let mouse = MousePosition::new(
        m.left as f64 + state.bounds.chart_width,
        m.top as f64 + 10.0,
    );
    let datum = state.datum_at(mouse).unwrap();
    assert_eq!(datum.number("value"), Some(12.0));
    let hover = state.hover(mouse).unwrap();
    assert_eq!(hover.placement.x, tariff_charts::viz::PlacementX::Left);
}

#[test]
fn area_layers_stack_upwards() {
    let state = render_chart(
        &line_data(),
        &line_fields(),
        ChartKind::Area,
        &options(),
        &ChartContext::default(),
    )
    .unwrap();
    let Series::Areas { layers, .. } = &state.series else {
        panic!("expected areas");
    };
    assert_eq!(layers[1].points[0].2, 18.0);
    let y = state.scales.y.as_linear().unwrap();
    assert!(y.max_tick().unwrap() >= 18.0);
}

#[test]
fn dot_plot_colors_by_median_and_forces_top_tooltips() {
    let data: Vec<Observation> = [("EWZ", 10.0), ("BKW", 20.0), ("CKW", 30.0)]
        .into_iter()
        .map(|(op, v)| Observation::new().with("operator", op).with("value", v))
        .collect();
    let mut opts = options();
    opts.vertical_placement = PlacementY::Bottom;
    let state = render_chart(
        &data,
        &fields(r#"{"x": {"field": "value"}, "y": {"field": "operator"}}"#),
        ChartKind::Scatter,
        &opts,
        &ChartContext::default(),
    )
    .unwrap();
    assert_eq!(state.reference_value, Some(20.0));
    let Series::Dots { dots } = &state.series else {
        panic!("expected dots");
    };
    assert_eq!(dots.len(), 3);
    assert_ne!(dots[0].color, dots[2].color);

    let dot = &dots[1];
    let m = state.bounds.margins;
    let mouse = MousePosition::new(m.left as f64 + dot.x, m.top as f64 + dot.y);
    let info = state.hover(mouse).unwrap();
    assert_eq!(info.datum, dot.observation);
    assert_eq!(info.placement.y, PlacementY::Top);
    assert_eq!(info.x_value, "BKW");
}

#[test]
fn condensed_dot_plot_uses_one_row() {
    let data: Vec<Observation> = [("EWZ", 10.0), ("BKW", 20.0)]
        .into_iter()
        .map(|(op, v)| Observation::new().with("operator", op).with("value", v))
        .collect();
    let mut opts = options();
    opts.condensed = true;
    let state = render_chart(
        &data,
        &fields(r#"{"x": {"field": "value"}, "y": {"field": "operator"}}"#),
        ChartKind::Scatter,
        &opts,
        &ChartContext::default(),
    )
    .unwrap();
    assert_eq!(state.scales.y.as_band().unwrap().domain.len(), 1);
}

#[test]
fn grouped_bars_hover_by_band() {
    let data: Vec<Observation> = [
        ("EWZ", "Zürich", 20.0),
        ("EWZ", "Oberengstringen", 20.0),
        ("BKW", "Bern", 23.0),
    ]
    .into_iter()
    .map(|(op, m, v)| {
        Observation::new()
            .with("period", 2024)
            .with("operator", op)
            .with("municipality", m)
            .with("value", v)
    })
    .collect();
    let ctx = ChartContext {
        labels: LabelCatalog::new().with("municipalities", "Gemeinden"),
        ..ChartContext::default()
    };
    let state = render_chart(
        &data,
        &fields(
            r#"{"x": {"field": "value"}, "y": {"field": "operator"},
                "segment": {"field": "period"}, "label": {"field": "municipality"}}"#,
        ),
        ChartKind::GroupedBars,
        &options(),
        &ctx,
    )
    .unwrap();
    let Series::Bars { rows } = &state.series else {
        panic!("expected bars");
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(state.bounds.chart_height, 60.0);

    let band = state.scales.y.as_band().unwrap();
    let m = state.bounds.margins;
    let y = m.top as f64 + band.center(&rows[1].band).unwrap();
    let info = state.hover(MousePosition::new(m.left as f64 + 5.0, y)).unwrap();
    assert_eq!(info.content.values()[0].label, "BKW");
    assert_eq!(info.content.values()[0].value, Some(23.0));
}

#[test]
fn expanded_bars_anchor_member_tooltips_on_their_own_band() {
    let data: Vec<Observation> = [
        ("EWZ", "Zürich", 20.0),
        ("EWZ", "Oberengstringen", 20.0),
        ("BKW", "Bern", 23.0),
    ]
    .into_iter()
    .map(|(op, m, v)| {
        Observation::new()
            .with("period", 2024)
            .with("operator", op)
            .with("municipality", m)
            .with("value", v)
    })
    .collect();
    let opts = ChartOptions {
        rollup: RollupMode::Expanded,
        ..options()
    };
    let state = render_chart(
        &data,
        &fields(
            r#"{"x": {"field": "value"}, "y": {"field": "operator"},
                "segment": {"field": "period"}, "label": {"field": "municipality"}}"#,
        ),
        ChartKind::GroupedBars,
        &opts,
        &ChartContext::default(),
    )
    .unwrap();
    let Series::Bars { rows } = &state.series else {
        panic!("expected bars");
    };
    assert_eq!(rows.len(), 4);

    let band = state.scales.y.as_band().unwrap();
    let m = state.bounds.margins;
    let member_y = band.center(&rows[1].band).unwrap();
    let info = state
        .hover(MousePosition::new(m.left as f64 + 5.0, m.top as f64 + member_y))
        .unwrap();
    assert_eq!(info.y_anchor, member_y);
    assert_eq!(info.content.values()[0].label, "Zürich");
    assert_eq!(info.datum, data[0]);

    let summary_y = band.center(&rows[0].band).unwrap();
    let info = state
        .hover(MousePosition::new(m.left as f64 + 5.0, m.top as f64 + summary_y))
        .unwrap();
    assert_eq!(info.y_anchor, summary_y);
    assert_eq!(info.content.values()[0].label, "2024, EWZ, 2 municipalities");
}

#[test]
fn stacked_bars_pivot_wide_components() {
    let data = vec![
        Observation::new()
            .with("operator", "EWZ")
            .with("energy", 7.0)
            .with("grid", 9.0),
        Observation::new()
            .with("operator", "BKW")
            .with("energy", 6.0)
            .with("grid", -1.0),
    ];
    let state = render_chart(
        &data,
        &fields(
            r#"{"x": {"field": "value"}, "y": {"field": "operator"},
                "segment": {"field": "component"},
                "pivot": {"columns": ["energy", "grid"], "nameField": "component"}}"#,
        ),
        ChartKind::StackedBars,
        &options(),
        &ChartContext::default(),
    )
    .unwrap();
    let Series::Stacks { bars } = &state.series else {
        panic!("expected stacks");
    };
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].positive_total, 16.0);
    assert_eq!(bars[1].negative_total, -1.0);
    let x = state.scales.x.as_linear().unwrap();
    assert!(x.scale.domain[0] <= -1.0);
    assert!(x.max_tick().unwrap() >= 16.0);

    let info = state.annotation_info(&bars[0].segments[0].observation).unwrap();
    let labels: Vec<&str> = info.content.values().iter().map(|v| v.label.as_str()).collect();
    assert_eq!(labels, vec!["grid", "energy"]);
    assert_eq!(info.x_value, "EWZ");
}

fn band_order(state: &tariff_charts::ChartState) -> Vec<String> {
    state.scales.y.as_band().unwrap().domain.clone()
}

#[test]
fn grouped_bars_sort_by_value_keeping_ties_in_order() {
    let data: Vec<Observation> = [("EWZ", 20.0), ("BKW", 23.0), ("CKW", 15.0), ("SAK", 20.0)]
        .into_iter()
        .map(|(op, v)| {
            Observation::new()
                .with("period", 2024)
                .with("operator", op)
                .with("value", v)
        })
        .collect();
    let render = |order: &str| {
        let json = format!(
            r#"{{"x": {{"field": "value"}}, "y": {{"field": "operator", "sortOrder": "{order}"}},
                "segment": {{"field": "period"}}}}"#
        );
        render_chart(
            &data,
            &fields(&json),
            ChartKind::GroupedBars,
            &options(),
            &ChartContext::default(),
        )
        .unwrap()
    };
    let entities = |state: &tariff_charts::ChartState| -> Vec<String> {
        let Series::Bars { rows } = &state.series else {
            panic!("expected bars");
        };
        rows.iter().map(|r| r.entity.clone()).collect()
    };

    let desc = render("desc");
    assert_eq!(entities(&desc), vec!["BKW", "EWZ", "SAK", "CKW"]);
    assert_eq!(band_order(&desc).len(), 4);
    let asc = render("asc");
    assert_eq!(entities(&asc), vec!["CKW", "EWZ", "SAK", "BKW"]);
}

#[test]
fn stacked_bars_sort_by_total() {
    let data = vec![
        Observation::new()
            .with("operator", "EWZ")
            .with("energy", 7.0)
            .with("grid", 9.0),
        Observation::new()
            .with("operator", "BKW")
            .with("energy", 6.0)
            .with("grid", -1.0),
        Observation::new()
            .with("operator", "CKW")
            .with("energy", 4.0)
            .with("grid", 6.0),
    ];
    let render = |order: &str| {
        let json = format!(
            r#"{{"x": {{"field": "value"}}, "y": {{"field": "operator", "sortOrder": "{order}"}},
                "segment": {{"field": "component"}},
                "pivot": {{"columns": ["energy", "grid"], "nameField": "component"}}}}"#
        );
        render_chart(
            &data,
            &fields(&json),
            ChartKind::StackedBars,
            &options(),
            &ChartContext::default(),
        )
        .unwrap()
    };
    assert_eq!(band_order(&render("asc")), vec!["BKW", "CKW", "EWZ"]);
    assert_eq!(band_order(&render("desc")), vec!["EWZ", "CKW", "BKW"]);
}

#[test]
fn histogram_bins_every_value_and_lays_out_annotations() {
    let data: Vec<Observation> = (1..=20)
        .map(|i| {
            Observation::new()
                .with("municipality", format!("m{i}"))
                .with("value", i as f64)
        })
        .collect();
    let state = render_chart(
        &data,
        &fields(
            r#"{"x": {"field": "value"}, "label": {"field": "municipality"},
                "annotation": {"field": "municipality", "values": ["m3", "m17"]}}"#,
        ),
        ChartKind::Histogram,
        &options(),
        &ChartContext::default(),
    )
    .unwrap();
    assert_eq!(state.reference_value, Some(10.5));
    let Series::Histogram {
        bins,
        colors,
        annotations,
    } = &state.series
    else {
        panic!("expected a histogram");
    };
    assert_eq!(bins.iter().map(|b| b.count()).sum::<usize>(), 20);
    assert_eq!(colors.len(), bins.len());
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0].text, "m3");

    let info = state.annotation_info(&data[4]).unwrap();
    assert!(info.x_value.contains('–'));
    assert!(info.content.values()[0].value.unwrap() >= 1.0);
}

#[test]
fn configuration_errors_are_reported_once() {
    let ctx = ChartContext::default();
    let err = render_chart(
        &[],
        &fields(r#"{"x": {"field": "value"}, "y": {"field": "operator"}}"#),
        ChartKind::StackedBars,
        &options(),
        &ctx,
    )
    .unwrap_err();
    assert_eq!(
        err,
        FieldsError::MissingChannel {
            kind: ChartKind::StackedBars,
            channel: Channel::Segment
        }
    );

    let err = render_chart(
        &[],
        &fields(r#"{"x": {"field": "year"}, "y": {"field": "value"}, "segment": {"field": "op", "palette": "neon"}}"#),
        ChartKind::Line,
        &options(),
        &ctx,
    )
    .unwrap_err();
    assert_eq!(err, FieldsError::UnknownPalette("neon".into()));

    let err = render_chart(
        &line_data(),
        &line_fields(),
        ChartKind::Line,
        &ChartOptions::new(800.0, f64::NAN),
        &ctx,
    )
    .unwrap_err();
    assert!(matches!(err, FieldsError::InvalidAspectRatio(_)));
}
