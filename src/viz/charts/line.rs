//! Line and stacked-area charts over time.

use chrono::{Datelike, NaiveDate};
use crate::fields::FieldMapping;
use crate::models::Observation;
use crate::viz::accessors::Accessors;
use crate::viz::annotation::{TooltipContent, TooltipDescriptor, TooltipValue, mean_anchor};
use crate::viz::axis::{AxisKind, NumericAxis, TICK_LABEL_GAP_PX, height_tick_count, tick_count};
use crate::viz::bounds::{Margins, NUMERIC_LEFT_MARGIN_PX, compute_bounds};
use crate::viz::scales::{TimeScale, extent, numeric_extent_with, time_extent};
use crate::viz::series::{LineSeries, gap_filled_series, stack_areas};
use crate::viz::text::estimate_text_width;
use crate::viz::{
    AxisScale, ChartContext, ChartKind, ChartOptions, ChartState, Scales, Series, TimeAxis,
    TooltipMode, build_color_scale, legend_and_top_margin, nearest_by, tooltip_config,
};

pub(crate) fn build(
    data: &[Observation],
    fields: &FieldMapping,
    acc: Accessors,
    options: &ChartOptions,
    ctx: &ChartContext,
    stacked: bool,
) -> ChartState {
    let series = gap_filled_series(data, &acc);
    let color = build_color_scale(data, fields, &acc, &acc.y, ctx);
    let (legend, top) = legend_and_top_margin(&color, &acc, options, ctx, NUMERIC_LEFT_MARGIN_PX);
    let bounds = compute_bounds(
        options.container_width,
        options.aspect_ratio,
        Margins::numeric().with_top(top),
    );

    let (d0, d1) = time_extent(data, &acc.x).unwrap_or_default();
    let time = TimeScale::new([d0, d1], [0.0, bounds.chart_width]);
    let year_px = estimate_text_width("0000", options.font) as f64 + TICK_LABEL_GAP_PX;
    let x_ticks = time.year_ticks(tick_count(bounds.chart_width, year_px, AxisKind::Width));

    let layers = stacked.then(|| stack_areas(&series));
    let y_extent = match &layers {
        Some(layers) => extent(
            layers
                .iter()
                .flat_map(|l| l.points.iter().flat_map(|p| [p.1, p.2]))
                .chain(options.reference_value),
        ),
        None => numeric_extent_with(data, &acc.y, options.reference_value),
    }
    .unwrap_or((0.0, 0.0));
    let y_axis = NumericAxis::new(
        AxisKind::Height,
        y_extent,
        [bounds.chart_height, 0.0],
        height_tick_count(bounds.chart_height, options.font),
    );

    let series = match layers {
        Some(layers) => Series::Areas { series, layers },
        None => Series::Lines { series },
    };
    ChartState {
        kind: if stacked { ChartKind::Area } else { ChartKind::Line },
        bounds,
        scales: Scales {
            x: AxisScale::Time(TimeAxis {
                scale: time,
                ticks: x_ticks,
            }),
            y: AxisScale::Linear(y_axis),
            color,
            threshold: None,
        },
        accessors: acc,
        series,
        legend,
        reference_value: options.reference_value,
        tooltip: tooltip_config(fields, options, ctx, TooltipMode::Multiple),
    }
}

fn series_of(state: &ChartState) -> Option<&[LineSeries]> {
    match &state.series {
        Series::Lines { series } | Series::Areas { series, .. } => Some(series),
        _ => None,
    }
}

/// Height a point is drawn at: its value, or the top of its layer for stacked areas.
fn plotted(state: &ChartState, si: usize, pi: usize) -> Option<f64> {
    match &state.series {
        Series::Lines { series } => series.get(si)?.points.get(pi)?.y,
        Series::Areas { series, layers } => {
            series.get(si)?.points.get(pi)?.y?;
            Some(layers.get(si)?.points.get(pi)?.2)
        }
        _ => None,
    }
}

pub(crate) fn annotation_info(state: &ChartState, datum: &Observation) -> Option<TooltipDescriptor> {
    let time = state.scales.x.as_time()?;
    let y = &state.scales.y.as_linear()?.scale;
    let all = series_of(state)?;
    let acc = &state.accessors;
    let cfg = &state.tooltip;

    let date = acc.x.date(datum)?;
    let x_anchor = time.scale.scale(date);
    let value_at = |si: usize, s: &LineSeries| -> Option<(TooltipValue, Option<f64>)> {
        let pi = s.points.binary_search_by_key(&date, |p| p.x).ok()?;
        let p = &s.points[pi];
        let color = state.scales.color.color(&acc.color.key(&p.observation));
        let value = TooltipValue::new(cfg.labels.get(&s.key), p.y, color, &cfg.format);
        Some((value, plotted(state, si, pi).map(|v| y.scale(v))))
    };

    let (content, y_anchor) = match cfg.mode {
        TooltipMode::Single => {
            let key = acc.segment.key(datum);
            let si = all.iter().position(|s| s.key == key)?;
            let (value, y_px) = value_at(si, &all[si])?;
            (TooltipContent::Single(value), y_px)
        }
        TooltipMode::Multiple => {
            let (values, ys): (Vec<TooltipValue>, Vec<Option<f64>>) = all
                .iter()
                .enumerate()
                .filter_map(|(si, s)| value_at(si, s))
                .filter(|(v, _)| v.value.is_some())
                .unzip();
            let y_px = mean_anchor(ys.into_iter().flatten());
            (TooltipContent::multiple(values), y_px)
        }
    };

    Some(TooltipDescriptor::new(
        (x_anchor, y_anchor.unwrap_or(state.bounds.chart_height)),
        state.bounds.chart_width,
        cfg.placement_y,
        acc.x.key(datum),
        content,
        datum.clone(),
    ))
}

/// Bisect the shared x positions, then pick the series drawn closest to the pointer.
pub(crate) fn datum_at(state: &ChartState, px: f64, py: f64) -> Option<&Observation> {
    if !px.is_finite() {
        return None;
    }
    let time = state.scales.x.as_time()?;
    let y = &state.scales.y.as_linear()?.scale;
    let all = series_of(state)?;
    let first = all.first()?;
    let day = |d: NaiveDate| d.num_days_from_ce() as f64;
    let pi = nearest_by(&first.points, day(time.scale.invert(px)), |p| day(p.x))?;

    let closest = all
        .iter()
        .enumerate()
        .filter_map(|(si, _)| plotted(state, si, pi).map(|v| (si, (y.scale(v) - py).abs())))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(si, _)| si)
        .unwrap_or(0);
    all.get(closest)?.points.get(pi).map(|p| &p.observation)
}
