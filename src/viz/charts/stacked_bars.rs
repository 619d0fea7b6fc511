//! Horizontal stacked bars: long-format components stacked per category.

use crate::fields::FieldMapping;
use crate::models::Observation;
use crate::viz::accessors::Accessors;
use crate::viz::annotation::{TooltipContent, TooltipDescriptor, TooltipValue};
use crate::viz::axis::{AxisKind, NumericAxis, width_tick_count};
use crate::viz::bars::{StackSegment, StackedBar, stack_diverging, stack_extent};
use crate::viz::bounds::{Margins, compute_band_bounds};
use crate::viz::charts::grouped_bars::BAR_STEP_PX;
use crate::viz::scales::{BandScale, band_domain, extent};
use crate::viz::types::SortOrder;
use crate::viz::{
    AxisScale, ChartContext, ChartKind, ChartOptions, ChartState, Scales, Series, TooltipMode,
    build_color_scale, legend_and_top_margin, tooltip_config,
};

pub(crate) fn build(
    data: &[Observation],
    fields: &FieldMapping,
    acc: Accessors,
    options: &ChartOptions,
    ctx: &ChartContext,
) -> ChartState {
    let color = build_color_scale(data, fields, &acc, &acc.x, ctx);
    let categories = band_domain(data, &acc.y);
    let mut bars = stack_diverging(data, &acc, &categories, &color.domain);
    if let Some(order) = fields.y.as_ref().and_then(|y| y.sort_order) {
        bars.sort_by(|a, b| match order {
            SortOrder::Asc => a.total().total_cmp(&b.total()),
            SortOrder::Desc => b.total().total_cmp(&a.total()),
        });
    }

    let labels: Vec<String> = bars
        .iter()
        .map(|b| ctx.labels.get(&b.category).into_owned())
        .collect();
    let margins = Margins::categorical(labels.iter().map(String::as_str), options.font);
    let (legend, top) = legend_and_top_margin(&color, &acc, options, ctx, margins.left);
    let bounds = compute_band_bounds(
        options.container_width,
        bars.len(),
        BAR_STEP_PX,
        margins.with_top(top),
    );

    let (lo, hi) = stack_extent(&bars);
    let x_extent = extent([lo, hi].into_iter().chain(options.reference_value)).unwrap_or((0.0, 0.0));
    let x_axis = NumericAxis::new(
        AxisKind::Width,
        x_extent,
        [0.0, bounds.chart_width],
        width_tick_count(
            bounds.chart_width,
            x_extent.1,
            fields.tooltip.as_ref().and_then(|t| t.decimals).unwrap_or(2),
            &ctx.locale,
            options.font,
        ),
    );
    let band = BandScale::new(
        bars.iter().map(|b| b.category.clone()).collect(),
        [0.0, bounds.chart_height],
    )
    .padding(0.2, 0.1);

    ChartState {
        kind: ChartKind::StackedBars,
        bounds,
        scales: Scales {
            x: AxisScale::Linear(x_axis),
            y: AxisScale::Band(band),
            color,
            threshold: None,
        },
        accessors: acc,
        series: Series::Stacks { bars },
        legend,
        reference_value: options.reference_value,
        tooltip: tooltip_config(fields, options, ctx, TooltipMode::Multiple),
    }
}

fn bars(state: &ChartState) -> Option<&[StackedBar]> {
    match &state.series {
        Series::Stacks { bars } => Some(bars),
        _ => None,
    }
}

pub(crate) fn annotation_info(state: &ChartState, datum: &Observation) -> Option<TooltipDescriptor> {
    let x = &state.scales.x.as_linear()?.scale;
    let band = state.scales.y.as_band()?;
    let acc = &state.accessors;
    let cfg = &state.tooltip;

    let category = acc.y.key(datum);
    let bar = bars(state)?.iter().find(|b| b.category == category)?;
    let segment_key = acc.segment.key(datum);
    let segment = bar.segments.iter().find(|s| s.segment == segment_key)?;

    let entry = |s: &StackSegment| {
        TooltipValue::new(
            cfg.labels.get(&s.segment),
            Some(s.value),
            state.scales.color.color(&s.segment),
            &cfg.format,
        )
    };
    let (content, x_anchor) = match cfg.mode {
        TooltipMode::Single => (
            TooltipContent::Single(entry(segment)),
            x.scale((segment.start + segment.end) / 2.0),
        ),
        TooltipMode::Multiple => (
            TooltipContent::multiple(bar.segments.iter().map(entry).collect()),
            x.scale(bar.positive_total),
        ),
    };
    Some(TooltipDescriptor::new(
        (x_anchor, band.center(&category)?),
        state.bounds.chart_width,
        cfg.placement_y,
        cfg.labels.get(&category),
        content,
        datum.clone(),
    ))
}

/// Segment under the pointer, or the segment closest to it along the bar.
pub(crate) fn datum_at(state: &ChartState, px: f64, py: f64) -> Option<&Observation> {
    let x = &state.scales.x.as_linear()?.scale;
    let key = state.scales.y.as_band()?.invert(py)?;
    let bar = bars(state)?.iter().find(|b| b.category == key)?;
    let v = x.invert(px);
    let distance = |s: &StackSegment| {
        let (lo, hi) = (s.start.min(s.end), s.start.max(s.end));
        if v < lo {
            lo - v
        } else if v > hi {
            v - hi
        } else {
            0.0
        }
    };
    bar.segments
        .iter()
        .min_by(|a, b| distance(a).total_cmp(&distance(b)))
        .map(|s| &s.observation)
}
