//! Horizontal grouped bars with collapsed/expanded roll-ups.

use crate::fields::FieldMapping;
use crate::models::Observation;
use crate::viz::accessors::Accessors;
use crate::viz::annotation::{TooltipContent, TooltipDescriptor, TooltipValue};
use crate::viz::axis::{AxisKind, NumericAxis, width_tick_count};
use crate::viz::bars::{BarRow, BarRowKind, rollup_bars};
use crate::viz::bounds::{Margins, compute_band_bounds};
use crate::viz::scales::{BandScale, extent};
use crate::viz::types::SortOrder;
use crate::viz::{
    AxisScale, ChartContext, ChartKind, ChartOptions, ChartState, Scales, Series, TooltipMode,
    build_color_scale, legend_and_top_margin, tooltip_config,
};

/// Height of one bar row including padding.
pub const BAR_STEP_PX: f64 = 30.0;

pub(crate) fn build(
    data: &[Observation],
    fields: &FieldMapping,
    acc: Accessors,
    options: &ChartOptions,
    ctx: &ChartContext,
) -> ChartState {
    let mut rows = rollup_bars(data, &acc, options.rollup, options.entity_kind, &ctx.labels);
    if let Some(order) = fields.y.as_ref().and_then(|y| y.sort_order) {
        rows.sort_by(|a, b| match order {
            SortOrder::Asc => a.value.total_cmp(&b.value),
            SortOrder::Desc => b.value.total_cmp(&a.value),
        });
    }

    let margins = Margins::categorical(rows.iter().map(|r| r.label.as_str()), options.font);
    let color = build_color_scale(data, fields, &acc, &acc.x, ctx);
    let (legend, top) = legend_and_top_margin(&color, &acc, options, ctx, margins.left);
    let bounds = compute_band_bounds(
        options.container_width,
        rows.len(),
        BAR_STEP_PX,
        margins.with_top(top),
    );

    let x_extent = extent(
        rows.iter()
            .map(|r| r.value)
            .chain([0.0])
            .chain(options.reference_value),
    )
    .unwrap_or((0.0, 0.0));
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
        rows.iter().map(|r| r.band.clone()).collect(),
        [0.0, bounds.chart_height],
    )
    .padding(0.2, 0.1);

    ChartState {
        kind: ChartKind::GroupedBars,
        bounds,
        scales: Scales {
            x: AxisScale::Linear(x_axis),
            y: AxisScale::Band(band),
            color,
            threshold: None,
        },
        accessors: acc,
        series: Series::Bars { rows },
        legend,
        reference_value: options.reference_value,
        tooltip: tooltip_config(fields, options, ctx, TooltipMode::Single),
    }
}

fn rows(state: &ChartState) -> Option<&[BarRow]> {
    match &state.series {
        Series::Bars { rows } => Some(rows),
        _ => None,
    }
}

pub(crate) fn annotation_info(state: &ChartState, datum: &Observation) -> Option<TooltipDescriptor> {
    let all = rows(state)?;
    let x = &state.scales.x.as_linear()?.scale;
    let band = state.scales.y.as_band()?;
    let acc = &state.accessors;
    let cfg = &state.tooltip;

    let row = all.iter().find(|r| &r.observation == datum)?;
    let entry = |r: &BarRow, label: &str| {
        let color = state.scales.color.color(&acc.color.key(&r.observation));
        TooltipValue::new(label, Some(r.value), color, &cfg.format)
    };
    let content = match cfg.mode {
        TooltipMode::Single => TooltipContent::Single(entry(row, row.label.as_str())),
        // Every period of the same entity, one line each.
        TooltipMode::Multiple => TooltipContent::multiple(
            all.iter()
                .filter(|r| r.entity == row.entity && r.kind != BarRowKind::Member)
                .map(|r| entry(r, &*cfg.labels.get(&r.period)))
                .collect(),
        ),
    };
    Some(TooltipDescriptor::new(
        (x.scale(row.value), band.center(&row.band)?),
        state.bounds.chart_width,
        cfg.placement_y,
        cfg.labels.get(&row.entity),
        content,
        datum.clone(),
    ))
}

pub(crate) fn datum_at(state: &ChartState, _px: f64, py: f64) -> Option<&Observation> {
    let key = state.scales.y.as_band()?.invert(py)?;
    rows(state)?
        .iter()
        .find(|r| r.band == key)
        .map(|r| &r.observation)
}
