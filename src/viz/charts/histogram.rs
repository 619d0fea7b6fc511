//! Histogram of one value channel with median coloring and annotation markers.

use crate::fields::FieldMapping;
use crate::models::Observation;
use crate::stats::channel_median;
use crate::viz::accessors::Accessors;
use crate::viz::annotation::{TooltipContent, TooltipDescriptor, TooltipValue, ValueFormat};
use crate::viz::axis::{AxisKind, NumericAxis, height_tick_count, width_tick_count};
use crate::viz::bounds::{Margins, compute_bounds};
use crate::viz::histogram::{
    Bin, bin_values, group_annotations, label_rows, layout_annotation_labels, max_bin_count,
};
use crate::viz::scales::{ThresholdScale, extent};
use crate::viz::util::{FALLBACK_COLOR, MEDIAN_PALETTE, format_number};
use crate::viz::{
    AxisScale, ChartContext, ChartKind, ChartOptions, ChartState, Scales, Series, TooltipMode,
    build_color_scale, legend_and_top_margin, tooltip_config,
};

/// Vertical space added above the plot per annotation label row.
const LABEL_ROW_PADDING_PX: u32 = 4;

pub(crate) fn build(
    data: &[Observation],
    fields: &FieldMapping,
    acc: Accessors,
    options: &ChartOptions,
    ctx: &ChartContext,
) -> ChartState {
    let bins = bin_values(data, &acc);
    let median = options
        .reference_value
        .or_else(|| channel_median(data, &acc.x));

    let color = build_color_scale(data, fields, &acc, &acc.x, ctx);
    let (legend, legend_top) =
        legend_and_top_margin(&color, &acc, options, ctx, Margins::numeric().left);
    let margins = Margins::numeric().with_top(legend_top);
    let first_pass = compute_bounds(options.container_width, options.aspect_ratio, margins);

    let x_extent = extent(
        bins.iter()
            .flat_map(|b| [b.x0, b.x1])
            .chain(median),
    )
    .unwrap_or((0.0, 0.0));
    let decimals = fields.tooltip.as_ref().and_then(|t| t.decimals).unwrap_or(2);
    let x_count = width_tick_count(
        first_pass.chart_width,
        x_extent.1,
        decimals,
        &ctx.locale,
        options.font,
    );
    let x_axis = NumericAxis::new(
        AxisKind::Width,
        x_extent,
        [0.0, first_pass.chart_width],
        x_count,
    );

    let (field, selected) = match &fields.annotation {
        Some(a) => (Some(a.field.as_str()), a.values.as_slice()),
        None => (None, &[][..]),
    };
    let groups = group_annotations(data, &acc, field, selected, options.entity_kind, &ctx.labels);
    let annotations =
        layout_annotation_labels(&groups, &x_axis.scale, first_pass.chart_width, options.font);

    // Label rows sit between the legend and the plot; the plot width stays the same.
    let rows = label_rows(&annotations) as u32;
    let top = legend_top + rows * (options.font.size_px + LABEL_ROW_PADDING_PX);
    let bounds = compute_bounds(
        options.container_width,
        options.aspect_ratio,
        margins.with_top(top),
    );

    let y_axis = NumericAxis::new(
        AxisKind::Height,
        (0.0, max_bin_count(&bins) as f64),
        [bounds.chart_height, 0.0],
        height_tick_count(bounds.chart_height, options.font),
    );

    let threshold =
        median.map(|m| ThresholdScale::around_median(m, ctx.palettes.resolve(Some(MEDIAN_PALETTE))));
    let colors = bins
        .iter()
        .map(|b| match &threshold {
            Some(t) => t.color((b.x0 + b.x1) / 2.0).to_string(),
            None if acc.color.is_constant() => FALLBACK_COLOR.to_string(),
            None => b
                .rows
                .first()
                .map(|o| color.color(&acc.color.key(o)).to_string())
                .unwrap_or_else(|| FALLBACK_COLOR.to_string()),
        })
        .collect();

    ChartState {
        kind: ChartKind::Histogram,
        bounds,
        scales: Scales {
            x: AxisScale::Linear(x_axis),
            y: AxisScale::Linear(y_axis),
            color,
            threshold,
        },
        accessors: acc,
        series: Series::Histogram {
            bins,
            colors,
            annotations,
        },
        legend,
        reference_value: median,
        tooltip: tooltip_config(fields, options, ctx, TooltipMode::Single),
    }
}

fn bins(state: &ChartState) -> Option<(&[Bin], &[String])> {
    match &state.series {
        Series::Histogram { bins, colors, .. } => Some((bins, colors)),
        _ => None,
    }
}

/// Bin holding `value`; the last bin is closed on the right.
fn bin_index(bins: &[Bin], value: f64) -> Option<usize> {
    let last = bins.len().checked_sub(1)?;
    bins.iter()
        .enumerate()
        .position(|(i, b)| b.contains(value, i == last))
}

/// Tooltips describe the bin a datum falls into: its range and how many rows it holds.
pub(crate) fn annotation_info(state: &ChartState, datum: &Observation) -> Option<TooltipDescriptor> {
    let (all, colors) = bins(state)?;
    let x = &state.scales.x.as_linear()?.scale;
    let y = &state.scales.y.as_linear()?.scale;
    let cfg = &state.tooltip;

    let value = state.accessors.x.number(datum)?;
    let i = bin_index(all, value)?;
    let bin = &all[i];
    let count_format = ValueFormat {
        decimals: 0,
        unit: None,
        locale: cfg.format.locale.clone(),
    };
    let content = TooltipContent::Single(TooltipValue::new(
        cfg.labels.get(cfg.entity_kind.plural_label_id()),
        Some(bin.count() as f64),
        colors.get(i).map(String::as_str).unwrap_or(FALLBACK_COLOR),
        &count_format,
    ));
    let range = format!(
        "{} – {}",
        format_number(bin.x0, cfg.format.decimals, &cfg.format.locale),
        format_number(bin.x1, cfg.format.decimals, &cfg.format.locale),
    );
    Some(TooltipDescriptor::new(
        (x.scale((bin.x0 + bin.x1) / 2.0), y.scale(bin.count() as f64)),
        state.bounds.chart_width,
        cfg.placement_y,
        range,
        content,
        datum.clone(),
    ))
}

pub(crate) fn datum_at(state: &ChartState, px: f64, _py: f64) -> Option<&Observation> {
    let (all, _) = bins(state)?;
    let value = state.scales.x.as_linear()?.scale.invert(px);
    let i = bin_index(all, value)?;
    all[i].rows.first()
}
