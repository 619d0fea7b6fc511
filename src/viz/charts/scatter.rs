//! Dot plot: one row per category, one dot per observation along the value axis.
//!
//! Dots are colored by the color channel when one is configured, otherwise by their
//! distance to the reference median. Tooltips always sit above the dot.

use crate::fields::FieldMapping;
use crate::models::Observation;
use crate::stats::channel_median;
use crate::viz::accessors::Accessors;
use crate::viz::annotation::{TooltipContent, TooltipDescriptor, TooltipValue};
use crate::viz::axis::{AxisKind, NumericAxis, width_tick_count};
use crate::viz::bounds::{Margins, compute_bounds};
use crate::viz::scales::{
    BandScale, PLACEHOLDER_BAND, ThresholdScale, band_domain, numeric_extent_with,
    placeholder_band_domain, sorted_band_domain,
};
use crate::viz::util::MEDIAN_PALETTE;
use crate::viz::{
    AxisScale, ChartContext, ChartKind, ChartOptions, ChartState, Dot, PlacementY, Scales, Series,
    TooltipMode, build_color_scale, legend_and_top_margin, tooltip_config,
};

const BAND_PADDING_INNER: f64 = 0.3;
const BAND_PADDING_OUTER: f64 = 0.1;

pub(crate) fn build(
    data: &[Observation],
    fields: &FieldMapping,
    acc: Accessors,
    options: &ChartOptions,
    ctx: &ChartContext,
) -> ChartState {
    let single_row = options.condensed || acc.y.is_constant();
    let bands = if single_row {
        placeholder_band_domain()
    } else {
        match fields.y.as_ref().and_then(|y| y.sort_order) {
            Some(order) => sorted_band_domain(data, &acc.y, &acc.x, order),
            None => band_domain(data, &acc.y),
        }
    };
    let base_margins = if single_row {
        Margins::numeric()
    } else {
        let labels: Vec<String> = bands.iter().map(|b| ctx.labels.get(b).into_owned()).collect();
        Margins::categorical(labels.iter().map(String::as_str), options.font)
    };

    let color = build_color_scale(data, fields, &acc, &acc.x, ctx);
    let (legend, top) = legend_and_top_margin(&color, &acc, options, ctx, base_margins.left);
    let bounds = compute_bounds(
        options.container_width,
        options.aspect_ratio,
        base_margins.with_top(top),
    );

    let reference = options
        .reference_value
        .or_else(|| channel_median(data, &acc.x));
    let x_extent = numeric_extent_with(data, &acc.x, reference).unwrap_or((0.0, 0.0));
    let decimals = tooltip_decimals(fields);
    let x_axis = NumericAxis::new(
        AxisKind::Width,
        x_extent,
        [0.0, bounds.chart_width],
        width_tick_count(
            bounds.chart_width,
            x_extent.1,
            decimals,
            &ctx.locale,
            options.font,
        ),
    );
    let band = BandScale::new(bands, [0.0, bounds.chart_height])
        .padding(BAND_PADDING_INNER, BAND_PADDING_OUTER);

    let threshold = reference
        .map(|m| ThresholdScale::around_median(m, ctx.palettes.resolve(Some(MEDIAN_PALETTE))));
    let by_threshold = fields.color.is_none() && fields.segment.is_none();

    let mut dots: Vec<Dot> = data
        .iter()
        .filter_map(|o| {
            let value = acc.x.number(o)?;
            let key = if single_row {
                PLACEHOLDER_BAND.to_string()
            } else {
                acc.y.key(o)
            };
            let y = band.center(&key)?;
            let dot_color = match (&threshold, by_threshold) {
                (Some(t), true) => t.color(value),
                _ => color.color(&acc.color.key(o)),
            };
            Some(Dot {
                x: x_axis.scale.scale(value),
                y,
                color: dot_color.to_string(),
                highlighted: acc.is_highlighted(o),
                band: key,
                value,
                observation: o.clone(),
            })
        })
        .collect();
    // Highlighted dots are drawn last so they stay on top.
    dots.sort_by_key(|d| d.highlighted);

    ChartState {
        kind: ChartKind::Scatter,
        bounds,
        scales: Scales {
            x: AxisScale::Linear(x_axis),
            y: AxisScale::Band(band),
            color,
            threshold,
        },
        accessors: acc,
        series: Series::Dots { dots },
        legend,
        reference_value: reference,
        tooltip: tooltip_config(fields, options, ctx, TooltipMode::Single),
    }
}

fn tooltip_decimals(fields: &FieldMapping) -> usize {
    fields.tooltip.as_ref().and_then(|t| t.decimals).unwrap_or(2)
}

fn dots(state: &ChartState) -> Option<&[Dot]> {
    match &state.series {
        Series::Dots { dots } => Some(dots),
        _ => None,
    }
}

pub(crate) fn annotation_info(state: &ChartState, datum: &Observation) -> Option<TooltipDescriptor> {
    let all = dots(state)?;
    let dot = all.iter().find(|d| &d.observation == datum)?;
    let acc = &state.accessors;
    let cfg = &state.tooltip;
    let entry = |d: &Dot| {
        TooltipValue::new(
            cfg.labels.get(&acc.label.key(&d.observation)),
            Some(d.value),
            d.color.as_str(),
            &cfg.format,
        )
    };
    let content = match cfg.mode {
        TooltipMode::Single => TooltipContent::Single(entry(dot)),
        TooltipMode::Multiple => {
            TooltipContent::multiple(all.iter().filter(|d| d.band == dot.band).map(entry).collect())
        }
    };
    let x_value = if dot.band == PLACEHOLDER_BAND {
        String::new()
    } else {
        cfg.labels.get(&dot.band).into_owned()
    };
    Some(TooltipDescriptor::new(
        (dot.x, dot.y),
        state.bounds.chart_width,
        PlacementY::Top,
        x_value,
        content,
        datum.clone(),
    ))
}

pub(crate) fn datum_at(state: &ChartState, px: f64, py: f64) -> Option<&Observation> {
    let band = state.scales.y.as_band()?;
    let key = match band.domain.as_slice() {
        [only] => only.as_str(),
        _ => band.invert(py)?,
    };
    dots(state)?
        .iter()
        .filter(|d| d.band == key)
        .min_by(|a, b| (a.x - px).abs().total_cmp(&(b.x - px).abs()))
        .map(|d| &d.observation)
}
