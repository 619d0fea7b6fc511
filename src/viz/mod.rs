//! Charting engine: observations + field mapping → scales, layout, series and tooltips.
//!
//! - [`render_chart`] validates the configuration once and builds a [`ChartState`]
//! - Chart families: `Line`, `Area`, `Scatter` (dot plot), `GroupedBars`, `StackedBars`, `Histogram`
//! - Empty input renders an empty state instead of failing
//! - Palettes and label lookups come from an explicit [`ChartContext`]

pub mod accessors;
pub mod annotation;
pub mod axis;
pub mod bars;
pub mod bounds;
pub mod charts;
pub mod grouping;
pub mod histogram;
pub mod interaction;
pub mod legend;
pub mod scales;
pub mod series;
pub mod text;
pub mod types;
pub mod util;

pub use types::{
    ChartKind, DEFAULT_ASPECT_RATIO, EntityKind, Placement, PlacementX, PlacementY, RollupMode,
    SortOrder, TooltipMode,
};

use crate::error::FieldsError;
use crate::fields::FieldMapping;
use crate::models::Observation;
use accessors::{Accessor, Accessors};
use annotation::{TooltipDescriptor, ValueFormat};
use axis::NumericAxis;
use bars::{BarRow, StackedBar};
use bounds::{Bounds, DEFAULT_TOP_MARGIN_PX};
use chrono::NaiveDate;
use histogram::{AnnotationLabel, Bin};
use interaction::MousePosition;
use legend::{LegendItem, estimate_legend_height_px, legend_items};
use scales::{BandScale, OrdinalScale, ThresholdScale, TimeScale, color_scale, sorted_band_domain};
use serde::{Deserialize, Serialize};
use series::{AreaLayer, LineSeries};
use text::FontOptions;
use util::{LabelCatalog, Palettes};

/// Lookups a chart needs from its surroundings, passed explicitly instead of read from globals.
#[derive(Debug, Clone)]
pub struct ChartContext {
    pub palettes: Palettes,
    pub labels: LabelCatalog,
    /// Locale tag for number formatting (`de`, `fr`, `it`, `en`).
    pub locale: String,
}

impl Default for ChartContext {
    fn default() -> Self {
        Self {
            palettes: Palettes::default(),
            labels: LabelCatalog::default(),
            locale: "de".into(),
        }
    }
}

/// Per-render knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartOptions {
    /// Plot height as a fraction of plot width.
    pub aspect_ratio: f64,
    /// Measured container width in px; 0 before the first measurement.
    pub container_width: f64,
    pub vertical_placement: PlacementY,
    /// `None` picks the family default: multiple values for line/area/stacked bars.
    pub tooltip_mode: Option<TooltipMode>,
    pub rollup: RollupMode,
    pub entity_kind: EntityKind,
    /// Collapse a dot plot into a single row (mobile layout).
    pub condensed: bool,
    /// Peer-group value (e.g. a median) drawn as a marker and folded into value domains.
    pub reference_value: Option<f64>,
    pub font: FontOptions,
    pub show_legend: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            container_width: 0.0,
            vertical_placement: PlacementY::Top,
            tooltip_mode: None,
            rollup: RollupMode::Collapsed,
            entity_kind: EntityKind::Municipalities,
            condensed: false,
            reference_value: None,
            font: FontOptions::default(),
            show_legend: true,
        }
    }
}

impl ChartOptions {
    pub fn new(container_width: f64, aspect_ratio: f64) -> Self {
        Self {
            container_width,
            aspect_ratio,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), FieldsError> {
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(FieldsError::InvalidAspectRatio(self.aspect_ratio));
        }
        if !(self.container_width.is_finite() && self.container_width >= 0.0) {
            return Err(FieldsError::InvalidContainerWidth(self.container_width));
        }
        Ok(())
    }
}

/// Calendar axis with its tick dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeAxis {
    pub scale: TimeScale,
    pub ticks: Vec<NaiveDate>,
}

/// A positional scale of one axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AxisScale {
    Linear(NumericAxis),
    Time(TimeAxis),
    Band(BandScale),
}

impl AxisScale {
    pub fn as_linear(&self) -> Option<&NumericAxis> {
        match self {
            AxisScale::Linear(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&TimeAxis> {
        match self {
            AxisScale::Time(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_band(&self) -> Option<&BandScale> {
        match self {
            AxisScale::Band(b) => Some(b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scales {
    pub x: AxisScale,
    pub y: AxisScale,
    pub color: OrdinalScale,
    /// Median-relative value colors (dot plots, histograms).
    pub threshold: Option<ThresholdScale>,
}

/// One dot of a dot plot, positioned in plot coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dot {
    pub band: String,
    pub value: f64,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub highlighted: bool,
    pub observation: Observation,
}

/// Family-specific reshaped data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Series {
    Lines {
        series: Vec<LineSeries>,
    },
    Areas {
        series: Vec<LineSeries>,
        layers: Vec<AreaLayer>,
    },
    Dots {
        dots: Vec<Dot>,
    },
    Bars {
        rows: Vec<BarRow>,
    },
    Stacks {
        bars: Vec<StackedBar>,
    },
    Histogram {
        bins: Vec<Bin>,
        colors: Vec<String>,
        annotations: Vec<AnnotationLabel>,
    },
}

impl Series {
    pub fn is_empty(&self) -> bool {
        match self {
            Series::Lines { series } | Series::Areas { series, .. } => series.is_empty(),
            Series::Dots { dots } => dots.is_empty(),
            Series::Bars { rows } => rows.is_empty(),
            Series::Stacks { bars } => bars.is_empty(),
            Series::Histogram { bins, .. } => bins.is_empty(),
        }
    }
}

/// What tooltips need beyond scales; kept out of the serialized state.
#[derive(Debug, Clone)]
pub(crate) struct TooltipConfig {
    pub mode: TooltipMode,
    pub placement_y: PlacementY,
    pub format: ValueFormat,
    pub labels: LabelCatalog,
    pub entity_kind: EntityKind,
}

/// Everything the presentational layer needs to draw one chart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartState {
    pub kind: ChartKind,
    pub bounds: Bounds,
    pub scales: Scales,
    pub accessors: Accessors,
    pub series: Series,
    pub legend: Vec<LegendItem>,
    pub reference_value: Option<f64>,
    #[serde(skip)]
    pub(crate) tooltip: TooltipConfig,
}

impl ChartState {
    /// No data to draw: the renderer shows its "no data" state.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Tooltip for a datum, `None` when the datum has no position on this chart.
    pub fn annotation_info(&self, datum: &Observation) -> Option<TooltipDescriptor> {
        match self.kind {
            ChartKind::Line | ChartKind::Area => charts::line::annotation_info(self, datum),
            ChartKind::Scatter => charts::scatter::annotation_info(self, datum),
            ChartKind::GroupedBars => charts::grouped_bars::annotation_info(self, datum),
            ChartKind::StackedBars => charts::stacked_bars::annotation_info(self, datum),
            ChartKind::Histogram => charts::histogram::annotation_info(self, datum),
        }
    }

    /// Datum nearest to a pointer position given in container coordinates.
    pub fn datum_at(&self, mouse: MousePosition) -> Option<&Observation> {
        let (px, py) = self.bounds.to_plot(mouse.x, mouse.y);
        match self.kind {
            ChartKind::Line | ChartKind::Area => charts::line::datum_at(self, px, py),
            ChartKind::Scatter => charts::scatter::datum_at(self, px, py),
            ChartKind::GroupedBars => charts::grouped_bars::datum_at(self, px, py),
            ChartKind::StackedBars => charts::stacked_bars::datum_at(self, px, py),
            ChartKind::Histogram => charts::histogram::datum_at(self, px, py),
        }
    }

    /// Datum under the pointer together with its tooltip.
    pub fn hover(&self, mouse: MousePosition) -> Option<TooltipDescriptor> {
        self.datum_at(mouse).and_then(|d| self.annotation_info(d))
    }
}

/// Build the chart state for one render.
///
/// Configuration problems are reported once here. Data problems (empty input, missing cells,
/// unparseable dates) never fail; they shrink the chart down to an empty state.
pub fn render_chart(
    observations: &[Observation],
    fields: &FieldMapping,
    kind: ChartKind,
    options: &ChartOptions,
    ctx: &ChartContext,
) -> Result<ChartState, FieldsError> {
    fields.validate(kind)?;
    options.validate()?;
    if let Some(name) = fields.palette_names().find(|n| !ctx.palettes.contains(n)) {
        return Err(FieldsError::UnknownPalette(name.to_string()));
    }

    let pivoted;
    let data = match &fields.pivot {
        Some(p) => {
            pivoted = series::pivot_longer(observations, &p.columns, &p.name_field, &p.value_field)?;
            pivoted.as_slice()
        }
        None => observations,
    };

    let acc = Accessors::resolve(fields);
    log::debug!("render {kind} chart: {} rows, width {}", data.len(), options.container_width);
    let state = match kind {
        ChartKind::Line => charts::line::build(data, fields, acc, options, ctx, false),
        ChartKind::Area => charts::line::build(data, fields, acc, options, ctx, true),
        ChartKind::Scatter => charts::scatter::build(data, fields, acc, options, ctx),
        ChartKind::GroupedBars => charts::grouped_bars::build(data, fields, acc, options, ctx),
        ChartKind::StackedBars => charts::stacked_bars::build(data, fields, acc, options, ctx),
        ChartKind::Histogram => charts::histogram::build(data, fields, acc, options, ctx),
    };
    Ok(state)
}

/// Color scale for the color channel: explicit mapping first, then palette over distinct values,
/// optionally ordered by `value` when the segment channel asks for it.
pub(crate) fn build_color_scale(
    data: &[Observation],
    fields: &FieldMapping,
    acc: &Accessors,
    value: &Accessor,
    ctx: &ChartContext,
) -> OrdinalScale {
    let (mapping, palette) = match (&fields.color, &fields.segment) {
        (Some(c), _) => (c.color_mapping.as_slice(), c.palette.as_deref()),
        (None, Some(s)) => (s.color_mapping.as_slice(), s.palette.as_deref()),
        (None, None) => (&[][..], None),
    };
    let palette = ctx.palettes.resolve(palette);
    let order = fields.segment.as_ref().and_then(|s| s.sort_order);
    match order {
        Some(order) if mapping.is_empty() => {
            OrdinalScale::new(sorted_band_domain(data, &acc.color, value, order), palette.to_vec())
        }
        _ => color_scale(data, &acc.color, mapping, palette),
    }
}

/// Legend items and the top margin that fits them.
pub(crate) fn legend_and_top_margin(
    color: &OrdinalScale,
    acc: &Accessors,
    options: &ChartOptions,
    ctx: &ChartContext,
    left: u32,
) -> (Vec<LegendItem>, u32) {
    if !options.show_legend || acc.color.is_constant() || color.domain.len() < 2 {
        return (Vec::new(), DEFAULT_TOP_MARGIN_PX);
    }
    let items = legend_items(color, &ctx.labels);
    let labels: Vec<String> = items.iter().map(|i| i.label.clone()).collect();
    let h = estimate_legend_height_px(
        &labels,
        left as i32,
        options.container_width.max(0.0) as i32,
        options.font.size_px,
    );
    (items, DEFAULT_TOP_MARGIN_PX + h.max(0) as u32)
}

pub(crate) fn tooltip_config(
    fields: &FieldMapping,
    options: &ChartOptions,
    ctx: &ChartContext,
    default_mode: TooltipMode,
) -> TooltipConfig {
    let decimals = fields.tooltip.as_ref().and_then(|t| t.decimals).unwrap_or(2);
    let unit = fields.tooltip.as_ref().and_then(|t| t.unit.clone());
    TooltipConfig {
        mode: options.tooltip_mode.unwrap_or(default_mode),
        placement_y: options.vertical_placement,
        format: ValueFormat {
            decimals,
            unit,
            locale: ctx.locale.clone(),
        },
        labels: ctx.labels.clone(),
        entity_kind: options.entity_kind,
    }
}

/// Index of the item in `items` (ascending by `key`) closest to `target`, by binary search.
pub(crate) fn nearest_by<T>(items: &[T], target: f64, key: impl Fn(&T) -> f64) -> Option<usize> {
    if items.is_empty() || !target.is_finite() {
        return None;
    }
    let i = items.partition_point(|t| key(t) < target);
    if i == 0 {
        return Some(0);
    }
    if i == items.len() {
        return Some(items.len() - 1);
    }
    Some(if target - key(&items[i - 1]) <= key(&items[i]) - target {
        i - 1
    } else {
        i
    })
}
