//! Declarative field-mapping configuration: which observation field feeds which
//! visual channel, plus channel-specific options.
//!
//! A mapping is deserialized once per chart (camelCase JSON, the same shape the
//! dashboard uses) and validated against the chart family at construction time.
//!
//! ```
//! use tariff_charts::fields::FieldMapping;
//! use tariff_charts::viz::ChartKind;
//!
//! let fields: FieldMapping = serde_json::from_str(r#"{
//!     "x": { "field": "year" },
//!     "y": { "field": "value", "axisLabel": "Rp./kWh" },
//!     "segment": { "field": "operator", "palette": "category10" }
//! }"#)?;
//! fields.validate(ChartKind::Line)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::FieldsError;
use crate::viz::types::SortOrder;
use crate::viz::ChartKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("static regex")
});

/// Visual channels an observation field can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    X,
    Y,
    Segment,
    Color,
    Tooltip,
    Label,
    Style,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Segment => "segment",
            Channel::Color => "color",
            Channel::Tooltip => "tooltip",
            Channel::Label => "label",
            Channel::Style => "style",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisField {
    pub field: String,
    #[serde(default)]
    pub axis_label: Option<String>,
    /// Only meaningful for categorical axes: order bands by value instead of first-seen.
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

/// Explicit value → color binding; order defines the color domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMapping {
    pub value: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentField {
    pub field: String,
    #[serde(default)]
    pub palette: Option<String>,
    #[serde(default)]
    pub color_mapping: Vec<ColorMapping>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorField {
    pub field: String,
    #[serde(default)]
    pub palette: Option<String>,
    #[serde(default)]
    pub color_mapping: Vec<ColorMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelField {
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipField {
    /// Field supplying the label of a tooltip entry.
    pub field: String,
    #[serde(default)]
    pub decimals: Option<usize>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleField {
    /// Field identifying the entity a row belongs to (operator id, municipality id).
    pub entity: String,
    /// Entity id to emphasize.
    #[serde(default)]
    pub highlight_value: Option<String>,
}

/// Entities to call out with histogram annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationField {
    pub field: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Wide columns to reshape into long format before building series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotField {
    pub columns: Vec<String>,
    #[serde(default = "default_name_field")]
    pub name_field: String,
    #[serde(default = "default_value_field")]
    pub value_field: String,
}

fn default_name_field() -> String {
    "name".into()
}

fn default_value_field() -> String {
    "value".into()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldMapping {
    pub x: Option<AxisField>,
    pub y: Option<AxisField>,
    pub segment: Option<SegmentField>,
    pub color: Option<ColorField>,
    pub tooltip: Option<TooltipField>,
    pub label: Option<LabelField>,
    pub style: Option<StyleField>,
    pub annotation: Option<AnnotationField>,
    pub pivot: Option<PivotField>,
}

impl FieldMapping {
    /// Channels a chart family cannot do without.
    pub fn required_channels(kind: ChartKind) -> &'static [Channel] {
        match kind {
            ChartKind::Line | ChartKind::Area => &[Channel::X, Channel::Y],
            ChartKind::Scatter | ChartKind::Histogram => &[Channel::X],
            ChartKind::GroupedBars => &[Channel::X, Channel::Y],
            ChartKind::StackedBars => &[Channel::X, Channel::Y, Channel::Segment],
        }
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        match channel {
            Channel::X => self.x.is_some(),
            Channel::Y => self.y.is_some(),
            Channel::Segment => self.segment.is_some(),
            Channel::Color => self.color.is_some(),
            Channel::Tooltip => self.tooltip.is_some(),
            Channel::Label => self.label.is_some(),
            Channel::Style => self.style.is_some(),
        }
    }

    /// Check the mapping against a chart family.
    ///
    /// Palette names are checked separately by the chart context, which owns the palettes.
    pub fn validate(&self, kind: ChartKind) -> Result<(), FieldsError> {
        for &channel in Self::required_channels(kind) {
            if !self.has_channel(channel) {
                return Err(FieldsError::MissingChannel { kind, channel });
            }
        }
        let mappings = self
            .segment
            .iter()
            .flat_map(|s| s.color_mapping.iter())
            .chain(self.color.iter().flat_map(|c| c.color_mapping.iter()));
        for m in mappings {
            if !HEX_COLOR.is_match(m.color.trim()) {
                return Err(FieldsError::InvalidColor {
                    value: m.value.clone(),
                    color: m.color.clone(),
                });
            }
        }
        if let Some(pivot) = &self.pivot {
            if pivot.columns.is_empty() {
                return Err(FieldsError::EmptyPivot);
            }
        }
        Ok(())
    }

    /// Palette names referenced by any channel.
    pub fn palette_names(&self) -> impl Iterator<Item = &str> {
        self.segment
            .iter()
            .filter_map(|s| s.palette.as_deref())
            .chain(self.color.iter().filter_map(|c| c.palette.as_deref()))
    }
}
