//! Field accessor resolution: turn a [`FieldMapping`] into typed extraction
//! functions that read one channel off an observation row.
//!
//! Accessors are plain values. Two accessors resolved from equal mappings compare
//! equal and hash identically, so they can key memoized computations.

use crate::fields::{Channel, FieldMapping};
use crate::models::{Observation, Scalar};
use chrono::NaiveDate;
use serde::Serialize;
use std::borrow::Cow;

/// Fallback value of the segment channel when no segment field is configured.
pub const DEFAULT_SEGMENT: &str = "segment";

/// Reads one channel off an observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Accessor {
    /// Read the named field.
    Field(String),
    /// Same value for every row (channel not configured).
    Constant(String),
}

impl Accessor {
    pub fn field(name: impl Into<String>) -> Self {
        Accessor::Field(name.into())
    }

    pub fn constant(value: impl Into<String>) -> Self {
        Accessor::Constant(value.into())
    }

    /// Field name, `None` for constants.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Accessor::Field(f) => Some(f),
            Accessor::Constant(_) => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Accessor::Constant(_))
    }

    /// Raw cell. `None` when the row lacks the field.
    pub fn scalar<'a>(&self, obs: &'a Observation) -> Option<Cow<'a, Scalar>> {
        match self {
            Accessor::Field(f) => obs.get(f).map(Cow::Borrowed),
            Accessor::Constant(c) => Some(Cow::Owned(Scalar::Text(c.clone()))),
        }
    }

    /// Numeric value; missing, non-numeric and non-finite cells are `None`.
    pub fn number(&self, obs: &Observation) -> Option<f64> {
        match self {
            Accessor::Field(f) => obs.number(f),
            Accessor::Constant(c) => c.parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    pub fn text<'a>(&'a self, obs: &'a Observation) -> Option<Cow<'a, str>> {
        match self {
            Accessor::Field(f) => obs.text(f),
            Accessor::Constant(c) => Some(Cow::Borrowed(c.as_str())),
        }
    }

    /// Text value with an empty string for missing cells; used for grouping keys.
    pub fn key(&self, obs: &Observation) -> String {
        self.text(obs).map(Cow::into_owned).unwrap_or_default()
    }

    pub fn date(&self, obs: &Observation) -> Option<NaiveDate> {
        match self {
            Accessor::Field(f) => obs.get(f).and_then(Scalar::as_date),
            Accessor::Constant(c) => crate::models::parse_date(c),
        }
    }
}

/// All accessors one chart needs, resolved once per render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Accessors {
    pub x: Accessor,
    pub y: Accessor,
    pub segment: Accessor,
    pub color: Accessor,
    pub label: Accessor,
    pub tooltip: Accessor,
    pub entity: Accessor,
    pub highlight: Option<String>,
}

impl Accessors {
    pub fn resolve(fields: &FieldMapping) -> Self {
        let highlight = fields.style.as_ref().and_then(|s| s.highlight_value.clone());
        Self {
            x: resolve(fields, Channel::X),
            y: resolve(fields, Channel::Y),
            segment: resolve(fields, Channel::Segment),
            color: resolve(fields, Channel::Color),
            label: resolve(fields, Channel::Label),
            tooltip: resolve(fields, Channel::Tooltip),
            entity: resolve(fields, Channel::Style),
            highlight,
        }
    }

    /// Whether the row belongs to the highlighted entity.
    pub fn is_highlighted(&self, obs: &Observation) -> bool {
        match &self.highlight {
            Some(h) => self.entity.text(obs).is_some_and(|e| e == h.as_str()),
            None => false,
        }
    }
}

/// Accessor for one channel.
///
/// Unconfigured channels never fail: segment falls back to the literal
/// [`DEFAULT_SEGMENT`], color follows segment, label follows segment, tooltip follows label,
/// and style (entity) follows label. Missing x/y resolve to empty constants, which read as
/// missing numbers.
pub fn resolve(fields: &FieldMapping, channel: Channel) -> Accessor {
    match channel {
        Channel::X => fields
            .x
            .as_ref()
            .map(|a| Accessor::field(&a.field))
            .unwrap_or_else(|| Accessor::constant("")),
        Channel::Y => fields
            .y
            .as_ref()
            .map(|a| Accessor::field(&a.field))
            .unwrap_or_else(|| Accessor::constant("")),
        Channel::Segment => fields
            .segment
            .as_ref()
            .map(|s| Accessor::field(&s.field))
            .unwrap_or_else(|| Accessor::constant(DEFAULT_SEGMENT)),
        Channel::Color => match &fields.color {
            Some(c) => Accessor::field(&c.field),
            None => resolve(fields, Channel::Segment),
        },
        Channel::Label => match &fields.label {
            Some(l) => Accessor::field(&l.field),
            None => resolve(fields, Channel::Segment),
        },
        Channel::Tooltip => match &fields.tooltip {
            Some(t) => Accessor::field(&t.field),
            None => resolve(fields, Channel::Label),
        },
        Channel::Style => match &fields.style {
            Some(s) => Accessor::field(&s.entity),
            None => resolve(fields, Channel::Label),
        },
    }
}
