//! Utility lookups for charts: named palettes, localized labels, number formatting.
//!
//! These replace module-level globals: a [`ChartContext`](super::ChartContext) owns one of
//! each and hands them to the chart builders explicitly.

use ahash::AHashMap;
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Microsoft Office (2013+) chart series palette.
/// Order: Blue, Orange, Gray, Gold, Light Blue, Green, Dark Blue, Dark Orange, Dark Gray, Brownish Gold.
const OFFICE10: [&str; 10] = [
    "#4472C4", "#ED7D31", "#A5A5A5", "#FFC000", "#5B9BD5", "#70AD47", "#264478", "#9E480E",
    "#636363", "#997300",
];

const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Green → red, five steps around a median (well below … well above).
const MEDIAN_THRESHOLDS: [&str; 5] = ["#24B39C", "#A8DC90", "#E7EC83", "#F1B865", "#D64B47"];

pub const DEFAULT_PALETTE: &str = "category10";
pub const MEDIAN_PALETTE: &str = "median-thresholds";

/// Color for values a color scale does not know about.
pub const FALLBACK_COLOR: &str = "#a3a3a3";

/// Named color palettes.
#[derive(Debug, Clone)]
pub struct Palettes {
    named: AHashMap<String, Vec<String>>,
}

impl Default for Palettes {
    fn default() -> Self {
        let mut p = Self {
            named: AHashMap::new(),
        };
        p.insert("office", OFFICE10);
        p.insert(DEFAULT_PALETTE, CATEGORY10);
        p.insert(MEDIAN_PALETTE, MEDIAN_THRESHOLDS);
        p
    }
}

impl Palettes {
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.named.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Register (or replace) a palette.
    pub fn insert<I, S>(&mut self, name: &str, colors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.named
            .insert(name.to_string(), colors.into_iter().map(Into::into).collect());
    }

    /// Palette by name, falling back to the default categorical palette.
    pub fn resolve(&self, name: Option<&str>) -> &[String] {
        name.and_then(|n| self.get(n))
            .or_else(|| self.get(DEFAULT_PALETTE))
            .unwrap_or(&[])
    }
}

/// Localized labels keyed by id. Unknown ids fall back to the id itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelCatalog {
    labels: AHashMap<String, String>,
}

impl LabelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(id.into(), label.into());
    }

    pub fn with(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.insert(id, label);
        self
    }

    pub fn get<'a>(&'a self, id: &'a str) -> Cow<'a, str> {
        match self.labels.get(id) {
            Some(l) => Cow::Borrowed(l.as_str()),
            None => Cow::Borrowed(id),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator char.
///
/// Supported tags (case-insensitive): `de`, `de_CH`, `fr`, `fr_CH`, `it`, `it_CH`, `en`.
/// The dashboard is Swiss, so bare language tags resolve to the Swiss variants. Defaults to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().replace('-', "_").as_str() {
        "de" | "de_ch" | "german" => (&Locale::de_CH, '.'),
        "fr" | "fr_ch" => (&Locale::fr_CH, ','),
        "it" | "it_ch" => (&Locale::it_CH, '.'),
        _ => (&Locale::en, '.'), // default
    }
}

/// Format a value with a fixed number of decimals and the locale's grouping separator.
/// Non-finite values render as an en dash.
pub fn format_number(value: f64, decimals: usize, locale_tag: &str) -> String {
    if !value.is_finite() {
        return "–".to_string();
    }
    let (locale, dec_sep) = map_locale(locale_tag);
    let rounded = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rounded.as_str(), None),
    };
    let grouped = match int_part.parse::<u64>() {
        Ok(n) => n.to_formatted_string(locale),
        Err(_) => int_part.to_string(),
    };
    let negative = value < 0.0 && rounded.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::with_capacity(grouped.len() + decimals + 2);
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(dec_sep);
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_grouping_and_decimals() {
        assert_eq!(format_number(12345.678, 2, "en"), "12,345.68");
        assert_eq!(format_number(-3.5, 1, "en"), "-3.5");
        assert_eq!(format_number(-0.001, 2, "en"), "0.00");
        assert_eq!(format_number(21.0, 0, "fr"), "21");
        assert_eq!(format_number(1.25, 2, "fr"), "1,25");
        assert_eq!(format_number(f64::NAN, 2, "de"), "–");
    }

    #[test]
    fn labels_fall_back_to_id() {
        let cat = LabelCatalog::new().with("municipalities", "Gemeinden");
        assert_eq!(cat.get("municipalities"), "Gemeinden");
        assert_eq!(cat.get("operators"), "operators");
    }

    #[test]
    fn unknown_palette_resolves_to_default() {
        let p = Palettes::default();
        assert_eq!(p.resolve(Some("nope"))[0], "#1f77b4");
        assert_eq!(p.resolve(Some("office"))[0], "#4472C4");
    }
}
