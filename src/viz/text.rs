//! Text measurement, truncation, and wrapping utilities.
//!
//! There is no font rasterizer behind these functions: widths are a per-character
//! heuristic. Layout code uses them to reserve space for labels, so an estimate that
//! errs slightly wide is preferable to clipping.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontOptions {
    pub size_px: u32,
    pub weight: FontWeight,
}

impl Default for FontOptions {
    fn default() -> Self {
        Self {
            size_px: 12,
            weight: FontWeight::Regular,
        }
    }
}

impl FontOptions {
    pub fn new(size_px: u32) -> Self {
        Self {
            size_px,
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = FontWeight::Bold;
        self
    }
}

fn glyph_width(font_px: u32) -> f32 {
    font_px as f32 * 0.60
}

fn run_width(chars: usize, font_px: u32) -> u32 {
    (chars as f32 * glyph_width(font_px)).ceil() as u32
}

/// Most characters that fit into `max_px`.
fn chars_fitting(font_px: u32, max_px: u32) -> usize {
    if font_px == 0 {
        return usize::MAX;
    }
    let mut n = (max_px as f32 / glyph_width(font_px)).floor() as usize;
    while n > 0 && run_width(n, font_px) > max_px {
        n -= 1;
    }
    n
}

/// Estimated pixel width of `text`. A per-glyph heuristic, not font metrics.
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    run_width(text.chars().count(), font_px)
}

/// Bold glyphs run about 10 % wider.
pub fn estimate_text_width(text: &str, font: FontOptions) -> u32 {
    let base = estimate_text_width_px(text, font.size_px);
    match font.weight {
        FontWeight::Regular => base,
        FontWeight::Bold => ((base as f32) * 1.1).ceil() as u32,
    }
}

/// Width of the widest label in `labels`, 0 for an empty set.
pub fn widest_label_px<'a>(labels: impl IntoIterator<Item = &'a str>, font: FontOptions) -> u32 {
    labels
        .into_iter()
        .map(|l| estimate_text_width(l, font))
        .max()
        .unwrap_or(0)
}

/// Longest prefix of `text` fitting `max_px`, ending in `…` when characters were cut.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let fit = chars_fitting(font_px, max_px);
    if fit < 2 {
        return text.chars().take(fit).collect();
    }
    let mut out: String = text.chars().take(fit - 1).collect();
    out.push('…');
    out
}

/// Greedy word wrap into lines no wider than `max_px`. Words longer than a line are
/// broken between characters.
pub fn wrap_text_to_width(text: &str, font_px: u32, max_px: u32) -> Vec<String> {
    if max_px <= 12 {
        return vec![truncate_to_width(text, font_px, max_px)];
    }
    let cap = chars_fitting(font_px, max_px).max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;
    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > cap {
            if cur_len > 0 {
                lines.push(std::mem::take(&mut cur));
                cur_len = 0;
            }
            lines.push(chars.drain(..cap).collect());
        }
        let joined = if cur_len == 0 { chars.len() } else { cur_len + 1 + chars.len() };
        if joined <= cap {
            if cur_len > 0 {
                cur.push(' ');
            }
            cur.extend(chars);
            cur_len = joined;
        } else {
            lines.push(std::mem::take(&mut cur));
            cur_len = chars.len();
            cur = chars.into_iter().collect();
        }
    }
    if cur_len > 0 {
        lines.push(cur);
    }
    lines
}
