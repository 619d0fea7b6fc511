//! Legend items and the height of the legend band above the plot.

use super::scales::OrdinalScale;
use super::text::{estimate_text_width_px, wrap_text_to_width};
use super::util::LabelCatalog;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendItem {
    /// Color-domain value the item stands for.
    pub key: String,
    /// Localized label.
    pub label: String,
    pub color: String,
}

/// One item per color-domain value, in domain order.
pub fn legend_items(scale: &OrdinalScale, labels: &LabelCatalog) -> Vec<LegendItem> {
    scale
        .domain
        .iter()
        .map(|key| LegendItem {
            key: key.clone(),
            label: labels.get(key).into_owned(),
            color: scale.color(key).to_string(),
        })
        .collect()
}

const ROW_GAP_PX: i32 = 4;
const RIGHT_PAD_PX: i32 = 6;
const BAND_PAD_PX: i32 = 8;
const MIN_SLOT_PX: i32 = 60;
const MIN_TEXT_PX: i32 = 40;
/// Marker, gap to the text and trailing gap around every item.
const ITEM_CHROME_PX: i32 = 4 + 12 + 12;

/// Width of one item whose text is wrapped to `cap_px`.
fn item_width(label: &str, font_px: u32, cap_px: i32) -> i32 {
    let widest = wrap_text_to_width(label, font_px, cap_px.max(MIN_TEXT_PX) as u32)
        .iter()
        .map(|line| estimate_text_width_px(line, font_px) as i32)
        .max()
        .unwrap_or(0);
    ITEM_CHROME_PX + widest
}

/// Greedy flow of labels into rows no wider than `row_end`.
fn flow_rows<'a>(labels: &'a [String], start_x: i32, row_end: i32, font_px: u32) -> Vec<Vec<&'a str>> {
    let item_cap = ((row_end - start_x) as f32 * 0.35).max(140.0) as i32;
    let fresh_cap = (row_end - start_x - ITEM_CHROME_PX).min(item_cap);
    let mut rows: Vec<Vec<&str>> = vec![Vec::new()];
    let mut x = start_x;
    for label in labels {
        let room = (row_end - x).max(MIN_TEXT_PX) - ITEM_CHROME_PX;
        let mut w = item_width(label, font_px, room.min(item_cap));
        let row_used = rows.last().is_some_and(|r| !r.is_empty());
        if row_used && x + w > row_end {
            rows.push(Vec::new());
            x = start_x;
            w = item_width(label, font_px, fresh_cap);
        }
        x += w;
        if let Some(row) = rows.last_mut() {
            row.push(label);
        }
    }
    rows
}

/// Height in pixels of the legend band above the plot, 0 when there are no labels.
///
/// Rows come from a greedy flow. Columns are as wide as their longest label when that
/// fits the band; otherwise every column gets an equal slot and labels wrap inside it.
/// Each row is as tall as its most-wrapped label.
pub fn estimate_legend_height_px(labels: &[String], start_x: i32, total_w: i32, font_px: u32) -> i32 {
    if labels.is_empty() {
        return 0;
    }
    let row_end = total_w - RIGHT_PAD_PX;
    let rows = flow_rows(labels, start_x, row_end, font_px);
    let columns = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);

    let mut natural = vec![MIN_SLOT_PX; columns];
    for row in &rows {
        for (col, label) in row.iter().enumerate() {
            let w = ITEM_CHROME_PX + estimate_text_width_px(label, font_px) as i32;
            natural[col] = natural[col].max(w);
        }
    }
    let slots = if start_x + natural.iter().sum::<i32>() <= row_end {
        natural
    } else {
        let even = ((row_end - start_x) / columns as i32).max(MIN_SLOT_PX);
        vec![even; columns]
    };

    let line_h = font_px as i32 + 2;
    let row_heights: Vec<i32> = rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&slots)
                .map(|(label, slot)| {
                    let cap = (slot - ITEM_CHROME_PX).max(MIN_TEXT_PX) as u32;
                    wrap_text_to_width(label, font_px, cap).len().max(1) as i32 * line_h
                })
                .max()
                .unwrap_or(line_h)
        })
        .collect();
    let gaps = ROW_GAP_PX * (row_heights.len() as i32 - 1).max(0);
    BAND_PAD_PX + 8 + row_heights.iter().sum::<i32>() + gaps + BAND_PAD_PX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_follow_domain_order() {
        let scale = OrdinalScale::new(
            vec!["energy".into(), "grid".into()],
            vec!["#111111".into(), "#222222".into()],
        );
        let labels = LabelCatalog::new().with("energy", "Energie");
        let items = legend_items(&scale, &labels);
        assert_eq!(items[0].label, "Energie");
        assert_eq!(items[1].label, "grid");
        assert_eq!(items[1].color, "#222222");
    }

    #[test]
    fn more_labels_never_shrink_the_band() {
        let few: Vec<String> = (0..2).map(|i| format!("Operator {i}")).collect();
        let many: Vec<String> = (0..20).map(|i| format!("Operator {i}")).collect();
        let h_few = estimate_legend_height_px(&few, 50, 600, 12);
        let h_many = estimate_legend_height_px(&many, 50, 600, 12);
        assert!(h_few > 0);
        assert!(h_many > h_few);
        assert_eq!(estimate_legend_height_px(&[], 50, 600, 12), 0);
    }

    #[test]
    fn narrow_band_wraps_long_labels() {
        let long = vec!["Elektrizitätswerk der Stadt Zürich und Umgebung".to_string()];
        let wide = estimate_legend_height_px(&long, 0, 2000, 12);
        let narrow = estimate_legend_height_px(&long, 0, 200, 12);
        assert!(narrow > wide);
    }
}
