//! Per-family state builders. Each module exposes `build`, `annotation_info` and `datum_at`;
//! [`ChartState`](super::ChartState) dispatches to them by chart kind.

pub mod grouped_bars;
pub mod histogram;
pub mod line;
pub mod scatter;
pub mod stacked_bars;
