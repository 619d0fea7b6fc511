//! tariff_charts
//!
//! Chart computations for an electricity tariff dashboard: scales, layout, reshaped series
//! and tooltip descriptors, ready to hand to any drawing layer. Pairs with the
//! `tariff-charts` CLI.
//!
//! ### Features
//! - Resolve field mappings into typed accessors and validate them per chart family
//! - Linear, time, band, ordinal and median-threshold scales with nice tick sets
//! - Gap-filled lines, stacked areas, grouped bar roll-ups, stacked bars, histograms
//! - Tooltip placement and geometry, nearest-datum lookup and a small hover dispatcher
//! - Load observations from CSV or JSON and dump chart state as JSON
//!
//! ### Example
//! ```no_run
//! use tariff_charts::{ChartContext, ChartKind, ChartOptions, render_chart};
//!
//! let data = tariff_charts::storage::load_observations("tariffs.csv")?;
//! let fields = tariff_charts::storage::load_fields("fields.json")?;
//! let state = render_chart(
//!     &data,
//!     &fields,
//!     ChartKind::Line,
//!     &ChartOptions::new(800.0, 0.4),
//!     &ChartContext::default(),
//! )?;
//! tariff_charts::storage::save_json(&state, "state.json")?;
//! let stats = tariff_charts::stats::grouped_summary(&data, &state.accessors.segment, &state.accessors.y);
//! println!("{:#?}", stats);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod error;
pub mod fields;
pub mod models;
pub mod stats;
pub mod storage;
pub mod viz;

pub use error::FieldsError;
pub use fields::FieldMapping;
pub use models::{Observation, Scalar};
pub use viz::interaction::{InteractionHandle, InteractionState, MousePosition};
pub use viz::{ChartContext, ChartKind, ChartOptions, ChartState, render_chart};
