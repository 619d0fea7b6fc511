use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tariff_charts::viz::accessors::Accessor;
use tariff_charts::viz::{RollupMode, util::LabelCatalog};
use tariff_charts::{ChartContext, ChartKind, ChartOptions, MousePosition, render_chart};
use tariff_charts::{stats, storage};

#[derive(Parser, Debug)]
#[command(
    name = "tariff-charts",
    version,
    about = "Compute chart scales, layouts, series & tooltips for tariff observations"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the chart state for one chart and print it as JSON.
    Render(RenderArgs),
    /// Print grouped summary statistics.
    Stats(StatsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Line,
    Area,
    Scatter,
    GroupedBars,
    StackedBars,
    Histogram,
}

impl From<KindArg> for ChartKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Line => ChartKind::Line,
            KindArg::Area => ChartKind::Area,
            KindArg::Scatter => ChartKind::Scatter,
            KindArg::GroupedBars => ChartKind::GroupedBars,
            KindArg::StackedBars => ChartKind::StackedBars,
            KindArg::Histogram => ChartKind::Histogram,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LocaleArg {
    De,
    Fr,
    It,
    En,
}

impl LocaleArg {
    fn tag(self) -> &'static str {
        match self {
            LocaleArg::De => "de",
            LocaleArg::Fr => "fr",
            LocaleArg::It => "it",
            LocaleArg::En => "en",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RollupArg {
    Collapsed,
    Expanded,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Observations as CSV or JSON (array of objects).
    #[arg(long)]
    data: PathBuf,
    /// Field mapping as JSON.
    #[arg(long)]
    fields: PathBuf,
    /// Chart family.
    #[arg(long, value_enum, default_value = "line")]
    kind: KindArg,
    /// Container width in px.
    #[arg(long, default_value_t = 800.0)]
    width: f64,
    /// Plot height as a fraction of plot width.
    #[arg(long, default_value_t = 0.4)]
    aspect_ratio: f64,
    /// Label catalog as a JSON object of id → label.
    #[arg(long)]
    labels: Option<PathBuf>,
    /// Locale for number formatting.
    #[arg(long, value_enum, default_value = "de")]
    locale: LocaleArg,
    /// Bar roll-up mode for buckets with several members.
    #[arg(long, value_enum, default_value = "collapsed")]
    rollup: RollupArg,
    /// Reference value (e.g. a peer-group median).
    #[arg(long)]
    reference: Option<f64>,
    /// Pointer x in container px; prints the tooltip under the pointer instead of the state.
    #[arg(long, requires = "hover_y")]
    hover_x: Option<f64>,
    /// Pointer y in container px.
    #[arg(long, requires = "hover_x")]
    hover_y: Option<f64>,
    /// Write JSON to this file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Observations as CSV or JSON.
    #[arg(long)]
    data: PathBuf,
    /// Field to group by.
    #[arg(long)]
    group: String,
    /// Numeric field to summarize.
    #[arg(long)]
    value: String,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            // Up to 4 decimals without trailing zeros.
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Stats(args) => cmd_stats(args),
    }
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let data = storage::load_observations(&args.data)?;
    let fields = storage::load_fields(&args.fields)?;
    let labels = match &args.labels {
        Some(path) => storage::load_labels(path)?,
        None => LabelCatalog::new(),
    };
    let ctx = ChartContext {
        labels,
        locale: args.locale.tag().to_string(),
        ..ChartContext::default()
    };
    let mut options = ChartOptions::new(args.width, args.aspect_ratio);
    options.rollup = match args.rollup {
        RollupArg::Collapsed => RollupMode::Collapsed,
        RollupArg::Expanded => RollupMode::Expanded,
    };
    options.reference_value = args.reference;

    let kind = ChartKind::from(args.kind);
    let state = render_chart(&data, &fields, kind, &options, &ctx)
        .with_context(|| format!("invalid configuration for {kind} chart"))?;
    if state.is_empty() {
        eprintln!("No data to draw for {kind} chart");
    }

    let json = match (args.hover_x, args.hover_y) {
        (Some(x), Some(y)) => serde_json::to_value(state.hover(MousePosition::new(x, y)))?,
        _ => serde_json::to_value(&state)?,
    };
    match args.out.as_ref() {
        Some(path) => {
            storage::save_json(&json, path)?;
            eprintln!("Wrote {kind} chart to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&json)?),
    }
    Ok(())
}

fn cmd_stats(args: StatsArgs) -> Result<()> {
    let data = storage::load_observations(&args.data)?;
    let group = Accessor::field(args.group.as_str());
    let value = Accessor::field(args.value.as_str());
    for s in stats::grouped_summary(&data, &group, &value) {
        println!(
            "{}  count={} missing={}  min={} max={} mean={} median={}",
            s.key,
            s.count,
            s.missing,
            fmt_opt(s.min),
            fmt_opt(s.max),
            fmt_opt(s.mean),
            fmt_opt(s.median)
        );
    }
    Ok(())
}
