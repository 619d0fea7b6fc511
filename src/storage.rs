use crate::fields::FieldMapping;
use crate::models::{Observation, Scalar};
use crate::viz::util::LabelCatalog;
use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

/// Parse CSV observations. Cells that parse as numbers become numbers; empty cells are
/// left out of the row.
pub fn read_observations_csv<R: Read>(reader: R) -> Result<Vec<Observation>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers().context("reading CSV header")?.clone();
    let mut out = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("reading CSV record {}", line + 1))?;
        let mut obs = Observation::new();
        for (name, cell) in headers.iter().zip(record.iter()) {
            if cell.is_empty() {
                continue;
            }
            let value = match cell.parse::<f64>() {
                Ok(n) if n.is_finite() => Scalar::Number(n),
                _ => Scalar::Text(cell.to_string()),
            };
            obs.insert(name, value);
        }
        out.push(obs);
    }
    Ok(out)
}

/// Load observations from `.csv` or `.json` (an array of flat objects).
pub fn load_observations<P: AsRef<Path>>(path: P) -> Result<Vec<Observation>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv")
        .to_ascii_lowercase();
    let rows = match ext.as_str() {
        "csv" => {
            let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            read_observations_csv(f).with_context(|| format!("parsing {}", path.display()))?
        }
        "json" => {
            let txt = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&txt).with_context(|| format!("parsing {}", path.display()))?
        }
        other => bail!("unsupported data format: {other}"),
    };
    log::debug!("loaded {} observations from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn load_fields<P: AsRef<Path>>(path: P) -> Result<FieldMapping> {
    let path = path.as_ref();
    let txt = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&txt).with_context(|| format!("parsing field mapping {}", path.display()))
}

pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<LabelCatalog> {
    let path = path.as_ref();
    let txt = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&txt).with_context(|| format!("parsing label catalog {}", path.display()))
}

/// Prefix cells that spreadsheet tools would evaluate as formulas.
fn neutralize_formula(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') if cell.parse::<f64>().is_err() => {
            format!("'{cell}")
        }
        _ => cell.to_string(),
    }
}

/// Save observations as CSV. The header is the sorted union of all field names.
pub fn save_observations_csv<P: AsRef<Path>>(rows: &[Observation], path: P) -> Result<()> {
    let path = path.as_ref();
    let headers: BTreeSet<&str> = rows.iter().flat_map(|o| o.fields().map(|(k, _)| k)).collect();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(&headers)?;
    for row in rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| {
                row.get(h)
                    .map(|v| neutralize_formula(&v.as_text()))
                    .unwrap_or_default()
            })
            .collect();
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save any serializable value (observations, chart state) as pretty JSON.
pub fn save_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
