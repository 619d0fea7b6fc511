use crate::models::Observation;
use crate::viz::accessors::Accessor;
use crate::viz::grouping::group_by;
use serde::{Deserialize, Serialize};

/// Summary statistics for a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub key: String,
    pub count: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Median of finite values; `None` for an empty set.
pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut vals: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if vals.is_empty() {
        return None;
    }
    vals.sort_by(f64::total_cmp);
    let n = vals.len();
    Some(if n % 2 == 1 {
        vals[n / 2]
    } else {
        (vals[n / 2 - 1] + vals[n / 2]) / 2.0
    })
}

/// Median of a numeric channel across all rows.
pub fn channel_median(data: &[Observation], value: &Accessor) -> Option<f64> {
    median(data.iter().filter_map(|o| value.number(o)))
}

/// Compute statistics per distinct value of `group`, in first-seen order.
/// Rows without a numeric `value` count as missing.
pub fn grouped_summary(data: &[Observation], group: &Accessor, value: &Accessor) -> Vec<Summary> {
    group_by(data, |o| group.key(o))
        .into_iter()
        .map(|(key, rows)| {
            let mut vals: Vec<f64> = rows.iter().filter_map(|o| value.number(o)).collect();
            let missing = rows.len() - vals.len();
            vals.sort_by(f64::total_cmp);
            let count = vals.len();
            let mean = (count > 0).then(|| vals.iter().sum::<f64>() / count as f64);
            Summary {
                key,
                count,
                missing,
                min: vals.first().copied(),
                max: vals.last().copied(),
                mean,
                median: median(vals.iter().copied()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_even_and_odd_sets() {
        assert_eq!(median([3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median([4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median([f64::NAN]), None);
    }
}
