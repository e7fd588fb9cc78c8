use crate::record::{Measurement, Metric};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("No {metric} value for {label} at {threads} threads")]
    Missing {
        label: String,
        threads: u32,
        metric: Metric,
    },
}

/// What to emit for a (source, threads) combination without data
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// emit `0.0`, drawn like a measured zero
    #[default]
    Zero,
    /// emit nothing, drawn as a gap
    Omit,
    /// fail the extraction
    Error,
}

impl fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Zero => "zero",
            Self::Omit => "omit",
            Self::Error => "error",
        })
    }
}

impl FromStr for MissingPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "zero" => Ok(Self::Zero),
            "omit" => Ok(Self::Omit),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown missing-data policy `{other}`, expected zero, omit or error"
            )),
        }
    }
}

/// Values of `metric` for `label`, one per entry of `thread_counts` and in that
/// order. When several rows share a thread count the first one wins.
pub fn extract<'a, R, I>(
    rows: I,
    label: &str,
    thread_counts: &[u32],
    metric: Metric,
    policy: MissingPolicy,
) -> Result<Vec<Option<f64>>, ExtractError>
where
    R: Measurement + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let source_rows = source_rows(rows, label);

    thread_counts
        .iter()
        .map(|&threads| match lookup(&source_rows, threads, metric) {
            Some(value) => Ok(Some(value)),
            None => match policy {
                MissingPolicy::Zero => Ok(Some(0.0)),
                MissingPolicy::Omit => Ok(None),
                MissingPolicy::Error => Err(ExtractError::Missing {
                    label: label.to_string(),
                    threads,
                    metric,
                }),
            },
        })
        .collect()
}

/// [`extract`] with [`MissingPolicy::Zero`]
pub fn zero_filled<'a, R, I>(rows: I, label: &str, thread_counts: &[u32], metric: Metric) -> Vec<f64>
where
    R: Measurement + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let source_rows = source_rows(rows, label);

    thread_counts
        .iter()
        .map(|&threads| lookup(&source_rows, threads, metric).unwrap_or(0.0))
        .collect()
}

fn source_rows<'a, R, I>(rows: I, label: &str) -> Vec<&'a R>
where
    R: Measurement + 'a,
    I: IntoIterator<Item = &'a R>,
{
    rows.into_iter()
        .filter(|row| row.source() == label)
        .sorted_by_key(|row| row.threads())
        .collect_vec()
}

fn lookup<R: Measurement>(rows: &[&R], threads: u32, metric: Metric) -> Option<f64> {
    rows.iter()
        .find(|row| row.threads() == threads)
        .and_then(|row| row.metric(metric))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SummaryRow;
    use std::collections::BTreeMap;

    fn row(source: &str, threads: u32, tps: f64) -> SummaryRow {
        SummaryRow {
            source: source.into(),
            engine: "TidesDB".into(),
            workload: "oltp_read_write".into(),
            threads,
            tps,
            qps: tps * 20.0,
            total_time_s: 10.0,
            latency_p95_ms: 1.0,
            avg_tps: tps / 10.0,
            avg_qps: tps * 2.0,
            extra: BTreeMap::new(),
        }
    }

    fn rows() -> Vec<SummaryRow> {
        vec![
            row("A", 16, 1600.0),
            row("B", 8, 80.0),
            row("A", 1, 100.0),
        ]
    }

    #[test]
    fn zero_fill_in_requested_order() {
        let rows = rows();

        assert_eq!(
            zero_filled(&rows, "A", &[1, 8, 16, 32], Metric::AvgTps),
            vec![10.0, 0.0, 160.0, 0.0]
        );
        assert_eq!(
            zero_filled(&rows, "A", &[32, 16, 1], Metric::Tps),
            vec![0.0, 1600.0, 100.0]
        );
        assert_eq!(
            extract(&rows, "A", &[1, 8, 16, 32], Metric::AvgTps, MissingPolicy::Zero).unwrap(),
            vec![Some(10.0), Some(0.0), Some(160.0), Some(0.0)]
        );
    }

    #[test]
    fn omit_leaves_gaps() {
        let rows = rows();

        assert_eq!(
            extract(&rows, "B", &[1, 8], Metric::Tps, MissingPolicy::Omit).unwrap(),
            vec![None, Some(80.0)]
        );
        assert_eq!(
            extract(&rows, "C", &[1], Metric::Tps, MissingPolicy::Omit).unwrap(),
            vec![None]
        );
    }

    #[test]
    fn error_names_the_gap() {
        let rows = rows();

        assert_eq!(
            extract(&rows, "B", &[8, 16], Metric::Qps, MissingPolicy::Error),
            Err(ExtractError::Missing {
                label: "B".into(),
                threads: 16,
                metric: Metric::Qps,
            })
        );
    }

    #[test]
    fn first_duplicate_wins() {
        let mut rows = rows();
        rows.push(row("A", 1, 999.0));

        assert_eq!(zero_filled(&rows, "A", &[1], Metric::Tps), vec![100.0]);
    }

    #[test]
    fn policy_parsing() {
        assert_eq!("Omit".parse::<MissingPolicy>(), Ok(MissingPolicy::Omit));
        assert_eq!(MissingPolicy::default(), MissingPolicy::Zero);
        assert!("skip".parse::<MissingPolicy>().is_err());
    }
}
