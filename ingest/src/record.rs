use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Numeric columns that can be read from a result row without string lookups
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Tps,
    Qps,
    AvgTps,
    AvgQps,
    LatencyP95Ms,
    TotalTimeS,
    TimeS,
}

impl Metric {
    pub fn column(self) -> &'static str {
        match self {
            Self::Tps => "tps",
            Self::Qps => "qps",
            Self::AvgTps => "avg_tps",
            Self::AvgQps => "avg_qps",
            Self::LatencyP95Ms => "latency_p95_ms",
            Self::TotalTimeS => "total_time_s",
            Self::TimeS => "time_s",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [
            Self::Tps,
            Self::Qps,
            Self::AvgTps,
            Self::AvgQps,
            Self::LatencyP95Ms,
            Self::TotalTimeS,
            Self::TimeS,
        ]
        .into_iter()
        .find(|metric| metric.column() == value)
        .ok_or_else(|| format!("unknown metric column `{value}`"))
    }
}

/// Common view over summary and detail rows
pub trait Measurement {
    fn source(&self) -> &str;
    fn workload(&self) -> &str;
    fn threads(&self) -> u32;
    /// value of a known column, `None` if this row kind doesn't carry it
    fn metric(&self, metric: Metric) -> Option<f64>;
    /// raw value of a column that isn't part of the known schema
    fn extra(&self, column: &str) -> Option<&str>;
}

/// One aggregate measurement per (source, workload, threads)
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub source: String,
    pub engine: String,
    pub workload: String,
    pub threads: u32,
    pub tps: f64,
    pub qps: f64,
    pub total_time_s: f64,
    pub latency_p95_ms: f64,
    /// `tps / total_time_s`
    pub avg_tps: f64,
    /// `qps / total_time_s`
    pub avg_qps: f64,
    pub extra: BTreeMap<String, String>,
}

/// One time-series sample per (source, workload, threads, time_s)
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub source: String,
    pub engine: Option<String>,
    pub workload: String,
    pub threads: u32,
    pub time_s: f64,
    pub tps: f64,
    pub qps: Option<f64>,
    pub latency_p95_ms: Option<f64>,
    pub extra: BTreeMap<String, String>,
}

impl Measurement for SummaryRow {
    fn source(&self) -> &str {
        &self.source
    }

    fn workload(&self) -> &str {
        &self.workload
    }

    fn threads(&self) -> u32 {
        self.threads
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Tps => Some(self.tps),
            Metric::Qps => Some(self.qps),
            Metric::AvgTps => Some(self.avg_tps),
            Metric::AvgQps => Some(self.avg_qps),
            Metric::LatencyP95Ms => Some(self.latency_p95_ms),
            Metric::TotalTimeS => Some(self.total_time_s),
            Metric::TimeS => None,
        }
    }

    fn extra(&self, column: &str) -> Option<&str> {
        self.extra.get(column).map(String::as_str)
    }
}

impl Measurement for DetailRow {
    fn source(&self) -> &str {
        &self.source
    }

    fn workload(&self) -> &str {
        &self.workload
    }

    fn threads(&self) -> u32 {
        self.threads
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Tps => Some(self.tps),
            Metric::TimeS => Some(self.time_s),
            Metric::Qps => self.qps,
            Metric::LatencyP95Ms => self.latency_p95_ms,
            Metric::AvgTps | Metric::AvgQps | Metric::TotalTimeS => None,
        }
    }

    fn extra(&self, column: &str) -> Option<&str> {
        self.extra.get(column).map(String::as_str)
    }
}

// Raw CSV shapes, before labeling and derivation

pub(crate) const SUMMARY_COLUMNS: [&str; 7] = [
    "engine",
    "workload",
    "threads",
    "tps",
    "qps",
    "total_time_s",
    "latency_p95_ms",
];

pub(crate) const DETAIL_REQUIRED: [&str; 5] = ["engine", "workload", "threads", "time_s", "tps"];
pub(crate) const DETAIL_COLUMNS: [&str; 7] = [
    "engine",
    "workload",
    "threads",
    "time_s",
    "tps",
    "qps",
    "latency_p95_ms",
];

#[derive(Debug, Deserialize)]
pub(crate) struct RawSummary {
    pub engine: Option<String>,
    pub workload: String,
    pub threads: u32,
    pub tps: f64,
    pub qps: f64,
    pub total_time_s: f64,
    pub latency_p95_ms: f64,
}

impl RawSummary {
    pub fn into_row(
        self,
        engine: String,
        source: String,
        extra: BTreeMap<String, String>,
    ) -> SummaryRow {
        SummaryRow {
            source,
            engine,
            workload: self.workload,
            threads: self.threads,
            tps: self.tps,
            qps: self.qps,
            total_time_s: self.total_time_s,
            latency_p95_ms: self.latency_p95_ms,
            avg_tps: self.tps / self.total_time_s,
            avg_qps: self.qps / self.total_time_s,
            extra,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDetail {
    pub engine: Option<String>,
    pub workload: String,
    pub threads: u32,
    pub time_s: f64,
    pub tps: f64,
    pub qps: Option<f64>,
    pub latency_p95_ms: Option<f64>,
}

impl RawDetail {
    pub fn into_row(self, source: String, extra: BTreeMap<String, String>) -> DetailRow {
        DetailRow {
            source,
            engine: self.engine,
            workload: self.workload,
            threads: self.threads,
            time_s: self.time_s,
            tps: self.tps,
            qps: self.qps,
            latency_p95_ms: self.latency_p95_ms,
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_round_trip() {
        for name in ["tps", "avg_qps", "latency_p95_ms", "time_s"] {
            assert_eq!(name.parse::<Metric>().unwrap().to_string(), name);
        }
        assert!("p99".parse::<Metric>().is_err());
    }

    #[test]
    fn detail_rows_have_no_averages() {
        let row = RawDetail {
            engine: None,
            workload: "oltp_insert".into(),
            threads: 32,
            time_s: 10.0,
            tps: 1200.0,
            qps: None,
            latency_p95_ms: Some(3.5),
        }
        .into_row("InnoDB (MySQL 9.5.0)".into(), BTreeMap::new());

        assert_eq!(row.metric(Metric::AvgTps), None);
        assert_eq!(row.metric(Metric::Qps), None);
        assert_eq!(row.metric(Metric::LatencyP95Ms), Some(3.5));
        assert_eq!(row.metric(Metric::TimeS), Some(10.0));
    }
}
