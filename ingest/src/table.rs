use crate::{
    record::{
        Measurement, RawDetail, RawSummary, DETAIL_COLUMNS, DETAIL_REQUIRED, SUMMARY_COLUMNS,
    },
    resolver::find_latest,
    DetailRow, SummaryRow,
};
use csv::{ReaderBuilder, Trim};
use itertools::Itertools;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

pub const SUMMARY_PREFIX: &str = "summary";
pub const DETAIL_PREFIX: &str = "detail";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("No {prefix} result file found in {}", directory.display())]
    NotFound { directory: PathBuf, prefix: String },
    #[error("{} is missing the required column `{column}`", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("Failed to parse {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// How rows of a run are attributed to an engine/platform combination.
///
/// Written as `{ suffix: ... }` or `{ label: ... }` in config files.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum SourceLabeling {
    /// `"{engine} ({suffix})"`, for runs that cover several engines
    PerEngine { suffix: String },
    /// the same label for every row, for single-engine runs
    Fixed { label: String },
}

impl SourceLabeling {
    pub fn label(&self, engine: Option<&str>) -> Option<String> {
        match self {
            Self::Fixed { label } => Some(label.clone()),
            Self::PerEngine { suffix } => engine
                .filter(|engine| !engine.is_empty())
                .map(|engine| format!("{engine} ({suffix})")),
        }
    }
}

/// One benchmark run directory holding `summary_*.csv` and `detail_*.csv`
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunSource {
    #[serde(alias = "path")]
    pub directory: PathBuf,
    #[serde(alias = "source")]
    pub labeling: SourceLabeling,
}

impl RunSource {
    fn resolve(&self, prefix: &str) -> Result<PathBuf, LoadError> {
        find_latest(&self.directory, prefix).ok_or_else(|| LoadError::NotFound {
            directory: self.directory.clone(),
            prefix: prefix.to_string(),
        })
    }
}

/// Rows of every run concatenated in run order, read-only once built
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedTable<R> {
    rows: Vec<R>,
}

impl<R> UnifiedTable<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R: Measurement> UnifiedTable<R> {
    /// rows of a single workload, in table order
    pub fn workload(&self, workload: &str) -> Vec<&R> {
        self.rows
            .iter()
            .filter(|row| row.workload() == workload)
            .collect_vec()
    }

    /// distinct source labels in the order they first appear
    pub fn sources(&self) -> Vec<&str> {
        self.rows.iter().map(Measurement::source).unique().collect_vec()
    }
}

/// Load the latest summary file of every run into one table.
///
/// Rows without an engine are dropped, `avg_tps` and `avg_qps` are derived per
/// row from the run's own `total_time_s`.
pub fn load_summary(runs: &[RunSource]) -> Result<UnifiedTable<SummaryRow>, LoadError> {
    let mut rows = Vec::new();

    for run in runs {
        let path = run.resolve(SUMMARY_PREFIX)?;
        let records = read_records::<RawSummary>(&path, &SUMMARY_COLUMNS, &SUMMARY_COLUMNS)?;
        let total = records.len();
        let before = rows.len();

        rows.extend(records.into_iter().filter_map(|(raw, extra)| {
            let engine = raw.engine.clone().filter(|engine| !engine.is_empty())?;
            let source = run.labeling.label(Some(engine.as_str()))?;

            Some(raw.into_row(engine, source, extra))
        }));

        let loaded = rows.len() - before;
        if loaded < total {
            debug!(path = ?path, dropped = total - loaded, "Dropped summary rows without engine");
        }
        info!(path = ?path, rows = loaded, "Loaded summary results");
    }

    Ok(UnifiedTable::new(rows))
}

/// Load the latest detail (time-series) file of every run into one table.
pub fn load_detail(runs: &[RunSource]) -> Result<UnifiedTable<DetailRow>, LoadError> {
    let mut rows = Vec::new();

    for run in runs {
        let path = run.resolve(DETAIL_PREFIX)?;
        let records = read_records::<RawDetail>(&path, &DETAIL_REQUIRED, &DETAIL_COLUMNS)?;
        let before = rows.len();

        for (raw, extra) in records {
            match run.labeling.label(raw.engine.as_deref()) {
                Some(source) => rows.push(raw.into_row(source, extra)),
                None => debug!(
                    path = ?path,
                    workload = %raw.workload,
                    time_s = raw.time_s,
                    "Skipped detail row without engine"
                ),
            }
        }

        info!(path = ?path, rows = rows.len() - before, "Loaded detail results");
    }

    Ok(UnifiedTable::new(rows))
}

/// Deserialize every record of `path`, keeping columns outside of `known` as
/// raw strings.
fn read_records<T: DeserializeOwned>(
    path: &Path,
    required: &[&'static str],
    known: &[&str],
) -> Result<Vec<(T, BTreeMap<String, String>)>, LoadError> {
    let csv_error = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(csv_error)?;
    let headers = reader.headers().map_err(csv_error)?.clone();

    if let Some(column) = required
        .iter()
        .copied()
        .find(|column| !headers.iter().any(|header| header == *column))
    {
        return Err(LoadError::MissingColumn {
            path: path.to_path_buf(),
            column,
        });
    }

    let extra_columns = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| !known.contains(header))
        .map(|(index, header)| (index, header.to_string()))
        .collect_vec();

    let mut records = Vec::new();

    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let raw = record.deserialize::<T>(Some(&headers)).map_err(csv_error)?;
        let extra = extra_columns
            .iter()
            .filter_map(|(index, name)| {
                record
                    .get(*index)
                    .map(|value| (name.clone(), value.to_string()))
            })
            .collect();

        records.push((raw, extra));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Metric;
    use std::fs;
    use tempfile::TempDir;

    // small files are still picked up by the resolver's fallback
    fn write_csv(dir: &Path, name: &str, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), body).unwrap();
    }

    fn runs(base: &Path) -> Vec<RunSource> {
        vec![
            RunSource {
                directory: base.join("run1"),
                labeling: SourceLabeling::PerEngine {
                    suffix: "MariaDB 12.2.2".into(),
                },
            },
            RunSource {
                directory: base.join("run2"),
                labeling: SourceLabeling::Fixed {
                    label: "InnoDB (MySQL 9.5.0)".into(),
                },
            },
        ]
    }

    const SUMMARY_HEADER: &str =
        "engine,workload,threads,tps,qps,total_time_s,latency_p95_ms,errors";

    #[test]
    fn summary_labels_and_averages() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir.path().join("run1"),
            "summary_1.csv",
            &format!(
                "{SUMMARY_HEADER}\nTidesDB,oltp_insert,1,6000,12000,60,1.5,0\n\
                 InnoDB,oltp_insert,1,3000,6000,60,2.5,0\n,oltp_insert,8,1,1,1,1,0\n"
            ),
        );
        write_csv(
            &dir.path().join("run2"),
            "summary_1.csv",
            &format!("{SUMMARY_HEADER}\nInnoDB,oltp_insert,1,2400,4800,60,3.25,2\n"),
        );

        let table = load_summary(&runs(dir.path())).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.sources(),
            vec![
                "TidesDB (MariaDB 12.2.2)",
                "InnoDB (MariaDB 12.2.2)",
                "InnoDB (MySQL 9.5.0)"
            ]
        );
        for row in table.rows() {
            assert_eq!(row.avg_tps, row.tps / row.total_time_s);
            assert_eq!(row.avg_qps, row.qps / row.total_time_s);
        }
        assert_eq!(table.rows()[0].avg_tps, 100.0);
        assert_eq!(table.rows()[2].extra("errors"), Some("2"));
        assert_eq!(table.rows()[2].metric(Metric::LatencyP95Ms), Some(3.25));
    }

    #[test]
    fn detail_keeps_engine_less_rows_of_fixed_runs() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir.path().join("run1"),
            "detail_1.csv",
            "engine,workload,threads,time_s,tps\nTidesDB,oltp_insert,32,1,900\n,oltp_insert,32,2,950\n",
        );
        write_csv(
            &dir.path().join("run2"),
            "detail_1.csv",
            "engine,workload,threads,time_s,tps,qps\n,oltp_insert,32,1,800,1600\n",
        );

        let table = load_detail(&runs(dir.path())).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].source, "TidesDB (MariaDB 12.2.2)");
        assert_eq!(table.rows()[1].source, "InnoDB (MySQL 9.5.0)");
        assert_eq!(table.rows()[1].qps, Some(1600.0));
        assert_eq!(table.rows()[0].qps, None);
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir.path().join("run1"),
            "summary_1.csv",
            &format!("{SUMMARY_HEADER}\nTidesDB,oltp_insert,1,6000,12000,60,1.5,0\n"),
        );

        match load_summary(&runs(dir.path())) {
            Err(LoadError::NotFound { directory, prefix }) => {
                assert_eq!(directory, dir.path().join("run2"));
                assert_eq!(prefix, "summary");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir.path().join("run1"),
            "summary_1.csv",
            "engine,workload,threads,tps,qps,latency_p95_ms\nTidesDB,oltp_insert,1,1,1,1\n",
        );

        assert!(matches!(
            load_summary(&runs(dir.path())[..1]),
            Err(LoadError::MissingColumn {
                column: "total_time_s",
                ..
            })
        ));
    }

    #[test]
    fn malformed_value_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir.path().join("run1"),
            "summary_1.csv",
            &format!("{SUMMARY_HEADER}\nTidesDB,oltp_insert,many,1,1,1,1,0\n"),
        );

        assert!(matches!(
            load_summary(&runs(dir.path())[..1]),
            Err(LoadError::Csv { .. })
        ));
    }
}
