use crate::{
    charts::{Chart, ChartError},
    config::{ConfigError, ReportConfig},
};
use bench_ingest::{load_detail, load_summary, LoadError};
use itertools::Itertools;
use rayon::prelude::*;
use std::{fs, io::Write, path::PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Failed to generate {chart}: {source}")]
    Chart {
        chart: String,
        #[source]
        source: ChartError,
    },
    #[error("Failed to create output directory {}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write progress output")]
    Progress(#[from] std::io::Error),
}

/// Load every run and write all figures into `config.output`.
///
/// Progress lines go to `out`. With `parallel` the figures are rendered on the
/// rayon pool and the progress lines are written once all of them are done,
/// still in figure order.
#[instrument(skip_all, fields(output = ?config.output, parallel = parallel))]
pub fn generate<W: Write>(
    config: &ReportConfig,
    parallel: bool,
    out: &mut W,
) -> Result<Vec<PathBuf>, ReportError> {
    if config.preflight_checks() {
        return Err(ConfigError::Preflight.into());
    }

    writeln!(out, "Loading data ...")?;
    out.flush()?;

    let summary = load_summary(&config.runs)?;
    let detail = load_detail(&config.runs)?;

    info!(
        summary = summary.len(),
        detail = detail.len(),
        "Loaded result tables"
    );

    let known = config
        .engines
        .iter()
        .map(|engine| engine.label.as_str())
        .collect_vec();
    for source in summary
        .sources()
        .into_iter()
        .chain(detail.sources())
        .unique()
        .filter(|source| !known.contains(source))
    {
        warn!("Source {source} has no engine entry in the config and won't be drawn");
    }

    fs::create_dir_all(&config.output).map_err(|source| ReportError::OutputDir {
        path: config.output.clone(),
        source,
    })?;

    let chart_error = |chart: Chart| {
        move |source| ReportError::Chart {
            chart: chart.description(config),
            source,
        }
    };

    let mut written = Vec::with_capacity(Chart::ALL.len());

    if parallel {
        let results = Chart::ALL[..]
            .par_iter()
            .map(|chart| chart.render(&summary, &detail, config))
            .collect::<Vec<_>>();

        for (chart, result) in Chart::ALL.into_iter().zip(results) {
            writeln!(out, "Generating {} ...", chart.description(config))?;
            let path = result.map_err(chart_error(chart))?;
            writeln!(out, "  -> {}", path.display())?;
            written.push(path);
        }
    } else {
        for chart in Chart::ALL {
            writeln!(out, "Generating {} ...", chart.description(config))?;
            out.flush()?;

            let path = chart
                .render(&summary, &detail, config)
                .map_err(chart_error(chart))?;
            writeln!(out, "  -> {}", path.display())?;
            written.push(path);
        }
    }

    writeln!(out, "Done - all plots saved to {}", config.output.display())?;

    Ok(written)
}
