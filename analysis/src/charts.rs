//! The four comparison figures. Every figure is a 2x2 grid with one panel per
//! workload, written to its own PNG and dropped once presented.

pub mod bars;
pub mod scaling;
pub mod timeline;

use crate::config::{ReportConfig, GRID};
use bench_ingest::{DetailRow, ExtractError, SummaryRow, UnifiedTable};
use plotters::{coord::Shift, prelude::*, style::text_anchor::Pos};
use std::path::PathBuf;
use thiserror::Error;

pub type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub const FONT: &str = "sans-serif";
pub const REFERENCE_GRAY: RGBColor = RGBColor(128, 128, 128);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to draw chart: {0}")]
    Drawing(String),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(error: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Drawing(error.to_string())
    }
}

/// All figures of a report, in generation order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chart {
    Throughput,
    Latency,
    Scaling,
    Timeline,
}

impl Chart {
    pub const ALL: [Chart; 4] = [
        Chart::Throughput,
        Chart::Latency,
        Chart::Scaling,
        Chart::Timeline,
    ];

    /// name used in progress output
    pub fn description(self, config: &ReportConfig) -> String {
        match self {
            Self::Throughput => "TPS comparison".to_string(),
            Self::Latency => "P95 latency comparison".to_string(),
            Self::Scaling => "scaling efficiency".to_string(),
            Self::Timeline => format!("TPS-over-time ({} threads)", config.timeline_threads),
        }
    }

    pub fn file_name(self, config: &ReportConfig) -> String {
        match self {
            Self::Throughput => "tps_comparison.png".to_string(),
            Self::Latency => "p95_latency_comparison.png".to_string(),
            Self::Scaling => "scaling_efficiency.png".to_string(),
            Self::Timeline => config.timeline_file(),
        }
    }

    pub fn render(
        self,
        summary: &UnifiedTable<SummaryRow>,
        detail: &UnifiedTable<DetailRow>,
        config: &ReportConfig,
    ) -> Result<PathBuf, ChartError> {
        let path = config.output.join(self.file_name(config));

        match self {
            Self::Throughput => bars::throughput(summary, config, &path)?,
            Self::Latency => bars::latency(summary, config, &path)?,
            Self::Scaling => scaling::render(summary, config, &path)?,
            Self::Timeline => timeline::render(detail, config, &path)?,
        }

        Ok(path)
    }
}

/// Fill the canvas white, draw the title and the engine line below it and
/// split the remainder into panels.
///
/// `split_evenly` is row-major, so workload `i` lands in row `i / 2`,
/// column `i % 2`.
pub(crate) fn panels<'a>(
    root: &Area<'a>,
    title: &str,
    config: &ReportConfig,
) -> Result<Vec<Area<'a>>, ChartError> {
    let canvas = &config.canvas;

    root.fill(&WHITE)?;

    let body = root
        .titled(
            title,
            (FONT, canvas.font(15.0))
                .into_font()
                .style(FontStyle::Bold)
                .color(&BLACK),
        )?
        .titled(&config.subtitle(), (FONT, canvas.font(12.0)).into_font().color(&BLACK))?;

    let margin = canvas.font(8.0);

    Ok(body.margin(margin, margin, margin, margin).split_evenly(GRID))
}

pub(crate) fn caption_style(config: &ReportConfig) -> TextStyle<'static> {
    (FONT, config.canvas.font(13.0))
        .into_font()
        .style(FontStyle::Bold)
        .color(&BLACK)
}

pub(crate) fn tick_style(config: &ReportConfig) -> TextStyle<'static> {
    (FONT, config.canvas.font(10.0)).into_font().color(&BLACK)
}

pub(crate) fn axis_style(config: &ReportConfig) -> TextStyle<'static> {
    (FONT, config.canvas.font(11.0)).into_font().color(&BLACK)
}

pub(crate) fn legend_style(config: &ReportConfig) -> TextStyle<'static> {
    (FONT, config.canvas.font(9.0)).into_font().color(&BLACK)
}

pub(crate) fn annotation_style(config: &ReportConfig, pos: Pos) -> TextStyle<'static> {
    (FONT, config.canvas.font(7.0))
        .into_font()
        .color(&BLACK)
        .pos(pos)
}

/// legend entry for line series
pub(crate) fn line_legend(style: ShapeStyle) -> impl Fn((i32, i32)) -> PathElement<(i32, i32)> {
    move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style)
}

/// `lower..upper` for a linear axis starting at zero, with headroom above the
/// largest finite value
pub(crate) fn linear_upper(values: impl Iterator<Item = f64>, headroom: f64) -> f64 {
    let max = values
        .filter(|value| value.is_finite())
        .fold(0.0_f64, f64::max);

    if max > 0.0 {
        max * headroom
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_names() {
        let config = ReportConfig::default();
        let names = Chart::ALL.map(|chart| chart.file_name(&config));

        assert_eq!(
            names,
            [
                "tps_comparison.png",
                "p95_latency_comparison.png",
                "scaling_efficiency.png",
                "tps_over_time_32t.png"
            ]
        );
    }

    #[test]
    fn linear_upper_ignores_non_finite() {
        assert_eq!(linear_upper([2.0, f64::INFINITY, 4.0].into_iter(), 1.5), 6.0);
        assert_eq!(linear_upper([f64::NAN].into_iter(), 1.5), 1.0);
    }
}
