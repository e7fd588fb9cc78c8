use super::{
    axis_style, caption_style, legend_style, line_legend, linear_upper, panels, tick_style,
    ChartError, REFERENCE_GRAY,
};
use crate::config::ReportConfig;
use bench_ingest::{SummaryRow, UnifiedTable};
use itertools::Itertools;
use plotters::{
    coord::{combinators::WithKeyPoints, types::RangedCoordf64},
    prelude::*,
};
use std::path::Path;
use tracing::debug;

const TITLE: &str = "Scaling Efficiency (Normalised to 1-Thread Performance)";

/// Average TPS of `label` at every thread count it was measured at, divided by
/// its 1-thread average TPS.
///
/// `None` if the engine has no rows, no 1-thread row or a zero baseline.
pub fn speedup<'a>(
    rows: impl IntoIterator<Item = &'a SummaryRow>,
    label: &str,
) -> Option<Vec<(u32, f64)>> {
    let rows = rows
        .into_iter()
        .filter(|row| row.source == label)
        .sorted_by_key(|row| row.threads)
        .collect_vec();

    let baseline = rows.iter().find(|row| row.threads == 1)?.avg_tps;

    if baseline == 0.0 {
        return None;
    }

    Some(
        rows.iter()
            .map(|row| (row.threads, row.avg_tps / baseline))
            .collect(),
    )
}

/// x axis from zero to `upper` with ticks only at the configured thread counts
fn thread_axis(threads: &[u32], upper: f64) -> WithKeyPoints<RangedCoordf64> {
    (0.0..upper).with_key_points(threads.iter().map(|&threads| threads as f64).collect())
}

pub fn render(
    summary: &UnifiedTable<SummaryRow>,
    config: &ReportConfig,
    path: &Path,
) -> Result<(), ChartError> {
    let root = BitMapBackend::new(path, config.canvas.pixels()).into_drawing_area();
    let panels = panels(&root, TITLE, config)?;

    for (workload, panel) in config.workloads.iter().zip(panels.iter()) {
        let rows = summary.workload(&workload.name);

        let lines = config
            .engines
            .iter()
            .filter_map(|engine| match speedup(rows.iter().copied(), &engine.label) {
                Some(points) => Some((engine, points)),
                None => {
                    debug!(
                        workload = %workload.name,
                        engine = %engine.label,
                        "No 1-thread baseline, skipping scaling line"
                    );
                    None
                }
            })
            .collect_vec();

        let max_threads = config
            .threads
            .iter()
            .copied()
            .chain(lines.iter().flat_map(|(_, points)| points.iter().map(|(threads, _)| *threads)))
            .max()
            .unwrap_or(1);
        let y_upper = linear_upper(
            lines
                .iter()
                .flat_map(|(_, points)| points.iter().map(|(_, speedup)| *speedup))
                .chain(config.threads.iter().map(|&threads| threads as f64)),
            1.1,
        );

        let mut chart = ChartBuilder::on(panel)
            .caption(&workload.label, caption_style(config))
            .margin(config.canvas.font(6.0))
            .x_label_area_size(config.canvas.font(28.0))
            .y_label_area_size(config.canvas.font(34.0))
            .build_cartesian_2d(
                thread_axis(&config.threads, max_threads as f64 * 1.05),
                0.0..y_upper,
            )?;

        chart
            .configure_mesh()
            .x_label_formatter(&|x| format!("{x:.0}"))
            .y_label_formatter(&|y| format!("{y:.0}"))
            .x_desc("Thread Count")
            .y_desc("Speedup (x)")
            .label_style(tick_style(config))
            .axis_desc_style(axis_style(config))
            .light_line_style(BLACK.mix(0.05))
            .bold_line_style(BLACK.mix(0.15))
            .draw()?;

        for (engine, points) in lines.iter() {
            let color = engine.rgb();
            let data = points
                .iter()
                .map(|&(threads, speedup)| (threads as f64, speedup))
                .filter(|(_, speedup)| speedup.is_finite())
                .collect_vec();

            chart
                .draw_series(LineSeries::new(data.clone(), color.stroke_width(3)))?
                .label(engine.label.as_str())
                .legend(line_legend(color.stroke_width(3)));

            chart.draw_series(
                data.into_iter()
                    .map(|point| Circle::new(point, config.canvas.font(3.0), color.filled())),
            )?;
        }

        let ideal = config
            .threads
            .iter()
            .map(|&threads| (threads as f64, threads as f64))
            .collect_vec();
        let ideal_style = REFERENCE_GRAY.mix(0.5).stroke_width(2);

        chart
            .draw_series(DashedLineSeries::new(ideal, 12, 8, ideal_style))?
            .label("Ideal Linear")
            .legend(line_legend(ideal_style));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.9))
            .border_style(BLACK.mix(0.3))
            .label_font(legend_style(config))
            .draw()?;
    }

    root.present()?;

    Ok(())
}
