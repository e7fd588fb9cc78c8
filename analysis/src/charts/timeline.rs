use super::{
    axis_style, caption_style, legend_style, line_legend, linear_upper, panels, tick_style,
    ChartError,
};
use crate::{config::ReportConfig, format::format_axis};
use bench_ingest::{DetailRow, UnifiedTable};
use itertools::Itertools;
use plotters::prelude::*;
use std::path::Path;

/// `(time_s, tps)` samples of `label`, ordered by time
pub fn time_series<'a>(
    rows: impl IntoIterator<Item = &'a DetailRow>,
    label: &str,
) -> Vec<(f64, f64)> {
    rows.into_iter()
        .filter(|row| row.source == label)
        .map(|row| (row.time_s, row.tps))
        .filter(|(time, tps)| time.is_finite() && tps.is_finite())
        .sorted_by(|(a, _), (b, _)| a.total_cmp(b))
        .collect_vec()
}

/// TPS over time at the configured timeline thread count
pub fn render(
    detail: &UnifiedTable<DetailRow>,
    config: &ReportConfig,
    path: &Path,
) -> Result<(), ChartError> {
    let title = format!("TPS Over Time ({} Threads)", config.timeline_threads);
    let root = BitMapBackend::new(path, config.canvas.pixels()).into_drawing_area();
    let panels = panels(&root, &title, config)?;

    for (workload, panel) in config.workloads.iter().zip(panels.iter()) {
        let rows = detail
            .workload(&workload.name)
            .into_iter()
            .filter(|row| row.threads == config.timeline_threads)
            .collect_vec();

        // engines without samples are left out of the panel and its legend
        let lines = config
            .engines
            .iter()
            .map(|engine| (engine, time_series(rows.iter().copied(), &engine.label)))
            .filter(|(_, points)| !points.is_empty())
            .collect_vec();

        let x_upper = linear_upper(
            lines.iter().flat_map(|(_, points)| points.iter().map(|(time, _)| *time)),
            1.02,
        );
        let y_upper = linear_upper(
            lines.iter().flat_map(|(_, points)| points.iter().map(|(_, tps)| *tps)),
            1.1,
        );

        let tps_label = |y: &f64| format_axis(*y);

        let mut chart = ChartBuilder::on(panel)
            .caption(&workload.label, caption_style(config))
            .margin(config.canvas.font(6.0))
            .x_label_area_size(config.canvas.font(28.0))
            .y_label_area_size(config.canvas.font(40.0))
            .build_cartesian_2d(0.0..x_upper, 0.0..y_upper)?;

        chart
            .configure_mesh()
            .x_label_formatter(&|x| format!("{x:.0}"))
            .y_label_formatter(&tps_label)
            .x_desc("Time (s)")
            .y_desc("TPS")
            .label_style(tick_style(config))
            .axis_desc_style(axis_style(config))
            .light_line_style(BLACK.mix(0.05))
            .bold_line_style(BLACK.mix(0.15))
            .draw()?;

        for (engine, points) in lines {
            let style = engine.rgb().mix(0.85).stroke_width(2);

            chart
                .draw_series(LineSeries::new(points, style))?
                .label(engine.label.as_str())
                .legend(line_legend(style));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.9))
            .border_style(BLACK.mix(0.3))
            .label_font(legend_style(config))
            .draw()?;
    }

    root.present()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample(source: &str, time_s: f64, tps: f64) -> DetailRow {
        DetailRow {
            source: source.into(),
            engine: None,
            workload: "oltp_write_only".into(),
            threads: 32,
            time_s,
            tps,
            qps: None,
            latency_p95_ms: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn samples_are_ordered_by_time() {
        let rows = vec![
            sample("A", 3.0, 30.0),
            sample("B", 1.0, 5.0),
            sample("A", 1.0, 10.0),
            sample("A", 2.0, f64::NAN),
        ];

        assert_eq!(time_series(&rows, "A"), vec![(1.0, 10.0), (3.0, 30.0)]);
        assert!(time_series(&rows, "C").is_empty());
    }
}
