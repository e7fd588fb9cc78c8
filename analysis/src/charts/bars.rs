use super::{
    annotation_style, axis_style, caption_style, legend_style, panels, tick_style, Area,
    ChartError,
};
use crate::{
    config::ReportConfig,
    format::{format_axis, format_bar, format_fixed, format_millis},
};
use bench_ingest::{extract, Metric, SummaryRow, UnifiedTable};
use plotters::{
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use std::path::Path;
use tracing::debug;

/// width of a single bar, a thread-count group spans 1.0
const BAR_WIDTH: f64 = 0.25;

/// What a grouped bar figure plots and how it labels it
struct BarFigure {
    title: &'static str,
    metric: Metric,
    y_desc: &'static str,
    tick: fn(f64) -> String,
    annotate: fn(f64) -> String,
}

/// Average TPS per workload, grouped by thread count
pub fn throughput(
    summary: &UnifiedTable<SummaryRow>,
    config: &ReportConfig,
    path: &Path,
) -> Result<(), ChartError> {
    draw(
        summary,
        config,
        path,
        &BarFigure {
            title: "Average TPS by Workload & Thread Count",
            metric: Metric::AvgTps,
            y_desc: "Average TPS",
            tick: format_axis,
            annotate: format_bar,
        },
    )
}

/// P95 latency per workload, grouped by thread count
pub fn latency(
    summary: &UnifiedTable<SummaryRow>,
    config: &ReportConfig,
    path: &Path,
) -> Result<(), ChartError> {
    draw(
        summary,
        config,
        path,
        &BarFigure {
            title: "P95 Latency (ms) by Workload & Thread Count",
            metric: Metric::LatencyP95Ms,
            y_desc: "P95 Latency (ms)",
            tick: format_fixed,
            annotate: format_millis,
        },
    )
}

fn draw(
    summary: &UnifiedTable<SummaryRow>,
    config: &ReportConfig,
    path: &Path,
    figure: &BarFigure,
) -> Result<(), ChartError> {
    let root = BitMapBackend::new(path, config.canvas.pixels()).into_drawing_area();
    let panels = panels(&root, figure.title, config)?;

    for (workload, panel) in config.workloads.iter().zip(panels.iter()) {
        let rows = summary.workload(&workload.name);

        // one value per configured thread count, per engine
        let series = config
            .engines
            .iter()
            .map(|engine| {
                extract(
                    rows.iter().copied(),
                    &engine.label,
                    &config.threads,
                    figure.metric,
                    config.missing,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            workload = %workload.name,
            metric = %figure.metric,
            rows = rows.len(),
            "Drawing bar panel"
        );

        draw_panel(panel, &workload.label, &series, config, figure)?;
    }

    root.present()?;

    Ok(())
}

fn draw_panel(
    panel: &Area,
    caption: &str,
    series: &[Vec<Option<f64>>],
    config: &ReportConfig,
    figure: &BarFigure,
) -> Result<(), ChartError> {
    let groups = config.threads.len();
    let engines = config.engines.len();
    let (low, high) = log_bounds(series.iter().flatten().flatten().copied());

    let thread_label = |x: &f64| {
        let index = x.round();

        if (x - index).abs() < 0.3 && index >= 0.0 {
            config
                .threads
                .get(index as usize)
                .map(u32::to_string)
                .unwrap_or_default()
        } else {
            String::new()
        }
    };
    let value_label = |y: &f64| (figure.tick)(*y);

    let mut chart = ChartBuilder::on(panel)
        .caption(caption, caption_style(config))
        .margin(config.canvas.font(6.0))
        .x_label_area_size(config.canvas.font(28.0))
        .y_label_area_size(config.canvas.font(40.0))
        .build_cartesian_2d(-0.5..(groups as f64 - 0.5), (low..high).log_scale())?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(groups)
        .x_label_formatter(&thread_label)
        .y_label_formatter(&value_label)
        .x_desc("Thread Count")
        .y_desc(figure.y_desc)
        .label_style(tick_style(config))
        .axis_desc_style(axis_style(config))
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.15))
        .draw()?;

    let annotation = annotation_style(config, Pos::new(HPos::Center, VPos::Bottom));

    for (slot, (engine, values)) in config.engines.iter().zip(series).enumerate() {
        let color = engine.rgb();
        let offset = (slot as f64 - (engines as f64 - 1.0) / 2.0) * BAR_WIDTH;

        // zero, missing or non-finite values leave an empty slot and no label
        let bars = values
            .iter()
            .enumerate()
            .filter_map(|(group, value)| {
                value
                    .filter(|value| *value > 0.0 && value.is_finite())
                    .map(|value| (group as f64 + offset, value))
            })
            .collect::<Vec<_>>();

        chart
            .draw_series(bars.iter().map(|&(center, value)| {
                Rectangle::new(
                    [
                        (center - BAR_WIDTH / 2.0, low),
                        (center + BAR_WIDTH / 2.0, value),
                    ],
                    color.filled(),
                )
            }))?
            .label(engine.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 18, y + 6)], color.filled()));

        chart.draw_series(bars.iter().map(|&(center, value)| {
            Text::new((figure.annotate)(value), (center, value), annotation.clone())
        }))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.9))
        .border_style(BLACK.mix(0.3))
        .label_font(legend_style(config))
        .draw()?;

    Ok(())
}

/// Log axis bounds around the positive, finite values with headroom for bar
/// labels and the legend.
fn log_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|value| *value > 0.0 && value.is_finite())
        .fold((f64::MAX, 0.0_f64), |(min, max), value| {
            (min.min(value), max.max(value))
        });

    if max > 0.0 {
        (min / 2.0, max * 8.0)
    } else {
        (1.0, 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_positive_values() {
        assert_eq!(log_bounds([0.0, 50.0, 2000.0].into_iter()), (25.0, 16000.0));
    }

    #[test]
    fn bounds_without_data() {
        assert_eq!(log_bounds([0.0, f64::NAN].into_iter()), (1.0, 10.0));
        assert_eq!(log_bounds(std::iter::empty()), (1.0, 10.0));
    }
}
