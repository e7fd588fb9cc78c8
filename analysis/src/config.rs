use bench_ingest::{MissingPolicy, RunSource, SourceLabeling};
use itertools::Itertools;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{error, warn};

/// Panels per figure, laid out as a 2x2 grid
pub const GRID: (usize, usize) = (2, 2);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config failed preflight checks")]
    Preflight,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    // benchmark runs in concatenation order
    pub runs: Vec<RunSource>,
    // directory receiving the PNG files
    pub output: PathBuf,
    // panel order, at most one figure grid worth
    pub workloads: Vec<WorkloadEntry>,
    // bar and line order within a panel
    pub engines: Vec<EngineEntry>,
    pub threads: Vec<u32>,
    // thread count shown in the throughput-over-time figure
    pub timeline_threads: u32,
    pub missing: MissingPolicy,
    pub canvas: Canvas,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WorkloadEntry {
    pub name: String,
    pub label: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineEntry {
    // source label as produced by the loader
    pub label: String,
    // `#rrggbb`
    pub color: String,
}

/// Figure size in inches and rendering density
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub dpi: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 14.0,
            height: 10.0,
            dpi: 150,
        }
    }
}

impl Canvas {
    pub fn pixels(&self) -> (u32, u32) {
        (
            (self.width * self.dpi as f64).round() as u32,
            (self.height * self.dpi as f64).round() as u32,
        )
    }

    /// convert a point size to pixels at this density
    pub fn font(&self, points: f64) -> u32 {
        (points * self.dpi as f64 / 72.0).round() as u32
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            runs: vec![
                RunSource {
                    directory: PathBuf::from("run1"),
                    labeling: SourceLabeling::PerEngine {
                        suffix: "MariaDB 12.2.2".into(),
                    },
                },
                RunSource {
                    directory: PathBuf::from("run2"),
                    labeling: SourceLabeling::Fixed {
                        label: "InnoDB (MySQL 9.5.0)".into(),
                    },
                },
            ],
            output: PathBuf::from("."),
            workloads: [
                ("oltp_read_write", "OLTP Read/Write"),
                ("oltp_point_select", "OLTP Point Select"),
                ("oltp_insert", "OLTP Insert"),
                ("oltp_write_only", "OLTP Write Only"),
            ]
            .into_iter()
            .map(|(name, label)| WorkloadEntry {
                name: name.into(),
                label: label.into(),
            })
            .collect(),
            engines: [
                ("TidesDB (MariaDB 12.2.2)", "#0077b6"),
                ("InnoDB (MariaDB 12.2.2)", "#e85d04"),
                ("InnoDB (MySQL 9.5.0)", "#2d6a4f"),
            ]
            .into_iter()
            .map(|(label, color)| EngineEntry {
                label: label.into(),
                color: color.into(),
            })
            .collect(),
            threads: vec![1, 8, 16, 32],
            timeline_threads: 32,
            missing: MissingPolicy::Zero,
            canvas: Canvas::default(),
        }
    }
}

/// parse `#rrggbb` (leading `#` optional)
pub fn parse_color(value: &str) -> Option<RGBColor> {
    let hex = value.strip_prefix('#').unwrap_or(value);

    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();

    Some(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

impl EngineEntry {
    /// configured color, gray if it doesn't parse (rejected by preflight anyway)
    pub fn rgb(&self) -> RGBColor {
        parse_color(&self.color).unwrap_or(RGBColor(128, 128, 128))
    }
}

impl ReportConfig {
    /// load a YAML config, fields that are left out keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(serde_yaml::from_str(&content)?)
    }

    /// anchor relative run and output directories at `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        for run in self.runs.iter_mut() {
            if run.directory.is_relative() {
                run.directory = base.join(&run.directory);
            }
        }

        if self.output.is_relative() {
            self.output = base.join(&self.output);
        }
    }

    /// engine labels as shown below every figure title
    pub fn subtitle(&self) -> String {
        self.engines.iter().map(|engine| engine.label.as_str()).join("  vs  ")
    }

    pub fn timeline_file(&self) -> String {
        format!("tps_over_time_{}t.png", self.timeline_threads)
    }

    /// Check the whole config and log every problem instead of stopping at the
    /// first one. Returns true if an error was found.
    pub fn preflight_checks(&self) -> bool {
        let mut contains_error = false;

        if self.runs.is_empty() {
            error!("No run was defined, there is nothing to load");
            contains_error = true;
        }

        if self.workloads.is_empty() {
            error!("No workload was defined, every figure would be empty");
            contains_error = true;
        } else if self.workloads.len() > GRID.0 * GRID.1 {
            error!(
                "{} workloads were defined but a figure only holds {}",
                self.workloads.len(),
                GRID.0 * GRID.1
            );
            contains_error = true;
        }

        if self.engines.is_empty() {
            error!("No engine was defined, every figure would be empty");
            contains_error = true;
        }

        for engine in self.engines.iter() {
            if parse_color(&engine.color).is_none() {
                error!(
                    "engines.{}.color ({}) must be a hex color like #0077b6",
                    engine.label, engine.color
                );
                contains_error = true;
            }
        }

        for label in self.engines.iter().map(|engine| &engine.label).duplicates() {
            warn!("Engine {label} is listed more than once and will be drawn twice");
        }

        if self.threads.is_empty() {
            error!("No thread count was defined");
            contains_error = true;
        } else if self.threads.contains(&0) {
            error!("Thread counts must be positive");
            contains_error = true;
        }

        if !self.threads.contains(&1) {
            warn!("Thread count 1 isn't listed, scaling efficiency needs it as a baseline");
        }

        if !self.threads.contains(&self.timeline_threads) {
            warn!(
                "timeline_threads ({}) isn't one of the listed thread counts",
                self.timeline_threads
            );
        }

        let (width, height) = self.canvas.pixels();
        if width == 0 || height == 0 {
            error!("canvas must have a positive size, got {width}x{height} pixels");
            contains_error = true;
        }

        contains_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_comparison() {
        let config = ReportConfig::default();

        assert_eq!(config.threads, vec![1, 8, 16, 32]);
        assert_eq!(config.workloads[1].name, "oltp_point_select");
        assert_eq!(config.engines[0].rgb(), RGBColor(0x00, 0x77, 0xb6));
        assert_eq!(config.canvas.pixels(), (2100, 1500));
        assert_eq!(config.timeline_file(), "tps_over_time_32t.png");
        assert_eq!(
            config.subtitle(),
            "TidesDB (MariaDB 12.2.2)  vs  InnoDB (MariaDB 12.2.2)  vs  InnoDB (MySQL 9.5.0)"
        );
        assert!(!config.preflight_checks());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: ReportConfig = serde_yaml::from_str(
            "threads: [1, 4]\nmissing: omit\ncanvas:\n  dpi: 100\nruns:\n  - path: results\n    source:\n      label: RocksDB\n",
        )
        .unwrap();

        assert_eq!(config.threads, vec![1, 4]);
        assert_eq!(config.missing, MissingPolicy::Omit);
        assert_eq!(config.canvas.pixels(), (1400, 1000));
        assert_eq!(config.runs.len(), 1);
        assert_eq!(
            config.runs[0].labeling,
            SourceLabeling::Fixed {
                label: "RocksDB".into()
            }
        );
        assert_eq!(config.engines.len(), 3);
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.yml");

        let error = ReportConfig::load(&path).unwrap_err();

        assert!(matches!(error, ConfigError::Io { path: ref failed, .. } if *failed == path));
        assert!(error.to_string().contains("report.yml"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<ReportConfig>("thread: [1]\n").is_err());
    }

    #[test]
    fn preflight_catches_bad_values() {
        let mut config = ReportConfig::default();
        config.engines[1].color = "orange".into();
        assert!(config.preflight_checks());

        let mut config = ReportConfig::default();
        config.threads.clear();
        assert!(config.preflight_checks());

        let mut config = ReportConfig::default();
        config.workloads.push(config.workloads[0].clone());
        assert!(config.preflight_checks());
    }

    #[test]
    fn colors() {
        assert_eq!(parse_color("#e85d04"), Some(RGBColor(0xe8, 0x5d, 0x04)));
        assert_eq!(parse_color("2d6a4f"), Some(RGBColor(0x2d, 0x6a, 0x4f)));
        assert_eq!(parse_color("#e85d0"), None);
        assert_eq!(parse_color("#gg0000"), None);
    }

    #[test]
    fn relative_paths_follow_base() {
        let mut config = ReportConfig::default();
        config.resolve_paths(Path::new("/data/bench"));

        assert_eq!(config.runs[0].directory, PathBuf::from("/data/bench/run1"));
        assert_eq!(config.output, PathBuf::from("/data/bench/."));
    }
}
