//! Turn a [`Report`] into flat chart descriptions and render them.
//!
//! Charts are faceted: one panel per (distribution, size configuration), thread count on the x
//! axis, one line per (algorithm, machine) series. [`ReportSink`] receives the flat description
//! so the layout can be checked without a drawing backend; [`SvgReport`] draws it with plotters.

use std::collections::BTreeSet;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::Result;
use groupby_results_core::{AggregatedMetric, SpeedupTable};
use log::{info, warn};
use plotters::prelude::*;

use crate::plan::Report;

/// Display order of known algorithms. Unknown algorithms follow, by name.
pub const ALGORITHM_ORDER: [&str; 10] = [
  "two-phase-central-merge",
  "two-phase-central-merge-xxhash",
  "two-phase-radix",
  "two-phase-radix-xxhash",
  "three-phase-radix",
  "duckdbish-two-phase",
  "implicit-repartitioning",
  "lock-free-hash-table",
  "polars",
  "duckdb",
];

fn algorithm_rank(algorithm: &str) -> (usize, &str) {
  let rank = ALGORITHM_ORDER
    .iter()
    .position(|known| *known == algorithm)
    .unwrap_or(ALGORITHM_ORDER.len());
  (rank, algorithm)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
  /// Facet row.
  pub distribution: String,
  /// Facet column.
  pub size_config: String,
  pub algorithm: String,
  pub series: String,
  pub thread_count: u32,
  /// `None` for an undefined speedup; never drawn.
  pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
  /// File suffix, e.g. `latency` for `<exp_id>-latency.svg`.
  pub name: String,
  pub title: String,
  pub y_label: String,
  pub log_y: bool,
  /// Fixed upper bound of the y axis; derived from the data when `None`.
  pub y_max: Option<f64>,
  pub points: Vec<ChartPoint>,
}

impl Chart {
  pub fn is_empty(&self) -> bool {
    self.points.iter().all(|p| p.value.is_none())
  }

  /// Distinct (distribution, size_config) values, sorted.
  pub fn facets(&self) -> (Vec<&str>, Vec<&str>) {
    let rows: BTreeSet<&str> = self.points.iter().map(|p| p.distribution.as_str()).collect();
    let cols: BTreeSet<&str> = self.points.iter().map(|p| p.size_config.as_str()).collect();
    (rows.into_iter().collect(), cols.into_iter().collect())
  }

  /// Finite, and positive on a log axis.
  pub fn plottable(&self, value: f64) -> bool {
    value.is_finite() && (!self.log_y || value > 0.0)
  }

  /// y coordinate of a plottable value. Log axes plot log10 of the value on a linear axis.
  pub fn y(&self, value: f64) -> f64 {
    if self.log_y {
      value.log10()
    } else {
      value
    }
  }

  /// y axis covering every plottable value, or `None` when there is nothing to draw.
  pub fn y_range(&self) -> Option<Range<f64>> {
    let (lo, hi) = self
      .points
      .iter()
      .filter_map(|p| p.value)
      .filter(|v| self.plottable(*v))
      .map(|v| self.y(v))
      .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
        (lo.min(y), hi.max(y))
      });
    if lo > hi {
      return None;
    }
    let y_max = self.y_max.filter(|y_max| y_max.is_finite());
    Some(match (self.log_y, y_max) {
      (true, _) => lo.floor()..hi.ceil().max(lo.floor() + 1.0),
      (false, Some(y_max)) => 0.0..y_max.max(hi).max(1.0),
      (false, None) => 0.0..hi.max(1.0),
    })
  }

  /// Series of one facet in algorithm order, each with its plottable points sorted by thread
  /// count.
  pub fn series(
    &self,
    distribution: &str,
    size_config: &str,
  ) -> Vec<(&str, &str, Vec<(u32, f64)>)> {
    let mut series: Vec<(&str, &str, Vec<(u32, f64)>)> = vec![];
    for point in self
      .points
      .iter()
      .filter(|p| p.distribution == distribution && p.size_config == size_config)
    {
      let idx = match series.iter().position(|(name, _, _)| *name == point.series) {
        Some(idx) => idx,
        None => {
          series.push((point.series.as_str(), point.algorithm.as_str(), vec![]));
          series.len() - 1
        }
      };
      if let Some(value) = point.value.filter(|v| self.plottable(*v)) {
        series[idx].2.push((point.thread_count, value));
      }
    }
    for (_, _, points) in series.iter_mut() {
      points.sort_by_key(|(np, _)| *np);
    }
    series.sort_by(|a, b| algorithm_rank(a.1).cmp(&algorithm_rank(b.1)).then(a.0.cmp(b.0)));
    series
  }
}

fn latency_points(metrics: &[AggregatedMetric], with_phase: bool) -> Vec<ChartPoint> {
  metrics
    .iter()
    .map(|m| {
      let identity = &m.identity;
      let series = if with_phase {
        format!("{} {} @ {}", identity.algorithm, m.attribute, identity.machine_id)
      } else {
        format!("{} @ {}", identity.algorithm, identity.machine_id)
      };
      ChartPoint {
        distribution: identity.distribution.clone(),
        size_config: identity.size_config.clone(),
        algorithm: identity.algorithm.clone(),
        series,
        thread_count: identity.thread_count,
        value: Some(m.avg_time),
      }
    })
    .collect()
}

fn speedup_points(table: &SpeedupTable) -> Vec<ChartPoint> {
  table
    .records
    .iter()
    .map(|r| ChartPoint {
      distribution: r.distribution.clone(),
      size_config: r.size_config.clone(),
      algorithm: r.algorithm.clone(),
      series: format!("{} @ {}", r.algorithm, r.machine_id),
      thread_count: r.thread_count,
      value: r.speedup,
    })
    .collect()
}

/// The four standard charts, in rendering order.
pub fn charts(report: &Report) -> Vec<Chart> {
  let speedup_chart = |name: &str, title: &str, table: &SpeedupTable| Chart {
    name: name.to_string(),
    title: format!("{} {title} ({})", report.exp_id, table.attribute),
    y_label: "speedup".to_string(),
    log_y: false,
    y_max: Some(report.max_np as f64),
    points: speedup_points(table),
  };
  vec![
    Chart {
      name: "latency".to_string(),
      title: format!("{} latency", report.exp_id),
      y_label: "latency (ms)".to_string(),
      log_y: true,
      y_max: None,
      points: latency_points(&report.latency, false),
    },
    speedup_chart("oob-speedup", "out-of-box speedup", &report.oob_speedup),
    speedup_chart("agg-speedup", "aggregation speedup", &report.agg_speedup),
    Chart {
      name: "phase-latency".to_string(),
      title: format!("{} phase latency", report.exp_id),
      y_label: "latency (ms)".to_string(),
      log_y: true,
      y_max: None,
      points: latency_points(&report.phase_latency, true),
    },
  ]
}

pub trait ReportSink {
  /// Render one chart. Returns where it went, or `None` if the sink skipped it.
  fn render(&mut self, chart: &Chart) -> Result<Option<PathBuf>>;
}

/// Render every chart of `report` into `sink`, returning what was written.
pub fn render_report<S: ReportSink + ?Sized>(
  report: &Report,
  sink: &mut S,
) -> Result<Vec<PathBuf>> {
  let mut written = vec![];
  for chart in charts(report) {
    if let Some(path) = sink.render(&chart)? {
      written.push(path);
    }
  }
  Ok(written)
}

/// Writes `<dir>/<exp_id>-<chart>.svg`. Values that cannot be placed on the axis (undefined,
/// infinite, or not positive on a log axis) are left out; a chart with none left is skipped.
pub struct SvgReport {
  dir: PathBuf,
  exp_id: String,
  panel_size: (u32, u32),
}

impl SvgReport {
  pub fn new(dir: impl AsRef<Path>, exp_id: impl Into<String>) -> Self {
    SvgReport {
      dir: dir.as_ref().to_path_buf(),
      exp_id: exp_id.into(),
      panel_size: (480, 360),
    }
  }

  pub fn path(&self, chart: &Chart) -> PathBuf {
    self.dir.join(format!("{}-{}.svg", self.exp_id, chart.name))
  }
}

fn series_color(algorithm: &str) -> RGBAColor {
  Palette99::pick(algorithm_rank(algorithm).0).to_rgba()
}

impl ReportSink for SvgReport {
  fn render(&mut self, chart: &Chart) -> Result<Option<PathBuf>> {
    let Some(y_range) = chart.y_range() else {
      info!("{} has no data, skipping", chart.name);
      return Ok(None);
    };
    let dropped = chart
      .points
      .iter()
      .filter(|p| p.value.is_some_and(|v| !chart.plottable(v)))
      .count();
    if dropped > 0 {
      warn!("{}: {dropped} values cannot be plotted, left out", chart.name);
    }

    std::fs::create_dir_all(&self.dir)?;
    let path = self.path(chart);

    let (rows, cols) = chart.facets();
    let (panel_width, panel_height) = self.panel_size;
    let size = (
      panel_width * cols.len() as u32,
      panel_height * rows.len() as u32 + 40,
    );

    let svg_path = path.clone();
    let root = SVGBackend::new(&svg_path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&chart.title, ("sans-serif", 24))?;
    let panels = root.split_evenly((rows.len(), cols.len()));

    let x_max = chart.points.iter().map(|p| p.thread_count).max().unwrap_or(1) as f64;
    let label_value = |v: &f64| {
      if chart.log_y {
        format!("{}", 10f64.powf(*v))
      } else {
        format!("{v}")
      }
    };

    for (idx, panel) in panels.iter().enumerate() {
      let (row, col) = (rows[idx / cols.len()], cols[idx % cols.len()]);
      let mut ctx = ChartBuilder::on(panel)
        .caption(format!("dist = {row} | size_config = {col}"), ("sans-serif", 14))
        .margin(8)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(1.0..x_max.max(2.0), y_range.clone())?;
      ctx
        .configure_mesh()
        .x_desc("np")
        .y_desc(&chart.y_label)
        .y_label_formatter(&label_value)
        .draw()?;

      for (name, algorithm, points) in chart.series(row, col) {
        let color = series_color(algorithm);
        ctx
          .draw_series(LineSeries::new(
            points.iter().map(|(np, v)| (*np as f64, chart.y(*v))),
            color.stroke_width(2),
          ))?
          .label(name)
          .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color));
      }
      ctx
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    }

    root.present()?;
    info!("wrote {}", path.display());
    Ok(Some(path))
  }
}
