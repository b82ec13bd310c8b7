//! This crate implements the analysis side of the project, including:
//! - Async read-back of a persisted result table
//! - The standard report: latency, out-of-box and aggregation speedup, phase latency
//! - SVG rendering of the report
//! - Synthetic experiments for tests and benchmarks

pub mod parquet;
pub mod plan;
pub mod report;
pub mod util;

pub use self::parquet::load_results;
pub use plan::{build_report, Report, ReportConfig};
pub use report::{charts, render_report, Chart, ChartPoint, ReportSink, SvgReport};
