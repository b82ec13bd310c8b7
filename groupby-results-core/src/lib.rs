//! This crate provides the I/O-free core of the group-by benchmark result pipeline:
//! - decoding a log file's experiment identity from its path ([`identity`])
//! - parsing `>>> run=<trial>, <attribute>=<value>ms` result lines ([`record`])
//! - averaging repeated trials per configuration ([`aggregate`])
//! - relating every configuration to its single-thread baseline ([`speedup`])
//!
//! Reading logs from disk and persisting tables is left to `groupby-results-arrow`.

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod identity;
pub mod record;
pub mod speedup;
pub mod traits;

pub use aggregate::{aggregate, duplicate_trials, AggregatedMetric, DuplicateTrial};
pub use error::{Error, Result};
pub use filter::{RowFilter, Selection};
pub use identity::LogFileIdentity;
pub use record::{parse_log, MeasurementRecord, ResultTable, ResultTableBuilder};
pub use speedup::{compute_speedup, SpeedupRecord, SpeedupTable};
pub use traits::{Row, RowPredicate};
