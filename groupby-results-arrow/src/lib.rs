//! This crate consists of the integration point between the result pipeline core and Apache
//! Arrow/Parquet. It has responsibilities for:
//! 1. Laying measurement, aggregated and speedup tables out as Arrow record batches
//! 2. Persisting one experiment's merged measurements as `results/<exp_id>.parquet`
//! 3. Discovering and parsing an experiment's logs (`logs/<exp_id>/<machine_id>/*.log`)
//! 4. Providing the `extract` binary that drives 2 and 3 from command-line arguments

pub mod batch;
pub mod extract;
pub mod schema;
pub mod store;

pub use extract::{extract_experiment, ExtractConfig, ExtractSummary};
pub use store::{read_results, results_path, write_results};
