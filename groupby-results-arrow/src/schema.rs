//! Column layout of the persisted result table and of the derived tables.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};

pub const EXP_ID: &str = "exp_id";
pub const MACHINE_ID: &str = "machine_id";
pub const DIST: &str = "dist";
pub const SIZE_CONFIG: &str = "size_config";
pub const N_ROWS: &str = "n_rows";
pub const N_GROUPS: &str = "n_groups";
pub const ALGORITHM: &str = "algorithm";
pub const NP: &str = "np";
pub const TRIAL_ID: &str = "trial_id";
pub const ATTRIBUTE: &str = "attribute";
pub const VALUE: &str = "value";
pub const AVG_TIME: &str = "avg_time";
pub const SPEEDUP: &str = "speedup";

/// `exp_id, machine_id, dist, size_config, n_rows, n_groups, algorithm, np, trial_id,
/// attribute, value`; one row per measurement, `value` in milliseconds.
pub fn results_schema() -> SchemaRef {
  Arc::new(Schema::new(vec![
    Field::new(EXP_ID, DataType::Utf8, false),
    Field::new(MACHINE_ID, DataType::Utf8, false),
    Field::new(DIST, DataType::Utf8, false),
    Field::new(SIZE_CONFIG, DataType::Utf8, false),
    Field::new(N_ROWS, DataType::UInt64, false),
    Field::new(N_GROUPS, DataType::UInt64, false),
    Field::new(ALGORITHM, DataType::Utf8, false),
    Field::new(NP, DataType::UInt32, false),
    Field::new(TRIAL_ID, DataType::UInt32, false),
    Field::new(ATTRIBUTE, DataType::Utf8, false),
    Field::new(VALUE, DataType::Float64, false),
  ]))
}

/// `exp_id, machine_id, dist, size_config, n_rows, n_groups, algorithm, np, attribute,
/// avg_time`
pub fn aggregated_schema() -> SchemaRef {
  Arc::new(Schema::new(vec![
    Field::new(EXP_ID, DataType::Utf8, false),
    Field::new(MACHINE_ID, DataType::Utf8, false),
    Field::new(DIST, DataType::Utf8, false),
    Field::new(SIZE_CONFIG, DataType::Utf8, false),
    Field::new(N_ROWS, DataType::UInt64, false),
    Field::new(N_GROUPS, DataType::UInt64, false),
    Field::new(ALGORITHM, DataType::Utf8, false),
    Field::new(NP, DataType::UInt32, false),
    Field::new(ATTRIBUTE, DataType::Utf8, false),
    Field::new(AVG_TIME, DataType::Float64, false),
  ]))
}

/// `machine_id, dist, size_config, algorithm, np, speedup`; a null speedup means no
/// single-thread baseline exists.
pub fn speedup_schema() -> SchemaRef {
  Arc::new(Schema::new(vec![
    Field::new(MACHINE_ID, DataType::Utf8, false),
    Field::new(DIST, DataType::Utf8, false),
    Field::new(SIZE_CONFIG, DataType::Utf8, false),
    Field::new(ALGORITHM, DataType::Utf8, false),
    Field::new(NP, DataType::UInt32, false),
    Field::new(SPEEDUP, DataType::Float64, true),
  ]))
}
