//! Asynchronous read-back of a persisted result table.
//!
//! The artifact is streamed row group by row group through [`ParquetRecordBatchStreamBuilder`];
//! every batch is decoded by column name, so a file with a missing or retyped column fails with a
//! schema error instead of yielding partial rows.

use std::path::Path;

use anyhow::{Context, Result};
use futures::StreamExt;
use groupby_results_arrow::batch::batch_to_records;
use groupby_results_core::ResultTable;
use log::debug;
use parquet::arrow::ParquetRecordBatchStreamBuilder;

/// Load `path`, taking the experiment id from its file stem.
pub async fn load_results(path: impl AsRef<Path>) -> Result<ResultTable> {
  let path = path.as_ref();
  let exp_id = path
    .file_stem()
    .and_then(|stem| stem.to_str())
    .unwrap_or_default()
    .to_string();

  let file = tokio::fs::File::open(path)
    .await
    .with_context(|| format!("open {}", path.display()))?;

  let stream_builder = ParquetRecordBatchStreamBuilder::new(file)
    .await
    .with_context(|| format!("read parquet footer of {}", path.display()))?;

  let metadata = stream_builder.metadata();
  debug!(
    "{}: {} row groups, {} rows",
    path.display(),
    metadata.num_row_groups(),
    metadata.file_metadata().num_rows()
  );

  let mut stream = stream_builder.with_batch_size(1024).build()?;

  let mut records = vec![];
  while let Some(next_batch) = stream.next().await {
    let next_batch = next_batch?;
    records.extend(
      batch_to_records(&next_batch).with_context(|| format!("decode {}", path.display()))?,
    );
  }

  Ok(ResultTable::from_records(exp_id, records))
}
