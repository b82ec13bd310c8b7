//! Persistence of a [`ResultTable`] as a single Parquet file per experiment.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use groupby_results_core::ResultTable;
use parquet::{
  arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
  basic::Compression,
  file::properties::WriterProperties,
};
use tempfile::NamedTempFile;

use crate::batch::{batch_to_records, results_to_batch};

/// `<results_dir>/<exp_id>.parquet`
pub fn results_path(results_dir: impl AsRef<Path>, exp_id: &str) -> PathBuf {
  results_dir.as_ref().join(format!("{exp_id}.parquet"))
}

/// Write `table` to `path`, replacing whatever was there. The file is staged next to `path` and
/// renamed over it once complete, so a failed write leaves the previous artifact untouched.
/// Concurrent writers to the same path are not supported.
pub fn write_results(path: impl AsRef<Path>, table: &ResultTable) -> Result<()> {
  let path = path.as_ref();
  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  fs::create_dir_all(dir)
    .with_context(|| format!("create results directory {}", dir.display()))?;

  let batch = results_to_batch(table)?;
  let props = WriterProperties::builder()
    .set_compression(Compression::SNAPPY)
    .build();

  let mut staged = NamedTempFile::new_in(dir)
    .with_context(|| format!("stage {} in {}", path.display(), dir.display()))?;
  let mut writer = ArrowWriter::try_new(staged.as_file_mut(), batch.schema(), Some(props))?;
  writer.write(&batch)?;
  writer
    .close()
    .with_context(|| format!("finish {}", path.display()))?;
  staged
    .persist(path)
    .map_err(|err| err.error)
    .with_context(|| format!("replace {}", path.display()))?;
  Ok(())
}

/// Read a table written by [`write_results`]. The experiment id is taken from the file stem.
pub fn read_results(path: impl AsRef<Path>) -> Result<ResultTable> {
  let path = path.as_ref();
  let exp_id = path
    .file_stem()
    .and_then(|stem| stem.to_str())
    .unwrap_or_default()
    .to_string();

  let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
  let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
    .with_batch_size(1024)
    .build()?;

  let mut records = Vec::new();
  for batch in reader {
    let batch = batch?;
    records.extend(batch_to_records(&batch).with_context(|| format!("decode {}", path.display()))?);
  }
  Ok(ResultTable::from_records(exp_id, records))
}

#[cfg(test)]
mod tests {
  use groupby_results_core::{parse_log, LogFileIdentity};
  use tempfile::TempDir;

  use super::*;

  fn table(exp_id: &str, text: &str) -> ResultTable {
    let identity = LogFileIdentity::from_file_name("m1", "uniform,8M-1K,polars,np2.log").unwrap();
    let mut builder = ResultTable::builder(exp_id);
    builder.append(parse_log(exp_id, &identity, text).unwrap());
    builder.finish()
  }

  #[test]
  fn test_write_then_read() {
    let dir = TempDir::new().unwrap();
    let path = results_path(dir.path().join("results"), "e1");
    let table = table(
      "e1",
      ">>> run=0, elapsed_time=125.40ms\n>>> run=1, elapsed_time=99.5ms\n",
    );

    write_results(&path, &table).unwrap();
    assert!(path.ends_with("results/e1.parquet"));
    assert_eq!(read_results(&path).unwrap(), table);
  }

  #[test]
  fn test_rewrite_replaces_previous_artifact() {
    let dir = TempDir::new().unwrap();
    let path = results_path(dir.path(), "e1");
    write_results(
      &path,
      &table("e1", ">>> run=0, elapsed_time=1ms\n>>> run=1, elapsed_time=2ms\n"),
    )
    .unwrap();

    let second = table("e1", ">>> run=0, elapsed_time=3ms\n");
    write_results(&path, &second).unwrap();
    assert_eq!(read_results(&path).unwrap(), second);
  }

  fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
      .unwrap()
      .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
      .collect();
    names.sort();
    names
  }

  #[test]
  fn test_rewrite_leaves_no_staging_files() {
    let dir = TempDir::new().unwrap();
    let path = results_path(dir.path(), "e1");
    write_results(&path, &table("e1", ">>> run=0, elapsed_time=1ms\n")).unwrap();
    write_results(&path, &table("e1", ">>> run=0, elapsed_time=2ms\n")).unwrap();
    assert_eq!(entries(dir.path()), vec!["e1.parquet"]);
  }

  #[test]
  fn test_failed_write_keeps_target() {
    let dir = TempDir::new().unwrap();
    let path = results_path(dir.path(), "e1");
    // a directory cannot be replaced by the finished file
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), "").unwrap();

    let err = write_results(&path, &table("e1", ">>> run=0, elapsed_time=1ms\n")).unwrap_err();
    assert!(err.to_string().starts_with("replace "), "{err}");
    assert!(path.join("keep").exists());
    assert_eq!(entries(dir.path()), vec!["e1.parquet"]);
  }

  #[test]
  fn test_empty_table_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = results_path(dir.path(), "empty");
    write_results(&path, &ResultTable::builder("empty").finish()).unwrap();
    let table = read_results(&path).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.exp_id(), "empty");
  }
}
