//! Measurement records and the per-experiment result table.
//!
//! Benchmarks report results on lines of the form
//! `>>> run=<trial_id>, <attribute>=<value>ms`; every other line is chatter and is skipped.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::identity::LogFileIdentity;

/// Token that opens every result-bearing line.
pub const RESULT_MARKER: &str = ">>>";

/// The only time unit benchmarks report in. Values are kept in milliseconds after parsing.
pub const TIME_UNIT_SUFFIX: &str = "ms";

fn result_line_grammar() -> &'static Regex {
  static GRAMMAR: OnceLock<Regex> = OnceLock::new();
  GRAMMAR.get_or_init(|| {
    // 1) trial id, 2) attribute name, 3) raw value (unit included)
    Regex::new(r"^>>>\s*run=\s*(\d+)\s*,\s*([^=\s][^=]*?)\s*=\s*(.*?)\s*$")
      .expect("result line grammar is a valid regex")
  })
}

/// One reported value of one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
  pub exp_id: String,
  pub identity: LogFileIdentity,
  pub trial_id: u32,
  pub attribute: String,
  /// Time in milliseconds.
  pub value: f64,
}

/// Parse the text of one log file into measurement records.
///
/// An empty result is not an error here; callers decide how to report files that produced
/// nothing. A value without the `ms` suffix aborts the parse with [`Error::Unit`].
pub fn parse_log(
  exp_id: &str,
  identity: &LogFileIdentity,
  text: &str,
) -> Result<Vec<MeasurementRecord>> {
  let mut records = Vec::new();
  for (lineno, line) in text.lines().enumerate() {
    if !line.starts_with(RESULT_MARKER) {
      continue;
    }
    let (trial_id, attribute, value) = parse_result_line(lineno + 1, line)?;
    records.push(MeasurementRecord {
      exp_id: exp_id.to_string(),
      identity: identity.clone(),
      trial_id,
      attribute: attribute.to_string(),
      value,
    });
  }
  Ok(records)
}

/// Decode a single `>>> run=<int>, <attribute>=<value>` line. `line` is 1-based and only
/// used for error reporting.
pub fn parse_result_line(line: usize, text: &str) -> Result<(u32, &str, f64)> {
  let malformed = || Error::Line {
    line,
    text: text.to_string(),
  };
  let caps = result_line_grammar().captures(text).ok_or_else(malformed)?;

  let trial_id = caps[1].parse::<u32>().map_err(|_| malformed())?;
  let attribute = caps.get(2).ok_or_else(malformed)?.as_str();
  let raw_value = caps.get(3).ok_or_else(malformed)?.as_str();

  Ok((trial_id, attribute, parse_time_value(line, raw_value)?))
}

/// Strip the `ms` suffix and parse the remainder as a float.
pub fn parse_time_value(line: usize, raw: &str) -> Result<f64> {
  let number = raw.strip_suffix(TIME_UNIT_SUFFIX).ok_or_else(|| Error::Unit {
    line,
    value: raw.to_string(),
  })?;
  match number.trim().parse::<f64>() {
    Ok(value) if value.is_finite() => Ok(value),
    _ => Err(Error::Value {
      line,
      value: raw.to_string(),
    }),
  }
}

/// All measurements of one experiment. Built append-only through [`ResultTableBuilder`] and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
  exp_id: String,
  records: Vec<MeasurementRecord>,
}

impl ResultTable {
  pub fn builder(exp_id: impl Into<String>) -> ResultTableBuilder {
    ResultTableBuilder {
      exp_id: exp_id.into(),
      records: Vec::new(),
      sources: 0,
    }
  }

  /// Wrap records that were already merged, e.g. when reading a persisted table back.
  pub fn from_records(exp_id: impl Into<String>, records: Vec<MeasurementRecord>) -> Self {
    ResultTable {
      exp_id: exp_id.into(),
      records,
    }
  }

  pub fn exp_id(&self) -> &str {
    &self.exp_id
  }

  pub fn records(&self) -> &[MeasurementRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, MeasurementRecord> {
    self.records.iter()
  }
}

impl<'a> IntoIterator for &'a ResultTable {
  type Item = &'a MeasurementRecord;
  type IntoIter = std::slice::Iter<'a, MeasurementRecord>;

  fn into_iter(self) -> Self::IntoIter {
    self.records.iter()
  }
}

#[derive(Debug)]
pub struct ResultTableBuilder {
  exp_id: String,
  records: Vec<MeasurementRecord>,
  sources: usize,
}

impl ResultTableBuilder {
  pub fn exp_id(&self) -> &str {
    &self.exp_id
  }

  /// Append the records of one log file. Empty sets are ignored and not counted as a source.
  pub fn append(&mut self, records: Vec<MeasurementRecord>) {
    if records.is_empty() {
      return;
    }
    self.sources += 1;
    self.records.extend(records);
  }

  /// Number of non-empty record sets appended so far.
  pub fn sources(&self) -> usize {
    self.sources
  }

  pub fn finish(self) -> ResultTable {
    ResultTable {
      exp_id: self.exp_id,
      records: self.records,
    }
  }
}

#[cfg(test)]
mod tests {
  use rstest::rstest;

  use super::*;

  fn identity() -> LogFileIdentity {
    LogFileIdentity::from_file_name("m1", "uniform,8M-1K,two-phase-radix,np4.log").unwrap()
  }

  #[test]
  fn test_parse_result_line() {
    let (trial_id, attribute, value) =
      parse_result_line(1, ">>> run=3, elapsed_time=125.40ms").unwrap();
    assert_eq!(trial_id, 3);
    assert_eq!(attribute, "elapsed_time");
    assert_eq!(value, 125.40);
  }

  #[rstest]
  #[case(">>> run=0, phase_1=12ms", 0, "phase_1", 12.0)]
  #[case(">>>run=7,aggregation_time=3.5ms", 7, "aggregation_time", 3.5)]
  #[case(">>> run=12, elapsed_time=0.25ms   ", 12, "elapsed_time", 0.25)]
  #[case(">>> run=1, elapsed_time=1e3ms", 1, "elapsed_time", 1000.0)]
  fn test_parse_result_line_variants(
    #[case] text: &str,
    #[case] trial_id: u32,
    #[case] attribute: &str,
    #[case] value: f64,
  ) {
    assert_eq!(parse_result_line(1, text).unwrap(), (trial_id, attribute, value));
  }

  #[rstest]
  #[case("125.40s")]
  #[case("125.40")]
  #[case("125.40us")]
  #[case("")]
  fn test_missing_unit_is_fatal(#[case] raw: &str) {
    let text = format!(">>> run=3, elapsed_time={raw}");
    let err = parse_result_line(9, &text).unwrap_err();
    assert_eq!(
      err,
      Error::Unit {
        line: 9,
        value: raw.to_string()
      }
    );
  }

  #[rstest]
  #[case("ms")]
  #[case("fastms")]
  #[case("NaNms")]
  fn test_non_numeric_value(#[case] raw: &str) {
    let text = format!(">>> run=3, elapsed_time={raw}");
    let err = parse_result_line(2, &text).unwrap_err();
    assert!(matches!(err, Error::Value { line: 2, .. }), "{err:?}");
  }

  #[rstest]
  #[case(">>> elapsed_time=12ms")]
  #[case(">>> run=x, elapsed_time=12ms")]
  #[case(">>> run=3 elapsed_time=12ms")]
  #[case(">>> run=3, =12ms")]
  fn test_malformed_line(#[case] text: &str) {
    let err = parse_result_line(4, text).unwrap_err();
    assert!(matches!(err, Error::Line { line: 4, .. }), "{err:?}");
  }

  #[test]
  fn test_parse_log_skips_chatter() {
    let text = "\
2024-04-01 12:00:00 | INFO | loaded data into memory
>>> run=0, elapsed_time=100.00ms
  >>> run=9, elapsed_time=1s
>>> run=0, phase_1=40ms
done with trials
>>> run=1, elapsed_time=120.50ms
";
    let records = parse_log("e1", &identity(), text).unwrap();
    let summary: Vec<(u32, &str, f64)> = records
      .iter()
      .map(|r| (r.trial_id, r.attribute.as_str(), r.value))
      .collect();
    assert_eq!(
      summary,
      vec![
        (0, "elapsed_time", 100.0),
        (0, "phase_1", 40.0),
        (1, "elapsed_time", 120.5),
      ]
    );
    assert!(records.iter().all(|r| r.identity == identity() && r.exp_id == "e1"));
  }

  #[test]
  fn test_parse_log_reports_line_number() {
    let text = "warming up\n>>> run=0, elapsed_time=1.0ms\n>>> run=1, elapsed_time=2.0sec\n";
    let err = parse_log("e1", &identity(), text).unwrap_err();
    assert_eq!(
      err,
      Error::Unit {
        line: 3,
        value: "2.0sec".to_string()
      }
    );
  }

  #[test]
  fn test_parse_log_empty() {
    assert!(parse_log("e1", &identity(), "").unwrap().is_empty());
    assert!(parse_log("e1", &identity(), "still running...\n").unwrap().is_empty());
  }

  #[test]
  fn test_builder_skips_empty_sources() {
    let records = parse_log("e1", &identity(), ">>> run=0, elapsed_time=1ms\n").unwrap();
    let mut builder = ResultTable::builder("e1");
    builder.append(records.clone());
    builder.append(Vec::new());
    builder.append(records);
    assert_eq!(builder.sources(), 2);
    let table = builder.finish();
    assert_eq!(table.exp_id(), "e1");
    assert_eq!(table.len(), 2);
  }
}
