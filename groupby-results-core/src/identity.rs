//! Decoding of the experiment identity encoded in a log file's location.
//!
//! Logs live at `<root>/<experiment_id>/<machine_id>/<filename>` where the file name reads
//! `<distribution>,<size_config>,<algorithm>,np<thread_count>.<ext>` and `size_config` is
//! `<n_rows>-<n_groups>`, e.g. `logs/e1/m1/uniform,8M-1K,lock-free-hash-table,np4.log`.

use std::path::Path;

use crate::error::{Error, Result};

/// Separator between the row count and the group count in a size configuration.
pub const SIZE_CONFIG_SEPARATOR: char = '-';

/// Prefix of the thread count field in a log file name.
pub const THREAD_COUNT_PREFIX: &str = "np";

/// Identity shared by every measurement parsed from one log file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogFileIdentity {
  pub machine_id: String,
  pub distribution: String,
  pub size_config: String,
  pub n_rows: u64,
  pub n_groups: u64,
  pub algorithm: String,
  pub thread_count: u32,
}

impl LogFileIdentity {
  /// Decode the identity of the log file at `path`. Pure function of the path; the file is
  /// never touched.
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let file_name = path
      .file_name()
      .and_then(|name| name.to_str())
      .ok_or_else(|| Error::format(&display, "path has no UTF-8 file name"))?;
    let machine_id = path
      .parent()
      .and_then(|parent| parent.file_name())
      .and_then(|name| name.to_str())
      .ok_or_else(|| Error::format(&display, "path has no machine directory"))?;

    Self::from_file_name(machine_id, file_name)
  }

  /// Decode `<distribution>,<size_config>,<algorithm>,np<thread_count>.<ext>`.
  pub fn from_file_name(machine_id: &str, file_name: &str) -> Result<Self> {
    let fields: Vec<&str> = file_name.split(',').collect();
    let [distribution, size_config, algorithm, thread_field] = fields[..] else {
      return Err(Error::format(
        file_name,
        format!("expected 4 comma separated fields, found {}", fields.len()),
      ));
    };

    // The extension hangs off the last field only: `np4.log` -> `np4`.
    let thread_repr = thread_field
      .split('.')
      .next()
      .unwrap_or(thread_field)
      .strip_prefix(THREAD_COUNT_PREFIX)
      .ok_or_else(|| {
        Error::format(
          file_name,
          format!("thread count {thread_field:?} lacks the `{THREAD_COUNT_PREFIX}` prefix"),
        )
      })?;
    let thread_count: u32 = thread_repr.parse().map_err(|_| {
      Error::format(
        file_name,
        format!("thread count {thread_repr:?} is not an integer"),
      )
    })?;
    if thread_count == 0 {
      return Err(Error::format(file_name, "thread count must be positive"));
    }

    let (n_rows, n_groups) = parse_size_config(size_config)
      .map_err(|reason| Error::format(file_name, reason))?;

    Ok(LogFileIdentity {
      machine_id: machine_id.to_string(),
      distribution: distribution.to_string(),
      size_config: size_config.to_string(),
      n_rows,
      n_groups,
      algorithm: algorithm.to_string(),
      thread_count,
    })
  }
}

/// Split `<n_rows>-<n_groups>` and decode both halves independently.
fn parse_size_config(size_config: &str) -> std::result::Result<(u64, u64), String> {
  let (rows, groups) = size_config
    .split_once(SIZE_CONFIG_SEPARATOR)
    .ok_or_else(|| format!("size config {size_config:?} has no `{SIZE_CONFIG_SEPARATOR}`"))?;
  let n_rows =
    parse_size_repr(rows).ok_or_else(|| format!("row count {rows:?} is not a size literal"))?;
  let n_groups = parse_size_repr(groups)
    .ok_or_else(|| format!("group count {groups:?} is not a size literal"))?;
  Ok((n_rows, n_groups))
}

/// Decode an integer literal with an optional trailing `K`, `M` or `B` multiplier.
///
/// `"8M"` is 8_000_000, `"1K"` is 1_000 and `"2B"` is 2_000_000_000. No other suffix is
/// recognized, and the literal before the suffix must be a plain unsigned integer.
pub fn parse_size_repr(repr: &str) -> Option<u64> {
  let (digits, multiplier) = match repr.as_bytes().last()? {
    b'K' => (&repr[..repr.len() - 1], 1_000),
    b'M' => (&repr[..repr.len() - 1], 1_000_000),
    b'B' => (&repr[..repr.len() - 1], 1_000_000_000),
    _ => (repr, 1),
  };
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  digits.parse::<u64>().ok()?.checked_mul(multiplier)
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use rstest::rstest;

  use super::*;

  #[rstest]
  #[case("8M", Some(8_000_000))]
  #[case("1K", Some(1_000))]
  #[case("2B", Some(2_000_000_000))]
  #[case("100", Some(100))]
  #[case("0K", Some(0))]
  #[case("K", None)]
  #[case("", None)]
  #[case("1.5M", None)]
  #[case("8G", None)]
  #[case("-1K", None)]
  #[case("8m", None)]
  fn test_parse_size_repr(#[case] repr: &str, #[case] expected: Option<u64>) {
    assert_eq!(parse_size_repr(repr), expected);
  }

  #[test]
  fn test_parse_size_repr_overflow() {
    assert_eq!(parse_size_repr("99999999999999B"), None);
  }

  #[test]
  fn test_identity_from_path() {
    let path: PathBuf = ["logs", "e1", "m1", "uniform,8M-1K,lock-free-hash-table,np4.log"]
      .iter()
      .collect();
    let identity = LogFileIdentity::from_path(&path).unwrap();
    assert_eq!(
      identity,
      LogFileIdentity {
        machine_id: "m1".to_string(),
        distribution: "uniform".to_string(),
        size_config: "8M-1K".to_string(),
        n_rows: 8_000_000,
        n_groups: 1_000,
        algorithm: "lock-free-hash-table".to_string(),
        thread_count: 4,
      }
    );
  }

  #[test]
  fn test_identity_keeps_dotted_distribution() {
    let identity = LogFileIdentity::from_file_name("m2", "zipf1.5,1B-10,duckdb,np64.log").unwrap();
    assert_eq!(identity.distribution, "zipf1.5");
    assert_eq!(identity.n_rows, 1_000_000_000);
    assert_eq!(identity.n_groups, 10);
    assert_eq!(identity.thread_count, 64);
  }

  #[rstest]
  #[case("uniform,8M-1K,polars.log")]
  #[case("uniform,8M-1K,polars,np4,extra.log")]
  #[case("uniform,8M-1K,polars,4.log")]
  #[case("uniform,8M-1K,polars,npfour.log")]
  #[case("uniform,8M-1K,polars,np0.log")]
  #[case("uniform,8M1K,polars,np4.log")]
  #[case("uniform,8X-1K,polars,np4.log")]
  #[case("uniform,8M-,polars,np4.log")]
  fn test_identity_format_errors(#[case] file_name: &str) {
    let err = LogFileIdentity::from_file_name("m1", file_name).unwrap_err();
    assert!(matches!(err, Error::Format { .. }), "{err:?}");
  }

  #[test]
  fn test_identity_requires_machine_directory() {
    let err = LogFileIdentity::from_path("uniform,8M-1K,polars,np4.log").unwrap_err();
    assert!(matches!(err, Error::Format { .. }));
  }
}
