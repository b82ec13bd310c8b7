use thiserror::Error;

/// Fatal extraction errors. Recoverable conditions (empty files, missing baselines, duplicated
/// trials) are reported through return values and the `log` facade instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
  /// The log file path does not follow `<distribution>,<size_config>,<algorithm>,np<n>.<ext>`.
  #[error("malformed log file name {name:?}: {reason}")]
  Format { name: String, reason: String },

  /// A measurement value is not expressed in milliseconds.
  #[error("line {line}: value {value:?} does not carry the `ms` time unit")]
  Unit { line: usize, value: String },

  /// A millisecond value whose numeric part is not a floating point literal.
  #[error("line {line}: value {value:?} is not a number of milliseconds")]
  Value { line: usize, value: String },

  /// A `>>>` line that does not read `>>> run=<int>, <attribute>=<value>`.
  #[error("line {line}: malformed result line {text:?}")]
  Line { line: usize, text: String },
}

impl Error {
  pub(crate) fn format(name: impl Into<String>, reason: impl Into<String>) -> Self {
    Error::Format {
      name: name.into(),
      reason: reason.into(),
    }
  }
}

pub type Result<T> = std::result::Result<T, Error>;
