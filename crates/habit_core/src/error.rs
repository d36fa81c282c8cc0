use thiserror::Error;

/// Failures converting boundary text into engine values.
///
/// The engine itself never fails; only parsing of user or persisted text does.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid calendar date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid weekday `{0}`, expected a lowercase English weekday name")]
    InvalidWeekday(String),
    #[error("invalid granularity `{0}`, expected `day` or `week`")]
    InvalidGranularity(String),
    #[error("invalid timestamp `{0}`")]
    InvalidTimestamp(String),
}
