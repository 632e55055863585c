use std::fmt;

use thiserror::Error;

/// Reelmark's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// An independently guarded network action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Upload,
    Process,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::Process => f.write_str("process"),
        }
    }
}

/// Coarse classification of an [`Error`], for front-ends that only need to know
/// how to surface a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input. Core state is unchanged and the action can be retried.
    Validation,
    /// Malformed data from the ingestion service. The attempt must be discarded.
    Format,
    /// A failed or non-success call to an external service.
    Network,
    /// A word index outside the transcript.
    Index,
    /// The same action is already in flight.
    Busy,
    /// Local I/O or (de)serialization failure.
    Io,
}

/// Reelmark's crate-wide error type.
///
/// Every variant is scoped to the action that produced it; none of them leaves a
/// transcript or highlight track half-modified.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("word index {index} out of range (transcript has {len} words)")]
    Index { index: usize, len: usize },

    #[error("{0} already in progress")]
    Busy(Action),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub(crate) fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Format(_) => ErrorKind::Format,
            Self::Network(_) => ErrorKind::Network,
            Self::Index { .. } => ErrorKind::Index,
            Self::Busy(_) => ErrorKind::Busy,
            Self::Io(_) | Self::Json(_) => ErrorKind::Io,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_format(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    pub fn is_network(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

#[cfg(feature = "client")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(Error::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(Error::format("x").kind(), ErrorKind::Format);
        assert_eq!(Error::network("x").kind(), ErrorKind::Network);
        assert_eq!(Error::Index { index: 3, len: 2 }.kind(), ErrorKind::Index);
        assert_eq!(Error::Busy(Action::Upload).kind(), ErrorKind::Busy);
    }

    #[test]
    fn messages_name_the_failure() {
        let err = Error::Index { index: 7, len: 5 };
        assert_eq!(
            err.to_string(),
            "word index 7 out of range (transcript has 5 words)"
        );
        assert_eq!(
            Error::Busy(Action::Process).to_string(),
            "process already in progress"
        );
        assert!(
            Error::validation("missing media")
                .to_string()
                .contains("missing media")
        );
    }
}
