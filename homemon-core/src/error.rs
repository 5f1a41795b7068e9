use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single backing store call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Connection or network failure.
    #[error("backing store unavailable: {0}")]
    Unavailable(String),

    /// The store answered but rejected the command or returned an unexpected value.
    #[error("backing store error: {0}")]
    Backend(String),
}

/// One of the three physical structures backing the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    Priority,
    Colour,
    Expiry,
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Index::Priority => "priority",
            Index::Colour => "colour",
            Index::Expiry => "expiry",
        })
    }
}

/// An alert the sweeper could not fully remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    pub name: String,
    pub index: Index,
    pub error: RegistryErrorKind,
}

impl fmt::Display for SweepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} index: {})", self.name, self.index, self.error)
    }
}

/// Why a single index step inside a sweep failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryErrorKind {
    Store(StoreError),
    TimedOut(Duration),
}

impl fmt::Display for RegistryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryErrorKind::Store(e) => write!(f, "{e}"),
            RegistryErrorKind::TimedOut(d) => write!(f, "timed out after {d:?}"),
        }
    }
}

/// Registry operation failures. None of these terminate the process; all are
/// returned to the caller.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid alert: {0}")]
    InvalidAlert(String),

    #[error("{index} index: {source}")]
    BackingStoreUnavailable {
        index: Index,
        #[source]
        source: StoreError,
    },

    #[error("alert `{0}` not found")]
    NotFound(String),

    #[error("inconsistent entry `{name}`: missing from {index} index")]
    InconsistentEntry { name: String, index: Index },

    #[error(
        "sweep could not fully clean {} alert(s): {}",
        .failures.len(),
        format_failures(.failures)
    )]
    PartialSweepFailure {
        removed: Vec<String>,
        failures: Vec<SweepFailure>,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("{index} index: timed out after {after:?}")]
    TimedOut { index: Index, after: Duration },
}

impl RegistryError {
    /// The index whose call failed, when the error is tied to one.
    pub fn index(&self) -> Option<Index> {
        match self {
            RegistryError::BackingStoreUnavailable { index, .. }
            | RegistryError::InconsistentEntry { index, .. }
            | RegistryError::TimedOut { index, .. } => Some(*index),
            _ => None,
        }
    }
}

fn format_failures(failures: &[SweepFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_names_failing_index() {
        let err = RegistryError::BackingStoreUnavailable {
            index: Index::Colour,
            source: StoreError::Unavailable("connection refused".into()),
        };
        assert_eq!(
            err.to_string(),
            "colour index: backing store unavailable: connection refused"
        );
        assert_eq!(err.index(), Some(Index::Colour));
    }

    #[test]
    fn partial_sweep_lists_every_failure() {
        let err = RegistryError::PartialSweepFailure {
            removed: vec!["ok".into()],
            failures: vec![
                SweepFailure {
                    name: "a".into(),
                    index: Index::Priority,
                    error: RegistryErrorKind::Store(StoreError::Backend("WRONGTYPE".into())),
                },
                SweepFailure {
                    name: "b".into(),
                    index: Index::Expiry,
                    error: RegistryErrorKind::TimedOut(Duration::from_secs(1)),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("sweep could not fully clean 2 alert(s)"));
        assert!(msg.contains("a (priority index"));
        assert!(msg.contains("b (expiry index: timed out"));
        assert_eq!(err.index(), None);
    }
}
