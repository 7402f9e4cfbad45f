use thiserror::Error;
use tracing::{error, warn};

/// Errors surfaced by the note store collaborator.
///
/// The autosave core treats both variants identically: the failed write is
/// logged and dropped. No retry, no user-facing error. The in-memory note
/// remains the source of truth until the next successful write.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or the operation failed mid-flight.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the request (unknown note id, malformed update).
    #[error("store rejected request: {0}")]
    Rejected(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => Self::Rejected("no such note".into()),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Extension trait for best-effort call sites with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use sticky_notes_core::error::ResultExt;
///
/// // Silently log and continue if the write fails
/// store.write(&id, update).log_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
