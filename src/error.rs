//! Error types.

use derive_more::{Display, From};

use crate::models::{BoardId, ThreadId};

/// Our error type.
#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "No route matches the path '{}'", path)]
    PathNotFound { path: String },
    #[display(fmt = "Board '{}' not found", board_name)]
    BoardNotFound { board_name: String },
    #[display(fmt = "Thread #{} not found", thread_id)]
    ThreadNotFound { thread_id: ThreadId },
    #[display(fmt = "Board #{} has no threads", board_id)]
    BoardEmpty { board_id: BoardId },
    #[display(fmt = "Couldn't parse form data")]
    FormDataCouldntParse,
    #[display(fmt = "Board '{}' (#{}) is configured more than once", name, id)]
    DuplicateBoard { name: String, id: BoardId },
    #[display(fmt = "'{}' must be at least 1", name)]
    ZeroLimit { name: &'static str },
    #[display(fmt = "The in-memory store was poisoned by a panicking request")]
    StorePoisoned,
    #[display(fmt = "No transaction is open")]
    NoTransaction,
    #[display(fmt = "Couldn't launch the server: {}", msg)]
    Launch { msg: String },
    #[display(fmt = "YAML error: {}", _0)]
    #[from]
    YamlError(serde_yaml::Error),
    #[display(fmt = "Couldn't initialize logging: {}", _0)]
    #[from]
    LogError(log::SetLoggerError),
    #[display(fmt = "Database connection pool error: {}", _0)]
    #[from]
    R2d2Error(diesel::r2d2::PoolError),
    #[display(fmt = "Database error: {}", _0)]
    #[from]
    DatabaseError(diesel::result::Error),
    #[display(fmt = "Database migration error: {}", _0)]
    #[from]
    DatabaseMigrationError(Box<dyn std::error::Error + Send + Sync>),
    #[display(fmt = "I/O error: {}", _0)]
    #[from]
    IoError(std::io::Error),
    #[display(fmt = "I/O error: {}: {}", msg, cause)]
    IoErrorMsg { cause: std::io::Error, msg: String },
}

impl Error {
    pub fn from_io_error<S>(cause: std::io::Error, msg: S) -> Error
    where
        S: Into<String>,
    {
        Error::IoErrorMsg {
            cause,
            msg: msg.into(),
        }
    }

    /// Whether this error means the requested thing doesn't exist, as opposed
    /// to the store failing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::PathNotFound { .. }
                | Error::BoardNotFound { .. }
                | Error::ThreadNotFound { .. }
                | Error::BoardEmpty { .. }
        )
    }
}

impl std::error::Error for Error {}

/// Our result type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_kinds() {
        assert!(Error::ThreadNotFound { thread_id: 3 }.is_not_found());
        assert!(Error::PathNotFound { path: "/x".into() }.is_not_found());
        assert!(!Error::StorePoisoned.is_not_found());
        assert!(!Error::DatabaseError(diesel::result::Error::RollbackTransaction)
            .is_not_found());
    }

    #[test]
    fn display_messages() {
        let err = Error::ThreadNotFound { thread_id: 12 };
        assert_eq!(err.to_string(), "Thread #12 not found");
    }
}
