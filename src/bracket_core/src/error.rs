//! Library errors

use std::path::PathBuf;

use thiserror::Error;

/// Library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, playing, loading or saving brackets.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot parse {field} {value:?}: {reason}")]
    Parse {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("corrupt bracket at {team}: {reason}")]
    CorruptBracket { team: String, reason: String },

    #[error("topology error: {0}")]
    Topology(String),

    #[error("game is not ready: both slots must be filled before it is resolved")]
    GameNotReady,

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn parse(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::Parse {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(team: impl ToString, reason: impl Into<String>) -> Self {
        Error::CorruptBracket {
            team: team.to_string(),
            reason: reason.into(),
        }
    }

    /// Map an i/o failure on `path`, separating a missing file from other failures.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path)
        } else {
            Error::Io { path, source }
        }
    }
}
