//! Error types for the rewrite pipeline.

use std::path::Path;

use derive_more::{Display, From};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Display, Debug, From)]
#[display("{kind}")]
pub struct Error {
    #[from]
    kind: Box<ErrorKind>,
}

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(error: E) -> Self {
        Error {
            kind: Box::new(ErrorKind::from(error)),
        }
    }
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        ErrorKind::NotFound(what.to_string()).into()
    }

    pub fn malformed(msg: impl std::fmt::Display) -> Self {
        ErrorKind::MalformedStructure(msg.to_string()).into()
    }

    pub fn ambiguous_target(name: impl std::fmt::Display) -> Self {
        ErrorKind::AmbiguousTarget(name.to_string()).into()
    }

    pub fn backend(msg: impl std::fmt::Display) -> Self {
        ErrorKind::Backend(msg.to_string()).into()
    }

    pub fn config(msg: impl std::fmt::Display) -> Self {
        ErrorKind::Config(msg.to_string()).into()
    }

    pub fn parse(path: &Path, msg: impl std::fmt::Display) -> Self {
        ErrorKind::Parse(format!("{}: {msg}", path.display())).into()
    }

    pub fn io(path: &Path, error: std::io::Error) -> Self {
        ErrorKind::Io(format!("{}: {error}", path.display())).into()
    }
}

#[derive(Display, Debug)]
pub enum ErrorKind {
    /// A required structural node or source unit does not exist.
    #[display("not found: {_0}")]
    NotFound(String),

    /// A recognized node's internal shape does not match the supported
    /// router vocabulary.
    #[display("malformed structure: {_0}")]
    MalformedStructure(String),

    /// More than one type alias matches the configured target name.
    #[display("ambiguous target: more than one type alias named `{_0}`")]
    AmbiguousTarget(String),

    /// The external declaration emitter reported diagnostics or produced
    /// no output.
    #[display("declaration emission failed: {_0}")]
    Backend(String),

    #[display("configuration error: {_0}")]
    Config(String),

    #[display("failed to parse {_0}")]
    Parse(String),

    #[display("I/O error: {_0}")]
    Io(String),

    #[display("invalid JSON: {_0}")]
    Json(serde_json::Error),
}

impl From<serde_json::Error> for ErrorKind {
    fn from(error: serde_json::Error) -> Self {
        ErrorKind::Json(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &*self.kind {
            ErrorKind::Json(e) => Some(e),
            _ => None,
        }
    }
}
