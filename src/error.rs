//! Error types for hwpmerge library.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for hwpmerge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading, merging, or writing packages.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is neither a flat HML document nor an HWPX archive.
    #[error("Unknown package format: expected HML markup or an HWPX archive")]
    UnknownFormat,

    /// A package part is not well-formed XML.
    #[error("Malformed XML in {part} at byte {position}: {message}")]
    Xml {
        part: String,
        position: u64,
        message: String,
    },

    /// The archive container could not be read or written.
    #[error("Archive error: {0}")]
    Archive(String),

    /// A source fragment could not be extracted.
    #[error("Extraction failed for fragment {fragment}: {reason}")]
    Extraction { fragment: usize, reason: String },

    /// A fragment references an identifier it never declares.
    #[error("Fragment {fragment}: dangling {namespace} reference '{id}' on <{element}>")]
    Reconciliation {
        fragment: usize,
        namespace: String,
        id: String,
        element: String,
    },

    /// A namespace ran out of global identifiers while renumbering a fragment.
    #[error("Fragment {fragment}: no free {namespace} index left for local entry {id}")]
    IdSpaceExhausted {
        fragment: usize,
        namespace: String,
        id: String,
    },

    /// A required container is missing from the target skeleton.
    #[error("{}", placement_message(*.fragment, .container, .reason))]
    Placement {
        fragment: Option<usize>,
        container: String,
        reason: String,
    },

    /// A declared count could not be reconciled with the container's children.
    #[error("Count invariant on <{container}> {attribute}: expected {expected}, found {actual} ({reason})")]
    CountInvariant {
        container: String,
        attribute: String,
        expected: usize,
        actual: usize,
        reason: String,
    },

    /// The template is missing a required placeholder or is structurally unusable.
    #[error("Template error: {0}")]
    Template(String),

    /// Error while rendering the output package or report.
    #[error("Serialization error: {0}")]
    Serialize(String),
}

fn placement_message(fragment: Option<usize>, container: &str, reason: &str) -> String {
    match fragment {
        Some(index) => format!("Placement failed for fragment {index} in <{container}>: {reason}"),
        None => format!("Placement failed in <{container}>: {reason}"),
    }
}

/// Coarse error taxonomy reported to callers of a merge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Extraction,
    Reconciliation,
    Placement,
    CountInvariant,
    Template,
    /// Input/output, archive, or markup failures outside the merge stages.
    Input,
    Output,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Extraction => "ExtractionError",
            ErrorKind::Reconciliation => "ReconciliationError",
            ErrorKind::Placement => "PlacementError",
            ErrorKind::CountInvariant => "CountInvariantError",
            ErrorKind::Template => "TemplateError",
            ErrorKind::Input => "InputError",
            ErrorKind::Output => "OutputError",
        };
        f.write_str(name)
    }
}

impl Error {
    /// The taxonomy tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Extraction { .. } => ErrorKind::Extraction,
            Error::Reconciliation { .. } | Error::IdSpaceExhausted { .. } => {
                ErrorKind::Reconciliation
            }
            Error::Placement { .. } => ErrorKind::Placement,
            Error::CountInvariant { .. } => ErrorKind::CountInvariant,
            Error::Template(_) => ErrorKind::Template,
            Error::Io(_) | Error::UnknownFormat | Error::Xml { .. } | Error::Archive(_) => {
                ErrorKind::Input
            }
            Error::Serialize(_) => ErrorKind::Output,
        }
    }

    /// The source fragment that raised this error, if any.
    pub fn fragment(&self) -> Option<usize> {
        match self {
            Error::Extraction { fragment, .. }
            | Error::Reconciliation { fragment, .. }
            | Error::IdSpaceExhausted { fragment, .. } => Some(*fragment),
            Error::Placement { fragment, .. } => *fragment,
            _ => None,
        }
    }

    pub(crate) fn placement(
        fragment: Option<usize>,
        container: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::Placement {
            fragment,
            container: container.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn extraction(fragment: usize, reason: impl Into<String>) -> Self {
        Error::Extraction {
            fragment,
            reason: reason.into(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Archive(err.to_string()),
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Archive(format!("invalid base64 payload: {}", err))
    }
}
