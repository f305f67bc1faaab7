//! Error type shared by every query entry point.
//!
//! Errors fall into four groups, see [`ErrorKind`]. Internal inconsistencies
//! (a missing fanin cut set, a cone node without a CNF variable) are not
//! represented here: they are bugs and abort with a panic.

use thiserror::Error;

use crate::table::StorageFull;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// Invalid parameter, rejected before any work is done.
    Usage,
    /// The network is not in the representation the query needs.
    Precondition,
    /// BDD or SAT resources ran out; the answer is unknown.
    ResourceExhausted,
    /// Malformed network description.
    Parse,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid cut bounds: k = {k}, l = {l} (expected {expected})")]
    InvalidCutBounds {
        k: usize,
        l: usize,
        expected: &'static str,
    },

    #[error("output index {index} is out of range (the network has {count} outputs)")]
    OutputOutOfRange { index: usize, count: usize },

    #[error("input index {index} is out of range (the network has {count} inputs)")]
    InputOutOfRange { index: usize, count: usize },

    #[error("invalid BDD storage size: {bits} bits (expected 1..=31)")]
    InvalidStorageBits { bits: usize },

    #[error("the network is not a structurally hashed AIG (run strash first)")]
    NotStrashed,

    #[error("the network has no BDD representation (run collapse first)")]
    MissingBdd,

    #[error("BDD node limit reached while {stage}: {source}")]
    BddNodeLimit {
        stage: String,
        #[source]
        source: StorageFull,
    },

    #[error("inconclusive result for output {output}, input {input}: {reason}")]
    Inconclusive {
        output: usize,
        input: usize,
        reason: String,
    },

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unsupported feature: {0}")]
    Unsupported(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidCutBounds { .. }
            | Error::OutputOutOfRange { .. }
            | Error::InputOutOfRange { .. }
            | Error::InvalidStorageBits { .. } => ErrorKind::Usage,
            Error::NotStrashed | Error::MissingBdd => ErrorKind::Precondition,
            Error::BddNodeLimit { .. } | Error::Inconclusive { .. } => ErrorKind::ResourceExhausted,
            Error::Parse { .. } | Error::Unsupported(_) => ErrorKind::Parse,
        }
    }

    pub(crate) fn bdd_limit(stage: impl Into<String>, source: StorageFull) -> Self {
        Error::BddNodeLimit {
            stage: stage.into(),
            source,
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}
