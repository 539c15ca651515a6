//! Rich diagnostic error types for chainkb.
//!
//! The core assert/retract/ask paths never fail: a missing retraction target
//! is a no-op and an invalid query yields an empty answer. Errors come from
//! the surfaces around the core (parsing, file I/O, configuration) and from
//! the consistency checker.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for chainkb.
#[derive(Debug, Error, Diagnostic)]
pub enum KbError {
    #[error("parse error on line {line}: {message}")]
    #[diagnostic(
        code(chainkb::parse),
        help(
            "Facts are written `fact: (pred a b)` and rules \
             `rule: ((pred ?x ?y) (pred ?y ?z)) -> (pred ?x ?z)`. \
             Variables start with `?`; lines starting with `#` are comments."
        )
    )]
    Parse { line: usize, message: String },

    #[error("invalid query: {query}")]
    #[diagnostic(
        code(chainkb::invalid_query),
        help("Only fact-shaped statements can be asked. Rules cannot be queried.")
    )]
    InvalidQuery { query: String },

    #[error("failed to read {path}")]
    #[diagnostic(
        code(chainkb::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {message}")]
    #[diagnostic(
        code(chainkb::config),
        help(
            "The session config is TOML with the optional keys \
             `log_filter`, `preload` and `show_support`."
        )
    )]
    Config { path: String, message: String },

    #[error("knowledge base is inconsistent: {message}")]
    #[diagnostic(
        code(chainkb::inconsistent),
        help(
            "A justification edge and its back reference disagree. \
             This is a bug in the knowledge base; please file a report \
             with the sequence of assertions and retractions that led here."
        )
    )]
    Inconsistent { message: String },
}

/// Convenience result type for chainkb operations.
pub type KbResult<T> = std::result::Result<T, KbError>;
