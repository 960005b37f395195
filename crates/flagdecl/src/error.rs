//! Misconfiguration errors.
//!
//! These are bugs in the embedding application (bad names, bad placements,
//! malformed schema documents). Problems with what an end user typed are not
//! errors; they come back as [`crate::Outcome::Failure`].

use flagdecl_optparse::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Option names must be identifier tokens (`[A-Za-z_][A-Za-z0-9_]*`).
    #[error("option name must be an identifier: {0:?}")]
    InvalidName(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Placement other than `normal`/`on`, `head` or `tail`.
    #[error("you must pass normal, head, or tail as a placement, got {0:?}")]
    InvalidPlacement(String),

    /// A short or long flag pattern the tokenizer cannot use.
    #[error("option {name:?}: {source}")]
    Pattern {
        name: String,
        #[source]
        source: ParseError,
    },

    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
