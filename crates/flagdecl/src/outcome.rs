use flagdecl_optparse::ParseError;
use std::fmt;

/// Exit status used for every user-input failure.
pub const USAGE_EXIT_CODE: i32 = 2;

/// Result of one resolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Parsing and validation passed; carries the leftover arguments.
    Success(Vec<String>),
    /// A switch declared with `exit` matched. Processing stopped right there.
    Exit(i32),
    Failure(Failure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn leftovers(&self) -> Option<&[String]> {
        match self {
            Self::Success(rest) => Some(rest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MissingRequired,
    InvalidValue,
    InvalidOption,
    MissingArgument,
    NeedlessArgument,
    AmbiguousOption,
}

/// A user-input violation, with the message and help text a front end should print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    pub help: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            help: help.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        USAGE_EXIT_CODE
    }

    /// Map a tokenizer error. Pattern errors are misconfiguration and have no kind.
    pub(crate) fn from_parse_error(err: &ParseError, help: &str) -> Option<Self> {
        let kind = match err {
            ParseError::InvalidOption(_) => FailureKind::InvalidOption,
            ParseError::MissingArgument(_) => FailureKind::MissingArgument,
            ParseError::NeedlessArgument(_) => FailureKind::NeedlessArgument,
            ParseError::AmbiguousOption(_) => FailureKind::AmbiguousOption,
            ParseError::InvalidPattern(_) => return None,
        };
        Some(Self::new(kind, err.to_string(), help))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
