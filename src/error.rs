//! Centralised error hierarchy for the **HULK interpreter**.
//!
//! Every stage of the pipeline (scanner, parser, evaluator) converts its
//! failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic
//! inter‑operation with `anyhow` in the binary, while still preserving the
//! category, message and source offset a front end needs to draw a caret.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

/// Finer classification of evaluation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticKind {
    /// An operator or builtin received an operand of the wrong type.
    Type,

    /// A variable was referenced outside of any `let` binding it.
    UndeclaredVariable,

    /// A call names something that is neither a builtin nor a declared function.
    NotAFunction,

    /// The function exists, but not with the number of arguments supplied.
    WrongArity,

    /// A non overwritable (or builtin) function was declared again.
    Redefinition,

    /// The nested call ceiling was reached.
    StackLimitExceeded,
}

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HulkError {
    /// Lexical (scanner) error.  Carries the whole line, since scanning can
    /// stop before any other stage has seen it.
    #[error("{message}")]
    Lexical {
        /// Human‑readable description.
        message: String,

        /// The source line being scanned.
        line: String,

        /// 0‑based character offset of the offending character.
        offset: usize,
    },

    /// Syntactic (parser) error.
    #[error("{message}")]
    Syntax {
        message: String,
        offset: Option<usize>,
    },

    /// Runtime evaluation error.
    #[error("{message}")]
    Semantic {
        kind: SemanticKind,
        message: String,
        offset: Option<usize>,
    },

    /// Wrapper around `std::io::Error` (transparent).  Raised when the output
    /// sink used by `print` fails.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Anything the core did not anticipate; always a defect in the core.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HulkError {
    /// Helper constructor for the **scanner**.
    pub fn lexical<L, S>(line: L, offset: usize, msg: S) -> Self
    where
        L: Into<String>,
        S: Into<String>,
    {
        let message: String = msg.into();

        info!("Creating Lexical error: offset={}, msg={}", offset, message);

        HulkError::Lexical {
            message,
            line: line.into(),
            offset,
        }
    }

    /// Helper constructor for the **parser**.
    pub fn syntax<S: Into<String>>(offset: Option<usize>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Syntax error: offset={:?}, msg={}", offset, message);

        HulkError::Syntax { message, offset }
    }

    /// Helper constructor for the **evaluator** and the environment.
    pub fn semantic<S: Into<String>>(kind: SemanticKind, offset: Option<usize>, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Semantic error: kind={:?}, offset={:?}, msg={}",
            kind, offset, message
        );

        HulkError::Semantic {
            kind,
            message,
            offset,
        }
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Internal error: {}", message);

        HulkError::Internal(message)
    }

    /// Fixed label a front end shows next to the message.
    pub fn category(&self) -> &'static str {
        match self {
            HulkError::Lexical { .. } => "LEXICAL ERROR",
            HulkError::Syntax { .. } => "SYNTAX ERROR",
            HulkError::Semantic { .. } => "SEMANTIC ERROR",
            HulkError::Io(_) | HulkError::Internal(_) => "UNHANDLED ERROR",
        }
    }

    /// Character offset into the line, when one is known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            HulkError::Lexical { offset, .. } => Some(*offset),
            HulkError::Syntax { offset, .. } | HulkError::Semantic { offset, .. } => *offset,
            HulkError::Io(_) | HulkError::Internal(_) => None,
        }
    }

    pub fn semantic_kind(&self) -> Option<SemanticKind> {
        match self {
            HulkError::Semantic { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// `true` for errors that point at a defect rather than at bad input.
    pub fn is_unhandled(&self) -> bool {
        matches!(self, HulkError::Io(_) | HulkError::Internal(_))
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, HulkError>;
