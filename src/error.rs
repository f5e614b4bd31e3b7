#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Error types surfaced by the exam pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::classify::Block;

/// Convenience alias used throughout the crate.
pub type Result<T, E = ExamError> = std::result::Result<T, E>;

/// Top level error for parsing and assembling exams.
#[derive(Error, Debug)]
pub enum ExamError {
    /// The master notebook is not laid out correctly.
    #[error("Malformed master notebook: {0}")]
    Structure(#[from] StructureError),

    /// The exam or question configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A question was built without any versions.
    #[error("Question {index} has no versions")]
    EmptyQuestion {
        /// Zero-based position of the question in the master notebook.
        index: usize,
    },

    /// A test artifact on disk could not be read back.
    #[error("Could not parse test artifact {path}: {message}")]
    Artifact {
        /// Path of the offending artifact.
        path:    PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The external packaging command failed or is unavailable.
    #[error("Autograder packaging failed: {0}")]
    Packaging(String),

    /// Filesystem failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being read or written.
        path:   PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Notebook or config JSON failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExamError {
    /// Wraps an I/O error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Violations of the delimiter and solution marker grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    /// A BEGIN delimiter appeared where that block may not start.
    #[error("BEGIN {block} found inside {open} block (cell {cell})")]
    UnexpectedBegin {
        /// Block being opened.
        block: Block,
        /// Block that was already open, or `no` at top level.
        open:  String,
        /// Index of the delimiter cell.
        cell:  usize,
    },

    /// An END delimiter with no matching BEGIN.
    #[error("END {block} found outside {block} block (cell {cell})")]
    UnmatchedEnd {
        /// Block being closed.
        block: Block,
        /// Index of the delimiter cell.
        cell:  usize,
    },

    /// A content cell outside every block.
    #[error("Cell {cell} found outside a block: {preview:?}")]
    CellOutsideBlock {
        /// Index of the cell.
        cell:    usize,
        /// First line of the cell.
        preview: String,
    },

    /// The notebook ended with a block still open.
    #[error("BEGIN {block} has no matching END {block}")]
    UnclosedBlock {
        /// Block left open.
        block: Block,
    },

    /// Cells inside a question that belong to none of its declared versions.
    #[error("{count} cell(s) in question {question} are outside any version block")]
    StrayCells {
        /// Zero-based question index.
        question: usize,
        /// Number of orphaned cells.
        count:    usize,
    },

    /// BEGIN EXAM appeared more than once.
    #[error("BEGIN EXAM found more than once (cell {cell})")]
    DuplicateExamConfig {
        /// Index of the second delimiter.
        cell: usize,
    },

    /// BEGIN SOLUTION inside another solution block.
    #[error("Nested BEGIN SOLUTION at line {line}")]
    NestedSolution {
        /// One-based line in the cell.
        line: usize,
    },

    /// BEGIN SOLUTION never closed.
    #[error("BEGIN SOLUTION at line {line} has no END SOLUTION")]
    UnterminatedSolution {
        /// One-based line of the opening marker.
        line: usize,
    },

    /// END SOLUTION without an opening marker.
    #[error("END SOLUTION without BEGIN SOLUTION at line {line}")]
    UnmatchedEndSolution {
        /// One-based line in the cell.
        line: usize,
    },
}

/// Problems with the exam configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required key is absent.
    #[error("missing required key `{0}`")]
    Missing(&'static str),

    /// A key is present but its value can't be used.
    #[error("invalid value for `{key}`: {reason}")]
    Invalid {
        /// Offending key.
        key:    &'static str,
        /// Explanation.
        reason: String,
    },

    /// The requested autograder format does not exist.
    #[error("autograder format `{0}` is invalid; expected `otter` or `ok`")]
    UnknownFormat(String),

    /// The YAML body of a delimiter cell failed to parse.
    #[error("malformed config in BEGIN {block} cell: {source}")]
    Malformed {
        /// Block whose body failed to parse.
        block:  Block,
        /// Parser error.
        source: serde_yaml::Error,
    },
}
