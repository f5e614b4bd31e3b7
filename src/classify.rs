#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Recognises delimiter, test, and solution cells in a master notebook.

use std::{fmt::Display, sync::LazyLock};

use itertools::Itertools;
use regex::{Regex, RegexBuilder};
use serde::de::DeserializeOwned;

use crate::{error::ConfigError, notebook::Cell};

/// The structural blocks a master notebook is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    /// Global exam configuration.
    Exam,
    /// Cells placed before the questions.
    Introduction,
    /// One question, holding one or more versions.
    Question,
    /// One interchangeable variant of a question.
    Version,
    /// Cells placed after the questions.
    Conclusion,
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Block::Exam => "EXAM",
            Block::Introduction => "INTRODUCTION",
            Block::Question => "QUESTION",
            Block::Version => "VERSION",
            Block::Conclusion => "CONCLUSION",
        };
        write!(f, "{name}")
    }
}

impl Block {
    /// Maps the keyword captured by [`DELIMITER_RE`] to a block.
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "EXAM" => Some(Block::Exam),
            "INTRODUCTION" => Some(Block::Introduction),
            "QUESTION" => Some(Block::Question),
            "VERSION" => Some(Block::Version),
            "CONCLUSION" => Some(Block::Conclusion),
            _ => None,
        }
    }
}

/// A parsed delimiter line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter {
    /// Which block the delimiter belongs to.
    pub block: Block,
    /// `true` for BEGIN, `false` for END.
    pub begin: bool,
}

/// Compiles a case-insensitive pattern.
fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

/// `BEGIN QUESTION`, `end version`, ...
static DELIMITER_RE: LazyLock<Regex> = LazyLock::new(|| {
    case_insensitive(r"^\s*(BEGIN|END)\s+(EXAM|INTRODUCTION|QUESTION|VERSION|CONCLUSION)\s*$")
});

/// `## TEST ##`, `# HIDDEN TEST`, ...
static TEST_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    case_insensitive(r"^\s*(##\s*(hidden\s*)?test\s*##|#\s*(hidden\s*)?test)\s*$")
});

/// `**Solution:**` or `<strong>Solution</strong>` at the start of a line.
static MD_SOLUTION_RE: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(r"^\s*(<strong>|\*{2})solution:?(</strong>|\*{2})"));

/// Marks a test cell as hidden.
static HIDDEN_RE: LazyLock<Regex> = LazyLock::new(|| case_insensitive("hidden"));

/// Parses the first line of a raw cell as a delimiter, if it is one.
pub fn delimiter(cell: &Cell) -> Option<Delimiter> {
    if !cell.is_raw() {
        return None;
    }
    let caps = DELIMITER_RE.captures(cell.first_line())?;
    Some(Delimiter {
        block: Block::from_keyword(&caps[2])?,
        begin: caps[1].eq_ignore_ascii_case("begin"),
    })
}

/// Whether `cell` is the BEGIN (or END) delimiter of `block`.
pub fn is_delimiter(cell: &Cell, block: Block, begin: bool) -> bool {
    delimiter(cell) == Some(Delimiter { block, begin })
}

/// Whether `cell` is a code cell whose first line is a test header.
pub fn is_test_cell(cell: &Cell) -> bool {
    cell.is_code() && TEST_HEADER_RE.is_match(cell.first_line())
}

/// Whether a test header line declares the test hidden.
pub fn is_hidden_header(line: &str) -> bool {
    HIDDEN_RE.is_match(line)
}

/// Whether `cell` is a Markdown cell containing a solution marker.
pub fn is_markdown_solution_cell(cell: &Cell) -> bool {
    cell.is_markdown() && cell.lines().iter().any(|l| MD_SOLUTION_RE.is_match(l))
}

/// Reads the YAML body (every line after the first) of a delimiter cell.
///
/// An empty body, or one holding only comments, yields `T::default()`.
pub fn extract_delimiter_config<T>(cell: &Cell, block: Block) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    let body = cell.lines().into_iter().skip(1).join("\n");
    if body.trim().is_empty() {
        return Ok(T::default());
    }

    let malformed = |source| ConfigError::Malformed { block, source };
    let value: serde_yaml::Value = serde_yaml::from_str(&body).map_err(malformed)?;
    if value.is_null() {
        return Ok(T::default());
    }
    serde_yaml::from_value(value).map_err(malformed)
}
