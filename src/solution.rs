#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Removes instructor solutions from cells.
//!
//! Code cells understand the following markers:
//!
//! * `x = 5 # SOLUTION` becomes `x = ...`, and `f(x) # SOLUTION` becomes
//!   `...`, keeping indentation.
//! * `# BEGIN SOLUTION` ... `# END SOLUTION` collapses to a single `...`
//!   line. `# BEGIN SOLUTION NO PROMPT` drops the block without a
//!   placeholder.
//! * Lines ending in `# SOLUTION NO PROMPT`, `# BEGIN PROMPT`, or `# END
//!   PROMPT` are dropped.
//!
//! Markdown cells with a bold `Solution:` marker are replaced wholesale by
//! an answer placeholder.

use std::sync::LazyLock;

use regex::Regex;

use crate::{classify::is_markdown_solution_cell, error::StructureError, notebook::Cell};

/// Replacement for a Markdown solution cell.
pub const MARKDOWN_ANSWER_PLACEHOLDER: &str = "_Type your answer here, replacing this text._";

/// Closes a multi-line solution block.
const END_SOLUTION: &str = "# END SOLUTION";

/// Prompt scaffolding markers; lines ending in these never reach students.
const SKIP_SUFFIXES: [&str; 3] = ["# SOLUTION NO PROMPT", "# BEGIN PROMPT", "# END PROMPT"];

/// `name = value # SOLUTION`
static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*[a-zA-Z0-9_ ]*=)(.*) #[ ]?SOLUTION\s*$").expect("valid assignment pattern")
});

/// `expression # SOLUTION`
static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)([^#\n]+) #[ ]?SOLUTION\s*$").expect("valid solution line pattern")
});

/// `# BEGIN SOLUTION` with an optional `NO PROMPT` modifier.
static BEGIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)# BEGIN SOLUTION( NO PROMPT)?\s*$").expect("valid begin solution pattern")
});

/// Rewrites a single line carrying an inline solution marker.
fn replace_inline(line: &str) -> String {
    if let Some(caps) = ASSIGNMENT_RE.captures(line) {
        return format!("{} ...", &caps[1]);
    }
    if let Some(caps) = LINE_RE.captures(line) {
        return format!("{}...", &caps[1]);
    }
    line.to_string()
}

/// Strips solutions from the lines of a code cell.
pub fn replace_solutions<S: AsRef<str>>(lines: &[S]) -> Result<Vec<String>, StructureError> {
    let mut stripped = Vec::with_capacity(lines.len());
    // line number of the open BEGIN SOLUTION, if any
    let mut open: Option<usize> = None;

    for (index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let number = index + 1;
        let trimmed = line.trim_end();

        if SKIP_SUFFIXES.iter().any(|s| trimmed.ends_with(s)) {
            continue;
        }

        if trimmed.ends_with(END_SOLUTION) {
            if open.take().is_none() {
                return Err(StructureError::UnmatchedEndSolution { line: number });
            }
            continue;
        }

        if let Some(caps) = BEGIN_RE.captures(line) {
            if open.is_some() {
                return Err(StructureError::NestedSolution { line: number });
            }
            open = Some(number);
            if caps.get(2).is_none() {
                stripped.push(format!("{}...", &caps[1]));
            }
            continue;
        }

        if open.is_none() {
            stripped.push(replace_inline(line));
        }
    }

    match open {
        Some(line) => Err(StructureError::UnterminatedSolution { line }),
        None => Ok(stripped),
    }
}

/// Returns a copy of `cell` with its solutions removed.
///
/// Markdown solution cells become [`MARKDOWN_ANSWER_PLACEHOLDER`], code cells
/// go through [`replace_solutions`], and anything else is copied as is.
pub fn strip_cell(cell: &Cell) -> Result<Cell, StructureError> {
    if is_markdown_solution_cell(cell) {
        return Ok(Cell::markdown(MARKDOWN_ANSWER_PLACEHOLDER));
    }

    let mut stripped = cell.clone();
    if cell.is_code() {
        stripped.source = replace_solutions(&cell.lines())?.join("\n");
    }
    Ok(stripped)
}
