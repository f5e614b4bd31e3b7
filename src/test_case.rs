#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Extraction of test records from `# TEST` cells.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{classify::is_hidden_header, notebook::Cell};

/// One test belonging to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    /// Code to evaluate, without the header line.
    pub input:           String,
    /// Output the code produced in the master notebook.
    pub expected_output: String,
    /// Whether students get to see this test.
    pub hidden:          bool,
}

impl Test {
    /// Whether the test is shown to students.
    pub fn is_public(&self) -> bool {
        !self.hidden
    }
}

/// Appends a string-or-list-of-strings JSON value to `out`.
fn push_text(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Array(parts) => parts
            .iter()
            .filter_map(Value::as_str)
            .for_each(|s| out.push_str(s)),
        _ => {}
    }
}

/// Reads a test cell into a [`Test`].
///
/// The header line decides visibility; the remaining lines are the input;
/// every stream text and `text/plain` representation among the captured
/// outputs, in order, makes up the expected output.
pub fn read_test(cell: &Cell) -> Test {
    let lines = cell.lines();
    let hidden = is_hidden_header(lines[0]);
    let input = lines[1..].join("\n");

    let mut expected_output = String::new();
    for output in cell.outputs.iter().flatten() {
        if let Some(text) = output.get("text") {
            push_text(&mut expected_output, text);
        }
        if let Some(plain) = output.get("data").and_then(|d| d.get("text/plain")) {
            push_text(&mut expected_output, plain);
        }
    }

    Test {
        input,
        expected_output,
        hidden,
    }
}
