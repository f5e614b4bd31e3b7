#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! OK-format test files.
//!
//! Each non-manual version gets a `tests/<hash>.py` file holding a single
//! `test = {...}` assignment. The file is rendered from a [`TestArtifact`]
//! and read back with a small grammar for Python literals, so editing an
//! artifact never means running it.

use std::path::{Path, PathBuf};

use glob::glob;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    error::{ExamError, Result},
    test_case::Test,
};

/// Lines starting with these continue the previous statement.
const CONTINUATION_KEYWORDS: [&str; 5] = ["except:", "except ", "elif ", "else:", "finally:"];

/// Indent step of the rendered literal.
const INDENT: usize = 4;

/// One doctest case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    /// Interactive-session transcript followed by the expected output.
    pub code:   String,
    /// Whether the case is hidden from students.
    pub hidden: bool,
    /// Whether the case is locked.
    pub locked: bool,
}

/// A group of cases run together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    /// Cases in order.
    pub cases:    Vec<Case>,
    /// Whether the suite counts towards the score.
    pub scored:   bool,
    /// Code run before the cases.
    #[serde(default)]
    pub setup:    String,
    /// Code run after the cases.
    #[serde(default)]
    pub teardown: String,
    /// Suite type; always `doctest` here.
    #[serde(rename = "type")]
    pub kind:     String,
}

/// The contents of one test file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestArtifact {
    /// Test name, which is also the file stem.
    pub name:   String,
    /// Points the test is worth.
    pub points: f64,
    /// Suites in order.
    pub suites: Vec<Suite>,
}

/// Turns source lines into `>>>` / `...` prompted transcript lines.
///
/// Indented lines, `else:`-style clauses, and lines after a trailing
/// backslash continue the previous statement.
pub fn to_doctest(input: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for line in input.split('\n') {
        let continues = line.starts_with(' ')
            || line.starts_with('\t')
            || CONTINUATION_KEYWORDS.iter().any(|k| line.starts_with(k))
            || lines.last().is_some_and(|l| l.trim().ends_with('\\'));
        let prompt = if continues { "..." } else { ">>>" };
        lines.push(format!("{prompt} {line}"));
    }

    lines
}

/// Builds a case from a test.
///
/// A non-empty line followed by a new statement gets a trailing `;` so the
/// session does not echo its value.
fn case_from_test(test: &Test) -> Case {
    let mut lines = to_doctest(&test.input);

    for i in 0..lines.len().saturating_sub(1) {
        let current = lines[i].trim();
        if lines[i + 1].starts_with(">>>") && current.len() > 3 && !current.ends_with('\\') {
            lines[i].push(';');
        }
    }
    lines.push(test.expected_output.clone());

    Case {
        code:   lines.join("\n"),
        hidden: test.hidden,
        locked: false,
    }
}

impl TestArtifact {
    /// Builds the artifact for one version's tests.
    pub fn new(name: impl Into<String>, points: f64, tests: &[Test]) -> Self {
        let suite = Suite {
            cases:    tests.iter().map(case_from_test).collect(),
            scored:   true,
            setup:    String::new(),
            teardown: String::new(),
            kind:     "doctest".to_string(),
        };

        Self {
            name: name.into(),
            points,
            suites: vec![suite],
        }
    }

    /// File name of the artifact.
    pub fn file_name(&self) -> String {
        format!("{}.py", self.name)
    }

    /// Removes every hidden case from every suite.
    pub fn strip_hidden(&mut self) {
        for suite in &mut self.suites {
            suite.cases.retain(|case| !case.hidden);
        }
    }

    /// A copy without hidden cases.
    pub fn without_hidden(&self) -> Self {
        let mut stripped = self.clone();
        stripped.strip_hidden();
        stripped
    }

    /// Number of cases across all suites.
    pub fn case_count(&self) -> usize {
        self.suites.iter().map(|s| s.cases.len()).sum()
    }

    /// The file contents: `test = ` followed by a Python literal.
    pub fn render(&self) -> Result<String> {
        let value = serde_json::to_value(self)?;
        let mut out = String::from("test = ");
        render_value(&value, 0, &mut out);
        out.push('\n');
        Ok(out)
    }

    /// Parses file contents produced by [`TestArtifact::render`].
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let value = python_literal::artifact(text).map_err(|e| e.to_string())?;
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    /// Reads an artifact file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ExamError::io(path, e))?;
        Self::parse(&text).map_err(|message| ExamError::Artifact {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Writes the artifact into `dir`, returning the file path.
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.file_name());
        std::fs::write(&path, self.render()?).map_err(|e| ExamError::io(&path, e))?;
        debug!("Wrote {} case(s) to {}", self.case_count(), path.display());
        Ok(path)
    }
}

/// Rewrites every artifact in `dir` without its hidden cases.
///
/// `__init__.py` is left alone. Returns how many files were rewritten.
pub fn strip_hidden_dir(dir: impl AsRef<Path>) -> Result<usize> {
    let dir = dir.as_ref();
    let pattern = dir.join("*.py");
    let pattern = pattern.to_string_lossy();

    let paths = glob(&pattern).map_err(|e| ExamError::Artifact {
        path:    dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut rewritten = 0;
    for path in paths.filter_map(std::result::Result::ok) {
        if path.file_name().is_some_and(|n| n == "__init__.py") {
            continue;
        }
        let mut artifact = TestArtifact::read(&path)?;
        artifact.strip_hidden();
        std::fs::write(&path, artifact.render()?).map_err(|e| ExamError::io(&path, e))?;
        rewritten += 1;
    }
    Ok(rewritten)
}

/// Appends `value` as a Python literal, block-indented at `level`.
fn render_value(value: &Value, level: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&n.to_string()),
        // JSON string escapes are a subset of Python's
        Value::String(s) => out.push_str(&Value::String(s.clone()).to_string()),
        Value::Array(items) => {
            render_sequence(items.iter(), ("[", "]"), level, out, |item, level, out| {
                render_value(item, level, out)
            })
        }
        Value::Object(map) => render_map(map, level, out),
    }
}

/// Renders a dict literal.
fn render_map(map: &Map<String, Value>, level: usize, out: &mut String) {
    render_sequence(map.iter(), ("{", "}"), level, out, |(key, value), level, out| {
        out.push_str(&Value::String(key.clone()).to_string());
        out.push_str(": ");
        render_value(value, level, out);
    })
}

/// Renders a bracketed, one-item-per-line sequence.
fn render_sequence<I, T, F>(items: I, brackets: (&str, &str), level: usize, out: &mut String, item: F)
where
    I: ExactSizeIterator<Item = T>,
    F: Fn(T, usize, &mut String),
{
    let (open, close) = brackets;
    if items.len() == 0 {
        out.push_str(open);
        out.push_str(close);
        return;
    }

    let inner = " ".repeat((level + 1) * INDENT);
    out.push_str(open);
    out.push('\n');
    let count = items.len();
    for (i, entry) in items.enumerate() {
        out.push_str(&inner);
        item(entry, level + 1, out);
        if i + 1 < count {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&" ".repeat(level * INDENT));
    out.push_str(close);
}

peg::parser! {
    /// Python literal syntax, as far as test files use it.
    grammar python_literal() for str {
        /// whitespace and comments
        rule _() = quiet!{([' ' | '\t' | '\r' | '\n'] / comment())*}

        /// a `#` comment up to the end of the line
        rule comment() = "#" (!"\n" [_])*

        /// the whole file: `test = <literal>`
        pub rule artifact() -> Value
            = _ "test" _ "=" _ v:value() _ ![_] { v }

        /// any literal
        rule value() -> Value
            = dict() / list() / s:string() { Value::String(s) } / constant() / number()

        /// `{ "key": value, ... }`
        rule dict() -> Value
            = "{" _ entries:(entry() ** (_ "," _)) _ ","? _ "}"
            { Value::Object(entries.into_iter().collect()) }

        /// `"key": value`
        rule entry() -> (String, Value)
            = k:string() _ ":" _ v:value() { (k, v) }

        /// `[ value, ... ]`
        rule list() -> Value
            = "[" _ items:(value() ** (_ "," _)) _ ","? _ "]" { Value::Array(items) }

        /// adjacent string literals concatenate, optionally wrapped in
        /// parentheses the way `pprint` splits long strings
        rule string() -> String
            = "(" _ parts:(quoted() ++ _) _ ")" { parts.concat() }
            / parts:(quoted() ++ _) { parts.concat() }

        /// one single- or double-quoted literal
        rule quoted() -> String
            = "\"" c:(escape() / [^ '"' | '\\' | '\n'])* "\"" { c.into_iter().collect() }
            / "'" c:(escape() / [^ '\'' | '\\' | '\n'])* "'" { c.into_iter().collect() }

        /// a backslash escape
        rule escape() -> char
            = "\\" e:(
                "n" { '\n' }
                / "t" { '\t' }
                / "r" { '\r' }
                / "b" { '\u{8}' }
                / "f" { '\u{c}' }
                / "0" { '\0' }
                / "\\" { '\\' }
                / "'" { '\'' }
                / "\"" { '"' }
                / "x" h:$(hex()*<2>) {? code_point(h) }
                / "u" h:$(hex()*<4>) {? code_point(h) }
                / "U" h:$(hex()*<8>) {? code_point(h) }
            ) { e }

        /// one hex digit
        rule hex() = ['0'..='9' | 'a'..='f' | 'A'..='F']

        /// `True`, `False`, `None`
        rule constant() -> Value
            = "True" { Value::Bool(true) }
            / "False" { Value::Bool(false) }
            / "None" { Value::Null }

        /// integers and floats
        rule number() -> Value
            = n:$("-"? ['0'..='9']+ ("." ['0'..='9']*)? (['e' | 'E'] ['+' | '-']? ['0'..='9']+)?)
            {? serde_json::from_str::<Value>(n.trim_end_matches('.')).or(Err("number")) }
    }
}

/// Decodes a hex escape into a char.
fn code_point(hex: &str) -> std::result::Result<char, &'static str> {
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or("valid code point")
}
