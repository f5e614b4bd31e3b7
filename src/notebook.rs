#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! A minimal Jupyter notebook (nbformat v4) model.
//!
//! Only the parts the exam pipeline touches are typed. Everything else a
//! cell carries (ids, attachments, execution counts) rides along in
//! `extra` so that reading and writing a notebook does not lose data.

use std::{fmt::Display, path::Path};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ExamError, Result};

/// Major nbformat version written by this crate.
pub const NBFORMAT: u32 = 4;
/// Minor nbformat version written by this crate.
pub const NBFORMAT_MINOR: u32 = 4;

/// The three cell kinds Jupyter knows about.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    /// Executable code.
    Code,
    /// Rendered Markdown.
    Markdown,
    /// Uninterpreted text; used for delimiters.
    Raw,
}

impl Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellType::Code => write!(f, "code"),
            CellType::Markdown => write!(f, "markdown"),
            CellType::Raw => write!(f, "raw"),
        }
    }
}

/// A single notebook cell.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Cell {
    /// Kind of the cell.
    pub cell_type: CellType,
    /// Cell metadata.
    #[serde(default)]
    pub metadata:  Map<String, Value>,
    /// Source text, normalised to a single string.
    #[serde(serialize_with = "serialize_source", deserialize_with = "deserialize_source")]
    pub source:    String,
    /// Captured outputs; only code cells have them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs:   Option<Vec<Value>>,
    /// Any other keys present on the cell.
    #[serde(flatten)]
    pub extra:     Map<String, Value>,
}

/// On-disk shapes of a cell's `source` field.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSource {
    /// A single string.
    Text(String),
    /// A list of lines, each keeping its trailing newline.
    Lines(Vec<String>),
}

/// Joins the list form of `source` back into one string.
fn deserialize_source<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawSource::deserialize(deserializer)? {
        RawSource::Text(text) => text,
        RawSource::Lines(lines) => lines.concat(),
    })
}

/// Writes `source` in the list-of-lines form nbformat itself produces.
fn serialize_source<S>(source: &str, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(source.split_inclusive('\n'))
}

impl Cell {
    /// Builds a cell of the given type with empty metadata.
    fn with_type(cell_type: CellType, source: impl Into<String>) -> Self {
        let mut extra = Map::new();
        let outputs = if cell_type == CellType::Code {
            extra.insert("execution_count".into(), Value::Null);
            Some(Vec::new())
        } else {
            None
        };

        Self {
            cell_type,
            metadata: Map::new(),
            source: source.into(),
            outputs,
            extra,
        }
    }

    /// A new code cell.
    pub fn code(source: impl Into<String>) -> Self {
        Self::with_type(CellType::Code, source)
    }

    /// A new Markdown cell.
    pub fn markdown(source: impl Into<String>) -> Self {
        Self::with_type(CellType::Markdown, source)
    }

    /// A new raw cell.
    pub fn raw(source: impl Into<String>) -> Self {
        Self::with_type(CellType::Raw, source)
    }

    /// Attaches outputs to a cell, returning it.
    pub fn with_outputs(mut self, outputs: Vec<Value>) -> Self {
        self.outputs = Some(outputs);
        self
    }

    /// Source split on newlines. Always yields at least one (possibly empty)
    /// line.
    pub fn lines(&self) -> Vec<&str> {
        self.source.split('\n').collect()
    }

    /// First line of the source.
    pub fn first_line(&self) -> &str {
        self.source.split('\n').next().unwrap_or_default()
    }

    /// Whether this is a code cell.
    pub fn is_code(&self) -> bool {
        self.cell_type == CellType::Code
    }

    /// Whether this is a Markdown cell.
    pub fn is_markdown(&self) -> bool {
        self.cell_type == CellType::Markdown
    }

    /// Whether this is a raw cell.
    pub fn is_raw(&self) -> bool {
        self.cell_type == CellType::Raw
    }

    /// Drops captured outputs and the execution count.
    pub fn clear_outputs(&mut self) {
        if let Some(outputs) = self.outputs.as_mut() {
            outputs.clear();
            self.extra.insert("execution_count".into(), Value::Null);
        }
    }

    /// Marks the cell as neither editable nor deletable.
    pub fn lock(&mut self) {
        self.metadata.insert("editable".into(), Value::Bool(false));
        self.metadata.insert("deletable".into(), Value::Bool(false));
    }

    /// Returns the cell locked.
    pub fn locked(mut self) -> Self {
        self.lock();
        self
    }

    /// Whether [`Cell::lock`] has been applied.
    pub fn is_locked(&self) -> bool {
        self.metadata.get("editable") == Some(&Value::Bool(false))
            && self.metadata.get("deletable") == Some(&Value::Bool(false))
    }
}

/// A whole notebook document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notebook {
    /// Ordered cells.
    pub cells:          Vec<Cell>,
    /// Notebook-level metadata (kernel spec and friends).
    #[serde(default)]
    pub metadata:       Map<String, Value>,
    /// Major format version.
    #[serde(default = "default_nbformat")]
    pub nbformat:       u32,
    /// Minor format version.
    #[serde(default = "default_nbformat_minor")]
    pub nbformat_minor: u32,
}

/// Serde default for [`Notebook::nbformat`].
fn default_nbformat() -> u32 {
    NBFORMAT
}

/// Serde default for [`Notebook::nbformat_minor`].
fn default_nbformat_minor() -> u32 {
    NBFORMAT_MINOR
}

impl Default for Notebook {
    fn default() -> Self {
        Self::new()
    }
}

impl Notebook {
    /// An empty notebook.
    pub fn new() -> Self {
        Self {
            cells:          Vec::new(),
            metadata:       Map::new(),
            nbformat:       NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
        }
    }

    /// A notebook holding `cells`.
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            ..Self::new()
        }
    }

    /// Parses a notebook from its JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Renders the notebook as JSON with nbformat's one-space indent.
    pub fn to_json(&self) -> Result<String> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        let mut text = String::from_utf8_lossy(&out).into_owned();
        text.push('\n');
        Ok(text)
    }

    /// Reads a notebook from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ExamError::io(path, e))?;
        Self::from_json(&text)
    }

    /// Writes the notebook to disk, replacing any existing file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|e| ExamError::io(path, e))
    }

    /// Clears outputs of every cell.
    pub fn clear_outputs(&mut self) {
        self.cells.iter_mut().for_each(Cell::clear_outputs);
    }
}
