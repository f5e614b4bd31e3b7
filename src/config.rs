#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Exam, question, and run configuration.
//!
//! [`ExamConfig`] comes from the YAML body of the `BEGIN EXAM` cell,
//! [`QuestionConfig`] from each `BEGIN QUESTION` cell. [`RunOptions`] holds
//! what the caller decides for one invocation.

use std::path::{Path, PathBuf};

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error::ConfigError, exporter::AutograderFormat};

/// Seed used when neither the caller nor the exam config provides one.
pub const DEFAULT_SEED: u64 = 42;

/// Directory results are written to when none is given.
pub const DEFAULT_RESULT_DIR: &str = "dist";

/// Global exam options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamConfig {
    /// How many exam instances to generate.
    pub num_students:     Option<usize>,
    /// How many questions each instance gets.
    pub num_questions:    Option<usize>,
    /// Seed for question and version selection.
    pub seed:             Option<u64>,
    /// Whether instances include public tests.
    pub public_tests:     bool,
    /// Whether to emit the autograder init cell.
    pub init_cell:        bool,
    /// Whether to emit the check-all cells.
    pub check_all_cell:   bool,
    /// Export cell toggle or options.
    pub export_cell:      ExportCell,
    /// Submission service details.
    pub service:          Option<ServiceConfig>,
    /// OkPy endpoint, when not given under `service`.
    pub endpoint:         Option<String>,
    /// Whether students' environments are serialized on export.
    pub save_environment: bool,
    /// Modules left out of environment serialization.
    pub ignore_modules:   Vec<String>,
    /// Variable type hints passed through to the autograder.
    pub variables:        Option<Map<String, Value>>,
    /// Options for the packaging post-pass; absent disables it.
    pub generate:         Option<GenerateConfig>,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            num_students:     None,
            num_questions:    None,
            seed:             None,
            public_tests:     false,
            init_cell:        true,
            check_all_cell:   true,
            export_cell:      ExportCell::default(),
            service:          None,
            endpoint:         None,
            save_environment: false,
            ignore_modules:   Vec::new(),
            variables:        None,
            generate:         None,
        }
    }
}

/// Instance counts confirmed by [`ExamConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize {
    /// Number of exam instances.
    pub num_students:  usize,
    /// Questions per instance.
    pub num_questions: usize,
}

impl ExamConfig {
    /// Checks that every key the run needs is present.
    pub fn validate(&self, format: AutograderFormat) -> Result<BatchSize, ConfigError> {
        let num_students = self
            .num_students
            .ok_or(ConfigError::Missing("num_students"))?;
        let num_questions = self
            .num_questions
            .ok_or(ConfigError::Missing("num_questions"))?;

        if format == AutograderFormat::OkPy && self.ok_endpoint().is_none() {
            return Err(ConfigError::Missing("endpoint"));
        }

        Ok(BatchSize {
            num_students,
            num_questions,
        })
    }

    /// The OkPy endpoint, preferring the top-level key over `service`.
    pub fn ok_endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .or_else(|| self.service.as_ref().map(|s| s.endpoint.as_str()))
    }
}

/// `export_cell: false`, `export_cell: true`, or a mapping of options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportCell {
    /// Plain on/off switch.
    Toggle(bool),
    /// Enabled with explicit options.
    Options(ExportOptions),
}

impl Default for ExportCell {
    fn default() -> Self {
        ExportCell::Toggle(true)
    }
}

impl ExportCell {
    /// Effective options, or `None` when the export cell is disabled.
    pub fn options(&self) -> Option<ExportOptions> {
        match self {
            ExportCell::Toggle(false) => None,
            ExportCell::Toggle(true) => Some(ExportOptions::default()),
            ExportCell::Options(options) => Some(options.clone()),
        }
    }
}

/// Options for the export/submit cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Extra instructions appended to the submission text.
    pub instructions: String,
    /// Whether a PDF is included in the export.
    pub pdf:          bool,
    /// Whether the PDF is filtered to tagged cells.
    pub filtering:    bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            instructions: String::new(),
            pdf:          true,
            filtering:    true,
        }
    }
}

/// Submission service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service URL.
    pub endpoint:      String,
    /// Authentication provider.
    #[serde(default = "default_auth")]
    pub auth:          String,
    /// Assignment identifier; a string or a number.
    #[serde(default)]
    pub assignment_id: Value,
    /// Class identifier; a string or a number.
    #[serde(default)]
    pub class_id:      Value,
    /// Notebook name reported to the service, if not the master's name.
    #[serde(default)]
    pub notebook:      Option<String>,
}

/// Serde default for [`ServiceConfig::auth`].
fn default_auth() -> String {
    "google".to_string()
}

/// Options forwarded to the autograder packaging command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Total point override.
    pub points:         Option<f64>,
    /// Pass/fail threshold.
    pub threshold:      Option<f64>,
    /// Show test stdout to students.
    pub show_stdout:    bool,
    /// Show hidden test results to students.
    pub show_hidden:    bool,
    /// Grade from the environment log instead of re-executing.
    pub grade_from_log: bool,
    /// Seed used when re-executing notebooks.
    pub seed:           Option<u64>,
    /// Manually graded PDF upload settings.
    pub pdfs:           Option<PdfConfig>,
    /// Support files to bundle.
    pub files:          Vec<String>,
    /// Serialized variable type hints.
    pub variables:      Option<Map<String, Value>>,
}

/// Where to upload PDFs of manually graded questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Course identifier.
    pub course_id:     Value,
    /// Assignment identifier.
    pub assignment_id: Value,
    /// Whether PDFs are filtered.
    #[serde(default = "default_true")]
    pub filtering:     bool,
}

/// Serde default returning `true`.
fn default_true() -> bool {
    true
}

/// Renders an id that may be a YAML string or number.
fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl GenerateConfig {
    /// Arguments for `otter` that build the grading platform bundle.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = vec!["generate".to_string(), "autograder".to_string()];

        if let Some(points) = self.points {
            args.extend(["--points".to_string(), points.to_string()]);
        }
        if let Some(threshold) = self.threshold {
            args.extend(["--threshold".to_string(), threshold.to_string()]);
        }
        if self.show_stdout {
            args.push("--show-stdout".to_string());
        }
        if self.show_hidden {
            args.push("--show-hidden".to_string());
        }
        if self.grade_from_log {
            args.push("--grade-from-log".to_string());
        }
        if let Some(seed) = self.seed {
            args.extend(["--seed".to_string(), seed.to_string()]);
        }
        if let Some(pdfs) = &self.pdfs {
            args.extend(["--course-id".to_string(), id_string(&pdfs.course_id)]);
            args.extend(["--assignment-id".to_string(), id_string(&pdfs.assignment_id)]);
            if !pdfs.filtering {
                args.push("--unfiltered-pdfs".to_string());
            }
        }
        args.extend(self.files.iter().cloned());
        if let Some(variables) = &self.variables {
            args.extend([
                "--serialized-variables".to_string(),
                Value::Object(variables.clone()).to_string(),
            ]);
        }

        args
    }
}

/// Per-question options from a `BEGIN QUESTION` cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionConfig {
    /// Points the question is worth.
    pub points: f64,
    /// Whether the question is graded by hand.
    pub manual: bool,
}

impl Default for QuestionConfig {
    fn default() -> Self {
        Self {
            points: 1.0,
            manual: false,
        }
    }
}

impl QuestionConfig {
    /// Checks that the question is worth a positive, finite number of
    /// points.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.points.is_finite() || self.points <= 0.0 {
            return Err(ConfigError::Invalid {
                key:    "points",
                reason: format!("{} is not a positive number", self.points),
            });
        }
        Ok(())
    }
}

/// What one invocation of the generator should do.
#[derive(Debug, Clone, Builder)]
#[builder(on(PathBuf, into))]
pub struct RunOptions {
    /// Path to the master notebook.
    master: PathBuf,
    /// Directory the results go to.
    #[builder(default = PathBuf::from(DEFAULT_RESULT_DIR))]
    result: PathBuf,
    /// Autograder flavour of the generated notebooks.
    #[builder(default)]
    format: AutograderFormat,
    /// Seed override.
    seed:   Option<u64>,
    /// Suppress progress output.
    #[builder(default)]
    quiet:  bool,
}

impl RunOptions {
    /// Path to the master notebook.
    pub fn master(&self) -> &Path {
        &self.master
    }

    /// Directory the results go to.
    pub fn result(&self) -> &Path {
        &self.result
    }

    /// Selected autograder format.
    pub fn format(&self) -> AutograderFormat {
        self.format
    }

    /// Whether progress output is suppressed.
    pub fn quiet(&self) -> bool {
        self.quiet
    }

    /// Seed for this run: the override, else the exam's, else
    /// [`DEFAULT_SEED`].
    pub fn resolve_seed(&self, config: &ExamConfig) -> u64 {
        self.seed.or(config.seed).unwrap_or(DEFAULT_SEED)
    }
}
