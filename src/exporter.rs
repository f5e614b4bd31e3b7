#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Autograder flavours.
//!
//! An [`Exporter`] knows the handful of snippets a generated notebook needs
//! to talk to its autograder: how to initialise it, how to run one test
//! file or all of them, how to export or submit, and what config file sits
//! next to the notebook. The format is picked once per run through
//! [`AutograderFormat`].

use std::{fmt::Display, path::Path, str::FromStr};

use serde_json::{Value, json};

use crate::{
    config::{ExamConfig, ExportOptions},
    error::{ConfigError, ExamError, Result},
    notebook::Cell,
};

/// Markdown shown above the check-all cell.
const CHECK_ALL_INSTRUCTIONS: &str =
    "To double-check your work, the cell below will rerun all of the autograder tests.";

/// The supported autograder ecosystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutograderFormat {
    /// Otter-Grader.
    #[default]
    Otter,
    /// OkPy.
    OkPy,
}

impl FromStr for AutograderFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "otter" => Ok(AutograderFormat::Otter),
            "ok" => Ok(AutograderFormat::OkPy),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

impl Display for AutograderFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutograderFormat::Otter => write!(f, "otter"),
            AutograderFormat::OkPy => write!(f, "ok"),
        }
    }
}

impl AutograderFormat {
    /// The exporter implementing this format.
    pub fn exporter(self) -> Box<dyn Exporter> {
        match self {
            AutograderFormat::Otter => Box::new(Otter),
            AutograderFormat::OkPy => Box::new(OkPy),
        }
    }
}

/// Format-specific pieces of a generated notebook.
pub trait Exporter {
    /// Which format this is.
    fn format(&self) -> AutograderFormat;

    /// Source of the cell that sets up the autograder client.
    ///
    /// * `config_file`: name of the file written by [`Exporter::write_config`]
    fn init_source(&self, config_file: &str) -> String;

    /// Source of the cell that runs every test.
    fn check_all_source(&self) -> String;

    /// Markdown introducing the export/submit cell.
    fn submission_text(&self) -> String;

    /// Source of the export/submit cell.
    fn export_source(&self, options: &ExportOptions) -> String;

    /// Source of the cell that runs the test named `name`.
    fn test_source(&self, name: &str) -> String;

    /// Writes the client config next to `notebook_path`, returning its file
    /// name.
    fn write_config(&self, notebook_path: &Path, config: &ExamConfig) -> Result<String>;

    /// Locked init cell.
    fn init_cell(&self, config_file: &str) -> Cell {
        Cell::code(self.init_source(config_file)).locked()
    }

    /// Locked instructions and check-all cells.
    fn check_all_cells(&self) -> Vec<Cell> {
        vec![
            Cell::markdown(CHECK_ALL_INSTRUCTIONS).locked(),
            Cell::code(self.check_all_source()).locked(),
        ]
    }

    /// Locked instructions and export cells, followed by an empty buffer
    /// cell.
    fn export_cells(&self, options: &ExportOptions) -> Vec<Cell> {
        let mut instructions = self.submission_text();
        if !options.instructions.is_empty() {
            instructions.push_str("\n\n");
            instructions.push_str(&options.instructions);
        }

        vec![
            Cell::markdown(instructions).locked(),
            Cell::code(self.export_source(options)).locked(),
            Cell::markdown(" "),
        ]
    }

    /// Locked cell running one test.
    fn test_cell(&self, name: &str) -> Cell {
        Cell::code(self.test_source(name)).locked()
    }
}

/// Serializes `value` to `path` as pretty JSON.
fn write_json(path: &Path, value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).map_err(|e| ExamError::io(path, e))
}

/// File name component of a path, lossily converted.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Otter-Grader: `otter.Notebook`, `grader.check`, and a `.otter` file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Otter;

impl Exporter for Otter {
    fn format(&self) -> AutograderFormat {
        AutograderFormat::Otter
    }

    fn init_source(&self, _config_file: &str) -> String {
        "# Initialize Otter\nimport otter\ngrader = otter.Notebook()".to_string()
    }

    fn check_all_source(&self) -> String {
        "grader.check_all()".to_string()
    }

    fn submission_text(&self) -> String {
        "## Submission\n\nMake sure you have run all cells in your notebook in order before \
         running the cell below, so that all images/graphs appear in the output. The cell below \
         will generate a zipfile for you to submit. **Please save before exporting!**"
            .to_string()
    }

    fn export_source(&self, options: &ExportOptions) -> String {
        let call = if !options.filtering {
            "grader.export(filtering=False)"
        } else if !options.pdf {
            "grader.export(pdf=False)"
        } else {
            "grader.export()"
        };
        format!("# Save your notebook first, then run this cell to export your submission.\n{call}")
    }

    fn test_source(&self, name: &str) -> String {
        format!("grader.check(\"{name}\")")
    }

    fn write_config(&self, notebook_path: &Path, config: &ExamConfig) -> Result<String> {
        let mut otter = serde_json::Map::new();

        if let Some(service) = &config.service {
            otter.insert("endpoint".into(), json!(service.endpoint));
            otter.insert("auth".into(), json!(service.auth));
            otter.insert("assignment_id".into(), service.assignment_id.clone());
            otter.insert("class_id".into(), service.class_id.clone());
        }

        let notebook = config
            .service
            .as_ref()
            .and_then(|s| s.notebook.clone())
            .unwrap_or_else(|| file_name(notebook_path));
        otter.insert("notebook".into(), json!(notebook));
        otter.insert("save_environment".into(), json!(config.save_environment));
        otter.insert("ignore_modules".into(), json!(config.ignore_modules));
        if let Some(variables) = config.variables.as_ref().filter(|v| !v.is_empty()) {
            otter.insert("variables".into(), Value::Object(variables.clone()));
        }

        let path = notebook_path.with_extension("otter");
        write_json(&path, &Value::Object(otter))?;
        Ok(file_name(&path))
    }
}

/// OkPy: `client.api.notebook.Notebook`, `ok.grade`, and a `.ok` file.
#[derive(Debug, Clone, Copy, Default)]
pub struct OkPy;

impl Exporter for OkPy {
    fn format(&self) -> AutograderFormat {
        AutograderFormat::OkPy
    }

    fn init_source(&self, config_file: &str) -> String {
        format!(
            "# Initialize OK\nfrom client.api.notebook import Notebook\nok = Notebook(\"{config_file}\")"
        )
    }

    fn check_all_source(&self) -> String {
        [
            "# For your convenience, you can run this cell to run all the tests at once!",
            "import os",
            "print(\"Running all tests...\")",
            "_ = [ok.grade(q[:-3]) for q in sorted(os.listdir(\"tests\")) if q.endswith(\".py\") and q != \"__init__.py\"]",
            "print(\"Finished running all tests.\")",
        ]
        .join("\n")
    }

    fn submission_text(&self) -> String {
        "## Submission\n\nOnce you're finished, select \"Save and Checkpoint\" in the File menu and \
         then execute the submit cell below. The result will contain a link that you can use to \
         check that your assignment has been submitted successfully."
            .to_string()
    }

    fn export_source(&self, _options: &ExportOptions) -> String {
        "# Save your notebook first, then run this cell to submit.\n_ = ok.submit()".to_string()
    }

    fn test_source(&self, name: &str) -> String {
        format!("ok.grade(\"{name}\");")
    }

    fn write_config(&self, notebook_path: &Path, config: &ExamConfig) -> Result<String> {
        let endpoint = config
            .ok_endpoint()
            .ok_or(ConfigError::Missing("endpoint"))?;
        let name = notebook_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let ok = json!({
            "name": name,
            "endpoint": endpoint,
            "src": [file_name(notebook_path)],
            "tests": { "tests/*.py": "ok_test" },
            "protocols": ["file_contents", "grading", "backup"],
        });

        let path = notebook_path.with_extension("ok");
        write_json(&path, &ok)?;
        Ok(file_name(&path))
    }
}
