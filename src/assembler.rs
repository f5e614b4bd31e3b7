#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Builds student exams and the autograder notebook from a parsed [`Exam`].
//!
//! Every student gets a random subset of the questions in a random order,
//! with one version drawn per question. The autograder notebook carries
//! every version of every question with solutions and the full test files.

use std::path::{Path, PathBuf};

use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha20Rng;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, object::Rows},
};
use tracing::{debug, info};
use which::which;

use crate::{
    artifact::TestArtifact,
    config::{GenerateConfig, RunOptions},
    error::{ConfigError, ExamError, Result},
    exporter::Exporter,
    model::Exam,
    notebook::{Cell, Notebook},
    parser::parse_notebook,
};

/// Name of the directory holding the autograder notebook.
pub const AUTOGRADER_DIR: &str = "autograder";

/// Name of the test artifact subdirectory.
pub const TESTS_DIR: &str = "tests";

/// How many hash characters the summary table shows.
const HASH_PREFIX: usize = 12;

/// One question placed into a generated notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Index of the question in the master notebook.
    pub question: usize,
    /// Index of the version within the question.
    pub version:  usize,
    /// Content hash of the version.
    pub hash:     String,
}

/// A generated notebook plus the test files that go with it.
#[derive(Debug, Clone)]
pub struct RenderedExam {
    /// The notebook itself.
    pub notebook:   Notebook,
    /// Test files for the `tests/` directory.
    pub artifacts:  Vec<TestArtifact>,
    /// Question and version chosen for each position.
    pub selections: Vec<Selection>,
}

/// `### Question n`
fn question_header(number: usize) -> Cell {
    Cell::markdown(format!("### Question {number}"))
}

/// `#### Version n`
fn version_header(number: usize) -> Cell {
    Cell::markdown(format!("#### Version {number}"))
}

/// Turns a parsed exam into output notebooks.
///
/// The assembler borrows the exam mutably because drawing versions
/// advances each question's rotation; that state carries over from one
/// instance to the next.
pub struct Assembler<'e> {
    /// The exam being rendered.
    exam:     &'e mut Exam,
    /// Autograder flavour.
    exporter: Box<dyn Exporter>,
    /// Source of every random choice in the run.
    rng:      ChaCha20Rng,
}

impl<'e> Assembler<'e> {
    /// Creates an assembler whose choices are fully determined by `seed`.
    pub fn new(exam: &'e mut Exam, exporter: Box<dyn Exporter>, seed: u64) -> Self {
        Self {
            exam,
            exporter,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Builds one student notebook with `question_count` questions.
    ///
    /// * `config_file`: name of the autograder config file next to the
    ///   notebook, referenced by the init cell
    pub fn generate_instance(
        &mut self,
        question_count: usize,
        config_file: &str,
    ) -> Result<RenderedExam> {
        let Exam {
            config,
            questions,
            introduction,
            conclusion,
            metadata,
        } = &mut *self.exam;

        if question_count > questions.len() {
            return Err(ConfigError::Invalid {
                key:    "num_questions",
                reason: format!(
                    "{question_count} requested but the master notebook has {}",
                    questions.len()
                ),
            }
            .into());
        }

        let mut order: Vec<usize> = (0..questions.len()).collect();
        order.shuffle(&mut self.rng);
        order.truncate(question_count);

        let mut cells = Vec::new();
        let mut artifacts = Vec::new();
        let mut selections = Vec::with_capacity(question_count);

        if config.init_cell {
            cells.push(self.exporter.init_cell(config_file));
        }
        cells.extend(introduction.iter().cloned());

        for (position, &index) in order.iter().enumerate() {
            cells.push(question_header(position + 1));

            let question = &mut questions[index];
            let (points, manual) = (question.points(), question.manual());
            let (version_index, version) = question.choose_version(&mut self.rng);
            let parsed = version.ensure_parsed()?;
            let hash = version.hash();

            cells.extend(parsed.cells(false).iter().cloned());

            if !manual && config.public_tests {
                cells.push(self.exporter.test_cell(&hash));
                artifacts.push(TestArtifact::new(&hash, points, parsed.tests()).without_hidden());
            }

            selections.push(Selection {
                question: index,
                version: version_index,
                hash,
            });
        }

        cells.extend(conclusion.iter().cloned());

        if config.check_all_cell && config.public_tests {
            cells.extend(self.exporter.check_all_cells());
        }
        if let Some(options) = config.export_cell.options() {
            cells.extend(self.exporter.export_cells(&options));
        }

        let mut notebook = Notebook::from_cells(cells);
        notebook.metadata = metadata.clone();
        notebook.clear_outputs();

        Ok(RenderedExam {
            notebook,
            artifacts,
            selections,
        })
    }

    /// Builds the notebook holding every question and version with
    /// solutions, along with complete test files for every non-manual
    /// version.
    pub fn generate_autograder_document(&self, config_file: &str) -> Result<RenderedExam> {
        let config = &self.exam.config;
        let mut cells = Vec::new();
        let mut artifacts = Vec::new();
        let mut selections = Vec::new();

        if config.init_cell {
            cells.push(self.exporter.init_cell(config_file));
        }
        cells.extend(self.exam.introduction.iter().cloned());

        for (index, question) in self.exam.questions.iter().enumerate() {
            cells.push(question_header(index + 1));

            for (version_index, version) in question.versions().iter().enumerate() {
                cells.push(version_header(version_index + 1));

                let parsed = version.ensure_parsed()?;
                let hash = version.hash();
                cells.extend(parsed.cells(true).iter().cloned());

                if !question.manual() {
                    cells.push(self.exporter.test_cell(&hash));
                    artifacts.push(TestArtifact::new(&hash, question.points(), parsed.tests()));
                }

                selections.push(Selection {
                    question: index,
                    version: version_index,
                    hash,
                });
            }
        }

        cells.extend(self.exam.conclusion.iter().cloned());

        if config.check_all_cell {
            cells.extend(self.exporter.check_all_cells());
        }
        if let Some(options) = config.export_cell.options() {
            cells.extend(self.exporter.export_cells(&options));
        }

        let mut notebook = Notebook::from_cells(cells);
        notebook.metadata = self.exam.metadata.clone();

        Ok(RenderedExam {
            notebook,
            artifacts,
            selections,
        })
    }

    /// Generates a student notebook into `dir` and writes it with its
    /// config file and, if public tests are on, its `tests/` directory.
    pub fn write_instance(
        &mut self,
        dir: &Path,
        notebook_name: &str,
        question_count: usize,
    ) -> Result<RenderedExam> {
        create_dir(dir)?;
        let notebook_path = dir.join(notebook_name);
        let config_file = self
            .exporter
            .write_config(&notebook_path, &self.exam.config)?;

        let rendered = self.generate_instance(question_count, &config_file)?;
        let with_tests = self.exam.config.public_tests;
        write_rendered(&rendered, dir, &notebook_path, with_tests)?;
        Ok(rendered)
    }

    /// Generates the autograder notebook into `dir` and writes it with its
    /// config file and full `tests/` directory.
    pub fn write_autograder(&self, dir: &Path, notebook_name: &str) -> Result<RenderedExam> {
        create_dir(dir)?;
        let notebook_path = dir.join(notebook_name);
        let config_file = self
            .exporter
            .write_config(&notebook_path, &self.exam.config)?;

        let rendered = self.generate_autograder_document(&config_file)?;
        write_rendered(&rendered, dir, &notebook_path, true)?;
        Ok(rendered)
    }
}

/// `create_dir_all` with the path attached to errors.
fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| ExamError::io(dir, e))
}

/// Writes the notebook and, when `with_tests`, every artifact.
fn write_rendered(
    rendered: &RenderedExam,
    dir: &Path,
    notebook_path: &Path,
    with_tests: bool,
) -> Result<()> {
    if with_tests {
        let tests_dir = dir.join(TESTS_DIR);
        create_dir(&tests_dir)?;
        for artifact in &rendered.artifacts {
            artifact.write(&tests_dir)?;
        }
    }
    rendered.notebook.write(notebook_path)
}

/// One row of the run summary table.
#[derive(Tabled, Debug, Clone)]
struct SelectionRow {
    /// Output directory.
    #[tabled(rename = "Exam")]
    exam:     String,
    /// One-based position in the exam.
    #[tabled(rename = "Position")]
    position: usize,
    /// One-based question number in the master.
    #[tabled(rename = "Question")]
    question: usize,
    /// One-based version number.
    #[tabled(rename = "Version")]
    version:  usize,
    /// Hash prefix of the version.
    #[tabled(rename = "Hash")]
    hash:     String,
}

/// What a run produced.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    /// Seed the run used.
    pub seed:       u64,
    /// Path of the autograder notebook.
    pub autograder: PathBuf,
    /// Student exam directories with their selections, in order.
    pub instances:  Vec<(PathBuf, Vec<Selection>)>,
}

impl Summary {
    /// Renders the selections as a table.
    pub fn table(&self) -> String {
        let rows: Vec<SelectionRow> = self
            .instances
            .iter()
            .flat_map(|(dir, selections)| {
                let exam = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                selections
                    .iter()
                    .enumerate()
                    .map(move |(i, s)| SelectionRow {
                        exam:     exam.clone(),
                        position: i + 1,
                        question: s.question + 1,
                        version:  s.version + 1,
                        hash:     s.hash.chars().take(HASH_PREFIX).collect(),
                    })
            })
            .collect();

        Table::new(&rows)
            .with(Panel::header("Generated Exams"))
            .with(Panel::footer(format!(
                "{} exam(s), seed {}",
                self.instances.len(),
                self.seed
            )))
            .with(
                Modify::new(Rows::first())
                    .with(Alignment::center())
                    .with(Alignment::center_vertical()),
            )
            .with(Style::modern())
            .to_string()
    }
}

/// Runs the external `otter` command that bundles the autograder for a
/// grading platform, from inside `dir`.
pub fn package_autograder(dir: &Path, config: &GenerateConfig) -> Result<()> {
    let otter = which("otter").map_err(|e| {
        ExamError::Packaging(format!("cannot find `otter` on PATH ({e}); is otter-grader installed?"))
    })?;

    let args = config.command_args();
    debug!("Running {} {}", otter.display(), args.join(" "));

    let status = std::process::Command::new(&otter)
        .args(&args)
        .current_dir(dir)
        .status()
        .map_err(|e| ExamError::io(&otter, e))?;

    if !status.success() {
        return Err(ExamError::Packaging(format!("`otter` exited with {status}")));
    }
    Ok(())
}

/// Reads the master notebook, writes the autograder notebook and every
/// student exam under the result directory, and runs the packaging step
/// if the exam asks for it.
///
/// Configuration and the whole master notebook are checked before the
/// first file is written.
pub fn run(options: &RunOptions) -> Result<Summary> {
    let master = Notebook::read(options.master())?;
    let notebook_name = options
        .master()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ConfigError::Invalid {
            key:    "master",
            reason: format!("{} is not a file path", options.master().display()),
        })?;

    let mut exam = parse_notebook(&master)?;
    let batch = exam.config.validate(options.format())?;
    if batch.num_questions > exam.questions.len() {
        return Err(ConfigError::Invalid {
            key:    "num_questions",
            reason: format!(
                "{} requested but the master notebook has {} question(s)",
                batch.num_questions,
                exam.questions.len()
            ),
        }
        .into());
    }
    exam.parse_versions()?;

    let seed = options.resolve_seed(&exam.config);
    let generate = exam.config.generate.clone();
    let exporter = options.format().exporter();
    info!(
        "Generating {} exam(s) of {} question(s) in {} format with seed {}",
        batch.num_students,
        batch.num_questions,
        exporter.format(),
        seed
    );

    let result = options.result();
    let autograder_dir = result.join(AUTOGRADER_DIR);
    let mut summary = Summary {
        seed,
        autograder: autograder_dir.join(&notebook_name),
        instances: Vec::with_capacity(batch.num_students),
    };

    let mut assembler = Assembler::new(&mut exam, exporter, seed);
    assembler.write_autograder(&autograder_dir, &notebook_name)?;

    for i in 0..batch.num_students {
        if (i + 1) % 50 == 0 && !options.quiet() {
            info!("Generating exam {}", i + 1);
        }
        let dir = result.join(format!("exam_{i}"));
        let rendered = assembler.write_instance(&dir, &notebook_name, batch.num_questions)?;
        summary.instances.push((dir, rendered.selections));
    }

    if let Some(generate) = generate {
        if !options.quiet() {
            info!("Generating autograder zip file...");
        }
        package_autograder(&autograder_dir, &generate)?;
    }

    Ok(summary)
}
