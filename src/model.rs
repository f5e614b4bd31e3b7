#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The in-memory exam: questions, their versions, and the cells around
//! them.

use std::sync::OnceLock;

use rand::Rng;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::{
    classify::is_test_cell,
    config::{ExamConfig, QuestionConfig},
    error::{ExamError, Result, StructureError},
    notebook::Cell,
    solution::strip_cell,
    test_case::{Test, read_test},
};

/// A version after its cells have been split into tests and content.
#[derive(Debug, Clone)]
pub struct ParsedVersion {
    /// Tests found among the raw cells.
    tests:                     Vec<Test>,
    /// Non-test cells, solutions intact.
    content_with_solutions:    Vec<Cell>,
    /// Non-test cells, solutions removed.
    content_without_solutions: Vec<Cell>,
}

impl ParsedVersion {
    /// Splits `cells` into tests and both content projections.
    fn from_cells(cells: &[Cell]) -> Result<Self, StructureError> {
        let mut tests = Vec::new();
        let mut content_with_solutions = Vec::new();
        let mut content_without_solutions = Vec::new();

        for cell in cells {
            if is_test_cell(cell) {
                tests.push(read_test(cell));
            } else {
                content_without_solutions.push(strip_cell(cell)?);
                content_with_solutions.push(cell.clone());
            }
        }

        Ok(Self {
            tests,
            content_with_solutions,
            content_without_solutions,
        })
    }

    /// Tests of this version.
    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    /// Content cells with or without solutions.
    pub fn cells(&self, include_solutions: bool) -> &[Cell] {
        if include_solutions {
            &self.content_with_solutions
        } else {
            &self.content_without_solutions
        }
    }

    /// Whether any test is visible to students.
    pub fn any_public_tests(&self) -> bool {
        self.tests.iter().any(Test::is_public)
    }
}

/// One interchangeable variant of a question.
///
/// A version starts out holding only its raw cells. [`Version::ensure_parsed`]
/// performs the split into tests and content exactly once; later calls
/// return the stored result.
#[derive(Debug, Clone)]
pub struct Version {
    /// Cells exactly as they appeared in the master notebook.
    raw_cells: Vec<Cell>,
    /// Set on first successful parse.
    parsed:    OnceLock<ParsedVersion>,
}

impl Version {
    /// Wraps the raw cells of a version.
    pub fn new(raw_cells: Vec<Cell>) -> Self {
        if raw_cells.is_empty() {
            warn!("Creating a version with no cells");
        }
        Self {
            raw_cells,
            parsed: OnceLock::new(),
        }
    }

    /// Cells as they appeared in the master notebook.
    pub fn raw_cells(&self) -> &[Cell] {
        &self.raw_cells
    }

    /// Whether [`Version::ensure_parsed`] has already succeeded.
    pub fn is_parsed(&self) -> bool {
        self.parsed.get().is_some()
    }

    /// Parses the raw cells on first call and returns the parsed form.
    pub fn ensure_parsed(&self) -> Result<&ParsedVersion, StructureError> {
        if let Some(parsed) = self.parsed.get() {
            return Ok(parsed);
        }
        let parsed = ParsedVersion::from_cells(&self.raw_cells)?;
        Ok(self.parsed.get_or_init(|| parsed))
    }

    /// Tests of this version.
    pub fn tests(&self) -> Result<&[Test], StructureError> {
        Ok(self.ensure_parsed()?.tests())
    }

    /// Content cells with or without solutions.
    pub fn cells(&self, include_solutions: bool) -> Result<&[Cell], StructureError> {
        Ok(self.ensure_parsed()?.cells(include_solutions))
    }

    /// SHA-256 of the raw cell sources, hex encoded.
    ///
    /// Each cell contributes its lines joined by newlines; cells are
    /// concatenated in order with no separator.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        for cell in &self.raw_cells {
            hasher.update(cell.lines().join("\n").as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// A question and the state of its version rotation.
#[derive(Debug, Clone)]
pub struct Question {
    /// Available versions; never empty.
    versions:        Vec<Version>,
    /// Points the question is worth.
    points:          f64,
    /// Whether the question is graded by hand.
    manual:          bool,
    /// Indices of versions not yet drawn in the current cycle, ascending.
    unused_versions: Vec<usize>,
}

impl Question {
    /// Builds a question; `index` is only used for error reporting.
    pub fn new(versions: Vec<Version>, config: QuestionConfig, index: usize) -> Result<Self> {
        if versions.is_empty() {
            return Err(ExamError::EmptyQuestion { index });
        }
        let unused_versions = (0..versions.len()).collect();
        Ok(Self {
            versions,
            points: config.points,
            manual: config.manual,
            unused_versions,
        })
    }

    /// All versions, in master notebook order.
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Points the question is worth.
    pub fn points(&self) -> f64 {
        self.points
    }

    /// Whether the question is graded by hand.
    pub fn manual(&self) -> bool {
        self.manual
    }

    /// Versions not yet drawn in the current cycle.
    pub fn unused_versions(&self) -> &[usize] {
        &self.unused_versions
    }

    /// Draws a version uniformly among those unused in the current cycle.
    ///
    /// When every version has been drawn the cycle restarts, so any
    /// `versions().len()` consecutive draws cover each version once.
    pub fn choose_version<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (usize, &Version) {
        if self.unused_versions.is_empty() {
            self.unused_versions = (0..self.versions.len()).collect();
        }
        let pick = rng.gen_range(0..self.unused_versions.len());
        let index = self.unused_versions.remove(pick);
        (index, &self.versions[index])
    }
}

/// The parsed master notebook.
#[derive(Debug, Clone, Default)]
pub struct Exam {
    /// Global configuration.
    pub config:       ExamConfig,
    /// Questions in master notebook order.
    pub questions:    Vec<Question>,
    /// Cells placed before the questions.
    pub introduction: Vec<Cell>,
    /// Cells placed after the questions.
    pub conclusion:   Vec<Cell>,
    /// Notebook metadata of the master, copied onto generated notebooks.
    pub metadata:     Map<String, Value>,
}

impl Exam {
    /// Parses every version up front so that solution marker errors surface
    /// before anything is written.
    pub fn parse_versions(&self) -> Result<()> {
        for question in &self.questions {
            for version in question.versions() {
                version.ensure_parsed()?;
            }
        }
        Ok(())
    }

    /// Total number of versions across all questions.
    pub fn version_count(&self) -> usize {
        self.questions.iter().map(|q| q.versions().len()).sum()
    }
}
