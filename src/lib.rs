//! # nbexam
//!
//! Generates randomized exams from a single master Jupyter notebook.
//!
//! The master notebook is divided into blocks by raw delimiter cells
//! (`BEGIN EXAM`, `BEGIN QUESTION`, `BEGIN VERSION`, ...). Each student
//! gets a random subset of the questions in a random order with one
//! version per question, solutions stripped, and only the public tests.
//! A separate autograder notebook keeps everything.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Building and writing student exams and the autograder notebook
pub mod assembler;
/// OK-format test files and hidden-case stripping
pub mod artifact;
/// Recognizing delimiter, test, and solution cells
pub mod classify;
/// Exam, question, and run configuration
pub mod config;
/// Error types
pub mod error;
/// Autograder flavours
pub mod exporter;
/// Questions, versions, and the exam context
pub mod model;
/// Jupyter notebook reading and writing
pub mod notebook;
/// Turning a master notebook into an exam
pub mod parser;
/// Solution marker removal
pub mod solution;
/// Tests embedded in notebook cells
pub mod test_case;

pub use assembler::{Assembler, RenderedExam, Selection, Summary, run};
pub use config::{ExamConfig, QuestionConfig, RunOptions};
pub use error::{ConfigError, ExamError, Result, StructureError};
pub use exporter::{AutograderFormat, Exporter};
pub use model::{Exam, Question, Version};
pub use notebook::{Cell, CellType, Notebook};
pub use parser::parse_notebook;
