#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Single-pass parser turning a master notebook into an [`Exam`].
//!
//! The master notebook is a flat list of cells. Raw delimiter cells
//! (`BEGIN QUESTION`, `END VERSION`, ...) carve it into blocks; everything
//! between a BEGIN and its END is buffered and committed when the END
//! arrives. Any deviation from the grammar aborts the parse.

use tracing::{debug, info};

use crate::{
    classify::{Block, Delimiter, delimiter, extract_delimiter_config},
    config::QuestionConfig,
    error::{Result, StructureError},
    model::{Exam, Question, Version},
    notebook::{Cell, Notebook},
};

/// Where the parser currently is.
#[derive(Debug, Default)]
enum State {
    /// Outside every block.
    #[default]
    Top,
    /// Inside `BEGIN INTRODUCTION`.
    Introduction,
    /// Inside `BEGIN QUESTION`, possibly inside one of its versions.
    Question {
        /// Options from the BEGIN QUESTION cell.
        config:     QuestionConfig,
        /// Versions closed so far.
        versions:   Vec<Version>,
        /// Whether a `BEGIN VERSION` is open.
        in_version: bool,
    },
    /// Inside `BEGIN CONCLUSION`.
    Conclusion,
}

impl State {
    /// The innermost open block, if any.
    fn block(&self) -> Option<Block> {
        match self {
            State::Top => None,
            State::Introduction => Some(Block::Introduction),
            State::Question {
                in_version: true, ..
            } => Some(Block::Version),
            State::Question { .. } => Some(Block::Question),
            State::Conclusion => Some(Block::Conclusion),
        }
    }

    /// Name of the innermost open block for error messages.
    fn describe(&self) -> String {
        self.block()
            .map_or_else(|| "no".to_string(), |b| b.to_string())
    }
}

/// Incremental parser state; feed it cells in order, then finish.
#[derive(Debug, Default)]
pub struct DocumentParser {
    /// Current position in the block grammar.
    state:      State,
    /// Cells collected since the last delimiter.
    buffer:     Vec<Cell>,
    /// The exam being built.
    exam:       Exam,
    /// Whether a `BEGIN EXAM` cell has been seen.
    has_config: bool,
}

impl DocumentParser {
    /// A parser at the top level with nothing collected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the cell at position `index`.
    pub fn feed(&mut self, index: usize, cell: &Cell) -> Result<()> {
        match delimiter(cell) {
            Some(Delimiter { block, begin: true }) => self.begin(block, index, cell),
            Some(Delimiter {
                block,
                begin: false,
            }) => self.end(block, index),
            None => self.collect(index, cell),
        }
    }

    /// Ends the parse, failing if a block is still open.
    pub fn finish(self) -> Result<Exam> {
        if let Some(block) = self.state.block() {
            return Err(StructureError::UnclosedBlock { block }.into());
        }
        info!(
            "Parsed {} question(s) with {} version(s) in total",
            self.exam.questions.len(),
            self.exam.version_count()
        );
        Ok(self.exam)
    }

    /// Error for a BEGIN delimiter that is not allowed here.
    fn unexpected_begin(&self, block: Block, cell: usize) -> StructureError {
        StructureError::UnexpectedBegin {
            block,
            open: self.state.describe(),
            cell,
        }
    }

    /// Handles a BEGIN delimiter.
    fn begin(&mut self, block: Block, index: usize, cell: &Cell) -> Result<()> {
        match (block, &mut self.state) {
            (Block::Exam, State::Top) => {
                if self.has_config {
                    return Err(StructureError::DuplicateExamConfig { cell: index }.into());
                }
                self.exam.config = extract_delimiter_config(cell, Block::Exam)?;
                self.has_config = true;
            }
            (Block::Introduction, State::Top) => {
                self.buffer.clear();
                self.state = State::Introduction;
            }
            (Block::Question, State::Top) => {
                let config: QuestionConfig = extract_delimiter_config(cell, Block::Question)?;
                config.validate()?;
                self.buffer.clear();
                self.state = State::Question {
                    config,
                    versions: Vec::new(),
                    in_version: false,
                };
            }
            (Block::Conclusion, State::Top) => {
                self.buffer.clear();
                self.state = State::Conclusion;
            }
            (Block::Version, State::Question { in_version, .. }) if !*in_version => {
                if !self.buffer.is_empty() {
                    return Err(StructureError::StrayCells {
                        question: self.exam.questions.len(),
                        count:    self.buffer.len(),
                    }
                    .into());
                }
                *in_version = true;
            }
            _ => return Err(self.unexpected_begin(block, index).into()),
        }
        Ok(())
    }

    /// Handles an END delimiter.
    ///
    /// The state is moved out while the block is committed, so after an
    /// error the parser is back at the top level.
    fn end(&mut self, block: Block, index: usize) -> Result<()> {
        let cells = std::mem::take(&mut self.buffer);

        match (block, std::mem::take(&mut self.state)) {
            (Block::Introduction, State::Introduction) => {
                self.exam.introduction = cells;
            }
            (Block::Conclusion, State::Conclusion) => {
                self.exam.conclusion = cells;
            }
            (
                Block::Version,
                State::Question {
                    config,
                    mut versions,
                    in_version: true,
                },
            ) => {
                versions.push(Version::new(cells));
                self.state = State::Question {
                    config,
                    versions,
                    in_version: false,
                };
            }
            (
                Block::Question,
                State::Question {
                    config,
                    mut versions,
                    in_version: false,
                },
            ) => {
                let position = self.exam.questions.len();
                if versions.is_empty() {
                    if !cells.is_empty() {
                        versions.push(Version::new(cells));
                    }
                } else if !cells.is_empty() {
                    return Err(StructureError::StrayCells {
                        question: position,
                        count:    cells.len(),
                    }
                    .into());
                }

                debug!(
                    "Question {} has {} version(s), worth {} point(s){}",
                    position + 1,
                    versions.len(),
                    config.points,
                    if config.manual { ", manually graded" } else { "" }
                );
                self.exam
                    .questions
                    .push(Question::new(versions, config, position)?);
            }
            _ => {
                return Err(StructureError::UnmatchedEnd { block, cell: index }.into());
            }
        }
        Ok(())
    }

    /// Buffers a content cell, which must be inside some block.
    fn collect(&mut self, index: usize, cell: &Cell) -> Result<()> {
        if matches!(self.state, State::Top) {
            return Err(StructureError::CellOutsideBlock {
                cell:    index,
                preview: cell.first_line().to_string(),
            }
            .into());
        }
        self.buffer.push(cell.clone());
        Ok(())
    }
}

/// Parses a whole master notebook.
pub fn parse_notebook(notebook: &Notebook) -> Result<Exam> {
    let mut parser = DocumentParser::new();
    for (index, cell) in notebook.cells.iter().enumerate() {
        parser.feed(index, cell)?;
    }
    let mut exam = parser.finish()?;
    exam.metadata = notebook.metadata.clone();
    Ok(exam)
}
