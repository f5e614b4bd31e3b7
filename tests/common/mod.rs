#![allow(dead_code)]

use std::{fs, path::PathBuf};

use nbexam::{Cell, Notebook};
use serde_json::json;
use uuid::Uuid;

pub fn temp_root(label: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("nbexam-{label}-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

pub fn begin(block: &str) -> Cell {
    Cell::raw(format!("BEGIN {block}"))
}

pub fn end(block: &str) -> Cell {
    Cell::raw(format!("END {block}"))
}

pub fn begin_with(block: &str, yaml: &str) -> Cell {
    Cell::raw(format!("BEGIN {block}\n{yaml}"))
}

/// A `# TEST` code cell whose recorded output is `output`.
pub fn test_cell(input: &str, output: &str, hidden: bool) -> Cell {
    let header = if hidden { "# HIDDEN TEST" } else { "# TEST" };
    Cell::code(format!("{header}\n{input}")).with_outputs(vec![json!({
        "output_type": "execute_result",
        "execution_count": 1,
        "data": { "text/plain": [output] },
        "metadata": {}
    })])
}

/// Wraps `cells` in a question block.
pub fn question(cells: Vec<Cell>) -> Vec<Cell> {
    let mut out = vec![begin("QUESTION")];
    out.extend(cells);
    out.push(end("QUESTION"));
    out
}

/// Wraps `cells` in a version block.
pub fn version(cells: Vec<Cell>) -> Vec<Cell> {
    let mut out = vec![begin("VERSION")];
    out.extend(cells);
    out.push(end("VERSION"));
    out
}

/// A question with one version per entry of `prompts`, each holding a
/// prompt, a solution cell, and one public and one hidden test.
pub fn versioned_question(prompts: &[&str]) -> Vec<Cell> {
    let mut cells = Vec::new();
    for (i, prompt) in prompts.iter().enumerate() {
        cells.extend(version(vec![
            Cell::markdown(*prompt),
            Cell::code(format!("answer = {i} # SOLUTION")),
            test_cell("answer", &i.to_string(), false),
            test_cell("answer + 1", &(i + 1).to_string(), true),
        ]));
    }
    question(cells)
}

/// Config block, introduction, `questions`, and conclusion.
pub fn master(config: &str, questions: Vec<Vec<Cell>>) -> Notebook {
    let mut cells = vec![
        begin_with("EXAM", config),
        begin("INTRODUCTION"),
        Cell::markdown("# Midterm"),
        end("INTRODUCTION"),
    ];
    for q in questions {
        cells.extend(q);
    }
    cells.push(begin("CONCLUSION"));
    cells.push(Cell::markdown("Good luck!"));
    cells.push(end("CONCLUSION"));

    let mut notebook = Notebook::from_cells(cells);
    notebook
        .metadata
        .insert("kernelspec".into(), json!({ "name": "python3", "language": "python" }));
    notebook
}

/// Writes `notebook` as `exam.ipynb` inside `root`.
pub fn write_master(root: &std::path::Path, notebook: &Notebook) -> PathBuf {
    let path = root.join("exam.ipynb");
    notebook.write(&path).expect("write master notebook");
    path
}
