use nbexam::{
    Cell, ExamConfig,
    classify::{Block, extract_delimiter_config},
    config::{GenerateConfig, PdfConfig},
};
use serde_json::{Map, Value, json};

#[test]
fn default_packaging_command() {
    assert_eq!(GenerateConfig::default().command_args(), vec!["generate", "autograder"]);
}

#[test]
fn full_packaging_command() {
    let mut variables = Map::new();
    variables.insert("df".into(), json!("pandas.core.frame.DataFrame"));

    let config = GenerateConfig {
        points:         Some(10.0),
        threshold:      Some(0.5),
        show_stdout:    true,
        show_hidden:    true,
        grade_from_log: true,
        seed:           Some(42),
        pdfs:           Some(PdfConfig {
            course_id:     json!(1234),
            assignment_id: json!("hw1"),
            filtering:     false,
        }),
        files:          vec!["data.csv".into(), "utils.py".into()],
        variables:      Some(variables),
    };

    assert_eq!(
        config.command_args(),
        vec![
            "generate",
            "autograder",
            "--points",
            "10",
            "--threshold",
            "0.5",
            "--show-stdout",
            "--show-hidden",
            "--grade-from-log",
            "--seed",
            "42",
            "--course-id",
            "1234",
            "--assignment-id",
            "hw1",
            "--unfiltered-pdfs",
            "data.csv",
            "utils.py",
            "--serialized-variables",
            "{\"df\":\"pandas.core.frame.DataFrame\"}",
        ]
    );
}

#[test]
fn generate_block_parses_from_exam_cell() {
    let cell = Cell::raw(
        "BEGIN EXAM\nnum_students: 1\nnum_questions: 1\ngenerate:\n  points: 10\n  show_stdout: true\n  seed: 42\n  pdfs:\n    course_id: 1234\n    assignment_id: hw1\n  files:\n    - data.csv",
    );
    let config: ExamConfig = extract_delimiter_config(&cell, Block::Exam).expect("valid exam config");
    let generate = config.generate.expect("generate block present");

    assert_eq!(generate.points, Some(10.0));
    assert!(generate.show_stdout);
    assert!(!generate.show_hidden);
    assert_eq!(generate.seed, Some(42));
    assert_eq!(generate.files, vec!["data.csv"]);

    let pdfs = generate.pdfs.as_ref().expect("pdfs present");
    assert_eq!(pdfs.course_id, json!(1234));
    assert_eq!(pdfs.assignment_id, Value::String("hw1".into()));
    assert!(pdfs.filtering);

    assert_eq!(
        generate.command_args(),
        vec![
            "generate",
            "autograder",
            "--points",
            "10",
            "--show-stdout",
            "--seed",
            "42",
            "--course-id",
            "1234",
            "--assignment-id",
            "hw1",
            "data.csv",
        ]
    );
}

#[test]
fn no_generate_block_means_no_packaging() {
    let config: ExamConfig =
        extract_delimiter_config(&Cell::raw("BEGIN EXAM\nnum_students: 1"), Block::Exam)
            .expect("valid exam config");
    assert!(config.generate.is_none());
}
