use nbexam::{
    AutograderFormat, Cell, ConfigError, ExamConfig, QuestionConfig,
    classify::{
        Block, Delimiter, delimiter, extract_delimiter_config, is_delimiter,
        is_markdown_solution_cell, is_test_cell,
    },
    config::ExportCell,
};

#[test]
fn delimiters_tolerate_case_and_whitespace() {
    let cell = Cell::raw("  begin Question  \npoints: 2");
    assert_eq!(
        delimiter(&cell),
        Some(Delimiter {
            block: Block::Question,
            begin: true,
        })
    );
    assert!(is_delimiter(&Cell::raw("END VERSION"), Block::Version, false));
    assert!(!is_delimiter(&Cell::raw("END VERSION"), Block::Version, true));
}

#[test]
fn delimiters_must_be_raw_and_exact() {
    assert_eq!(delimiter(&Cell::markdown("BEGIN QUESTION")), None);
    assert_eq!(delimiter(&Cell::code("BEGIN QUESTION")), None);
    assert_eq!(delimiter(&Cell::raw("BEGIN QUESTIONS")), None);
    assert_eq!(delimiter(&Cell::raw("some notes\nBEGIN QUESTION")), None);
}

#[test]
fn test_headers_are_recognised() {
    for header in ["# TEST", "## TEST ##", "# HIDDEN TEST", "## Hidden Test ##", "  # test  "] {
        let cell = Cell::code(format!("{header}\nf(1)"));
        assert!(is_test_cell(&cell), "{header:?} should mark a test cell");
    }
    assert!(!is_test_cell(&Cell::code("# TESTING\nf(1)")));
    assert!(!is_test_cell(&Cell::code("f(1)\n# TEST")));
    assert!(!is_test_cell(&Cell::markdown("# TEST")));
}

#[test]
fn markdown_solution_markers() {
    assert!(is_markdown_solution_cell(&Cell::markdown(
        "Explain your answer.\n\n**Solution:** it halts."
    )));
    assert!(is_markdown_solution_cell(&Cell::markdown("<strong>Solution</strong> 42")));
    assert!(!is_markdown_solution_cell(&Cell::markdown("The solution is left to you.")));
    assert!(!is_markdown_solution_cell(&Cell::code("**Solution:**")));
}

#[test]
fn question_config_from_delimiter_body() {
    let cell = Cell::raw("BEGIN QUESTION\npoints: 3\nmanual: true");
    let config: QuestionConfig =
        extract_delimiter_config(&cell, Block::Question).expect("valid question config");
    assert_eq!(config.points, 3.0);
    assert!(config.manual);

    let empty: QuestionConfig = extract_delimiter_config(&Cell::raw("BEGIN QUESTION"), Block::Question)
        .expect("empty body is the default");
    assert_eq!(empty, QuestionConfig::default());
    assert_eq!(empty.points, 1.0);
    assert!(!empty.manual);
}

#[test]
fn exam_config_defaults_and_options() {
    let cell = Cell::raw(
        "BEGIN EXAM\nnum_students: 30\nnum_questions: 4\nseed: 7\npublic_tests: true\nexport_cell:\n  pdf: false\n  instructions: Upload to Gradescope",
    );
    let config: ExamConfig = extract_delimiter_config(&cell, Block::Exam).expect("valid exam config");

    assert_eq!(config.num_students, Some(30));
    assert_eq!(config.num_questions, Some(4));
    assert_eq!(config.seed, Some(7));
    assert!(config.public_tests);
    assert!(config.init_cell);
    assert!(config.check_all_cell);

    let options = config.export_cell.options().expect("export cell enabled");
    assert!(!options.pdf);
    assert!(options.filtering);
    assert_eq!(options.instructions, "Upload to Gradescope");

    let defaults = ExamConfig::default();
    assert!(!defaults.public_tests);
    assert_eq!(defaults.export_cell, ExportCell::Toggle(true));

    let disabled: ExamConfig = extract_delimiter_config(&Cell::raw("BEGIN EXAM\nexport_cell: false"), Block::Exam)
        .expect("valid exam config");
    assert!(disabled.export_cell.options().is_none());
}

#[test]
fn malformed_config_bodies_fail() {
    let broken = Cell::raw("BEGIN EXAM\nnum_students: [1, 2");
    let err = extract_delimiter_config::<ExamConfig>(&broken, Block::Exam).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { block: Block::Exam, .. }));

    let mistyped = Cell::raw("BEGIN QUESTION\npoints: lots");
    let err = extract_delimiter_config::<QuestionConfig>(&mistyped, Block::Question).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { block: Block::Question, .. }));
}

#[test]
fn validation_names_missing_keys() {
    let mut config = ExamConfig::default();
    assert!(matches!(
        config.validate(AutograderFormat::Otter),
        Err(ConfigError::Missing("num_students"))
    ));

    config.num_students = Some(3);
    assert!(matches!(
        config.validate(AutograderFormat::Otter),
        Err(ConfigError::Missing("num_questions"))
    ));

    config.num_questions = Some(2);
    let batch = config.validate(AutograderFormat::Otter).expect("otter needs no endpoint");
    assert_eq!((batch.num_students, batch.num_questions), (3, 2));

    assert!(matches!(
        config.validate(AutograderFormat::OkPy),
        Err(ConfigError::Missing("endpoint"))
    ));
    config.endpoint = Some("cs101/fa26/midterm".into());
    assert!(config.validate(AutograderFormat::OkPy).is_ok());
}

#[test]
fn format_selector() {
    assert_eq!("otter".parse::<AutograderFormat>().ok(), Some(AutograderFormat::Otter));
    assert_eq!("OK".parse::<AutograderFormat>().ok(), Some(AutograderFormat::OkPy));
    assert!(matches!(
        "nbgrader".parse::<AutograderFormat>(),
        Err(ConfigError::UnknownFormat(f)) if f == "nbgrader"
    ));
    assert_eq!(AutograderFormat::default().to_string(), "otter");
}
