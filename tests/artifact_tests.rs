mod common;

use std::fs;

use common::{temp_root, test_cell};
use nbexam::{
    Cell, ExamError,
    artifact::{TestArtifact, strip_hidden_dir, to_doctest},
    test_case::{Test, read_test},
};
use serde_json::json;

fn sample_tests() -> Vec<Test> {
    vec![
        Test {
            input:           "x = 1\nx + 1".into(),
            expected_output: "2".into(),
            hidden:          false,
        },
        Test {
            input:           "print(\"done\")".into(),
            expected_output: "done".into(),
            hidden:          true,
        },
    ]
}

#[test]
fn read_test_uses_header_and_outputs() {
    let public = read_test(&test_cell("square(3)", "9", false));
    assert_eq!(public.input, "square(3)");
    assert_eq!(public.expected_output, "9");
    assert!(public.is_public());

    let hidden = read_test(&Cell::code("## HIDDEN TEST ##\nsquare(4)"));
    assert!(hidden.hidden);
    assert_eq!(hidden.input, "square(4)");
    assert_eq!(hidden.expected_output, "");
}

#[test]
fn read_test_concatenates_every_text_output() {
    let cell = Cell::code("# TEST\nshow()\nlen(xs)").with_outputs(vec![
        json!({ "output_type": "stream", "name": "stdout", "text": ["a\n", "b\n"] }),
        json!({ "output_type": "display_data", "data": { "image/png": "iVBOR" }, "metadata": {} }),
        json!({ "output_type": "execute_result", "data": { "text/plain": "3" }, "metadata": {} }),
    ]);
    let test = read_test(&cell);
    assert_eq!(test.input, "show()\nlen(xs)");
    assert_eq!(test.expected_output, "a\nb\n3");
}

#[test]
fn doctest_prompts() {
    assert_eq!(
        to_doctest("for i in range(3):\n    print(i)"),
        vec![">>> for i in range(3):", "...     print(i)"]
    );
    assert_eq!(
        to_doctest("if x:\n    y = 1\nelse:\n    y = 2\ny"),
        vec![">>> if x:", "...     y = 1", "... else:", "...     y = 2", ">>> y"]
    );
    assert_eq!(to_doctest("total = 1 + \\\n2"), vec![">>> total = 1 + \\", "... 2"]);
}

#[test]
fn cases_suppress_echo_between_statements() {
    let artifact = TestArtifact::new("q1", 2.0, &sample_tests());
    assert_eq!(artifact.name, "q1");
    assert_eq!(artifact.file_name(), "q1.py");
    assert_eq!(artifact.suites.len(), 1);

    let suite = &artifact.suites[0];
    assert!(suite.scored);
    assert_eq!(suite.kind, "doctest");
    assert_eq!(suite.cases.len(), 2);
    assert_eq!(suite.cases[0].code, ">>> x = 1;\n>>> x + 1\n2");
    assert!(!suite.cases[0].hidden);
    assert_eq!(suite.cases[1].code, ">>> print(\"done\")\ndone");
    assert!(suite.cases[1].hidden);
    assert!(!suite.cases[1].locked);
}

#[test]
fn rendered_artifact_is_a_python_literal() {
    let artifact = TestArtifact::new("q1", 2.0, &sample_tests());
    let text = artifact.render().expect("renderable");

    assert!(text.starts_with("test = {\n"));
    assert!(text.contains("\"points\": 2.0"));
    assert!(text.contains("\"hidden\": True"));
    assert!(text.contains("\"hidden\": False"));
    assert!(text.contains("\"type\": \"doctest\""));
    assert!(!text.contains("true"));

    assert_eq!(TestArtifact::parse(&text).expect("parses back"), artifact);
}

#[test]
fn parses_hand_written_artifacts() {
    let text = "# generated\ntest = {\n  'name': 'q2',\n  'points': 1,\n  'suites': [\n    {\n      'cases': [{'code': '>>> 1 + 1\\n2', 'hidden': False, 'locked': False},],\n      'scored': True,\n      'setup': '',\n      'teardown': '',\n      'type': 'doctest'\n    }\n  ]\n}\n";
    let artifact = TestArtifact::parse(text).expect("valid literal");
    assert_eq!(artifact.name, "q2");
    assert_eq!(artifact.points, 1.0);
    assert_eq!(artifact.suites[0].cases[0].code, ">>> 1 + 1\n2");

    assert!(TestArtifact::parse("test = {'name': 'q2',").is_err());
    assert!(TestArtifact::parse("import os\nos.remove('x')").is_err());
}

#[test]
fn parses_pprint_wrapped_strings() {
    let text = "test = {'name': 'q3', 'points': 1, 'suites': [{'cases': [{'code': ('>>> a'\n '\\n1'), 'hidden': True, 'locked': False}], 'scored': True, 'setup': '', 'teardown': '', 'type': 'doctest'}]}\n";
    let artifact = TestArtifact::parse(text).expect("parenthesized strings parse");
    assert_eq!(artifact.suites[0].cases[0].code, ">>> a\n1");
    assert!(artifact.suites[0].cases[0].hidden);
    assert_eq!(artifact.without_hidden().case_count(), 0);
}

#[test]
fn strip_hidden_is_idempotent() {
    let artifact = TestArtifact::new("q1", 1.0, &sample_tests());
    let once = artifact.without_hidden();
    let twice = once.without_hidden();

    assert_eq!(once, twice);
    assert_eq!(once.case_count(), 1);
    assert_eq!(artifact.case_count(), 2);
    assert!(once.suites[0].cases.iter().all(|c| !c.hidden));
}

#[test]
fn strip_hidden_dir_rewrites_test_files() {
    let root = temp_root("strip");
    let first = TestArtifact::new("aaa", 1.0, &sample_tests());
    let second = TestArtifact::new("bbb", 3.0, &sample_tests()[1..]);
    first.write(&root).expect("write first");
    let second_path = second.write(&root).expect("write second");
    fs::write(root.join("__init__.py"), "").expect("write init");

    assert_eq!(strip_hidden_dir(&root).expect("strip"), 2);
    assert_eq!(TestArtifact::read(root.join("aaa.py")).expect("read").case_count(), 1);
    assert_eq!(TestArtifact::read(&second_path).expect("read").case_count(), 0);
    assert_eq!(fs::read_to_string(root.join("__init__.py")).expect("init kept"), "");

    assert_eq!(strip_hidden_dir(&root).expect("strip again"), 2);
    assert_eq!(TestArtifact::read(root.join("aaa.py")).expect("read"), first.without_hidden());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn unreadable_artifacts_name_the_file() {
    let root = temp_root("bad-artifact");
    let path = root.join("broken.py");
    fs::write(&path, "test = [").expect("write broken");

    match TestArtifact::read(&path) {
        Err(ExamError::Artifact { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected an artifact error, got {other:?}"),
    }

    let _ = fs::remove_dir_all(root);
}
