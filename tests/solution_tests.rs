use nbexam::{
    Cell, StructureError,
    solution::{MARKDOWN_ANSWER_PLACEHOLDER, replace_solutions, strip_cell},
};

fn strip(lines: &[&str]) -> Vec<String> {
    replace_solutions(lines).expect("well-formed solution markers")
}

#[test]
fn inline_assignment_keeps_left_hand_side() {
    assert_eq!(strip(&["x = 5 # SOLUTION"]), vec!["x = ..."]);
    assert_eq!(strip(&["    total_count = a + b #SOLUTION"]), vec!["    total_count = ..."]);
}

#[test]
fn inline_expression_becomes_ellipsis() {
    assert_eq!(
        strip(&["def f(x):", "    return x + 1 # SOLUTION"]),
        vec!["def f(x):", "    ..."]
    );
}

#[test]
fn solution_block_collapses_to_one_placeholder() {
    let lines = ["# BEGIN SOLUTION", "a = 1", "b = 2", "c = a + b", "# END SOLUTION"];
    assert_eq!(strip(&lines), vec!["..."]);

    let indented = [
        "def area(r):",
        "    # BEGIN SOLUTION",
        "    import math",
        "    return math.pi * r ** 2",
        "    # END SOLUTION",
        "",
        "area(2)",
    ];
    assert_eq!(strip(&indented), vec!["def area(r):", "    ...", "", "area(2)"]);
}

#[test]
fn no_prompt_variants_leave_nothing_behind() {
    let lines = [
        "# BEGIN SOLUTION NO PROMPT",
        "helper = 3",
        "# END SOLUTION",
        "y = 2 # SOLUTION NO PROMPT",
        "# BEGIN PROMPT",
        "# END PROMPT",
        "print(helper)",
    ];
    assert_eq!(strip(&lines), vec!["print(helper)"]);
}

#[test]
fn unmarked_code_is_unchanged() {
    let lines = ["import numpy as np", "", "xs = np.arange(10)  # evenly spaced", "xs.sum()"];
    assert_eq!(strip(&lines), lines.to_vec());

    let cell = Cell::code(lines.join("\n"));
    assert_eq!(strip_cell(&cell).expect("no markers"), cell);
}

#[test]
fn malformed_markers_are_errors() {
    assert_eq!(
        replace_solutions(&["# BEGIN SOLUTION", "# BEGIN SOLUTION", "# END SOLUTION", "# END SOLUTION"]),
        Err(StructureError::NestedSolution { line: 2 })
    );
    assert_eq!(
        replace_solutions(&["x = 1", "# BEGIN SOLUTION", "y = 2"]),
        Err(StructureError::UnterminatedSolution { line: 2 })
    );
    assert_eq!(
        replace_solutions(&["x = 1", "# END SOLUTION"]),
        Err(StructureError::UnmatchedEndSolution { line: 2 })
    );
}

#[test]
fn strip_cell_by_cell_type() {
    let answer = Cell::markdown("Why does this halt?\n\n**Solution:** the loop variant decreases.");
    let stripped = strip_cell(&answer).expect("markdown never fails");
    assert!(stripped.is_markdown());
    assert_eq!(stripped.source, MARKDOWN_ANSWER_PLACEHOLDER);

    let code = Cell::code("n = 10 # SOLUTION\nprint(n)");
    let stripped = strip_cell(&code).expect("well-formed");
    assert_eq!(stripped.source, "n = ...\nprint(n)");
    assert_eq!(code.source, "n = 10 # SOLUTION\nprint(n)");

    let raw = Cell::raw("x = 1 # SOLUTION");
    assert_eq!(strip_cell(&raw).expect("raw copied"), raw);
}
