use notebook::{Cell, CellType, Notebook};
use transformer::{to_autograder, to_student};

fn code(source: &str) -> Cell {
    Cell::new(CellType::Code, source)
}

fn markdown(source: &str) -> Cell {
    Cell::new(CellType::Markdown, source)
}

fn notebook_of(cells: Vec<Cell>) -> Notebook {
    let mut nb = Notebook::new(4, 5);
    nb.cells = cells;
    nb
}

#[test]
fn s1_plain_pass_through() {
    let nb = notebook_of(vec![markdown("# header"), code("x = 1")]);
    let student = to_student(&nb).unwrap();
    let sources: Vec<_> = student.cells.iter().map(|c| c.source.as_str()).collect();
    assert_eq!(sources, vec!["# header", "x = 1"]);

    let corpus = to_autograder(&nb).unwrap();
    assert!(corpus.is_empty());
}

#[test]
fn s2_solution_replacement_no_prompt() {
    let nb = notebook_of(vec![code("# BEGIN SOLUTION\nx = 1\n# END SOLUTION")]);
    let student = to_student(&nb).unwrap();
    assert_eq!(student.cells.len(), 1);
    assert_eq!(student.cells[0].source, "...");
}

#[test]
fn s3_indented_solution() {
    let nb = notebook_of(vec![code(
        "  # Junk1\n  # BEGIN SOLUTION\n  x = 1\n  # END SOLUTION\n  # Junk2",
    )]);
    let student = to_student(&nb).unwrap();
    assert_eq!(student.cells[0].source, "  # Junk1\n  ...\n  # Junk2");
}

#[test]
fn s4_explicit_prompt() {
    let nb = notebook_of(vec![code(concat!(
        "\"\"\" # BEGIN PROMPT\n",
        "# Your solution here\n",
        "\"\"\" # END PROMPT\n",
        "# BEGIN SOLUTION\n",
        "x = 1\n",
        "# END SOLUTION",
    ))]);
    let student = to_student(&nb).unwrap();
    assert_eq!(student.cells[0].source, "# Your solution here");
}

#[test]
fn s5_test_cell_dropped() {
    let nb = notebook_of(vec![code("# BEGIN UNITTEST\nx = 1\n# END UNITTEST")]);
    let student = to_student(&nb).unwrap();
    assert!(student.cells.is_empty());
}

#[test]
fn s6_outcomes_aggregation_inputs_produce_one_test_file() {
    let nb = notebook_of(vec![
        markdown("```\n# ASSIGNMENT METADATA\nassignment_id: hw1\n```\n"),
        markdown("```\n# EXERCISE METADATA\nexercise_id: ex1\n```\n"),
        code(concat!(
            "# BEGIN UNITTEST\n",
            "class C(unittest.TestCase):\n",
            "    def testA(self):\n",
            "        pass\n",
            "    def testB(self):\n",
            "        pass\n",
            "# END UNITTEST\n",
        )),
    ]);
    let corpus = to_autograder(&nb).unwrap();
    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus[0].filename, "C_test.py");
    assert_eq!(corpus[0].assignment_id, "hw1");
    assert_eq!(corpus[0].exercise_id, "ex1");

    // Outcome parsing itself (given captured runner output matching this
    // file) is exercised in the sandbox crate; this only confirms the
    // corpus file that would be fed to the runner is derived correctly.
    assert!(corpus[0].content.contains("class C(unittest.TestCase):"));
}

#[test]
fn solution_markers_take_priority_over_a_unittest_marker_in_the_same_cell() {
    let nb = notebook_of(vec![code(concat!(
        "# BEGIN UNITTEST\n",
        "# BEGIN SOLUTION\n",
        "x = 1\n",
        "# END SOLUTION\n",
        "# END UNITTEST\n",
    ))]);
    let student = to_student(&nb).unwrap();
    assert_eq!(student.cells.len(), 1);
    assert!(student.cells[0].source.contains("..."));
}

#[test]
fn multiple_solution_regions_are_each_replaced_independently() {
    let nb = notebook_of(vec![code(concat!(
        "# BEGIN SOLUTION\n",
        "a = 1\n",
        "# END SOLUTION\n",
        "b = 2\n",
        "# BEGIN SOLUTION\n",
        "c = 3\n",
        "# END SOLUTION\n",
    ))]);
    let student = to_student(&nb).unwrap();
    let source = &student.cells[0].source;
    assert_eq!(source.matches("...").count(), 2);
    assert!(source.contains("b = 2"));
}

#[test]
fn unpaired_begin_solution_is_an_error() {
    let nb = notebook_of(vec![code("# BEGIN SOLUTION\nx = 1\n")]);
    assert!(to_student(&nb).is_err());
}

#[test]
fn prompt_end_before_begin_is_an_error() {
    // END PROMPT appears, then BEGIN PROMPT: out of order.
    let nb = notebook_of(vec![code(concat!(
        "\"\"\" # END PROMPT\n",
        "x = 1\n",
        "\"\"\" # BEGIN PROMPT\n",
    ))]);
    assert!(to_student(&nb).is_err());
}
