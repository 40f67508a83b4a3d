use serde_json::{Map, Value};

use notebook::{CellOutcome, Notebook};

use crate::TransformError;
use crate::markers;
use crate::metadata::{extract_metadata, has_metadata};

/// One file to be written into the autograder corpus: a hidden test or a
/// report template, destined for `<assignment_id>/<exercise_id>/<filename>`.
#[derive(Debug, Clone)]
pub struct AutograderFile {
    pub assignment_id: String,
    pub exercise_id: String,
    pub filename: String,
    pub content: String,
}

/// Converts a master notebook into the flat list of files that make up the
/// autograder corpus. Only cells containing a unit-test block survive;
/// everything else — prose, solutions, auto-test blocks — is dropped, since
/// none of it is needed once the hidden tests have been extracted.
pub fn to_autograder(master: &Notebook) -> Result<Vec<AutograderFile>, TransformError> {
    let mut assignment_metadata: Map<String, Value> = Map::new();
    let mut assignment_id = String::new();
    let mut exercise_metadata: Option<Map<String, Value>> = None;
    let mut exercise_id = String::new();

    let transformed = master.map_cells(|cell| {
        let mut source = cell.source.clone();

        if cell.is_markdown() {
            if has_metadata(markers::assignment_metadata(), &cell.source) {
                let (parsed, rest) = extract_metadata(markers::assignment_metadata(), &cell.source)?;
                source = rest;
                if let Some(parsed) = parsed {
                    if let Some(id) = parsed.get("assignment_id") {
                        assignment_id = id
                            .as_str()
                            .ok_or(TransformError::AssignmentIdNotString)?
                            .to_string();
                    }
                    for (k, v) in parsed {
                        assignment_metadata.insert(k, v);
                    }
                }
            }
            if has_metadata(markers::exercise_metadata(), &cell.source) {
                let (parsed, rest) = extract_metadata(markers::exercise_metadata(), &source)?;
                source = rest;
                if let Some(ref parsed) = parsed {
                    if let Some(id) = parsed.get("exercise_id") {
                        exercise_id = id
                            .as_str()
                            .ok_or(TransformError::ExerciseIdNotString)?
                            .to_string();
                    }
                }
                exercise_metadata = parsed;
            }
            // Markdown cells never survive into the autograder corpus.
            return Ok(CellOutcome::Drop);
        }

        if !markers::unittest_begin().is_match(&source) {
            return Ok(CellOutcome::Drop);
        }

        let mbeg = markers::unittest_begin()
            .find(&source)
            .ok_or(TransformError::UnterminatedUnittest)?;
        let mend = markers::unittest_end()
            .find(&source)
            .ok_or(TransformError::UnterminatedUnittest)?;
        let text = &source[mbeg.end()..mend.start()];

        let filename = derive_test_filename(&source)?;
        let staged = format!("import submission;\n{text}");

        let mut metadata = exercise_metadata.clone().unwrap_or_default();
        metadata.insert("filename".to_string(), Value::String(filename.clone()));
        metadata.insert(
            "assignment_id".to_string(),
            Value::String(assignment_id.clone()),
        );
        metadata.insert("exercise_id".to_string(), Value::String(exercise_id.clone()));

        let mut cell_out = notebook::Cell::new(notebook::CellType::Code, staged);
        cell_out.metadata = metadata;
        Ok(CellOutcome::Keep(cell_out))
    })?;

    let mut files = Vec::with_capacity(transformed.cells.len());
    for cell in &transformed.cells {
        let filename = cell
            .metadata
            .get("filename")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let aid = cell
            .metadata
            .get("assignment_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let eid = cell
            .metadata
            .get("exercise_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        files.push(AutograderFile {
            assignment_id: aid,
            exercise_id: eid,
            filename,
            content: cell.source.clone(),
        });
    }
    Ok(files)
}

/// Locates a `class <Name>(unittest.TestCase):` declaration and derives the
/// corpus filename by stripping a `Test` prefix or suffix from `<Name>`.
fn derive_test_filename(source: &str) -> Result<String, TransformError> {
    let caps = markers::test_class()
        .captures(source)
        .ok_or(TransformError::UndetectableTestClass)?;
    let name = caps.get(1).unwrap().as_str();
    let base = if let Some(stripped) = name.strip_suffix("Test") {
        stripped
    } else if let Some(stripped) = name.strip_prefix("Test") {
        stripped
    } else {
        name
    };
    if base.is_empty() {
        return Err(TransformError::UndetectableTestClass);
    }
    Ok(format!("{base}_test.py"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebook::{Cell, CellType, Notebook as NB};

    fn markdown_cell(source: &str) -> Cell {
        Cell::new(CellType::Markdown, source)
    }

    fn code_cell(source: &str) -> Cell {
        Cell::new(CellType::Code, source)
    }

    #[test]
    fn extracts_unittest_cell_with_derived_filename() {
        let mut nb = NB::new(4, 5);
        nb.cells.push(markdown_cell(
            "```\n# ASSIGNMENT METADATA\nassignment_id: hw1\n```\n",
        ));
        nb.cells.push(markdown_cell(
            "```\n# EXERCISE METADATA\nexercise_id: ex1\n```\n",
        ));
        nb.cells.push(code_cell(concat!(
            "# BEGIN UNITTEST\n",
            "class AddTest(unittest.TestCase):\n",
            "    def test_it(self):\n",
            "        self.assertEqual(submission.add(1, 1), 2)\n",
            "# END UNITTEST\n",
        )));
        let files = to_autograder(&nb).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "Add_test.py");
        assert_eq!(files[0].assignment_id, "hw1");
        assert_eq!(files[0].exercise_id, "ex1");
        assert!(files[0].content.starts_with("import submission;\n"));
    }

    #[test]
    fn strips_leading_test_prefix_too() {
        let src = "class TestSort(unittest.TestCase):\n    pass\n";
        assert_eq!(derive_test_filename(src).unwrap(), "Sort_test.py");
    }

    #[test]
    fn missing_test_class_is_an_error() {
        let src = "# BEGIN UNITTEST\nassert True\n# END UNITTEST\n";
        assert!(derive_test_filename(src).is_err());
    }

    #[test]
    fn non_unittest_code_cells_are_dropped() {
        let mut nb = NB::new(4, 5);
        nb.cells.push(code_cell("x = 1\n"));
        let files = to_autograder(&nb).unwrap();
        assert!(files.is_empty());
    }
}
