use notebook::{Cell, CellOutcome, CellType, Notebook};
use serde_json::{Map, Value};

use crate::TransformError;
use crate::markers;
use crate::metadata::{extract_metadata, has_metadata};

/// Converts a master notebook into the student-facing notebook: solution
/// regions are replaced with a prompt or an indentation-matched `...` stub,
/// hidden test cells are dropped, and metadata fences are stripped from
/// markdown prose.
pub fn to_student(master: &Notebook) -> Result<Notebook, TransformError> {
    let mut assignment_metadata: Map<String, Value> = Map::new();
    let mut exercise_metadata: Option<Map<String, Value>> = None;

    master.map_cells(|cell| {
        let mut source = cell.source.clone();

        if cell.is_markdown() {
            if has_metadata(markers::assignment_metadata(), &cell.source) {
                let (parsed, rest) = extract_metadata(markers::assignment_metadata(), &cell.source)?;
                source = rest;
                if let Some(parsed) = parsed {
                    for (k, v) in parsed {
                        assignment_metadata.insert(k, v);
                    }
                }
            }
            if has_metadata(markers::exercise_metadata(), &cell.source) {
                let (parsed, rest) = extract_metadata(markers::exercise_metadata(), &source)?;
                source = rest;
                exercise_metadata = parsed;
            }
        }

        if !cell.is_code() {
            let mut out = Cell::new(cell.cell_type.clone(), source);
            out.metadata = cell.metadata.clone();
            return Ok(CellOutcome::Keep(out));
        }

        let mut prompt = String::new();
        if let Some(mbeg) = markers::prompt_begin().find(&source) {
            let mend = markers::prompt_end().find(&source).ok_or(TransformError::UnterminatedPrompt)?;
            if mend.end() < mbeg.start() {
                return Err(TransformError::PromptOutOfOrder);
            }
            prompt = source[mbeg.end()..mend.start()].to_string();
            source = format!("{}{}", &source[..mbeg.start()], &source[mend.end()..]);
        }

        let begins: Vec<_> = markers::solution_begin().captures_iter(&source).collect();
        if !begins.is_empty() {
            let ends: Vec<_> = markers::solution_end().find_iter(&source).collect();
            if begins.len() != ends.len() {
                return Err(TransformError::MismatchedSolutionMarkers {
                    begin: begins.len(),
                    end: ends.len(),
                });
            }
            let mut out = String::new();
            let mut cursor = 0;
            for (i, begin) in begins.iter().enumerate() {
                let whole = begin.get(0).unwrap();
                let indent = begin.get(1).unwrap().as_str();
                out.push_str(&source[cursor..whole.start()]);

                let replacement = if !prompt.is_empty() {
                    prompt.clone()
                } else {
                    format!("{indent}...")
                };
                out.push_str(&replacement);

                let end = ends[i];
                cursor = end.end();
            }
            out.push_str(&source[cursor..]);

            let mut cell_out = Cell::new(CellType::Code, out);
            if let Some(ref em) = exercise_metadata {
                cell_out.metadata = em.clone();
            }
            return Ok(CellOutcome::Keep(cell_out));
        }

        if markers::unittest_begin().is_match(&source) || markers::autotest_begin().is_match(&source) {
            return Ok(CellOutcome::Drop);
        }

        let mut out = Cell::new(cell.cell_type.clone(), source);
        out.metadata = cell.metadata.clone();
        out.outputs = cell.outputs.clone();
        Ok(CellOutcome::Keep(out))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebook::Notebook as NB;

    fn code_cell(source: &str) -> Cell {
        Cell::new(CellType::Code, source)
    }

    fn markdown_cell(source: &str) -> Cell {
        Cell::new(CellType::Markdown, source)
    }

    #[test]
    fn replaces_solution_region_with_dots_matching_indent() {
        let mut nb = NB::new(4, 5);
        nb.cells.push(code_cell(
            "def f():\n    # BEGIN SOLUTION\n    return 42\n    # END SOLUTION\n",
        ));
        let out = to_student(&nb).unwrap();
        assert_eq!(out.cells.len(), 1);
        assert!(out.cells[0].source.contains("    ...\n"));
        assert!(!out.cells[0].source.contains("return 42"));
    }

    #[test]
    fn prompt_overrides_dots_stub() {
        let mut nb = NB::new(4, 5);
        nb.cells.push(code_cell(concat!(
            "\"\"\" # BEGIN PROMPT\n",
            "# write your answer here\n",
            "\"\"\" # END PROMPT\n",
            "# BEGIN SOLUTION\n",
            "return 42\n",
            "# END SOLUTION\n",
        )));
        let out = to_student(&nb).unwrap();
        assert!(out.cells[0].source.contains("write your answer here"));
        assert!(!out.cells[0].source.contains("..."));
    }

    #[test]
    fn drops_unittest_only_cells() {
        let mut nb = NB::new(4, 5);
        nb.cells.push(code_cell("# BEGIN UNITTEST\nassert True\n# END UNITTEST\n"));
        let out = to_student(&nb).unwrap();
        assert!(out.cells.is_empty());
    }

    #[test]
    fn mismatched_solution_markers_is_an_error() {
        let mut nb = NB::new(4, 5);
        nb.cells.push(code_cell("# BEGIN SOLUTION\nx = 1\n"));
        assert!(to_student(&nb).is_err());
    }

    #[test]
    fn merges_assignment_metadata_and_strips_fence() {
        let mut nb = NB::new(4, 5);
        nb.cells.push(markdown_cell(
            "intro\n```\n# ASSIGNMENT METADATA\nassignment_id: hw1\n```\n",
        ));
        let out = to_student(&nb).unwrap();
        assert!(!out.cells[0].source.contains("ASSIGNMENT METADATA"));
        assert!(out.cells[0].source.contains("intro"));
    }

    #[test]
    fn exercise_metadata_applies_to_subsequent_code_cell() {
        let mut nb = NB::new(4, 5);
        nb.cells.push(markdown_cell(
            "```\n# EXERCISE METADATA\nexercise_id: ex1\n```\n",
        ));
        nb.cells.push(code_cell("x = 1\n"));
        let out = to_student(&nb).unwrap();
        assert_eq!(
            out.cells[1].metadata.get("exercise_id").unwrap(),
            "ex1"
        );
    }
}
