use serde_json::{Map, Value};

use crate::{Cell, Notebook, NotebookError};

/// Serializes a notebook back to its on-disk JSON container form.
///
/// `source` is written as a list-of-lines (split on `\n`, each line keeping
/// its trailing newline except the last — an empty trailing entry if the
/// source itself ends with `\n`). Every code cell carries a materially
/// present `execution_count: null` and `outputs: []`, even when there are no
/// outputs. Metadata defaults to an empty object. Fields this engine does
/// not understand are not re-emitted.
pub fn marshal(notebook: &Notebook) -> Result<Vec<u8>, NotebookError> {
    let value = to_value(notebook);
    Ok(serde_json::to_vec_pretty(&value)?)
}

fn to_value(notebook: &Notebook) -> Value {
    let cells: Vec<Value> = notebook.cells.iter().map(cell_to_value).collect();
    let mut root = Map::new();
    root.insert("nbformat".into(), Value::from(notebook.nbformat));
    root.insert("nbformat_minor".into(), Value::from(notebook.nbformat_minor));
    root.insert("metadata".into(), Value::Object(notebook.metadata.clone()));
    root.insert("cells".into(), Value::Array(cells));
    Value::Object(root)
}

fn cell_to_value(cell: &Cell) -> Value {
    let mut obj = Map::new();
    obj.insert("cell_type".into(), Value::String(cell.cell_type.as_str().to_string()));
    obj.insert("metadata".into(), Value::Object(cell.metadata.clone()));
    obj.insert("source".into(), Value::Array(lines_to_value(&cell.source)));

    if cell.is_code() {
        obj.insert("execution_count".into(), Value::Null);
        let outputs: Vec<Value> = cell
            .outputs
            .iter()
            .map(|(name, text)| {
                let mut o = Map::new();
                o.insert("output_type".into(), Value::String("stream".into()));
                o.insert("name".into(), Value::String(name.clone()));
                o.insert("text".into(), Value::Array(lines_to_value(text)));
                Value::Object(o)
            })
            .collect();
        obj.insert("outputs".into(), Value::Array(outputs));
    }

    Value::Object(obj)
}

/// Splits `text` into a list-of-lines, each retaining its trailing `\n`
/// except the last line (which is empty if `text` ends with `\n`).
fn lines_to_value(text: &str) -> Vec<Value> {
    if text.is_empty() {
        return Vec::new();
    }
    let parts: Vec<&str> = text.split('\n').collect();
    let last = parts.len() - 1;
    parts
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == last {
                Value::String((*line).to_string())
            } else {
                Value::String(format!("{line}\n"))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellType, parse};

    #[test]
    fn round_trips_plain_notebook() {
        let json = br#"{
            "nbformat": 4, "nbformat_minor": 5, "metadata": {"a": 1},
            "cells": [
                {"cell_type": "markdown", "metadata": {}, "source": ["# header"]},
                {"cell_type": "code", "metadata": {}, "source": ["x = 1\n", "y = 2"], "outputs": []}
            ]
        }"#;
        let nb = parse(json).unwrap();
        let out = marshal(&nb).unwrap();
        let nb2 = parse(&out).unwrap();
        assert_eq!(nb, nb2);
    }

    #[test]
    fn code_cell_always_gets_execution_count_and_outputs() {
        let cell = Cell::new(CellType::Code, "pass");
        let value = cell_to_value(&cell);
        assert_eq!(value["execution_count"], Value::Null);
        assert_eq!(value["outputs"], Value::Array(vec![]));
    }

    #[test]
    fn trailing_newline_becomes_empty_final_line() {
        let lines = lines_to_value("a\nb\n");
        assert_eq!(lines, vec![Value::String("a\n".into()), Value::String("b\n".into()), Value::String("".into())]);
    }

    #[test]
    fn markdown_cell_has_no_execution_count() {
        let cell = Cell::new(CellType::Markdown, "# hi");
        let value = cell_to_value(&cell);
        assert!(value.get("execution_count").is_none());
        assert!(value.get("outputs").is_none());
    }
}
