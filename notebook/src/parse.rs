use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{Cell, CellType, Notebook, NotebookError};

/// Parses a notebook container from its on-disk JSON bytes.
///
/// Unknown top-level and cell fields are tolerated and dropped. Structural
/// mismatches (`cells` not a list, `source` not a list of strings, etc.)
/// are reported as [`NotebookError::Structural`] naming the offending path.
pub fn parse(bytes: &[u8]) -> Result<Notebook, NotebookError> {
    let root: Value = serde_json::from_slice(bytes)?;
    let root = root
        .as_object()
        .ok_or_else(|| NotebookError::structural("$", "top-level document is not an object"))?;

    let nbformat = root.get("nbformat").and_then(Value::as_i64).unwrap_or(0);
    let nbformat_minor = root
        .get("nbformat_minor")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    let metadata = match root.get("metadata") {
        Some(Value::Object(m)) => m.clone(),
        Some(_) => return Err(NotebookError::structural("metadata", "metadata is not an object")),
        None => Map::new(),
    };

    let mut cells = Vec::new();
    if let Some(raw_cells) = root.get("cells") {
        let raw_cells = raw_cells
            .as_array()
            .ok_or_else(|| NotebookError::structural("cells", "cells is not a list"))?;
        for (i, raw_cell) in raw_cells.iter().enumerate() {
            cells.push(parse_cell(i, raw_cell)?);
        }
    }

    Ok(Notebook {
        nbformat,
        nbformat_minor,
        metadata,
        cells,
    })
}

fn parse_cell(index: usize, raw: &Value) -> Result<Cell, NotebookError> {
    let path = |field: &str| format!("cells[{index}].{field}");

    let raw = raw
        .as_object()
        .ok_or_else(|| NotebookError::structural(format!("cells[{index}]"), "cell is not an object"))?;

    let cell_type = match raw.get("cell_type") {
        Some(Value::String(s)) => CellType::from_str(s),
        Some(_) => return Err(NotebookError::structural(path("cell_type"), "cell_type is not a string")),
        None => CellType::Other(String::new()),
    };

    let metadata = match raw.get("metadata") {
        Some(Value::Object(m)) => m.clone(),
        Some(_) => return Err(NotebookError::structural(path("metadata"), "metadata is not an object")),
        None => Map::new(),
    };

    let source = match raw.get("source") {
        Some(v) => parse_lines(v, &path("source"))?.join(""),
        None => String::new(),
    };

    let outputs = match raw.get("outputs") {
        Some(Value::Array(entries)) => parse_outputs(entries, &path("outputs"))?,
        Some(_) => return Err(NotebookError::structural(path("outputs"), "outputs is not a list")),
        None => BTreeMap::new(),
    };

    Ok(Cell {
        cell_type,
        metadata,
        source,
        outputs,
    })
}

/// Validates that `value` is a JSON array of strings and returns them.
fn parse_lines(value: &Value, path: &str) -> Result<Vec<String>, NotebookError> {
    let items = value
        .as_array()
        .ok_or_else(|| NotebookError::structural(path, "is not a list of strings"))?;
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => lines.push(s.clone()),
            _ => return Err(NotebookError::structural(path, "contains a non-string line")),
        }
    }
    Ok(lines)
}

fn parse_outputs(entries: &[Value], path: &str) -> Result<BTreeMap<String, String>, NotebookError> {
    let mut outputs = BTreeMap::new();
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            // Non-object output entries are not stream outputs; skip.
            continue;
        };
        if obj.get("output_type").and_then(Value::as_str) != Some("stream") {
            // Only stream-kind outputs are retained.
            continue;
        }
        let Some(name_val) = obj.get("name") else {
            continue;
        };
        let name = name_val
            .as_str()
            .ok_or_else(|| NotebookError::structural(format!("{path}.name"), "output name is not a string"))?
            .to_string();
        let Some(text_val) = obj.get("text") else {
            // Stream output with no text: skip (nothing to retain).
            continue;
        };
        let lines = parse_lines(text_val, &format!("{path}.text"))?;
        outputs.insert(name, lines.join(""));
    }
    Ok(outputs)
}
