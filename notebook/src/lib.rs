//! Parsing, marshaling and cell-level transformation of the notebook
//! container format used by the autograding pipeline.
//!
//! The format is a JSON document: integer `nbformat`/`nbformat_minor`
//! fields, a top-level `metadata` object, and an ordered `cells` array.
//! Each cell carries a `cell_type` tag, a `metadata` object, a `source`
//! field serialized as a list of lines, and (for code cells) an
//! `execution_count` and `outputs` list.
//!
//! Parsing goes through a permissive JSON tree (`serde_json::Value`) and
//! projects it into the typed [`Notebook`]/[`Cell`] structures below,
//! rather than deriving `Deserialize` directly on them, so that structural
//! mismatches can be reported with the offending path instead of a generic
//! serde error.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

mod marshal;
mod parse;

pub use marshal::marshal;
pub use parse::parse;

/// Everything that can go wrong turning bytes into a [`Notebook`] or back.
#[derive(Debug, thiserror::Error)]
pub enum NotebookError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}: {message}")]
    Structural { path: String, message: String },
}

impl NotebookError {
    pub(crate) fn structural(path: impl Into<String>, message: impl Into<String>) -> Self {
        NotebookError::Structural {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The `cell_type` tag. Anything other than `code`/`markdown` is preserved
/// verbatim but otherwise treated as opaque, per the format's openness to
/// unknown cell kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellType {
    Code,
    Markdown,
    Other(String),
}

impl CellType {
    fn as_str(&self) -> &str {
        match self {
            CellType::Code => "code",
            CellType::Markdown => "markdown",
            CellType::Other(s) => s,
        }
    }

    fn from_str(s: &str) -> Self {
        match s {
            "code" => CellType::Code,
            "markdown" => CellType::Markdown,
            other => CellType::Other(other.to_string()),
        }
    }
}

/// A single notebook cell.
///
/// `source` is the joined single string (on-disk, it is a list of lines,
/// each retaining its trailing newline except the last). `outputs` only
/// retains stream-kind outputs, keyed by stream name (`stdout`/`stderr`),
/// with their text already concatenated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub cell_type: CellType,
    pub metadata: Map<String, Value>,
    pub source: String,
    pub outputs: BTreeMap<String, String>,
}

impl Cell {
    pub fn new(cell_type: CellType, source: impl Into<String>) -> Self {
        Cell {
            cell_type,
            metadata: Map::new(),
            source: source.into(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self.cell_type, CellType::Code)
    }

    pub fn is_markdown(&self) -> bool {
        matches!(self.cell_type, CellType::Markdown)
    }
}

/// A parsed notebook: format version plus an ordered list of cells.
///
/// The original raw top-level map is not retained; only the fields this
/// engine understands are round-tripped on [`marshal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notebook {
    pub nbformat: i64,
    pub nbformat_minor: i64,
    pub metadata: Map<String, Value>,
    pub cells: Vec<Cell>,
}

/// What a `map_cells` transformer wants done with a given cell: keep it
/// (possibly rewritten) or drop it from the output notebook entirely.
/// Encoded as its own variant rather than `Option<Cell>` so that "no
/// replacement" can never be confused with a literal absence of metadata.
pub enum CellOutcome {
    Keep(Cell),
    Drop,
}

impl Notebook {
    pub fn new(nbformat: i64, nbformat_minor: i64) -> Self {
        Notebook {
            nbformat,
            nbformat_minor,
            metadata: Map::new(),
            cells: Vec::new(),
        }
    }

    /// The core traversal primitive: visits every cell in order, replacing
    /// or dropping it per the transformer's verdict. Format-version fields
    /// and top-level metadata are carried over unchanged. An error from the
    /// transformer aborts the whole traversal (no partial notebook is
    /// returned). Generic over the transformer's own error type so callers
    /// outside this crate are not forced to funnel their failures through
    /// [`NotebookError`].
    pub fn map_cells<F, E>(&self, mut f: F) -> Result<Notebook, E>
    where
        F: FnMut(&Cell) -> Result<CellOutcome, E>,
    {
        let mut cells = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            match f(cell)? {
                CellOutcome::Keep(c) => cells.push(c),
                CellOutcome::Drop => {}
            }
        }
        Ok(Notebook {
            nbformat: self.nbformat,
            nbformat_minor: self.nbformat_minor,
            metadata: self.metadata.clone(),
            cells,
        })
    }
}
