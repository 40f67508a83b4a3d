use serde_json::{Map, Value};

use crate::TransformError;
use crate::markers;

/// Returns `true` if any triple-backtick fenced block in `source` is tagged
/// with the given marker regex on its first line.
pub(crate) fn has_metadata(marker: &regex::Regex, source: &str) -> bool {
    for m in markers::triple_backticked().find_iter(source) {
        let text = &m.as_str()[3..m.as_str().len() - 3];
        if marker.is_match(text) {
            return true;
        }
    }
    false
}

/// Extracts the first fenced block tagged with `marker`, parses its body as
/// YAML, and returns the parsed map plus `source` with that block excised.
/// Other fenced blocks are preserved verbatim. Returns `(None, source)`
/// unchanged if no block matches.
pub(crate) fn extract_metadata(
    marker: &regex::Regex,
    source: &str,
) -> Result<(Option<Map<String, Value>>, String), TransformError> {
    let mut metadata = None;
    let mut out = String::new();
    let mut last_end = 0;

    let matches: Vec<_> = markers::triple_backticked().find_iter(source).collect();
    for m in &matches {
        out.push_str(&source[last_end..m.start()]);
        let text = &m.as_str()[3..m.as_str().len() - 3];
        if marker.is_match(text) {
            let parsed: Map<String, Value> = serde_yaml::from_str(text)
                .map_err(|e| TransformError::InvalidMetadata(e.to_string()))?;
            metadata = Some(parsed);
        } else {
            out.push_str(m.as_str());
        }
        last_end = m.end();
    }
    out.push_str(&source[last_end..]);

    Ok((metadata, out))
}
