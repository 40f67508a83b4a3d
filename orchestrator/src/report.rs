use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::OrchestratorError;

/// The final, submission-wide grading report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub assignment_id: String,
    pub submission_id: String,
    pub outcomes: BTreeMap<String, bool>,
    pub reports: BTreeMap<String, String>,
}

/// Writes `report` as pretty-printed JSON to `<dir>/<submission_id>.txt`,
/// using a temp-file-then-rename handshake so a poller watching for the
/// file's appearance never observes a partially written report.
pub fn write_report_atomically(dir: &Path, report: &Report) -> Result<(), OrchestratorError> {
    let body = serde_json::to_vec_pretty(report)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&body)?;
    tmp.flush()?;

    let dest = dir.join(format!("{}.txt", report.submission_id));
    tmp.persist(&dest)
        .map_err(|e| OrchestratorError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_reads_back_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut outcomes = BTreeMap::new();
        outcomes.insert("AddTest.test_add".to_string(), true);
        let mut reports = BTreeMap::new();
        reports.insert("ex1".to_string(), "<html></html>".to_string());

        let report = Report {
            assignment_id: "hw1".to_string(),
            submission_id: "sub-123".to_string(),
            outcomes,
            reports,
        };
        write_report_atomically(dir.path(), &report).unwrap();

        let contents = std::fs::read_to_string(dir.path().join("sub-123.txt")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["assignment_id"], "hw1");
        assert_eq!(parsed["outcomes"]["AddTest.test_add"], true);
    }
}
