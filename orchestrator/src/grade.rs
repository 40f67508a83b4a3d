use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use util::SandboxConfig;

use crate::report::Report;
use crate::scratch::{self, ScratchMode};
use crate::OrchestratorError;

/// Everything `grade_submission` needs besides the submission bytes
/// themselves.
pub struct GradeRequest<'a> {
    pub submission_bytes: &'a [u8],
    pub corpus_root: &'a Path,
    pub sandbox_config: &'a SandboxConfig,
    pub scratch_mode: ScratchMode,
}

/// Grades a single submission: stages each graded exercise's code into its
/// corpus directory, runs every hidden test file under the sandbox, renders
/// every report template, and returns the aggregated report. Not safe to
/// call concurrently within one process — per-exercise staging overwrites
/// shared scratch files (in `ScratchMode::Shared`) and the jail's CWD
/// expectation assumes one grading call in flight at a time.
pub async fn grade_submission(req: GradeRequest<'_>) -> Result<Report, OrchestratorError> {
    let value: Value = serde_json::from_slice(req.submission_bytes)?;

    let submission_id = required_string(&value, "submission_id")?;
    let assignment_id = required_string(&value, "assignment_id")?;
    util::validate_identifier("assignment_id", &assignment_id)?;

    let assignment_dir = util::paths::assignment_dir(req.corpus_root, &assignment_id);
    if !assignment_dir.is_dir() {
        return Err(OrchestratorError::CorpusDirMissing(
            assignment_dir.display().to_string(),
        ));
    }

    let notebook = notebook::parse(req.submission_bytes)?;
    let ext = req.sandbox_config.file_extension.as_str();

    let mut outcomes: BTreeMap<String, bool> = BTreeMap::new();
    let mut reports: BTreeMap<String, String> = BTreeMap::new();

    for cell in &notebook.cells {
        if !cell.is_code() {
            continue;
        }
        let Some(exercise_id) = cell.metadata.get("exercise_id").and_then(Value::as_str) else {
            continue;
        };
        util::validate_identifier("exercise_id", exercise_id)?;

        let exercise_dir = util::paths::exercise_dir(req.corpus_root, &assignment_id, exercise_id);
        if !exercise_dir.is_dir() {
            return Err(OrchestratorError::CorpusDirMissing(
                exercise_dir.display().to_string(),
            ));
        }

        let scratch = scratch::prepare(req.scratch_mode, &exercise_dir)?;

        stage_submission(scratch.path(), ext, &cell.source)?;

        let mut per_exercise = BTreeMap::new();
        for test_file in list_files_with_suffix(scratch.path(), &format!("_test.{ext}"))? {
            let outcome = sandbox::run_test_file(req.sandbox_config, scratch.path(), &test_file).await?;
            if outcome.per_test.is_empty() {
                log::warn!(
                    "{exercise_id}/{test_file}: no per-test outcome lines observed, recording file-level outcome as failed"
                );
            }
            for (key, value) in outcome.per_test {
                per_exercise.insert(key, value);
            }
            per_exercise.insert(test_file, outcome.file_outcome);
        }

        let outcomes_json = serde_json::to_string(&per_exercise)?;
        let mut html = String::new();
        for template in list_files_with_suffix(scratch.path(), &format!("_template.{ext}"))? {
            html.push_str(&run_template(req.sandbox_config, scratch.path(), &template, &outcomes_json).await?);
        }
        reports.insert(exercise_id.to_string(), html);

        for (key, value) in per_exercise {
            if outcomes.insert(key.clone(), value).is_some() {
                return Err(OrchestratorError::DuplicateOutcomeKey(key));
            }
        }
    }

    Ok(Report {
        assignment_id,
        submission_id,
        outcomes,
        reports,
    })
}

fn required_string(value: &Value, field: &'static str) -> Result<String, OrchestratorError> {
    let Some(metadata) = value.get("metadata") else {
        return Err(OrchestratorError::MissingMetadata(field));
    };
    match metadata.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(OrchestratorError::MetadataNotString { field }),
        None => Err(OrchestratorError::MissingMetadata(field)),
    }
}

/// Stages the cell's source as `submission.<ext>`, plus
/// `submission_source.<ext>`: the same source wrapped in a string literal
/// bound to a `source` name, so style/lint tests can inspect the raw text.
fn stage_submission(dir: &Path, ext: &str, source: &str) -> Result<(), OrchestratorError> {
    let submission_path = util::paths::submission_path(dir, ext);
    std::fs::write(&submission_path, source)?;

    let escaped = source.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"");
    let literal = format!("source = \"\"\"{escaped}\"\"\"\n");
    let source_path = util::paths::submission_source_path(dir, ext);
    std::fs::write(&source_path, literal)?;
    Ok(())
}

/// Lists file names (not full paths) directly inside `dir` whose name ends
/// with `suffix`, sorted lexicographically to give a deterministic
/// directory-listing order.
fn list_files_with_suffix(dir: &Path, suffix: &str) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(suffix) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Runs `template` as an unsandboxed process, feeding `outcomes_json` on
/// its standard input and capturing standard output as the rendered HTML.
async fn run_template(
    config: &SandboxConfig,
    cwd: &Path,
    template: &str,
    outcomes_json: &str,
) -> Result<String, OrchestratorError> {
    let mut child = Command::new(&config.interpreter)
        .arg(template)
        .current_dir(cwd)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(outcomes_json.as_bytes()).await?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        log::error!(
            "template {template} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
        return Err(OrchestratorError::TemplateFailed {
            template: template.to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
