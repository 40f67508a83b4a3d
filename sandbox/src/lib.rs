//! Executes a single hidden-test file inside an OS-level jail and parses its
//! combined stdout/stderr into per-test pass/fail outcomes.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use util::SandboxConfig;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to launch jail binary {jail_path}: {source}")]
    Spawn {
        jail_path: String,
        source: std::io::Error,
    },

    #[error("jail process for {test_file} timed out")]
    Timeout { test_file: String },

    #[error("failed to read jail output: {0}")]
    Io(#[from] std::io::Error),
}

/// The result of running one test file: every per-test outcome observed,
/// plus a single file-level outcome keyed by the test file's own name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFileOutcome {
    pub per_test: BTreeMap<String, bool>,
    pub file_outcome: bool,
}

/// Runs `test_file` (expected to already be staged inside `cwd` alongside
/// the submission) under the configured jail, with a host-side timeout set
/// comfortably above the jail's own wall-clock limit as a backstop against
/// a jail that fails to enforce its own limit.
pub async fn run_test_file(
    config: &SandboxConfig,
    cwd: &Path,
    test_file: &str,
) -> Result<TestFileOutcome, SandboxError> {
    let argv = config.jail_argv(cwd, test_file);

    let child = Command::new(&config.jail_path)
        .args(&argv)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| {
            log::error!("failed to launch jail binary {}: {source}", config.jail_path);
            SandboxError::Spawn {
                jail_path: config.jail_path.clone(),
                source,
            }
        })?;

    let host_timeout = Duration::from_secs(config.timeout_secs + 2);
    let output = match timeout(host_timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            log::error!("jail process for {test_file} exceeded the host-side timeout backstop");
            return Err(SandboxError::Timeout {
                test_file: test_file.to_string(),
            });
        }
    };

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    let exit_success = output.status.success();
    Ok(parse_outcomes(&combined, test_file, exit_success))
}

fn outcome_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^(test\S*) \(([\w.]+)\).*\.\.\. (ok|FAIL|ERROR)\s*$").unwrap()
    })
}

/// Scans `output` for lines matching `testNAME (MODULE.CLASS) ... (ok|FAIL|ERROR)`,
/// yielding a `CLASS.NAME -> bool` entry per match. Also records a file-level
/// outcome keyed by `test_file`: defaults to `exit_success`, but is forced
/// to `false` if no per-test line was observed at all, since that signals
/// the runner itself malfunctioned rather than the tests merely failing.
pub fn parse_outcomes(output: &str, test_file: &str, exit_success: bool) -> TestFileOutcome {
    let mut per_test = BTreeMap::new();
    for caps in outcome_line().captures_iter(output) {
        let name = &caps[1];
        let module_class = &caps[2];
        let verdict = &caps[3];
        let class = module_class.rsplit('.').next().unwrap_or(module_class);
        per_test.insert(format!("{class}.{name}"), verdict == "ok");
    }

    let file_outcome = if per_test.is_empty() {
        log::warn!("{test_file}: no per-test outcome lines in jail output, treating as failed");
        false
    } else {
        exit_success
    };

    TestFileOutcome {
        per_test,
        file_outcome,
    }
}
