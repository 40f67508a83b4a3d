use std::path::{Path, PathBuf};

use futures::StreamExt;
use thiserror::Error;

use common::Config;
use orchestrator::{GradeRequest, ScratchMode};
use util::SandboxConfig;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("notebook error: {0}")]
    Notebook(#[from] notebook::NotebookError),

    #[error("transform error: {0}")]
    Transform(#[from] transformer::TransformError),

    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] orchestrator::OrchestratorError),

    #[error("util error: {0}")]
    Util(#[from] util::UtilError),

    #[error("broker error: {0}")]
    Broker(#[from] broker::BrokerError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn parse(path: &Path) -> Result<(), CliError> {
    let bytes = std::fs::read(path)?;
    let nb = notebook::parse(&bytes)?;
    let code_cells = nb.cells.iter().filter(|c| c.is_code()).count();
    let markdown_cells = nb.cells.iter().filter(|c| c.is_markdown()).count();
    println!(
        "nbformat {}.{}, {} cells ({} code, {} markdown, {} other)",
        nb.nbformat,
        nb.nbformat_minor,
        nb.cells.len(),
        code_cells,
        markdown_cells,
        nb.cells.len() - code_cells - markdown_cells,
    );
    Ok(())
}

pub fn student(path: &Path, out: &Path) -> Result<(), CliError> {
    let bytes = std::fs::read(path)?;
    let master = notebook::parse(&bytes)?;
    let student_notebook = transformer::to_student(&master)?;
    let body = notebook::marshal(&student_notebook)?;
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out, body)?;
    println!("wrote student notebook to {}", out.display());
    Ok(())
}

pub fn autograder(path: &Path, out: &Path) -> Result<(), CliError> {
    let bytes = std::fs::read(path)?;
    let master = notebook::parse(&bytes)?;
    let files = transformer::to_autograder(&master)?;

    for file in &files {
        util::validate_identifier("assignment_id", &file.assignment_id)?;
        util::validate_identifier("exercise_id", &file.exercise_id)?;

        let dir = util::paths::exercise_dir(out, &file.assignment_id, &file.exercise_id);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(&file.filename), &file.content)?;
    }
    println!("wrote {} autograder file(s) to {}", files.len(), out.display());
    Ok(())
}

pub async fn grade(
    corpus_root: Option<PathBuf>,
    jail_path: Option<String>,
    broker_uri: Option<String>,
    ingress_queue: Option<String>,
    egress_queue: Option<String>,
    overlay_scratch: bool,
) -> Result<(), CliError> {
    // A CLI flag wins over whatever the environment (or a loaded .env file)
    // says; set it before the config singleton reads its source so there is
    // one place that resolves precedence, not two.
    if let Some(corpus_root) = &corpus_root {
        std::env::set_var("CORPUS_ROOT", corpus_root);
    }
    if let Some(jail_path) = &jail_path {
        std::env::set_var("JAIL_PATH", jail_path);
    }
    if let Some(broker_uri) = &broker_uri {
        std::env::set_var("BROKER_URI", broker_uri);
    }
    if let Some(ingress_queue) = &ingress_queue {
        std::env::set_var("INGRESS_QUEUE", ingress_queue);
    }
    if let Some(egress_queue) = &egress_queue {
        std::env::set_var("EGRESS_QUEUE", egress_queue);
    }
    let config = Config::init(".env");

    let corpus_root = PathBuf::from(&config.corpus_root);
    let upload_dir = PathBuf::from(&config.upload_dir);
    std::fs::create_dir_all(&upload_dir)?;

    let mut sandbox_config = SandboxConfig::default();
    sandbox_config.jail_path = config.jail_path.clone();
    sandbox_config.interpreter = config.jail_interpreter.clone();
    sandbox_config.file_extension = config.jail_file_extension.clone();
    let scratch_mode = if overlay_scratch {
        ScratchMode::Overlay
    } else {
        ScratchMode::Shared
    };

    let adapter = broker::BrokerAdapter::connect(&config.broker_uri).await?;
    let mut messages = adapter
        .receive(&config.ingress_queue, "ffcore-worker")
        .await?;

    log::info!("listening on queue {:?}", config.ingress_queue);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("shutdown signal received, closing receive stream");
                break;
            }
            message = messages.next() => {
                let Some(message) = message else {
                    log::warn!("broker stream ended");
                    break;
                };
                let body = message?;
                match run_one(&body, &corpus_root, &sandbox_config, scratch_mode, &upload_dir).await {
                    Ok(report_bytes) => {
                        if let Err(e) = adapter.post(&config.egress_queue, &report_bytes).await {
                            log::error!("failed to post report: {e}");
                        }
                    }
                    Err(e) => {
                        log::error!("grading failed: {e}");
                    }
                }
            }
        }
    }

    Ok(())
}

async fn run_one(
    submission_bytes: &[u8],
    corpus_root: &Path,
    sandbox_config: &SandboxConfig,
    scratch_mode: ScratchMode,
    upload_dir: &Path,
) -> Result<Vec<u8>, CliError> {
    let report = orchestrator::grade_submission(GradeRequest {
        submission_bytes,
        corpus_root,
        sandbox_config,
        scratch_mode,
    })
    .await?;

    std::fs::write(
        upload_dir.join(format!("{}.ipynb", report.submission_id)),
        submission_bytes,
    )?;
    orchestrator::write_report_atomically(upload_dir, &report)?;

    Ok(serde_json::to_vec_pretty(&report)?)
}
