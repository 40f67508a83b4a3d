use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "ffcore", version, about = "Notebook grading pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a master notebook and summarize its structure.
    Parse {
        /// Path to the master notebook.
        notebook: PathBuf,
    },
    /// Derive the student-facing notebook from a master notebook.
    Student {
        /// Path to the master notebook.
        notebook: PathBuf,
        /// Output path for the student notebook.
        out: PathBuf,
    },
    /// Derive the autograder corpus tree from a master notebook.
    Autograder {
        /// Path to the master notebook.
        notebook: PathBuf,
        /// Output directory for the corpus tree.
        out: PathBuf,
    },
    /// Run the grading worker loop until interrupted.
    Grade {
        /// Root of the autograder corpus on disk.
        #[arg(long)]
        corpus_root: Option<PathBuf>,
        /// Path to the jail binary.
        #[arg(long)]
        jail_path: Option<String>,
        /// Broker connection URI.
        #[arg(long)]
        broker_uri: Option<String>,
        /// Ingress queue name.
        #[arg(long)]
        ingress_queue: Option<String>,
        /// Egress queue name.
        #[arg(long)]
        egress_queue: Option<String>,
        /// Use a per-submission temp-directory overlay instead of writing
        /// directly into the shared corpus directory.
        #[arg(long)]
        overlay_scratch: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_file = std::env::var("LOG_FILE").unwrap_or_else(|_| "logs/ffcore.log".to_string());
    common::init_logger(&log_level, &log_file);

    let result = match cli.command {
        Command::Parse { notebook } => commands::parse(&notebook),
        Command::Student { notebook, out } => commands::student(&notebook, &out),
        Command::Autograder { notebook, out } => commands::autograder(&notebook, &out),
        Command::Grade {
            corpus_root,
            jail_path,
            broker_uri,
            ingress_queue,
            egress_queue,
            overlay_scratch,
        } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("failed to build tokio runtime");
            runtime.block_on(commands::grade(
                corpus_root,
                jail_path,
                broker_uri,
                ingress_queue,
                egress_queue,
                overlay_scratch,
            ))
        }
    };

    if let Err(e) = result {
        log::error!("{e}");
        eprintln!("ffcore: {e}");
        std::process::exit(1);
    }
}
