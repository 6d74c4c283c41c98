use proofing_infrastructure::ProofingPaths;
use std::fs::{File, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const DEFAULT_FILTER: &str = "proofing=info";
const LOG_FILE_NAME: &str = "proofing.log";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn open_log_file(paths: &ProofingPaths) -> anyhow::Result<File> {
    let dir = paths.logs_dir()?;
    std::fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))?;
    Ok(file)
}

/// Installs the global subscriber: full log to the log file, warnings to
/// stderr so they do not drown the interactive prompt.
pub fn init(paths: &ProofingPaths, verbose: bool) {
    let file_layer = match open_log_file(paths) {
        Ok(file) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(env_filter(DEFAULT_FILTER)),
        ),
        Err(e) => {
            eprintln!("warning: file logging disabled: {}", e);
            None
        }
    };

    let stderr_filter = if verbose {
        env_filter("proofing=debug")
    } else {
        EnvFilter::new("proofing=warn")
    };
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .init();
}
