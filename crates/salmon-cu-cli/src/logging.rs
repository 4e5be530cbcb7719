use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const PROJECT_CRATES: &[&str] = &["salmon_cu_core", "salmon_cu_cli"];
const DEFAULT_LOG_FILE: &str = "./logs/salmon-cu.log";

/// Turn `TRACING_LEVEL` into filter directives. A bare level applies to this
/// project's crates only; dependencies stay at `warn`. Anything containing a
/// target (`=`) or several directives is passed through untouched.
fn filter_directives(level: Option<&str>) -> String {
    let level = level.map(str::trim).filter(|l| !l.is_empty()).unwrap_or("info");
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let mut directives = vec!["warn".to_string()];
    directives.extend(PROJECT_CRATES.iter().map(|krate| format!("{}={}", krate, level)));
    directives.join(",")
}

/// Split `LOG_FILE_PATH` into the directory the appender writes into and the
/// file name inside it.
fn log_file_location(path: &str) -> (PathBuf, PathBuf) {
    let path = Path::new(path);
    let file_name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("salmon-cu.log"));
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    (directory, file_name)
}

pub fn init_logger() -> WorkerGuard {
    let directives = filter_directives(env::var("TRACING_LEVEL").ok().as_deref());
    let filter_layer = EnvFilter::new(&directives);

    let log_file_path = env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let (log_dir, log_file) = log_file_location(&log_file_path);

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    debug!(
        "Logging '{}' to stdout and {}",
        directives,
        log_dir.join(&log_file).display()
    );

    guard
}
