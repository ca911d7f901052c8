use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::Config;

/// Where the human-readable console layer goes. The stdio MCP server must
/// keep stdout free for protocol frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    Stdout,
    Stderr,
}

static LOG_GUARDS: OnceCell<Vec<WorkerGuard>> = OnceCell::new();

/// Console plus daily JSON files under `cfg.log_dir`: `server.log` gets
/// everything, `error.log` only errors.
pub fn init_logger(cfg: &Config, console: ConsoleTarget) -> Result<(), String> {
    let log_dir = Path::new(&cfg.log_dir);
    fs::create_dir_all(log_dir).map_err(|e| format!("create log dir failed: {e}"))?;
    prune_logs(log_dir, retention_days(&cfg.log_max_files));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    let (server_writer, server_guard) =
        tracing_appender::non_blocking(rolling::daily(log_dir, "server.log"));
    let (error_writer, error_guard) =
        tracing_appender::non_blocking(rolling::daily(log_dir, "error.log"));

    let console_layer = match console {
        ConsoleTarget::Stdout => fmt::layer()
            .with_target(false)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(std::io::stdout)
            .boxed(),
        ConsoleTarget::Stderr => fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer(server_writer))
        .with(json_layer(error_writer).with_filter(LevelFilter::ERROR))
        .try_init()
        .map_err(|e| format!("init subscriber failed: {e}"))?;

    let _ = LOG_GUARDS.set(vec![server_guard, error_guard]);
    install_panic_hook();
    Ok(())
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic occurred".to_string());
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!(panic = %payload, location = %location, "panic");
    }));
}

fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .with_target(false)
        .with_thread_ids(true)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(writer)
}

/// Console-only logging for one-shot command line tools.
pub fn init_cli_logger(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .try_init();
}

fn prune_logs(log_dir: &Path, keep_days: u64) {
    if keep_days == 0 {
        return;
    }
    let Some(cutoff) = SystemTime::now().checked_sub(Duration::from_secs(keep_days * 86_400)) else {
        return;
    };
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };
    entries
        .flatten()
        .filter(|entry| {
            entry
                .metadata()
                .and_then(|meta| meta.modified())
                .map(|modified| modified < cutoff)
                .unwrap_or(false)
        })
        .for_each(|entry| {
            let _ = fs::remove_file(entry.path());
        });
}

/// `"7d"` or `"7"` means seven days; anything else disables pruning.
fn retention_days(value: &str) -> u64 {
    let raw = value.trim().to_lowercase();
    raw.strip_suffix('d').unwrap_or(&raw).parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_retention_in_days() {
        assert_eq!(retention_days("7d"), 7);
        assert_eq!(retention_days(" 14D "), 14);
        assert_eq!(retention_days("30"), 30);
        assert_eq!(retention_days("forever"), 0);
    }

    #[test]
    fn pruning_keeps_fresh_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("server.log.2025-01-01");
        fs::write(&file, "{}").unwrap();
        prune_logs(dir.path(), 7);
        assert!(file.exists());
    }
}
