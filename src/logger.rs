//! File-based logging using simplelog.
//!
//! The board owns the terminal, so log lines go to
//! `~/.cache/prparty/prparty.log` (or platform equivalent) instead of stderr.

use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::OpenOptions;
use std::path::PathBuf;

fn log_file_path() -> Option<PathBuf> {
    let dir = dirs::cache_dir()?.join("prparty");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join("prparty.log"))
}

pub fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Level for this binary from an `env_logger`-style directive list such as
/// `warn,prparty=debug`. A `prparty` directive beats a bare level; otherwise
/// the last directive counts.
pub fn level_from_directives(s: &str) -> LevelFilter {
    let mut bare = None;
    let mut last = None;
    for directive in s.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        match directive.rsplit_once('=') {
            Some((target, level)) => {
                let target = target.trim();
                if target == env!("CARGO_PKG_NAME")
                    || target.starts_with(concat!(env!("CARGO_PKG_NAME"), "::"))
                {
                    return parse_level(level);
                }
                last = Some(level);
            }
            None => bare = Some(directive),
        }
    }
    bare.or(last).map(parse_level).unwrap_or(LevelFilter::Info)
}

/// Initialize file logging. `RUST_LOG` wins over the configured level.
///
/// Returns the log path, or `None` when logging could not be set up (the board
/// still runs, just without a log).
pub fn init(configured: Option<&str>) -> Option<PathBuf> {
    let level = match std::env::var("RUST_LOG") {
        Ok(directives) => level_from_directives(&directives),
        Err(_) => configured.map(parse_level).unwrap_or(LevelFilter::Info),
    };

    let path = log_file_path()?;
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|c| c)
        .build();

    WriteLogger::init(level, config, file).ok()?;
    Some(path)
}
