//! Extraction of timing and memory facts from raw process output.
//!
//! Every extractor returns `None` when its pattern is absent: a metric that only some
//! versions print must not abort a comparison. When a pattern occurs several times in one
//! text, the last occurrence wins.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Timestamp prefix of server log lines, e.g. `2013.07.03 14:22:51 INFO ...`.
pub const DATE_FORMAT: &str = "%Y.%m.%d %H:%M:%S";
const DATE_PREFIX_LEN: usize = 19;

static TOTAL_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Total time:\s+(?:(\d+):)?(\d+)\.(\d+)\s?s").expect("total time pattern")
});

static FINAL_MEMORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Final Memory:\s*(\d+)M/(\d+)M").expect("final memory pattern"));

static COMPUTATION_DONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"done:\s(\d+)\sms$").expect("computation pattern"));

static STOP_DONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Stop \S+ done: (\d+) ms").expect("stop pattern"));

/// Build duration in milliseconds.
///
/// ```text
/// Total time: 6.015s
/// Total time: 3:14.025s
/// ```
pub fn extract_total_time(logs: &str) -> Option<u64> {
    let caps = TOTAL_TIME.captures_iter(logs).last()?;
    let minutes = match caps.get(1) {
        Some(m) => m.as_str().parse::<u64>().ok()?,
        None => 0,
    };
    let seconds = caps[2].parse::<u64>().ok()?;
    let millis = caps[3].parse::<u64>().ok()?;

    minutes
        .checked_mul(60_000)?
        .checked_add(seconds.checked_mul(1_000)?)?
        .checked_add(millis)
}

/// Used heap in MB at the end of a build (`Final Memory: 68M/190M` gives 68).
pub fn extract_end_memory(logs: &str) -> Option<u64> {
    extract_final_memory(logs, 1)
}

/// Heap size in MB at the end of a build (`Final Memory: 68M/190M` gives 190).
pub fn extract_max_memory(logs: &str) -> Option<u64> {
    extract_final_memory(logs, 2)
}

fn extract_final_memory(logs: &str, group: usize) -> Option<u64> {
    let caps = FINAL_MEMORY.captures_iter(logs).last()?;
    caps[group].parse().ok()
}

/// Duration of the last completed computation phase.
///
/// ```text
/// #1 - big-project - processing analysis report done: 914072 ms
/// ```
pub fn extract_computation_total_time<S: AsRef<str>>(lines: &[S]) -> Option<u64> {
    lines.iter().rev().find_map(|line| {
        let caps = COMPUTATION_DONE.captures(line.as_ref().trim_end())?;
        caps[1].parse().ok()
    })
}

/// Shutdown duration as reported by the server itself (`Stop server done: 1200 ms`).
pub fn extract_stop_time<S: AsRef<str>>(lines: &[S]) -> Option<u64> {
    lines.iter().rev().find_map(|line| {
        let caps = STOP_DONE.captures(line.as_ref())?;
        caps[1].parse().ok()
    })
}

/// Parses the leading `yyyy.MM.dd HH:mm:ss` timestamp of a log line.
pub fn extract_date(line: &str) -> Option<NaiveDateTime> {
    let prefix = line.get(..DATE_PREFIX_LEN)?;
    NaiveDateTime::parse_from_str(prefix, DATE_FORMAT).ok()
}

/// First parseable timestamp, scanning in iteration order. Pass reversed lines to get the
/// last one.
pub fn extract_first_date<I, S>(lines: I) -> Option<NaiveDateTime>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .find_map(|line| extract_date(line.as_ref()))
}

/// Milliseconds between the first and the last timestamped line, e.g. a startup or
/// shutdown duration. Log timestamps are second-grained.
pub fn elapsed_millis<S: AsRef<str>>(lines: &[S]) -> Option<u64> {
    let first = extract_first_date(lines)?;
    let last = extract_first_date(lines.iter().rev())?;
    u64::try_from((last - first).num_milliseconds()).ok()
}

pub fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}

/// Truncates every `*.log` file under `dir`. Returns the number of files cleared.
pub fn clear_logs(dir: &Path) -> io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut cleared = 0;
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let is_log = entry.path().extension().is_some_and(|ext| ext == "log");
        if entry.file_type().is_file() && is_log {
            fs::write(entry.path(), b"")?;
            cleared += 1;
        }
    }
    Ok(cleared)
}
