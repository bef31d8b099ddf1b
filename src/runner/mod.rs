//! Hourly run wrapper — wait for the scheduled minute, start the
//! orchestrator, capture its output in a timestamped log.
//!
//! The wrapper knows nothing about the orchestrator beyond its command line;
//! it exists so cron only has to fire once an hour and the offset, logging,
//! and exit-status plumbing live in one place.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Run the orchestrator command once. With `at_minute` set, sleep until the
/// next wall-clock occurrence of that minute-of-hour first. Returns the
/// child's exit code and the log file its output went to.
pub fn run_once(
    command: &str,
    args: &[String],
    log_dir: &Path,
    at_minute: Option<u32>,
) -> Result<(i32, PathBuf), String> {
    if let Some(minute) = at_minute {
        if minute > 59 {
            return Err(format!("minute offset must be 0-59, got {}", minute));
        }
        let wait = seconds_until_minute(epoch_secs(), minute);
        if wait > 0 {
            println!("waiting {}s until minute :{:02}", wait, minute);
            std::thread::sleep(Duration::from_secs(wait));
        }
    }

    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("cannot create log dir {}: {}", log_dir.display(), e))?;
    let log_path = log_dir.join(format!("run_{}.log", log_stamp(epoch_secs())));
    let log = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| format!("cannot open {}: {}", log_path.display(), e))?;
    let log_err = log
        .try_clone()
        .map_err(|e| format!("cannot clone log handle: {}", e))?;

    let status = Command::new(command)
        .args(args)
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .status()
        .map_err(|e| format!("failed to spawn {}: {}", command, e))?;

    Ok((status.code().unwrap_or(-1), log_path))
}

/// Seconds to sleep so the next action lands on `minute` past the hour.
/// Any second inside the target minute counts as "now" — cron jitter must
/// not push the run to the next hour.
pub fn seconds_until_minute(now_epoch: u64, minute: u32) -> u64 {
    let into_hour = now_epoch % 3600;
    if into_hour / 60 == u64::from(minute) {
        return 0;
    }
    let target = u64::from(minute) * 60;
    (target + 3600 - into_hour) % 3600
}

/// Current time as ISO 8601 UTC.
pub fn now_iso8601() -> String {
    let (y, mo, d, h, mi, s) = utc_parts(epoch_secs());
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        y, mo, d, h, mi, s
    )
}

/// Filesystem-safe UTC stamp for log file names.
fn log_stamp(secs: u64) -> String {
    let (y, mo, d, h, mi, s) = utc_parts(secs);
    format!("{:04}{:02}{:02}T{:02}{:02}{:02}Z", y, mo, d, h, mi, s)
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Break epoch seconds into UTC Y/M/D h:m:s. Manual Gregorian conversion —
/// no chrono dependency.
fn utc_parts(secs: u64) -> (i64, usize, i64, u64, u64, u64) {
    let days = secs / 86400;
    let time_secs = secs % 86400;
    let hours = time_secs / 3600;
    let minutes = (time_secs % 3600) / 60;
    let seconds = time_secs % 60;

    let mut y = 1970i64;
    let mut remaining = days as i64;
    loop {
        let year_days = if is_leap(y) { 366 } else { 365 };
        if remaining < year_days {
            break;
        }
        remaining -= year_days;
        y += 1;
    }
    let leap = is_leap(y);
    let month_days = [
        31,
        if leap { 29 } else { 28 },
        31,
        30,
        31,
        30,
        31,
        31,
        30,
        31,
        30,
        31,
    ];
    let mut m = 0;
    for (i, &md) in month_days.iter().enumerate() {
        if remaining < md as i64 {
            m = i + 1;
            break;
        }
        remaining -= md as i64;
    }
    let d = remaining + 1;

    (y, m, d, hours, minutes, seconds)
}

fn is_leap(y: i64) -> bool {
    (y % 4 == 0 && y % 100 != 0) || y % 400 == 0
}
