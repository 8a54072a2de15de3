//! Per-run JSON-lines event log.
//!
//! Each generation run gets its own file under the configured log
//! directory, created as `debug_<YYYYmmdd_HHMMSS>.jsonl` and renamed to
//! `<skill-name>.jsonl` once the skill's name is known. Entries are
//! `{"timestamp", "event", "data"}` objects, one per line.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use chrono::Local;
use serde_json::json;

use skillforge_core::events::EventSink;

#[derive(Debug)]
pub struct RunLog {
    path: Mutex<PathBuf>,
}

impl RunLog {
    /// Create a fresh log file in `dir`.
    pub fn create(dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let mut attempt = 0u32;
        loop {
            let file_name = match attempt {
                0 => format!("debug_{stamp}.jsonl"),
                n => format!("debug_{stamp}_{n}.jsonl"),
            };
            let path = dir.join(file_name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    tracing::debug!(path = %path.display(), "Run log created");
                    return Ok(Self {
                        path: Mutex::new(path),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to create run log {}", path.display()));
                }
            }
        }
    }

    /// Current location of the log file.
    pub fn path(&self) -> PathBuf {
        self.lock().clone()
    }

    /// Rename the log to `<skill_name>.jsonl` and return the final path.
    ///
    /// Logs from earlier runs of the same skill are kept; the new one
    /// takes the first free `<skill_name>_<n>.jsonl` instead.
    ///
    /// If the rename fails the log keeps its temporary name.
    pub fn finalize(&self, skill_name: &str) -> PathBuf {
        let mut path = self.lock();

        let mut components = Path::new(skill_name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            tracing::warn!(name = %skill_name, "Skill name is not usable as a log file name");
            return path.clone();
        }

        let target = free_target(&path, skill_name);
        match std::fs::rename(&*path, &target) {
            Ok(()) => {
                tracing::debug!(path = %target.display(), "Run log renamed");
                *path = target;
            }
            Err(e) => {
                tracing::warn!(
                    from = %path.display(),
                    to = %target.display(),
                    error = %e,
                    "Failed to rename run log"
                );
            }
        }
        path.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PathBuf> {
        self.path.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn free_target(current: &Path, skill_name: &str) -> PathBuf {
    let mut attempt = 0u32;
    loop {
        let file_name = match attempt {
            0 => format!("{skill_name}.jsonl"),
            n => format!("{skill_name}_{n}.jsonl"),
        };
        let target = current.with_file_name(file_name);
        if !target.exists() {
            return target;
        }
        attempt += 1;
    }
}

impl EventSink for RunLog {
    fn record(&self, event: &str, data: serde_json::Value) {
        let entry = json!({
            "timestamp": Local::now().to_rfc3339(),
            "event": event,
            "data": data,
        });

        let path = self.lock();
        let result = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&*path)
            .and_then(|mut file| writeln!(file, "{entry}"));
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write run log entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_entries(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn create_uses_debug_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let log = RunLog::create(&tmp.path().join("logs")).unwrap();
        let name = log.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("debug_"));
        assert!(name.ends_with(".jsonl"));
        assert!(log.path().exists());
    }

    #[test]
    fn two_logs_in_the_same_second_do_not_collide() {
        let tmp = tempfile::tempdir().unwrap();
        let a = RunLog::create(tmp.path()).unwrap();
        let b = RunLog::create(tmp.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn records_json_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let log = RunLog::create(tmp.path()).unwrap();
        log.record("start_conversation", json!({"intent": "lint commits"}));
        log.record("questions_generated", json!({"questions": "1. Which?"}));

        let entries = read_entries(&log.path());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["event"], "start_conversation");
        assert_eq!(entries[0]["data"]["intent"], "lint commits");
        assert!(entries[1]["timestamp"].is_string());
    }

    #[test]
    fn finalize_renames_and_keeps_appending() {
        let tmp = tempfile::tempdir().unwrap();
        let log = RunLog::create(tmp.path()).unwrap();
        log.record("skill_generated", json!({}));

        let final_path = log.finalize("commit-linter");
        assert_eq!(final_path, tmp.path().join("commit-linter.jsonl"));
        assert_eq!(log.path(), final_path);

        log.record("after", json!({}));
        assert_eq!(read_entries(&final_path).len(), 2);
    }

    #[test]
    fn finalize_keeps_earlier_log_of_the_same_skill() {
        let tmp = tempfile::tempdir().unwrap();
        let first = RunLog::create(tmp.path()).unwrap();
        first.record("first_run", json!({}));
        let first_path = first.finalize("commit-linter");

        let second = RunLog::create(tmp.path()).unwrap();
        second.record("second_run", json!({}));
        let second_path = second.finalize("commit-linter");

        assert_eq!(second_path, tmp.path().join("commit-linter_1.jsonl"));
        assert_eq!(read_entries(&first_path)[0]["event"], "first_run");
        assert_eq!(read_entries(&second_path)[0]["event"], "second_run");
    }

    #[test]
    fn finalize_keeps_temp_name_for_unusable_names() {
        let tmp = tempfile::tempdir().unwrap();
        let log = RunLog::create(tmp.path()).unwrap();
        let before = log.path();
        assert_eq!(log.finalize("../escape"), before);
        assert!(before.exists());
    }
}
