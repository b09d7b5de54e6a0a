//! Optional pruning of old artifacts and plots
//!
//! Only files named by this crate (`<slug>_<YYYYMMDD_HHMM>.<ext>`) are
//! candidates; anything else in the directory is left alone.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, warn};

use crate::artifact::{list_files, timestamp_from_file_name};

/// Delete files whose encoded timestamp is older than `days` before `now`.
///
/// Returns the removed paths. Failures are logged, never fatal.
pub fn prune(dir: &Path, extension: &str, days: u32, now: DateTime<Utc>) -> Vec<PathBuf> {
    let cutoff = now - TimeDelta::days(i64::from(days));
    info!(
        dir = %dir.display(),
        "Cleaning up .{} files older than {} days",
        extension,
        days
    );

    let files = match list_files(dir, extension) {
        Ok(files) => files,
        Err(e) => {
            warn!("Retention skipped: {}", e);
            return Vec::new();
        }
    };

    let mut removed = Vec::new();
    for path in files {
        let Some(timestamp) = timestamp_from_file_name(&path, extension) else {
            continue;
        };
        if timestamp >= cutoff {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Deleted old file");
                removed.push(path);
            }
            Err(e) => warn!(path = %path.display(), "Failed to remove: {}", e),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_prune_removes_only_old_named_files() {
        let dir = tempdir().unwrap();
        for name in [
            "zurich_20261001_0600.sounding",
            "zurich_20261017_0600.sounding",
            "payerne_20261010_0000.sounding",
            "notes.sounding",
            "zurich_20261001_0600.png",
        ] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }

        let now = Utc.with_ymd_and_hms(2026, 10, 18, 6, 0, 0).unwrap();
        let removed = prune(dir.path(), "sounding", 7, now);

        let mut names: Vec<String> = removed
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["payerne_20261010_0000.sounding", "zurich_20261001_0600.sounding"]
        );

        assert!(dir.path().join("zurich_20261017_0600.sounding").exists());
        assert!(dir.path().join("notes.sounding").exists());
        assert!(dir.path().join("zurich_20261001_0600.png").exists());
    }

    #[test]
    fn test_prune_missing_dir_is_noop() {
        let dir = tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 6, 0, 0).unwrap();
        assert!(prune(&dir.path().join("missing"), "png", 1, now).is_empty());
    }
}
