use crate::engine::TMP_MARKER;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Temp files younger than this may belong to a writer that is still running.
const STALE_AFTER: Duration = Duration::from_secs(300);

pub(crate) async fn purge_tmp(root: &Path) {
    let root = root.to_path_buf();
    let now = SystemTime::now();

    match tokio::task::spawn_blocking(move || remove_stale(&root, now)).await {
        Ok((removed, failed)) if removed > 0 || failed > 0 => {
            info!(removed, failed, "Cleaned up temporary files");
        },
        Ok(_) => {},
        Err(e) => error!(error = %e, "Temp file cleanup task panicked"),
    }
}

fn remove_stale(root: &Path, now: SystemTime) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;

    for entry in WalkDir::new(root).contents_first(true).into_iter().flatten() {
        let path = entry.path();
        if path == root {
            continue;
        }

        if entry.file_type().is_dir() {
            // Only succeeds for directories left empty by deletes.
            let _ = std::fs::remove_dir(path);
            continue;
        }

        let is_tmp = path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.contains(TMP_MARKER));
        if !is_tmp || !is_stale(path, now) {
            continue;
        }

        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove stale temp file");
                failed += 1;
            },
        }
    }

    (removed, failed)
}

fn is_stale(path: &Path, now: SystemTime) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| now.duration_since(modified).ok())
        .map_or(true, |age| age > STALE_AFTER)
}
