use crate::errors::RecorderError;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOG_EXTENSION: &str = "jsonl";

/// Deletes the oldest `*.jsonl` files in `dir` until their combined size is
/// within `budget_bytes`. Other files are neither counted nor touched.
pub fn enforce_total_budget(dir: &Path, budget_bytes: u64) -> Result<Vec<PathBuf>, RecorderError> {
    let mut logs = fs::read_dir(dir)
        .map_err(|e| RecorderError::Io(format!("{}: {e}", dir.display())))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(LOG_EXTENSION))
        .filter_map(|path| {
            let meta = fs::metadata(&path).ok()?;
            Some((path, meta.modified().ok(), meta.len()))
        })
        .collect::<Vec<_>>();

    logs.sort_by(|a, b| a.1.cmp(&b.1));

    let mut total = logs.iter().map(|(_, _, len)| *len).sum::<u64>();
    let mut deleted = Vec::new();
    for (path, _, len) in logs {
        if total <= budget_bytes {
            break;
        }
        fs::remove_file(&path).map_err(|e| RecorderError::Io(format!("{}: {e}", path.display())))?;
        total = total.saturating_sub(len);
        deleted.push(path);
    }

    Ok(deleted)
}
