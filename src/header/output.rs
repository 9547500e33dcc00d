use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{EkfGenError, Result};

/// Write `text` to `path` through a sibling temporary file.
///
/// Either the complete text ends up at `path` or `path` is left as it was.
/// The temporary file is removed on every failure path.
pub(crate) fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let tmp = temp_path(path);
    let written = fs::File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(text.as_bytes())?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&tmp, path));

    match written {
        Ok(()) => {
            tracing::info!(path = %path.display(), bytes = text.len(), "header written");
            Ok(())
        }
        Err(source) => {
            let _ = fs::remove_file(&tmp);
            tracing::error!(path = %path.display(), error = %source, "failed to write header");
            Err(EkfGenError::write_failure(path, source))
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "header".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}
