// src/persist.rs

//! Write-then-rename file persistence

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `data` next to `path` and rename it into place
///
/// Readers never observe a half-written file. The temporary file is removed
/// if the rename fails.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = temp_path(path);
    fs::write(&tmp, data)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
