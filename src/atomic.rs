//! All-or-nothing file writes.
//!
//! Output is staged in a temporary file in the destination directory,
//! flushed to disk, then renamed over the destination. A failure at any
//! step removes the staged file and leaves the destination untouched.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Stage output through `write` and move it to `path` on success.
pub fn write_atomic_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> Result<()>,
{
    let dir = parent_dir(path);
    if !dir.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("output directory {} does not exist", dir.display()),
        )));
    }

    let staged = tempfile::Builder::new()
        .prefix(".searchpdf-")
        .suffix(".tmp")
        .tempfile_in(&dir)?;
    {
        let mut writer = BufWriter::new(staged.as_file());
        write(&mut writer)?;
        writer.flush()?;
    }
    commit(staged, path)
}

/// Write `bytes` to `path` atomically.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    write_atomic_with(path, |w| Ok(w.write_all(bytes)?))
}

fn commit(staged: NamedTempFile, path: &Path) -> Result<()> {
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
