//! Scratch files owned by a single request.
//!
//! A [`TmpFile`] removes its path when dropped, so every early return or
//! cancelled future leaves nothing behind. Call [`TmpFile::cleanup`] on the
//! happy path to remove the file asynchronously and observe the result.

use std::{
    io,
    ops::Deref,
    path::{Path, PathBuf},
};

use uuid::Uuid;

#[must_use]
#[derive(Debug)]
pub struct TmpFile(Option<PathBuf>);

impl TmpFile {
    /// Reserves a fresh path inside `dir`. Nothing is created on disk until the
    /// caller (or an external tool) writes to it.
    pub fn new_in(dir: &Path, prefix: &str, extension: &str) -> Self {
        TmpFile(Some(
            dir.join(format!("{prefix}-{}{extension}", Uuid::new_v4())),
        ))
    }

    pub fn path(&self) -> &Path {
        self
    }

    pub async fn cleanup(mut self) -> io::Result<()> {
        if let Some(path) = self.0.take() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

impl AsRef<Path> for TmpFile {
    fn as_ref(&self) -> &Path {
        self
    }
}

impl Deref for TmpFile {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        // Only `cleanup` and `drop` take the path, and both consume the guard.
        self.0.as_deref().unwrap_or_else(|| Path::new(""))
    }
}

impl Drop for TmpFile {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
