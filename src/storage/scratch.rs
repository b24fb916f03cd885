use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Scratch storage for uploads that must never outlive their request.
#[derive(Clone)]
pub struct ScratchStore {
    dir: PathBuf,
}

impl ScratchStore {
    pub fn new(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Writes the upload under a fresh uuid name. The client filename never
    /// reaches the filesystem; only its already-validated extension does.
    pub fn stash(&self, extension: &str, bytes: &[u8]) -> io::Result<ScratchFile> {
        let path = self.dir.join(format!("{}.{}", Uuid::new_v4(), extension));
        let mut file = fs::File::create(&path)?;
        file.write_all(bytes)?;
        Ok(ScratchFile { path })
    }
}

/// Removes its backing file on drop, so every exit path of a request cleans
/// up after itself.
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                log::warn!(
                    "failed to remove scratch file {}: {}",
                    self.path.display(),
                    err
                );
            }
        }
    }
}
