// dbrestoretool/src/archive/mod.rs
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, copy};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{RestoreError, Result};
use crate::utils::process::DumpStream;

/// Single-file extraction from a backup archive.
pub trait ArchiveReader: Send + Sync {
    fn extract_file(&self, path: &str) -> Result<DumpStream>;
}

/// A `.tar`, `.tar.gz` or `.tgz` backup archive on local disk.
#[derive(Debug, Clone)]
pub struct TarArchive {
    archive_path: PathBuf,
}

impl TarArchive {
    pub fn open(archive_path: &Path) -> Result<Self> {
        if !archive_path.is_file() {
            return Err(RestoreError::ArchiveRead {
                path: archive_path.display().to_string(),
                reason: "archive is not a file".to_string(),
            });
        }
        Ok(TarArchive {
            archive_path: archive_path.to_path_buf(),
        })
    }

    fn is_gzipped(&self) -> bool {
        let name = self.archive_path.to_string_lossy();
        name.ends_with(".gz") || name.ends_with(".tgz")
    }

    fn reader(&self) -> Result<Box<dyn Read>> {
        let file = File::open(&self.archive_path)?;
        Ok(if self.is_gzipped() {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        })
    }

    fn read_error(&self, member: &str, reason: impl ToString) -> RestoreError {
        RestoreError::ArchiveRead {
            path: format!("{}:{}", self.archive_path.display(), member),
            reason: reason.to_string(),
        }
    }
}

fn same_member(entry: &Path, wanted: &str) -> bool {
    let entry = entry.to_string_lossy();
    entry.trim_start_matches("./") == wanted.trim_start_matches("./")
}

impl ArchiveReader for TarArchive {
    /// Finds `path` in the archive and spools it to an anonymous temp file,
    /// so the returned stream owns its data and outlives the tar reader.
    fn extract_file(&self, path: &str) -> Result<DumpStream> {
        let reader = self.reader().map_err(|e| self.read_error(path, e))?;
        let mut archive = tar::Archive::new(reader);
        let entries = archive.entries().map_err(|e| self.read_error(path, e))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| self.read_error(path, e))?;
            let entry_path = entry.path().map_err(|e| self.read_error(path, e))?;
            if !entry.header().entry_type().is_file() || !same_member(&entry_path, path) {
                continue;
            }

            let mut spool = tempfile::tempfile().map_err(|e| self.read_error(path, e))?;
            let size = copy(&mut entry, &mut spool).map_err(|e| self.read_error(path, e))?;
            spool
                .seek(SeekFrom::Start(0))
                .map_err(|e| self.read_error(path, e))?;
            debug!("Extracted {} ({} bytes) from {}", path, size, self.archive_path.display());
            return Ok(Box::new(spool));
        }

        Err(self.read_error(path, "no such member in archive"))
    }
}
