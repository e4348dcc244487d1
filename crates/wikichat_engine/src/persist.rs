//! Saving downloaded archives into the download directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("download directory {} is unusable: {reason}", path.display())]
    DownloadDir { path: PathBuf, reason: String },
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Creates the download directory if needed and rejects a path that exists
/// but is not a directory.
pub fn prepare_download_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |reason: String| PersistError::DownloadDir {
        path: dir.to_path_buf(),
        reason,
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(unusable("not a directory".into())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| unusable(e.to_string()))
        }
        Err(err) => Err(unusable(err.to_string())),
    }
}

/// Writes an archive next to its final name as `.<name>.*.part`, then renames
/// it over the target. Until the rename succeeds an older archive under the
/// same name stays intact.
pub struct ArchiveWriter {
    dir: PathBuf,
}

impl ArchiveWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn save(&self, filename: &str, archive: &[u8]) -> Result<PathBuf, PersistError> {
        prepare_download_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let failed = |source: io::Error| PersistError::Write {
            path: target.clone(),
            source,
        };

        let mut part = Builder::new()
            .prefix(&format!(".{filename}."))
            .suffix(".part")
            .tempfile_in(&self.dir)
            .map_err(failed)?;
        part.write_all(archive).map_err(failed)?;
        part.as_file().sync_all().map_err(failed)?;

        // Dropping the returned temp file on error removes the partial copy.
        part.persist(&target).map_err(|err| failed(err.error))?;
        Ok(target)
    }
}
