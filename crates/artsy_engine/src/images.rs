use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use artsy_core::ArtworkId;
use artsy_logging::{artsy_debug, artsy_warn};

use crate::persist::{ensure_output_dir, PersistError};

pub const TEMP_DIRNAME: &str = "temp";
pub const SAVED_DIRNAME: &str = "images";

/// Image files on disk: `{data_dir}/temp` for the staged candidate and
/// `{data_dir}/images` for saved artworks, both named `{artworkId}_{imageId}.jpg`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    temp_dir: PathBuf,
    saved_dir: PathBuf,
}

impl ImageStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            temp_dir: data_dir.join(TEMP_DIRNAME),
            saved_dir: data_dir.join(SAVED_DIRNAME),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn ensure_dirs(&self) -> Result<(), PersistError> {
        ensure_output_dir(&self.temp_dir)?;
        ensure_output_dir(&self.saved_dir)
    }

    pub fn file_name(artwork_id: ArtworkId, image_id: &str) -> String {
        format!("{artwork_id}_{image_id}.jpg")
    }

    pub async fn write_temp(
        &self,
        artwork_id: ArtworkId,
        image_id: &str,
        bytes: &[u8],
    ) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let path = self.temp_dir.join(Self::file_name(artwork_id, image_id));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Move a staged temp image into the saved directory, keeping its name.
    pub fn promote(&self, temp_path: &Path) -> io::Result<PathBuf> {
        let name = temp_path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "temp image path has no file name")
        })?;
        fs::create_dir_all(&self.saved_dir)?;
        let target = self.saved_dir.join(name);
        move_file(temp_path, &target)?;
        Ok(target)
    }

    /// Undo [`ImageStore::promote`].
    pub fn demote(&self, saved_path: &Path, temp_path: &Path) -> io::Result<()> {
        move_file(saved_path, temp_path)
    }

    /// Delete an image file; a file that is already gone is not an error.
    pub fn remove(&self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => artsy_debug!("Removed image {:?}", path),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => artsy_warn!("Failed to remove image {:?}: {}", path, err),
        }
    }

    /// Remove leftovers from a previous process; candidates never survive a restart.
    pub fn clear_temp(&self) -> io::Result<usize> {
        let entries = match fs::read_dir(&self.temp_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err),
        };
        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            // Rename fails across filesystems; fall back to copy + delete.
            if from.exists() {
                fs::copy(from, to)?;
                fs::remove_file(from)?;
                Ok(())
            } else {
                Err(rename_err)
            }
        }
    }
}
