use crate::error::ConvertError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Copies referenced textures next to the generated files, once per
/// distinct source.
#[derive(Debug)]
pub struct AssetStager {
    export_dir: PathBuf,
    staged: HashSet<PathBuf>,
}

impl AssetStager {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            staged: HashSet::new(),
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Copy `source` into the export directory under its own file name.
    ///
    /// Returns the destination, or `None` if the source was already staged
    /// or does not exist (the latter is logged and otherwise ignored).
    pub fn stage(&mut self, source: &Path) -> Result<Option<PathBuf>, ConvertError> {
        if self.staged.contains(source) {
            return Ok(None);
        }
        self.staged.insert(source.to_path_buf());

        if !source.is_file() {
            log::warn!("Texture not found, not staged: {}", source.display());
            return Ok(None);
        }

        let file_name = source.file_name().ok_or_else(|| {
            ConvertError::Validation(format!("Invalid asset path: {}", source.display()))
        })?;
        let dest = self.export_dir.join(file_name);
        if dest.as_path() != source {
            fs::create_dir_all(&self.export_dir)?;
            fs::copy(source, &dest)?;
            log::debug!("Staged {} -> {}", source.display(), dest.display());
        }
        Ok(Some(dest))
    }

    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_copies_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("bell_tower.png");
        fs::write(&source, b"png").unwrap();

        let mut stager = AssetStager::new(dir.path().join("export"));
        let dest = stager.stage(&source).unwrap().unwrap();
        assert_eq!(dest, dir.path().join("export/bell_tower.png"));
        assert_eq!(fs::read(&dest).unwrap(), b"png");

        fs::write(&dest, b"edited").unwrap();
        assert!(stager.stage(&source).unwrap().is_none());
        assert_eq!(fs::read(&dest).unwrap(), b"edited");
        assert_eq!(stager.staged_count(), 1);
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut stager = AssetStager::new(dir.path());
        let result = stager.stage(&dir.path().join("nope.png")).unwrap();
        assert!(result.is_none());
    }
}
