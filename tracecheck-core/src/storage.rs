use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, TraceError};

/// Read-only access to the documents of one specification directory
#[derive(Debug, Clone)]
pub struct SpecDirectory {
    root: PathBuf,
}

impl SpecDirectory {
    /// Creates a new SpecDirectory rooted at the given path
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Returns the directory path
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Full path of a document inside the directory
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_file()
    }

    /// Read a whole document into memory
    ///
    /// The file handle is scoped to this call and closed on every path.
    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.resolve(name);
        match fs::read_to_string(&path) {
            Ok(content) => {
                log::debug!("Read {} ({} bytes)", path.display(), content.len());
                Ok(content)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::error!("Missing document: {}", path.display());
                Err(TraceError::MissingFile { path })
            }
            Err(source) => {
                log::error!("Failed to read {}: {}", path.display(), source);
                Err(TraceError::ReadFailed { path, source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_existing_document() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("tasks.md"), "- [ ] 1. Task\n")?;

        let spec = SpecDirectory::new(dir.path());
        assert!(spec.exists("tasks.md"));
        assert_eq!(spec.read("tasks.md")?, "- [ ] 1. Task\n");
        Ok(())
    }

    #[test]
    fn test_read_missing_document() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let spec = SpecDirectory::new(dir.path());

        assert!(!spec.exists("requirements.md"));
        let err = spec.read("requirements.md").unwrap_err();
        assert!(matches!(err, TraceError::MissingFile { .. }));
        assert!(err.to_string().contains("requirements.md"));
        Ok(())
    }

    #[test]
    fn test_directory_is_not_a_document() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("tasks.md"))?;
        let spec = SpecDirectory::new(dir.path());
        assert!(!spec.exists("tasks.md"));
        assert!(spec.read("tasks.md").is_err());
        Ok(())
    }
}
