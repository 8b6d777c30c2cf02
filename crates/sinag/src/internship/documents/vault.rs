use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use super::domain::{DocumentKind, DocumentMedia};
use crate::ids::InternId;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("document storage failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Filesystem store for uploaded requirement files.
///
/// Keys are relative paths of the form `<intern_id>/<kind>-<nanoid>.<ext>`.
#[derive(Debug, Clone)]
pub struct DocumentVault {
    root: PathBuf,
}

impl DocumentVault {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, VaultError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| VaultError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(
        &self,
        intern_id: InternId,
        kind: DocumentKind,
        media: DocumentMedia,
        bytes: &[u8],
    ) -> Result<String, VaultError> {
        let dir = self.root.join(intern_id.to_string());
        fs::create_dir_all(&dir).map_err(|source| VaultError::Io {
            path: dir.clone(),
            source,
        })?;
        let file_name = format!(
            "{}-{}.{}",
            kind.as_str(),
            nanoid::nanoid!(10, &nanoid::alphabet::SAFE),
            media.extension()
        );
        let path = dir.join(&file_name);
        fs::write(&path, bytes).map_err(|source| VaultError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), size = bytes.len(), "document stored");
        Ok(format!("{intern_id}/{file_name}"))
    }

    pub fn read(&self, key: &str) -> Result<Vec<u8>, VaultError> {
        let path = self.resolve(key)?;
        fs::read(&path).map_err(|source| VaultError::Io { path, source })
    }

    /// Removes a stored file; a file that is already gone is not an error.
    pub fn remove(&self, key: &str) -> Result<(), VaultError> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "document already removed");
                Ok(())
            }
            Err(source) => Err(VaultError::Io { path, source }),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, VaultError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if safe {
            Ok(self.root.join(relative))
        } else {
            Err(VaultError::InvalidKey(key.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_read_and_remove() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault = DocumentVault::open(dir.path().join("uploads")).expect("vault");

        let key = vault
            .store(InternId(7), DocumentKind::Resume, DocumentMedia::Pdf, b"%PDF-1.4")
            .expect("stored");
        assert!(key.starts_with("7/resume-"));
        assert!(key.ends_with(".pdf"));
        assert_eq!(vault.read(&key).expect("read"), b"%PDF-1.4");

        vault.remove(&key).expect("removed");
        assert!(vault.read(&key).is_err());
        vault.remove(&key).expect("second remove is a no-op");
    }

    #[test]
    fn keys_cannot_escape_the_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault = DocumentVault::open(dir.path()).expect("vault");
        assert!(matches!(
            vault.read("../secrets.txt"),
            Err(VaultError::InvalidKey(_))
        ));
        assert!(matches!(
            vault.read("/etc/passwd"),
            Err(VaultError::InvalidKey(_))
        ));
    }
}
