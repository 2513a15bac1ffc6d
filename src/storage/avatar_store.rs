use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ContactsError, ContactsResult};
use crate::forms::UploadedFile;

/// Directory under the media root that holds avatar files.
pub const AVATAR_DIR: &str = "avatars";

/// Flat file store for avatar images. Stored references are paths relative
/// to `root`, e.g. `avatars/3f2b...e1.png`.
#[derive(Debug, Clone)]
pub struct AvatarStore {
    root: PathBuf,
}

impl AvatarStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes the upload under a generated name and returns its reference.
    pub fn save(&self, file: &UploadedFile) -> ContactsResult<String> {
        let dir = self.root.join(AVATAR_DIR);
        std::fs::create_dir_all(&dir)?;

        let ext = file.extension().unwrap_or_else(|| "bin".to_string());
        let name = format!("{}.{}", Uuid::new_v4().simple(), ext);
        std::fs::write(dir.join(&name), &file.data)?;

        let reference = format!("{}/{}", AVATAR_DIR, name);
        debug!(reference = %reference, size = file.size(), "Stored avatar");
        Ok(reference)
    }

    /// Absolute location of a stored reference. References that try to leave
    /// the avatar directory are refused.
    pub fn path_for(&self, reference: &str) -> ContactsResult<PathBuf> {
        let name = reference
            .strip_prefix(AVATAR_DIR)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(|c: char| c == '/' || c == '\\') && !name.starts_with('.'))
            .ok_or_else(|| ContactsError::Other(format!("Invalid avatar reference: {}", reference)))?;
        Ok(self.root.join(AVATAR_DIR).join(name))
    }

    pub fn exists(&self, reference: &str) -> bool {
        self.path_for(reference).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Removes a stored file. A file that is already gone is not an error.
    pub fn remove(&self, reference: &str) -> ContactsResult<()> {
        let path = self.path_for(reference)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(reference = %reference, "Removed avatar");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like `remove`, for cleanup paths where a failure must not mask the
    /// original outcome.
    pub fn discard(&self, reference: &str) {
        if let Err(e) = self.remove(reference) {
            warn!(reference = %reference, error = %e, "Failed to remove avatar");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            field: "avatar".into(),
            file_name: "face.PNG".into(),
            content_type: "image/png".into(),
            data: bytes.to_vec(),
        }
    }

    #[test]
    fn save_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = AvatarStore::new(dir.path());

        let reference = store.save(&png(b"\x89PNG")).unwrap();
        assert!(reference.starts_with("avatars/"));
        assert!(reference.ends_with(".png"));
        assert!(store.exists(&reference));
        assert_eq!(std::fs::read(store.path_for(&reference).unwrap()).unwrap(), b"\x89PNG");

        store.remove(&reference).unwrap();
        assert!(!store.exists(&reference));
        store.remove(&reference).unwrap();
    }

    #[test]
    fn unknown_extension_falls_back_to_bin() {
        let dir = tempfile::tempdir().unwrap();
        let store = AvatarStore::new(dir.path());
        let mut file = png(b"x");
        file.file_name = "blob".into();
        assert!(store.save(&file).unwrap().ends_with(".bin"));
    }

    #[test]
    fn traversal_references_are_refused() {
        let store = AvatarStore::new("/tmp/media");
        assert!(store.path_for("avatars/../secret").is_err());
        assert!(store.path_for("../avatars/x.png").is_err());
        assert!(store.path_for("avatars/").is_err());
        assert!(store.path_for("avatars/a.png").is_ok());
    }
}
