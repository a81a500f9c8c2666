use fcompare_common::{FcompareError, IdentityResult};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Identity of the storage object a path resolves to
#[cfg(unix)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    pub dev: u64,
    pub ino: u64,
}

#[cfg(not(unix))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId(std::path::PathBuf);

/// Symlink status and filesystem sameness of two paths
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityInspector;

impl IdentityInspector {
    pub fn new() -> Self {
        Self
    }

    pub fn inspect(&self, path_a: &Path, path_b: &Path) -> Result<IdentityResult, FcompareError> {
        let is_symlink_a = is_symlink(path_a);
        let is_symlink_b = is_symlink(path_b);
        let same_filesystem_entity = self.same_entity(path_a, path_b)?;

        Ok(IdentityResult {
            is_symlink_a,
            is_symlink_b,
            same_filesystem_entity,
        })
    }

    /// True when both paths resolve to one entity (same path, hard link, or
    /// a symlink pointing at the other).
    pub fn same_entity(&self, path_a: &Path, path_b: &Path) -> Result<bool, FcompareError> {
        let id_a = entity_id(path_a)?;
        let id_b = entity_id(path_b)?;
        debug!("Entity of {}: {:?}, of {}: {:?}", path_a.display(), id_a, path_b.display(), id_b);
        Ok(id_a == id_b)
    }
}

/// lstat-style check; never follows the link. Missing paths are not symlinks.
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

#[cfg(unix)]
pub fn entity_id(path: &Path) -> Result<EntityId, FcompareError> {
    use std::os::unix::fs::MetadataExt;

    let meta = fs::metadata(path).map_err(|e| FcompareError::from_io(e, "resolving", path))?;
    Ok(EntityId {
        dev: meta.dev(),
        ino: meta.ino(),
    })
}

#[cfg(not(unix))]
pub fn entity_id(path: &Path) -> Result<EntityId, FcompareError> {
    fs::canonicalize(path)
        .map(EntityId)
        .map_err(|e| FcompareError::from_io(e, "resolving", path))
}
