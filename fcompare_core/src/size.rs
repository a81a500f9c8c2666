use fcompare_common::{FcompareError, SizeComparison};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Byte-length comparison of two files
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeComparator;

impl SizeComparator {
    pub fn new() -> Self {
        Self
    }

    /// Compare the sizes of two files.
    ///
    /// Fails fast with `NotFound` only when *neither* path exists. When just
    /// one is missing, the size lookup for that path reports the not-found
    /// failure instead.
    pub fn compare(&self, path_a: &Path, path_b: &Path) -> Result<SizeComparison, FcompareError> {
        if !path_a.exists() && !path_b.exists() {
            return Err(FcompareError::NotFound {
                path: path_a.to_path_buf(),
            });
        }

        for path in [path_a, path_b] {
            if path.is_dir() {
                return Err(FcompareError::IsADirectory {
                    path: path.to_path_buf(),
                });
            }
        }

        let size_a = file_size(path_a)?;
        let size_b = file_size(path_b)?;
        debug!("Sizes: {} = {}, {} = {}", path_a.display(), size_a, path_b.display(), size_b);

        Ok(SizeComparison::new(size_a, size_b))
    }
}

fn file_size(path: &Path) -> Result<u64, FcompareError> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|e| FcompareError::from_io(e, "reading size of", path))
}
