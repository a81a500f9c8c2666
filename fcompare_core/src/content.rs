use fcompare_common::{
    ContentMode, ContentReport, ContentVerdict, FcompareError, DEFAULT_DEEP_COMPARE_BUFFER,
};
use std::fs::{self, File, Metadata};
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Byte-level equality of two files.
///
/// [`ContentMode::Shallow`] is a cheap pre-filter: it looks only at size and
/// modification time and can call two differing files equal. Only
/// [`ContentMode::Deep`] reads the bytes and is authoritative. The comparator
/// never escalates from one mode to the other on its own.
#[derive(Debug, Clone, Copy)]
pub struct ContentComparator {
    buffer_size: usize,
}

impl ContentComparator {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    pub fn compare(
        &self,
        path_a: &Path,
        path_b: &Path,
        mode: ContentMode,
    ) -> Result<bool, FcompareError> {
        let meta_a = file_metadata(path_a)?;
        let meta_b = file_metadata(path_b)?;

        // Devices, FIFOs and sockets never compare equal
        if !meta_a.is_file() || !meta_b.is_file() {
            debug!(
                "Byte comparing {} and {} ({}): not regular files",
                path_a.display(),
                path_b.display(),
                mode
            );
            return Ok(false);
        }

        let equal = match mode {
            ContentMode::Shallow => shallow_equal(path_a, &meta_a, path_b, &meta_b)?,
            ContentMode::Deep => {
                if meta_a.len() != meta_b.len() {
                    false
                } else {
                    self.deep_equal(path_a, path_b)?
                }
            }
        };

        debug!(
            "Byte comparing {} and {} ({}): {}",
            path_a.display(),
            path_b.display(),
            mode,
            equal
        );
        Ok(equal)
    }

    pub fn verdict(
        &self,
        path_a: &Path,
        path_b: &Path,
        mode: ContentMode,
    ) -> Result<ContentVerdict, FcompareError> {
        let equal = self.compare(path_a, path_b, mode)?;
        Ok(ContentVerdict { mode, equal })
    }

    /// Run the shallow and the deep comparison.
    pub fn report(&self, path_a: &Path, path_b: &Path) -> Result<ContentReport, FcompareError> {
        Ok(ContentReport {
            shallow: self.verdict(path_a, path_b, ContentMode::Shallow)?,
            deep: self.verdict(path_a, path_b, ContentMode::Deep)?,
        })
    }

    fn deep_equal(&self, path_a: &Path, path_b: &Path) -> Result<bool, FcompareError> {
        let mut file_a = File::open(path_a).map_err(|e| FcompareError::from_io(e, "opening", path_a))?;
        let mut file_b = File::open(path_b).map_err(|e| FcompareError::from_io(e, "opening", path_b))?;

        let mut buf_a = vec![0u8; self.buffer_size];
        let mut buf_b = vec![0u8; self.buffer_size];

        loop {
            let read_a = fill(&mut file_a, &mut buf_a)
                .map_err(|e| FcompareError::from_io(e, "reading", path_a))?;
            let read_b = fill(&mut file_b, &mut buf_b)
                .map_err(|e| FcompareError::from_io(e, "reading", path_b))?;

            if read_a != read_b || buf_a[..read_a] != buf_b[..read_b] {
                return Ok(false);
            }

            if read_a == 0 {
                return Ok(true);
            }
        }
    }
}

impl Default for ContentComparator {
    fn default() -> Self {
        Self::new(DEFAULT_DEEP_COMPARE_BUFFER)
    }
}

fn file_metadata(path: &Path) -> Result<Metadata, FcompareError> {
    let meta = fs::metadata(path).map_err(|e| FcompareError::from_io(e, "reading metadata of", path))?;
    if meta.is_dir() {
        return Err(FcompareError::IsADirectory {
            path: path.to_path_buf(),
        });
    }
    Ok(meta)
}

fn shallow_equal(
    path_a: &Path,
    meta_a: &Metadata,
    path_b: &Path,
    meta_b: &Metadata,
) -> Result<bool, FcompareError> {
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    let modified_a = meta_a
        .modified()
        .map_err(|e| FcompareError::from_io(e, "reading modification time of", path_a))?;
    let modified_b = meta_b
        .modified()
        .map_err(|e| FcompareError::from_io(e, "reading modification time of", path_b))?;
    Ok(modified_a == modified_b)
}

/// Read until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcompare_common::ErrorKind;
    use filetime::{set_file_mtime, FileTime};
    use tempfile::TempDir;

    fn pair(temp: &TempDir, left: &[u8], right: &[u8]) -> (std::path::PathBuf, std::path::PathBuf) {
        let a = temp.path().join("left.bin");
        let b = temp.path().join("right.bin");
        fs::write(&a, left).unwrap();
        fs::write(&b, right).unwrap();
        (a, b)
    }

    #[test]
    fn test_identical_files_deep() {
        let temp = TempDir::new().unwrap();
        let (a, b) = pair(&temp, b"Hello World", b"Hello World");

        let comparator = ContentComparator::default();
        assert!(comparator.compare(&a, &b, ContentMode::Deep).unwrap());
    }

    #[test]
    fn test_one_byte_differs_shallow_may_agree() {
        let temp = TempDir::new().unwrap();
        let (a, b) = pair(&temp, b"Hello World", b"Hello Worle");
        let mtime = FileTime::from_unix_time(1_700_000_000, 0);
        set_file_mtime(&a, mtime).unwrap();
        set_file_mtime(&b, mtime).unwrap();

        let comparator = ContentComparator::default();
        assert!(!comparator.compare(&a, &b, ContentMode::Deep).unwrap());
        // Same size and mtime: the heuristic reports equal, as documented
        assert!(comparator.compare(&a, &b, ContentMode::Shallow).unwrap());
    }

    #[test]
    fn test_shallow_detects_mtime_difference() {
        let temp = TempDir::new().unwrap();
        let (a, b) = pair(&temp, b"same", b"same");
        set_file_mtime(&a, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();
        set_file_mtime(&b, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

        let comparator = ContentComparator::default();
        assert!(!comparator.compare(&a, &b, ContentMode::Shallow).unwrap());
        assert!(comparator.compare(&a, &b, ContentMode::Deep).unwrap());
    }

    #[test]
    fn test_size_mismatch() {
        let temp = TempDir::new().unwrap();
        let (a, b) = pair(&temp, b"short", b"much longer");

        let comparator = ContentComparator::default();
        assert!(!comparator.compare(&a, &b, ContentMode::Deep).unwrap());
        assert!(!comparator.compare(&a, &b, ContentMode::Shallow).unwrap());
    }

    #[test]
    fn test_small_buffer_spans_chunks() {
        let temp = TempDir::new().unwrap();
        let left: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let mut right = left.clone();
        let (a, b) = pair(&temp, &left, &right);

        let comparator = ContentComparator::new(7);
        assert!(comparator.compare(&a, &b, ContentMode::Deep).unwrap());

        right[999] ^= 0xff;
        fs::write(&b, &right).unwrap();
        assert!(!comparator.compare(&a, &b, ContentMode::Deep).unwrap());
    }

    #[test]
    fn test_empty_files_equal() {
        let temp = TempDir::new().unwrap();
        let (a, b) = pair(&temp, b"", b"");
        let comparator = ContentComparator::default();
        assert!(comparator.compare(&a, &b, ContentMode::Deep).unwrap());
    }

    #[test]
    fn test_report_tags_modes() {
        let temp = TempDir::new().unwrap();
        let (a, b) = pair(&temp, b"abc", b"abc");

        let report = ContentComparator::default().report(&a, &b).unwrap();
        assert_eq!(report.shallow.mode, ContentMode::Shallow);
        assert_eq!(report.deep.mode, ContentMode::Deep);
        assert!(report.deep.equal);
    }

    #[test]
    fn test_missing_and_directory() {
        let temp = TempDir::new().unwrap();
        let (a, _) = pair(&temp, b"abc", b"abc");
        let comparator = ContentComparator::default();

        let err = comparator
            .compare(&a, &temp.path().join("missing"), ContentMode::Deep)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = comparator
            .compare(&a, temp.path(), ContentMode::Shallow)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IsADirectory);
    }

    #[cfg(unix)]
    #[test]
    fn test_special_files_never_equal() {
        let comparator = ContentComparator::default();
        let null = Path::new("/dev/null");
        let zero = Path::new("/dev/zero");

        assert!(!comparator.compare(null, null, ContentMode::Shallow).unwrap());
        assert!(!comparator.compare(null, null, ContentMode::Deep).unwrap());
        // Must return instead of reading an endless stream
        assert!(!comparator.compare(zero, zero, ContentMode::Deep).unwrap());

        let temp = TempDir::new().unwrap();
        let (a, _) = pair(&temp, b"", b"");
        assert!(!comparator.compare(&a, null, ContentMode::Deep).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_metadata_denied_in_locked_directory() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let (a, _) = pair(&temp, b"abc", b"abc");
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let b = locked.join("inner.bin");
        fs::write(&b, b"abc").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignores permission bits
        let readable = fs::metadata(&b).is_ok();
        let result = ContentComparator::default().compare(&a, &b, ContentMode::Shallow);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        assert_eq!(result.unwrap_err().kind(), ErrorKind::PermissionDenied);
    }

    #[cfg(unix)]
    #[test]
    fn test_deep_compare_unreadable_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let (a, b) = pair(&temp, b"secret", b"secret");
        fs::set_permissions(&b, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignores permission bits
        if File::open(&b).is_ok() {
            return;
        }

        let err = ContentComparator::default()
            .compare(&a, &b, ContentMode::Deep)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }
}
