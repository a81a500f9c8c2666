use crate::crypto_policy::{algorithms_for, CryptoPolicy};
use fcompare_common::{DigestSet, FcompareError, HashAlgorithm, HashComparison};
use md5::Md5;
use memmap2::Mmap;
use sha1::{Digest, Sha1};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Whole-file digest computation under a [`CryptoPolicy`]
pub struct HashEngine {
    policy: Box<dyn CryptoPolicy>,
}

impl HashEngine {
    pub fn new(policy: Box<dyn CryptoPolicy>) -> Self {
        Self { policy }
    }

    /// Digest a file with every algorithm the policy permits.
    pub fn compute(&self, path: &Path) -> Result<DigestSet, FcompareError> {
        let restricted = self.policy.is_restricted();
        self.compute_with(path, restricted)
    }

    /// Digest both files of a pair under one policy decision.
    pub fn compare(&self, path_a: &Path, path_b: &Path) -> Result<HashComparison, FcompareError> {
        let restricted = self.policy.is_restricted();
        let left = self.compute_with(path_a, restricted)?;
        let right = self.compute_with(path_b, restricted)?;
        let matches = left.matches(&right);

        Ok(HashComparison {
            left,
            right,
            restricted_mode: restricted,
            matches,
        })
    }

    fn compute_with(&self, path: &Path, restricted: bool) -> Result<DigestSet, FcompareError> {
        let metadata = fs::metadata(path)
            .map_err(|e| FcompareError::from_io(e, "reading metadata of", path))?;
        if metadata.is_dir() {
            return Err(FcompareError::IsADirectory {
                path: path.to_path_buf(),
            });
        }
        if !metadata.is_file() {
            return Err(FcompareError::NotARegularFile {
                path: path.to_path_buf(),
            });
        }

        let algorithms = algorithms_for(restricted);
        let file = File::open(path).map_err(|e| FcompareError::from_io(e, "opening", path))?;
        let len = file
            .metadata()
            .map_err(|e| FcompareError::from_io(e, "reading metadata of", path))?
            .len();

        // Pseudo-files (procfs, sysfs) report a zero length but still have content
        if len == 0 {
            debug!("Zero-length {:?}, reading without a map", path);
            let buffer = read_all(&file, path, 0)?;
            return Ok(digest_bytes(&buffer, algorithms, restricted));
        }

        match unsafe { Mmap::map(&file) } {
            Ok(mmap) => Ok(digest_bytes(&mmap[..], algorithms, restricted)),
            Err(e) => {
                debug!("Memory map of {:?} failed ({}), reading into buffer", path, e);
                let buffer = read_all(&file, path, len as usize)?;
                Ok(digest_bytes(&buffer, algorithms, restricted))
            }
        }
    }
}

fn read_all(mut file: &File, path: &Path, capacity: usize) -> Result<Vec<u8>, FcompareError> {
    let mut buffer = Vec::with_capacity(capacity);
    file.read_to_end(&mut buffer)
        .map_err(|e| FcompareError::from_io(e, "reading", path))?;
    Ok(buffer)
}

/// Feed one in-memory view of the file to each requested digest.
fn digest_bytes(bytes: &[u8], algorithms: &[HashAlgorithm], restricted: bool) -> DigestSet {
    DigestSet::from_digests(
        restricted,
        algorithms.iter().map(|algorithm| {
            let hex_digest = match algorithm {
                HashAlgorithm::Md5 => hex::encode(Md5::digest(bytes)),
                HashAlgorithm::Sha1 => hex::encode(Sha1::digest(bytes)),
            };
            (*algorithm, hex_digest)
        }),
    )
}
