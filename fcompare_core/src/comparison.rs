use crate::content::ContentComparator;
use crate::crypto_policy::{policy_for_setting, CryptoPolicy};
use crate::hash_engine::HashEngine;
use crate::identity::IdentityInspector;
use crate::size::SizeComparator;
use fcompare_common::{
    AppConfig, Axis, AxisOutcome, AxisSelection, ComparisonReport, FcompareError,
};
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info, warn};

/// Runs the requested comparison axes against a file pair.
///
/// Every axis is evaluated independently; a failing axis is recorded in the
/// report and never stops the others.
pub struct ComparisonEngine {
    hashes: HashEngine,
    sizes: SizeComparator,
    contents: ContentComparator,
    identity: IdentityInspector,
}

impl ComparisonEngine {
    pub fn new(policy: Box<dyn CryptoPolicy>) -> Self {
        Self {
            hashes: HashEngine::new(policy),
            sizes: SizeComparator::new(),
            contents: ContentComparator::default(),
            identity: IdentityInspector::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(policy_for_setting(config.restricted_mode))
            .with_buffer_size(config.deep_compare_buffer)
    }

    /// Chunk size used by deep content comparison
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.contents = ContentComparator::new(buffer_size);
        self
    }

    pub fn compare(&self, path_a: &Path, path_b: &Path, axes: &AxisSelection) -> ComparisonReport {
        info!("Comparing {} with {}", path_a.display(), path_b.display());

        let hash = axes
            .includes(Axis::Hash)
            .then(|| record(Axis::Hash, self.hashes.compare(path_a, path_b)));
        let size = axes
            .includes(Axis::Size)
            .then(|| record(Axis::Size, self.sizes.compare(path_a, path_b)));
        let content = axes
            .includes(Axis::Content)
            .then(|| record(Axis::Content, self.contents.report(path_a, path_b)));
        let identity = axes
            .includes(Axis::Identity)
            .then(|| record(Axis::Identity, self.identity.inspect(path_a, path_b)));

        ComparisonReport {
            path_a: path_a.to_path_buf(),
            path_b: path_b.to_path_buf(),
            hash,
            size,
            content,
            identity,
        }
    }
}

fn record<T: Debug>(axis: Axis, result: Result<T, FcompareError>) -> AxisOutcome<T> {
    let outcome = AxisOutcome::from(result);
    match &outcome {
        AxisOutcome::Success(value) => debug!("{:?} axis: {:?}", axis, value),
        AxisOutcome::Failure(err) => warn!("{:?} axis failed: {}", axis, err),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto_policy::ForcedPolicy;
    use fcompare_common::{ErrorKind, HashAlgorithm, RestrictedModeSetting};
    use std::fs;
    use tempfile::TempDir;

    fn engine() -> ComparisonEngine {
        ComparisonEngine::new(Box::new(ForcedPolicy(false)))
    }

    #[test]
    fn test_all_axes_by_default() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        let b = temp.path().join("b.txt");
        fs::write(&a, b"same content").unwrap();
        fs::write(&b, b"same content").unwrap();

        let report = engine().compare(&a, &b, &AxisSelection::all());

        let hash = report.hash.unwrap();
        assert!(hash.success().unwrap().matches);
        let size = report.size.unwrap();
        assert!(size.success().unwrap().equal);
        let content = report.content.unwrap();
        assert!(content.success().unwrap().deep.equal);
        let identity = report.identity.unwrap();
        assert!(!identity.success().unwrap().same_filesystem_entity);
    }

    #[test]
    fn test_only_selected_axes_run() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        fs::write(&a, b"x").unwrap();

        let axes: AxisSelection = [Axis::Size, Axis::Identity].into_iter().collect();
        let report = engine().compare(&a, &a, &axes);

        assert!(report.hash.is_none());
        assert!(report.content.is_none());
        assert!(report.size.is_some());
        assert!(report.identity.unwrap().success().unwrap().same_filesystem_entity);
    }

    #[test]
    fn test_missing_path_fails_every_axis_without_panicking() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        let missing = temp.path().join("missing.txt");
        fs::write(&a, b"present").unwrap();

        let report = engine().compare(&a, &missing, &AxisSelection::all());

        let kinds = [
            report.hash.as_ref().and_then(|o| o.failure()).map(|e| e.kind),
            report.size.as_ref().and_then(|o| o.failure()).map(|e| e.kind),
            report.content.as_ref().and_then(|o| o.failure()).map(|e| e.kind),
            report.identity.as_ref().and_then(|o| o.failure()).map(|e| e.kind),
        ];
        for kind in kinds {
            assert_eq!(kind, Some(ErrorKind::NotFound));
        }
    }

    #[test]
    fn test_one_axis_failure_does_not_block_others() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        fs::write(&a, b"present").unwrap();

        // A directory breaks hash/size/content but identity still resolves
        let report = engine().compare(&a, temp.path(), &AxisSelection::all());

        assert_eq!(
            report.hash.unwrap().failure().map(|e| e.kind),
            Some(ErrorKind::IsADirectory)
        );
        assert_eq!(
            report.size.unwrap().failure().map(|e| e.kind),
            Some(ErrorKind::IsADirectory)
        );
        assert!(report.identity.unwrap().is_success());
    }

    #[test]
    fn test_from_config_applies_restricted_mode() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        fs::write(&a, b"fips").unwrap();

        let config = AppConfig {
            restricted_mode: RestrictedModeSetting::On,
            ..AppConfig::default()
        };
        let engine = ComparisonEngine::from_config(&config);
        let axes = AxisSelection::default().with(Axis::Hash);
        let report = engine.compare(&a, &a, &axes);

        let hash = report.hash.unwrap();
        let hash = hash.success().unwrap();
        assert!(hash.restricted_mode);
        assert_eq!(hash.left.len(), 1);
        assert!(hash.left.get(HashAlgorithm::Sha1).is_some());
    }

    #[test]
    fn test_ten_megabyte_files_differing_in_last_byte() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.bin");
        let b = temp.path().join("b.bin");

        let mut data: Vec<u8> = (0..10 * 1024 * 1024u32).map(|i| (i % 253) as u8).collect();
        fs::write(&a, &data).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0x01;
        fs::write(&b, &data).unwrap();

        let report = engine().compare(&a, &b, &AxisSelection::all());

        let size = report.size.unwrap();
        let size = size.success().unwrap();
        assert!(size.equal);
        assert_eq!(size.delta, 0);

        let content = report.content.unwrap();
        assert!(!content.success().unwrap().deep.equal);

        let hash = report.hash.unwrap();
        let hash = hash.success().unwrap();
        assert!(!hash.matches);
        assert_eq!(hash.left.len(), 2);
        for (algorithm, digest) in hash.left.iter() {
            assert_ne!(hash.right.get(algorithm), Some(digest));
        }
    }
}
