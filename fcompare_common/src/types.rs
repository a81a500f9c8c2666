use crate::error::{ErrorKind, FcompareError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Digest algorithms the hash engine knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Legacy weak digest, only computed outside restricted mode
    Md5,
    /// Approved digest, always computed
    Sha1,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
        }
    }

    /// Upper-case label used in human-readable reports
    pub fn label(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA1",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hex digests of one file, keyed by algorithm.
///
/// In restricted mode only SHA-1 is present; otherwise MD5 and SHA-1 both are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestSet {
    digests: BTreeMap<HashAlgorithm, String>,
    pub restricted_mode: bool,
}

impl DigestSet {
    /// Build a set from `(algorithm, hex digest)` pairs.
    ///
    /// A restricted set keeps only its SHA-1 entry; MD5 digests are dropped.
    pub fn from_digests<I>(restricted_mode: bool, digests: I) -> Self
    where
        I: IntoIterator<Item = (HashAlgorithm, String)>,
    {
        let digests = digests
            .into_iter()
            .filter(|(algorithm, _)| !restricted_mode || *algorithm == HashAlgorithm::Sha1)
            .collect();
        Self {
            digests,
            restricted_mode,
        }
    }

    pub fn get(&self, algorithm: HashAlgorithm) -> Option<&str> {
        self.digests.get(&algorithm).map(String::as_str)
    }

    pub fn algorithms(&self) -> impl Iterator<Item = HashAlgorithm> + '_ {
        self.digests.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HashAlgorithm, &str)> {
        self.digests.iter().map(|(alg, hex)| (*alg, hex.as_str()))
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// True when both sets carry the same algorithms with identical digests
    pub fn matches(&self, other: &DigestSet) -> bool {
        !self.digests.is_empty() && self.digests == other.digests
    }
}

/// Digests of both files of a pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashComparison {
    pub left: DigestSet,
    pub right: DigestSet,
    pub restricted_mode: bool,
    pub matches: bool,
}

/// Byte lengths of both files of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeComparison {
    pub size_a: u64,
    pub size_b: u64,
    pub delta: u64,
    pub equal: bool,
}

impl SizeComparison {
    pub fn new(size_a: u64, size_b: u64) -> Self {
        Self {
            size_a,
            size_b,
            delta: size_a.abs_diff(size_b),
            equal: size_a == size_b,
        }
    }
}

/// How thoroughly two files' contents are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// Size and modification time only; may call differing files equal
    Shallow,
    /// Full byte-for-byte comparison
    Deep,
}

impl fmt::Display for ContentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentMode::Shallow => f.write_str("shallow"),
            ContentMode::Deep => f.write_str("deep"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentVerdict {
    pub mode: ContentMode,
    pub equal: bool,
}

/// Shallow and deep verdicts for one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentReport {
    pub shallow: ContentVerdict,
    pub deep: ContentVerdict,
}

/// Symlink status and filesystem sameness of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityResult {
    pub is_symlink_a: bool,
    pub is_symlink_b: bool,
    pub same_filesystem_entity: bool,
}

/// One independent comparison dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Hash,
    Size,
    Content,
    Identity,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::Hash, Axis::Size, Axis::Content, Axis::Identity];
}

/// Set of requested axes. An empty selection means every axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSelection {
    axes: Vec<Axis>,
}

impl AxisSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with(mut self, axis: Axis) -> Self {
        if !self.axes.contains(&axis) {
            self.axes.push(axis);
        }
        self
    }

    pub fn includes(&self, axis: Axis) -> bool {
        self.axes.is_empty() || self.axes.contains(&axis)
    }

    pub fn is_all(&self) -> bool {
        self.axes.is_empty() || Axis::ALL.iter().all(|axis| self.axes.contains(axis))
    }
}

impl FromIterator<Axis> for AxisSelection {
    fn from_iter<I: IntoIterator<Item = Axis>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), AxisSelection::with)
    }
}

/// Error recorded for an axis that could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<FcompareError> for AxisError {
    fn from(err: FcompareError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for AxisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of a single axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum AxisOutcome<T> {
    Success(T),
    Failure(AxisError),
}

impl<T> AxisOutcome<T> {
    pub fn success(&self) -> Option<&T> {
        match self {
            AxisOutcome::Success(value) => Some(value),
            AxisOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AxisError> {
        match self {
            AxisOutcome::Success(_) => None,
            AxisOutcome::Failure(err) => Some(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AxisOutcome::Success(_))
    }
}

impl<T> From<crate::Result<T>> for AxisOutcome<T> {
    fn from(result: crate::Result<T>) -> Self {
        match result {
            Ok(value) => AxisOutcome::Success(value),
            Err(err) => AxisOutcome::Failure(err.into()),
        }
    }
}

/// Aggregate result of comparing one file pair. Unrequested axes are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub path_a: PathBuf,
    pub path_b: PathBuf,
    pub hash: Option<AxisOutcome<HashComparison>>,
    pub size: Option<AxisOutcome<SizeComparison>>,
    pub content: Option<AxisOutcome<ContentReport>>,
    pub identity: Option<AxisOutcome<IdentityResult>>,
}

/// Whether restricted-mode detection is automatic or overridden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictedModeSetting {
    /// Probe the host platform
    #[default]
    Auto,
    /// Always behave as restricted
    On,
    /// Never behave as restricted
    Off,
}

pub const DEFAULT_DEEP_COMPARE_BUFFER: usize = 8 * 1024;

fn default_deep_compare_buffer() -> usize {
    DEFAULT_DEEP_COMPARE_BUFFER
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Restricted-mode detection policy
    #[serde(default)]
    pub restricted_mode: RestrictedModeSetting,

    /// Axes to run when none are requested explicitly (empty = all)
    #[serde(default)]
    pub default_axes: Vec<Axis>,

    /// Chunk size in bytes for deep content comparison
    #[serde(default = "default_deep_compare_buffer")]
    pub deep_compare_buffer: usize,

    /// Enable portable mode (config alongside binary)
    #[serde(skip)]
    pub portable_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            restricted_mode: RestrictedModeSetting::Auto,
            default_axes: Vec::new(),
            deep_compare_buffer: DEFAULT_DEEP_COMPARE_BUFFER,
            portable_mode: false,
        }
    }
}
