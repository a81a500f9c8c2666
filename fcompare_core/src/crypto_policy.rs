//! Restricted-cryptography (FIPS) detection.
//!
//! Each platform family gets its own probe behind the [`CryptoPolicy`] trait.
//! [`platform_policy`] picks the probe for the running OS once; callers never
//! branch on the platform themselves. Probes are best effort: any failure to
//! read the platform signal means "not restricted".

use fcompare_common::{HashAlgorithm, RestrictedModeSetting};
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

const UNRESTRICTED_ALGORITHMS: &[HashAlgorithm] = &[HashAlgorithm::Md5, HashAlgorithm::Sha1];
const RESTRICTED_ALGORITHMS: &[HashAlgorithm] = &[HashAlgorithm::Sha1];

pub const LINUX_FIPS_FLAG: &str = "/proc/sys/crypto/fips_enabled";
pub const MACOS_SSH_CONFIG_DIR: &str = "/private/etc/ssh/ssh_config.d";
pub const MACOS_FIPS_MARKER: &str = "fips_ssh_config";
pub const WINDOWS_FIPS_KEY: &str =
    r"HKLM\SYSTEM\CurrentControlSet\Control\Lsa\FipsAlgorithmPolicy";
pub const WINDOWS_FIPS_VALUE: &str = "Enabled";

/// Decides whether only approved hash algorithms may be used
pub trait CryptoPolicy: Send + Sync {
    fn is_restricted(&self) -> bool;

    fn permitted_algorithms(&self) -> &'static [HashAlgorithm] {
        algorithms_for(self.is_restricted())
    }
}

/// Algorithms permitted under a given restricted-mode decision.
pub fn algorithms_for(restricted: bool) -> &'static [HashAlgorithm] {
    if restricted {
        RESTRICTED_ALGORITHMS
    } else {
        UNRESTRICTED_ALGORITHMS
    }
}

/// Kernel crypto flag file, restricted when it reads `1`
#[derive(Debug, Clone)]
pub struct LinuxFipsProbe {
    flag_path: PathBuf,
}

impl LinuxFipsProbe {
    pub fn new() -> Self {
        Self::with_flag_path(LINUX_FIPS_FLAG)
    }

    pub fn with_flag_path(flag_path: impl Into<PathBuf>) -> Self {
        Self {
            flag_path: flag_path.into(),
        }
    }
}

impl Default for LinuxFipsProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoPolicy for LinuxFipsProbe {
    fn is_restricted(&self) -> bool {
        match fs::read_to_string(&self.flag_path) {
            Ok(content) => content.trim() == "1",
            Err(e) => {
                debug!("FIPS flag {:?} unreadable: {}", self.flag_path, e);
                false
            }
        }
    }
}

/// SSH configuration drop-in directory containing a FIPS marker file
#[derive(Debug, Clone)]
pub struct MacosFipsProbe {
    config_dir: PathBuf,
    marker: String,
}

impl MacosFipsProbe {
    pub fn new() -> Self {
        Self::with_config_dir(MACOS_SSH_CONFIG_DIR, MACOS_FIPS_MARKER)
    }

    pub fn with_config_dir(config_dir: impl Into<PathBuf>, marker: impl Into<String>) -> Self {
        Self {
            config_dir: config_dir.into(),
            marker: marker.into(),
        }
    }
}

impl Default for MacosFipsProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoPolicy for MacosFipsProbe {
    fn is_restricted(&self) -> bool {
        let entries = match fs::read_dir(&self.config_dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot enumerate {:?}: {}", self.config_dir, e);
                return false;
            }
        };

        entries.filter_map(|entry| entry.ok()).any(|entry| {
            if entry.file_name().to_string_lossy().contains(&self.marker) {
                return true;
            }
            // Unreadable or non-UTF-8 files simply don't match
            fs::read_to_string(entry.path())
                .map(|content| content.contains(&self.marker))
                .unwrap_or(false)
        })
    }
}

/// `FipsAlgorithmPolicy\Enabled` registry value, queried with `reg.exe`
#[derive(Debug, Clone, Default)]
pub struct WindowsFipsProbe;

impl WindowsFipsProbe {
    pub fn new() -> Self {
        Self
    }
}

impl CryptoPolicy for WindowsFipsProbe {
    fn is_restricted(&self) -> bool {
        let output = Command::new("reg")
            .args(["query", WINDOWS_FIPS_KEY, "/v", WINDOWS_FIPS_VALUE])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                parse_reg_query_value(&String::from_utf8_lossy(&output.stdout), WINDOWS_FIPS_VALUE)
            }
            Ok(output) => {
                debug!("reg query exited with {}", output.status);
                false
            }
            Err(e) => {
                debug!("reg query unavailable: {}", e);
                false
            }
        }
    }
}

/// Interpret `reg query` output such as `    Enabled    REG_DWORD    0x1`.
fn parse_reg_query_value(output: &str, value_name: &str) -> bool {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            if !name.eq_ignore_ascii_case(value_name) {
                return None;
            }
            let _value_type = fields.next()?;
            fields.next().map(str::to_string)
        })
        .any(|data| {
            let digits = data
                .strip_prefix("0x")
                .or_else(|| data.strip_prefix("0X"));
            match digits {
                Some(hex) => u64::from_str_radix(hex, 16).map_or(false, |v| v != 0),
                None => data.parse::<u64>().map_or(!data.is_empty(), |v| v != 0),
            }
        })
}

/// Platforms without a known restricted-mode signal
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl CryptoPolicy for Unrestricted {
    fn is_restricted(&self) -> bool {
        false
    }
}

/// Fixed answer, bypassing any probing
#[derive(Debug, Clone, Copy)]
pub struct ForcedPolicy(pub bool);

impl CryptoPolicy for ForcedPolicy {
    fn is_restricted(&self) -> bool {
        self.0
    }
}

/// The probe for the platform this binary was built for.
pub fn platform_policy() -> Box<dyn CryptoPolicy> {
    #[cfg(target_os = "linux")]
    return Box::new(LinuxFipsProbe::new());

    #[cfg(target_os = "macos")]
    return Box::new(MacosFipsProbe::new());

    #[cfg(windows)]
    return Box::new(WindowsFipsProbe::new());

    #[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
    return Box::new(Unrestricted);
}

/// Resolve a configured setting into a policy.
pub fn policy_for_setting(setting: RestrictedModeSetting) -> Box<dyn CryptoPolicy> {
    match setting {
        RestrictedModeSetting::Auto => platform_policy(),
        RestrictedModeSetting::On => Box::new(ForcedPolicy(true)),
        RestrictedModeSetting::Off => Box::new(ForcedPolicy(false)),
    }
}
