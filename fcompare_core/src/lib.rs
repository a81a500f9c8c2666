pub mod crypto_policy;
pub mod hash_engine;
pub mod size;
pub mod content;
pub mod identity;
pub mod comparison;

pub use crypto_policy::{
    platform_policy, policy_for_setting, CryptoPolicy, ForcedPolicy, LinuxFipsProbe,
    MacosFipsProbe, Unrestricted, WindowsFipsProbe,
};
pub use hash_engine::HashEngine;
pub use size::SizeComparator;
pub use content::ContentComparator;
pub use identity::IdentityInspector;
pub use comparison::ComparisonEngine;
