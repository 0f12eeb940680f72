//! Crate-wide names and limits.

/// Application name, used for environment variable prefixes and log targets.
pub const APP_NAME: &str = "presetci";

/// Preset file looked up at the source root when none is given explicitly.
pub const DEFAULT_PRESET_FILE: &str = "CMakePresets.json";

/// Key of the vendor block read by [`crate::preset::ConfigView`].
pub const DEFAULT_VENDOR_NAMESPACE: &str = "presetci";

/// Prefix of the project cache variables (`<PREFIX>_TESTING`, ...).
pub const DEFAULT_CACHE_PREFIX: &str = "PROJECT";

/// Name of the synthetic entry that is always listed and always resolves.
pub const HELP_PRESET: &str = "help";

/// Longest inheritance chain followed before giving up.
pub const MAX_INHERITANCE_DEPTH: usize = 64;

/// Log target for lines forwarded from external tools.
pub const TOOL_LOG_TARGET: &str = "presetci::tool";
