use std::fmt;

/// Host operating system families presetci knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
    }
  }

  /// The value CMake reports as `CMAKE_HOST_SYSTEM_NAME` on this OS.
  pub fn host_system_name(&self) -> &'static str {
    match self {
      Self::Linux => "Linux",
      Self::MacOs => "Darwin",
      Self::Windows => "Windows",
    }
  }

  /// Package archive format used when a preset does not choose one.
  pub fn default_archive_format(&self) -> &'static str {
    match self {
      Self::Windows => "zip",
      Self::Linux | Self::MacOs => "tar.gz",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Archive format for the host, `tar.gz` on anything that is not Windows.
pub fn default_archive_format() -> &'static str {
  Os::current().unwrap_or(Os::Linux).default_archive_format()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn current_returns_supported_os() {
    assert!(Os::current().is_some(), "Current OS should be supported");
  }

  #[test]
  fn macos_uses_darwin_identifier() {
    assert_eq!(Os::MacOs.as_str(), "darwin");
    assert_eq!(Os::MacOs.host_system_name(), "Darwin");
  }

  #[test]
  fn archive_format_follows_os_family() {
    assert_eq!(Os::Windows.default_archive_format(), "zip");
    assert_eq!(Os::Linux.default_archive_format(), "tar.gz");
    assert_eq!(Os::MacOs.default_archive_format(), "tar.gz");
  }

  #[cfg(unix)]
  #[test]
  fn host_default_on_unix_is_tarball() {
    assert_eq!(default_archive_format(), "tar.gz");
  }
}
