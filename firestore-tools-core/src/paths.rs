//! Default path resolution for configuration files
//!
//! Uses the platform config directory when available, with a fallback.

use std::path::PathBuf;

/// Returns the default path for the CLI configuration file.
///
/// - Linux: `~/.config/firestore-tools/cli.toml`
/// - macOS: `~/Library/Application Support/firestore-tools/cli.toml`
/// - Fallback: `./.firestore-tools/cli.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("firestore-tools"))
        .unwrap_or_else(|| PathBuf::from(".firestore-tools"))
        .join("cli.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path_is_toml() {
        let path = default_config_path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
        assert!(path.ends_with("firestore-tools/cli.toml"));
    }
}
