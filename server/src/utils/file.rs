//! File utility functions

use std::path::PathBuf;

/// Expand a user-supplied path (config file, data directory) to an absolute path.
///
/// `~` and `~/...` resolve against the home directory, relative paths
/// against the current directory. Absolute paths pass through unchanged and
/// components are not canonicalized.
///
/// ```text
/// expand_path("~/.statline")  // -> /home/user/.statline
/// expand_path("statline.json") // -> /current/dir/statline.json
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = match path.strip_prefix('~') {
        Some("") => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => dirs::home_dir()
            .map(|home| home.join(&rest[1..]))
            .unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_absolute_unchanged() {
        assert_eq!(expand_path("/var/lib/statline"), PathBuf::from("/var/lib/statline"));
        assert_eq!(expand_path("  /var/lib/statline  "), PathBuf::from("/var/lib/statline"));
    }

    #[test]
    fn test_expand_path_relative_becomes_absolute() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(expand_path("statline.json"), cwd.join("statline.json"));
        assert_eq!(expand_path("../config"), cwd.join("../config"));
    }

    #[test]
    fn test_expand_path_tilde() {
        let result = expand_path("~/.statline");
        assert!(result.is_absolute());
        assert!(!result.to_string_lossy().contains('~'));
        assert!(result.ends_with(".statline"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
        }
    }

    #[test]
    fn test_expand_path_tilde_in_name_is_literal() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(expand_path("~backup"), cwd.join("~backup"));
    }

    #[test]
    fn test_expand_path_empty_is_current_dir() {
        assert!(expand_path("   ").is_absolute());
    }
}
