//! Home directory resolution.

use std::{env, fs, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum HomeDirError {
    #[error("HOME environment variable is not set")]
    HomeMissing,
    #[error("home_dir must be an absolute path (after ~ expansion): {0}")]
    AbsoluteRequired(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Normalize and resolve the server home directory.
///
/// - With `config_home`: `~` expands to the user home; the final path must
///   be absolute.
/// - Without it: `$HOME/<default_subdir>` (`%APPDATA%` on Windows).
///
/// If `create` is true the directory is created when missing.
pub fn resolve_home_dir(
    config_home: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let path = if let Some(raw) = config_home {
        let expanded = if let Some(rest) = raw.strip_prefix("~/") {
            user_home()?.join(rest)
        } else if raw == "~" {
            user_home()?
        } else {
            PathBuf::from(raw.clone())
        };
        if !expanded.is_absolute() {
            return Err(HomeDirError::AbsoluteRequired(raw));
        }
        expanded
    } else {
        user_home()?.join(default_subdir)
    };

    if create && !path.exists() {
        fs::create_dir_all(&path)?;
    }
    Ok(path)
}

fn user_home() -> Result<PathBuf, HomeDirError> {
    #[cfg(target_os = "windows")]
    let var = env::var("APPDATA").or_else(|_| env::var("USERPROFILE"));
    #[cfg(not(target_os = "windows"))]
    let var = env::var("HOME");

    var.map(PathBuf::from).map_err(|_| HomeDirError::HomeMissing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_are_rejected() {
        let err = resolve_home_dir(Some("relative/dir".into()), ".weft", false).unwrap_err();
        assert!(matches!(err, HomeDirError::AbsoluteRequired(_)));
    }

    #[test]
    fn absolute_paths_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("weft-home");
        let resolved =
            resolve_home_dir(Some(raw.to_string_lossy().into_owned()), ".weft", true).unwrap();
        assert_eq!(resolved, raw);
        assert!(resolved.is_dir());
    }
}
