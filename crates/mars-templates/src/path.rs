//! Cross-platform validation for template names
//!
//! Template names arriving through `@template(...)` or name-based rendering
//! are joined onto the theme's templates root. A hostile or mistyped name
//! must not be able to address files outside that root, so names are checked
//! structurally before any path join happens.
//!
//! `Path::is_absolute()` alone is not enough for this: on Windows `/etc` is
//! *rooted* but not absolute, so an absolute-only check passes on Unix CI and
//! silently misses on Windows. Component-based analysis behaves the same on
//! both platforms.

use anyhow::{bail, Result};
use std::path::{Component, Path};

/// Check if a path is absolute OR rooted (cross-platform)
///
/// - Unix: `/etc` → absolute
/// - Windows: `/etc` → rooted (not absolute), `C:\etc` → absolute
///
/// All three must be rejected when validating a template name.
pub fn has_absolute_or_rooted_component(path: &Path) -> bool {
    if path.is_absolute() {
        return true;
    }

    path.components()
        .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
}

/// Check that a template name is a safe relative path
///
/// Accepts one or more `Normal` components (`header`, `users/profile`).
/// Rejects:
/// 1. Absolute or rooted paths
/// 2. Parent directory traversal (`..`)
/// 3. Current directory components (`.`)
/// 4. Empty names
pub fn ensure_safe_template_name(path: &Path) -> Result<()> {
    if has_absolute_or_rooted_component(path) {
        bail!("name cannot be absolute or rooted: '{}'", path.display());
    }

    let mut normal_count = 0;

    for component in path.components() {
        match component {
            Component::Normal(_) => normal_count += 1,
            Component::Prefix(_) => {
                bail!("name cannot contain a drive prefix: '{}'", path.display())
            }
            Component::RootDir => {
                bail!("name cannot be absolute or rooted: '{}'", path.display())
            }
            Component::CurDir => {
                bail!(
                    "name cannot contain a current-directory component (.): '{}'",
                    path.display()
                )
            }
            Component::ParentDir => {
                bail!(
                    "name cannot contain parent-directory traversal (..): '{}'",
                    path.display()
                )
            }
        }
    }

    if normal_count == 0 {
        bail!("name is empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_absolute_detected() {
        assert!(has_absolute_or_rooted_component(Path::new("/etc")));
    }

    #[test]
    fn test_rooted_detected_on_all_platforms() {
        // /etc has a RootDir component on both Unix and Windows
        let components: Vec<Component> = Path::new("/etc").components().collect();
        assert!(matches!(components.first(), Some(Component::RootDir)));
        assert!(has_absolute_or_rooted_component(Path::new("/etc")));
    }

    #[test]
    fn test_relative_not_detected() {
        assert!(!has_absolute_or_rooted_component(Path::new("users/profile")));
        assert!(!has_absolute_or_rooted_component(Path::new("header")));
    }

    #[test]
    fn test_valid_single_component() {
        assert!(ensure_safe_template_name(Path::new("header")).is_ok());
    }

    #[test]
    fn test_valid_nested_name() {
        assert!(ensure_safe_template_name(Path::new("users/profile")).is_ok());
    }

    #[test]
    fn test_absolute_rejected() {
        let err = ensure_safe_template_name(Path::new("/etc/passwd")).unwrap_err();
        assert!(err.to_string().contains("absolute or rooted"));
    }

    #[test]
    fn test_parent_traversal_rejected() {
        let err = ensure_safe_template_name(Path::new("../secrets")).unwrap_err();
        assert!(err.to_string().contains("parent-directory"));
    }

    #[test]
    fn test_inner_parent_traversal_rejected() {
        let err = ensure_safe_template_name(Path::new("users/../../etc")).unwrap_err();
        assert!(err.to_string().contains("parent-directory"));
    }

    #[test]
    fn test_current_dir_rejected() {
        let err = ensure_safe_template_name(Path::new("./header")).unwrap_err();
        assert!(err.to_string().contains("current-directory"));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(ensure_safe_template_name(Path::new("")).is_err());
    }

    #[test]
    fn test_dangerous_name_matrix() {
        let cases = vec![
            ("/etc", false, "Unix absolute / Windows rooted"),
            ("/etc/passwd", false, "absolute nested"),
            ("../up", false, "parent traversal"),
            ("a/../b", false, "inner parent traversal"),
            ("./here", false, "current dir"),
            ("", false, "empty"),
            ("header", true, "single component"),
            ("users/profile", true, "nested relative"),
            ("mail/welcome", true, "nested relative"),
        ];

        for (name, expect_ok, description) in cases {
            let result = ensure_safe_template_name(Path::new(name));
            assert_eq!(
                result.is_ok(),
                expect_ok,
                "name '{}' ({}): expected ok={}, got={:?}",
                name,
                description,
                expect_ok,
                result
            );
        }
    }
}
