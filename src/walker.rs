use std::path::{Path, PathBuf};

use crate::config::MendConfig;
use crate::specifier::SOURCE_EXTENSIONS;

/// Walk a project directory and collect the source files that participate in
/// import rewriting.
///
/// Respects `.gitignore` rules, always excludes `node_modules`, and applies
/// any additional exclusions from `config.exclude`. The result is sorted so
/// rewrite passes visit files in a deterministic order.
pub fn walk_project(root: &Path, config: &MendConfig) -> anyhow::Result<Vec<PathBuf>> {
    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(true)
        // Read .gitignore files even when the directory is not inside a git repository.
        // This ensures exclusions work for standalone directories and testing scenarios.
        .require_git(false)
        .build();

    let mut files = Vec::new();

    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry during walk");
                continue;
            }
        };

        let path = entry.path();

        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }

        // Check that no component of the path is `node_modules` — hard exclusion.
        if path_contains_node_modules(path) {
            continue;
        }

        // Apply additional config exclusions.
        if is_excluded_by_config(path, config) {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !SOURCE_EXTENSIONS.contains(&ext) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Returns true if any component of `path` is named `node_modules`.
fn path_contains_node_modules(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .map(|s| s == "node_modules")
            .unwrap_or(false)
    })
}

/// Returns true if `path` matches any exclusion pattern from config.
pub(crate) fn is_excluded_by_config(path: &Path, config: &MendConfig) -> bool {
    let patterns = match &config.exclude {
        Some(p) => p,
        None => return false,
    };

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        if let Ok(matched) = glob::Pattern::new(pattern)
            && matched.matches(&path_str)
        {
            return true;
        }
        // Also check if any component matches the pattern directly.
        for component in path.components() {
            if let Some(s) = component.as_os_str().to_str()
                && let Ok(matched) = glob::Pattern::new(pattern)
                && matched.matches(s)
            {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn test_walk_collects_source_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/b.ts"));
        touch(&dir.path().join("src/a.tsx"));
        touch(&dir.path().join("src/widgets/c.js"));
        touch(&dir.path().join("README.md"));

        let files = walk_project(dir.path(), &MendConfig::default()).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("src/a.tsx"),
                dir.path().join("src/b.ts"),
                dir.path().join("src/widgets/c.js"),
            ]
        );
    }

    #[test]
    fn test_walk_excludes_node_modules() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/a.ts"));
        touch(&dir.path().join("node_modules/react/index.js"));

        let files = walk_project(dir.path(), &MendConfig::default()).unwrap();
        assert_eq!(files, vec![dir.path().join("src/a.ts")]);
    }

    #[test]
    fn test_walk_respects_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/a.ts"));
        touch(&dir.path().join("dist/a.js"));
        std::fs::write(dir.path().join(".gitignore"), "dist/\n").unwrap();

        let files = walk_project(dir.path(), &MendConfig::default()).unwrap();
        assert_eq!(files, vec![dir.path().join("src/a.ts")]);
    }

    #[test]
    fn test_walk_applies_config_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/a.ts"));
        touch(&dir.path().join("src/api.generated.ts"));

        let config = MendConfig {
            exclude: Some(vec!["*.generated.ts".to_owned()]),
            ..Default::default()
        };
        let files = walk_project(dir.path(), &config).unwrap();
        assert_eq!(files, vec![dir.path().join("src/a.ts")]);
    }

    #[test]
    fn test_is_excluded_matches_directory_component() {
        let config = MendConfig {
            exclude: Some(vec!["generated".to_owned()]),
            ..Default::default()
        };
        assert!(is_excluded_by_config(
            Path::new("/p/src/generated/api.ts"),
            &config
        ));
        assert!(!is_excluded_by_config(Path::new("/p/src/api.ts"), &config));
    }
}
