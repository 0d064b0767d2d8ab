//! Source file discovery.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::errors::DiscoveryError;

/// Recursively collect files under `root` whose extension is one of
/// `extensions`, in lexicographic path order.
///
/// Hidden entries are skipped and directories named in `exclude` are pruned.
/// Symlinks to regular files are kept under their link path; symlinked
/// directories are not descended into. Anything else that is not a regular
/// file (directories, sockets, dangling links) is ignored even when its name
/// matches. Entries below the root that cannot be read are logged and skipped.
pub fn discover(
    root: &Path,
    extensions: &[String],
    exclude: &[String],
) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !root.exists() {
        return Err(DiscoveryError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_pruned(e, exclude));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(DiscoveryError::Walk {
                    path: root.to_path_buf(),
                    source,
                })
            }
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                tracing::warn!(%path, error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if is_file(&entry) && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    tracing::debug!(root = %root.display(), count = files.len(), "discovered files");
    Ok(files)
}

fn is_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

fn is_pruned(entry: &DirEntry, exclude: &[String]) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && exclude.iter().any(|x| x.as_str() == name)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x.trim_start_matches('.') == ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        ["js", "jsx", "ts", "tsx"].map(String::from).to_vec()
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "const x = 1;\n").unwrap();
    }

    #[test]
    fn test_recursive_sorted() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/z.ts");
        touch(dir.path(), "b.js");
        touch(dir.path(), "src/nested/a.tsx");
        touch(dir.path(), "a.jsx");

        let files = discover(dir.path(), &exts(), &[]).unwrap();
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["a.jsx", "b.js", "src/nested/a.tsx", "src/z.ts"]);
    }

    #[test]
    fn test_unsupported_extensions_yield_nothing() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "readme.md");
        touch(dir.path(), "lib/main.rs");
        touch(dir.path(), "style.css");

        assert!(discover(dir.path(), &exts(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(discover(dir.path(), &exts(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_directory_named_like_source_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("weird.js")).unwrap();
        touch(dir.path(), "real.js");

        let files = discover(dir.path(), &exts(), &[]).unwrap();
        assert_eq!(files, vec![dir.path().join("real.js")]);
    }

    #[test]
    fn test_hidden_and_excluded_are_pruned() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), ".cache/a.js");
        touch(dir.path(), "node_modules/pkg/index.js");
        touch(dir.path(), "src/.eslintrc.js");
        touch(dir.path(), "src/index.js");

        let exclude = vec!["node_modules".to_string()];
        let files = discover(dir.path(), &exts(), &exclude).unwrap();
        assert_eq!(files, vec![dir.path().join("src/index.js")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_is_kept_but_linked_dir_is_not_walked() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        touch(outside.path(), "lib/shared.js");
        touch(dir.path(), "src/index.js");
        symlink(outside.path().join("lib/shared.js"), dir.path().join("src/shared.js")).unwrap();
        symlink(outside.path().join("lib"), dir.path().join("vendor")).unwrap();
        symlink(dir.path().join("missing.js"), dir.path().join("dangling.js")).unwrap();

        let files = discover(dir.path(), &exts(), &[]).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("src/index.js"), dir.path().join("src/shared.js")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        // Permission bits do not stop root.
        if unsafe { libc::geteuid() } == 0 {
            return;
        }

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "dist/bundle.js");
        touch(dir.path(), "src/index.js");
        let locked = dir.path().join("dist");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let files = discover(dir.path(), &exts(), &[]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(files.unwrap(), vec![dir.path().join("src/index.js")]);
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = discover(&dir.path().join("nope"), &exts(), &[]).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotFound(_)));
    }

    #[test]
    fn test_root_is_file() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.js");
        let err = discover(&dir.path().join("a.js"), &exts(), &[]).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotADirectory(_)));
    }
}
