//! Locating the `.changes` file a successful build leaves in its result
//! directory.
//!
//! pbuilder names it `<source>_<version>_<arch>.changes`, where version has
//! its epoch stripped. Source and version come from the `.dsc` when it can
//! be read; otherwise the locator's file stem is used, which for a standard
//! `<source>_<version>.dsc` name gives the same prefix.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BuilderError, Result};

/// Filename prefix (before `_<arch>.changes`) expected for `source_package`.
pub fn changes_stem(source_package: &Path) -> Option<String> {
    if let Some((source, version)) = read_dsc_identity(source_package) {
        return Some(format!("{source}_{}", strip_epoch(&version)));
    }
    let name = source_package.file_name()?.to_str()?;
    let stem = name.strip_suffix(".dsc").unwrap_or(name);
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Finds the changes file for `source_package` inside `result_dir`.
///
/// Candidates start with `<stem>_` and end with `changes`. With `arch` set,
/// `<stem>_<arch>.changes` wins; otherwise the first candidate by name.
pub fn find_changes_file(
    source_package: &Path,
    result_dir: &Path,
    arch: Option<&str>,
) -> Result<PathBuf> {
    let not_found = || BuilderError::ChangesNotFound {
        source_package: source_package.to_path_buf(),
        result_dir: result_dir.to_path_buf(),
    };

    let stem = changes_stem(source_package).ok_or_else(not_found)?;

    if let Some(arch) = arch {
        let exact = result_dir.join(format!("{stem}_{arch}.changes"));
        if exact.is_file() {
            return Ok(exact);
        }
    }

    let prefix = format!("{stem}_");
    let entries = match fs::read_dir(result_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(BuilderError::infra(result_dir, e)),
    };
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with(&prefix) && name.ends_with("changes"))
                .unwrap_or(false)
        })
        .map(|entry| entry.path())
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(not_found)
}

fn read_dsc_identity(path: &Path) -> Option<(String, String)> {
    let contents = fs::read_to_string(path).ok()?;
    let mut source = None;
    let mut version = None;
    for line in contents.lines() {
        if let Some(value) = line.strip_prefix("Source:") {
            source.get_or_insert_with(|| value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Version:") {
            version.get_or_insert_with(|| value.trim().to_string());
        }
    }
    match (source, version) {
        (Some(s), Some(v)) if !s.is_empty() && !v.is_empty() => Some((s, v)),
        _ => None,
    }
}

fn strip_epoch(version: &str) -> &str {
    version.split_once(':').map_or(version, |(_, rest)| rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NGINX_DSC: &str = "-----BEGIN PGP SIGNED MESSAGE-----\n\
Hash: SHA1\n\
\n\
Format: 1.0\n\
Source: nginx\n\
Binary: nginx, nginx-dbg\n\
Version: 1:0.7.65-1ubuntu2\n\
Maintainer: Ubuntu Developers\n";

    #[test]
    fn stem_from_dsc_contents_strips_epoch() {
        let temp = TempDir::new().unwrap();
        let dsc = temp.path().join("whatever.dsc");
        fs::write(&dsc, NGINX_DSC).unwrap();

        assert_eq!(changes_stem(&dsc).as_deref(), Some("nginx_0.7.65-1ubuntu2"));
    }

    #[test]
    fn stem_falls_back_to_file_name() {
        assert_eq!(
            changes_stem(Path::new("/missing/nginx_0.7.65-1ubuntu2.dsc")).as_deref(),
            Some("nginx_0.7.65-1ubuntu2")
        );
        assert_eq!(changes_stem(Path::new("/src/pkg.dsc")).as_deref(), Some("pkg"));
    }

    #[test]
    fn prefers_architecture_specific_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("pkg_1.0_amd64.changes"), "").unwrap();
        fs::write(temp.path().join("pkg_1.0_i386.changes"), "").unwrap();

        let found =
            find_changes_file(Path::new("/src/pkg_1.0.dsc"), temp.path(), Some("i386")).unwrap();
        assert_eq!(found, temp.path().join("pkg_1.0_i386.changes"));

        let found = find_changes_file(Path::new("/src/pkg_1.0.dsc"), temp.path(), None).unwrap();
        assert_eq!(found, temp.path().join("pkg_1.0_amd64.changes"));
    }

    #[test]
    fn ignores_unrelated_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("pkg_1.0_amd64.deb"), "").unwrap();
        fs::write(temp.path().join("pkgother_1.0_amd64.changes"), "").unwrap();

        let err = find_changes_file(Path::new("/src/pkg.dsc"), temp.path(), None).unwrap_err();
        assert!(matches!(err, BuilderError::ChangesNotFound { .. }));
    }
}
