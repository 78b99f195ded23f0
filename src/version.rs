//! `v<N>` version folder discovery.
use crate::error::{ResolutionError, Result};
use crate::util::{file_name, list_dirs};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Reverse;
use std::path::{Path, PathBuf};

static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^v(\d+)$").expect("version regex"));

/// Parse `v001`/`V12` into its number. Anything else, including numbers too
/// large for `u64`, is `None`.
pub fn version_number(name: &str) -> Option<u64> {
    let caps = VERSION_RE.captures(name)?;
    caps[1].parse().ok()
}

/// Zero-pad version digits to at least three characters (`1` -> `001`).
pub fn pad_version(digits: &str) -> String {
    format!("{digits:0>3}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDir {
    pub name: String,
    pub path: PathBuf,
    pub number: u64,
}

impl VersionDir {
    /// Digit text after the `v`, padded the way published filenames carry it.
    pub fn padded(&self) -> String {
        pad_version(&self.name[1..])
    }
}

/// Version subdirectories of `dir`, newest first. Equal numbers keep name order.
pub fn list_version_dirs(dir: &Path) -> Result<Vec<VersionDir>> {
    let mut out: Vec<VersionDir> = list_dirs(dir)?
        .into_iter()
        .filter_map(|path| {
            let name = file_name(&path).to_string();
            let number = version_number(&name)?;
            Some(VersionDir { name, path, number })
        })
        .collect();
    out.sort_by_key(|v| Reverse(v.number));
    tracing::debug!(
        dir = %dir.display(),
        versions = out.len(),
        "listed version folders"
    );
    Ok(out)
}

/// Like [`list_version_dirs`] but an empty result is an error.
pub fn require_version_dirs(dir: &Path) -> Result<Vec<VersionDir>> {
    let versions = list_version_dirs(dir)?;
    if versions.is_empty() {
        return Err(ResolutionError::missing_root("No version folders under", dir));
    }
    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_dirs;

    #[test]
    fn version_number_accepts_any_width_and_case() {
        assert_eq!(version_number("v001"), Some(1));
        assert_eq!(version_number("V12"), Some(12));
        assert_eq!(version_number("v0000123"), Some(123));
        assert_eq!(version_number("v7"), Some(7));
    }

    #[test]
    fn version_number_rejects_other_names() {
        for name in [
            "",
            "v",
            "001",
            "v01a",
            "ver001",
            "v-1",
            " v001",
            "v001 ",
            "v99999999999999999999999",
        ] {
            assert_eq!(version_number(name), None, "{name:?}");
        }
    }

    #[test]
    fn padded_keeps_wide_versions() {
        let dir = |name: &str| VersionDir {
            name: name.to_string(),
            path: PathBuf::from(name),
            number: version_number(name).unwrap(),
        };
        assert_eq!(dir("v1").padded(), "001");
        assert_eq!(dir("V12").padded(), "012");
        assert_eq!(dir("v0012").padded(), "0012");
    }

    #[test]
    fn versions_sort_newest_first_and_skip_non_versions() {
        let temp = tempfile::tempdir().expect("tempdir");
        make_dirs(
            temp.path(),
            &["v001", "v002", "v003", "v010", "latest", "v02x"],
        );
        crate::test_support::write_file(&temp.path().join("v999"));

        let names: Vec<String> = list_version_dirs(temp.path())
            .expect("list versions")
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["v010", "v003", "v002", "v001"]);
    }

    #[test]
    fn equal_numbers_keep_name_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        make_dirs(temp.path(), &["v1", "v001", "v2"]);

        let names: Vec<String> = list_version_dirs(temp.path())
            .expect("list versions")
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["v2", "v001", "v1"]);
    }

    #[test]
    fn require_version_dirs_reports_folder() {
        let temp = tempfile::tempdir().expect("tempdir");
        make_dirs(temp.path(), &["published"]);
        let err = require_version_dirs(temp.path()).expect_err("no versions");
        assert!(matches!(err, ResolutionError::MissingRoot { .. }));
        assert!(err.to_string().starts_with("No version folders under:"));
    }
}
