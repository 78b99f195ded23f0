//! Lens-distortion export lookup.
//!
//! LD scripts live under `<plate>/nuke_lens_distortion/v###/`, sometimes
//! nested in turnover folders. Candidates are scored on naming and the newest
//! version folder holding any candidate wins outright.
use crate::error::{ResolutionError, Result};
use crate::host::Host;
use crate::util::file_name;
use crate::version::list_version_dirs;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Folder under a plate directory holding versioned LD exports.
pub const LD_DIR_NAME: &str = "nuke_lens_distortion";

const EXACT_NAME_SCORE: u8 = 6;
const TURNOVER_DIR_SCORE: u8 = 3;
const PLATE_MENTION_SCORE: u8 = 1;

static LD_TAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)_LD_v(\d+)\.nk$").expect("ld tail regex"));

/// Whether a file name follows the `..._LD_v<digits>.nk` convention.
pub fn is_ld_file_name(name: &str) -> bool {
    LD_TAIL_RE.is_match(name)
}

/// Whether any directory strictly between `version_dir` and `path` has a dot
/// in its name (`.../v003/IMG_1241.JPG/scene.nk`).
pub fn has_dotted_dir(path: &Path, version_dir: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };
    let Ok(rel) = parent.strip_prefix(version_dir) else {
        return false;
    };
    rel.components()
        .any(|component| component.as_os_str().to_string_lossy().contains('.'))
}

/// Scoring rules for one shot and plate.
pub struct LensScorer {
    exact_name: Regex,
    turnover_dir: Regex,
    plate_mention: Regex,
}

impl LensScorer {
    pub fn new(shot: &str, plate: &str) -> Result<Self> {
        let shot = regex::escape(shot);
        let plate = regex::escape(plate);
        Ok(Self {
            exact_name: ci_regex(&format!(r"^{shot}_mm_default_{plate}_LD_v\d+\.nk$"))?,
            turnover_dir: ci_regex(&format!(r"^{plate}_{shot}_turnover-plate_{plate}_.+$"))?,
            plate_mention: ci_regex(&plate)?,
        })
    }

    /// Additive score in `0..=10`.
    pub fn score(&self, path: &Path) -> u8 {
        let name = file_name(path);
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        let mut score = 0;
        if self.exact_name.is_match(name) {
            score += EXACT_NAME_SCORE;
        }
        if self.turnover_dir.is_match(file_name(parent)) {
            score += TURNOVER_DIR_SCORE;
        }
        if self.plate_mention.is_match(&parent.to_string_lossy())
            || self.plate_mention.is_match(name)
        {
            score += PLATE_MENTION_SCORE;
        }
        score
    }
}

fn ci_regex(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|err| ResolutionError::Internal(format!("invalid LD pattern: {err}")))
}

/// The winning LD script for a plate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LensMatch {
    pub path: PathBuf,
    /// Padded version of the folder it was found in.
    pub version: String,
    pub score: u8,
}

/// Find the best LD script under `plate_dir`, or `None` when the plate has no
/// LD folder or no version folder yields a candidate.
///
/// Search stops at the newest version folder holding any candidate, even a
/// zero-score one; older versions are never consulted for a better score.
pub fn find_latest_ld_under(
    plate_dir: &Path,
    shot: &str,
    plate: &str,
    host: &dyn Host,
) -> Result<Option<LensMatch>> {
    let ld_dir = plate_dir.join(LD_DIR_NAME);
    if !ld_dir.is_dir() {
        tracing::debug!(dir = %ld_dir.display(), "no LD folder");
        return Ok(None);
    }
    let scorer = LensScorer::new(shot, plate)?;

    for vdir in list_version_dirs(&ld_dir)? {
        let mut best: Option<(u8, SystemTime, PathBuf)> = None;
        for entry in WalkDir::new(&vdir.path)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            // Published scripts are often symlinks; follow them.
            if !path.is_file() {
                continue;
            }
            let name = file_name(path);
            if !name.ends_with(".nk") || !is_ld_file_name(name) {
                continue;
            }
            if has_dotted_dir(path, &vdir.path) {
                tracing::debug!(file = %path.display(), "skipping LD under dotted folder");
                continue;
            }
            let score = scorer.score(path);
            let modified = host.modified(path).map_err(ResolutionError::io(path))?;
            let better = match &best {
                None => true,
                Some((best_score, best_time, _)) => (score, modified) > (*best_score, *best_time),
            };
            if better {
                best = Some((score, modified, path.to_path_buf()));
            }
        }
        if let Some((score, _, path)) = best {
            tracing::info!(
                file = %path.display(),
                version = %vdir.name,
                score,
                "selected LD script"
            );
            return Ok(Some(LensMatch {
                path,
                version: vdir.padded(),
                score,
            }));
        }
    }
    Ok(None)
}

#[cfg(test)]
#[path = "lens_tests.rs"]
mod tests;
