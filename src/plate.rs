//! Plate id detection and preference ordering.
//!
//! A plate id is two letters and two digits (`FG01`, `BG02`). Ids are
//! compared in their uppercase canonical form.
use crate::error::{ResolutionError, Result};
use crate::host::Host;
use crate::util::{file_name, list_dirs};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]{2})(\d{1,2})$").expect("token regex"));
static PLATE_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([A-Z]{2}\d{2})\b").expect("plate word regex"));
static PLATE_DIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Z]{2}\d{2}$").expect("plate dir regex"));
static READ_DIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/plate/(?:input_plate|output_plate)/([A-Za-z]{2}\d{2})/")
        .expect("read dir regex")
});
static READ_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)_plate_([A-Za-z]{2}\d{2})_").expect("read name regex"));
static NON_ALNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("separator regex"));

/// `fg1` -> `FG01`, `bc02` -> `BC02`; anything else is `None`.
pub fn normalize_plate_token(token: &str) -> Option<String> {
    let caps = TOKEN_RE.captures(token)?;
    let number: u32 = caps[2].parse().ok()?;
    Some(format!("{}{number:02}", caps[1].to_uppercase()))
}

/// Whether a directory name is exactly a plate id.
pub fn is_plate_dir_name(name: &str) -> bool {
    PLATE_DIR_RE.is_match(name)
}

/// First plate id found in Read-node source paths, either as the
/// `/plate/{input,output}_plate/<ID>/` directory or as `_plate_<ID>_` in the
/// file name.
pub fn detect_from_reads(paths: &[String]) -> Option<String> {
    paths.iter().find_map(|path| {
        if let Some(caps) = READ_DIR_RE.captures(path) {
            return Some(caps[1].to_uppercase());
        }
        let name = Path::new(path).file_name()?.to_str()?;
        READ_NAME_RE
            .captures(name)
            .map(|caps| caps[1].to_uppercase())
    })
}

/// First word-bounded plate id in the script's path segments.
pub fn detect_from_script_path(path: &Path) -> Option<String> {
    path.components().find_map(|component| {
        let segment = component.as_os_str().to_string_lossy().to_lowercase();
        PLATE_WORD_RE
            .captures(&segment)
            .map(|caps| caps[1].to_uppercase())
    })
}

/// Plate ids named by the script: file-stem tokens first, then whole path
/// segments, normalized and de-duplicated.
///
/// `DM_066_3580_mm-default_FG01_scene_v001.nk` yields `FG01`, and a
/// `.../scene/fg1/...` segment yields `FG01`.
pub fn candidates_from_script_path(path: &Path) -> Vec<String> {
    let mut prefs = PlatePreferences::default();
    if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
        for token in NON_ALNUM_RE.split(stem) {
            prefs.push(normalize_plate_token(token));
        }
    }
    for component in path.components() {
        let segment = component.as_os_str().to_string_lossy();
        prefs.push(normalize_plate_token(&segment));
    }
    prefs.into_vec()
}

/// A plate folder on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateDir {
    pub path: PathBuf,
    /// Uppercase form of the folder name.
    pub token: String,
}

/// Subdirectories of `root` named exactly like a plate id, sorted by name.
/// A missing root has no plates.
pub fn collect_plate_dirs(root: &Path) -> Result<Vec<PlateDir>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    Ok(list_dirs(root)?
        .into_iter()
        .filter(|path| is_plate_dir_name(file_name(path)))
        .map(|path| PlateDir {
            token: file_name(&path).to_uppercase(),
            path,
        })
        .collect())
}

/// Ordered plate ids, first source wins, duplicates dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatePreferences {
    tokens: Vec<String>,
}

impl PlatePreferences {
    /// Add a token if present and unseen. Returns whether it was added.
    pub fn push(&mut self, token: Option<String>) -> bool {
        match token {
            Some(token) if !self.tokens.contains(&token) => {
                self.tokens.push(token);
                true
            }
            _ => false,
        }
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, tokens: I) {
        for token in tokens {
            self.push(Some(token));
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn first(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.tokens
    }
}

/// Preferences gathered from the host: Read nodes first, then the script path.
pub fn preferences_from_host(host: &dyn Host) -> PlatePreferences {
    let mut prefs = PlatePreferences::default();
    prefs.push(detect_from_reads(&crate::host::read_source_paths(host)));
    if let Some(script) = host.script_path() {
        prefs.push(detect_from_script_path(&script));
    }
    prefs
}

/// Narrow `dirs` to one folder chosen by the operator when more than one is
/// available. Cancelling aborts the resolution.
pub fn choose_plate_dir(host: &dyn Host, root: &Path, dirs: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if dirs.len() <= 1 {
        return Ok(dirs);
    }
    let choices: Vec<String> = dirs.iter().map(|dir| file_name(dir).to_string()).collect();
    tracing::info!(choices = %choices.join(", "), "multiple plates found");
    let Some(selected) = host.choose("Select Plate", &choices) else {
        return Err(ResolutionError::Cancelled("Plate selection cancelled by user.".to_string()));
    };
    tracing::info!(plate = %selected, "plate selected");
    let picked: Vec<PathBuf> = dirs
        .into_iter()
        .filter(|dir| file_name(dir) == selected)
        .collect();
    if picked.is_empty() {
        return Err(ResolutionError::no_match(
            format!("Selected plate '{selected}' not found under"),
            root,
        ));
    }
    Ok(picked)
}

#[cfg(test)]
#[path = "plate_tests.rs"]
mod tests;
