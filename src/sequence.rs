//! Image sequence and movie discovery inside a single directory.
//!
//! A scan matches file names against one naming rule, groups the matches into
//! candidate sequences, and keeps the group with the most frames (newest file
//! time breaks ties). Directories are never descended into.
use crate::error::{ResolutionError, Result};
use crate::host::Host;
use crate::util::{file_name, list_files};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Frame and extension tail shared by every sequence rule.
const FRAME_TAIL: &str = r"\.(\d+)\.([A-Za-z0-9]+)$";
/// Plate id pattern used when any plate is acceptable.
const ANY_PLATE: &str = "[A-Za-z0-9]+";

static RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)x(\d+)$").expect("resolution regex"));

/// File naming convention for one kind of published sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceRule {
    /// `<base>.<frame>.<ext>`, case-insensitive.
    Playblast { base: String },
    /// `<shot>_turnover-plate_<PLATE>_<any>_v<version>.<frame>.<ext>`.
    /// `plate: None` accepts any plate id.
    Plate {
        shot: String,
        plate: Option<String>,
        version: String,
    },
    /// `<shot>_scene_<any>_v<version>.<frame>.<ext>`, case-insensitive.
    Geo { shot: String, version: String },
}

impl SequenceRule {
    pub fn playblast(base: &str) -> Self {
        Self::Playblast {
            base: base.to_string(),
        }
    }

    pub fn plate(shot: &str, plate: Option<&str>, version: &str) -> Self {
        Self::Plate {
            shot: shot.to_string(),
            plate: plate.map(str::to_string),
            version: version.to_string(),
        }
    }

    pub fn geo(shot: &str, version: &str) -> Self {
        Self::Geo {
            shot: shot.to_string(),
            version: version.to_string(),
        }
    }

    fn pattern(&self) -> (String, bool) {
        match self {
            Self::Playblast { base } => (format!("^{}{FRAME_TAIL}", regex::escape(base)), true),
            Self::Plate {
                shot,
                plate,
                version,
            } => {
                let plate = plate
                    .as_deref()
                    .map(regex::escape)
                    .unwrap_or_else(|| ANY_PLATE.to_string());
                (
                    format!(
                        "^{}_turnover-plate_{plate}_.+?_v{}{FRAME_TAIL}",
                        regex::escape(shot),
                        regex::escape(version)
                    ),
                    false,
                )
            }
            Self::Geo { shot, version } => (
                format!(
                    "^{}_scene_.+?_v{}{FRAME_TAIL}",
                    regex::escape(shot),
                    regex::escape(version)
                ),
                true,
            ),
        }
    }

    fn compile(&self) -> Result<Regex> {
        let (pattern, case_insensitive) = self.pattern();
        RegexBuilder::new(&pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|err| ResolutionError::Internal(format!("invalid sequence pattern: {err}")))
    }
}

/// A discovered image sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDescriptor {
    /// Directory plus base name, without frame or extension.
    pub prefix: PathBuf,
    /// Extension as spelled by the lowest frame's file.
    pub ext: String,
    pub first: u64,
    pub last: u64,
    /// Widest frame digit string observed.
    pub padding: usize,
    /// Member files ordered by frame.
    pub files: Vec<PathBuf>,
}

impl SequenceDescriptor {
    /// `<prefix>.####.<ext>` with one `#` per padded digit.
    pub fn hash_pattern(&self) -> String {
        format!(
            "{}.{}.{}",
            self.prefix.display(),
            "#".repeat(self.padding),
            self.ext
        )
    }

    /// Path of the lowest frame, zero-padded to the sequence padding.
    pub fn first_frame_path(&self) -> String {
        format!(
            "{}.{:0width$}.{}",
            self.prefix.display(),
            self.first,
            self.ext,
            width = self.padding
        )
    }
}

// Carries the derived Read paths alongside the raw fields.
impl Serialize for SequenceDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SequenceDescriptor", 8)?;
        state.serialize_field("prefix", &self.prefix)?;
        state.serialize_field("ext", &self.ext)?;
        state.serialize_field("first", &self.first)?;
        state.serialize_field("last", &self.last)?;
        state.serialize_field("padding", &self.padding)?;
        state.serialize_field("hash_pattern", &self.hash_pattern())?;
        state.serialize_field("first_frame_path", &self.first_frame_path())?;
        state.serialize_field("files", &self.files)?;
        state.end()
    }
}

/// What a playblast version folder resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Media {
    Sequence(SequenceDescriptor),
    Movie { path: PathBuf },
}

/// Width and height parsed from a `<W>x<H>` folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

struct FrameFile {
    path: PathBuf,
    frame: u64,
    digits: usize,
    ext: String,
}

struct Group {
    key: (String, String),
    members: Vec<FrameFile>,
}

/// Scan `dir` for files following `rule` and return the best sequence.
///
/// Returns `Ok(None)` when the directory is missing or nothing matches.
pub fn scan_sequence(
    dir: &Path,
    rule: &SequenceRule,
    host: &dyn Host,
) -> Result<Option<SequenceDescriptor>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let regex = rule.compile()?;
    let mut groups: Vec<Group> = Vec::new();

    for path in list_files(dir)? {
        let name = file_name(&path);
        let Some(caps) = regex.captures(name) else {
            continue;
        };
        let (Some(frame_match), Some(ext_match)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Ok(frame) = frame_match.as_str().parse::<u64>() else {
            tracing::debug!(file = %path.display(), "frame number out of range");
            continue;
        };
        let digits = frame_match.as_str().len();
        let ext = ext_match.as_str().to_string();
        // The frame digits are preceded by exactly one dot.
        let stem = &name[..frame_match.start() - 1];
        let key = match rule {
            SequenceRule::Playblast { .. } => (String::new(), ext.to_lowercase()),
            _ => (dir.join(stem).display().to_string(), ext.to_lowercase()),
        };
        let member = FrameFile {
            frame,
            digits,
            ext,
            path,
        };
        match groups.iter_mut().find(|group| group.key == key) {
            Some(group) => group.members.push(member),
            None => groups.push(Group {
                key,
                members: vec![member],
            }),
        }
    }

    let mut best: Option<(usize, SystemTime, Group)> = None;
    for group in groups {
        let newest = newest_mtime(&group.members, host)?;
        let count = group.members.len();
        let better = match &best {
            None => true,
            Some((best_count, best_time, _)) => (count, newest) > (*best_count, *best_time),
        };
        if better {
            best = Some((count, newest, group));
        }
    }
    let Some((count, _, group)) = best else {
        return Ok(None);
    };

    let prefix = match rule {
        SequenceRule::Playblast { base } => dir.join(base),
        _ => PathBuf::from(&group.key.0),
    };
    let descriptor = describe(prefix, group.members);
    tracing::debug!(
        dir = %dir.display(),
        frames = count,
        first = descriptor.first,
        last = descriptor.last,
        ext = %descriptor.ext,
        "selected sequence"
    );
    Ok(Some(descriptor))
}

fn newest_mtime(members: &[FrameFile], host: &dyn Host) -> Result<SystemTime> {
    let mut newest = SystemTime::UNIX_EPOCH;
    for member in members {
        let time = host
            .modified(&member.path)
            .map_err(ResolutionError::io(&member.path))?;
        newest = newest.max(time);
    }
    Ok(newest)
}

fn describe(prefix: PathBuf, mut members: Vec<FrameFile>) -> SequenceDescriptor {
    members.sort_by(|a, b| a.frame.cmp(&b.frame).then_with(|| a.path.cmp(&b.path)));
    let first = members.first().map(|m| m.frame).unwrap_or_default();
    let last = members.iter().map(|m| m.frame).max().unwrap_or_default();
    let padding = members.iter().map(|m| m.digits).max().unwrap_or_default();
    let ext = members.first().map(|m| m.ext.clone()).unwrap_or_default();
    SequenceDescriptor {
        prefix,
        ext,
        first,
        last,
        padding,
        files: members.into_iter().map(|m| m.path).collect(),
    }
}

/// Look for `<base>.<ext>` (case-insensitive) for each extension in order.
pub fn scan_movie(dir: &Path, base: &str, extensions: &[String]) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let files = list_files(dir)?;
    let base = base.to_lowercase();
    for ext in extensions {
        let wanted = format!("{base}.{}", ext.to_lowercase());
        if let Some(path) = files
            .iter()
            .find(|path| file_name(path).to_lowercase() == wanted)
        {
            return Ok(Some(path.clone()));
        }
    }
    Ok(None)
}

/// Sequence first, then a single movie file.
pub fn scan_playblast(
    dir: &Path,
    base: &str,
    movie_extensions: &[String],
    host: &dyn Host,
) -> Result<Option<Media>> {
    if let Some(seq) = scan_sequence(dir, &SequenceRule::playblast(base), host)? {
        return Ok(Some(Media::Sequence(seq)));
    }
    Ok(scan_movie(dir, base, movie_extensions)?.map(|path| Media::Movie { path }))
}

/// Resolution from `dir`'s name, else its parent's (`exr/4448x3096/`).
pub fn resolution_from_dir(dir: &Path) -> Option<Resolution> {
    let parse = |path: &Path| {
        let caps = RESOLUTION_RE.captures(file_name(path))?;
        let width: u32 = caps[1].parse().ok()?;
        let height: u32 = caps[2].parse().ok()?;
        (width > 0 && height > 0).then_some(Resolution { width, height })
    };
    parse(dir).or_else(|| dir.parent().and_then(parse))
}

#[cfg(test)]
#[path = "sequence_tests.rs"]
mod tests;
