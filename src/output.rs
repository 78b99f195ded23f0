//! Text and JSON rendering of resolution results.
//!
//! Text lines carry a `[tag]` prefix per asset kind so a setup summary reads
//! as one log. JSON is the serde form of the result structs.
use crate::context::ShotContext;
use crate::error::ResolutionError;
use crate::resolve::{ExportSetup, GeoMatch, LensDistortionMatch, PlateMatch, PlayblastMatch};
use crate::sequence::{Media, Resolution, SequenceDescriptor};
use anyhow::{Context, Result};
use serde::Serialize;

/// Human-readable summary lines for a result.
pub trait Summary {
    fn summary_lines(&self) -> Vec<String>;
}

impl Summary for ShotContext {
    fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("show: {}", self.show),
            format!("seq: {}", self.seq),
            format!("shot: {}", self.shot),
            format!("user: {}", self.user),
        ]
    }
}

impl Summary for PlayblastMatch {
    fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "[playblast] Category: {}  Version v{}",
            self.category, self.version
        )];
        match &self.media {
            Media::Sequence(seq) => {
                lines.push(format!("[playblast] Read: {}", seq.hash_pattern()));
                lines.push(format!("[playblast] {}", frames_line(seq)));
            }
            Media::Movie { path } => {
                lines.push(format!("[playblast] Movie: {}", path.display()));
            }
        }
        lines
    }
}

impl Summary for PlateMatch {
    fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("[plate] Read: {}", self.sequence.hash_pattern()),
            format!(
                "[plate] Plate: {}  Version v{}  {}",
                self.plate,
                self.version,
                frames_line(&self.sequence)
            ),
        ];
        lines.extend(format_line("plate", self.resolution));
        lines
    }
}

impl Summary for GeoMatch {
    fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("[geo] Read: {}", self.sequence.hash_pattern()),
            format!(
                "[geo] Version v{}  {}",
                self.version,
                frames_line(&self.sequence)
            ),
        ];
        lines.extend(format_line("geo", self.resolution));
        lines
    }
}

impl Summary for LensDistortionMatch {
    fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("[ld] Script: {}", self.path.display()),
            format!(
                "[ld] Plate: {}  Version v{}  Score: {}",
                self.plate, self.version, self.score
            ),
        ]
    }
}

impl Summary for ExportSetup {
    fn summary_lines(&self) -> Vec<String> {
        let mut lines = self.plate.summary_lines();
        lines.extend(self.lens.summary_lines());
        for playblast in &self.playblasts {
            lines.extend(playblast.summary_lines());
        }
        lines
    }
}

fn frames_line(seq: &SequenceDescriptor) -> String {
    format!("Frames: {}-{}  Pad: {}", seq.first, seq.last, seq.padding)
}

fn format_line(tag: &str, resolution: Option<Resolution>) -> Option<String> {
    resolution.map(|res| format!("[{tag}] Format: {}x{}", res.width, res.height))
}

/// Render `value` as pretty JSON or summary text, newline-terminated.
pub fn render<T: Serialize + Summary>(value: &T, json: bool) -> Result<String> {
    if json {
        let text = serde_json::to_string_pretty(value).context("serialize result")?;
        return Ok(format!("{text}\n"));
    }
    let mut text = value.summary_lines().join("\n");
    text.push('\n');
    Ok(text)
}

#[derive(Serialize)]
struct ErrorReport {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

/// JSON body printed for a failed resolution in `--json` mode.
pub fn render_error_json(err: &ResolutionError) -> Result<String> {
    let report = ErrorReport {
        error: ErrorBody {
            kind: err.kind(),
            message: err.to_string(),
        },
    };
    let text = serde_json::to_string_pretty(&report).context("serialize error")?;
    Ok(format!("{text}\n"))
}
