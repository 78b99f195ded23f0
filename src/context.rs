//! Shot context from the open script's path.
//!
//! The studio layout is `/shows/<show>/shots/<seq>/<shot>/user/<user>/...`; the
//! parser only locates the landmark segments and reads what follows them.
use crate::error::{ResolutionError, Result};
use serde::Serialize;
use std::path::Path;

const SHOWS: &str = "shows";
const SHOTS: &str = "shots";
const USER: &str = "user";

/// Name some hosts report for a root that was never saved.
const UNSAVED_ROOT_NAME: &str = "Root";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShotContext {
    pub show: String,
    pub seq: String,
    pub shot: String,
    pub user: String,
}

/// Show/sequence/shot without the artist, for paths outside `user/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShotLocation {
    pub show: String,
    pub seq: String,
    pub shot: String,
}

impl ShotContext {
    pub fn from_script(path: Option<&Path>) -> Result<Self> {
        let parts = script_components(path)?;
        let (i_shows, i_shots, i_user) = match (
            landmark(&parts, SHOWS),
            landmark(&parts, SHOTS),
            landmark(&parts, USER),
        ) {
            (Some(a), Some(b), Some(c)) => (a, b, c),
            _ => {
                return Err(ResolutionError::Context(
                    "Couldn't parse show/shot/user from the Nuke script path.\n\
                     Expected /shows/<show>/shots/<seq>/<shot>/user/<user>/..."
                        .to_string(),
                ))
            }
        };
        let short = || {
            ResolutionError::Context(
                "Path didn't have enough segments after /shows or /shots or /user.".to_string(),
            )
        };
        Ok(Self {
            show: segment(&parts, i_shows + 1).ok_or_else(short)?,
            seq: segment(&parts, i_shots + 1).ok_or_else(short)?,
            shot: segment(&parts, i_shots + 2).ok_or_else(short)?,
            user: segment(&parts, i_user + 1).ok_or_else(short)?,
        })
    }

    pub fn location(&self) -> ShotLocation {
        ShotLocation {
            show: self.show.clone(),
            seq: self.seq.clone(),
            shot: self.shot.clone(),
        }
    }
}

impl ShotLocation {
    pub fn from_script(path: Option<&Path>) -> Result<Self> {
        let parts = script_components(path)?;
        let (i_shows, i_shots) = match (landmark(&parts, SHOWS), landmark(&parts, SHOTS)) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(ResolutionError::Context(
                    "Couldn't parse show/shot from the Nuke script path.\n\
                     Expected /shows/<show>/shots/<seq>/<shot>/..."
                        .to_string(),
                ))
            }
        };
        let short = || {
            ResolutionError::Context(
                "Path didn't have enough segments after /shows or /shots.".to_string(),
            )
        };
        Ok(Self {
            show: segment(&parts, i_shows + 1).ok_or_else(short)?,
            seq: segment(&parts, i_shots + 1).ok_or_else(short)?,
            shot: segment(&parts, i_shots + 2).ok_or_else(short)?,
        })
    }
}

fn script_components(path: Option<&Path>) -> Result<Vec<String>> {
    let path = match path {
        Some(path) if !path.as_os_str().is_empty() && path != Path::new(UNSAVED_ROOT_NAME) => path,
        _ => return Err(ResolutionError::Unsaved),
    };
    Ok(path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect())
}

fn landmark(parts: &[String], name: &str) -> Option<usize> {
    parts.iter().position(|part| part == name)
}

fn segment(parts: &[String], idx: usize) -> Option<String> {
    parts.get(idx).cloned()
}
