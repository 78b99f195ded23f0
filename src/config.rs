//! Pipeline path configuration.
//!
//! Root templates are relative to a filesystem root so a whole studio tree can
//! be relocated (or faked in tests) by changing one field.
use crate::context::{ShotContext, ShotLocation};
use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "SHOTPICK_CONFIG";
/// File name looked up under the user config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

const PLAYBLAST_ROOT_TEMPLATE: &str =
    "shows/{show}/shots/{seq}/{shot}/user/{user}/mm/maya/playblast";
const PLATE_ROOT_TEMPLATE: &str =
    "shows/{show}/shots/{seq}/{shot}/publish/turnover/plate/input_plate";
const LD_ROOT_TEMPLATE: &str =
    "shows/{show}/shots/{seq}/{shot}/user/{user}/mm/3de/mm-default/exports/scene";
const RENDERS_ROOT_TEMPLATE: &str =
    "shows/{show}/shots/{seq}/{shot}/user/{user}/mm/maya/renders/mm-default";

const MOVIE_EXTENSIONS: [&str; 7] = ["mov", "mp4", "m4v", "avi", "mxf", "webm", "mkv"];

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory the templates are resolved against.
    pub root: PathBuf,
    pub playblast_root: String,
    /// Must not reference `{user}`: plate reads resolve without an artist.
    pub plate_root: String,
    pub ld_root: String,
    pub renders_root: String,
    /// Movie container extensions in priority order.
    pub movie_extensions: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            playblast_root: PLAYBLAST_ROOT_TEMPLATE.to_string(),
            plate_root: PLATE_ROOT_TEMPLATE.to_string(),
            ld_root: LD_ROOT_TEMPLATE.to_string(),
            renders_root: RENDERS_ROOT_TEMPLATE.to_string(),
            movie_extensions: MOVIE_EXTENSIONS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl PipelineConfig {
    /// `.../user/<user>/mm/maya/playblast`
    pub fn playblast_root(&self, ctx: &ShotContext) -> PathBuf {
        self.render(&self.playblast_root, &ctx.location(), Some(&ctx.user))
    }

    /// `.../publish/turnover/plate/input_plate`
    pub fn plate_root(&self, loc: &ShotLocation) -> PathBuf {
        self.render(&self.plate_root, loc, None)
    }

    /// `.../user/<user>/mm/3de/mm-default/exports/scene`
    pub fn ld_root(&self, ctx: &ShotContext) -> PathBuf {
        self.render(&self.ld_root, &ctx.location(), Some(&ctx.user))
    }

    /// `.../user/<user>/mm/maya/renders/mm-default`
    pub fn renders_root(&self, ctx: &ShotContext) -> PathBuf {
        self.render(&self.renders_root, &ctx.location(), Some(&ctx.user))
    }

    fn render(&self, template: &str, loc: &ShotLocation, user: Option<&str>) -> PathBuf {
        let fill = |caps: &regex::Captures<'_>| -> String {
            match &caps[1] {
                "show" => loc.show.clone(),
                "seq" => loc.seq.clone(),
                "shot" => loc.shot.clone(),
                "user" => user.unwrap_or_default().to_string(),
                other => format!("{{{other}}}"),
            }
        };
        let rel = PLACEHOLDER_RE.replace_all(template, fill);
        self.root.join(&*rel)
    }
}

/// Render the default config as pretty JSON, for `shotpick config`.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&PipelineConfig::default()).context("serialize config stub")
}

/// Pick the config file: explicit flag, then `$SHOTPICK_CONFIG`, then the
/// user config directory if a file exists there.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("shotpick").join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: PipelineConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// Load the resolved config file, or fall back to the studio defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<PipelineConfig> {
    match resolve_config_path(explicit) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config(&path)
        }
        None => Ok(PipelineConfig::default()),
    }
}

pub fn validate_config(config: &PipelineConfig) -> Result<()> {
    let all = ["show", "seq", "shot", "user"];
    validate_template("playblast_root", &config.playblast_root, &all)?;
    validate_template("plate_root", &config.plate_root, &all[..3])?;
    validate_template("ld_root", &config.ld_root, &all)?;
    validate_template("renders_root", &config.renders_root, &all)?;
    if config.movie_extensions.is_empty() {
        return Err(anyhow!("movie_extensions must be non-empty"));
    }
    if let Some(ext) = config
        .movie_extensions
        .iter()
        .find(|ext| ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        return Err(anyhow!(
            "movie_extensions entries must be alphanumeric without a dot (got {ext:?})"
        ));
    }
    Ok(())
}

fn validate_template(label: &str, template: &str, allowed: &[&str]) -> Result<()> {
    if template.trim().is_empty() {
        return Err(anyhow!("{label} must be non-empty"));
    }
    if Path::new(template).is_absolute() {
        return Err(anyhow!("{label} must be relative to root (got {template:?})"));
    }
    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let name = &caps[1];
        if !allowed.contains(&name) {
            return Err(anyhow!("{label} uses unsupported placeholder {{{name}}}"));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
