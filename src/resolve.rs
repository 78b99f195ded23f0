//! Resolution call paths.
//!
//! Each public [`Resolver`] method is one operator-facing action. Failures are
//! handed to [`Host::notify`] and then returned; no call path produces a
//! partial result.
use crate::config::PipelineConfig;
use crate::context::{ShotContext, ShotLocation};
use crate::error::{ResolutionError, Result};
use crate::host::Host;
use crate::lens::find_latest_ld_under;
use crate::plate::{
    candidates_from_script_path, choose_plate_dir, collect_plate_dirs, preferences_from_host,
    PlatePreferences,
};
use crate::sequence::{
    resolution_from_dir, scan_playblast, scan_sequence, Media, Resolution, SequenceDescriptor,
    SequenceRule,
};
use crate::util::{file_name, list_dirs};
use crate::version::{list_version_dirs, require_version_dirs};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Playblast category used when none is requested.
pub const DEFAULT_CATEGORY: &str = "Wireframe";
/// Categories resolved by the slap-comp setup, in build order.
pub const SLAPCOMP_CATEGORIES: [&str; 2] = ["Cones", "Wireframe"];

const EXR_DIR_NAME: &str = "exr";
const GEO_DIR_PREFIX: &str = "geo";
const AUTO_PLATE_LABEL: &str = "(auto-detect from available plates)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayblastMatch {
    pub category: String,
    pub version: String,
    pub media: Media,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlateMatch {
    /// Plate folder name as found on disk.
    pub plate: String,
    pub version: String,
    pub sequence: SequenceDescriptor,
    /// Folder the sequence was found in (`exr/` or a subfolder of it).
    pub directory: PathBuf,
    pub resolution: Option<Resolution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoMatch {
    pub version: String,
    pub sequence: SequenceDescriptor,
    pub directory: PathBuf,
    pub resolution: Option<Resolution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LensDistortionMatch {
    pub plate: String,
    pub version: String,
    pub path: PathBuf,
    pub score: u8,
}

/// Everything an export setup needs: one plate, its LD script, and one
/// playblast per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSetup {
    pub context: ShotContext,
    pub plate: PlateMatch,
    pub lens: LensDistortionMatch,
    pub playblasts: Vec<PlayblastMatch>,
}

pub struct Resolver<'a> {
    config: &'a PipelineConfig,
    host: &'a dyn Host,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a PipelineConfig, host: &'a dyn Host) -> Self {
        Self { config, host }
    }

    pub fn context(&self) -> Result<ShotContext> {
        self.report(self.shot_context())
    }

    /// Latest playblast sequence or movie for `category`.
    pub fn playblast(&self, category: &str) -> Result<PlayblastMatch> {
        self.report(
            self.shot_context()
                .and_then(|ctx| find_latest_playblast(self.config, self.host, &ctx, category)),
        )
    }

    /// Latest raw plate for the open script, without prompting.
    pub fn plate_read(&self) -> Result<PlateMatch> {
        let script = self.host.script_path();
        self.report(
            ShotLocation::from_script(script.as_deref()).and_then(|loc| {
                // `from_script` only succeeds for a saved script.
                let script = script.as_deref().unwrap_or_else(|| Path::new(""));
                find_latest_plate_read(self.config, self.host, &loc, script)
            }),
        )
    }

    /// Latest geometry render sequence.
    pub fn geo(&self) -> Result<GeoMatch> {
        self.report(
            self.shot_context()
                .and_then(|ctx| find_latest_geo(self.config, self.host, &ctx)),
        )
    }

    /// Best LD script, preferring plates named by Read nodes and the script.
    pub fn lens_distortion(&self) -> Result<LensDistortionMatch> {
        self.report(self.shot_context().and_then(|ctx| {
            let prefs = preferences_from_host(self.host);
            find_latest_ld(self.config, self.host, &ctx, prefs)
        }))
    }

    /// Plate, LD, and playblasts for an export setup. An empty `categories`
    /// means the default category.
    pub fn export_setup(&self, categories: &[String]) -> Result<ExportSetup> {
        self.report(self.shot_context().and_then(|ctx| {
            let default = [DEFAULT_CATEGORY.to_string()];
            let categories = if categories.is_empty() {
                &default[..]
            } else {
                categories
            };
            build_export_setup(self.config, self.host, ctx, categories)
        }))
    }

    fn shot_context(&self) -> Result<ShotContext> {
        ShotContext::from_script(self.host.script_path().as_deref())
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            tracing::debug!(kind = err.kind(), "resolution failed");
            self.host.notify(&err.to_string());
        }
        result
    }
}

pub fn find_latest_playblast(
    config: &PipelineConfig,
    host: &dyn Host,
    ctx: &ShotContext,
    category: &str,
) -> Result<PlayblastMatch> {
    let root = config.playblast_root(ctx);
    if !root.is_dir() {
        return Err(ResolutionError::missing_root("Playblast root not found", root));
    }
    let cat_dir = root.join(category);
    if !cat_dir.is_dir() {
        return Err(ResolutionError::missing_root(format!("No '{category}' folder under"), root));
    }
    for vdir in require_version_dirs(&cat_dir)? {
        if let Some(media) = scan_playblast(&vdir.path, category, &config.movie_extensions, host)? {
            tracing::info!(category, version = %vdir.name, "selected playblast");
            return Ok(PlayblastMatch {
                category: category.to_string(),
                version: vdir.padded(),
                media,
            });
        }
    }
    Err(ResolutionError::no_match(
        format!("No sequences or movies matching '{category}' found under versions in"),
        cat_dir,
    ))
}

/// Dedicated plate-read lookup: plate id from the script name, literal plate
/// rule first, then any plate id across every folder.
pub fn find_latest_plate_read(
    config: &PipelineConfig,
    host: &dyn Host,
    loc: &ShotLocation,
    script: &Path,
) -> Result<PlateMatch> {
    let root = config.plate_root(loc);
    if !root.is_dir() {
        return Err(ResolutionError::missing_root("Plate root not found", root));
    }
    let candidates = candidates_from_script_path(script);
    let detected = candidates
        .iter()
        .find(|token| root.join(token).exists())
        .or_else(|| candidates.first());
    tracing::debug!(plate = ?detected, "plate id from script");

    let all_dirs = list_dirs(&root)?;
    let dirs = match detected.map(|token| root.join(token)) {
        Some(dir) if dir.is_dir() => vec![dir],
        _ => all_dirs.clone(),
    };
    if let Some(found) = scan_plate_dirs(host, &loc.shot, &dirs, false)? {
        return Ok(found);
    }
    tracing::debug!("no literal plate match, trying any plate id");
    if let Some(found) = scan_plate_dirs(host, &loc.shot, &all_dirs, true)? {
        return Ok(found);
    }
    Err(ResolutionError::no_match("No plate sequences found under", root))
}

/// Shared plate lookup used by export setups. Prompts for a folder when the
/// plate id is unknown or absent and more than one folder exists.
pub fn find_latest_plate(
    config: &PipelineConfig,
    host: &dyn Host,
    loc: &ShotLocation,
    plate_id: Option<&str>,
    prompt: bool,
) -> Result<PlateMatch> {
    let root = config.plate_root(loc);
    if !root.is_dir() {
        return Err(ResolutionError::missing_root("Plate root not found", root));
    }
    let detected = plate_id.map(|id| root.join(id)).filter(|dir| dir.exists());
    let dirs = match detected {
        Some(dir) => vec![dir],
        None if prompt => choose_plate_dir(host, &root, list_dirs(&root)?)?,
        None => list_dirs(&root)?,
    };
    scan_plate_dirs(host, &loc.shot, &dirs, false)?
        .ok_or_else(|| ResolutionError::no_match("No plate sequences found under", root))
}

/// First hit over `dirs` in order, each searched newest version first, in
/// `exr/` and then its subfolders.
fn scan_plate_dirs(
    host: &dyn Host,
    shot: &str,
    dirs: &[PathBuf],
    any_plate: bool,
) -> Result<Option<PlateMatch>> {
    for plate_dir in dirs {
        let plate = file_name(plate_dir);
        for vdir in list_version_dirs(plate_dir)? {
            let exr_dir = vdir.path.join(EXR_DIR_NAME);
            if !exr_dir.is_dir() {
                continue;
            }
            let version = vdir.padded();
            let rule = SequenceRule::plate(shot, (!any_plate).then_some(plate), &version);
            let mut search = vec![exr_dir.clone()];
            search.extend(list_dirs(&exr_dir)?);
            for dir in search {
                if let Some(sequence) = scan_sequence(&dir, &rule, host)? {
                    tracing::info!(
                        plate,
                        version = %vdir.name,
                        dir = %dir.display(),
                        "selected plate sequence"
                    );
                    return Ok(Some(PlateMatch {
                        plate: plate.to_string(),
                        version,
                        resolution: resolution_from_dir(&dir),
                        directory: dir,
                        sequence,
                    }));
                }
            }
        }
    }
    Ok(None)
}

pub fn find_latest_geo(
    config: &PipelineConfig,
    host: &dyn Host,
    ctx: &ShotContext,
) -> Result<GeoMatch> {
    let root = config.renders_root(ctx);
    if !root.is_dir() {
        return Err(ResolutionError::missing_root("Renders root not found", root));
    }
    for vdir in require_version_dirs(&root)? {
        let geo_dirs: Vec<PathBuf> = list_dirs(&vdir.path)?
            .into_iter()
            .filter(|dir| file_name(dir).to_lowercase().starts_with(GEO_DIR_PREFIX))
            .collect();
        if geo_dirs.is_empty() {
            continue;
        }
        let version = vdir.padded();
        let rule = SequenceRule::geo(&ctx.shot, &version);

        let mut search = geo_dirs.clone();
        for geo_dir in &geo_dirs {
            search.extend(list_dirs(geo_dir)?);
        }
        for dir in search {
            if let Some(sequence) = scan_sequence(&dir, &rule, host)? {
                tracing::info!(version = %vdir.name, dir = %dir.display(), "selected geo sequence");
                return Ok(GeoMatch {
                    version,
                    resolution: resolution_from_dir(&dir),
                    directory: dir,
                    sequence,
                });
            }
        }
    }
    Err(ResolutionError::no_match("No GEO sequences found in any version under", root))
}

/// Try each preferred plate, then every plate folder under the LD root, and
/// return the first plate with an LD script.
pub fn find_latest_ld(
    config: &PipelineConfig,
    host: &dyn Host,
    ctx: &ShotContext,
    mut prefs: PlatePreferences,
) -> Result<LensDistortionMatch> {
    let scene_root = config.ld_root(ctx);
    let on_disk = collect_plate_dirs(&scene_root)?;
    prefs.extend(on_disk.iter().map(|dir| dir.token.clone()));
    if prefs.is_empty() {
        return Err(ResolutionError::missing_root("No plate folders found under", scene_root));
    }
    tracing::debug!(plates = %prefs.tokens().join(", "), "LD plate preference");

    for token in prefs.tokens() {
        let plate_dir = on_disk
            .iter()
            .find(|dir| &dir.token == token)
            .map(|dir| dir.path.clone())
            .unwrap_or_else(|| scene_root.join(token));
        if let Some(found) = find_latest_ld_under(&plate_dir, &ctx.shot, token, host)? {
            return Ok(LensDistortionMatch {
                plate: token.clone(),
                version: found.version,
                path: found.path,
                score: found.score,
            });
        }
    }
    Err(ResolutionError::no_match("No 3DE LD .nk found under any plate folder in", scene_root))
}

fn build_export_setup(
    config: &PipelineConfig,
    host: &dyn Host,
    ctx: ShotContext,
    categories: &[String],
) -> Result<ExportSetup> {
    let detected = preferences_from_host(host);
    tracing::info!(
        plate = detected.first().unwrap_or(AUTO_PLATE_LABEL),
        "export setup plate id"
    );

    let plate = find_latest_plate(config, host, &ctx.location(), detected.first(), true)?;

    let mut prefs = PlatePreferences::default();
    prefs.push(Some(plate.plate.to_uppercase()));
    let lens = find_latest_ld(config, host, &ctx, prefs)?;

    let playblasts = categories
        .iter()
        .map(|category| find_latest_playblast(config, host, &ctx, category))
        .collect::<Result<Vec<_>>>()?;

    Ok(ExportSetup {
        context: ctx,
        plate,
        lens,
        playblasts,
    })
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
