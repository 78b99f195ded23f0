use super::*;
use crate::test_support::{make_dirs, write_files, StubHost};
use tempfile::TempDir;

const SHOT: &str = "SEQ_0010";

struct Studio {
    temp: TempDir,
    config: PipelineConfig,
}

impl Studio {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = PipelineConfig {
            root: temp.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        Self { temp, config }
    }

    fn ctx(&self) -> ShotContext {
        ShotContext {
            show: "DEMO".into(),
            seq: "SEQ".into(),
            shot: SHOT.into(),
            user: "artist".into(),
        }
    }

    fn script(&self, name: &str) -> PathBuf {
        self.temp
            .path()
            .join("shows/DEMO/shots/SEQ/SEQ_0010/user/artist/nuke")
            .join(name)
    }

    fn host(&self, name: &str) -> StubHost {
        StubHost::with_script(self.script(name))
    }

    fn playblast_root(&self) -> PathBuf {
        self.config.playblast_root(&self.ctx())
    }

    fn plate_root(&self) -> PathBuf {
        self.config.plate_root(&self.ctx().location())
    }

    fn ld_root(&self) -> PathBuf {
        self.config.ld_root(&self.ctx())
    }

    fn renders_root(&self) -> PathBuf {
        self.config.renders_root(&self.ctx())
    }

    /// `<plate>/<version>/exr[/<sub>]/` holding a two-frame plate sequence.
    fn plate(&self, plate: &str, version: &str, sub: Option<&str>, file_plate: &str) -> PathBuf {
        let mut dir = self.plate_root().join(plate).join(version).join("exr");
        if let Some(sub) = sub {
            dir = dir.join(sub);
        }
        let digits = &version[1..];
        write_files(
            &dir,
            &[
                format!("{SHOT}_turnover-plate_{file_plate}_lin_v{digits}.1001.exr").as_str(),
                format!("{SHOT}_turnover-plate_{file_plate}_lin_v{digits}.1002.exr").as_str(),
            ],
        );
        dir
    }

    fn ld(&self, plate: &str, version: &str) -> PathBuf {
        let digits = &version[1..];
        let dir = self
            .ld_root()
            .join(plate)
            .join(crate::lens::LD_DIR_NAME)
            .join(version);
        let name = format!("{SHOT}_mm_default_{plate}_LD_v{digits}.nk");
        write_files(&dir, &[name.as_str()]).remove(0)
    }
}

#[test]
fn context_requires_saved_script() {
    let studio = Studio::new();
    let host = StubHost::default();
    let err = Resolver::new(&studio.config, &host)
        .context()
        .expect_err("unsaved");
    assert!(matches!(err, ResolutionError::Unsaved));
    assert_eq!(host.notices.borrow().len(), 1);
    assert!(host.notices.borrow()[0].contains("save"));
}

#[test]
fn playblast_takes_newest_version_with_media() {
    let studio = Studio::new();
    let cat = studio.playblast_root().join("Wireframe");
    write_files(&cat.join("v010"), &["Cones.1001.png"]);
    make_dirs(&cat, &["v003"]);
    write_files(&cat.join("v002"), &["Wireframe.mov"]);
    write_files(
        &cat.join("v001"),
        &["Wireframe.1001.png", "Wireframe.1002.png"],
    );
    let host = studio.host("comp.nk");

    let found = Resolver::new(&studio.config, &host)
        .playblast("Wireframe")
        .expect("playblast");
    assert_eq!(found.version, "002");
    assert_eq!(
        found.media,
        Media::Movie {
            path: cat.join("v002").join("Wireframe.mov")
        }
    );
    assert!(host.notices.borrow().is_empty());
}

#[test]
fn playblast_failures_name_the_folder() {
    let studio = Studio::new();
    let host = studio.host("comp.nk");
    let resolver = Resolver::new(&studio.config, &host);

    let err = resolver.playblast("Wireframe").expect_err("no root");
    assert!(err.to_string().starts_with("Playblast root not found:\n"));

    make_dirs(&studio.playblast_root(), &["Cones"]);
    let err = resolver.playblast("Wireframe").expect_err("no category");
    assert_eq!(
        err.to_string(),
        format!(
            "No 'Wireframe' folder under:\n{}",
            studio.playblast_root().display()
        )
    );

    let err = resolver.playblast("Cones").expect_err("no versions");
    assert!(err.to_string().starts_with("No version folders under:"));

    write_files(&studio.playblast_root().join("Cones/v001"), &["notes.txt"]);
    let err = resolver.playblast("Cones").expect_err("no media");
    assert!(matches!(err, ResolutionError::NoMatch { .. }));
    assert!(err
        .to_string()
        .starts_with("No sequences or movies matching 'Cones' found under versions in:"));

    assert_eq!(host.notices.borrow().len(), 4);
}

#[test]
fn plate_read_uses_script_plate_and_resolution_folder() {
    let studio = Studio::new();
    studio.plate("BG01", "v004", None, "BG01");
    let dir = studio.plate("FG01", "v002", Some("4448x3096"), "FG01");
    make_dirs(&studio.plate_root(), &["FG01/v003/exr"]);
    let host = studio.host("SEQ_0010_mm-default_FG01_scene_v001.nk");

    let found = Resolver::new(&studio.config, &host)
        .plate_read()
        .expect("plate");
    assert_eq!(found.plate, "FG01");
    assert_eq!(found.version, "002");
    assert_eq!(found.directory, dir);
    assert_eq!(
        found.resolution,
        Some(Resolution {
            width: 4448,
            height: 3096
        })
    );
    assert_eq!((found.sequence.first, found.sequence.last), (1001, 1002));
}

#[test]
fn plate_read_without_detected_plate_searches_all_folders() {
    let studio = Studio::new();
    studio.plate("BG01", "v001", None, "BG01");
    let host = studio.host("comp.nk");

    let found = Resolver::new(&studio.config, &host)
        .plate_read()
        .expect("plate");
    assert_eq!(found.plate, "BG01");
    assert!(host.prompts.borrow().is_empty());
}

#[test]
fn plate_read_falls_back_to_any_plate_id() {
    let studio = Studio::new();
    // Published under FG01 but named for another plate.
    studio.plate("FG01", "v001", None, "MG01");
    let host = studio.host("comp_fg01.nk");

    let found = Resolver::new(&studio.config, &host)
        .plate_read()
        .expect("wildcard plate");
    assert_eq!(found.plate, "FG01");
    assert!(found
        .sequence
        .prefix
        .to_string_lossy()
        .ends_with("turnover-plate_MG01_lin_v001"));
}

#[test]
fn plate_read_reports_missing_sequences() {
    let studio = Studio::new();
    let host = studio.host("comp.nk");
    let resolver = Resolver::new(&studio.config, &host);

    let err = resolver.plate_read().expect_err("no root");
    assert!(err.to_string().starts_with("Plate root not found:\n"));

    make_dirs(&studio.plate_root(), &["FG01/v001"]);
    let err = resolver.plate_read().expect_err("no exr");
    assert_eq!(
        err.to_string(),
        format!(
            "No plate sequences found under:\n{}",
            studio.plate_root().display()
        )
    );
}

#[test]
fn plate_read_only_needs_show_and_shot() {
    let studio = Studio::new();
    studio.plate("FG01", "v001", None, "FG01");
    let host = StubHost::with_script(
        studio
            .temp
            .path()
            .join("shows/DEMO/shots/SEQ/SEQ_0010/comp/FG01_comp.nk"),
    );

    let found = Resolver::new(&studio.config, &host)
        .plate_read()
        .expect("plate");
    assert_eq!(found.plate, "FG01");
}

#[test]
fn shared_plate_prompts_between_folders() {
    let studio = Studio::new();
    studio.plate("BG01", "v001", None, "BG01");
    studio.plate("FG01", "v001", None, "FG01");
    let host = StubHost {
        choice: Some("BG01".into()),
        ..studio.host("comp.nk")
    };

    let found = find_latest_plate(&studio.config, &host, &studio.ctx().location(), None, true)
        .expect("plate");
    assert_eq!(found.plate, "BG01");
    assert_eq!(*host.prompts.borrow(), vec![vec!["BG01", "FG01"]]);
}

#[test]
fn shared_plate_with_known_id_skips_prompt() {
    let studio = Studio::new();
    studio.plate("BG01", "v001", None, "BG01");
    studio.plate("FG01", "v003", None, "FG01");
    let host = studio.host("comp.nk");

    let found = find_latest_plate(
        &studio.config,
        &host,
        &studio.ctx().location(),
        Some("FG01"),
        true,
    )
    .expect("plate");
    assert_eq!(
        (found.plate.as_str(), found.version.as_str()),
        ("FG01", "003")
    );
    assert!(host.prompts.borrow().is_empty());
}

#[test]
fn shared_plate_cancel_aborts() {
    let studio = Studio::new();
    studio.plate("BG01", "v001", None, "BG01");
    studio.plate("FG01", "v001", None, "FG01");
    let host = studio.host("comp.nk");

    let err = find_latest_plate(
        &studio.config,
        &host,
        &studio.ctx().location(),
        Some("MG01"),
        true,
    )
    .expect_err("cancelled");
    assert!(matches!(err, ResolutionError::Cancelled(_)));
    assert_eq!(host.prompts.borrow().len(), 1);
}

#[test]
fn shared_plate_never_uses_wildcard() {
    let studio = Studio::new();
    studio.plate("FG01", "v001", None, "MG01");
    let host = studio.host("comp.nk");

    let err = find_latest_plate(
        &studio.config,
        &host,
        &studio.ctx().location(),
        Some("FG01"),
        true,
    )
    .expect_err("no literal match");
    assert!(matches!(err, ResolutionError::NoMatch { .. }));
}

#[test]
fn geo_prefers_direct_geo_folders_then_subfolders() {
    let studio = Studio::new();
    let root = studio.renders_root();
    make_dirs(&root, &["v003/beauty"]);
    let sub = root.join("v002/geoRender/2048x1152");
    write_files(
        &sub,
        &[
            "SEQ_0010_scene_geoRender_v002.1001.exr",
            "SEQ_0010_scene_geoRender_v002.1002.exr",
        ],
    );
    write_files(
        &root.join("v001/GeoLayer"),
        &["SEQ_0010_scene_geo_v001.1001.exr"],
    );
    let host = studio.host("comp.nk");

    let found = Resolver::new(&studio.config, &host).geo().expect("geo");
    assert_eq!(found.version, "002");
    assert_eq!(found.directory, sub);
    assert_eq!(
        found.resolution,
        Some(Resolution {
            width: 2048,
            height: 1152
        })
    );
}

#[test]
fn geo_reports_roots_and_empty_versions() {
    let studio = Studio::new();
    let host = studio.host("comp.nk");
    let resolver = Resolver::new(&studio.config, &host);

    let err = resolver.geo().expect_err("no root");
    assert!(err.to_string().starts_with("Renders root not found:\n"));

    make_dirs(&studio.renders_root(), &["v001/geo"]);
    let err = resolver.geo().expect_err("no sequences");
    assert!(err
        .to_string()
        .starts_with("No GEO sequences found in any version under:\n"));
}

#[test]
fn ld_follows_preferences_then_disk_order() {
    let studio = Studio::new();
    make_dirs(&studio.ld_root(), &["AA01"]);
    let expected = studio.ld("BG01", "v002");
    studio.ld("CC01", "v005");
    // FG01 comes from the script but has no LD folder on disk.
    let host = studio.host("fg01/comp.nk");

    let found = Resolver::new(&studio.config, &host)
        .lens_distortion()
        .expect("ld");
    assert_eq!(found.plate, "BG01");
    assert_eq!(found.version, "002");
    assert_eq!(found.path, expected);
}

#[test]
fn ld_reads_outrank_script_plate() {
    let studio = Studio::new();
    studio.ld("BG01", "v001");
    let expected = studio.ld("FG01", "v001");
    let host = StubHost {
        reads: vec!["/plate/input_plate/FG01/v001/exr/a.exr".into()],
        ..studio.host("bg01/comp.nk")
    };

    let found = Resolver::new(&studio.config, &host)
        .lens_distortion()
        .expect("ld");
    assert_eq!(found.path, expected);
}

#[test]
fn ld_failures() {
    let studio = Studio::new();
    let host = studio.host("comp.nk");
    let resolver = Resolver::new(&studio.config, &host);

    let err = resolver.lens_distortion().expect_err("no plates");
    let message = err.to_string();
    assert!(message.starts_with("No plate folders found under:\n"));

    make_dirs(&studio.ld_root(), &["FG01/nuke_lens_distortion/v001"]);
    let err = resolver.lens_distortion().expect_err("no LD");
    assert_eq!(
        err.to_string(),
        format!(
            "No 3DE LD .nk found under any plate folder in:\n{}",
            studio.ld_root().display()
        )
    );
}

#[test]
fn export_setup_collects_plate_ld_and_playblasts() {
    let studio = Studio::new();
    studio.plate("BG01", "v001", None, "BG01");
    studio.plate("FG01", "v002", None, "FG01");
    studio.ld("BG01", "v009");
    let ld = studio.ld("FG01", "v001");
    let pb = studio.playblast_root();
    write_files(&pb.join("Cones/v001"), &["Cones.1001.png"]);
    write_files(&pb.join("Wireframe/v004"), &["Wireframe.mp4"]);
    let host = StubHost {
        reads: vec!["/x/SEQ_0010_turnover_plate_FG01_lin.####.exr".into()],
        ..studio.host("comp.nk")
    };

    let categories: Vec<String> = SLAPCOMP_CATEGORIES.iter().map(|c| c.to_string()).collect();
    let setup = Resolver::new(&studio.config, &host)
        .export_setup(&categories)
        .expect("setup");
    assert_eq!(setup.plate.plate, "FG01");
    assert_eq!(setup.plate.version, "002");
    assert_eq!(setup.lens.path, ld);
    let found: Vec<(&str, &str)> = setup
        .playblasts
        .iter()
        .map(|p| (p.category.as_str(), p.version.as_str()))
        .collect();
    assert_eq!(found, vec![("Cones", "001"), ("Wireframe", "004")]);
    assert!(host.prompts.borrow().is_empty());
}

#[test]
fn export_setup_defaults_to_wireframe_and_fails_whole() {
    let studio = Studio::new();
    studio.plate("FG01", "v001", None, "FG01");
    studio.ld("FG01", "v001");
    let host = studio.host("comp.nk");

    let err = Resolver::new(&studio.config, &host)
        .export_setup(&[])
        .expect_err("no playblast");
    assert!(err.to_string().starts_with("Playblast root not found"));
    assert_eq!(host.notices.borrow().len(), 1);
}
