//! Shared fixtures for unit tests: a scripted host and tree builders.
use crate::host::Host;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Host double with pinned file times and a canned prompt answer.
#[derive(Default)]
pub(crate) struct StubHost {
    pub(crate) script: Option<PathBuf>,
    pub(crate) reads: Vec<String>,
    pub(crate) choice: Option<String>,
    pub(crate) mtimes: RefCell<HashMap<PathBuf, SystemTime>>,
    pub(crate) prompts: RefCell<Vec<Vec<String>>>,
    pub(crate) notices: RefCell<Vec<String>>,
}

impl StubHost {
    pub(crate) fn with_script(script: impl Into<PathBuf>) -> Self {
        Self {
            script: Some(script.into()),
            ..Self::default()
        }
    }

    /// Pin the modification time of `path` to `secs` after the epoch.
    pub(crate) fn set_mtime(&self, path: &Path, secs: u64) {
        self.mtimes
            .borrow_mut()
            .insert(path.to_path_buf(), UNIX_EPOCH + Duration::from_secs(secs));
    }
}

impl Host for StubHost {
    fn script_path(&self) -> Option<PathBuf> {
        self.script.clone()
    }

    fn node_names(&self, class: &str) -> Vec<String> {
        if class != "Read" {
            return Vec::new();
        }
        (0..self.reads.len())
            .map(|idx| format!("Read{idx}"))
            .collect()
    }

    fn knob_value(&self, node: &str, knob: &str) -> Option<String> {
        if knob != "file" {
            return None;
        }
        let idx: usize = node.strip_prefix("Read")?.parse().ok()?;
        self.reads.get(idx).cloned()
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        if let Some(time) = self.mtimes.borrow().get(path) {
            return Ok(*time);
        }
        // Unpinned files all share one time so ties stay deterministic.
        if path.exists() {
            Ok(UNIX_EPOCH)
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }

    fn choose(&self, _title: &str, choices: &[String]) -> Option<String> {
        self.prompts.borrow_mut().push(choices.to_vec());
        self.choice.clone()
    }

    fn notify(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }
}

pub(crate) fn write_file(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent directory");
    }
    std::fs::write(path, b"").expect("write file");
}

pub(crate) fn write_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            write_file(&path);
            path
        })
        .collect()
}

pub(crate) fn make_dirs(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::create_dir_all(dir.join(name)).expect("create directory");
    }
}
