//! Capabilities borrowed from the interactive application.
//!
//! The resolver never touches host node types directly; it asks a `Host` for
//! the open script path, Read-node sources, file times, and operator input.
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use std::cell::Cell;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Node class whose `file` knob points at existing plate media.
pub const READ_NODE_CLASS: &str = "Read";
/// Knob holding a Read node's source path.
pub const FILE_KNOB: &str = "file";

pub trait Host {
    /// Path of the open script, `None` when it has never been saved.
    fn script_path(&self) -> Option<PathBuf>;

    /// Names of every node of `class` in the open script.
    fn node_names(&self, class: &str) -> Vec<String>;

    /// String value of `knob` on `node`, if both exist.
    fn knob_value(&self, node: &str, knob: &str) -> Option<String>;

    /// Modification time of a resolved path.
    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }

    /// Ask the operator to pick one of `choices`; `None` means cancelled.
    fn choose(&self, title: &str, choices: &[String]) -> Option<String>;

    /// Blocking, user-visible notification.
    fn notify(&self, message: &str);
}

/// Source paths of every Read node, in host order. Nodes without a readable
/// `file` knob are skipped.
pub fn read_source_paths(host: &dyn Host) -> Vec<String> {
    host.node_names(READ_NODE_CLASS)
        .iter()
        .filter_map(|node| host.knob_value(node, FILE_KNOB))
        .collect()
}

/// Host backed by command-line flags and the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalHost {
    script: Option<PathBuf>,
    reads: Vec<String>,
    plate_choice: Option<String>,
    choice_used: Cell<bool>,
    interactive: bool,
}

impl TerminalHost {
    pub fn new(script: Option<PathBuf>, reads: Vec<String>) -> Self {
        Self {
            script,
            reads,
            plate_choice: None,
            choice_used: Cell::new(false),
            interactive: io::stdin().is_terminal() && io::stderr().is_terminal(),
        }
    }

    /// Answer disambiguation prompts with `choice` instead of asking.
    pub fn with_choice(mut self, choice: Option<String>) -> Self {
        self.plate_choice = choice;
        self
    }

    /// Disable terminal prompts; unanswered prompts count as cancelled.
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    /// The `--plate` answer when no prompt ever asked for it.
    pub fn unused_choice(&self) -> Option<&str> {
        if self.choice_used.get() {
            return None;
        }
        self.plate_choice.as_deref()
    }

    fn read_index(node: &str) -> Option<usize> {
        node.strip_prefix(READ_NODE_CLASS)?
            .parse::<usize>()
            .ok()?
            .checked_sub(1)
    }
}

impl Host for TerminalHost {
    fn script_path(&self) -> Option<PathBuf> {
        self.script.clone()
    }

    fn node_names(&self, class: &str) -> Vec<String> {
        if class != READ_NODE_CLASS {
            return Vec::new();
        }
        (1..=self.reads.len())
            .map(|idx| format!("{READ_NODE_CLASS}{idx}"))
            .collect()
    }

    fn knob_value(&self, node: &str, knob: &str) -> Option<String> {
        if knob != FILE_KNOB {
            return None;
        }
        let idx = Self::read_index(node)?;
        self.reads.get(idx).cloned()
    }

    fn choose(&self, title: &str, choices: &[String]) -> Option<String> {
        if let Some(choice) = &self.plate_choice {
            self.choice_used.set(true);
            tracing::info!(choice = %choice, "answering prompt from --plate");
            return Some(choice.clone());
        }
        if !self.interactive || choices.is_empty() {
            return None;
        }
        let picked = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(title)
            .items(choices)
            .default(0)
            .interact_opt();
        match picked {
            Ok(Some(idx)) => choices.get(idx).cloned(),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "prompt failed");
                None
            }
        }
    }

    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}
