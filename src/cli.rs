//! CLI argument parsing for the resolver.
//!
//! Flags stand in for the interactive application: `--script` is the open
//! script path and each `--read` is one Read node's source path.
use crate::resolve::DEFAULT_CATEGORY;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "shotpick",
    version,
    about = "Resolve the latest published plate, LD, playblast, and geo renders for a shot",
    after_help = "Examples:\n  shotpick plate --script /shows/DEMO/shots/SEQ/SEQ_0010/user/artist/nuke/comp_FG01_v001.nk\n  shotpick playblast --category Cones --script <nk> --json\n  shotpick setup --script <nk> --read /path/to/plate/input_plate/FG01/v002/exr/plate.####.exr\n  shotpick config > ~/.config/shotpick/config.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print show/seq/shot/user parsed from the script path
    Context(ShotArgs),
    /// Latest playblast sequence or movie for a category
    Playblast(PlayblastArgs),
    /// Latest raw plate sequence, detecting the plate id from the script name
    Plate(ShotArgs),
    /// Latest geometry render sequence
    Geo(ShotArgs),
    /// Best lens-distortion script for the detected plate
    Ld(ShotArgs),
    /// Plate, LD, and playblasts for an export setup
    Setup(SetupArgs),
    /// Plate, LD, and Cones + Wireframe playblasts for a slap comp
    Slapcomp(ShotArgs),
    /// Print the default pipeline config as JSON
    Config,
}

impl Command {
    /// Shared flags, absent for commands that resolve nothing.
    pub fn shot_args(&self) -> Option<&ShotArgs> {
        match self {
            Self::Context(args)
            | Self::Plate(args)
            | Self::Geo(args)
            | Self::Ld(args)
            | Self::Slapcomp(args) => Some(args),
            Self::Playblast(args) => Some(&args.shot),
            Self::Setup(args) => Some(&args.shot),
            Self::Config => None,
        }
    }
}

/// Flags shared by every resolving command.
#[derive(Args, Debug, Clone, Default)]
pub struct ShotArgs {
    /// Path of the open Nuke script
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Source path of an existing Read node (repeatable, in node order)
    #[arg(long = "read", value_name = "PATH")]
    pub reads: Vec<String>,

    /// Pipeline config JSON (defaults to $SHOTPICK_CONFIG, then the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Answer the plate selection prompt with this folder name; ignored when a
    /// Read node or the script name already picks an existing plate folder
    #[arg(long, value_name = "ID")]
    pub plate: Option<String>,

    /// Never prompt; an ambiguous plate without --plate is cancelled
    #[arg(long)]
    pub no_input: bool,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Log selection decisions to stderr
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct PlayblastArgs {
    /// Playblast category folder
    #[arg(long, value_name = "NAME", default_value = DEFAULT_CATEGORY)]
    pub category: String,

    #[command(flatten)]
    pub shot: ShotArgs,
}

#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Playblast categories to include (repeatable; default Wireframe)
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,

    #[command(flatten)]
    pub shot: ShotArgs,
}
