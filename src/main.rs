use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod context;
mod error;
mod host;
mod lens;
mod output;
mod plate;
mod resolve;
mod sequence;
#[cfg(test)]
mod test_support;
mod util;
mod version;

use cli::{Command, RootArgs};
use error::ResolutionError;
use host::TerminalHost;
use output::Summary;
use resolve::{Resolver, SLAPCOMP_CATEGORIES};

fn main() -> ExitCode {
    let args = RootArgs::parse();
    let verbose = args.command.shot_args().is_some_and(|shot| shot.verbose);
    init_tracing(verbose);

    match run(&args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Resolution failures were already shown through the host.
            if err.downcast_ref::<ResolutionError>().is_none() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(command: &Command) -> Result<()> {
    let Some(shot) = command.shot_args() else {
        println!("{}", config::config_stub()?);
        return Ok(());
    };
    let config = config::load_or_default(shot.config.as_deref())?;
    let mut host = TerminalHost::new(shot.script.clone(), shot.reads.clone())
        .with_choice(shot.plate.clone());
    if shot.no_input {
        host = host.non_interactive();
    }
    let resolver = Resolver::new(&config, &host);
    let json = shot.json;

    let result = match command {
        Command::Context(_) => emit(resolver.context(), json),
        Command::Playblast(args) => emit(resolver.playblast(&args.category), json),
        Command::Plate(_) => emit(resolver.plate_read(), json),
        Command::Geo(_) => emit(resolver.geo(), json),
        Command::Ld(_) => emit(resolver.lens_distortion(), json),
        Command::Setup(args) => emit(resolver.export_setup(&args.categories), json),
        Command::Slapcomp(_) => {
            let categories: Vec<String> =
                SLAPCOMP_CATEGORIES.iter().map(|c| c.to_string()).collect();
            emit(resolver.export_setup(&categories), json)
        }
        Command::Config => Ok(()),
    };
    if let Some(choice) = host.unused_choice() {
        tracing::warn!(plate = %choice, "--plate ignored: no plate prompt was needed");
    }
    result
}

fn emit<T: Serialize + Summary>(result: error::Result<T>, json: bool) -> Result<()> {
    match result {
        Ok(value) => {
            print!("{}", output::render(&value, json)?);
            Ok(())
        }
        Err(err) => {
            if json {
                print!("{}", output::render_error_json(&err)?);
            }
            Err(err.into())
        }
    }
}
