mod args;
mod discover;
mod logger;
mod manifest_schema;
mod report;
mod state;

use std::process::ExitCode;

use anyhow::{Context, Result};

use args::Command;
use state::{LoadError, ProjectState};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("bmt: error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let project_root = std::env::current_dir().context("could not determine working directory")?;
    let options = args::parse(project_root)?;
    logger::init(options.verbose);

    match options.command {
        Command::Init => init(options),
        Command::FindMods => find_mods(options),
    }
}

fn init(options: args::Options) -> Result<ExitCode> {
    let path = state::state_path(&options.project_root);
    if path.exists() {
        log::warn!("{} already exists; re-initializing in place", path.display());
    }

    let mut project_state = ProjectState::new(options.project_root.clone());
    let discovery = discover::run(options.project_root.clone(), options.no_gitignore, &options.ignore_patterns);
    project_state.discovered_mods = discovery.mods;
    project_state.last_scan_milliseconds = discovery.scanned_at_milliseconds;

    state::save(&options.project_root, &project_state)
        .with_context(|| format!("could not write {}", path.display()))?;

    println!("initialized project at {}", options.project_root.display());
    report::summary("found", project_state.discovered_mods.len());
    report::mod_list(&project_state.discovered_mods);
    Ok(ExitCode::SUCCESS)
}

fn find_mods(options: args::Options) -> Result<ExitCode> {
    let mut project_state = match state::load(&options.project_root) {
        Ok(state) => state,
        Err(LoadError::NotAProject) => {
            eprintln!(
                "bmt: {} is not a bmt project (run `bmt init` first)",
                options.project_root.display()
            );
            return Ok(ExitCode::FAILURE);
        }
        Err(err @ LoadError::Malformed { .. }) => {
            eprintln!("bmt: {err}");
            return Ok(ExitCode::FAILURE);
        }
        Err(err @ LoadError::Io { .. }) => {
            eprintln!("bmt: {err}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let discovery = discover::run(options.project_root.clone(), options.no_gitignore, &options.ignore_patterns);
    project_state.discovered_mods = discovery.mods;
    project_state.last_scan_milliseconds = discovery.scanned_at_milliseconds;

    state::save(&options.project_root, &project_state)
        .context("could not persist updated project state")?;

    report::summary("found", project_state.discovered_mods.len());
    report::mod_list(&project_state.discovered_mods);
    Ok(ExitCode::SUCCESS)
}

