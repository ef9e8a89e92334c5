//! Command-line argument parsing, built directly on `lexopt` rather than a
//! declarative derive framework: bmt's surface is two subcommands with a
//! handful of repeatable flags, which a hand-rolled loop handles plainly.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use lexopt::{Arg, Parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Init,
    FindMods,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub command: Command,
    pub no_gitignore: bool,
    pub ignore_patterns: Vec<String>,
    pub verbose: u8,
    pub project_root: PathBuf,
}

pub fn parse(project_root: PathBuf) -> Result<Options> {
    let mut args = Parser::from_env();

    let command = match args.next().context("missing subcommand")? {
        Some(Arg::Value(v)) => match v.to_str() {
            Some("init") => Command::Init,
            Some("find-mods") => Command::FindMods,
            Some(other) => bail!("unrecognized subcommand '{other}' (expected init or find-mods)"),
            None => bail!("subcommand is not valid UTF-8"),
        },
        Some(_) => bail!("expected a subcommand, got a flag"),
        None => bail!("missing subcommand (expected init or find-mods)"),
    };

    let mut no_gitignore = false;
    let mut ignore_patterns = Vec::new();
    let mut verbose: u8 = 0;

    while let Some(arg) = args.next()? {
        match arg {
            Arg::Long("no-gitignore") => no_gitignore = true,
            Arg::Long("ignore") => {
                let value = args.value().context("--ignore requires a PATTERN argument")?;
                ignore_patterns.push(value.to_string_lossy().into_owned());
            }
            Arg::Short('v') | Arg::Long("verbose") => verbose = verbose.saturating_add(1),
            Arg::Long("help") => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(other.unexpected().into()),
        }
    }

    Ok(Options { command, no_gitignore, ignore_patterns, verbose, project_root })
}

fn print_usage() {
    println!(
        "usage: bmt <init|find-mods> [--no-gitignore] [--ignore PATTERN]... [-v|--verbose]"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_variants_are_distinct() {
        assert_ne!(Command::Init, Command::FindMods);
    }
}
