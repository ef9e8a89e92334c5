//! Prints discovery results to stdout, coloring the summary line the way
//! `rg` colors its own match counts — green on success, the rest plain.

use std::io::Write;
use std::path::Path;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::state::DiscoveredMod;

pub fn summary(verb: &str, count: usize) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut green = ColorSpec::new();
    green.set_fg(Some(Color::Green)).set_bold(true);

    let _ = stdout.set_color(&green);
    let _ = write!(stdout, "{verb}");
    let _ = stdout.reset();
    let _ = writeln!(stdout, " {count} mod(s)");
}

pub fn mod_list(mods: &[DiscoveredMod]) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut dim = ColorSpec::new();
    dim.set_fg(Some(Color::Cyan));

    for m in mods {
        let _ = stdout.set_color(&dim);
        let _ = write!(stdout, "  {}", m.name);
        let _ = stdout.reset();
        let _ = writeln!(stdout, " ({})", display_path(&m.manifest_path));
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
