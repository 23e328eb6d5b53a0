//! Rendering of resolution results for the command line.
//!
//! Output is often piped into `head` or `less`; a closed pipe ends output
//! quietly instead of surfacing as an error.

use colored::*;
use std::io::{self, Write};

use crate::provider::{ContentEntry, Contents, EntryKind};
use crate::walk::{ProviderCall, Resolved};

/// Write lines to stdout, stopping silently on BrokenPipe
pub fn write_lines<I>(lines: I) -> io::Result<()>
where
    I: IntoIterator<Item = String>,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        match writeln!(out, "{}", line) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
            Err(e) => return Err(e),
        }
    }
    match out.flush() {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// One listing line, styled by entry type
pub fn entry_line(entry: &ContentEntry) -> String {
    match entry.kind {
        EntryKind::Dir => format!("{}/", entry.name).blue().bold().to_string(),
        EntryKind::Submodule => {
            let target = entry.submodule_git_url.as_deref().unwrap_or("?");
            format!("{}@ -> {}", entry.name.cyan().bold(), target)
        }
        EntryKind::Symlink => entry.name.magenta().to_string(),
        EntryKind::File => entry.name.clone(),
    }
}

/// Lines to print for a resolved path: file content, or one line per entry
pub fn resolved_lines(resolved: &Resolved) -> Vec<String> {
    match &resolved.contents {
        Contents::File(file) => file
            .content
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect(),
        Contents::Dir(entries) => entries.iter().map(entry_line).collect(),
    }
}

/// One line of the provider call trace
pub fn call_line(call: &ProviderCall) -> String {
    let status = match call.status {
        Some(status) if status < 400 => status.to_string().green(),
        Some(status) => status.to_string().red(),
        None => "---".yellow(),
    };
    let path = if call.path.is_empty() { "/" } else { call.path.as_str() };
    format!("{} {}:{} ({:?})", status, call.repo, path, call.duration)
}
