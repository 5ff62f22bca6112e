//! Pre-commit hook management. The exporter owns a block of lines inside the
//! hook script, delimited by two sentinel comments, and never touches the rest.

use eyre::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const DEFAULT_HOOK_FILE: &str = ".husky/pre-commit";
pub const HOOK_START: &str = "# Cursor Composer Export Start";
pub const HOOK_END: &str = "# Cursor Composer Export End";

/// Command the hook runs; the binary's own name.
const EXPORT_COMMAND: &str = env!("CARGO_PKG_NAME");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    AlreadyInstalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    HookNotFound,
    SentinelNotFound,
}

/// The managed block: create the output directory, export non-interactively,
/// and stage the result.
pub fn hook_block(output_dir: &str) -> String {
    let dir = shell_quote(output_dir);
    format!(
        "{HOOK_START}
# Ensure output directory exists
mkdir -p {dir}

# Export with default settings to specified path
{EXPORT_COMMAND} {dir} --default

# Add all exported files (including hidden files)
git add -f {dir}/.
{HOOK_END}"
    )
}

/// Single-quote `s` for POSIX sh. Nothing inside single quotes is expanded;
/// an embedded `'` is written as `'\''`.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn read_existing(hook_file: &Path) -> Result<Option<String>> {
    match fs::read_to_string(hook_file) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).wrap_err_with(|| format!("Failed to read {}", hook_file.display())),
    }
}

/// Append the managed block to `hook_file`, creating it if needed, and make it
/// executable. A file that already carries the start sentinel is left alone.
pub fn install_hook(hook_file: &Path, output_dir: &str) -> Result<InstallOutcome> {
    let existing = read_existing(hook_file)?.unwrap_or_default();
    if existing.contains(HOOK_START) {
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    if let Some(parent) = hook_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }

    let block = hook_block(output_dir);
    let kept = existing.trim_end();
    let content = if kept.is_empty() {
        format!("{block}\n")
    } else {
        format!("{kept}\n\n{block}\n")
    };
    fs::write(hook_file, content)
        .wrap_err_with(|| format!("Failed to write {}", hook_file.display()))?;
    make_executable(hook_file)?;
    Ok(InstallOutcome::Installed)
}

/// Delete the managed block (sentinels included) from `hook_file`.
pub fn remove_hook(hook_file: &Path) -> Result<RemoveOutcome> {
    let Some(existing) = read_existing(hook_file)? else {
        return Ok(RemoveOutcome::HookNotFound);
    };

    let lines: Vec<&str> = existing.lines().collect();
    let start = lines.iter().position(|l| l.contains(HOOK_START));
    let end = lines.iter().position(|l| l.contains(HOOK_END));
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(RemoveOutcome::SentinelNotFound);
    };
    if end < start {
        return Ok(RemoveOutcome::SentinelNotFound);
    }

    let remaining = [&lines[..start], &lines[end + 1..]].concat().join("\n");
    let remaining = remaining.trim();
    let content = if remaining.is_empty() {
        String::new()
    } else {
        format!("{remaining}\n")
    };
    fs::write(hook_file, content)
        .wrap_err_with(|| format!("Failed to write {}", hook_file.display()))?;
    Ok(RemoveOutcome::Removed)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .wrap_err_with(|| format!("Failed to stat {}", path.display()))?
        .permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms)
        .wrap_err_with(|| format!("Failed to chmod {}", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
