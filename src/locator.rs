use crate::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path of the workspace storage below the editor's per-user data directory.
const WORKSPACE_STORAGE: [&str; 3] = ["Cursor", "User", "workspaceStorage"];

/// Entries of the host's users directory that never belong to a person.
const SYSTEM_USER_DIRS: [&str; 5] = [
    "Public",
    "Default",
    "Default User",
    "All Users",
    "desktop.ini",
];

/// Process-level facts the locator depends on, captured once at startup.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system identifier, as in [`std::env::consts::OS`].
    pub os: String,
    pub home_dir: Option<PathBuf>,
    /// Per-user config directory (`$XDG_CONFIG_HOME` or `~/.config` on Linux).
    pub config_dir: Option<PathBuf>,
    /// Kernel version string file, inspected for a WSL marker.
    pub proc_version: PathBuf,
    /// Where the Windows host's user profiles are mounted under WSL.
    pub host_users_dir: PathBuf,
}

impl Platform {
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            home_dir: dirs::home_dir(),
            config_dir: dirs::config_dir(),
            proc_version: PathBuf::from("/proc/version"),
            host_users_dir: PathBuf::from("/mnt/c/Users"),
        }
    }
}

fn storage_under(base: PathBuf) -> PathBuf {
    WORKSPACE_STORAGE.iter().fold(base, |p, part| p.join(part))
}

/// The platform's default workspace storage directory. Existence is not checked.
pub fn default_workspace_root(platform: &Platform) -> Result<PathBuf, Error> {
    let home = platform.home_dir.clone().unwrap_or_default();
    match platform.os.as_str() {
        "windows" => Ok(storage_under(home.join("AppData").join("Roaming"))),
        "macos" => Ok(storage_under(home.join("Library").join("Application Support"))),
        "linux" => {
            if let Some(host_home) = wsl_host_home(&platform.proc_version, &platform.host_users_dir)
            {
                return Ok(storage_under(host_home.join("AppData").join("Roaming")));
            }
            let config = platform
                .config_dir
                .clone()
                .unwrap_or_else(|| home.join(".config"));
            Ok(storage_under(config))
        }
        other => Err(Error::UnsupportedPlatform(other.to_string())),
    }
}

/// Under WSL, the first real user profile on the Windows host. Any failure
/// along the way means "not WSL" and yields `None`.
fn wsl_host_home(proc_version: &Path, users_dir: &Path) -> Option<PathBuf> {
    let version = match fs::read_to_string(proc_version) {
        Ok(v) => v,
        Err(e) => {
            debug!("WSL detection failed, using Linux path: {e}");
            return None;
        }
    };
    if !version.to_lowercase().contains("microsoft") {
        return None;
    }

    let entries = match fs::read_dir(users_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("WSL detected but {} is unreadable: {e}", users_dir.display());
            return None;
        }
    };
    let mut names: Vec<String> = entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| !SYSTEM_USER_DIRS.contains(&name.as_str()))
        .collect();
    names.sort();

    let user = names.into_iter().next()?;
    debug!("WSL detected, using Windows user {user}");
    Some(users_dir.join(user))
}

/// Resolve the workspace root: an explicit override wins over the platform
/// default. The result must exist.
pub fn resolve_workspace_root(
    override_path: Option<PathBuf>,
    platform: &Platform,
) -> Result<PathBuf, Error> {
    let root = match override_path {
        Some(p) => p,
        None => default_workspace_root(platform)?,
    };
    if !root.exists() {
        return Err(Error::WorkspaceRootNotFound(root));
    }
    Ok(root)
}
