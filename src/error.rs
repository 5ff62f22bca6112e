use std::path::PathBuf;

/// Failure kinds surfaced by the exporter.
///
/// Only `UnsupportedPlatform` and `WorkspaceRootNotFound` abort a run. The
/// remaining kinds are logged (or shown to the user) by the caller that
/// produced them, and the run carries on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error(
        "Workspace path not found: {}. Please set WORKSPACE_PATH environment variable to the correct path.",
        .0.display()
    )]
    WorkspaceRootNotFound(PathBuf),

    #[error("Failed to read composer data from {}: {reason}", .path.display())]
    StoreReadFailure { path: PathBuf, reason: String },

    #[error("No workspace.json found at {}", .0.display())]
    MissingDescriptor(PathBuf),

    #[error("Invalid selection. Please enter a number between 1 and {max}")]
    InvalidSelection { max: usize },

    #[error("Invalid filename. Please use only letters, numbers, dash, underscore, and dot.")]
    InvalidFilename,
}
