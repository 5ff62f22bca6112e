use crate::error::Error;
use crate::importer::{
    COMPOSER_DATA_KEY, ComposerChat, ComposerData, STATE_DB_FILE, WORKSPACE_DESCRIPTOR_FILE,
    WorkspaceDescriptor, detail_key,
};
use crate::utils::{open_store, read_value};
use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const WORKSPACE_TABLE: &str = "ItemTable";
const GLOBAL_TABLE: &str = "cursorDiskKV";
const GLOBAL_STORAGE_DIR: &str = "globalStorage";

/// A composer summary together with the workspace it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceComposer {
    pub chat: ComposerChat,
    pub workspace_id: String,
    /// Folder URI from `workspace.json`, when the descriptor exists.
    pub workspace_folder: Option<String>,
}

impl WorkspaceComposer {
    /// Path of the store this composer was read from.
    pub fn db_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.workspace_id).join(STATE_DB_FILE)
    }
}

/// Collect every composer from every workspace under `workspace_root`, most
/// recently updated first.
///
/// Workspaces without a store are skipped silently; unreadable or malformed
/// stores are logged and skipped.
pub fn get_composers(workspace_root: &Path) -> Result<Vec<WorkspaceComposer>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(workspace_root)
        .wrap_err_with(|| format!("Failed to list workspaces in {}", workspace_root.display()))?
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    dirs.sort();

    let mut composers = Vec::new();
    for dir in dirs {
        let db_path = dir.join(STATE_DB_FILE);
        if !db_path.exists() {
            continue;
        }
        let workspace_id = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let workspace_folder = match read_descriptor(&dir) {
            Ok(folder) => folder,
            Err(e) => {
                debug!("{e}");
                None
            }
        };

        let data = match read_composer_data(&db_path) {
            Ok(Some(data)) => data,
            Ok(None) => continue,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        composers.extend(data.all_composers.into_iter().map(|chat| WorkspaceComposer {
            chat,
            workspace_id: workspace_id.clone(),
            workspace_folder: workspace_folder.clone(),
        }));
    }

    sort_by_last_updated(&mut composers);
    Ok(composers)
}

/// Stable sort, newest first. A missing `lastUpdatedAt` counts as 0.
pub fn sort_by_last_updated(composers: &mut [WorkspaceComposer]) {
    composers.sort_by_key(|c| std::cmp::Reverse(c.chat.last_updated_at.unwrap_or(0)));
}

/// The `folder` named by a workspace's descriptor.
fn read_descriptor(workspace_dir: &Path) -> Result<Option<String>, Error> {
    let path = workspace_dir.join(WORKSPACE_DESCRIPTOR_FILE);
    let content = fs::read_to_string(&path).map_err(|_| Error::MissingDescriptor(path.clone()))?;
    let descriptor: WorkspaceDescriptor =
        serde_json::from_str(&content).map_err(|_| Error::MissingDescriptor(path))?;
    Ok(descriptor.folder)
}

/// Read and parse the summary record of a workspace store. `Ok(None)` when the
/// store has no composer data at all.
///
/// The connection is dropped, and so closed, before returning on every path.
fn read_composer_data(db_path: &Path) -> Result<Option<ComposerData>, Error> {
    let failure = |reason: String| Error::StoreReadFailure {
        path: db_path.to_path_buf(),
        reason,
    };

    let raw = {
        let conn = open_store(db_path).map_err(|e| failure(format!("{e:#}")))?;
        read_value(&conn, WORKSPACE_TABLE, COMPOSER_DATA_KEY)
            .map_err(|e| failure(format!("{e:#}")))?
    };

    match raw {
        None => Ok(None),
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| failure(e.to_string())),
    }
}

/// Location of the global store for a workspace store at `workspace_db`:
/// `<workspace root>/../globalStorage/state.vscdb`.
pub fn global_store_path(workspace_db: &Path) -> Option<PathBuf> {
    let workspace_root = workspace_db.parent()?.parent()?;
    let storage_parent = workspace_root.parent()?;
    Some(storage_parent.join(GLOBAL_STORAGE_DIR).join(STATE_DB_FILE))
}

/// Look up the full conversation of a composer.
///
/// The workspace summary must still list composer data. The detail record in
/// the global store wins when present; otherwise the summary entry with the
/// same id is returned. `None` when neither has it.
pub fn get_composer_details(db_path: &Path, composer_id: &str) -> Result<Option<ComposerChat>> {
    let summary_raw = {
        let conn = open_store(db_path)?;
        read_value(&conn, WORKSPACE_TABLE, COMPOSER_DATA_KEY)?
    };
    let Some(summary_raw) = summary_raw else {
        debug!("No composer data left in {}", db_path.display());
        return Ok(None);
    };

    if let Some(global_db) = global_store_path(db_path).filter(|p| p.exists()) {
        let key = detail_key(composer_id);
        debug!("globalDbPath: {}", global_db.display());
        debug!("{GLOBAL_TABLE} key: {key}");
        match read_detail(&global_db, &key, composer_id) {
            Ok(Some(detail)) => return Ok(Some(detail)),
            Ok(None) => debug!("No detail record for {composer_id}, using summary"),
            Err(e) => warn!("{e:#}"),
        }
    }

    let summary: ComposerData = match serde_json::from_slice(&summary_raw) {
        Ok(data) => data,
        Err(e) => {
            warn!(
                "{}",
                Error::StoreReadFailure {
                    path: db_path.to_path_buf(),
                    reason: e.to_string(),
                }
            );
            return Ok(None);
        }
    };
    Ok(summary.find(composer_id).cloned())
}

/// The detail record is keyed by composer id, so the value itself may omit
/// `composerId`; it is filled in from the key before decoding.
fn read_detail(global_db: &Path, key: &str, composer_id: &str) -> Result<Option<ComposerChat>> {
    let raw = {
        let conn = open_store(global_db)?;
        read_value(&conn, GLOBAL_TABLE, key)?
    };
    let Some(bytes) = raw else {
        return Ok(None);
    };
    let store_error = |e: serde_json::Error| {
        eyre::Report::from(Error::StoreReadFailure {
            path: global_db.to_path_buf(),
            reason: e.to_string(),
        })
    };
    let mut value: serde_json::Value = serde_json::from_slice(&bytes).map_err(store_error)?;
    if let Some(record) = value.as_object_mut() {
        record
            .entry("composerId")
            .or_insert_with(|| serde_json::Value::from(composer_id));
    }
    serde_json::from_value(value).map(Some).map_err(store_error)
}
