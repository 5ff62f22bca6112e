/// Type definitions for the editor's workspace and global state databases.
///
/// Both stores are plain SQLite key-value tables holding JSON text:
///
/// ```sql
/// -- <workspaceStorage>/<workspace id>/state.vscdb
/// CREATE TABLE ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB);
///
/// -- <workspaceStorage>/../globalStorage/state.vscdb
/// CREATE TABLE cursorDiskKV (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB);
/// ```
///
/// The workspace store keeps one summary record for every composer under
/// [`COMPOSER_DATA_KEY`]. The global store keeps the full conversation of a
/// composer under `composerData:<composerId>`.
///
/// Records are written by an application we do not control, so every field
/// that is not needed to identify a record is optional, and list elements that
/// fail to parse are dropped instead of failing the whole record.
use serde::{Deserialize, Deserializer, de::DeserializeOwned};

/// Key in the workspace `ItemTable` holding the [`ComposerData`] summary.
pub const COMPOSER_DATA_KEY: &str = "composer.composerData";

/// Prefix of the keys in the global `cursorDiskKV` table holding a composer's detail.
pub const COMPOSER_DETAIL_PREFIX: &str = "composerData:";

/// Database file name used by both the workspace and the global store.
pub const STATE_DB_FILE: &str = "state.vscdb";

/// Descriptor file written next to the workspace store.
pub const WORKSPACE_DESCRIPTOR_FILE: &str = "workspace.json";

pub fn detail_key(composer_id: &str) -> String {
    format!("{COMPOSER_DETAIL_PREFIX}{composer_id}")
}

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

/// `null`, missing or non-array values become an empty list; elements that do
/// not match `T` are skipped.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient_list(deserializer)?.unwrap_or_default())
}

/// Like [`lenient_vec`] but keeps the distinction between "absent" and "empty".
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// Epoch milliseconds, tolerating floats and nulls.
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))))
}

// ---------------------------------------------------------------------------
// Message context
// ---------------------------------------------------------------------------

/// A quoted code selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodeSelection {
    pub text: String,
}

/// Context attached to a message. Only quoted code is kept; attached files,
/// folders, docs and commits are not rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ComposerContext {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub selections: Vec<CodeSelection>,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Speaker of a message. The store encodes it as a number: `1` is the user,
/// anything else is the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn from_code(code: i64) -> Self {
        if code == 1 { Self::User } else { Self::Assistant }
    }
}

/// One turn of a composer conversation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposerMessage {
    /// Role code, see [`MessageRole::from_code`].
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub rich_text: Option<String>,
    #[serde(default)]
    pub context: Option<ComposerContext>,
}

impl ComposerMessage {
    pub fn role(&self) -> MessageRole {
        MessageRole::from_code(self.kind)
    }

    /// The plain text, or the rich text when the plain text is absent or empty.
    pub fn display_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.rich_text.as_deref().filter(|t| !t.is_empty()))
    }

    /// Quoted code selections attached to this message, in order.
    pub fn code_selections(&self) -> impl Iterator<Item = &str> {
        self.context
            .iter()
            .flat_map(|c| c.selections.iter())
            .map(|s| s.text.as_str())
    }
}

// ---------------------------------------------------------------------------
// Composers
// ---------------------------------------------------------------------------

/// A composer record, as found both in the workspace summary list and as the
/// detail value in the global store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposerChat {
    pub composer_id: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub conversation: Option<Vec<ComposerMessage>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub last_updated_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub created_at: Option<i64>,
}

impl ComposerChat {
    /// `lastUpdatedAt`, else `createdAt`, else 0.
    pub fn recency(&self) -> i64 {
        self.last_updated_at
            .filter(|t| *t != 0)
            .or(self.created_at)
            .unwrap_or(0)
    }
}

/// The value stored under [`COMPOSER_DATA_KEY`] in a workspace store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposerData {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub all_composers: Vec<ComposerChat>,
    #[serde(default)]
    pub selected_composer_id: Option<String>,
    #[serde(default)]
    pub composer_data_version: Option<i64>,
}

impl ComposerData {
    pub fn find(&self, composer_id: &str) -> Option<&ComposerChat> {
        self.all_composers
            .iter()
            .find(|c| c.composer_id == composer_id)
    }
}

/// `workspace.json`, naming the folder the editor had open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorkspaceDescriptor {
    #[serde(default)]
    pub folder: Option<String>,
}
