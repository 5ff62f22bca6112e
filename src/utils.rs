use chrono::{DateTime, Local, TimeZone, Utc};
use eyre::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};

/// Configuration required to run the export process.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory offered as (or, with `use_defaults`, used as) the output location.
    pub output_dir: PathBuf,
    /// Root holding one subdirectory per workspace.
    pub workspace_root: PathBuf,
    /// Skip every prompt and pick the most recent project and conversation.
    pub use_defaults: bool,
    /// Name of the directory the tool was started from, used to preselect a project.
    pub current_dir_name: Option<String>,
}

/// Open a state database read-only. The editor may be running, so we never write.
pub fn open_store(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .wrap_err_with(|| format!("Failed to open database: {}", path.display()))
}

/// Fetch the value stored under `key` in a key-value `table`.
///
/// The column is declared `BLOB` but usually holds text, so both storage
/// classes are accepted. `NULL` and other types read as missing.
pub fn read_value(conn: &Connection, table: &str, key: &str) -> Result<Option<Vec<u8>>> {
    let sql = format!("SELECT value FROM {table} WHERE [key] = ?1");
    conn.query_row(&sql, [key], |row| {
        Ok(match row.get_ref(0)? {
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(bytes.to_vec()),
            _ => None,
        })
    })
    .optional()
    .wrap_err_with(|| format!("Failed to query {table} for key {key}"))
    .map(Option::flatten)
}

/// Convert epoch milliseconds to a UTC timestamp.
pub fn millis_to_utc(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Epoch milliseconds as a UTC timestamp, with the current time standing in
/// for a missing (zero) value.
pub fn millis_or_now(millis: i64) -> DateTime<Utc> {
    if millis == 0 {
        return Utc::now();
    }
    millis_to_utc(millis).unwrap_or_else(Utc::now)
}

/// `YYYYMMDD_HHMM` in local time, as used in default filenames.
pub fn file_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y%m%d_%H%M").to_string()
}

/// Human-readable local date for listings.
pub fn display_date(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_value_accepts_text_and_blob() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.vscdb");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE ItemTable (key TEXT UNIQUE, value BLOB);")
                .unwrap();
            conn.execute(
                "INSERT INTO ItemTable (key, value) VALUES ('t', '{\"a\":1}')",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO ItemTable (key, value) VALUES ('b', ?1)",
                [b"{\"b\":2}".to_vec()],
            )
            .unwrap();
            conn.execute("INSERT INTO ItemTable (key, value) VALUES ('n', NULL)", [])
                .unwrap();
        }

        let conn = open_store(&path).unwrap();
        assert_eq!(
            read_value(&conn, "ItemTable", "t").unwrap().as_deref(),
            Some(&b"{\"a\":1}"[..])
        );
        assert_eq!(
            read_value(&conn, "ItemTable", "b").unwrap().as_deref(),
            Some(&b"{\"b\":2}"[..])
        );
        assert_eq!(read_value(&conn, "ItemTable", "n").unwrap(), None);
        assert_eq!(read_value(&conn, "ItemTable", "missing").unwrap(), None);
        assert!(read_value(&conn, "NoSuchTable", "t").is_err());
    }

    #[test]
    fn file_timestamp_shape() {
        let ts = millis_to_utc(1_704_067_200_000).unwrap();
        let formatted = file_timestamp(ts);
        assert_eq!(formatted.len(), "20240101_0000".len());
        assert_eq!(formatted.as_bytes()[8], b'_');
        assert!(formatted.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn zero_millis_means_now() {
        let before = Utc::now();
        assert!(millis_or_now(0) >= before);
        assert_eq!(
            millis_or_now(1_704_067_200_000).to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
    }
}
