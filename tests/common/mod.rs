//! Shared fixture builder: a fake workspace storage tree with real SQLite stores.
#![allow(dead_code)]

use rusqlite::Connection;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Storage {
    pub dir: TempDir,
}

impl Storage {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("workspaceStorage")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("workspaceStorage")
    }

    pub fn workspace_db(&self, id: &str) -> PathBuf {
        self.root().join(id).join("state.vscdb")
    }

    /// A workspace store with an `ItemTable`, optionally holding composer data.
    pub fn add_workspace(&self, id: &str, folder: Option<&str>, composer_data: Option<&str>) {
        let ws = self.root().join(id);
        fs::create_dir_all(&ws).unwrap();
        if let Some(folder) = folder {
            fs::write(
                ws.join("workspace.json"),
                json!({ "folder": folder }).to_string(),
            )
            .unwrap();
        }
        let conn = Connection::open(ws.join("state.vscdb")).unwrap();
        create_kv_table(&conn, "ItemTable");
        if let Some(data) = composer_data {
            put(&conn, "ItemTable", "composer.composerData", data);
        }
    }

    /// The global store with a `cursorDiskKV` table.
    pub fn add_global(&self, entries: &[(&str, &str)]) {
        let global = self.dir.path().join("globalStorage");
        fs::create_dir_all(&global).unwrap();
        let conn = Connection::open(global.join("state.vscdb")).unwrap();
        create_kv_table(&conn, "cursorDiskKV");
        for (key, value) in entries {
            put(&conn, "cursorDiskKV", key, value);
        }
    }
}

fn create_kv_table(conn: &Connection, table: &str) {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB);"
    ))
    .unwrap();
}

fn put(conn: &Connection, table: &str, key: &str, value: &str) {
    conn.execute(
        &format!("INSERT INTO {table} (key, value) VALUES (?1, ?2)"),
        [key, value],
    )
    .unwrap();
}

pub fn message(kind: i64, text: &str) -> Value {
    json!({ "type": kind, "bubbleId": format!("b-{text}"), "text": text, "richText": "" })
}

pub fn composer(
    id: &str,
    name: &str,
    updated: Option<i64>,
    conversation: Option<Vec<Value>>,
) -> Value {
    let mut c = json!({
        "composerId": id,
        "name": name,
        "createdAt": 1_000,
        "lastUpdatedAt": updated,
    });
    if let Some(conversation) = conversation {
        c["conversation"] = Value::Array(conversation);
    }
    c
}

pub fn composer_data(composers: Vec<Value>) -> String {
    json!({
        "allComposers": composers,
        "selectedComposerId": null,
        "composerDataVersion": 1,
    })
    .to_string()
}

pub fn md_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return vec![];
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "md"))
        .collect();
    files.sort();
    files
}
