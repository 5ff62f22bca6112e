//! # cursor-composer-export
//!
//! A CLI tool that exports [Cursor](https://cursor.com) composer conversations to
//! local Markdown files.
//!
//! ## What it does
//!
//! Cursor keeps one SQLite state database (`state.vscdb`) per workspace. Each holds a
//! summary of every composer conversation started in that workspace. The full message
//! list usually lives in a second, global database next to the workspace storage. This
//! tool reads both, lets you pick a project and a conversation, and writes that
//! conversation as a Markdown transcript.
//!
//! The databases are opened **read-only**, so your data is never modified.
//!
//! ## Usage
//!
//! ```sh
//! # Pick a project and a conversation interactively
//! cursor-composer-export ~/notes/composer-logs
//!
//! # Export the most recent conversation of the current project without prompting
//! cursor-composer-export .composer-logs --default
//!
//! # Run the export on every commit
//! cursor-composer-export hook install
//! ```
//!
//! Set `WORKSPACE_PATH` (or `--workspace-path`) when the workspace storage is not in its
//! usual place. Preferences can be persisted in
//! `~/.config/cursor-composer-export/config.toml`.

pub mod collector;
pub mod error;
pub mod hooks;
pub mod importer;
pub mod locator;
pub mod projects;
pub mod prompt;
pub mod renderer;
pub mod sequential;
pub mod utils;
