use crate::collector::WorkspaceComposer;
use crate::importer::ComposerChat;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Bucket for composers whose workspace has no folder descriptor.
pub const UNKNOWN_PROJECT: &str = "unknown-project";

const SUMMARY_MAX_CHARS: usize = 50;

/// Project name of a workspace folder: its last path segment, split on either
/// slash style.
pub fn project_name_from_folder(folder: Option<&str>) -> String {
    folder
        .and_then(|f| f.split(['/', '\\']).rev().find(|s| !s.is_empty()))
        .unwrap_or(UNKNOWN_PROJECT)
        .to_string()
}

pub fn project_name(composer: &WorkspaceComposer) -> String {
    project_name_from_folder(composer.workspace_folder.as_deref())
}

/// All composers of one project, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectGroup {
    pub name: String,
    /// Most recent `lastUpdatedAt`/`createdAt` among the composers.
    pub latest: i64,
    pub composers: Vec<WorkspaceComposer>,
}

/// Partition composers by project name. Every composer lands in exactly one group.
pub fn group_by_project(
    composers: impl IntoIterator<Item = WorkspaceComposer>,
) -> BTreeMap<String, Vec<WorkspaceComposer>> {
    let mut groups: BTreeMap<String, Vec<WorkspaceComposer>> = BTreeMap::new();
    for composer in composers {
        groups.entry(project_name(&composer)).or_default().push(composer);
    }
    groups
}

/// Order projects by their most recent composer, newest first, and sort each
/// project's composers the same way.
pub fn rank_projects(groups: BTreeMap<String, Vec<WorkspaceComposer>>) -> Vec<ProjectGroup> {
    let mut ranked: Vec<ProjectGroup> = groups
        .into_iter()
        .map(|(name, mut composers)| {
            composers.sort_by_key(|c| std::cmp::Reverse(c.chat.recency()));
            let latest = composers.iter().map(|c| c.chat.recency()).max().unwrap_or(0);
            ProjectGroup {
                name,
                latest,
                composers,
            }
        })
        .collect();
    ranked.sort_by_key(|p| std::cmp::Reverse(p.latest));
    ranked
}

/// Index of the project named like the current directory, if any.
pub fn current_dir_project(
    projects: &[ProjectGroup],
    current_dir_name: Option<&str>,
) -> Option<usize> {
    let current = current_dir_name?;
    projects.iter().position(|p| p.name == current)
}

/// One-line description of a composer for listings: its name, or its text,
/// first line only, cut to 50 characters.
pub fn log_summary(chat: &ComposerChat) -> String {
    let text = chat
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .or(chat.text.as_deref())
        .unwrap_or("");
    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.chars().count() > SUMMARY_MAX_CHARS {
        let cut: String = first_line.chars().take(SUMMARY_MAX_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        first_line.to_string()
    }
}

/// Characters accepted in an output filename.
pub fn is_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// `<project>_<YYYYMMDD_HHMM>.md`, with characters a filename may not hold
/// replaced by `-`.
pub fn default_filename(project: &str, ts: DateTime<Utc>) -> String {
    let project: String = project
        .chars()
        .map(|c| if is_filename_char(c) { c } else { '-' })
        .collect();
    format!("{project}_{}.md", crate::utils::file_timestamp(ts))
}
