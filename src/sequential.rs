use crate::collector::{WorkspaceComposer, get_composer_details, get_composers};
use crate::projects::{
    ProjectGroup, current_dir_project, default_filename, group_by_project, log_summary,
    project_name, rank_projects,
};
use crate::prompt::{Answer, Prompter};
use crate::renderer::{Bubble, Transcript, write_transcript_markdown};
use crate::utils::{ExportConfig, display_date, millis_or_now};
use chrono::Utc;
use eyre::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Conversations offered in the second selection stage.
const MAX_LISTED_CONVERSATIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The transcript was written to this path.
    Written(PathBuf),
    /// The user quit at a prompt; nothing was written.
    Cancelled,
    /// No workspace holds any composer.
    NothingToExport,
}

/// The main entry point for the export: locate, select, resolve, render, write.
///
/// Prompts and the final confirmation go through `prompter`; with
/// `config.use_defaults` nothing is asked and only the written path is printed.
pub fn execute<R: BufRead, W: Write>(
    config: &ExportConfig,
    prompter: &mut Prompter<R, W>,
) -> Result<ExportOutcome> {
    let output_dir = if config.use_defaults {
        fs::create_dir_all(&config.output_dir).wrap_err_with(|| {
            format!(
                "Failed to create output directory: {}",
                config.output_dir.display()
            )
        })?;
        config.output_dir.clone()
    } else {
        match prompter.directory(&config.output_dir.to_string_lossy())? {
            Answer::Value(dir) => dir,
            Answer::Quit => return Ok(ExportOutcome::Cancelled),
        }
    };

    let composers = get_composers(&config.workspace_root)?;
    if composers.is_empty() {
        warn!(
            "No composer conversations found under {}",
            config.workspace_root.display()
        );
        return Ok(ExportOutcome::NothingToExport);
    }
    debug!("Found {} composers", composers.len());

    let projects = rank_projects(group_by_project(composers));
    let Answer::Value(project) = select_project(config, &projects, prompter)? else {
        return Ok(ExportOutcome::Cancelled);
    };
    let Answer::Value(selected) = select_conversation(config, project, prompter)? else {
        return Ok(ExportOutcome::Cancelled);
    };

    let filename = if config.use_defaults {
        default_filename(&project.name, Utc::now())
    } else {
        let default = default_filename(&project.name, millis_or_now(selected.chat.recency()));
        match prompter.filename(&default)? {
            Answer::Value(name) => name,
            Answer::Quit => return Ok(ExportOutcome::Cancelled),
        }
    };

    let transcript = build_transcript(config, selected)?;
    let full_path = output_dir.join(&filename);
    write_transcript(&full_path, &transcript)?;
    info!(
        "Wrote {} messages of {} to {}",
        transcript.bubbles.len(),
        transcript.id,
        full_path.display()
    );

    let out = prompter.output();
    if config.use_defaults {
        writeln!(out, "{}", full_path.display())?;
    } else {
        writeln!(out, "\nExported to: {}", full_path.display())?;
    }
    out.flush()?;

    Ok(ExportOutcome::Written(full_path))
}

/// First stage: choose a project. Defaults to the project named like the
/// current directory, else the most recent one.
fn select_project<'a, R: BufRead, W: Write>(
    config: &ExportConfig,
    projects: &'a [ProjectGroup],
    prompter: &mut Prompter<R, W>,
) -> Result<Answer<&'a ProjectGroup>> {
    let current = current_dir_project(projects, config.current_dir_name.as_deref());
    let default = current.unwrap_or(0);

    if config.use_defaults {
        return Ok(Answer::Value(&projects[default]));
    }

    let out = prompter.output();
    writeln!(out, "\nAvailable Projects:")?;
    for (i, p) in projects.iter().enumerate() {
        writeln!(
            out,
            "{}. {} (last updated: {})",
            i + 1,
            p.name,
            display_date(millis_or_now(p.latest))
        )?;
    }

    let question = match current {
        Some(i) => format!(
            "\nSelect a project (1-{}) [default {} - {}] or q to quit: ",
            projects.len(),
            i + 1,
            projects[i].name
        ),
        None => format!(
            "\nSelect a project (1-{}) [default 1] or q to quit: ",
            projects.len()
        ),
    };
    Ok(match prompter.select(&question, default + 1, projects.len())? {
        Answer::Value(i) => Answer::Value(&projects[i]),
        Answer::Quit => Answer::Quit,
    })
}

/// Second stage: choose one of the project's ten most recent conversations.
fn select_conversation<'a, R: BufRead, W: Write>(
    config: &ExportConfig,
    project: &'a ProjectGroup,
    prompter: &mut Prompter<R, W>,
) -> Result<Answer<&'a WorkspaceComposer>> {
    let listed = &project.composers[..project.composers.len().min(MAX_LISTED_CONVERSATIONS)];

    if config.use_defaults {
        return Ok(Answer::Value(&listed[0]));
    }

    let out = prompter.output();
    writeln!(out, "\nRecent Composer Logs:")?;
    for (i, composer) in listed.iter().enumerate() {
        writeln!(
            out,
            "{}. [{}] [{}] {}",
            i + 1,
            display_date(millis_or_now(composer.chat.recency())),
            project_name(composer),
            log_summary(&composer.chat)
        )?;
    }

    let question = format!(
        "\nSelect a log number (1-{}) [default 1] or q to quit: ",
        listed.len()
    );
    Ok(match prompter.select(&question, 1, listed.len())? {
        Answer::Value(i) => Answer::Value(&listed[i]),
        Answer::Quit => Answer::Quit,
    })
}

/// Resolve the full conversation of `selected` and normalise it for rendering.
/// The detail record's messages win over the summary's.
fn build_transcript(config: &ExportConfig, selected: &WorkspaceComposer) -> Result<Transcript> {
    let db_path = selected.db_path(&config.workspace_root);
    let details = get_composer_details(&db_path, &selected.chat.composer_id)?;

    let messages = details
        .as_ref()
        .and_then(|d| d.conversation.as_ref())
        .or(selected.chat.conversation.as_ref());

    Ok(Transcript {
        id: selected.chat.composer_id.clone(),
        title: selected.chat.name.clone().filter(|n| !n.is_empty()),
        timestamp: millis_or_now(selected.chat.recency()),
        bubbles: messages
            .map(|msgs| msgs.iter().map(Bubble::from_message).collect())
            .unwrap_or_default(),
    })
}

fn write_transcript(path: &std::path::Path, transcript: &Transcript) -> Result<()> {
    let file =
        File::create(path).wrap_err_with(|| format!("Failed to create: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_transcript_markdown(&mut writer, transcript)
        .wrap_err("Failed to write transcript markdown")?;
    writer.flush().wrap_err("Failed to flush markdown file")?;
    Ok(())
}
