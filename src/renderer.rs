use crate::importer::{ComposerMessage, MessageRole};
use chrono::{DateTime, Local, Utc};
use std::io::Write;

/// Label shown next to assistant turns.
pub const COMPOSER_MODEL: &str = "composer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Ai,
}

/// One turn of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub speaker: Speaker,
    pub text: Option<String>,
    /// Model or source label for assistant turns.
    pub model_type: Option<String>,
    /// Quoted code, one fence each.
    pub selections: Vec<String>,
}

impl Bubble {
    pub fn from_message(msg: &ComposerMessage) -> Self {
        Self {
            speaker: match msg.role() {
                MessageRole::User => Speaker::User,
                MessageRole::Assistant => Speaker::Ai,
            },
            text: msg.display_text().map(str::to_string),
            model_type: Some(COMPOSER_MODEL.to_string()),
            selections: msg.code_selections().map(str::to_string).collect(),
        }
    }
}

/// A conversation ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub id: String,
    pub title: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub bubbles: Vec<Bubble>,
}

impl Transcript {
    fn heading(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.id)
    }
}

pub fn write_transcript_markdown<W: Write>(
    writer: &mut W,
    transcript: &Transcript,
) -> std::io::Result<()> {
    writeln!(writer, "# {}", transcript.heading())?;
    writeln!(writer)?;
    writeln!(
        writer,
        "_Created: {}_",
        transcript
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(writer)?;
    writeln!(writer, "---")?;
    writeln!(writer)?;

    for bubble in &transcript.bubbles {
        match (bubble.speaker, bubble.model_type.as_deref()) {
            (Speaker::User, _) => writeln!(writer, "### User")?,
            (Speaker::Ai, Some(model)) => writeln!(writer, "### AI ({model})")?,
            (Speaker::Ai, None) => writeln!(writer, "### AI")?,
        }
        writeln!(writer)?;

        if !bubble.selections.is_empty() {
            writeln!(writer, "**Selected Code:**")?;
            writeln!(writer)?;
            for selection in &bubble.selections {
                writeln!(writer, "```")?;
                writeln!(writer, "{selection}")?;
                writeln!(writer, "```")?;
                writeln!(writer)?;
            }
        }

        if let Some(text) = bubble.text.as_deref().filter(|t| !t.is_empty()) {
            writeln!(writer, "{text}")?;
            writeln!(writer)?;
        }

        writeln!(writer, "---")?;
        writeln!(writer)?;
    }

    Ok(())
}

/// Render a transcript into a string.
pub fn render_markdown(transcript: &Transcript) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_transcript_markdown(&mut buf, transcript);
    String::from_utf8_lossy(&buf).into_owned()
}
