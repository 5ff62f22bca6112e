//! Line-oriented prompts. One question is outstanding at a time: print it,
//! read a line, validate, and either return or ask again.

use crate::error::Error;
use crate::projects::is_filename_char;
use eyre::{Context, Result};
use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// What the user answered: a validated value, or a request to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer<T> {
    Value(T),
    Quit,
}

fn is_quit(input: &str) -> bool {
    input.eq_ignore_ascii_case("q")
}

/// Parse a 1-based menu choice into a 0-based index. Empty input picks
/// `default` (1-based).
pub fn parse_selection(input: &str, default: usize, max: usize) -> Result<Answer<usize>, Error> {
    let input = input.trim();
    if is_quit(input) {
        return Ok(Answer::Quit);
    }
    let choice = if input.is_empty() {
        default
    } else {
        input
            .parse::<usize>()
            .map_err(|_| Error::InvalidSelection { max })?
    };
    if (1..=max).contains(&choice) {
        Ok(Answer::Value(choice - 1))
    } else {
        Err(Error::InvalidSelection { max })
    }
}

/// Validate an output filename. Empty input picks `default`; `.md` is
/// appended unless the name already ends with it in any case.
pub fn parse_filename(input: &str, default: &str) -> Result<Answer<String>, Error> {
    let input = input.trim();
    if is_quit(input) {
        return Ok(Answer::Quit);
    }
    let mut filename = if input.is_empty() {
        default.to_string()
    } else {
        input.to_string()
    };
    if !filename.to_lowercase().ends_with(".md") {
        filename.push_str(".md");
    }
    let stem_len = filename.len() - ".md".len();
    if stem_len == 0 || !filename.chars().all(is_filename_char) {
        return Err(Error::InvalidFilename);
    }
    Ok(Answer::Value(filename))
}

/// Synchronous request/response loop over any line reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Print `question` and read one line. `None` at end of input.
    pub fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush().wrap_err("Failed to flush prompt")?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .wrap_err("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Ask until `parse` accepts the answer. End of input counts as quitting.
    fn ask_until<T>(
        &mut self,
        question: &str,
        parse: impl Fn(&str) -> Result<Answer<T>, Error>,
    ) -> Result<Answer<T>> {
        loop {
            let Some(line) = self.ask(question)? else {
                return Ok(Answer::Quit);
            };
            match parse(&line) {
                Ok(answer) => return Ok(answer),
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }
    }

    /// Pick one of `max` numbered entries; returns a 0-based index.
    pub fn select(&mut self, question: &str, default: usize, max: usize) -> Result<Answer<usize>> {
        self.ask_until(question, |line| parse_selection(line, default, max))
    }

    pub fn filename(&mut self, default: &str) -> Result<Answer<String>> {
        let question = format!("\nEnter filename (default: {default}): ");
        self.ask_until(&question, |line| parse_filename(line, default))
    }

    /// Ask for an output directory and create it, asking again if that fails.
    pub fn directory(&mut self, default: &str) -> Result<Answer<PathBuf>> {
        let question = format!("\nEnter output directory (default: {default}): ");
        loop {
            let Some(line) = self.ask(&question)? else {
                return Ok(Answer::Quit);
            };
            let line = line.trim();
            if is_quit(line) {
                return Ok(Answer::Quit);
            }
            let dir = PathBuf::from(if line.is_empty() { default } else { line });
            match fs::create_dir_all(&dir) {
                Ok(()) => return Ok(Answer::Value(dir)),
                Err(e) => writeln!(self.output, "Invalid path: {e}")?,
            }
        }
    }
}
