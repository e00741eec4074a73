use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;
use std::io::{self, IsTerminal};

/// Result of asking a [`LineSource`] for the next command line.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A complete line with its terminator removed.
    Line(String),
    /// The read was interrupted (Ctrl-C); the caller prompts again.
    Interrupted,
    /// No more input. Ends the session normally.
    Eof,
    /// This line could not be read, e.g. it was not valid UTF-8. The bytes are
    /// consumed, so the next read starts on the following line.
    Failed(anyhow::Error),
}

/// Where the session loop gets its lines from.
pub trait LineSource {
    /// Block until a line, end of input, or an interruption.
    ///
    /// Sources that draw their own prompt show `prompt` first.
    fn read_line(&mut self, prompt: &str) -> ReadOutcome;

    /// Whether [`LineSource::read_line`] puts the prompt on screen itself.
    ///
    /// When it does not, the session writes the prompt to its own output.
    fn shows_prompt(&self) -> bool {
        true
    }
}

/// Interactive terminal input backed by `rustyline`.
///
/// When standard input is not a terminal the editor falls back to plain line
/// reads without drawing a prompt, so the same source serves scripts piped
/// into the shell.
pub struct EditorInput {
    editor: DefaultEditor,
    interactive: bool,
}

impl EditorInput {
    pub fn new() -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            interactive: io::stdin().is_terminal(),
        })
    }
}

impl LineSource for EditorInput {
    fn read_line(&mut self, prompt: &str) -> ReadOutcome {
        match self.editor.readline(prompt) {
            Ok(line) => ReadOutcome::Line(line),
            Err(ReadlineError::Interrupted) => ReadOutcome::Interrupted,
            Err(ReadlineError::Eof) => ReadOutcome::Eof,
            Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::Interrupted => {
                ReadOutcome::Interrupted
            }
            Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                ReadOutcome::Failed(anyhow::Error::new(e).context("line is not valid UTF-8"))
            }
            Err(err) => ReadOutcome::Failed(err.into()),
        }
    }

    fn shows_prompt(&self) -> bool {
        self.interactive
    }
}

/// Memory-backed line source, used to drive a session without a terminal.
#[derive(Debug)]
pub struct ScriptedInput {
    lines: VecDeque<ReadOutcome>,
    prompts: Vec<String>,
    shows_prompt: bool,
}

impl Default for ScriptedInput {
    fn default() -> Self {
        Self {
            lines: VecDeque::new(),
            prompts: Vec::new(),
            shows_prompt: true,
        }
    }
}

impl ScriptedInput {
    /// Feed the given lines, then report end of input.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines
                .into_iter()
                .map(|l| ReadOutcome::Line(l.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Like [`ScriptedInput::new`], but behaves like a pipe: prompts are
    /// recorded, never shown, so the session has to write them.
    pub fn piped<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            shows_prompt: false,
            ..Self::new(lines)
        }
    }

    /// Queue an arbitrary outcome after the lines already queued.
    pub fn push(&mut self, outcome: ReadOutcome) {
        self.lines.push_back(outcome);
    }

    /// Prompts passed in so far, one per read.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> ReadOutcome {
        self.prompts.push(prompt.to_owned());
        self.lines.pop_front().unwrap_or(ReadOutcome::Eof)
    }

    fn shows_prompt(&self) -> bool {
        self.shows_prompt
    }
}
