use crate::builtin::Builtins;
use crate::command::{ChildOutcome, Command, ExitCode, Streams};
use crate::config::SearchPath;
use crate::external;
use crate::io_adapters::{LineSource, ReadOutcome};
use crate::lexer::{self, TokenList};
use crate::signal::InterruptFlag;
use std::fmt;
use std::io::Write;
use tracing::{debug, trace, warn};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the builtins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Prompt shown when none is configured.
pub const DEFAULT_PROMPT: &str = "minishell % ";

/// Read failures in a row after which the session gives up on its input.
const MAX_READ_FAILURES: u32 = 5;

/// What happened to one input line.
#[derive(Debug)]
pub enum Dispatch {
    /// Nothing but separators; nothing was run.
    Blank,
    /// A builtin ran and returned this status.
    Builtin(ExitCode),
    /// An external program ran.
    External(ChildOutcome),
    /// No builtin and nothing on the search path had this name.
    NotFound(String),
}

#[derive(Debug)]
enum State {
    Prompting,
    AwaitingLine,
    Dispatching(String),
    Executing(TokenList),
    Terminated,
}

/// Where a line goes after tokenizing and the builtin lookup.
enum Routed {
    Done(Dispatch),
    External(TokenList),
}

/// An interactive shell session.
///
/// The interpreter owns the search path loaded at startup and the builtin
/// dispatcher. Each line is tokenized, then handed to a builtin or resolved on
/// the search path and run as a child process.
///
/// Example
/// ```
/// use minishell::{Interpreter, Dispatch, SearchPath};
/// use minishell::command::Streams;
/// let mut sh = Interpreter::new(SearchPath::default());
/// let (mut out, mut err) = (Vec::new(), Vec::new());
/// let done = sh.execute_line("echo hello world", &mut Streams::new(&mut out, &mut err));
/// assert!(matches!(done, Dispatch::Builtin(0)));
/// assert_eq!(out, b"hello world\n");
/// ```
pub struct Interpreter {
    search_path: SearchPath,
    builtins: Builtins,
    interrupts: InterruptFlag,
    prompt: String,
}

impl Interpreter {
    /// Create an interpreter with the default builtins and no SIGINT handler.
    pub fn new(search_path: SearchPath) -> Self {
        Self {
            search_path,
            builtins: Builtins::default(),
            interrupts: InterruptFlag::detached(),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }

    /// Use `interrupts` to learn about Ctrl-C during reads and while a child runs.
    pub fn with_interrupts(mut self, interrupts: InterruptFlag) -> Self {
        self.interrupts = interrupts;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Handle a single line (terminator already removed).
    ///
    /// Errors are reported on `streams.stderr` and never escape. `exit` ends
    /// the process from inside this call.
    pub fn execute_line(&mut self, line: &str, streams: &mut Streams<'_>) -> Dispatch {
        match self.route(line, streams) {
            Routed::Done(dispatch) => dispatch,
            Routed::External(tokens) => self.run_external(tokens, streams),
        }
    }

    /// Read and run lines until end of input.
    ///
    /// A line that cannot be read is reported and skipped. Only end of input,
    /// [`MAX_READ_FAILURES`] failed reads in a row, or the `exit` builtin end
    /// the session.
    pub fn repl(&mut self, input: &mut dyn LineSource, streams: &mut Streams<'_>) {
        let mut read_failures = 0;
        let mut state = State::Prompting;
        loop {
            trace!(?state, "session");
            state = match state {
                State::Prompting => {
                    if input.shows_prompt() {
                        flush(streams.stdout);
                    } else {
                        write_prompt(streams.stdout, &self.prompt);
                    }
                    State::AwaitingLine
                }
                State::AwaitingLine => {
                    let outcome = input.read_line(&self.prompt);
                    // A SIGINT during a blocking read only becomes visible here.
                    if self.interrupts.take() || matches!(outcome, ReadOutcome::Interrupted) {
                        report(streams.stdout, format_args!("^C"));
                    }
                    match outcome {
                        ReadOutcome::Line(line) => {
                            read_failures = 0;
                            State::Dispatching(line)
                        }
                        ReadOutcome::Interrupted => State::Prompting,
                        ReadOutcome::Eof => State::Terminated,
                        ReadOutcome::Failed(e) => {
                            read_failures += 1;
                            debug!(error = %e, read_failures, "reading input failed");
                            report(
                                streams.stderr,
                                format_args!("minishell: error reading input: {e:#}"),
                            );
                            if read_failures < MAX_READ_FAILURES {
                                State::Prompting
                            } else {
                                report(
                                    streams.stderr,
                                    format_args!("minishell: too many read errors, giving up"),
                                );
                                State::Terminated
                            }
                        }
                    }
                }
                State::Dispatching(line) => match self.route(&line, streams) {
                    Routed::Done(_) => State::Prompting,
                    Routed::External(tokens) => State::Executing(tokens),
                },
                State::Executing(tokens) => {
                    self.run_external(tokens, streams);
                    State::Prompting
                }
                State::Terminated => break,
            };
        }
        debug!("session terminated");
    }

    /// Tokenize `line` and run it if it is blank or a builtin.
    fn route(&self, line: &str, streams: &mut Streams<'_>) -> Routed {
        let Some(tokens) = lexer::tokenize(line) else {
            return Routed::Done(Dispatch::Blank);
        };
        let command = self.builtins.classify(&tokens);
        debug!(command = command.name(), args = ?tokens.args(), "dispatching");
        match command {
            Command::Builtin(_) => match self.builtins.try_builtin(&tokens, streams) {
                Some(code) => Routed::Done(Dispatch::Builtin(code)),
                None => Routed::External(tokens),
            },
            Command::External(_) => Routed::External(tokens),
        }
    }

    fn run_external(&self, tokens: TokenList, streams: &mut Streams<'_>) -> Dispatch {
        let name = tokens.command();
        let Some(resolved) = external::resolve(name, &self.search_path) else {
            report(streams.stderr, format_args!("minishell: {name}: command not found"));
            return Dispatch::NotFound(name.to_owned());
        };

        // Children write straight to the inherited descriptors.
        flush(streams.stdout);
        let outcome = external::execute(&resolved, &tokens);
        debug!(name, status = outcome.exit_code(), "child finished");

        if self.interrupts.take() {
            debug!(name, "interrupt received while child was running");
            report(streams.stdout, format_args!(""));
        }
        if !outcome.success() {
            report(streams.stderr, format_args!("minishell: {name}: {outcome}"));
        }
        Dispatch::External(outcome)
    }
}

fn write_prompt(out: &mut dyn Write, prompt: &str) {
    if let Err(e) = write!(out, "{prompt}") {
        warn!(error = %e, "failed to write prompt");
    }
    flush(out);
}

fn flush(out: &mut dyn Write) {
    if let Err(e) = out.flush() {
        warn!(error = %e, "failed to flush standard output");
    }
}

fn report(out: &mut dyn Write, message: fmt::Arguments<'_>) {
    if let Err(e) = writeln!(out, "{message}") {
        warn!(error = %e, "failed to write diagnostic");
    }
}
