use crate::lexer::TokenList;
use anyhow::Result;
use std::fmt;
use std::io::{self, Write};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Output streams handed to in-process commands.
///
/// Regular output goes to `stdout`, diagnostics to `stderr`. Tests pass
/// in-memory buffers; the session passes the process streams.
pub struct Streams<'a> {
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

impl<'a> Streams<'a> {
    pub fn new(stdout: &'a mut dyn Write, stderr: &'a mut dyn Write) -> Self {
        Self { stdout, stderr }
    }
}

/// Object-safe trait for any command that runs inside the shell process.
pub trait ExecutableCommand {
    /// Executes the command.
    fn execute(self: Box<Self>, streams: &mut Streams<'_>) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a parsed line.
///
/// Returns `None` when the factory doesn't recognize the command name.
pub trait CommandFactory {
    /// Name this factory answers to.
    fn name(&self) -> &'static str;

    /// Attempt to create a command instance for the provided tokens.
    fn try_create(&self, tokens: &TokenList) -> Option<Box<dyn ExecutableCommand>>;
}

/// How a command name is handled. Decided anew for every line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Implemented by the shell itself.
    Builtin(String),
    /// Looked up on the search path and run as a child process.
    External(String),
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Command::Builtin(name) | Command::External(name) => name,
        }
    }
}

/// Terminal status of an external command.
#[derive(Debug)]
pub enum ChildOutcome {
    /// The child exited on its own with this status.
    NormalExit(ExitCode),
    /// The child was killed by this signal number.
    SignaledExit(i32),
    /// The child could not be started.
    SpawnFailed(io::Error),
}

impl ChildOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ChildOutcome::NormalExit(0))
    }

    /// Shell-style status: the exit code, `128 + signal`, or 127 when the
    /// program never ran.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ChildOutcome::NormalExit(code) => *code,
            ChildOutcome::SignaledExit(signal) => 128 + signal,
            ChildOutcome::SpawnFailed(_) => 127,
        }
    }
}

impl fmt::Display for ChildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildOutcome::NormalExit(code) => write!(f, "exited with status {code}"),
            ChildOutcome::SignaledExit(signal) => {
                match nix::sys::signal::Signal::try_from(*signal) {
                    Ok(sig) => write!(f, "terminated by signal {}", sig.as_str()),
                    Err(_) => write!(f, "terminated by signal {signal}"),
                }
            }
            ChildOutcome::SpawnFailed(err) => write!(f, "{err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_exit_codes() {
        assert!(ChildOutcome::NormalExit(0).success());
        assert!(!ChildOutcome::NormalExit(3).success());
        assert_eq!(ChildOutcome::NormalExit(3).exit_code(), 3);
        assert_eq!(ChildOutcome::SignaledExit(9).exit_code(), 137);
        let failed = ChildOutcome::SpawnFailed(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(failed.exit_code(), 127);
        assert!(!failed.success());
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(ChildOutcome::NormalExit(2).to_string(), "exited with status 2");
        assert_eq!(
            ChildOutcome::SignaledExit(nix::libc::SIGKILL).to_string(),
            "terminated by signal SIGKILL"
        );
    }

    #[test]
    fn test_command_name() {
        assert_eq!(Command::Builtin("cd".into()).name(), "cd");
        assert_eq!(Command::External("ls".into()).name(), "ls");
    }
}
