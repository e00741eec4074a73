use crate::command::{Command, CommandFactory, ExecutableCommand, ExitCode, Streams};
use crate::interpreter::Factory;
use crate::lexer::TokenList;
use anyhow::{Context, Result};
use std::env;
use std::io::Write;
use thiserror::Error;
use tracing::{debug, warn};

/// Names of the commands the shell implements itself, in the order `help` lists them.
pub const BUILTIN_NAMES: [&str; 5] = ["cd", "help", "exit", "pwd", "echo"];

/// Errors raised while turning a builtin's arguments into a command.
#[derive(Debug, Error)]
pub enum BuiltinError {
    /// A required positional argument was not supplied.
    #[error("{command}: expected argument")]
    MissingArgument { command: &'static str },
}

/// Built-in commands known to the shell at compile time.
///
/// Builtins are constructed from the words after the command name and run
/// directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Builds the command from its arguments (the command name excluded).
    fn from_args(args: &[String]) -> Result<Self, BuiltinError>;

    /// Executes the command using the provided output streams.
    ///
    /// An error is reported to the user by the caller; it never ends the session.
    fn execute(self, streams: &mut Streams<'_>) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, streams: &mut Streams<'_>) -> Result<ExitCode> {
        match <T as BuiltinCommand>::execute(*self, streams) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(streams.stderr, "minishell: {e:#}")?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    error: BuiltinError,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, streams: &mut Streams<'_>) -> Result<ExitCode> {
        writeln!(streams.stderr, "minishell: {}", self.error)?;
        Ok(1)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn try_create(&self, tokens: &TokenList) -> Option<Box<dyn ExecutableCommand>> {
        if tokens.command() == T::name() {
            Some(match T::from_args(tokens.args()) {
                Ok(cmd) => Box::new(cmd),
                Err(error) => Box::new(InvalidArgs { error }),
            })
        } else {
            None
        }
    }
}

/// Maps command names to the in-process handlers.
pub struct Builtins {
    factories: Vec<Box<dyn CommandFactory>>,
}

impl Builtins {
    /// Create a dispatcher over a custom set of factories.
    pub fn new(factories: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { factories }
    }

    /// Names handled by this dispatcher.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.iter().map(|f| f.name())
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// Decide whether the line's command is handled in-process or externally.
    pub fn classify(&self, tokens: &TokenList) -> Command {
        let name = tokens.command().to_owned();
        if self.is_builtin(&name) {
            Command::Builtin(name)
        } else {
            Command::External(name)
        }
    }

    /// Run the builtin named by the first token, if there is one.
    ///
    /// Returns `None` when the name is not a builtin, so the caller goes on to
    /// look for an external program. Otherwise returns the handler's status;
    /// failures have already been reported on `streams.stderr`. `exit` does
    /// not return.
    pub fn try_builtin(&self, tokens: &TokenList, streams: &mut Streams<'_>) -> Option<ExitCode> {
        let cmd = self.factories.iter().find_map(|f| f.try_create(tokens))?;
        debug!(command = tokens.command(), "running builtin");
        Some(match cmd.execute(streams) {
            Ok(code) => code,
            Err(e) => {
                warn!(command = tokens.command(), error = %e, "builtin could not write its output");
                1
            }
        })
    }
}

impl Default for Builtins {
    /// The five builtins: `cd`, `help`, `exit`, `pwd`, `echo`.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Help>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Echo>::default()),
        ])
    }
}

/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn from_args(_args: &[String]) -> Result<Self, BuiltinError> {
        Ok(Pwd {})
    }

    fn execute(self, streams: &mut Streams<'_>) -> Result<ExitCode> {
        let cwd = env::current_dir().context("pwd")?;
        writeln!(streams.stdout, "{}", cwd.display())?;
        Ok(0)
    }
}

/// Change the working directory of the shell process.
///
/// The new directory is inherited by every command started afterwards.
pub struct Cd {
    /// Directory to switch to; absolute or relative to the current directory.
    pub target: String,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn from_args(args: &[String]) -> Result<Self, BuiltinError> {
        match args.first() {
            Some(target) => Ok(Cd {
                target: target.clone(),
            }),
            None => Err(BuiltinError::MissingArgument { command: "cd" }),
        }
    }

    fn execute(self, _streams: &mut Streams<'_>) -> Result<ExitCode> {
        env::set_current_dir(&self.target).with_context(|| format!("cd: {}", self.target))?;
        debug!(dir = %self.target, "working directory changed");
        Ok(0)
    }
}

/// Exit the shell process with a success status.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn from_args(_args: &[String]) -> Result<Self, BuiltinError> {
        Ok(Exit {})
    }

    fn execute(self, streams: &mut Streams<'_>) -> Result<ExitCode> {
        // process::exit skips destructors, so buffered output must go now.
        let _ = streams.stdout.flush();
        let _ = streams.stderr.flush();
        let _ = std::io::stdout().flush();
        std::process::exit(0)
    }
}

/// Print a usage banner and the list of builtins.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn from_args(_args: &[String]) -> Result<Self, BuiltinError> {
        Ok(Help {})
    }

    fn execute(self, streams: &mut Streams<'_>) -> Result<ExitCode> {
        let out = &mut *streams.stdout;
        writeln!(out, "minishell")?;
        writeln!(out, "Type program names and arguments, and hit enter.")?;
        writeln!(out, "The following are built in:")?;
        writeln!(out)?;
        for name in BUILTIN_NAMES {
            writeln!(out, "\t{name}")?;
        }
        Ok(0)
    }
}

/// Write the arguments to standard output, separated by spaces, followed by a newline.
pub struct Echo {
    /// Values to print as-is.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn from_args(args: &[String]) -> Result<Self, BuiltinError> {
        Ok(Echo {
            args: args.to_vec(),
        })
    }

    fn execute(self, streams: &mut Streams<'_>) -> Result<ExitCode> {
        writeln!(streams.stdout, "{}", self.args.join(" "))?;
        Ok(0)
    }
}
