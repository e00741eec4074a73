//! A small interactive shell.
//!
//! The shell reads a line, splits it into words on spaces and tabs, and either
//! runs one of its builtins (`cd`, `help`, `exit`, `pwd`, `echo`) or looks the
//! command up in the directories listed by its configuration file and runs it
//! as a child process. It keeps going until end of input or `exit`.
//!
//! [`Interpreter`] drives the session. The search path comes from
//! [`config::load_search_path`]; [`lexer::tokenize`] splits lines;
//! [`external`] finds and runs programs.

pub mod builtin;
pub mod command;
pub mod config;
pub mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod signal;

pub use config::{SearchPath, load_search_path};
pub use interpreter::{DEFAULT_PROMPT, Dispatch, Interpreter};
