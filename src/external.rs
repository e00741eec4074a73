use crate::command::ChildOutcome;
use crate::config::SearchPath;
use crate::lexer::TokenList;
use nix::unistd::{AccessFlags, access};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tracing::{debug, trace};

/// Path of an executable found on the search path.
///
/// Only proven executable at the moment it was resolved; the file may change
/// before it is run, in which case spawning fails and is reported as such.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// Look `name` up in each search directory, in order.
///
/// The candidate for a directory is `<dir>/<name>`. The first candidate that is
/// a regular file the current user may execute wins, so earlier directories
/// shadow later ones. Returns `None` once every directory has been tried.
pub fn resolve(name: &str, search_path: &SearchPath) -> Option<ResolvedPath> {
    if name.is_empty() {
        return None;
    }
    for dir in search_path {
        let candidate = PathBuf::from(format!("{dir}/{name}"));
        trace!(candidate = %candidate.display(), "probing");
        if is_executable(&candidate) {
            debug!(name, path = %candidate.display(), "resolved");
            return Some(ResolvedPath(candidate));
        }
    }
    debug!(name, "not found on search path");
    None
}

fn is_executable(path: &Path) -> bool {
    path.metadata().is_ok_and(|m| m.is_file()) && access(path, AccessFlags::X_OK).is_ok()
}

/// Run the resolved program as a child process and wait for it.
///
/// The child receives the whole token list as its argument vector with
/// `argv[0]` left as typed by the user, and inherits the environment, the
/// working directory and the standard streams. If the program image cannot be
/// loaded the child never runs shell code; the failure comes back as
/// [`ChildOutcome::SpawnFailed`].
pub fn execute(resolved: &ResolvedPath, tokens: &TokenList) -> ChildOutcome {
    let mut cmd = std::process::Command::new(resolved.as_path());
    cmd.arg0(tokens.command()).args(tokens.args());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return ChildOutcome::SpawnFailed(e),
    };
    debug!(pid = child.id(), path = %resolved.as_path().display(), "spawned");

    let outcome = match child.wait() {
        Ok(status) => outcome_from_status(status),
        Err(e) => ChildOutcome::SpawnFailed(e),
    };
    debug!(?outcome, "child finished");
    outcome
}

fn outcome_from_status(exit_status: ExitStatus) -> ChildOutcome {
    match exit_status.code() {
        Some(code) => ChildOutcome::NormalExit(code),
        None => match exit_status.signal() {
            Some(signal) => ChildOutcome::SignaledExit(signal),
            // Stopped/continued statuses are not reported by wait(); treat as failure.
            None => ChildOutcome::NormalExit(-1),
        },
    }
}
