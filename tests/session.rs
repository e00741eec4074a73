use std::fs;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::io::{Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

/// Scripts are written and then executed; serializing keeps a concurrent fork
/// from holding a script open for writing while it is being exec'd.
static SERIAL: Mutex<()> = Mutex::new(());

struct Shell {
    dir: TempDir,
    _serial: MutexGuard<'static, ()>,
}

impl Shell {
    /// A scratch directory with a `bin/` search directory and a config pointing at it.
    fn new() -> Self {
        let serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().expect("create temp dir");
        fs::create_dir(dir.path().join("bin")).expect("create bin dir");
        let shell = Self {
            dir,
            _serial: serial,
        };
        shell.write_config(&format!("PATH={}\n", shell.bin().display()));
        shell
    }

    fn bin(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("shellrc")
    }

    fn write_config(&self, content: &str) {
        fs::write(self.config(), content).expect("write config");
    }

    fn script(&self, dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    }

    fn spawn(&self, extra_args: &[&str]) -> Child {
        Command::new(env!("CARGO_BIN_EXE_minishell"))
            .arg("--config")
            .arg(self.config())
            .args(extra_args)
            .current_dir(self.dir.path())
            .env_remove("MINISHELL_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn minishell")
    }

    fn run(&self, extra_args: &[&str], stdin: impl AsRef<[u8]>) -> Output {
        let mut child = self.spawn(extra_args);
        // The shell may already be gone (startup failures), so a broken pipe is fine.
        let _ = child.stdin.take().expect("stdin").write_all(stdin.as_ref());
        child.wait_with_output().expect("wait for minishell")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn end_of_input_exits_successfully() {
    let sh = Shell::new();
    let out = sh.run(&[], "echo a b c\n   \n\t\necho\n");

    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains(&format!("Path added: {}\n", sh.bin().display())));
    assert!(text.contains("a b c\n"));
    assert!(stderr(&out).is_empty(), "stderr: {}", stderr(&out));
}

#[test]
fn quiet_suppresses_path_notices() {
    let sh = Shell::new();
    let out = sh.run(&["--quiet"], "");

    assert_eq!(out.status.code(), Some(0));
    assert!(!stdout(&out).contains("Path added"));
}

#[test]
fn exit_stops_the_session() {
    let sh = Shell::new();
    let out = sh.run(&["-q"], "echo before\nexit\necho after\n");

    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("before\n"));
    assert!(!text.contains("after"));
}

#[test]
fn unknown_command_is_reported_and_session_continues() {
    let sh = Shell::new();
    let out = sh.run(&["-q"], "no-such-thing\necho alive\n");

    assert_eq!(out.status.code(), Some(0));
    assert!(stderr(&out).contains("minishell: no-such-thing: command not found"));
    assert!(stdout(&out).contains("alive\n"));
}

#[test]
fn cd_without_argument_is_not_fatal() {
    let sh = Shell::new();
    let out = sh.run(&["-q"], "cd\npwd\n");

    assert_eq!(out.status.code(), Some(0));
    assert!(stderr(&out).contains("minishell: cd: expected argument"));
    let cwd = fs::canonicalize(sh.dir.path()).unwrap();
    assert!(stdout(&out).contains(&format!("{}\n", cwd.display())));
}

#[test]
fn external_commands_run_from_search_path() {
    let sh = Shell::new();
    sh.script(&sh.bin(), "greet", "echo \"hello $1\"");
    let out = sh.run(&["-q"], "greet world\ngreet again\n");

    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("hello world\n"));
    assert!(text.contains("hello again\n"));
}

#[test]
fn earlier_search_directory_wins() {
    let sh = Shell::new();
    let later = sh.dir.path().join("later");
    fs::create_dir(&later).unwrap();
    sh.write_config(&format!("PATH={}::{}\n", sh.bin().display(), later.display()));
    sh.script(&sh.bin(), "which-one", "echo first");
    sh.script(&later, "which-one", "echo second");

    let out = sh.run(&[], "which-one\n");

    let text = stdout(&out);
    assert!(text.contains("first\n"));
    assert!(!text.contains("second\n"));
    assert_eq!(text.matches("Path added:").count(), 2);
}

#[test]
fn failing_command_is_reported() {
    let sh = Shell::new();
    sh.script(&sh.bin(), "fails", "exit 9");
    let out = sh.run(&["-q"], "fails\n");

    assert_eq!(out.status.code(), Some(0));
    assert!(stderr(&out).contains("minishell: fails: exited with status 9"));
}

#[test]
fn missing_config_fails_startup() {
    let sh = Shell::new();
    fs::remove_file(sh.config()).unwrap();
    let out = sh.run(&[], "echo never\n");

    assert_eq!(out.status.code(), Some(255));
    assert!(!stdout(&out).contains("never"));
    assert!(stderr(&out).contains("failed to read"));
}

#[test]
fn config_without_path_fails_startup() {
    let sh = Shell::new();
    sh.write_config("HOME=/root\n");
    let out = sh.run(&[], "echo never\n");

    assert_eq!(out.status.code(), Some(254));
    assert!(stderr(&out).contains("no PATH= entry"));
}

#[test]
fn prompt_is_shown_on_piped_input() {
    let sh = Shell::new();
    let out = sh.run(&["-q", "--prompt", "PS> "], "echo x\n");

    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "PS> x\nPS> ");
}

#[test]
fn undecodable_line_is_skipped() {
    let sh = Shell::new();
    let out = sh.run(&["-q"], b"echo a\n\xff\necho b\n");

    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("a\n"));
    assert!(text.contains("b\n"), "stdout: {text}");
    let err = stderr(&out);
    assert!(err.contains("minishell: error reading input"), "stderr: {err}");
    assert!(!err.contains('\x1b'), "stderr carries terminal escapes: {err:?}");
}

#[test]
fn sigint_while_waiting_for_input_is_reported() {
    let sh = Shell::new();
    let mut child = sh.spawn(&["-q", "--prompt", "ready> "]);
    let mut output = child.stdout.take().expect("stdout");

    // Once the prompt is out, the handler is installed and the shell is reading.
    let mut seen = Vec::new();
    let mut buf = [0u8; 64];
    while !seen.ends_with(b"ready> ") {
        let n = output.read(&mut buf).expect("read prompt");
        assert!(n > 0, "shell exited before prompting");
        seen.extend_from_slice(&buf[..n]);
    }
    let pid = Pid::from_raw(child.id() as i32);
    kill(pid, Signal::SIGINT).expect("send SIGINT");

    let mut stdin = child.stdin.take().expect("stdin");
    stdin.write_all(b"echo after\n").expect("write line");
    drop(stdin);
    output.read_to_end(&mut seen).expect("read output");
    let status = child.wait().expect("wait for minishell");

    assert_eq!(status.code(), Some(0));
    let text = String::from_utf8_lossy(&seen);
    assert!(text.contains("^C\n"), "stdout: {text}");
    assert!(text.contains("after\n"), "stdout: {text}");
}
