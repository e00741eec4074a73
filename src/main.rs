use argh::FromArgs;
use minishell::command::Streams;
use minishell::config::DEFAULT_CONFIG_PATH;
use minishell::io_adapters::EditorInput;
use minishell::signal::InterruptFlag;
use minishell::{DEFAULT_PROMPT, Interpreter, load_search_path};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `MINISHELL_LOG=debug`.
const LOG_ENV: &str = "MINISHELL_LOG";

#[derive(FromArgs)]
/// A small interactive shell. Commands are looked up in the directories
/// listed by the PATH= line of the configuration file.
struct Args {
    /// configuration file holding the PATH= line
    #[argh(option, short = 'c', default = "PathBuf::from(DEFAULT_CONFIG_PATH)")]
    config: PathBuf,

    /// prompt shown before each line
    #[argh(option, short = 'p', default = "DEFAULT_PROMPT.to_string()")]
    prompt: String,

    /// do not announce the loaded search directories
    #[argh(switch, short = 'q')]
    quiet: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let args: Args = argh::from_env();

    let interrupts = match InterruptFlag::install() {
        Ok(flag) => flag,
        Err(e) => {
            eprintln!("minishell: failed to install SIGINT handler: {e}");
            return ExitCode::FAILURE;
        }
    };

    let search_path = match load_search_path(&args.config) {
        Ok(search_path) => search_path,
        Err(e) => {
            eprintln!("minishell: {}: {e}", args.config.display());
            return ExitCode::from(e.exit_code() as u8);
        }
    };
    if !args.quiet {
        for dir in &search_path {
            println!("Path added: {dir}");
        }
    }

    let mut input = match EditorInput::new() {
        Ok(input) => input,
        Err(e) => {
            eprintln!("minishell: failed to set up line editor: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut shell = Interpreter::new(search_path)
        .with_interrupts(interrupts)
        .with_prompt(args.prompt);

    let (mut stdout, mut stderr) = (io::stdout(), io::stderr());
    shell.repl(&mut input, &mut Streams::new(&mut stdout, &mut stderr));
    ExitCode::SUCCESS
}
