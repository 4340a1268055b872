use anyhow::Result;
use argh::FromArgs;
use msx::{Environment, Interpreter, Runtime, batch, scan};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Run and check .msx extension scripts.
struct Cli {
    #[argh(option, short = 'C')]
    /// directory that state files and relative paths resolve against. Defaults to the current directory.
    dir: Option<PathBuf>,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Run(RunArgs),
    Repl(ReplArgs),
    Test(TestArgs),
    Scan(ScanArgs),
}

#[derive(FromArgs)]
/// Run a .msx script, or a single statement given inline.
#[argh(subcommand, name = "run")]
struct RunArgs {
    #[argh(positional)]
    /// path to a .msx file, or the first word of an inline statement.
    target: String,

    #[argh(positional, greedy)]
    /// remaining words of an inline statement.
    rest: Vec<String>,
}

#[derive(FromArgs)]
/// Read statements interactively, one line at a time.
#[argh(subcommand, name = "repl")]
struct ReplArgs {}

#[derive(FromArgs)]
/// Run every .msx script in an extension folder once.
#[argh(subcommand, name = "test")]
struct TestArgs {
    #[argh(positional)]
    /// extension folder.
    path: PathBuf,
}

#[derive(FromArgs)]
/// Scan an extension folder for blacklisted keywords.
#[argh(subcommand, name = "scan")]
struct ScanArgs {
    #[argh(positional)]
    /// extension folder.
    path: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli: Cli = argh::from_env();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %format!("{:#}", e), "msx failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the command succeeded.
fn run(cli: Cli) -> Result<bool> {
    let mut env = Environment::new();
    if let Some(dir) = cli.dir {
        env.current_dir = env.resolve(&dir);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Run(args) => {
            let mut msx = Interpreter::new(Runtime::from_env(env));
            let ok = run_target(&mut msx, &args, &mut out)?;
            Ok(ok)
        }
        Command::Repl(_) => {
            let mut msx = Interpreter::new(Runtime::from_env(env));
            msx.repl(&mut out)?;
            Ok(true)
        }
        Command::Test(args) => {
            let path = env.resolve(&args.path);
            let mut msx = Interpreter::new(Runtime::from_env(env));
            let report = batch::run_dir(&mut msx, &path, &mut out)?;
            Ok(report.is_success())
        }
        Command::Scan(args) => {
            let path = env.resolve(&args.path);
            let findings = scan::scan_dir(&path)?;
            for finding in &findings {
                writeln!(out, "Malicious code detected: {}", finding)?;
            }
            if findings.is_empty() {
                writeln!(out, "No blacklisted patterns found in {}.", path.display())?;
            }
            Ok(findings.is_empty())
        }
    }
}

/// What `msx run` was asked to execute.
#[derive(Debug, PartialEq)]
enum Target {
    /// A `.msx` file; any further words are ignored.
    File(PathBuf),
    /// Everything else, joined into one script line.
    Inline(String),
}

impl Target {
    fn from_args(args: &RunArgs) -> Self {
        let path = Path::new(&args.target);
        if path.extension().is_some_and(|x| x == batch::SCRIPT_EXTENSION) {
            return Target::File(path.to_path_buf());
        }
        let mut line = args.target.clone();
        for word in &args.rest {
            line.push(' ');
            line.push_str(word);
        }
        Target::Inline(line)
    }
}

fn run_target(msx: &mut Interpreter, args: &RunArgs, out: &mut dyn Write) -> Result<bool> {
    let result = match Target::from_args(args) {
        Target::File(path) => {
            let path = msx.runtime().env.resolve(&path);
            msx.run_file(&path, out)
        }
        Target::Inline(line) => msx.run(&line, out),
    };

    match result {
        Ok(()) => Ok(true),
        Err(msx::RunError::Io(e)) => Err(e.into()),
        Err(e) => {
            error!(error = %e, "script aborted");
            writeln!(out, "Error: {}", e)?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msx::{FixedClock, MemoryStore, ScriptedPrompt};
    use std::fs;

    fn run_args(target: &str, rest: &[&str]) -> RunArgs {
        RunArgs {
            target: target.to_string(),
            rest: rest.iter().map(|w| w.to_string()).collect(),
        }
    }

    fn interpreter(dir: &Path) -> Interpreter {
        Interpreter::new(Runtime::new(
            Environment::isolated(dir),
            Box::new(MemoryStore::new()),
            Box::new(FixedClock::at(0)),
            Box::new(ScriptedPrompt::default()),
        ))
    }

    #[test]
    fn test_target_is_decided_by_extension() {
        assert_eq!(
            Target::from_args(&run_args("demo.msx", &["extra", "words"])),
            Target::File(PathBuf::from("demo.msx"))
        );
        assert_eq!(
            Target::from_args(&run_args("msx", &["subscribe", "30"])),
            Target::Inline("msx subscribe 30".to_string())
        );
        assert_eq!(
            Target::from_args(&run_args("print \"hi\"", &[])),
            Target::Inline("print \"hi\"".to_string())
        );
    }

    #[test]
    fn test_run_target_file_ignores_extra_words() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("demo.msx"), "print \"from file\"\n")?;
        let mut msx = interpreter(dir.path());
        let mut out = Vec::new();

        let ok = run_target(&mut msx, &run_args("demo.msx", &["extra"]), &mut out)?;

        assert!(ok);
        assert_eq!(String::from_utf8(out)?, "from file\n");
        Ok(())
    }

    #[test]
    fn test_run_target_inline_and_failures() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut msx = interpreter(dir.path());

        let mut out = Vec::new();
        assert!(run_target(&mut msx, &run_args("msx", &["terminal"]), &mut out)?);
        assert_eq!(String::from_utf8(out)?, "Opening MSX terminal...\n");

        let mut out = Vec::new();
        assert!(!run_target(&mut msx, &run_args("missing.msx", &[]), &mut out)?);
        assert!(String::from_utf8(out)?.starts_with("Error: File "));
        Ok(())
    }
}
