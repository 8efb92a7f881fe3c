mod config;
mod db;
mod pool;

use std::fmt::Write as _;
use std::io::IsTerminal as _;
use std::num::NonZeroUsize;
use std::process::ExitCode;
use std::thread;

use anyhow::Context as _;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::Config;
use db::{Job, Pass, run_job};
use salsa::DatabaseImpl;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;
use weft_errors::{Diagnostic, Renderer, Severity};
use weft_inputs::{File, Source, regularize_nls};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Rewrites and beautifies Python source files.
#[derive(Parser)]
#[command(name = "weft", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite `%` interpolations of string literals as f-strings, in place.
    Fstringify(Args),
    /// Print the changes `fstringify` would make as unified diffs.
    FstringifyDiff(Args),
    /// Beautify files in place.
    Beautify(Args),
    /// Print the changes `beautify` would make as unified diffs.
    BeautifyDiff(Args),
}

impl Command {
    fn into_parts(self) -> (Pass, Mode, Args) {
        match self {
            Self::Fstringify(args) => (Pass::Fstringify, Mode::Write, args),
            Self::FstringifyDiff(args) => (Pass::Fstringify, Mode::Diff, args),
            Self::Beautify(args) => (Pass::Beautify, Mode::Write, args),
            Self::BeautifyDiff(args) => (Pass::Beautify, Mode::Diff, args),
        }
    }
}

#[derive(clap::Args)]
struct Args {
    /// Files to process, or a single directory whose `*.py` files are processed.
    #[arg(required = true)]
    paths: Vec<Utf8PathBuf>,
    /// Join continued lines up to this width (0 disables joining).
    #[arg(long, value_name = "N")]
    max_join: Option<usize>,
    /// Split lines wider than this (0 disables splitting).
    #[arg(long, value_name = "N")]
    max_split: Option<usize>,
    /// Join continued lines even when they contain string literals.
    #[arg(long)]
    allow_joined_strings: bool,
    /// Configuration file [default: weft.toml, if present].
    #[arg(long, value_name = "FILE")]
    config: Option<Utf8PathBuf>,
    /// Number of worker threads [default: available parallelism].
    #[arg(long, short, value_name = "N")]
    jobs: Option<NonZeroUsize>,
    /// Report skipped rewrites and log progress.
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Write,
    Diff,
}

/// Everything a worker needs to process one file.
struct Settings {
    pass: Pass,
    mode: Mode,
    options: weft_fmt::Options,
    verbose: bool,
    renderer: Renderer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Unchanged,
    Changed,
    Failed,
}

/// The result of processing one file.
struct Outcome {
    status: Status,
    /// Diff or summary for stdout.
    output: String,
    /// Rendered diagnostics for stderr.
    messages: String,
}

impl Outcome {
    fn failed(messages: String) -> Self {
        Self { status: Status::Failed, output: String::new(), messages }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let (pass, mode, args) = Cli::parse().command.into_parts();
    init_logging(args.verbose);

    let settings = Settings {
        pass,
        mode,
        options: options(&args)?,
        verbose: args.verbose,
        renderer: if std::io::stderr().is_terminal() {
            Renderer::styled()
        } else {
            Renderer::plain()
        },
    };
    let jobs = args
        .jobs
        .or_else(|| thread::available_parallelism().ok())
        .map_or(1, NonZeroUsize::get);
    let paths = python_files(&args.paths)?;
    tracing::debug!(files = paths.len(), jobs, ?pass, ?mode, "starting");

    let mut failed = 0_usize;
    pool::for_each_ordered(
        paths,
        jobs,
        |path| process(&path, &settings),
        |outcome| {
            print!("{}", outcome.output);
            eprint!("{}", outcome.messages);
            if outcome.status == Status::Failed {
                failed += 1;
            }
        },
    );

    if failed > 0 {
        tracing::debug!(failed, "finished with failures");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env("WEFT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Beautifier options from the configuration file, overridden by flags.
fn options(args: &Args) -> anyhow::Result<weft_fmt::Options> {
    let mut options = Config::load(args.config.as_deref())?.beautify;
    if let Some(width) = args.max_join {
        options.max_join_width = width;
    }
    if let Some(width) = args.max_split {
        options.max_split_width = width;
    }
    options.allow_joined_strings |= args.allow_joined_strings;
    Ok(options)
}

/// Expands a single directory argument into its sorted `*.py` files.
fn python_files(paths: &[Utf8PathBuf]) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let [dir] = paths else {
        return Ok(paths.to_vec());
    };
    if !dir.is_dir() {
        return Ok(paths.to_vec());
    }

    let mut files = Vec::new();
    for entry in dir.read_dir_utf8().with_context(|| format!("failed to read `{dir}`"))? {
        let path = entry.with_context(|| format!("failed to read `{dir}`"))?.into_path();
        if path.extension() == Some("py") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn process(path: &Utf8Path, settings: &Settings) -> Outcome {
    if !path.is_file() {
        return Outcome::failed(format!("file not found: {path}\n"));
    }
    let source = match Source::read(path) {
        Ok(source) => source,
        Err(error) => {
            tracing::warn!(%path, "skipped");
            return Outcome::failed(format!("error: {:#}\n", anyhow::Error::from(error)));
        }
    };

    let db = DatabaseImpl::default();
    let file = File::new(&db, path.to_owned(), source.text.clone());
    let job = Job::new(&db, file, settings.pass, settings.options);
    let result = run_job(&db, job);

    let mut messages = String::new();
    for diagnostic in run_job::accumulated::<Diagnostic>(&db, job) {
        if diagnostic.severity() == Severity::Warning && !settings.verbose {
            continue;
        }
        let rendered = diagnostic.render(&settings.renderer, path.as_str(), &source.text);
        writeln!(messages, "{rendered}").ok();
    }

    let Some(text) = result else {
        tracing::warn!(%path, "skipped");
        return Outcome { status: Status::Failed, output: String::new(), messages };
    };
    if regularize_nls(&text) == source.text {
        tracing::debug!(%path, "unchanged");
        return Outcome { status: Status::Unchanged, output: String::new(), messages };
    }

    let output = match settings.mode {
        Mode::Diff => unified_diff(path, &source.text, &text),
        Mode::Write => {
            if let Err(error) = source.write(path, &text) {
                writeln!(messages, "error: {:#}", anyhow::Error::from(error)).ok();
                return Outcome { status: Status::Failed, output: String::new(), messages };
            }
            format!("wrote {path}\n")
        }
    };
    Outcome { status: Status::Changed, output, messages }
}

fn unified_diff(path: &Utf8Path, old: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;
    use expect_test::expect;

    use super::*;

    #[test]
    fn command_line_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_the_configuration() {
        let cli = Cli::try_parse_from([
            "weft",
            "beautify-diff",
            "--max-split",
            "100",
            "--allow-joined-strings",
            "--config",
            "missing.toml",
            "a.py",
        ])
        .unwrap();
        let (pass, mode, args) = cli.command.into_parts();
        assert_eq!((pass, mode), (Pass::Beautify, Mode::Diff));
        assert_eq!(args.paths, [Utf8PathBuf::from("a.py")]);
        assert_eq!(args.max_split, Some(100));
        assert!(args.allow_joined_strings);

        // An explicit configuration file must exist.
        let error = options(&args).unwrap_err();
        assert_eq!(error.to_string(), "failed to read `missing.toml`");
    }

    #[test]
    fn diffs_are_unified() {
        let diff = unified_diff(Utf8Path::new("t.py"), "x=1\ny = 2\n", "x = 1\ny = 2\n");
        expect![[r#"
            --- a/t.py
            +++ b/t.py
            @@ -1,2 +1,2 @@
            -x=1
            +x = 1
             y = 2
        "#]]
        .assert_eq(&diff);
    }

    #[test]
    fn missing_files_fail() {
        let settings = Settings {
            pass: Pass::Beautify,
            mode: Mode::Diff,
            options: weft_fmt::Options::default(),
            verbose: false,
            renderer: Renderer::plain(),
        };
        let outcome = process(Utf8Path::new("does/not/exist.py"), &settings);
        assert_eq!(outcome.status, Status::Failed);
        assert_eq!(outcome.messages, "file not found: does/not/exist.py\n");
    }
}
