//! Marginalia CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use marginalia_foundation::FormatterConfig;
use marginalia_runtime::{Repl, Session};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    files: Vec<PathBuf>,
    templates: Vec<String>,
    fields: Vec<(String, String)>,
    batch_mode: bool,
    show_help: bool,
    show_version: bool,
    debug: bool,
    permissive: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("MARGINALIA_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "--debug" => config.debug = true,
            "--permissive" => config.permissive = true,
            "-e" | "--eval" => {
                let template = args.next().ok_or("--eval requires a template")?;
                config.templates.push(template);
            }
            "-f" | "--field" => {
                let assignment = args.next().ok_or("--field requires KEY=VALUE")?;
                let (key, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| format!("invalid --field value: {assignment}"))?;
                config.fields.push((key.to_string(), value.to_string()));
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {other}").into());
            }
            path => config.files.push(PathBuf::from(path)),
        }
    }

    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("marginalia {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_logging(config.debug);

    let formatter_config = if config.permissive {
        FormatterConfig::permissive()
    } else {
        FormatterConfig::default()
    };
    let mut session =
        Session::with_config(formatter_config.with_template_debug_printing(config.debug));
    for (key, value) in &config.fields {
        session.set_field(key, value);
    }

    let mut repl = Repl::new()?.with_session(session);

    for file in &config.files {
        println!("{}", repl.eval_file(file)?);
    }
    for template in &config.templates {
        println!("{}", repl.session().evaluate(template));
    }

    if config.batch_mode {
        return Ok(());
    }

    if !config.files.is_empty() || !config.templates.is_empty() {
        repl = repl.without_banner();
    }

    repl.run()?;
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mMarginalia\x1b[0m - Template evaluator for book metadata

\x1b[1mUSAGE:\x1b[0m
    marginalia [OPTIONS] [FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [FILES...]    Template files to render before starting the REPL

\x1b[1mOPTIONS:\x1b[0m
    -h, --help               Print help information
    -V, --version            Print version information
    -b, --batch              Render and exit (no REPL)
    -e, --eval TEMPLATE      Render TEMPLATE against the book
    -f, --field KEY=VALUE    Set a field of the book
    --permissive             Allow database functions in composite columns
    --debug                  Log at debug level and enable template debug printing

\x1b[1mENVIRONMENT:\x1b[0m
    MARGINALIA_LOG           Log filter (e.g. marginalia_formatter=trace)

\x1b[1mEXAMPLES:\x1b[0m
    marginalia                                   Start interactive REPL
    marginalia -f title=Dune -e '{{title:uppercase()}}' -b
    marginalia -f tags=a,b -e 'program: list_count_field(\"tags\")' -b

\x1b[1mREPL COMMANDS:\x1b[0m
    :help                Show all commands
    Ctrl+D               Exit REPL
    Ctrl+C               Cancel current input"
    );
}
