use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

use calc_kit::session::ARGS_SOURCE;
use calc_kit::{load_config, CalculatorError, CalculatorResult, Config, Operation, OutputFormat, Session};

fn cli() -> Command {
    Command::new("calc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Adds, divides and takes square roots, reporting failures clearly")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file (default: .calc-kit.toml)")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Output results in JSON format")
                .action(ArgAction::SetTrue)
                .conflicts_with("xml")
                .global(true),
        )
        .arg(
            Arg::new("xml")
                .long("xml")
                .help("Output results in XML format")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored console output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v, -vv, -vvv)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("add")
                .about("Add two integers")
                .allow_negative_numbers(true)
                .arg(Arg::new("a").required(true).value_parser(value_parser!(i64)))
                .arg(Arg::new("b").required(true).value_parser(value_parser!(i64))),
        )
        .subcommand(
            Command::new("divide")
                .visible_alias("div")
                .about("Divide two integers, truncating toward zero")
                .allow_negative_numbers(true)
                .arg(Arg::new("a").required(true).value_parser(value_parser!(i64)))
                .arg(Arg::new("b").required(true).value_parser(value_parser!(i64))),
        )
        .subcommand(
            Command::new("sqrt")
                .about("Square root of a number")
                .allow_negative_numbers(true)
                .arg(Arg::new("a").required(true).value_parser(value_parser!(f64))),
        )
        .subcommand(
            Command::new("eval")
                .about("Evaluate one operation written as text, e.g. \"3 / 0\"")
                .arg(Arg::new("expression").required(true).num_args(1..).allow_hyphen_values(true)),
        )
        .subcommand(
            Command::new("run")
                .about("Evaluate a script file or every script in a directory")
                .arg(
                    Arg::new("path")
                        .value_name("PATH")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn init_logging(verbose: u8, ansi: bool) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3)
        .init();

    debug!("calc started with verbosity level: {}", verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}

// `--no-color` covers log lines on stderr as well as the report
fn log_ansi(matches: &ArgMatches) -> bool {
    !matches.get_flag("no-color")
}

fn build_config(matches: &ArgMatches) -> CalculatorResult<Config> {
    let mut config = load_config(matches.get_one::<String>("config").map(String::as_str))?;

    if matches.get_flag("json") {
        config.output.format = OutputFormat::Json;
    } else if matches.get_flag("xml") {
        config.output.format = OutputFormat::Xml;
    }
    if matches.get_flag("no-color") {
        config.output.color = false;
    }

    Ok(config)
}

fn run(matches: &ArgMatches) -> CalculatorResult<Session> {
    let config = build_config(matches)?;

    match matches.subcommand() {
        Some(("add", sub)) => {
            let mut session = Session::with_config(config, PathBuf::from("."))?;
            let (a, b) = integer_operands(sub);
            session.evaluate(ARGS_SOURCE, 1, Operation::Add { a, b });
            Ok(session)
        }
        Some(("divide", sub)) => {
            let mut session = Session::with_config(config, PathBuf::from("."))?;
            let (a, b) = integer_operands(sub);
            session.evaluate(ARGS_SOURCE, 1, Operation::Divide { a, b });
            Ok(session)
        }
        Some(("sqrt", sub)) => {
            let mut session = Session::with_config(config, PathBuf::from("."))?;
            let a = sub.get_one::<f64>("a").copied().unwrap_or_default();
            session.evaluate(ARGS_SOURCE, 1, Operation::SquareRoot { a });
            Ok(session)
        }
        Some(("eval", sub)) => {
            let mut session = Session::with_config(config, PathBuf::from("."))?;
            let expression = sub
                .get_many::<String>("expression")
                .map(|parts| parts.map(String::as_str).collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            // Blank input and bare comments evaluate to nothing
            if session.evaluate_line(ARGS_SOURCE, 1, &expression).is_none() {
                return Err(CalculatorError::UnknownOperation { input: expression });
            }
            Ok(session)
        }
        Some(("run", sub)) => {
            let path = sub
                .get_one::<PathBuf>("path")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("."));
            let root = if path.is_dir() {
                path.clone()
            } else {
                path.parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
            };
            let mut session = Session::with_config(config, root)?;
            session.run_path(&path)?;
            Ok(session)
        }
        _ => unreachable!("clap enforces a subcommand"),
    }
}

// Required positionals, so clap guarantees both are present
fn integer_operands(matches: &ArgMatches) -> (i64, i64) {
    let a = matches.get_one::<i64>("a").copied().unwrap_or_default();
    let b = matches.get_one::<i64>("b").copied().unwrap_or_default();
    (a, b)
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"), log_ansi(&matches));

    let session = match run(&matches) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = session.generate_report() {
        eprintln!("error: {}", e);
        return ExitCode::from(2);
    }

    if session.has_failures() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
