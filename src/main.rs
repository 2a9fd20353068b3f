use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use hulk::ast_printer::AstPrinter;
use hulk::error::HulkError;
use hulk::interpreter::{Interpreter, InterpreterConfig, MAX_CALL_DEPTH};
use hulk::parser::Parser;
use hulk::scanner::{scan, Scanner};

#[derive(ClapParser, Debug)]
#[command(version, about = "HULK expression interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable logging to hulk.log
    #[arg(long, global = true)]
    log: bool,

    /// Maximum number of nested function calls
    #[arg(long, global = true, default_value_t = MAX_CALL_DEPTH)]
    max_depth: usize,

    /// Reject redeclaring a function with the same name and arity
    #[arg(long, global = true)]
    no_redefine: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive prompt (the default)
    Repl,

    /// Prints every token of every line
    Tokenize {
        filename: Option<PathBuf>,

        /// Emit JSON instead of one token per line
        #[arg(long)]
        json: bool,
    },

    /// Prints the AST of every line
    Parse {
        filename: Option<PathBuf>,

        /// Emit JSON instead of prefix notation
        #[arg(long)]
        json: bool,
    },

    /// Runs every line of a file in one session, echoing each line first.
    /// Blank lines and lines starting with '#' are skipped.
    Run { filename: PathBuf },
}

impl Cli {
    fn config(&self) -> InterpreterConfig {
        InterpreterConfig {
            max_call_depth: self.max_depth,
            allow_redefinition: !self.no_redefine,
        }
    }
}

/// Reads a whole file, or standard input when no file is given.
fn read_input(filename: Option<PathBuf>) -> Result<String> {
    let mut buf = String::new();

    match filename {
        Some(filename) => {
            info!("Reading file: {:?}", filename);

            let file =
                File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
            let mut reader = BufReader::new(file);

            let bytes = reader
                .read_to_string(&mut buf)
                .context(format!("Failed to read file {:?}", filename))?;

            info!("Read {} bytes from {:?}", bytes, filename);
        }

        None => {
            info!("Reading standard input");

            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read standard input")?;
        }
    }

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("hulk.log").context("Failed to create hulk.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'hulk::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("hulk::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to hulk.log");
    Ok(())
}

/// Renders an error the way the prompt shows it:
///
/// ```text
/// ! SEMANTIC ERROR    Variable 'x' is used but not declared.
/// In: let a = 1 in x;
///                  ^
/// ```
fn report_error<W: Write>(out: &mut W, line: &str, err: &HulkError) -> io::Result<()> {
    if err.is_unhandled() {
        return writeln!(out, "! {}    {:?}", err.category(), err);
    }

    writeln!(out, "! {}    {}", err.category(), err)?;
    writeln!(out, "In: {}", line)?;

    if let Some(offset) = err.offset() {
        writeln!(out, "{}^", " ".repeat("In: ".len() + offset))?;
    }

    Ok(())
}

fn repl(config: InterpreterConfig) -> Result<()> {
    info!("Starting REPL");

    let mut interpreter = Interpreter::with_config(config);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        line.clear();

        if stdin.lock().read_line(&mut line)? == 0 {
            writeln!(stdout)?;
            break;
        }

        let source: &str = line.trim_end_matches(['\r', '\n']);

        if source.trim().is_empty() {
            continue;
        }

        match interpreter.run(source) {
            Ok(Some(value)) => writeln!(stdout, "{}", value)?,

            Ok(None) => {}

            Err(e) => {
                debug!("Line failed: {}", e);
                report_error(&mut stdout, source, &e)?;
            }
        }
    }

    info!("REPL finished");
    Ok(())
}

fn run_file(filename: PathBuf, config: InterpreterConfig) -> Result<()> {
    info!("Running file: {:?}", filename);

    let text = read_input(Some(filename))?;
    let mut interpreter = Interpreter::with_config(config);
    let mut stdout = io::stdout();

    for line in text.lines() {
        let source: &str = line.trim();

        if source.is_empty() || source.starts_with('#') {
            continue;
        }

        writeln!(stdout, "> {}", source)?;

        match interpreter.run(source) {
            Ok(Some(value)) => writeln!(stdout, "{}", value)?,

            Ok(None) => {}

            Err(e) => {
                debug!("Line failed: {}", e);
                report_error(&mut stdout, source, &e)?;
            }
        }
    }

    info!("Run completed");
    Ok(())
}

/// Returns `false` if any line failed to scan.
fn tokenize(text: &str, json: bool) -> Result<bool> {
    let mut tokenized = true;
    let mut stderr = io::stderr();

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        if json {
            match scan(line) {
                Ok(tokens) => println!("{}", serde_json::to_string(&tokens)?),

                Err(e) => {
                    tokenized = false;
                    report_error(&mut stderr, line, &e)?;
                }
            }

            continue;
        }

        // Keep going after an error so every bad character is reported.
        for token in Scanner::new(line) {
            match token {
                Ok(token) => {
                    debug!("Scanned token: {}", token);

                    println!("{}", token);
                }

                Err(e) => {
                    tokenized = false;

                    debug!("Tokenization debug: {}", e);

                    report_error(&mut stderr, line, &e)?;
                }
            }
        }
    }

    Ok(tokenized)
}

/// Returns `false` if any line failed to scan or parse.
fn parse(text: &str, json: bool) -> Result<bool> {
    let mut parsed = true;
    let mut stderr = io::stderr();

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let result = scan(line).and_then(|tokens| Parser::new(&tokens).parse());

        match result {
            Ok(expr) => {
                if json {
                    println!("{}", serde_json::to_string(&expr)?);
                } else {
                    let ast_str = AstPrinter::print(&expr);

                    debug!("AST: {}", ast_str);
                    println!("{}", ast_str);
                }
            }

            Err(e) => {
                parsed = false;

                debug!("Parse debug: {}", e);

                report_error(&mut stderr, line, &e)?;
            }
        }
    }

    Ok(parsed)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let config: InterpreterConfig = args.config();

    match args.command.unwrap_or(Commands::Repl) {
        Commands::Repl => repl(config)?,

        Commands::Run { filename } => run_file(filename, config)?,

        Commands::Tokenize { filename, json } => {
            let text = read_input(filename)?;

            if !tokenize(&text, json)? {
                debug!("Tokenization failed, exiting with code 65");

                std::process::exit(65);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename, json } => {
            let text = read_input(filename)?;

            if !parse(&text, json)? {
                debug!("Parse failed, exiting with code 65");

                std::process::exit(65);
            }

            info!("Parse subcommand completed");
        }
    }

    Ok(())
}
