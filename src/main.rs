use clap::Parser as ClapParser;
use log::{debug, error, info, LevelFilter};
use mus::{Interpreter, Lexer, MusError, Parser};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

#[derive(ClapParser, Debug)]
#[command(author, version, about = "The Mus scripting language")]
struct Cli {
    /// Script to run. Omit to start an interactive REPL.
    file: Option<PathBuf>,

    /// Diagnostic log level (error, warn, info, debug, trace). Overrides MUS_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

fn resolve_log_level(cli_level: Option<&str>) -> LevelFilter {
    cli_level
        .map(str::to_owned)
        .or_else(|| std::env::var("MUS_LOG").ok())
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

fn main() {
    let args = Cli::parse();
    let level = resolve_log_level(args.log_level.as_deref());
    simple_logger::init_with_level(level.to_level().unwrap_or(log::Level::Warn))
        .expect("logger already initialized");

    let exit_code = match &args.file {
        Some(path) => run_file(path),
        None => run_repl(),
    };

    std::process::exit(exit_code);
}

fn run_file(path: &PathBuf) -> i32 {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            error!("Could not read '{}': {err}", path.display());
            return 66;
        }
    };
    debug!("loaded '{}' ({} bytes)", path.display(), source.len());
    // Tolerate a leading UTF-8 BOM; the lexer itself also strips one, but
    // files read through this path may already have gone through other
    // tooling that normalizes the BOM away.
    let source = source.strip_prefix('\u{feff}').unwrap_or(&source);

    let interpreter = Interpreter::new();
    info!("interpreter initialized");

    // File-mode execution has no readline loop to intercept Ctrl+C, so a
    // SIGINT handler sets the flag the evaluator polls at statement
    // boundaries; the REPL instead relies on rustyline's own interrupt
    // reporting (see run_repl) and deliberately does not install this.
    let interrupted = interpreter.interrupt_handle();
    if let Err(err) = ctrlc::set_handler(move || interrupted.store(true, std::sync::atomic::Ordering::Relaxed)) {
        debug!("could not install SIGINT handler: {err}");
    }

    match run_source(source, &interpreter) {
        Ok(()) => 0,
        Err(err) => {
            error!("{err}");
            err.exit_code()
        }
    }
}

fn run_source(source: &str, interpreter: &Interpreter) -> Result<(), MusError> {
    let tokens = Lexer::new(source).lex()?;
    let program = Parser::parse(tokens)?;
    interpreter.interpret(&program)
}

fn run_repl() -> i32 {
    println!("mus {}", env!("CARGO_PKG_VERSION"));
    info!("REPL started");
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            error!("Could not start the line editor: {err}");
            return 70;
        }
    };

    let interpreter = Interpreter::new();
    info!("interpreter initialized");

    loop {
        match editor.readline("mus> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                run_repl_line(line, &interpreter);
            }
            // Ctrl+D ends the session normally; Ctrl+C cancels the current
            // line and, per the external interrupt contract, exits 130.
            Err(ReadlineError::Eof) => return 0,
            Err(ReadlineError::Interrupted) => return MusError::Interrupt.exit_code(),
            Err(err) => {
                error!("Readline error: {err}");
                return 70;
            }
        }
    }
}

fn run_repl_line(line: &str, interpreter: &Interpreter) {
    let tokens = match Lexer::new(line).lex() {
        Ok(tokens) => tokens,
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    let program = match Parser::parse(tokens) {
        Ok(program) => program,
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    // A single bare expression echoes its value, matching a REPL's usual feel;
    // anything else (declarations, statements) just executes for effect.
    if let [mus::ast::Stmt::ExpressionStmt(expr)] = program.as_slice() {
        match interpreter.eval_global(expr) {
            Ok(value) => println!("{value}"),
            Err(err) => error!("{err}"),
        }
        return;
    }

    if let Err(err) = interpreter.interpret(&program) {
        error!("{err}");
    }
}
