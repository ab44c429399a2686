use std::io::{BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use afbpl_lang::{Error, Interpreter, Step};

/// Изпълнява програми на АФБПЛ-1 в терминала.
#[derive(Parser, Debug)]
#[command(name = "afbpl")]
#[command(about = "Интерпретатор за АФБПЛ-1", long_about = None)]
struct Args {
    /// Файл с програмата
    program: std::path::PathBuf,

    /// Отпечатва декорирания изходен код след изпълнение
    #[arg(long)]
    annotate: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // AFBPL_LOG or RUST_LOG controls verbosity; warnings by default.
    use tracing_subscriber::{EnvFilter, fmt};
    let filter = EnvFilter::try_from_env("AFBPL_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let source = match std::fs::read_to_string(&args.program) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Грешка: файлът '{}' не може да се прочете: {e}", args.program.display());
            return ExitCode::FAILURE;
        }
    };

    let mut engine = match afbpl_lang::load(&source) {
        Ok(engine) => engine,
        Err(e) => {
            report(&e, &source);
            return ExitCode::FAILURE;
        }
    };
    debug!(file = %args.program.display(), "program loaded");

    let status = drive(&mut engine, &source);

    if args.annotate {
        println!("{}", engine.source().to_html());
    }
    status
}

/// Run the program to its end, relaying output and feeding it one line of
/// user text whenever it suspends on `вход`.
fn drive(engine: &mut Interpreter, source: &str) -> ExitCode {
    let stdin = std::io::stdin();
    let mut step = engine.resume();
    loop {
        for line in engine.take_output() {
            println!("{line}");
        }
        match step {
            Ok(Step::Completed) => return ExitCode::SUCCESS,
            Ok(Step::AwaitingInput) => {
                print!("> ");
                if std::io::stdout().flush().is_err() {
                    return ExitCode::FAILURE;
                }
                let mut answer = String::new();
                match stdin.lock().read_line(&mut answer) {
                    Ok(0) | Err(_) => {
                        eprintln!("Грешка: програмата очаква вход, но той свърши.");
                        return ExitCode::FAILURE;
                    }
                    Ok(_) => {}
                }
                let answer = answer.trim_end_matches(['\r', '\n']);
                step = engine.provide_input(answer);
            }
            Err(e) => {
                report(&e, source);
                return ExitCode::FAILURE;
            }
        }
    }
}

/// Print the diagnostic with the offending line and a caret under its span.
fn report(error: &Error, source: &str) {
    eprintln!("Грешка: {error}");
    let Some(line) = source.split('\n').nth(error.line) else { return };
    eprintln!("  {line}");
    if let Some((start, end)) = error.span {
        let lead: usize = line
            .get(..start)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(0);
        let width = line
            .get(start..end)
            .map(|part| part.chars().count().max(1))
            .unwrap_or(1);
        eprintln!("  {}{}", " ".repeat(lead), "^".repeat(width));
    }
}
