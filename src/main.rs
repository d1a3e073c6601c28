use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{Config, Editor};

use loam::config::{
    EXIT_PARSE_ERROR, EXIT_RESOLVE_ERROR, HISTORY_FILE, PROMPT, WELCOME_MESSAGE, WELCOME_SUBTITLE,
};
use loam::highlighter::LoamHelper;
use loam::interpreter::Interpreter;
use loam::lexer::Lexer;
use loam::parser::Parser;
use loam::resolver::Resolver;
use loam::value::Value;

/// Interpreter for the loam scripting language
#[derive(ClapParser, Debug)]
#[command(name = "loam")]
#[command(version = loam::config::VERSION)]
#[command(about = "A class-based, dynamically-typed scripting language")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if let Some(script_path) = args.script {
        run_script(&script_path);
        return Ok(());
    }

    println!("{} v{}", WELCOME_MESSAGE, loam::config::VERSION);
    println!("{}", WELCOME_SUBTITLE);
    repl()
}

/// Executes a script file: parse everything, resolve everything, then
/// interpret. The final non-null value is printed via its `__repr__`.
fn run_script(path: &PathBuf) {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Cannot read script file {}: {}", path.display(), err);
            process::exit(1);
        }
    };

    let mut interpreter = Interpreter::new();
    let mut parser = Parser::new(Lexer::new(&source));
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        print_parser_errors(parser.errors());
    }

    if let Err(err) = Resolver::new(&mut interpreter).resolve_program(&program) {
        eprintln!("{}", err);
        process::exit(EXIT_RESOLVE_ERROR);
    }

    match interpreter.interpret(&program) {
        Ok(Some(value)) if !matches!(value, Value::Null) => {
            match interpreter.repr_string(&value) {
                Ok(rendered) => println!("{}", rendered),
                Err(err) => {
                    eprintln!("Error: {}", err);
                    process::exit(1);
                }
            }
        }
        Ok(_) => {}
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}

/// The interactive loop. Every line shares one interpreter, so definitions
/// persist; node ids are threaded between parsers so the resolver's side
/// table stays consistent across lines.
fn repl() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<LoamHelper, FileHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(LoamHelper::new()));
    let _ = rl.load_history(HISTORY_FILE);

    let mut interpreter = Interpreter::new();
    let mut next_id = 0;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                let mut parser = Parser::with_first_id(Lexer::new(&line), next_id);
                let program = parser.parse_program();
                if !parser.errors().is_empty() {
                    let _ = rl.save_history(HISTORY_FILE);
                    print_parser_errors(parser.errors());
                }
                next_id = parser.next_node_id();

                if let Err(err) = Resolver::new(&mut interpreter).resolve_program(&program) {
                    eprintln!("{}", err);
                    continue;
                }

                match interpreter.interpret(&program) {
                    Ok(Some(value)) if !matches!(value, Value::Null) => {
                        match interpreter.repr_string(&value) {
                            Ok(rendered) => println!("{}", rendered),
                            Err(err) => eprintln!("Error: {}", err),
                        }
                    }
                    Ok(_) => {}
                    Err(err) => eprintln!("Error: {}", err),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    Ok(())
}

/// Prints accumulated parser errors, one per line with a leading tab, and
/// exits with the parse-error sentinel code.
fn print_parser_errors(errors: &[String]) -> ! {
    for message in errors {
        println!("\t{}", message);
    }
    process::exit(EXIT_PARSE_ERROR);
}
