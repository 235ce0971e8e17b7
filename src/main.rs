use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::{self, Write};
use std::path::Path;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser as ClapParser;

use loxide::ast_printer::AstPrinter;
use loxide::error::{Reporter, Result};
use loxide::parser::Parser;
use loxide::scanner::Scanner;
use loxide::token::Token;
use loxide::Lox;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Script to execute; opens an interactive prompt when omitted
    script: Option<PathBuf>,

    /// Print the token stream instead of executing
    #[arg(long)]
    tokenize: bool,

    /// Print the parsed syntax tree instead of executing
    #[arg(long)]
    parse: bool,
}

fn main() -> anyhow::Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,

        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }

        Err(_) => {
            eprintln!("Usage: loxide [--tokenize | --parse] [script]");
            std::process::exit(64);
        }
    };

    match args.script {
        Some(path) => {
            let source: String = match read_source(&path) {
                Ok(source) => source,

                Err(err) => {
                    eprintln!("Could not read {}: {}", path.display(), err);
                    std::process::exit(1);
                }
            };

            if args.tokenize {
                tokenize(&source);
            } else if args.parse {
                parse(&source);
            } else {
                run_file(&source);
            }
        }

        None => run_prompt()?,
    }

    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    let mut reader: BufReader<File> = BufReader::new(File::open(path)?);

    reader.read_to_end(&mut buf)?;

    Ok(String::from_utf8(buf)?)
}

fn run_file(source: &str) {
    let mut lox = Lox::new();

    lox.run(source);

    if lox.had_error() {
        std::process::exit(65);
    }

    if lox.had_runtime_error() {
        std::process::exit(70);
    }
}

fn run_prompt() -> io::Result<()> {
    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        input.clear();

        print!("> ");
        io::stdout().flush()?;

        match stdin.read_line(&mut input) {
            // EOF closes the session, same as an empty line below.
            Ok(0) => break,

            Ok(_) => {}

            Err(e) => {
                eprintln!("Failed to read line: {}", e);
                continue;
            }
        }

        let line: &str = input.trim_end_matches(['\n', '\r']);

        if line.is_empty() {
            break;
        }

        lox.run(line);
        lox.clear_error();
    }

    Ok(())
}

fn tokenize(source: &str) {
    let mut clean = true;

    for result in Scanner::new(source) {
        match result {
            Ok(token) => println!("{}", token),

            Err(error) => {
                clean = false;
                eprintln!("{}", error);
            }
        }
    }

    if !clean {
        std::process::exit(65);
    }
}

fn parse(source: &str) {
    let mut reporter = Reporter::new();
    let mut tokens: Vec<Token> = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),

            Err(error) => reporter.report(&error),
        }
    }

    let statements = Parser::new(tokens, &mut reporter).parse();

    if reporter.had_error {
        std::process::exit(65);
    }

    for stmt in &statements {
        println!("{}", AstPrinter::print_stmt(stmt));
    }
}
