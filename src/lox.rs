use std::io::{self, Write};

use log::info;

use crate::error::Reporter;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

/// One interpreter session: the scan → parse → resolve → interpret pipeline
/// plus the diagnostic flags the exit-code policy needs.
///
/// Globals and the resolution side table live in the interpreter, so
/// consecutive `run` calls share state — which is exactly what the REPL
/// wants.
pub struct Lox<W: Write> {
    interpreter: Interpreter<W>,
    reporter: Reporter,
}

impl Lox<io::Stdout> {
    pub fn new() -> Self {
        Lox::with_output(io::stdout())
    }
}

impl Default for Lox<io::Stdout> {
    fn default() -> Self {
        Lox::new()
    }
}

impl<W: Write> Lox<W> {
    pub fn with_output(output: W) -> Self {
        Lox {
            interpreter: Interpreter::new(output),
            reporter: Reporter::new(),
        }
    }

    /// Run one source unit. Static errors (scan, parse, resolve) suppress
    /// execution entirely; a runtime error aborts it and latches the runtime
    /// flag.
    pub fn run(&mut self, source: &str) {
        info!("Running {} byte(s) of source", source.len());

        let mut tokens: Vec<Token> = Vec::new();

        for result in Scanner::new(source) {
            match result {
                Ok(token) => tokens.push(token),

                Err(error) => self.reporter.report(&error),
            }
        }

        let statements: Vec<Stmt> = Parser::new(tokens, &mut self.reporter).parse();

        if self.reporter.had_error {
            return;
        }

        Resolver::new(&mut self.interpreter, &mut self.reporter).resolve(&statements);

        if self.reporter.had_error {
            return;
        }

        if let Err(error) = self.interpreter.interpret(&statements) {
            self.reporter.report(&error);
        }
    }

    pub fn had_error(&self) -> bool {
        self.reporter.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.reporter.had_runtime_error
    }

    /// REPL support: forgive static errors between lines.
    pub fn clear_error(&mut self) {
        self.reporter.reset();
    }

    pub fn into_output(self) -> W {
        self.interpreter.into_output()
    }
}
