use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::expr::{Expr, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, Value};

/// Non-local exits threading up through the evaluator.
///
/// `Return` unwinds to the nearest function-call boundary; `Error` surfaces
/// all the way out of `interpret`. Keeping both on one channel lets every
/// intermediate frame propagate with `?`.
#[derive(Debug)]
pub enum Interrupt {
    Return(Value),
    Error(LoxError),
}

impl From<LoxError> for Interrupt {
    fn from(error: LoxError) -> Self {
        Interrupt::Error(error)
    }
}

impl From<io::Error> for Interrupt {
    fn from(error: io::Error) -> Self {
        Interrupt::Error(LoxError::Io(error))
    }
}

type Exec<T> = std::result::Result<T, Interrupt>;

/// Tree-walking evaluator.
///
/// Owns the global scope (pre-populated with `clock`), the current
/// environment pointer, and the side table mapping expression ids to the
/// scope depths the resolver recorded. Program output is written to `W`, so
/// tests can capture it by constructing the interpreter over a `Vec<u8>`.
pub struct Interpreter<W: Write> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<usize, usize>,
    output: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(output: W) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock_native,
            },
        );

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Resolver callback: this occurrence is a local, `depth` scopes up.
    /// Occurrences never recorded here resolve through the globals.
    pub fn note_local(&mut self, id: usize, depth: usize) {
        debug!("Recording local binding: id={}, depth={}", id, depth);

        self.locals.insert(id, depth);
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                // The resolver rejects top-level `return`, so an unwound
                // return can only reach here on an AST it never vetted.
                Err(Interrupt::Return(_)) => break,

                Err(Interrupt::Error(error)) => return Err(error),
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Exec<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,

                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,

                    None => Value::Nil,
                };

                Err(Interrupt::Return(value))
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction {
                    declaration: Rc::clone(declaration),
                    closure: Rc::clone(&self.environment),
                    is_initializer: false,
                };

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass, methods),
        }
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: &Option<Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Exec<()> {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),

                _ => {
                    let line = superclass_line(expr).unwrap_or(name.line);

                    return Err(LoxError::runtime(line, "Superclass must be a class.").into());
                }
            },

            None => None,
        };

        // Two-stage definition: the name exists (as nil) while the methods
        // are built, so they can close over it.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        // When inheriting, methods close over an extra scope defining `super`.
        let enclosing: Option<Rc<RefCell<Environment>>> = superclass_value.as_ref().map(|sc| {
            let previous = Rc::clone(&self.environment);

            let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                &previous,
            ))));

            environment
                .borrow_mut()
                .define("super", Value::Class(Rc::clone(sc)));

            self.environment = environment;

            previous
        });

        let mut method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for declaration in methods {
            let function = LoxFunction {
                declaration: Rc::clone(declaration),
                closure: Rc::clone(&self.environment),
                is_initializer: declaration.name.lexeme == "init",
            };

            method_map.insert(declaration.name.lexeme.clone(), Rc::new(function));
        }

        let class = Value::Class(Rc::new(LoxClass {
            name: name.lexeme.clone(),
            superclass: superclass_value,
            methods: method_map,
        }));

        if let Some(previous) = enclosing {
            self.environment = previous;
        }

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, class, name.line)?;

        Ok(())
    }

    fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Exec<()> {
        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        self.environment = environment;

        for stmt in statements {
            // Restore the enclosing scope on every exit path, including
            // returns and runtime failures.
            if let Err(interrupt) = self.execute(stmt) {
                self.environment = previous;

                return Err(interrupt);
            }
        }

        self.environment = previous;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> Exec<Value> {
        match expr {
            Expr::Literal(literal) => Ok(evaluate_literal(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone(), name.line)?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => self.evaluate_get(object, name),

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value: Value = self.evaluate(value)?;

                        instance.borrow_mut().set_field(&name.lexeme, value.clone());

                        Ok(value)
                    }

                    _ => Err(LoxError::runtime(name.line, "Only instances have fields.").into()),
                }
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Exec<Value> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(operator.line, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Exec<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::SLASH => match (left_val, right_val) {
                // IEEE-754 semantics: division by zero yields an infinity.
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left_val, &right_val))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left_val, &right_val))),

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(numbers_required(operator)),
            },

            _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.").into()),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Exec<Value> {
        let left_val: Value = self.evaluate(left)?;

        match operator.token_type {
            // Short-circuiting returns the raw operand, never a coerced bool.
            TokenType::OR => {
                if is_truthy(&left_val) {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            TokenType::AND => {
                if !is_truthy(&left_val) {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            _ => Err(LoxError::runtime(operator.line, "Invalid logical operator.").into()),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Exec<Value> {
        let callee_val: Value = self.evaluate(callee)?;

        let mut arg_values: Vec<Value> = Vec::new();

        for arg in arguments {
            arg_values.push(self.evaluate(arg)?);
        }

        match callee_val {
            Value::NativeFunction { arity, func, .. } => {
                check_arity(arity, arg_values.len(), paren)?;

                func(&arg_values).map_err(|message| LoxError::runtime(paren.line, message).into())
            }

            Value::Function(function) => {
                check_arity(function.arity(), arg_values.len(), paren)?;

                self.call_function(&function, arg_values)
            }

            Value::Class(class) => {
                check_arity(class.arity(), arg_values.len(), paren)?;

                self.instantiate(&class, arg_values)
            }

            _ => {
                Err(LoxError::runtime(paren.line, "Can only call functions and classes.").into())
            }
        }
    }

    fn evaluate_get(&mut self, object: &Expr, name: &Token) -> Exec<Value> {
        let object: Value = self.evaluate(object)?;

        match object {
            Value::Instance(instance) => {
                // Fields shadow methods.
                if let Some(value) = instance.borrow().get_field(&name.lexeme) {
                    return Ok(value);
                }

                let method = instance.borrow().class.find_method(&name.lexeme);

                match method {
                    Some(method) => Ok(Value::Function(Rc::new(
                        method.bind(Value::Instance(Rc::clone(&instance))),
                    ))),

                    None => Err(LoxError::runtime(
                        name.line,
                        format!("Undefined property '{}'.", name.lexeme),
                    )
                    .into()),
                }
            }

            _ => Err(LoxError::runtime(name.line, "Only instances have properties.").into()),
        }
    }

    fn evaluate_super(&mut self, id: usize, keyword: &Token, method: &Token) -> Exec<Value> {
        let distance: usize = match self.locals.get(&id) {
            Some(&distance) => distance,

            None => {
                return Err(LoxError::runtime(keyword.line, "Undefined variable 'super'.").into())
            }
        };

        let superclass: Value =
            Environment::get_at(&self.environment, distance, "super", keyword.line)?;

        // `this` lives in the scope immediately inside the one holding `super`.
        let object: Value =
            Environment::get_at(&self.environment, distance - 1, "this", keyword.line)?;

        match superclass {
            Value::Class(class) => match class.find_method(&method.lexeme) {
                Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),

                None => Err(LoxError::runtime(
                    method.line,
                    format!("Undefined property '{}'.", method.lexeme),
                )
                .into()),
            },

            _ => Err(LoxError::runtime(keyword.line, "Superclass must be a class.").into()),
        }
    }

    fn look_up_variable(&self, id: usize, name: &Token) -> Exec<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(Environment::get_at(
                &self.environment,
                distance,
                &name.lexeme,
                name.line,
            )?),

            None => Ok(self.globals.borrow().get(&name.lexeme, name.line)?),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invocation
    // ─────────────────────────────────────────────────────────────────────────

    fn call_function(&mut self, function: &LoxFunction, arguments: Vec<Value>) -> Exec<Value> {
        debug!("Calling function {}", function.name());

        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &function.closure,
        ))));

        for (param, argument) in function.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        let result = self.execute_block(&function.declaration.body, environment);
        let line: usize = function.declaration.name.line;

        match result {
            // An initializer always yields its instance, with or without an
            // explicit bare `return`.
            Ok(()) => {
                if function.is_initializer {
                    return Ok(Environment::get_at(&function.closure, 0, "this", line)?);
                }

                Ok(Value::Nil)
            }

            Err(Interrupt::Return(value)) => {
                if function.is_initializer {
                    return Ok(Environment::get_at(&function.closure, 0, "this", line)?);
                }

                Ok(value)
            }

            Err(interrupt) => Err(interrupt),
        }
    }

    fn instantiate(&mut self, class: &Rc<LoxClass>, arguments: Vec<Value>) -> Exec<Value> {
        let instance = Value::Instance(Rc::new(RefCell::new(LoxInstance::new(Rc::clone(class)))));

        if let Some(initializer) = class.find_method("init") {
            let bound: LoxFunction = initializer.bind(instance.clone());

            self.call_function(&bound, arguments)?;
        }

        Ok(instance)
    }
}

fn evaluate_literal(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::True => Value::Bool(true),

        LiteralValue::False => Value::Bool(false),

        LiteralValue::Nil => Value::Nil,

        LiteralValue::Str(s) => Value::String(s.clone()),

        LiteralValue::Number(n) => Value::Number(*n),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn is_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,

        // Host IEEE-754 equality, so NaN != NaN.
        (Value::Number(a), Value::Number(b)) => a == b,

        (Value::String(a), Value::String(b)) => a == b,

        (Value::Bool(a), Value::Bool(b)) => a == b,

        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),

        (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),

        (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),

        (Value::NativeFunction { name: a, .. }, Value::NativeFunction { name: b, .. }) => a == b,

        _ => false,
    }
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> Exec<()> {
    if expected != got {
        return Err(LoxError::runtime(
            paren.line,
            format!("Expected {} arguments but got {}.", expected, got),
        )
        .into());
    }

    Ok(())
}

fn superclass_line(expr: &Expr) -> Option<usize> {
    if let Expr::Variable { name, .. } = expr {
        Some(name.line)
    } else {
        None
    }
}

#[inline]
fn numbers_required(operator: &Token) -> Interrupt {
    LoxError::runtime(operator.line, "Operands must be numbers.").into()
}

fn clock_native(_args: &[Value]) -> std::result::Result<Value, String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
