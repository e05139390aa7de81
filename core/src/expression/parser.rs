//! Expression parser for parameter functions.
//!
//! Supports:
//! - Numbers (integers, decimals, scientific notation)
//! - The variables `x` and `T`
//! - Arithmetic operators (+, -, *, /, **)
//! - Unary minus and plus
//! - Parentheses for grouping
//! - Calls into the [`FunctionRegistry`]
//!
//! Anything else is rejected; there are no assignments, statements or free
//! identifiers.

use super::functions::{Builtin, FunctionRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// Syntax error with location info
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Syntax error at position {position}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub position: usize,
}

impl SyntaxError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// The variables an expression may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// Stoichiometry, concentration or whatever the field is a function of.
    #[serde(rename = "x")]
    X,
    /// Temperature in kelvin.
    #[serde(rename = "T")]
    T,
}

impl Variable {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(Self::X),
            "T" => Some(Self::T),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::T => "T",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Variable reference
    Variable(Variable),
    /// Unary operation (negation)
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Function call, resolved against the registry at parse time
    Call {
        function: Builtin,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// The variables referenced anywhere in this tree.
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut found = BTreeSet::new();
        self.collect_variables(&mut found);
        found
    }

    fn collect_variables(&self, found: &mut BTreeSet<Variable>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(v) => {
                found.insert(*v);
            }
            Expr::UnaryOp { operand, .. } => operand.collect_variables(found),
            Expr::BinaryOp { left, right, .. } => {
                left.collect_variables(found);
                right.collect_variables(found);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(found);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "**",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Neg,
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    LParen,
    RParen,
    Comma,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::Identifier(name) => write!(f, "'{}'", name),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::DoubleStar => f.write_str("'**'"),
            Token::Slash => f.write_str("'/'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// Tokenizer
struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    fn next_token(&mut self) -> Result<(Token, usize), SyntaxError> {
        self.skip_whitespace();

        let pos = self.position;

        let token = match self.chars.peek() {
            None => Token::Eof,
            Some(&c) => match c {
                '+' => self.single(Token::Plus),
                '-' => self.single(Token::Minus),
                '/' => self.single(Token::Slash),
                '(' => self.single(Token::LParen),
                ')' => self.single(Token::RParen),
                ',' => self.single(Token::Comma),
                '*' => {
                    self.advance();
                    if self.chars.peek() == Some(&'*') {
                        self.advance();
                        Token::DoubleStar
                    } else {
                        Token::Star
                    }
                }
                c if c.is_ascii_digit() || c == '.' => self.read_number()?,
                c if c.is_ascii_alphabetic() || c == '_' => Token::Identifier(self.read_identifier()),
                _ => {
                    return Err(SyntaxError::new(format!("Unexpected character: '{}'", c), pos));
                }
            },
        };

        Ok((token, pos))
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    // Positions are byte offsets into the input.
    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Result<Token, SyntaxError> {
        let pos = self.position;
        let mut num_str = String::new();
        let mut has_dot = false;

        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                num_str.push(c);
                self.advance();
            } else if c == '.' && !has_dot {
                has_dot = true;
                num_str.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // Handle scientific notation (e.g., 1e10, 1.5e-3)
        if let Some(&c) = self.chars.peek() {
            if c == 'e' || c == 'E' {
                num_str.push(c);
                self.advance();
                if let Some(&sign) = self.chars.peek() {
                    if sign == '+' || sign == '-' {
                        num_str.push(sign);
                        self.advance();
                    }
                }
                while let Some(&c) = self.chars.peek() {
                    if c.is_ascii_digit() {
                        num_str.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        match num_str.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Token::Number(n)),
            Ok(_) => Err(SyntaxError::new(format!("Number out of range: '{}'", num_str), pos)),
            Err(_) => Err(SyntaxError::new(format!("Invalid number: '{}'", num_str), pos)),
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        name
    }
}

/// Deepest nesting of groups, calls, signs, exponents and operator chains
/// accepted before parsing gives up.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parser for expressions
struct Parser<'a> {
    lexer: Lexer<'a>,
    registry: &'a FunctionRegistry,
    current: Token,
    current_pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, registry: &'a FunctionRegistry) -> Result<Self, SyntaxError> {
        let mut lexer = Lexer::new(input);
        let (current, current_pos) = lexer.next_token()?;
        Ok(Self {
            lexer,
            registry,
            current,
            current_pos,
            depth: 0,
        })
    }

    fn advance(&mut self) -> Result<(), SyntaxError> {
        let (token, pos) = self.lexer.next_token()?;
        self.current = token;
        self.current_pos = pos;
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.current_pos)
    }

    // Every nesting level, including each link of an operator chain, adds a
    // level to the tree that evaluation later recurses through.
    fn enter(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.error(format!(
                "expression nested too deeply (limit {})",
                MAX_NESTING_DEPTH
            )));
        }
        Ok(())
    }

    fn expect(&mut self, token: Token, context: &str) -> Result<(), SyntaxError> {
        if self.current != token {
            return Err(self.error(format!("Expected {} {}, found {}", token, context, self.current)));
        }
        self.advance()
    }

    fn parse(&mut self) -> Result<Expr, SyntaxError> {
        let expr = self.parse_additive()?;
        if self.current != Token::Eof {
            return Err(self.error(format!("Unexpected {} after expression", self.current)));
        }
        Ok(expr)
    }

    // Additive: term (('+' | '-') term)*
    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let depth = self.depth;
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.enter()?;
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = depth;
        Ok(left)
    }

    // Multiplicative: unary (('*' | '/') unary)*
    fn parse_multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let depth = self.depth;
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                _ => break,
            };
            self.enter()?;
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = depth;
        Ok(left)
    }

    // Unary: ('-' | '+') unary | power
    // Binds looser than '**', so -x**2 is -(x**2).
    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        match self.current {
            Token::Minus => {
                self.enter()?;
                self.advance()?;
                let operand = self.parse_unary()?;
                self.depth -= 1;
                Ok(Expr::UnaryOp {
                    op: UnaryOperator::Neg,
                    operand: Box::new(operand),
                })
            }
            Token::Plus => {
                self.enter()?;
                self.advance()?;
                let operand = self.parse_unary()?;
                self.depth -= 1;
                Ok(operand)
            }
            _ => self.parse_power(),
        }
    }

    // Power: primary ('**' unary)?  (right associative, signed exponent allowed)
    fn parse_power(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.parse_primary()?;

        if self.current == Token::DoubleStar {
            self.enter()?;
            self.advance()?;
            let exp = self.parse_unary()?;
            self.depth -= 1;
            Ok(Expr::BinaryOp {
                op: BinaryOperator::Pow,
                left: Box::new(base),
                right: Box::new(exp),
            })
        } else {
            Ok(base)
        }
    }

    // Primary: number | variable | function_call | '(' expr ')'
    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        match &self.current {
            Token::Number(n) => {
                let val = *n;
                self.advance()?;
                Ok(Expr::Number(val))
            }
            Token::Identifier(name) => {
                let name = name.clone();
                let name_pos = self.current_pos;
                self.advance()?;

                if self.current == Token::LParen {
                    return self.parse_call(&name, name_pos);
                }
                match Variable::from_name(&name) {
                    Some(var) => Ok(Expr::Variable(var)),
                    None => Err(SyntaxError::new(
                        format!("Unknown identifier: '{}' (only 'x' and 'T' are variables)", name),
                        name_pos,
                    )),
                }
            }
            Token::LParen => {
                self.enter()?;
                self.advance()?;
                let expr = self.parse_additive()?;
                self.expect(Token::RParen, "to close '('")?;
                self.depth -= 1;
                Ok(expr)
            }
            _ => Err(self.error(format!("Unexpected {}", self.current))),
        }
    }

    // Call: name '(' expr (',' expr)* ')'
    fn parse_call(&mut self, name: &str, name_pos: usize) -> Result<Expr, SyntaxError> {
        let function = *self.registry.get(name).ok_or_else(|| {
            SyntaxError::new(format!("Unknown function: '{}'", name), name_pos)
        })?;
        self.enter()?;
        self.advance()?; // consume '('

        let mut args = vec![self.parse_additive()?];
        while self.current == Token::Comma {
            self.advance()?;
            args.push(self.parse_additive()?);
        }
        self.expect(Token::RParen, "after function arguments")?;
        self.depth -= 1;

        if args.len() != function.arity {
            return Err(SyntaxError::new(
                format!(
                    "Function '{}' takes {} argument(s), got {}",
                    name,
                    function.arity,
                    args.len()
                ),
                name_pos,
            ));
        }
        Ok(Expr::Call { function, args })
    }
}

/// Parse an expression string into an AST using the standard function registry
pub fn parse_expression(input: &str) -> Result<Expr, SyntaxError> {
    parse_with(input, FunctionRegistry::standard())
}

/// Parse an expression string against an explicit function registry
pub fn parse_with(input: &str, registry: &FunctionRegistry) -> Result<Expr, SyntaxError> {
    if input.trim().is_empty() {
        return Err(SyntaxError::new("Empty expression", 0));
    }
    let mut parser = Parser::new(input, registry)?;
    parser.parse()
}
