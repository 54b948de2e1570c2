//! Text front end for [`Function`]s.
//!
//! ```text
//! fn poly(a: shared, b: plain, c: plain) {
//!     x = a * b + a * c;
//!     y = x ** 2 - reveal(a);
//!     return y;
//! }
//! ```
//!
//! Operators: `+`, `*`, `@` (matrix multiply), `**` (power, right
//! associative) and `-` (lowered to an opaque `__sub__` call). Kinds:
//! `plain`, `shared`, `enc_plain`, `enc_cipher`. Assigning an existing name
//! reassigns the same variable.

use bet_ast::{Operator, SecurityKind, ValueId};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{map, opt, recognize},
    multi::{fold_many0, many0, separated_list0},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};
use tracing::debug;

use crate::error::IrError;
use crate::function::{Function, Stmt};
use crate::table::OperatorTable;

// Intermediate AST for parsing
#[derive(Debug, Clone)]
enum ParseNode {
    Int(i64),
    Float(f64),
    Variable(String),
    Binary(Operator, Box<ParseNode>, Box<ParseNode>),
    Sub(Box<ParseNode>, Box<ParseNode>),
    Call(String, Vec<ParseNode>),
}

#[derive(Debug, Clone)]
enum ParseStmt {
    Assign(String, ParseNode),
    Return(ParseNode),
}

#[derive(Debug, Clone)]
struct ParseFunction<'a> {
    name: &'a str,
    params: Vec<(&'a str, &'a str)>,
    body: Vec<ParseStmt>,
}

/// A token, optionally preceded by whitespace.
fn sym<'a>(token: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(multispace0, tag(token))
}

fn parse_identifier(input: &str) -> IResult<&str, &str> {
    preceded(
        multispace0,
        recognize(pair(
            take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        )),
    )(input)
}

// Supports: 123, 8.25
fn parse_number(input: &str) -> IResult<&str, ParseNode> {
    let (rest, text) = preceded(
        multispace0,
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
    )(input)?;

    let overflow = || nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Digit));
    let node = if text.contains('.') {
        ParseNode::Float(text.parse().map_err(|_| overflow())?)
    } else {
        ParseNode::Int(text.parse().map_err(|_| overflow())?)
    };
    Ok((rest, node))
}

fn parse_call(input: &str) -> IResult<&str, ParseNode> {
    let (input, name) = parse_identifier(input)?;
    let (input, args) = delimited(
        sym("("),
        separated_list0(sym(","), parse_expr),
        sym(")"),
    )(input)?;
    Ok((input, ParseNode::Call(name.to_string(), args)))
}

fn parse_atom(input: &str) -> IResult<&str, ParseNode> {
    alt((
        parse_number,
        parse_call,
        map(parse_identifier, |s: &str| ParseNode::Variable(s.to_string())),
        delimited(sym("("), parse_expr, sym(")")),
    ))(input)
}

// Power - right associative: a ** b ** c = a ** (b ** c)
fn parse_power(input: &str) -> IResult<&str, ParseNode> {
    let (input, base) = parse_atom(input)?;
    let (input, caret) = opt(sym("**"))(input)?;
    if caret.is_none() {
        return Ok((input, base));
    }
    let (input, exp) = parse_power(input)?;
    Ok((
        input,
        ParseNode::Binary(Operator::Pow, Box::new(base), Box::new(exp)),
    ))
}

fn parse_term(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_power(input)?;
    fold_many0(
        pair(alt((sym("*"), sym("@"))), parse_power),
        move || init.clone(),
        |acc, (op, val)| {
            let op = if op == "@" { Operator::MatMul } else { Operator::Mul };
            ParseNode::Binary(op, Box::new(acc), Box::new(val))
        },
    )(input)
}

fn parse_expr(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_term(input)?;
    fold_many0(
        pair(alt((sym("+"), sym("-"))), parse_term),
        move || init.clone(),
        |acc, (op, val)| match op {
            "+" => ParseNode::Binary(Operator::Add, Box::new(acc), Box::new(val)),
            _ => ParseNode::Sub(Box::new(acc), Box::new(val)),
        },
    )(input)
}

fn parse_statement(input: &str) -> IResult<&str, ParseStmt> {
    alt((
        map(delimited(sym("return"), parse_expr, sym(";")), ParseStmt::Return),
        map(
            tuple((parse_identifier, sym("="), parse_expr, sym(";"))),
            |(name, _, rhs, _)| ParseStmt::Assign(name.to_string(), rhs),
        ),
    ))(input)
}

fn parse_param(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, name) = parse_identifier(input)?;
    let (input, _) = sym(":")(input)?;
    let (input, kind) = parse_identifier(input)?;
    Ok((input, (name, kind)))
}

fn parse_function_syntax(input: &str) -> IResult<&str, ParseFunction<'_>> {
    let (input, _) = sym("fn")(input)?;
    let (input, name) = parse_identifier(input)?;
    let (input, params) = delimited(sym("("), separated_list0(sym(","), parse_param), sym(")"))(input)?;
    let (input, body) = delimited(sym("{"), many0(parse_statement), sym("}"))(input)?;
    Ok((input, ParseFunction { name, params, body }))
}

fn lower_expr(func: &mut Function, node: &ParseNode) -> Result<ValueId, IrError> {
    match node {
        ParseNode::Int(n) => Ok(func.int(*n)),
        ParseNode::Float(x) => Ok(func.float(*x)),
        ParseNode::Variable(name) => {
            let key = func
                .lookup(name)
                .ok_or_else(|| IrError::UnknownVariable(name.clone()))?;
            Ok(func.read(key))
        }
        ParseNode::Binary(op, l, r) => {
            let lid = lower_expr(func, l)?;
            let rid = lower_expr(func, r)?;
            func.call_operator(*op, lid, rid)
        }
        ParseNode::Sub(l, r) => {
            let lid = lower_expr(func, l)?;
            let rid = lower_expr(func, r)?;
            Ok(func.call_named("__sub__", vec![lid, rid]))
        }
        ParseNode::Call(name, args) => {
            let args = args
                .iter()
                .map(|a| lower_expr(func, a))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(func.call_named(name, args))
        }
    }
}

fn lower(syntax: ParseFunction<'_>, table: OperatorTable) -> Result<Function, IrError> {
    let mut func = Function::new(syntax.name, table);
    for (name, kind) in syntax.params {
        let kind = SecurityKind::from_keyword(kind).ok_or_else(|| IrError::UnknownKind(kind.to_string()))?;
        func.add_param(name, kind);
    }

    for stmt in &syntax.body {
        match stmt {
            ParseStmt::Return(expr) => {
                let value = lower_expr(&mut func, expr)?;
                func.push_stmt(Stmt::Return(value));
            }
            ParseStmt::Assign(name, expr) => {
                let rhs = lower_expr(&mut func, expr)?;
                let found = func.kind_of(rhs);
                let target = match func.lookup(name) {
                    Some(key) => {
                        let declared = func.variable(key).kind;
                        if declared != found {
                            return Err(IrError::KindMismatch {
                                name: name.clone(),
                                declared,
                                found,
                            });
                        }
                        key
                    }
                    None => func.declare(name, found),
                };
                func.push_stmt(Stmt::Assign { target, rhs });
            }
        }
    }

    debug!(function = func.name(), statements = func.len(), "parsed function");
    Ok(func)
}

/// Parse one function, resolving operators against `table`.
pub fn parse_function(input: &str, table: OperatorTable) -> Result<Function, IrError> {
    let (remaining, syntax) =
        parse_function_syntax(input).map_err(|e| IrError::Parse(format!("{}", e)))?;

    let remaining = remaining.trim();
    if !remaining.is_empty() {
        return Err(IrError::UnconsumedInput(remaining.to_string()));
    }

    lower(syntax, table)
}

/// Parse one function against [`OperatorTable::full`].
pub fn parse(input: &str) -> Result<Function, IrError> {
    parse_function(input, OperatorTable::full())
}
