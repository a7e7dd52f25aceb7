use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::multispace0,
    combinator::{map, opt},
    multi::fold_many0,
    sequence::{delimited, pair, preceded},
    IResult,
};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use std::str::FromStr;

use crate::error::PolyError;
use crate::poly::Poly;
use crate::rational::RationalFunction;

// ============================================================================
// Parse tree
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum ParseNode {
    Number(BigRational),
    Variable(String),
    Add(Box<ParseNode>, Box<ParseNode>),
    Sub(Box<ParseNode>, Box<ParseNode>),
    Mul(Box<ParseNode>, Box<ParseNode>),
    Div(Box<ParseNode>, Box<ParseNode>),
    Pow(Box<ParseNode>, Box<ParseNode>),
    Neg(Box<ParseNode>),
}

impl ParseNode {
    fn lower(&self) -> Result<RationalFunction, PolyError> {
        Ok(match self {
            ParseNode::Number(r) => RationalFunction::constant(r.clone()),
            ParseNode::Variable(name) => RationalFunction::var(name),
            ParseNode::Add(l, r) => l.lower()? + r.lower()?,
            ParseNode::Sub(l, r) => l.lower()? - r.lower()?,
            ParseNode::Mul(l, r) => l.lower()? * r.lower()?,
            ParseNode::Div(l, r) => l.lower()?.checked_div(&r.lower()?)?,
            ParseNode::Neg(inner) => -inner.lower()?,
            ParseNode::Pow(base, exp) => {
                let exp = exp.lower()?;
                let value = exp
                    .constant_value()
                    .filter(|v| v.is_integer())
                    .ok_or_else(|| PolyError::Parse(format!("exponent must be an integer, found {exp}")))?;
                let exp = i64::try_from(value.to_integer())
                    .map_err(|_| PolyError::Parse(format!("exponent {value} is too large")))?;
                base.lower()?.powi(exp)?
            }
        })
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// "8.2" → 41/5, ".5" → 1/2, "8." → 8, "123" → 123
fn decimal_to_rational(integer_part: &str, fractional_part: &str) -> BigRational {
    let int_val: BigInt = integer_part.parse().unwrap_or_else(|_| BigInt::zero());
    if fractional_part.is_empty() {
        return BigRational::from_integer(int_val);
    }
    let denominator = num_traits::pow(BigInt::from(10), fractional_part.len());
    let frac_val: BigInt = fractional_part.parse().unwrap_or_else(|_| BigInt::zero());
    BigRational::new(int_val * &denominator + frac_val, denominator)
}

fn parse_number(input: &str) -> IResult<&str, ParseNode> {
    fn is_digit(c: char) -> bool {
        c.is_ascii_digit()
    }

    let (remaining, (int_part, maybe_frac)) = pair(
        take_while(is_digit),
        opt(pair(tag("."), take_while(is_digit))),
    )(input)?;
    let frac_part = maybe_frac.map(|(_, frac)| frac).unwrap_or("");

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }
    Ok((remaining, ParseNode::Number(decimal_to_rational(int_part, frac_part))))
}

// Identifiers start with a letter or underscore: n, x1, a_2
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    let starts_ok = input
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Alpha,
        )));
    }
    let len = input
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(input.len());
    Ok((&input[len..], &input[..len]))
}

fn parse_variable(input: &str) -> IResult<&str, ParseNode> {
    map(parse_identifier, |s: &str| ParseNode::Variable(s.to_string()))(input)
}

fn parse_parens(input: &str) -> IResult<&str, ParseNode> {
    delimited(
        preceded(multispace0, tag("(")),
        parse_expr,
        preceded(multispace0, tag(")")),
    )(input)
}

fn parse_atom(input: &str) -> IResult<&str, ParseNode> {
    preceded(multispace0, alt((parse_number, parse_variable, parse_parens)))(input)
}

// ============================================================================
// Grammar
// ============================================================================

// Power - right associative, exponent may carry a sign: n^-1
fn parse_power(input: &str) -> IResult<&str, ParseNode> {
    let (input, base) = parse_atom(input)?;
    let try_caret = preceded::<_, _, _, nom::error::Error<&str>, _, _>(
        multispace0::<_, nom::error::Error<&str>>,
        alt((tag("^"), tag("**"))),
    )(input);

    if let Ok((input, _)) = try_caret {
        let (input, exp) = parse_power_exponent(input)?;
        Ok((input, ParseNode::Pow(Box::new(base), Box::new(exp))))
    } else {
        Ok((input, base))
    }
}

fn parse_power_exponent(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            map(pair(tag("-"), parse_power_exponent), |(_, expr)| {
                ParseNode::Neg(Box::new(expr))
            }),
            map(pair(tag("+"), parse_power_exponent), |(_, expr)| expr),
            parse_power,
        )),
    )(input)
}

fn parse_unary(input: &str) -> IResult<&str, ParseNode> {
    alt((
        map(
            pair(preceded(multispace0, tag("-")), parse_unary),
            |(_, expr)| ParseNode::Neg(Box::new(expr)),
        ),
        map(
            pair(preceded(multispace0, tag("+")), parse_unary),
            |(_, expr)| expr,
        ),
        parse_power,
    ))(input)
}

// Explicit * and /, interleaved with implicit multiplication:
// 2n → 2*n, 3(n+1) → 3*(n+1), 2n*(n+1)
fn parse_term(input: &str) -> IResult<&str, ParseNode> {
    let (mut input, mut acc) = parse_unary(input)?;
    loop {
        let (rest, folded) = fold_many0(
            pair(
                preceded(
                    multispace0,
                    alt((
                        map(pair(tag("*"), nom::combinator::not(tag("*"))), |_| "*"),
                        tag("/"),
                    )),
                ),
                parse_unary,
            ),
            move || acc.clone(),
            |acc, (op, val)| match op {
                "/" => ParseNode::Div(Box::new(acc), Box::new(val)),
                _ => ParseNode::Mul(Box::new(acc), Box::new(val)),
            },
        )(input)?;
        let (rest, chained) = parse_implicit_mul_chain(rest, folded)?;
        if rest.len() == input.len() {
            return Ok((rest, chained));
        }
        input = rest;
        acc = chained;
    }
}

// Only directly adjacent factors (no whitespace) after a number or power
fn parse_implicit_mul_chain(input: &str, acc: ParseNode) -> IResult<&str, ParseNode> {
    let adjacent = input
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '(');
    if adjacent && can_implicit_mul(&acc) {
        if let Ok((remaining, next_factor)) = parse_power(input) {
            let new_acc = ParseNode::Mul(Box::new(acc), Box::new(next_factor));
            return parse_implicit_mul_chain(remaining, new_acc);
        }
    }
    Ok((input, acc))
}

fn can_implicit_mul(node: &ParseNode) -> bool {
    match node {
        ParseNode::Number(_) | ParseNode::Pow(_, _) | ParseNode::Variable(_) => true,
        // Only a parenthesized group can be an Add/Sub at term level: (n+1)(n+2)
        ParseNode::Add(_, _) | ParseNode::Sub(_, _) => true,
        ParseNode::Mul(_, right) | ParseNode::Div(_, right) => can_implicit_mul(right),
        ParseNode::Neg(inner) => can_implicit_mul(inner),
    }
}

fn parse_expr(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_term(input)?;
    fold_many0(
        pair(preceded(multispace0, alt((tag("+"), tag("-")))), parse_term),
        move || init.clone(),
        |acc, (op, val)| match op {
            "+" => ParseNode::Add(Box::new(acc), Box::new(val)),
            _ => ParseNode::Sub(Box::new(acc), Box::new(val)),
        },
    )(input)
}

// ============================================================================
// Entry points
// ============================================================================

/// Parse a rational function such as `(n^2 + 1)/(2n - 3)`
pub fn parse_rational_function(input: &str) -> Result<RationalFunction, PolyError> {
    let (remaining, node) = parse_expr(input).map_err(|e| PolyError::Parse(format!("{e}")))?;
    let remaining = remaining.trim();
    if !remaining.is_empty() {
        return Err(PolyError::UnconsumedInput(remaining.to_string()));
    }
    node.lower()
}

/// Parse a polynomial; division is allowed when the result is polynomial
pub fn parse_poly(input: &str) -> Result<Poly, PolyError> {
    parse_rational_function(input)?.as_poly()
}

impl FromStr for Poly {
    type Err = PolyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_poly(s)
    }
}

impl FromStr for RationalFunction {
    type Err = PolyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_rational_function(s)
    }
}

#[cfg(test)]
pub(crate) fn p(input: &str) -> Poly {
    parse_poly(input).unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"))
}
