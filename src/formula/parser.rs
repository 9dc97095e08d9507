//! Formula text parser
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or         := and ("||" and)*
//! and        := comparison ("&&" comparison)*
//! comparison := additive (cmp additive)?
//! additive   := term (("+" | "-") term)*
//! term       := unary (("*" | "/" | "%") unary)*
//! unary      := "-" unary | "!" unary | power
//! power      := atom ("^" unary)?
//! atom       := number | ident "(" args ")" | ident | "(" or ")"
//! ```

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0, satisfy},
    combinator::{all_consuming, map, opt, peek, recognize, value},
    multi::{many0, many0_count, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};

use crate::formula::expr::{BinaryOp, Expr};

type Res<'a, T> = IResult<&'a str, T>;

fn ws<'a, O, P>(inner: P) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

/// Unsigned decimal literal; signs belong to `unary` and `nan`/`inf` stay identifiers
fn number(i: &str) -> Res<'_, Expr> {
    map(
        preceded(peek(satisfy(|c: char| c.is_ascii_digit() || c == '.')), double),
        Expr::Number,
    )
    .parse(i)
}

fn identifier(i: &str) -> Res<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))
    .parse(i)
}

fn call_or_variable(i: &str) -> Res<'_, Expr> {
    let (i, name) = identifier(i)?;
    let (i, args) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), expression),
        ws(char(')')),
    ))
    .parse(i)?;
    let expr = match args {
        Some(args) => Expr::Call(name.to_string(), args),
        None => Expr::Variable(name.to_string()),
    };
    Ok((i, expr))
}

fn atom(i: &str) -> Res<'_, Expr> {
    ws(alt((
        number,
        call_or_variable,
        delimited(char('('), expression, char(')')),
    )))
    .parse(i)
}

fn power(i: &str) -> Res<'_, Expr> {
    let (i, base) = atom(i)?;
    let (i, exponent) = opt(preceded(ws(char('^')), unary)).parse(i)?;
    let expr = match exponent {
        Some(exponent) => Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)),
        None => base,
    };
    Ok((i, expr))
}

fn unary(i: &str) -> Res<'_, Expr> {
    alt((
        map(preceded(ws(char('-')), unary), |e| Expr::Neg(Box::new(e))),
        map(preceded(ws(char('!')), unary), |e| Expr::Not(Box::new(e))),
        power,
    ))
    .parse(i)
}

fn fold_binary(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    rest.into_iter().fold(first, |lhs, (op, rhs)| {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    })
}

fn term(i: &str) -> Res<'_, Expr> {
    let (i, first) = unary(i)?;
    let (i, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Mul, char('*')),
            value(BinaryOp::Div, char('/')),
            value(BinaryOp::Rem, char('%')),
        ))),
        unary,
    ))
    .parse(i)?;
    Ok((i, fold_binary(first, rest)))
}

fn additive(i: &str) -> Res<'_, Expr> {
    let (i, first) = term(i)?;
    let (i, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Add, char('+')),
            value(BinaryOp::Sub, char('-')),
        ))),
        term,
    ))
    .parse(i)?;
    Ok((i, fold_binary(first, rest)))
}

fn comparison_op(i: &str) -> Res<'_, BinaryOp> {
    ws(alt((
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Eq, tag("==")),
        value(BinaryOp::Ne, tag("!=")),
        value(BinaryOp::Lt, tag("<")),
        value(BinaryOp::Gt, tag(">")),
        value(BinaryOp::Eq, tag("=")),
    )))
    .parse(i)
}

fn comparison(i: &str) -> Res<'_, Expr> {
    let (i, lhs) = additive(i)?;
    let (i, rhs) = opt(pair(comparison_op, additive)).parse(i)?;
    let expr = match rhs {
        Some((op, rhs)) => Expr::Binary(op, Box::new(lhs), Box::new(rhs)),
        None => lhs,
    };
    Ok((i, expr))
}

fn logical_and(i: &str) -> Res<'_, Expr> {
    let (i, first) = comparison(i)?;
    let (i, rest) = many0(pair(value(BinaryOp::And, ws(tag("&&"))), comparison)).parse(i)?;
    Ok((i, fold_binary(first, rest)))
}

fn expression(i: &str) -> Res<'_, Expr> {
    let (i, first) = logical_and(i)?;
    let (i, rest) = many0(pair(value(BinaryOp::Or, ws(tag("||"))), logical_and)).parse(i)?;
    Ok((i, fold_binary(first, rest)))
}

/// Parse a complete formula; trailing input is an error
pub fn parse_expression(text: &str) -> Result<Expr, String> {
    match all_consuming(ws(expression)).parse(text) {
        Ok((_, expr)) => Ok(expr),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let expr = parse_expression("1 + 2 * 3").expect("parses");
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Number(1.0)),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    Box::new(Expr::Number(2.0)),
                    Box::new(Expr::Number(3.0))
                ))
            )
        );
    }

    #[test]
    fn test_function_call_and_variables() {
        let expr = parse_expression("max(0, damage - quality * 0.75)").expect("parses");
        match expr {
            Expr::Call(name, args) => {
                assert_eq!(name, "max");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert!(parse_expression("if(angle >= 1.2 && organic == 1, damage, 0)").is_ok());
        assert!(parse_expression("a != b || !c").is_ok());
    }

    #[test]
    fn test_trailing_decimals_keep_fraction() {
        assert_eq!(parse_expression("0.5"), Ok(Expr::Number(0.5)));
        assert_eq!(parse_expression("2.5"), Ok(Expr::Number(2.5)));
        assert_eq!(parse_expression("1.05"), Ok(Expr::Number(1.05)));
        assert_eq!(parse_expression(" 2.5 "), Ok(Expr::Number(2.5)));
        assert_eq!(
            parse_expression("damage * 0.5"),
            Ok(Expr::Binary(
                BinaryOp::Mul,
                Box::new(Expr::Variable("damage".into())),
                Box::new(Expr::Number(0.5))
            ))
        );
    }

    #[test]
    fn test_decimals_in_parens_and_calls() {
        assert_eq!(parse_expression("(2.5)"), Ok(Expr::Number(2.5)));
        assert_eq!(
            parse_expression("max(0.25, 1.75)"),
            Ok(Expr::Call(
                "max".into(),
                vec![Expr::Number(0.25), Expr::Number(1.75)]
            ))
        );
        assert_eq!(parse_expression(".5"), Ok(Expr::Number(0.5)));
        assert_eq!(parse_expression("1e2"), Ok(Expr::Number(100.0)));
    }

    #[test]
    fn test_sign_is_an_operator() {
        assert_eq!(
            parse_expression("-0.5"),
            Ok(Expr::Neg(Box::new(Expr::Number(0.5))))
        );
        assert!(matches!(
            parse_expression("damage-1.5"),
            Ok(Expr::Binary(BinaryOp::Sub, _, _))
        ));
        assert_eq!(parse_expression("inf"), Ok(Expr::Variable("inf".into())));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_expression("").is_err());
        assert!(parse_expression("damage +").is_err());
        assert!(parse_expression("(damage").is_err());
        assert!(parse_expression("damage $ 2").is_err());
    }
}
