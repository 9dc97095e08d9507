//! Formula syntax tree and evaluation

use ahash::AHashMap;
use rand::{Rng, RngCore};

/// Binary operators in precedence groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

/// Built-in functions: name and accepted argument counts
pub const FUNCTIONS: &[(&str, usize, usize)] = &[
    ("min", 2, usize::MAX),
    ("max", 2, usize::MAX),
    ("abs", 1, 1),
    ("floor", 1, 1),
    ("ceiling", 1, 1),
    ("round", 1, 1),
    ("sqrt", 1, 1),
    ("pow", 2, 2),
    ("if", 3, 3),
    ("rand", 2, 2),
    ("dice", 2, 2),
    ("clamp", 3, 3),
];

/// Upper bound on `dice` count and sides
pub const MAX_DICE: f64 = 1000.0;

/// Formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

impl Expr {
    /// Collect every variable name referenced by the expression
    pub fn collect_variables<'a>(&'a self, into: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                if !into.contains(&name.as_str()) {
                    into.push(name);
                }
            }
            Expr::Neg(inner) | Expr::Not(inner) => inner.collect_variables(into),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_variables(into);
                rhs.collect_variables(into);
            }
            Expr::Call(_, args) => {
                for arg in args {
                    arg.collect_variables(into);
                }
            }
        }
    }

    /// First call to an unknown function or with a bad argument count
    pub fn find_invalid_call(&self) -> Option<String> {
        match self {
            Expr::Number(_) | Expr::Variable(_) => None,
            Expr::Neg(inner) | Expr::Not(inner) => inner.find_invalid_call(),
            Expr::Binary(_, lhs, rhs) => lhs.find_invalid_call().or_else(|| rhs.find_invalid_call()),
            Expr::Call(name, args) => {
                match FUNCTIONS.iter().find(|(f, _, _)| f.eq_ignore_ascii_case(name)) {
                    None => Some(format!("unknown function '{}'", name)),
                    Some((f, lo, hi)) if args.len() < *lo || args.len() > *hi => Some(format!(
                        "function '{}' called with {} arguments",
                        f,
                        args.len()
                    )),
                    Some(_) => args.iter().find_map(|a| a.find_invalid_call()),
                }
            }
        }
    }

    /// Evaluate with variables from `vars`; unknown variables read as zero
    pub fn eval(&self, vars: &AHashMap<String, f64>, rng: &mut dyn RngCore) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::Variable(name) => vars.get(name.as_str()).copied().unwrap_or(0.0),
            Expr::Neg(inner) => -inner.eval(vars, rng),
            Expr::Not(inner) => truth(inner.eval(vars, rng) == 0.0),
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval(vars, rng);
                let b = rhs.eval(vars, rng);
                match op {
                    BinaryOp::Or => truth(a != 0.0 || b != 0.0),
                    BinaryOp::And => truth(a != 0.0 && b != 0.0),
                    BinaryOp::Eq => truth((a - b).abs() < f64::EPSILON),
                    BinaryOp::Ne => truth((a - b).abs() >= f64::EPSILON),
                    BinaryOp::Lt => truth(a < b),
                    BinaryOp::Le => truth(a <= b),
                    BinaryOp::Gt => truth(a > b),
                    BinaryOp::Ge => truth(a >= b),
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => {
                        if b == 0.0 {
                            0.0
                        } else {
                            a / b
                        }
                    }
                    BinaryOp::Rem => {
                        if b == 0.0 {
                            0.0
                        } else {
                            a % b
                        }
                    }
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Expr::Call(name, args) => call(name, args, vars, rng),
        }
    }
}

fn truth(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn call(name: &str, args: &[Expr], vars: &AHashMap<String, f64>, rng: &mut dyn RngCore) -> f64 {
    // `if` evaluates lazily so that `rand` in the untaken branch does not consume the stream
    if name.eq_ignore_ascii_case("if") {
        return if args[0].eval(vars, rng) != 0.0 {
            args[1].eval(vars, rng)
        } else {
            args[2].eval(vars, rng)
        };
    }

    let values: Vec<f64> = args.iter().map(|a| a.eval(vars, rng)).collect();
    match name.to_ascii_lowercase().as_str() {
        "min" => values.iter().copied().fold(f64::INFINITY, f64::min),
        "max" => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        "abs" => values[0].abs(),
        "floor" => values[0].floor(),
        "ceiling" => values[0].ceil(),
        "round" => values[0].round(),
        "sqrt" => values[0].max(0.0).sqrt(),
        "pow" => values[0].powf(values[1]),
        "clamp" => {
            let (lo, hi) = (values[1], values[2]);
            if lo > hi {
                lo
            } else {
                values[0].clamp(lo, hi)
            }
        }
        "rand" => {
            let (lo, hi) = (values[0], values[1]);
            if !lo.is_finite() || !hi.is_finite() {
                0.0
            } else if lo >= hi {
                lo
            } else {
                rng.gen_range(lo..hi)
            }
        }
        "dice" => {
            let (count, sides) = (values[0], values[1]);
            if !count.is_finite() || !sides.is_finite() {
                return 0.0;
            }
            let count = count.clamp(0.0, MAX_DICE) as u32;
            let sides = sides.clamp(0.0, MAX_DICE) as u32;
            if sides == 0 {
                return 0.0;
            }
            (0..count).map(|_| rng.gen_range(1..=sides) as f64).sum()
        }
        _ => 0.0,
    }
}
