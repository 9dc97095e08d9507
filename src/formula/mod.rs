//! Text formulas for damage, pain, stun and armour stages
//!
//! Definitions carry formulas as text (`"max(0, damage - quality * 0.8)"`).
//! Text is parsed once at load time; a malformed formula or a call to an
//! unknown function is a configuration error for the owning definition only.

pub mod expr;
pub mod parser;

use std::fmt;

use ahash::AHashMap;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::core::error::{CombatError, Result};
pub use expr::{BinaryOp, Expr};

/// Named inputs to a formula evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaParameters {
    values: AHashMap<String, f64>,
}

impl FormulaParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

/// A parsed formula that remembers its source text
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Formula {
    text: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(text: &str) -> Result<Self> {
        let expr = parser::parse_expression(text).map_err(|reason| CombatError::FormulaParse {
            text: text.to_string(),
            reason,
        })?;
        if let Some(reason) = expr.find_invalid_call() {
            return Err(CombatError::FormulaParse {
                text: text.to_string(),
                reason,
            });
        }
        Ok(Self {
            text: text.trim().to_string(),
            expr,
        })
    }

    /// A formula that always yields `value`
    pub fn constant(value: f64) -> Self {
        Self {
            text: value.to_string(),
            expr: Expr::Number(value),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Variables referenced, in first-use order
    pub fn variables(&self) -> Vec<&str> {
        let mut vars = Vec::new();
        self.expr.collect_variables(&mut vars);
        vars
    }

    /// Reject formulas that reference variables outside `allowed`
    pub fn ensure_variables(&self, allowed: &[&str]) -> Result<()> {
        match self.variables().into_iter().find(|v| !allowed.contains(v)) {
            Some(variable) => Err(CombatError::UnknownFormulaVariable {
                formula: self.text.clone(),
                variable: variable.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Evaluate; non-finite results collapse to zero
    pub fn evaluate(&self, params: &FormulaParameters, rng: &mut dyn RngCore) -> f64 {
        let value = self.expr.eval(&params.values, rng);
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Formula({:?})", self.text)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<String> for Formula {
    type Error = CombatError;

    fn try_from(text: String) -> Result<Self> {
        Formula::parse(&text)
    }
}

impl From<Formula> for String {
    fn from(formula: Formula) -> Self {
        formula.text
    }
}
