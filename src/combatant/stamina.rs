//! Stamina ledger

use serde::{Deserialize, Serialize};

/// Spend-and-regain interface the engine uses for every cost
pub trait StaminaLedger {
    fn current(&self) -> f64;
    fn can_spend(&self, amount: f64) -> bool;
    fn spend(&mut self, amount: f64);
    fn regain(&mut self, amount: f64);
}

/// Bounded stamina pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stamina {
    pub current: f64,
    pub maximum: f64,
}

impl Stamina {
    pub fn new(maximum: f64) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Fraction remaining in [0, 1]
    pub fn fraction(&self) -> f64 {
        if self.maximum <= 0.0 {
            0.0
        } else {
            (self.current / self.maximum).clamp(0.0, 1.0)
        }
    }
}

impl Default for Stamina {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl StaminaLedger for Stamina {
    fn current(&self) -> f64 {
        self.current
    }

    fn can_spend(&self, amount: f64) -> bool {
        amount <= 0.0 || self.current >= amount
    }

    fn spend(&mut self, amount: f64) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    fn regain(&mut self, amount: f64) {
        self.current = (self.current + amount.max(0.0)).min(self.maximum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_and_regain_clamped() {
        let mut stamina = Stamina::new(10.0);
        assert!(stamina.can_spend(10.0));
        assert!(!stamina.can_spend(10.5));
        stamina.spend(4.0);
        assert_eq!(stamina.current(), 6.0);
        stamina.spend(100.0);
        assert_eq!(stamina.current(), 0.0);
        stamina.regain(50.0);
        assert_eq!(stamina.current(), 10.0);
    }

    #[test]
    fn test_zero_cost_always_affordable() {
        let mut stamina = Stamina::new(5.0);
        stamina.spend(5.0);
        assert!(stamina.can_spend(0.0));
        assert!(!stamina.can_spend(0.1));
        assert_eq!(stamina.fraction(), 0.0);
    }
}
