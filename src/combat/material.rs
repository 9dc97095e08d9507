//! Material properties consumed by armour formulas

use serde::{Deserialize, Serialize};

use crate::combat::damage::DamageType;

/// Physical properties of the stuff an armour layer is made of
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// kg/m3
    pub density: f64,
    /// Siemens per metre
    pub electrical_conductivity: f64,
    pub organic: bool,
    /// kPa; resists cutting and piercing
    pub shear_yield: f64,
    /// kPa; resists blunt impact
    pub impact_yield: f64,
}

impl Material {
    /// Yield strength relevant to the kind of damage
    pub fn yield_strength(&self, damage_type: DamageType) -> f64 {
        if damage_type.uses_shear_strength() {
            self.shear_yield
        } else {
            self.impact_yield
        }
    }

    /// Look up a preset by name
    pub fn named(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "cloth" => Some(Self::cloth()),
            "leather" => Some(Self::leather()),
            "steel" | "iron" | "metal" => Some(Self::steel()),
            "force" | "intangible" => Some(Self::intangible()),
            "flesh" | "hide" => Some(Self::flesh()),
            _ => None,
        }
    }

    /// Cloth, robes
    pub fn cloth() -> Self {
        Self {
            name: "cloth".into(),
            density: 1500.0,
            electrical_conductivity: 0.0001,
            organic: true,
            shear_yield: 5000.0,
            impact_yield: 2000.0,
        }
    }

    /// Cured hide
    pub fn leather() -> Self {
        Self {
            name: "leather".into(),
            density: 860.0,
            electrical_conductivity: 0.001,
            organic: true,
            shear_yield: 20000.0,
            impact_yield: 10000.0,
        }
    }

    /// Solid metal
    pub fn steel() -> Self {
        Self {
            name: "steel".into(),
            density: 7850.0,
            electrical_conductivity: 6_990_000.0,
            organic: false,
            shear_yield: 250000.0,
            impact_yield: 200000.0,
        }
    }

    /// No physical substance, for magical wards
    pub fn intangible() -> Self {
        Self {
            name: "force".into(),
            density: 0.0,
            electrical_conductivity: 0.0,
            organic: false,
            shear_yield: 0.0,
            impact_yield: 0.0,
        }
    }

    /// Living tissue, for natural armour
    pub fn flesh() -> Self {
        Self {
            name: "flesh".into(),
            density: 1060.0,
            electrical_conductivity: 0.5,
            organic: true,
            shear_yield: 1000.0,
            impact_yield: 3000.0,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::cloth()
    }
}
