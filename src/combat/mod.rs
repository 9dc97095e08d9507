//! Damage and armour absorption pipeline

pub mod armor;
pub mod constants;
pub mod damage;
pub mod layers;
pub mod material;
pub mod penetration;
pub mod wounds;

pub use armor::{ArmorFormulas, ArmorType, ChannelFormulas, DamageTransformation};
pub use damage::{Damage, DamageType};
pub use layers::{
    absorb_through, Absorption, AbsorptionContext, ChannelParameters, DamageLayer, LayerHit,
    LayerResult, NaturalArmor, ShieldingEffect, StageTrace, WornArmor,
};
pub use material::Material;
pub use penetration::{resolve_penetration, roll_penetration, PenetrationResult};
pub use wounds::{Wound, WoundSeverity};
