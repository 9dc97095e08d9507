//! Formula variable names shared by armour, attack and ammunition definitions
//!
//! Definitions are validated against these lists at load time, so a typo in a
//! formula is rejected with the definition instead of silently reading zero.

// Armour layer inputs
pub const QUALITY: &str = "quality";
pub const DAMAGE: &str = "damage";
pub const ANGLE: &str = "angle";
pub const DENSITY: &str = "density";
pub const ELECTRICAL: &str = "electrical";
pub const ORGANIC: &str = "organic";
pub const STRENGTH: &str = "strength";
/// Pre-dissipation amount, absorb stage only
pub const ORIGINAL: &str = "original";

// Attack inputs
pub const DEGREE: &str = "degree";
pub const TRAIT: &str = "trait";
pub const WEAPON_QUALITY: &str = "weaponquality";
pub const AMMO_QUALITY: &str = "ammoquality";
pub const POWER: &str = "power";

pub const ARMOR_VARIABLES: &[&str] = &[
    QUALITY, DAMAGE, ANGLE, DENSITY, ELECTRICAL, ORGANIC, STRENGTH, ORIGINAL,
];

pub const ATTACK_VARIABLES: &[&str] = &[DEGREE, TRAIT, WEAPON_QUALITY, QUALITY, POWER];

pub const AMMUNITION_VARIABLES: &[&str] = &[DEGREE, TRAIT, WEAPON_QUALITY, AMMO_QUALITY, POWER];
