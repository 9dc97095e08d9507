//! Static combat definitions and their repositories

pub mod cover;
pub mod loader;
pub mod repository;
pub mod template;
pub mod weapons;

pub use cover::{CoverExtent, CoverType, RangedCover};
pub use loader::{load_definitions, parse_definitions, Definitions, LoadReport};
pub use repository::{Definition, Registry, Repository};
pub use template::CombatantTemplate;
pub use weapons::{AmmunitionType, RangedWeaponType, ShieldType, WeaponType};
