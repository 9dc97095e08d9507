//! Combat Engine - combat resolution and AI decisions for a persistent world

pub mod attacks;
pub mod check;
pub mod combat;
pub mod combatant;
pub mod core;
pub mod definitions;
pub mod formula;
pub mod moves;
pub mod session;
pub mod strategy;
pub mod tracking;
pub mod world;
