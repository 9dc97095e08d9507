//! Physical body: limbs, wounds and worn layers

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::combat::layers::{NaturalArmor, WornArmor};
use crate::combat::wounds::{Wound, WoundSeverity};
use crate::core::types::LimbId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimbKind {
    Head,
    Neck,
    Torso,
    Arm,
    Hand,
    Leg,
    Foot,
    Wing,
    Tail,
    Mouth,
}

impl LimbKind {
    /// Destroying one of these kills
    pub fn is_vital(&self) -> bool {
        matches!(self, LimbKind::Head | LimbKind::Neck | LimbKind::Torso)
    }

    /// Limb extension grapples target these
    pub fn is_extremity(&self) -> bool {
        matches!(
            self,
            LimbKind::Arm | LimbKind::Hand | LimbKind::Leg | LimbKind::Foot | LimbKind::Wing
        )
    }
}

/// A single bodypart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limb {
    pub id: LimbId,
    pub name: String,
    pub kind: LimbKind,
    /// Relative chance of being struck
    pub hit_weight: f64,
    pub damage: f64,
    pub max_damage: f64,
    /// Controlling this limb does nothing for a grapple
    pub grapple_ineffective: bool,
    pub grappled: bool,
    pub disabled: bool,
}

impl Limb {
    pub fn new(id: u32, name: &str, kind: LimbKind, hit_weight: f64, max_damage: f64) -> Self {
        Self {
            id: LimbId(id),
            name: name.to_string(),
            kind,
            hit_weight,
            damage: 0.0,
            max_damage,
            grapple_ineffective: matches!(kind, LimbKind::Mouth | LimbKind::Tail),
            grappled: false,
            disabled: false,
        }
    }
}

/// Physical state of a combatant's body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub limbs: Vec<Limb>,
    pub wounds: Vec<Wound>,
    /// Outermost first
    pub worn: Vec<WornArmor>,
    pub natural_armor: Option<NaturalArmor>,
    pub pain: f64,
    pub stun: f64,
    /// Total damage that kills
    pub max_health: f64,
    /// Pain at which the body passes out
    pub pain_tolerance: f64,
    pub stun_threshold: f64,
}

impl Body {
    fn with_limbs(limbs: Vec<Limb>) -> Self {
        Self {
            limbs,
            wounds: Vec::new(),
            worn: Vec::new(),
            natural_armor: None,
            pain: 0.0,
            stun: 0.0,
            max_health: 100.0,
            pain_tolerance: 80.0,
            stun_threshold: 50.0,
        }
    }

    /// Two arms, two legs, one head
    pub fn humanoid() -> Self {
        Self::with_limbs(vec![
            Limb::new(1, "head", LimbKind::Head, 10.0, 30.0),
            Limb::new(2, "neck", LimbKind::Neck, 3.0, 20.0),
            Limb::new(3, "torso", LimbKind::Torso, 35.0, 60.0),
            Limb::new(4, "left arm", LimbKind::Arm, 10.0, 35.0),
            Limb::new(5, "right arm", LimbKind::Arm, 10.0, 35.0),
            Limb::new(6, "left hand", LimbKind::Hand, 3.0, 20.0),
            Limb::new(7, "right hand", LimbKind::Hand, 3.0, 20.0),
            Limb::new(8, "left leg", LimbKind::Leg, 11.0, 40.0),
            Limb::new(9, "right leg", LimbKind::Leg, 11.0, 40.0),
            Limb::new(10, "mouth", LimbKind::Mouth, 1.0, 15.0),
        ])
    }

    /// Four legs, a tail and jaws
    pub fn quadruped() -> Self {
        Self::with_limbs(vec![
            Limb::new(1, "head", LimbKind::Head, 12.0, 30.0),
            Limb::new(2, "neck", LimbKind::Neck, 6.0, 25.0),
            Limb::new(3, "torso", LimbKind::Torso, 40.0, 60.0),
            Limb::new(4, "left foreleg", LimbKind::Leg, 9.0, 30.0),
            Limb::new(5, "right foreleg", LimbKind::Leg, 9.0, 30.0),
            Limb::new(6, "left hindleg", LimbKind::Leg, 9.0, 30.0),
            Limb::new(7, "right hindleg", LimbKind::Leg, 9.0, 30.0),
            Limb::new(8, "tail", LimbKind::Tail, 4.0, 15.0),
            Limb::new(9, "mouth", LimbKind::Mouth, 2.0, 15.0),
        ])
    }

    pub fn limb(&self, id: LimbId) -> Option<&Limb> {
        self.limbs.iter().find(|l| l.id == id)
    }

    pub fn limb_mut(&mut self, id: LimbId) -> Option<&mut Limb> {
        self.limbs.iter_mut().find(|l| l.id == id)
    }

    pub fn first_of_kind(&self, kind: LimbKind) -> Option<&Limb> {
        self.limbs.iter().find(|l| l.kind == kind && !l.disabled)
    }

    /// Pick a limb to strike, weighted by exposure
    pub fn random_limb(&self, rng: &mut dyn RngCore) -> Option<LimbId> {
        let total: f64 = self.limbs.iter().map(|l| l.hit_weight.max(0.0)).sum();
        if total <= 0.0 {
            return self.limbs.first().map(|l| l.id);
        }
        let mut roll = rng.gen_range(0.0..total);
        for limb in &self.limbs {
            let weight = limb.hit_weight.max(0.0);
            if roll < weight {
                return Some(limb.id);
            }
            roll -= weight;
        }
        self.limbs.last().map(|l| l.id)
    }

    pub fn working_hands(&self) -> usize {
        self.limbs
            .iter()
            .filter(|l| l.kind == LimbKind::Hand && !l.disabled)
            .count()
    }

    pub fn total_damage(&self) -> f64 {
        self.limbs.iter().map(|l| l.damage).sum()
    }

    /// Remaining health in [0, 1]
    pub fn health_fraction(&self) -> f64 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (1.0 - self.total_damage() / self.max_health).clamp(0.0, 1.0)
    }

    /// Apply a wound to its limb; a limb that reaches its limit is disabled
    pub fn apply_wound(&mut self, wound: Wound) {
        self.pain += wound.damage.pain;
        self.stun += wound.damage.stun;
        if let Some(limb) = self.limb_mut(wound.limb) {
            limb.damage += wound.damage.amount;
            if limb.damage >= limb.max_damage {
                limb.disabled = true;
            }
        }
        self.wounds.push(wound);
    }

    pub fn is_dead(&self) -> bool {
        self.total_damage() >= self.max_health
            || self
                .limbs
                .iter()
                .any(|l| l.kind.is_vital() && l.damage >= l.max_damage)
    }

    pub fn is_unconscious(&self) -> bool {
        self.pain >= self.pain_tolerance || self.stun >= self.stun_threshold
    }

    /// Any wound at or above `severity`
    pub fn has_wound_at_least(&self, severity: WoundSeverity) -> bool {
        self.wounds.iter().any(|w| w.severity >= severity)
    }

    /// Legs intact enough to walk
    pub fn can_walk(&self) -> bool {
        !self
            .limbs
            .iter()
            .any(|l| matches!(l.kind, LimbKind::Leg | LimbKind::Foot) && l.disabled)
    }

    /// Limbs worth controlling in a grapple
    pub fn grapple_relevant(&self) -> impl Iterator<Item = &Limb> {
        self.limbs.iter().filter(|l| !l.grapple_ineffective)
    }

    pub fn all_grappled(&self) -> bool {
        let mut relevant = self.grapple_relevant().peekable();
        relevant.peek().is_some() && relevant.all(|l| l.grappled)
    }

    pub fn grappled_count(&self) -> usize {
        self.grapple_relevant().filter(|l| l.grappled).count()
    }

    /// An extremity not yet under control
    pub fn free_extremity(&self) -> Option<LimbId> {
        self.grapple_relevant()
            .find(|l| !l.grappled && l.kind.is_extremity())
            .or_else(|| self.grapple_relevant().find(|l| !l.grappled))
            .map(|l| l.id)
    }

    pub fn release_grapple(&mut self) {
        for limb in &mut self.limbs {
            limb.grappled = false;
        }
    }

    /// Worn layers over a limb, outermost first
    pub fn worn_over(&mut self, limb: LimbId) -> impl Iterator<Item = &mut WornArmor> {
        self.worn.iter_mut().filter(move |w| w.covers(limb))
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::humanoid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::damage::{Damage, DamageType};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const THRESHOLDS: [f64; 8] = [0.5, 2.0, 4.0, 7.0, 12.0, 18.0, 27.0, 40.0];

    #[test]
    fn test_humanoid_layout() {
        let body = Body::humanoid();
        assert_eq!(body.working_hands(), 2);
        assert_eq!(body.health_fraction(), 1.0);
        assert!(body.can_walk());
        assert!(body.limb(LimbId(10)).unwrap().grapple_ineffective);
    }

    #[test]
    fn test_wound_disables_and_kills() {
        let mut body = Body::humanoid();
        let hand = Damage::new(DamageType::Slashing, 25.0, 5.0, 0.0);
        body.apply_wound(Wound::new(LimbId(6), hand, &THRESHOLDS));
        assert_eq!(body.working_hands(), 1);
        assert!(!body.is_dead());
        assert_eq!(body.pain, 5.0);

        let head = Damage::new(DamageType::Crushing, 30.0, 0.0, 10.0);
        body.apply_wound(Wound::new(LimbId(1), head, &THRESHOLDS));
        assert!(body.is_dead());
        assert!(body.has_wound_at_least(WoundSeverity::Grievous));
    }

    #[test]
    fn test_unconscious_from_stun() {
        let mut body = Body::humanoid();
        let blow = Damage::new(DamageType::Crushing, 1.0, 0.0, 60.0);
        body.apply_wound(Wound::new(LimbId(3), blow, &THRESHOLDS));
        assert!(body.is_unconscious());
        assert!(!body.is_dead());
    }

    #[test]
    fn test_grapple_flags() {
        let mut body = Body::humanoid();
        assert!(!body.all_grappled());
        let relevant: Vec<LimbId> = body.grapple_relevant().map(|l| l.id).collect();
        assert_eq!(relevant.len(), 9);
        // Extremities come first
        let first = body.free_extremity().unwrap();
        assert!(body.limb(first).unwrap().kind.is_extremity());
        for id in relevant {
            body.limb_mut(id).unwrap().grappled = true;
        }
        assert!(body.all_grappled());
        assert_eq!(body.free_extremity(), None);
        body.release_grapple();
        assert_eq!(body.grappled_count(), 0);
    }

    #[test]
    fn test_random_limb_is_valid() {
        let body = Body::quadruped();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let id = body.random_limb(&mut rng).unwrap();
            assert!(body.limb(id).is_some());
        }
    }
}
