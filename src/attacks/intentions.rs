//! Attack intentions as a typed tag-set
//!
//! Every attack carries a set of intentions describing what it is for.
//! Combat settings filter candidate attacks through required, forbidden and
//! preferred intention sets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{CombatError, Result};

/// What an attack is meant to achieve
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttackIntention {
    Kill,
    Wound,
    Hinder,
    Pain,
    Stun,
    Disarm,
    Trip,
    Stagger,
    Unbalance,
    Pushback,
    Disable,
    Clinch,
    Fast,
    Slow,
    Precise,
    Reckless,
    Lunge,
    Desperate,
    CoupDeGrace,
}

impl AttackIntention {
    pub const ALL: [AttackIntention; 19] = [
        AttackIntention::Kill,
        AttackIntention::Wound,
        AttackIntention::Hinder,
        AttackIntention::Pain,
        AttackIntention::Stun,
        AttackIntention::Disarm,
        AttackIntention::Trip,
        AttackIntention::Stagger,
        AttackIntention::Unbalance,
        AttackIntention::Pushback,
        AttackIntention::Disable,
        AttackIntention::Clinch,
        AttackIntention::Fast,
        AttackIntention::Slow,
        AttackIntention::Precise,
        AttackIntention::Reckless,
        AttackIntention::Lunge,
        AttackIntention::Desperate,
        AttackIntention::CoupDeGrace,
    ];

    fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Parse a tag name, case-insensitive
    pub fn parse(text: &str) -> Result<Self> {
        let wanted = text.trim();
        Self::ALL
            .into_iter()
            .find(|i| format!("{:?}", i).eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CombatError::UnknownTag(wanted.to_string()))
    }
}

/// A set of attack intentions
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Intentions(u32);

impl Intentions {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn of(tags: &[AttackIntention]) -> Self {
        tags.iter().copied().collect()
    }

    /// Parse a list of tag names; any unknown tag rejects the whole list
    pub fn parse<S: AsRef<str>>(tags: &[S]) -> Result<Self> {
        tags.iter()
            .map(|t| AttackIntention::parse(t.as_ref()))
            .collect()
    }

    pub fn with(mut self, tag: AttackIntention) -> Self {
        self.insert(tag);
        self
    }

    pub fn insert(&mut self, tag: AttackIntention) {
        self.0 |= tag.bit();
    }

    pub fn remove(&mut self, tag: AttackIntention) {
        self.0 &= !tag.bit();
    }

    pub fn contains(&self, tag: AttackIntention) -> bool {
        self.0 & tag.bit() != 0
    }

    /// Every tag in `other` is present here
    pub fn contains_all(&self, other: Intentions) -> bool {
        self.0 & other.0 == other.0
    }

    /// At least one tag is shared
    pub fn intersects(&self, other: Intentions) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(&self, other: Intentions) -> Intentions {
        Intentions(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = AttackIntention> + '_ {
        AttackIntention::ALL.into_iter().filter(|t| self.contains(*t))
    }
}

impl FromIterator<AttackIntention> for Intentions {
    fn from_iter<I: IntoIterator<Item = AttackIntention>>(iter: I) -> Self {
        let mut set = Intentions::empty();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl fmt::Debug for Intentions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl TryFrom<Vec<String>> for Intentions {
    type Error = CombatError;

    fn try_from(tags: Vec<String>) -> Result<Self> {
        Intentions::parse(&tags)
    }
}

impl From<Intentions> for Vec<String> {
    fn from(set: Intentions) -> Self {
        set.iter().map(|t| format!("{:?}", t)).collect()
    }
}

/// Required, forbidden and preferred intentions from combat settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentionFilter {
    pub required: Intentions,
    pub forbidden: Intentions,
    pub preferred: Intentions,
}

impl IntentionFilter {
    /// Attack carries all required tags and no forbidden one
    pub fn permits(&self, attack: Intentions) -> bool {
        attack.contains_all(self.required) && !attack.intersects(self.forbidden)
    }

    /// Attack carries at least one preferred tag
    pub fn prefers(&self, attack: Intentions) -> bool {
        attack.intersects(self.preferred)
    }

    pub fn validate(&self) -> Result<()> {
        if self.required.intersects(self.forbidden) {
            return Err(CombatError::InvalidSettings(format!(
                "intentions both required and forbidden: {:?}",
                Intentions(self.required.0 & self.forbidden.0)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttackIntention::*;

    #[test]
    fn test_membership() {
        let set = Intentions::of(&[Kill, Fast]);
        assert!(set.contains(Kill));
        assert!(!set.contains(Slow));
        assert!(set.contains_all(Intentions::of(&[Fast])));
        assert!(set.contains_all(Intentions::empty()));
        assert!(!set.intersects(Intentions::of(&[Slow, Trip])));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_insert_remove() {
        let mut set = Intentions::empty();
        set.insert(Disarm);
        assert!(set.contains(Disarm));
        set.remove(Disarm);
        assert!(set.is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_tag() {
        let set = Intentions::parse(&["kill", "Pain"]).expect("valid tags");
        assert_eq!(set, Intentions::of(&[Kill, Pain]));
        let err = Intentions::parse(&["kill", "tickle"]).unwrap_err();
        assert!(matches!(err, CombatError::UnknownTag(tag) if tag == "tickle"));
    }

    #[test]
    fn test_filter() {
        let filter = IntentionFilter {
            required: Intentions::of(&[Wound]),
            forbidden: Intentions::of(&[Reckless]),
            preferred: Intentions::of(&[Precise]),
        };
        assert!(filter.permits(Intentions::of(&[Wound, Precise])));
        assert!(!filter.permits(Intentions::of(&[Precise])));
        assert!(!filter.permits(Intentions::of(&[Wound, Reckless])));
        assert!(filter.prefers(Intentions::of(&[Wound, Precise])));
        assert!(!IntentionFilter::default().prefers(Intentions::of(&[Wound])));
    }

    #[test]
    fn test_filter_validation() {
        let filter = IntentionFilter {
            required: Intentions::of(&[Kill]),
            forbidden: Intentions::of(&[Kill]),
            preferred: Intentions::empty(),
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_serde_as_names() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            tags: Intentions,
        }
        let holder: Holder = toml::from_str(r#"tags = ["Kill", "stun"]"#).expect("parses");
        assert_eq!(holder.tags, Intentions::of(&[Kill, Stun]));
        let bad: std::result::Result<Holder, _> = toml::from_str(r#"tags = ["Kil"]"#);
        assert!(bad.is_err());
    }
}
