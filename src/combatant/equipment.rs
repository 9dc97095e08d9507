//! Held and carried combat gear

use serde::{Deserialize, Serialize};

use crate::core::types::ItemId;
use crate::definitions::weapons::{AmmunitionType, RangedWeaponType, ShieldType, WeaponType};

/// A round sitting in a ranged weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedRound {
    pub ammunition: AmmunitionType,
    pub quality: f64,
}

/// What a piece of gear is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GearKind {
    Melee(WeaponType),
    Ranged {
        weapon: RangedWeaponType,
        readied: bool,
        loaded: Vec<LoadedRound>,
    },
    Shield(ShieldType),
}

/// One carried item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearItem {
    pub item: ItemId,
    pub kind: GearKind,
    pub quality: f64,
    pub wielded: bool,
}

impl GearItem {
    pub fn melee(item: ItemId, weapon: WeaponType, quality: f64) -> Self {
        Self {
            item,
            kind: GearKind::Melee(weapon),
            quality,
            wielded: false,
        }
    }

    pub fn ranged(item: ItemId, weapon: RangedWeaponType, quality: f64) -> Self {
        Self {
            item,
            kind: GearKind::Ranged {
                weapon,
                readied: false,
                loaded: Vec::new(),
            },
            quality,
            wielded: false,
        }
    }

    pub fn shield(item: ItemId, shield: ShieldType, quality: f64) -> Self {
        Self {
            item,
            kind: GearKind::Shield(shield),
            quality,
            wielded: false,
        }
    }

    pub fn hands(&self) -> usize {
        match &self.kind {
            GearKind::Melee(w) => w.hands,
            GearKind::Ranged { weapon, .. } => weapon.hands,
            GearKind::Shield(_) => 1,
        }
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            GearKind::Melee(w) => &w.name,
            GearKind::Ranged { weapon, .. } => &weapon.name,
            GearKind::Shield(s) => &s.name,
        }
    }
}

/// A stack of spare ammunition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmoStack {
    pub ammunition: AmmunitionType,
    pub quality: f64,
    pub count: u32,
}

/// A ranged weapon together with its mutable state
pub struct RangedView<'a> {
    pub item: ItemId,
    pub quality: f64,
    pub weapon: &'a RangedWeaponType,
    pub readied: bool,
    pub loaded: &'a [LoadedRound],
}

/// Everything a combatant carries into a fight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub items: Vec<GearItem>,
    pub ammunition: Vec<AmmoStack>,
    /// Lost items lying at the combatant's location
    pub dropped: Vec<GearItem>,
    /// Weapon the combatant returns to when it can
    pub favourite: Option<ItemId>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn carry(&mut self, item: GearItem) {
        self.items.push(item);
    }

    pub fn item(&self, id: ItemId) -> Option<&GearItem> {
        self.items.iter().find(|i| i.item == id)
    }

    pub fn hands_in_use(&self) -> usize {
        self.items.iter().filter(|i| i.wielded).map(GearItem::hands).sum()
    }

    pub fn free_hands(&self, working_hands: usize) -> usize {
        working_hands.saturating_sub(self.hands_in_use())
    }

    pub fn wielded_weapons(&self) -> impl Iterator<Item = (&GearItem, &WeaponType)> {
        self.items.iter().filter(|i| i.wielded).filter_map(|i| match &i.kind {
            GearKind::Melee(w) => Some((i, w)),
            _ => None,
        })
    }

    pub fn wielded_shield(&self) -> Option<(&GearItem, &ShieldType)> {
        self.items.iter().filter(|i| i.wielded).find_map(|i| match &i.kind {
            GearKind::Shield(s) => Some((i, s)),
            _ => None,
        })
    }

    pub fn wielded_ranged(&self) -> Option<RangedView<'_>> {
        self.items.iter().filter(|i| i.wielded).find_map(|i| match &i.kind {
            GearKind::Ranged {
                weapon,
                readied,
                loaded,
            } => Some(RangedView {
                item: i.item,
                quality: i.quality,
                weapon,
                readied: *readied,
                loaded,
            }),
            _ => None,
        })
    }

    /// Carried but not wielded melee weapons
    pub fn sheathed_weapons(&self) -> impl Iterator<Item = (&GearItem, &WeaponType)> {
        self.items.iter().filter(|i| !i.wielded).filter_map(|i| match &i.kind {
            GearKind::Melee(w) => Some((i, w)),
            _ => None,
        })
    }

    pub fn unwielded_shield(&self) -> Option<ItemId> {
        self.items
            .iter()
            .find(|i| !i.wielded && matches!(i.kind, GearKind::Shield(_)))
            .map(|i| i.item)
    }

    pub fn unwielded_ranged(&self) -> Option<ItemId> {
        self.items
            .iter()
            .find(|i| !i.wielded && matches!(i.kind, GearKind::Ranged { .. }))
            .map(|i| i.item)
    }

    /// Wield an item if enough hands are free
    pub fn wield(&mut self, id: ItemId, working_hands: usize) -> bool {
        let free = self.free_hands(working_hands);
        match self.items.iter_mut().find(|i| i.item == id) {
            Some(item) if item.wielded => true,
            Some(item) if item.hands() <= free => {
                item.wielded = true;
                true
            }
            _ => false,
        }
    }

    pub fn unwield(&mut self, id: ItemId) {
        if let Some(item) = self.items.iter_mut().find(|i| i.item == id) {
            item.wielded = false;
        }
    }

    /// Lose an item to the floor
    pub fn drop_item(&mut self, id: ItemId) -> bool {
        match self.items.iter().position(|i| i.item == id) {
            Some(index) => {
                let mut item = self.items.remove(index);
                item.wielded = false;
                self.dropped.push(item);
                true
            }
            None => false,
        }
    }

    /// Pick a dropped item back up
    pub fn retrieve(&mut self, id: ItemId) -> bool {
        match self.dropped.iter().position(|i| i.item == id) {
            Some(index) => {
                let item = self.dropped.remove(index);
                self.items.push(item);
                true
            }
            None => false,
        }
    }

    pub fn favourite_lost(&self) -> Option<ItemId> {
        self.favourite
            .filter(|fav| self.dropped.iter().any(|i| i.item == *fav))
    }

    fn ranged_mut(&mut self) -> Option<(&mut bool, &mut Vec<LoadedRound>, &RangedWeaponType)> {
        self.items.iter_mut().filter(|i| i.wielded).find_map(|i| match &mut i.kind {
            GearKind::Ranged {
                weapon,
                readied,
                loaded,
            } => Some((readied, loaded, &*weapon)),
            _ => None,
        })
    }

    pub fn ready_ranged(&mut self) -> bool {
        match self.ranged_mut() {
            Some((readied, _, _)) => {
                *readied = true;
                true
            }
            None => false,
        }
    }

    /// Spare rounds that fit the wielded ranged weapon
    pub fn ammunition_available(&self) -> u32 {
        let Some(view) = self.wielded_ranged() else {
            return 0;
        };
        self.ammunition
            .iter()
            .filter(|s| view.weapon.accepts(&s.ammunition))
            .map(|s| s.count)
            .sum()
    }

    /// Move one matching round from a stack into the wielded weapon
    pub fn load_ranged(&mut self) -> bool {
        let Some(view) = self.wielded_ranged() else {
            return false;
        };
        if view.loaded.len() as u32 >= view.weapon.capacity {
            return false;
        }
        let weapon = view.weapon.clone();
        let Some(stack) = self
            .ammunition
            .iter_mut()
            .find(|s| s.count > 0 && weapon.accepts(&s.ammunition))
        else {
            return false;
        };
        stack.count -= 1;
        let round = LoadedRound {
            ammunition: stack.ammunition.clone(),
            quality: stack.quality,
        };
        match self.ranged_mut() {
            Some((_, loaded, _)) => {
                loaded.push(round);
                true
            }
            None => false,
        }
    }

    /// Take the next round out of the wielded weapon for firing
    pub fn fire_round(&mut self) -> Option<LoadedRound> {
        let (readied, loaded, weapon) = self.ranged_mut()?;
        let round = loaded.pop();
        if round.is_some() && weapon.requires_readying && loaded.is_empty() {
            *readied = false;
        }
        round
    }
}
