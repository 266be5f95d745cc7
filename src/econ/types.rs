use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PROFILE_SCHEMA_VERSION: u8 = 1;
pub const ACTIVITY_SCHEMA_VERSION: u8 = 1;

/// The fixed set of tradeable item kinds. The set may grow; every match on
/// it is exhaustive so additions surface at compile time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Wood,
    Apple,
    Diamond,
    Fish,
    Puffer,
}

impl ItemKind {
    pub const ALL: &'static [ItemKind] = &[
        ItemKind::Wood,
        ItemKind::Apple,
        ItemKind::Diamond,
        ItemKind::Fish,
        ItemKind::Puffer,
    ];

    /// Canonical lowercase key as typed by users and stored in config.
    pub fn key(&self) -> &'static str {
        match self {
            ItemKind::Wood => "wood",
            ItemKind::Apple => "apple",
            ItemKind::Diamond => "diamond",
            ItemKind::Fish => "fish",
            ItemKind::Puffer => "puffer",
        }
    }

    /// Display label for inventory and price listings.
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Wood => "Wood",
            ItemKind::Apple => "Apple",
            ItemKind::Diamond => "Diamond",
            ItemKind::Fish => "Fish",
            ItemKind::Puffer => "Puffer",
        }
    }

    /// Parse a user-supplied item name (case-insensitive).
    pub fn parse(input: &str) -> Option<ItemKind> {
        let lowered = input.trim().to_ascii_lowercase();
        ItemKind::ALL.iter().copied().find(|kind| kind.key() == lowered)
    }
}

/// The three cooldown-gated gathering activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatherKind {
    Mine,
    Chop,
    Fish,
}

impl GatherKind {
    pub fn verb(&self) -> &'static str {
        match self {
            GatherKind::Mine => "mine",
            GatherKind::Chop => "chop",
            GatherKind::Fish => "fish",
        }
    }

    /// The low-probability bonus item each activity can drop.
    pub fn bonus_item(&self) -> ItemKind {
        match self {
            GatherKind::Mine => ItemKind::Diamond,
            GatherKind::Chop => ItemKind::Apple,
            GatherKind::Fish => ItemKind::Puffer,
        }
    }
}

/// Derive a level from accumulated experience: `floor(0.1 * sqrt(e))`.
///
/// Callers must apply the ratchet: a stored level is never lowered even if
/// this formula yields less (see [`UserProfile::add_experience`]).
pub fn level_for_experience(experience: u64) -> u32 {
    (0.1 * (experience as f64).sqrt()).floor() as u32
}

/// One persistent record per participant: progression, balance, inventory.
///
/// Created lazily on first qualifying interaction and never deleted.
/// `display_name` and `discriminator` are presentation strings refreshed on
/// every interaction; identity is carried by `id` alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub discriminator: String,
    pub level: u32,
    pub experience: u64,
    pub coins: u64,
    #[serde(default)]
    pub inventory: HashMap<ItemKind, u64>,
    pub last_daily: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl UserProfile {
    pub fn new(id: &str, display_name: &str, discriminator: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            discriminator: discriminator.to_string(),
            level: 1,
            experience: 0,
            coins: 0,
            inventory: HashMap::new(),
            last_daily: None,
            created_at: now,
            updated_at: now,
            schema_version: PROFILE_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Overwrite the last-observed presentation strings.
    pub fn refresh_identity(&mut self, display_name: &str, discriminator: &str) {
        self.display_name = display_name.to_string();
        self.discriminator = discriminator.to_string();
    }

    /// `name#discriminator` tag used in leaderboard lines.
    pub fn tag(&self) -> String {
        format!("{}#{}", self.display_name, self.discriminator)
    }

    pub fn item_count(&self, kind: ItemKind) -> u64 {
        self.inventory.get(&kind).copied().unwrap_or(0)
    }

    pub fn add_item(&mut self, kind: ItemKind, quantity: u64) {
        let slot = self.inventory.entry(kind).or_insert(0);
        *slot = slot.saturating_add(quantity);
    }

    /// Remove items from a slot. Returns false (and mutates nothing) when
    /// fewer than `quantity` are held, so the slot never goes negative.
    pub fn remove_item(&mut self, kind: ItemKind, quantity: u64) -> bool {
        match self.inventory.get_mut(&kind) {
            Some(held) if *held >= quantity => {
                *held -= quantity;
                true
            }
            _ => false,
        }
    }

    /// Add experience and recompute the level under the ratchet rule: the
    /// stored level only ever increases. Returns true when a level-up occurred.
    pub fn add_experience(&mut self, amount: u64) -> bool {
        self.experience = self.experience.saturating_add(amount);
        let computed = level_for_experience(self.experience);
        if computed > self.level {
            self.level = computed;
            true
        } else {
            false
        }
    }
}

/// Per-participant gathering cooldown state, independent of the profile.
/// Mutated only by the reward engine; the cumulative totals are
/// informational and not currently read back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityState {
    pub id: String,
    pub last_mined: Option<DateTime<Utc>>,
    pub last_chopped: Option<DateTime<Utc>>,
    pub last_fished: Option<DateTime<Utc>>,
    pub total_mined: u64,
    pub total_chopped: u64,
    pub total_fished: u64,
    pub schema_version: u8,
}

impl ActivityState {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            last_mined: None,
            last_chopped: None,
            last_fished: None,
            total_mined: 0,
            total_chopped: 0,
            total_fished: 0,
            schema_version: ACTIVITY_SCHEMA_VERSION,
        }
    }

    pub fn last_at(&self, kind: GatherKind) -> Option<DateTime<Utc>> {
        match kind {
            GatherKind::Mine => self.last_mined,
            GatherKind::Chop => self.last_chopped,
            GatherKind::Fish => self.last_fished,
        }
    }

    /// Record a completed gather: stamp the timestamp and bump the counter.
    pub fn stamp(&mut self, kind: GatherKind, now: DateTime<Utc>) {
        match kind {
            GatherKind::Mine => {
                self.last_mined = Some(now);
                self.total_mined = self.total_mined.saturating_add(1);
            }
            GatherKind::Chop => {
                self.last_chopped = Some(now);
                self.total_chopped = self.total_chopped.saturating_add(1);
            }
            GatherKind::Fish => {
                self.last_fished = Some(now);
                self.total_fished = self.total_fished.saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_formula_matches_reference_points() {
        assert_eq!(level_for_experience(0), 0);
        assert_eq!(level_for_experience(99), 0);
        assert_eq!(level_for_experience(100), 1);
        assert_eq!(level_for_experience(399), 1);
        assert_eq!(level_for_experience(400), 2);
        assert_eq!(level_for_experience(10_000), 10);
    }

    #[test]
    fn level_is_a_ratchet() {
        let mut profile = UserProfile::new("u1", "Alice", "0001", Utc::now());
        assert_eq!(profile.level, 1);

        // Small gains never pull the level below its starting floor.
        assert!(!profile.add_experience(20));
        assert_eq!(profile.level, 1);

        // Crossing the 400 XP boundary levels up once.
        assert!(profile.add_experience(400));
        assert_eq!(profile.level, 2);

        // Repeated small gains do not re-trigger.
        assert!(!profile.add_experience(1));
        assert_eq!(profile.level, 2);
    }

    #[test]
    fn inventory_never_goes_negative() {
        let mut profile = UserProfile::new("u1", "Alice", "0001", Utc::now());
        profile.add_item(ItemKind::Wood, 3);
        assert!(!profile.remove_item(ItemKind::Wood, 5));
        assert_eq!(profile.item_count(ItemKind::Wood), 3);
        assert!(profile.remove_item(ItemKind::Wood, 3));
        assert_eq!(profile.item_count(ItemKind::Wood), 0);
        assert!(!profile.remove_item(ItemKind::Apple, 1));
    }

    #[test]
    fn item_kind_parsing() {
        assert_eq!(ItemKind::parse("wood"), Some(ItemKind::Wood));
        assert_eq!(ItemKind::parse(" PUFFER "), Some(ItemKind::Puffer));
        assert_eq!(ItemKind::parse("gold"), None);
    }

    #[test]
    fn activity_stamp_updates_one_slot() {
        let now = Utc::now();
        let mut state = ActivityState::new("u1");
        state.stamp(GatherKind::Chop, now);
        assert_eq!(state.last_chopped, Some(now));
        assert_eq!(state.total_chopped, 1);
        assert_eq!(state.last_mined, None);
        assert_eq!(state.total_mined, 0);
    }
}
