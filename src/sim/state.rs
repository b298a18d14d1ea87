//! Persistent progress model
//!
//! Everything that must survive a reload lives in [`ProgressState`].

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::consts::*;

/// A themed world bound to one operation and one reward resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanetId {
    Terra,
    Marte,
    Saturno,
    Andromeda,
}

impl PlanetId {
    /// Unlock chain order
    pub const ALL: [PlanetId; 4] = [
        PlanetId::Terra,
        PlanetId::Marte,
        PlanetId::Saturno,
        PlanetId::Andromeda,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanetId::Terra => "terra",
            PlanetId::Marte => "marte",
            PlanetId::Saturno => "saturno",
            PlanetId::Andromeda => "andromeda",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "terra" => Some(PlanetId::Terra),
            "marte" => Some(PlanetId::Marte),
            "saturno" => Some(PlanetId::Saturno),
            "andromeda" | "andrômeda" => Some(PlanetId::Andromeda),
            _ => None,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            PlanetId::Terra => Operation::Add,
            PlanetId::Marte => Operation::Sub,
            PlanetId::Saturno => Operation::Mul,
            PlanetId::Andromeda => Operation::Div,
        }
    }

    /// Resource credited when a tier of this planet is completed
    pub fn resource(&self) -> ResourceKind {
        match self {
            PlanetId::Terra => ResourceKind::Agua,
            PlanetId::Marte => ResourceKind::Areia,
            PlanetId::Saturno => ResourceKind::Aneis,
            PlanetId::Andromeda => ResourceKind::Poeira,
        }
    }

    /// Next planet in the unlock chain
    pub fn next(&self) -> Option<PlanetId> {
        match self {
            PlanetId::Terra => Some(PlanetId::Marte),
            PlanetId::Marte => Some(PlanetId::Saturno),
            PlanetId::Saturno => Some(PlanetId::Andromeda),
            PlanetId::Andromeda => None,
        }
    }
}

/// Arithmetic operation asked on a planet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operation {
    pub fn symbol(&self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Sub => '-',
            Operation::Mul => '×',
            Operation::Div => '÷',
        }
    }
}

/// Persistent currency, one per planet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Agua,
    Areia,
    Aneis,
    Poeira,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Agua,
        ResourceKind::Areia,
        ResourceKind::Aneis,
        ResourceKind::Poeira,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Agua => "agua",
            ResourceKind::Areia => "areia",
            ResourceKind::Aneis => "aneis",
            ResourceKind::Poeira => "poeira",
        }
    }
}

/// Purchasable upgrade identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeId {
    FuelCapacity,
    FuelEfficiency,
    ResourceBonus,
    TimeDilation,
    AstroNavigation,
    StarJackpot,
}

impl UpgradeId {
    pub const ALL: [UpgradeId; 6] = [
        UpgradeId::FuelCapacity,
        UpgradeId::FuelEfficiency,
        UpgradeId::ResourceBonus,
        UpgradeId::TimeDilation,
        UpgradeId::AstroNavigation,
        UpgradeId::StarJackpot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeId::FuelCapacity => "fuelCapacity",
            UpgradeId::FuelEfficiency => "fuelEfficiency",
            UpgradeId::ResourceBonus => "resourceBonus",
            UpgradeId::TimeDilation => "timeDilation",
            UpgradeId::AstroNavigation => "astroNavigation",
            UpgradeId::StarJackpot => "starJackpot",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        UpgradeId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
    }
}

/// Fuel persisted so an interrupted session resumes with the same tank
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelSnapshot {
    pub max_fuel: f64,
    pub current_fuel: f64,
}

impl Default for FuelSnapshot {
    fn default() -> Self {
        Self {
            max_fuel: BASE_MAX_FUEL,
            current_fuel: BASE_MAX_FUEL,
        }
    }
}

/// Completion of each tier on a planet
pub type TierFlags = [bool; LEVEL_COUNT];

/// Status of one tier on the level track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TierStatus {
    Completed,
    Available,
    Locked,
}

/// Keys of the progress blob this build understands
pub const PROGRESS_KEYS: [&str; 5] = ["unlocked", "resources", "upgrades", "levels", "fuelData"];

/// The single persisted aggregate.
///
/// Blob content this build does not recognise is carried through untouched
/// and written back on save: unknown top-level keys in `extra`, unknown
/// entries inside a known section (such as upgrades that left the catalog)
/// in `unknown_entries`, keyed by section name.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    pub unlocked: BTreeMap<PlanetId, bool>,
    pub resources: BTreeMap<ResourceKind, u32>,
    pub upgrades: BTreeMap<UpgradeId, u32>,
    pub levels: BTreeMap<PlanetId, TierFlags>,
    pub fuel: FuelSnapshot,
    pub unknown_entries: BTreeMap<String, Map<String, Value>>,
    pub extra: Map<String, Value>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            unlocked: default_unlocked(),
            resources: default_resources(),
            upgrades: BTreeMap::new(),
            levels: default_levels(),
            fuel: FuelSnapshot::default(),
            unknown_entries: BTreeMap::new(),
            extra: Map::new(),
        }
    }
}

impl ProgressState {
    /// Keep an entry of `section` that this build cannot interpret
    pub fn carry_entry(&mut self, section: &str, key: &str, value: Value) {
        self.unknown_entries
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn section<'a, K, V>(&'a self, name: &str, known: &'a BTreeMap<K, V>) -> Section<'a, K, V> {
        Section {
            known,
            unknown: self.unknown_entries.get(name),
        }
    }
}

/// One section object: typed entries plus carried unknown ones
struct Section<'a, K, V> {
    known: &'a BTreeMap<K, V>,
    unknown: Option<&'a Map<String, Value>>,
}

impl<K: Serialize, V: Serialize> Serialize for Section<'_, K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in self.unknown.into_iter().flatten() {
            map.serialize_entry(key, value)?;
        }
        for (key, value) in self.known {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for ProgressState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.extra {
            if !PROGRESS_KEYS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        let unlocked = self.section("unlocked", &self.unlocked);
        let resources = self.section("resources", &self.resources);
        let upgrades = self.section("upgrades", &self.upgrades);
        let levels = self.section("levels", &self.levels);
        map.serialize_entry("unlocked", &unlocked)?;
        map.serialize_entry("resources", &resources)?;
        map.serialize_entry("upgrades", &upgrades)?;
        map.serialize_entry("levels", &levels)?;
        map.serialize_entry("fuelData", &self.fuel)?;
        map.end()
    }
}

/// Any blob deserializes through the additive migration
impl<'de> Deserialize<'de> for ProgressState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        crate::persistence::migrate(value).map_err(D::Error::custom)
    }
}

pub(crate) fn default_unlocked() -> BTreeMap<PlanetId, bool> {
    PlanetId::ALL
        .into_iter()
        .map(|p| (p, p == PlanetId::Terra))
        .collect()
}

pub(crate) fn default_resources() -> BTreeMap<ResourceKind, u32> {
    ResourceKind::ALL.into_iter().map(|r| (r, 0)).collect()
}

pub(crate) fn default_levels() -> BTreeMap<PlanetId, TierFlags> {
    PlanetId::ALL
        .into_iter()
        .map(|p| (p, [false; LEVEL_COUNT]))
        .collect()
}

impl ProgressState {
    pub fn is_unlocked(&self, planet: PlanetId) -> bool {
        planet == PlanetId::Terra || self.unlocked.get(&planet).copied().unwrap_or(false)
    }

    /// Unlock a planet. Returns true if it was locked before.
    /// Planets are never locked again.
    pub fn unlock(&mut self, planet: PlanetId) -> bool {
        let entry = self.unlocked.entry(planet).or_insert(false);
        let newly = !*entry;
        *entry = true;
        newly
    }

    pub fn resource(&self, kind: ResourceKind) -> u32 {
        self.resources.get(&kind).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, kind: ResourceKind, amount: u32) {
        let entry = self.resources.entry(kind).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn upgrade_level(&self, id: UpgradeId) -> u32 {
        self.upgrades.get(&id).copied().unwrap_or(0)
    }

    pub fn tiers(&self, planet: PlanetId) -> TierFlags {
        self.levels
            .get(&planet)
            .copied()
            .unwrap_or([false; LEVEL_COUNT])
    }

    pub fn completed_tiers(&self, planet: PlanetId) -> usize {
        self.tiers(planet).iter().filter(|done| **done).count()
    }

    /// Tier 1 is always available; tier n needs tier n-1 completed
    pub fn tier_available(&self, planet: PlanetId, level: u8) -> bool {
        let tiers = self.tiers(planet);
        match level {
            1 => true,
            2..=3 => tiers[level as usize - 2],
            _ => false,
        }
    }

    pub fn tier_status(&self, planet: PlanetId) -> [TierStatus; LEVEL_COUNT] {
        let tiers = self.tiers(planet);
        let mut out = [TierStatus::Locked; LEVEL_COUNT];
        for (i, status) in out.iter_mut().enumerate() {
            *status = if tiers[i] {
                TierStatus::Completed
            } else if self.tier_available(planet, i as u8 + 1) {
                TierStatus::Available
            } else {
                TierStatus::Locked
            };
        }
        out
    }

    pub fn mark_tier_complete(&mut self, planet: PlanetId, level: u8) {
        if !(1..=LEVEL_COUNT as u8).contains(&level) {
            return;
        }
        let tiers = self.levels.entry(planet).or_insert([false; LEVEL_COUNT]);
        tiers[level as usize - 1] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = ProgressState::default();
        assert!(state.is_unlocked(PlanetId::Terra));
        assert!(!state.is_unlocked(PlanetId::Marte));
        assert!(!state.is_unlocked(PlanetId::Andromeda));
        assert_eq!(state.resource(ResourceKind::Poeira), 0);
        assert_eq!(state.upgrade_level(UpgradeId::StarJackpot), 0);
        assert_eq!(state.fuel.current_fuel, 100.0);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ProgressState::default()).unwrap();
        assert_eq!(json["unlocked"]["terra"], true);
        assert_eq!(json["resources"]["agua"], 0);
        assert_eq!(
            json["levels"]["saturno"],
            serde_json::json!([false, false, false])
        );
        assert_eq!(json["fuelData"]["maxFuel"], 100.0);
        assert_eq!(json["fuelData"]["currentFuel"], 100.0);
        assert_eq!(json["upgrades"], serde_json::json!({}));
    }

    #[test]
    fn test_unknown_content_written_back() {
        let mut state = ProgressState::default();
        state.upgrades.insert(UpgradeId::FuelCapacity, 1);
        state.carry_entry("upgrades", "dustConverter", 2.into());
        state.carry_entry("unlocked", "pluto", Value::Bool(true));
        state
            .extra
            .insert("settings".to_string(), serde_json::json!({ "tts": true }));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["upgrades"]["fuelCapacity"], 1);
        assert_eq!(json["upgrades"]["dustConverter"], 2);
        assert_eq!(json["unlocked"]["pluto"], true);
        assert_eq!(json["unlocked"]["terra"], true);
        assert_eq!(json["settings"]["tts"], true);

        let back: ProgressState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_unlock_is_monotonic() {
        let mut state = ProgressState::default();
        assert!(state.unlock(PlanetId::Marte));
        assert!(!state.unlock(PlanetId::Marte));
        assert!(state.is_unlocked(PlanetId::Marte));
    }

    #[test]
    fn test_tier_availability_chain() {
        let mut state = ProgressState::default();
        assert!(state.tier_available(PlanetId::Terra, 1));
        assert!(!state.tier_available(PlanetId::Terra, 2));
        assert!(!state.tier_available(PlanetId::Terra, 0));
        assert!(!state.tier_available(PlanetId::Terra, 4));

        state.mark_tier_complete(PlanetId::Terra, 1);
        assert!(state.tier_available(PlanetId::Terra, 2));
        assert!(!state.tier_available(PlanetId::Terra, 3));
        assert_eq!(
            state.tier_status(PlanetId::Terra),
            [TierStatus::Completed, TierStatus::Available, TierStatus::Locked]
        );
        assert_eq!(state.completed_tiers(PlanetId::Terra), 1);
    }

    #[test]
    fn test_id_parsing() {
        assert_eq!(PlanetId::from_str("Andrômeda"), Some(PlanetId::Andromeda));
        assert_eq!(PlanetId::from_str("pluto"), None);
        assert_eq!(
            UpgradeId::from_str("astronavigation"),
            Some(UpgradeId::AstroNavigation)
        );
        for planet in PlanetId::ALL {
            assert_eq!(PlanetId::from_str(planet.as_str()), Some(planet));
        }
    }
}
