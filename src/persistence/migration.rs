//! Additive migration of the progress blob
//!
//! Older builds wrote fewer keys (no `levels`, no `fuelData`, only three
//! planets). Every key that is missing or unreadable gets its default while
//! readable siblings are kept. Keys this build does not know, including
//! upgrades that left the catalog, are carried through to the next save.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::consts::LEVEL_COUNT;
use crate::sim::state::{
    FuelSnapshot, PROGRESS_KEYS, PlanetId, ProgressState, ResourceKind, TierFlags, UpgradeId,
    default_levels, default_resources, default_unlocked,
};
use crate::sim::upgrades::definition;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("progress blob is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("progress blob is not a JSON object")]
    NotAnObject,
}

/// Parse and migrate a raw blob
pub fn migrate_str(raw: &str) -> Result<ProgressState, MigrationError> {
    let value: Value = serde_json::from_str(raw)?;
    migrate(value)
}

/// Migrate an already parsed blob
pub fn migrate(value: Value) -> Result<ProgressState, MigrationError> {
    let Value::Object(root) = value else {
        return Err(MigrationError::NotAnObject);
    };

    let mut state = ProgressState::default();

    if let Some(Value::Object(map)) = root.get("unlocked") {
        migrate_unlocked(map, &mut state);
    }
    if let Some(Value::Object(map)) = root.get("resources") {
        migrate_resources(map, &mut state);
    }
    if let Some(Value::Object(map)) = root.get("upgrades") {
        migrate_upgrades(map, &mut state);
    }
    if let Some(Value::Object(map)) = root.get("levels") {
        migrate_levels(map, &mut state);
    }
    if let Some(Value::Object(map)) = root.get("fuelData") {
        state.fuel = migrate_fuel(map);
    }

    state.extra = root
        .into_iter()
        .filter(|(key, _)| !PROGRESS_KEYS.contains(&key.as_str()))
        .collect();

    Ok(state)
}

fn as_count(value: &Value) -> u32 {
    match value.as_f64() {
        Some(v) if v.is_finite() && v > 0.0 => v.floor().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn migrate_unlocked(map: &Map<String, Value>, state: &mut ProgressState) {
    let mut unlocked = default_unlocked();
    for (key, value) in map {
        match PlanetId::from_str(key) {
            Some(planet) => {
                if let Some(flag) = value.as_bool() {
                    unlocked.insert(planet, flag);
                }
            }
            None => state.carry_entry("unlocked", key, value.clone()),
        }
    }
    unlocked.insert(PlanetId::Terra, true);
    state.unlocked = unlocked;
}

fn migrate_resources(map: &Map<String, Value>, state: &mut ProgressState) {
    let mut resources = default_resources();
    for (key, value) in map {
        match ResourceKind::ALL.into_iter().find(|k| k.as_str() == key) {
            Some(kind) => {
                resources.insert(kind, as_count(value));
            }
            None => state.carry_entry("resources", key, value.clone()),
        }
    }
    state.resources = resources;
}

fn migrate_upgrades(map: &Map<String, Value>, state: &mut ProgressState) {
    for (key, value) in map {
        let Some(id) = UpgradeId::from_str(key) else {
            log::debug!("Keeping retired upgrade '{}'", key);
            state.carry_entry("upgrades", key, value.clone());
            continue;
        };
        let level = as_count(value).min(definition(id).max_level);
        if level > 0 {
            state.upgrades.insert(id, level);
        }
    }
}

fn migrate_levels(map: &Map<String, Value>, state: &mut ProgressState) {
    let mut levels = default_levels();
    for (key, value) in map {
        let Some(planet) = PlanetId::from_str(key) else {
            state.carry_entry("levels", key, value.clone());
            continue;
        };
        let Some(arr) = value.as_array() else {
            continue;
        };
        let mut flags: TierFlags = [false; LEVEL_COUNT];
        for (flag, v) in flags.iter_mut().zip(arr) {
            *flag = v.as_bool().unwrap_or(false);
        }
        levels.insert(planet, flags);
    }
    state.levels = levels;
}

fn migrate_fuel(map: &Map<String, Value>) -> FuelSnapshot {
    let defaults = FuelSnapshot::default();
    let read = |key: &str| {
        map.get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite() && *v >= 0.0)
    };
    let max_fuel = read("maxFuel")
        .filter(|v| *v > 0.0)
        .unwrap_or(defaults.max_fuel);
    let current_fuel = read("currentFuel").unwrap_or(max_fuel).min(max_fuel);
    FuelSnapshot {
        max_fuel,
        current_fuel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_gets_defaults() {
        let state = migrate(json!({})).unwrap();
        assert_eq!(state, ProgressState::default());
    }

    #[test]
    fn test_rejects_non_objects() {
        assert!(matches!(
            migrate(json!([1, 2])),
            Err(MigrationError::NotAnObject)
        ));
        assert!(matches!(migrate_str("{oops"), Err(MigrationError::Json(_))));
    }

    #[test]
    fn test_old_blob_keeps_siblings() {
        // Written before saturno, levels and fuel existed
        let state = migrate(json!({
            "unlocked": { "terra": true, "marte": true },
            "resources": { "agua": 12, "areia": 3 },
            "upgrades": { "fuelCapacity": 2 }
        }))
        .unwrap();

        assert!(state.is_unlocked(PlanetId::Marte));
        assert!(!state.is_unlocked(PlanetId::Saturno));
        assert_eq!(state.unlocked.get(&PlanetId::Andromeda), Some(&false));
        assert_eq!(state.resource(ResourceKind::Agua), 12);
        assert_eq!(state.resource(ResourceKind::Poeira), 0);
        assert_eq!(state.upgrade_level(UpgradeId::FuelCapacity), 2);
        assert_eq!(state.tiers(PlanetId::Terra), [false; 3]);
        assert_eq!(state.fuel, FuelSnapshot::default());
    }

    #[test]
    fn test_sanitizes_values() {
        let state = migrate(json!({
            "unlocked": { "terra": false, "pluto": true },
            "resources": { "agua": -4, "areia": 2.7, "aneis": "lots" },
            "upgrades": { "astroNavigation": 9, "dustConverter": 3 },
            "levels": { "terra": [true], "marte": [true, true, true, true] },
            "fuelData": { "maxFuel": 120, "currentFuel": 500 }
        }))
        .unwrap();

        assert!(state.is_unlocked(PlanetId::Terra));
        assert_eq!(state.unlocked.get(&PlanetId::Terra), Some(&true));
        assert_eq!(state.resource(ResourceKind::Agua), 0);
        assert_eq!(state.resource(ResourceKind::Areia), 2);
        assert_eq!(state.resource(ResourceKind::Aneis), 0);
        assert_eq!(state.upgrade_level(UpgradeId::AstroNavigation), 2);
        assert_eq!(state.upgrades.len(), 1);
        assert_eq!(
            state.unknown_entries["upgrades"].get("dustConverter"),
            Some(&json!(3))
        );
        let unlocked = &state.unknown_entries["unlocked"];
        assert_eq!(unlocked.get("pluto"), Some(&json!(true)));
        assert_eq!(state.tiers(PlanetId::Terra), [true, false, false]);
        assert_eq!(state.tiers(PlanetId::Marte), [true, true, true]);
        assert_eq!(state.fuel.max_fuel, 120.0);
        assert_eq!(state.fuel.current_fuel, 120.0);
    }

    #[test]
    fn test_unknown_keys_survive_resave() {
        let state = migrate(json!({
            "unlocked": { "terra": true },
            "resources": { "agua": 5 },
            "upgrades": { "fuelCapacity": 1, "dustConverter": 2 },
            "levels": { "plutao": [true] },
            "settings": { "tts": true },
            "playerName": "Ana"
        }))
        .unwrap();
        assert_eq!(state.upgrade_level(UpgradeId::FuelCapacity), 1);

        let saved = serde_json::to_value(&state).unwrap();
        assert_eq!(saved["settings"], json!({ "tts": true }));
        assert_eq!(saved["playerName"], "Ana");
        assert_eq!(saved["upgrades"]["dustConverter"], 2);
        assert_eq!(saved["upgrades"]["fuelCapacity"], 1);
        assert_eq!(saved["levels"]["plutao"], json!([true]));
        assert_eq!(saved["levels"]["terra"], json!([false, false, false]));
        assert_eq!(migrate(saved).unwrap(), state);
    }

    #[test]
    fn test_current_state_roundtrip() {
        let mut state = ProgressState::default();
        state.unlock(PlanetId::Saturno);
        state.credit(ResourceKind::Aneis, 9);
        state.upgrades.insert(UpgradeId::StarJackpot, 3);
        state.mark_tier_complete(PlanetId::Marte, 2);
        state.fuel.current_fuel = 33.5;

        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(migrate_str(&json).unwrap(), state);
    }
}
