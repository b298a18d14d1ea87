//! Upgrade catalog and resource economy
//!
//! Each upgrade's effect is a pure function of its level that fully
//! determines one tunable. Folding every patch over the base values gives the
//! same result in any order, and replaying it any number of times is a no-op.

use serde::Serialize;
use thiserror::Error;

use super::state::{ProgressState, ResourceKind, UpgradeId};
use crate::tuning::Tuning;

/// Values derived from upgrade levels. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tunables {
    pub max_fuel: f64,
    pub fuel_gain_on_correct: f64,
    pub fuel_loss_per_second: f64,
    pub question_reduction: u32,
    pub jackpot_chance: f64,
    pub resource_bonus: u32,
}

impl Tunables {
    /// Values with no upgrades purchased
    pub fn base(tuning: &Tuning) -> Self {
        Self {
            max_fuel: tuning.base_max_fuel,
            fuel_gain_on_correct: tuning.base_fuel_gain,
            fuel_loss_per_second: tuning.base_fuel_loss_per_sec,
            question_reduction: 0,
            jackpot_chance: 0.0,
            resource_bonus: 0,
        }
    }

    fn apply(&mut self, patch: TunablePatch) {
        match patch {
            TunablePatch::MaxFuel(v) => self.max_fuel = v,
            TunablePatch::FuelGain(v) => self.fuel_gain_on_correct = v,
            TunablePatch::FuelLossPerSecond(v) => self.fuel_loss_per_second = v,
            TunablePatch::QuestionReduction(v) => self.question_reduction = v,
            TunablePatch::JackpotChance(v) => self.jackpot_chance = v,
            TunablePatch::ResourceBonus(v) => self.resource_bonus = v,
        }
    }
}

/// Overwrite of a single tunable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TunablePatch {
    MaxFuel(f64),
    FuelGain(f64),
    FuelLossPerSecond(f64),
    QuestionReduction(u32),
    JackpotChance(f64),
    ResourceBonus(u32),
}

/// Static catalog entry
#[derive(Debug, Clone, Copy)]
pub struct UpgradeDefinition {
    pub id: UpgradeId,
    pub max_level: u32,
    pub base_cost: &'static [(ResourceKind, u32)],
    /// Cost multiplier per owned level (> 1)
    pub cost_scale: f64,
    effect: fn(u32, &Tuning) -> TunablePatch,
}

impl UpgradeDefinition {
    pub fn effect(&self, level: u32, tuning: &Tuning) -> TunablePatch {
        (self.effect)(level.min(self.max_level), tuning)
    }

    /// Cost to go from `level` to `level + 1`: `ceil(base * scale^level)`
    pub fn cost_at(&self, level: u32) -> Cost {
        let factor = self.cost_scale.powi(level as i32);
        Cost(
            self.base_cost
                .iter()
                .map(|&(kind, base)| (kind, (base as f64 * factor).ceil() as u32))
                .collect(),
        )
    }
}

fn fuel_capacity(level: u32, t: &Tuning) -> TunablePatch {
    TunablePatch::MaxFuel(t.base_max_fuel + 20.0 * level as f64)
}

fn fuel_efficiency(level: u32, t: &Tuning) -> TunablePatch {
    TunablePatch::FuelGain(t.base_fuel_gain + 3.0 * level as f64)
}

fn resource_bonus(level: u32, _: &Tuning) -> TunablePatch {
    TunablePatch::ResourceBonus(level)
}

fn time_dilation(level: u32, t: &Tuning) -> TunablePatch {
    // ~8% per level, never below 40% of base drain
    let mult = (1.0 - 0.08 * level as f64).max(0.4);
    TunablePatch::FuelLossPerSecond(t.base_fuel_loss_per_sec * mult)
}

fn astro_navigation(level: u32, _: &Tuning) -> TunablePatch {
    TunablePatch::QuestionReduction(level)
}

fn star_jackpot(level: u32, _: &Tuning) -> TunablePatch {
    TunablePatch::JackpotChance(0.08 * level as f64)
}

pub static CATALOG: [UpgradeDefinition; 6] = [
    UpgradeDefinition {
        id: UpgradeId::FuelCapacity,
        max_level: 5,
        base_cost: &[(ResourceKind::Agua, 4)],
        cost_scale: 1.6,
        effect: fuel_capacity,
    },
    UpgradeDefinition {
        id: UpgradeId::FuelEfficiency,
        max_level: 5,
        base_cost: &[(ResourceKind::Areia, 4)],
        cost_scale: 1.6,
        effect: fuel_efficiency,
    },
    UpgradeDefinition {
        id: UpgradeId::ResourceBonus,
        max_level: 5,
        base_cost: &[(ResourceKind::Aneis, 3)],
        cost_scale: 1.7,
        effect: resource_bonus,
    },
    UpgradeDefinition {
        id: UpgradeId::TimeDilation,
        max_level: 5,
        base_cost: &[(ResourceKind::Poeira, 4)],
        cost_scale: 1.7,
        effect: time_dilation,
    },
    UpgradeDefinition {
        id: UpgradeId::AstroNavigation,
        max_level: 2,
        base_cost: &[(ResourceKind::Areia, 6)],
        cost_scale: 1.5,
        effect: astro_navigation,
    },
    UpgradeDefinition {
        id: UpgradeId::StarJackpot,
        max_level: 4,
        base_cost: &[(ResourceKind::Poeira, 5)],
        cost_scale: 1.7,
        effect: star_jackpot,
    },
];

pub fn definition(id: UpgradeId) -> &'static UpgradeDefinition {
    let index = match id {
        UpgradeId::FuelCapacity => 0,
        UpgradeId::FuelEfficiency => 1,
        UpgradeId::ResourceBonus => 2,
        UpgradeId::TimeDilation => 3,
        UpgradeId::AstroNavigation => 4,
        UpgradeId::StarJackpot => 5,
    };
    &CATALOG[index]
}

/// Resource amounts required for one purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cost(pub Vec<(ResourceKind, u32)>);

impl Cost {
    pub fn amount(&self, kind: ResourceKind) -> u32 {
        self.0
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }

    pub fn affordable(&self, state: &ProgressState) -> bool {
        self.0.iter().all(|&(k, v)| state.resource(k) >= v)
    }

    /// Shortfall per resource (empty when affordable)
    pub fn missing(&self, state: &ProgressState) -> Vec<(ResourceKind, u32)> {
        self.0
            .iter()
            .filter_map(|&(k, v)| {
                let have = state.resource(k);
                (have < v).then(|| (k, v - have))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("{id:?} is already at max level {max_level}")]
    MaxLevelReached { id: UpgradeId, max_level: u32 },
    #[error("not enough resources for {id:?} (missing {missing:?})")]
    InsufficientResources {
        id: UpgradeId,
        missing: Vec<(ResourceKind, u32)>,
    },
}

/// Successful purchase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Purchase {
    pub id: UpgradeId,
    pub new_level: u32,
    pub spent: Cost,
}

/// Debit resources and raise the level by one, or change nothing at all
pub fn purchase(state: &mut ProgressState, id: UpgradeId) -> Result<Purchase, PurchaseError> {
    let def = definition(id);
    let level = state.upgrade_level(id);
    if level >= def.max_level {
        return Err(PurchaseError::MaxLevelReached {
            id,
            max_level: def.max_level,
        });
    }

    let cost = def.cost_at(level);
    let missing = cost.missing(state);
    if !missing.is_empty() {
        return Err(PurchaseError::InsufficientResources { id, missing });
    }

    for &(kind, amount) in &cost.0 {
        let entry = state.resources.entry(kind).or_insert(0);
        *entry -= amount;
    }
    state.upgrades.insert(id, level + 1);

    Ok(Purchase {
        id,
        new_level: level + 1,
        spent: cost,
    })
}

/// Recompute every tunable from the current upgrade levels
pub fn apply_all(state: &ProgressState, tuning: &Tuning) -> Tunables {
    CATALOG
        .iter()
        .map(|def| def.effect(state.upgrade_level(def.id), tuning))
        .fold(Tunables::base(tuning), |mut t, patch| {
            t.apply(patch);
            t
        })
}

/// Shop row for one catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeOffer {
    pub id: UpgradeId,
    pub level: u32,
    pub max_level: u32,
    /// None when maxed
    pub next_cost: Option<Cost>,
    pub affordable: bool,
}

pub fn offers(state: &ProgressState) -> Vec<UpgradeOffer> {
    CATALOG
        .iter()
        .map(|def| {
            let level = state.upgrade_level(def.id);
            let next_cost = (level < def.max_level).then(|| def.cost_at(level));
            let affordable = next_cost.as_ref().is_some_and(|c| c.affordable(state));
            UpgradeOffer {
                id: def.id,
                level,
                max_level: def.max_level,
                next_cost,
                affordable,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rich_state() -> ProgressState {
        let mut state = ProgressState::default();
        for kind in ResourceKind::ALL {
            state.credit(kind, 1000);
        }
        state
    }

    #[test]
    fn test_catalog_covers_every_id() {
        for id in UpgradeId::ALL {
            assert_eq!(definition(id).id, id);
        }
    }

    #[test]
    fn test_cost_curve() {
        let def = definition(UpgradeId::FuelEfficiency);
        assert_eq!(def.cost_at(0).amount(ResourceKind::Areia), 4);
        // ceil(4 * 1.6^3) = ceil(16.384)
        assert_eq!(def.cost_at(3).amount(ResourceKind::Areia), 17);
        assert_eq!(
            definition(UpgradeId::AstroNavigation)
                .cost_at(1)
                .amount(ResourceKind::Areia),
            9
        );
    }

    #[test]
    fn test_purchase_debits_and_levels() {
        let mut state = ProgressState::default();
        state.credit(ResourceKind::Agua, 10);

        let receipt = purchase(&mut state, UpgradeId::FuelCapacity).unwrap();
        assert_eq!(receipt.new_level, 1);
        assert_eq!(state.resource(ResourceKind::Agua), 6);
        assert_eq!(state.upgrade_level(UpgradeId::FuelCapacity), 1);

        // Level 1 costs ceil(4 * 1.6) = 7
        let err = purchase(&mut state, UpgradeId::FuelCapacity).unwrap_err();
        assert_eq!(
            err,
            PurchaseError::InsufficientResources {
                id: UpgradeId::FuelCapacity,
                missing: vec![(ResourceKind::Agua, 1)],
            }
        );
        assert_eq!(state.resource(ResourceKind::Agua), 6);
        assert_eq!(state.upgrade_level(UpgradeId::FuelCapacity), 1);
    }

    #[test]
    fn test_purchase_max_level() {
        let mut state = rich_state();
        purchase(&mut state, UpgradeId::AstroNavigation).unwrap();
        purchase(&mut state, UpgradeId::AstroNavigation).unwrap();
        let before = state.clone();
        assert_eq!(
            purchase(&mut state, UpgradeId::AstroNavigation),
            Err(PurchaseError::MaxLevelReached {
                id: UpgradeId::AstroNavigation,
                max_level: 2,
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_effects_match_table() {
        let tuning = Tuning::default();
        let mut state = ProgressState::default();
        for (id, level) in [
            (UpgradeId::FuelCapacity, 2),
            (UpgradeId::FuelEfficiency, 1),
            (UpgradeId::ResourceBonus, 3),
            (UpgradeId::TimeDilation, 5),
            (UpgradeId::AstroNavigation, 2),
            (UpgradeId::StarJackpot, 4),
        ] {
            state.upgrades.insert(id, level);
        }
        let t = apply_all(&state, &tuning);
        assert_eq!(t.max_fuel, 140.0);
        assert_eq!(t.fuel_gain_on_correct, 18.0);
        assert_eq!(t.resource_bonus, 3);
        assert!((t.fuel_loss_per_second - 3.0).abs() < 1e-9);
        assert_eq!(t.question_reduction, 2);
        assert!((t.jackpot_chance - 0.32).abs() < 1e-9);
    }

    #[test]
    fn test_time_dilation_floor() {
        let tuning = Tuning::default();
        let def = definition(UpgradeId::TimeDilation);
        // Levels are capped at max_level before the effect runs
        assert_eq!(
            def.effect(50, &tuning),
            def.effect(def.max_level, &tuning)
        );
    }

    #[test]
    fn test_offers() {
        let mut state = ProgressState::default();
        state.credit(ResourceKind::Poeira, 4);
        state.upgrades.insert(UpgradeId::AstroNavigation, 2);
        let offers = offers(&state);
        assert_eq!(offers.len(), CATALOG.len());

        let find = |id: UpgradeId| offers.iter().find(|o| o.id == id).unwrap();
        assert!(find(UpgradeId::TimeDilation).affordable);
        assert!(!find(UpgradeId::StarJackpot).affordable);
        let nav = find(UpgradeId::AstroNavigation);
        assert_eq!(nav.next_cost, None);
        assert!(!nav.affordable);
    }

    fn upgrade_levels() -> impl Strategy<Value = Vec<u32>> {
        proptest::collection::vec(0u32..6, CATALOG.len())
    }

    proptest! {
        #[test]
        fn prop_apply_all_idempotent_and_order_free(levels in upgrade_levels()) {
            let tuning = Tuning::default();
            let mut state = ProgressState::default();
            for (def, level) in CATALOG.iter().zip(&levels) {
                state.upgrades.insert(def.id, (*level).min(def.max_level));
            }
            let first = apply_all(&state, &tuning);
            prop_assert_eq!(first, apply_all(&state, &tuning));

            let reversed = CATALOG
                .iter()
                .rev()
                .map(|def| def.effect(state.upgrade_level(def.id), &tuning))
                .fold(Tunables::base(&tuning), |mut t, p| { t.apply(p); t });
            prop_assert_eq!(first, reversed);
        }

        #[test]
        fn prop_purchase_atomic(agua in 0u32..40, level in 0u32..=5) {
            let mut state = ProgressState::default();
            state.credit(ResourceKind::Agua, agua);
            state.upgrades.insert(UpgradeId::FuelCapacity, level);
            let before = state.clone();

            match purchase(&mut state, UpgradeId::FuelCapacity) {
                Ok(p) => {
                    prop_assert_eq!(p.new_level, level + 1);
                    prop_assert_eq!(state.upgrade_level(UpgradeId::FuelCapacity), level + 1);
                    prop_assert_eq!(
                        state.resource(ResourceKind::Agua),
                        agua - p.spent.amount(ResourceKind::Agua)
                    );
                }
                Err(_) => prop_assert_eq!(&state, &before),
            }
        }
    }
}
