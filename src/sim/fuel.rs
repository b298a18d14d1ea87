//! Fuel tank
//!
//! Fuel drains continuously during a session and is topped up by correct
//! answers. `current` stays within `[0, max]` after every operation.

use super::state::FuelSnapshot;
use super::upgrades::Tunables;

#[derive(Debug, Clone, PartialEq)]
pub struct FuelController {
    current: f64,
    max: f64,
    loss_per_sec: f64,
    tier_multiplier: f64,
    gain_per_correct: f64,
    empty_threshold: f64,
}

impl FuelController {
    pub fn new(tunables: &Tunables, empty_threshold: f64) -> Self {
        Self {
            current: tunables.max_fuel,
            max: tunables.max_fuel,
            loss_per_sec: tunables.fuel_loss_per_second,
            tier_multiplier: 1.0,
            gain_per_correct: tunables.fuel_gain_on_correct,
            empty_threshold,
        }
    }

    /// Resume from a persisted snapshot, then move to the current capacity
    /// the same way an upgrade would: a full tank grows with it.
    pub fn from_snapshot(
        snapshot: FuelSnapshot,
        tunables: &Tunables,
        empty_threshold: f64,
    ) -> Self {
        let mut fuel = Self::new(tunables, empty_threshold);
        if snapshot.max_fuel.is_finite() && snapshot.max_fuel > 0.0 {
            fuel.max = snapshot.max_fuel;
        }
        fuel.current = if snapshot.current_fuel.is_finite() {
            snapshot.current_fuel.clamp(0.0, fuel.max)
        } else {
            fuel.max
        };
        fuel.on_capacity_change(tunables.max_fuel);
        fuel
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Fill level in `[0, 1]`
    pub fn ratio(&self) -> f64 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// At or below the empty threshold
    pub fn is_empty(&self) -> bool {
        self.current <= self.empty_threshold
    }

    pub fn loss_per_sec(&self) -> f64 {
        self.loss_per_sec * self.tier_multiplier
    }

    pub fn set_tier_multiplier(&mut self, multiplier: f64) {
        self.tier_multiplier = multiplier.max(0.0);
    }

    /// Pick up new loss/gain rates and capacity after an upgrade
    pub fn apply_tunables(&mut self, tunables: &Tunables) {
        self.loss_per_sec = tunables.fuel_loss_per_second.max(0.0);
        self.gain_per_correct = tunables.fuel_gain_on_correct;
        if tunables.max_fuel != self.max {
            self.on_capacity_change(tunables.max_fuel);
        }
    }

    /// Drain by elapsed wall-clock seconds. Returns true once the tank is empty;
    /// an empty tank is snapped to exactly zero.
    pub fn tick(&mut self, dt: f64) -> bool {
        if dt > 0.0 && dt.is_finite() {
            self.current = (self.current - self.loss_per_sec() * dt).max(0.0);
        }
        if self.is_empty() {
            self.current = 0.0;
            true
        } else {
            false
        }
    }

    /// Returns the fuel actually added
    pub fn apply_correct_answer(&mut self) -> f64 {
        let before = self.current;
        self.current = crate::clamp(self.current + self.gain_per_correct, 0.0, self.max);
        self.current - before
    }

    pub fn refill_to_max(&mut self) {
        self.current = self.max;
    }

    /// A full tank stays full at the new capacity; a partial tank keeps its
    /// level unless it no longer fits.
    pub fn on_capacity_change(&mut self, new_max: f64) {
        let was_full = self.is_full();
        self.max = new_max.max(0.0);
        if was_full || self.current > self.max {
            self.current = self.max;
        }
    }

    pub fn snapshot(&self) -> FuelSnapshot {
        FuelSnapshot {
            max_fuel: self.max,
            current_fuel: self.current,
        }
    }
}
