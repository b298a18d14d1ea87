//! Explorador - An arithmetic space exploration mini-game
//!
//! Core modules:
//! - `sim`: Session engine (problems, fuel, upgrades, progress state)
//! - `platform`: Browser/native platform abstraction (clock, storage)
//! - `persistence`: Save/load of the progress blob with migration
//! - `tuning`: Data-driven game balance

pub mod persistence;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use persistence::PersistentStore;
pub use sim::{GameEvent, SessionEngine};
pub use tuning::{Tuning, UnlockRule};

/// Game configuration constants
pub mod consts {
    /// LocalStorage key holding the serialized progress blob
    pub const STORAGE_KEY: &str = "exploradorMath";

    /// Number of difficulty tiers per planet
    pub const LEVEL_COUNT: usize = 3;

    /// Fuel tank size before upgrades
    pub const BASE_MAX_FUEL: f64 = 100.0;
    /// Fuel lost per second before upgrades and tier multipliers
    pub const BASE_FUEL_LOSS_PER_SEC: f64 = 5.0;
    /// Fuel gained per correct answer before upgrades
    pub const BASE_FUEL_GAIN: f64 = 15.0;
    /// Fuel at or below this is treated as empty
    pub const FUEL_EMPTY_THRESHOLD: f64 = 0.5;
    /// Tank fill ratio under which hosts warn the player
    pub const LOW_FUEL_RATIO: f64 = 0.2;

    /// Questions per planet before astro navigation reduction
    pub const BASE_QUESTION_COUNT: u32 = 8;
    /// Lower bound for questions per session
    pub const MIN_QUESTION_COUNT: u32 = 4;

    /// Track progress at which a session is complete
    pub const TRACK_FULL: f64 = 100.0;

    /// Reward range before tier scaling (inclusive)
    pub const REWARD_MIN: u32 = 3;
    pub const REWARD_MAX: u32 = 6;
    /// Reward growth per tier above the first
    pub const REWARD_TIER_STEP: f64 = 0.4;
}

/// Clamp a value into `[min, max]` without panicking on inverted bounds
#[inline]
pub fn clamp(v: f64, min: f64, max: f64) -> f64 {
    v.min(max).max(min)
}
