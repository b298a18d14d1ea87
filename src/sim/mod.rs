//! Session simulation module
//!
//! All gameplay logic lives here. No rendering, no DOM, no direct platform
//! calls: time, storage and randomness are injected.

pub mod engine;
pub mod events;
pub mod fuel;
pub mod problem;
pub mod session;
pub mod state;
pub mod tick;
pub mod upgrades;

pub use engine::{AnswerOutcome, SessionEngine};
pub use events::{CompletionReport, FailureReason, GameEvent, UnavailableReason};
pub use fuel::FuelController;
pub use problem::{Problem, generate, parse_answer};
pub use session::{PhaseKind, SessionError, SessionPhase, SessionRuntime, SessionView};
pub use state::{
    FuelSnapshot, Operation, PlanetId, ProgressState, ResourceKind, TierStatus, UpgradeId,
};
pub use tick::{FuelTimer, TimerToken};
pub use upgrades::{
    CATALOG, Cost, Purchase, PurchaseError, Tunables, UpgradeDefinition, UpgradeOffer,
};
