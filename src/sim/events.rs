//! Events emitted by the engine for the presentation layer
//!
//! Events describe what happened. Turning them into text or speech is the
//! host's job.

use serde::Serialize;

use super::problem::Problem;
use super::state::{PlanetId, ResourceKind, UpgradeId};
use super::upgrades::{Cost, PurchaseError};

/// Why a session ended without completing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureReason {
    OutOfFuel,
}

/// Result of completing a tier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    pub planet: PlanetId,
    pub level: u8,
    pub resource: ResourceKind,
    /// Total credited, jackpot and bonus included
    pub reward: u32,
    pub jackpot: bool,
    /// Planet unlocked by this completion, if any
    pub unlocked: Option<PlanetId>,
    /// Tiers of this planet completed so far
    pub tiers_completed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnavailableReason {
    MaxLevel,
    InsufficientResources,
}

impl From<&PurchaseError> for UnavailableReason {
    fn from(err: &PurchaseError) -> Self {
        match err {
            PurchaseError::MaxLevelReached { .. } => UnavailableReason::MaxLevel,
            PurchaseError::InsufficientResources { .. } => UnavailableReason::InsufficientResources,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    #[serde(rename_all = "camelCase")]
    QuestionPresented {
        planet: PlanetId,
        level: u8,
        /// Questions answered so far
        index: u32,
        total: u32,
        prompt: String,
        problem: Problem,
    },
    #[serde(rename_all = "camelCase")]
    AnswerAccepted {
        fuel_gained: f64,
        question_index: u32,
        track_progress: f64,
    },
    #[serde(rename_all = "camelCase")]
    AnswerRejected { track_progress: f64 },
    FuelChanged { current: f64, max: f64 },
    PlanetCompleted(CompletionReport),
    PlanetFailed {
        planet: PlanetId,
        level: u8,
        reason: FailureReason,
    },
    #[serde(rename_all = "camelCase")]
    UpgradePurchased {
        id: UpgradeId,
        new_level: u32,
        spent: Cost,
    },
    UpgradeUnavailable {
        id: UpgradeId,
        reason: UnavailableReason,
    },
}
