//! Session runtime and phase machine types
//!
//! A session is one play-through of a planet tier. It exists only while the
//! player is on the planet (or looking at its result screen) and is never
//! persisted.

use serde::Serialize;
use thiserror::Error;

use super::events::{CompletionReport, FailureReason};
use super::problem::Problem;
use super::state::PlanetId;
use crate::consts::TRACK_FULL;

/// Ephemeral state of one play-through
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRuntime {
    pub planet: PlanetId,
    pub level: u8,
    /// Correct answers so far
    pub question_index: u32,
    pub total_questions: u32,
    /// 0..=100
    pub track_progress: f64,
    pub fuel_loss_multiplier: f64,
    pub problem: Option<Problem>,
}

impl SessionRuntime {
    pub fn new(
        planet: PlanetId,
        level: u8,
        total_questions: u32,
        fuel_loss_multiplier: f64,
    ) -> Self {
        Self {
            planet,
            level,
            question_index: 0,
            total_questions: total_questions.max(1),
            track_progress: 0.0,
            fuel_loss_multiplier,
            problem: None,
        }
    }

    /// Track advance per correct answer
    pub fn track_step(&self) -> f64 {
        TRACK_FULL / self.total_questions as f64
    }

    /// Record a correct answer. Returns true when the session is complete.
    ///
    /// Both signals are checked together: the index is authoritative and the
    /// track check may fire one step early from float accumulation.
    pub fn advance(&mut self) -> bool {
        self.question_index += 1;
        self.track_progress = (self.track_progress + self.track_step()).min(TRACK_FULL);
        if self.track_progress >= TRACK_FULL || self.question_index >= self.total_questions {
            self.question_index = self.total_questions;
            self.track_progress = TRACK_FULL;
            true
        } else {
            false
        }
    }

    /// Wrong answer; the index never moves
    pub fn regress(&mut self, penalty: f64) {
        if penalty > 0.0 {
            self.track_progress = (self.track_progress - penalty).max(0.0);
        }
    }
}

/// Engine phase
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionPhase {
    /// Menu, no session
    #[default]
    Idle,
    Active(SessionRuntime),
    Completed {
        runtime: SessionRuntime,
        report: CompletionReport,
    },
    Failed {
        runtime: SessionRuntime,
        reason: FailureReason,
    },
}

impl SessionPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            SessionPhase::Idle => PhaseKind::Idle,
            SessionPhase::Active(_) => PhaseKind::Active,
            SessionPhase::Completed { .. } => PhaseKind::Completed,
            SessionPhase::Failed { .. } => PhaseKind::Failed,
        }
    }

    pub fn runtime(&self) -> Option<&SessionRuntime> {
        match self {
            SessionPhase::Idle => None,
            SessionPhase::Active(rt) => Some(rt),
            SessionPhase::Completed { runtime, .. } | SessionPhase::Failed { runtime, .. } => {
                Some(runtime)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PhaseKind {
    Idle,
    Active,
    Completed,
    Failed,
}

/// Read-only HUD snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: PhaseKind,
    pub runtime: Option<SessionRuntime>,
    pub prompt: Option<String>,
    pub fuel_current: f64,
    pub fuel_max: f64,
    pub report: Option<CompletionReport>,
    pub failure: Option<FailureReason>,
}

/// Intent that is not valid in the current phase
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no active session")]
    NoActiveSession,
    #[error("nothing to leave, already in the menu")]
    AlreadyIdle,
    #[error("no finished session to retry")]
    NothingToRetry,
    #[error("planet {0:?} is locked")]
    PlanetLocked(PlanetId),
    #[error("tier {level} of {planet:?} is locked")]
    TierLocked { planet: PlanetId, level: u8 },
    #[error("tier {0} does not exist")]
    InvalidLevel(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_completes_on_last_answer() {
        let mut rt = SessionRuntime::new(PlanetId::Terra, 1, 8, 1.0);
        for _ in 0..7 {
            assert!(!rt.advance());
        }
        assert!(rt.advance());
        assert_eq!(rt.question_index, 8);
        assert_eq!(rt.track_progress, 100.0);
    }

    #[test]
    fn test_advance_uneven_split() {
        // 100 / 6 does not divide evenly
        let mut rt = SessionRuntime::new(PlanetId::Marte, 2, 6, 1.1);
        let mut steps = 0;
        while !rt.advance() {
            steps += 1;
            assert!(rt.track_progress < 100.0);
        }
        assert_eq!(steps + 1, 6);
        assert_eq!(rt.question_index, 6);
    }

    #[test]
    fn test_regress_floors_at_zero() {
        let mut rt = SessionRuntime::new(PlanetId::Terra, 1, 4, 1.0);
        rt.advance();
        rt.regress(5.0);
        assert_eq!(rt.track_progress, 20.0);
        rt.regress(50.0);
        assert_eq!(rt.track_progress, 0.0);
        assert_eq!(rt.question_index, 1);
        rt.regress(0.0);
        assert_eq!(rt.track_progress, 0.0);
    }
}
