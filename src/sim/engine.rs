//! Session engine
//!
//! Owns the progress state, the fuel tank and the current session. The host
//! sends intents in, calls [`SessionEngine::on_frame`] from its frame loop
//! while [`SessionEngine::wants_frames`] is true, and drains events out.
//!
//! Everything runs on the caller's thread. Progress is written through to
//! storage after every mutation that must survive a reload.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::events::{CompletionReport, FailureReason, GameEvent, UnavailableReason};
use super::fuel::FuelController;
use super::problem::{self, Problem};
use super::session::{SessionError, SessionPhase, SessionRuntime, SessionView};
use super::state::{PlanetId, ProgressState, TierStatus, UpgradeId};
use super::tick::{FuelTimer, TimerToken};
use super::upgrades::{self, Purchase, PurchaseError, Tunables, UpgradeOffer};
use crate::consts::*;
use crate::persistence::PersistentStore;
use crate::platform::{Clock, Storage};
use crate::tuning::{Tuning, UnlockRule};

/// What a submitted answer did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Not a number; nothing changed
    Ignored,
    Correct,
    Incorrect,
    /// Correct and it finished the tier
    Completed,
}

pub struct SessionEngine<S: Storage, C: Clock> {
    progress: ProgressState,
    tuning: Tuning,
    tunables: Tunables,
    fuel: FuelController,
    phase: SessionPhase,
    timer: FuelTimer,
    store: PersistentStore<S>,
    clock: C,
    rng: Pcg32,
    events: Vec<GameEvent>,
}

impl<S: Storage, C: Clock> SessionEngine<S, C> {
    /// Load progress from the store and rebuild derived state
    pub fn new(store: PersistentStore<S>, clock: C, tuning: Tuning, seed: u64) -> Self {
        let progress = store.load();
        let tunables = upgrades::apply_all(&progress, &tuning);
        let fuel =
            FuelController::from_snapshot(progress.fuel, &tunables, tuning.fuel_empty_threshold);
        log::info!(
            "Engine ready: fuel {:.0}/{:.0}, {} upgrades owned",
            fuel.current(),
            fuel.max(),
            progress.upgrades.values().sum::<u32>()
        );

        let mut engine = Self {
            progress,
            tuning,
            tunables,
            fuel,
            phase: SessionPhase::Idle,
            timer: FuelTimer::new(),
            store,
            clock,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
        };
        engine.sync_fuel();
        engine
    }

    // === Views ===

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn fuel(&self) -> &FuelController {
        &self.fuel
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn current_problem(&self) -> Option<&Problem> {
        match &self.phase {
            SessionPhase::Active(rt) => rt.problem.as_ref(),
            _ => None,
        }
    }

    pub fn session_view(&self) -> SessionView {
        let (report, failure) = match &self.phase {
            SessionPhase::Completed { report, .. } => (Some(report.clone()), None),
            SessionPhase::Failed { reason, .. } => (None, Some(*reason)),
            _ => (None, None),
        };
        SessionView {
            phase: self.phase.kind(),
            runtime: self.phase.runtime().cloned(),
            prompt: self.current_problem().map(Problem::prompt),
            fuel_current: self.fuel.current(),
            fuel_max: self.fuel.max(),
            report,
            failure,
        }
    }

    pub fn shop(&self) -> Vec<UpgradeOffer> {
        upgrades::offers(&self.progress)
    }

    pub fn level_track(&self, planet: PlanetId) -> [TierStatus; LEVEL_COUNT] {
        self.progress.tier_status(planet)
    }

    /// True while a fuel timer run is active; the host keeps scheduling frames
    pub fn wants_frames(&self) -> bool {
        self.timer.is_running()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Intents ===

    pub fn start_planet(&mut self, planet: PlanetId, level: u8) -> Result<(), SessionError> {
        if !(1..=LEVEL_COUNT as u8).contains(&level) {
            return Err(SessionError::InvalidLevel(level));
        }
        if !self.progress.is_unlocked(planet) {
            return Err(SessionError::PlanetLocked(planet));
        }
        if !self.progress.tier_available(planet, level) {
            return Err(SessionError::TierLocked { planet, level });
        }

        // Cancel any run still in flight before the new one starts
        self.timer.stop();

        let reduction = self.tunables.question_reduction;
        let total = self.tuning.total_questions(reduction);
        let multiplier = self.tuning.level(level).fuel_loss_mul;
        let mut runtime = SessionRuntime::new(planet, level, total, multiplier);

        self.fuel.set_tier_multiplier(multiplier);
        self.fuel.refill_to_max();
        self.sync_fuel();

        self.timer.start(self.clock.now_secs());
        log::info!(
            "Starting {} tier {} ({} questions, drain x{})",
            planet.as_str(),
            level,
            total,
            multiplier
        );

        self.present_question(&mut runtime);
        self.phase = SessionPhase::Active(runtime);
        Ok(())
    }

    pub fn submit_answer(&mut self, raw: &str) -> Result<AnswerOutcome, SessionError> {
        let SessionPhase::Active(runtime) = &mut self.phase else {
            return Err(SessionError::NoActiveSession);
        };
        let Some(value) = problem::parse_answer(raw) else {
            return Ok(AnswerOutcome::Ignored);
        };
        let Some(problem) = runtime.problem.as_ref() else {
            return Err(SessionError::NoActiveSession);
        };

        if !problem.is_correct(value) {
            runtime.regress(self.tuning.wrong_answer_track_penalty);
            self.events.push(GameEvent::AnswerRejected {
                track_progress: runtime.track_progress,
            });
            return Ok(AnswerOutcome::Incorrect);
        }

        let fuel_gained = self.fuel.apply_correct_answer();
        let done = runtime.advance();
        self.events.push(GameEvent::AnswerAccepted {
            fuel_gained,
            question_index: runtime.question_index,
            track_progress: runtime.track_progress,
        });

        if done {
            self.complete();
            return Ok(AnswerOutcome::Completed);
        }

        let mut runtime = runtime.clone();
        self.present_question(&mut runtime);
        self.phase = SessionPhase::Active(runtime);
        self.sync_fuel();
        Ok(AnswerOutcome::Correct)
    }

    pub fn purchase_upgrade(&mut self, id: UpgradeId) -> Result<Purchase, PurchaseError> {
        match upgrades::purchase(&mut self.progress, id) {
            Ok(receipt) => {
                self.refresh_tunables();
                log::info!("Purchased {} level {}", id.as_str(), receipt.new_level);
                self.events.push(GameEvent::UpgradePurchased {
                    id,
                    new_level: receipt.new_level,
                    spent: receipt.spent.clone(),
                });
                self.sync_fuel();
                Ok(receipt)
            }
            Err(err) => {
                log::debug!("Purchase refused: {}", err);
                self.events.push(GameEvent::UpgradeUnavailable {
                    id,
                    reason: UnavailableReason::from(&err),
                });
                Err(err)
            }
        }
    }

    /// Abandon the session and return to the menu
    pub fn give_up(&mut self) -> Result<(), SessionError> {
        self.exit_to_menu()
    }

    pub fn exit_to_menu(&mut self) -> Result<(), SessionError> {
        if matches!(self.phase, SessionPhase::Idle) {
            return Err(SessionError::AlreadyIdle);
        }
        self.timer.stop();
        self.fuel.refill_to_max();
        self.phase = SessionPhase::Idle;
        self.sync_fuel();
        Ok(())
    }

    /// Replay the planet and tier of a finished session
    pub fn retry(&mut self) -> Result<(), SessionError> {
        let (planet, level) = match &self.phase {
            SessionPhase::Completed { runtime, .. } | SessionPhase::Failed { runtime, .. } => {
                (runtime.planet, runtime.level)
            }
            _ => return Err(SessionError::NothingToRetry),
        };
        self.start_planet(planet, level)
    }

    // === Fuel process ===

    /// Frame callback: drain by the wall-clock time since the previous frame
    pub fn on_frame(&mut self) {
        let now = self.clock.now_secs();
        if let Some(dt) = self.timer.frame(now) {
            self.advance(dt);
        }
    }

    /// Token of the running fuel timer; hosts tag scheduled callbacks with it
    pub fn frame_token(&self) -> Option<TimerToken> {
        self.timer.token()
    }

    /// Frame callback scheduled for a specific run. Callbacks from a
    /// cancelled run drain nothing.
    pub fn on_frame_for(&mut self, token: TimerToken) {
        let now = self.clock.now_secs();
        if let Some(dt) = self.timer.frame_for(token, now) {
            self.advance(dt);
        }
    }

    /// Drain by a fixed delta (tests and fixed-step hosts)
    pub fn advance(&mut self, dt: f64) {
        if !matches!(self.phase, SessionPhase::Active(_)) {
            return;
        }
        let before = self.fuel.current();
        let empty = self.fuel.tick(dt);
        log::trace!("Fuel tick dt={:.4} fuel={:.2}", dt, self.fuel.current());
        if self.fuel.current() != before {
            self.sync_fuel();
        }
        if empty {
            self.fail(FailureReason::OutOfFuel);
        }
    }

    // === Internals ===

    fn present_question(&mut self, runtime: &mut SessionRuntime) {
        let cfg = self.tuning.level(runtime.level);
        let problem = problem::generate(runtime.planet.operation(), cfg, &mut self.rng);
        self.events.push(GameEvent::QuestionPresented {
            planet: runtime.planet,
            level: runtime.level,
            index: runtime.question_index,
            total: runtime.total_questions,
            prompt: problem.prompt(),
            problem: problem.clone(),
        });
        runtime.problem = Some(problem);
    }

    fn complete(&mut self) {
        self.timer.stop();
        let SessionPhase::Active(mut runtime) = std::mem::take(&mut self.phase) else {
            return;
        };
        runtime.problem = None;
        let planet = runtime.planet;
        let level = runtime.level;

        self.progress.mark_tier_complete(planet, level);
        let tiers_completed = self.progress.completed_tiers(planet);
        let earns_unlock = match self.tuning.unlock_rule {
            UnlockRule::AnyTier => true,
            UnlockRule::AllTiers => tiers_completed >= LEVEL_COUNT,
        };
        let unlocked = match planet.next() {
            Some(next) if earns_unlock && self.progress.unlock(next) => Some(next),
            _ => None,
        };

        let (reward, jackpot) = self.roll_reward(level);
        let resource = planet.resource();
        self.progress.credit(resource, reward);

        let report = CompletionReport {
            planet,
            level,
            resource,
            reward,
            jackpot,
            unlocked,
            tiers_completed,
        };
        log::info!(
            "Completed {} tier {}: +{} {}{}",
            planet.as_str(),
            level,
            reward,
            resource.as_str(),
            if jackpot { " (jackpot)" } else { "" }
        );
        if let Some(next) = unlocked {
            log::info!("Unlocked {}", next.as_str());
        }

        self.events.push(GameEvent::PlanetCompleted(report.clone()));
        self.phase = SessionPhase::Completed { runtime, report };
        self.sync_fuel();
    }

    fn roll_reward(&mut self, level: u8) -> (u32, bool) {
        let base = self.rng.random_range(REWARD_MIN..=REWARD_MAX) as f64;
        let scaled = (base * (1.0 + (level as f64 - 1.0) * REWARD_TIER_STEP)).round() as u32;
        let mut reward = scaled + self.tunables.resource_bonus;
        let jackpot = self.rng.random::<f64>() < self.tunables.jackpot_chance;
        if jackpot {
            reward *= 2;
        }
        (reward, jackpot)
    }

    fn fail(&mut self, reason: FailureReason) {
        self.timer.stop();
        let SessionPhase::Active(mut runtime) = std::mem::take(&mut self.phase) else {
            return;
        };
        runtime.problem = None;
        log::info!(
            "Failed {} tier {}: {:?}",
            runtime.planet.as_str(),
            runtime.level,
            reason
        );
        self.events.push(GameEvent::PlanetFailed {
            planet: runtime.planet,
            level: runtime.level,
            reason,
        });
        self.phase = SessionPhase::Failed { runtime, reason };
        self.sync_fuel();
    }

    fn refresh_tunables(&mut self) {
        self.tunables = upgrades::apply_all(&self.progress, &self.tuning);
        self.fuel.apply_tunables(&self.tunables);
    }

    /// Mirror fuel into the progress state, emit the change and write through
    fn sync_fuel(&mut self) {
        let snapshot = self.fuel.snapshot();
        if snapshot != self.progress.fuel {
            self.events.push(GameEvent::FuelChanged {
                current: snapshot.current_fuel,
                max: snapshot.max_fuel,
            });
            self.progress.fuel = snapshot;
        }
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.progress) {
            log::warn!("Could not save progress: {}", e);
        }
    }
}
