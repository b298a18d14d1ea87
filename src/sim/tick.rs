//! Frame-driven fuel timer
//!
//! The host calls into the engine once per animation frame. The timer turns
//! those calls into elapsed wall-clock deltas, so the drain rate does not
//! depend on how often frames arrive. Only one timer run exists at a time:
//! starting a new run cancels the previous one, and a stopped timer ignores
//! frames entirely.

/// Identifies one run of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Default)]
pub struct FuelTimer {
    /// Time of the previous frame while running
    last: Option<f64>,
    generation: u64,
}

impl FuelTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run at `now`, cancelling any run in progress
    pub fn start(&mut self, now: f64) -> TimerToken {
        self.generation += 1;
        self.last = Some(now);
        TimerToken(self.generation)
    }

    pub fn stop(&mut self) {
        if self.last.take().is_some() {
            self.generation += 1;
        }
    }

    pub fn is_running(&self) -> bool {
        self.last.is_some()
    }

    /// Token of the current run, if any
    pub fn token(&self) -> Option<TimerToken> {
        self.last.map(|_| TimerToken(self.generation))
    }

    /// Seconds since the previous frame, or None when stopped.
    /// A clock that steps backwards yields a zero delta.
    pub fn frame(&mut self, now: f64) -> Option<f64> {
        let last = self.last.as_mut()?;
        let dt = (now - *last).max(0.0);
        *last = now;
        Some(dt)
    }

    /// Like [`frame`](Self::frame) but only for the run identified by `token`.
    /// Stale callbacks from a cancelled run get None.
    pub fn frame_for(&mut self, token: TimerToken, now: f64) -> Option<f64> {
        if self.token() != Some(token) {
            return None;
        }
        self.frame(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_timer_ignores_frames() {
        let mut timer = FuelTimer::new();
        assert_eq!(timer.frame(5.0), None);
        timer.start(1.0);
        assert_eq!(timer.frame(1.5), Some(0.5));
        timer.stop();
        assert!(!timer.is_running());
        assert_eq!(timer.frame(3.0), None);
    }

    #[test]
    fn test_restart_cancels_previous_run() {
        let mut timer = FuelTimer::new();
        let first = timer.start(0.0);
        let second = timer.start(10.0);
        assert_ne!(first, second);
        assert_eq!(timer.frame_for(first, 11.0), None);
        assert_eq!(timer.frame_for(second, 11.0), Some(1.0));
    }

    #[test]
    fn test_stop_invalidates_token() {
        let mut timer = FuelTimer::new();
        let token = timer.start(0.0);
        timer.stop();
        timer.stop();
        assert_eq!(timer.frame_for(token, 1.0), None);
        assert_eq!(timer.token(), None);
    }

    #[test]
    fn test_backwards_clock_is_zero_delta() {
        let mut timer = FuelTimer::new();
        timer.start(10.0);
        assert_eq!(timer.frame(9.0), Some(0.0));
        assert_eq!(timer.frame(9.5), Some(0.5));
    }
}
