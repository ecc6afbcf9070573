use crate::scheduler::TickHandle;
use std::time::Duration;

/// Quadratic ease-in: `start + change * (t / duration)²`.
pub fn ease_in_quad(elapsed: Duration, start: f64, change: f64, duration: Duration) -> f64 {
    if duration.is_zero() {
        return start + change;
    }
    let t = elapsed.as_secs_f64() / duration.as_secs_f64();
    change * t * t + start
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    /// The final frame is being drawn.
    Completing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Intermediate values to draw, animation continues.
    Frame(Vec<f64>),
    Finished,
}

#[derive(Debug, Default)]
pub struct Animation {
    phase: Phase,
    elapsed: Duration,
    duration: Duration,
    from: Vec<f64>,
    target: Vec<f64>,
    pending: Option<TickHandle>,
}

impl Animation {
    /// Restarts from zero towards `target`. Any pending tick must have been
    /// cancelled by the caller.
    pub fn start(&mut self, target: &[f64], duration: Duration) {
        self.phase = Phase::Running;
        self.elapsed = Duration::ZERO;
        self.duration = duration;
        self.from = vec![0.0; target.len()];
        self.target = target.to_vec();
        self.pending = None;
    }

    /// Adds `delta` to the elapsed time, clamped to the duration.
    pub fn advance(&mut self, delta: Duration) -> Step {
        self.elapsed = (self.elapsed + delta).min(self.duration);
        if self.elapsed >= self.duration {
            self.phase = Phase::Completing;
            Step::Finished
        } else {
            Step::Frame(self.values_at(self.elapsed))
        }
    }

    pub fn values_at(&self, elapsed: Duration) -> Vec<f64> {
        let elapsed = elapsed.min(self.duration);
        self.from
            .iter()
            .zip(&self.target)
            .map(|(&from, &to)| ease_in_quad(elapsed, from, to - from, self.duration))
            .collect()
    }

    pub fn finish(&mut self) {
        self.phase = Phase::Idle;
        self.pending = None;
    }

    pub fn set_pending(&mut self, handle: TickHandle) {
        self.pending = Some(handle);
    }

    pub fn take_pending(&mut self) -> Option<TickHandle> {
        self.pending.take()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
