use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ListenerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

type TimerCallback = Box<dyn FnMut(&mut Stage) + Send>;

/// Fires its callback once per elapsed interval, checked each tick.
pub struct TimeListener {
    id: ListenerId,
    interval: Duration,
    remaining: Option<u32>,
    started: Option<Instant>,
    callback: TimerCallback,
}

impl TimeListener {
    pub fn every(interval: Duration, callback: impl FnMut(&mut Stage) + Send + 'static) -> Self {
        Self {
            id: ListenerId::next(),
            interval,
            remaining: None,
            started: None,
            callback: Box::new(callback),
        }
    }

    /// Stops firing after `times` runs.
    pub fn times(mut self, times: u32) -> Self {
        self.remaining = Some(times);
        self
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// The first check arms the timer; later checks fire once the interval
    /// has elapsed since the previous firing. Returns whether it fired.
    pub fn check(&mut self, now: Instant, stage: &mut Stage) -> bool {
        if self.is_exhausted() {
            return false;
        }
        let started = *self.started.get_or_insert(now);
        if now.saturating_duration_since(started) < self.interval {
            return false;
        }
        self.started = Some(now);
        if let Some(remaining) = &mut self.remaining {
            *remaining -= 1;
        }
        (self.callback)(stage);
        true
    }
}

impl fmt::Debug for TimeListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeListener")
            .field("id", &self.id)
            .field("interval", &self.interval)
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::resources::Color;

    #[test]
    fn fires_once_per_interval() {
        let mut stage = Stage::new(10, 10, Color::BLACK);
        let mut fired = 0;
        let start = Instant::now();
        let mut listener = TimeListener::every(Duration::from_millis(100), |_| {});

        for ms in [0, 50, 100, 150, 199, 200, 450] {
            if listener.check(start + Duration::from_millis(ms), &mut stage) {
                fired += 1;
            }
        }

        // 100, 200, 450
        assert_eq!(fired, 3);
    }

    #[test]
    fn limited_listener_runs_out() {
        let mut stage = Stage::new(10, 10, Color::BLACK);
        let start = Instant::now();
        let mut listener = TimeListener::every(Duration::from_millis(10), |stage: &mut Stage| {
            stage.clear_objects();
        })
        .times(2);

        let fired = (0..10)
            .filter(|i| listener.check(start + Duration::from_millis(i * 10), &mut stage))
            .count();

        assert_eq!(fired, 2);
        assert!(listener.is_exhausted());
    }
}
