use log::{log_enabled, warn, Level};
use std::time::{Duration, Instant};

/// Scoped timer for one pipeline phase.
///
/// Emits `trace!` lines on entry and exit and, when built with
/// [`ScopedTimer::recording`], adds the elapsed time to a profile slot on drop.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
    sink: Option<&'a mut Duration>,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("start {label}");
        }
        Self {
            label,
            start: Instant::now(),
            sink: None,
        }
    }

    pub fn recording(label: &'a str, sink: &'a mut Duration) -> Self {
        let mut timer = Self::new(label);
        timer.sink = Some(sink);
        timer
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        if let Some(sink) = self.sink.as_deref_mut() {
            *sink += elapsed;
        }
        if log_enabled!(Level::Trace) {
            log::trace!("end {} ({} µs)", self.label, elapsed.as_micros());
        }
    }
}

/// Warns when a host frame took longer than the budget the accumulator can absorb.
pub fn warn_if_frame_budget_exceeded(duration: Duration, budget_ms: f32) -> bool {
    let elapsed_ms = duration.as_secs_f32() * 1000.0;
    if elapsed_ms > budget_ms {
        warn!("frame delta {elapsed_ms:.2} ms exceeds budget {budget_ms:.2} ms, clamping");
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_timer_accumulates_into_sink() {
        let mut slot = Duration::ZERO;
        {
            let _timer = ScopedTimer::recording("unit", &mut slot);
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(slot >= Duration::from_millis(1));
    }

    #[test]
    fn budget_check_reports_overrun() {
        assert!(warn_if_frame_budget_exceeded(Duration::from_millis(50), 33.3));
        assert!(!warn_if_frame_budget_exceeded(Duration::from_millis(10), 33.3));
    }
}
