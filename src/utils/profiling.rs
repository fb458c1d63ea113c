use std::time::Duration;

use crate::dynamics::solver::ResolutionStats;

/// Timing and population counters for the most recent fixed step.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepProfile {
    pub force_time: Duration,
    pub wall_time: Duration,
    pub broad_phase_time: Duration,
    pub narrow_phase_time: Duration,
    pub resolve_time: Duration,
    pub integrate_time: Duration,
    pub sleep_time: Duration,

    pub body_count: usize,
    pub awake_count: usize,
    pub pair_count: usize,
    pub contact_count: usize,
    pub batch_count: usize,
    /// Solver counters summed over every batch of the step.
    pub resolution: ResolutionStats,
    pub discarded_integrations: usize,
}

impl StepProfile {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn total_time(&self) -> Duration {
        self.force_time
            + self.wall_time
            + self.broad_phase_time
            + self.narrow_phase_time
            + self.resolve_time
            + self.integrate_time
            + self.sleep_time
    }

    /// Logs the profile through the `debug` level.
    pub fn report(&self) {
        let total_us = self.total_time().as_micros() as f32;
        if total_us < 1.0 {
            return;
        }
        let share = |d: Duration| d.as_micros() as f32 / total_us * 100.0;

        log::debug!(
            "step: {} bodies ({} awake), {} pairs, {} contacts in {} batches, {:.3} ms",
            self.body_count,
            self.awake_count,
            self.pair_count,
            self.contact_count,
            self.batch_count,
            total_us / 1000.0
        );
        log::debug!(
            "  broad {:.1}% narrow {:.1}% resolve {:.1}% integrate {:.1}% walls {:.1}%",
            share(self.broad_phase_time),
            share(self.narrow_phase_time),
            share(self.resolve_time),
            share(self.integrate_time),
            share(self.wall_time)
        );
        log::debug!(
            "  solver: {}+{} iterations, {} contacts skipped, {} bodies woken",
            self.resolution.position_iterations,
            self.resolution.velocity_iterations,
            self.resolution.skipped_contacts,
            self.resolution.woken_bodies
        );
        if self.discarded_integrations > 0 {
            log::debug!(
                "  {} integration steps discarded",
                self.discarded_integrations
            );
        }
    }
}
