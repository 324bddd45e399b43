//! Pipeline activity counters for host-side diagnostics.

/// Saturating activity counters for the current run.
///
/// Cleared by `reset()` and `start()`; never part of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PipelineStats {
    /// Pipeline cycles executed (excludes the auto-start cycle).
    pub cycles: u32,
    /// Batches emitted by GEN.
    pub batches_issued: u32,
    /// Batches folded into the accumulator.
    pub batches_retired: u32,
    /// Diagonals closed, i.e. result limbs produced.
    pub diagonals_closed: u16,
    /// Cycles in which GEN had nothing to issue while work was in flight.
    pub drain_cycles: u32,
    /// Largest number of entries seen in the retirement queue.
    pub peak_queue_depth: u8,
}

impl PipelineStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one executed cycle.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_cycle(&mut self) {
        self.cycles = self.cycles.saturating_add(1);
    }

    /// Counts a batch leaving GEN.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_issue(&mut self) {
        self.batches_issued = self.batches_issued.saturating_add(1);
    }

    /// Counts a batch folded into the accumulator.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_retire(&mut self) {
        self.batches_retired = self.batches_retired.saturating_add(1);
    }

    /// Counts a closed diagonal.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_close(&mut self) {
        self.diagonals_closed = self.diagonals_closed.saturating_add(1);
    }

    /// Counts a cycle spent waiting for in-flight work.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_drain(&mut self) {
        self.drain_cycles = self.drain_cycles.saturating_add(1);
    }

    /// Tracks the retirement queue high-water mark.
    #[allow(clippy::missing_const_for_fn)]
    pub fn observe_queue_depth(&mut self, depth: u8) {
        self.peak_queue_depth = self.peak_queue_depth.max(depth);
    }

    /// Returns `true` when every issued batch has been retired.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.batches_issued == self.batches_retired
    }

    /// Resets all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::PipelineStats;

    #[test]
    fn stats_default_to_zero() {
        let stats = PipelineStats::new();
        assert_eq!(stats.cycles, 0);
        assert_eq!(stats.diagonals_closed, 0);
        assert!(stats.is_balanced());
    }

    #[test]
    fn counters_saturate() {
        let mut stats = PipelineStats {
            cycles: u32::MAX - 1,
            diagonals_closed: u16::MAX,
            ..PipelineStats::default()
        };
        stats.record_cycle();
        stats.record_cycle();
        stats.record_close();
        assert_eq!(stats.cycles, u32::MAX);
        assert_eq!(stats.diagonals_closed, u16::MAX);
    }

    #[test]
    fn issue_and_retire_balance() {
        let mut stats = PipelineStats::default();
        stats.record_issue();
        assert!(!stats.is_balanced());
        stats.record_retire();
        assert!(stats.is_balanced());
    }

    #[test]
    fn queue_depth_keeps_high_water_mark() {
        let mut stats = PipelineStats::default();
        stats.observe_queue_depth(3);
        stats.observe_queue_depth(1);
        assert_eq!(stats.peak_queue_depth, 3);

        stats.record_drain();
        stats.reset();
        assert_eq!(stats, PipelineStats::default());
    }
}
