//! Staged GEN -> LOAD -> MUL -> ACCUMULATE multiply pipeline.
//!
//! One [`Pipeline::step`] is one simulated cycle. In the staged model every
//! stage consumes what the previous stage produced on the prior cycle; in the
//! combinational model a batch crosses all four stages in the same cycle.
//! Retirement into the accumulator may be deferred through a small delay
//! queue that stands in for a carry-save compressor tree. Latency only moves
//! work between cycles: every batch retires exactly once, so the final
//! product never depends on the configuration.

use crate::api::{ClosedDiagonal, TraceEvent, TraceSink};
use crate::arith::{mul_wide, Accumulator, Wide192};
use crate::cache::{OperandCache, ResultCache};
use crate::diag::PipelineStats;
use crate::schedule::{Batch, DiagonalCursor, MAX_BATCH_WIDTH};
use crate::timing::{PipelineConfig, StageModel};
use crate::LOG_TARGET;

/// Slots in the retirement delay queue.
pub const RETIRE_QUEUE_CAPACITY: usize = 8;

/// Operand limb pairs fetched for one batch (LOAD register).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedBatch {
    limbs: [(u64, u64); MAX_BATCH_WIDTH],
    len: u8,
    diagonal: u8,
}

impl LoadedBatch {
    /// Reads the limbs named by `batch` from the operand cache.
    #[must_use]
    pub fn fetch(batch: &Batch, operands: &OperandCache) -> Self {
        let mut limbs = [(0, 0); MAX_BATCH_WIDTH];
        for (slot, pair) in limbs.iter_mut().zip(batch.pairs()) {
            *slot = operands.pair(pair.i, pair.j);
        }
        Self {
            limbs,
            len: u8::try_from(batch.len()).unwrap_or(u8::MAX),
            diagonal: batch.diagonal(),
        }
    }

    /// Fetched `(A[i], B[j])` pairs.
    #[must_use]
    pub fn limbs(&self) -> &[(u64, u64)] {
        &self.limbs[..usize::from(self.len)]
    }

    /// Sums every pairwise 128-bit product into one 192-bit value.
    #[must_use]
    pub fn multiply(&self) -> PartialSum {
        let value = self
            .limbs()
            .iter()
            .fold(Wide192::ZERO, |sum, &(a, b)| sum.add_u128(mul_wide(a, b)));
        PartialSum {
            value,
            products: self.len,
            diagonal: self.diagonal,
        }
    }
}

/// Local sum of one batch's products (MUL register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartialSum {
    /// Sum of the batch's products.
    pub value: Wide192,
    /// Products folded into `value`.
    pub products: u8,
    /// Diagonal the batch belongs to.
    pub diagonal: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct InFlight {
    sum: PartialSum,
    remaining: u8,
}

/// Partial sums waiting out their modelled compressor-tree latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct RetireQueue {
    entries: [InFlight; RETIRE_QUEUE_CAPACITY],
    len: u8,
}

impl RetireQueue {
    const fn len(&self) -> u8 {
        self.len
    }

    const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push(&mut self, sum: PartialSum, delay: u8) {
        let slot = usize::from(self.len);
        debug_assert!(slot < RETIRE_QUEUE_CAPACITY, "retire queue overflow");
        self.entries[slot] = InFlight {
            sum,
            remaining: delay,
        };
        self.len += 1;
    }

    /// Retires every entry whose delay has elapsed and counts the rest down,
    /// preserving queue order.
    fn tick(&mut self, mut retire: impl FnMut(PartialSum)) {
        let mut kept = 0;
        for idx in 0..usize::from(self.len) {
            let mut entry = self.entries[idx];
            if entry.remaining == 0 {
                retire(entry.sum);
            } else {
                entry.remaining -= 1;
                self.entries[kept] = entry;
                kept += 1;
            }
        }
        self.len = u8::try_from(kept).unwrap_or(u8::MAX);
    }
}

/// Diagonal-by-diagonal multiply engine.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    cursor: DiagonalCursor,
    gen_stage: Option<Batch>,
    load_stage: Option<LoadedBatch>,
    mul_stage: Option<PartialSum>,
    queue: RetireQueue,
    accumulator: Accumulator,
    stats: PipelineStats,
    finished: bool,
}

impl Pipeline {
    /// Creates an empty pipeline positioned at diagonal 0.
    ///
    /// `config` is expected to have passed [`PipelineConfig::validate`].
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            cursor: DiagonalCursor::default(),
            gen_stage: None,
            load_stage: None,
            mul_stage: None,
            queue: RetireQueue::default(),
            accumulator: Accumulator::new(),
            stats: PipelineStats::new(),
            finished: false,
        }
    }

    /// Empties every register, zeroes the accumulator and rewinds to
    /// diagonal 0.
    pub fn clear(&mut self) {
        *self = Self::new(self.config);
    }

    /// Pipeline shape.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Diagonal cursor.
    #[must_use]
    pub const fn cursor(&self) -> &DiagonalCursor {
        &self.cursor
    }

    /// Running accumulator.
    #[must_use]
    pub const fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Activity counters for the current run.
    #[must_use]
    pub const fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Entries waiting in the retirement queue.
    #[must_use]
    pub const fn queued(&self) -> usize {
        self.queue.len() as usize
    }

    /// Returns `true` when no stage register or queue entry holds work.
    #[must_use]
    pub const fn is_drained(&self) -> bool {
        self.gen_stage.is_none()
            && self.load_stage.is_none()
            && self.mul_stage.is_none()
            && self.queue.is_empty()
    }

    /// Returns `true` once the final diagonal has closed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Executes one cycle.
    ///
    /// Returns the diagonal closed at the end of the cycle, if any. A
    /// finished pipeline ignores further steps.
    pub fn step(
        &mut self,
        operands: &OperandCache,
        results: &mut ResultCache,
        sink: &mut dyn TraceSink,
    ) -> Option<ClosedDiagonal> {
        if self.finished {
            return None;
        }
        self.stats.record_cycle();
        let issued_before = self.stats.batches_issued;

        match self.config.stages {
            StageModel::Staged => {
                self.accumulate(sink);
                self.mul_stage = self.load_stage.take().map(|loaded| loaded.multiply());
                self.load_stage = self
                    .gen_stage
                    .take()
                    .map(|batch| LoadedBatch::fetch(&batch, operands));
                self.gen_stage = self.generate(sink);
            }
            StageModel::Combinational => {
                self.gen_stage = self.generate(sink);
                self.load_stage = self
                    .gen_stage
                    .take()
                    .map(|batch| LoadedBatch::fetch(&batch, operands));
                self.mul_stage = self.load_stage.take().map(|loaded| loaded.multiply());
                self.accumulate(sink);
            }
        }

        if self.cursor.is_exhausted() && self.is_drained() {
            Some(self.close_diagonal(results, sink))
        } else {
            if self.stats.batches_issued == issued_before {
                self.stats.record_drain();
            }
            None
        }
    }

    fn generate(&mut self, sink: &mut dyn TraceSink) -> Option<Batch> {
        let batch = self.cursor.next_batch(self.config.batch_width)?;
        self.stats.record_issue();
        sink.on_event(TraceEvent::BatchIssued {
            diagonal: batch.diagonal(),
            products: u8::try_from(batch.len()).unwrap_or(u8::MAX),
        });
        Some(batch)
    }

    fn accumulate(&mut self, sink: &mut dyn TraceSink) {
        if let Some(sum) = self.mul_stage.take() {
            let delay = self
                .config
                .retirement
                .delay_for(usize::from(sum.products));
            self.queue.push(sum, delay);
            self.stats.observe_queue_depth(self.queue.len());
        }

        let accumulator = &mut self.accumulator;
        let stats = &mut self.stats;
        self.queue.tick(|sum| {
            accumulator.add_192(sum.value);
            stats.record_retire();
            sink.on_event(TraceEvent::BatchRetired {
                diagonal: sum.diagonal,
                products: sum.products,
            });
        });
    }

    fn close_diagonal(
        &mut self,
        results: &mut ResultCache,
        sink: &mut dyn TraceSink,
    ) -> ClosedDiagonal {
        let index = self.cursor.diagonal();
        let limb = self.accumulator.emit_limb();
        results.store(usize::from(index), limb);
        self.stats.record_close();
        sink.on_event(TraceEvent::DiagonalClosed {
            diagonal: index,
            limb,
        });
        tracing::trace!(target: LOG_TARGET, diagonal = index, limb, "diagonal closed");

        if !self.cursor.advance_diagonal() {
            debug_assert!(self.accumulator.is_zero(), "carry left past limb 127");
            self.finished = true;
        }
        ClosedDiagonal { index, limb }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{LoadedBatch, Pipeline, RETIRE_QUEUE_CAPACITY};
    use crate::api::{NullTraceSink, TraceEvent};
    use crate::cache::{OperandCache, ResultCache, OPERAND_LIMBS, RESULT_LIMBS};
    use crate::reference::schoolbook_product;
    use crate::schedule::DiagonalCursor;
    use crate::timing::{LatencyProfile, PipelineConfig, RetirementPolicy, StageModel};

    fn operands(a: [u64; OPERAND_LIMBS], b: [u64; OPERAND_LIMBS]) -> OperandCache {
        let mut cache = OperandCache::default();
        cache.load(&a, &b);
        cache
    }

    fn pseudo_random(seed: u64) -> [u64; OPERAND_LIMBS] {
        let mut state = seed;
        let mut limbs = [0; OPERAND_LIMBS];
        for limb in &mut limbs {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            *limb = state ^ (state >> 29);
        }
        limbs
    }

    fn run(config: PipelineConfig, cache: &OperandCache) -> (ResultCache, u32, Vec<TraceEvent>) {
        let mut pipeline = Pipeline::new(config);
        let mut results = ResultCache::default();
        let mut events = Vec::new();
        let mut closed = 0;
        while !pipeline.is_finished() {
            if let Some(diagonal) = pipeline.step(cache, &mut results, &mut events) {
                assert_eq!(usize::from(diagonal.index), closed);
                closed += 1;
            }
            assert!(pipeline.queued() < RETIRE_QUEUE_CAPACITY);
        }
        assert_eq!(closed, RESULT_LIMBS);
        assert!(pipeline.is_drained());
        assert!(pipeline.stats().is_balanced());
        (results, pipeline.stats().cycles, events)
    }

    #[test]
    fn multiply_sums_batch_products_without_losing_carries() {
        let cache = operands([u64::MAX; OPERAND_LIMBS], [u64::MAX; OPERAND_LIMBS]);
        let mut cursor = DiagonalCursor::at(63);
        let batch = cursor.next_batch(64).expect("full diagonal");
        let sum = LoadedBatch::fetch(&batch, &cache).multiply();
        assert_eq!(sum.products, 64);
        assert_eq!(sum.diagonal, 63);
        assert_eq!(sum.value.limbs(), [64, u64::MAX - 127, 63]);
    }

    #[rstest]
    #[case(LatencyProfile::SingleCycle)]
    #[case(LatencyProfile::Streaming)]
    #[case(LatencyProfile::Staged)]
    #[case(LatencyProfile::DelayQueue)]
    #[case(LatencyProfile::Systolic)]
    fn every_profile_matches_schoolbook(#[case] profile: LatencyProfile) {
        let a = pseudo_random(1);
        let b = pseudo_random(2);
        let (results, _, _) = run(profile.config(), &operands(a, b));
        assert_eq!(results.limbs(), &schoolbook_product(&a, &b));
    }

    #[test]
    fn single_cycle_profile_closes_one_diagonal_per_cycle() {
        let cache = operands(pseudo_random(3), pseudo_random(4));
        let (_, cycles, _) = run(LatencyProfile::SingleCycle.config(), &cache);
        assert_eq!(cycles, 128);
    }

    #[test]
    fn streaming_profile_spends_one_cycle_per_product() {
        let cache = operands(pseudo_random(5), pseudo_random(6));
        let (_, cycles, _) = run(LatencyProfile::Streaming.config(), &cache);
        assert_eq!(cycles, 64 * 64 + 1);
    }

    #[test]
    fn staged_pipeline_adds_three_cycles_of_drain_per_diagonal() {
        let config = PipelineConfig {
            batch_width: 64,
            stages: StageModel::Staged,
            retirement: RetirementPolicy::Immediate,
        };
        let cache = operands(pseudo_random(7), pseudo_random(8));
        let (_, cycles, _) = run(config, &cache);
        assert_eq!(cycles, 127 * 4 + 1);
    }

    #[test]
    fn csa_delay_holds_wide_batches_longer() {
        let staged = LatencyProfile::Staged.config();
        let delayed = LatencyProfile::DelayQueue.config();
        let cache = operands(pseudo_random(9), pseudo_random(10));

        let (fast, fast_cycles, _) = run(staged, &cache);
        let (slow, slow_cycles, _) = run(delayed, &cache);
        assert_eq!(fast, slow);
        assert!(slow_cycles > fast_cycles);
    }

    #[test]
    fn trace_reports_issue_retire_close_in_cycle_order() {
        let cache = operands(pseudo_random(11), pseudo_random(12));
        let (results, _, events) = run(LatencyProfile::Staged.config(), &cache);

        let first_close = events
            .iter()
            .position(|event| matches!(event, TraceEvent::DiagonalClosed { .. }))
            .expect("diagonal 0 closes");
        assert_eq!(
            &events[..first_close],
            &[
                TraceEvent::BatchIssued {
                    diagonal: 0,
                    products: 1
                },
                TraceEvent::BatchRetired {
                    diagonal: 0,
                    products: 1
                },
            ]
        );
        assert_eq!(
            events[first_close],
            TraceEvent::DiagonalClosed {
                diagonal: 0,
                limb: results.limb(0)
            }
        );

        let closes = events
            .iter()
            .filter(|event| matches!(event, TraceEvent::DiagonalClosed { .. }))
            .count();
        assert_eq!(closes, RESULT_LIMBS);
    }

    #[test]
    fn finished_pipeline_ignores_steps_until_cleared() {
        let cache = operands(pseudo_random(13), pseudo_random(14));
        let mut pipeline = Pipeline::new(LatencyProfile::SingleCycle.config());
        let mut results = ResultCache::default();
        while !pipeline.is_finished() {
            let _ = pipeline.step(&cache, &mut results, &mut NullTraceSink);
        }
        let cycles = pipeline.stats().cycles;

        assert_eq!(pipeline.step(&cache, &mut results, &mut NullTraceSink), None);
        assert_eq!(pipeline.stats().cycles, cycles);

        pipeline.clear();
        assert!(!pipeline.is_finished());
        assert_eq!(pipeline.cursor().diagonal(), 0);
        assert!(pipeline.accumulator().is_zero());
        assert_eq!(pipeline.stats().cycles, 0);
    }
}
