//! Unit controller: owns the caches, completion flags and pipeline, and
//! exposes the cycle-stepped operations the host simulator drives.

use crate::api::{
    NullTraceSink, RunOutcome, SnapshotVersion, StepOutcome, TraceEvent, TraceSink, UnitConfig,
    UnitSnapshot,
};
use crate::cache::{OperandCache, OperandLimbs, ResultCache, ResultLimbs};
use crate::diag::PipelineStats;
use crate::error::{Operand, SnapshotLayoutError, UnitError};
use crate::memory::LimbBus;
use crate::pipeline::Pipeline;
use crate::state::{Progress, TransferBookkeeping, UnitFlags};
use crate::{LOG_TARGET, OPERAND_LIMBS, RESULT_LIMBS};

/// The 4096x4096-bit multiply unit attached to the host simulator.
///
/// Single-threaded and non-reentrant: one driving loop owns the unit and
/// calls [`BigmulUnit::advance`] once per simulated cycle.
#[derive(Debug, Clone)]
pub struct BigmulUnit {
    config: UnitConfig,
    operands: OperandCache,
    results: ResultCache,
    flags: UnitFlags,
    progress: Progress,
    transfer: TransferBookkeeping,
    pipeline: Pipeline,
}

impl Default for BigmulUnit {
    fn default() -> Self {
        Self::from_validated(UnitConfig::default())
    }
}

impl BigmulUnit {
    /// Creates an idle unit with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an idle unit after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::InvalidBatchWidth`] or
    /// [`UnitError::InvalidCsaDepthCap`] for an unusable pipeline shape.
    pub fn with_config(config: UnitConfig) -> Result<Self, UnitError> {
        config.pipeline.validate()?;
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: UnitConfig) -> Self {
        Self {
            config,
            operands: OperandCache::default(),
            results: ResultCache::default(),
            flags: UnitFlags::IDLE,
            progress: Progress::NotStarted,
            transfer: TransferBookkeeping::default(),
            pipeline: Pipeline::new(config.pipeline),
        }
    }

    /// Configuration the unit was built with.
    #[must_use]
    pub const fn config(&self) -> &UnitConfig {
        &self.config
    }

    /// Returns the unit to idle, discarding caches and any in-flight run.
    pub fn reset(&mut self) {
        self.operands.clear();
        self.results.clear();
        self.flags = UnitFlags::IDLE;
        self.progress = Progress::NotStarted;
        self.transfer = TransferBookkeeping::default();
        self.pipeline.clear();
        tracing::debug!(target: LOG_TARGET, "unit reset");
    }

    /// Starts a run on the staged operands from diagonal 0.
    ///
    /// `write-done` stays set until the run completes.
    pub fn start(&mut self) {
        self.start_with(&mut NullTraceSink);
    }

    fn start_with(&mut self, sink: &mut dyn TraceSink) {
        self.pipeline.clear();
        self.results.clear();
        self.flags.multiply_done = false;
        self.flags.write_done = true;
        self.progress = Progress::Running;
        sink.on_event(TraceEvent::RunStarted);
        tracing::debug!(
            target: LOG_TARGET,
            batch_width = self.config.pipeline.batch_width,
            stages = ?self.config.pipeline.stages,
            retirement = ?self.config.pipeline.retirement,
            "multiply run started"
        );
    }

    /// Issues the big-multiply instruction with its result buffer address.
    ///
    /// The run itself starts on the next [`BigmulUnit::advance`].
    pub fn issue(&mut self, result_base: u64) {
        self.transfer.base_addr_res = result_base;
        self.transfer.write_offset = 0;
        self.pipeline.clear();
        self.flags.multiply_done = false;
        self.flags.write_done = true;
        self.progress = Progress::NotStarted;
    }

    /// Executes one simulated cycle.
    pub fn advance(&mut self) -> StepOutcome {
        self.advance_with_trace(&mut NullTraceSink)
    }

    /// Executes one simulated cycle, reporting trace events to `sink` when
    /// tracing is enabled in the configuration.
    pub fn advance_with_trace(&mut self, sink: &mut dyn TraceSink) -> StepOutcome {
        let mut muted = NullTraceSink;
        let sink: &mut dyn TraceSink = if self.config.tracing_enabled {
            sink
        } else {
            &mut muted
        };

        if self.flags.multiply_done {
            return StepOutcome::Idle;
        }
        if !self.progress.is_running() {
            self.start_with(sink);
            return StepOutcome::Started;
        }

        let closed = self.pipeline.step(&self.operands, &mut self.results, sink);
        if !self.pipeline.is_finished() {
            return StepOutcome::Cycle { closed };
        }

        let cycles = self.pipeline.stats().cycles;
        self.flags.multiply_done = true;
        self.flags.write_done = false;
        self.progress = Progress::NotStarted;
        self.transfer.write_offset = 0;
        sink.on_event(TraceEvent::MultiplyCompleted { cycles });
        tracing::debug!(target: LOG_TARGET, cycles, "multiply run completed");
        StepOutcome::Completed { cycles }
    }

    /// Advances until the multiply phase is done.
    ///
    /// Returns immediately with zero advances on an idle unit.
    pub fn run_to_completion(&mut self) -> RunOutcome {
        let mut advances = 0u32;
        while !self.flags.multiply_done {
            let _ = self.advance();
            advances = advances.saturating_add(1);
        }
        RunOutcome {
            advances,
            stats: *self.pipeline.stats(),
        }
    }

    /// `multiply-done` flag.
    #[must_use]
    pub const fn is_multiply_done(&self) -> bool {
        self.flags.multiply_done
    }

    /// `load-done` flag.
    #[must_use]
    pub const fn is_load_done(&self) -> bool {
        self.flags.load_done
    }

    /// `write-done` flag.
    #[must_use]
    pub const fn is_write_done(&self) -> bool {
        self.flags.write_done
    }

    /// All completion flags.
    #[must_use]
    pub const fn flags(&self) -> UnitFlags {
        self.flags
    }

    /// Resumption marker.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Transfer addresses and offsets.
    #[must_use]
    pub const fn transfer(&self) -> &TransferBookkeeping {
        &self.transfer
    }

    /// Operand cache.
    #[must_use]
    pub const fn operands(&self) -> &OperandCache {
        &self.operands
    }

    /// Result cache, including limbs of a run still in progress.
    #[must_use]
    pub const fn results(&self) -> &ResultCache {
        &self.results
    }

    /// The last completed product, or `None` while a run is pending.
    #[must_use]
    pub const fn finished_result(&self) -> Option<&ResultLimbs> {
        if self.flags.multiply_done {
            Some(self.results.limbs())
        } else {
            None
        }
    }

    /// Counters for the current or most recent run.
    #[must_use]
    pub const fn stats(&self) -> &PipelineStats {
        self.pipeline.stats()
    }

    /// Stages both operands directly and marks the load phase done.
    ///
    /// Ignored while a multiply is running.
    pub fn load_operands(&mut self, a: &OperandLimbs, b: &OperandLimbs) {
        if self.operands_locked("load_operands") {
            return;
        }
        self.operands.load(a, b);
        self.finish_load();
    }

    /// Stages both operands from 512-byte little-endian images.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::OperandLength`] when either image has the wrong
    /// size; the unit is left unchanged. Ignored while a multiply is running.
    pub fn load_operand_bytes(&mut self, a: &[u8], b: &[u8]) -> Result<(), UnitError> {
        if self.operands_locked("load_operand_bytes") {
            return Ok(());
        }
        self.operands.load_bytes(a, b)?;
        self.finish_load();
        Ok(())
    }

    fn finish_load(&mut self) {
        self.transfer.load_offset = OPERAND_LIMBS;
        self.flags.load_done = true;
    }

    fn operands_locked(&self, operation: &'static str) -> bool {
        let locked = self.progress.is_running();
        if locked {
            tracing::warn!(
                target: LOG_TARGET,
                operation,
                "operand cache is locked by a running multiply"
            );
        }
        locked
    }

    /// Begins a multi-cycle operand load from simulated memory.
    ///
    /// Ignored while a multiply is running.
    pub fn begin_load(&mut self, base_a: u64, base_b: u64) {
        if self.operands_locked("begin_load") {
            return;
        }
        self.transfer.base_addr_a = base_a;
        self.transfer.base_addr_b = base_b;
        self.transfer.load_offset = 0;
        self.flags.load_done = false;
    }

    /// Copies the next limb of each operand from `bus`.
    ///
    /// Returns the `load-done` flag after the cycle. No limb moves while a
    /// multiply is running.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Bus`] when either read fails; the offset does
    /// not move, so the cycle can be retried.
    pub fn load_cycle(&mut self, bus: &mut dyn LimbBus) -> Result<bool, UnitError> {
        self.load_cycle_with_trace(bus, &mut NullTraceSink)
    }

    /// [`BigmulUnit::load_cycle`] with trace hooks.
    ///
    /// # Errors
    ///
    /// Same as [`BigmulUnit::load_cycle`].
    pub fn load_cycle_with_trace(
        &mut self,
        bus: &mut dyn LimbBus,
        sink: &mut dyn TraceSink,
    ) -> Result<bool, UnitError> {
        if self.flags.load_done || self.operands_locked("load_cycle") {
            return Ok(self.flags.load_done);
        }
        let index = self.transfer.load_offset;
        let a = bus.read_u64(self.transfer.a_limb_addr(index))?;
        let b = bus.read_u64(self.transfer.b_limb_addr(index))?;
        self.operands.set_limb(index, a, b);
        if self.config.tracing_enabled {
            sink.on_event(TraceEvent::LimbLoaded {
                index: u8::try_from(index).unwrap_or(u8::MAX),
            });
        }

        self.transfer.load_offset += 1;
        if self.transfer.load_offset == OPERAND_LIMBS {
            self.flags.load_done = true;
        }
        Ok(self.flags.load_done)
    }

    /// Writes the next result limb to `bus`.
    ///
    /// Returns the `write-done` flag after the cycle.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Bus`] when the write fails; the offset does not
    /// move, so the cycle can be retried.
    pub fn write_back_cycle(&mut self, bus: &mut dyn LimbBus) -> Result<bool, UnitError> {
        self.write_back_cycle_with_trace(bus, &mut NullTraceSink)
    }

    /// [`BigmulUnit::write_back_cycle`] with trace hooks.
    ///
    /// # Errors
    ///
    /// Same as [`BigmulUnit::write_back_cycle`].
    pub fn write_back_cycle_with_trace(
        &mut self,
        bus: &mut dyn LimbBus,
        sink: &mut dyn TraceSink,
    ) -> Result<bool, UnitError> {
        if self.flags.write_done || !self.flags.multiply_done {
            return Ok(self.flags.write_done);
        }
        let index = self.transfer.write_offset;
        let addr = self.transfer.result_limb_addr(index);
        bus.write_u64(addr, self.results.limb(index))?;
        if self.config.tracing_enabled {
            sink.on_event(TraceEvent::LimbWritten {
                index: u8::try_from(index).unwrap_or(u8::MAX),
                addr,
            });
        }

        self.transfer.write_offset += 1;
        if self.transfer.write_offset == RESULT_LIMBS {
            self.flags.write_done = true;
        }
        Ok(self.flags.write_done)
    }

    /// Marks the result as drained by the host itself.
    ///
    /// Ignored while a run is pending.
    pub fn mark_written(&mut self) {
        if self.flags.multiply_done {
            self.transfer.write_offset = RESULT_LIMBS;
            self.flags.write_done = true;
        }
    }

    /// Captures caches, flags, progress marker and transfer bookkeeping.
    #[must_use]
    pub fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            version: SnapshotVersion::V1,
            operand_a: self.operands.a().to_vec().into_boxed_slice(),
            operand_b: self.operands.b().to_vec().into_boxed_slice(),
            result: self.results.limbs().to_vec().into_boxed_slice(),
            flags: self.flags,
            progress: self.progress,
            transfer: self.transfer,
        }
    }

    /// Replaces the unit's architectural state with `snapshot`.
    ///
    /// The pipeline is emptied. A snapshot taken mid-run comes back as an
    /// issued run that has not started, so the next [`BigmulUnit::advance`]
    /// restarts it from diagonal 0 on the restored operands.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::SnapshotLayout`] for malformed cache images or
    /// transfer offsets; the unit is left unchanged.
    pub fn restore(&mut self, snapshot: &UnitSnapshot) -> Result<(), UnitError> {
        snapshot.validate()?;
        let a = operand_image(Operand::A, &snapshot.operand_a)?;
        let b = operand_image(Operand::B, &snapshot.operand_b)?;
        let result = result_image(&snapshot.result)?;

        self.operands.load(a, b);
        self.results.overwrite(result);
        self.flags = snapshot.flags;
        self.progress = snapshot.progress.resumed();
        self.transfer = snapshot.transfer;
        self.pipeline.clear();
        tracing::debug!(
            target: LOG_TARGET,
            multiply_done = self.flags.multiply_done,
            load_done = self.flags.load_done,
            write_done = self.flags.write_done,
            was_running = snapshot.progress.is_running(),
            "unit restored from snapshot"
        );
        Ok(())
    }
}

fn operand_image(operand: Operand, image: &[u64]) -> Result<&OperandLimbs, UnitError> {
    image.try_into().map_err(|_| {
        SnapshotLayoutError::OperandLimbs {
            operand,
            expected: OPERAND_LIMBS,
            actual: image.len(),
        }
        .into()
    })
}

fn result_image(image: &[u64]) -> Result<&ResultLimbs, UnitError> {
    image.try_into().map_err(|_| {
        SnapshotLayoutError::ResultLimbs {
            expected: RESULT_LIMBS,
            actual: image.len(),
        }
        .into()
    })
}
