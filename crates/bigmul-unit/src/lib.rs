//! Cycle-stepped 4096x4096 -> 8192-bit multiply unit for an instruction-set
//! simulator.
//!
//! The host stages two 64-limb operands, issues the multiply, then calls
//! [`BigmulUnit::advance`] once per simulated cycle until the unit reports
//! `multiply-done`. Internally the product is formed diagonal by diagonal
//! through a configurable GEN -> LOAD -> MUL -> ACCUMULATE pipeline; every
//! latency model yields the same bit-exact result.

/// Wide-word multiply and add-with-carry primitives.
pub mod arith;
pub use arith::{add_with_carry, mul_wide, split_u128, Accumulator, Wide192};

/// Fixed-size operand and result limb storage.
pub mod cache;
pub use cache::{
    OperandCache, OperandLimbs, ResultCache, ResultLimbs, LIMB_BYTES, OPERAND_BYTES,
    OPERAND_LIMBS, RESULT_BYTES, RESULT_LIMBS,
};

/// Error taxonomy for the unit's host-facing boundary.
pub mod error;
pub use error::{BusError, Operand, SnapshotLayoutError, UnitError};

/// Anti-diagonal index-pair scheduling.
pub mod schedule;
pub use schedule::{
    Batch, DiagonalCursor, IndexPair, DEFAULT_BATCH_WIDTH, DIAGONAL_COUNT, LAST_DIAGONAL,
    MAX_BATCH_WIDTH,
};

/// Pipeline shape, retirement latency and named presets.
pub mod timing;
pub use timing::{
    csa_depth, LatencyProfile, PipelineConfig, RetirementPolicy, StageModel,
    LATENCY_PROFILE_TABLE, MAX_CSA_DEPTH,
};

/// Pipeline activity counters.
pub mod diag;
pub use diag::PipelineStats;

/// Staged multiply pipeline.
pub mod pipeline;
pub use pipeline::{LoadedBatch, PartialSum, Pipeline, RETIRE_QUEUE_CAPACITY};

/// Completion flags, progress marker and transfer bookkeeping.
pub mod state;
pub use state::{Progress, TransferBookkeeping, UnitFlags};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    ClosedDiagonal, NullTraceSink, RunOutcome, SnapshotVersion, StepOutcome, TraceEvent,
    TraceSink, UnitConfig, UnitSnapshot,
};

/// Host memory bus used by the load and write-back phases.
pub mod memory;
pub use memory::{FlatMemory, LimbBus};

/// Schoolbook reference product.
pub mod reference;
pub use reference::{bit_length, schoolbook_product};

/// Unit controller.
pub mod unit;
pub use unit::BigmulUnit;

/// `tracing` target for every log record the unit emits.
pub(crate) const LOG_TARGET: &str = "bigmul_unit";

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
