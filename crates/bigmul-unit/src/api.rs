//! Public host-facing API contracts for embedding the multiply unit.

use crate::diag::PipelineStats;
use crate::error::{Operand, SnapshotLayoutError, UnitError};
use crate::state::{Progress, TransferBookkeeping, UnitFlags};
use crate::timing::{LatencyProfile, PipelineConfig};
use crate::{OPERAND_LIMBS, RESULT_LIMBS};

/// Top-level immutable configuration for a unit instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct UnitConfig {
    /// Pipeline shape and latency model.
    pub pipeline: PipelineConfig,
    /// Enables deterministic trace callback dispatch.
    pub tracing_enabled: bool,
}

impl UnitConfig {
    /// Configuration for a named latency preset, tracing disabled.
    #[must_use]
    pub fn with_profile(profile: LatencyProfile) -> Self {
        Self {
            pipeline: profile.config(),
            tracing_enabled: false,
        }
    }
}

/// A finished result limb produced when a diagonal closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClosedDiagonal {
    /// Diagonal (and result limb) index, `0..=127`.
    pub index: u8,
    /// Limb value stored in the result cache.
    pub limb: u64,
}

/// Output status from one `advance()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Multiply already done; nothing happened.
    Idle,
    /// An issued-but-not-started run was initialised this cycle.
    Started,
    /// One pipeline cycle executed.
    Cycle {
        /// Diagonal closed at the end of this cycle, if any.
        closed: Option<ClosedDiagonal>,
    },
    /// The final diagonal closed this cycle; the result cache is ready.
    Completed {
        /// Pipeline cycles the run took, excluding the start cycle.
        cycles: u32,
    },
}

/// Aggregated outcome of driving a run to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Number of `advance()` calls made, including any auto-start cycle.
    pub advances: u32,
    /// Pipeline counters at completion.
    pub stats: PipelineStats,
}

/// Stable snapshot wire-version identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u16)]
pub enum SnapshotVersion {
    /// Initial schema revision.
    V1 = 1,
}

impl SnapshotVersion {
    /// Converts a wire value to a known snapshot version.
    #[must_use]
    pub const fn from_u16(version: u16) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            _ => None,
        }
    }

    /// Wire value of this version.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for SnapshotVersion {
    type Error = UnitError;

    fn try_from(version: u16) -> Result<Self, Self::Error> {
        Self::from_u16(version).ok_or(UnitError::UnsupportedSnapshotVersion { version })
    }
}

/// Checkpoint of the unit's architecturally visible state.
///
/// Pipeline registers, the accumulator and the diagonal cursor are not
/// captured; see [`crate::BigmulUnit::restore`] for how a mid-run snapshot
/// resumes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct UnitSnapshot {
    /// Snapshot schema version.
    pub version: SnapshotVersion,
    /// Operand A cache image, 64 limbs.
    pub operand_a: Box<[u64]>,
    /// Operand B cache image, 64 limbs.
    pub operand_b: Box<[u64]>,
    /// Result cache image, 128 limbs.
    pub result: Box<[u64]>,
    /// Completion flags.
    pub flags: UnitFlags,
    /// Resumption marker.
    pub progress: Progress,
    /// Base addresses and transfer offsets.
    pub transfer: TransferBookkeeping,
}

impl UnitSnapshot {
    /// Checks version and cache geometry.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::SnapshotLayout`] when an image has the wrong
    /// number of limbs or a transfer offset is out of range or inconsistent
    /// with the flags.
    pub fn validate(&self) -> Result<(), UnitError> {
        for (operand, image) in [(Operand::A, &self.operand_a), (Operand::B, &self.operand_b)] {
            if image.len() != OPERAND_LIMBS {
                return Err(SnapshotLayoutError::OperandLimbs {
                    operand,
                    expected: OPERAND_LIMBS,
                    actual: image.len(),
                }
                .into());
            }
        }
        if self.result.len() != RESULT_LIMBS {
            return Err(SnapshotLayoutError::ResultLimbs {
                expected: RESULT_LIMBS,
                actual: self.result.len(),
            }
            .into());
        }
        self.transfer.validate(self.flags)?;
        Ok(())
    }
}

/// Deterministic trace events emitted at cycle boundaries when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// A run was initialised at diagonal 0.
    RunStarted,
    /// GEN emitted a batch.
    BatchIssued {
        /// Diagonal the batch belongs to.
        diagonal: u8,
        /// Index pairs in the batch.
        products: u8,
    },
    /// A partial sum was folded into the accumulator.
    BatchRetired {
        /// Diagonal the partial sum belongs to.
        diagonal: u8,
        /// Index pairs that produced it.
        products: u8,
    },
    /// A diagonal closed and its result limb was stored.
    DiagonalClosed {
        /// Closed diagonal.
        diagonal: u8,
        /// Stored limb.
        limb: u64,
    },
    /// The 128th limb was stored.
    MultiplyCompleted {
        /// Pipeline cycles the run took.
        cycles: u32,
    },
    /// One limb of each operand was copied in by a load cycle.
    LimbLoaded {
        /// Limb index.
        index: u8,
    },
    /// One result limb was written back by a write-back cycle.
    LimbWritten {
        /// Limb index.
        index: u8,
        /// Destination byte address.
        addr: u64,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in cycle order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}
