//! Latency models for the multiply pipeline and their named presets.

use crate::error::UnitError;
use crate::schedule::{DEFAULT_BATCH_WIDTH, MAX_BATCH_WIDTH};

/// Deepest compressor tree the delay model may simulate.
pub const MAX_CSA_DEPTH: u8 = 4;

/// How the four logical stages map onto simulated cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StageModel {
    /// GEN, LOAD, MUL and ACCUMULATE all complete within one cycle.
    Combinational,
    /// Each stage consumes the previous stage's output from the prior cycle.
    Staged,
}

/// When a MUL result is folded into the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RetirementPolicy {
    /// Retire in the ACCUMULATE stage.
    Immediate,
    /// Hold in a delay queue for a depth derived from the batch size.
    CsaDelay {
        /// Upper bound on the simulated tree depth (`<= 4`).
        max_depth: u8,
    },
}

impl RetirementPolicy {
    /// Extra cycles a partial sum of `count` products waits before retiring.
    #[must_use]
    pub fn delay_for(self, count: usize) -> u8 {
        match self {
            Self::Immediate => 0,
            Self::CsaDelay { max_depth } => csa_depth(count).min(max_depth),
        }
    }
}

/// Compressor-tree depth for a batch: `clamp(ceil(log2(count)) - 1, 0, 4)`.
#[must_use]
pub fn csa_depth(count: usize) -> u8 {
    if count <= 2 {
        return 0;
    }
    let levels = usize::BITS - (count - 1).leading_zeros();
    u8::try_from(levels - 1)
        .unwrap_or(MAX_CSA_DEPTH)
        .min(MAX_CSA_DEPTH)
}

/// Pipeline shape selected at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PipelineConfig {
    /// Index pairs GEN may emit per cycle (`1..=64`).
    pub batch_width: usize,
    /// Stage-to-cycle mapping.
    pub stages: StageModel,
    /// Retirement latency model.
    pub retirement: RetirementPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        LatencyProfile::default().config()
    }
}

impl PipelineConfig {
    /// Checks the configuration against the unit's fixed geometry.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::InvalidBatchWidth`] for a width outside `1..=64`
    /// and [`UnitError::InvalidCsaDepthCap`] for a depth cap above 4.
    pub const fn validate(&self) -> Result<(), UnitError> {
        if self.batch_width == 0 || self.batch_width > MAX_BATCH_WIDTH {
            return Err(UnitError::InvalidBatchWidth {
                width: self.batch_width,
            });
        }
        if let RetirementPolicy::CsaDelay { max_depth } = self.retirement {
            if max_depth > MAX_CSA_DEPTH {
                return Err(UnitError::InvalidCsaDepthCap { cap: max_depth });
            }
        }
        Ok(())
    }

    /// Same configuration with a different batch width.
    #[must_use]
    pub const fn with_batch_width(mut self, batch_width: usize) -> Self {
        self.batch_width = batch_width;
        self
    }
}

/// Named pipeline presets modelling successive hardware revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LatencyProfile {
    /// Whole diagonal multiplied and accumulated every cycle.
    SingleCycle,
    /// One product per cycle, no staging.
    Streaming,
    /// Four-stage pipeline with immediate retirement.
    Staged,
    /// Four-stage pipeline with CSA-tree retirement delay.
    #[default]
    DelayQueue,
    /// Full-diagonal systolic array with CSA-tree retirement delay.
    Systolic,
}

/// Single source-of-truth table mapping presets to pipeline shapes.
pub const LATENCY_PROFILE_TABLE: &[(LatencyProfile, PipelineConfig)] = &[
    (
        LatencyProfile::SingleCycle,
        PipelineConfig {
            batch_width: MAX_BATCH_WIDTH,
            stages: StageModel::Combinational,
            retirement: RetirementPolicy::Immediate,
        },
    ),
    (
        LatencyProfile::Streaming,
        PipelineConfig {
            batch_width: 1,
            stages: StageModel::Combinational,
            retirement: RetirementPolicy::Immediate,
        },
    ),
    (
        LatencyProfile::Staged,
        PipelineConfig {
            batch_width: DEFAULT_BATCH_WIDTH,
            stages: StageModel::Staged,
            retirement: RetirementPolicy::Immediate,
        },
    ),
    (
        LatencyProfile::DelayQueue,
        PipelineConfig {
            batch_width: DEFAULT_BATCH_WIDTH,
            stages: StageModel::Staged,
            retirement: RetirementPolicy::CsaDelay {
                max_depth: MAX_CSA_DEPTH,
            },
        },
    ),
    (
        LatencyProfile::Systolic,
        PipelineConfig {
            batch_width: MAX_BATCH_WIDTH,
            stages: StageModel::Staged,
            retirement: RetirementPolicy::CsaDelay {
                max_depth: MAX_CSA_DEPTH,
            },
        },
    ),
];

impl LatencyProfile {
    /// Every preset, in table order.
    pub const ALL: [Self; 5] = [
        Self::SingleCycle,
        Self::Streaming,
        Self::Staged,
        Self::DelayQueue,
        Self::Systolic,
    ];

    /// Looks up the pipeline shape for this preset.
    #[must_use]
    pub fn config(self) -> PipelineConfig {
        LATENCY_PROFILE_TABLE
            .iter()
            .find_map(|(profile, config)| (*profile == self).then_some(*config))
            .unwrap_or(PipelineConfig {
                batch_width: DEFAULT_BATCH_WIDTH,
                stages: StageModel::Staged,
                retirement: RetirementPolicy::Immediate,
            })
    }

    /// Stable lowercase name used on command lines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SingleCycle => "single-cycle",
            Self::Streaming => "streaming",
            Self::Staged => "staged",
            Self::DelayQueue => "delay-queue",
            Self::Systolic => "systolic",
        }
    }

    /// Parses a name produced by [`LatencyProfile::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|profile| profile.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rstest::rstest;

    use super::{
        csa_depth, LatencyProfile, PipelineConfig, RetirementPolicy, StageModel,
        LATENCY_PROFILE_TABLE,
    };
    use crate::error::UnitError;

    #[test]
    fn table_contains_unique_profiles() {
        let profiles: HashSet<_> = LATENCY_PROFILE_TABLE.iter().map(|(p, _)| *p).collect();
        assert_eq!(profiles.len(), LATENCY_PROFILE_TABLE.len());
        assert_eq!(profiles.len(), LatencyProfile::ALL.len());
    }

    #[test]
    fn every_table_entry_validates() {
        for (profile, config) in LATENCY_PROFILE_TABLE {
            assert_eq!(profile.config(), *config);
            assert_eq!(config.validate(), Ok(()));
        }
    }

    #[test]
    fn default_profile_is_delay_queue_of_width_25() {
        let config = PipelineConfig::default();
        assert_eq!(config.batch_width, 25);
        assert_eq!(config.stages, StageModel::Staged);
        assert_eq!(config.retirement, RetirementPolicy::CsaDelay { max_depth: 4 });
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(2, 0)]
    #[case(3, 1)]
    #[case(4, 1)]
    #[case(5, 2)]
    #[case(8, 2)]
    #[case(9, 3)]
    #[case(16, 3)]
    #[case(17, 4)]
    #[case(25, 4)]
    #[case(64, 4)]
    fn csa_depth_is_clamped_log2_minus_one(#[case] count: usize, #[case] depth: u8) {
        assert_eq!(csa_depth(count), depth);
    }

    #[test]
    fn depth_cap_limits_delay() {
        let policy = RetirementPolicy::CsaDelay { max_depth: 2 };
        assert_eq!(policy.delay_for(25), 2);
        assert_eq!(RetirementPolicy::Immediate.delay_for(64), 0);
    }

    #[test]
    fn validate_rejects_out_of_range_shapes() {
        let zero = PipelineConfig::default().with_batch_width(0);
        assert_eq!(
            zero.validate(),
            Err(UnitError::InvalidBatchWidth { width: 0 })
        );

        let wide = PipelineConfig::default().with_batch_width(65);
        assert_eq!(
            wide.validate(),
            Err(UnitError::InvalidBatchWidth { width: 65 })
        );

        let deep = PipelineConfig {
            retirement: RetirementPolicy::CsaDelay { max_depth: 5 },
            ..PipelineConfig::default()
        };
        assert_eq!(deep.validate(), Err(UnitError::InvalidCsaDepthCap { cap: 5 }));
    }

    #[test]
    fn profile_names_roundtrip() {
        for profile in LatencyProfile::ALL {
            assert_eq!(LatencyProfile::from_name(profile.name()), Some(profile));
        }
        assert_eq!(LatencyProfile::from_name("turbo"), None);
    }
}
