/// Resumption marker for the multiply phase.
///
/// Together with the `multiply-done` flag it distinguishes an idle unit, an
/// issued run waiting for its first cycle, and a run in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Progress {
    /// No run is in flight; the next `advance()` of an issued run starts one.
    #[default]
    NotStarted,
    /// The pipeline is working through the diagonals.
    Running,
}

impl Progress {
    /// Returns `true` while a run is in flight.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Marker to resume from after restoring a checkpoint.
    ///
    /// Pipeline contents are never checkpointed, so a run captured in flight
    /// restarts from diagonal 0 on the restored operands.
    #[must_use]
    pub const fn resumed(self) -> Self {
        match self {
            Self::NotStarted | Self::Running => Self::NotStarted,
        }
    }
}
