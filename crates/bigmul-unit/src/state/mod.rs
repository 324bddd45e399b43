//! Host-observable unit control state.

/// Completion flags and transfer bookkeeping.
pub mod flags;
/// Resumption marker for the multiply phase.
pub mod run_state;

pub use flags::{TransferBookkeeping, UnitFlags};
pub use run_state::Progress;
