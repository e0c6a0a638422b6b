use crate::ApproachId;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// One step of the intersection's signal cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Phase {
    /// The approaches which have right-of-way during the phase.
    approaches: SmallVec<[ApproachId; 4]>,
    /// How the duration of the phase is decided.
    kind: PhaseKind,
}

/// How the duration of a phase is decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PhaseKind {
    /// A right-of-way phase which lasts between `min_green` and `max_green` ticks,
    /// as decided by the scheduler.
    Controllable { min_green: usize, max_green: usize },
    /// A clearance phase (amber, all-red) which lasts exactly `duration` ticks.
    Fixed { duration: usize },
}

/// The scheduler's view of the signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseState {
    /// The index of the active phase.
    pub(crate) active_phase_index: usize,
    /// The number of ticks since the active phase began.
    pub(crate) elapsed_in_phase: usize,
    /// The number of phase changes so far.
    pub(crate) switch_count: usize,
}

/// The control action decided for a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Action {
    /// Keep the active phase.
    Hold,
    /// Change to the phase with the given index.
    SwitchTo(usize),
}

impl Phase {
    pub fn new(approaches: &[ApproachId], kind: PhaseKind) -> Self {
        Self {
            approaches: approaches.into(),
            kind,
        }
    }

    /// Creates a right-of-way phase for the given approaches.
    pub fn green(approaches: &[ApproachId], min_green: usize, max_green: usize) -> Self {
        Self::new(
            approaches,
            PhaseKind::Controllable {
                min_green,
                max_green,
            },
        )
    }

    /// Creates a clearance phase of the given length.
    pub fn clearance(duration: usize) -> Self {
        Self::new(&[], PhaseKind::Fixed { duration })
    }

    /// The approaches which have right-of-way during the phase.
    pub fn approaches(&self) -> &[ApproachId] {
        &self.approaches
    }

    pub fn kind(&self) -> PhaseKind {
        self.kind
    }

    /// Checks whether the approach has right-of-way during the phase.
    pub fn serves(&self, approach: ApproachId) -> bool {
        self.approaches.contains(&approach)
    }

    pub fn is_controllable(&self) -> bool {
        matches!(self.kind, PhaseKind::Controllable { .. })
    }
}

impl PhaseState {
    pub fn active_phase_index(&self) -> usize {
        self.active_phase_index
    }

    pub fn elapsed_in_phase(&self) -> usize {
        self.elapsed_in_phase
    }

    pub fn switch_count(&self) -> usize {
        self.switch_count
    }
}

impl Action {
    /// Gets the phase index being switched to, if any.
    pub fn target(&self) -> Option<usize> {
        match self {
            Action::Hold => None,
            Action::SwitchTo(idx) => Some(*idx),
        }
    }
}
