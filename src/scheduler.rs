use crate::{
    Action, AggregateMetrics, ApproachSnapshot, ConfigError, ControllerConfig,
    Intersection, Phase, PhaseKind, PhaseState,
};
use log::{debug, info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;

/// How the scheduler decides when to end a green phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ControlMode {
    /// End green early when the active approaches are served
    /// and an opposing queue is much longer.
    #[default]
    Adaptive,
    /// Always run green phases to their maximum duration.
    FixedTime,
}

/// Decides, once per tick, whether to hold the active phase or advance to the next.
#[derive(Clone, Debug)]
pub struct PhaseScheduler {
    /// The signal cycle.
    phases: Vec<Phase>,
    /// See [ControllerConfig::queue_threshold].
    queue_threshold: usize,
    /// The control strategy.
    mode: ControlMode,
    /// The active phase and its timer.
    state: PhaseState,
}

/// Why the active phase ended.
#[derive(Clone, Copy, Debug)]
enum SwitchReason {
    /// A clearance phase ran for its full duration.
    Cleared,
    /// A green phase reached its maximum duration.
    MaxGreen,
    /// The active approaches were served while another approach queued.
    Queue { current: usize, opposing: usize },
}

impl fmt::Display for SwitchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchReason::Cleared => write!(f, "clearance complete"),
            SwitchReason::MaxGreen => write!(f, "maximum green"),
            SwitchReason::Queue { current, opposing } => {
                write!(f, "queue {} against opposing {}", current, opposing)
            }
        }
    }
}

impl PhaseScheduler {
    /// Creates a scheduler which starts at the beginning of the first phase.
    pub fn new(intersection: &Intersection, config: &ControllerConfig) -> Result<Self, ConfigError> {
        config.validate(intersection)?;
        info!(
            "Phase scheduler ready: {} phases, {:?} control, queue threshold {}",
            config.phases.len(),
            config.mode,
            config.queue_threshold
        );
        Ok(Self {
            phases: config.phases.clone(),
            queue_threshold: config.queue_threshold,
            mode: config.mode,
            state: PhaseState::default(),
        })
    }

    /// Advances the phase timer by one tick and decides the control action.
    pub fn step(&mut self, metrics: &AggregateMetrics) -> Action {
        self.state.elapsed_in_phase += 1;
        let elapsed = self.state.elapsed_in_phase;
        let phase = &self.phases[self.state.active_phase_index];

        use PhaseKind::*;
        let reason = match phase.kind() {
            Fixed { duration } if elapsed >= duration => Some(SwitchReason::Cleared),
            Fixed { .. } => None,
            Controllable { min_green, .. } if elapsed < min_green => None,
            Controllable { max_green, .. } if elapsed >= max_green => Some(SwitchReason::MaxGreen),
            Controllable { .. } => self.queue_switch(phase, metrics),
        };

        match reason {
            Some(reason) => self.switch(reason),
            None => Action::Hold,
        }
    }

    /// Gets the scheduler's state.
    pub fn state(&self) -> PhaseState {
        self.state
    }

    /// Gets the active phase.
    pub fn active_phase(&self) -> &Phase {
        &self.phases[self.state.active_phase_index]
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Decides whether a green phase should end before its maximum duration.
    fn queue_switch(&self, phase: &Phase, metrics: &AggregateMetrics) -> Option<SwitchReason> {
        if self.mode == ControlMode::FixedTime {
            return None;
        }
        let current = Self::current_queue(phase, metrics);
        let opposing = Self::opposing_queue(phase, metrics)?;
        let threshold = self.queue_threshold;
        if current < threshold && opposing.queue_length.saturating_sub(current) > threshold {
            Some(SwitchReason::Queue {
                current,
                opposing: opposing.queue_length,
            })
        } else {
            None
        }
    }

    /// The number of vehicles queued on the approaches with right-of-way.
    fn current_queue(phase: &Phase, metrics: &AggregateMetrics) -> usize {
        phase
            .approaches()
            .iter()
            .map(|id| metrics.queue_length(*id))
            .sum()
    }

    /// The longest queue waiting for a different phase.
    /// Ties go to the approach configured first.
    fn opposing_queue<'a>(phase: &Phase, metrics: &'a AggregateMetrics) -> Option<&'a ApproachSnapshot> {
        metrics
            .per_approach
            .iter()
            .filter(|s| !phase.serves(s.approach))
            .min_by_key(|s| Reverse(s.queue_length))
    }

    /// Ends the active phase and begins the next one in the cycle.
    fn switch(&mut self, reason: SwitchReason) -> Action {
        let from = self.state.active_phase_index;
        let next = (from + 1) % self.phases.len();
        debug!(
            "Phase {} -> {} after {} ticks ({})",
            from, next, self.state.elapsed_in_phase, reason
        );
        self.state.active_phase_index = next;
        self.state.elapsed_in_phase = 0;
        self.state.switch_count += 1;
        Action::SwitchTo(next)
    }

    /// The approach which would be named as the opposing queue in the active phase.
    #[cfg(test)]
    fn opposing_approach(&self, metrics: &AggregateMetrics) -> Option<crate::ApproachId> {
        Self::opposing_queue(self.active_phase(), metrics).map(|s| s.approach)
    }
}
