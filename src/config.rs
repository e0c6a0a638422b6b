use crate::objective::DEFAULT_QUEUE_WEIGHT;
use crate::telemetry::DEFAULT_NEAR_STOP_SPEED;
use crate::{ApproachId, ControlMode, Intersection, Phase, PhaseKind};
use itertools::Itertools;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The parameters of a controller. All durations are in ticks.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ControllerConfig {
    /// The default minimum duration of a green phase.
    pub min_green_time: usize,
    /// The default maximum duration of a green phase.
    pub max_green_time: usize,
    /// The default duration of an amber phase.
    pub yellow_time: usize,
    /// The queue length below which the active approaches are considered
    /// served, and the margin by which an opposing queue must exceed them.
    pub queue_threshold: usize,
    /// The weight of the mean queue length in the objective score.
    pub queue_weight: f64,
    /// Vehicles slower than this are counted as queued, in m/s.
    pub near_stop_speed: f64,
    /// Whether phases respond to queues or run for fixed times.
    pub mode: ControlMode,
    /// The signal cycle, in order.
    pub phases: Vec<Phase>,
}

/// A controller configuration which can't be run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("the phase sequence is empty")]
    EmptyPhaseSequence,
    #[error("phase {phase} has a minimum green time of {min} which exceeds its maximum of {max}")]
    GreenBoundsInverted { phase: usize, min: usize, max: usize },
    #[error("phase {phase} has a maximum green time of zero")]
    ZeroMaxGreen { phase: usize },
    #[error("clearance phase {phase} has a duration of zero")]
    ZeroFixedDuration { phase: usize },
    #[error("phase {phase} gives right-of-way to an approach not in the intersection")]
    UnknownApproach { phase: usize },
    #[error("phase {phase} lists the same approach more than once")]
    DuplicateApproach { phase: usize },
    #[error("near-stop speed {0} is not a finite, non-negative number")]
    InvalidSpeedThreshold(f64),
    #[error("queue weight {0} is not a finite number")]
    InvalidQueueWeight(f64),
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            min_green_time: 10,
            max_green_time: 60,
            yellow_time: 3,
            queue_threshold: 5,
            queue_weight: DEFAULT_QUEUE_WEIGHT,
            near_stop_speed: DEFAULT_NEAR_STOP_SPEED,
            mode: ControlMode::Adaptive,
            phases: vec![],
        }
    }
}

impl ControllerConfig {
    /// Replaces the phase sequence with a two-way cycle:
    /// green for `a`, amber, green for `b`, amber.
    pub fn with_two_way_phases(mut self, a: &[ApproachId], b: &[ApproachId]) -> Self {
        self.phases = vec![
            Phase::green(a, self.min_green_time, self.max_green_time),
            Phase::clearance(self.yellow_time),
            Phase::green(b, self.min_green_time, self.max_green_time),
            Phase::clearance(self.yellow_time),
        ];
        self
    }

    pub fn with_mode(mut self, mode: ControlMode) -> Self {
        self.mode = mode;
        self
    }

    /// Checks that the configuration can control the given intersection.
    pub fn validate(&self, intersection: &Intersection) -> Result<(), ConfigError> {
        if self.phases.is_empty() {
            return Err(ConfigError::EmptyPhaseSequence);
        }
        if !(self.near_stop_speed.is_finite() && self.near_stop_speed >= 0.0) {
            return Err(ConfigError::InvalidSpeedThreshold(self.near_stop_speed));
        }
        if !self.queue_weight.is_finite() {
            return Err(ConfigError::InvalidQueueWeight(self.queue_weight));
        }

        for (phase, def) in self.phases.iter().enumerate() {
            match def.kind() {
                PhaseKind::Controllable { min_green, max_green } => {
                    if max_green == 0 {
                        return Err(ConfigError::ZeroMaxGreen { phase });
                    }
                    if min_green > max_green {
                        return Err(ConfigError::GreenBoundsInverted {
                            phase,
                            min: min_green,
                            max: max_green,
                        });
                    }
                }
                PhaseKind::Fixed { duration } => {
                    if duration == 0 {
                        return Err(ConfigError::ZeroFixedDuration { phase });
                    }
                }
            }
            if !def.approaches().iter().all(|a| intersection.contains_approach(*a)) {
                return Err(ConfigError::UnknownApproach { phase });
            }
            if !def.approaches().iter().all_unique() {
                return Err(ConfigError::DuplicateApproach { phase });
            }
        }

        Ok(())
    }
}
