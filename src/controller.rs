use crate::{
    Action, AggregateMetrics, ConfigError, ControllerConfig, Intersection, ObjectiveScorer,
    PhaseScheduler, PhaseState, RunMetrics, TelemetryAggregator, VehicleObservation,
};
use log::trace;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Applies control actions to the simulated traffic light.
///
/// The light's phase is never read back: the scheduler's [PhaseState],
/// reported in each [TickReport], is the record of the active phase and its elapsed time.
pub trait Actuator {
    /// Makes the phase with the given index active.
    fn set_phase(&mut self, index: usize);

    /// Keeps the active phase for another tick.
    fn extend_phase(&mut self);
}

/// The adaptive controller of a single intersection.
///
/// Each tick, the observed vehicles are aggregated, the aggregate is scored,
/// and the scheduler decides the next action. The score is reported but
/// plays no part in the decision.
#[derive(Clone, Debug)]
pub struct Controller {
    aggregator: TelemetryAggregator,
    scorer: ObjectiveScorer,
    scheduler: PhaseScheduler,
    /// Statistics accumulated over the run.
    run: RunMetrics,
    /// The number of ticks evaluated.
    tick: usize,
}

/// Everything decided and measured in one tick.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickReport {
    /// The index of the tick, starting from zero.
    pub tick: usize,
    /// The congestion statistics of the tick.
    pub metrics: AggregateMetrics,
    /// The objective score of the tick. Lower is better.
    pub objective: f64,
    /// The action decided for the signal.
    pub action: Action,
    /// The scheduler's state after the action.
    pub state: PhaseState,
}

impl Controller {
    /// Creates a controller for the intersection.
    pub fn new(intersection: &Intersection, config: &ControllerConfig) -> Result<Self, ConfigError> {
        let scheduler = PhaseScheduler::new(intersection, config)?;
        Ok(Self {
            aggregator: TelemetryAggregator::new(intersection, config.near_stop_speed),
            scorer: ObjectiveScorer::new(config.queue_weight),
            scheduler,
            run: RunMetrics::new(),
            tick: 0,
        })
    }

    /// Evaluates one tick of telemetry.
    pub fn tick(&mut self, vehicles: &[VehicleObservation]) -> TickReport {
        let metrics = self.aggregator.aggregate(vehicles);
        let objective = self.scorer.score(&metrics);
        let action = self.scheduler.step(&metrics);
        self.run.update(&metrics);

        trace!(
            "Tick {}: {} vehicles, queue {}, wait {:.1}s, objective {:.1}, {:?}",
            self.tick,
            metrics.vehicle_count,
            metrics.total_queue_length(),
            metrics.avg_waiting_time,
            objective,
            action
        );

        let report = TickReport {
            tick: self.tick,
            metrics,
            objective,
            action,
            state: self.scheduler.state(),
        };
        self.tick += 1;
        report
    }

    pub fn scheduler(&self) -> &PhaseScheduler {
        &self.scheduler
    }

    pub fn scorer(&self) -> &ObjectiveScorer {
        &self.scorer
    }

    /// Gets the statistics accumulated over the run.
    pub fn run_metrics(&self) -> &RunMetrics {
        &self.run
    }

    /// Scores the run so far.
    pub fn run_objective(&self) -> f64 {
        self.scorer.score_run(&self.run.summary())
    }
}

impl TickReport {
    /// Sends the action to the traffic light.
    pub fn apply(&self, actuator: &mut impl Actuator) {
        match self.action {
            Action::Hold => actuator.extend_phase(),
            Action::SwitchTo(index) => actuator.set_phase(index),
        }
    }

    /// The index of the active phase after the action.
    pub fn active_phase(&self) -> usize {
        self.state.active_phase_index()
    }

    /// The number of phase changes so far.
    pub fn switch_count(&self) -> usize {
        self.state.switch_count()
    }
}
