//! Scoring of congestion statistics for comparison between control strategies.
//!
//! Scores are observational only; they are never fed back into the
//! phase scheduler.

use crate::telemetry::{mean, AggregateMetrics};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The default weight of the mean queue length in the objective.
pub const DEFAULT_QUEUE_WEIGHT: f64 = 2.0;

/// Reduces congestion statistics into a single number. Lower is better.
///
/// `objective = avg_waiting_time + queue_weight * avg_queue_length`
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectiveScorer {
    queue_weight: f64,
}

/// Accumulates per-tick statistics over a measurement period.
#[derive(Clone, Debug, Default)]
pub struct RunMetrics {
    /// The sum of every observed vehicle's waiting time.
    waiting_time_sum: f64,
    /// The sum of every observed vehicle's speed.
    speed_sum: f64,
    /// The number of vehicle observations.
    observations: usize,
    /// The sum of the total queue length of each tick.
    queue_sum: f64,
    /// The number of ticks measured.
    ticks: usize,
}

/// Statistics averaged over a measurement period.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    /// The mean waiting time over all vehicle observations, in s.
    pub avg_waiting_time: f64,
    /// The mean speed over all vehicle observations, in m/s.
    pub avg_speed: f64,
    /// The mean number of queued vehicles per tick.
    pub avg_queue_length: f64,
    /// The number of ticks measured.
    pub ticks: usize,
    /// The number of vehicle observations.
    pub observations: usize,
}

impl ObjectiveScorer {
    pub fn new(queue_weight: f64) -> Self {
        Self { queue_weight }
    }

    pub fn queue_weight(&self) -> f64 {
        self.queue_weight
    }

    /// Scores the statistics of a single tick.
    pub fn score(&self, metrics: &AggregateMetrics) -> f64 {
        self.objective(metrics.avg_waiting_time, metrics.avg_queue_length)
    }

    /// Scores the statistics of a whole measurement period.
    pub fn score_run(&self, summary: &RunSummary) -> f64 {
        self.objective(summary.avg_waiting_time, summary.avg_queue_length)
    }

    fn objective(&self, avg_waiting_time: f64, avg_queue_length: f64) -> f64 {
        avg_waiting_time + self.queue_weight * avg_queue_length
    }
}

impl Default for ObjectiveScorer {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_WEIGHT)
    }
}

impl RunMetrics {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds the statistics of one tick.
    pub fn update(&mut self, metrics: &AggregateMetrics) {
        for snapshot in &metrics.per_approach {
            self.waiting_time_sum += snapshot.total_waiting_time;
            self.speed_sum += snapshot.total_speed;
        }
        self.observations += metrics.vehicle_count;
        self.queue_sum += metrics.total_queue_length() as f64;
        self.ticks += 1;
    }

    /// Starts a new measurement period.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The number of ticks measured so far.
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Averages the statistics gathered so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            avg_waiting_time: mean(self.waiting_time_sum, self.observations),
            avg_speed: mean(self.speed_sum, self.observations),
            avg_queue_length: mean(self.queue_sum, self.ticks),
            ticks: self.ticks,
            observations: self.observations,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::telemetry::ApproachSnapshot;
    use crate::{ApproachId, Key};
    use assert_approx_eq::assert_approx_eq;

    fn metrics(avg_waiting_time: f64, avg_speed: f64, queue: usize, count: usize) -> AggregateMetrics {
        AggregateMetrics {
            avg_waiting_time,
            avg_speed,
            avg_queue_length: queue as f64,
            vehicle_count: count,
            per_approach: vec![ApproachSnapshot {
                approach: ApproachId::null(),
                queue_length: queue,
                count,
                total_waiting_time: avg_waiting_time * count as f64,
                avg_waiting_time,
                total_speed: avg_speed * count as f64,
                avg_speed,
            }],
        }
    }

    #[test]
    fn empty_metrics_score_zero() {
        let scorer = ObjectiveScorer::default();
        assert_eq!(scorer.score(&AggregateMetrics::default()), 0.0);
        assert_eq!(scorer.score_run(&RunMetrics::new().summary()), 0.0);
    }

    #[test]
    fn weights_queue_length() {
        let scorer = ObjectiveScorer::default();
        assert_approx_eq!(scorer.score(&metrics(12.5, 3.0, 4, 10)), 20.5);

        let scorer = ObjectiveScorer::new(0.5);
        assert_approx_eq!(scorer.score(&metrics(12.5, 3.0, 4, 10)), 14.5);
    }

    #[test]
    fn run_averages_observations_and_ticks() {
        let mut run = RunMetrics::new();
        run.update(&metrics(10.0, 2.0, 6, 2));
        run.update(&metrics(4.0, 8.0, 0, 6));
        run.update(&AggregateMetrics::default());

        let summary = run.summary();
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.observations, 8);
        assert_approx_eq!(summary.avg_waiting_time, (20.0 + 24.0) / 8.0);
        assert_approx_eq!(summary.avg_speed, (4.0 + 48.0) / 8.0);
        assert_approx_eq!(summary.avg_queue_length, 2.0);
        assert_approx_eq!(ObjectiveScorer::default().score_run(&summary), 5.5 + 4.0);

        run.reset();
        assert_eq!(run.summary(), RunSummary::default());
    }

    #[test]
    fn run_keeps_exact_sums() {
        // Means such as 0.1 / 3 don't survive being multiplied back out
        let mut junction = crate::Intersection::new();
        let approach = junction.add_approach("north");
        let lane = junction.add_lane(approach, "n_0");
        let aggregator = crate::TelemetryAggregator::new(&junction, 0.1);
        let vehicles = [0.1, 0.2, 0.4].map(|x| crate::VehicleObservation {
            id: 0,
            lane,
            speed: x,
            waiting_time: x,
        });

        let mut run = RunMetrics::new();
        for _ in 0..1000 {
            run.update(&aggregator.aggregate(&vehicles));
        }
        let summary = run.summary();
        let sum: f64 = (0..1000).map(|_| 0.1 + 0.2 + 0.4).sum();
        assert_eq!(summary.avg_waiting_time, sum / 3000.0);
        assert_eq!(summary.avg_speed, sum / 3000.0);
    }
}
