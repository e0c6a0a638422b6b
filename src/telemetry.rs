//! Reduction of raw vehicle observations into per-approach congestion statistics.

use crate::{ApproachId, Intersection, LaneId};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

/// The default speed below which a vehicle is considered queued, in m/s.
pub const DEFAULT_NEAR_STOP_SPEED: f64 = 0.1;

/// A single vehicle as observed by the simulation in the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleObservation {
    /// The simulation's identifier for the vehicle.
    pub id: u64,
    /// The lane the vehicle occupies.
    pub lane: LaneId,
    /// The vehicle's speed in m/s.
    pub speed: f64,
    /// The vehicle's accumulated waiting time in s.
    pub waiting_time: f64,
}

/// Congestion statistics for one approach in the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ApproachSnapshot {
    /// The approach being described.
    pub approach: ApproachId,
    /// The number of vehicles moving slower than the near-stop speed.
    pub queue_length: usize,
    /// The number of vehicles on the approach.
    pub count: usize,
    /// The sum of the vehicles' waiting times in s.
    pub total_waiting_time: f64,
    /// The mean waiting time of the vehicles in s.
    pub avg_waiting_time: f64,
    /// The sum of the vehicles' speeds in m/s.
    pub total_speed: f64,
    /// The mean speed of the vehicles in m/s.
    pub avg_speed: f64,
}

/// Intersection-wide statistics for the current tick.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AggregateMetrics {
    /// The mean waiting time over all vehicles present, in s.
    pub avg_waiting_time: f64,
    /// The mean speed over all vehicles present, in m/s.
    pub avg_speed: f64,
    /// The number of queued vehicles at the intersection.
    /// Averaging this over ticks gives the run's mean queue length.
    pub avg_queue_length: f64,
    /// The number of vehicles on controlled lanes.
    pub vehicle_count: usize,
    /// The statistics of each approach, in configuration order.
    pub per_approach: Vec<ApproachSnapshot>,
}

/// Turns the vehicles observed in a tick into [AggregateMetrics].
#[derive(Clone, Debug)]
pub struct TelemetryAggregator {
    /// The index into `approaches` of each controlled lane's approach.
    lanes: SecondaryMap<LaneId, usize>,
    /// The approaches, in configuration order.
    approaches: Vec<ApproachId>,
    /// Vehicles slower than this are counted as queued, in m/s.
    near_stop_speed: f64,
}

impl ApproachSnapshot {
    fn empty(approach: ApproachId) -> Self {
        Self {
            approach,
            queue_length: 0,
            count: 0,
            total_waiting_time: 0.0,
            avg_waiting_time: 0.0,
            total_speed: 0.0,
            avg_speed: 0.0,
        }
    }
}

impl AggregateMetrics {
    /// Gets the statistics of the given approach.
    pub fn get(&self, approach: ApproachId) -> Option<&ApproachSnapshot> {
        self.per_approach.iter().find(|s| s.approach == approach)
    }

    /// Gets the queue length of the given approach, or zero if it isn't known.
    pub fn queue_length(&self, approach: ApproachId) -> usize {
        self.get(approach).map_or(0, |s| s.queue_length)
    }

    /// Gets the number of queued vehicles over all approaches.
    pub fn total_queue_length(&self) -> usize {
        self.per_approach.iter().map(|s| s.queue_length).sum()
    }
}

impl TelemetryAggregator {
    /// Creates an aggregator for the controlled lanes of an intersection.
    pub fn new(intersection: &Intersection, near_stop_speed: f64) -> Self {
        let approaches = intersection
            .iter_approaches()
            .map(|a| a.id())
            .collect::<Vec<_>>();
        let lanes = intersection
            .lane_map()
            .into_iter()
            .filter_map(|(lane, approach)| {
                let idx = approaches.iter().position(|id| *id == approach)?;
                Some((lane, idx))
            })
            .collect();
        Self {
            lanes,
            approaches,
            near_stop_speed,
        }
    }

    /// The speed below which a vehicle is counted as queued.
    pub fn near_stop_speed(&self) -> f64 {
        self.near_stop_speed
    }

    /// Determines whether the vehicle is stopped or crawling.
    pub fn is_queued(&self, vehicle: &VehicleObservation) -> bool {
        vehicle.speed < self.near_stop_speed
    }

    /// Reduces the vehicles observed in a tick into per-approach and
    /// intersection-wide statistics.
    ///
    /// Vehicles on lanes which aren't controlled by the intersection are ignored.
    /// Averages over zero vehicles are zero.
    pub fn aggregate(&self, vehicles: &[VehicleObservation]) -> AggregateMetrics {
        let mut per_approach = self
            .approaches
            .iter()
            .map(|id| ApproachSnapshot::empty(*id))
            .collect::<Vec<_>>();

        for vehicle in vehicles {
            let Some(&idx) = self.lanes.get(vehicle.lane) else {
                continue;
            };
            let snapshot = &mut per_approach[idx];
            snapshot.count += 1;
            snapshot.total_waiting_time += vehicle.waiting_time;
            if self.is_queued(vehicle) {
                snapshot.queue_length += 1;
            }
            snapshot.total_speed += vehicle.speed;
        }

        let mut total_waiting_time = 0.0;
        let mut total_speed = 0.0;
        let mut vehicle_count = 0;
        let mut queued = 0;

        for snapshot in &mut per_approach {
            snapshot.avg_waiting_time = mean(snapshot.total_waiting_time, snapshot.count);
            snapshot.avg_speed = mean(snapshot.total_speed, snapshot.count);
            total_waiting_time += snapshot.total_waiting_time;
            total_speed += snapshot.total_speed;
            vehicle_count += snapshot.count;
            queued += snapshot.queue_length;
        }

        AggregateMetrics {
            avg_waiting_time: mean(total_waiting_time, vehicle_count),
            avg_speed: mean(total_speed, vehicle_count),
            avg_queue_length: queued as f64,
            vehicle_count,
            per_approach,
        }
    }
}

/// The arithmetic mean, or zero when there is nothing to average.
pub(crate) fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
