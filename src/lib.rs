pub use config::{ConfigError, ControllerConfig};
pub use controller::{Actuator, Controller, TickReport};
pub use intersection::{Approach, Intersection, Lane};
pub use objective::{ObjectiveScorer, RunMetrics, RunSummary, DEFAULT_QUEUE_WEIGHT};
pub use phase::{Action, Phase, PhaseKind, PhaseState};
pub use scheduler::{ControlMode, PhaseScheduler};
pub use slotmap::{Key, KeyData};
pub use telemetry::{
    AggregateMetrics, ApproachSnapshot, TelemetryAggregator, VehicleObservation,
    DEFAULT_NEAR_STOP_SPEED,
};
use slotmap::new_key_type;

mod config;
mod controller;
mod intersection;
mod objective;
mod phase;
mod scheduler;
mod telemetry;

new_key_type! {
    /// Unique ID of an [Approach].
    pub struct ApproachId;
    /// Unique ID of a controlled [Lane].
    pub struct LaneId;
}
