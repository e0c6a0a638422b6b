use crate::{ApproachId, LaneId};
use slotmap::{SecondaryMap, SlotMap};

/// The controlled approaches and lanes of a single signalised intersection.
///
/// Approaches cannot be removed once added, so iterating over them
/// always yields them in the order they were added.
#[derive(Clone, Default, Debug)]
pub struct Intersection {
    /// The approaches to the intersection.
    approaches: SlotMap<ApproachId, Approach>,
    /// The controlled lanes.
    lanes: SlotMap<LaneId, Lane>,
}

/// A directional group of lanes which share a right-of-way phase.
#[derive(Clone, Debug)]
pub struct Approach {
    /// The approach ID.
    id: ApproachId,
    /// The name given to the approach by the simulation driver.
    name: String,
    /// The lanes feeding the intersection from this approach.
    lanes: Vec<LaneId>,
}

/// A single controlled lane.
#[derive(Clone, Debug)]
pub struct Lane {
    /// The lane ID.
    id: LaneId,
    /// The name given to the lane by the simulation driver.
    name: String,
    /// The approach the lane belongs to.
    approach: ApproachId,
}

impl Intersection {
    /// Creates an intersection with no approaches.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds an approach to the intersection.
    pub fn add_approach(&mut self, name: &str) -> ApproachId {
        self.approaches.insert_with_key(|id| Approach {
            id,
            name: name.to_owned(),
            lanes: vec![],
        })
    }

    /// Adds a controlled lane to the given approach.
    pub fn add_lane(&mut self, approach: ApproachId, name: &str) -> LaneId {
        let lane_id = self.lanes.insert_with_key(|id| Lane {
            id,
            name: name.to_owned(),
            approach,
        });
        self.approaches[approach].lanes.push(lane_id);
        lane_id
    }

    /// Returns an iterator over the approaches in the order they were added.
    pub fn iter_approaches(&self) -> impl Iterator<Item = &Approach> {
        self.approaches.values()
    }

    /// Returns an iterator over all the controlled lanes.
    pub fn iter_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    /// Gets the number of approaches.
    pub fn num_approaches(&self) -> usize {
        self.approaches.len()
    }

    /// Gets a reference to the approach with the given ID.
    pub fn get_approach(&self, approach_id: ApproachId) -> Option<&Approach> {
        self.approaches.get(approach_id)
    }

    /// Gets a reference to the lane with the given ID.
    pub fn get_lane(&self, lane_id: LaneId) -> Option<&Lane> {
        self.lanes.get(lane_id)
    }

    /// Checks whether the approach belongs to this intersection.
    pub fn contains_approach(&self, approach_id: ApproachId) -> bool {
        self.approaches.contains_key(approach_id)
    }

    /// Finds the approach with the given name.
    pub fn approach_by_name(&self, name: &str) -> Option<ApproachId> {
        self.approaches
            .values()
            .find(|approach| approach.name == name)
            .map(|approach| approach.id)
    }

    /// Finds the lane with the given name.
    pub fn lane_by_name(&self, name: &str) -> Option<LaneId> {
        self.lanes
            .values()
            .find(|lane| lane.name == name)
            .map(|lane| lane.id)
    }

    /// Gets the approach a lane belongs to, if the lane is controlled.
    pub fn approach_of(&self, lane_id: LaneId) -> Option<ApproachId> {
        self.lanes.get(lane_id).map(|lane| lane.approach)
    }

    /// Builds a map from each controlled lane to its approach.
    pub(crate) fn lane_map(&self) -> SecondaryMap<LaneId, ApproachId> {
        self.lanes
            .iter()
            .map(|(id, lane)| (id, lane.approach))
            .collect()
    }
}

impl Approach {
    pub fn id(&self) -> ApproachId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lanes feeding the intersection from this approach.
    pub fn lanes(&self) -> &[LaneId] {
        &self.lanes
    }
}

impl Lane {
    pub fn id(&self) -> LaneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn approach(&self) -> ApproachId {
        self.approach
    }
}
