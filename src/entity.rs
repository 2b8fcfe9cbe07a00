//! Demand and facility records.
//!
//! A [`Solution`] is an arena that owns both sides of the demand/facility
//! relationship. A facility owns the ordered list of demands it serves; a
//! demand refers back to its facility through a plain index handle. Neither
//! side holds a pointer into the other, so there is no ownership cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Index handle for a demand inside a [`Solution`], in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemandId(usize);

impl DemandId {
    /// Position of the demand in arrival order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for DemandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// Index handle for a facility inside a [`Solution`], in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityId(usize);

impl FacilityId {
    /// Position of the facility in creation order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// A point requiring service.
///
/// The position never changes. `facility` is `None` until the demand is
/// assigned and is never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    /// Stable handle.
    pub id: DemandId,
    /// Where the demand arrived.
    pub position: Point,
    /// The facility serving this demand.
    pub facility: Option<FacilityId>,
}

/// An opened service point and the demands it serves, in insertion order.
///
/// A facility is always created together with at least one served demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    /// Stable handle.
    pub id: FacilityId,
    /// Where the facility stands.
    pub position: Point,
    /// Served demands, in the order they were attached.
    pub service: Vec<DemandId>,
}

impl Facility {
    /// Number of demands served.
    #[must_use]
    pub fn service_len(&self) -> usize {
        self.service.len()
    }
}

/// Demands and the facilities serving them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    demands: Vec<Demand>,
    facilities: Vec<Facility>,
}

impl Solution {
    /// Creates an empty solution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty solution with room for `demands` arrivals.
    #[must_use]
    pub fn with_capacity(demands: usize) -> Self {
        Self {
            demands: Vec::with_capacity(demands),
            facilities: Vec::new(),
        }
    }

    /// Records a new, unassigned demand.
    pub fn push_demand(&mut self, position: Point) -> DemandId {
        let id = DemandId(self.demands.len());
        self.demands.push(Demand {
            id,
            position,
            facility: None,
        });
        id
    }

    /// Opens a facility at the demand's exact position, serving that demand.
    pub fn open_facility(&mut self, demand: DemandId) -> FacilityId {
        let position = self.demands[demand.0].position;
        self.open_facility_serving(position, vec![demand])
    }

    /// Opens a facility at `position` serving `members`, in order.
    ///
    /// # Panics
    ///
    /// Panics if `members` is empty or any member is already assigned.
    pub(crate) fn open_facility_serving(&mut self, position: Point, members: Vec<DemandId>) -> FacilityId {
        assert!(!members.is_empty(), "a facility must serve at least one demand");
        let id = FacilityId(self.facilities.len());
        for &d in &members {
            self.bind(d, id);
        }
        self.facilities.push(Facility {
            id,
            position,
            service: members,
        });
        id
    }

    /// Attaches an unassigned demand to an existing facility.
    ///
    /// # Panics
    ///
    /// Panics if the demand is already assigned.
    pub fn assign(&mut self, demand: DemandId, facility: FacilityId) {
        self.bind(demand, facility);
        self.facilities[facility.0].service.push(demand);
    }

    fn bind(&mut self, demand: DemandId, facility: FacilityId) {
        let slot = &mut self.demands[demand.0].facility;
        assert!(slot.is_none(), "demand {demand} is already served by a facility");
        *slot = Some(facility);
    }

    /// All demands in arrival order.
    #[must_use]
    pub fn demands(&self) -> &[Demand] {
        &self.demands
    }

    /// All facilities in creation order.
    #[must_use]
    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    /// Looks up a demand.
    #[must_use]
    pub fn demand(&self, id: DemandId) -> Option<&Demand> {
        self.demands.get(id.0)
    }

    /// Looks up a facility.
    #[must_use]
    pub fn facility(&self, id: FacilityId) -> Option<&Facility> {
        self.facilities.get(id.0)
    }

    /// Number of demands.
    #[must_use]
    pub fn demand_count(&self) -> usize {
        self.demands.len()
    }

    /// Number of facilities.
    #[must_use]
    pub fn facility_count(&self) -> usize {
        self.facilities.len()
    }

    /// Positions of the demands served by `facility`, in service order.
    pub fn served_positions<'a>(&'a self, facility: &'a Facility) -> impl Iterator<Item = Point> + 'a {
        facility.service.iter().map(|d| self.demands[d.0].position)
    }

    /// The facility serving `demand`, if any.
    #[must_use]
    pub fn serving(&self, demand: DemandId) -> Option<&Facility> {
        self.demand(demand)
            .and_then(|d| d.facility)
            .and_then(|f| self.facility(f))
    }

    /// Returns true if every demand is served by exactly one facility and the
    /// back-references agree with the service lists.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut seen = vec![false; self.demands.len()];
        for f in &self.facilities {
            if f.service.is_empty() {
                return false;
            }
            for d in &f.service {
                let Some(slot) = seen.get_mut(d.0) else {
                    return false;
                };
                if *slot || self.demands[d.0].facility != Some(f.id) {
                    return false;
                }
                *slot = true;
            }
        }
        seen.into_iter().all(|s| s)
    }
}
