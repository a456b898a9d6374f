//! Authoritative set of live agents and the spatial queries built on it.

use std::collections::BTreeMap;

use lasius_core::{
    ActivityState, AgentId, AgentKind, AgentSnapshot, AggressionState, BodySnapshot, CellCoord,
    ColonyKind, ForagerTunables, PredatorTunables,
};

use crate::field::SpatialField;

/// A live entity on the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    id: AgentId,
    cell: CellCoord,
    body: Body,
}

impl Agent {
    /// Identifier of the agent.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Cell the agent stands on.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Kind-specific state.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Kind of the agent.
    #[must_use]
    pub const fn kind(&self) -> AgentKind {
        self.body.kind()
    }

    /// Forager state, when the agent is a forager.
    #[must_use]
    pub const fn as_forager(&self) -> Option<&Forager> {
        match &self.body {
            Body::Forager(forager) => Some(forager),
            _ => None,
        }
    }

    /// Captures an immutable snapshot of the agent.
    #[must_use]
    pub fn snapshot(&self) -> AgentSnapshot {
        let body = match &self.body {
            Body::Forager(forager) => BodySnapshot::Forager {
                activity: forager.activity,
                aggression: forager.aggression,
                colony_target: forager.colony_target,
            },
            Body::Predator(_) => BodySnapshot::Predator,
            Body::Colony(colony) => BodySnapshot::Colony {
                colony: colony.kind,
                size: colony.size,
            },
        };
        AgentSnapshot {
            id: self.id,
            cell: self.cell,
            body,
        }
    }

    pub(crate) fn set_cell(&mut self, cell: CellCoord) {
        self.cell = cell;
    }

    pub(crate) fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

/// Kind-discriminated state carried by an [`Agent`].
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Trail-following forager.
    Forager(Forager),
    /// Predator with its pursuit tunables.
    Predator(PredatorTunables),
    /// Stationary colony.
    Colony(Colony),
}

impl Body {
    /// Kind tag of the body.
    #[must_use]
    pub const fn kind(&self) -> AgentKind {
        match self {
            Self::Forager(_) => AgentKind::Forager,
            Self::Predator(_) => AgentKind::Predator,
            Self::Colony(_) => AgentKind::Colony,
        }
    }
}

/// Forager-specific state.
#[derive(Clone, Debug, PartialEq)]
pub struct Forager {
    tunables: ForagerTunables,
    activity: ActivityState,
    aggression: AggressionState,
    colony_target: Option<CellCoord>,
}

impl Forager {
    pub(crate) fn new(tunables: ForagerTunables, colony_target: Option<CellCoord>) -> Self {
        Self {
            tunables,
            activity: ActivityState::default(),
            aggression: AggressionState::default(),
            colony_target,
        }
    }

    /// Tunables the forager was spawned with.
    #[must_use]
    pub const fn tunables(&self) -> &ForagerTunables {
        &self.tunables
    }

    /// Current activity state.
    #[must_use]
    pub const fn activity(&self) -> ActivityState {
        self.activity
    }

    /// Current aggression state.
    #[must_use]
    pub const fn aggression(&self) -> AggressionState {
        self.aggression
    }

    /// Location of the colony nearest to the spawn cell, captured once.
    #[must_use]
    pub const fn colony_target(&self) -> Option<CellCoord> {
        self.colony_target
    }

    pub(crate) fn set_state(&mut self, activity: ActivityState, aggression: AggressionState) {
        self.activity = activity;
        self.aggression = aggression;
    }
}

/// Colony-specific state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Colony {
    kind: ColonyKind,
    size: u32,
}

impl Colony {
    pub(crate) const fn new(kind: ColonyKind, size: u32) -> Self {
        Self { kind, size }
    }

    /// Subtype of the colony.
    #[must_use]
    pub const fn kind(&self) -> ColonyKind {
        self.kind
    }

    /// Size counter.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }
}

/// Registry that stores agents and manages identifier allocation.
#[derive(Clone, Debug, Default)]
pub struct AgentRegistry {
    entries: BTreeMap<AgentId, Agent>,
    next_id: u32,
}

impl AgentRegistry {
    /// Looks up an agent by identifier.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.entries.get(&id)
    }

    /// Number of live agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no agent is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every live agent ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.entries.values()
    }

    /// Every live agent of the provided kind, ordered by identifier.
    pub fn all_of_kind(&self, kind: AgentKind) -> impl Iterator<Item = &Agent> {
        self.entries.values().filter(move |agent| agent.kind() == kind)
    }

    /// Reports whether a forager or predator stands on the cell.
    #[must_use]
    pub fn is_animal_in_cell(&self, field: &SpatialField, cell: CellCoord) -> bool {
        field
            .occupants(cell)
            .iter()
            .filter_map(|id| self.entries.get(id))
            .any(|agent| agent.kind().is_animal())
    }

    /// Counts agents of `kind` standing within `radius` of `cell`, the cell
    /// itself included.
    #[must_use]
    pub fn count_of_kind_in_radius(
        &self,
        field: &SpatialField,
        cell: CellCoord,
        radius: u32,
        kind: AgentKind,
    ) -> u32 {
        let mut count = 0u32;
        for neighbor in field.moore_neighborhood(cell, radius, true) {
            for id in field.occupants(neighbor) {
                if self.entries.get(id).is_some_and(|agent| agent.kind() == kind) {
                    count = count.saturating_add(1);
                }
            }
        }
        count
    }

    /// Nearest agent of `kind` other than `from`, or `None` when the grid
    /// holds no such agent.
    #[must_use]
    pub fn nearest_of_kind(
        &self,
        field: &SpatialField,
        from: AgentId,
        kind: AgentKind,
    ) -> Option<&Agent> {
        let origin = self.entries.get(&from)?.cell;
        self.nearest_of_kind_from(field, origin, Some(from), kind)
    }

    /// Nearest agent of `kind` to `origin`, skipping `exclude`.
    ///
    /// Scans the origin cell first, then rings of growing Chebyshev radius in
    /// neighbourhood order, and returns the first match.
    #[must_use]
    pub fn nearest_of_kind_from(
        &self,
        field: &SpatialField,
        origin: CellCoord,
        exclude: Option<AgentId>,
        kind: AgentKind,
    ) -> Option<&Agent> {
        for radius in 0..=field.max_scan_radius() {
            for cell in field.ring(origin, radius) {
                let found = field
                    .occupants(cell)
                    .iter()
                    .filter(|id| Some(**id) != exclude)
                    .filter_map(|id| self.entries.get(id))
                    .find(|agent| agent.kind() == kind);
                if found.is_some() {
                    return found;
                }
            }
        }
        None
    }

    pub(crate) fn insert(&mut self, cell: CellCoord, body: Body) -> AgentId {
        let id = AgentId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let _ = self.entries.insert(id, Agent { id, cell, body });
        id
    }

    pub(crate) fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_id = 0;
    }
}
