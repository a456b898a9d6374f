#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Lasius foraging simulation.
//!
//! The world owns the spatial field, the pheromone layer and the agent
//! registry. It is mutated exclusively through [`apply`] and read through the
//! [`query`] module.

mod field;
mod pheromone;
mod registry;

pub use field::SpatialField;
pub use pheromone::PheromoneLayer;
pub use registry::{Agent, AgentRegistry, Body, Colony, Forager};

use lasius_core::{
    AgentId, AgentKind, AgentSpec, CellCoord, Command, Event, GridConfig, MoveError,
    PlacementError,
};

/// Represents the authoritative simulation world state.
#[derive(Clone, Debug)]
pub struct World {
    field: SpatialField,
    pheromones: PheromoneLayer,
    registry: AgentRegistry,
    tick: u64,
}

impl World {
    /// Creates an empty world on the default grid.
    #[must_use]
    pub fn new() -> Self {
        let grid = GridConfig::default();
        Self {
            field: SpatialField::new(grid.width, grid.height, grid.topology),
            pheromones: PheromoneLayer::default(),
            registry: AgentRegistry::default(),
            tick: 0,
        }
    }

    fn spawn(&mut self, cell: CellCoord, spec: AgentSpec) -> Result<AgentId, PlacementError> {
        if !self.field.contains(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        let body = match spec {
            AgentSpec::Forager(tunables) => {
                let colony_target = self
                    .registry
                    .nearest_of_kind_from(&self.field, cell, None, AgentKind::Colony)
                    .map(Agent::cell);
                Body::Forager(Forager::new(tunables, colony_target))
            }
            AgentSpec::Predator(tunables) => Body::Predator(tunables),
            AgentSpec::Colony { kind, size } => Body::Colony(Colony::new(kind, size)),
        };
        let agent = self.registry.insert(cell, body);
        self.field.place(agent, cell)?;
        Ok(agent)
    }

    fn relocate(&mut self, agent: AgentId, to: CellCoord) -> Result<CellCoord, MoveError> {
        let current = self.registry.get(agent).ok_or(MoveError::UnknownAgent)?;
        if !current.kind().is_animal() {
            return Err(MoveError::Stationary);
        }
        let from = current.cell();
        self.field.relocate(agent, from, to)?;
        if let Some(moving) = self.registry.get_mut(agent) {
            moving.set_cell(to);
        }
        Ok(from)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid {
            width,
            height,
            topology,
        } => {
            let grid = GridConfig {
                width,
                height,
                topology,
            };
            if let Err(reason) = grid.validate() {
                tracing::warn!(width, height, %reason, "grid rejected");
                out_events.push(Event::GridRejected { width, height });
                return;
            }
            world.field = SpatialField::new(width, height, topology);
            world.pheromones.clear();
            world.registry.clear();
            world.tick = 0;
            out_events.push(Event::GridConfigured {
                width,
                height,
                topology,
            });
        }
        Command::SpawnAgent { cell, spec } => {
            let kind = spec.kind();
            match world.spawn(cell, spec) {
                Ok(agent) => out_events.push(Event::AgentSpawned { agent, kind, cell }),
                Err(reason) => {
                    tracing::warn!(?kind, ?cell, %reason, "spawn rejected");
                    out_events.push(Event::SpawnRejected { kind, cell, reason });
                }
            }
        }
        Command::MoveAgent { agent, to } => match world.relocate(agent, to) {
            Ok(from) => out_events.push(Event::AgentMoved { agent, from, to }),
            Err(reason) => {
                tracing::warn!(agent = agent.get(), ?to, %reason, "move rejected");
                out_events.push(Event::MoveRejected { agent, to, reason });
            }
        },
        Command::DepositPheromone { cell } => {
            if world.field.contains(cell) {
                let strength = world.pheromones.deposit(cell);
                out_events.push(Event::PheromoneDeposited { cell, strength });
            } else {
                tracing::warn!(?cell, "deposit rejected outside the grid");
                out_events.push(Event::DepositRejected { cell });
            }
        }
        Command::SetForagerState {
            agent,
            activity,
            aggression,
        } => {
            let forager = world
                .registry
                .get_mut(agent)
                .and_then(|entry| match entry.body_mut() {
                    Body::Forager(forager) => Some(forager),
                    _ => None,
                });
            match forager {
                Some(forager) => {
                    forager.set_state(activity, aggression);
                    out_events.push(Event::ForagerStateChanged {
                        agent,
                        activity,
                        aggression,
                    });
                }
                None => {
                    tracing::warn!(agent = agent.get(), "state update ignored for non-forager");
                }
            }
        }
        Command::AdvanceTick => {
            world.tick = world.tick.saturating_add(1);
            out_events.push(Event::TickStarted { tick: world.tick });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Agent, AgentRegistry, PheromoneLayer, SpatialField, World};
    use lasius_core::{AgentId, AgentKind, CellCoord, WorldSnapshot};

    /// Provides read-only access to the spatial field.
    #[must_use]
    pub fn field(world: &World) -> &SpatialField {
        &world.field
    }

    /// Provides read-only access to the pheromone layer.
    #[must_use]
    pub fn pheromones(world: &World) -> &PheromoneLayer {
        &world.pheromones
    }

    /// Provides read-only access to the agent registry.
    #[must_use]
    pub fn registry(world: &World) -> &AgentRegistry {
        &world.registry
    }

    /// Number of ticks started since the grid was configured.
    #[must_use]
    pub fn tick(world: &World) -> u64 {
        world.tick
    }

    /// Looks up a single agent.
    #[must_use]
    pub fn agent(world: &World, id: AgentId) -> Option<&Agent> {
        world.registry.get(id)
    }

    /// Identifiers of every live agent in ascending order.
    #[must_use]
    pub fn agent_ids(world: &World) -> Vec<AgentId> {
        world.registry.iter().map(Agent::id).collect()
    }

    /// Reports whether a forager or predator stands on the cell.
    #[must_use]
    pub fn is_animal_in_cell(world: &World, cell: CellCoord) -> bool {
        world.registry.is_animal_in_cell(&world.field, cell)
    }

    /// Nearest agent of `kind` other than `from`; `None` when there is none.
    #[must_use]
    pub fn nearest_of_kind(world: &World, from: AgentId, kind: AgentKind) -> Option<&Agent> {
        world.registry.nearest_of_kind(&world.field, from, kind)
    }

    /// Counts agents of `kind` within `radius` of `cell`, the cell included.
    #[must_use]
    pub fn count_of_kind_in_radius(
        world: &World,
        cell: CellCoord,
        radius: u32,
        kind: AgentKind,
    ) -> u32 {
        world
            .registry
            .count_of_kind_in_radius(&world.field, cell, radius, kind)
    }

    /// Every live agent of `kind`, ordered by identifier.
    #[must_use]
    pub fn all_of_kind(world: &World, kind: AgentKind) -> Vec<&Agent> {
        world.registry.all_of_kind(kind).collect()
    }

    /// Captures an immutable snapshot of every agent and pheromone mark.
    #[must_use]
    pub fn snapshot(world: &World) -> WorldSnapshot {
        WorldSnapshot {
            tick: world.tick,
            agents: world.registry.iter().map(Agent::snapshot).collect(),
            pheromones: world.pheromones.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lasius_core::{
        ActivityState, AggressionState, ColonyKind, ForagerTunables, PredatorTunables, Topology,
    };

    fn configured(width: u32, height: u32, topology: Topology) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureGrid {
                width,
                height,
                topology,
            },
            &mut events,
        );
        world
    }

    fn spawn(world: &mut World, cell: CellCoord, spec: AgentSpec) -> AgentId {
        let mut events = Vec::new();
        apply(world, Command::SpawnAgent { cell, spec }, &mut events);
        match events.as_slice() {
            [Event::AgentSpawned { agent, .. }] => *agent,
            other => panic!("unexpected spawn events: {other:?}"),
        }
    }

    fn forager() -> AgentSpec {
        AgentSpec::Forager(ForagerTunables::default())
    }

    #[test]
    fn configure_grid_resets_state() {
        let mut world = configured(5, 4, Topology::Bounded);
        let _ = spawn(&mut world, CellCoord::new(1, 1), forager());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DepositPheromone {
                cell: CellCoord::new(1, 1),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ConfigureGrid {
                width: 6,
                height: 6,
                topology: Topology::Toroidal,
            },
            &mut events,
        );

        assert!(query::registry(&world).is_empty());
        assert!(query::pheromones(&world).is_empty());
        assert_eq!(query::field(&world).width(), 6);
        assert_eq!(query::field(&world).topology(), Topology::Toroidal);
    }

    #[test]
    fn oversized_grid_keeps_the_previous_field() {
        let mut world = configured(5, 4, Topology::Bounded);
        let _ = spawn(&mut world, CellCoord::new(1, 1), forager());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureGrid {
                width: u32::MAX,
                height: u32::MAX,
                topology: Topology::Toroidal,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::GridRejected {
                width: u32::MAX,
                height: u32::MAX
            }]
        );
        assert_eq!(query::field(&world).width(), 5);
        assert_eq!(query::registry(&world).len(), 1);
    }

    #[test]
    fn spawn_outside_grid_is_rejected() {
        let mut world = configured(4, 4, Topology::Bounded);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnAgent {
                cell: CellCoord::new(4, 1),
                spec: forager(),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SpawnRejected {
                kind: AgentKind::Forager,
                cell: CellCoord::new(4, 1),
                reason: PlacementError::OutOfBounds,
            }]
        );
        assert!(query::registry(&world).is_empty());
    }

    #[test]
    fn forager_captures_nearest_colony_at_spawn() {
        let mut world = configured(10, 10, Topology::Bounded);
        let _ = spawn(
            &mut world,
            CellCoord::new(0, 0),
            AgentSpec::Colony {
                kind: ColonyKind::MKuricola,
                size: 20,
            },
        );
        let _ = spawn(
            &mut world,
            CellCoord::new(7, 6),
            AgentSpec::Colony {
                kind: ColonyKind::FTropicalis,
                size: 20,
            },
        );
        let ant = spawn(&mut world, CellCoord::new(6, 6), forager());

        let target = query::agent(&world, ant)
            .and_then(Agent::as_forager)
            .and_then(Forager::colony_target);
        assert_eq!(target, Some(CellCoord::new(7, 6)));
    }

    #[test]
    fn forager_without_colonies_has_no_target() {
        let mut world = configured(5, 5, Topology::Bounded);
        let ant = spawn(&mut world, CellCoord::new(2, 2), forager());
        let target = query::agent(&world, ant)
            .and_then(Agent::as_forager)
            .and_then(Forager::colony_target);
        assert_eq!(target, None);
    }

    #[test]
    fn moves_update_field_and_registry() {
        let mut world = configured(5, 5, Topology::Bounded);
        let ant = spawn(&mut world, CellCoord::new(2, 2), forager());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveAgent {
                agent: ant,
                to: CellCoord::new(3, 3),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::AgentMoved {
                agent: ant,
                from: CellCoord::new(2, 2),
                to: CellCoord::new(3, 3),
            }]
        );
        assert!(query::field(&world).is_vacant(CellCoord::new(2, 2)));
        assert!(query::is_animal_in_cell(&world, CellCoord::new(3, 3)));
        assert_eq!(
            query::agent(&world, ant).map(Agent::cell),
            Some(CellCoord::new(3, 3))
        );
    }

    #[test]
    fn colonies_reject_moves() {
        let mut world = configured(5, 5, Topology::Bounded);
        let colony = spawn(
            &mut world,
            CellCoord::new(1, 1),
            AgentSpec::Colony {
                kind: ColonyKind::FTropicalis,
                size: 20,
            },
        );
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveAgent {
                agent: colony,
                to: CellCoord::new(1, 2),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::MoveRejected {
                agent: colony,
                to: CellCoord::new(1, 2),
                reason: MoveError::Stationary,
            }]
        );
    }

    #[test]
    fn move_outside_grid_is_rejected_without_side_effects() {
        let mut world = configured(3, 3, Topology::Bounded);
        let ant = spawn(
            &mut world,
            CellCoord::new(2, 2),
            AgentSpec::Predator(PredatorTunables::default()),
        );
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveAgent {
                agent: ant,
                to: CellCoord::new(3, 2),
            },
            &mut events,
        );
        assert!(matches!(
            events.as_slice(),
            [Event::MoveRejected {
                reason: MoveError::OutOfBounds,
                ..
            }]
        ));
        assert_eq!(query::field(&world).occupants(CellCoord::new(2, 2)), &[ant]);
    }

    #[test]
    fn deposits_report_running_strength() {
        let mut world = configured(4, 4, Topology::Bounded);
        let cell = CellCoord::new(0, 3);
        let mut events = Vec::new();
        for _ in 0..3 {
            apply(&mut world, Command::DepositPheromone { cell }, &mut events);
        }
        assert_eq!(
            events.last(),
            Some(&Event::PheromoneDeposited { cell, strength: 3 })
        );
        assert_eq!(query::pheromones(&world).strength_at(cell), 3);
    }

    #[test]
    fn forager_state_is_recorded() {
        let mut world = configured(4, 4, Topology::Bounded);
        let ant = spawn(&mut world, CellCoord::new(1, 1), forager());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetForagerState {
                agent: ant,
                activity: ActivityState::TravelHeavy,
                aggression: AggressionState::Bite,
            },
            &mut events,
        );
        let forager = query::agent(&world, ant)
            .and_then(Agent::as_forager)
            .cloned()
            .expect("forager exists");
        assert_eq!(forager.activity(), ActivityState::TravelHeavy);
        assert_eq!(forager.aggression(), AggressionState::Bite);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn ticks_advance_and_snapshot_reports_them() {
        let mut world = configured(4, 4, Topology::Bounded);
        let mut events = Vec::new();
        apply(&mut world, Command::AdvanceTick, &mut events);
        apply(&mut world, Command::AdvanceTick, &mut events);
        assert_eq!(events.last(), Some(&Event::TickStarted { tick: 2 }));
        assert_eq!(query::snapshot(&world).tick, 2);
    }
}
