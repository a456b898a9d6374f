#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Step scheduler that drives the simulation one tick at a time.
//!
//! Every tick activates each live agent exactly once in a freshly shuffled
//! order. An activation runs the movement policy, commits its commands, then
//! runs the forager state machine against the updated world. Later
//! activations observe every earlier commit of the same tick.

mod census;

pub use census::Census;

use lasius_core::{
    AgentId, AgentKind, AgentSpec, CellCoord, ColonyKind, Command, ConfigError, Event,
    PlacementError, SimulationConfig, WorldSnapshot,
};
use lasius_system_behavior::{Behavior, BehaviorError};
use lasius_system_movement::Movement;
use lasius_world::{self as world, query, World};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Failures that prevent a simulation from starting.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The state machine could not be prepared.
    #[error(transparent)]
    Behavior(#[from] BehaviorError),
    /// The requested population does not fit on the grid.
    #[error("{requested} agents do not fit on a grid of {capacity} cells")]
    Capacity {
        /// Agents requested by the configuration.
        requested: u64,
        /// Cells available on the grid.
        capacity: u64,
    },
    /// Random placement found no vacant cell left.
    #[error("cannot place {kind:?}: {}", PlacementError::GridFull)]
    GridFull {
        /// Kind of agent being placed.
        kind: AgentKind,
    },
    /// The world answered a spawn with neither an agent nor a rejection.
    #[error("spawn of {kind:?} at {cell:?} was not acknowledged by the world")]
    SpawnUnacknowledged {
        /// Kind of agent being placed.
        kind: AgentKind,
        /// Requested cell.
        cell: CellCoord,
    },
    /// The world refused to place an agent.
    #[error("cannot place {kind:?} at {cell:?}: {reason}")]
    Placement {
        /// Kind of agent being placed.
        kind: AgentKind,
        /// Requested cell.
        cell: CellCoord,
        /// Reason reported by the world.
        reason: PlacementError,
    },
}

/// Explicitly positioned agent used by [`Simulation::with_placements`].
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Cell the agent starts on.
    pub cell: CellCoord,
    /// Agent description.
    pub spec: AgentSpec,
}

impl Placement {
    /// Creates a placement.
    #[must_use]
    pub const fn new(cell: CellCoord, spec: AgentSpec) -> Self {
        Self { cell, spec }
    }
}

/// Running simulation: world, systems and the single random source.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    movement: Movement,
    behavior: Behavior,
    rng: ChaCha8Rng,
    config: SimulationConfig,
}

impl Simulation {
    /// Validates the configuration and scatters the population at random.
    ///
    /// Colonies are placed first (M. kuricola then F. tropicalis), then
    /// predators, then foragers, each on a uniformly drawn vacant cell.
    pub fn initialize(config: SimulationConfig) -> Result<Self, SimulationError> {
        let mut simulation = Self::prepare(config)?;
        let requested = simulation.config.population.total();
        let capacity = u64::from(simulation.config.grid.width)
            * u64::from(simulation.config.grid.height);
        if requested > capacity {
            return Err(SimulationError::Capacity {
                requested,
                capacity,
            });
        }

        let population = simulation.config.population;
        let colony_size = simulation.config.colony.initial_size;
        let forager = simulation.config.forager;
        let predator = simulation.config.predator;
        let batches = [
            (
                population.mk_colonies,
                AgentSpec::Colony {
                    kind: ColonyKind::MKuricola,
                    size: colony_size,
                },
            ),
            (
                population.ft_colonies,
                AgentSpec::Colony {
                    kind: ColonyKind::FTropicalis,
                    size: colony_size,
                },
            ),
            (population.predators, AgentSpec::Predator(predator)),
            (population.foragers, AgentSpec::Forager(forager)),
        ];
        for (count, spec) in batches {
            for _ in 0..count {
                let _ = simulation.scatter(spec)?;
            }
        }

        tracing::info!(
            seed = simulation.config.seed,
            width = simulation.config.grid.width,
            height = simulation.config.grid.height,
            agents = query::registry(&simulation.world).len(),
            "simulation initialized"
        );
        Ok(simulation)
    }

    /// Validates the configuration and places agents exactly where requested.
    ///
    /// Population counts in the configuration are ignored.
    pub fn with_placements(
        config: SimulationConfig,
        placements: Vec<Placement>,
    ) -> Result<Self, SimulationError> {
        let mut simulation = Self::prepare(config)?;
        for placement in placements {
            let _ = simulation.spawn(placement.cell, placement.spec)?;
        }
        tracing::info!(
            seed = simulation.config.seed,
            agents = query::registry(&simulation.world).len(),
            "simulation initialized from explicit placements"
        );
        Ok(simulation)
    }

    /// Advances the simulation by one tick and returns the events it produced.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::AdvanceTick, &mut events);

        let mut order = query::agent_ids(&self.world);
        order.shuffle(&mut self.rng);

        let mut commands = Vec::new();
        for agent in order {
            self.movement
                .decide(&self.world, agent, &mut self.rng, &mut commands);
            self.commit(&mut commands, &mut events);
            self.behavior
                .update(&self.world, agent, &mut self.rng, &mut commands);
            self.commit(&mut commands, &mut events);
        }

        tracing::debug!(
            tick = query::tick(&self.world),
            events = events.len(),
            total_pheromone = query::pheromones(&self.world).total_strength(),
            "tick completed"
        );
        events
    }

    /// Runs `ticks` ticks and returns every event in order.
    pub fn run(&mut self, ticks: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(self.tick());
        }
        events
    }

    /// Captures every agent and pheromone mark.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        query::snapshot(&self.world)
    }

    /// Aggregates population and forager states.
    #[must_use]
    pub fn census(&self) -> Census {
        Census::of(&self.world)
    }

    /// Read-only access to the world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Configuration the simulation was started with.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn prepare(config: SimulationConfig) -> Result<Self, SimulationError> {
        let table = config.validate()?;
        let behavior = Behavior::new(config.activity, table)?;
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::ConfigureGrid {
                width: config.grid.width,
                height: config.grid.height,
                topology: config.grid.topology,
            },
            &mut events,
        );
        Ok(Self {
            world,
            movement: Movement::default(),
            behavior,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        })
    }

    fn scatter(&mut self, spec: AgentSpec) -> Result<AgentId, SimulationError> {
        let vacant = query::field(&self.world).vacant_cells();
        if vacant.is_empty() {
            return Err(SimulationError::GridFull { kind: spec.kind() });
        }
        let cell = vacant[self.rng.gen_range(0..vacant.len())];
        self.spawn(cell, spec)
    }

    fn spawn(&mut self, cell: CellCoord, spec: AgentSpec) -> Result<AgentId, SimulationError> {
        let kind = spec.kind();
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::SpawnAgent { cell, spec }, &mut events);
        for event in events {
            match event {
                Event::AgentSpawned { agent, .. } => return Ok(agent),
                Event::SpawnRejected { reason, .. } => {
                    return Err(SimulationError::Placement { kind, cell, reason })
                }
                _ => {}
            }
        }
        Err(SimulationError::SpawnUnacknowledged { kind, cell })
    }

    fn commit(&mut self, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }
    }
}
