//! Aggregate population report.

use std::fmt;

use lasius_core::{ActivityState, AgentKind, AggressionState};
use lasius_world::{query, Agent, World};
use serde::Serialize;

/// Counts of agents and forager states at one point in time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Census {
    tick: u64,
    foragers: u32,
    predators: u32,
    colonies: u32,
    activity: [u32; 6],
    aggression: [u32; 7],
    pheromone_marks: usize,
    total_pheromone: u64,
}

impl Census {
    /// Tallies the current world.
    #[must_use]
    pub fn of(world: &World) -> Self {
        let count = |kind| u32::try_from(query::all_of_kind(world, kind).len()).unwrap_or(u32::MAX);
        let mut activity = [0u32; 6];
        let mut aggression = [0u32; 7];
        for forager in query::all_of_kind(world, AgentKind::Forager)
            .into_iter()
            .filter_map(Agent::as_forager)
        {
            activity[forager.activity().index()] += 1;
            if let Some(slot) = AggressionState::ALL
                .iter()
                .position(|state| *state == forager.aggression())
            {
                aggression[slot] += 1;
            }
        }
        let pheromones = query::pheromones(world);
        Self {
            tick: query::tick(world),
            foragers: count(AgentKind::Forager),
            predators: count(AgentKind::Predator),
            colonies: count(AgentKind::Colony),
            activity,
            aggression,
            pheromone_marks: pheromones.len(),
            total_pheromone: pheromones.total_strength(),
        }
    }

    /// Tick at which the census was taken.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of live agents of `kind`.
    #[must_use]
    pub const fn population(&self, kind: AgentKind) -> u32 {
        match kind {
            AgentKind::Forager => self.foragers,
            AgentKind::Predator => self.predators,
            AgentKind::Colony => self.colonies,
        }
    }

    /// Foragers currently in `state`.
    #[must_use]
    pub const fn activity(&self, state: ActivityState) -> u32 {
        self.activity[state.index()]
    }

    /// Foragers currently showing `state`.
    #[must_use]
    pub fn aggression(&self, state: AggressionState) -> u32 {
        AggressionState::ALL
            .iter()
            .position(|candidate| *candidate == state)
            .and_then(|slot| self.aggression.get(slot))
            .copied()
            .unwrap_or(0)
    }

    /// Number of marked cells.
    #[must_use]
    pub const fn pheromone_marks(&self) -> usize {
        self.pheromone_marks
    }

    /// Sum of every mark's strength.
    #[must_use]
    pub const fn total_pheromone(&self) -> u64 {
        self.total_pheromone
    }
}

impl fmt::Display for Census {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "tick {}: {} foragers, {} predators, {} colonies",
            self.tick, self.foragers, self.predators, self.colonies
        )?;
        writeln!(
            f,
            "pheromone: {} marks, total strength {}",
            self.pheromone_marks, self.total_pheromone
        )?;
        for state in ActivityState::ALL {
            writeln!(f, "  {:<16} {}", state.label(), self.activity(state))?;
        }
        for (index, state) in AggressionState::ALL.iter().enumerate() {
            let count = self.aggression.get(index).copied().unwrap_or(0);
            writeln!(f, "  {:<16} {}", state.label(), count)?;
        }
        Ok(())
    }
}
