#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-kind movement policies that turn local observations into move commands.
//!
//! Each agent kind owns one entry in a dispatch table. A policy scores the
//! radius-one Moore neighbourhood of the agent, draws a single candidate in
//! proportion to those scores and emits the resulting commands. Policies never
//! mutate the world directly.

use std::fmt;

use lasius_core::{AgentId, AgentKind, CellCoord, Command};
use lasius_world::{query, Agent, Body, Forager, SpatialField, World};
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng, RngCore,
};

/// Signature shared by every entry of the movement dispatch table.
pub type PolicyFn = fn(&World, &Agent, &mut dyn RngCore, &mut Vec<Command>);

/// Kind-indexed movement dispatcher.
#[derive(Clone)]
pub struct Movement {
    policies: [PolicyFn; AgentKind::COUNT],
}

impl Movement {
    /// Creates a dispatcher populated with the stock policy for every kind.
    #[must_use]
    pub fn new() -> Self {
        let mut policies: [PolicyFn; AgentKind::COUNT] = [stationary_policy; AgentKind::COUNT];
        policies[AgentKind::Forager.index()] = forager_policy;
        policies[AgentKind::Predator.index()] = predator_policy;
        policies[AgentKind::Colony.index()] = stationary_policy;
        Self { policies }
    }

    /// Replaces the policy used for `kind`.
    #[must_use]
    pub fn with_policy(mut self, kind: AgentKind, policy: PolicyFn) -> Self {
        self.policies[kind.index()] = policy;
        self
    }

    /// Runs the policy registered for the agent's kind.
    ///
    /// Unknown agents emit nothing.
    pub fn decide(
        &self,
        world: &World,
        agent: AgentId,
        rng: &mut dyn RngCore,
        out: &mut Vec<Command>,
    ) {
        let Some(agent) = query::agent(world, agent) else {
            return;
        };
        let policy = self.policies[agent.kind().index()];
        policy(world, agent, rng, out);
    }
}

impl fmt::Debug for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Movement")
            .field("kinds", &AgentKind::ALL)
            .finish_non_exhaustive()
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new()
    }
}

/// Candidate destinations paired with their unnormalised weights.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidates {
    cells: Vec<CellCoord>,
    weights: Vec<f64>,
}

impl Candidates {
    /// Candidate cells in neighbourhood order.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Weight assigned to each candidate.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Draws one candidate in proportion to its weight.
    ///
    /// Returns `None` without consuming randomness when every weight is zero.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<CellCoord> {
        weighted_choice(&self.weights, rng).and_then(|index| self.cells.get(index).copied())
    }

    fn nearest_to(&self, field: &SpatialField, target: CellCoord) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, cell) in self.cells.iter().enumerate() {
            let distance = field.distance(*cell, target);
            if best.map_or(true, |(_, closest)| distance < closest) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }

    fn boost_nearest(&mut self, field: &SpatialField, target: CellCoord, bonus: f64) {
        if let Some(index) = self.nearest_to(field, target) {
            if let Some(weight) = self.weights.get_mut(index) {
                if *weight > 0.0 {
                    *weight += bonus;
                }
            }
        }
    }

    fn max_weight(&self) -> f64 {
        self.weights.iter().copied().fold(0.0, f64::max)
    }
}

/// Selects an index with probability proportional to its weight.
///
/// Returns `None` when the slice is empty or every weight is zero, in which
/// case no randomness is consumed.
pub fn weighted_choice<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    if !weights.iter().any(|weight| *weight > 0.0) {
        return None;
    }
    let distribution = WeightedIndex::new(weights).ok()?;
    Some(distribution.sample(rng))
}

/// Scores the neighbourhood of a forager.
///
/// Cells holding an animal score zero. Marked cells score the trail strength
/// scaled by the pheromone weight, unmarked cells score one. Scores at or
/// above the loop threshold are halved, then the candidate closest to the
/// colony target gains the largest score scaled by the colony weight.
#[must_use]
pub fn forager_weights(world: &World, agent: &Agent, forager: &Forager) -> Candidates {
    let field = query::field(world);
    let pheromones = query::pheromones(world);
    let tunables = forager.tunables();
    let cells = field.moore_neighborhood(agent.cell(), 1, false);

    let weights = cells
        .iter()
        .map(|cell| {
            if query::is_animal_in_cell(world, *cell) {
                return 0.0;
            }
            let weight = match pheromones.mark_at(*cell) {
                Some(strength) if tunables.pheromone_weight > 0.0 => {
                    tunables.pheromone_weight * f64::from(strength)
                }
                _ => 1.0,
            };
            if weight >= tunables.loop_threshold {
                weight / 2.0
            } else {
                weight
            }
        })
        .collect();

    let mut candidates = Candidates { cells, weights };
    if let Some(target) = forager.colony_target() {
        let bonus = candidates.max_weight() * tunables.colony_weight;
        candidates.boost_nearest(field, target, bonus);
    }
    candidates
}

/// Scores the neighbourhood of a predator.
///
/// Free cells score one, occupied cells zero, and the free candidate closest
/// to the nearest forager gains the pursuit bonus.
#[must_use]
pub fn predator_weights(world: &World, agent: &Agent, pursuit_bonus: f64) -> Candidates {
    let field = query::field(world);
    let cells = field.moore_neighborhood(agent.cell(), 1, false);
    let weights = cells
        .iter()
        .map(|cell| {
            if query::is_animal_in_cell(world, *cell) {
                0.0
            } else {
                1.0
            }
        })
        .collect();

    let mut candidates = Candidates { cells, weights };
    if let Some(prey) = query::nearest_of_kind(world, agent.id(), AgentKind::Forager) {
        candidates.boost_nearest(field, prey.cell(), pursuit_bonus);
    }
    candidates
}

fn forager_policy(world: &World, agent: &Agent, rng: &mut dyn RngCore, out: &mut Vec<Command>) {
    let Some(forager) = agent.as_forager() else {
        return;
    };
    let candidates = forager_weights(world, agent, forager);
    out.push(Command::DepositPheromone { cell: agent.cell() });
    match candidates.draw(rng) {
        Some(to) => {
            tracing::trace!(agent = agent.id().get(), ?to, "forager moves");
            out.push(Command::MoveAgent {
                agent: agent.id(),
                to,
            });
        }
        None => tracing::trace!(agent = agent.id().get(), "forager boxed in"),
    }
}

fn predator_policy(world: &World, agent: &Agent, rng: &mut dyn RngCore, out: &mut Vec<Command>) {
    let Body::Predator(tunables) = agent.body() else {
        return;
    };
    let candidates = predator_weights(world, agent, tunables.pursuit_bonus);
    if let Some(to) = candidates.draw(rng) {
        tracing::trace!(agent = agent.id().get(), ?to, "predator moves");
        out.push(Command::MoveAgent {
            agent: agent.id(),
            to,
        });
    }
}

fn stationary_policy(_: &World, _: &Agent, _: &mut dyn RngCore, _: &mut Vec<Command>) {}
