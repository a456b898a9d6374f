#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Forager state machine: activity classification followed by the threat
//! response draw.

use lasius_core::{
    ActivityBands, ActivityState, AgentId, AgentKind, AggressionState, AggressionTable,
    CellCoord, ColonyKind, Command, NestmateBucket, TableBucket,
};
use lasius_world::{query, Agent, Body, Forager, World};
use rand::RngCore;
use rand_distr::{Distribution, WeightedAliasIndex, WeightedError};
use thiserror::Error;

/// Failures raised while preparing the state machine.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BehaviorError {
    /// A validated aggression row still could not back a sampler.
    #[error("cannot sample {bucket}: {source}")]
    UnsampleableRow {
        /// Offending row.
        bucket: TableBucket,
        /// Error reported by the sampler.
        #[source]
        source: WeightedError,
    },
}

/// Pure activity classification.
///
/// Tending wins whenever a colony is nearby. Otherwise the rounded trail
/// strength of the neighbourhood selects a travel band.
#[must_use]
pub fn classify_activity(
    rounded_average: u32,
    colonies_nearby: u32,
    nearest_colony: Option<ColonyKind>,
    bands: &ActivityBands,
) -> ActivityState {
    match nearest_colony {
        Some(kind) if colonies_nearby > 0 => ActivityState::tending(kind),
        _ => bands.classify(rounded_average),
    }
}

/// Ceiling of the mean strength over marks surrounding `cell`.
///
/// Only the eight adjacent cells are read and only existing marks contribute.
/// Returns zero when none of them is marked.
#[must_use]
pub fn neighborhood_average(world: &World, cell: CellCoord) -> u32 {
    let pheromones = query::pheromones(world);
    let (sum, count) = query::field(world)
        .moore_neighborhood(cell, 1, false)
        .into_iter()
        .filter_map(|neighbor| pheromones.mark_at(neighbor))
        .fold((0u64, 0u64), |(sum, count), strength| {
            (sum + u64::from(strength), count + 1)
        });
    if count == 0 {
        return 0;
    }
    u32::try_from(sum.div_ceil(count)).unwrap_or(u32::MAX)
}

/// Categorical samplers built once per aggression table row.
#[derive(Clone, Debug)]
pub struct AggressionSampler {
    by_activity: [WeightedAliasIndex<f64>; 6],
    by_nestmates: [WeightedAliasIndex<f64>; 4],
}

impl AggressionSampler {
    /// Prepares a sampler for every row of the table.
    pub fn new(table: &AggressionTable) -> Result<Self, BehaviorError> {
        let activity = |state: ActivityState| row_sampler(table, TableBucket::Activity(state));
        let nestmates = |bucket: NestmateBucket| row_sampler(table, TableBucket::Nestmates(bucket));
        Ok(Self {
            by_activity: [
                activity(ActivityState::TravelSolo)?,
                activity(ActivityState::TravelLight)?,
                activity(ActivityState::TravelMedium)?,
                activity(ActivityState::TravelHeavy)?,
                activity(ActivityState::TendMk)?,
                activity(ActivityState::TendFt)?,
            ],
            by_nestmates: [
                nestmates(NestmateBucket::Alone)?,
                nestmates(NestmateBucket::Few)?,
                nestmates(NestmateBucket::Several)?,
                nestmates(NestmateBucket::Crowd)?,
            ],
        })
    }

    /// Draws one threat response from the row keyed by `bucket`.
    pub fn sample(&self, bucket: TableBucket, rng: &mut dyn RngCore) -> AggressionState {
        let sampler = match bucket {
            TableBucket::Activity(state) => &self.by_activity[state.index()],
            TableBucket::Nestmates(bucket) => &self.by_nestmates[bucket.index()],
        };
        // Rows hold one weight per response, so the drawn index is in range.
        AggressionState::RESPONSES[sampler.sample(rng)]
    }
}

fn row_sampler(
    table: &AggressionTable,
    bucket: TableBucket,
) -> Result<WeightedAliasIndex<f64>, BehaviorError> {
    WeightedAliasIndex::new(table.row(bucket).to_vec())
        .map_err(|source| BehaviorError::UnsampleableRow { bucket, source })
}

/// Per-forager state update run after every movement attempt.
#[derive(Clone, Debug)]
pub struct Behavior {
    bands: ActivityBands,
    table: AggressionTable,
    sampler: AggressionSampler,
}

impl Behavior {
    /// Creates the state machine from validated configuration.
    pub fn new(bands: ActivityBands, table: AggressionTable) -> Result<Self, BehaviorError> {
        let sampler = AggressionSampler::new(&table)?;
        Ok(Self {
            bands,
            table,
            sampler,
        })
    }

    /// Recomputes activity then aggression for a forager and emits the result.
    ///
    /// Agents that are not foragers are ignored.
    pub fn update(
        &self,
        world: &World,
        agent: AgentId,
        rng: &mut dyn RngCore,
        out: &mut Vec<Command>,
    ) {
        let Some(ant) = query::agent(world, agent) else {
            return;
        };
        let Body::Forager(forager) = ant.body() else {
            return;
        };
        let activity = self.activity_for(world, ant, forager);
        let aggression = self.aggression_for(world, ant, forager, activity, rng);
        tracing::trace!(
            agent = agent.get(),
            activity = activity.label(),
            aggression = aggression.label(),
            "forager state"
        );
        out.push(Command::SetForagerState {
            agent,
            activity,
            aggression,
        });
    }

    /// Activity the forager would take in the current world.
    #[must_use]
    pub fn activity_for(&self, world: &World, ant: &Agent, forager: &Forager) -> ActivityState {
        let cell = ant.cell();
        let radius = forager.tunables().tending_radius;
        let colonies = query::count_of_kind_in_radius(world, cell, radius, AgentKind::Colony);
        let nearest = if colonies > 0 {
            query::nearest_of_kind(world, ant.id(), AgentKind::Colony).and_then(|colony| {
                match colony.body() {
                    Body::Colony(colony) => Some(colony.kind()),
                    _ => None,
                }
            })
        } else {
            None
        };
        classify_activity(
            neighborhood_average(world, cell),
            colonies,
            nearest,
            &self.bands,
        )
    }

    /// Threat response of the forager, drawing only when a predator is near.
    pub fn aggression_for(
        &self,
        world: &World,
        ant: &Agent,
        forager: &Forager,
        activity: ActivityState,
        rng: &mut dyn RngCore,
    ) -> AggressionState {
        let tunables = forager.tunables();
        let cell = ant.cell();
        let threats =
            query::count_of_kind_in_radius(world, cell, tunables.threat_radius, AgentKind::Predator);
        if threats == 0 {
            return AggressionState::NoThreat;
        }
        let nestmates = query::count_of_kind_in_radius(
            world,
            cell,
            tunables.nestmate_radius,
            AgentKind::Forager,
        )
        .saturating_sub(1);
        let bucket = self.table.bucket_for(activity, nestmates);
        self.sampler.sample(bucket, rng)
    }
}
