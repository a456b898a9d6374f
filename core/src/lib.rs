#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lasius colony simulation.
//!
//! This crate defines the vocabulary that connects the authoritative world,
//! the pure decision systems, and the scheduler that drives them. Systems
//! observe the world through read-only queries and express every desired
//! mutation as a [`Command`]. The world executes commands through its `apply`
//! entry point and reports what happened as [`Event`] values, which external
//! recorders may consume alongside the [`WorldSnapshot`] captured after a tick.

use serde::{Deserialize, Serialize};

mod aggression;
mod config;

pub use aggression::{
    AggressionConfig, AggressionDistribution, AggressionStrategy, AggressionTable,
    ActivityTableConfig, NestmateBounds, NestmateBucket, NestmateTableConfig, TableBucket,
    DISTRIBUTION_TOLERANCE,
};
pub use config::{
    ActivityBands, Band, ColonyConfig, ConfigError, ForagerTunables, GridConfig,
    PopulationConfig, PredatorTunables, SimulationConfig,
};

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Edge behaviour of the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Cells beyond the edge do not exist.
    Bounded,
    /// Opposite edges are stitched together.
    #[default]
    Toroidal,
}

/// Unique identifier assigned to an agent by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Discriminates the three families of entities living on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Trail-following ant, analogous to *L. niger*.
    Forager,
    /// Ant pursuing foragers, analogous to *F. japonica*.
    Predator,
    /// Stationary aphid colony tended by foragers.
    Colony,
}

impl AgentKind {
    /// Number of agent kinds, used to size kind-indexed tables.
    pub const COUNT: usize = 3;

    /// Every agent kind in table order.
    pub const ALL: [AgentKind; Self::COUNT] = [Self::Forager, Self::Predator, Self::Colony];

    /// Position of the kind inside kind-indexed tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Forager => 0,
            Self::Predator => 1,
            Self::Colony => 2,
        }
    }

    /// Reports whether agents of this kind block movement into their cell.
    #[must_use]
    pub const fn is_animal(self) -> bool {
        matches!(self, Self::Forager | Self::Predator)
    }
}

/// Identity tag separating the two colony subtypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColonyKind {
    /// Colony of *M. kuricola* aphids.
    MKuricola,
    /// Colony of *F. tropicalis* aphids.
    FTropicalis,
}

/// What a forager is currently doing.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    /// Travelling with no meaningful trail around.
    #[default]
    TravelSolo,
    /// Travelling along a faint trail.
    TravelLight,
    /// Travelling along an established trail.
    TravelMedium,
    /// Travelling along a saturated trail.
    TravelHeavy,
    /// Tending an *M. kuricola* colony.
    TendMk,
    /// Tending an *F. tropicalis* colony.
    TendFt,
}

impl ActivityState {
    /// Every activity state in table order.
    pub const ALL: [ActivityState; 6] = [
        Self::TravelSolo,
        Self::TravelLight,
        Self::TravelMedium,
        Self::TravelHeavy,
        Self::TendMk,
        Self::TendFt,
    ];

    /// Position of the state inside activity-keyed tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::TravelSolo => 0,
            Self::TravelLight => 1,
            Self::TravelMedium => 2,
            Self::TravelHeavy => 3,
            Self::TendMk => 4,
            Self::TendFt => 5,
        }
    }

    /// Tending state matching the provided colony subtype.
    #[must_use]
    pub const fn tending(kind: ColonyKind) -> Self {
        match kind {
            ColonyKind::MKuricola => Self::TendMk,
            ColonyKind::FTropicalis => Self::TendFt,
        }
    }

    /// Stable snake-case label used in reports and diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TravelSolo => "travel_solo",
            Self::TravelLight => "travel_light",
            Self::TravelMedium => "travel_medium",
            Self::TravelHeavy => "travel_heavy",
            Self::TendMk => "tend_mk",
            Self::TendFt => "tend_ft",
        }
    }
}

/// How a forager reacts to nearby predators.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AggressionState {
    /// No predator inside the threat radius.
    #[default]
    NoThreat,
    /// Runs away.
    Flee,
    /// Ignores the predator.
    NoResponse,
    /// Opens mandibles without engaging.
    WeakResponse,
    /// Bites lightly, then runs away.
    LightBiteFlee,
    /// Bites and holds.
    Bite,
    /// Bites and sprays formic acid.
    BiteAcid,
}

impl AggressionState {
    /// The six responses a threatened forager may draw, in distribution order.
    pub const RESPONSES: [AggressionState; 6] = [
        Self::Flee,
        Self::NoResponse,
        Self::WeakResponse,
        Self::LightBiteFlee,
        Self::Bite,
        Self::BiteAcid,
    ];

    /// Every aggression state, starting with [`AggressionState::NoThreat`].
    pub const ALL: [AggressionState; 7] = [
        Self::NoThreat,
        Self::Flee,
        Self::NoResponse,
        Self::WeakResponse,
        Self::LightBiteFlee,
        Self::Bite,
        Self::BiteAcid,
    ];

    /// Stable snake-case label used in reports and diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoThreat => "no_threat",
            Self::Flee => "flee",
            Self::NoResponse => "no_response",
            Self::WeakResponse => "weak_response",
            Self::LightBiteFlee => "light_bite_flee",
            Self::Bite => "bite",
            Self::BiteAcid => "bite_acid",
        }
    }
}

/// Everything the world needs to bring a new agent to life.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AgentSpec {
    /// A forager with its own tunables.
    Forager(ForagerTunables),
    /// A predator with its own tunables.
    Predator(PredatorTunables),
    /// A stationary colony.
    Colony {
        /// Subtype of the colony.
        kind: ColonyKind,
        /// Size counter carried for reporting.
        size: u32,
    },
}

impl AgentSpec {
    /// Kind of agent this describes.
    #[must_use]
    pub const fn kind(&self) -> AgentKind {
        match self {
            Self::Forager(_) => AgentKind::Forager,
            Self::Predator(_) => AgentKind::Predator,
            Self::Colony { .. } => AgentKind::Colony,
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the grid with an empty one of the provided shape.
    ConfigureGrid {
        /// Number of columns in the grid.
        width: u32,
        /// Number of rows in the grid.
        height: u32,
        /// Edge behaviour of the grid.
        topology: Topology,
    },
    /// Requests that a new agent be created at the provided cell.
    SpawnAgent {
        /// Cell the agent should occupy.
        cell: CellCoord,
        /// Description of the agent.
        spec: AgentSpec,
    },
    /// Requests that an agent relocate to the provided cell.
    MoveAgent {
        /// Agent attempting to move.
        agent: AgentId,
        /// Destination cell.
        to: CellCoord,
    },
    /// Lays one unit of trail pheromone on the provided cell.
    DepositPheromone {
        /// Cell receiving the deposit.
        cell: CellCoord,
    },
    /// Records a forager's freshly computed behavioural state.
    SetForagerState {
        /// Forager being updated.
        agent: AgentId,
        /// New activity state.
        activity: ActivityState,
        /// New aggression state.
        aggression: AggressionState,
    },
    /// Marks the beginning of a new tick.
    AdvanceTick,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Confirms that the grid was replaced.
    GridConfigured {
        /// Number of columns in the grid.
        width: u32,
        /// Number of rows in the grid.
        height: u32,
        /// Edge behaviour of the grid.
        topology: Topology,
    },
    /// Reports that a grid shape was refused and the previous grid kept.
    GridRejected {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
    /// Confirms that an agent was created.
    AgentSpawned {
        /// Identifier assigned to the agent.
        agent: AgentId,
        /// Kind of the new agent.
        kind: AgentKind,
        /// Cell the agent occupies.
        cell: CellCoord,
    },
    /// Reports that a spawn request was rejected.
    SpawnRejected {
        /// Kind of agent requested.
        kind: AgentKind,
        /// Requested cell.
        cell: CellCoord,
        /// Specific reason the spawn failed.
        reason: PlacementError,
    },
    /// Confirms that an agent moved between two cells.
    AgentMoved {
        /// Agent that moved.
        agent: AgentId,
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
    },
    /// Reports that a move request was rejected.
    MoveRejected {
        /// Agent that attempted to move.
        agent: AgentId,
        /// Requested destination.
        to: CellCoord,
        /// Specific reason the move failed.
        reason: MoveError,
    },
    /// Confirms a pheromone deposit and reports the resulting strength.
    PheromoneDeposited {
        /// Cell receiving the deposit.
        cell: CellCoord,
        /// Trail strength after the deposit.
        strength: u32,
    },
    /// Reports that a deposit request was rejected.
    DepositRejected {
        /// Requested cell.
        cell: CellCoord,
    },
    /// Confirms that a forager's behavioural state was recorded.
    ForagerStateChanged {
        /// Forager that was updated.
        agent: AgentId,
        /// Activity state after the update.
        activity: ActivityState,
        /// Aggression state after the update.
        aggression: AggressionState,
    },
    /// Announces the start of a new tick.
    TickStarted {
        /// One-based index of the tick.
        tick: u64,
    },
}

/// Reasons a spawn request may be rejected by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum PlacementError {
    /// The requested cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// No empty cell remains for random placement.
    #[error("no empty cell remains on the grid")]
    GridFull,
}

/// Reasons a move request may be rejected by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum MoveError {
    /// No agent with the provided identifier exists.
    #[error("agent does not exist")]
    UnknownAgent,
    /// The destination lies outside the grid.
    #[error("destination lies outside the grid")]
    OutOfBounds,
    /// Colonies never move.
    #[error("agent is stationary")]
    Stationary,
}

/// Kind-specific part of an [`AgentSnapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySnapshot {
    /// A forager and its behavioural state.
    Forager {
        /// Current activity state.
        activity: ActivityState,
        /// Current aggression state.
        aggression: AggressionState,
        /// Nearest colony captured at spawn, if any colony existed.
        colony_target: Option<CellCoord>,
    },
    /// A predator.
    Predator,
    /// A colony.
    Colony {
        /// Subtype of the colony.
        colony: ColonyKind,
        /// Size counter.
        size: u32,
    },
}

/// Immutable representation of a single agent used for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Identifier of the agent.
    pub id: AgentId,
    /// Cell currently occupied by the agent.
    pub cell: CellCoord,
    /// Kind-specific state.
    pub body: BodySnapshot,
}

impl AgentSnapshot {
    /// Kind of the captured agent.
    #[must_use]
    pub const fn kind(&self) -> AgentKind {
        match self.body {
            BodySnapshot::Forager { .. } => AgentKind::Forager,
            BodySnapshot::Predator => AgentKind::Predator,
            BodySnapshot::Colony { .. } => AgentKind::Colony,
        }
    }
}

/// Immutable representation of a pheromone mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PheromoneSnapshot {
    /// Cell holding the mark.
    pub cell: CellCoord,
    /// Accumulated trail strength.
    pub strength: u32,
}

/// Complete read-only picture of the world after a tick.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Number of completed ticks.
    pub tick: u64,
    /// Agents sorted by identifier.
    pub agents: Vec<AgentSnapshot>,
    /// Pheromone marks sorted by cell.
    pub pheromones: Vec<PheromoneSnapshot>,
}

impl WorldSnapshot {
    /// Iterator over agents of the provided kind.
    pub fn agents_of_kind(&self, kind: AgentKind) -> impl Iterator<Item = &AgentSnapshot> {
        self.agents.iter().filter(move |agent| agent.kind() == kind)
    }

    /// Sum of every mark's strength.
    #[must_use]
    pub fn total_pheromone(&self) -> u64 {
        self.pheromones
            .iter()
            .map(|mark| u64::from(mark.strength))
            .sum()
    }
}
