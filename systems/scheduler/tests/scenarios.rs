use std::collections::{BTreeMap, HashSet};

use lasius_core::{
    AgentId, AgentKind, AgentSpec, AggressionState, CellCoord, ColonyKind, ConfigError, Event,
    ForagerTunables, GridConfig, PopulationConfig, PredatorTunables, SimulationConfig, Topology,
};
use lasius_system_scheduler::{Placement, Simulation, SimulationError};
use lasius_world::query;

fn bounded(width: u32, height: u32, seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed,
        grid: GridConfig {
            width,
            height,
            topology: Topology::Bounded,
        },
        ..SimulationConfig::default()
    }
}

fn forager_at(column: u32, row: u32) -> Placement {
    Placement::new(
        CellCoord::new(column, row),
        AgentSpec::Forager(ForagerTunables::default()),
    )
}

fn mixed_population(seed: u64) -> Simulation {
    Simulation::initialize(SimulationConfig {
        seed,
        grid: GridConfig {
            width: 16,
            height: 16,
            topology: Topology::Toroidal,
        },
        population: PopulationConfig {
            foragers: 60,
            predators: 6,
            mk_colonies: 2,
            ft_colonies: 2,
        },
        ..SimulationConfig::default()
    })
    .expect("valid configuration")
}

#[test]
fn lone_forager_deposits_once_per_tick() {
    let mut simulation =
        Simulation::with_placements(bounded(10, 10, 1), vec![forager_at(5, 5)])
            .expect("valid layout");
    for _ in 0..5 {
        let _ = simulation.tick();
    }
    let snapshot = simulation.snapshot();
    assert_eq!(snapshot.tick, 5);
    assert_eq!(snapshot.total_pheromone(), 5);
}

#[test]
fn unbiased_forager_follows_recorded_path() {
    let tunables = ForagerTunables {
        pheromone_weight: 0.0,
        colony_weight: 0.0,
        ..ForagerTunables::default()
    };
    let mut simulation = Simulation::with_placements(
        bounded(10, 10, 7),
        vec![Placement::new(
            CellCoord::new(5, 5),
            AgentSpec::Forager(tunables),
        )],
    )
    .expect("valid layout");

    let mut path = Vec::new();
    for _ in 0..6 {
        let _ = simulation.tick();
        let cell = query::all_of_kind(simulation.world(), AgentKind::Forager)
            .first()
            .expect("forager exists")
            .cell();
        path.push((cell.column(), cell.row()));
    }
    assert_eq!(path, vec![(4, 5), (3, 5), (4, 4), (5, 3), (5, 4), (4, 5)]);
}

#[test]
fn threat_radius_larger_than_grid_sees_every_predator() {
    let tunables = ForagerTunables {
        threat_radius: 20_000,
        nestmate_radius: 20_000,
        tending_radius: 20_000,
        ..ForagerTunables::default()
    };
    let config = SimulationConfig {
        grid: GridConfig {
            width: 10,
            height: 10,
            topology: Topology::Toroidal,
        },
        ..SimulationConfig::default()
    };
    let mut simulation = Simulation::with_placements(
        config,
        vec![
            Placement::new(CellCoord::new(2, 2), AgentSpec::Forager(tunables)),
            Placement::new(
                CellCoord::new(7, 7),
                AgentSpec::Predator(PredatorTunables::default()),
            ),
        ],
    )
    .expect("valid layout");

    let events = simulation.tick();
    let aggression = events
        .iter()
        .find_map(|event| match event {
            Event::ForagerStateChanged { aggression, .. } => Some(*aggression),
            _ => None,
        })
        .expect("forager state is updated every tick");
    assert_ne!(aggression, AggressionState::NoThreat);
}

#[test]
fn boxed_in_forager_stays_and_reinforces_its_cell() {
    let placements = (0..3)
        .flat_map(|column| (0..3).map(move |row| forager_at(column, row)))
        .collect();
    let mut simulation =
        Simulation::with_placements(bounded(3, 3, 2), placements).expect("valid layout");
    let center = CellCoord::new(1, 1);

    for tick in 1..=6u32 {
        let events = simulation.tick();
        assert!(
            !events
                .iter()
                .any(|event| matches!(event, Event::AgentMoved { .. })),
            "no forager can move on a full grid"
        );
        assert_eq!(
            query::pheromones(simulation.world()).strength_at(center),
            tick
        );
    }
}

#[test]
fn moves_only_reach_adjacent_cells() {
    let mut simulation = mixed_population(11);
    for _ in 0..30 {
        let mut moved = HashSet::new();
        for event in simulation.tick() {
            if let Event::AgentMoved { agent, from, to } = event {
                assert!(
                    query::field(simulation.world()).is_adjacent(from, to),
                    "agent {} jumped from {from:?} to {to:?}",
                    agent.get()
                );
                assert!(moved.insert(agent), "agent moved twice in one tick");
            }
        }
    }
}

#[test]
fn animals_never_step_onto_animals() {
    let mut simulation = mixed_population(23);
    for _ in 0..30 {
        let mut animals: BTreeMap<AgentId, CellCoord> = simulation
            .snapshot()
            .agents
            .iter()
            .filter(|agent| agent.kind() != AgentKind::Colony)
            .map(|agent| (agent.id, agent.cell))
            .collect();

        for event in simulation.tick() {
            if let Event::AgentMoved { agent, to, .. } = event {
                let blocked = animals
                    .iter()
                    .any(|(other, cell)| *other != agent && *cell == to);
                assert!(!blocked, "agent {} entered an occupied cell", agent.get());
                let _ = animals.insert(agent, to);
            }
        }
    }
}

#[test]
fn colonies_never_move() {
    let mut simulation = mixed_population(5);
    let before: Vec<_> = simulation
        .snapshot()
        .agents_of_kind(AgentKind::Colony)
        .cloned()
        .collect();
    let _ = simulation.run(20);
    let after: Vec<_> = simulation
        .snapshot()
        .agents_of_kind(AgentKind::Colony)
        .map(|agent| (agent.id, agent.cell))
        .collect();
    let before: Vec<_> = before.iter().map(|agent| (agent.id, agent.cell)).collect();
    assert_eq!(before, after);
}

#[test]
fn pheromone_strength_never_decreases() {
    let mut simulation = mixed_population(31);
    let mut previous: BTreeMap<CellCoord, u32> = BTreeMap::new();
    for _ in 0..25 {
        let _ = simulation.tick();
        let current: BTreeMap<CellCoord, u32> = simulation
            .snapshot()
            .pheromones
            .iter()
            .map(|mark| (mark.cell, mark.strength))
            .collect();
        for (cell, strength) in &previous {
            let now = current.get(cell).copied().unwrap_or(0);
            assert!(now >= *strength, "mark at {cell:?} weakened");
        }
        previous = current;
    }
}

#[test]
fn repeat_deposits_add_exactly_one() {
    let mut simulation = mixed_population(8);
    for _ in 0..10 {
        let mut strengths: BTreeMap<CellCoord, u32> = simulation
            .snapshot()
            .pheromones
            .iter()
            .map(|mark| (mark.cell, mark.strength))
            .collect();
        for event in simulation.tick() {
            if let Event::PheromoneDeposited { cell, strength } = event {
                let before = strengths.get(&cell).copied().unwrap_or(0);
                assert_eq!(strength, before + 1);
                let _ = strengths.insert(cell, strength);
            }
        }
    }
}

#[test]
fn census_matches_population() {
    let mut simulation = mixed_population(3);
    let _ = simulation.run(5);
    let census = simulation.census();
    assert_eq!(census.tick(), 5);
    assert_eq!(census.population(AgentKind::Forager), 60);
    assert_eq!(census.population(AgentKind::Predator), 6);
    assert_eq!(census.population(AgentKind::Colony), 4);
    let activity_total: u32 = lasius_core::ActivityState::ALL
        .iter()
        .map(|state| census.activity(*state))
        .sum();
    let aggression_total: u32 = lasius_core::AggressionState::ALL
        .iter()
        .map(|state| census.aggression(*state))
        .sum();
    assert_eq!(activity_total, 60);
    assert_eq!(aggression_total, 60);
    assert_eq!(
        census.total_pheromone(),
        simulation.snapshot().total_pheromone()
    );
}

#[test]
fn foragers_capture_a_colony_target_when_colonies_exist() {
    let simulation = mixed_population(13);
    let snapshot = simulation.snapshot();
    for agent in snapshot.agents_of_kind(AgentKind::Forager) {
        match agent.body {
            lasius_core::BodySnapshot::Forager { colony_target, .. } => {
                assert!(colony_target.is_some());
            }
            other => panic!("forager has body {other:?}"),
        }
    }
}

#[test]
fn predators_and_colonies_can_be_placed_explicitly() {
    let simulation = Simulation::with_placements(
        bounded(6, 6, 4),
        vec![
            Placement::new(
                CellCoord::new(0, 0),
                AgentSpec::Colony {
                    kind: ColonyKind::MKuricola,
                    size: 20,
                },
            ),
            Placement::new(
                CellCoord::new(5, 5),
                AgentSpec::Predator(PredatorTunables::default()),
            ),
            forager_at(2, 2),
        ],
    )
    .expect("valid layout");
    let census = simulation.census();
    assert_eq!(census.population(AgentKind::Colony), 1);
    assert_eq!(census.population(AgentKind::Predator), 1);
    assert_eq!(census.population(AgentKind::Forager), 1);
}

#[test]
fn toml_with_missing_bucket_is_rejected_before_placement() {
    let text = r#"
        seed = 9

        [grid]
        width = 12
        height = 12
        topology = "bounded"

        [aggression.activity_table.travel_solo]
        flee = 0.30
        no_response = 0.25
        weak_response = 0.20
        light_bite_flee = 0.10
        bite = 0.10
        bite_acid = 0.05
    "#;
    let config: SimulationConfig = toml::from_str(text).expect("syntactically valid");
    let error = Simulation::initialize(config).expect_err("table is incomplete");
    assert!(matches!(
        error,
        SimulationError::Config(ConfigError::MissingBucket(_))
    ));
}

#[test]
fn toml_with_unbalanced_row_is_rejected() {
    let text = r#"
        [aggression.nestmate_table.alone]
        flee = 0.5
        no_response = 0.5
        weak_response = 0.5
        light_bite_flee = 0.0
        bite = 0.0
        bite_acid = 0.0

        [aggression.nestmate_table.few]
        flee = 0.25
        no_response = 0.20
        weak_response = 0.20
        light_bite_flee = 0.15
        bite = 0.12
        bite_acid = 0.08

        [aggression.nestmate_table.several]
        flee = 0.15
        no_response = 0.15
        weak_response = 0.20
        light_bite_flee = 0.20
        bite = 0.18
        bite_acid = 0.12

        [aggression.nestmate_table.crowd]
        flee = 0.05
        no_response = 0.10
        weak_response = 0.15
        light_bite_flee = 0.20
        bite = 0.28
        bite_acid = 0.22
    "#;
    let config: SimulationConfig = toml::from_str(text).expect("syntactically valid");
    let error = Simulation::initialize(config).expect_err("row sums to 1.5");
    assert!(matches!(
        error,
        SimulationError::Config(ConfigError::DistributionSum { .. })
    ));
}
