//! Run configuration and the validation that guards it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    aggression::{AggressionConfig, AggressionTable, TableBucket},
    ActivityState, Topology,
};

/// Aggregated tuning surface for a complete simulation run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Seed for the single random source shared by every stochastic draw.
    pub seed: u64,
    /// Shape of the grid.
    pub grid: GridConfig,
    /// Number of agents of each kind created by random initialization.
    pub population: PopulationConfig,
    /// Tunables handed to every forager.
    pub forager: ForagerTunables,
    /// Tunables handed to every predator.
    pub predator: PredatorTunables,
    /// Colony parameters.
    pub colony: ColonyConfig,
    /// Trail-strength bands used to classify travelling foragers.
    pub activity: ActivityBands,
    /// Threat response tables.
    pub aggression: AggressionConfig,
}

impl SimulationConfig {
    /// Checks every section and compiles the aggression tables.
    ///
    /// Fails closed: the first problem found is reported and nothing is
    /// defaulted or renormalized.
    pub fn validate(&self) -> Result<AggressionTable, ConfigError> {
        self.grid.validate()?;
        self.forager.validate()?;
        self.predator.validate()?;
        self.activity.validate()?;
        self.aggression.compile()
    }
}

/// Shape of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Edge behaviour.
    pub topology: Topology,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            topology: Topology::Toroidal,
        }
    }
}

impl GridConfig {
    /// Largest number of cells a grid may hold.
    pub const MAX_CELLS: u64 = 1 << 22;

    /// Rejects grids without cells or with more than [`Self::MAX_CELLS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if u64::from(self.width) * u64::from(self.height) > Self::MAX_CELLS {
            return Err(ConfigError::GridTooLarge {
                width: self.width,
                height: self.height,
                max_cells: Self::MAX_CELLS,
            });
        }
        Ok(())
    }
}

/// Number of agents of each kind created by random initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PopulationConfig {
    /// Number of foragers.
    pub foragers: u32,
    /// Number of predators.
    pub predators: u32,
    /// Number of *M. kuricola* colonies.
    pub mk_colonies: u32,
    /// Number of *F. tropicalis* colonies.
    pub ft_colonies: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            foragers: 300,
            predators: 0,
            mk_colonies: 3,
            ft_colonies: 3,
        }
    }
}

impl PopulationConfig {
    /// Total number of entities the population describes.
    #[must_use]
    pub fn total(&self) -> u64 {
        u64::from(self.foragers)
            + u64::from(self.predators)
            + u64::from(self.mk_colonies)
            + u64::from(self.ft_colonies)
    }
}

/// Per-forager movement and perception tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForagerTunables {
    /// Multiplier applied to trail strength when weighing a marked cell.
    /// Zero disables trail following: marked cells weigh like unmarked ones.
    pub pheromone_weight: f64,
    /// Fraction of the strongest candidate weight added to the cell closest
    /// to the forager's colony.
    pub colony_weight: f64,
    /// Weights at or above this value are halved to damp two-cell loops.
    pub loop_threshold: f64,
    /// Radius searched for predators.
    pub threat_radius: u32,
    /// Radius searched for other foragers.
    pub nestmate_radius: u32,
    /// Radius within which a colony counts as tended.
    pub tending_radius: u32,
}

impl Default for ForagerTunables {
    fn default() -> Self {
        Self {
            pheromone_weight: 1.0,
            colony_weight: 1.0,
            loop_threshold: 50.0,
            threat_radius: 2,
            nestmate_radius: 2,
            tending_radius: 1,
        }
    }
}

impl ForagerTunables {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("forager.pheromone_weight", self.pheromone_weight)?;
        non_negative("forager.colony_weight", self.colony_weight)?;
        if !self.loop_threshold.is_finite() || self.loop_threshold <= 0.0 {
            return Err(ConfigError::InvalidTunable {
                name: "forager.loop_threshold",
                value: self.loop_threshold,
            });
        }
        positive_radius("forager.threat_radius", self.threat_radius)?;
        positive_radius("forager.nestmate_radius", self.nestmate_radius)?;
        positive_radius("forager.tending_radius", self.tending_radius)
    }
}

/// Per-predator movement tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PredatorTunables {
    /// Weight added to the free cell closest to the nearest forager.
    pub pursuit_bonus: f64,
}

impl Default for PredatorTunables {
    fn default() -> Self {
        Self { pursuit_bonus: 2.0 }
    }
}

impl PredatorTunables {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("predator.pursuit_bonus", self.pursuit_bonus)
    }
}

/// Colony parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColonyConfig {
    /// Size counter assigned to every colony at creation.
    pub initial_size: u32,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self { initial_size: 20 }
    }
}

/// Inclusive integer range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Band {
    /// Smallest value inside the band.
    pub min: u32,
    /// Largest value inside the band.
    pub max: u32,
}

impl Band {
    /// Creates a band covering `min..=max`.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Reports whether the value lies inside the band.
    #[must_use]
    pub const fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    const fn overlaps(&self, other: &Band) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

/// Trail-strength bands that classify a travelling forager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActivityBands {
    /// Band mapped to [`ActivityState::TravelLight`].
    pub light: Band,
    /// Band mapped to [`ActivityState::TravelMedium`].
    pub medium: Band,
    /// Band mapped to [`ActivityState::TravelHeavy`].
    pub heavy: Band,
}

impl Default for ActivityBands {
    fn default() -> Self {
        Self {
            light: Band::new(6, 14),
            medium: Band::new(51, 63),
            heavy: Band::new(98, 126),
        }
    }
}

impl ActivityBands {
    /// Maps a rounded neighbourhood trail strength to a travel state.
    ///
    /// Values outside every band map to [`ActivityState::TravelSolo`].
    #[must_use]
    pub const fn classify(&self, strength: u32) -> ActivityState {
        if self.light.contains(strength) {
            ActivityState::TravelLight
        } else if self.medium.contains(strength) {
            ActivityState::TravelMedium
        } else if self.heavy.contains(strength) {
            ActivityState::TravelHeavy
        } else {
            ActivityState::TravelSolo
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("activity.light", self.light),
            ("activity.medium", self.medium),
            ("activity.heavy", self.heavy),
        ];
        for (name, band) in named {
            if band.min > band.max {
                return Err(ConfigError::InvalidBand {
                    name,
                    min: band.min,
                    max: band.max,
                });
            }
        }
        for (index, (first_name, first)) in named.iter().enumerate() {
            for (second_name, second) in &named[index + 1..] {
                if first.overlaps(second) {
                    return Err(ConfigError::OverlappingBands {
                        first: *first_name,
                        second: *second_name,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Problems detected while validating a [`SimulationConfig`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid has no cells.
    #[error("grid must have at least one cell, got {width}x{height}")]
    EmptyGrid {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// The grid holds more cells than a field may allocate.
    #[error("grid of {width}x{height} exceeds the limit of {max_cells} cells")]
    GridTooLarge {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
        /// Largest accepted cell count.
        max_cells: u64,
    },
    /// A numeric tunable is negative, infinite or NaN.
    #[error("{name} must be a finite non-negative number, got {value}")]
    InvalidTunable {
        /// Dotted path of the tunable.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A search radius is zero.
    #[error("{name} must be at least 1")]
    InvalidRadius {
        /// Dotted path of the radius.
        name: &'static str,
    },
    /// A band's lower bound exceeds its upper bound.
    #[error("{name} band is empty: min {min} exceeds max {max}")]
    InvalidBand {
        /// Dotted path of the band.
        name: &'static str,
        /// Configured lower bound.
        min: u32,
        /// Configured upper bound.
        max: u32,
    },
    /// Two activity bands share at least one value.
    #[error("{first} and {second} bands overlap")]
    OverlappingBands {
        /// First overlapping band.
        first: &'static str,
        /// Second overlapping band.
        second: &'static str,
    },
    /// Nestmate bucket bounds are not strictly increasing from one.
    #[error("nestmate bounds must satisfy 1 <= few_max < several_max, got {few_max} and {several_max}")]
    InvalidNestmateBounds {
        /// Configured upper bound of the few bucket.
        few_max: u32,
        /// Configured upper bound of the several bucket.
        several_max: u32,
    },
    /// An aggression table lacks a distribution for a bucket.
    #[error("aggression table has no distribution for {0}")]
    MissingBucket(TableBucket),
    /// A probability in an aggression distribution is negative or not finite.
    #[error("aggression distribution for {bucket} contains invalid probability {value}")]
    InvalidProbability {
        /// Bucket holding the distribution.
        bucket: TableBucket,
        /// Offending probability.
        value: f64,
    },
    /// An aggression distribution does not sum to one.
    #[error("aggression distribution for {bucket} sums to {sum}, expected 1.0")]
    DistributionSum {
        /// Bucket holding the distribution.
        bucket: TableBucket,
        /// Actual sum of the distribution.
        sum: f64,
    },
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTunable { name, value })
    }
}

fn positive_radius(name: &'static str, radius: u32) -> Result<(), ConfigError> {
    if radius == 0 {
        Err(ConfigError::InvalidRadius { name })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn default_bands_classify_boundaries_inclusively() {
        let bands = ActivityBands::default();
        assert_eq!(bands.classify(0), ActivityState::TravelSolo);
        assert_eq!(bands.classify(5), ActivityState::TravelSolo);
        assert_eq!(bands.classify(6), ActivityState::TravelLight);
        assert_eq!(bands.classify(14), ActivityState::TravelLight);
        assert_eq!(bands.classify(15), ActivityState::TravelSolo);
        assert_eq!(bands.classify(51), ActivityState::TravelMedium);
        assert_eq!(bands.classify(63), ActivityState::TravelMedium);
        assert_eq!(bands.classify(64), ActivityState::TravelSolo);
        assert_eq!(bands.classify(98), ActivityState::TravelHeavy);
        assert_eq!(bands.classify(126), ActivityState::TravelHeavy);
        assert_eq!(bands.classify(127), ActivityState::TravelSolo);
    }

    #[test]
    fn overlapping_bands_are_rejected() {
        let mut config = SimulationConfig::default();
        config.activity.medium = Band::new(10, 60);
        assert_eq!(
            config.validate(),
            Err(ConfigError::OverlappingBands {
                first: "activity.light",
                second: "activity.medium",
            })
        );
    }

    #[test]
    fn inverted_band_is_rejected() {
        let mut config = SimulationConfig::default();
        config.activity.heavy = Band::new(130, 120);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBand {
                name: "activity.heavy",
                ..
            })
        ));
    }

    #[test]
    fn empty_grid_is_rejected() {
        let mut config = SimulationConfig::default();
        config.grid.height = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyGrid {
                width: 100,
                height: 0
            })
        );
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let mut config = SimulationConfig::default();
        config.grid.width = 2048;
        config.grid.height = 2048;
        assert!(config.validate().is_ok());

        config.grid.height = 2049;
        assert_eq!(
            config.validate(),
            Err(ConfigError::GridTooLarge {
                width: 2048,
                height: 2049,
                max_cells: GridConfig::MAX_CELLS,
            })
        );

        config.grid.width = u32::MAX;
        config.grid.height = u32::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn negative_and_nan_tunables_are_rejected() {
        let mut config = SimulationConfig::default();
        config.forager.pheromone_weight = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTunable {
                name: "forager.pheromone_weight",
                ..
            })
        ));

        let mut config = SimulationConfig::default();
        config.predator.pursuit_bonus = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTunable {
                name: "predator.pursuit_bonus",
                ..
            })
        ));
    }

    #[test]
    fn zero_radius_is_rejected() {
        let mut config = SimulationConfig::default();
        config.forager.threat_radius = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidRadius {
                name: "forager.threat_radius"
            })
        );
    }
}
