//! Categorical threat-response tables.
//!
//! A threatened forager draws one of the six [`AggressionState::RESPONSES`]
//! from a distribution looked up by an enumerated bucket. Two bucketing
//! strategies exist: the forager's current [`ActivityState`], or a
//! [`NestmateBucket`] derived from how many other foragers are close by.
//! Tables arrive as plain configuration and are compiled into an
//! [`AggressionTable`] only after every bucket is present and every row sums
//! to one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{config::ConfigError, ActivityState, AggressionState};

/// Largest absolute difference from 1.0 accepted for a distribution's sum.
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

/// Selects which bucket keys the aggression table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggressionStrategy {
    /// Keyed by the forager's activity state.
    #[default]
    Activity,
    /// Keyed by the number of nearby nestmates.
    Nestmates,
}

/// Coarse classification of how many nestmates surround a forager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestmateBucket {
    /// No other forager nearby.
    Alone,
    /// A handful of nestmates.
    Few,
    /// A small group.
    Several,
    /// A crowd.
    Crowd,
}

impl NestmateBucket {
    /// Every bucket in table order.
    pub const ALL: [NestmateBucket; 4] = [Self::Alone, Self::Few, Self::Several, Self::Crowd];

    /// Position of the bucket inside nestmate-keyed tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Alone => 0,
            Self::Few => 1,
            Self::Several => 2,
            Self::Crowd => 3,
        }
    }

    /// Stable snake-case label used in diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Alone => "alone",
            Self::Few => "few",
            Self::Several => "several",
            Self::Crowd => "crowd",
        }
    }
}

/// Upper bounds that split nestmate counts into buckets.
///
/// Zero nestmates is [`NestmateBucket::Alone`], `1..=few_max` is
/// [`NestmateBucket::Few`], `few_max + 1..=several_max` is
/// [`NestmateBucket::Several`] and anything above is [`NestmateBucket::Crowd`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NestmateBounds {
    /// Largest count classified as few.
    pub few_max: u32,
    /// Largest count classified as several.
    pub several_max: u32,
}

impl Default for NestmateBounds {
    fn default() -> Self {
        Self {
            few_max: 2,
            several_max: 5,
        }
    }
}

impl NestmateBounds {
    /// Maps a nestmate count to its bucket.
    #[must_use]
    pub const fn bucket(&self, count: u32) -> NestmateBucket {
        if count == 0 {
            NestmateBucket::Alone
        } else if count <= self.few_max {
            NestmateBucket::Few
        } else if count <= self.several_max {
            NestmateBucket::Several
        } else {
            NestmateBucket::Crowd
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.few_max == 0 || self.several_max <= self.few_max {
            return Err(ConfigError::InvalidNestmateBounds {
                few_max: self.few_max,
                several_max: self.several_max,
            });
        }
        Ok(())
    }
}

/// Identifies a single row of an aggression table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableBucket {
    /// Row keyed by activity state.
    Activity(ActivityState),
    /// Row keyed by nestmate bucket.
    Nestmates(NestmateBucket),
}

impl fmt::Display for TableBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activity(state) => write!(f, "activity bucket `{}`", state.label()),
            Self::Nestmates(bucket) => write!(f, "nestmate bucket `{}`", bucket.label()),
        }
    }
}

/// Probability of each threat response.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggressionDistribution {
    /// Probability of [`AggressionState::Flee`].
    pub flee: f64,
    /// Probability of [`AggressionState::NoResponse`].
    pub no_response: f64,
    /// Probability of [`AggressionState::WeakResponse`].
    pub weak_response: f64,
    /// Probability of [`AggressionState::LightBiteFlee`].
    pub light_bite_flee: f64,
    /// Probability of [`AggressionState::Bite`].
    pub bite: f64,
    /// Probability of [`AggressionState::BiteAcid`].
    pub bite_acid: f64,
}

impl AggressionDistribution {
    /// Creates a distribution from probabilities in [`AggressionState::RESPONSES`] order.
    #[must_use]
    pub const fn from_array(probabilities: [f64; 6]) -> Self {
        Self {
            flee: probabilities[0],
            no_response: probabilities[1],
            weak_response: probabilities[2],
            light_bite_flee: probabilities[3],
            bite: probabilities[4],
            bite_acid: probabilities[5],
        }
    }

    /// Probabilities in [`AggressionState::RESPONSES`] order.
    #[must_use]
    pub const fn to_array(&self) -> [f64; 6] {
        [
            self.flee,
            self.no_response,
            self.weak_response,
            self.light_bite_flee,
            self.bite,
            self.bite_acid,
        ]
    }

    /// Probability assigned to a single response; zero for `NoThreat`.
    #[must_use]
    pub const fn probability(&self, state: AggressionState) -> f64 {
        match state {
            AggressionState::NoThreat => 0.0,
            AggressionState::Flee => self.flee,
            AggressionState::NoResponse => self.no_response,
            AggressionState::WeakResponse => self.weak_response,
            AggressionState::LightBiteFlee => self.light_bite_flee,
            AggressionState::Bite => self.bite,
            AggressionState::BiteAcid => self.bite_acid,
        }
    }

    fn validate(&self, bucket: TableBucket) -> Result<[f64; 6], ConfigError> {
        let probabilities = self.to_array();
        for value in probabilities {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidProbability { bucket, value });
            }
        }
        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(ConfigError::DistributionSum { bucket, sum });
        }
        Ok(probabilities)
    }
}

/// Activity-keyed table as written in configuration.
///
/// Every row must be present; a missing row rejects the run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityTableConfig {
    /// Row for [`ActivityState::TravelSolo`].
    pub travel_solo: Option<AggressionDistribution>,
    /// Row for [`ActivityState::TravelLight`].
    pub travel_light: Option<AggressionDistribution>,
    /// Row for [`ActivityState::TravelMedium`].
    pub travel_medium: Option<AggressionDistribution>,
    /// Row for [`ActivityState::TravelHeavy`].
    pub travel_heavy: Option<AggressionDistribution>,
    /// Row for [`ActivityState::TendMk`].
    pub tend_mk: Option<AggressionDistribution>,
    /// Row for [`ActivityState::TendFt`].
    pub tend_ft: Option<AggressionDistribution>,
}

impl Default for ActivityTableConfig {
    fn default() -> Self {
        let row = |probabilities| Some(AggressionDistribution::from_array(probabilities));
        Self {
            travel_solo: row([0.30, 0.25, 0.20, 0.10, 0.10, 0.05]),
            travel_light: row([0.25, 0.20, 0.20, 0.15, 0.12, 0.08]),
            travel_medium: row([0.15, 0.15, 0.20, 0.20, 0.18, 0.12]),
            travel_heavy: row([0.10, 0.10, 0.15, 0.20, 0.25, 0.20]),
            tend_mk: row([0.05, 0.10, 0.15, 0.20, 0.30, 0.20]),
            tend_ft: row([0.20, 0.30, 0.20, 0.10, 0.12, 0.08]),
        }
    }
}

impl ActivityTableConfig {
    /// Row configured for the provided activity state.
    #[must_use]
    pub const fn row(&self, state: ActivityState) -> Option<&AggressionDistribution> {
        match state {
            ActivityState::TravelSolo => self.travel_solo.as_ref(),
            ActivityState::TravelLight => self.travel_light.as_ref(),
            ActivityState::TravelMedium => self.travel_medium.as_ref(),
            ActivityState::TravelHeavy => self.travel_heavy.as_ref(),
            ActivityState::TendMk => self.tend_mk.as_ref(),
            ActivityState::TendFt => self.tend_ft.as_ref(),
        }
    }

    fn compile(&self) -> Result<[[f64; 6]; 6], ConfigError> {
        let mut rows = [[0.0; 6]; 6];
        for state in ActivityState::ALL {
            let bucket = TableBucket::Activity(state);
            let distribution = self.row(state).ok_or(ConfigError::MissingBucket(bucket))?;
            rows[state.index()] = distribution.validate(bucket)?;
        }
        Ok(rows)
    }
}

/// Nestmate-keyed table as written in configuration.
///
/// Every row must be present; a missing row rejects the run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NestmateTableConfig {
    /// Row for [`NestmateBucket::Alone`].
    pub alone: Option<AggressionDistribution>,
    /// Row for [`NestmateBucket::Few`].
    pub few: Option<AggressionDistribution>,
    /// Row for [`NestmateBucket::Several`].
    pub several: Option<AggressionDistribution>,
    /// Row for [`NestmateBucket::Crowd`].
    pub crowd: Option<AggressionDistribution>,
}

impl Default for NestmateTableConfig {
    fn default() -> Self {
        let row = |probabilities| Some(AggressionDistribution::from_array(probabilities));
        Self {
            alone: row([0.40, 0.25, 0.15, 0.10, 0.07, 0.03]),
            few: row([0.25, 0.20, 0.20, 0.15, 0.12, 0.08]),
            several: row([0.15, 0.15, 0.20, 0.20, 0.18, 0.12]),
            crowd: row([0.05, 0.10, 0.15, 0.20, 0.28, 0.22]),
        }
    }
}

impl NestmateTableConfig {
    /// Row configured for the provided nestmate bucket.
    #[must_use]
    pub const fn row(&self, bucket: NestmateBucket) -> Option<&AggressionDistribution> {
        match bucket {
            NestmateBucket::Alone => self.alone.as_ref(),
            NestmateBucket::Few => self.few.as_ref(),
            NestmateBucket::Several => self.several.as_ref(),
            NestmateBucket::Crowd => self.crowd.as_ref(),
        }
    }

    fn compile(&self) -> Result<[[f64; 6]; 4], ConfigError> {
        let mut rows = [[0.0; 6]; 4];
        for bucket in NestmateBucket::ALL {
            let key = TableBucket::Nestmates(bucket);
            let distribution = self.row(bucket).ok_or(ConfigError::MissingBucket(key))?;
            rows[bucket.index()] = distribution.validate(key)?;
        }
        Ok(rows)
    }
}

/// Threat-response configuration section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggressionConfig {
    /// Which table is consulted.
    pub strategy: AggressionStrategy,
    /// Bounds used by the nestmate strategy.
    pub nestmate_bounds: NestmateBounds,
    /// Activity-keyed table.
    pub activity_table: ActivityTableConfig,
    /// Nestmate-keyed table.
    pub nestmate_table: NestmateTableConfig,
}

impl AggressionConfig {
    /// Validates both tables and produces the compiled lookup.
    ///
    /// Both tables are checked regardless of the active strategy so that a
    /// broken table never sits unnoticed in a configuration file.
    pub fn compile(&self) -> Result<AggressionTable, ConfigError> {
        self.nestmate_bounds.validate()?;
        Ok(AggressionTable {
            strategy: self.strategy,
            nestmate_bounds: self.nestmate_bounds,
            by_activity: self.activity_table.compile()?,
            by_nestmates: self.nestmate_table.compile()?,
        })
    }
}

/// Validated aggression lookup keyed by enumerated buckets.
#[derive(Clone, Debug, PartialEq)]
pub struct AggressionTable {
    strategy: AggressionStrategy,
    nestmate_bounds: NestmateBounds,
    by_activity: [[f64; 6]; 6],
    by_nestmates: [[f64; 6]; 4],
}

impl AggressionTable {
    /// Strategy selected by the configuration.
    #[must_use]
    pub const fn strategy(&self) -> AggressionStrategy {
        self.strategy
    }

    /// Bounds used to bucket nestmate counts.
    #[must_use]
    pub const fn nestmate_bounds(&self) -> NestmateBounds {
        self.nestmate_bounds
    }

    /// Resolves the bucket for a forager given the active strategy.
    #[must_use]
    pub const fn bucket_for(&self, activity: ActivityState, nestmates: u32) -> TableBucket {
        match self.strategy {
            AggressionStrategy::Activity => TableBucket::Activity(activity),
            AggressionStrategy::Nestmates => {
                TableBucket::Nestmates(self.nestmate_bounds.bucket(nestmates))
            }
        }
    }

    /// Probabilities of the row keyed by `bucket`, in [`AggressionState::RESPONSES`] order.
    #[must_use]
    pub const fn row(&self, bucket: TableBucket) -> &[f64; 6] {
        match bucket {
            TableBucket::Activity(state) => &self.by_activity[state.index()],
            TableBucket::Nestmates(bucket) => &self.by_nestmates[bucket.index()],
        }
    }
}
