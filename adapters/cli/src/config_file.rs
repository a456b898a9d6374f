//! Loading the simulation configuration and applying flag overrides.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use lasius_core::SimulationConfig;

/// Values supplied on the command line that replace file settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Overrides {
    pub(crate) seed: Option<u64>,
    pub(crate) foragers: Option<u32>,
    pub(crate) predators: Option<u32>,
}

impl Overrides {
    pub(crate) fn apply(self, config: &mut SimulationConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(foragers) = self.foragers {
            config.population.foragers = foragers;
        }
        if let Some(predators) = self.predators {
            config.population.predators = predators;
        }
    }
}

/// Reads the TOML file at `path`, or the defaults when no path is given.
pub(crate) fn load(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    parse(&text).with_context(|| format!("failed to parse configuration {}", path.display()))
}

fn parse(text: &str) -> Result<SimulationConfig> {
    Ok(toml::from_str(text)?)
}
