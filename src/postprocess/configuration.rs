/*
Copyright 2021 Jakub Lewandowski

This file is part of WRF-Chem Particulate Matter Toolkit (WCPM).

WRF-Chem Particulate Matter Toolkit (WCPM) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

WRF-Chem Particulate Matter Toolkit (WCPM) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with WRF-Chem Particulate Matter Toolkit (WCPM). If not, see https://www.gnu.org/licenses/.
*/

//! Module responsible for parsing and checking the configuration file.
//!
//! The configuration file uses [YAML](https://en.wikipedia.org/wiki/YAML)
//! and `serde` to enforce strong typing and automatic type checking.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml` so you can check this documentation
//! for more details how to set the config file.

use super::aerosols::schemes::ChemOpt;
use crate::constants::DEFAULT_TOLERANCE;
use crate::errors::ConfigError;
use crate::Float;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Fields describing a single WRF-Chem simulation to post-process.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Run {
    /// Name of the run, used as a prefix of output files.
    ///
    /// Must be non-empty and unique among all runs.
    pub name: String,

    /// Chemistry option used in the WRF-Chem simulation.
    /// Selects the aerosol species tables.
    ///
    /// Currently only `201` and `202` are supported.
    pub chem_opt: ChemOpt,

    /// List of `wrfout` files of the simulation.
    ///
    /// Files are concatenated along `Time` in the listed order,
    /// so they should be sorted chronologically. At least one file
    /// must be provided.
    pub data_files: Vec<PathBuf>,

    /// _(Optional)_ Index of vertical level used for time series output.
    ///
    /// Defaults to `0` (surface).
    #[serde(default)]
    pub level: usize,

    /// _(Optional)_ Whether condensable vapours should be converted
    /// to mass concentrations. Ignored for schemes without vapours.
    ///
    /// Defaults to `true`.
    #[serde(default = "Run::default_vapours")]
    pub vapours: bool,

    /// _(Optional)_ Whether total pressure and absolute temperature
    /// should be computed. Requires `P`, `PB` and `T` in the input.
    ///
    /// Defaults to `false`.
    #[serde(default)]
    pub thermodynamics: bool,

    /// _(Optional)_ Region to which time series are limited.
    ///
    /// Defaults to the whole model domain.
    #[serde(default)]
    pub region: Option<Region>,
}

/// Geographic box given by latitude and longitude limits (in degrees).
/// Only gridpoints strictly inside the limits are selected.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Region {
    /// Must meet the condition: `-90 <= lat.0 < lat.1 <= 90`
    pub lat: (Float, Float),

    /// Must meet the condition: `-180 <= lon.0 < lon.1 <= 180`
    pub lon: (Float, Float),
}

impl Region {
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !(-90.0 <= self.lat.0 && self.lat.0 < self.lat.1 && self.lat.1 <= 90.0) {
            return Err(ConfigError::OutOfBounds(
                "Region latitude limits are reversed or out of range",
            ));
        }

        if !(-180.0 <= self.lon.0 && self.lon.0 < self.lon.1 && self.lon.1 <= 180.0) {
            return Err(ConfigError::OutOfBounds(
                "Region longitude limits are reversed or out of range",
            ));
        }

        Ok(())
    }
}

impl Run {
    fn default_vapours() -> bool {
        true
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::OutOfBounds("Run name cannot be empty"));
        }

        if self.data_files.is_empty() {
            return Err(ConfigError::OutOfBounds(
                "Each run must have at least one data file",
            ));
        }

        if let Some(region) = &self.region {
            region.check_bounds()?;
        }

        Ok(())
    }
}

/// _(Optional)_ Fields controlling comparison of reconstructed
/// PM with WRF-Chem diagnostics.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Validation {
    /// _(Optional)_ Maximal relative difference between `pm25_total`
    /// and `PM2_5_DRY` (and `pm10_total` and `PM10`) accepted as a match.
    ///
    /// Must meet the condition: `0 < tolerance < 1`. Defaults to `1e-6`.
    #[serde(default = "Validation::default_tolerance")]
    pub tolerance: Float,
}

impl Validation {
    fn default_tolerance() -> Float {
        DEFAULT_TOLERANCE
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return Err(ConfigError::OutOfBounds(
                "Validation tolerance must be between 0 and 1",
            ));
        }

        Ok(())
    }
}

impl Default for Validation {
    fn default() -> Self {
        Validation {
            tolerance: Validation::default_tolerance(),
        }
    }
}

/// _(Optional)_ Fields with information about
/// resources available for the toolkit.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Thread count used by the toolkit.
    /// Runs are processed in parallel on up to this number of workers.
    ///
    /// Cannot be less than `1`. Defaults to `1`.
    #[serde(default = "Resources::default_threads")]
    pub threads: u16,

    /// _(Optional)_ Heap memory limit in MB.
    ///
    /// Cannot be less than `128`. Defaults to whole addressable-space.
    ///
    /// Each run holds all its input files in memory at once, which for
    /// longer simulations can easily exceed system memory. With the limit
    /// set, the process aborts with an OOM message instead of
    /// being silently killed by the system.
    #[serde(default = "Resources::default_memory")]
    pub memory: usize,
}

impl Resources {
    fn default_threads() -> u16 {
        1
    }

    fn default_memory() -> usize {
        usize::MAX / (1024 * 1024)
    }

    /// Checks if thread count and memory limit are
    /// above limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.threads < 1 {
            return Err(ConfigError::OutOfBounds(
                "Available threads cannot be less than 1",
            ));
        }

        if self.memory < 128 {
            return Err(ConfigError::OutOfBounds(
                "Available memory cannot be less than 128 MB",
            ));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            threads: Resources::default_threads(),
            memory: Resources::default_memory(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Config {
    pub runs: Vec<Run>,

    #[serde(default)]
    pub validation: Validation,

    #[serde(default)]
    pub resources: Resources,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        Config::new_from_slice(data.as_slice())
    }

    fn new_from_slice(data: &[u8]) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_slice(data)?;

        config.check_bounds()?;

        Ok(config)
    }

    fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.runs.is_empty() {
            return Err(ConfigError::OutOfBounds("At least one run must be set"));
        }

        let mut names = FxHashSet::default();

        for run in &self.runs {
            run.check_bounds()?;

            if !names.insert(run.name.as_str()) {
                return Err(ConfigError::OutOfBounds("Run names must be unique"));
            }
        }

        self.validation.check_bounds()?;
        self.resources.check_bounds()?;

        Ok(())
    }
}
