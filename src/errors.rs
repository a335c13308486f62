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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Error while reading config.yaml: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while creating ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Error while handling output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error while writing CSV output: {0}")]
    Csv(#[from] csv::Error),

    #[error("Output directory is not correct: {0}")]
    FaultyOutput(&'static str),

    #[error("Error while reading input data: {0}")]
    Input(#[from] InputError),

    #[error("Error while processing dataset: {0}")]
    Dataset(#[from] DatasetError),

    #[error("All {0} runs failed, no results were produced")]
    AllRunsFailed(usize),

    #[error("Cannot set memory limit: {0}")]
    MemoryLimit(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open config.yaml: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize config.yaml: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds {0}")]
    OutOfBounds(&'static str),

    #[error("Unsupported chem_opt {0}, only 201 and 202 are known")]
    UnknownChemOpt(u16),
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Required variables missing from dataset: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("Field {field} required by {stage} has not been computed yet")]
    DependencyNotComputed { stage: &'static str, field: String },

    #[error("Field {field} of shape {found:?} cannot be combined with shape {expected:?}")]
    ShapeMismatch {
        field: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Field {0} has a different number of dimension names and array axes")]
    DimensionsCount(String),

    #[error("Datasets cannot be merged as their {0} coordinates differ")]
    CoordinatesMismatch(&'static str),

    #[error("Cannot merge an empty list of datasets")]
    EmptyMerge,

    #[error("No gridpoints within selected extent")]
    EmptySelection,

    #[error("Index {index} out of range of dimension {dim} with length {len}")]
    IndexOutOfRange {
        dim: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),

    #[error("Reading netCDF files requires the toolkit to be built with the netcdf feature")]
    FeatureNotEnabled,

    #[error("Variable {0} not found in input file")]
    MissingVariable(String),

    #[error("Cannot parse time units: {0}")]
    TimeUnits(String),

    #[error("Error while assembling input dataset: {0}")]
    Dataset(#[from] DatasetError),
}
