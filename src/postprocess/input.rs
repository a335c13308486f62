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

//! Module reading WRF-Chem output files into [`Dataset`].
//!
//! Only variables defined on the mass grid (`Time`, `bottom_top`,
//! `south_north`, `west_east` or a subset of them including `Time`)
//! are read. Staggered and character variables are skipped.
//!
//! Reading netCDF requires the `netcdf` feature, as it links
//! to the system netCDF library.

use super::dataset::{merge, Dataset};
use crate::constants::{LEVEL_DIM, SN_DIM, TIME_DIM, WE_DIM};
use crate::errors::InputError;
use crate::Float;
use chrono::{Duration, NaiveDateTime};
use log::debug;
use std::path::{Path, PathBuf};

#[cfg(feature = "netcdf")]
use super::dataset::{Coordinates, Field};
#[cfg(feature = "netcdf")]
use ndarray::{Array2, ArrayD, Axis, Ix2, IxDyn};

#[cfg_attr(not(feature = "netcdf"), allow(dead_code))]
const MASS_GRID_DIMS: [&str; 4] = [TIME_DIM, LEVEL_DIM, SN_DIM, WE_DIM];

/// Reads all files of a run and concatenates them along `Time`.
pub fn load_run(files: &[PathBuf]) -> Result<Dataset, InputError> {
    let mut datasets = Vec::with_capacity(files.len());

    for file in files {
        debug!("Reading {}", file.display());
        datasets.push(read_dataset(file)?);
    }

    Ok(merge(datasets)?)
}

/// Reads single WRF-Chem output file.
#[cfg(feature = "netcdf")]
pub fn read_dataset(path: &Path) -> Result<Dataset, InputError> {
    let file = netcdf::open(path)?;

    let coords = Coordinates {
        lons: read_horizontal(&file, "XLONG")?,
        lats: read_horizontal(&file, "XLAT")?,
        times: read_times(&file)?,
    };

    let mut dataset = Dataset::new(coords);

    for var in file.variables() {
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();

        if !is_mass_grid(&dims) {
            continue;
        }

        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        let values = match var.get_values::<Float, _>(..) {
            Ok(values) => values,
            Err(_) => {
                debug!("Skipping non-numeric variable {}", var.name());
                continue;
            }
        };

        let dims: Vec<&str> = dims.iter().map(String::as_str).collect();
        let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(crate::errors::DatasetError::from)?;

        let mut field = Field::new(&dims, data)?;

        if let Some(units) = string_attribute(&var, "units") {
            field = field.with_units(&units);
        }

        dataset.insert(&var.name(), field)?;
    }

    debug!("Read {} variables from {}", dataset.len(), path.display());

    Ok(dataset)
}

#[cfg(not(feature = "netcdf"))]
pub fn read_dataset(path: &Path) -> Result<Dataset, InputError> {
    debug!("Cannot read {} without netcdf feature", path.display());
    Err(InputError::FeatureNotEnabled)
}

#[cfg_attr(not(feature = "netcdf"), allow(dead_code))]
fn is_mass_grid(dims: &[String]) -> bool {
    dims.first().map(String::as_str) == Some(TIME_DIM)
        && dims.iter().all(|d| MASS_GRID_DIMS.contains(&d.as_str()))
}

/// Reads 2D coordinate from its first time slice.
#[cfg(feature = "netcdf")]
fn read_horizontal(file: &netcdf::File, name: &str) -> Result<Array2<Float>, InputError> {
    let var = file
        .variable(name)
        .ok_or_else(|| InputError::MissingVariable(name.to_string()))?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let values: Vec<Float> = var.get_values(..)?;

    let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(crate::errors::DatasetError::from)?;

    let slice = if data.ndim() == 3 {
        data.index_axis(Axis(0), 0).to_owned()
    } else {
        data
    };

    let slice = slice
        .into_dimensionality::<Ix2>()
        .map_err(crate::errors::DatasetError::from)?;

    Ok(slice)
}

#[cfg(feature = "netcdf")]
fn read_times(file: &netcdf::File) -> Result<Vec<NaiveDateTime>, InputError> {
    let var = file
        .variable("XTIME")
        .ok_or_else(|| InputError::MissingVariable("XTIME".to_string()))?;

    let units = string_attribute(&var, "units")
        .ok_or_else(|| InputError::TimeUnits("XTIME has no units attribute".to_string()))?;

    let minutes: Vec<Float> = var.get_values(..)?;

    decode_times(&minutes, &units)
}

#[cfg(feature = "netcdf")]
fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Str(s) => Some(s),
            _ => None,
        })
}

/// Converts WRF `XTIME` values to datetimes.
///
/// Units are expected in the form `minutes since YYYY-MM-DD HH:MM:SS`.
#[cfg_attr(not(feature = "netcdf"), allow(dead_code))]
fn decode_times(minutes: &[Float], units: &str) -> Result<Vec<NaiveDateTime>, InputError> {
    let reference = units
        .trim()
        .strip_prefix("minutes since ")
        .ok_or_else(|| InputError::TimeUnits(units.to_string()))?;

    let reference = NaiveDateTime::parse_from_str(reference.trim(), "%Y-%m-%d %H:%M:%S")
        .map_err(|_| InputError::TimeUnits(units.to_string()))?;

    Ok(minutes
        .iter()
        .map(|&m| reference + Duration::seconds((m * 60.0).round() as i64))
        .collect())
}
