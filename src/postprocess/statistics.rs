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

//! Module with reductions and selections over
//! dataset dimensions.
//!
//! Gridpoints masked with NaN (eg. outside of a selected region)
//! are skipped by all means, as xarray does by default.

use super::dataset::{Coordinates, Dataset, Field};
use crate::constants::{LEVEL_DIM, SN_DIM, TIME_DIM, WE_DIM};
use crate::{errors::DatasetError, Float};
use log::debug;
use ndarray::{s, Array2, ArrayD, Axis, Slice};

/// Mean over given axes, ignoring NaNs.
/// Where all values are NaN the result is NaN.
fn nanmean_axes(data: &ArrayD<Float>, mut axes: Vec<Axis>) -> ArrayD<Float> {
    // remove the last axes first so that remaining indices stay valid
    axes.sort_unstable_by(|a, b| b.index().cmp(&a.index()));

    let mut sums = data.mapv(|v| if v.is_nan() { 0.0 } else { v });
    let mut counts = data.mapv(|v| if v.is_nan() { 0.0 } else { 1.0 });

    for axis in axes {
        sums = sums.sum_axis(axis);
        counts = counts.sum_axis(axis);
    }

    ndarray::Zip::from(&sums)
        .and(&counts)
        .map_collect(|&sum, &count| {
            if count > 0.0 {
                sum / count
            } else {
                Float::NAN
            }
        })
}

/// Reduces field over dimensions with given names.
/// Dimensions missing from the field are ignored.
fn reduce_field(field: &Field, dims: &[&str]) -> Field {
    let axes: Vec<Axis> = dims.iter().filter_map(|d| field.axis_of(d)).collect();

    if axes.is_empty() {
        return field.clone();
    }

    let data = nanmean_axes(&field.data, axes);

    Field {
        dims: field
            .dims
            .iter()
            .filter(|d| !dims.contains(&d.as_str()))
            .cloned()
            .collect(),
        data,
        units: field.units.clone(),
    }
}

/// Averages every field over `Time`.
///
/// Resulting dataset has no time coordinate.
pub fn time_mean(dataset: &Dataset) -> Result<Dataset, DatasetError> {
    debug!("Averaging {} fields over Time", dataset.len());

    let mut averaged = Dataset::new(Coordinates {
        lons: dataset.coords.lons.clone(),
        lats: dataset.coords.lats.clone(),
        times: vec![],
    });

    for (name, field) in dataset.iter() {
        averaged.insert(name, reduce_field(field, &[TIME_DIM]))?;
    }

    Ok(averaged)
}

/// Averages every field over horizontal dimensions
/// (`south_north` and `west_east`).
///
/// Resulting dataset has no horizontal coordinates.
pub fn space_mean(dataset: &Dataset) -> Result<Dataset, DatasetError> {
    debug!("Averaging {} fields over space", dataset.len());

    let mut averaged = Dataset::new(Coordinates {
        lons: Array2::default((0, 0)),
        lats: Array2::default((0, 0)),
        times: dataset.coords.times.clone(),
    });

    for (name, field) in dataset.iter() {
        averaged.insert(name, reduce_field(field, &[SN_DIM, WE_DIM]))?;
    }

    Ok(averaged)
}

/// Extracts gridpoints strictly inside given latitude
/// and longitude limits.
///
/// As WRF grid is not regular in geographic coordinates, fields are
/// truncated to the smallest index window containing all selected
/// gridpoints, and the gridpoints of that window outside the limits are
/// set to NaN.
pub fn space_subset(
    dataset: &Dataset,
    lat_lim: (Float, Float),
    lon_lim: (Float, Float),
) -> Result<Dataset, DatasetError> {
    let lons = &dataset.coords.lons;
    let lats = &dataset.coords.lats;

    let mask = ndarray::Zip::from(lons)
        .and(lats)
        .map_collect(|&lon, &lat| {
            lon_lim.0 < lon && lon < lon_lim.1 && lat_lim.0 < lat && lat < lat_lim.1
        });

    let selected: Vec<(usize, usize)> = mask
        .indexed_iter()
        .filter(|&(_, &inside)| inside)
        .map(|(idx, _)| idx)
        .collect();

    let (j_min, j_max) =
        min_max(selected.iter().map(|idx| idx.0)).ok_or(DatasetError::EmptySelection)?;
    let (i_min, i_max) =
        min_max(selected.iter().map(|idx| idx.1)).ok_or(DatasetError::EmptySelection)?;

    debug!(
        "Selected window south_north {}..={} west_east {}..={}",
        j_min, j_max, i_min, i_max
    );

    let mask = mask.slice(s![j_min..=j_max, i_min..=i_max]).to_owned();

    let mut subset = Dataset::new(Coordinates {
        lons: lons.slice(s![j_min..=j_max, i_min..=i_max]).to_owned(),
        lats: lats.slice(s![j_min..=j_max, i_min..=i_max]).to_owned(),
        times: dataset.coords.times.clone(),
    });

    for (name, field) in dataset.iter() {
        let sn_axis = field.axis_of(SN_DIM);
        let we_axis = field.axis_of(WE_DIM);

        let mut data = field.data.clone();

        if let Some(ax) = sn_axis {
            data = data.slice_axis(ax, Slice::from(j_min..j_max + 1)).to_owned();
        }

        if let Some(ax) = we_axis {
            data = data.slice_axis(ax, Slice::from(i_min..i_max + 1)).to_owned();
        }

        if let (Some(sn), Some(we)) = (sn_axis, we_axis) {
            for (idx, value) in data.indexed_iter_mut() {
                if !mask[[idx[sn.index()], idx[we.index()]]] {
                    *value = Float::NAN;
                }
            }
        }

        subset.insert(
            name,
            Field {
                dims: field.dims.clone(),
                data,
                units: field.units.clone(),
            },
        )?;
    }

    Ok(subset)
}

/// Selects single vertical level of every field.
///
/// Fields without vertical dimension are kept unchanged.
pub fn level_slice(dataset: &Dataset, level: usize) -> Result<Dataset, DatasetError> {
    let mut sliced = Dataset::new(dataset.coords.clone());

    for (name, field) in dataset.iter() {
        let field = match field.axis_of(LEVEL_DIM) {
            Some(axis) => {
                let len = field.data.len_of(axis);

                if level >= len {
                    return Err(DatasetError::IndexOutOfRange {
                        dim: LEVEL_DIM,
                        index: level,
                        len,
                    });
                }

                Field {
                    dims: field
                        .dims
                        .iter()
                        .filter(|d| d.as_str() != LEVEL_DIM)
                        .cloned()
                        .collect(),
                    data: field.data.index_axis(axis, level).to_owned(),
                    units: field.units.clone(),
                }
            }
            None => field.clone(),
        };

        sliced.insert(name, field)?;
    }

    Ok(sliced)
}

fn min_max(values: impl Iterator<Item = usize>) -> Option<(usize, usize)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })
}
