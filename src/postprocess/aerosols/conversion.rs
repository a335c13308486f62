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

//! Sub-module with unit conversions from WRF-Chem
//! mixing ratios to mass concentrations.
//!
//! MOSAIC aerosol mixing ratios are stored in `ug kg-1` of dry air,
//! so dividing them by inverse dry air density `ALT` (`m3 kg-1`)
//! gives `ug m-3`. Bins are summed first and divided once, the same
//! way WRF-Chem computes `PM2_5_DRY`. Gas-phase condensable vapours are
//! stored in ppmv and need a molar mass to be converted (see [`ppmv_to_mass`]).

use super::super::dataset::Field;
use crate::constants::{AIR_MOLAR_MASS, KG_TO_UG, MASS_CONC_UNITS, PPMV};
use crate::{errors::DatasetError, Float};
use ndarray::{ArrayViewD, Zip};

/// Broadcasts inverse density to the shape of converted field.
fn broadcast_alt<'a>(
    alt: &'a Field,
    shape: &[usize],
    name: &str,
) -> Result<ArrayViewD<'a, Float>, DatasetError> {
    alt.data
        .broadcast(shape)
        .ok_or_else(|| DatasetError::ShapeMismatch {
            field: name.to_string(),
            expected: shape.to_vec(),
            found: alt.shape().to_vec(),
        })
}

/// Sums aerosol bins of one species and converts the sum
/// from `ug kg-1` to `ug m-3`.
///
/// All bins must have identical shape, `alt` must broadcast to it.
pub fn bins_to_mass(name: &str, bins: &[&Field], alt: &Field) -> Result<Field, DatasetError> {
    let (first, rest) = bins
        .split_first()
        .ok_or_else(|| DatasetError::MissingVariables(vec![name.to_string()]))?;

    let mut bins_sum = first.data.clone();

    for bin in rest {
        if bin.shape() != first.shape() {
            return Err(DatasetError::ShapeMismatch {
                field: name.to_string(),
                expected: first.shape().to_vec(),
                found: bin.shape().to_vec(),
            });
        }

        bins_sum += &bin.data;
    }

    let alt = broadcast_alt(alt, first.shape(), name)?;

    Zip::from(&mut bins_sum)
        .and(&alt)
        .for_each(|mass, &alt| *mass /= alt);

    Ok(first.derive(bins_sum, MASS_CONC_UNITS))
}

/// Converts gas-phase mixing ratio in ppmv to mass
/// concentration in `ug m-3` with the ideal gas law,
/// assuming given molar mass (g/mol) of the gas.
pub fn ppmv_to_mass(
    name: &str,
    mixing_ratio: &Field,
    alt: &Field,
    molar_mass: Float,
) -> Result<Field, DatasetError> {
    let alt = broadcast_alt(alt, mixing_ratio.shape(), name)?;
    let molar_ratio = molar_mass / AIR_MOLAR_MASS;

    let mut mass = mixing_ratio.data.clone();

    Zip::from(&mut mass)
        .and(&alt)
        .for_each(|q, &alt| *q = (*q * PPMV) * molar_ratio * KG_TO_UG / alt);

    Ok(mixing_ratio.derive(mass, MASS_CONC_UNITS))
}
