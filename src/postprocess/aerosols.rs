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

//! Module reconstructing particulate matter mass
//! concentrations from WRF-Chem MOSAIC aerosol bins.
//!
//! The reconstruction is a chain of stages, each extending the dataset:
//!
//! 1. Subset of raw variables is taken from WRF-Chem output.
//! 2. Bins of each species are summed and converted to `ug m-3`
//!    ([`species::add_species_contributions`]).
//! 3. Species are grouped into components and total PM
//!    ([`components::add_components`]).
//! 4. Condensable vapours of VBS schemes are converted
//!    ([`vapours::add_vapour_concentrations`]).
//!
//! Reconstructed `pm25_total` and `pm10_total` should match `PM2_5_DRY`
//! and `PM10` computed by WRF-Chem, which can be checked with [`validate`].

pub mod components;
pub mod conversion;
pub mod schemes;
pub mod species;
pub mod vapours;

use self::schemes::Scheme;
use super::dataset::Dataset;
use crate::constants::{ALT, COARSE_BIN, FINE_BINS, PM10_DIAG, PM25_DIAG};
use crate::{errors::DatasetError, Float};
use log::{debug, warn};
use ndarray::Zip;
use serde::Serialize;

/// Variables required to reconstruct PM with given scheme.
pub fn required_variables(scheme: &Scheme, with_vapours: bool) -> Vec<String> {
    let mut required = species::raw_variables(scheme.species);

    if with_vapours {
        required.extend(scheme.vapours.iter().map(|v| (*v).to_string()));
    }

    required.push(ALT.to_string());
    required
}

/// Variables carried to the aerosol dataset if present in the input:
/// model diagnostics, aerosol water and number, and thermodynamic state.
pub fn optional_variables() -> Vec<String> {
    let mut optional = vec![PM25_DIAG.to_string(), PM10_DIAG.to_string()];

    for prefix in &["water", "num"] {
        for bin in FINE_BINS.iter().chain(std::iter::once(&COARSE_BIN)) {
            optional.push(species::bin_name(prefix, bin));
        }
    }

    optional.extend(["P", "PB", "T"].iter().map(|v| (*v).to_string()));
    optional
}

/// Creates a dataset with aerosol variables of the WRF-Chem output
/// and all reconstructed PM fields.
///
/// The input dataset is not modified.
pub fn get_aerosols(
    dataset: &Dataset,
    scheme: &Scheme,
    with_vapours: bool,
) -> Result<Dataset, DatasetError> {
    debug!("Reconstructing PM for chem_opt {}", scheme.chem_opt);

    let required = required_variables(scheme, with_vapours);
    let mut aerosols = dataset.subset_with_optional(&required, &optional_variables())?;

    species::add_species_contributions(&mut aerosols, scheme.species)?;
    components::add_components(&mut aerosols, scheme.composites)?;

    if with_vapours {
        vapours::add_vapour_concentrations(&mut aerosols, scheme.vapours)?;
    }

    Ok(aerosols)
}

/// Result of comparing a reconstructed field with WRF-Chem diagnostic.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Validation {
    pub reconstructed: &'static str,
    pub diagnostic: &'static str,
    pub max_relative_error: Float,
    pub passed: bool,
}

/// Pairs of reconstructed and diagnostic fields that should be equal.
const VALIDATED_PAIRS: [(&str, &str); 2] = [("pm25_total", PM25_DIAG), ("pm10_total", PM10_DIAG)];

/// Compares reconstructed totals with WRF-Chem diagnostics
/// present in the dataset.
///
/// Pairs with absent diagnostic are skipped, as not every
/// WRF-Chem run outputs `PM10`. Gridpoints where both values are NaN
/// (eg. masked out of a region) are ignored, any other non-finite
/// value fails the check.
pub fn validate(dataset: &Dataset, tolerance: Float) -> Result<Vec<Validation>, DatasetError> {
    let mut results = vec![];

    for (reconstructed, diagnostic) in &VALIDATED_PAIRS {
        let reference = match dataset.get(diagnostic) {
            Some(field) => field,
            None => {
                debug!("{} not present, skipping its validation", diagnostic);
                continue;
            }
        };

        let computed = dataset
            .get(reconstructed)
            .ok_or_else(|| DatasetError::DependencyNotComputed {
                stage: "validation",
                field: (*reconstructed).to_string(),
            })?;

        if computed.shape() != reference.shape() {
            return Err(DatasetError::ShapeMismatch {
                field: (*diagnostic).to_string(),
                expected: computed.shape().to_vec(),
                found: reference.shape().to_vec(),
            });
        }

        let max_relative_error = Zip::from(&computed.data)
            .and(&reference.data)
            .fold(0.0, |max_err: Float, &a, &b| {
                if a.is_nan() && b.is_nan() {
                    max_err
                } else {
                    max_err.max(relative_error(a, b))
                }
            });

        let passed = max_relative_error <= tolerance;

        if passed {
            debug!(
                "{} matches {} (max relative error {:e})",
                reconstructed, diagnostic, max_relative_error
            );
        } else {
            warn!(
                "{} differs from {} by up to {:e} (tolerance {:e})",
                reconstructed, diagnostic, max_relative_error, tolerance
            );
        }

        results.push(Validation {
            reconstructed: *reconstructed,
            diagnostic: *diagnostic,
            max_relative_error,
            passed,
        });
    }

    Ok(results)
}

/// Difference of computed value from the reference, relative to the reference.
///
/// Zero when both are zero, infinite when only the reference
/// is zero or either value is not finite.
fn relative_error(computed: Float, reference: Float) -> Float {
    if !computed.is_finite() || !reference.is_finite() {
        return Float::INFINITY;
    }

    let difference = (computed - reference).abs();

    if difference == 0.0 {
        return 0.0;
    }

    difference / reference.abs()
}
