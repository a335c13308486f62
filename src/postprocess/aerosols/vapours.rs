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

//! Sub-module converting condensable organic vapours
//! of VBS schemes to mass concentrations.

use super::conversion::ppmv_to_mass;
use crate::constants::{ALT, VAPOUR_MOLAR_MASS};
use crate::errors::DatasetError;
use crate::postprocess::dataset::Dataset;
use log::debug;

pub fn vapour_mass_name(vapour: &str) -> String {
    format!("mass_{}", vapour)
}

/// Adds `mass_<vapour>` field (in `ug m-3`) for every listed vapour.
///
/// All vapours are assumed to have molar mass of [`VAPOUR_MOLAR_MASS`].
pub fn add_vapour_concentrations(
    dataset: &mut Dataset,
    vapours: &[&str],
) -> Result<(), DatasetError> {
    if vapours.is_empty() {
        return Ok(());
    }

    debug!("Converting {} condensable vapours", vapours.len());

    let missing: Vec<String> = vapours
        .iter()
        .copied()
        .chain(std::iter::once(ALT))
        .filter(|name| !dataset.contains(name))
        .map(str::to_string)
        .collect();

    if !missing.is_empty() {
        return Err(DatasetError::MissingVariables(missing));
    }

    let alt = dataset.require(ALT)?;
    let mut converted = Vec::with_capacity(vapours.len());

    for vapour in vapours {
        let mixing_ratio = dataset.require(vapour)?;
        let mass = ppmv_to_mass(vapour, mixing_ratio, alt, VAPOUR_MOLAR_MASS)?;
        converted.push((vapour_mass_name(vapour), mass));
    }

    for (name, field) in converted {
        dataset.insert(&name, field)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::add_vapour_concentrations;
    use crate::errors::DatasetError;
    use crate::postprocess::dataset::{
        tests::{constant_field, test_coords},
        Dataset,
    };
    use float_cmp::approx_eq;

    #[test]
    fn cvasoa1_of_ten_ppmv() {
        let mut ds = Dataset::new(test_coords(2));
        ds.insert("cvasoa1", constant_field(10.0)).unwrap();
        ds.insert("ALT", constant_field(1.0)).unwrap();

        add_vapour_concentrations(&mut ds, &["cvasoa1"]).unwrap();

        let mass = ds.get("mass_cvasoa1").unwrap();
        assert_eq!(mass.units.as_deref(), Some("ug m-3"));
        assert!(approx_eq!(
            f64,
            mass.data[[0, 0, 0, 0]],
            86_206.9,
            epsilon = 0.01
        ));
    }

    #[test]
    fn missing_vapour_is_named() {
        let mut ds = Dataset::new(test_coords(2));
        ds.insert("ALT", constant_field(1.0)).unwrap();

        match add_vapour_concentrations(&mut ds, &["cvbsoaX"]) {
            Err(DatasetError::MissingVariables(missing)) => {
                assert_eq!(missing, vec!["cvbsoaX".to_string()])
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn no_vapours_is_noop() {
        let mut ds = Dataset::new(test_coords(2));
        add_vapour_concentrations(&mut ds, &[]).unwrap();
        assert_eq!(ds.len(), 0);
    }
}
