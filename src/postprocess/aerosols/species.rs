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

//! Sub-module computing contributions of each aerosol
//! species to PM2.5 and PM10.

use super::conversion::bins_to_mass;
use crate::constants::{ALT, COARSE_BIN, FINE_BINS, MASS_CONC_UNITS};
use crate::errors::DatasetError;
use crate::postprocess::dataset::{Dataset, Field};
use log::debug;

pub fn bin_name(species: &str, bin: &str) -> String {
    format!("{}_{}", species, bin)
}

pub fn pm25_name(name: &str) -> String {
    format!("pm25_{}", name)
}

pub fn pm10_name(name: &str) -> String {
    format!("pm10_{}", name)
}

/// Lists names of all raw bin variables of given species.
pub fn raw_variables(species: &[&str]) -> Vec<String> {
    let mut names = Vec::with_capacity(4 * species.len());

    for s in species {
        for bin in FINE_BINS.iter().chain(std::iter::once(&COARSE_BIN)) {
            names.push(bin_name(s, bin));
        }
    }

    names
}

/// Adds `pm25_<species>` and `pm10_<species>` fields
/// (in `ug m-3`) for every species in the list.
///
/// PM2.5 sums three fine bins, PM10 adds the coarse bin on top of that.
/// Both are divided by inverse density, so the coarse bin
/// is converted the same way as fine bins.
///
/// Every raw bin variable and `ALT` must be present in the dataset,
/// otherwise the error lists all missing variables.
pub fn add_species_contributions(
    dataset: &mut Dataset,
    species: &[&str],
) -> Result<(), DatasetError> {
    debug!("Computing PM contributions of {} species", species.len());

    let mut required = raw_variables(species);
    required.push(ALT.to_string());

    let missing: Vec<String> = required
        .into_iter()
        .filter(|name| !dataset.contains(name))
        .collect();

    if !missing.is_empty() {
        return Err(DatasetError::MissingVariables(missing));
    }

    let alt = dataset.require(ALT)?;
    let mut contributions: Vec<(String, Field)> = Vec::with_capacity(2 * species.len());

    for s in species {
        let fine = FINE_BINS
            .iter()
            .map(|bin| dataset.require(&bin_name(s, bin)))
            .collect::<Result<Vec<&Field>, DatasetError>>()?;
        let coarse = dataset.require(&bin_name(s, COARSE_BIN))?;

        let pm25 = bins_to_mass(s, &fine, alt)?;
        let coarse = bins_to_mass(s, &[coarse], alt)?;

        if coarse.shape() != pm25.shape() {
            return Err(DatasetError::ShapeMismatch {
                field: bin_name(s, COARSE_BIN),
                expected: pm25.shape().to_vec(),
                found: coarse.shape().to_vec(),
            });
        }

        let pm10 = pm25.derive(&pm25.data + &coarse.data, MASS_CONC_UNITS);

        contributions.push((pm25_name(s), pm25));
        contributions.push((pm10_name(s), pm10));
    }

    for (name, field) in contributions {
        dataset.insert(&name, field)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{add_species_contributions, raw_variables};
    use crate::errors::DatasetError;
    use crate::postprocess::dataset::{
        tests::{constant_field, field_from_fn, test_coords},
        Dataset,
    };
    use float_cmp::approx_eq;

    const SPECIES: [&str; 8] = ["so4", "nh4", "no3", "oc", "bc", "oin", "na", "cl"];

    /// Distinct, position-dependent values for every species and bin.
    fn synthetic_dataset() -> Dataset {
        let mut ds = Dataset::new(test_coords(2));

        for (i, name) in raw_variables(&SPECIES).iter().enumerate() {
            let field = field_from_fn(|idx| (i + 1) as f64 * 0.1 + idx[3] as f64);
            ds.insert(name, field).unwrap();
        }

        ds.insert("ALT", constant_field(2.0)).unwrap();
        ds
    }

    #[test]
    fn raw_variable_names() {
        assert_eq!(
            raw_variables(&["so4"]),
            vec!["so4_a01", "so4_a02", "so4_a03", "so4_a04"]
        );
        assert_eq!(raw_variables(&SPECIES).len(), 32);
    }

    #[test]
    fn pm25_and_pm10_of_sulfate() {
        let mut ds = synthetic_dataset();
        add_species_contributions(&mut ds, &SPECIES).unwrap();

        let idx = [1usize, 2, 3, 4];
        let bin = |name: &str| ds.get(name).unwrap().data[idx];

        let expected_pm25 = (bin("so4_a01") + bin("so4_a02") + bin("so4_a03")) / 2.0;
        let expected_pm10 = expected_pm25 + bin("so4_a04") / 2.0;

        let pm25 = ds.get("pm25_so4").unwrap();
        let pm10 = ds.get("pm10_so4").unwrap();

        assert!(approx_eq!(f64, pm25.data[idx], expected_pm25, ulps = 2));
        assert!(approx_eq!(f64, pm10.data[idx], expected_pm10, ulps = 2));
        assert_eq!(pm25.units.as_deref(), Some("ug m-3"));
        assert_eq!(pm10.units.as_deref(), Some("ug m-3"));

        for s in &SPECIES {
            assert!(ds.contains(&format!("pm25_{}", s)));
            assert!(ds.contains(&format!("pm10_{}", s)));
        }
    }

    #[test]
    fn missing_bin_is_named() {
        let mut ds = Dataset::new(test_coords(2));
        ds.insert("ALT", constant_field(1.0)).unwrap();
        ds.insert("so4_a01", constant_field(1.0)).unwrap();
        ds.insert("so4_a02", constant_field(1.0)).unwrap();
        ds.insert("so4_a03", constant_field(1.0)).unwrap();

        match add_species_contributions(&mut ds, &["so4"]) {
            Err(DatasetError::MissingVariables(missing)) => {
                assert_eq!(missing, vec!["so4_a04".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(!ds.contains("pm25_so4"));
    }

    #[test]
    fn missing_alt_is_named() {
        let mut ds = synthetic_dataset();
        let mut no_alt = Dataset::new(ds.coords.clone());
        for (name, field) in ds.iter().filter(|(name, _)| *name != "ALT") {
            no_alt.insert(name, field.clone()).unwrap();
        }

        let err = add_species_contributions(&mut no_alt, &SPECIES).unwrap_err();
        assert!(err.to_string().contains("ALT"));

        add_species_contributions(&mut ds, &SPECIES).unwrap();
    }
}
