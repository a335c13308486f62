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

//! Module deriving full thermodynamic state
//! from WRF perturbation variables.
//!
//! WRF stores pressure as a sum of base state `PB` and perturbation `P`,
//! and potential temperature as a perturbation `T` from 300 K.

use super::dataset::Dataset;
use crate::constants::{KAPPA, P_0, THETA_0};
use crate::errors::DatasetError;
use log::debug;
use ndarray::Zip;

/// Adds total pressure `TP = P + PB` (Pa).
pub fn add_total_pressure(dataset: &mut Dataset) -> Result<(), DatasetError> {
    let perturbation = dataset.require("P")?;
    let base = dataset.require("PB")?;

    if perturbation.shape() != base.shape() {
        return Err(DatasetError::ShapeMismatch {
            field: "PB".to_string(),
            expected: perturbation.shape().to_vec(),
            found: base.shape().to_vec(),
        });
    }

    let total = perturbation.derive(&perturbation.data + &base.data, "Pa");
    dataset.insert("TP", total)
}

/// Adds potential temperature `theta` and absolute temperature `AT` (K)
/// computed with Poisson's equation:
///
/// `AT = theta * (TP / P_0)^(R_d/c_p)`
///
/// Total pressure is computed first if not present.
pub fn add_absolute_temperature(dataset: &mut Dataset) -> Result<(), DatasetError> {
    debug!("Computing absolute temperature");

    if !dataset.contains("TP") {
        add_total_pressure(dataset)?;
    }

    let perturbation = dataset.require("T")?;
    let pressure = dataset.require("TP")?;

    if perturbation.shape() != pressure.shape() {
        return Err(DatasetError::ShapeMismatch {
            field: "T".to_string(),
            expected: pressure.shape().to_vec(),
            found: perturbation.shape().to_vec(),
        });
    }

    let theta = perturbation.data.mapv(|t| t + THETA_0);

    let temperature = Zip::from(&theta)
        .and(&pressure.data)
        .map_collect(|&theta, &p| theta * (p / P_0).powf(KAPPA));

    let theta = perturbation.derive(theta, "K");
    let temperature = perturbation.derive(temperature, "K");

    dataset.insert("theta", theta)?;
    dataset.insert("AT", temperature)
}

#[cfg(test)]
mod tests {
    use super::{add_absolute_temperature, add_total_pressure};
    use crate::errors::DatasetError;
    use crate::postprocess::dataset::{
        tests::{constant_field, test_coords},
        Dataset,
    };
    use float_cmp::approx_eq;

    fn state() -> Dataset {
        let mut ds = Dataset::new(test_coords(2));
        ds.insert("P", constant_field(-500.0)).unwrap();
        ds.insert("PB", constant_field(85_500.0)).unwrap();
        ds.insert("T", constant_field(0.0)).unwrap();
        ds
    }

    #[test]
    fn total_pressure() {
        let mut ds = state();
        add_total_pressure(&mut ds).unwrap();

        let tp = ds.get("TP").unwrap();
        assert_eq!(tp.units.as_deref(), Some("Pa"));
        assert!(approx_eq!(f64, tp.data[[0, 0, 0, 0]], 85_000.0, ulps = 2));
    }

    #[test]
    fn poisson_equation() {
        let mut ds = state();
        add_absolute_temperature(&mut ds).unwrap();

        let temperature = ds.get("AT").unwrap().data[[1, 2, 3, 4]];
        let expected = 300.0 * (0.85_f64).powf(2.0 / 7.0);

        assert!(approx_eq!(f64, temperature, expected, epsilon = 1e-9));
        assert!(approx_eq!(f64, ds.get("theta").unwrap().data[[0, 0, 0, 0]], 300.0, ulps = 2));
        // around 286 K at 850 hPa for neutral 300 K profile
        assert!((temperature - 286.4).abs() < 0.1);
    }

    #[test]
    fn missing_pressure_component() {
        let mut ds = Dataset::new(test_coords(2));
        ds.insert("T", constant_field(0.0)).unwrap();

        assert!(matches!(
            add_absolute_temperature(&mut ds),
            Err(DatasetError::MissingVariables(_))
        ));
    }
}
