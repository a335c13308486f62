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

//! Sub-module grouping per-species contributions
//! into aerosol components and total PM.
//!
//! Needs the species contributions computed by
//! [`add_species_contributions`](super::species::add_species_contributions)
//! before use.

use super::schemes::Composite;
use super::species::{pm10_name, pm25_name};
use crate::constants::MASS_CONC_UNITS;
use crate::errors::DatasetError;
use crate::postprocess::dataset::{Dataset, Field};
use log::debug;

const STAGE: &str = "component aggregation";

/// Sums fields with given names in the listed order.
///
/// Names are looked up first in `computed` and then in the dataset.
fn sum_fields(
    dataset: &Dataset,
    computed: &[(String, Field)],
    names: &[String],
) -> Result<Field, DatasetError> {
    let missing = |name: &String| DatasetError::DependencyNotComputed {
        stage: STAGE,
        field: name.clone(),
    };

    let lookup = |name: &String| {
        computed
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, field)| field)
            .or_else(|| dataset.get(name))
            .ok_or_else(|| missing(name))
    };

    let (first, rest) = names
        .split_first()
        .ok_or_else(|| missing(&"<empty composite>".to_string()))?;

    let first = lookup(first)?;
    let mut total = first.data.clone();

    for name in rest {
        let field = lookup(name)?;

        if field.shape() != first.shape() {
            return Err(DatasetError::ShapeMismatch {
                field: name.clone(),
                expected: first.shape().to_vec(),
                found: field.shape().to_vec(),
            });
        }

        total += &field.data;
    }

    Ok(first.derive(total, MASS_CONC_UNITS))
}

/// Adds `pm25_<component>` and `pm10_<component>` fields for every
/// composite and `pm25_total`, `pm10_total` summing composites
/// which are a part of total PM.
///
/// Fields are inserted only after all of them are computed.
pub fn add_components(dataset: &mut Dataset, composites: &[Composite]) -> Result<(), DatasetError> {
    debug!("Aggregating {} aerosol components", composites.len());

    let naming: [fn(&str) -> String; 2] = [pm25_name, pm10_name];
    let mut computed = Vec::with_capacity(2 * (composites.len() + 1));

    for name_of in &naming {
        for composite in composites {
            let members: Vec<String> = composite.species.iter().map(|s| name_of(*s)).collect();
            let sum = sum_fields(dataset, &computed, &members)?;
            computed.push((name_of(composite.name), sum));
        }

        let in_total: Vec<String> = composites
            .iter()
            .filter(|c| c.in_total)
            .map(|c| name_of(c.name))
            .collect();

        let total = sum_fields(dataset, &computed, &in_total)?;
        computed.push((name_of("total"), total));
    }

    for (name, field) in computed {
        dataset.insert(&name, field)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::add_components;
    use crate::errors::DatasetError;
    use crate::postprocess::aerosols::schemes::{Composite, MOSAIC_VBS0};
    use crate::postprocess::dataset::{tests::constant_field, tests::test_coords, Dataset};
    use float_cmp::approx_eq;

    fn contributions(species: &[&str]) -> Dataset {
        let mut ds = Dataset::new(test_coords(2));

        for (i, s) in species.iter().enumerate() {
            let value = 1.0 + i as f64;
            ds.insert(&format!("pm25_{}", s), constant_field(value))
                .unwrap();
            ds.insert(&format!("pm10_{}", s), constant_field(2.0 * value))
                .unwrap();
        }

        ds
    }

    #[test]
    fn soa_and_total_of_vbs0() {
        let mut ds = contributions(MOSAIC_VBS0.species);
        add_components(&mut ds, MOSAIC_VBS0.composites).unwrap();

        // so4=1, nh4=2, no3=3, biog1_o=4, biog1_c=5, smpbb=6, smpa=7, glysoa_sfc=8,
        // oc=9, bc=10, oin=11, na=12, cl=13
        let value = |name: &str| ds.get(name).unwrap().data[[0, 0, 0, 0]];

        assert!(approx_eq!(f64, value("pm25_SOA"), 30.0, ulps = 2));
        assert!(approx_eq!(f64, value("pm25_SOA_glyoxal"), 8.0, ulps = 2));
        assert!(approx_eq!(f64, value("pm25_SOA_anthropogenic"), 13.0, ulps = 2));
        assert!(approx_eq!(f64, value("pm25_SOA_biogenic"), 9.0, ulps = 2));
        assert!(approx_eq!(f64, value("pm25_SIA"), 6.0, ulps = 2));
        assert!(approx_eq!(f64, value("pm25_POA"), 9.0, ulps = 2));
        assert!(approx_eq!(f64, value("pm25_BC"), 10.0, ulps = 2));
        assert!(approx_eq!(f64, value("pm25_dust"), 11.0, ulps = 2));
        assert!(approx_eq!(f64, value("pm25_seasalt"), 25.0, ulps = 2));
        assert!(approx_eq!(f64, value("pm25_total"), 91.0, ulps = 2));
        assert!(approx_eq!(f64, value("pm10_total"), 182.0, ulps = 2));

        assert_eq!(
            ds.get("pm25_total").unwrap().units.as_deref(),
            Some("ug m-3")
        );
    }

    #[test]
    fn requires_species_step() {
        let mut ds = contributions(&["so4", "nh4"]);
        let composites = [Composite {
            name: "SIA",
            species: &["so4", "nh4", "no3"],
            in_total: true,
        }];

        match add_components(&mut ds, &composites) {
            Err(DatasetError::DependencyNotComputed { field, .. }) => {
                assert_eq!(field, "pm25_no3");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(!ds.contains("pm25_SIA"));
    }

    #[test]
    fn missing_pm10_leaves_no_pm25() {
        let mut ds = Dataset::new(test_coords(2));
        for s in MOSAIC_VBS0.species {
            ds.insert(&format!("pm25_{}", s), constant_field(1.0))
                .unwrap();
        }

        match add_components(&mut ds, MOSAIC_VBS0.composites) {
            Err(DatasetError::DependencyNotComputed { field, .. }) => {
                assert!(field.starts_with("pm10_"));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(!ds.contains("pm25_SOA"));
        assert!(!ds.contains("pm25_total"));
        assert_eq!(ds.len(), MOSAIC_VBS0.species.len());
    }
}
