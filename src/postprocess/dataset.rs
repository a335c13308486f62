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

//! Module with the labelled arrays container
//! shared by all post-processing stages.
//!
//! WRF-Chem output is self-describing: each variable has named
//! dimensions (`Time`, `bottom_top`, `south_north`, `west_east`)
//! and attributes. [`Dataset`] keeps just enough of that structure
//! (dimension names, units and horizontal/time coordinates) for
//! the stages to address fields by name and reduce over named axes.

use crate::constants::{SN_DIM, TIME_DIM, WE_DIM};
use crate::{errors::DatasetError, Float};
use chrono::NaiveDateTime;
use log::debug;
use ndarray::{concatenate, Array2, ArrayD, ArrayViewD, Axis};
use rustc_hash::FxHashMap;

/// Single gridded variable with named dimensions
/// and an optional unit annotation.
#[derive(Clone, PartialEq, Debug)]
pub struct Field {
    pub dims: Vec<String>,
    pub data: ArrayD<Float>,
    pub units: Option<String>,
}

impl Field {
    /// Creates a new field checking that every array axis is named.
    pub fn new(dims: &[&str], data: ArrayD<Float>) -> Result<Self, DatasetError> {
        let dims: Vec<String> = dims.iter().map(|d| (*d).to_string()).collect();

        if dims.len() != data.ndim() {
            return Err(DatasetError::DimensionsCount(dims.join(",")));
        }

        Ok(Field {
            dims,
            data,
            units: None,
        })
    }

    /// Creates a field sharing dimensions with `self`
    /// but holding different data.
    pub fn derive(&self, data: ArrayD<Float>, units: &str) -> Field {
        Field {
            dims: self.dims.clone(),
            data,
            units: Some(units.to_string()),
        }
    }

    /// Like [`Field::derive`] but keeps original units.
    fn derive_raw(&self, data: ArrayD<Float>) -> Field {
        Field {
            dims: self.dims.clone(),
            data,
            units: self.units.clone(),
        }
    }

    pub fn with_units(mut self, units: &str) -> Self {
        self.units = Some(units.to_string());
        self
    }

    /// Returns the axis of dimension with given name (if present).
    pub fn axis_of(&self, dim: &str) -> Option<Axis> {
        self.dims.iter().position(|d| d == dim).map(Axis)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn view(&self) -> ArrayViewD<Float> {
        self.data.view()
    }
}

/// Coordinates shared by all fields in the dataset.
///
/// Longitudes and latitudes are stored as 2D (`south_north`, `west_east`)
/// arrays, as WRF grids are curvilinear in geographic coordinates.
#[derive(Clone, PartialEq, Debug)]
pub struct Coordinates {
    pub lons: Array2<Float>,
    pub lats: Array2<Float>,
    pub times: Vec<NaiveDateTime>,
}

impl Default for Coordinates {
    fn default() -> Self {
        Coordinates {
            lons: Array2::default((0, 0)),
            lats: Array2::default((0, 0)),
            times: vec![],
        }
    }
}

impl Coordinates {
    fn horizontal_shape(&self) -> Option<(usize, usize)> {
        if self.lons.is_empty() {
            None
        } else {
            Some(self.lons.dim())
        }
    }
}

/// Ordered collection of named [`Field`]s on common coordinates.
///
/// Stages extend the dataset with derived fields. Inserting a field under
/// an existing name replaces it in place, so recomputing a stage keeps
/// both the values and the order of variables.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Dataset {
    pub coords: Coordinates,
    order: Vec<String>,
    fields: FxHashMap<String, Field>,
}

impl Dataset {
    pub fn new(coords: Coordinates) -> Self {
        Dataset {
            coords,
            order: vec![],
            fields: FxHashMap::default(),
        }
    }

    /// Adds a field to the dataset after checking that
    /// it lies on dataset coordinates.
    pub fn insert(&mut self, name: &str, field: Field) -> Result<(), DatasetError> {
        self.check_coordinates(name, &field)?;

        if self.fields.insert(name.to_string(), field).is_none() {
            self.order.push(name.to_string());
        }

        Ok(())
    }

    fn check_coordinates(&self, name: &str, field: &Field) -> Result<(), DatasetError> {
        let mismatch = |expected: Vec<usize>| DatasetError::ShapeMismatch {
            field: name.to_string(),
            expected,
            found: field.shape().to_vec(),
        };

        if let Some((sn, we)) = self.coords.horizontal_shape() {
            if let Some(ax) = field.axis_of(SN_DIM) {
                if field.data.len_of(ax) != sn {
                    return Err(mismatch(vec![sn, we]));
                }
            }

            if let Some(ax) = field.axis_of(WE_DIM) {
                if field.data.len_of(ax) != we {
                    return Err(mismatch(vec![sn, we]));
                }
            }
        }

        if !self.coords.times.is_empty() {
            if let Some(ax) = field.axis_of(TIME_DIM) {
                if field.data.len_of(ax) != self.coords.times.len() {
                    return Err(mismatch(vec![self.coords.times.len()]));
                }
            }
        }

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Returns the field or the error naming it as missing.
    pub fn require(&self, name: &str) -> Result<&Field, DatasetError> {
        self.fields
            .get(name)
            .ok_or_else(|| DatasetError::MissingVariables(vec![name.to_string()]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.order
            .iter()
            .map(move |name| (name.as_str(), &self.fields[name]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Creates a new dataset with the same coordinates
    /// and copies of the requested fields only.
    ///
    /// All requested names are checked before failing so that
    /// the error lists every missing variable at once.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<Dataset, DatasetError> {
        let mut missing: Vec<String> = vec![];

        for name in names {
            let name: &str = name.as_ref();
            if !self.contains(name) {
                missing.push(name.to_string());
            }
        }

        if !missing.is_empty() {
            return Err(DatasetError::MissingVariables(missing));
        }

        let mut subset = Dataset::new(self.coords.clone());

        for name in names {
            let name: &str = name.as_ref();
            subset.insert(name, self.fields[name].clone())?;
        }

        debug!("Subset of {} variables created", subset.len());

        Ok(subset)
    }

    /// Same as [`Dataset::subset`] for `required` names, but names
    /// from `optional` are copied only if present.
    pub fn subset_with_optional<S: AsRef<str>>(
        &self,
        required: &[S],
        optional: &[S],
    ) -> Result<Dataset, DatasetError> {
        let mut subset = self.subset(required)?;

        for name in optional {
            let name: &str = name.as_ref();
            if let Some(field) = self.get(name) {
                subset.insert(name, field.clone())?;
            }
        }

        Ok(subset)
    }
}

/// Concatenates datasets (usually read from consecutive
/// WRF output files) along the `Time` dimension.
///
/// Fields without `Time` dimension are taken from the first dataset.
/// All datasets must lie on the same horizontal grid and each variable
/// of the first dataset must be present in all others.
pub fn merge(datasets: Vec<Dataset>) -> Result<Dataset, DatasetError> {
    let mut datasets = datasets.into_iter();
    let first = datasets.next().ok_or(DatasetError::EmptyMerge)?;
    let rest: Vec<Dataset> = datasets.collect();

    if rest.is_empty() {
        return Ok(first);
    }

    debug!("Merging {} datasets along Time", rest.len() + 1);

    for ds in &rest {
        if ds.coords.lons != first.coords.lons {
            return Err(DatasetError::CoordinatesMismatch("XLONG"));
        }

        if ds.coords.lats != first.coords.lats {
            return Err(DatasetError::CoordinatesMismatch("XLAT"));
        }

        let missing: Vec<String> = first
            .names()
            .filter(|name| !ds.contains(name))
            .map(str::to_string)
            .collect();

        if !missing.is_empty() {
            return Err(DatasetError::MissingVariables(missing));
        }
    }

    let mut times = first.coords.times.clone();
    for ds in &rest {
        times.extend_from_slice(&ds.coords.times);
    }

    let mut merged = Dataset::new(Coordinates {
        lons: first.coords.lons.clone(),
        lats: first.coords.lats.clone(),
        times,
    });

    for (name, field) in first.iter() {
        let time_axis = match field.axis_of(TIME_DIM) {
            Some(ax) => ax,
            None => {
                merged.insert(name, field.clone())?;
                continue;
            }
        };

        let mut views = vec![field.view()];
        for ds in &rest {
            views.push(ds.require(name)?.view());
        }

        let data = concatenate(time_axis, &views)?;
        merged.insert(name, field.derive_raw(data))?;
    }

    Ok(merged)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{merge, Coordinates, Dataset, Field};
    use crate::errors::DatasetError;
    use chrono::NaiveDate;
    use ndarray::{Array2, ArrayD, Dimension, IxDyn};

    pub const DIMS: [&str; 4] = ["Time", "bottom_top", "south_north", "west_east"];
    pub const SHAPE: [usize; 4] = [2, 3, 4, 5];

    /// Coordinates of small synthetic WRF domain, hourly output.
    pub fn test_coords(n_times: usize) -> Coordinates {
        let start = NaiveDate::from_ymd(2010, 4, 1).and_hms(0, 0, 0);

        Coordinates {
            lons: Array2::from_shape_fn((SHAPE[2], SHAPE[3]), |(_, i)| 75.0 + i as f64),
            lats: Array2::from_shape_fn((SHAPE[2], SHAPE[3]), |(j, _)| 24.0 + j as f64),
            times: (0..n_times)
                .map(|h| start + chrono::Duration::hours(h as i64))
                .collect(),
        }
    }

    pub fn field_from_fn(f: impl Fn(&[usize]) -> f64) -> Field {
        let data = ArrayD::from_shape_fn(IxDyn(&SHAPE), |idx| f(idx.slice()));
        Field::new(&DIMS, data).unwrap()
    }

    pub fn constant_field(value: f64) -> Field {
        field_from_fn(|_| value)
    }

    #[test]
    fn insert_keeps_order_and_replaces() {
        let mut ds = Dataset::new(test_coords(2));

        ds.insert("b", constant_field(1.0)).unwrap();
        ds.insert("a", constant_field(2.0)).unwrap();
        ds.insert("b", constant_field(3.0)).unwrap();

        let names: Vec<&str> = ds.names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(ds.get("b").unwrap().data[[0, 0, 0, 0]], 3.0);
    }

    #[test]
    fn insert_rejects_foreign_grid() {
        let mut ds = Dataset::new(test_coords(2));
        let data = ArrayD::zeros(IxDyn(&[2, 3, 7, 5]));
        let field = Field::new(&DIMS, data).unwrap();

        let result = ds.insert("x", field);
        assert!(matches!(result, Err(DatasetError::ShapeMismatch { .. })));
    }

    #[test]
    fn field_needs_named_axes() {
        let data = ArrayD::zeros(IxDyn(&[2, 3]));
        assert!(Field::new(&["Time"], data).is_err());
    }

    #[test]
    fn subset_names_all_missing() {
        let mut ds = Dataset::new(test_coords(2));
        ds.insert("so4_a01", constant_field(1.0)).unwrap();
        ds.insert("ALT", constant_field(1.0)).unwrap();

        let subset = ds.subset(&["ALT"]).unwrap();
        assert_eq!(subset.len(), 1);
        assert_eq!(subset.coords, ds.coords);

        match ds.subset(&["so4_a01", "so4_a02", "ALT", "nh4_a01"]) {
            Err(DatasetError::MissingVariables(missing)) => {
                assert_eq!(missing, vec!["so4_a02".to_string(), "nh4_a01".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn subset_skips_absent_optional() {
        let mut ds = Dataset::new(test_coords(2));
        ds.insert("ALT", constant_field(1.0)).unwrap();
        ds.insert("PM10", constant_field(1.0)).unwrap();

        let subset = ds
            .subset_with_optional(&["ALT"], &["PM2_5_DRY", "PM10"])
            .unwrap();
        let names: Vec<&str> = subset.names().collect();
        assert_eq!(names, vec!["ALT", "PM10"]);
    }

    #[test]
    fn merge_along_time() {
        let mut first = Dataset::new(test_coords(2));
        first.insert("ALT", constant_field(1.0)).unwrap();

        let mut second = Dataset::new(test_coords(2));
        second.insert("ALT", constant_field(2.0)).unwrap();

        let merged = merge(vec![first, second]).unwrap();
        let alt = merged.get("ALT").unwrap();

        assert_eq!(alt.shape(), &[4, 3, 4, 5]);
        assert_eq!(merged.coords.times.len(), 4);
        assert_eq!(alt.data[[1, 0, 0, 0]], 1.0);
        assert_eq!(alt.data[[2, 0, 0, 0]], 2.0);
    }

    #[test]
    fn merge_requires_common_variables() {
        let mut first = Dataset::new(test_coords(2));
        first.insert("ALT", constant_field(1.0)).unwrap();
        let second = Dataset::new(test_coords(2));

        assert!(matches!(
            merge(vec![first, second]),
            Err(DatasetError::MissingVariables(_))
        ));
        assert!(matches!(merge(vec![]), Err(DatasetError::EmptyMerge)));
    }

    #[test]
    fn merge_requires_common_grid() {
        let mut first = Dataset::new(test_coords(2));
        first.insert("ALT", constant_field(1.0)).unwrap();

        let mut shifted = test_coords(2);
        shifted.lons += 40.0;
        let mut second = Dataset::new(shifted);
        second.insert("ALT", constant_field(1.0)).unwrap();

        assert!(matches!(
            merge(vec![first.clone(), second]),
            Err(DatasetError::CoordinatesMismatch("XLONG"))
        ));

        let mut shifted = test_coords(2);
        shifted.lats.row_mut(0).fill(0.0);
        let mut second = Dataset::new(shifted);
        second.insert("ALT", constant_field(1.0)).unwrap();

        assert!(matches!(
            merge(vec![first, second]),
            Err(DatasetError::CoordinatesMismatch("XLAT"))
        ));
    }
}
