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

//! Module writing post-processing results to CSV files.

use super::aerosols::{
    schemes::Scheme, species::pm10_name, species::pm25_name, vapours::vapour_mass_name, Validation,
};
use super::dataset::Dataset;
use super::statistics::{level_slice, space_mean, time_mean};
use crate::constants::{PM10_DIAG, PM25_DIAG, TIME_DIM};
use crate::errors::{DatasetError, PipelineError};
use crate::Float;
use chrono::NaiveDateTime;
use log::debug;
use std::{io, path::Path};

/// Domain-mean values of selected fields for every output time.
#[derive(Clone, PartialEq, Debug)]
pub struct TimeSeries {
    pub columns: Vec<String>,
    pub times: Vec<NaiveDateTime>,

    /// Values in `[time][column]` order.
    pub rows: Vec<Vec<Float>>,

    /// Mean over the whole period of each column.
    pub mean: Vec<Float>,
}

/// Names of fields included in the time series: components and totals
/// of PM2.5 and PM10 followed by WRF-Chem diagnostics, vapour mass
/// concentrations and absolute temperature present in the dataset.
pub fn series_columns(scheme: &Scheme, dataset: &Dataset) -> Vec<String> {
    let mut columns = vec![];

    for name_of in &[pm25_name as fn(&str) -> String, pm10_name] {
        columns.extend(scheme.composites.iter().map(|c| name_of(c.name)));
        columns.push(name_of("total"));
    }

    let optional = [PM25_DIAG.to_string(), PM10_DIAG.to_string()]
        .into_iter()
        .chain(scheme.vapours.iter().map(|v| vapour_mass_name(v)))
        .chain(std::iter::once("AT".to_string()));

    columns.extend(optional.filter(|name| dataset.contains(name)));

    columns
}

/// Computes domain-mean time series of listed fields at given vertical level.
pub fn time_series(
    dataset: &Dataset,
    columns: &[String],
    level: usize,
) -> Result<TimeSeries, DatasetError> {
    let selected = dataset.subset(columns)?;
    let averaged = space_mean(&level_slice(&selected, level)?)?;

    let period_mean = time_mean(&averaged)?;

    let times = averaged.coords.times.clone();
    let mut rows = vec![Vec::with_capacity(columns.len()); times.len()];
    let mut mean = Vec::with_capacity(columns.len());

    for column in columns {
        let field = averaged.require(column)?;

        if field.dims != [TIME_DIM] {
            return Err(DatasetError::ShapeMismatch {
                field: column.clone(),
                expected: vec![times.len()],
                found: field.shape().to_vec(),
            });
        }

        for (row, value) in rows.iter_mut().zip(field.data.iter()) {
            row.push(*value);
        }

        let field_mean = period_mean.require(column)?;
        mean.push(field_mean.data.iter().next().copied().unwrap_or(Float::NAN));
    }

    Ok(TimeSeries {
        columns: columns.to_vec(),
        times,
        rows,
        mean,
    })
}

pub fn write_validation<W: io::Write>(
    writer: &mut csv::Writer<W>,
    results: &[Validation],
) -> Result<(), csv::Error> {
    for result in results {
        writer.serialize(result)?;
    }

    writer.flush()?;

    Ok(())
}

pub fn write_time_series<W: io::Write>(
    writer: &mut csv::Writer<W>,
    series: &TimeSeries,
) -> Result<(), csv::Error> {
    let mut header = vec!["datetime".to_string()];
    header.extend(series.columns.iter().cloned());
    writer.write_record(&header)?;

    for (time, row) in series.times.iter().zip(&series.rows) {
        let mut record = vec![time.format("%Y-%m-%d %H:%M:%S").to_string()];
        record.extend(row.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }

    let mut record = vec!["mean".to_string()];
    record.extend(series.mean.iter().map(|v| v.to_string()));
    writer.write_record(&record)?;

    writer.flush()?;

    Ok(())
}

/// Writes both output files of a run into `out_dir`.
pub fn save_run(
    out_dir: &Path,
    run_name: &str,
    results: &[Validation],
    series: &TimeSeries,
) -> Result<(), PipelineError> {
    let validation_path = out_dir.join(format!("{}_validation.csv", run_name));
    debug!("Writing {}", validation_path.display());
    write_validation(&mut csv::Writer::from_path(validation_path)?, results)?;

    let series_path = out_dir.join(format!("{}_timeseries.csv", run_name));
    debug!("Writing {}", series_path.display());
    write_time_series(&mut csv::Writer::from_path(series_path)?, series)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{series_columns, time_series, write_time_series, write_validation};
    use crate::errors::DatasetError;
    use crate::postprocess::aerosols::{
        schemes::{MOSAIC_VBS0, MOSAIC_VBS4},
        Validation,
    };
    use crate::postprocess::dataset::{
        tests::{constant_field, field_from_fn, test_coords},
        Dataset,
    };
    use float_cmp::approx_eq;

    fn totals() -> Dataset {
        let mut ds = Dataset::new(test_coords(2));
        ds.insert(
            "pm25_total",
            field_from_fn(|idx| (idx[0] * 10 + idx[1] * 100 + idx[3]) as f64),
        )
        .unwrap();
        ds.insert("PM2_5_DRY", constant_field(1.0)).unwrap();
        ds
    }

    #[test]
    fn columns_of_vbs0() {
        let columns = series_columns(&MOSAIC_VBS0, &totals());

        assert_eq!(columns.first().map(String::as_str), Some("pm25_SOA"));
        assert!(columns.contains(&"pm10_total".to_string()));
        assert!(columns.contains(&"PM2_5_DRY".to_string()));
        assert!(!columns.contains(&"PM10".to_string()));
        assert_eq!(columns.len(), 2 * (MOSAIC_VBS0.composites.len() + 1) + 1);
    }

    #[test]
    fn columns_of_vapours_and_temperature() {
        let mut ds = totals();
        ds.insert("mass_cvasoa1", constant_field(1.0)).unwrap();
        ds.insert("AT", constant_field(290.0)).unwrap();

        let columns = series_columns(&MOSAIC_VBS4, &ds);

        assert!(columns.contains(&"mass_cvasoa1".to_string()));
        assert!(!columns.contains(&"mass_cvbsoa1".to_string()));
        assert_eq!(columns.last().map(String::as_str), Some("AT"));

        let columns = series_columns(&MOSAIC_VBS4, &totals());
        assert!(!columns.iter().any(|c| c.starts_with("mass_") || c == "AT"));
    }

    #[test]
    fn surface_series() {
        let columns = vec!["pm25_total".to_string(), "PM2_5_DRY".to_string()];
        let series = time_series(&totals(), &columns, 0).unwrap();

        assert_eq!(series.times.len(), 2);
        assert!(approx_eq!(f64, series.rows[0][0], 2.0, ulps = 2));
        assert!(approx_eq!(f64, series.rows[1][0], 12.0, ulps = 2));
        assert!(approx_eq!(f64, series.rows[1][1], 1.0, ulps = 2));
        assert!(approx_eq!(f64, series.mean[0], 7.0, ulps = 2));

        let series = time_series(&totals(), &columns, 1).unwrap();
        assert!(approx_eq!(f64, series.rows[0][0], 102.0, ulps = 2));
    }

    #[test]
    fn series_of_missing_field() {
        let columns = vec!["pm10_total".to_string()];

        assert!(matches!(
            time_series(&totals(), &columns, 0),
            Err(DatasetError::MissingVariables(_))
        ));
    }

    #[test]
    fn csv_layout() {
        let columns = vec!["pm25_total".to_string()];
        let series = time_series(&totals(), &columns, 0).unwrap();

        let mut writer = csv::Writer::from_writer(vec![]);
        write_time_series(&mut writer, &series).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "datetime,pm25_total");
        assert_eq!(lines[1], "2010-04-01 00:00:00,2");
        assert_eq!(lines[2], "2010-04-01 01:00:00,12");
        assert_eq!(lines[3], "mean,7");

        let mut writer = csv::Writer::from_writer(vec![]);
        let results = [Validation {
            reconstructed: "pm25_total",
            diagnostic: "PM2_5_DRY",
            max_relative_error: 0.0,
            passed: true,
        }];
        write_validation(&mut writer, &results).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert!(text.starts_with("reconstructed,diagnostic,max_relative_error,passed\n"));
        assert!(text.contains("pm25_total,PM2_5_DRY,0.0,true"));
    }
}
