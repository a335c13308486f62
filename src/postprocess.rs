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

//! Module containing the post-processing pipeline.
//!
//! Each run listed in `config.yaml` is processed independently:
//!
//! 1. WRF-Chem output files are read and concatenated along `Time`
//!    ([`input::load_run`]).
//! 2. PM2.5 and PM10 of each species, component and total are
//!    reconstructed from aerosol bins ([`aerosols::get_aerosols`]).
//! 3. Optionally, total pressure and absolute temperature are derived
//!    ([`thermodynamics`]).
//! 4. Reconstructed totals are compared with `PM2_5_DRY` and `PM10`
//!    diagnostics ([`aerosols::validate`]).
//! 5. Validation results and domain-mean (or region-mean) time series
//!    at the selected level are saved to `./output/`.
//!
//! Runs are deployed onto a thread pool, and a failure of one run
//! does not stop the others.

mod aerosols;
mod configuration;
mod dataset;
mod input;
mod output;
mod statistics;
mod thermodynamics;


use self::{
    aerosols::Validation,
    configuration::{Config, Run},
    dataset::Dataset,
    output::TimeSeries,
};
use crate::{
    errors::{DatasetError, PipelineError},
    Float, ALLOCATOR,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{
    fs,
    path::Path,
    sync::{mpsc, Arc},
};

/// Main post-processing function.
///
/// It reads the provided configuration, deploys runs
/// onto the threadpool and reports their results.
pub fn main() -> Result<(), PipelineError> {
    info!("Preparing the post-processing core");

    let out_dir = Path::new("./output/");
    prepare_output_dir(out_dir)?;

    let core = Core::new()?;

    let runs_count = core.config.runs.len();
    let config = Arc::new(core.config);

    info!("Deploying {} runs", runs_count);

    // set progress bar for processed runs
    let runs_bar = ProgressBar::new(runs_count as u64);
    runs_bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .progress_chars("#>-"),
    );
    runs_bar.set_prefix("Processed runs");

    let (tx, rx) = mpsc::channel();

    for run_idx in 0..runs_count {
        let tx = tx.clone();
        let config = Arc::clone(&config);

        core.threadpool.spawn(move || {
            let run = &config.runs[run_idx];
            let result = process_run(run, config.validation.tolerance, out_dir);
            tx.send((run_idx, result)).ok();
        });
    }

    // all senders are now owned by the workers
    drop(tx);

    let mut failed_runs = 0;

    for (run_idx, run_result) in rx {
        let name = &config.runs[run_idx].name;

        match run_result {
            Ok(results) => {
                let passed = results.iter().all(|r| r.passed);
                debug!("Run {} finished, validation passed: {}", name, passed);
            }
            Err(err) => {
                failed_runs += 1;
                error!(
                    "Run {} failed due to an error, check the details and rerun: {}",
                    name, err
                );
                // make sure that the error message is fully written
                // before the progress bar updates
                println!();
            }
        }
        runs_bar.inc(1);
    }

    runs_bar.finish_with_message("All runs finished");

    batch_outcome(failed_runs, runs_count)
}

/// Batch fails only if none of its runs produced results.
fn batch_outcome(failed_runs: usize, runs_count: usize) -> Result<(), PipelineError> {
    if failed_runs == runs_count {
        return Err(PipelineError::AllRunsFailed(runs_count));
    }

    if failed_runs > 0 {
        warn!("{} of {} runs failed", failed_runs, runs_count);
    }

    Ok(())
}

/// Structure containing post-processing prerequisites.
#[derive(Debug)]
pub struct Core {
    pub config: Config,
    pub threadpool: ThreadPool,
}

impl Core {
    /// Reads configuration, sets the memory limit
    /// and prepares the threadpool.
    pub fn new() -> Result<Self, PipelineError> {
        debug!("Reading configuration from config.yaml");
        let config = Config::new_from_file(Path::new("config.yaml"))?;

        debug!("Setting memory limit");
        let memory = config.resources.memory;
        ALLOCATOR
            .set_limit(memory.saturating_mul(1024 * 1024))
            .map_err(|_| {
                PipelineError::MemoryLimit(format!("{} MB is below current heap usage", memory))
            })?;

        debug!("Setting up ThreadPool");
        let threadpool = ThreadPoolBuilder::new()
            .num_threads(config.resources.threads as usize)
            .build()?;

        Ok(Core { config, threadpool })
    }
}

/// Checks that the output directory is empty or creates it,
/// so that results of previous runs are never overwritten.
fn prepare_output_dir(out_path: &Path) -> Result<(), PipelineError> {
    debug!("Checking and setting output directory");

    if out_path.is_dir() {
        if out_path.read_dir()?.next().is_none() {
            debug!("Output directory exists but is empty so continuing");
        } else {
            return Err(PipelineError::FaultyOutput(
                "Output directory exists and is not empty",
            ));
        }
    } else {
        debug!("Output directory does not exist so creating a new one");
        fs::create_dir(out_path)?;
    }

    Ok(())
}

/// Results of post-processing a single run.
#[derive(Clone, PartialEq, Debug)]
pub struct Processed {
    pub aerosols: Dataset,
    pub validation: Vec<Validation>,
    pub series: TimeSeries,
}

/// Reconstructs, validates and summarises WRF-Chem output of a run.
pub fn postprocess_dataset(
    raw: &Dataset,
    run: &Run,
    tolerance: Float,
) -> Result<Processed, DatasetError> {
    let scheme = run.chem_opt.scheme();

    let mut aerosols = aerosols::get_aerosols(raw, scheme, run.vapours)?;

    if run.thermodynamics {
        thermodynamics::add_absolute_temperature(&mut aerosols)?;
    }

    let validation = aerosols::validate(&aerosols, tolerance)?;

    let columns = output::series_columns(scheme, &aerosols);

    let series = match run.region {
        Some(region) => {
            debug!("Limiting time series of {} to {:?}", run.name, region);
            let selected = aerosols.subset(&columns)?;
            let selected = statistics::space_subset(&selected, region.lat, region.lon)?;
            output::time_series(&selected, &columns, run.level)?
        }
        None => output::time_series(&aerosols, &columns, run.level)?,
    };

    Ok(Processed {
        aerosols,
        validation,
        series,
    })
}

fn process_run(
    run: &Run,
    tolerance: Float,
    out_dir: &Path,
) -> Result<Vec<Validation>, PipelineError> {
    info!("Processing run {}", run.name);

    let raw = input::load_run(&run.data_files)?;
    let processed = postprocess_dataset(&raw, run, tolerance)?;

    output::save_run(
        out_dir,
        &run.name,
        &processed.validation,
        &processed.series,
    )?;

    Ok(processed.validation)
}
