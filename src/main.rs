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

//! WRF-Chem Particulate Matter Toolkit (WCPM) is a post-processor
//! for WRF-Chem simulations run with the MOSAIC 4-bin aerosol scheme
//! developed for air-quality studies over the Indo-Gangetic Plain.
//!
//! The toolkit reconstructs PM2.5 and PM10 mass concentrations
//! (per species and per aerosol component) from raw aerosol bins
//! mixing ratios, exactly as the WRF-Chem `sum_pm_mosaic` routines do,
//! and checks them against the diagnostic variables written by the model.

mod constants;
mod errors;
mod postprocess;

use cap::Cap;
use env_logger::Env;
use log::{error, info};
use std::alloc;

type Float = f64;

/// Global allocator used by the toolkit.
///
/// Use of static global allocator allows for capping the memory to the limit set by user
/// in configuration file. WRF-Chem output is large, so hitting the limit gives
/// a clear [OOM error](https://en.wikipedia.org/wiki/Out_of_memory) instead of a killed process.
#[global_allocator]
static ALLOCATOR: Cap<alloc::System> = Cap::new(alloc::System, usize::MAX);

/// The main program function.
/// Prepares the runtime environment and calls the [`postprocess::main`].
///
/// The `env_logger` needs to be initiated before any log
/// messages are possible to occur.
fn main() {
    #[cfg(not(feature = "debug"))]
    let logger_env = Env::new().filter_or("WCPM_LOG_LEVEL", "info");

    #[cfg(feature = "debug")]
    let logger_env = Env::new().filter_or("WCPM_LOG_LEVEL", "debug");

    env_logger::Builder::from_env(logger_env)
        .format_timestamp_millis()
        .init();

    match postprocess::main() {
        Ok(_) => info!("Post-processing finished. Check the output directory and log."),
        Err(err) => error!("Post-processing failed with error: {}", err),
    }
}
