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

//! Module containing physical constants and naming
//! conventions used by the toolkit.

use crate::Float;

/// Unit annotation attached to every reconstructed mass concentration.
pub const MASS_CONC_UNITS: &str = "ug m-3";

/// Molar mass of dry air (g/mol) used in the ppmv conversion.
pub const AIR_MOLAR_MASS: Float = 29.0;

/// Assumed molar mass (g/mol) of condensable organic vapours.
///
/// Following the VBS parameterisation used in WRF-Chem
/// (Knote et al., 2015) all volatility bins share one value.
pub const VAPOUR_MOLAR_MASS: Float = 250.0;

/// Parts per million by volume to mole fraction.
pub const PPMV: Float = 1.0e-6;

/// Kilograms per cubic metre to micrograms per cubic metre.
pub const KG_TO_UG: Float = 1.0e9;

/// Reference pressure (Pa) of WRF potential temperature.
pub const P_0: Float = 100_000.0;

/// Base state potential temperature (K) added to WRF perturbation `T`.
pub const THETA_0: Float = 300.0;

/// Poisson constant `R_d/c_p` for dry air.
pub const KAPPA: Float = 2.0 / 7.0;

/// Default relative tolerance for checking reconstructed totals
/// against WRF-Chem diagnostics.
pub const DEFAULT_TOLERANCE: Float = 1.0e-6;

/// Names of aerosol size bins, first three cover particles below 2.5 um.
pub const FINE_BINS: [&str; 3] = ["a01", "a02", "a03"];

/// Coarse bin added on top of fine bins for PM10.
pub const COARSE_BIN: &str = "a04";

/// WRF inverse dry air density (m3 kg-1).
pub const ALT: &str = "ALT";

/// WRF diagnostic dry PM2.5.
pub const PM25_DIAG: &str = "PM2_5_DRY";

/// WRF diagnostic PM10.
pub const PM10_DIAG: &str = "PM10";

/// WRF dimension names.
pub const TIME_DIM: &str = "Time";
pub const LEVEL_DIM: &str = "bottom_top";
pub const SN_DIM: &str = "south_north";
pub const WE_DIM: &str = "west_east";
