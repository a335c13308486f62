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

//! Sub-module with species and component tables
//! of supported WRF-Chem chemistry options.
//!
//! Lists follow the `sum_pm_mosaic_vbs0` and `sum_pm_mosaic_vbs4`
//! subroutines of WRF-Chem `module_mosaic_sumpm.F`, so that
//! reconstructed totals match the `PM2_5_DRY` and `PM10` diagnostics.

use crate::errors::ConfigError;
use serde::Deserialize;
use std::convert::TryFrom;

/// Composite aerosol category summed from per-species contributions.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Composite {
    pub name: &'static str,
    pub species: &'static [&'static str],

    /// Whether the composite is a part of the total PM.
    /// Sub-totals of other composites are not.
    pub in_total: bool,
}

/// Tables describing aerosol species of single chemistry option.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Scheme {
    pub chem_opt: u16,
    pub species: &'static [&'static str],
    pub composites: &'static [Composite],
    pub vapours: &'static [&'static str],
}

/// Chemistry options of WRF-Chem handled by the toolkit.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Deserialize)]
#[serde(try_from = "u16")]
pub enum ChemOpt {
    /// `chem_opt = 201`, MOZART-MOSAIC 4 bins with simple SOA (VBS-0)
    MosaicVbs0,
    /// `chem_opt = 202`, MOZART-MOSAIC 4 bins with VBS-4 and glyoxal SOA
    MosaicVbs4,
}

impl TryFrom<u16> for ChemOpt {
    type Error = ConfigError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            201 => Ok(ChemOpt::MosaicVbs0),
            202 => Ok(ChemOpt::MosaicVbs4),
            other => Err(ConfigError::UnknownChemOpt(other)),
        }
    }
}

impl ChemOpt {
    pub fn scheme(self) -> &'static Scheme {
        match self {
            ChemOpt::MosaicVbs0 => &MOSAIC_VBS0,
            ChemOpt::MosaicVbs4 => &MOSAIC_VBS4,
        }
    }
}

const SIA: Composite = Composite {
    name: "SIA",
    species: &["so4", "nh4", "no3"],
    in_total: true,
};

const POA: Composite = Composite {
    name: "POA",
    species: &["oc"],
    in_total: true,
};

const SEASALT: Composite = Composite {
    name: "seasalt",
    species: &["na", "cl"],
    in_total: true,
};

const DUST: Composite = Composite {
    name: "dust",
    species: &["oin"],
    in_total: true,
};

const BC: Composite = Composite {
    name: "BC",
    species: &["bc"],
    in_total: true,
};

pub static MOSAIC_VBS0: Scheme = Scheme {
    chem_opt: 201,
    species: &[
        "so4",
        "nh4",
        "no3",
        "biog1_o",
        "biog1_c",
        "smpbb",
        "smpa",
        "glysoa_sfc",
        "oc",
        "bc",
        "oin",
        "na",
        "cl",
    ],
    composites: &[
        Composite {
            name: "SOA",
            species: &["biog1_o", "biog1_c", "smpbb", "smpa", "glysoa_sfc"],
            in_total: true,
        },
        Composite {
            name: "SOA_glyoxal",
            species: &["glysoa_sfc"],
            in_total: false,
        },
        // biomass burning SOA is counted as anthropogenic
        Composite {
            name: "SOA_anthropogenic",
            species: &["smpa", "smpbb"],
            in_total: false,
        },
        Composite {
            name: "SOA_biogenic",
            species: &["biog1_o", "biog1_c"],
            in_total: false,
        },
        SIA,
        POA,
        SEASALT,
        DUST,
        BC,
    ],
    vapours: &[],
};

pub static MOSAIC_VBS4: Scheme = Scheme {
    chem_opt: 202,
    species: &[
        "so4",
        "nh4",
        "no3",
        "glysoa_r1",
        "glysoa_r2",
        "glysoa_oh",
        "glysoa_sfc",
        "glysoa_nh4",
        "oc",
        "bc",
        "oin",
        "na",
        "cl",
        "asoaX",
        "asoa1",
        "asoa2",
        "asoa3",
        "asoa4",
        "bsoaX",
        "bsoa1",
        "bsoa2",
        "bsoa3",
        "bsoa4",
    ],
    composites: &[
        Composite {
            name: "SOA",
            species: &[
                "glysoa_r1",
                "glysoa_r2",
                "glysoa_oh",
                "glysoa_nh4",
                "glysoa_sfc",
                "asoaX",
                "asoa1",
                "asoa2",
                "asoa3",
                "asoa4",
                "bsoaX",
                "bsoa1",
                "bsoa2",
                "bsoa3",
                "bsoa4",
            ],
            in_total: true,
        },
        Composite {
            name: "SOA_glyoxal",
            species: &[
                "glysoa_r1",
                "glysoa_r2",
                "glysoa_oh",
                "glysoa_nh4",
                "glysoa_sfc",
            ],
            in_total: false,
        },
        Composite {
            name: "SOA_anthropogenic",
            species: &["asoaX", "asoa1", "asoa2", "asoa3", "asoa4"],
            in_total: false,
        },
        Composite {
            name: "SOA_biogenic",
            species: &["bsoaX", "bsoa1", "bsoa2", "bsoa3", "bsoa4"],
            in_total: false,
        },
        SIA,
        POA,
        SEASALT,
        DUST,
        BC,
    ],
    vapours: &[
        "cvasoaX", "cvasoa1", "cvasoa2", "cvasoa3", "cvasoa4", "cvbsoaX", "cvbsoa1", "cvbsoa2",
        "cvbsoa3", "cvbsoa4",
    ],
};
