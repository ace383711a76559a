/*
Copyright 2021 Jakub Lewandowski

This file is part of IOP Diagnostics (IOPD).

IOP Diagnostics (IOPD) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

IOP Diagnostics (IOPD) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with IOP Diagnostics (IOPD). If not, see https://www.gnu.org/licenses/.
*/

//! Module containing constants used by the diagnostics.

use crate::Float;

/// Assumed height (in meters) of the lowest model layer
/// midpoint above the surface, used when converting `Z3`
/// (height above sea level) to height above surface.
pub const SURFACE_LAYER_OFFSET: Float = 10.0;

/// Reference pressure (in hPa) multiplying the `A` hybrid coefficient.
pub const HYBRID_REFERENCE_PRESSURE: Float = 1000.0;

/// Pa per hPa
pub const PA_PER_HPA: Float = 100.0;

pub const HOURS_PER_DAY: Float = 24.0;

/// Minimal output cadence for diurnal composites.
pub const MIN_STEPS_PER_DAY: usize = 4;

/// Minimal record length (in days) for diurnal composites.
pub const MIN_COMPOSITE_DAYS: Float = 3.0;

/// Number of columns in time-height panel grids.
pub const PANEL_COLUMNS: usize = 2;

/// Number of contour levels of shared color scales.
pub const COLOR_LEVELS: usize = 20;

/// Relative widening of a degenerate (constant) color scale.
pub const SCALE_WIDENING: Float = 0.01;

pub const TIME_AXIS: &str = "time";
pub const MID_LEVEL_AXIS: &str = "lev";
pub const INTERFACE_LEVEL_AXIS: &str = "ilev";

/// Surface pressure fields (in Pa) in order of precedence.
pub const SURFACE_PRESSURE_FIELDS: [&str; 3] = ["PS", "ps", "ps_horiz_avg"];

/// Hybrid `A` and `B` coefficients at layer midpoints.
pub const MID_HYBRID_COEFFICIENTS: (&str, &str) = ("hyam", "hybm");

/// Hybrid `A` and `B` coefficients at layer interfaces.
pub const INTERFACE_HYBRID_COEFFICIENTS: (&str, &str) = ("hyai", "hybi");

pub const CONVECTIVE_PRECIP: &str = "PRECC";
pub const LARGE_SCALE_PRECIP: &str = "PRECL";
pub const TOTAL_PRECIP: &str = "PRECT";
pub const TOTAL_PRECIP_LONG_NAME: &str = "Total Surface Precipitation Rate";

/// Long name placeholder written by some models
/// for variables without a description.
pub const MISSING_LONG_NAME: &str = "MISSING";
