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

//! IOP Diagnostics (IOPD) is the diagnostics engine for
//! comparing single-column and doubly-periodic climate model
//! simulations against each other and against large-eddy
//! simulations and observations.
//!
//! The engine reads all datasets listed in `config.yaml`,
//! reconciles their vertical coordinates, time origins and
//! naming conventions, and writes the numerical content of
//! profile, time series, time-height and diurnal composite plots.

mod constants;
mod diagnostics;
mod errors;

use cap::Cap;
use env_logger::Env;
use log::{error, info};
use std::alloc;

type Float = f64;

/// Global allocator used by the engine.
///
/// Use of static global allocator allows for capping the memory to the limit set by user
/// in configuration file and in effect provide better [OOM error](https://en.wikipedia.org/wiki/Out_of_memory) handling
/// when large NetCDF files are read into memory.
#[global_allocator]
static ALLOCATOR: Cap<alloc::System> = Cap::new(alloc::System, usize::MAX);

/// The main program function.
/// Prepares the runtime environment and calls the [`diagnostics::main`].
///
/// To provide meaningful and high-quality error messages the `env_logger`
/// needs to be initiated before any log messages are possible to occur.
fn main() {
    #[cfg(not(feature = "debug"))]
    let logger_env = Env::new().filter_or("IOPD_LOG_LEVEL", "info");

    #[cfg(feature = "debug")]
    let logger_env = Env::new().filter_or("IOPD_LOG_LEVEL", "debug");

    env_logger::Builder::from_env(logger_env)
        .format_timestamp_millis()
        .init();

    match diagnostics::main() {
        Ok(_) => info!("Diagnostics finished. Check the output directory and log."),
        Err(err) => error!("Diagnostics failed with error: {}", err),
    }
}
