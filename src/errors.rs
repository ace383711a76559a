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

use crate::Float;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagnosticsError {
    #[error("Error while reading config.yaml: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while reading input dataset: {0}")]
    Input(#[from] InputError),

    #[error("Error while aligning dataset times: {0}")]
    Time(#[from] TimeError),

    #[error("Error while writing output: {0}")]
    Output(#[from] OutputError),

    #[error("Cannot set the memory limit of {0} MB, it is below current usage")]
    MemoryLimit(usize),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open config.yaml: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize config.yaml: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds {0}")]
    OutOfBounds(&'static str),

    #[error("Number of datasets ({0}) does not match number of labels ({1})")]
    LabelMismatch(usize, usize),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Error while reading NetCDF file: {0}")]
    NetCDF(#[from] netcdf::Error),

    #[error("Cannot open dataset file {0}")]
    CantOpenFile(String),

    #[error("Variable data does not match its dimensions: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Variable {0} is missing in the dataset")]
    MissingVariable(String),

    #[error("Variable {0} has no {1} axis")]
    MissingAxis(String, &'static str),
}

#[derive(Error, Debug)]
pub enum CoordinateError {
    #[error("Cannot determine height coordinates ('z_mid', 'z_mid_horiz_avg', or 'Z3')")]
    Unresolvable,

    #[error("Variable {0} has neither lev nor ilev axis")]
    NoVerticalAxis(String),

    #[error("Time window selects no time steps")]
    EmptyWindow,

    #[error("Time index {0} is outside of the time axis")]
    IndexOutOfBounds(usize),

    #[error("Coordinate for {0} has {1} values but the variable has {2} levels")]
    LevelMismatch(String, usize, usize),

    #[error("Error while accessing coordinate data: {0}")]
    Input(#[from] InputError),

    #[error("Interpolation of coordinate failed: {0}")]
    Search(#[from] SearchError),
}

/// Reason why a diurnal composite cannot be computed
/// for a dataset, which is skipped without failing the run.
#[derive(Error, Debug)]
pub enum DiurnalGate {
    #[error("Variable {0} is not present")]
    MissingVariable(String),

    #[error("Dataset has no time coordinate")]
    MissingTime,

    #[error("Cannot use variable data: {0}")]
    Input(#[from] InputError),

    #[error("Output every {0} days is too coarse, at least {1} time steps per day are needed")]
    CoarseCadence(Float, usize),

    #[error("Selected record covers {0} days, at least {1} days are needed")]
    TooShort(Float, Float),
}

#[derive(Error, Debug)]
pub enum TimeError {
    #[error("Time units '{0}' contain an invalid calendar date or time")]
    InvalidEpoch(String),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Cannot prepare output directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot write product table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot write products index: {0}")]
    Index(#[from] serde_yaml::Error),
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Searched array is empty")]
    EmptyArray,

    #[error("Searched value is out of array bounds")]
    OutOfBounds,
}
