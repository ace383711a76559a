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

//! Module responsible for storing datasets in memory
//! and providing their variables to the diagnostic passes.
//!
//! Datasets come from different sources (model output,
//! LES, observations) and do not share the set of axes
//! nor variables. The accessors here absorb that heterogeneity
//! by reducing every variable to the shape a pass needs.

pub mod derived;
pub mod reader;
pub mod statistics;

use self::statistics::nanmean_axis;
use crate::constants::{INTERFACE_LEVEL_AXIS, MID_LEVEL_AXIS, TIME_AXIS};
use crate::{errors::InputError, Float};
use ndarray::{Array1, Array2, ArrayD, Ix1, Ix2};
use rustc_hash::FxHashMap;

/// Vertical axis a variable is defined on.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum LevelAxis {
    /// Layer midpoints (`lev`).
    Mid,

    /// Layer interfaces (`ilev`).
    Interface,
}

impl LevelAxis {
    pub fn name(&self) -> &'static str {
        match self {
            LevelAxis::Mid => MID_LEVEL_AXIS,
            LevelAxis::Interface => INTERFACE_LEVEL_AXIS,
        }
    }
}

/// Single named array with its metadata.
#[derive(Clone, PartialEq, Debug)]
pub struct Variable {
    pub dims: Vec<String>,
    pub data: ArrayD<Float>,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

impl Variable {
    pub fn new(dims: &[&str], data: ArrayD<Float>) -> Self {
        Variable {
            dims: dims.iter().map(|d| d.to_string()).collect(),
            data,
            units: None,
            long_name: None,
        }
    }

    #[cfg(test)]
    pub fn with_units(mut self, units: &str) -> Self {
        self.units = Some(units.to_string());
        self
    }

    #[cfg(test)]
    pub fn with_long_name(mut self, long_name: &str) -> Self {
        self.long_name = Some(long_name.to_string());
        self
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn has_axis(&self, axis: &str) -> bool {
        self.dims.iter().any(|d| d == axis)
    }

    pub fn has_time(&self) -> bool {
        self.has_axis(TIME_AXIS)
    }

    /// Length of the named axis, if the variable has it.
    pub fn axis_len(&self, axis: &str) -> Option<usize> {
        self.dims
            .iter()
            .position(|d| d == axis)
            .map(|p| self.data.shape()[p])
    }

    /// Vertical axis of the variable, midpoints take
    /// precedence in the (malformed) case of both.
    pub fn level_axis(&self) -> Option<LevelAxis> {
        if self.has_axis(MID_LEVEL_AXIS) {
            Some(LevelAxis::Mid)
        } else if self.has_axis(INTERFACE_LEVEL_AXIS) {
            Some(LevelAxis::Interface)
        } else {
            None
        }
    }

    /// Reduces the variable to the `keep` axes (in that order)
    /// by averaging over all other axes (typically `ncol`).
    fn reduce_to(&self, name: &str, keep: &[&'static str]) -> Result<ArrayD<Float>, InputError> {
        let mut positions = Vec::with_capacity(keep.len());

        for axis in keep {
            let position = self
                .dims
                .iter()
                .position(|d| d == axis)
                .ok_or_else(|| InputError::MissingAxis(name.to_string(), axis))?;
            positions.push(position);
        }

        let mut reduced = self.data.clone();
        let mut remaining: Vec<usize> = (0..self.ndim()).collect();

        // averaging from the last axis keeps lower positions valid
        for axis in (0..self.ndim()).rev() {
            if !positions.contains(&axis) {
                reduced = nanmean_axis(reduced.view(), axis);
                remaining.remove(axis);
            }
        }

        let order: Vec<usize> = positions
            .iter()
            .filter_map(|p| remaining.iter().position(|r| r == p))
            .collect();

        Ok(reduced.permuted_axes(order))
    }

    /// The variable as a `(time, level)` array.
    pub fn time_level(&self, name: &str) -> Result<Array2<Float>, InputError> {
        let axis = self
            .level_axis()
            .ok_or_else(|| InputError::MissingAxis(name.to_string(), MID_LEVEL_AXIS))?;

        let reduced = self.reduce_to(name, &[TIME_AXIS, axis.name()])?;

        Ok(reduced.into_dimensionality::<Ix2>()?)
    }

    /// The variable as a time series.
    pub fn time_series(&self, name: &str) -> Result<Array1<Float>, InputError> {
        let reduced = self.reduce_to(name, &[TIME_AXIS])?;

        Ok(reduced.into_dimensionality::<Ix1>()?)
    }

    /// The variable as a single vertical column,
    /// for fields without time axis (eg. hybrid coefficients).
    pub fn column(&self, name: &str) -> Result<Array1<Float>, InputError> {
        let axis = self
            .level_axis()
            .ok_or_else(|| InputError::MissingAxis(name.to_string(), MID_LEVEL_AXIS))?;

        let reduced = self.reduce_to(name, &[axis.name()])?;

        Ok(reduced.into_dimensionality::<Ix1>()?)
    }
}

/// Immutable bundle of variables read from one file.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub name: String,
    variables: FxHashMap<String, Variable>,
    pub global_attributes: FxHashMap<String, String>,
}

impl Dataset {
    pub fn new(name: &str) -> Self {
        Dataset {
            name: name.to_string(),
            variables: FxHashMap::default(),
            global_attributes: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, name: &str, variable: Variable) {
        self.variables.insert(name.to_string(), variable);
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Checks if a variable with given name is present
    /// as data variable (not only as a coordinate).
    pub fn contains(&self, name: &str) -> bool {
        self.variable(name)
            .map_or(false, |var| !is_coordinate(name, var))
    }

    /// Gets the variable or errors if it is missing.
    pub fn require(&self, name: &str) -> Result<&Variable, InputError> {
        self.variable(name)
            .ok_or_else(|| InputError::MissingVariable(name.to_string()))
    }

    /// Iterates over data variables, omitting coordinate
    /// variables such as `time` or `lev`.
    pub fn data_variables(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.variables
            .iter()
            .filter(|(name, var)| !is_coordinate(name, var))
    }

    /// Raw values of the `time` coordinate (in days).
    pub fn times(&self) -> Option<Array1<Float>> {
        let time = self.variable(TIME_AXIS)?;
        time.data.clone().into_dimensionality::<Ix1>().ok()
    }

    /// The `units` attribute of the `time` coordinate.
    pub fn time_units(&self) -> Option<&str> {
        self.variable(TIME_AXIS)?.units.as_deref()
    }

    /// Number of levels along the given axis, taken from
    /// the coordinate or from any variable defined on it.
    pub fn level_count(&self, axis: LevelAxis) -> Option<usize> {
        self.variables
            .values()
            .find_map(|var| var.axis_len(axis.name()))
    }

    /// Number of time steps in the dataset.
    pub fn time_count(&self) -> Option<usize> {
        if let Some(time) = self.variable(TIME_AXIS) {
            return Some(time.data.len());
        }

        self.variables
            .values()
            .find_map(|var| var.axis_len(TIME_AXIS))
    }

    /// Values of the level coordinate. When the coordinate
    /// is not stored, level indices are used, with interfaces
    /// placed half a level above and below midpoints.
    pub fn level_values(&self, axis: LevelAxis) -> Option<Array1<Float>> {
        if let Some(coord) = self.variable(axis.name()) {
            if let Ok(values) = coord.data.clone().into_dimensionality::<Ix1>() {
                return Some(values);
            }
        }

        let count = self.level_count(axis)?;

        let values = match axis {
            LevelAxis::Mid => Array1::from_iter((0..count).map(|k| k as Float)),
            LevelAxis::Interface => Array1::from_iter((0..count).map(|k| k as Float - 0.5)),
        };

        Some(values)
    }
}

/// Coordinate variables are one dimensional
/// and named after their own dimension.
fn is_coordinate(name: &str, var: &Variable) -> bool {
    var.dims.len() == 1 && var.dims[0] == name
}

#[cfg(test)]
mod tests {
    use super::{Dataset, LevelAxis, Variable};
    use ndarray::{array, Array3};

    fn sample() -> Dataset {
        let mut ds = Dataset::new("sample");

        ds.insert(
            "time",
            Variable::new(&["time"], array![0.0, 0.5].into_dyn())
                .with_units("days since 2013-07-21 00:00:00"),
        );
        ds.insert("lev", Variable::new(&["lev"], array![500.0, 900.0].into_dyn()));
        ds.insert(
            "T",
            Variable::new(
                &["time", "ncol", "lev"],
                Array3::from_shape_vec((2, 2, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
                    .unwrap()
                    .into_dyn(),
            ),
        );
        ds.insert(
            "hyam",
            Variable::new(&["lev"], array![0.1, 0.2].into_dyn()),
        );

        ds
    }

    #[test]
    fn coordinates_are_not_data() {
        let ds = sample();

        let mut names: Vec<&String> = ds.data_variables().map(|(n, _)| n).collect();
        names.sort();

        assert_eq!(names, vec!["T", "hyam"]);
        assert!(ds.contains("T"));
        assert!(!ds.contains("time"));
        assert!(!ds.contains("missing"));
    }

    #[test]
    fn reduce_columns() {
        let ds = sample();
        let field = ds.variable("T").unwrap().time_level("T").unwrap();

        assert_eq!(field, array![[2.0, 3.0], [6.0, 7.0]]);
    }

    #[test]
    fn reorder_axes() {
        let var = Variable::new(
            &["lev", "time"],
            array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn(),
        );
        let field = var.time_level("X").unwrap();

        assert_eq!(field, array![[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]]);
    }

    #[test]
    fn series_requires_time() {
        let ds = sample();

        assert!(ds.variable("hyam").unwrap().time_series("hyam").is_err());
        assert_eq!(
            ds.variable("hyam").unwrap().column("hyam").unwrap(),
            array![0.1, 0.2]
        );
    }

    #[test]
    fn level_values_fallback() {
        let ds = sample();

        assert_eq!(ds.level_values(LevelAxis::Mid), Some(array![500.0, 900.0]));
        assert_eq!(ds.level_count(LevelAxis::Interface), None);
        assert_eq!(ds.level_values(LevelAxis::Interface), None);
        assert_eq!(ds.times(), Some(array![0.0, 0.5]));
        assert_eq!(ds.time_count(), Some(2));
        assert_eq!(ds.variable("T").unwrap().axis_len("ncol"), Some(2));
        assert_eq!(ds.time_units(), Some("days since 2013-07-21 00:00:00"));
    }
}
