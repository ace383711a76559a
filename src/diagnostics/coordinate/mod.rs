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

//! Module responsible for resolving the vertical coordinate
//! of a variable in a given dataset.
//!
//! Datasets describe their vertical grid in different ways:
//! model output carries heights above sea level or hybrid
//! coefficients, LES and observations carry precomputed heights
//! or pressures. Each way is a [`Strategy`] and strategies are tried
//! in a fixed order of precedence, the first applicable one wins.
//!
//! Height coordinate is required: when no height field is
//! present the resolution fails. Pressure coordinate always
//! resolves, in the worst case to raw level values (with a warning).

pub mod bisection;
pub mod interpolation;

use self::interpolation::interpolate_linear;
use super::configuration::CoordinateMode;
use super::dataset::{
    statistics::{nanmean, windowed_mean},
    Dataset, LevelAxis,
};
use crate::constants::{
    HYBRID_REFERENCE_PRESSURE, INTERFACE_HYBRID_COEFFICIENTS, MID_HYBRID_COEFFICIENTS,
    PA_PER_HPA, SURFACE_LAYER_OFFSET, SURFACE_PRESSURE_FIELDS,
};
use crate::{errors::CoordinateError, Float};
use log::{debug, warn};
use ndarray::Array1;
use serde::Serialize;

/// Source from which the coordinate values were computed.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub enum Provenance {
    /// Height above surface read directly.
    Height(&'static str),

    /// Height above sea level converted to height above surface.
    SurfaceRelative(&'static str),

    /// Pressure from hybrid coefficients and surface pressure.
    Hybrid { surface_pressure: &'static str },

    /// Pressure read directly.
    Precomputed(&'static str),

    /// Raw level coordinate (or level index).
    LevelCoordinate,
}

/// Vertical coordinate of a variable averaged over a time window,
/// in meters above surface or in hPa.
#[derive(Clone, PartialEq, Debug)]
pub struct VerticalCoordinate {
    pub values: Array1<Float>,
    pub provenance: Provenance,
}

/// Axis (and its length) the coordinate must be given on.
#[derive(Copy, Clone, Debug)]
struct Target {
    axis: LevelAxis,
    levels: usize,
}

#[derive(Copy, Clone, Debug)]
enum Strategy {
    Height(&'static str),
    SurfaceRelative(&'static str),
    Hybrid,
    Precomputed(&'static str),
    LevelCoordinate,
}

const HEIGHT_STRATEGIES: [Strategy; 3] = [
    Strategy::Height("z_mid"),
    Strategy::Height("z_mid_horiz_avg"),
    Strategy::SurfaceRelative("Z3"),
];

const PRESSURE_STRATEGIES: [Strategy; 4] = [
    Strategy::Hybrid,
    Strategy::Precomputed("p_mid_obs"),
    Strategy::Precomputed("p_mid_les"),
    Strategy::LevelCoordinate,
];

impl Strategy {
    fn applies(&self, dataset: &Dataset, target: Target) -> bool {
        match *self {
            Strategy::Height(field) | Strategy::SurfaceRelative(field) => {
                dataset.contains(field)
            }
            // precomputed pressure is never interpolated between axes
            Strategy::Precomputed(field) => dataset
                .variable(field)
                .map_or(false, |var| var.level_axis() == Some(target.axis)),
            Strategy::Hybrid => {
                let (a, b) = hybrid_coefficients(target.axis);
                surface_pressure_field(dataset).is_some()
                    && dataset.contains(a)
                    && dataset.contains(b)
            }
            Strategy::LevelCoordinate => true,
        }
    }

    fn extract(
        &self,
        dataset: &Dataset,
        time_indices: &[usize],
        target: Target,
    ) -> Result<VerticalCoordinate, CoordinateError> {
        let (values, provenance) = match *self {
            Strategy::Height(field) => {
                let (heights, axis) = level_mean(dataset, field, time_indices)?;

                (
                    onto_target_axis(dataset, field, heights, axis, target.axis)?,
                    Provenance::Height(field),
                )
            }

            Strategy::SurfaceRelative(field) => {
                let (heights, axis) = level_mean(dataset, field, time_indices)?;

                // lowest model layer is the last one
                let lowest = *heights
                    .iter()
                    .next_back()
                    .ok_or_else(|| CoordinateError::NoVerticalAxis(field.to_string()))?;
                let surface_elevation = lowest - SURFACE_LAYER_OFFSET;
                let heights = heights - surface_elevation;

                (
                    onto_target_axis(dataset, field, heights, axis, target.axis)?,
                    Provenance::SurfaceRelative(field),
                )
            }

            Strategy::Hybrid => {
                let surface_pressure =
                    surface_pressure_field(dataset).ok_or(CoordinateError::Unresolvable)?;
                let ps = scalar_mean(dataset, surface_pressure, time_indices)? / PA_PER_HPA;

                let (a, b) = hybrid_coefficients(target.axis);
                let (hya, _) = level_mean(dataset, a, time_indices)?;
                let (hyb, _) = level_mean(dataset, b, time_indices)?;

                if hya.len() != hyb.len() {
                    return Err(CoordinateError::LevelMismatch(
                        b.to_string(),
                        hyb.len(),
                        hya.len(),
                    ));
                }

                (
                    hya * HYBRID_REFERENCE_PRESSURE + hyb * ps,
                    Provenance::Hybrid { surface_pressure },
                )
            }

            Strategy::Precomputed(field) => {
                let (pressure, _) = level_mean(dataset, field, time_indices)?;

                (pressure, Provenance::Precomputed(field))
            }

            Strategy::LevelCoordinate => {
                warn!(
                    "{} has no surface pressure with hybrid coefficients nor precomputed pressure, using raw {} values as pressure",
                    dataset.name,
                    target.axis.name()
                );

                let values = dataset
                    .variable(target.axis.name())
                    .and_then(|coord| coord.column(target.axis.name()).ok())
                    .unwrap_or_else(|| Array1::from_iter((0..target.levels).map(|k| k as Float)));

                (values, Provenance::LevelCoordinate)
            }
        };

        Ok(VerticalCoordinate { values, provenance })
    }
}

/// Computes the vertical coordinate of `var_name` in `dataset`
/// averaged over `time_indices`, with one value per level
/// of the variable's vertical axis.
pub fn resolve_vertical_coordinate(
    dataset: &Dataset,
    time_indices: &[usize],
    mode: CoordinateMode,
    var_name: &str,
) -> Result<VerticalCoordinate, CoordinateError> {
    if let Some(time_count) = dataset.time_count() {
        check_indices(time_indices, time_count)?;
    } else if time_indices.is_empty() {
        return Err(CoordinateError::EmptyWindow);
    }

    let var = dataset.require(var_name)?;
    let axis = var
        .level_axis()
        .ok_or_else(|| CoordinateError::NoVerticalAxis(var_name.to_string()))?;
    let levels = var
        .axis_len(axis.name())
        .ok_or_else(|| CoordinateError::NoVerticalAxis(var_name.to_string()))?;
    let target = Target { axis, levels };

    let strategies: &[Strategy] = match mode {
        CoordinateMode::Height => &HEIGHT_STRATEGIES,
        CoordinateMode::Pressure => &PRESSURE_STRATEGIES,
    };

    let strategy = strategies
        .iter()
        .find(|s| s.applies(dataset, target))
        .ok_or(CoordinateError::Unresolvable)?;

    debug!(
        "Resolving coordinate of {} in {} with {:?}",
        var_name, dataset.name, strategy
    );

    let coordinate = strategy.extract(dataset, time_indices, target)?;

    if coordinate.values.len() != levels {
        return Err(CoordinateError::LevelMismatch(
            var_name.to_string(),
            coordinate.values.len(),
            levels,
        ));
    }

    Ok(coordinate)
}

fn hybrid_coefficients(axis: LevelAxis) -> (&'static str, &'static str) {
    match axis {
        LevelAxis::Mid => MID_HYBRID_COEFFICIENTS,
        LevelAxis::Interface => INTERFACE_HYBRID_COEFFICIENTS,
    }
}

fn surface_pressure_field(dataset: &Dataset) -> Option<&'static str> {
    SURFACE_PRESSURE_FIELDS
        .iter()
        .find(|name| dataset.contains(name))
        .copied()
}

fn check_indices(time_indices: &[usize], time_count: usize) -> Result<(), CoordinateError> {
    if time_indices.is_empty() {
        return Err(CoordinateError::EmptyWindow);
    }

    match time_indices.iter().find(|&&i| i >= time_count) {
        Some(&i) => Err(CoordinateError::IndexOutOfBounds(i)),
        None => Ok(()),
    }
}

/// Window mean of a level field, fields without
/// time axis are returned as they are.
fn level_mean(
    dataset: &Dataset,
    name: &str,
    time_indices: &[usize],
) -> Result<(Array1<Float>, LevelAxis), CoordinateError> {
    let var = dataset.require(name)?;
    let axis = var
        .level_axis()
        .ok_or_else(|| CoordinateError::NoVerticalAxis(name.to_string()))?;

    let values = if var.has_time() {
        let field = var.time_level(name)?;
        check_indices(time_indices, field.nrows())?;
        windowed_mean(field.view(), time_indices)
    } else {
        var.column(name)?
    };

    Ok((values, axis))
}

/// Window mean of a surface field.
fn scalar_mean(
    dataset: &Dataset,
    name: &str,
    time_indices: &[usize],
) -> Result<Float, CoordinateError> {
    let var = dataset.require(name)?;

    if !var.has_time() {
        return Ok(nanmean(var.data.iter()));
    }

    let series = var.time_series(name)?;
    check_indices(time_indices, series.len())?;

    Ok(nanmean(time_indices.iter().map(|&i| &series[i])))
}

/// Moves heights defined on `source` axis onto the `target` axis.
/// On interfaces the surface (last) value is set to zero.
fn onto_target_axis(
    dataset: &Dataset,
    field: &str,
    heights: Array1<Float>,
    source: LevelAxis,
    target: LevelAxis,
) -> Result<Array1<Float>, CoordinateError> {
    if source == target {
        return Ok(heights);
    }

    let missing = || CoordinateError::NoVerticalAxis(field.to_string());
    let source_levels = dataset.level_values(source).ok_or_else(missing)?;
    let target_levels = dataset.level_values(target).ok_or_else(missing)?;

    if source_levels.len() != heights.len() {
        return Err(CoordinateError::LevelMismatch(
            field.to_string(),
            heights.len(),
            source_levels.len(),
        ));
    }

    let mut interpolated =
        interpolate_linear(source_levels.view(), heights.view(), target_levels.view())?;

    if target == LevelAxis::Interface {
        if let Some(surface) = interpolated.iter_mut().next_back() {
            *surface = 0.0;
        }
    }

    Ok(interpolated)
}

#[cfg(test)]
mod tests {
    use super::{resolve_vertical_coordinate, Provenance};
    use crate::diagnostics::configuration::CoordinateMode;
    use crate::diagnostics::dataset::{Dataset, Variable};
    use crate::errors::CoordinateError;
    use float_cmp::approx_eq;
    use ndarray::{array, Array1, Array2};

    /// Field constant in time over two time steps.
    fn steady(axis: &str, column: Array1<f64>) -> Variable {
        let field = Array2::from_shape_fn((2, column.len()), |(_, k)| column[k]);
        Variable::new(&["time", axis], field.into_dyn())
    }

    fn base() -> Dataset {
        let mut ds = Dataset::new("synthetic");
        ds.insert("time", Variable::new(&["time"], array![0.0, 0.5].into_dyn()));
        ds.insert("lev", Variable::new(&["lev"], array![1.0, 2.0, 3.0].into_dyn()));
        ds.insert(
            "ilev",
            Variable::new(&["ilev"], array![0.5, 1.5, 2.5, 3.5].into_dyn()),
        );
        ds.insert("T", steady("lev", array![290.0, 280.0, 270.0]));
        ds.insert("W", steady("ilev", array![0.0, 0.1, 0.2, 0.0]));
        ds
    }

    #[test]
    fn height_precedence() {
        let mut ds = base();
        ds.insert("Z3", steady("lev", array![2010.0, 1510.0, 1010.0]));

        let coord =
            resolve_vertical_coordinate(&ds, &[0, 1], CoordinateMode::Height, "T").unwrap();
        assert_eq!(coord.provenance, Provenance::SurfaceRelative("Z3"));
        assert_eq!(coord.values, array![1010.0, 510.0, 10.0]);

        ds.insert("z_mid_horiz_avg", steady("lev", array![1200.0, 700.0, 200.0]));
        let coord =
            resolve_vertical_coordinate(&ds, &[0, 1], CoordinateMode::Height, "T").unwrap();
        assert_eq!(coord.provenance, Provenance::Height("z_mid_horiz_avg"));
        assert_eq!(coord.values, array![1200.0, 700.0, 200.0]);

        ds.insert("z_mid", steady("lev", array![1100.0, 600.0, 100.0]));
        let coord =
            resolve_vertical_coordinate(&ds, &[0, 1], CoordinateMode::Height, "T").unwrap();
        assert_eq!(coord.provenance, Provenance::Height("z_mid"));
        assert_eq!(coord.values, array![1100.0, 600.0, 100.0]);
    }

    #[test]
    fn interface_surface_is_zero() {
        let mut ds = base();
        ds.insert("z_mid", steady("lev", array![3000.0, 2000.0, 1000.0]));

        let coord = resolve_vertical_coordinate(&ds, &[1], CoordinateMode::Height, "W").unwrap();

        assert_eq!(coord.values, array![3500.0, 2500.0, 1500.0, 0.0]);
        assert_eq!(coord.values[3], 0.0);
    }

    #[test]
    fn window_mean_of_height() {
        let mut ds = base();
        ds.insert(
            "z_mid",
            Variable::new(
                &["time", "lev"],
                array![[300.0, 200.0, 100.0], [500.0, 400.0, 300.0]].into_dyn(),
            ),
        );

        let first = resolve_vertical_coordinate(&ds, &[0], CoordinateMode::Height, "T").unwrap();
        let both = resolve_vertical_coordinate(&ds, &[0, 1], CoordinateMode::Height, "T").unwrap();

        assert_eq!(first.values, array![300.0, 200.0, 100.0]);
        assert_eq!(both.values, array![400.0, 300.0, 200.0]);
    }

    #[test]
    fn height_unresolvable() {
        let ds = base();

        let result = resolve_vertical_coordinate(&ds, &[0], CoordinateMode::Height, "T");

        assert!(matches!(result, Err(CoordinateError::Unresolvable)));
    }

    #[test]
    fn hybrid_beats_precomputed() {
        let mut ds = base();
        ds.insert(
            "PS",
            Variable::new(&["time", "ncol"], array![[100_000.0], [100_000.0]].into_dyn()),
        );
        ds.insert("hyam", Variable::new(&["lev"], array![0.1, 0.05, 0.0].into_dyn()));
        ds.insert("hybm", Variable::new(&["lev"], array![0.0, 0.5, 1.0].into_dyn()));
        ds.insert("p_mid_obs", steady("lev", array![1.0, 2.0, 3.0]));

        let coord =
            resolve_vertical_coordinate(&ds, &[0, 1], CoordinateMode::Pressure, "T").unwrap();

        assert_eq!(
            coord.provenance,
            Provenance::Hybrid {
                surface_pressure: "PS"
            }
        );
        assert!(approx_eq!(f64, coord.values[0], 100.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, coord.values[1], 550.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, coord.values[2], 1000.0, epsilon = 1e-9));
    }

    #[test]
    fn pressure_without_coefficients() {
        let mut ds = base();
        ds.insert("PS", Variable::new(&["time"], array![100_000.0, 100_000.0].into_dyn()));
        ds.insert("p_mid_les", steady("lev", array![400.0, 700.0, 950.0]));
        ds.insert("p_mid_obs", steady("lev", array![500.0, 800.0, 1000.0]));

        let coord = resolve_vertical_coordinate(&ds, &[0], CoordinateMode::Pressure, "T").unwrap();

        assert_eq!(coord.provenance, Provenance::Precomputed("p_mid_obs"));
        assert_eq!(coord.values, array![500.0, 800.0, 1000.0]);
    }

    #[test]
    fn pressure_falls_back_to_levels() {
        let ds = base();

        let coord = resolve_vertical_coordinate(&ds, &[0], CoordinateMode::Pressure, "W").unwrap();

        assert_eq!(coord.provenance, Provenance::LevelCoordinate);
        assert_eq!(coord.values, array![0.5, 1.5, 2.5, 3.5]);

        let mut bare = Dataset::new("bare");
        bare.insert("time", Variable::new(&["time"], array![0.0, 0.5].into_dyn()));
        bare.insert("T", steady("lev", array![1.0, 2.0, 3.0]));

        let coord =
            resolve_vertical_coordinate(&bare, &[0], CoordinateMode::Pressure, "T").unwrap();

        assert_eq!(coord.values, array![0.0, 1.0, 2.0]);
    }

    #[test]
    fn precomputed_pressure_on_other_axis() {
        let mut ds = base();
        ds.insert("p_mid_obs", steady("lev", array![500.0, 800.0, 1000.0]));

        let coord =
            resolve_vertical_coordinate(&ds, &[0, 1], CoordinateMode::Pressure, "W").unwrap();

        assert_eq!(coord.provenance, Provenance::LevelCoordinate);
        assert_eq!(coord.values, array![0.5, 1.5, 2.5, 3.5]);
    }

    #[test]
    fn invalid_windows() {
        let mut ds = base();
        ds.insert("z_mid", steady("lev", array![3000.0, 2000.0, 1000.0]));

        let empty = resolve_vertical_coordinate(&ds, &[], CoordinateMode::Height, "T");
        let outside = resolve_vertical_coordinate(&ds, &[0, 2], CoordinateMode::Height, "T");

        assert!(matches!(empty, Err(CoordinateError::EmptyWindow)));
        assert!(matches!(outside, Err(CoordinateError::IndexOutOfBounds(2))));
    }

    #[test]
    fn variable_without_levels() {
        let mut ds = base();
        ds.insert("PS", Variable::new(&["time"], array![1.0, 2.0].into_dyn()));

        let result = resolve_vertical_coordinate(&ds, &[0], CoordinateMode::Pressure, "PS");

        assert!(matches!(result, Err(CoordinateError::NoVerticalAxis(_))));
    }
}
