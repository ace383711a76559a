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

//! Missing-data aware reductions.
//!
//! Fill values are replaced with NaN when datasets are read,
//! so every reduction used by the diagnostics skips NaN
//! values. A reduction over no finite values yields NaN.

use crate::Float;
use ndarray::{Array1, ArrayD, ArrayView2, ArrayViewD, Axis};

/// Mean of all non-NaN values.
pub fn nanmean<'a, I>(values: I) -> Float
where
    I: IntoIterator<Item = &'a Float>,
{
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        return Float::NAN;
    }

    sum / count as Float
}

/// Minimum and maximum of all non-NaN values,
/// `None` when there are no such values.
pub fn nanminmax<'a, I>(values: I) -> Option<(Float, Float)>
where
    I: IntoIterator<Item = &'a Float>,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Removes `axis` from the array by averaging along it.
pub fn nanmean_axis(array: ArrayViewD<Float>, axis: usize) -> ArrayD<Float> {
    array.map_axis(Axis(axis), |lane| nanmean(lane.iter()))
}

/// Averages the `(time, level)` array over the
/// selected time indices, giving a value per level.
pub fn windowed_mean(array: ArrayView2<Float>, time_indices: &[usize]) -> Array1<Float> {
    let selected = array.select(Axis(0), time_indices);

    selected.map_axis(Axis(0), |lane| nanmean(lane.iter()))
}
