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

//! Module containing interpolation methods.

use super::bisection::find_segment;
use crate::{errors::SearchError, Float};
use float_cmp::approx_eq;
use ndarray::{Array1, ArrayView1};

/// Linearly interpolates values given at `xp` points onto
/// `x` points. Points outside of `xp` range are linearly
/// extrapolated from the nearest edge segment.
///
/// `xp` must be monotonic (in either direction) and have
/// at least two points.
pub fn interpolate_linear(
    xp: ArrayView1<Float>,
    fp: ArrayView1<Float>,
    x: ArrayView1<Float>,
) -> Result<Array1<Float>, SearchError> {
    let xp = xp.to_vec();

    let mut result = Array1::zeros(x.len());

    for (out, target) in result.iter_mut().zip(x.iter()) {
        let i = find_segment(&xp, target)?;

        let (x0, x1) = (xp[i], xp[i + 1]);
        let (f0, f1) = (fp[i], fp[i + 1]);

        // repeated coordinate values do not define a slope
        *out = if approx_eq!(Float, x0, x1, ulps = 4) {
            f0
        } else {
            f0 + (f1 - f0) * (target - x0) / (x1 - x0)
        };
    }

    Ok(result)
}
