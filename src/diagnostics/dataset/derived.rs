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

//! Variables computed from other dataset variables
//! before the diagnostics are run.

use super::{Dataset, Variable};
use crate::constants::{CONVECTIVE_PRECIP, LARGE_SCALE_PRECIP, TOTAL_PRECIP, TOTAL_PRECIP_LONG_NAME};
use log::{debug, warn};

/// Adds the total precipitation rate to the dataset
/// as the sum of convective and large-scale rates.
///
/// Returns `true` when the variable was added. Datasets
/// that already provide total precipitation are left intact,
/// as are the source fields.
pub fn synthesize_total_precip(dataset: &mut Dataset) -> bool {
    if dataset.contains(TOTAL_PRECIP) {
        return false;
    }

    let (convective, large_scale) = match (
        dataset.variable(CONVECTIVE_PRECIP),
        dataset.variable(LARGE_SCALE_PRECIP),
    ) {
        (Some(c), Some(l)) => (c, l),
        _ => return false,
    };

    if convective.dims != large_scale.dims || convective.data.shape() != large_scale.data.shape() {
        warn!(
            "Cannot compute {} for {}: {} and {} have different shapes",
            TOTAL_PRECIP, dataset.name, CONVECTIVE_PRECIP, LARGE_SCALE_PRECIP
        );
        return false;
    }

    debug!(
        "Computing {} from {} and {} for {}",
        TOTAL_PRECIP, CONVECTIVE_PRECIP, LARGE_SCALE_PRECIP, dataset.name
    );

    let total = Variable {
        dims: large_scale.dims.clone(),
        data: &convective.data + &large_scale.data,
        units: large_scale.units.clone(),
        long_name: Some(TOTAL_PRECIP_LONG_NAME.to_string()),
    };

    dataset.insert(TOTAL_PRECIP, total);

    true
}

#[cfg(test)]
mod tests {
    use super::synthesize_total_precip;
    use crate::diagnostics::dataset::{Dataset, Variable};
    use ndarray::array;

    fn precip_dataset() -> Dataset {
        let mut ds = Dataset::new("precip");
        ds.insert(
            "PRECC",
            Variable::new(&["time"], array![1.0, 2.0, 3.0].into_dyn())
                .with_units("m/s")
                .with_long_name("Convective precipitation rate"),
        );
        ds.insert(
            "PRECL",
            Variable::new(&["time"], array![4.0, 5.0, 6.0].into_dyn())
                .with_units("m/s")
                .with_long_name("Large-scale precipitation rate"),
        );
        ds
    }

    #[test]
    fn total_is_sum() {
        let mut ds = precip_dataset();

        assert!(synthesize_total_precip(&mut ds));

        let total = ds.variable("PRECT").unwrap();
        assert_eq!(total.data, array![5.0, 7.0, 9.0].into_dyn());
        assert_eq!(total.units.as_deref(), Some("m/s"));
        assert_eq!(
            total.long_name.as_deref(),
            Some("Total Surface Precipitation Rate")
        );

        assert_eq!(
            ds.variable("PRECC").unwrap().data,
            array![1.0, 2.0, 3.0].into_dyn()
        );
        assert_eq!(
            ds.variable("PRECL").unwrap().data,
            array![4.0, 5.0, 6.0].into_dyn()
        );
    }

    #[test]
    fn existing_total_is_kept() {
        let mut ds = precip_dataset();
        ds.insert("PRECT", Variable::new(&["time"], array![0.0, 0.0, 0.0].into_dyn()));

        assert!(!synthesize_total_precip(&mut ds));
        assert_eq!(
            ds.variable("PRECT").unwrap().data,
            array![0.0, 0.0, 0.0].into_dyn()
        );
    }

    #[test]
    fn needs_both_components() {
        let mut ds = Dataset::new("convective only");
        ds.insert("PRECC", Variable::new(&["time"], array![1.0].into_dyn()));

        assert!(!synthesize_total_precip(&mut ds));
        assert!(ds.variable("PRECT").is_none());
    }
}
