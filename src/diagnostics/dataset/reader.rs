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

//! Sub-module responsible for reading datasets
//! from NetCDF files into memory.

use super::{Dataset, Variable};
use crate::{errors::InputError, Float};
use log::debug;
use ndarray::{ArrayD, IxDyn};
use netcdf::AttributeValue;
use std::path::Path;

impl Dataset {
    /// Reads all numeric variables with their metadata
    /// and all string global attributes from the NetCDF file.
    ///
    /// Values equal to `_FillValue` or `missing_value`
    /// are replaced with NaN so that they are skipped
    /// in all reductions.
    pub fn read_netcdf(path: &Path) -> Result<Dataset, InputError> {
        debug!("Reading dataset from {}", path.display());

        if !path.is_file() {
            return Err(InputError::CantOpenFile(path.display().to_string()));
        }

        let file = netcdf::open(path)?;

        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string());
        let mut dataset = Dataset::new(&name);

        for attr in file.attributes() {
            if let Ok(AttributeValue::Str(value)) = attr.value() {
                dataset
                    .global_attributes
                    .insert(attr.name().to_string(), value);
            }
        }

        for var in file.variables() {
            let var_name = var.name();

            let values: Vec<Float> = match var.get_values::<Float, _>(..) {
                Ok(values) => values,
                Err(err) => {
                    debug!("Skipping non-numeric variable {}: {}", var_name, err);
                    continue;
                }
            };

            let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
            let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

            let mut data = ArrayD::from_shape_vec(IxDyn(&shape), values)?;

            let fill_values = [
                fill_attribute(&var, "_FillValue"),
                fill_attribute(&var, "missing_value"),
            ];

            for fill in fill_values.iter().flatten() {
                mask_fill_value(&mut data, *fill);
            }

            dataset.insert(
                &var_name,
                Variable {
                    dims,
                    data,
                    units: string_attribute(&var, "units"),
                    long_name: string_attribute(&var, "long_name"),
                },
            );
        }

        debug!(
            "Read {} variables from {}",
            dataset.data_variables().count(),
            dataset.name
        );

        Ok(dataset)
    }
}

fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(value) => Some(value),
        _ => None,
    }
}

/// Fill value as stored in the file. NetCDF requires
/// fill attributes to have the type of their variable.
#[derive(Copy, Clone, PartialEq, Debug)]
enum FillValue {
    Double(Float),
    Single(f32),
}

fn fill_attribute(var: &netcdf::Variable, name: &str) -> Option<FillValue> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Double(v) => Some(FillValue::Double(v)),
        AttributeValue::Float(v) => Some(FillValue::Single(v)),
        AttributeValue::Int(v) => Some(FillValue::Double(Float::from(v))),
        AttributeValue::Short(v) => Some(FillValue::Double(Float::from(v))),
        AttributeValue::Doubles(v) => v.first().map(|f| FillValue::Double(*f)),
        AttributeValue::Floats(v) => v.first().map(|f| FillValue::Single(*f)),
        _ => None,
    }
}

/// Replaces all values equal to `fill` with NaN.
///
/// Single precision variables are compared in single
/// precision, as their values were widened on read.
fn mask_fill_value(data: &mut ArrayD<Float>, fill: FillValue) {
    let is_fill = |v: Float| match fill {
        FillValue::Double(fill) => v == fill,
        FillValue::Single(fill) => (v as f32) == fill,
    };

    data.mapv_inplace(|v| if is_fill(v) { Float::NAN } else { v });
}

#[cfg(test)]
mod tests {
    use super::{mask_fill_value, FillValue};
    use crate::diagnostics::dataset::Dataset;
    use ndarray::array;
    use std::path::Path;

    #[test]
    fn fill_values_become_nan() {
        let mut data = array![1.0, -9999.0, 3.0].into_dyn();

        mask_fill_value(&mut data, FillValue::Double(-9999.0));

        assert_eq!(data[[0]], 1.0);
        assert!(data[[1]].is_nan());
        assert_eq!(data[[2]], 3.0);
    }

    #[test]
    fn double_precision_fill_is_exact() {
        let mut data = array![-9999.0001, -9999.0].into_dyn();

        mask_fill_value(&mut data, FillValue::Double(-9999.0));

        assert_eq!(data[[0]], -9999.0001);
        assert!(data[[1]].is_nan());
    }

    #[test]
    fn single_precision_fill() {
        let fill = 9.969_21e36_f32;
        let mut data = array![f64::from(fill), 2.0].into_dyn();

        mask_fill_value(&mut data, FillValue::Single(fill));

        assert!(data[[0]].is_nan());
        assert_eq!(data[[1]], 2.0);
    }

    #[test]
    fn missing_file() {
        let result = Dataset::read_netcdf(Path::new("./does-not-exist.nc"));

        assert!(result.is_err());
    }
}
