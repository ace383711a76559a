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

//! Diurnal composites, that is mean daily cycles
//! computed by averaging whole days of a record.
//!
//! Output cadence is taken from the first two time steps,
//! so records with irregular output are not handled correctly.

use super::dataset::{statistics::nanmean, Dataset};
use super::timing::{adjusted_times, window_indices};
use crate::constants::{HOURS_PER_DAY, MIN_COMPOSITE_DAYS, MIN_STEPS_PER_DAY};
use crate::{errors::DiurnalGate, Float};
use ndarray::{Array1, Array2, Axis};

/// Mean daily cycle of a variable in one dataset.
#[derive(Clone, PartialEq, Debug)]
pub struct DiurnalComposite {
    /// Composite values as `(step of day, level)`,
    /// variables without levels have a single level.
    pub values: Array2<Float>,

    /// Hour of day of each step, ascending.
    pub hours: Array1<Float>,

    /// Number of axes of the composited variable (1 or 2).
    pub rank: usize,

    pub effective_start: Float,
    pub effective_end: Float,
    pub steps_per_day: usize,

    /// Time indices of whole days used in the composite.
    pub time_indices: Vec<usize>,
}

/// Computes the diurnal composite of `var_name` over the part of
/// the record within `[start_day, end_day]` (in adjusted time).
///
/// The selected record must cover at least three days with
/// at least four time steps per day, otherwise the reason is returned.
/// Incomplete trailing day is discarded.
pub fn compute_diurnal_composite(
    dataset: &Dataset,
    var_name: &str,
    time_offset: Float,
    start_day: Option<Float>,
    end_day: Option<Float>,
) -> Result<DiurnalComposite, DiurnalGate> {
    let var = dataset
        .variable(var_name)
        .ok_or_else(|| DiurnalGate::MissingVariable(var_name.to_string()))?;
    let adjusted = adjusted_times(dataset, time_offset).ok_or(DiurnalGate::MissingTime)?;

    let (field, rank) = if var.level_axis().is_some() {
        (var.time_level(var_name)?, 2)
    } else {
        (var.time_series(var_name)?.insert_axis(Axis(1)), 1)
    };

    if adjusted.len() < 2 {
        return Err(DiurnalGate::TooShort(0.0, MIN_COMPOSITE_DAYS));
    }

    let cadence = adjusted[1] - adjusted[0];
    let steps_per_day = (1.0 / cadence).round();

    if !steps_per_day.is_finite() || steps_per_day < MIN_STEPS_PER_DAY as Float {
        return Err(DiurnalGate::CoarseCadence(cadence, MIN_STEPS_PER_DAY));
    }

    let steps_per_day = steps_per_day as usize;

    let selected: Vec<usize> = window_indices(adjusted.view(), start_day, end_day)
        .into_iter()
        .filter(|&i| i < field.nrows())
        .collect();

    let days = selected.len() as Float / steps_per_day as Float;

    if days < MIN_COMPOSITE_DAYS {
        return Err(DiurnalGate::TooShort(days, MIN_COMPOSITE_DAYS));
    }

    let whole_days = selected.len() / steps_per_day;
    let time_indices = selected[..whole_days * steps_per_day].to_vec();

    let levels = field.ncols();
    let mut values = Array2::zeros((steps_per_day, levels));

    for ((step, level), value) in values.indexed_iter_mut() {
        *value = nanmean(
            (0..whole_days).map(|day| &field[[time_indices[day * steps_per_day + step], level]]),
        );
    }

    let hours: Vec<Float> = time_indices[..steps_per_day]
        .iter()
        .map(|&i| adjusted[i].rem_euclid(1.0) * HOURS_PER_DAY)
        .collect();

    let mut order: Vec<usize> = (0..steps_per_day).collect();
    order.sort_by(|&a, &b| hours[a].total_cmp(&hours[b]));

    let effective_start = adjusted[time_indices[0]];

    Ok(DiurnalComposite {
        values: values.select(Axis(0), &order),
        hours: order.iter().map(|&i| hours[i]).collect(),
        rank,
        effective_start,
        effective_end: effective_start + whole_days as Float,
        steps_per_day,
        time_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::compute_diurnal_composite;
    use crate::diagnostics::dataset::{Dataset, Variable};
    use crate::errors::DiurnalGate;
    use ndarray::{array, Array1, Array2};

    /// Record with `n` samples every `dt` days where
    /// the value is `10 * day + step of day`.
    fn record(n: usize, dt: f64) -> Dataset {
        let steps = (1.0 / dt).round() as usize;
        let times = Array1::from_iter((0..n).map(|i| i as f64 * dt));
        let series = Array1::from_iter((0..n).map(|i| (10 * (i / steps) + i % steps) as f64));
        let field = Array2::from_shape_fn((n, 2), |(i, k)| series[i] + 100.0 * k as f64);

        let mut ds = Dataset::new("record");
        ds.insert("time", Variable::new(&["time"], times.into_dyn()));
        ds.insert("LHFLX", Variable::new(&["time"], series.into_dyn()));
        ds.insert("T", Variable::new(&["time", "lev"], field.into_dyn()));
        ds
    }

    #[test]
    fn three_days_four_steps() {
        let ds = record(12, 0.25);

        let composite = compute_diurnal_composite(&ds, "LHFLX", 0.0, None, None).unwrap();

        assert_eq!(composite.rank, 1);
        assert_eq!(composite.steps_per_day, 4);
        assert_eq!(composite.hours, array![0.0, 6.0, 12.0, 18.0]);
        assert_eq!(composite.values, array![[10.0], [11.0], [12.0], [13.0]]);
        assert_eq!(composite.effective_start, 0.0);
        assert_eq!(composite.effective_end, 3.0);
    }

    #[test]
    fn shorter_record_is_gated() {
        let ds = record(11, 0.25);

        let result = compute_diurnal_composite(&ds, "LHFLX", 0.0, None, None);

        assert!(matches!(result, Err(DiurnalGate::TooShort(_, _))));
    }

    #[test]
    fn coarse_cadence_is_gated() {
        let ds = record(15, 1.0 / 3.0);

        let result = compute_diurnal_composite(&ds, "LHFLX", 0.0, None, None);

        assert!(matches!(result, Err(DiurnalGate::CoarseCadence(_, 4))));
    }

    #[test]
    fn partial_day_is_discarded() {
        let ds = record(14, 0.25);

        let composite = compute_diurnal_composite(&ds, "LHFLX", 0.0, None, None).unwrap();

        assert_eq!(composite.time_indices.len(), 12);
        assert_eq!(composite.effective_end, 3.0);
        assert_eq!(composite.values, array![[10.0], [11.0], [12.0], [13.0]]);
    }

    #[test]
    fn hours_are_sorted() {
        let ds = record(12, 0.25);

        let composite = compute_diurnal_composite(&ds, "LHFLX", 0.5, None, None).unwrap();

        assert_eq!(composite.hours, array![0.0, 6.0, 12.0, 18.0]);
        assert_eq!(composite.values, array![[12.0], [13.0], [10.0], [11.0]]);
        assert_eq!(composite.effective_start, 0.5);
        assert_eq!(composite.effective_end, 3.5);
    }

    #[test]
    fn window_restriction() {
        let ds = record(16, 0.25);

        let within = compute_diurnal_composite(&ds, "LHFLX", 0.0, Some(1.0), None).unwrap();
        assert_eq!(within.time_indices, (4..16).collect::<Vec<usize>>());
        assert_eq!(within.values, array![[20.0], [21.0], [22.0], [23.0]]);

        let too_short = compute_diurnal_composite(&ds, "LHFLX", 0.0, None, Some(2.6));
        assert!(matches!(too_short, Err(DiurnalGate::TooShort(_, _))));
    }

    #[test]
    fn two_dimensional() {
        let ds = record(12, 0.25);

        let composite = compute_diurnal_composite(&ds, "T", 0.0, None, None).unwrap();

        assert_eq!(composite.rank, 2);
        assert_eq!(
            composite.values,
            array![[10.0, 110.0], [11.0, 111.0], [12.0, 112.0], [13.0, 113.0]]
        );
    }

    #[test]
    fn missing_variable() {
        let ds = record(12, 0.25);

        let result = compute_diurnal_composite(&ds, "PRECT", 0.0, None, None);

        assert!(matches!(result, Err(DiurnalGate::MissingVariable(_))));
    }
}
