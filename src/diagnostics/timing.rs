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

//! Module responsible for aligning dataset times.
//!
//! Each dataset counts time in days since its own epoch
//! stored in `time:units`. The first dataset is the reference
//! and every other dataset gets an offset (in days) so that
//! `adjusted = raw + offset` is comparable across datasets.

use super::configuration::WindowEnd;
use super::dataset::Dataset;
use crate::{errors::TimeError, Float};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, warn};
use ndarray::{Array1, ArrayView1};

const MILLISECONDS_PER_DAY: Float = 86_400_000.0;

/// Parses the epoch from units string of form
/// `<unit> since <YYYY-MM-DD> <HH:MM:SS>[ tz]`.
///
/// Strings of other shape give `Ok(None)`, while
/// well-shaped strings with invalid date or time are an error.
pub fn parse_epoch(units: &str) -> Result<Option<NaiveDateTime>, TimeError> {
    let tokens: Vec<&str> = units.split_whitespace().collect();

    if !(tokens.len() == 4 || tokens.len() == 5) || tokens[1] != "since" {
        return Ok(None);
    }

    let invalid = || TimeError::InvalidEpoch(units.to_string());

    let date = NaiveDate::parse_from_str(tokens[2], "%Y-%m-%d").map_err(|_| invalid())?;
    let time = NaiveTime::parse_from_str(tokens[3], "%H:%M:%S%.f").map_err(|_| invalid())?;

    Ok(Some(date.and_time(time)))
}

/// Computes the offset (in days) of every dataset
/// relative to the first one.
///
/// Datasets with missing or unrecognized time units
/// get zero offset.
pub fn compute_time_offsets(datasets: &[Dataset]) -> Result<Vec<Float>, TimeError> {
    let mut epochs = Vec::with_capacity(datasets.len());

    for dataset in datasets {
        let epoch = match dataset.time_units() {
            Some(units) => {
                let epoch = parse_epoch(units)?;
                if epoch.is_none() {
                    warn!(
                        "Cannot parse time units '{}' of {}, assuming zero time offset",
                        units, dataset.name
                    );
                }
                epoch
            }
            None => {
                warn!(
                    "{} has no time units, assuming zero time offset",
                    dataset.name
                );
                None
            }
        };

        epochs.push(epoch);
    }

    let reference = epochs.first().copied().flatten();

    let offsets = epochs
        .iter()
        .zip(datasets)
        .map(|(epoch, dataset)| {
            let offset = match (reference, epoch) {
                (Some(reference), Some(epoch)) => {
                    (*epoch - reference).num_milliseconds() as Float / MILLISECONDS_PER_DAY
                }
                _ => 0.0,
            };

            debug!("Time offset of {}: {} days", dataset.name, offset);
            offset
        })
        .collect();

    Ok(offsets)
}

/// Times of the dataset shifted by its offset.
pub fn adjusted_times(dataset: &Dataset, offset: Float) -> Option<Array1<Float>> {
    dataset.times().map(|times| times + offset)
}

/// Indices of adjusted times within `[start, end]` (inclusive),
/// missing bounds do not restrict the selection.
pub fn window_indices(
    adjusted: ArrayView1<Float>,
    start: Option<Float>,
    end: Option<Float>,
) -> Vec<usize> {
    adjusted
        .iter()
        .enumerate()
        .filter(|&(_, &t)| start.map_or(true, |s| t >= s) && end.map_or(true, |e| t <= e))
        .map(|(i, _)| i)
        .collect()
}

/// Resolves the window end to a day, the `end` keyword
/// being the last adjusted time of the dataset.
pub fn resolve_window_end(end: WindowEnd, adjusted: ArrayView1<Float>) -> Option<Float> {
    match end {
        WindowEnd::Day(day) => Some(day),
        WindowEnd::Last(_) => adjusted.iter().next_back().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_time_offsets, parse_epoch, resolve_window_end, window_indices};
    use crate::diagnostics::configuration::{EndKeyword, WindowEnd};
    use crate::diagnostics::dataset::{Dataset, Variable};
    use crate::errors::TimeError;
    use chrono::NaiveDate;
    use float_cmp::approx_eq;
    use ndarray::array;

    fn with_units(name: &str, units: &str) -> Dataset {
        let mut ds = Dataset::new(name);
        ds.insert(
            "time",
            Variable::new(&["time"], array![0.0, 0.5, 1.0].into_dyn()).with_units(units),
        );
        ds
    }

    #[test]
    fn parse_units() {
        let epoch = parse_epoch("days since 2013-07-21 06:30:00").unwrap();
        let expected = NaiveDate::from_ymd(2013, 7, 21).and_hms(6, 30, 0);
        assert_eq!(epoch, Some(expected));

        let zoned = parse_epoch("days since 2013-07-21 06:30:00.000 UTC").unwrap();
        assert_eq!(zoned, Some(expected));
    }

    #[test]
    fn unrecognized_units() {
        assert_eq!(parse_epoch("days since 2013-07-21").unwrap(), None);
        assert_eq!(parse_epoch("days after 2013-07-21 00:00:00").unwrap(), None);
        assert_eq!(parse_epoch("").unwrap(), None);
    }

    #[test]
    fn invalid_calendar() {
        let result = parse_epoch("days since 2013-02-30 00:00:00");

        assert!(matches!(result, Err(TimeError::InvalidEpoch(_))));
        assert!(parse_epoch("days since 2013-02-01 25:00:00").is_err());
    }

    #[test]
    fn offsets_against_first_dataset() {
        let datasets = vec![
            with_units("reference", "days since 2013-07-21 00:00:00"),
            with_units("later", "days since 2013-07-22 06:00:00"),
            with_units("garbled", "no units here"),
        ];

        let offsets = compute_time_offsets(&datasets).unwrap();

        assert_eq!(offsets[0], 0.0);
        assert!(approx_eq!(f64, offsets[1], 1.25));
        assert_eq!(offsets[2], 0.0);
    }

    #[test]
    fn windows_are_inclusive() {
        let times = array![0.0, 0.25, 0.5, 0.75, 1.0];

        assert_eq!(window_indices(times.view(), Some(0.25), Some(0.75)), vec![1, 2, 3]);
        assert_eq!(window_indices(times.view(), None, Some(0.3)), vec![0, 1]);
        assert_eq!(window_indices(times.view(), Some(2.0), None), Vec::<usize>::new());
    }

    #[test]
    fn end_keyword() {
        let times = array![1.0, 1.5, 2.0];

        assert_eq!(
            resolve_window_end(WindowEnd::Last(EndKeyword::End), times.view()),
            Some(2.0)
        );
        assert_eq!(
            resolve_window_end(WindowEnd::Day(1.2), times.view()),
            Some(1.2)
        );
    }
}
