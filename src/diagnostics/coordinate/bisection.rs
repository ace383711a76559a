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

//! Module containg methods for conducting
//! binary search (bisection) of elements closests
//! to searched values in level coordinates.
//!
//! Level coordinates can be sorted ascendingly (height, pressure
//! with level index growing downwards) or descendingly, so
//! both orderings are handled.

use crate::errors::SearchError;

/// Core bisection function, simply an implementation
/// of binary search algorithm adapted to searching values
/// in-between the set items.
fn binary_search<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    let (first, last) = match (array.first(), array.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(SearchError::EmptyArray),
    };

    if x < first && x < last || x > first && x > last {
        return Err(SearchError::OutOfBounds);
    }

    let mut lo = 0;
    let mut hi = array.len() - 1;

    // if the array is sorted descendingly we use a function with reversed signs
    if first < last {
        while lo < hi {
            let mid = (lo + hi) / 2;

            if array[mid] >= *x {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
    } else {
        while lo < hi {
            let mid = (lo + hi) / 2;

            if array[mid] <= *x {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
    }

    Ok(lo)
}

/// Finds the index of the closest item not past the searched
/// value in the array order (to the left of it).
pub fn find_left_closest<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    let found_index = binary_search(array, x)?;

    if array[found_index] == *x || found_index == 0 {
        Ok(found_index)
    } else {
        Ok(found_index - 1)
    }
}

/// Finds the index of the segment `[i, i+1]` to interpolate
/// `x` in. Values outside of the array are assigned the
/// nearest edge segment, so that they are extrapolated.
pub fn find_segment<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    if array.len() < 2 {
        return Err(SearchError::EmptyArray);
    }

    let last_segment = array.len() - 2;

    let index = find_left_closest(array, x).or_else(|err| match err {
        // when searched value is beyond the first item
        // we use the first segment for extrapolation
        // and the last segment otherwise
        SearchError::OutOfBounds => {
            let ascending = array[0] < array[array.len() - 1];
            if (ascending && *x < array[0]) || (!ascending && *x > array[0]) {
                Ok(0)
            } else {
                Ok(last_segment)
            }
        }
        SearchError::EmptyArray => Err(err),
    })?;

    Ok(index.min(last_segment))
}
