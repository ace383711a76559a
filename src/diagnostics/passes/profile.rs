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

//! Profiles averaged over configured time windows.

use super::{day_label, levels_within_cutoff, Engine};
use crate::diagnostics::configuration::{CoordinateMode, ProfileWindow, WindowEnd};
use crate::diagnostics::coordinate::resolve_vertical_coordinate;
use crate::diagnostics::dataset::statistics::windowed_mean;
use crate::diagnostics::plot::{Curve, LinePlot, PlotContext, ProductKind};
use crate::diagnostics::timing::{resolve_window_end, window_indices};
use log::{error, warn};
use ndarray::Axis;

impl<'a> Engine<'a> {
    /// Adds a profile plot of the variable for each averaging window.
    pub(super) fn profile_pass(&self, var_name: &str, context: &mut PlotContext) {
        for (k, window) in self.config.profiles.windows.iter().enumerate() {
            match self.profile(var_name, k + 1, window) {
                Some(plot) => context.add_lines(plot),
                None => warn!(
                    "No dataset contributed to profile of {} in window {}, skipping",
                    var_name,
                    k + 1
                ),
            }
        }
    }

    fn profile(&self, var_name: &str, number: usize, window: &ProfileWindow) -> Option<LinePlot> {
        let mode = self.mode();
        let mut curves = vec![];

        for member in self.members(var_name) {
            let label = &member.style.label;

            let adjusted = match &member.adjusted {
                Some(adjusted) => adjusted,
                None => {
                    warn!("{} has no time coordinate, skipping profile of {}", label, var_name);
                    continue;
                }
            };

            let end = resolve_window_end(window.end, adjusted.view());
            let indices = window_indices(adjusted.view(), Some(window.start), end);

            if indices.is_empty() {
                warn!(
                    "Window {} selects no time steps of {} in {}, skipping",
                    number, var_name, label
                );
                continue;
            }

            let field = match member
                .dataset
                .require(var_name)
                .and_then(|v| v.time_level(var_name))
            {
                Ok(field) => field,
                Err(err) => {
                    warn!("Cannot use {} from {} as profile: {}", var_name, label, err);
                    continue;
                }
            };

            let coordinate =
                match resolve_vertical_coordinate(member.dataset, &indices, mode, var_name) {
                    Ok(coordinate) => coordinate,
                    Err(err) => {
                        error!(
                            "Cannot compute vertical coordinate of {} in {}: {}",
                            var_name, label, err
                        );
                        continue;
                    }
                };

            if indices.iter().any(|&i| i >= field.nrows()) {
                warn!("{} in {} is shorter than its time axis, skipping", var_name, label);
                continue;
            }

            let mean = windowed_mean(field.view(), &indices);
            let kept = levels_within_cutoff(
                coordinate.values.view(),
                mode,
                self.config.profiles.max_height,
            );

            curves.push(Curve {
                style: member.style.clone(),
                coordinate: Some(coordinate.provenance),
                x: mean.select(Axis(0), &kept),
                y: coordinate.values.select(Axis(0), &kept),
            });
        }

        if curves.is_empty() {
            return None;
        }

        let metadata = self.metadata(var_name);
        let end = match window.end {
            WindowEnd::Day(day) => day_label(day),
            WindowEnd::Last(_) => "end".to_string(),
        };
        let kind = ProductKind::Profile(number);

        Some(LinePlot {
            variable: var_name.to_string(),
            kind,
            file: kind.file_name(var_name),
            title: format!(
                "{} Profile (Day {} to Day {})",
                metadata.long_name,
                day_label(window.start),
                end
            ),
            x_label: metadata.units,
            y_label: mode.axis_label().to_string(),
            invert_y: mode == CoordinateMode::Pressure,
            curves,
        })
    }
}
