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

//! Time-height panels over the configured time range.

use super::{levels_within_cutoff, Engine};
use crate::diagnostics::coordinate::resolve_vertical_coordinate;
use crate::diagnostics::plot::{GridRequest, PanelData, PlotContext, ProductKind};
use crate::diagnostics::timing::window_indices;
use log::{error, warn};
use ndarray::Axis;

impl<'a> Engine<'a> {
    /// Adds a grid of time-height panels of the variable, one per dataset,
    /// sharing the color scale.
    pub(super) fn time_height_pass(&self, var_name: &str, context: &mut PlotContext) {
        let mode = self.mode();
        let settings = &self.config.time_height;
        let mut panels = vec![];

        for member in self.members(var_name) {
            let label = &member.style.label;

            let adjusted = match &member.adjusted {
                Some(adjusted) => adjusted,
                None => {
                    warn!("{} has no time coordinate, skipping time-height of {}", label, var_name);
                    continue;
                }
            };

            let field = match member
                .dataset
                .require(var_name)
                .and_then(|v| v.time_level(var_name))
            {
                Ok(field) => field,
                Err(err) => {
                    warn!("Cannot use {} from {} as time-height: {}", var_name, label, err);
                    continue;
                }
            };

            let indices: Vec<usize> =
                window_indices(adjusted.view(), settings.range.start, settings.range.end)
                    .into_iter()
                    .filter(|&i| i < field.nrows())
                    .collect();

            if indices.is_empty() {
                warn!("No time steps of {} in {} within the time-height range", var_name, label);
                continue;
            }

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

            let kept = levels_within_cutoff(coordinate.values.view(), mode, settings.max_height);

            panels.push(PanelData {
                style: member.style.clone(),
                coordinate: coordinate.provenance,
                x: adjusted.select(Axis(0), &indices),
                y: coordinate.values.select(Axis(0), &kept),
                values: field.select(Axis(0), &indices).select(Axis(1), &kept),
            });
        }

        if panels.is_empty() {
            warn!("No dataset contributed to time-height of {}, skipping", var_name);
            return;
        }

        let metadata = self.metadata(var_name);

        let request = GridRequest {
            variable: var_name.to_string(),
            kind: ProductKind::TimeHeight,
            title: format!("{} ({})", metadata.long_name, metadata.units),
            x_label: "Time (days)".to_string(),
            mode,
            colormap: settings.colormap.clone(),
        };

        context.add_panels(request, panels);
    }
}
