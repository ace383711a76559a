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

//! Diurnal composites, as curves for surface variables
//! and as panels for variables with vertical axis.

use super::{day_label, levels_within_cutoff, Engine};
use crate::diagnostics::composite::compute_diurnal_composite;
use crate::diagnostics::coordinate::resolve_vertical_coordinate;
use crate::diagnostics::plot::{Curve, GridRequest, LinePlot, PanelData, PlotContext, ProductKind};
use crate::Float;
use log::{debug, error, info, warn};
use ndarray::Axis;

const HOUR_LABEL: &str = "Hour of day";

impl<'a> Engine<'a> {
    /// Adds the diurnal composite of the variable from each
    /// dataset with long enough record.
    pub(super) fn diurnal_pass(&self, var_name: &str, context: &mut PlotContext) {
        let settings = self.config.diurnal;
        let mode = self.mode();

        let mut curves = vec![];
        let mut panels = vec![];
        let mut span: Option<(Float, Float)> = None;

        for member in self.members(var_name) {
            let label = &member.style.label;

            let composite = match compute_diurnal_composite(
                member.dataset,
                var_name,
                member.offset,
                settings.start_day,
                settings.end_day,
            ) {
                Ok(composite) => composite,
                Err(reason) => {
                    info!(
                        "Skipping diurnal composite of {} in {}: {}",
                        var_name, label, reason
                    );
                    continue;
                }
            };

            debug!(
                "Diurnal composite of {} in {} from day {} to {} with {} steps per day",
                var_name,
                label,
                composite.effective_start,
                composite.effective_end,
                composite.steps_per_day
            );

            span = Some(match span {
                None => (composite.effective_start, composite.effective_end),
                Some((start, end)) => (
                    start.min(composite.effective_start),
                    end.max(composite.effective_end),
                ),
            });

            if composite.rank == 1 {
                curves.push(Curve {
                    style: member.style.clone(),
                    coordinate: None,
                    x: composite.hours,
                    y: composite.values.column(0).to_owned(),
                });
                continue;
            }

            let coordinate = match resolve_vertical_coordinate(
                member.dataset,
                &composite.time_indices,
                mode,
                var_name,
            ) {
                Ok(coordinate) => coordinate,
                Err(err) => {
                    error!(
                        "Cannot compute vertical coordinate of {} in {}: {}",
                        var_name, label, err
                    );
                    continue;
                }
            };

            let kept = levels_within_cutoff(
                coordinate.values.view(),
                mode,
                self.config.time_height.max_height,
            );

            panels.push(PanelData {
                style: member.style.clone(),
                coordinate: coordinate.provenance,
                x: composite.hours,
                y: coordinate.values.select(Axis(0), &kept),
                values: composite.values.select(Axis(1), &kept),
            });
        }

        let (start, end) = match span {
            Some(span) => span,
            None => {
                warn!("No dataset qualifies for diurnal composite of {}", var_name);
                return;
            }
        };

        let metadata = self.metadata(var_name);
        let period = format!("(Day {} to Day {})", day_label(start), day_label(end));

        if !curves.is_empty() {
            let kind = ProductKind::Diurnal;

            context.add_lines(LinePlot {
                variable: var_name.to_string(),
                kind,
                file: kind.file_name(var_name),
                title: format!("{} Diurnal Cycle {}", metadata.long_name, period),
                x_label: HOUR_LABEL.to_string(),
                y_label: metadata.units.clone(),
                invert_y: false,
                curves,
            });
        }

        if !panels.is_empty() {
            let request = GridRequest {
                variable: var_name.to_string(),
                kind: ProductKind::DiurnalTimeHeight,
                title: format!(
                    "{} ({}) Diurnal Cycle {}",
                    metadata.long_name, metadata.units, period
                ),
                x_label: HOUR_LABEL.to_string(),
                mode,
                colormap: self.config.time_height.colormap.clone(),
            };

            context.add_panels(request, panels);
        }
    }
}
