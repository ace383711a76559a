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

//! Time series of variables without vertical axis.

use super::Engine;
use crate::diagnostics::plot::{Curve, LinePlot, PlotContext, ProductKind};
use crate::diagnostics::timing::window_indices;
use log::warn;
use ndarray::Axis;

impl<'a> Engine<'a> {
    /// Adds a time series plot of the variable,
    /// with one curve per dataset.
    pub(super) fn time_series_pass(&self, var_name: &str, context: &mut PlotContext) {
        let range = self.config.time_series;
        let mut curves = vec![];

        for member in self.members(var_name) {
            let label = &member.style.label;

            let adjusted = match &member.adjusted {
                Some(adjusted) => adjusted,
                None => {
                    warn!("{} has no time coordinate, skipping time series of {}", label, var_name);
                    continue;
                }
            };

            let variable = match member.dataset.variable(var_name) {
                Some(variable) => variable,
                None => continue,
            };

            if !variable.has_time() || variable.level_axis().is_some() || variable.ndim() > 2 {
                warn!(
                    "Variable {} in {} has unexpected dimensions {:?} for a time series, skipping",
                    var_name, label, variable.dims
                );
                continue;
            }

            let series = match variable.time_series(var_name) {
                Ok(series) => series,
                Err(err) => {
                    warn!("Cannot use {} from {} as time series: {}", var_name, label, err);
                    continue;
                }
            };

            let indices: Vec<usize> = window_indices(adjusted.view(), range.start, range.end)
                .into_iter()
                .filter(|&i| i < series.len())
                .collect();

            if indices.is_empty() {
                warn!("No time steps of {} in {} within the time series range", var_name, label);
                continue;
            }

            curves.push(Curve {
                style: member.style.clone(),
                coordinate: None,
                x: adjusted.select(Axis(0), &indices),
                y: series.select(Axis(0), &indices),
            });
        }

        if curves.is_empty() {
            warn!("No dataset contributed to time series of {}, skipping", var_name);
            return;
        }

        let metadata = self.metadata(var_name);
        let kind = ProductKind::TimeSeries;

        context.add_lines(LinePlot {
            variable: var_name.to_string(),
            kind,
            file: kind.file_name(var_name),
            title: format!("{} Time Series", metadata.long_name),
            x_label: "Time (days)".to_string(),
            y_label: metadata.units,
            invert_y: false,
            curves,
        });
    }
}
