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

//! Module containing the diagnostic passes.
//!
//! Each pass iterates over the discovered variables and, for each
//! variable, over datasets defining it. Any problem with a single
//! (variable, dataset) pair is logged and that dataset is omitted
//! from the product, the run itself is never stopped.

mod diurnal;
mod profile;
mod time_height;
mod time_series;

use super::configuration::{Config, CoordinateMode, DatasetStyle};
use super::dataset::Dataset;
use super::discovery::PlottableVariable;
use super::plot::{PlotContext, VariableMetadata};
use super::timing::{adjusted_times, compute_time_offsets};
use crate::{
    errors::{ConfigError, DiagnosticsError},
    Float,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use ndarray::{Array1, ArrayView1};

/// Dataset with everything a pass needs to use it.
#[derive(Debug)]
struct Member<'a> {
    dataset: &'a Dataset,
    style: &'a DatasetStyle,
    offset: Float,
    adjusted: Option<Array1<Float>>,
}

/// Structure holding the datasets aligned in time,
/// their styling and the configuration of passes.
#[derive(Debug)]
pub struct Engine<'a> {
    config: &'a Config,
    datasets: &'a [Dataset],
    styles: Vec<DatasetStyle>,
    offsets: Vec<Float>,
}

impl<'a> Engine<'a> {
    /// Engine constructor, checking that each dataset
    /// has a label and aligning dataset times.
    pub fn new(
        config: &'a Config,
        datasets: &'a [Dataset],
        styles: Vec<DatasetStyle>,
    ) -> Result<Self, DiagnosticsError> {
        if datasets.len() != styles.len() {
            return Err(ConfigError::LabelMismatch(datasets.len(), styles.len()).into());
        }

        debug!("Computing time offsets");
        let offsets = compute_time_offsets(datasets)?;

        Ok(Engine {
            config,
            datasets,
            styles,
            offsets,
        })
    }

    /// Runs all enabled passes over the variables.
    pub fn run(&self, variables: &[PlottableVariable]) -> PlotContext {
        let mut context = PlotContext::new(self.config.style);

        let profiles: Vec<&PlottableVariable> = variables.iter().filter(|v| v.profile).collect();
        let series: Vec<&PlottableVariable> = variables.iter().filter(|v| v.time_series).collect();

        info!("Computing profiles of {} variables", profiles.len());
        let bar = progress_bar(profiles.len(), "Profiles");
        for variable in &profiles {
            self.profile_pass(&variable.name, &mut context);
            bar.inc(1);
        }
        bar.finish_with_message("done");

        info!("Computing time series of {} variables", series.len());
        let bar = progress_bar(series.len(), "Time series");
        for variable in &series {
            self.time_series_pass(&variable.name, &mut context);
            bar.inc(1);
        }
        bar.finish_with_message("done");

        if self.config.time_height.enabled {
            let panels: Vec<&PlottableVariable> =
                variables.iter().filter(|v| v.time_height).collect();

            info!("Computing time-height panels of {} variables", panels.len());
            let bar = progress_bar(panels.len(), "Time-height");
            for variable in &panels {
                self.time_height_pass(&variable.name, &mut context);
                bar.inc(1);
            }
            bar.finish_with_message("done");
        }

        if self.config.diurnal.enabled {
            let composited: Vec<&PlottableVariable> = variables
                .iter()
                .filter(|v| v.profile || v.time_series)
                .collect();

            info!("Computing diurnal composites of {} variables", composited.len());
            let bar = progress_bar(composited.len(), "Diurnal");
            for variable in &composited {
                self.diurnal_pass(&variable.name, &mut context);
                bar.inc(1);
            }
            bar.finish_with_message("done");
        }

        context
    }

    /// Datasets that define the variable, in configured order.
    /// Absence of the variable is logged.
    fn members(&self, var_name: &str) -> Vec<Member> {
        self.datasets
            .iter()
            .zip(&self.styles)
            .zip(&self.offsets)
            .filter_map(|((dataset, style), &offset)| {
                if !dataset.contains(var_name) {
                    warn!(
                        "Variable {} not found in {}, skipping this dataset",
                        var_name, style.label
                    );
                    return None;
                }

                Some(Member {
                    dataset,
                    style,
                    offset,
                    adjusted: adjusted_times(dataset, offset),
                })
            })
            .collect()
    }

    fn metadata(&self, var_name: &str) -> VariableMetadata {
        VariableMetadata::lookup(self.datasets, var_name)
    }

    fn mode(&self) -> CoordinateMode {
        self.config.vertical.coordinate
    }
}

fn progress_bar(len: usize, prefix: &'static str) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .progress_chars("#>-"),
    );
    bar.set_prefix(prefix);

    bar
}

/// Indices of levels shown below the cutoff. For height, levels between
/// the surface and the cutoff are kept. For pressure, levels with pressure
/// not lower than the cutoff are kept. Without cutoff all levels are kept.
fn levels_within_cutoff(
    coordinate: ArrayView1<Float>,
    mode: CoordinateMode,
    cutoff: Option<Float>,
) -> Vec<usize> {
    coordinate
        .iter()
        .enumerate()
        .filter(|&(_, &y)| match (cutoff, mode) {
            (None, _) => true,
            (Some(cutoff), CoordinateMode::Height) => (0.0..=cutoff).contains(&y),
            (Some(cutoff), CoordinateMode::Pressure) => y >= cutoff,
        })
        .map(|(i, _)| i)
        .collect()
}

/// Formats the day for titles the way it is given in configuration.
fn day_label(day: Float) -> String {
    if day.fract() == 0.0 {
        format!("{:.1}", day)
    } else {
        day.to_string()
    }
}
