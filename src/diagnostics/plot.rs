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

//! Numerical content of the comparison plots.
//!
//! Passes do not draw anything, instead they add products
//! to the [`PlotContext`] which is then written to disk.
//! Each product holds the data of one plot and the information
//! needed to render it (title, labels, styling).

use super::configuration::{CoordinateMode, DatasetStyle, Style};
use super::coordinate::Provenance;
use super::dataset::{statistics::nanminmax, Dataset};
use crate::constants::{COLOR_LEVELS, MISSING_LONG_NAME, PANEL_COLUMNS, SCALE_WIDENING};
use crate::Float;
use log::warn;
use ndarray::{Array1, Array2};
use serde::Serialize;

/// Kind of a product, determining its category
/// in the products index and its file name.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Profile averaged over the window with given (1-based) number.
    Profile(usize),
    TimeSeries,
    TimeHeight,
    Diurnal,
    DiurnalTimeHeight,
}

impl ProductKind {
    pub fn category(&self) -> &'static str {
        match self {
            ProductKind::Profile(_) => "profiles",
            ProductKind::TimeSeries => "time_series",
            ProductKind::TimeHeight => "time_height",
            ProductKind::Diurnal | ProductKind::DiurnalTimeHeight => "diurnal",
        }
    }

    pub fn file_name(&self, variable: &str) -> String {
        match self {
            ProductKind::Profile(window) => format!("{}_profile_window{}.csv", variable, window),
            ProductKind::TimeSeries => format!("{}_timeseries.csv", variable),
            ProductKind::TimeHeight => format!("{}_time_height.csv", variable),
            ProductKind::Diurnal => format!("{}_diurnal.csv", variable),
            ProductKind::DiurnalTimeHeight => format!("{}_diurnal_time_height.csv", variable),
        }
    }
}

/// Descriptive metadata of a plotted variable.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct VariableMetadata {
    pub long_name: String,
    pub units: String,
}

impl VariableMetadata {
    /// Takes the metadata from the first dataset with the variable.
    pub fn lookup(datasets: &[Dataset], var_name: &str) -> Self {
        let var = datasets.iter().find_map(|ds| ds.variable(var_name));

        let units = var
            .and_then(|v| v.units.clone())
            .unwrap_or_else(|| "Value".to_string());

        let long_name = match var.and_then(|v| v.long_name.clone()) {
            Some(long_name) if long_name != MISSING_LONG_NAME => long_name,
            _ => var_name.to_string(),
        };

        VariableMetadata { long_name, units }
    }
}

/// Single line of a line plot.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Curve {
    #[serde(flatten)]
    pub style: DatasetStyle,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Provenance>,

    #[serde(skip)]
    pub x: Array1<Float>,

    #[serde(skip)]
    pub y: Array1<Float>,
}

/// Profiles, time series and 1-D diurnal cycles,
/// one curve per dataset.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct LinePlot {
    pub variable: String,
    pub kind: ProductKind,
    pub file: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub invert_y: bool,
    pub curves: Vec<Curve>,
}

/// Shared color scale of panels.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ColorScale {
    pub min: Float,
    pub max: Float,
    pub levels: Vec<Float>,
}

impl ColorScale {
    /// Creates scale spanning the range of all values (skipping NaN).
    ///
    /// Constant data would give an empty range, so it is widened by
    /// 1% of the value in both directions (or by 0.01 when it is zero).
    pub fn from_values<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Float>,
    {
        let (mut min, mut max) = nanminmax(values)?;

        if min == max {
            warn!("Values are constant ({}), widening color scale", min);

            let widening = if min == 0.0 {
                SCALE_WIDENING
            } else {
                SCALE_WIDENING * min.abs()
            };

            min -= widening;
            max += widening;
        }

        let step = (max - min) / (COLOR_LEVELS - 1) as Float;
        let mut levels: Vec<Float> = (0..COLOR_LEVELS).map(|i| min + step * i as Float).collect();

        if let Some(last) = levels.last_mut() {
            *last = max;
        }

        Some(ColorScale { min, max, levels })
    }
}

/// Single dataset panel of a panel grid.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Panel {
    #[serde(flatten)]
    pub style: DatasetStyle,

    pub coordinate: Provenance,
    pub row: usize,
    pub column: usize,

    /// Time or hour of day.
    #[serde(skip)]
    pub x: Array1<Float>,

    /// Vertical coordinate.
    #[serde(skip)]
    pub y: Array1<Float>,

    /// Values as `(x, y)`.
    #[serde(skip)]
    pub values: Array2<Float>,
}

/// Time-height and 2-D diurnal plots, one panel per dataset.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct PanelGrid {
    pub variable: String,
    pub kind: ProductKind,
    pub file: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub invert_y: bool,
    pub rows: usize,
    pub columns: usize,
    pub colormap: String,
    pub scale: ColorScale,
    pub panels: Vec<Panel>,
}

/// Number of rows and columns of a grid holding `panels` panels.
pub fn grid_shape(panels: usize) -> (usize, usize) {
    let rows = (panels + PANEL_COLUMNS - 1) / PANEL_COLUMNS;

    (rows, PANEL_COLUMNS)
}

/// Panel data before the grid is laid out.
#[derive(Clone, PartialEq, Debug)]
pub struct PanelData {
    pub style: DatasetStyle,
    pub coordinate: Provenance,
    pub x: Array1<Float>,
    pub y: Array1<Float>,
    pub values: Array2<Float>,
}

/// Description of a panel grid before the grid is laid out.
#[derive(Clone, PartialEq, Debug)]
pub struct GridRequest {
    pub variable: String,
    pub kind: ProductKind,
    pub title: String,
    pub x_label: String,
    pub mode: CoordinateMode,
    pub colormap: String,
}

/// Collection of all products created in the run,
/// passed explicitly through the passes.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct PlotContext {
    pub style: Style,
    pub lines: Vec<LinePlot>,
    pub grids: Vec<PanelGrid>,
}

impl PlotContext {
    pub fn new(style: Style) -> Self {
        PlotContext {
            style,
            lines: vec![],
            grids: vec![],
        }
    }

    pub fn add_lines(&mut self, plot: LinePlot) {
        self.lines.push(plot);
    }

    /// Lays out panels in the grid with a color scale shared by all
    /// panels. Panels without any valid value are not added.
    pub fn add_panels(&mut self, request: GridRequest, panels: Vec<PanelData>) {
        let scale = match ColorScale::from_values(panels.iter().flat_map(|p| p.values.iter())) {
            Some(scale) => scale,
            None => {
                warn!(
                    "{} has no valid values in any dataset, skipping {:?} plot",
                    request.variable, request.kind
                );
                return;
            }
        };

        let (rows, columns) = grid_shape(panels.len());

        let panels = panels
            .into_iter()
            .enumerate()
            .map(|(i, data)| Panel {
                style: data.style,
                coordinate: data.coordinate,
                row: i / columns,
                column: i % columns,
                x: data.x,
                y: data.y,
                values: data.values,
            })
            .collect();

        self.grids.push(PanelGrid {
            file: request.kind.file_name(&request.variable),
            variable: request.variable,
            kind: request.kind,
            title: request.title,
            x_label: request.x_label,
            y_label: request.mode.axis_label().to_string(),
            invert_y: request.mode == CoordinateMode::Pressure,
            rows,
            columns,
            colormap: request.colormap,
            scale,
            panels,
        });
    }

    pub fn len(&self) -> usize {
        self.lines.len() + self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
