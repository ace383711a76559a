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

//! Module responsible for parsing and checking the configuration file.
//!
//! To provide meaningful error messages. The configuration file uses
//! [YAML](https://en.wikipedia.org/wiki/YAML) and `serde` to enforce
//! strong typing and automatic type checking.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml` so you can check this documentation
//! for more details how to set the config file.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::Float;

/// Single dataset to be compared, with
/// its styling used for curves in plots.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct DatasetDescriptor {
    /// Path to the NetCDF file with dataset.
    pub path: PathBuf,

    /// Label used for the dataset in legends and panel titles.
    ///
    /// Cannot be empty.
    pub short_id: String,

    /// _(Optional)_ Color of the dataset curves. Defaults to `"black"`.
    #[serde(default = "DatasetDescriptor::default_color")]
    pub line_color: String,

    /// _(Optional)_ Style of the dataset curves. Defaults to `"-"`.
    #[serde(default = "DatasetDescriptor::default_style")]
    pub line_style: String,
}

impl DatasetDescriptor {
    fn default_color() -> String {
        "black".to_string()
    }

    fn default_style() -> String {
        "-".to_string()
    }

    /// Extracts the styling of the dataset.
    pub fn style(&self) -> DatasetStyle {
        DatasetStyle {
            label: self.short_id.clone(),
            line_color: self.line_color.clone(),
            line_style: self.line_style.clone(),
        }
    }
}

/// Styling of a dataset applied to each curve it contributes.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct DatasetStyle {
    pub label: String,
    pub line_color: String,
    pub line_style: String,
}

/// Fields with information where the output is written.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Output {
    /// Directory in which the output is placed.
    pub directory: PathBuf,

    /// Identifier of this diagnostics set. Output
    /// is written into `directory/general_id/`.
    pub general_id: String,
}

impl Output {
    /// Full path of the directory owned by the run.
    pub fn run_directory(&self) -> PathBuf {
        self.directory.join(&self.general_id)
    }
}

/// Vertical coordinate used on plot y-axes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Deserialize, Serialize)]
pub enum CoordinateMode {
    /// Height above surface in meters.
    #[serde(rename = "z")]
    Height,

    /// Pressure in hPa.
    #[serde(rename = "p")]
    Pressure,
}

impl CoordinateMode {
    pub fn axis_label(&self) -> &'static str {
        match self {
            CoordinateMode::Height => "Height (m)",
            CoordinateMode::Pressure => "Pressure (hPa)",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
pub struct Vertical {
    /// Coordinate used for profiles and time-height panels,
    /// `z` for height or `p` for pressure.
    ///
    /// For height the datasets need `z_mid`, `z_mid_horiz_avg` or `Z3`.
    /// For pressure the datasets should provide surface pressure and
    /// hybrid coefficients, or precomputed pressure; otherwise
    /// the raw level coordinate is used, which may not be accurate
    /// compared to observations.
    pub coordinate: CoordinateMode,
}

/// Keyword accepted in place of a window end day.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndKeyword {
    End,
}

/// End of a profile averaging window.
#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
#[serde(untagged)]
pub enum WindowEnd {
    Day(Float),

    /// The last time available in each dataset.
    Last(EndKeyword),
}

/// Profile averaging window in days.
#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
pub struct ProfileWindow {
    pub start: Float,
    pub end: WindowEnd,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Profiles {
    /// Averaging windows, each producing its own set of profiles.
    ///
    /// At least one window must be provided.
    pub windows: Vec<ProfileWindow>,

    /// _(Optional)_ Highest height (in m) or lowest pressure (in hPa)
    /// shown in profiles. Defaults to the full column.
    #[serde(default)]
    pub max_height: Option<Float>,
}

impl Profiles {
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.windows.is_empty() {
            return Err(ConfigError::OutOfBounds(
                "At least one profile averaging window is required",
            ));
        }

        for window in &self.windows {
            if let WindowEnd::Day(end) = window.end {
                if end < window.start {
                    return Err(ConfigError::OutOfBounds(
                        "Profile window cannot end before it starts",
                    ));
                }
            }
        }

        check_cutoff(self.max_height)
    }
}

/// Optional time range in days, when not set the
/// whole record of each dataset is used.
#[derive(Copy, Clone, PartialEq, Debug, Default, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub start: Option<Float>,

    #[serde(default)]
    pub end: Option<Float>,
}

impl TimeRange {
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(ConfigError::OutOfBounds(
                    "Time range cannot end before it starts",
                ));
            }
        }

        Ok(())
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct TimeHeight {
    /// _(Optional)_ Whether time-height panels are computed.
    /// These can take a bit longer. Defaults to `true`.
    #[serde(default = "TimeHeight::default_enabled")]
    pub enabled: bool,

    #[serde(flatten)]
    pub range: TimeRange,

    /// _(Optional)_ Highest height (in m) or lowest pressure (in hPa)
    /// shown in panels. Defaults to the full column.
    #[serde(default)]
    pub max_height: Option<Float>,

    /// _(Optional)_ Color map name for panels. Defaults to `"viridis_r"`.
    #[serde(default = "TimeHeight::default_colormap")]
    pub colormap: String,
}

impl TimeHeight {
    fn default_enabled() -> bool {
        true
    }

    fn default_colormap() -> String {
        "viridis_r".to_string()
    }
}

impl Default for TimeHeight {
    fn default() -> Self {
        TimeHeight {
            enabled: TimeHeight::default_enabled(),
            range: TimeRange::default(),
            max_height: None,
            colormap: TimeHeight::default_colormap(),
        }
    }
}

/// Diurnal composite analysis settings.
///
/// Datasets need at least three days of data with
/// at least four output time slices each day
/// for the analysis to be considered.
#[derive(Copy, Clone, PartialEq, Debug, Default, Deserialize)]
pub struct Diurnal {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub start_day: Option<Float>,

    #[serde(default)]
    pub end_day: Option<Float>,
}

/// _(Optional)_ Styling knobs passed through to the products index.
#[derive(Copy, Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct Style {
    #[serde(default = "Style::default_linewidth")]
    pub linewidth: Float,

    #[serde(default = "Style::default_fontsize")]
    pub ticksize: Float,

    #[serde(default = "Style::default_fontsize")]
    pub labelsize: Float,
}

impl Style {
    fn default_linewidth() -> Float {
        2.0
    }

    fn default_fontsize() -> Float {
        14.0
    }
}

impl Default for Style {
    fn default() -> Self {
        Style {
            linewidth: Style::default_linewidth(),
            ticksize: Style::default_fontsize(),
            labelsize: Style::default_fontsize(),
        }
    }
}

/// _(Optional)_ Fields with information about
/// resources available for the diagnostics.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Heap memory limit in MB.
    /// Useful for enabling meaningful Out-of-memory error messages,
    /// as all datasets are read into memory at once.
    ///
    /// Cannot be less than `128`. Defaults to whole addressable-space
    /// (`2^32` or `2^64` bytes).
    #[serde(default = "Resources::default_memory")]
    pub memory: usize,
}

impl Resources {
    fn default_memory() -> usize {
        usize::MAX / (1024 * 1024)
    }

    /// Checks if memory limit is above limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.memory < 128 {
            return Err(ConfigError::OutOfBounds(
                "Available memory cannot be less than 128 MB",
            ));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            memory: Resources::default_memory(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Config {
    /// Datasets to compare, model simulations listed first
    /// by convention. The first dataset is the time reference.
    pub datasets: Vec<DatasetDescriptor>,

    pub output: Output,

    pub vertical: Vertical,

    pub profiles: Profiles,

    #[serde(default)]
    pub time_series: TimeRange,

    #[serde(default)]
    pub time_height: TimeHeight,

    #[serde(default)]
    pub diurnal: Diurnal,

    #[serde(default)]
    pub style: Style,

    #[serde(default)]
    pub resources: Resources,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        let config = Config::new_from_slice(data.as_slice())?;

        Ok(config)
    }

    pub(super) fn new_from_slice(data: &[u8]) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_slice(data)?;

        config.check_datasets()?;
        config.profiles.check_bounds()?;
        config.time_series.check_bounds()?;
        config.time_height.range.check_bounds()?;
        check_cutoff(config.time_height.max_height)?;
        config.resources.check_bounds()?;

        Ok(config)
    }

    fn check_datasets(&self) -> Result<(), ConfigError> {
        if self.datasets.is_empty() {
            return Err(ConfigError::OutOfBounds(
                "At least one dataset is required",
            ));
        }

        if self.datasets.iter().any(|d| d.short_id.trim().is_empty()) {
            return Err(ConfigError::OutOfBounds("Dataset short_id cannot be empty"));
        }

        Ok(())
    }
}

fn check_cutoff(cutoff: Option<Float>) -> Result<(), ConfigError> {
    if let Some(cutoff) = cutoff {
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(ConfigError::OutOfBounds(
                "Vertical cutoff must be a positive number",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Config, CoordinateMode, WindowEnd};
    use crate::errors::ConfigError;

    const MINIMAL: &str = r#"
datasets:
  - path: cntl.nc
    short_id: CNTL
    line_color: blue
  - path: les.nc
    short_id: SAM-LES
    line_style: "--"
output:
  directory: diags
  general_id: magic
vertical:
  coordinate: z
profiles:
  windows:
    - { start: 0.0, end: 1.0 }
    - { start: 2.0, end: end }
  max_height: 3000
"#;

    #[test]
    fn parse_minimal() {
        let config = Config::new_from_slice(MINIMAL.as_bytes()).unwrap();

        assert_eq!(config.datasets.len(), 2);
        assert_eq!(config.datasets[1].line_color, "black");
        assert_eq!(config.datasets[1].line_style, "--");
        assert_eq!(config.vertical.coordinate, CoordinateMode::Height);
        assert_eq!(config.profiles.windows[0].end, WindowEnd::Day(1.0));
        assert!(matches!(config.profiles.windows[1].end, WindowEnd::Last(_)));
        assert_eq!(config.profiles.max_height, Some(3000.0));
        assert!(config.time_height.enabled);
        assert_eq!(config.time_height.colormap, "viridis_r");
        assert!(!config.diurnal.enabled);
        assert_eq!(config.time_series.start, None);
        assert_eq!(
            config.output.run_directory(),
            std::path::Path::new("diags/magic")
        );
    }

    #[test]
    fn parse_optional_sections() {
        let yaml = format!(
            "{}{}",
            MINIMAL,
            r#"
time_series: { start: 0.0, end: 3.25 }
time_height: { enabled: false, start: 0.5, max_height: 4000 }
diurnal: { enabled: true, end_day: 3.0 }
style: { linewidth: 4 }
"#
        );
        let config = Config::new_from_slice(yaml.as_bytes()).unwrap();

        assert_eq!(config.time_series.end, Some(3.25));
        assert!(!config.time_height.enabled);
        assert_eq!(config.time_height.range.start, Some(0.5));
        assert_eq!(config.time_height.range.end, None);
        assert_eq!(config.time_height.max_height, Some(4000.0));
        assert!(config.diurnal.enabled);
        assert_eq!(config.diurnal.start_day, None);
        assert_eq!(config.diurnal.end_day, Some(3.0));
        assert_eq!(config.style.linewidth, 4.0);
        assert_eq!(config.style.labelsize, 14.0);
    }

    #[test]
    fn reject_reversed_window() {
        let yaml = MINIMAL.replace("{ start: 0.0, end: 1.0 }", "{ start: 2.0, end: 1.0 }");
        let result = Config::new_from_slice(yaml.as_bytes());

        assert!(matches!(result, Err(ConfigError::OutOfBounds(_))));
    }

    #[test]
    fn reject_empty_label() {
        let yaml = MINIMAL.replace("short_id: CNTL", "short_id: \"\"");
        let result = Config::new_from_slice(yaml.as_bytes());

        assert!(matches!(result, Err(ConfigError::OutOfBounds(_))));
    }

    #[test]
    fn reject_unknown_coordinate() {
        let yaml = MINIMAL.replace("coordinate: z", "coordinate: sigma");
        let result = Config::new_from_slice(yaml.as_bytes());

        assert!(matches!(result, Err(ConfigError::CantDeserialize(_))));
    }
}
