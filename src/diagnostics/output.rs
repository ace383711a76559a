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

//! Module responsible for writing the products to disk.
//!
//! Every product is written as a CSV table in long format
//! (one row per plotted point) and all products are listed
//! in `products.yaml` together with their plotting metadata.

use super::configuration::{CoordinateMode, Style};
use super::plot::{LinePlot, PanelGrid, PlotContext, ProductKind};
use crate::errors::OutputError;
use log::debug;
use serde::Serialize;
use std::{collections::BTreeMap, fs, path::Path};

const INDEX_FILE: &str = "products.yaml";

/// Prepares the directory owned by the run,
/// removing any output of previous runs.
pub fn prepare_output_dir(out_path: &Path) -> Result<(), OutputError> {
    debug!("Checking and setting output directory");

    if out_path.is_dir() {
        debug!("Output directory exists so removing its contents");
        fs::remove_dir_all(out_path)?;
    }

    fs::create_dir_all(out_path)?;

    Ok(())
}

#[derive(Serialize)]
#[serde(untagged)]
enum IndexEntry<'a> {
    Lines(&'a LinePlot),
    Panels(&'a PanelGrid),
}

#[derive(Serialize)]
struct ProductIndex<'a> {
    general_id: &'a str,
    coordinate: CoordinateMode,
    style: &'a Style,
    products: BTreeMap<&'static str, Vec<IndexEntry<'a>>>,
}

/// Writes all products and their index into `out_path`.
pub fn save_products(
    context: &PlotContext,
    out_path: &Path,
    general_id: &str,
    coordinate: CoordinateMode,
) -> Result<(), OutputError> {
    let mut products: BTreeMap<&'static str, Vec<IndexEntry>> = BTreeMap::new();

    for plot in &context.lines {
        save_lines(plot, out_path)?;
        products
            .entry(plot.kind.category())
            .or_default()
            .push(IndexEntry::Lines(plot));
    }

    for grid in &context.grids {
        save_panels(grid, out_path)?;
        products
            .entry(grid.kind.category())
            .or_default()
            .push(IndexEntry::Panels(grid));
    }

    let index = ProductIndex {
        general_id,
        coordinate,
        style: &context.style,
        products,
    };

    let index_file = fs::File::create(out_path.join(INDEX_FILE))?;
    serde_yaml::to_writer(index_file, &index)?;

    Ok(())
}

fn save_lines(plot: &LinePlot, out_path: &Path) -> Result<(), OutputError> {
    let (x_column, y_column) = match plot.kind {
        ProductKind::Profile(_) => ("value", "coordinate"),
        ProductKind::Diurnal => ("hour", "value"),
        _ => ("time", "value"),
    };

    let mut out_file = csv::Writer::from_path(out_path.join(&plot.file))?;

    out_file.write_record(&["dataset", x_column, y_column])?;

    for curve in &plot.curves {
        for (x, y) in curve.x.iter().zip(curve.y.iter()) {
            out_file.write_record(&[curve.style.label.clone(), x.to_string(), y.to_string()])?;
        }
    }

    out_file.flush()?;

    Ok(())
}

fn save_panels(grid: &PanelGrid, out_path: &Path) -> Result<(), OutputError> {
    let x_column = match grid.kind {
        ProductKind::DiurnalTimeHeight => "hour",
        _ => "time",
    };

    let mut out_file = csv::Writer::from_path(out_path.join(&grid.file))?;

    out_file.write_record(&["dataset", x_column, "coordinate", "value"])?;

    for panel in &grid.panels {
        for ((i, j), value) in panel.values.indexed_iter() {
            out_file.write_record(&[
                panel.style.label.clone(),
                panel.x[i].to_string(),
                panel.y[j].to_string(),
                value.to_string(),
            ])?;
        }
    }

    out_file.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{prepare_output_dir, save_products};
    use crate::diagnostics::configuration::{CoordinateMode, DatasetStyle, Style};
    use crate::diagnostics::coordinate::Provenance;
    use crate::diagnostics::plot::{
        Curve, GridRequest, LinePlot, PanelData, PlotContext, ProductKind,
    };
    use ndarray::array;
    use std::{env, fs};

    fn style(label: &str) -> DatasetStyle {
        DatasetStyle {
            label: label.to_string(),
            line_color: "black".to_string(),
            line_style: "-".to_string(),
        }
    }

    #[test]
    fn writes_tables_and_index() {
        let out_path = env::temp_dir().join("iopd_output_test");
        fs::create_dir_all(&out_path).unwrap();
        fs::write(out_path.join("stale.csv"), "old").unwrap();

        prepare_output_dir(&out_path).unwrap();
        assert!(!out_path.join("stale.csv").exists());

        let mut context = PlotContext::new(Style::default());
        context.add_lines(LinePlot {
            variable: "T".to_string(),
            kind: ProductKind::Profile(1),
            file: ProductKind::Profile(1).file_name("T"),
            title: "Temperature Profile (Day 1.0 to Day 2.0)".to_string(),
            x_label: "K".to_string(),
            y_label: "Height (m)".to_string(),
            invert_y: false,
            curves: vec![Curve {
                style: style("CNTL"),
                coordinate: Some(Provenance::Height("z_mid")),
                x: array![290.0, 280.0],
                y: array![10.0, 510.0],
            }],
        });
        context.add_panels(
            GridRequest {
                variable: "CLOUD".to_string(),
                kind: ProductKind::TimeHeight,
                title: "Cloud fraction".to_string(),
                x_label: "Time (days)".to_string(),
                mode: CoordinateMode::Height,
                colormap: "viridis_r".to_string(),
            },
            vec![PanelData {
                style: style("LES"),
                coordinate: Provenance::Height("z_mid"),
                x: array![0.0, 0.5],
                y: array![100.0],
                values: array![[0.25], [0.5]],
            }],
        );

        save_products(&context, &out_path, "test", CoordinateMode::Height).unwrap();

        let profile = fs::read_to_string(out_path.join("T_profile_window1.csv")).unwrap();
        assert_eq!(
            profile,
            "dataset,value,coordinate\nCNTL,290,10\nCNTL,280,510\n"
        );

        let panels = fs::read_to_string(out_path.join("CLOUD_time_height.csv")).unwrap();
        assert_eq!(
            panels,
            "dataset,time,coordinate,value\nLES,0,100,0.25\nLES,0.5,100,0.5\n"
        );

        let index = fs::read_to_string(out_path.join("products.yaml")).unwrap();
        assert!(index.contains("profiles"));
        assert!(index.contains("time_height"));
        assert!(index.contains("T_profile_window1.csv"));

        fs::remove_dir_all(&out_path).unwrap();
    }
}
