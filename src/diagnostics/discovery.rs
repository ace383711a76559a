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

//! Discovery of variables to plot and their classification.

use super::dataset::{Dataset, Variable};
use log::debug;
use rustc_hash::FxHashSet;

/// Variable present in at least one dataset
/// with the kinds of plots it qualifies for.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PlottableVariable {
    pub name: String,
    pub profile: bool,
    pub time_series: bool,
    pub time_height: bool,
}

/// Variable with time and vertical axis (and possibly columns).
fn is_profile(var: &Variable) -> bool {
    var.has_time() && var.level_axis().is_some() && (2..=3).contains(&var.ndim())
}

/// Variable with time but without vertical axis.
fn is_time_series(var: &Variable) -> bool {
    var.has_time() && var.level_axis().is_none() && (1..=2).contains(&var.ndim())
}

/// Collects data variables from all datasets, sorted by name
/// (case-insensitively). A variable qualifies for a plot kind
/// when it does so in any dataset.
pub fn discover_variables(
    datasets: &[Dataset],
    time_height_enabled: bool,
) -> Vec<PlottableVariable> {
    let names: FxHashSet<&String> = datasets
        .iter()
        .flat_map(|ds| ds.data_variables().map(|(name, _)| name))
        .collect();

    let mut names: Vec<&String> = names.into_iter().collect();
    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));

    names
        .into_iter()
        .map(|name| {
            let variables = || datasets.iter().filter_map(|ds| ds.variable(name));

            let profile = variables().any(is_profile);
            let time_series = variables().any(is_time_series);

            let plottable = PlottableVariable {
                name: name.clone(),
                profile,
                time_series,
                time_height: profile && time_height_enabled,
            };

            debug!("Discovered {:?}", plottable);
            plottable
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::discover_variables;
    use crate::diagnostics::dataset::{Dataset, Variable};
    use ndarray::{ArrayD, IxDyn};

    fn variable(dims: &[&str]) -> Variable {
        let shape = vec![2; dims.len()];
        Variable::new(dims, ArrayD::zeros(IxDyn(&shape)))
    }

    fn datasets() -> Vec<Dataset> {
        let mut model = Dataset::new("model");
        model.insert("time", variable(&["time"]));
        model.insert("lev", variable(&["lev"]));
        model.insert("T", variable(&["time", "lev", "ncol"]));
        model.insert("PRECT", variable(&["time", "ncol"]));
        model.insert("hyam", variable(&["lev"]));
        model.insert("cldfrac", variable(&["time", "lev", "ncol", "ncol2"]));

        let mut les = Dataset::new("les");
        les.insert("time", variable(&["time"]));
        les.insert("omega", variable(&["time", "ilev"]));
        les.insert("lhflx", variable(&["time"]));
        les.insert("T", variable(&["time", "lev"]));

        vec![model, les]
    }

    #[test]
    fn sorted_union() {
        let found = discover_variables(&datasets(), true);
        let names: Vec<&str> = found.iter().map(|v| v.name.as_str()).collect();

        assert_eq!(names, vec!["cldfrac", "hyam", "lhflx", "omega", "PRECT", "T"]);
    }

    #[test]
    fn classification() {
        let found = discover_variables(&datasets(), true);
        let get = |name: &str| found.iter().find(|v| v.name == name).unwrap().clone();

        assert!(get("T").profile);
        assert!(get("T").time_height);
        assert!(!get("T").time_series);

        assert!(get("omega").profile);
        assert!(get("PRECT").time_series);
        assert!(get("lhflx").time_series);

        let hyam = get("hyam");
        assert!(!hyam.profile && !hyam.time_series && !hyam.time_height);

        let cldfrac = get("cldfrac");
        assert!(!cldfrac.profile && !cldfrac.time_series);
    }

    #[test]
    fn time_height_gated() {
        let found = discover_variables(&datasets(), false);

        assert!(found.iter().all(|v| !v.time_height));
        assert!(found.iter().any(|v| v.profile));
    }
}
