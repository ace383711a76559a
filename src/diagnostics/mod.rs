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

//! Module containing the actual diagnostics code.
//!
//! The run goes through following steps:
//!
//! 1. Configuration is read from `config.yaml` and checked.
//! 2. The output directory is prepared.
//! 3. All datasets are read into memory, with fill values
//!    replaced by NaN, and derived variables are added.
//! 4. Dataset times are aligned to the first dataset.
//! 5. Variables are discovered and classified.
//! 6. Profile, time series, time-height and diurnal passes
//!    fill the plot context with products.
//! 7. Products are written to the output directory.

mod composite;
mod configuration;
mod coordinate;
mod dataset;
mod discovery;
mod output;
mod passes;
mod plot;
mod timing;


use self::configuration::Config;
use self::dataset::{derived::synthesize_total_precip, Dataset};
use self::discovery::discover_variables;
use self::output::{prepare_output_dir, save_products};
use self::passes::Engine;
use self::plot::PlotContext;
use crate::{errors::DiagnosticsError, ALLOCATOR};
use log::{debug, info};
use std::path::Path;

/// Structure containing everything the passes need:
/// the checked configuration and datasets read into memory.
#[derive(Debug)]
pub struct Core {
    pub config: Config,
    pub datasets: Vec<Dataset>,
}

impl Core {
    /// Diagnostics [`Core`] constructor.
    ///
    /// Reads the configuration, prepares the output directory
    /// and then reads all datasets listed in configuration.
    /// Any problem at this stage is a configuration error
    /// so the run is stopped.
    pub fn new() -> Result<Self, DiagnosticsError> {
        debug!("Reading configuration from config.yaml");
        let config = Config::new_from_file(Path::new("config.yaml"))?;

        debug!("Setting memory limit");
        ALLOCATOR
            .set_limit(config.resources.memory.saturating_mul(1024 * 1024))
            .map_err(|_| DiagnosticsError::MemoryLimit(config.resources.memory))?;

        prepare_output_dir(&config.output.run_directory())?;

        Core::from_config(config)
    }

    /// Reads datasets listed in the configuration
    /// and adds derived variables to them.
    fn from_config(config: Config) -> Result<Self, DiagnosticsError> {
        let mut datasets = Vec::with_capacity(config.datasets.len());

        for descriptor in &config.datasets {
            info!("Reading {} from {}", descriptor.short_id, descriptor.path.display());

            let mut dataset = Dataset::read_netcdf(&descriptor.path)?;
            dataset.name = descriptor.short_id.clone();

            if let Some(case) = dataset.global_attributes.get("case") {
                debug!("{} holds case {}", dataset.name, case);
            }

            if synthesize_total_precip(&mut dataset) {
                debug!("Added total precipitation to {}", dataset.name);
            }

            datasets.push(dataset);
        }

        Ok(Core { config, datasets })
    }

    /// Runs all passes over the datasets.
    fn diagnose(&self) -> Result<PlotContext, DiagnosticsError> {
        let styles = self.config.datasets.iter().map(|d| d.style()).collect();
        let engine = Engine::new(&self.config, &self.datasets, styles)?;

        debug!("Discovering variables");
        let variables = discover_variables(&self.datasets, self.config.time_height.enabled);
        info!("Found {} variables to diagnose", variables.len());

        Ok(engine.run(&variables))
    }

    /// Writes products to the output directory.
    fn save(&self, context: &PlotContext) -> Result<(), DiagnosticsError> {
        let out_path = self.config.output.run_directory();

        info!("Writing {} products to {}", context.len(), out_path.display());

        save_products(
            context,
            &out_path,
            &self.config.output.general_id,
            self.config.vertical.coordinate,
        )?;

        Ok(())
    }
}

/// Main diagnostics function, responsible for all steps of the run.
pub fn main() -> Result<(), DiagnosticsError> {
    info!("Preparing the diagnostics core");

    let core = Core::new()?;

    info!("Running diagnostics on {} datasets", core.datasets.len());
    let context = core.diagnose()?;

    if context.is_empty() {
        info!("No products were created, check the warnings above");
    }

    core.save(&context)?;

    Ok(())
}
