use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result, bail};

use crate::bisect::{Bisector, SearchState};
use crate::graph::{DependencyGraph, StableTopo, UndirectedReach};
use crate::model::config::{AppConfig, ModPaths};
use crate::model::descriptor::{Component, plugin_count};
use crate::oracle::{ConsoleOracle, Oracle, component_lines};
use crate::plugin::PluginManager;
use crate::plugin::activation::{Activation, DirActivation};
use crate::plugin::manager::archive_paths;

pub struct App {
    pub config: AppConfig,
    pub paths: ModPaths,
}

impl App {
    pub fn new(config: AppConfig, paths: ModPaths) -> Self {
        Self { config, paths }
    }

    /// Scan the active folder and group its mods into ordered components.
    pub fn load_components(&self) -> Result<Vec<Component>> {
        let manager = PluginManager::scan(&self.paths.active, &self.config.scan)?;
        tracing::info!("{}", manager.summary_notification());

        let graph = DependencyGraph::build(manager.into_descriptors())
            .context("inconsistent mod set")?;
        if graph.is_empty() {
            tracing::warn!("no mods found in {}", self.paths.active.display());
        }
        tracing::debug!("{} dependency edges", graph.edges().len());

        let components = graph.components(&UndirectedReach, &StableTopo);
        tracing::info!("{} mods form {} components", graph.len(), components.len());
        Ok(components)
    }

    /// Print the components without moving anything.
    pub fn list(&self, out: &mut dyn Write) -> Result<()> {
        let components = self.load_components()?;
        writeln!(
            out,
            "{} mods in {} components (smallest first):",
            plugin_count(&components),
            components.len()
        )?;
        for component in &components {
            for line in component_lines(component) {
                writeln!(out, "{line}")?;
            }
        }
        Ok(())
    }

    /// Move every parked archive back into the active folder.
    pub fn restore(&self, out: &mut dyn Write) -> Result<usize> {
        if !self.paths.parked.is_dir() {
            writeln!(
                out,
                "Nothing to restore: {} does not exist.",
                self.paths.parked.display()
            )?;
            return Ok(0);
        }

        let parked = archive_paths(&self.paths.parked, &self.config.scan.archive_extension)?;
        let locators: Vec<String> = parked
            .iter()
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .collect();

        fs::create_dir_all(&self.paths.active)
            .with_context(|| format!("creating {}", self.paths.active.display()))?;
        DirActivation::new(&self.paths).restore(&locators)?;

        tracing::info!("restored {} mods", locators.len());
        writeln!(
            out,
            "Restored {} mods into {}.",
            locators.len(),
            self.paths.active.display()
        )?;
        Ok(locators.len())
    }

    /// Interactive session on the terminal.
    pub fn run(&self) -> Result<()> {
        let mut oracle = ConsoleOracle::attach()?;
        let mut activation = DirActivation::new(&self.paths);
        let mut out = io::stdout();
        self.bisect(&mut activation, &mut oracle, &mut out)?;
        Ok(())
    }

    pub fn bisect(
        &self,
        activation: &mut dyn Activation,
        oracle: &mut dyn Oracle,
        out: &mut dyn Write,
    ) -> Result<SearchState> {
        writeln!(out, "Loading mods from directory: {}", self.paths.active.display())?;
        self.prepare_parked()?;

        let components = self.load_components()?;
        oracle.check_interrupt()?;
        writeln!(
            out,
            "{} mods in {} components.",
            plugin_count(&components),
            components.len()
        )?;

        let mut bisector = Bisector::new(activation, oracle);
        let outcome = bisector.run(components)?;
        let trials = bisector.trials();

        match &outcome {
            SearchState::FaultIsolated(component) => {
                writeln!(out, "Found bug in component after {trials} trials:")?;
                for line in component_lines(component) {
                    writeln!(out, "{line}")?;
                }
            }
            _ => writeln!(out, "No components found, exiting.")?,
        }
        writeln!(
            out,
            "Parked mods stay in {}; run `modbisect restore` to bring them back.",
            self.paths.parked.display()
        )?;

        Ok(outcome)
    }

    /// The parked folder must start out empty, since no session state
    /// survives a restart.
    fn prepare_parked(&self) -> Result<()> {
        fs::create_dir_all(&self.paths.parked)
            .with_context(|| format!("creating {}", self.paths.parked.display()))?;

        let leftovers = archive_paths(&self.paths.parked, &self.config.scan.archive_extension)?;
        if !leftovers.is_empty() {
            bail!(
                "{} already holds {} parked mods from an earlier session; run `modbisect restore` first",
                self.paths.parked.display(),
                leftovers.len()
            );
        }
        Ok(())
    }
}
