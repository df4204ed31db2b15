//! Dependency-aware bisection over components.
//!
//! Each trial moves half of the candidate components, asks the oracle
//! whether the bug survived and keeps the half that must hold the fault.
//! In `Narrowing` mode the candidates are active and the left half is
//! parked; in `Restoring` mode the candidates are parked and the right half
//! is brought back. Either way "yes" keeps the right half and "no" keeps
//! the left half, parking the right one before the next trial.

use thiserror::Error;

use crate::model::descriptor::{Component, locators_of, plugin_count};
use crate::model::mode::Mode;
use crate::oracle::{Answer, Oracle, OracleError, StateChange, Trial};
use crate::plugin::activation::{Activation, ActivationError, Direction};

#[derive(Debug, Error)]
pub enum BisectError {
    #[error(transparent)]
    Activation(#[from] ActivationError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Searching {
        candidate: Vec<Component>,
        mode: Mode,
    },
    NoFaultFound,
    FaultIsolated(Component),
}

impl SearchState {
    pub fn start(components: Vec<Component>) -> Self {
        SearchState::Searching {
            candidate: components,
            mode: Mode::Narrowing,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchState::Searching { .. })
    }
}

/// Sort by mod count, then give the first half of the components (by
/// count of components, not mods) to `left`. With two or more components
/// neither half is empty.
pub fn split(mut candidate: Vec<Component>) -> (Vec<Component>, Vec<Component>) {
    candidate.sort_by_key(Component::len);
    let right = candidate.split_off(candidate.len() / 2);
    (candidate, right)
}

pub struct Bisector<'a> {
    activation: &'a mut dyn Activation,
    oracle: &'a mut dyn Oracle,
    trials: usize,
}

impl<'a> Bisector<'a> {
    pub fn new(activation: &'a mut dyn Activation, oracle: &'a mut dyn Oracle) -> Self {
        Self {
            activation,
            oracle,
            trials: 0,
        }
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Drive the search from all components to a terminal state.
    pub fn run(&mut self, components: Vec<Component>) -> Result<SearchState, BisectError> {
        tracing::info!(
            "bisecting {} mods in {} components",
            plugin_count(&components),
            components.len()
        );

        let mut state = SearchState::start(components);
        while !state.is_terminal() {
            state = self.step(state)?;
        }

        tracing::info!("search finished after {} trials", self.trials);
        Ok(state)
    }

    /// Advance one transition. Terminal states are returned unchanged.
    pub fn step(&mut self, state: SearchState) -> Result<SearchState, BisectError> {
        let (mut candidate, mode) = match state {
            SearchState::Searching { candidate, mode } => (candidate, mode),
            terminal => return Ok(terminal),
        };

        match candidate.len() {
            0 => return Ok(SearchState::NoFaultFound),
            1 => return Ok(SearchState::FaultIsolated(candidate.remove(0))),
            _ => {}
        }

        let (left, right) = split(candidate);
        self.oracle.check_interrupt()?;
        self.trials += 1;

        let change = match mode {
            Mode::Narrowing => {
                self.activation.park(&locators_of(&left))?;
                StateChange {
                    direction: Direction::Park,
                    components: &left,
                }
            }
            Mode::Restoring => {
                self.activation.restore(&locators_of(&right))?;
                StateChange {
                    direction: Direction::Restore,
                    components: &right,
                }
            }
        };
        tracing::info!(
            "trial {} [{}]: {} {} mods, {} | {} components",
            self.trials,
            mode.label(),
            change.direction.verb(),
            plugin_count(change.components),
            left.len(),
            right.len()
        );

        self.oracle.check_interrupt()?;
        let answer = self.oracle.present(&Trial {
            number: self.trials,
            change,
        })?;
        tracing::info!("trial {}: bug present = {}", self.trials, answer == Answer::Yes);

        match answer {
            Answer::Yes => Ok(SearchState::Searching {
                candidate: right,
                mode: Mode::Narrowing,
            }),
            Answer::No => {
                self.oracle.check_interrupt()?;
                self.oracle.notice(&StateChange {
                    direction: Direction::Park,
                    components: &right,
                })?;
                self.activation.park(&locators_of(&right))?;
                Ok(SearchState::Searching {
                    candidate: left,
                    mode: Mode::Restoring,
                })
            }
        }
    }
}
