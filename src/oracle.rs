//! The yes/no question asked after every trial, and the console that asks it.

use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use thiserror::Error;

use crate::model::descriptor::{Component, plugin_count};
use crate::msg::Msg;
use crate::plugin::activation::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// The bug still reproduces.
    Yes,
    /// The bug is gone.
    No,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("interrupted while waiting for an answer")]
    Interrupted,
    #[error("input closed before an answer was given")]
    InputClosed,
    #[error("console i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// A set of components that was just moved in one direction.
#[derive(Debug, Clone, Copy)]
pub struct StateChange<'a> {
    pub direction: Direction,
    pub components: &'a [Component],
}

impl StateChange<'_> {
    /// Header plus one `--` block per component.
    pub fn lines(&self) -> Vec<String> {
        let heading = match self.direction {
            Direction::Park => "Disable",
            Direction::Restore => "Enable",
        };
        let mut lines = vec![format!(
            "{heading} {} mods in {} components:",
            plugin_count(self.components),
            self.components.len()
        )];
        for component in self.components {
            lines.extend(component_lines(component));
        }
        lines
    }
}

pub fn component_lines(component: &Component) -> Vec<String> {
    let mut lines = vec!["--".to_string()];
    lines.extend(component.members().iter().map(|member| member.listing_line()));
    lines
}

/// One trial the user must judge.
#[derive(Debug, Clone, Copy)]
pub struct Trial<'a> {
    pub number: usize,
    pub change: StateChange<'a>,
}

/// Source of answers. Production asks a human; tests script it.
pub trait Oracle {
    /// Show the trial that was just applied and block until it is judged.
    fn present(&mut self, trial: &Trial<'_>) -> Result<Answer, OracleError>;

    /// Report a move that needs no answer.
    fn notice(&mut self, change: &StateChange<'_>) -> Result<(), OracleError>;

    /// Fails with [`OracleError::Interrupted`] if an interrupt arrived since
    /// the last call. Checked before every batch of moves.
    fn check_interrupt(&mut self) -> Result<(), OracleError> {
        Ok(())
    }
}

/// How a typed line is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Answer(Answer),
    /// Blank line; ask again.
    Empty,
}

/// `y` and `yes` (exact case) mean the bug is still there. A blank line is
/// not an answer. Anything else means it is gone.
pub fn parse_reply(line: &str) -> Reply {
    match line.trim() {
        "" => Reply::Empty,
        "y" | "yes" => Reply::Answer(Answer::Yes),
        _ => Reply::Answer(Answer::No),
    }
}

/// Oracle on a terminal. Input lines and interrupts arrive as [`Msg`]s on
/// one channel so an interrupt can cut a pending prompt short.
pub struct ConsoleOracle<W: Write> {
    rx: mpsc::Receiver<Msg>,
    out: W,
    input_closed: bool,
}

impl ConsoleOracle<io::Stdout> {
    /// Spawn the stdin reader and install the interrupt handler.
    pub fn attach() -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::channel::<Msg>();

        let tx_signal = tx.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("interrupt received");
            let _ = tx_signal.send(Msg::Interrupted);
        })?;

        // Input thread: reads stdin lines and forwards them as Msg
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let msg = match line {
                    Ok(line) => Msg::Line(line),
                    Err(err) => {
                        tracing::warn!("stdin read failed: {err}");
                        break;
                    }
                };
                if tx.send(msg).is_err() {
                    return;
                }
            }
            let _ = tx.send(Msg::InputClosed);
        });

        Ok(Self::new(rx, io::stdout()))
    }
}

impl<W: Write> ConsoleOracle<W> {
    pub fn new(rx: mpsc::Receiver<Msg>, out: W) -> Self {
        Self {
            rx,
            out,
            input_closed: false,
        }
    }

    /// Empty the channel without blocking. Lines typed before the prompt
    /// are dropped so they cannot answer it.
    fn drain_pending(&mut self) -> Result<(), OracleError> {
        loop {
            match self.rx.try_recv() {
                Ok(Msg::Line(line)) => tracing::debug!("discarding early input {line:?}"),
                Ok(Msg::InputClosed) | Err(mpsc::TryRecvError::Disconnected) => {
                    self.input_closed = true;
                    return Ok(());
                }
                Ok(Msg::Interrupted) => return Err(OracleError::Interrupted),
                Err(mpsc::TryRecvError::Empty) => return Ok(()),
            }
        }
    }

    fn print_lines(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }
}

impl<W: Write> Oracle for ConsoleOracle<W> {
    fn present(&mut self, trial: &Trial<'_>) -> Result<Answer, OracleError> {
        if self.input_closed {
            return Err(OracleError::InputClosed);
        }
        writeln!(self.out, "Trial {}", trial.number)?;
        self.print_lines(&trial.change.lines())?;

        loop {
            write!(self.out, "Bug still present? [y/N] ")?;
            self.out.flush()?;

            let msg = self.rx.recv().map_err(|_| OracleError::InputClosed)?;
            match msg {
                Msg::Line(line) => match parse_reply(&line) {
                    Reply::Answer(answer) => return Ok(answer),
                    Reply::Empty => continue,
                },
                Msg::InputClosed => return Err(OracleError::InputClosed),
                Msg::Interrupted => {
                    writeln!(self.out)?;
                    return Err(OracleError::Interrupted);
                }
            }
        }
    }

    fn notice(&mut self, change: &StateChange<'_>) -> Result<(), OracleError> {
        self.print_lines(&change.lines())?;
        Ok(())
    }

    fn check_interrupt(&mut self) -> Result<(), OracleError> {
        self.drain_pending()
    }
}
