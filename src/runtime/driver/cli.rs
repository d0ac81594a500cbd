use std::io::{self, Write};
use std::iter;

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use thiserror::Error;

use crate::error::{LayoutError, Result};
use crate::geometry::Size;
use crate::runtime::{PaneRuntime, RuntimeEvent};

pub type DriverResult<T> = std::result::Result<T, CliDriverError>;

#[derive(Debug, Error)]
pub enum CliDriverError {
    #[error("runtime error: {0}")]
    Runtime(#[from] LayoutError),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Owns a [`PaneRuntime`] and keeps the alternate screen up around its loop.
///
/// The terminal is restored even when a layout pass fails; the pass error
/// wins over any error hit while restoring.
pub struct CliDriver {
    runtime: PaneRuntime,
}

impl CliDriver {
    pub fn new(runtime: PaneRuntime) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &PaneRuntime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut PaneRuntime {
        &mut self.runtime
    }

    /// Drive the live terminal on stdout in raw mode until a handler asks
    /// to exit.
    pub fn run(mut self) -> DriverResult<()> {
        let (width, height) = terminal::size()?;
        let mut stdout = io::stdout();
        terminal::enable_raw_mode().map_err(|err| CliDriverError::Terminal(err.to_string()))?;
        let result = self.session(&mut stdout, |runtime, out| {
            runtime.resize(Size::new(width, height));
            runtime.run(out)
        });
        let raw_mode = terminal::disable_raw_mode()
            .map_err(|err| CliDriverError::Terminal(err.to_string()));
        result.and(raw_mode)
    }

    /// Replay `events` against `writer` without touching raw mode.
    ///
    /// `size` reaches the runtime as a leading [`RuntimeEvent::Resize`], so
    /// handlers and the resize reaction see it the way they would see a live
    /// terminal report.
    pub fn run_scripted<W, I>(&mut self, writer: &mut W, size: Size, events: I) -> DriverResult<()>
    where
        W: Write,
        I: IntoIterator<Item = RuntimeEvent>,
    {
        self.session(writer, |runtime, out| {
            runtime.run_scripted(out, iter::once(RuntimeEvent::Resize(size)).chain(events))
        })
    }

    fn session<W, F>(&mut self, writer: &mut W, body: F) -> DriverResult<()>
    where
        W: Write,
        F: FnOnce(&mut PaneRuntime, &mut W) -> Result<()>,
    {
        execute!(writer, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        let result = body(&mut self.runtime, writer).map_err(CliDriverError::from);
        let restored = execute!(writer, Show, LeaveAlternateScreen).map_err(CliDriverError::from);
        result.and(restored)
    }
}
